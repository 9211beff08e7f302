//! `reqwest`-backed implementation of [`MatchBackend`].

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{BackendError, BackendFuture, MatchBackend, MatchPatch, NewMatchEvent};
use crate::domain::{MatchEvent, MatchId, MatchRecord, Tournament, TournamentId};

/// Upper bound on pages fetched for one match list.
const MAX_PAGES: u32 = 100;

/// Page size requested from the match list endpoint.
const PAGE_SIZE: u32 = 200;

/// The match list endpoint answers either with a bare array or with a
/// paginated envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MatchListPayload {
    Plain(Vec<MatchRecord>),
    Paged {
        data: Vec<MatchRecord>,
        #[serde(default)]
        pagination: Option<PageMeta>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageMeta {
    #[serde(default, alias = "total_pages")]
    total_pages: Option<u32>,
}

/// HTTP client for the tournament backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpBackend {
    /// Creates a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Network`] if the HTTP client cannot be
    /// initialised.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .user_agent(concat!("knockout-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| BackendError::Network {
                url: base_url.clone(),
                source,
            })?;
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, BackendError> {
        let response = request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| BackendError::Network {
                url: url.to_owned(),
                source,
            })?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(BackendError::NotFound(url.to_owned())),
            status => Err(BackendError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            }),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, BackendError> {
        let response = self.send(self.client.get(url), url).await?;
        response.json::<T>().await.map_err(|e| BackendError::Decode {
            url: url.to_owned(),
            message: e.to_string(),
        })
    }

    async fn all_matches(
        &self,
        tournament_id: &TournamentId,
    ) -> Result<Vec<MatchRecord>, BackendError> {
        let mut records = Vec::new();
        let mut page = 1;
        loop {
            let url = self.url(&format!(
                "/api/tournaments/{tournament_id}/matches?page={page}&limit={PAGE_SIZE}"
            ));
            let total_pages = match self.get_json::<MatchListPayload>(&url).await? {
                MatchListPayload::Plain(data) => {
                    records.extend(data);
                    return Ok(records);
                }
                MatchListPayload::Paged { data, pagination } => {
                    let fetched = data.len();
                    records.extend(data);
                    if fetched == 0 {
                        return Ok(records);
                    }
                    pagination.and_then(|p| p.total_pages).unwrap_or(page)
                }
            };
            if page >= total_pages || page >= MAX_PAGES {
                tracing::debug!(
                    %tournament_id,
                    pages = page,
                    matches = records.len(),
                    "match list fetched"
                );
                return Ok(records);
            }
            page += 1;
        }
    }
}

impl MatchBackend for HttpBackend {
    fn fetch_match<'a>(&'a self, match_id: &'a MatchId) -> BackendFuture<'a, MatchRecord> {
        Box::pin(async move {
            let url = self.url(&format!("/api/matches/{match_id}"));
            self.get_json(&url).await
        })
    }

    fn update_match<'a>(
        &'a self,
        match_id: &'a MatchId,
        patch: &'a MatchPatch,
    ) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            let url = self.url(&format!("/api/matches/{match_id}"));
            self.send(self.client.patch(&url).json(patch), &url).await?;
            Ok(())
        })
    }

    fn create_event<'a>(
        &'a self,
        match_id: &'a MatchId,
        event: &'a NewMatchEvent,
    ) -> BackendFuture<'a, MatchEvent> {
        Box::pin(async move {
            let url = self.url(&format!("/api/matches/{match_id}/events"));
            let response = self.send(self.client.post(&url).json(event), &url).await?;
            response
                .json::<MatchEvent>()
                .await
                .map_err(|e| BackendError::Decode {
                    url,
                    message: e.to_string(),
                })
        })
    }

    fn delete_last_event<'a>(&'a self, match_id: &'a MatchId) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            let url = self.url(&format!("/api/matches/{match_id}/events/last"));
            self.send(self.client.delete(&url), &url).await?;
            Ok(())
        })
    }

    fn fetch_tournament_matches<'a>(
        &'a self,
        tournament_id: &'a TournamentId,
    ) -> BackendFuture<'a, Vec<MatchRecord>> {
        Box::pin(self.all_matches(tournament_id))
    }

    fn fetch_tournament<'a>(
        &'a self,
        tournament_id: &'a TournamentId,
    ) -> BackendFuture<'a, Tournament> {
        Box::pin(async move {
            let url = self.url(&format!("/api/tournaments/{tournament_id}"));
            self.get_json(&url).await
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalised() {
        let Ok(backend) = HttpBackend::new("http://backend:8080/", Duration::from_secs(1)) else {
            panic!("client should build");
        };
        assert_eq!(backend.base_url(), "http://backend:8080");
        assert_eq!(backend.url("/api/matches/1"), "http://backend:8080/api/matches/1");
    }

    #[test]
    fn match_list_accepts_plain_and_paged_payloads() {
        let plain = r#"[{"id": 1, "round": 1, "status": "scheduled"}]"#;
        assert!(matches!(
            serde_json::from_str::<MatchListPayload>(plain),
            Ok(MatchListPayload::Plain(v)) if v.len() == 1
        ));

        let paged = r#"{"data": [{"id": 1, "round": 1, "status": "live"}],
                        "pagination": {"page": 1, "totalPages": 3}}"#;
        let Ok(MatchListPayload::Paged { data, pagination }) =
            serde_json::from_str::<MatchListPayload>(paged)
        else {
            panic!("paged payload rejected");
        };
        assert_eq!(data.len(), 1);
        assert_eq!(pagination.and_then(|p| p.total_pages), Some(3));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        let Ok(backend) = HttpBackend::new("http://127.0.0.1:9", Duration::from_millis(500)) else {
            panic!("client should build");
        };
        let result = backend.fetch_match(&MatchId::from("1")).await;
        assert!(matches!(result, Err(BackendError::Network { .. })));
    }
}
