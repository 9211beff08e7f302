//! Shared DTO types used across multiple endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Participant, ScorePair, Side};
use crate::error::GatewayError;

/// Participant identity as rendered by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ParticipantDto {
    /// Backend participant id, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Logo or avatar URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl From<&Participant> for ParticipantDto {
    fn from(p: &Participant) -> Self {
        Self {
            id: p.id.as_ref().map(ToString::to_string),
            name: p.name.clone(),
            image: p.image.clone(),
        }
    }
}

/// Home/away goal pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ScoreDto {
    /// Home goals.
    pub home: u32,
    /// Away goals.
    pub away: u32,
}

impl From<ScorePair> for ScoreDto {
    fn from(pair: ScorePair) -> Self {
        Self {
            home: pair.home,
            away: pair.away,
        }
    }
}

/// Parses `"home"` / `"away"` (case-insensitive).
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for any other value.
pub fn parse_side(value: &str) -> Result<Side, GatewayError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "home" => Ok(Side::Home),
        "away" => Ok(Side::Away),
        other => Err(GatewayError::InvalidRequest(format!(
            "team must be \"home\" or \"away\", got {other:?}"
        ))),
    }
}

/// Pagination query parameters for list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page (max 100). Defaults to 20.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items.
    pub total: u32,
    /// Total number of pages.
    pub total_pages: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PaginationParams {
    /// Clamps `per_page` to the allowed maximum of 100.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, 100),
        }
    }

    /// Cuts one page out of `items` and describes it.
    #[must_use]
    pub fn paginate<T>(&self, items: Vec<T>) -> (Vec<T>, PaginationMeta) {
        let params = self.clamped();
        let total = u32::try_from(items.len()).unwrap_or(u32::MAX);
        let total_pages = total.div_ceil(params.per_page);
        let start = usize::try_from((params.page - 1).saturating_mul(params.per_page))
            .unwrap_or(usize::MAX);
        let per_page = usize::try_from(params.per_page).unwrap_or(usize::MAX);
        let data = items.into_iter().skip(start).take(per_page).collect();
        (
            data,
            PaginationMeta {
                page: params.page,
                per_page: params.per_page,
                total,
                total_pages,
            },
        )
    }
}
