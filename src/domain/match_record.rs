//! Match records as served by the tournament backend.
//!
//! [`MatchRecord`] is the single shape shared by the bracket builder and
//! the match lifecycle controller. Its `details` bag is parsed
//! defensively: the backend may send it as an object, as a JSON document
//! embedded in a string, or as garbage, and the last case degrades to
//! empty metadata instead of failing the whole record.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::match_event::MatchEvent;
use super::{MatchId, ParticipantId, TournamentId};

/// One side of a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Home side.
    Home,
    /// Away side.
    Away,
}

impl Side {
    /// Returns the other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Home => Self::Away,
            Self::Away => Self::Home,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => f.write_str("home"),
            Self::Away => f.write_str("away"),
        }
    }
}

/// Server-side match status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    /// Not started yet.
    #[serde(alias = "pending")]
    Scheduled,
    /// In progress.
    #[serde(alias = "in_progress", alias = "ongoing")]
    Live,
    /// Result confirmed. Terminal.
    #[serde(alias = "finished")]
    Completed,
}

/// Stage of a fixture in hybrid group + knockout formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Group stage fixture; draws are terminal.
    Group,
    /// Knockout fixture.
    Knockout,
}

/// Display identity of a team or solo player.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Participant {
    /// Identity reference, when the backend provides one.
    #[serde(default)]
    pub id: Option<ParticipantId>,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Optional logo / avatar URL.
    #[serde(default, alias = "logo", alias = "avatar", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Participant {
    /// Two-tier identity resolution: identity references decide when both
    /// sides carry one, otherwise display names are compared
    /// case-insensitively.
    ///
    /// Two distinct participants sharing a display name and lacking ids
    /// are indistinguishable here.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (&self.id, &other.id) {
            return a == b;
        }
        let a = self.name.trim();
        let b = other.name.trim();
        !a.is_empty() && a.to_lowercase() == b.to_lowercase()
    }

    fn is_blank(&self) -> bool {
        self.id.is_none() && self.name.trim().is_empty()
    }
}

/// Typed view of a record's opaque `details` bag.
///
/// Built through [`MatchDetails::from_value`], which never fails.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetails {
    /// Leg number (1 or 2) for two-legged ties.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leg: Option<u8>,
    /// Ties the legs of one tie together.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// Display name override for the round.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_name: Option<String>,
    /// Ordering of the tie within its round.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_index: Option<u32>,
    /// Third-place playoff flag.
    #[serde(rename = "is3rdPlace")]
    pub is_third_place: bool,
    /// Stage in hybrid formats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
}

impl MatchDetails {
    /// Parses metadata from a JSON value, defaulting to empty metadata on
    /// anything unexpected. Strings are treated as embedded JSON documents.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(raw) => serde_json::from_str::<Value>(raw)
                .ok()
                .filter(Value::is_object)
                .map(|inner| Self::from_value(&inner))
                .unwrap_or_default(),
            Value::Object(map) => Self {
                leg: map
                    .get("leg")
                    .and_then(as_u64)
                    .and_then(|v| u8::try_from(v).ok()),
                group_id: map.get("groupId").and_then(as_string),
                round_name: map.get("roundName").and_then(as_string),
                match_index: map
                    .get("matchIndex")
                    .and_then(as_u64)
                    .and_then(|v| u32::try_from(v).ok()),
                is_third_place: map.get("is3rdPlace").is_some_and(as_flag),
                stage: map.get("stage").and_then(as_stage),
            },
            _ => Self::default(),
        }
    }

    /// Returns `true` if the record is one leg of a two-legged tie.
    #[must_use]
    pub const fn is_two_legged(&self) -> bool {
        self.leg.is_some()
    }

    fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(raw.map(|v| Self::from_value(&v)).unwrap_or_default())
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_u64() == Some(1),
        _ => false,
    }
}

fn as_stage(value: &Value) -> Option<Stage> {
    match value.as_str()?.trim().to_ascii_lowercase().as_str() {
        "group" => Some(Stage::Group),
        "knockout" => Some(Stage::Knockout),
        _ => None,
    }
}

/// One scheduled or played fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    /// Backend id.
    pub id: MatchId,
    /// Owning tournament.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament_id: Option<TournamentId>,
    /// Stage grouping; not necessarily contiguous.
    pub round: u32,
    /// Home identity reference (`None` while TBD).
    #[serde(default)]
    pub home_participant_id: Option<ParticipantId>,
    /// Away identity reference (`None` while TBD).
    #[serde(default)]
    pub away_participant_id: Option<ParticipantId>,
    /// Home display identity.
    #[serde(default, alias = "homeTeam", alias = "homePlayer")]
    pub home_participant: Option<Participant>,
    /// Away display identity.
    #[serde(default, alias = "awayTeam", alias = "awayPlayer")]
    pub away_participant: Option<Participant>,
    /// Home score; `None` means not played.
    #[serde(default)]
    pub home_score: Option<u32>,
    /// Away score; `None` means not played.
    #[serde(default)]
    pub away_score: Option<u32>,
    /// Home shootout score, when a shootout took place.
    #[serde(default)]
    pub home_penalty_score: Option<u32>,
    /// Away shootout score, when a shootout took place.
    #[serde(default)]
    pub away_penalty_score: Option<u32>,
    /// Server status.
    pub status: MatchStatus,
    /// Server period for live matches (`1st_half`, `halftime`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    /// Parsed metadata bag.
    #[serde(default, deserialize_with = "MatchDetails::deserialize_lenient")]
    pub details: MatchDetails,
    /// Event log, ordered by minute.
    #[serde(default)]
    pub events: Vec<MatchEvent>,
}

impl MatchRecord {
    /// Resolves the identity of one side, merging the bare identity
    /// reference with the display object. `None` means TBD.
    #[must_use]
    pub fn participant(&self, side: Side) -> Option<Participant> {
        let (id, display) = match side {
            Side::Home => (&self.home_participant_id, &self.home_participant),
            Side::Away => (&self.away_participant_id, &self.away_participant),
        };
        let resolved = match display {
            Some(p) => Participant {
                id: p.id.clone().or_else(|| id.clone()),
                ..p.clone()
            },
            None => Participant {
                id: id.clone(),
                ..Participant::default()
            },
        };
        (!resolved.is_blank()).then_some(resolved)
    }

    /// Returns `true` once both sides are assigned.
    #[must_use]
    pub fn participants_resolved(&self) -> bool {
        self.participant(Side::Home).is_some() && self.participant(Side::Away).is_some()
    }

    /// Finds which side `who` plays on in this record.
    #[must_use]
    pub fn side_of(&self, who: &Participant) -> Option<Side> {
        [Side::Home, Side::Away]
            .into_iter()
            .find(|side| self.participant(*side).is_some_and(|p| p.same_as(who)))
    }

    /// Score of one side.
    #[must_use]
    pub const fn score(&self, side: Side) -> Option<u32> {
        match side {
            Side::Home => self.home_score,
            Side::Away => self.away_score,
        }
    }

    /// Mutable score slot of one side.
    pub fn score_mut(&mut self, side: Side) -> &mut Option<u32> {
        match side {
            Side::Home => &mut self.home_score,
            Side::Away => &mut self.away_score,
        }
    }

    /// Shootout score of one side.
    #[must_use]
    pub const fn penalty_score(&self, side: Side) -> Option<u32> {
        match side {
            Side::Home => self.home_penalty_score,
            Side::Away => self.away_penalty_score,
        }
    }

    /// Returns `true` when both regulation scores are present.
    #[must_use]
    pub const fn has_result(&self) -> bool {
        self.home_score.is_some() && self.away_score.is_some()
    }

    /// Returns `true` when a shootout score is recorded for both sides.
    #[must_use]
    pub const fn has_penalties(&self) -> bool {
        self.home_penalty_score.is_some() && self.away_penalty_score.is_some()
    }

    /// Returns `true` if the server reports the match as completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }
}

/// Competition format of a tournament.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    /// Round robin; every fixture may end level.
    #[serde(alias = "round_robin")]
    League,
    /// Pure knockout bracket.
    Knockout,
    /// Group stage followed by a knockout bracket.
    #[serde(alias = "hybrid", alias = "group_stage")]
    GroupKnockout,
}

impl TournamentFormat {
    /// Whether a fixture with `details` must produce a winner, meaning a
    /// level score has to be broken by a penalty shootout.
    ///
    /// First legs of two-legged ties never need a winner: the tie is
    /// decided on aggregate in the second leg.
    #[must_use]
    pub fn requires_decisive_result(self, details: &MatchDetails) -> bool {
        if details.leg == Some(1) {
            return false;
        }
        match self {
            Self::League => false,
            Self::Knockout => details.stage != Some(Stage::Group),
            Self::GroupKnockout => details.stage == Some(Stage::Knockout),
        }
    }
}

/// Tournament header record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    /// Backend id.
    pub id: TournamentId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Competition format.
    pub format: TournamentFormat,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn parse(json: &str) -> MatchRecord {
        let Ok(record) = serde_json::from_str::<MatchRecord>(json) else {
            panic!("record did not parse: {json}");
        };
        record
    }

    #[test]
    fn details_from_embedded_string() {
        let record = parse(
            r#"{"id": 1, "round": 2, "status": "scheduled",
                "details": "{\"leg\": 2, \"groupId\": 7, \"is3rdPlace\": \"true\"}"}"#,
        );
        assert_eq!(record.details.leg, Some(2));
        assert_eq!(record.details.group_id.as_deref(), Some("7"));
        assert!(record.details.is_third_place);
    }

    #[test]
    fn malformed_details_degrade_to_empty() {
        let record = parse(r#"{"id": 1, "round": 1, "status": "live", "details": "{not json"}"#);
        assert_eq!(record.details, MatchDetails::default());

        let record = parse(r#"{"id": 1, "round": 1, "status": "live", "details": [1, 2]}"#);
        assert_eq!(record.details, MatchDetails::default());

        let record = parse(r#"{"id": 1, "round": 1, "status": "live", "details": null}"#);
        assert_eq!(record.details, MatchDetails::default());
    }

    #[test]
    fn wrongly_typed_detail_fields_are_dropped_individually() {
        let value = serde_json::json!({"leg": "x", "matchIndex": "3", "stage": "KNOCKOUT"});
        let details = MatchDetails::from_value(&value);
        assert_eq!(details.leg, None);
        assert_eq!(details.match_index, Some(3));
        assert_eq!(details.stage, Some(Stage::Knockout));
    }

    #[test]
    fn participant_merges_reference_and_display() {
        let record = parse(
            r#"{"id": 1, "round": 1, "status": "scheduled",
                "homeParticipantId": 11, "homeTeam": {"name": "Lions", "logo": "l.png"},
                "awayParticipantId": null}"#,
        );
        let Some(home) = record.participant(Side::Home) else {
            panic!("home should resolve");
        };
        assert_eq!(home.id, Some(ParticipantId::from("11")));
        assert_eq!(home.image.as_deref(), Some("l.png"));
        assert!(record.participant(Side::Away).is_none());
        assert!(!record.participants_resolved());
    }

    #[test]
    fn identity_prefers_reference_then_name() {
        let a = Participant {
            id: Some(ParticipantId::from("1")),
            name: "Lions".into(),
            image: None,
        };
        let renamed = Participant {
            id: Some(ParticipantId::from("1")),
            name: "Lions FC".into(),
            image: None,
        };
        let namesake = Participant {
            id: Some(ParticipantId::from("2")),
            name: "Lions".into(),
            image: None,
        };
        let bare = Participant {
            id: None,
            name: "  lions ".into(),
            image: None,
        };
        assert!(a.same_as(&renamed));
        assert!(!a.same_as(&namesake));
        assert!(a.same_as(&bare));
    }

    #[test]
    fn decisive_result_policy() {
        let knockout = MatchDetails::default();
        let first_leg = MatchDetails {
            leg: Some(1),
            ..MatchDetails::default()
        };
        let second_leg = MatchDetails {
            leg: Some(2),
            ..MatchDetails::default()
        };
        let group = MatchDetails {
            stage: Some(Stage::Group),
            ..MatchDetails::default()
        };
        let ko_stage = MatchDetails {
            stage: Some(Stage::Knockout),
            ..MatchDetails::default()
        };

        assert!(TournamentFormat::Knockout.requires_decisive_result(&knockout));
        assert!(TournamentFormat::Knockout.requires_decisive_result(&second_leg));
        assert!(!TournamentFormat::Knockout.requires_decisive_result(&first_leg));
        assert!(!TournamentFormat::League.requires_decisive_result(&knockout));
        assert!(!TournamentFormat::GroupKnockout.requires_decisive_result(&group));
        assert!(TournamentFormat::GroupKnockout.requires_decisive_result(&ko_stage));
    }

    #[test]
    fn tournament_format_aliases() {
        let Ok(t) = serde_json::from_str::<Tournament>(r#"{"id": 3, "format": "hybrid"}"#) else {
            panic!("tournament did not parse");
        };
        assert_eq!(t.format, TournamentFormat::GroupKnockout);
    }
}
