use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Caller-supplied fields of a heartbeat. `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewHeartbeat {
    pub entity: String,

    #[serde(rename = "type")]
    pub kind: String,

    pub category: String,

    pub browser: String,

    pub domain: String,

    pub path: String,

    pub user_agent: String,

    #[serde(default)]
    pub time: Option<DateTime<Utc>>,

    /// Deduplication fingerprint, computed upstream.
    pub hash: String,
}

/// A batch of heartbeats submitted by one user in a single ingestion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatBatch {
    pub trace_id: Uuid,

    pub user_id: Uuid,

    pub list: Vec<NewHeartbeat>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub inserted: u64,

    /// Rows skipped because their hash was already stored (or repeated in the batch).
    pub duplicates: u64,
}

/// Equality filters over the indexed heartbeat columns plus an optional `time` range.
#[derive(Debug, Clone, Default)]
pub struct HeartbeatFilter {
    pub user_id: Option<Uuid>,
    pub entity: Option<String>,
    pub kind: Option<String>,
    pub category: Option<String>,
    pub browser: Option<String>,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl HeartbeatFilter {
    #[must_use]
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }
}

/// Indexed column a heartbeat aggregate is grouped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Entity,
    Kind,
    Category,
    Browser,
    Domain,
    Path,
}

impl GroupBy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Entity => "entity",
            Self::Kind => "type",
            Self::Category => "category",
            Self::Browser => "browser",
            Self::Domain => "domain",
            Self::Path => "path",
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "entity" => Ok(Self::Entity),
            "type" | "kind" => Ok(Self::Kind),
            "category" => Ok(Self::Category),
            "browser" => Ok(Self::Browser),
            "domain" => Ok(Self::Domain),
            "path" => Ok(Self::Path),
            other => Err(format!(
                "unknown column '{other}' (expected entity, type, category, browser, domain or path)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_by_parse() {
        assert_eq!("domain".parse::<GroupBy>().unwrap(), GroupBy::Domain);
        assert_eq!("TYPE".parse::<GroupBy>().unwrap(), GroupBy::Kind);
        assert_eq!("kind".parse::<GroupBy>().unwrap(), GroupBy::Kind);
        assert!("user_agent".parse::<GroupBy>().is_err());
    }

    #[test]
    fn test_new_heartbeat_deserializes_type_field() {
        let json = r#"{
            "entity": "app1",
            "type": "visit",
            "category": "browsing",
            "browser": "firefox",
            "domain": "example.com",
            "path": "/docs",
            "user_agent": "Mozilla/5.0",
            "hash": "h1"
        }"#;

        let beat: NewHeartbeat = serde_json::from_str(json).unwrap();
        assert_eq!(beat.kind, "visit");
        assert_eq!(beat.time, None);
        assert_eq!(beat.hash, "h1");
    }
}
