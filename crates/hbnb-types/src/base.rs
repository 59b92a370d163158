//! Identity and timestamps shared by every entity

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fields every persisted record carries.
///
/// Ids are UUIDv7, so lexical order of ids follows creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseModel {
    pub id: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl BaseModel {
    pub fn new() -> Self {
        let now = now();
        Self {
            id: Uuid::now_v7().to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh `updated_at`, never letting it fall behind `created_at`.
    pub fn touch(&mut self) {
        self.updated_at = now().max(self.created_at);
    }
}

impl Default for BaseModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Current time truncated to the precision the persisted form keeps.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// `2017-09-28T21:05:54.119427` style timestamps (UTC, no offset suffix).
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

    pub fn format(dt: &DateTime<Utc>) -> String {
        dt.format(FORMAT).to_string()
    }

    pub fn parse(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        match NaiveDateTime::parse_from_str(s, FORMAT) {
            Ok(naive) => Ok(naive.and_utc()),
            Err(_) => DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc)),
        }
    }

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&dt.format(FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(de::Error::custom)
    }
}
