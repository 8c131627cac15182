//! Persistence data types.
//!
//! # Data Model Overview
//!
//! ```text
//! {data_dir}/
//! ├── data.json       # Published snapshot: { "groups": [...], "logs": [...] }
//! ├── draft.json      # Draft snapshot (same shape)
//! ├── users.json      # [ { "username", "password", "role" }, ... ]
//! ├── tv-urls.json    # [ { "name", "url", "type", "originalName"?, "uploadedAt"? }, ... ]
//! └── uploads/        # Uploaded files, named <uuid>.<ext>
//! ```
//!
//! # Leniency
//!
//! Documents on disk are read leniently: a log entry whose `group` is a number
//! still loads, and an entry that is not an object at all is skipped with a
//! warning instead of discarding the whole snapshot. Request bodies go through
//! [`Snapshot::from_value`] and [`LogEntry::from_value`], which are strict:
//! `date`, `type` and `group` must be strings and `ts` a number or a string.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{DashboardError, Result};

/// Log `type` recorded when a group is created.
pub const GROUP_CREATE: &str = "group-create";

/// Log `type` recorded when a group is deleted.
pub const GROUP_DELETE: &str = "group-delete";

/// Group name used by clients for entries they could not attribute.
pub const UNKNOWN_GROUP: &str = "unknowngroup";

/// Largest integer a JSON client can represent exactly (2^53 - 1).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

// ============================================================================
// Snapshot
// ============================================================================

/// One full copy of dashboard data (either draft or published).
///
/// Equality is structural: two snapshots parsed from documents that differ only
/// in key order or whitespace compare equal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Groups are opaque; nothing in the core looks inside them.
    #[serde(default, deserialize_with = "sequence_or_empty")]
    pub groups: Vec<Value>,

    #[serde(default, deserialize_with = "lenient_logs")]
    pub logs: Vec<LogEntry>,
}

impl Snapshot {
    /// Parse a request body into a snapshot.
    ///
    /// `groups` and `logs` must both be arrays (empty is fine) and every log
    /// must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(DashboardError::validation("Snapshot must be a JSON object"));
        };

        let groups = match map.remove("groups") {
            Some(Value::Array(groups)) => groups,
            _ => return Err(DashboardError::validation("groups must be an array")),
        };
        let raw_logs = match map.remove("logs") {
            Some(Value::Array(logs)) => logs,
            _ => return Err(DashboardError::validation("logs must be an array")),
        };

        let logs = raw_logs
            .into_iter()
            .enumerate()
            .map(|(i, raw)| {
                LogEntry::from_value(raw)
                    .map_err(|e| DashboardError::validation(format!("logs[{i}]: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { groups, logs })
    }
}

// ============================================================================
// Log entries
// ============================================================================

/// Identifier of a log entry.
///
/// Clients send either a millisecond number or a string. Comparison for
/// deletion goes through [`LogTimestamp::normalized`] so both spellings of the
/// same identifier match.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LogTimestamp {
    Number(serde_json::Number),
    Text(String),
}

impl LogTimestamp {
    /// String form used for matching. Integral floats (`1.0`, `1e3`) render
    /// as integers, so they match the key a client would send.
    pub fn normalized(&self) -> String {
        match self {
            LogTimestamp::Number(n) => integral(n)
                .map(|i| i.to_string())
                .unwrap_or_else(|| n.to_string()),
            LogTimestamp::Text(s) => s.trim().to_string(),
        }
    }

    /// Whether this timestamp identifies `key` (already in string form).
    pub fn matches(&self, key: &str) -> bool {
        self.normalized() == key.trim()
    }

    /// Integer value, when the identifier is numeric in either spelling.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            LogTimestamp::Number(n) => integral(n),
            LogTimestamp::Text(s) => s.trim().parse().ok(),
        }
    }

    fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Number(n) => Some(LogTimestamp::Number(n)),
            Value::String(s) => Some(LogTimestamp::Text(s)),
            other => Some(LogTimestamp::Text(other.to_string())),
        }
    }
}

fn integral(n: &serde_json::Number) -> Option<i64> {
    n.as_i64().or_else(|| {
        let f = n.as_f64()?;
        (f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER).then_some(f as i64)
    })
}

impl From<i64> for LogTimestamp {
    fn from(ms: i64) -> Self {
        LogTimestamp::Number(ms.into())
    }
}

/// A single activity log record.
///
/// Only the fields the core reasons about are typed; everything else the
/// client sends (`name`, `note`, ...) is kept in `extra` and written back
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub ts: Option<LogTimestamp>,

    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<String>,

    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub group: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LogEntry {
    /// Parse a request body into a log entry.
    ///
    /// The body must be an object whose typed fields already have the right
    /// JSON type; nothing is coerced.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(fields) = &value else {
            return Err(DashboardError::validation("log entry must be a JSON object"));
        };
        check_field_types(fields)?;
        serde_json::from_value(value)
            .map_err(|e| DashboardError::validation(format!("invalid log entry: {e}")))
    }

    /// `group-create` and `group-delete` markers.
    pub fn is_lifecycle_marker(&self) -> bool {
        matches!(self.kind.as_deref(), Some(GROUP_CREATE) | Some(GROUP_DELETE))
    }

    /// Entry has no owning group: `group` is absent or `unknowngroup`.
    pub fn is_orphan(&self) -> bool {
        match self.group.as_deref() {
            None => true,
            Some(group) => group.eq_ignore_ascii_case(UNKNOWN_GROUP),
        }
    }

    /// Case-insensitive group match. An entry without a group never matches.
    pub fn belongs_to(&self, group_name: &str) -> bool {
        self.group
            .as_deref()
            .is_some_and(|group| group.to_lowercase() == group_name.to_lowercase())
    }

    pub fn has_timestamp(&self, key: &str) -> bool {
        self.ts.as_ref().is_some_and(|ts| ts.matches(key))
    }
}

fn check_field_types(fields: &Map<String, Value>) -> Result<()> {
    for name in ["date", "type", "group"] {
        match fields.get(name) {
            None | Some(Value::Null) | Some(Value::String(_)) => {}
            Some(other) => {
                return Err(DashboardError::validation(format!(
                    "{name} must be a string, got {}",
                    json_type(other)
                )))
            }
        }
    }

    match fields.get("ts") {
        None | Some(Value::Null) | Some(Value::Number(_)) | Some(Value::String(_)) => Ok(()),
        Some(other) => Err(DashboardError::validation(format!(
            "ts must be a number or a string, got {}",
            json_type(other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Users and TV URLs
// ============================================================================

fn default_role() -> String {
    "user".to_string()
}

/// A dashboard account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
}

/// Partial update for an existing account. Absent fields are left as-is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// A display entry shown on TV screens (a web page or an uploaded file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TvUrlEntry {
    pub name: String,
    pub url: String,

    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// Lenient deserializers
// ============================================================================

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<LogTimestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(LogTimestamp::from_json))
}

fn sequence_or_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => Vec::new(),
    })
}

fn lenient_logs<'de, D>(deserializer: D) -> std::result::Result<Vec<LogEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = sequence_or_empty(deserializer)?;
    Ok(items
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<LogEntry>(raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping unreadable log entry: {}", e);
                None
            }
        })
        .collect())
}

// ============================================================================
// TESTS
// ============================================================================
