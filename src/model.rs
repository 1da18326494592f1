use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Path-pattern prefixes naming non-filesystem resources.
pub const VIRTUAL_PREFIXES: [&str; 3] = ["tool://", "resource://", "service://"];

/// One reservation record as found in the store, after field validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationRecord {
    pub id: Option<String>,
    pub path_pattern: String,
    pub agent: String,
    pub exclusive: bool,
    pub expires_ts: Option<String>,
}

impl ReservationRecord {
    /// Validate a raw JSON object. Returns `None` when a field has the wrong
    /// shape; absent fields take their defaults.
    pub fn from_map(map: &Map<String, Value>) -> Option<Self> {
        Some(Self {
            id: map.get("id").and_then(id_key),
            path_pattern: optional_str(map, "path_pattern")?.trim().to_string(),
            agent: optional_str(map, "agent")?.trim().to_string(),
            exclusive: map.get("exclusive").is_none_or(json_truthy),
            expires_ts: Some(optional_str(map, "expires_ts")?.trim().to_string())
                .filter(|s| !s.is_empty()),
        })
    }

    pub fn is_virtual(&self) -> bool {
        VIRTUAL_PREFIXES
            .iter()
            .any(|prefix| self.path_pattern.starts_with(prefix))
    }
}

/// A reservation that can conflict with the current agent's commit.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EffectiveReservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Pattern exactly as written in the store (trimmed).
    pub pattern: String,
    /// Slash-normalized pattern with leading slashes removed.
    pub normalized: String,
    pub holder: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// A staged path colliding with another agent's exclusive reservation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Conflict {
    pub pattern: String,
    pub path: String,
    pub holder: String,
}

/// Convert backslashes to forward slashes and strip leading slashes.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_string()
}

/// The de-duplication key for an `id` value: strings verbatim, anything else
/// by its JSON text. `null` means no id.
pub fn id_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Read a string field that may be absent or null (both mean empty).
fn optional_str<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    match map.get(key) {
        None | Some(Value::Null) => Some(""),
        Some(Value::String(s)) => Some(s),
        Some(_) => None,
    }
}

fn json_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Option<ReservationRecord> {
        ReservationRecord::from_map(value.as_object().unwrap())
    }

    #[test]
    fn defaults_for_missing_fields() {
        let r = record(json!({"path_pattern": "src/*.rs"})).unwrap();
        assert_eq!(r.id, None);
        assert_eq!(r.agent, "");
        assert!(r.exclusive);
        assert_eq!(r.expires_ts, None);
    }

    #[test]
    fn fields_are_trimmed() {
        let r = record(json!({
            "id": 7,
            "path_pattern": "  docs/**  ",
            "agent": " bob ",
            "exclusive": true,
            "expires_ts": "   "
        }))
        .unwrap();
        assert_eq!(r.id.as_deref(), Some("7"));
        assert_eq!(r.path_pattern, "docs/**");
        assert_eq!(r.agent, "bob");
        assert_eq!(r.expires_ts, None);
    }

    #[test]
    fn wrong_field_types_reject_the_record() {
        assert!(record(json!({"path_pattern": 42})).is_none());
        assert!(record(json!({"path_pattern": "a", "agent": ["x"]})).is_none());
        assert!(record(json!({"path_pattern": "a", "expires_ts": 0})).is_none());
    }

    #[test]
    fn exclusive_uses_json_truthiness() {
        let shared = |v: Value| !record(json!({"path_pattern": "a", "exclusive": v})).unwrap().exclusive;
        assert!(shared(json!(false)));
        assert!(shared(json!(null)));
        assert!(shared(json!(0)));
        assert!(shared(json!("")));
        assert!(!shared(json!(1)));
        assert!(!shared(json!("yes")));
    }

    #[test]
    fn virtual_prefixes_detected() {
        for p in ["tool://bash", "resource://db/main", "service://api"] {
            assert!(record(json!({"path_pattern": p})).unwrap().is_virtual());
        }
        assert!(!record(json!({"path_pattern": "tools/x"})).unwrap().is_virtual());
    }

    #[test]
    fn normalize_path_cases() {
        assert_eq!(normalize_path("src\\app\\main.ts"), "src/app/main.ts");
        assert_eq!(normalize_path("/src/lib.rs"), "src/lib.rs");
        assert_eq!(normalize_path("//abs"), "abs");
        assert_eq!(normalize_path("plain"), "plain");
    }
}
