//! Read-only view over an externally managed file-reservation directory.
//!
//! Each `*.json` document holds either one record object or an array of
//! them. Unreadable documents and malformed records are skipped: the guard
//! must keep working when one file in the store is corrupt.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Result;
use crate::model::{EffectiveReservation, ReservationRecord, id_key, normalize_path};

pub struct ReservationStore {
    dir: PathBuf,
}

impl ReservationStore {
    pub fn open(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `*.json` documents in file-name order. A missing or unreadable
    /// directory has no documents.
    pub fn documents(&self) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %self.dir.display(), error = %e, "reservation store unreadable");
                return vec![];
            }
        };
        let mut docs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(".json"))
            })
            .collect();
        docs.sort();
        docs
    }

    /// All record objects across the store, in enumeration order.
    pub fn raw_records(&self) -> Vec<Map<String, Value>> {
        self.documents()
            .iter()
            .filter_map(|path| match read_document(path) {
                Ok(values) => Some(values),
                Err(e) => {
                    debug!(document = %path.display(), error = %e, "skipping reservation document");
                    None
                }
            })
            .flatten()
            .filter_map(|value| match value {
                Value::Object(map) => Some(map),
                other => {
                    debug!(record = %other, "skipping non-object reservation record");
                    None
                }
            })
            .collect()
    }

    /// Reservations that can block `current_agent` at instant `now`: exclusive,
    /// held by someone else, unexpired, and naming a filesystem path.
    ///
    /// Records sharing an `id` collapse to the first one enumerated, even when
    /// that first copy is malformed or filtered out.
    pub fn load_effective(
        &self,
        current_agent: Option<&str>,
        now: DateTime<Utc>,
    ) -> Vec<EffectiveReservation> {
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut effective = Vec::new();

        for map in self.raw_records() {
            if let Some(id) = map.get("id").and_then(id_key)
                && !seen_ids.insert(id)
            {
                continue;
            }
            let Some(record) = ReservationRecord::from_map(&map) else {
                debug!("skipping malformed reservation record");
                continue;
            };
            if record.path_pattern.is_empty() || record.is_virtual() {
                continue;
            }
            if !record.exclusive {
                continue;
            }
            if !record.agent.is_empty() && current_agent == Some(record.agent.as_str()) {
                continue;
            }
            let expires_at = record.expires_ts.as_deref().and_then(parse_timestamp);
            if expires_at.is_some_and(|at| at <= now) {
                continue;
            }

            effective.push(EffectiveReservation {
                id: record.id,
                normalized: normalize_path(&record.path_pattern),
                pattern: record.path_pattern,
                holder: record.agent,
                expires_at,
            });
        }
        effective
    }
}

pub fn load_effective_reservations(
    store_dir: &Path,
    current_agent: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<EffectiveReservation> {
    ReservationStore::open(store_dir).load_effective(current_agent, now)
}

fn read_document(path: &Path) -> Result<Vec<Value>> {
    let content = fs::read_to_string(path)?;
    Ok(match serde_json::from_str::<Value>(&content)? {
        Value::Array(items) => items,
        single => vec![single],
    })
}

/// Parse an ISO-8601 timestamp into UTC. Naive values are taken as UTC; a
/// bare date means midnight. Returns `None` for anything unparseable.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
