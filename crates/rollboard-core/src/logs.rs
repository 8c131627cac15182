//! Activity log lifecycle: append and the three deletion rules.
//!
//! Logs live inside a [`Snapshot`](crate::persistence::Snapshot), so every
//! operation here is a read-modify-write of the whole snapshot document
//! through [`DraftPublishController::update`].
//!
//! # Deletion rules
//!
//! | Operation | Removes |
//! |-----------|---------|
//! | by timestamp | entries whose `ts` matches (string-normalized) |
//! | by group | entries whose `group` matches case-insensitively |
//! | by group and date | on that date only: lifecycle markers, the group's entries, orphans |
//!
//! Entries without a `group` are never matched by the group rule; the
//! group-and-date cascade is the only path that cleans them up.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::draft::{DraftPublishController, SnapshotKind};
use crate::error::{DashboardError, Result};
use crate::persistence::{LogEntry, LogTimestamp};

/// How a `DELETE /api/logs/{key}` key was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletedBy {
    Timestamp,
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDeletion {
    pub removed: usize,
    pub by: DeletedBy,
}

pub struct LogManager {
    snapshots: Arc<DraftPublishController>,
}

impl LogManager {
    pub fn new(snapshots: Arc<DraftPublishController>) -> Self {
        Self { snapshots }
    }

    pub fn list(&self, kind: SnapshotKind) -> Vec<LogEntry> {
        self.snapshots.load(kind).logs
    }

    /// Parse a request body and append it.
    pub fn append_value(&self, kind: SnapshotKind, body: Value) -> Result<LogEntry> {
        self.append(kind, LogEntry::from_value(body)?)
    }

    /// Append an entry at the end of the log.
    ///
    /// `date` and `type` are required. A missing `ts` is assigned from the
    /// clock; a `ts` already in use is a conflict.
    pub fn append(&self, kind: SnapshotKind, mut entry: LogEntry) -> Result<LogEntry> {
        validate_new_entry(&entry)?;

        let appended = self.snapshots.update(kind, |snapshot| {
            match entry.ts.as_ref().map(LogTimestamp::normalized) {
                Some(key) => {
                    if snapshot.logs.iter().any(|e| e.has_timestamp(&key)) {
                        return Err(DashboardError::conflict(format!(
                            "A log entry with ts {key} already exists"
                        )));
                    }
                }
                None => entry.ts = Some(next_timestamp(&snapshot.logs)),
            }
            snapshot.logs.push(entry.clone());
            Ok(entry)
        })?;

        log::info!(
            "Appended {} log {:?} for group {:?} on {}",
            kind,
            appended.kind.as_deref().unwrap_or_default(),
            appended.group.as_deref().unwrap_or_default(),
            appended.date.as_deref().unwrap_or_default()
        );
        Ok(appended)
    }

    pub fn delete_by_timestamp(&self, kind: SnapshotKind, ts: &str) -> Result<usize> {
        let removed = self
            .snapshots
            .update(kind, |snapshot| Ok(remove_by_timestamp(&mut snapshot.logs, ts)))?;
        log::info!("Deleted {} {} log(s) with ts {}", removed, kind, ts);
        Ok(removed)
    }

    pub fn delete_by_group(&self, kind: SnapshotKind, group: &str) -> Result<usize> {
        let removed = self
            .snapshots
            .update(kind, |snapshot| Ok(remove_by_group(&mut snapshot.logs, group)))?;
        log::info!("Deleted {} {} log(s) for group {}", removed, kind, group);
        Ok(removed)
    }

    pub fn delete_by_group_and_date(
        &self,
        kind: SnapshotKind,
        group: &str,
        date: &str,
    ) -> Result<usize> {
        let removed = self.snapshots.update(kind, |snapshot| {
            Ok(remove_by_group_and_date(&mut snapshot.logs, group, date))
        })?;
        log::info!(
            "Deleted {} {} log(s) for group {} on {}",
            removed,
            kind,
            group,
            date
        );
        Ok(removed)
    }

    /// Delete by a key that is either a timestamp or a group name.
    ///
    /// If any entry's `ts` matches the key it is treated as a timestamp,
    /// otherwise as a group name. The check and the removal happen under the
    /// same lock.
    pub fn delete_by_key(&self, kind: SnapshotKind, key: &str) -> Result<KeyDeletion> {
        let deletion = self.snapshots.update(kind, |snapshot| {
            let deletion = if snapshot.logs.iter().any(|e| e.has_timestamp(key)) {
                KeyDeletion {
                    removed: remove_by_timestamp(&mut snapshot.logs, key),
                    by: DeletedBy::Timestamp,
                }
            } else {
                KeyDeletion {
                    removed: remove_by_group(&mut snapshot.logs, key),
                    by: DeletedBy::Group,
                }
            };
            Ok(deletion)
        })?;
        log::info!(
            "Deleted {} {} log(s) by {:?} {}",
            deletion.removed,
            kind,
            deletion.by,
            key
        );
        Ok(deletion)
    }
}

// ============================================================================
// Pure retention rules
// ============================================================================

/// Remove every entry whose `ts` matches. Returns the number removed.
pub fn remove_by_timestamp(logs: &mut Vec<LogEntry>, ts: &str) -> usize {
    let before = logs.len();
    logs.retain(|e| !e.has_timestamp(ts));
    before - logs.len()
}

/// Remove every entry of `group` (case-insensitive). Entries with no group stay.
pub fn remove_by_group(logs: &mut Vec<LogEntry>, group: &str) -> usize {
    let before = logs.len();
    logs.retain(|e| !e.belongs_to(group));
    before - logs.len()
}

/// Clear one group's activity for one day.
///
/// On `date`, lifecycle markers of any group and orphan entries go along with
/// the group's own entries. Other dates are untouched.
pub fn remove_by_group_and_date(logs: &mut Vec<LogEntry>, group: &str, date: &str) -> usize {
    let before = logs.len();
    logs.retain(|e| !cascade_removes(e, group, date));
    before - logs.len()
}

fn cascade_removes(entry: &LogEntry, group: &str, date: &str) -> bool {
    if entry.date.as_deref() != Some(date) {
        return false;
    }
    entry.is_lifecycle_marker() || entry.belongs_to(group) || entry.is_orphan()
}

fn validate_new_entry(entry: &LogEntry) -> Result<()> {
    let present = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.trim().is_empty());

    match (present(&entry.date), present(&entry.kind)) {
        (true, true) => Ok(()),
        (false, true) => Err(DashboardError::validation("Missing required field: date")),
        (true, false) => Err(DashboardError::validation("Missing required field: type")),
        (false, false) => Err(DashboardError::validation(
            "Missing required fields: date, type",
        )),
    }
}

/// Current time in milliseconds, bumped past any numeric ts already in use.
///
/// When the largest id in use is `i64::MAX` the next free id at or below now
/// is taken instead.
fn next_timestamp(logs: &[LogEntry]) -> LogTimestamp {
    let now = Utc::now().timestamp_millis();
    let used: HashSet<i64> = logs
        .iter()
        .filter_map(|e| e.ts.as_ref().and_then(LogTimestamp::as_i64))
        .collect();

    let bumped = match used.iter().max() {
        Some(&latest) if latest >= now => latest.checked_add(1),
        _ => Some(now),
    };

    let ts = bumped.unwrap_or_else(|| {
        (i64::MIN..=now)
            .rev()
            .find(|candidate| !used.contains(candidate))
            .unwrap_or(now)
    });
    LogTimestamp::from(ts)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::persistence::Snapshot;
    use serde_json::json;
    use tempfile::tempdir;

    fn entry(value: Value) -> LogEntry {
        LogEntry::from_value(value).unwrap()
    }

    fn cascade_logs() -> Vec<LogEntry> {
        vec![
            entry(json!({"ts": 1, "date": "2024-01-01", "group": "A", "type": "signin"})),
            entry(json!({"ts": 2, "date": "2024-01-01", "group": "X", "type": "group-create"})),
            entry(json!({"ts": 3, "date": "2024-01-01", "group": "B", "type": "signin"})),
            entry(json!({"ts": 4, "date": "2024-01-02", "group": "A", "type": "signin"})),
        ]
    }

    fn ts_list(logs: &[LogEntry]) -> Vec<String> {
        logs.iter()
            .map(|e| e.ts.as_ref().map(|t| t.normalized()).unwrap_or_default())
            .collect()
    }

    fn manager() -> (tempfile::TempDir, Arc<DraftPublishController>, LogManager) {
        let dir = tempdir().unwrap();
        let snapshots = Arc::new(DraftPublishController::new(&StoreConfig::new(dir.path())));
        let logs = LogManager::new(Arc::clone(&snapshots));
        (dir, snapshots, logs)
    }

    fn seed(snapshots: &DraftPublishController, logs: Vec<LogEntry>) {
        snapshots
            .update(SnapshotKind::Published, |s| {
                s.logs = logs;
                Ok(())
            })
            .unwrap();
    }

    mod rules {
        use super::*;

        #[test]
        fn cascade_scenario() {
            let mut logs = cascade_logs();
            let removed = remove_by_group_and_date(&mut logs, "A", "2024-01-01");
            assert_eq!(removed, 2);
            assert_eq!(ts_list(&logs), vec!["3", "4"]);
        }

        #[test]
        fn cascade_removes_orphans_on_that_date_only() {
            let mut logs = vec![
                entry(json!({"ts": 1, "date": "2024-01-01", "type": "signin"})),
                entry(json!({"ts": 2, "date": "2024-01-01", "group": "UNKNOWNGROUP", "type": "signin"})),
                entry(json!({"ts": 3, "date": "2024-01-02", "type": "signin"})),
                entry(json!({"ts": 4, "date": "2024-01-01", "group": "a", "type": "signout"})),
                entry(json!({"ts": 5, "date": "2024-01-02", "group": "X", "type": "group-delete"})),
            ];
            let removed = remove_by_group_and_date(&mut logs, "A", "2024-01-01");
            assert_eq!(removed, 3);
            assert_eq!(ts_list(&logs), vec!["3", "5"]);
        }

        #[test]
        fn group_delete_is_case_insensitive_and_skips_groupless() {
            let mut logs = vec![
                entry(json!({"ts": 1, "date": "d", "group": "Alpha", "type": "t"})),
                entry(json!({"ts": 2, "date": "d", "type": "t"})),
                entry(json!({"ts": 3, "date": "d", "group": "ALPHA", "type": "t"})),
                entry(json!({"ts": 4, "date": "d", "group": "Beta", "type": "t"})),
            ];
            assert_eq!(remove_by_group(&mut logs, "alpha"), 2);
            assert_eq!(ts_list(&logs), vec!["2", "4"]);
        }

        #[test]
        fn timestamp_matches_across_types() {
            let mut logs = vec![
                entry(json!({"ts": 1700000000001i64, "date": "d", "type": "t"})),
                entry(json!({"ts": "1700000000002", "date": "d", "type": "t"})),
            ];
            assert_eq!(remove_by_timestamp(&mut logs, "1700000000002"), 1);
            assert_eq!(remove_by_timestamp(&mut logs, "1700000000001"), 1);
            assert!(logs.is_empty());
        }

        #[test]
        fn unknown_timestamp_removes_nothing() {
            let mut logs = cascade_logs();
            assert_eq!(remove_by_timestamp(&mut logs, "99"), 0);
            assert_eq!(logs.len(), 4);
        }

        #[test]
        fn next_timestamp_stays_unique() {
            let future = Utc::now().timestamp_millis() + 60_000;
            let logs = vec![entry(json!({"ts": future, "date": "d", "type": "t"}))];
            assert_eq!(next_timestamp(&logs).as_i64(), Some(future + 1));

            let fresh = next_timestamp(&[]).as_i64().unwrap();
            assert!(fresh > 0);
        }

        #[test]
        fn next_timestamp_after_max_id_picks_free_value() {
            let now = Utc::now().timestamp_millis();
            let logs = vec![
                entry(json!({"ts": i64::MAX, "date": "d", "type": "t"})),
                entry(json!({"ts": now, "date": "d", "type": "t"})),
            ];
            let next = next_timestamp(&logs).as_i64().unwrap();
            assert!(next < now + 1_000);
            assert_ne!(next, i64::MAX);
            assert!(next > 0);
            assert!(!logs.iter().any(|e| e.has_timestamp(&next.to_string())));
        }
    }

    mod manager {
        use super::*;

        #[test]
        fn append_after_max_timestamp_does_not_overflow() {
            let (_dir, snapshots, logs) = manager();
            seed(
                &snapshots,
                vec![
                    entry(json!({"ts": i64::MAX, "date": "d", "type": "t"})),
                    entry(json!({"ts": i64::MAX.to_string(), "date": "d", "type": "t"})),
                ],
            );

            let appended = logs
                .append_value(SnapshotKind::Published, json!({"date": "d", "type": "t"}))
                .unwrap();
            let ts = appended.ts.unwrap().as_i64().unwrap();
            assert!(ts > 0 && ts < i64::MAX);
            assert_eq!(logs.list(SnapshotKind::Published).len(), 3);
        }

        #[test]
        fn append_requires_date_and_type() {
            let (_dir, _snapshots, logs) = manager();

            let err = logs
                .append_value(SnapshotKind::Published, json!({"type": "signin"}))
                .unwrap_err();
            assert!(err.to_string().contains("date"));

            let err = logs
                .append_value(SnapshotKind::Published, json!({"date": "2024-01-01", "type": ""}))
                .unwrap_err();
            assert!(err.to_string().contains("type"));

            let err = logs
                .append_value(SnapshotKind::Published, json!("not an object"))
                .unwrap_err();
            assert!(matches!(err, DashboardError::Validation(_)));

            assert!(logs.list(SnapshotKind::Published).is_empty());
        }

        #[test]
        fn append_preserves_order_and_assigns_ts() {
            let (_dir, _snapshots, logs) = manager();

            let first = logs
                .append_value(
                    SnapshotKind::Published,
                    json!({"date": "2024-01-01", "type": "signin", "group": "A", "name": "Ann"}),
                )
                .unwrap();
            let second = logs
                .append_value(
                    SnapshotKind::Published,
                    json!({"date": "2024-01-01", "type": "signout", "group": "A"}),
                )
                .unwrap();

            assert!(first.ts.is_some());
            assert_ne!(first.ts, second.ts);

            let stored = logs.list(SnapshotKind::Published);
            assert_eq!(stored, vec![first, second]);
            assert_eq!(stored[0].extra["name"], "Ann");
        }

        #[test]
        fn append_rejects_duplicate_ts() {
            let (_dir, _snapshots, logs) = manager();
            logs.append_value(
                SnapshotKind::Published,
                json!({"ts": 7, "date": "d", "type": "t"}),
            )
            .unwrap();

            let err = logs
                .append_value(
                    SnapshotKind::Published,
                    json!({"ts": "7", "date": "d", "type": "t"}),
                )
                .unwrap_err();
            assert!(matches!(err, DashboardError::Conflict(_)));
        }

        #[test]
        fn append_to_draft_leaves_published_alone() {
            let (_dir, snapshots, logs) = manager();
            logs.append_value(SnapshotKind::Draft, json!({"date": "d", "type": "t"}))
                .unwrap();

            assert_eq!(snapshots.load_draft().logs.len(), 1);
            assert_eq!(snapshots.load_published(), Snapshot::default());
            assert!(snapshots.status().has_changes);
        }

        #[test]
        fn cascade_persists() {
            let (_dir, snapshots, logs) = manager();
            seed(&snapshots, cascade_logs());

            let removed = logs
                .delete_by_group_and_date(SnapshotKind::Published, "A", "2024-01-01")
                .unwrap();

            assert_eq!(removed, 2);
            assert_eq!(ts_list(&snapshots.load_published().logs), vec!["3", "4"]);
        }

        #[test]
        fn delete_by_timestamp_removes_one() {
            let (_dir, snapshots, logs) = manager();
            seed(&snapshots, cascade_logs());

            assert_eq!(logs.delete_by_timestamp(SnapshotKind::Published, "3").unwrap(), 1);
            assert_eq!(logs.delete_by_timestamp(SnapshotKind::Published, "3").unwrap(), 0);
            assert_eq!(logs.list(SnapshotKind::Published).len(), 3);
        }

        #[test]
        fn delete_by_group_persists() {
            let (_dir, snapshots, logs) = manager();
            seed(&snapshots, cascade_logs());

            assert_eq!(logs.delete_by_group(SnapshotKind::Published, "a").unwrap(), 2);
            assert_eq!(ts_list(&logs.list(SnapshotKind::Published)), vec!["2", "3"]);
        }

        #[test]
        fn delete_by_key_prefers_timestamp() {
            let (_dir, snapshots, logs) = manager();
            seed(&snapshots, cascade_logs());

            let by_ts = logs.delete_by_key(SnapshotKind::Published, "1").unwrap();
            assert_eq!(by_ts, KeyDeletion { removed: 1, by: DeletedBy::Timestamp });

            let by_group = logs.delete_by_key(SnapshotKind::Published, "A").unwrap();
            assert_eq!(by_group, KeyDeletion { removed: 1, by: DeletedBy::Group });

            let nothing = logs.delete_by_key(SnapshotKind::Published, "Z").unwrap();
            assert_eq!(nothing, KeyDeletion { removed: 0, by: DeletedBy::Group });

            assert_eq!(ts_list(&logs.list(SnapshotKind::Published)), vec!["2", "3"]);
        }
    }
}
