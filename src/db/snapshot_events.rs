use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use rusqlite::params;

use crate::memory::ContextSnapshot;

use super::{
    connection::EventLog,
    helpers::{decode_list, from_epoch_secs, to_u64},
};

impl EventLog {
    pub async fn insert_snapshot(&self, snapshot: &ContextSnapshot) -> Result<()> {
        let record = snapshot.clone();
        self.execute(move |conn| {
            let files_json = serde_json::to_string(&record.recent_files)
                .context("failed to serialize recent files")?;
            let processes_json = serde_json::to_string(&record.top_processes)
                .context("failed to serialize top processes")?;

            conn.execute(
                "INSERT INTO snapshot_events (
                    timestamp,
                    window_title,
                    recent_files_json,
                    top_processes_json,
                    created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.timestamp.timestamp(),
                    record.window,
                    files_json,
                    processes_json,
                    Utc::now().to_rfc3339(),
                ],
            )
            .context("failed to insert snapshot event")?;
            Ok(())
        })
        .await
    }

    /// Events strictly newer than `since` (all events when `None`), oldest first.
    pub async fn snapshots_since(
        &self,
        since: Option<DateTime<Local>>,
    ) -> Result<Vec<ContextSnapshot>> {
        let since_secs = since.map(|ts| ts.timestamp()).unwrap_or(i64::MIN);
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT timestamp, window_title, recent_files_json, top_processes_json
                 FROM snapshot_events
                 WHERE timestamp > ?1
                 ORDER BY timestamp ASC, id ASC",
            )?;

            let mut rows = stmt.query(params![since_secs])?;
            let mut snapshots = Vec::new();
            while let Some(row) = rows.next()? {
                let timestamp = from_epoch_secs(row.get::<_, i64>(0)?, "timestamp")?;
                snapshots.push(ContextSnapshot {
                    timestamp,
                    window: row.get(1)?,
                    recent_files: decode_list(&row.get::<_, String>(2)?, "recent_files_json")?,
                    top_processes: decode_list(&row.get::<_, String>(3)?, "top_processes_json")?,
                });
            }

            Ok(snapshots)
        })
        .await
    }

    /// Delete events at or before `through`; they are covered by the main store.
    pub async fn prune_through(&self, through: DateTime<Local>) -> Result<usize> {
        let through_secs = through.timestamp();
        self.execute(move |conn| {
            let removed = conn
                .execute(
                    "DELETE FROM snapshot_events WHERE timestamp <= ?1",
                    params![through_secs],
                )
                .context("failed to prune snapshot events")?;
            Ok(removed)
        })
        .await
    }

    pub async fn count(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM snapshot_events", [], |row| row.get(0))?;
            to_u64(count, "count")
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot(minute: u32, window: &str) -> ContextSnapshot {
        ContextSnapshot::new(
            Local.with_ymd_and_hms(2024, 3, 4, 10, minute, 0).unwrap(),
            window,
            vec!["a.py".into()],
            vec!["code".into()],
        )
    }

    #[tokio::test]
    async fn insert_query_and_prune() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::open(dir.path().join("events.sqlite3")).unwrap();

        for (minute, window) in [(0, "A"), (1, "B"), (2, "C")] {
            log.insert_snapshot(&snapshot(minute, window)).await.unwrap();
        }
        assert_eq!(log.count().await.unwrap(), 3);

        let all = log.snapshots_since(None).await.unwrap();
        assert_eq!(all, vec![snapshot(0, "A"), snapshot(1, "B"), snapshot(2, "C")]);

        let newer = log.snapshots_since(Some(snapshot(0, "A").timestamp)).await.unwrap();
        assert_eq!(newer.len(), 2);

        let removed = log.prune_through(snapshot(1, "B").timestamp).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(log.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn reopening_keeps_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.sqlite3");
        {
            let log = EventLog::open(path.clone()).unwrap();
            log.insert_snapshot(&snapshot(5, "A")).await.unwrap();
        }
        let log = EventLog::open(path).unwrap();
        assert_eq!(log.count().await.unwrap(), 1);
    }
}
