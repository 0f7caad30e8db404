use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use catalog_sync::{
    ExecutionJournal, Feedback, JournalError, ResultCode, StatusCode, SyncExecution, SyncOptions,
    SyncOutcome,
};

use crate::schema;

/// How fresh the last clean synchronization of a job is.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncStatus {
    NeverSynced,
    Stale { days_old: u64 },
    Fresh { days_old: u64 },
}

/// Threshold in days before a synchronization is considered stale.
pub const STALE_THRESHOLD_DAYS: u64 = 7;

/// A finished execution as kept in the journal.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRecord {
    pub id: String,
    pub job_code: String,
    pub name: String,
    pub source: String,
    pub target: String,
    pub options: SyncOptions,
    pub state: String,
    pub outcome: SyncOutcome,
    pub started_at: Option<u64>,
    pub finished_at: Option<u64>,
}

/// A SQLite-backed execution journal.
pub struct ExecutionStore {
    conn: Mutex<rusqlite::Connection>,
}

impl ExecutionStore {
    /// Open a store backed by a file on disk.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = rusqlite::Connection::open(path)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = rusqlite::Connection::open_in_memory()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&mut self) -> Result<(), StoreError> {
        let conn = self
            .conn
            .get_mut()
            .map_err(|_| StoreError::Database("connection lock poisoned".into()))?;
        schema::migrations()
            .to_latest(conn)
            .map_err(|e| StoreError::Migration(e.to_string()))
    }

    fn conn(&self) -> Result<MutexGuard<'_, rusqlite::Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".into()))
    }

    /// Insert an execution and its log lines, replacing any earlier copy.
    pub fn record_execution(
        &self,
        execution: &SyncExecution,
        log: &[Feedback],
    ) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let options_json = serde_json::to_string(execution.options())
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let job = execution.job();

        let tx = conn
            .transaction()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tx.execute(
            "INSERT OR REPLACE INTO executions
                (id, job_code, name, source, target, options_json, state, result, status,
                 started_at, finished_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                execution.id().as_str(),
                job.code(),
                execution.name(),
                job.source.to_string(),
                job.target.to_string(),
                options_json,
                execution.state().as_str(),
                execution.result().as_str(),
                execution.status().as_str(),
                execution.started_at().map(to_sql_secs),
                execution.finished_at().map(to_sql_secs),
            ],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        tx.execute(
            "DELETE FROM execution_logs WHERE execution_id = ?1",
            [execution.id().as_str()],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        for (seq, line) in log.iter().enumerate() {
            tx.execute(
                "INSERT INTO execution_logs (execution_id, seq, level, message)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    execution.id().as_str(),
                    seq as i64,
                    line.level(),
                    line.message()
                ],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;
        }

        tx.commit().map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(execution = %execution.id(), lines = log.len(), "recorded execution");
        Ok(())
    }

    /// Most recent executions first.
    pub fn history(&self, limit: usize) -> Result<Vec<ExecutionRecord>, StoreError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, job_code, name, source, target, options_json, state, result, status,
                        started_at, finished_at
                 FROM executions
                 ORDER BY COALESCE(finished_at, started_at, 0) DESC, rowid DESC
                 LIMIT ?1",
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let records = stmt
            .query_map([limit as i64], Self::row_to_record)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(records)
    }

    /// The latest execution recorded for a job.
    pub fn last_for(&self, job_code: &str) -> Result<Option<ExecutionRecord>, StoreError> {
        let conn = self.conn()?;

        let result = conn.query_row(
            "SELECT id, job_code, name, source, target, options_json, state, result, status,
                    started_at, finished_at
             FROM executions
             WHERE job_code = ?1
             ORDER BY COALESCE(finished_at, started_at, 0) DESC, rowid DESC
             LIMIT 1",
            [job_code],
            Self::row_to_record,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e.to_string())),
        }
    }

    /// Log lines kept for an execution, in emission order.
    pub fn logs_for(&self, execution_id: &str) -> Result<Vec<Feedback>, StoreError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT level, message FROM execution_logs
                 WHERE execution_id = ?1
                 ORDER BY seq",
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let lines = stmt
            .query_map([execution_id], |row| {
                let level: String = row.get(0)?;
                let message: String = row.get(1)?;
                Ok(Feedback::from_level(&level, message))
            })
            .map_err(|e| StoreError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(lines)
    }

    /// Freshness of the last clean (`SUCCESS/FINISHED`) run of a job.
    pub fn sync_status(&self, job_code: &str) -> Result<SyncStatus, StoreError> {
        let conn = self.conn()?;

        let result: Option<i64> = conn
            .query_row(
                "SELECT MAX(finished_at) FROM executions
                 WHERE job_code = ?1 AND result = ?2 AND status = ?3",
                rusqlite::params![
                    job_code,
                    ResultCode::Success.as_str(),
                    StatusCode::Finished.as_str()
                ],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        match result {
            None => Ok(SyncStatus::NeverSynced),
            Some(finished_at) => {
                let days_old = days_since(from_sql_secs(finished_at));
                if days_old >= STALE_THRESHOLD_DAYS {
                    Ok(SyncStatus::Stale { days_old })
                } else {
                    Ok(SyncStatus::Fresh { days_old })
                }
            }
        }
    }

    /// Set the finish time of an execution manually (for testing staleness).
    pub fn set_finished_at(&self, execution_id: &str, epoch_secs: u64) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE executions SET finished_at = ?2 WHERE id = ?1",
            rusqlite::params![execution_id, to_sql_secs(epoch_secs)],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<ExecutionRecord> {
        let options_json: String = row.get(5)?;
        let result: String = row.get(7)?;
        let status: String = row.get(8)?;
        let started_at: Option<i64> = row.get(9)?;
        let finished_at: Option<i64> = row.get(10)?;

        Ok(ExecutionRecord {
            id: row.get(0)?,
            job_code: row.get(1)?,
            name: row.get(2)?,
            source: row.get(3)?,
            target: row.get(4)?,
            options: serde_json::from_str(&options_json).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    5,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
            state: row.get(6)?,
            outcome: SyncOutcome::new(ResultCode::parse(&result), StatusCode::parse(&status)),
            started_at: started_at.map(from_sql_secs),
            finished_at: finished_at.map(from_sql_secs),
        })
    }
}

#[async_trait::async_trait]
impl ExecutionJournal for ExecutionStore {
    async fn record(
        &self,
        execution: &SyncExecution,
        log: &[Feedback],
    ) -> Result<(), JournalError> {
        self.record_execution(execution, log)
            .map_err(|e| JournalError::Storage(e.to_string()))
    }
}

/// Errors specific to store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("migration error: {0}")]
    Migration(String),
}

fn to_sql_secs(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}

fn from_sql_secs(secs: i64) -> u64 {
    u64::try_from(secs).unwrap_or(0)
}

fn days_since(epoch_secs: u64) -> u64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    now.saturating_sub(epoch_secs) / 86400
}

#[cfg(test)]
mod tests {
    use catalog_sync::{CatalogVersion, JobHandle};

    use super::*;

    fn recorded_store() -> (ExecutionStore, SyncExecution) {
        let store = ExecutionStore::open_in_memory().unwrap();
        let mut exec = SyncExecution::new(
            JobHandle::new(
                "sync-spa-online",
                CatalogVersion::new("electronics-spaContentCatalog", "Staged"),
                CatalogVersion::new("electronics-spaContentCatalog", "Online"),
            ),
            "electronics-spa",
        );
        exec.configure(SyncOptions::default()).unwrap();
        exec.start().unwrap();
        exec.finish(ResultCode::Success, StatusCode::Finished).unwrap();
        store.record_execution(&exec, &[]).unwrap();
        (store, exec)
    }

    #[test]
    fn corrupt_options_column_is_an_error() {
        let (store, exec) = recorded_store();
        store
            .conn()
            .unwrap()
            .execute(
                "UPDATE executions SET options_json = 'not json' WHERE id = ?1",
                [exec.id().as_str()],
            )
            .unwrap();

        assert!(matches!(store.history(10), Err(StoreError::Database(_))));
        assert!(matches!(
            store.last_for("sync-spa-online"),
            Err(StoreError::Database(_))
        ));
    }

    #[test]
    fn sync_status_reports_database_errors() {
        let (store, _) = recorded_store();
        store
            .conn()
            .unwrap()
            .execute_batch("DROP TABLE execution_logs; DROP TABLE executions;")
            .unwrap();

        assert!(matches!(
            store.sync_status("sync-spa-online"),
            Err(StoreError::Database(_))
        ));
        assert!(matches!(
            store.logs_for("anything"),
            Err(StoreError::Database(_))
        ));
    }
}
