use rusqlite_migration::{Migrations, M};

pub fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(
        "CREATE TABLE executions (
            id              TEXT PRIMARY KEY,
            job_code        TEXT NOT NULL,
            name            TEXT NOT NULL,
            source          TEXT NOT NULL,
            target          TEXT NOT NULL,
            options_json    TEXT NOT NULL DEFAULT '{}',
            state           TEXT NOT NULL,
            result          TEXT NOT NULL,
            status          TEXT NOT NULL,
            started_at      INTEGER,
            finished_at     INTEGER
        );

        CREATE TABLE execution_logs (
            execution_id    TEXT NOT NULL,
            seq             INTEGER NOT NULL,
            level           TEXT NOT NULL,
            message         TEXT NOT NULL,
            PRIMARY KEY (execution_id, seq),
            FOREIGN KEY (execution_id) REFERENCES executions(id)
        );

        CREATE INDEX idx_executions_job ON executions(job_code);
        CREATE INDEX idx_executions_finished ON executions(finished_at);",
    )])
}
