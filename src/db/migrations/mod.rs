use anyhow::Result;
use sqlx::PgPool;
use tracing::info;

const CREATE_REVIEW_LOGS: &str = r#"
CREATE TABLE IF NOT EXISTS review_logs (
    id UUID PRIMARY KEY,
    camera_number TEXT NOT NULL,
    date TEXT NOT NULL,
    time TEXT NOT NULL,
    violation TEXT NOT NULL,
    violation_id TEXT NOT NULL,
    url TEXT,
    confidence DOUBLE PRECISION,
    status TEXT NOT NULL DEFAULT 'Pending',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

const CREATE_VIOLATION_ID_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_review_logs_violation_id
    ON review_logs (violation_id)
"#;

/// Create the review log schema if it doesn't exist yet
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::query(CREATE_REVIEW_LOGS).execute(pool).await?;
    sqlx::query(CREATE_VIOLATION_ID_INDEX).execute(pool).await?;
    info!("Review log schema is up to date");
    Ok(())
}
