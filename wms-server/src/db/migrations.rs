//! Schema creation
//!
//! Every statement is idempotent, so this runs at each server start and
//! from `wms db migrate`.

use sqlx::PgPool;

use super::DbError;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS job_types (
        id BIGSERIAL PRIMARY KEY,
        job_name TEXT NOT NULL UNIQUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sub_job_types (
        id BIGSERIAL PRIMARY KEY,
        main_job_id BIGINT NOT NULL REFERENCES job_types(id) ON DELETE CASCADE,
        sub_job_name TEXT NOT NULL,
        description TEXT,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (main_job_id, sub_job_name)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS job_dependencies (
        id BIGSERIAL PRIMARY KEY,
        job_id BIGINT NOT NULL REFERENCES job_types(id) ON DELETE CASCADE,
        required_job_id BIGINT NOT NULL REFERENCES job_types(id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (job_id, required_job_id),
        CHECK (job_id <> required_job_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS scan_logs (
        id BIGSERIAL PRIMARY KEY,
        barcode TEXT NOT NULL,
        scan_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        job_type TEXT NOT NULL,
        user_id TEXT NOT NULL,
        job_id BIGINT REFERENCES job_types(id),
        sub_job_id BIGINT REFERENCES sub_job_types(id),
        notes TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_scan_logs_key ON scan_logs (barcode, job_id, sub_job_id)",
    "CREATE INDEX IF NOT EXISTS idx_scan_logs_scan_date ON scan_logs (scan_date)",
    r#"
    CREATE TABLE IF NOT EXISTS audit_logs (
        id BIGSERIAL PRIMARY KEY,
        scan_record_id BIGINT NOT NULL,
        action_type TEXT NOT NULL CHECK (action_type IN ('UPDATE', 'DELETE')),
        old_values JSONB,
        new_values JSONB,
        changed_by TEXT NOT NULL,
        change_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        notes TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_audit_logs_change_date ON audit_logs (change_date)",
    r#"
    CREATE TABLE IF NOT EXISTS notification_data (
        id BIGSERIAL PRIMARY KEY,
        barcode TEXT NOT NULL,
        event_type TEXT NOT NULL DEFAULT 'scan',
        popup_type TEXT NOT NULL DEFAULT 'info',
        title TEXT,
        message TEXT NOT NULL,
        is_enabled BOOLEAN NOT NULL DEFAULT TRUE,
        created_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        created_by TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_notification_barcode ON notification_data (barcode)",
    r#"
    CREATE TABLE IF NOT EXISTS sound_settings (
        id BIGSERIAL PRIMARY KEY,
        job_id BIGINT REFERENCES job_types(id) ON DELETE CASCADE,
        sub_job_id BIGINT REFERENCES sub_job_types(id) ON DELETE CASCADE,
        event_type TEXT NOT NULL,
        sound_file TEXT NOT NULL,
        volume REAL NOT NULL DEFAULT 0.8,
        is_enabled BOOLEAN NOT NULL DEFAULT TRUE,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    // NULL ids compare equal through COALESCE
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_sound_settings_key
        ON sound_settings ((COALESCE(job_id, 0)), (COALESCE(sub_job_id, 0)), event_type)
    "#,
];

/// Run all migrations
pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Running WMS migrations...");

    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!(statements = STATEMENTS.len(), "migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_statement_is_idempotent() {
        for statement in STATEMENTS {
            let s = statement.to_uppercase();
            assert!(s.contains("IF NOT EXISTS"), "not idempotent: {}", statement);
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn migrations_run_twice() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.expect("pool");
        run(&pool).await.expect("first run");
        run(&pool).await.expect("second run");
    }
}
