use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::RunSummary;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn load_pointer(pool: &PgPool, key: &str) -> anyhow::Result<u64> {
    let row = sqlx::query("SELECT value FROM mentor_assign.settings WHERE key = $1")
        .bind(key)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("failed to read pointer {key}"))?;

    let value: i64 = match row {
        Some(row) => row.get("value"),
        None => 0,
    };
    u64::try_from(value).with_context(|| format!("pointer {key} is negative: {value}"))
}

pub async fn save_pointer(pool: &PgPool, key: &str, value: u64) -> anyhow::Result<()> {
    let value = i64::try_from(value).context("pointer does not fit in BIGINT")?;
    sqlx::query(
        r#"
        INSERT INTO mentor_assign.settings (key, value, updated_at)
        VALUES ($1, $2, now())
        ON CONFLICT (key) DO UPDATE
        SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await
    .with_context(|| format!("failed to write pointer {key}"))?;
    Ok(())
}

pub async fn record_run(
    pool: &PgPool,
    week_label: &str,
    ran_at: DateTime<Utc>,
    summary: &RunSummary,
    pointer_after: u64,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let count = |n: usize| i32::try_from(n).unwrap_or(i32::MAX);

    sqlx::query(
        r#"
        INSERT INTO mentor_assign.runs
        (id, week_label, ran_at, rows_read, skipped_staff, skipped_off_roster,
         struggling, written, pointer_after)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(id)
    .bind(week_label)
    .bind(ran_at)
    .bind(count(summary.rows_read))
    .bind(count(summary.skipped_staff))
    .bind(count(summary.skipped_off_roster))
    .bind(count(summary.struggling))
    .bind(count(summary.written))
    .bind(i64::try_from(pointer_after).unwrap_or(i64::MAX))
    .execute(pool)
    .await
    .context("failed to record run")?;

    Ok(id)
}
