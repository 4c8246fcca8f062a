//! Schema initialization for the counter table

use sqlx::PgPool;

/// Create the counter table and seed its single row.
///
/// Idempotent: on an initialized database this only runs the existence
/// checks.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("CREATE TABLE IF NOT EXISTS counter (value int)")
        .execute(pool)
        .await?;

    let seeded = sqlx::query(
        r#"
        INSERT INTO counter (value)
        SELECT 0
        WHERE NOT EXISTS (SELECT 1 FROM counter)
        "#,
    )
    .execute(pool)
    .await?
    .rows_affected();

    if seeded > 0 {
        tracing::info!("Seeded counter row");
    }
    Ok(())
}
