use anyhow::Result;
use chrono::NaiveDateTime;
use futures::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

/// Cached face-registration status. Only registered employees are stored;
/// a miss means "ask the directory".
#[derive(Debug, Clone)]
pub struct FaceStatus {
    pub registered: bool,
    pub registered_at: Option<NaiveDateTime>,
}

pub static STATUS_CACHE: Lazy<Cache<String, FaceStatus>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(500_000) // tune based on memory
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

/// Record a registration status for an emp id.
pub async fn store(emp_id: &str, status: FaceStatus) {
    STATUS_CACHE.insert(emp_id.trim().to_uppercase(), status).await;
}

/// Cached status, if any.
pub async fn lookup(emp_id: &str) -> Option<FaceStatus> {
    STATUS_CACHE.get(&emp_id.trim().to_uppercase()).await
}

/// Batch store statuses.
async fn batch_store(rows: Vec<(String, FaceStatus)>) {
    let futures: Vec<_> = rows
        .into_iter()
        .map(|(emp_id, status)| STATUS_CACHE.insert(emp_id.trim().to_uppercase(), status))
        .collect();

    // Await all insertions concurrently
    futures::future::join_all(futures).await;
}

/// Load registered employees into the in-memory cache (batched).
pub async fn warmup_status_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String, Option<NaiveDateTime>)>(
        r#"
        SELECT emp_id, face_registered_at
        FROM employees
        WHERE face_registered = 1
        "#,
    )
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (emp_id, registered_at) = row?;
        batch.push((
            emp_id,
            FaceStatus {
                registered: true,
                registered_at,
            },
        ));
        total_count += 1;

        if batch.len() >= batch_size {
            batch_store(std::mem::take(&mut batch)).await;
        }
    }

    // Insert any remaining rows
    if !batch.is_empty() {
        batch_store(batch).await;
    }

    tracing::info!(
        "Face status cache warmup complete: {} registered employees",
        total_count
    );

    Ok(())
}
