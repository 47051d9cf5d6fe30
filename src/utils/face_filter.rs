use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Expected capacity and false-positive rate.
/// Tune these based on real headcount.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// Emp ids with a registered face. Registration through this service keeps
/// the filter current; a positive answer is still confirmed against the
/// directory.
static FACE_FILTER: Lazy<RwLock<CuckooFilter<String>>> = Lazy::new(|| {
    RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE))
});

/// False until the warmup stream has drained. Before that the pre-screen
/// answers "maybe" for everything so a cold start cannot reject a genuinely
/// registered employee.
static FILTER_READY: AtomicBool = AtomicBool::new(false);

#[inline]
fn normalize(emp_id: &str) -> String {
    emp_id.trim().to_uppercase()
}

/// Whether this emp id might have a registered face (false positives
/// possible, false negatives only before warmup completes).
pub fn might_be_registered(emp_id: &str) -> bool {
    if !FILTER_READY.load(Ordering::Acquire) {
        return true;
    }

    let emp_id = normalize(emp_id);
    FACE_FILTER
        .read()
        .expect("face filter poisoned")
        .contains(&emp_id)
}

/// Record a newly registered face.
pub fn insert(emp_id: &str) {
    let emp_id = normalize(emp_id);
    FACE_FILTER
        .write()
        .expect("face filter poisoned")
        .add(&emp_id);
}

/// Drop an emp id from the filter (registration revoked externally).
pub fn remove(emp_id: &str) {
    let emp_id = normalize(emp_id);
    FACE_FILTER
        .write()
        .expect("face filter poisoned")
        .remove(&emp_id);
}

/// Warm up the filter from the directory using streaming + batching.
pub async fn warmup_face_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>(
        "SELECT emp_id FROM employees WHERE face_registered = 1",
    )
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (emp_id,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize(&emp_id));
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    FILTER_READY.store(true, Ordering::Release);
    tracing::info!("Face filter warmup complete: {} registered employees", total);
    Ok(())
}

/// Insert a batch of normalized emp ids.
fn insert_batch(emp_ids: &[String]) {
    let mut filter = FACE_FILTER.write().expect("face filter poisoned");

    for emp_id in emp_ids {
        filter.add(emp_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwarmed_filter_answers_maybe() {
        // Warmup never runs in unit tests, so everything passes the screen.
        assert!(might_be_registered("EMP-UNKNOWN"));
    }

    #[test]
    fn insert_then_contains_after_normalization() {
        insert(" emp-042 ");
        let filter = FACE_FILTER.read().expect("face filter poisoned");
        assert!(filter.contains(&"EMP-042".to_string()));
    }
}
