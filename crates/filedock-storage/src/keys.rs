//! Shared key generation for storage backends.
//!
//! Every batch is bound to one storage location, derived deterministically
//! from the owning account, the site's domain, and the batch start time
//! truncated to the minute:
//! `sites/{account_id}/{domain}/{YYYY-MM-DD}/{HHMM}/`. Two batches started in
//! the same minute by different sites never collide because their domains
//! differ; same-site collisions are prevented by admission control.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Storage location (write prefix) for a batch.
pub fn batch_storage_location(
    account_id: Uuid,
    domain: &str,
    started_at: DateTime<Utc>,
) -> String {
    format!(
        "sites/{}/{}/{}/",
        account_id,
        sanitize_domain(domain),
        started_at.format("%Y-%m-%d/%H%M")
    )
}

/// Full blob key for one file within a batch's storage location.
pub fn file_storage_key(storage_location: &str, file_name: &str) -> String {
    format!("{}{}", storage_location, file_name)
}

/// Normalize a site domain into a key-safe path segment: lowercase, with
/// anything outside `[a-z0-9.-]` replaced by `-` and empty dot-segments
/// dropped (so a hostile domain can never smuggle `..` into a key).
fn sanitize_domain(domain: &str) -> String {
    let lowered: String = domain
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '.' | '-' => c,
            _ => '-',
        })
        .collect();
    lowered
        .split('.')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}
