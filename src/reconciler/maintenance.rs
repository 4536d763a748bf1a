use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::db::filter::Filter;
use crate::db::models::JOB_HISTORY;
use crate::db::store::{document_id, DocumentStore, FindOptions, SortOrder, StoreError, ID_FIELD};

/// Delete duplicate history records left behind by racing sweeps.
///
/// Records are grouped by `original_job_id`; the one with the latest
/// `moved_to_history_date` survives. Returns how many records were removed.
pub async fn remove_duplicate_history(store: &Arc<dyn DocumentStore>) -> Result<u64, StoreError> {
    let records = store
        .find(
            JOB_HISTORY,
            &Filter::new(),
            FindOptions::default().sorted_by("moved_to_history_date", SortOrder::Descending),
        )
        .await?;

    let mut groups: HashMap<String, Vec<String>> = HashMap::new();
    for record in &records {
        let (Some(original), Some(id)) = (
            record.get("original_job_id").and_then(Value::as_str),
            document_id(record),
        ) else {
            warn!("Skipping history record without original_job_id or key");
            continue;
        };
        groups
            .entry(original.to_string())
            .or_default()
            .push(id.to_string());
    }

    let mut removed = 0;
    for (original, ids) in groups {
        if ids.len() < 2 {
            continue;
        }
        info!(
            "Found {} history records for original job {}, keeping {}",
            ids.len(),
            original,
            ids[0]
        );
        for id in &ids[1..] {
            removed += store
                .delete_one(JOB_HISTORY, &Filter::new().eq(ID_FIELD, id.as_str()))
                .await?;
        }
    }

    info!("Removed {} duplicate history records", removed);
    Ok(removed)
}
