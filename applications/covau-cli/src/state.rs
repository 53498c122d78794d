//! Ids of the persisted queue, kept between runs
use anyhow::Context;
use covau_queue::SyncIds;
use std::io::ErrorKind;
use std::path::Path;

/// Read the ids saved by a previous run, or defaults when there was none
pub async fn load_ids(path: &Path) -> anyhow::Result<SyncIds> {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .with_context(|| format!("Corrupt state file {}", path.display())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(SyncIds::default()),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

pub async fn save_ids(path: &Path, ids: SyncIds) -> anyhow::Result<()> {
    let json = serde_json::to_vec_pretty(&ids)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}
