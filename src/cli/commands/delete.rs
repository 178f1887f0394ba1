//! Delete video command handler

use crate::config::Config;
use crate::domain::ArtifactOutcome;
use crate::storage::path_guard;

pub async fn cmd_delete_video(config: &Config, id: &str) -> anyhow::Result<()> {
    path_guard::validate_file_name(id).map_err(|e| anyhow::anyhow!("Invalid video ID: {e}"))?;

    let store = super::open_store(config)?;
    let report = store.delete(id).await;

    println!("Deleting video {id}");
    for (artifact, outcome) in [
        ("video", &report.video),
        ("metadata", &report.metadata),
        ("thumbnail", &report.thumbnail),
    ] {
        let status = match outcome {
            ArtifactOutcome::Deleted => "deleted".to_string(),
            ArtifactOutcome::Absent => "not present".to_string(),
            ArtifactOutcome::Rejected(reason) => format!("rejected ({reason})"),
            ArtifactOutcome::Failed(reason) => format!("FAILED ({reason})"),
        };
        println!("  {artifact:<10} {status}");
    }

    if !report.is_complete() {
        anyhow::bail!("Some artifacts of {id} could not be removed");
    }

    Ok(())
}
