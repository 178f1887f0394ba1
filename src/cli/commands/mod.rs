mod check;
mod delete;
mod init;
mod list;

pub use check::cmd_check;
pub use delete::cmd_delete_video;
pub use init::cmd_init;
pub use list::cmd_list_videos;

use crate::config::Config;
use crate::storage::{StorageLayout, VideoStore};

/// Opens the stores without starting the media tool or the thumbnail workers.
fn open_store(config: &Config) -> anyhow::Result<VideoStore> {
    let layout = StorageLayout::from_config(&config.storage)
        .prepare()
        .map_err(|e| anyhow::anyhow!("Failed to prepare storage: {e}"))?;

    Ok(VideoStore::new(&layout, &config.video.allowed_extensions))
}
