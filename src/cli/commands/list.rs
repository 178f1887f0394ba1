//! List videos command handler

use crate::config::Config;

pub async fn cmd_list_videos(config: &Config) -> anyhow::Result<()> {
    let store = super::open_store(config)?;
    let videos = store.metadata().list().await?;

    if videos.is_empty() {
        println!("No videos stored.");
        println!();
        println!("Upload one through the web UI or POST /api/videos");
        return Ok(());
    }

    println!("Videos ({} total)", videos.len());
    println!("{:-<70}", "");

    for video in videos {
        let title = if video.title.is_empty() {
            "(untitled)"
        } else {
            video.title.as_str()
        };

        println!("• {} [{:.1}s]", title, video.duration);
        println!(
            "  ID: {} | File: {} | Added: {}",
            video.id,
            video.filename,
            video.created_at.format("%Y-%m-%d %H:%M")
        );
        println!("  Tags: {}", video.tags.join(", "));
    }

    Ok(())
}
