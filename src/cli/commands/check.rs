//! Check command handler

use crate::config::Config;
use crate::services::media::resolve_executable;
use crate::storage::StorageLayout;

pub fn cmd_check(config: &Config) -> anyhow::Result<()> {
    let mut problems = 0;

    match config.validate() {
        Ok(()) => println!("✓ Config is valid"),
        Err(e) => {
            println!("✗ Config: {e}");
            problems += 1;
        }
    }

    match StorageLayout::from_config(&config.storage).prepare() {
        Ok(layout) => {
            println!("✓ Storage ready");
            for (name, dir) in [
                ("uploads", &layout.uploads),
                ("temp", &layout.temp),
                ("logs", &layout.logs),
                ("thumbnails", &layout.thumbnails),
                ("metadata", &layout.metadata),
            ] {
                println!("  {name:<11} {}", dir.display());
            }
        }
        Err(e) => {
            println!("✗ Storage: {e}");
            problems += 1;
        }
    }

    match resolve_executable(&config.ffmpeg.path) {
        Ok(path) => println!("✓ ffmpeg found at {}", path.display()),
        Err(e) => {
            println!("✗ ffmpeg: {e}");
            problems += 1;
        }
    }

    if problems > 0 {
        anyhow::bail!("{problems} check(s) failed");
    }

    Ok(())
}
