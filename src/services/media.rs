//! Media inspection backed by an external `ffmpeg` executable.

use crate::constants::thumbnails;
use crate::models::media::VideoInfo;
use crate::storage::path_guard::{self, SecurityError};
use regex::Regex;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum InspectionError {
    #[error("invalid media executable {0:?}")]
    InvalidExecutable(String),

    #[error("media executable {0:?} not found")]
    ExecutableNotFound(String),

    #[error(transparent)]
    Security(#[from] SecurityError),

    #[error("thumbnail timestamp must be a non-negative number, got {0}")]
    InvalidTimestamp(f64),

    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("video file {} does not exist", .0.display())]
    MissingInput(PathBuf),
}

/// Probes videos and extracts still frames.
#[async_trait::async_trait]
pub trait MediaInspector: Send + Sync {
    /// Reads duration, resolution and codecs. Missing values default to zero
    /// or empty.
    async fn probe(&self, video_path: &Path) -> Result<VideoInfo, InspectionError>;

    /// Writes a JPEG frame taken `timestamp_secs` into the video.
    async fn thumbnail(
        &self,
        video_path: &Path,
        output_path: &Path,
        timestamp_secs: f64,
    ) -> Result<(), InspectionError>;

    /// The file must exist and be probeable.
    async fn validate_video(&self, video_path: &Path) -> Result<VideoInfo, InspectionError> {
        if !tokio::fs::try_exists(video_path).await.unwrap_or(false) {
            return Err(InspectionError::MissingInput(video_path.to_path_buf()));
        }
        self.probe(video_path).await
    }

    fn is_available(&self) -> bool;
}

/// Runs `ffmpeg` with every file argument confined to the storage roots.
#[derive(Debug, Clone)]
pub struct FfmpegInspector {
    executable: String,
    resolved: PathBuf,
    allowed_roots: Vec<PathBuf>,
}

impl FfmpegInspector {
    /// Validates and locates the executable. Failure here is a configuration
    /// error and should stop startup.
    pub fn new(executable: &str, allowed_roots: Vec<PathBuf>) -> Result<Self, InspectionError> {
        let resolved = resolve_executable(executable)?;
        debug!("Using media executable {:?}", resolved);

        Ok(Self {
            executable: executable.to_string(),
            resolved,
            allowed_roots,
        })
    }

    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.resolved
    }

    fn guard_argument(&self, arg: &OsStr) -> Result<(), SecurityError> {
        let path = Path::new(arg);

        if self.allowed_roots.is_empty() || !path.is_absolute() {
            return path_guard::check_characters(&arg.to_string_lossy());
        }

        let mut rejection = None;
        for root in &self.allowed_roots {
            match path_guard::validate(path, root) {
                Ok(()) => return Ok(()),
                Err(e) if rejection.is_none() => rejection = Some(e),
                Err(_) => {}
            }
        }

        Err(rejection.unwrap_or(SecurityError::EmptyPath))
    }

    async fn run(&self, args: Vec<OsString>) -> Result<String, InspectionError> {
        validate_executable_path(&self.executable)?;
        if !self.resolved.is_file() {
            return Err(InspectionError::ExecutableNotFound(self.executable.clone()));
        }

        for arg in &args {
            if arg.to_string_lossy().starts_with('-') {
                continue;
            }
            self.guard_argument(arg)?;
        }

        let output = Command::new(&self.resolved)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| InspectionError::Spawn {
                tool: self.executable.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            debug!(tool = %self.executable, stderr = %stderr, "Media tool failed");
            return Err(InspectionError::Failed {
                tool: self.executable.clone(),
                status: output.status.to_string(),
                stderr,
            });
        }

        Ok(stderr)
    }
}

#[async_trait::async_trait]
impl MediaInspector for FfmpegInspector {
    async fn probe(&self, video_path: &Path) -> Result<VideoInfo, InspectionError> {
        let args = vec![
            OsString::from("-hide_banner"),
            OsString::from("-nostdin"),
            OsString::from("-i"),
            video_path.as_os_str().to_os_string(),
            OsString::from("-f"),
            OsString::from("null"),
            OsString::from("-"),
        ];

        let output = self.run(args).await?;
        let info = parse_probe_output(&output);

        debug!(
            "Probed {:?}: {} ({}), {:.2}s",
            video_path,
            info.resolution_str(),
            info.video_codec,
            info.duration
        );

        Ok(info)
    }

    async fn thumbnail(
        &self,
        video_path: &Path,
        output_path: &Path,
        timestamp_secs: f64,
    ) -> Result<(), InspectionError> {
        if !timestamp_secs.is_finite() || timestamp_secs < 0.0 {
            return Err(InspectionError::InvalidTimestamp(timestamp_secs));
        }

        let args = vec![
            OsString::from("-y"),
            OsString::from("-i"),
            video_path.as_os_str().to_os_string(),
            OsString::from("-ss"),
            OsString::from(format!("{timestamp_secs:.2}")),
            OsString::from("-vframes"),
            OsString::from("1"),
            OsString::from("-q:v"),
            OsString::from(thumbnails::JPEG_QUALITY),
            output_path.as_os_str().to_os_string(),
        ];

        self.run(args).await?;
        debug!("Thumbnail written to {:?}", output_path);
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.resolved.is_file()
    }
}

fn validate_executable_path(executable: &str) -> Result<(), InspectionError> {
    if executable.trim().is_empty() {
        return Err(InspectionError::InvalidExecutable(executable.to_string()));
    }

    path_guard::check_characters(executable).map_err(|e| {
        warn!("Rejected media executable {:?}: {}", executable, e);
        InspectionError::InvalidExecutable(executable.to_string())
    })
}

/// Absolute paths must exist; bare names are looked up on `PATH`.
pub fn resolve_executable(executable: &str) -> Result<PathBuf, InspectionError> {
    validate_executable_path(executable)?;

    let path = Path::new(executable);
    if path.is_absolute() {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(InspectionError::ExecutableNotFound(executable.to_string()))
        };
    }

    which::which(executable)
        .map_err(|_| InspectionError::ExecutableNotFound(executable.to_string()))
}

fn resolution_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:^|[\s,])(\d{2,5})x(\d{2,5})(?:[\s,\[]|$)")
            .expect("Invalid regex pattern defined in code")
    })
}

fn value_after<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    line.find(marker).map(|idx| &line[idx + marker.len()..])
}

fn first_field(value: &str) -> &str {
    value.split(',').next().unwrap_or_default().trim()
}

fn parse_duration(value: &str) -> f64 {
    let parts: Vec<&str> = first_field(value).split(':').collect();
    if parts.len() != 3 {
        return 0.0;
    }

    let hours = parts[0].parse::<f64>().unwrap_or(0.0);
    let minutes = parts[1].parse::<f64>().unwrap_or(0.0);
    let seconds = parts[2].parse::<f64>().unwrap_or(0.0);
    hours.mul_add(3600.0, minutes * 60.0) + seconds
}

/// Parses the diagnostic output `ffmpeg -i <file>` prints on stderr.
///
/// Only the first occurrence of each field is used.
pub fn parse_probe_output(output: &str) -> VideoInfo {
    let mut info = VideoInfo::default();
    let mut seen_duration = false;

    for line in output.lines() {
        if !seen_duration && let Some(value) = value_after(line, "Duration: ") {
            info.duration = parse_duration(value);
            seen_duration = true;
        }

        if info.video_codec.is_empty()
            && let Some(value) = value_after(line, "Video: ")
        {
            info.video_codec = first_field(value).to_string();

            if let Some(caps) = resolution_regex().captures(value) {
                info.width = caps[1].parse().unwrap_or(0);
                info.height = caps[2].parse().unwrap_or(0);
            }
        }

        if info.audio_codec.is_empty()
            && let Some(value) = value_after(line, "Audio: ")
        {
            info.audio_codec = first_field(value).to_string();
        }
    }

    info
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'storage/uploads/clip.mp4':
  Metadata:
    major_brand     : isom
  Duration: 00:01:23.45, start: 0.000000, bitrate: 1205 kb/s
  Stream #0:0[0x1](und): Video: h264 (High) (avc1 / 0x31637661), yuv420p(tv, bt709, progressive), 1920x1080 [SAR 1:1 DAR 16:9], 1072 kb/s, 30 fps
  Stream #0:1[0x2](und): Audio: aac (LC) (mp4a / 0x6134706D), 48000 Hz, stereo, fltp, 128 kb/s
";

    #[test]
    fn test_parse_full_output() {
        let info = parse_probe_output(SAMPLE);

        assert!((info.duration - 83.45).abs() < 1e-9);
        assert_eq!(info.width, 1920);
        assert_eq!(info.height, 1080);
        assert_eq!(info.video_codec, "h264 (High) (avc1 / 0x31637661)");
        assert_eq!(info.audio_codec, "aac (LC) (mp4a / 0x6134706D)");
        assert_eq!(info.resolution_str(), "1920x1080");
    }

    #[test]
    fn test_parse_missing_fields_default() {
        let info = parse_probe_output("garbage\nmore garbage\n");
        assert_eq!(info, VideoInfo::default());

        let info = parse_probe_output("  Duration: N/A, bitrate: N/A\n");
        assert!(info.duration.abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_webm_without_audio() {
        let output = "  Duration: 00:00:05.00, start: 0.000000\n  Stream #0:0: Video: vp9 (Profile 0), yuv420p(tv), 640x480, SAR 1:1 DAR 4:3, 30 fps\n";
        let info = parse_probe_output(output);

        assert!((info.duration - 5.0).abs() < 1e-9);
        assert_eq!(info.video_codec, "vp9 (Profile 0)");
        assert_eq!((info.width, info.height), (640, 480));
        assert!(info.audio_codec.is_empty());
    }

    #[test]
    fn test_executable_validation() {
        assert!(matches!(
            resolve_executable(""),
            Err(InspectionError::InvalidExecutable(_))
        ));
        assert!(matches!(
            resolve_executable("ffmpeg; rm -rf /"),
            Err(InspectionError::InvalidExecutable(_))
        ));
        assert!(matches!(
            resolve_executable("../bin/ffmpeg"),
            Err(InspectionError::InvalidExecutable(_))
        ));
        assert!(matches!(
            resolve_executable("/definitely/not/here/ffmpeg"),
            Err(InspectionError::ExecutableNotFound(_))
        ));
        assert!(matches!(
            resolve_executable("gooji-no-such-tool-on-path"),
            Err(InspectionError::ExecutableNotFound(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_arguments_outside_roots_are_rejected() {
        let root = std::env::temp_dir().join(format!("gooji-media-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&root).unwrap();

        let inspector = FfmpegInspector {
            executable: "/bin/sh".to_string(),
            resolved: PathBuf::from("/bin/sh"),
            allowed_roots: vec![root.clone()],
        };

        let err = inspector
            .thumbnail(&root.join("clip.mp4"), Path::new("/etc/passwd"), 1.0)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InspectionError::Security(SecurityError::OutsideBase { .. })
        ));

        let err = inspector
            .thumbnail(&root.join("clip.mp4"), &root.join("out.jpg"), -1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, InspectionError::InvalidTimestamp(_)));

        std::fs::remove_dir_all(root).ok();
    }
}
