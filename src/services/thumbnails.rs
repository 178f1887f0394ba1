//! Background thumbnail generation.
//!
//! Jobs go through a bounded channel drained by a fixed set of workers. A
//! full queue drops new jobs, and shutdown discards whatever is still queued.

use super::media::MediaInspector;
use crate::config::ThumbnailConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailJob {
    pub video_id: String,
    pub video_path: PathBuf,
    pub output_path: PathBuf,
    pub timestamp_secs: f64,
}

pub struct ThumbnailQueue {
    sender: mpsc::Sender<ThumbnailJob>,
    workers: std::sync::Mutex<Vec<AbortHandle>>,
    capacity: usize,
}

impl ThumbnailQueue {
    /// Spawns the workers on the current runtime.
    pub fn start(inspector: Arc<dyn MediaInspector>, config: &ThumbnailConfig) -> Self {
        let capacity = config.queue_capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..config.workers.max(1))
            .map(|worker| {
                let receiver = Arc::clone(&receiver);
                let inspector = Arc::clone(&inspector);
                tokio::spawn(run_worker(worker, receiver, inspector)).abort_handle()
            })
            .collect();

        info!(
            workers = config.workers.max(1),
            capacity, "Thumbnail queue started"
        );

        Self {
            sender,
            workers: std::sync::Mutex::new(workers),
            capacity,
        }
    }

    /// Never waits. Returns false when the job was dropped.
    pub fn enqueue(&self, job: ThumbnailJob) -> bool {
        match self.sender.try_send(job) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(job)) => {
                warn!(id = %job.video_id, "Thumbnail queue full, dropping job");
                metrics::counter!("thumbnail_jobs_dropped_total", "reason" => "full").increment(1);
                false
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                warn!(id = %job.video_id, "Thumbnail queue closed, dropping job");
                metrics::counter!("thumbnail_jobs_dropped_total", "reason" => "closed")
                    .increment(1);
                false
            }
        }
    }

    /// Jobs waiting for a worker.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.capacity - self.sender.capacity()
    }

    /// Aborts every worker and returns how many queued jobs were discarded.
    pub fn shutdown(&self) -> usize {
        let discarded = self.pending();

        let handles = match self.workers.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };

        for handle in &handles {
            handle.abort();
        }

        if discarded > 0 {
            warn!(discarded, "Thumbnail queue shut down with pending jobs");
        } else {
            info!("Thumbnail queue shut down");
        }

        discarded
    }
}

impl Drop for ThumbnailQueue {
    fn drop(&mut self) {
        if let Ok(handles) = self.workers.get_mut() {
            for handle in handles.drain(..) {
                handle.abort();
            }
        }
    }
}

async fn run_worker(
    worker: usize,
    receiver: Arc<Mutex<mpsc::Receiver<ThumbnailJob>>>,
    inspector: Arc<dyn MediaInspector>,
) {
    loop {
        let job = {
            let mut guard = receiver.lock().await;
            guard.recv().await
        };

        let Some(job) = job else {
            debug!(worker, "Thumbnail worker stopping");
            break;
        };

        let outcome = process_job(worker, &job, inspector.as_ref()).await;
        metrics::counter!("thumbnails_total", "outcome" => outcome).increment(1);
    }
}

/// A thumbnail never outlives its video: the job is skipped when the video is
/// already gone, and the output is removed when it vanished mid-generation.
async fn process_job(
    worker: usize,
    job: &ThumbnailJob,
    inspector: &dyn MediaInspector,
) -> &'static str {
    if !video_exists(job).await {
        debug!(id = %job.video_id, worker, "Video is gone, skipping thumbnail");
        return "skipped";
    }

    if let Err(e) = inspector
        .thumbnail(&job.video_path, &job.output_path, job.timestamp_secs)
        .await
    {
        error!(id = %job.video_id, worker, "Thumbnail generation failed: {}", e);
        return "failure";
    }

    if !video_exists(job).await {
        if let Err(e) = tokio::fs::remove_file(&job.output_path).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(
                id = %job.video_id,
                "Failed to remove stale thumbnail {:?}: {}", job.output_path, e
            );
        }
        debug!(id = %job.video_id, worker, "Video deleted during generation, discarded thumbnail");
        return "skipped";
    }

    info!(id = %job.video_id, worker, "Generated thumbnail {:?}", job.output_path);
    "success"
}

async fn video_exists(job: &ThumbnailJob) -> bool {
    tokio::fs::try_exists(&job.video_path).await.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::media::VideoInfo;
    use crate::services::media::InspectionError;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Blocks every thumbnail call until released.
    struct GatedInspector {
        gate: Notify,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl MediaInspector for GatedInspector {
        async fn probe(&self, _video_path: &Path) -> Result<VideoInfo, InspectionError> {
            Ok(VideoInfo::default())
        }

        async fn thumbnail(
            &self,
            _video_path: &Path,
            output_path: &Path,
            _timestamp_secs: f64,
        ) -> Result<(), InspectionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            tokio::fs::write(output_path, b"jpeg").await.ok();
            Ok(())
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn gated() -> Arc<GatedInspector> {
        Arc::new(GatedInspector {
            gate: Notify::new(),
            calls: AtomicUsize::new(0),
        })
    }

    async fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gooji-thumbs-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        dir
    }

    /// Same as `job`, with the video file written to disk.
    async fn job_with_video(id: &str, dir: &Path) -> ThumbnailJob {
        let job = job(id, dir);
        tokio::fs::write(&job.video_path, b"video").await.unwrap();
        job
    }

    async fn wait_for_calls(inspector: &GatedInspector, expected: usize) {
        for _ in 0..100 {
            if inspector.calls.load(Ordering::SeqCst) == expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(inspector.calls.load(Ordering::SeqCst), expected);
    }

    fn job(id: &str, dir: &Path) -> ThumbnailJob {
        ThumbnailJob {
            video_id: id.to_string(),
            video_path: dir.join(format!("{id}.mp4")),
            output_path: dir.join(format!("{id}.jpg")),
            timestamp_secs: 1.0,
        }
    }

    fn config(workers: usize, queue_capacity: usize) -> ThumbnailConfig {
        ThumbnailConfig {
            workers,
            queue_capacity,
            ..ThumbnailConfig::default()
        }
    }

    #[tokio::test]
    async fn test_full_queue_drops_and_shutdown_discards() {
        let dir = scratch_dir().await;
        let inspector = gated();
        let queue = ThumbnailQueue::start(inspector.clone(), &config(1, 2));

        assert!(queue.enqueue(job_with_video("first", &dir).await));

        // The single worker is now blocked on the first job.
        wait_for_calls(&inspector, 1).await;

        assert!(queue.enqueue(job_with_video("second", &dir).await));
        assert!(queue.enqueue(job_with_video("third", &dir).await));
        assert!(!queue.enqueue(job_with_video("fourth", &dir).await));
        assert_eq!(queue.pending(), 2);

        assert_eq!(queue.shutdown(), 2);
        assert_eq!(inspector.calls.load(Ordering::SeqCst), 1);

        tokio::fs::remove_dir_all(dir).await.ok();
    }

    #[tokio::test]
    async fn test_jobs_are_processed() {
        let dir = scratch_dir().await;
        let inspector = gated();
        let queue = ThumbnailQueue::start(inspector.clone(), &config(2, 8));

        assert!(queue.enqueue(job_with_video("a", &dir).await));
        assert!(queue.enqueue(job_with_video("b", &dir).await));

        let output = dir.join("a.jpg");
        for _ in 0..200 {
            inspector.gate.notify_waiters();
            if output.exists() && dir.join("b.jpg").exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(output.exists());
        assert!(dir.join("b.jpg").exists());
        assert_eq!(queue.shutdown(), 0);

        tokio::fs::remove_dir_all(dir).await.ok();
    }

    #[tokio::test]
    async fn test_job_for_missing_video_is_skipped() {
        let dir = scratch_dir().await;
        let inspector = gated();
        let queue = ThumbnailQueue::start(inspector.clone(), &config(1, 4));

        assert!(queue.enqueue(job("gone", &dir)));
        let marker = job_with_video("marker", &dir).await;
        assert!(queue.enqueue(marker.clone()));

        // The worker only reaches the marker after dealing with the first job.
        wait_for_calls(&inspector, 1).await;
        for _ in 0..200 {
            inspector.gate.notify_waiters();
            if marker.output_path.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(marker.output_path.exists());
        assert!(!dir.join("gone.jpg").exists());
        assert_eq!(inspector.calls.load(Ordering::SeqCst), 1);
        queue.shutdown();

        tokio::fs::remove_dir_all(dir).await.ok();
    }

    #[tokio::test]
    async fn test_thumbnail_removed_when_video_deleted_mid_generation() {
        let dir = scratch_dir().await;
        let inspector = gated();
        let queue = ThumbnailQueue::start(inspector.clone(), &config(1, 4));

        let doomed = job_with_video("doomed", &dir).await;
        assert!(queue.enqueue(doomed.clone()));
        wait_for_calls(&inspector, 1).await;

        tokio::fs::remove_file(&doomed.video_path).await.unwrap();

        let marker = job_with_video("marker", &dir).await;
        assert!(queue.enqueue(marker.clone()));
        for _ in 0..200 {
            inspector.gate.notify_waiters();
            if marker.output_path.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(marker.output_path.exists());
        assert!(!doomed.output_path.exists());
        queue.shutdown();

        tokio::fs::remove_dir_all(dir).await.ok();
    }
}
