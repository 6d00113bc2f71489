//! Terminal job notifications.

use tokio::sync::mpsc;
use tracing::{debug, info};

use courtcam_models::JobEvent;

/// Receives one event per finished job.
///
/// The surrounding application decides how to surface it (system
/// notification, UI alert). Implementations must not block.
pub trait JobNotifier: Send + Sync {
    fn notify(&self, event: &JobEvent);
}

/// Notifier that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl JobNotifier for LogNotifier {
    fn notify(&self, event: &JobEvent) {
        match event {
            JobEvent::Succeeded { result } => info!(
                job_id = %result.job_id,
                result_file = %result.result_file.display(),
                "Analysis complete"
            ),
            JobEvent::Failed { job_id, kind } => info!(
                job_id = %job_id,
                kind = %kind,
                "Analysis failed"
            ),
        }
    }
}

impl JobNotifier for mpsc::UnboundedSender<JobEvent> {
    fn notify(&self, event: &JobEvent) {
        if self.send(event.clone()).is_err() {
            debug!(job_id = %event.job_id(), "Notification receiver dropped");
        }
    }
}
