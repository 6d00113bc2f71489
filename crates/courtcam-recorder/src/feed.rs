//! Camera frame sampling.
//!
//! Classifying every frame would flood the analysis service, so only every
//! Nth frame is sent. Each classification runs on its own task; a failed
//! or unusable classification is logged and dropped, never turned into a
//! sample.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use courtcam_client::AnalysisClient;
use courtcam_models::DetectionSample;

use crate::error::RecorderResult;
use crate::recorder::AutoRecorder;

/// Answers "is a tennis court in this frame".
#[async_trait]
pub trait CourtClassifier: Send + Sync + 'static {
    async fn classify(&self, jpeg: Bytes) -> RecorderResult<bool>;
}

#[async_trait]
impl CourtClassifier for AnalysisClient {
    async fn classify(&self, jpeg: Bytes) -> RecorderResult<bool> {
        Ok(self.is_court(jpeg).await?)
    }
}

/// Forwards every `stride`-th frame to a classifier and the results to an
/// [`AutoRecorder`].
pub struct CourtFeed<C> {
    classifier: Arc<C>,
    recorder: AutoRecorder,
    stride: u64,
    frame_count: u64,
}

impl<C: CourtClassifier> CourtFeed<C> {
    pub fn new(classifier: C, recorder: AutoRecorder, stride: u32) -> Self {
        Self {
            classifier: Arc::new(classifier),
            recorder,
            stride: u64::from(stride.max(1)),
            frame_count: 0,
        }
    }

    pub fn frames_seen(&self) -> u64 {
        self.frame_count
    }

    /// Offer one encoded frame.
    ///
    /// Returns the classification task when this frame was sampled. The
    /// sample is stamped with the time the frame was offered.
    pub fn push_frame(&mut self, jpeg: Bytes) -> Option<JoinHandle<()>> {
        let index = self.frame_count;
        self.frame_count += 1;
        if index % self.stride != 0 {
            return None;
        }

        let captured_at = std::time::Instant::now();
        let classifier = Arc::clone(&self.classifier);
        let recorder = self.recorder.clone();
        Some(tokio::spawn(async move {
            match classifier.classify(jpeg).await {
                Ok(is_court) => {
                    debug!(frame = index, is_court, "Frame classified");
                    if recorder
                        .observe(DetectionSample::new(is_court, captured_at))
                        .is_err()
                    {
                        debug!(frame = index, "Recorder gone, dropping sample");
                    }
                }
                Err(e) => warn!(frame = index, error = %e, "Court classification failed"),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use courtcam_client::ClientError;
    use courtcam_models::RecordingDecision;
    use tokio::sync::mpsc;

    use crate::config::RecorderConfig;
    use crate::error::RecorderError;

    struct Scripted {
        calls: AtomicUsize,
        answer: Option<bool>,
    }

    #[async_trait]
    impl CourtClassifier for Arc<Scripted> {
        async fn classify(&self, _jpeg: Bytes) -> RecorderResult<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.ok_or_else(|| {
                RecorderError::Classifier(ClientError::InvalidRequest("no answer".into()))
            })
        }
    }

    fn feed(
        answer: Option<bool>,
    ) -> (
        CourtFeed<Arc<Scripted>>,
        Arc<Scripted>,
        mpsc::UnboundedReceiver<RecordingDecision>,
    ) {
        let classifier = Arc::new(Scripted {
            calls: AtomicUsize::new(0),
            answer,
        });
        let (tx, rx) = mpsc::unbounded_channel();
        let config = RecorderConfig {
            settle_delay: Duration::from_millis(100),
            ..RecorderConfig::default()
        };
        let recorder = AutoRecorder::spawn(config, tx);
        (CourtFeed::new(Arc::clone(&classifier), recorder, 5), classifier, rx)
    }

    #[tokio::test]
    async fn test_only_every_fifth_frame_is_classified() {
        let (mut feed, classifier, _rx) = feed(Some(false));
        let mut tasks = Vec::new();
        for _ in 0..11 {
            tasks.extend(feed.push_frame(Bytes::from_static(b"jpeg")));
        }
        for task in tasks {
            task.await.unwrap();
        }
        // Frames 0, 5 and 10
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 3);
        assert_eq!(feed.frames_seen(), 11);
    }

    #[tokio::test(start_paused = true)]
    async fn test_classified_frames_drive_the_recorder() {
        let (mut feed, _classifier, mut rx) = feed(Some(true));
        if let Some(task) = feed.push_frame(Bytes::from_static(b"jpeg")) {
            task.await.unwrap();
        }
        assert_eq!(rx.recv().await, Some(RecordingDecision::StartRecording));
    }

    #[tokio::test(start_paused = true)]
    async fn test_classifier_errors_are_dropped() {
        let (mut feed, classifier, mut rx) = feed(None);
        for _ in 0..10 {
            if let Some(task) = feed.push_frame(Bytes::from_static(b"jpeg")) {
                task.await.unwrap();
            }
        }
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 2);
        let waited = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        assert!(waited.is_err());
    }
}
