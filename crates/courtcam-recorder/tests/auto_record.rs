//! Timing behaviour of the auto-recorder under paused tokio time.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant};

use courtcam_models::{DetectionSample, RecordingDecision};
use courtcam_recorder::{AutoRecorder, RecorderConfig};

const SETTLE: Duration = Duration::from_secs(1);
const FRAME: Duration = Duration::from_millis(200);

fn recorder(auto_record: bool) -> (AutoRecorder, mpsc::UnboundedReceiver<RecordingDecision>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let config = RecorderConfig {
        settle_delay: SETTLE,
        auto_record,
        ..RecorderConfig::default()
    };
    (AutoRecorder::spawn(config, tx), rx)
}

async fn feed(recorder: &AutoRecorder, values: &[bool]) {
    for &value in values {
        recorder.observe(DetectionSample::now(value)).unwrap();
        time::sleep(FRAME).await;
    }
}

async fn assert_quiet(rx: &mut mpsc::UnboundedReceiver<RecordingDecision>, window: Duration) {
    if let Ok(decision) = time::timeout(window, rx.recv()).await {
        panic!("unexpected decision {:?}", decision);
    }
}

#[tokio::test(start_paused = true)]
async fn test_court_entering_view_starts_once_after_settle() {
    let (recorder, mut rx) = recorder(true);
    feed(&recorder, &[false; 5]).await;

    let first_true = Instant::now();
    feed(&recorder, &[true, true, true]).await;

    assert_eq!(rx.recv().await, Some(RecordingDecision::StartRecording));
    assert_eq!(first_true.elapsed(), SETTLE);

    feed(&recorder, &[true; 10]).await;
    assert_quiet(&mut rx, Duration::from_secs(3)).await;

    let snapshot = recorder.snapshot().await.unwrap();
    assert!(snapshot.is_recording);
    assert!(snapshot.last_stable);
}

#[tokio::test(start_paused = true)]
async fn test_isolated_flip_is_not_believed_early() {
    let (recorder, mut rx) = recorder(true);
    recorder.observe(DetectionSample::now(true)).unwrap();

    assert_quiet(&mut rx, SETTLE - Duration::from_millis(1)).await;
    assert_eq!(rx.recv().await, Some(RecordingDecision::StartRecording));
}

#[tokio::test(start_paused = true)]
async fn test_flicker_is_rejected() {
    let (recorder, mut rx) = recorder(true);
    feed(&recorder, &[true, false, true, false, false]).await;
    assert_quiet(&mut rx, Duration::from_secs(3)).await;

    let snapshot = recorder.snapshot().await.unwrap();
    assert!(!snapshot.is_recording);
    assert_eq!(snapshot.pending, None);
}

#[tokio::test(start_paused = true)]
async fn test_court_leaving_view_stops_recording() {
    let (recorder, mut rx) = recorder(true);
    feed(&recorder, &[true]).await;
    assert_eq!(rx.recv().await, Some(RecordingDecision::StartRecording));

    let first_false = Instant::now();
    feed(&recorder, &[false, false]).await;
    assert_eq!(rx.recv().await, Some(RecordingDecision::StopRecording));
    assert_eq!(first_false.elapsed(), SETTLE);
}

#[tokio::test(start_paused = true)]
async fn test_auto_record_off_never_decides() {
    let (recorder, mut rx) = recorder(false);
    feed(&recorder, &[true; 15]).await;
    assert_quiet(&mut rx, Duration::from_secs(2)).await;
}

#[tokio::test(start_paused = true)]
async fn test_disabling_auto_record_cancels_pending_start() {
    let (recorder, mut rx) = recorder(true);
    feed(&recorder, &[true, true]).await;
    recorder.set_auto_record(false).unwrap();
    feed(&recorder, &[true; 10]).await;
    assert_quiet(&mut rx, Duration::from_secs(2)).await;
}

#[tokio::test(start_paused = true)]
async fn test_manual_start_preempts_pending_flip() {
    let (recorder, mut rx) = recorder(true);
    feed(&recorder, &[true, true]).await;

    recorder.start_manual().unwrap();
    assert_eq!(rx.recv().await, Some(RecordingDecision::StartRecording));

    // The flip still settles, but recording is already on
    feed(&recorder, &[true; 10]).await;
    assert_quiet(&mut rx, Duration::from_secs(2)).await;
}

#[tokio::test(start_paused = true)]
async fn test_manual_stop_holds_while_court_in_view() {
    let (recorder, mut rx) = recorder(true);
    feed(&recorder, &[true]).await;
    assert_eq!(rx.recv().await, Some(RecordingDecision::StartRecording));

    recorder.stop_manual().unwrap();
    assert_eq!(rx.recv().await, Some(RecordingDecision::StopRecording));

    feed(&recorder, &[true; 10]).await;
    assert_quiet(&mut rx, Duration::from_secs(2)).await;
}

#[tokio::test(start_paused = true)]
async fn test_recorder_stops_when_handles_dropped() {
    let (recorder, mut rx) = recorder(true);
    recorder.observe(DetectionSample::now(true)).unwrap();
    drop(recorder);

    // The pending timer does not keep the driver alive, and the sink closes
    assert_eq!(rx.recv().await, None);
}
