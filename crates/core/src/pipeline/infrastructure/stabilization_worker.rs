use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::Receiver;

use crate::pipeline::stabilize_error::StabilizeError;
use crate::pipeline::stabilize_video_use_case::StabilizeVideoUseCase;

/// Events sent from the worker thread to the caller.
///
/// Any number of `Progress` messages is followed by exactly one of the
/// other variants, after which the channel disconnects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerMessage {
    Progress(u8),
    Done(PathBuf),
    Failed(String),
    Cancelled,
}

impl WorkerMessage {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress(_))
    }
}

/// Runs `use_case` on a dedicated thread. Returns the event receiver and the
/// cancellation flag, which the use case polls between frames.
///
/// The use case's progress callback and cancellation flag are replaced by
/// the worker's own.
pub fn spawn(
    use_case: StabilizeVideoUseCase,
    input: PathBuf,
    output: PathBuf,
) -> (Receiver<WorkerMessage>, Arc<AtomicBool>) {
    let (tx, rx) = crossbeam_channel::unbounded::<WorkerMessage>();
    let cancelled = Arc::new(AtomicBool::new(false));
    let cancelled_clone = cancelled.clone();

    thread::spawn(move || {
        let tx_progress = tx.clone();
        let mut use_case = use_case
            .with_cancellation(cancelled_clone)
            .with_progress(Box::new(move |pct| {
                let _ = tx_progress.send(WorkerMessage::Progress(pct));
            }));

        let message = match use_case.execute(&input, &output) {
            Ok(report) => WorkerMessage::Done(report.output_path),
            Err(StabilizeError::Cancelled) => WorkerMessage::Cancelled,
            Err(e) => WorkerMessage::Failed(e.to_string()),
        };
        log::debug!("Stabilization worker finished: {message:?}");
        let _ = tx.send(message);
    });

    (rx, cancelled)
}
