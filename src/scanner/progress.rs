use super::types::ScanStatus;
use crossbeam::channel::{Receiver, Sender, unbounded};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Events emitted by the coordinator while a scan runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Started { total: usize },
    FileFinished { current: usize, total: usize, path: String },
    FileFailed { path: String, error: String },
    MemoryPressure { distinct_keys: usize },
    Finished { status: ScanStatus },
}

type Callback = Arc<dyn Fn(&ScanEvent) + Send + Sync>;

/// Where scan events go. Delivery never blocks the coordinator.
#[derive(Clone, Default)]
pub struct ScanReporter {
    sender: Option<Sender<ScanEvent>>,
    callback: Option<Callback>,
}

impl ScanReporter {
    /// Discards every event
    pub fn silent() -> Self {
        Self::default()
    }

    /// Deliver events over an unbounded channel
    pub fn channel() -> (Self, Receiver<ScanEvent>) {
        let (sender, receiver) = unbounded();
        (
            Self {
                sender: Some(sender),
                callback: None,
            },
            receiver,
        )
    }

    /// Deliver events to a callback on the coordinator thread
    pub fn callback<F>(callback: F) -> Self
    where
        F: Fn(&ScanEvent) + Send + Sync + 'static,
    {
        Self {
            sender: None,
            callback: Some(Arc::new(callback)),
        }
    }

    pub fn report(&self, event: ScanEvent) {
        if let Some(callback) = &self.callback {
            callback(&event);
        }
        if let Some(sender) = &self.sender {
            // A dropped receiver just means nobody is listening anymore
            let _ = sender.send(event);
        }
    }
}

impl fmt::Debug for ScanReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanReporter")
            .field("channel", &self.sender.is_some())
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

/// Cooperative cancellation flag, sampled before each file is dispatched
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_channel_reporter_delivers_in_order() {
        let (reporter, events) = ScanReporter::channel();
        reporter.report(ScanEvent::Started { total: 2 });
        reporter.report(ScanEvent::Finished {
            status: ScanStatus::Completed,
        });

        let received: Vec<ScanEvent> = events.try_iter().collect();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0], ScanEvent::Started { total: 2 });
    }

    #[test]
    fn test_reporter_survives_dropped_receiver() {
        let (reporter, events) = ScanReporter::channel();
        drop(events);
        reporter.report(ScanEvent::Started { total: 0 });
    }

    #[test]
    fn test_callback_reporter() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter = ScanReporter::callback(move |event| sink.lock().unwrap().push(event.clone()));

        reporter.report(ScanEvent::MemoryPressure { distinct_keys: 5 });
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_cancellation_is_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
