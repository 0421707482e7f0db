use serde::Serialize;
use tokio::sync::mpsc;

use crate::domain::models::ProgressState;

/// Notification sent from a worker thread to the context that created it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum WorkerEvent<T> {
    Progress(ProgressState),
    Error(String),
    Finished(T),
    Canceled,
}

impl<T> WorkerEvent<T> {
    pub fn event_name(&self) -> &'static str {
        match self {
            WorkerEvent::Progress(_) => "progress",
            WorkerEvent::Error(_) => "error",
            WorkerEvent::Finished(_) => "finished",
            WorkerEvent::Canceled => "canceled",
        }
    }

    /// Error, finished and canceled close out an execution.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkerEvent::Progress(_))
    }
}

/// Handlers for the four notification channels. Unused ones can be left out.
pub trait WorkerObserver<T> {
    fn on_progress(&mut self, _progress: ProgressState) {}
    fn on_error(&mut self, _message: String) {}
    fn on_finished(&mut self, _result: T) {}
    fn on_canceled(&mut self) {}
}

/// Receiving end of a worker's notifications, drained by the owning context.
#[derive(Debug)]
pub struct WorkerEvents<T> {
    rx: mpsc::UnboundedReceiver<WorkerEvent<T>>,
}

impl<T> WorkerEvents<T> {
    pub(crate) fn channel() -> (mpsc::UnboundedSender<WorkerEvent<T>>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }

    /// Waits for the next event; `None` once every worker handle is gone and
    /// the queue is empty.
    pub async fn recv(&mut self) -> Option<WorkerEvent<T>> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<WorkerEvent<T>> {
        self.rx.try_recv().ok()
    }

    pub fn drain(&mut self) -> Vec<WorkerEvent<T>> {
        let mut pending = Vec::new();
        while let Some(event) = self.try_recv() {
            pending.push(event);
        }
        pending
    }

    /// Routes every queued event to `observer`, returning how many were handled.
    pub fn dispatch<O>(&mut self, observer: &mut O) -> usize
    where
        O: WorkerObserver<T> + ?Sized,
    {
        let mut handled = 0;
        while let Some(event) = self.try_recv() {
            match event {
                WorkerEvent::Progress(progress) => observer.on_progress(progress),
                WorkerEvent::Error(message) => observer.on_error(message),
                WorkerEvent::Finished(result) => observer.on_finished(result),
                WorkerEvent::Canceled => observer.on_canceled(),
            }
            handled += 1;
        }
        handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        progress: Vec<ProgressState>,
        errors: Vec<String>,
        results: Vec<u32>,
        canceled: usize,
    }

    impl WorkerObserver<u32> for Recorder {
        fn on_progress(&mut self, progress: ProgressState) {
            self.progress.push(progress);
        }

        fn on_error(&mut self, message: String) {
            self.errors.push(message);
        }

        fn on_finished(&mut self, result: u32) {
            self.results.push(result);
        }

        fn on_canceled(&mut self) {
            self.canceled += 1;
        }
    }

    #[test]
    fn dispatch_routes_each_channel() {
        let (tx, mut events) = WorkerEvents::<u32>::channel();
        tx.send(WorkerEvent::Progress(ProgressState::new(1, 2, "half")))
            .unwrap();
        tx.send(WorkerEvent::Error("Panic: boom".into())).unwrap();
        tx.send(WorkerEvent::Finished(7)).unwrap();
        tx.send(WorkerEvent::Canceled).unwrap();

        let mut recorder = Recorder::default();
        assert_eq!(events.dispatch(&mut recorder), 4);
        assert_eq!(recorder.progress, vec![ProgressState::new(1, 2, "half")]);
        assert_eq!(recorder.errors, vec!["Panic: boom".to_string()]);
        assert_eq!(recorder.results, vec![7]);
        assert_eq!(recorder.canceled, 1);
        assert_eq!(events.dispatch(&mut recorder), 0);
    }

    #[test]
    fn drain_returns_events_in_send_order() {
        let (tx, mut events) = WorkerEvents::<u32>::channel();
        tx.send(WorkerEvent::Progress(ProgressState::new(1, 1, ""))).unwrap();
        tx.send(WorkerEvent::Finished(1)).unwrap();
        drop(tx);

        let names: Vec<_> = events.drain().iter().map(|e| e.event_name()).collect();
        assert_eq!(names, vec!["progress", "finished"]);
        assert!(events.try_recv().is_none());
    }

    #[test]
    fn events_serialize_with_name_and_payload() {
        let json = serde_json::to_value(WorkerEvent::<u32>::Progress(ProgressState::new(
            3, 10, "scanning",
        )))
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "event": "progress",
                "data": { "current": 3, "total": 10, "message": "scanning" }
            })
        );

        let json = serde_json::to_value(WorkerEvent::<u32>::Canceled).unwrap();
        assert_eq!(json, serde_json::json!({ "event": "canceled" }));
        assert!(WorkerEvent::<u32>::Canceled.is_terminal());
    }
}
