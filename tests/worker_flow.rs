use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::time::timeout;

use bgwork::{
    create_worker, run_in_background, Cancelable, ExecutionState, ProgressState, ProgressTracker,
    Task, WorkerConfig, WorkerEvent, WorkerEvents, WorkerGroup, WorkerObserver,
};

async fn next_event<T>(events: &mut WorkerEvents<T>) -> WorkerEvent<T> {
    timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("worker event")
        .expect("channel open")
}

#[tokio::test(flavor = "multi_thread")]
async fn division_by_zero_reports_one_error_and_no_result() {
    let divisor = std::hint::black_box(0_i64);
    let (worker, mut events) = run_in_background(
        Task::new("divide", move |_| Ok::<_, anyhow::Error>(1 / divisor)),
        None,
        None,
    )
    .unwrap();

    match next_event(&mut events).await {
        WorkerEvent::Error(message) => {
            assert!(message.starts_with("Panic: "), "{message}");
            assert!(message.contains("divide by zero"), "{message}");
        }
        other => panic!("expected an error, got {other:?}"),
    }
    assert!(worker.wait(Duration::from_secs(5)));
    assert!(events.try_recv().is_none());
    assert_eq!(worker.state(), ExecutionState::Failed);
    assert!(!worker.is_running_work());
}

#[tokio::test(flavor = "multi_thread")]
async fn returned_errors_are_reported_with_their_type_name() {
    let (worker, mut events) = run_in_background(
        Task::new("parse", |_| "12a".parse::<u32>()),
        None,
        None,
    )
    .unwrap();

    assert_eq!(
        next_event(&mut events).await,
        WorkerEvent::Error("ParseIntError: invalid digit found in string".to_string())
    );
    assert!(worker.wait(Duration::from_secs(5)));
    assert!(events.try_recv().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn progress_then_finished_for_a_tracked_task() {
    let (worker, mut events) = run_in_background(
        Task::new("batch", |progress| {
            let mut tracker = ProgressTracker::new(Some(progress));
            tracker.set_total(3);
            for item in ["a", "b", "c"] {
                tracker.increment(Some(item));
            }
            tracker.finish(None);
            Ok::<_, anyhow::Error>(vec!["a", "b", "c"].len())
        }),
        None,
        None,
    )
    .unwrap();

    let mut progress = Vec::new();
    let result = loop {
        match next_event(&mut events).await {
            WorkerEvent::Progress(state) => progress.push(state),
            WorkerEvent::Finished(value) => break value,
            other => panic!("unexpected event {other:?}"),
        }
    };

    assert_eq!(result, 3);
    assert_eq!(progress.len(), 5);
    assert_eq!(progress.last(), Some(&ProgressState::new(3, 3, "완료")));
    assert!(!worker.is_running_work());
}

struct SlowLookup {
    stopped: AtomicBool,
    steps: AtomicUsize,
}

impl Cancelable for SlowLookup {
    fn request_stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn cancel_wins_over_a_late_failure() {
    let lookup = Arc::new(SlowLookup {
        stopped: AtomicBool::new(false),
        steps: AtomicUsize::new(0),
    });
    let (worker, mut events) = run_in_background(
        Task::bound("lookup", lookup.clone(), |lookup: &SlowLookup, progress| {
            while !lookup.stopped.load(Ordering::SeqCst) {
                let step = lookup.steps.fetch_add(1, Ordering::SeqCst) as i64;
                progress.report(step, 0, "polling");
                std::thread::sleep(Duration::from_millis(5));
            }
            Err::<(), _>(anyhow::anyhow!("interrupted mid-request"))
        }),
        None,
        None,
    )
    .unwrap();

    // let at least one progress update through first
    assert!(matches!(next_event(&mut events).await, WorkerEvent::Progress(_)));

    let canceler = worker.clone();
    let ended = tokio::task::spawn_blocking(move || canceler.cancel())
        .await
        .unwrap();
    assert!(ended);
    assert!(lookup.stopped.load(Ordering::SeqCst));
    assert!(!worker.is_running_work());
    assert_eq!(worker.state(), ExecutionState::Canceled);

    let rest = events.drain();
    let terminal: Vec<_> = rest.iter().filter(|e| e.is_terminal()).collect();
    assert_eq!(terminal, vec![&WorkerEvent::Canceled]);
    assert_eq!(rest.last(), Some(&WorkerEvent::Canceled));
}

#[derive(Default)]
struct Screen {
    bar: Option<ProgressState>,
    status: Vec<String>,
}

impl WorkerObserver<String> for Screen {
    fn on_progress(&mut self, progress: ProgressState) {
        self.bar = Some(progress);
    }

    fn on_finished(&mut self, result: String) {
        self.status.push(format!("done: {result}"));
    }

    fn on_error(&mut self, message: String) {
        self.status.push(format!("error: {message}"));
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn owner_context_dispatches_on_its_own_turn() {
    let group = WorkerGroup::new(WorkerConfig {
        cancel_wait: Duration::from_millis(500),
        ..WorkerConfig::default()
    });
    let (worker, mut events) = create_worker::<String>(Some(&group));
    worker.prepare(Task::new("title", |progress| {
        progress.report(1, 1, "generated");
        Ok::<_, anyhow::Error>("캠핑의자 경량 접이식".to_string())
    }));
    assert_eq!(worker.state(), ExecutionState::Idle);

    worker.start().unwrap();
    assert!(worker.wait(Duration::from_secs(5)));

    let mut screen = Screen::default();
    assert_eq!(events.dispatch(&mut screen), 2);
    assert_eq!(screen.bar, Some(ProgressState::new(1, 1, "generated")));
    assert_eq!(screen.status, vec!["done: 캠핑의자 경량 접이식".to_string()]);

    assert_eq!(group.prune(), 1);
    assert!(group.is_empty());
}
