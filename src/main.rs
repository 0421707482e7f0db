use std::{
    env,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use rand::Rng;
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use bgwork::{
    run_in_background, Cancelable, ProgressCallback, ProgressTracker, Task, WorkerConfig,
    WorkerGroup,
};

const DEFAULT_KEYWORDS: &[&str] = &["캠핑의자", "무선청소기", "에어프라이어", "텀블러", "등산화"];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct KeywordScore {
    keyword: String,
    score: usize,
}

#[derive(Default)]
struct KeywordScanner {
    stop: AtomicBool,
}

impl Cancelable for KeywordScanner {
    fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

impl KeywordScanner {
    fn scan(
        &self,
        keywords: Vec<String>,
        progress: ProgressCallback,
    ) -> anyhow::Result<Vec<KeywordScore>> {
        let mut tracker = ProgressTracker::new(Some(progress));
        tracker.set_total(keywords.len() as i64);

        let mut rng = rand::thread_rng();
        let mut scores = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            if self.stop.load(Ordering::SeqCst) || tracker.is_cancelled() {
                anyhow::bail!("scan stopped before {keyword}");
            }
            if keyword.trim().is_empty() {
                anyhow::bail!("empty keyword in input");
            }
            // jitter between lookups
            thread::sleep(Duration::from_millis(rng.gen_range(100..300)));

            let score = keyword.chars().filter(|c| c.is_alphanumeric()).count() * 7 % 100;
            tracker.increment(Some(&keyword));
            scores.push(KeywordScore { keyword, score });
        }
        tracker.finish(None);
        Ok(scores)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = WorkerConfig::from_env()?;
    let cancel_after = env::var("DEMO_CANCEL_AFTER_MS")
        .ok()
        .map(|raw| raw.parse::<u64>())
        .transpose()?
        .map(Duration::from_millis);

    let mut keywords: Vec<String> = env::args().skip(1).collect();
    if keywords.is_empty() {
        keywords = DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect();
    }

    let group = WorkerGroup::new(config);
    let scanner = Arc::new(KeywordScanner::default());
    let task = Task::bound(
        "keyword-scan",
        scanner,
        move |scanner: &KeywordScanner, progress| scanner.scan(keywords, progress),
    );
    let (worker, mut events) = run_in_background(task, None, Some(&group))?;
    tracing::info!(worker_id = %worker.id(), "keyword scan started");

    if let Some(delay) = cancel_after {
        let worker = worker.clone();
        tokio::task::spawn_blocking(move || {
            thread::sleep(delay);
            worker.cancel();
        });
    }

    while let Some(event) = events.recv().await {
        println!("{}", serde_json::to_string(&event)?);
        if event.is_terminal() {
            break;
        }
    }

    Ok(())
}
