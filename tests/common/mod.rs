#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use consult_feed::api::{
    RespondentId, ResponsePage, ResponseRecord, ResponseSource, ResponseTheme, ThemeMapping,
};
use consult_feed::controller::{FeedOptions, ResponseFeedController};
use consult_feed::error::{FeedError, Result};
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::sync::oneshot;

/// Scripted response source.
///
/// Calls are answered from the `replies` queue when it has entries, otherwise
/// they block until the test calls [`FakeSource::resolve`] with their index.
#[derive(Default)]
pub struct FakeSource {
    queries: Mutex<Vec<String>>,
    gates: Mutex<Vec<Option<oneshot::Sender<Result<ResponsePage>>>>>,
    replies: Mutex<VecDeque<Result<ResponsePage>>>,
}

impl FakeSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue an immediate reply for the next call.
    pub fn reply(&self, result: Result<ResponsePage>) {
        self.replies.lock().push_back(result);
    }

    /// Complete the `index`th gated call.
    pub fn resolve(&self, index: usize, result: Result<ResponsePage>) {
        let sender = self
            .gates
            .lock()
            .get_mut(index)
            .and_then(Option::take)
            .unwrap_or_else(|| panic!("no pending call #{index}"));
        // The receiver is gone when the fetch was cancelled.
        let _ = sender.send(result);
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.queries.lock().len()
    }
}

#[async_trait]
impl ResponseSource for FakeSource {
    async fn fetch_page(&self, _path: &str, query: &str) -> Result<ResponsePage> {
        self.queries.lock().push(query.to_string());

        if let Some(result) = self.replies.lock().pop_front() {
            return result;
        }

        let (tx, rx) = oneshot::channel();
        self.gates.lock().push(Some(tx));
        rx.await
            .unwrap_or_else(|_| Err(FeedError::Other("gate dropped".to_string())))
    }
}

pub fn options() -> FeedOptions {
    FeedOptions {
        debounce: Duration::from_millis(500),
        request_timeout: Duration::from_secs(30),
        page_size: 2,
        max_theme_filters: None,
    }
}

pub fn controller(source: &Arc<FakeSource>) -> ResponseFeedController {
    ResponseFeedController::new(
        Arc::clone(source) as Arc<dyn ResponseSource>,
        "transport-2026",
        "q1",
        options(),
    )
}

pub fn record(id: &str) -> ResponseRecord {
    ResponseRecord {
        identifier: RespondentId::new(id),
        free_text_answer_text: format!("answer from {id}"),
        themes: vec![ResponseTheme {
            id: "1".to_string(),
            name: "Cost".to_string(),
        }],
        multiple_choice_answer: vec![],
        demographic_data: BTreeMap::new(),
        evidence_rich: false,
    }
}

pub fn page(ids: &[&str], has_more_pages: bool) -> ResponsePage {
    ResponsePage {
        all_respondents: ids.iter().map(|id| record(id)).collect(),
        respondents_total: 10,
        filtered_total: 6,
        theme_mappings: vec![ThemeMapping {
            value: "1".to_string(),
            label: "Cost".to_string(),
            description: "Ticket prices".to_string(),
            count: ids.len() as u64,
        }],
        has_more_pages,
        ..Default::default()
    }
}

/// Let spawned tasks run, advancing the paused clock by `ms`.
pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Runs the CLI binary against an isolated config file and store.
pub struct FeedCli {
    pub temp_dir: TempDir,
}

impl FeedCli {
    pub fn new() -> Self {
        FeedCli {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("config.yaml")
    }

    pub fn store_path(&self) -> PathBuf {
        self.temp_dir.path().join("store.json")
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_consult-feed"))
            .args(args)
            .current_dir(self.temp_dir.path())
            .env("CONSULT_FEED_CONFIG", self.config_path())
            .env("CONSULT_FEED_STORE", self.store_path())
            .env_remove("CONSULT_FEED_BACKEND_URL")
            .env_remove("CONSULT_FEED_API_TOKEN")
            .env("NO_COLOR", "1")
            .output()
            .expect("Failed to execute consult-feed")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Expected command {:?} to fail, but it succeeded",
            args
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }

    pub fn read_config(&self) -> String {
        fs::read_to_string(self.config_path()).expect("Failed to read config file")
    }
}
