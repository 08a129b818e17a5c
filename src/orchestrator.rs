//! Fetch orchestration: generations, debouncing, cancellation and timeouts.
//!
//! Every logical request gets a [`FetchTicket`] carrying a generation number
//! and a cancellation token. Starting a new request cancels the previous
//! ticket's token, which aborts both a pending debounce delay and an
//! in-flight HTTP call. Results are only applied while their generation is
//! still current, which covers sources that ignore cancellation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::api::{ResponsePage, ResponseSource};
use crate::error::{FeedError, Result};

/// Default delay before a filter change is sent to the backend.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Default upper bound on a single request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Feed loading status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Error,
}

enum_display!(FetchStatus, {
    Idle => "idle",
    Loading => "loading",
    Error => "error",
});

/// Handle for one fetch session.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    generation: u64,
    token: CancellationToken,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Result of running a fetch session to completion.
#[derive(Debug)]
pub enum FetchOutcome {
    Completed(Result<ResponsePage>),
    Cancelled,
}

/// Owns the current generation and the cancellation handle of the active
/// session. At most one session is active at a time.
pub struct FetchOrchestrator {
    generation: AtomicU64,
    active: Mutex<Option<CancellationToken>>,
    debounce: Duration,
    request_timeout: Duration,
}

impl Default for FetchOrchestrator {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE, DEFAULT_REQUEST_TIMEOUT)
    }
}

impl FetchOrchestrator {
    pub fn new(debounce: Duration, request_timeout: Duration) -> Self {
        Self {
            generation: AtomicU64::new(0),
            active: Mutex::new(None),
            debounce,
            request_timeout,
        }
    }

    pub fn debounce_window(&self) -> Duration {
        self.debounce
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Stale-response guard.
    pub fn is_current(&self, generation: u64) -> bool {
        self.current_generation() == generation
    }

    /// Start a new session, superseding and cancelling the previous one.
    pub fn begin(&self) -> FetchTicket {
        let token = CancellationToken::new();
        let mut active = self.active.lock();
        if let Some(previous) = active.replace(token.clone()) {
            previous.cancel();
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        FetchTicket { generation, token }
    }

    /// Cancel the active session without starting a new one.
    pub fn cancel_active(&self) {
        if let Some(previous) = self.active.lock().take() {
            previous.cancel();
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Release the session handle once its result has been applied.
    pub fn finish(&self, ticket: &FetchTicket) {
        let mut active = self.active.lock();
        if self.is_current(ticket.generation) {
            active.take();
        }
    }

    /// Wait out the debounce window.
    ///
    /// Returns `false` if the ticket was superseded before the window closed.
    pub async fn debounce(&self, ticket: &FetchTicket) -> bool {
        if self.debounce.is_zero() {
            return !ticket.is_cancelled();
        }
        tokio::select! {
            _ = ticket.token.cancelled() => false,
            _ = tokio::time::sleep(self.debounce) => !ticket.is_cancelled(),
        }
    }

    /// Issue the request, racing it against cancellation and the timeout.
    pub async fn run(
        &self,
        ticket: &FetchTicket,
        source: &dyn ResponseSource,
        path: &str,
        query: &str,
    ) -> FetchOutcome {
        if ticket.is_cancelled() {
            return FetchOutcome::Cancelled;
        }

        let request = tokio::time::timeout(self.request_timeout, source.fetch_page(path, query));

        tokio::select! {
            _ = ticket.token.cancelled() => FetchOutcome::Cancelled,
            result = request => match result {
                Ok(result) => FetchOutcome::Completed(result),
                Err(_) => FetchOutcome::Completed(Err(FeedError::Timeout(
                    self.request_timeout.as_secs(),
                ))),
            },
        }
    }
}
