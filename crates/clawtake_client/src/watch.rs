//! Feed polling loop: fetch a batch, show it, acknowledge it, wait, repeat.
//!
//! A batch is acknowledged with one call, only after every question in it has
//! been written out. If the process dies in between, the service redelivers the
//! batch on the next poll; a question is never acknowledged unseen.

use std::io::Write;
use std::time::Duration;

use crate::client::{Client, ClientError};
use crate::display;

/// Default seconds between polls.
pub const DEFAULT_INTERVAL_SECS: i64 = 60;
/// Default page size requested from the feed.
pub const DEFAULT_LIMIT: u32 = 10;

/// Poller settings.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Seconds to wait between cycles; zero or negative runs a single cycle.
    pub interval_secs: i64,
    pub limit: Option<u32>,
    /// Print each question's full body.
    pub show_body: bool,
    /// Consecutive failed cycles tolerated before giving up. `1` stops on the
    /// first failure.
    pub max_consecutive_failures: u32,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            limit: Some(DEFAULT_LIMIT),
            show_body: false,
            max_consecutive_failures: 1,
        }
    }
}

impl WatchOptions {
    pub fn single_shot(&self) -> bool {
        self.interval_secs <= 0
    }
}

/// Result of one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Feed was empty; nothing was acknowledged.
    Empty,
    Delivered { acknowledged: usize, has_more: bool },
}

/// Poller failure.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error(transparent)]
    Client(#[from] ClientError),
    /// Writing a batch failed; the batch was not acknowledged.
    #[error("cannot write output: {0}")]
    Output(#[from] std::io::Error),
}

pub struct FeedPoller<'a, W: Write> {
    client: &'a Client,
    out: W,
    options: WatchOptions,
}

impl<'a, W: Write> FeedPoller<'a, W> {
    pub fn new(client: &'a Client, out: W, options: WatchOptions) -> Self {
        Self {
            client,
            out,
            options,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Poll until a failure budget is exhausted. In single-shot mode, run one
    /// cycle and return its result without sleeping.
    pub async fn run(&mut self) -> Result<(), WatchError> {
        self.client.require_key("watch")?;
        let max_failures = self.options.max_consecutive_failures.max(1);
        let mut failures = 0u32;

        loop {
            match self.poll_once().await {
                Ok(outcome) => {
                    failures = 0;
                    tracing::debug!(?outcome, "poll cycle finished");
                }
                Err(e) => {
                    failures += 1;
                    if self.options.single_shot() || failures >= max_failures {
                        return Err(e);
                    }
                    tracing::warn!(
                        error = %e,
                        failures,
                        max_failures,
                        "poll cycle failed; retrying after interval"
                    );
                }
            }

            if self.options.single_shot() {
                return Ok(());
            }
            let wait = Duration::from_secs(self.options.interval_secs as u64);
            tokio::time::sleep(wait).await;
        }
    }

    /// One fetch → display → acknowledge cycle.
    pub async fn poll_once(&mut self) -> Result<CycleOutcome, WatchError> {
        let batch = self.client.feed(self.options.limit).await?;
        let now = chrono::Local::now().format("%H:%M:%S");

        if batch.questions.is_empty() {
            if self.options.single_shot() {
                writeln!(self.out, "[{}] No new questions.", now)?;
            } else {
                writeln!(
                    self.out,
                    "[{}] No new questions. Waiting {}s...",
                    now, self.options.interval_secs
                )?;
            }
            self.out.flush()?;
            return Ok(CycleOutcome::Empty);
        }

        writeln!(
            self.out,
            "\n[{}] Found {} new question(s):",
            now,
            batch.questions.len()
        )?;
        for q in &batch.questions {
            display::feed_question(&mut self.out, q, self.options.show_body)?;
        }
        self.out.flush()?;

        let ids = batch.question_ids();
        let acknowledged = self.client.acknowledge(&ids).await?;
        tracing::info!(
            delivered = ids.len(),
            acknowledged,
            has_more = batch.has_more,
            "acknowledged feed batch"
        );
        writeln!(self.out, "\n  Acknowledged {} question(s).", ids.len())?;
        if batch.has_more {
            writeln!(self.out, "  (more questions available)")?;
        }
        self.out.flush()?;

        Ok(CycleOutcome::Delivered {
            acknowledged: ids.len(),
            has_more: batch.has_more,
        })
    }
}
