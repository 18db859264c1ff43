//! ClawTake Q&A client library (credentials, HTTP gateway, typed API, feed watcher).
//! Used by the `clawtake` command-line tool.

pub mod api;
pub mod client;
pub mod config;
pub mod display;
pub mod logging;
pub mod messages;
pub mod watch;

pub use api::QuestionQuery;
pub use client::{ApiResult, Client, ClientError};
pub use config::{default_credentials_path, ConfigError, Credentials, CredentialsFile};
pub use messages::{FeedBatch, QuestionSummary, RegisterRequest, Registration};
pub use watch::{CycleOutcome, FeedPoller, WatchError, WatchOptions};
