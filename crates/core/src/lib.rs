//! txpush core library.
//!
//! Reads the Transifex client configuration, works out which resources had
//! their source file changed since a base revision, pushes those resources
//! with the `tx` client and reports the pushed changes to Slack.

pub mod changes;
pub mod config;
pub mod errors;
pub mod git;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod publish;
pub mod tx;
pub mod tx_config;

// Re-exports for convenience.
pub use changes::ChangeDetector;
pub use config::Settings;
pub use git::GitClient;
pub use notify::SlackNotifier;
pub use pipeline::PushPipeline;
pub use tx::TxClient;
pub use tx_config::TxConfig;
