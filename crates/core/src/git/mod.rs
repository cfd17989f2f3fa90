//! Git access for change detection.

pub mod client;

pub use client::GitClient;
