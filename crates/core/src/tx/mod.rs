//! Transifex CLI wrapper.

pub mod client;

pub use client::TxClient;
