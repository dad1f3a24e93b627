// src/lib.rs
// copycat - find accounts that copied a tweet, streamed from an LLM with web search

pub mod cli;
pub mod config;
pub mod core;
pub mod detect;
pub mod error;
pub mod history;
pub mod identity;
pub mod llm;
pub mod remote;
pub mod server;

pub use config::CopycatConfig;
pub use error::{CopycatError, Result};
