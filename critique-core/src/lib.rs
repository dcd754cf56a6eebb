//! Critique Core - Core library for critique
//!
//! This crate loads a single source file, wraps it in a fixed review prompt,
//! sends it to a hosted chat-completion model, and renders the model's reply.

pub mod client;
pub mod config;
pub mod error;
pub mod prompts;
pub mod report;
pub mod review;
pub mod secrets;
pub mod source;

pub use client::{ChatClient, ChatMessage, ChatRequest, ChatRole, OpenAiClient};
pub use config::{CliOverrides, Config, OversizePolicy, ReviewConfig, Settings};
pub use error::{Error, ErrorKind, Result};
pub use prompts::ReviewRequest;
pub use review::{Review, Reviewer};
pub use secrets::Secrets;
pub use source::SourceFile;
