//! Single-file review orchestration
//!
//! A run loads one file, sends exactly one chat-completion request, and
//! writes the report only after that request has succeeded:
//!
//! ```text
//! Idle -> Requesting -> Done
//!                    -> Failed
//! ```

use std::io::Write;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::client::{ChatClient, ChatRequest};
use crate::config::{ReviewConfig, Settings};
use crate::prompts::ReviewRequest;
use crate::report;
use crate::source::{SizeOutcome, SourceFile};
use crate::Result;

/// Completed review of one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    /// Name of the reviewed file
    pub file_name: String,
    /// Model that produced the review
    pub model: String,
    /// Model output, unmodified
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Requesting,
    Done,
    Failed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::Requesting => "requesting",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Runs reviews against a chat-completion client
pub struct Reviewer<'a> {
    settings: &'a Settings,
    review_config: &'a ReviewConfig,
    client: &'a dyn ChatClient,
}

impl<'a> Reviewer<'a> {
    /// Create a reviewer borrowing its settings and client
    pub fn new(
        settings: &'a Settings,
        review_config: &'a ReviewConfig,
        client: &'a dyn ChatClient,
    ) -> Self {
        Self {
            settings,
            review_config,
            client,
        }
    }

    /// Model identifier used for requests
    pub fn model(&self) -> &str {
        &self.settings.model
    }

    /// Send `source` for review; issues exactly one request
    pub async fn review(&self, source: &SourceFile) -> Result<Review> {
        let request = ChatRequest::new(self.settings, &ReviewRequest::for_source(source));

        debug!(
            phase = %Phase::Requesting,
            client = self.client.name(),
            model = %request.model,
            "Review phase"
        );
        let text = match self.client.complete(&request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(phase = %Phase::Failed, error = %e, "Review phase");
                return Err(e);
            }
        };
        debug!(phase = %Phase::Done, chars = text.len(), "Review phase");

        Ok(Review {
            file_name: source.name(),
            model: self.settings.model.clone(),
            text,
        })
    }

    /// Review the file at `path` and write the report to `out`
    ///
    /// Progress and warnings go to `status`. Nothing is written to `out`
    /// unless the request succeeds.
    pub async fn run(
        &self,
        path: &Path,
        out: &mut impl Write,
        status: &mut impl Write,
    ) -> Result<()> {
        debug!(phase = %Phase::Idle, path = %path.display(), "Review phase");

        let mut source = SourceFile::load(path)?;
        let limit = self.review_config.max_file_chars;

        debug!(
            path = %source.path().display(),
            chars = source.char_count(),
            language = source.language(),
            "Source loaded"
        );

        match source.apply_size_policy(limit, self.review_config.oversize)? {
            SizeOutcome::WithinLimit => {}
            SizeOutcome::Oversize { chars } => writeln!(
                status,
                "Warning: This file is {} characters. Large files consume more API tokens and may increase cost.\n",
                chars
            )?,
            SizeOutcome::Truncated { original_chars } => writeln!(
                status,
                "Warning: This file is {} characters; only the first {} are sent for review.\n",
                original_chars, limit
            )?,
        }

        writeln!(status, "Reviewing '{}' with {}...", source.name(), self.model())?;

        let review = self.review(&source).await?;
        report::write_report(&review, out)?;

        info!(file = %review.file_name, model = %review.model, "Review complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChatRole;
    use crate::config::{Config, OversizePolicy};
    use crate::secrets::Secrets;
    use crate::{Error, ErrorKind};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const DATA_PARSER: &str = r#"import csv


def get_average_age(records):
    """Calculate the average age from a list of records."""
    total = 0
    for record in records:
        total += record["age"]
    average = total / len(records)
    return average
"#;

    /// Stub transport recording every request
    struct RecordingClient {
        reply: std::result::Result<String, fn() -> Error>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl RecordingClient {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing(err: fn() -> Error) -> Self {
            Self {
                reply: Err(err),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn last(&self) -> ChatRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl ChatClient for RecordingClient {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn complete(&self, request: &ChatRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn settings() -> Settings {
        Settings::resolve(&Config::default(), &Secrets::with_api_key("sk-test")).unwrap()
    }

    fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_run_sends_one_request_with_file_text() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "data_parser.py", DATA_PARSER);
        let settings = settings();
        let review_config = ReviewConfig::default();
        let client = RecordingClient::replying("[CRITICAL] Line 9 - Error Handling");
        let reviewer = Reviewer::new(&settings, &review_config, &client);

        let mut out: Vec<u8> = Vec::new();
        let mut status: Vec<u8> = Vec::new();
        reviewer.run(&path, &mut out, &mut status).await.unwrap();

        assert_eq!(client.calls(), 1);
        let request = client.last();
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, ChatRole::System);
        assert_eq!(request.messages[1].role, ChatRole::User);
        assert!(request.content_of(ChatRole::User).unwrap().contains(DATA_PARSER));
        assert!(!request.stream);

        let out = String::from_utf8(out).unwrap();
        let banner_line = out.lines().find(|l| !l.is_empty() && !l.starts_with('=')).unwrap();
        assert!(banner_line.contains("data_parser.py"));
        assert!(out.contains("Model: gpt-4o"));
        assert!(out.contains("[CRITICAL] Line 9 - Error Handling"));

        let status = String::from_utf8(status).unwrap();
        assert!(status.contains("Reviewing 'data_parser.py' with gpt-4o..."));
    }

    #[tokio::test]
    async fn test_system_prompt_stable_across_runs() {
        let dir = TempDir::new().unwrap();
        let first = write(&dir, "a.py", "x = 1\n");
        let second = write(&dir, "b.rs", "fn main() { panic!() }\n");
        let settings = settings();
        let review_config = ReviewConfig::default();
        let client = RecordingClient::replying("ok");
        let reviewer = Reviewer::new(&settings, &review_config, &client);

        reviewer.run(&first, &mut std::io::sink(), &mut std::io::sink()).await.unwrap();
        let a = client.last();
        reviewer.run(&second, &mut std::io::sink(), &mut std::io::sink()).await.unwrap();
        let b = client.last();

        assert_eq!(
            a.content_of(ChatRole::System).unwrap().as_bytes(),
            b.content_of(ChatRole::System).unwrap().as_bytes()
        );
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_missing_file_makes_no_request() {
        let dir = TempDir::new().unwrap();
        let settings = settings();
        let review_config = ReviewConfig::default();
        let client = RecordingClient::replying("unused");
        let reviewer = Reviewer::new(&settings, &review_config, &client);

        let mut out: Vec<u8> = Vec::new();
        let err = reviewer
            .run(&dir.path().join("nope.py"), &mut out, &mut std::io::sink())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::FileAccess);
        assert_eq!(client.calls(), 0);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_directory_makes_no_request() {
        let dir = TempDir::new().unwrap();
        let settings = settings();
        let review_config = ReviewConfig::default();
        let client = RecordingClient::replying("unused");
        let reviewer = Reviewer::new(&settings, &review_config, &client);

        let err = reviewer
            .run(dir.path(), &mut std::io::sink(), &mut std::io::sink())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::FileAccess);
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_writes_nothing_to_out() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "data_parser.py", DATA_PARSER);
        let settings = settings();
        let review_config = ReviewConfig::default();
        let client =
            RecordingClient::failing(|| Error::Upstream("connection refused".to_string()));
        let reviewer = Reviewer::new(&settings, &review_config, &client);

        let mut out: Vec<u8> = Vec::new();
        let err = reviewer
            .run(&path, &mut out, &mut std::io::sink())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(client.calls(), 1);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_oversize_warns_and_sends_whole_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "data_parser.py", DATA_PARSER);
        let settings = settings();
        let review_config = ReviewConfig {
            max_file_chars: 20,
            oversize: OversizePolicy::Warn,
        };
        let client = RecordingClient::replying("ok");
        let reviewer = Reviewer::new(&settings, &review_config, &client);

        let mut status: Vec<u8> = Vec::new();
        reviewer.run(&path, &mut std::io::sink(), &mut status).await.unwrap();

        assert!(String::from_utf8(status).unwrap().contains("Warning: This file is"));
        assert!(client
            .last()
            .content_of(ChatRole::User)
            .unwrap()
            .contains(DATA_PARSER));
    }

    #[tokio::test]
    async fn test_oversize_truncate_sends_prefix() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "data_parser.py", DATA_PARSER);
        let settings = settings();
        let review_config = ReviewConfig {
            max_file_chars: 10,
            oversize: OversizePolicy::Truncate,
        };
        let client = RecordingClient::replying("ok");
        let reviewer = Reviewer::new(&settings, &review_config, &client);

        let mut out: Vec<u8> = Vec::new();
        let mut status: Vec<u8> = Vec::new();
        reviewer.run(&path, &mut out, &mut status).await.unwrap();

        let status = String::from_utf8(status).unwrap();
        assert!(status.contains("only the first 10 are sent for review"));
        assert!(status.contains(&format!("This file is {} characters", DATA_PARSER.len())));

        let user = client.last().content_of(ChatRole::User).unwrap().to_string();
        assert!(user.contains("```python\nimport csv\n```"));
        assert!(!user.contains("get_average_age"));
        assert!(!out.is_empty());
    }

    #[tokio::test]
    async fn test_oversize_reject_makes_no_request() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "data_parser.py", DATA_PARSER);
        let settings = settings();
        let review_config = ReviewConfig {
            max_file_chars: 20,
            oversize: OversizePolicy::Reject,
        };
        let client = RecordingClient::replying("ok");
        let reviewer = Reviewer::new(&settings, &review_config, &client);

        let err = reviewer
            .run(&path, &mut std::io::sink(), &mut std::io::sink())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::SourceTooLarge { .. }));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_review_reports_model_and_name() {
        let settings = settings();
        let review_config = ReviewConfig::default();
        let client = RecordingClient::replying("  raw text kept  ");
        let reviewer = Reviewer::new(&settings, &review_config, &client);

        let source = SourceFile::from_parts("pkg/mod.py", "pass\n");
        let review = reviewer.review(&source).await.unwrap();

        assert_eq!(review.file_name, "mod.py");
        assert_eq!(review.model, "gpt-4o");
        assert_eq!(review.text, "  raw text kept  ");
    }
}
