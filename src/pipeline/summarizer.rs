//! Summaries: per message, per period, and the markdown digest.
//!
//! Every operation is best-effort. A failed backend call becomes a fixed
//! placeholder string; nothing here returns an error.

use std::sync::Arc;

use chrono::Local;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::LlmError;
use crate::llm::provider::{CompletionRequest, LlmProvider};
use crate::mail::Message;
use crate::pipeline::digest::{DigestWriter, render_digest};
use crate::pipeline::types::{Category, ClassifiedEmail};

/// Returned for empty input, without any backend call.
pub const NO_EMAILS_MESSAGE: &str = "No emails to summarize.";

/// Produces natural-language summaries through an LLM.
pub struct Summarizer {
    llm: Arc<dyn LlmProvider>,
    digest_writer: DigestWriter,
}

/// Compact per-message entry fed to the period report prompt.
#[derive(Debug, Serialize)]
struct PeriodEntry<'a> {
    subject: &'a str,
    sender: &'a str,
    summary: String,
    category: Category,
    importance: f64,
    requires_action: bool,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn LlmProvider>, digest_writer: DigestWriter) -> Self {
        Self { llm, digest_writer }
    }

    async fn ask(&self, prompt: String) -> Result<String, LlmError> {
        let response = self.llm.complete(CompletionRequest::from_prompt(prompt)).await?;
        Ok(response.content.trim().to_string())
    }

    /// Summarize a single message.
    pub async fn summarize(&self, message: &Message) -> String {
        match self.ask(build_summary_prompt(message)).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(id = %message.id, error = %e, "Summarization error");
                format!("Error summarizing email: {}", message.subject)
            }
        }
    }

    /// Give `record` a summary if it has none. Returns whether one was
    /// computed.
    pub async fn ensure_summary(&self, record: &mut ClassifiedEmail) -> bool {
        if record.summary.is_some() {
            return false;
        }
        record.summary = Some(self.summarize(&record.message).await);
        true
    }

    /// Aggregate report over `emails`: one `summarize` call per message,
    /// then one call for the report itself.
    pub async fn summarize_period(&self, emails: &[ClassifiedEmail], hours: u32) -> String {
        if emails.is_empty() {
            return NO_EMAILS_MESSAGE.to_string();
        }

        info!(count = emails.len(), hours, "Generating period summary");
        let mut entries = Vec::with_capacity(emails.len());
        for email in emails {
            entries.push(PeriodEntry {
                subject: &email.message.subject,
                sender: &email.message.sender,
                summary: self.summarize(&email.message).await,
                category: email.classification.category,
                importance: email.classification.importance_score,
                requires_action: email.classification.requires_action,
            });
        }

        let result = match serde_json::to_string_pretty(&entries) {
            Ok(data) => self.ask(build_period_prompt(&data, hours)).await,
            Err(e) => Err(LlmError::from(e)),
        };

        match result {
            Ok(summary) => summary,
            Err(e) => {
                warn!(hours, error = %e, "Period summarization error");
                format!("Error creating period summary for the last {hours} hours")
            }
        }
    }

    /// Render the digest and write it to the digest directory. A failed
    /// write is logged; the rendered text is returned either way.
    pub async fn generate_digest(&self, emails: &[ClassifiedEmail], hours: u32) -> String {
        if emails.is_empty() {
            return NO_EMAILS_MESSAGE.to_string();
        }

        let generated_at = Local::now();
        let digest = render_digest(emails, hours, generated_at);

        match self.digest_writer.write(&digest, generated_at).await {
            Ok(path) => info!(path = %path.display(), "Daily digest saved"),
            Err(e) => warn!(
                dir = %self.digest_writer.dir().display(),
                error = %e,
                "Failed to save daily digest"
            ),
        }
        digest
    }

    /// Detailed single-message analysis.
    pub async fn analyze(&self, message: &Message) -> String {
        match self.ask(build_analysis_prompt(message)).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(id = %message.id, error = %e, "Analysis error");
                format!("Error analyzing email: {}", message.subject)
            }
        }
    }
}

// ── Prompt construction ─────────────────────────────────────────────

fn email_block(message: &Message) -> String {
    format!(
        "Subject: {}\nFrom: {}\nContent: {}",
        message.subject,
        message.sender,
        message.body_prefix()
    )
}

fn build_summary_prompt(message: &Message) -> String {
    format!(
        "Summarize this email concisely.\n\n{}\n\n\
         Cover the main points, any actions the recipient must take, \
         key dates or deadlines, and other important details.",
        email_block(message)
    )
}

fn build_period_prompt(data: &str, hours: u32) -> String {
    format!(
        "Write a summary report of the emails received in the last {hours} hours.\n\n\
         Email data:\n{data}\n\n\
         Structure the report as:\n\
         1. Total number of emails\n\
         2. Key highlights and important messages\n\
         3. Action items\n\
         4. Breakdown by category\n\
         5. Time-sensitive items"
    )
}

fn build_analysis_prompt(message: &Message) -> String {
    format!(
        "Analyze this email in detail.\n\n{}\n\n\
         Provide:\n\
         1. Key points and main message\n\
         2. Required actions or next steps\n\
         3. Deadlines or important dates\n\
         4. A suggested response, if one is needed\n\
         5. Calendar-related items\n\
         6. Priority level and urgency",
        email_block(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use tempfile::TempDir;

    use crate::llm::provider::{CompletionResponse, FinishReason};
    use crate::pipeline::types::Classification;

    /// Echoing mock: replies "summary #N", records prompts, can be failed.
    struct MockSummaryLlm {
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    impl MockSummaryLlm {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
                fail,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmProvider for MockSummaryLlm {
        fn model_name(&self) -> &str {
            "mock-summary"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.prompts
                .lock()
                .unwrap()
                .push(request.messages[0].content.clone());
            if self.fail {
                return Err(LlmError::RequestFailed {
                    provider: "mock".into(),
                    reason: "offline".into(),
                });
            }
            Ok(CompletionResponse {
                content: format!("  summary #{n}\n"),
                input_tokens: 0,
                output_tokens: 0,
                finish_reason: FinishReason::Stop,
            })
        }
    }

    fn message(subject: &str) -> Message {
        Message {
            subject: subject.into(),
            sender: "news@paper.com".into(),
            sent_at: Utc::now(),
            body: "Body text".into(),
            id: subject.into(),
            labels: vec![],
        }
    }

    fn record(subject: &str) -> ClassifiedEmail {
        ClassifiedEmail::new(message(subject), Classification::fallback())
    }

    fn summarizer(llm: Arc<MockSummaryLlm>) -> (Summarizer, TempDir) {
        let dir = TempDir::new().unwrap();
        let writer = DigestWriter::new(dir.path().join("mail_digests"));
        (Summarizer::new(llm, writer), dir)
    }

    #[tokio::test]
    async fn summarize_trims_model_output() {
        let llm = MockSummaryLlm::new(false);
        let (s, _dir) = summarizer(llm.clone());
        assert_eq!(s.summarize(&message("Hello")).await, "summary #1");
        assert!(llm.prompts.lock().unwrap()[0].contains("Subject: Hello"));
    }

    #[tokio::test]
    async fn summarize_failure_names_subject() {
        let (s, _dir) = summarizer(MockSummaryLlm::new(true));
        assert_eq!(
            s.summarize(&message("Board meeting")).await,
            "Error summarizing email: Board meeting"
        );
    }

    #[tokio::test]
    async fn summary_prompt_truncates_body() {
        let llm = MockSummaryLlm::new(false);
        let (s, _dir) = summarizer(llm.clone());
        let mut long = message("Long");
        long.body = "Q".repeat(9000);
        s.summarize(&long).await;
        assert_eq!(llm.prompts.lock().unwrap()[0].matches('Q').count(), 2000);
    }

    #[tokio::test]
    async fn ensure_summary_only_fills_missing() {
        let llm = MockSummaryLlm::new(false);
        let (s, _dir) = summarizer(llm.clone());

        let mut fresh = record("a");
        assert!(s.ensure_summary(&mut fresh).await);
        assert_eq!(fresh.summary.as_deref(), Some("summary #1"));

        let mut done = record("b").with_summary("already here");
        assert!(!s.ensure_summary(&mut done).await);
        assert_eq!(done.summary.as_deref(), Some("already here"));
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn period_summary_calls_once_per_message_plus_report() {
        let llm = MockSummaryLlm::new(false);
        let (s, _dir) = summarizer(llm.clone());

        let report = s
            .summarize_period(&[record("a"), record("b"), record("c")], 24)
            .await;

        assert_eq!(llm.calls(), 4);
        assert_eq!(report, "summary #4");
        let prompts = llm.prompts.lock().unwrap();
        let last = prompts.last().unwrap();
        assert!(last.contains("last 24 hours"));
        assert!(last.contains("\"summary\": \"summary #1\""));
        assert!(last.contains("\"category\": \"Uncategorized\""));
        assert!(last.contains("\"requires_action\": false"));
    }

    #[tokio::test]
    async fn period_summary_empty_input_makes_no_calls() {
        let llm = MockSummaryLlm::new(false);
        let (s, _dir) = summarizer(llm.clone());
        assert_eq!(s.summarize_period(&[], 24).await, NO_EMAILS_MESSAGE);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn period_summary_failure_names_window() {
        let (s, _dir) = summarizer(MockSummaryLlm::new(true));
        assert_eq!(
            s.summarize_period(&[record("a")], 48).await,
            "Error creating period summary for the last 48 hours"
        );
    }

    #[tokio::test]
    async fn digest_empty_input_makes_no_calls_and_no_file() {
        let llm = MockSummaryLlm::new(false);
        let (s, dir) = summarizer(llm.clone());

        assert_eq!(s.generate_digest(&[], 24).await, NO_EMAILS_MESSAGE);
        assert_eq!(llm.calls(), 0);
        assert!(!dir.path().join("mail_digests").exists());
    }

    #[tokio::test]
    async fn digest_is_written_and_returned() {
        let llm = MockSummaryLlm::new(false);
        let (s, dir) = summarizer(llm.clone());

        let digest = s.generate_digest(&[record("Weekly report")], 24).await;
        assert!(digest.contains("**Weekly report**"));
        assert_eq!(llm.calls(), 0);

        let files: Vec<_> = std::fs::read_dir(dir.path().join("mail_digests"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(files.len(), 1);
        assert_eq!(std::fs::read_to_string(&files[0]).unwrap(), digest);
    }

    #[tokio::test]
    async fn digest_write_failure_still_returns_text() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "file").unwrap();
        let s = Summarizer::new(MockSummaryLlm::new(false), DigestWriter::new(&blocker));

        let digest = s.generate_digest(&[record("x")], 24).await;
        assert!(digest.starts_with("# Email Digest for"));
    }

    #[tokio::test]
    async fn analyze_falls_back_on_failure() {
        let (s, _dir) = summarizer(MockSummaryLlm::new(true));
        assert_eq!(
            s.analyze(&message("Contract")).await,
            "Error analyzing email: Contract"
        );
    }

    #[tokio::test]
    async fn analyze_prompt_asks_for_calendar_items() {
        let llm = MockSummaryLlm::new(false);
        let (s, _dir) = summarizer(llm.clone());
        s.analyze(&message("Offsite")).await;
        let prompt = &llm.prompts.lock().unwrap()[0];
        assert!(prompt.contains("Calendar-related items"));
        assert!(prompt.contains("Subject: Offsite"));
    }
}
