//! Email classifier: one LLM call per message, total by construction.
//!
//! Any backend failure or undecodable response yields
//! `Classification::fallback()`; `classify` never fails.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::llm::extract::{extract_block, extract_object_span};
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};
use crate::mail::Message;
use crate::pipeline::types::{
    Category, ClassifiedEmail, Classification, FALLBACK_IMPORTANCE, PriorityLevel,
};

/// Temperature for classification (deterministic-ish).
const CLASSIFY_TEMPERATURE: f32 = 0.1;

/// Classifies messages through an LLM.
pub struct Classifier {
    llm: Arc<dyn LlmProvider>,
}

impl Classifier {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Classify one message, falling back to the default classification on
    /// any failure.
    pub async fn classify(&self, message: &Message) -> Classification {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(build_classification_system_prompt()),
            ChatMessage::user(build_classification_user_prompt(message)),
        ])
        .with_temperature(CLASSIFY_TEMPERATURE);

        let response = match self.llm.complete(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(id = %message.id, error = %e, "Classification error, using fallback");
                return Classification::fallback();
            }
        };

        match parse_classification(&response.content) {
            Some(classification) => {
                debug!(
                    id = %message.id,
                    category = %classification.category,
                    importance = classification.importance_score,
                    requires_action = classification.requires_action,
                    "Classified email"
                );
                classification
            }
            None => {
                warn!(
                    id = %message.id,
                    raw_response = %response.content,
                    "Could not parse classification, using fallback"
                );
                Classification::fallback()
            }
        }
    }

    /// Classify messages one at a time, preserving order.
    pub async fn classify_all(&self, messages: Vec<Message>) -> Vec<ClassifiedEmail> {
        info!("Classifying {} emails", messages.len());
        let mut records = Vec::with_capacity(messages.len());
        for message in messages {
            let classification = self.classify(&message).await;
            records.push(ClassifiedEmail::new(message, classification));
        }
        records
    }
}

// ── Prompt construction ─────────────────────────────────────────────

fn build_classification_system_prompt() -> String {
    "You are an email classification engine. Judge the email you are given and \
     respond with ONLY a JSON object of this exact shape:\n\n\
     {\n\
       \"category\": one of \"Work\", \"Personal\", \"Finance\", \"Shopping\", \"Social\", \"News\", \"Spam\",\n\
       \"importance_score\": number between 0 and 1,\n\
       \"requires_action\": true or false,\n\
       \"priority_level\": one of \"Low\", \"Medium\", \"High\", \"Urgent\",\n\
       \"suggested_action\": short instruction, or null if no action is needed,\n\
       \"deadline\": date text, or null if there is no deadline\n\
     }"
        .to_string()
}

fn build_classification_user_prompt(message: &Message) -> String {
    format!(
        "Subject: {}\nFrom: {}\nContent: {}",
        message.subject,
        message.sender,
        message.body_prefix()
    )
}

// ── Response parsing ────────────────────────────────────────────────

/// Decode a model response into a classification.
///
/// Candidates are tried in order: the first fenced block (or the whole text),
/// then the span between the first `{` and last `}`. The first candidate
/// that is a JSON object wins and each field is normalized on its own.
/// Returns `None` only when no candidate is a JSON object.
pub fn parse_classification(raw: &str) -> Option<Classification> {
    let object = [Some(extract_block(raw)), extract_object_span(raw)]
        .into_iter()
        .flatten()
        .find_map(|candidate| match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        })?;

    Some(normalize(&object))
}

fn normalize(object: &Map<String, Value>) -> Classification {
    Classification {
        category: object
            .get("category")
            .and_then(Value::as_str)
            .map(Category::from_label)
            .unwrap_or(Category::Uncategorized),
        importance_score: object
            .get("importance_score")
            .and_then(as_score)
            .unwrap_or(FALLBACK_IMPORTANCE),
        requires_action: object
            .get("requires_action")
            .and_then(as_flag)
            .unwrap_or(false),
        priority_level: object
            .get("priority_level")
            .and_then(Value::as_str)
            .map(PriorityLevel::from_label)
            .unwrap_or(PriorityLevel::Low),
        suggested_action: object.get("suggested_action").and_then(as_text),
        deadline: object.get("deadline").and_then(as_text),
    }
}

fn as_score(value: &Value) -> Option<f64> {
    let score = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    score.is_finite().then(|| score.clamp(0.0, 1.0))
}

fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    let text = value.as_str()?.trim();
    if text.is_empty() || ["null", "none", "n/a"].contains(&text.to_ascii_lowercase().as_str()) {
        return None;
    }
    Some(text.to_string())
}
