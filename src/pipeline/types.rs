//! Shared types for the classification pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mail::Message;

/// Records scoring above this are important regardless of action flags.
pub const IMPORTANCE_THRESHOLD: f64 = 0.7;

/// Importance assigned when the model gives none.
pub const FALLBACK_IMPORTANCE: f64 = 0.5;

// ── Category ────────────────────────────────────────────────────────

/// Coarse topic of an email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Work,
    Personal,
    Finance,
    Shopping,
    Social,
    News,
    Spam,
    Uncategorized,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Self::Work,
        Self::Personal,
        Self::Finance,
        Self::Shopping,
        Self::Social,
        Self::News,
        Self::Spam,
        Self::Uncategorized,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::Personal => "Personal",
            Self::Finance => "Finance",
            Self::Shopping => "Shopping",
            Self::Social => "Social",
            Self::News => "News",
            Self::Spam => "Spam",
            Self::Uncategorized => "Uncategorized",
        }
    }

    /// Case-insensitive match on the variant name; anything else is
    /// `Uncategorized`.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(label))
            .unwrap_or(Self::Uncategorized)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Priority ────────────────────────────────────────────────────────

/// Urgency of an email, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriorityLevel {
    Low,
    Medium,
    High,
    Urgent,
}

impl PriorityLevel {
    pub const ALL: [PriorityLevel; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Urgent => "Urgent",
        }
    }

    /// Case-insensitive match on the variant name; anything else is `Low`.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(label))
            .unwrap_or(Self::Low)
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Classification ──────────────────────────────────────────────────

/// Structured judgment of one email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    /// Always within `[0.0, 1.0]`.
    pub importance_score: f64,
    pub requires_action: bool,
    pub priority_level: PriorityLevel,
    pub suggested_action: Option<String>,
    /// Free text as the model wrote it; not validated as a date.
    pub deadline: Option<String>,
}

impl Classification {
    /// The value substituted whenever the backend cannot classify.
    pub fn fallback() -> Self {
        Self {
            category: Category::Uncategorized,
            importance_score: FALLBACK_IMPORTANCE,
            requires_action: false,
            priority_level: PriorityLevel::Low,
            suggested_action: None,
            deadline: None,
        }
    }

    /// `importance_score > 0.7 || requires_action`.
    pub fn is_important(&self) -> bool {
        self.importance_score > IMPORTANCE_THRESHOLD || self.requires_action
    }
}

impl Default for Classification {
    fn default() -> Self {
        Self::fallback()
    }
}

// ── Classified email ────────────────────────────────────────────────

/// One record of the classified-email cache: message, classification and
/// an optional summary, serialized as a single flat JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedEmail {
    #[serde(flatten)]
    pub message: Message,
    #[serde(flatten)]
    pub classification: Classification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl ClassifiedEmail {
    pub fn new(message: Message, classification: Classification) -> Self {
        Self {
            message,
            classification,
            summary: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn is_important(&self) -> bool {
        self.classification.is_important()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record() -> ClassifiedEmail {
        ClassifiedEmail::new(
            Message {
                subject: "Invoice #42".into(),
                sender: "billing@vendor.com".into(),
                sent_at: Utc.with_ymd_and_hms(2025, 2, 3, 14, 5, 9).unwrap(),
                body: "Payment due Friday".into(),
                id: "m-42".into(),
                labels: vec!["INBOX".into(), "CATEGORY_UPDATES".into()],
            },
            Classification {
                category: Category::Finance,
                importance_score: 0.8,
                requires_action: true,
                priority_level: PriorityLevel::High,
                suggested_action: Some("Pay the invoice".into()),
                deadline: Some("Friday".into()),
            },
        )
    }

    #[test]
    fn category_labels_are_case_insensitive() {
        assert_eq!(Category::from_label("work"), Category::Work);
        assert_eq!(Category::from_label(" FINANCE "), Category::Finance);
        assert_eq!(Category::from_label("Promotions"), Category::Uncategorized);
    }

    #[test]
    fn priority_labels_default_to_low() {
        assert_eq!(PriorityLevel::from_label("urgent"), PriorityLevel::Urgent);
        assert_eq!(PriorityLevel::from_label("critical"), PriorityLevel::Low);
        assert!(PriorityLevel::Urgent > PriorityLevel::High);
    }

    #[test]
    fn fallback_matches_documented_values() {
        let c = Classification::fallback();
        assert_eq!(c.category, Category::Uncategorized);
        assert_eq!(c.importance_score, 0.5);
        assert!(!c.requires_action);
        assert_eq!(c.priority_level, PriorityLevel::Low);
        assert!(c.suggested_action.is_none());
        assert!(c.deadline.is_none());
        assert!(!c.is_important());
    }

    #[test]
    fn importance_threshold_is_strict() {
        let mut c = Classification::fallback();
        c.importance_score = 0.7;
        assert!(!c.is_important());
        c.importance_score = 0.71;
        assert!(c.is_important());
        c.importance_score = 0.1;
        c.requires_action = true;
        assert!(c.is_important());
    }

    #[test]
    fn record_serializes_flat() {
        let json = serde_json::to_value(record()).unwrap();
        let obj = json.as_object().unwrap();

        for key in [
            "subject",
            "sender",
            "date",
            "body",
            "message_id",
            "labels",
            "category",
            "importance_score",
            "requires_action",
            "priority_level",
            "suggested_action",
            "deadline",
        ] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
        assert!(!obj.contains_key("summary"));
        assert_eq!(json["category"], "Finance");
        assert_eq!(json["priority_level"], "High");
        assert_eq!(json["date"], "2025-02-03T14:05:09Z");
    }

    #[test]
    fn record_roundtrips_with_summary() {
        let original = record().with_summary("Invoice due Friday.");
        let json = serde_json::to_string(&original).unwrap();
        let parsed: ClassifiedEmail = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn null_optionals_deserialize_as_none() {
        let json = r#"{
            "subject": "Hi", "sender": "a@b.c", "date": "2025-02-03T14:05:09+00:00",
            "body": "", "message_id": "x", "labels": [],
            "category": "Social", "importance_score": 0.2, "requires_action": false,
            "priority_level": "Low", "suggested_action": null, "deadline": null
        }"#;
        let parsed: ClassifiedEmail = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.classification.category, Category::Social);
        assert!(parsed.classification.suggested_action.is_none());
        assert!(parsed.summary.is_none());
    }
}
