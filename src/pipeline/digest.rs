//! Markdown daily digest: rendering and the on-disk artifact.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::pipeline::types::{Category, ClassifiedEmail};

const NOT_SPECIFIED: &str = "Not specified";
const NO_SUMMARY: &str = "No summary available";

/// Group records by category, groups in first-seen order.
pub fn group_by_category(emails: &[ClassifiedEmail]) -> Vec<(Category, Vec<&ClassifiedEmail>)> {
    let mut groups: Vec<(Category, Vec<&ClassifiedEmail>)> = Vec::new();
    for email in emails {
        let category = email.classification.category;
        match groups.iter_mut().find(|(c, _)| *c == category) {
            Some((_, members)) => members.push(email),
            None => groups.push((category, vec![email])),
        }
    }
    groups
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

/// Render the digest document.
///
/// Section order is fixed: overview, priority items, category breakdown,
/// action items. Every record appears in the breakdown, including those
/// already listed as priority items.
pub fn render_digest(
    emails: &[ClassifiedEmail],
    hours: u32,
    generated_at: DateTime<Local>,
) -> String {
    let groups = group_by_category(emails);
    let important: Vec<&ClassifiedEmail> = emails.iter().filter(|e| e.is_important()).collect();
    let actions: Vec<&ClassifiedEmail> = emails
        .iter()
        .filter(|e| e.classification.requires_action)
        .collect();

    let category_list = groups
        .iter()
        .map(|(c, _)| c.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let mut out = String::with_capacity(256 + emails.len() * 256);
    out.push_str(&format!(
        "# Email Digest for {}\n\n",
        generated_at.format("%Y-%m-%d")
    ));
    out.push_str("## Overview\n");
    out.push_str(&format!("- Total Emails: {}\n", emails.len()));
    out.push_str(&format!("- Time Period: Last {hours} hours\n"));
    out.push_str(&format!("- Categories Found: {category_list}\n"));

    out.push_str("\n## Priority Items\n");
    if important.is_empty() {
        out.push_str("\n_No priority items._\n");
    }
    for email in &important {
        let c = &email.classification;
        out.push_str(&format!("\n- **{}**\n", email.message.subject));
        out.push_str(&format!("  - From: {}\n", email.message.sender));
        out.push_str(&format!("  - Priority: {}\n", c.priority_level));
        out.push_str(&format!(
            "  - Action Required: {}\n",
            yes_no(c.requires_action)
        ));
        out.push_str(&format!("  - Summary: {}\n", summary_of(email)));
    }

    out.push_str("\n## Category Breakdown\n");
    for (category, members) in &groups {
        out.push_str(&format!(
            "\n### {category} ({})\n",
            plural(members.len(), "email")
        ));
        for email in members {
            out.push_str(&format!("\n- **{}**\n", email.message.subject));
            out.push_str(&format!("  - From: {}\n", email.message.sender));
            out.push_str(&format!(
                "  - Priority: {}\n",
                email.classification.priority_level
            ));
            out.push_str(&format!("  - Summary: {}\n", summary_of(email)));
        }
    }

    out.push_str("\n## Action Items\n");
    if actions.is_empty() {
        out.push_str("\n_No action items._\n");
    }
    for email in &actions {
        let c = &email.classification;
        out.push_str(&format!(
            "\n- [ ] **{}** from {}\n",
            email.message.subject, email.message.sender
        ));
        out.push_str(&format!("  - Priority: {}\n", c.priority_level));
        out.push_str(&format!(
            "  - Action: {}\n",
            c.suggested_action.as_deref().unwrap_or(NOT_SPECIFIED)
        ));
        out.push_str(&format!(
            "  - Deadline: {}\n",
            c.deadline.as_deref().unwrap_or(NOT_SPECIFIED)
        ));
    }

    out
}

fn summary_of(email: &ClassifiedEmail) -> &str {
    email.summary.as_deref().unwrap_or(NO_SUMMARY)
}

/// Writes digest documents into a fixed output directory.
#[derive(Debug, Clone)]
pub struct DigestWriter {
    dir: PathBuf,
}

impl DigestWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `mail_digest_YYYYMMDD_HHMMSS`, without extension.
    pub fn file_stem(generated_at: DateTime<Local>) -> String {
        format!("mail_digest_{}", generated_at.format("%Y%m%d_%H%M%S"))
    }

    /// Write `content` to a new file named after `generated_at`, creating
    /// the directory if needed. An existing file is never overwritten; a
    /// `_N` suffix is added instead.
    pub async fn write(
        &self,
        content: &str,
        generated_at: DateTime<Local>,
    ) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.dir).await?;

        let stem = Self::file_stem(generated_at);
        let mut attempt = 0u32;
        loop {
            let name = if attempt == 0 {
                format!("{stem}.md")
            } else {
                format!("{stem}_{attempt}.md")
            };
            let path = self.dir.join(name);

            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    file.write_all(content.as_bytes()).await?;
                    file.flush().await?;
                    return Ok(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e),
            }
        }
    }
}
