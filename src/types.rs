//! Core types for extracted records and run summaries

use crate::sanitize::subject_stem;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the per-sender directory holding attachment folders
pub const ATTACHMENTS_DIR: &str = "attachments";

/// Placeholder written when a message has no readable body
pub const NO_BODY_PLACEHOLDER: &str = "[No readable text body found]";

const SEPARATOR_WIDTH: usize = 40;

/// 1-based position of a message among all messages examined in one run
///
/// This is the join key between a record's text file and its attachment
/// directory. It renders zero-padded to four digits and widens past 9999.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct SequenceIndex(pub u64);

impl SequenceIndex {
    #[must_use]
    pub const fn new(index: u64) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// `NNNN_<subject>.txt`
    #[must_use]
    pub fn text_file_name(self, subject: &str) -> String {
        format!("{}_{}.txt", self, subject_stem(subject))
    }

    /// `<sender_dir>/attachments/NNNN`
    #[must_use]
    pub fn attachment_dir(self, sender_dir: &Path) -> PathBuf {
        sender_dir.join(ATTACHMENTS_DIR).join(self.to_string())
    }
}

impl fmt::Display for SequenceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

/// Content of one record's text file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRecord {
    /// Decoded subject
    pub subject: String,

    /// Decoded sender
    pub from: String,

    /// Date header exactly as received
    pub date: String,

    /// Attachment paths relative to the text file's directory, `/`-separated
    pub attachments: Vec<String>,

    /// Readable body, if any
    pub body: Option<String>,
}

impl TextRecord {
    /// Relative reference from `base` to `path`, always `/`-separated.
    ///
    /// Returns `None` when `path` does not live under `base`.
    #[must_use]
    pub fn relative_reference(base: &Path, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(base).ok()?;
        let parts: Vec<_> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }

    /// Render the text file.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!(
            "Subject: {}\nFrom: {}\nDate: {}\n",
            self.subject, self.from, self.date
        );

        if !self.attachments.is_empty() {
            out.push_str("Attachments:\n");
            for path in &self.attachments {
                out.push_str("- ");
                out.push_str(path);
                out.push('\n');
            }
        }

        out.push_str(&"-".repeat(SEPARATOR_WIDTH));
        out.push_str("\n\n");

        match self.body.as_deref().filter(|b| !b.is_empty()) {
            Some(body) => out.push_str(body),
            None => {
                out.push_str(NO_BODY_PLACEHOLDER);
                out.push('\n');
            }
        }

        out
    }

    /// Attachment references listed in a rendered text file, in order.
    #[must_use]
    pub fn parse_attachment_refs(text: &str) -> Vec<String> {
        let separator = "-".repeat(SEPARATOR_WIDTH);
        text.lines()
            .take_while(|line| *line != separator)
            .skip_while(|line| *line != "Attachments:")
            .filter_map(|line| line.strip_prefix("- "))
            .map(str::to_string)
            .collect()
    }
}

/// Settings for one extraction run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// Root of the output tree
    pub output_dir: PathBuf,

    /// Stop once this many records were extracted; `None` or 0 means no limit
    pub limit: Option<usize>,

    /// Only extract messages whose subject or sender contains this, case-insensitively
    pub keyword: Option<String>,
}

impl ExtractOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            limit: None,
            keyword: None,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// Effective limit, with 0 treated as unlimited
    #[must_use]
    pub fn effective_limit(&self) -> Option<usize> {
        self.limit.filter(|&n| n > 0)
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new("output")
    }
}

/// Outcome of an extraction run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Messages examined, including filtered ones
    pub processed: u64,

    /// Text files written
    pub extracted: u64,

    /// Messages that failed to parse or write
    pub failed: u64,

    /// Whether the run stopped at the extraction limit
    pub limit_reached: bool,
}

/// Outcome of an organize pass
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrganizeSummary {
    /// Sender folders scanned
    pub senders: u64,

    /// Text files moved into a category folder
    pub moved: u64,

    /// Attachment directories moved along with their text file
    pub attachment_dirs_moved: u64,

    /// Moves that failed and were left in place
    pub failed: u64,
}
