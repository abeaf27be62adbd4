// Enforce at crate level
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! Mbox extraction and sorting
//!
//! Turns a single mbox archive into a browsable directory tree, then sorts
//! that tree by topic.
//!
//! # Stages
//!
//! - [`extract_mailbox`] writes one folder per sender holding a text file per
//!   message (`NNNN_<subject>.txt`) and its attachments under
//!   `attachments/NNNN/`. The text file lists each attachment by a path
//!   relative to its own directory.
//! - [`organize_tree`] moves each text file, together with its attachment
//!   directory, into a category subfolder chosen by keyword rules on the
//!   file name.
//!
//! The two stages share nothing but the tree on disk.
//!
//! # Example
//!
//! ```rust,no_run
//! use mbox_sort::{CategoryTable, ExtractOptions, extract_mailbox, organize_tree};
//!
//! let options = ExtractOptions::new("output").with_keyword("receipt");
//! let summary = extract_mailbox("archive.mbox", &options).unwrap();
//! println!("Extracted {} of {} messages", summary.extracted, summary.processed);
//!
//! organize_tree("output", &CategoryTable::default()).unwrap();
//! ```

mod classify;
mod error;
mod extract;
mod header;
mod mbox;
mod mime;
mod organize;
mod sanitize;
mod types;

pub use classify::{Category, CategoryTable, FALLBACK_CATEGORY};
pub use error::{Error, Result};
pub use extract::{extract_mailbox, extract_messages};
pub use header::{decode_header, raw_value};
pub use mbox::{Mailbox, Messages};
pub use mime::{BodyKind, Decomposed, INLINE_DOCUMENT_TYPES, PartKind, classify_part, decompose};
pub use organize::{organize_tree, record_id};
pub use sanitize::{
    MAX_NAME_CHARS, UNKNOWN_SENDER, UNNAMED_ATTACHMENT, attachment_file_name, sanitize,
    sender_folder_name, subject_stem, truncate_chars,
};
pub use types::*;
