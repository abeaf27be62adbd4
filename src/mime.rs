//! MIME decomposition into a readable body and saved attachments

use crate::header::decode_header;
use crate::sanitize::attachment_file_name;
use mailparse::{DispositionType, ParsedMail};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Document types saved as attachments even without an attachment disposition
pub const INLINE_DOCUMENT_TYPES: &[&str] = &["application/pdf"];

const MAX_NESTING: usize = 8;

/// Which kind of body text a leaf carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Plain,
    Html,
}

/// What a single leaf part contributes to the extracted record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartKind {
    /// Saved to disk under its decoded declared file name
    Attachment { filename: String },
    /// Candidate for the readable body
    Body(BodyKind),
    /// Contributes nothing
    Ignored,
}

/// Classify one leaf part.
///
/// An attachment disposition or an inline document type makes the part an
/// attachment, which takes precedence over any body role. Attachments that
/// declare no file name are ignored.
#[must_use]
pub fn classify_part(part: &ParsedMail<'_>) -> PartKind {
    let mimetype = part.ctype.mimetype.to_ascii_lowercase();
    let disposition = part.get_content_disposition();

    let is_attachment = matches!(disposition.disposition, DispositionType::Attachment)
        || INLINE_DOCUMENT_TYPES.contains(&mimetype.as_str());

    if is_attachment {
        return disposition
            .params
            .get("filename")
            .or_else(|| part.ctype.params.get("name"))
            .map(|name| decode_header(Some(name.as_str())))
            .filter(|name| !name.is_empty())
            .map_or(PartKind::Ignored, |filename| PartKind::Attachment { filename });
    }

    match mimetype.as_str() {
        "text/plain" => PartKind::Body(BodyKind::Plain),
        "text/html" => PartKind::Body(BodyKind::Html),
        _ => PartKind::Ignored,
    }
}

/// Result of decomposing one message
#[derive(Debug, Clone, Default)]
pub struct Decomposed {
    /// Readable body, if any non-empty text was found
    pub body: Option<String>,

    /// Absolute paths of the attachments written, in document order
    pub attachments: Vec<PathBuf>,
}

/// Walk `mail` depth-first in document order, saving attachments under
/// `attachment_dir` and collecting the body.
///
/// Plain-text leaves are concatenated with a newline. The first HTML leaf is
/// used only when no plain-text leaf exists. A message that is not multipart
/// is a single body leaf. Embedded `message/rfc822` parts without an
/// attachment disposition are parsed and walked in place. Payloads that fail
/// to decode are skipped.
#[must_use]
pub fn decompose(mail: &ParsedMail<'_>, attachment_dir: &Path) -> Decomposed {
    if !is_multipart(mail) && !is_embedded_message(mail) {
        return Decomposed {
            body: mail.get_body().ok().filter(|b| !b.is_empty()),
            attachments: Vec::new(),
        };
    }

    let mut walker = Walker {
        plain: None,
        html: None,
        writer: AttachmentWriter::new(attachment_dir),
    };
    walker.walk(mail, 0);

    Decomposed {
        body: walker.plain.or(walker.html).filter(|b| !b.is_empty()),
        attachments: walker.writer.into_saved(),
    }
}

fn is_multipart(part: &ParsedMail<'_>) -> bool {
    part.ctype
        .mimetype
        .to_ascii_lowercase()
        .starts_with("multipart/")
}

/// A forwarded message shown inline rather than offered as a file
fn is_embedded_message(part: &ParsedMail<'_>) -> bool {
    part.ctype.mimetype.eq_ignore_ascii_case("message/rfc822")
        && !matches!(
            part.get_content_disposition().disposition,
            DispositionType::Attachment
        )
}

struct Walker<'p> {
    plain: Option<String>,
    html: Option<String>,
    writer: AttachmentWriter<'p>,
}

impl Walker<'_> {
    fn walk(&mut self, part: &ParsedMail<'_>, depth: usize) {
        if !part.subparts.is_empty() {
            for sub in &part.subparts {
                self.walk(sub, depth);
            }
            return;
        }

        if is_multipart(part) {
            return;
        }
        if is_embedded_message(part) {
            self.walk_embedded(part, depth);
            return;
        }
        self.leaf(part);
    }

    fn walk_embedded(&mut self, part: &ParsedMail<'_>, depth: usize) {
        if depth >= MAX_NESTING {
            debug!("Skipping message nested deeper than {MAX_NESTING} levels");
            return;
        }

        let raw = match part.get_body_raw() {
            Ok(raw) => raw,
            Err(e) => {
                debug!("Skipping undecodable embedded message: {e}");
                return;
            }
        };
        match mailparse::parse_mail(&raw) {
            Ok(inner) => self.walk(&inner, depth + 1),
            Err(e) => debug!("Skipping unparsable embedded message: {e}"),
        }
    }

    fn leaf(&mut self, part: &ParsedMail<'_>) {
        match classify_part(part) {
            PartKind::Attachment { filename } => match part.get_body_raw() {
                Ok(payload) => self.writer.save(&filename, &payload),
                Err(e) => warn!("Failed to save attachment {filename}: {e}"),
            },
            PartKind::Body(BodyKind::Plain) => match part.get_body() {
                Ok(text) => match self.plain.as_mut() {
                    Some(body) => {
                        body.push('\n');
                        body.push_str(&text);
                    }
                    None => self.plain = Some(text),
                },
                Err(e) => debug!("Skipping undecodable text part: {e}"),
            },
            PartKind::Body(BodyKind::Html) if self.html.is_none() => match part.get_body() {
                Ok(text) => self.html = Some(text),
                Err(e) => debug!("Skipping undecodable HTML part: {e}"),
            },
            PartKind::Body(BodyKind::Html) | PartKind::Ignored => {}
        }
    }
}

/// Writes one message's attachments into its own directory
struct AttachmentWriter<'p> {
    dir: &'p Path,
    used: HashSet<String>,
    saved: Vec<PathBuf>,
}

impl<'p> AttachmentWriter<'p> {
    fn new(dir: &'p Path) -> Self {
        Self {
            dir,
            used: HashSet::new(),
            saved: Vec::new(),
        }
    }

    fn save(&mut self, declared: &str, payload: &[u8]) {
        // Created on first save only
        if let Err(e) = std::fs::create_dir_all(self.dir) {
            warn!("Failed to save attachment {declared}: {e}");
            return;
        }

        let name = self.unique_name(&attachment_file_name(declared));
        let path = self.dir.join(&name);

        match std::fs::write(&path, payload) {
            Ok(()) => {
                debug!("Saved attachment {}", path.display());
                self.used.insert(name);
                self.saved.push(path);
            }
            Err(e) => {
                warn!("Failed to save attachment {declared}: {e}");
                let _ = std::fs::remove_file(&path);
            }
        }
    }

    /// `name`, or `stem_N.ext` when `name` was already written for this message.
    fn unique_name(&self, name: &str) -> String {
        if !self.used.contains(name) {
            return name.to_string();
        }

        let (stem, ext) = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (name, None),
        };

        (1..)
            .map(|i| match ext {
                Some(ext) => format!("{stem}_{i}.{ext}"),
                None => format!("{stem}_{i}"),
            })
            .find(|candidate| !self.used.contains(candidate))
            .unwrap_or_else(|| name.to_string())
    }

    fn into_saved(self) -> Vec<PathBuf> {
        self.saved
    }
}
