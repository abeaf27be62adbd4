//! Extraction of an mbox into per-sender record folders
//!
//! Every message examined consumes the next [`SequenceIndex`], whether it is
//! extracted, filtered out by keyword or fails. Within one message the
//! attachments are written before the text file that references them.

use crate::error::{Error, Result};
use crate::header::{decode_header, raw_value};
use crate::mbox::Mailbox;
use crate::mime::decompose;
use crate::sanitize::sender_folder_name;
use crate::types::{ExtractOptions, ExtractSummary, SequenceIndex, TextRecord};
use mailparse::ParsedMail;
use std::path::Path;
use tracing::{debug, error, info};

const PROGRESS_EVERY: u64 = 100;
const UNKNOWN_SENDER_DISPLAY: &str = "Unknown Sender";
const NO_SUBJECT: &str = "No Subject";

/// What happened to a single message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Extracted,
    Filtered,
}

/// Extract every message of the mbox at `mbox_path` into `options.output_dir`.
///
/// Fails before doing any work if the mbox cannot be read or the output
/// directory cannot be created. Failures on individual messages are logged
/// and counted, never returned.
pub fn extract_mailbox(mbox_path: impl AsRef<Path>, options: &ExtractOptions) -> Result<ExtractSummary> {
    let mbox_path = mbox_path.as_ref();
    info!("Opening mbox: {}", mbox_path.display());
    let mailbox = Mailbox::open(mbox_path)?;

    extract_stream(mailbox.messages()?, options)
}

/// Extract a sequence of raw messages into `options.output_dir`.
pub fn extract_messages<I, B>(messages: I, options: &ExtractOptions) -> Result<ExtractSummary>
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    extract_stream(messages.into_iter().map(Ok), options)
}

/// A read error on the mail store ends the run; per-message errors do not.
fn extract_stream<I, B>(messages: I, options: &ExtractOptions) -> Result<ExtractSummary>
where
    I: Iterator<Item = Result<B>>,
    B: AsRef<[u8]>,
{
    std::fs::create_dir_all(&options.output_dir).map_err(|e| Error::io(&options.output_dir, e))?;

    let keyword = options
        .keyword
        .as_deref()
        .filter(|k| !k.is_empty())
        .map(str::to_lowercase);
    let limit = options.effective_limit();

    let mut summary = ExtractSummary::default();
    let mut index = SequenceIndex::default();

    info!("Starting extraction...");
    for raw in messages {
        let raw = raw?;
        index = index.next();
        summary.processed += 1;

        match extract_one(raw.as_ref(), index, options, keyword.as_deref()) {
            Ok(Outcome::Extracted) => {
                summary.extracted += 1;
                if summary.extracted % PROGRESS_EVERY == 0 {
                    info!("Extracted {} emails...", summary.extracted);
                }
            }
            Ok(Outcome::Filtered) => debug!("Message {index} does not match keyword, skipped"),
            Err(e) => {
                error!("Error saving email {index}: {e}");
                summary.failed += 1;
            }
        }

        if let Some(limit) = limit
            && summary.extracted >= u64::try_from(limit).unwrap_or(u64::MAX)
        {
            info!("Reached limit of {limit} emails.");
            summary.limit_reached = true;
            break;
        }
    }

    debug!(
        "Done. Processed {} messages. Extracted {} files to '{}'.",
        summary.processed,
        summary.extracted,
        options.output_dir.display()
    );

    Ok(summary)
}

fn extract_one(
    raw: &[u8],
    index: SequenceIndex,
    options: &ExtractOptions,
    keyword: Option<&str>,
) -> Result<Outcome> {
    let mail = mailparse::parse_mail(raw)?;

    if let Some(keyword) = keyword
        && !matches_keyword(&mail, keyword)
    {
        return Ok(Outcome::Filtered);
    }

    save_record(&mail, index, &options.output_dir)?;
    Ok(Outcome::Extracted)
}

/// Case-insensitive match of an already lowercased `keyword` against the
/// decoded subject and sender.
fn matches_keyword(mail: &ParsedMail<'_>, keyword: &str) -> bool {
    let subject = decode_header(raw_value(&mail.headers, "Subject").as_deref());
    let sender = decode_header(raw_value(&mail.headers, "From").as_deref());

    subject.to_lowercase().contains(keyword) || sender.to_lowercase().contains(keyword)
}

/// Write one record: attachments first, then the text file referencing them.
fn save_record(mail: &ParsedMail<'_>, index: SequenceIndex, output_dir: &Path) -> Result<()> {
    let sender = decode_header(raw_value(&mail.headers, "From").as_deref());
    let subject = decode_header(raw_value(&mail.headers, "Subject").as_deref());
    let date = raw_value(&mail.headers, "Date").unwrap_or_default();

    let sender_dir = output_dir.join(sender_folder_name(Some(sender.as_str())));
    std::fs::create_dir_all(&sender_dir).map_err(|e| Error::io(&sender_dir, e))?;

    let subject = if subject.is_empty() { NO_SUBJECT.to_string() } else { subject };
    let file_path = sender_dir.join(index.text_file_name(&subject));

    let parts = decompose(mail, &index.attachment_dir(&sender_dir));
    let attachments = parts
        .attachments
        .iter()
        .filter_map(|path| TextRecord::relative_reference(&sender_dir, path))
        .collect();

    let record = TextRecord {
        subject,
        from: if sender.is_empty() { UNKNOWN_SENDER_DISPLAY.to_string() } else { sender },
        date,
        attachments,
        body: parts.body,
    };

    std::fs::write(&file_path, record.render()).map_err(|e| Error::io(&file_path, e))?;
    debug!("Wrote {}", file_path.display());

    Ok(())
}
