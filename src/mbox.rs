//! Mbox mail store reader
//!
//! An mbox file is a plain concatenation of RFC 5322 messages, each one
//! introduced by a separator line starting with `From `. Messages are read
//! one line at a time, so only the message being assembled is held in memory.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};
use tracing::debug;

const SEPARATOR: &[u8] = b"From ";

#[derive(Debug, Clone)]
enum Source {
    File,
    Memory(Vec<u8>),
}

/// An mbox mail store, either a file on disk or content already in memory
#[derive(Debug, Clone)]
pub struct Mailbox {
    path: PathBuf,
    source: Source,
}

impl Mailbox {
    /// Check that the mbox file at `path` exists; nothing is read yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| store_error(path, e))?;
        if !metadata.is_file() {
            return Err(Error::MailStoreNotFound(path.to_path_buf()));
        }

        debug!("Found mbox {} ({} bytes)", path.display(), metadata.len());

        Ok(Self {
            path: path.to_path_buf(),
            source: Source::File,
        })
    }

    /// Wrap mbox content that is already in memory.
    #[must_use]
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            path: PathBuf::new(),
            source: Source::Memory(data.into()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw messages in file order. Each call starts again from the top,
    /// reopening the file.
    pub fn messages(&self) -> Result<Messages<'_>> {
        let reader: Box<dyn BufRead + '_> = match &self.source {
            Source::File => {
                let file = File::open(&self.path).map_err(|e| store_error(&self.path, e))?;
                Box::new(BufReader::new(file))
            }
            Source::Memory(data) => Box::new(Cursor::new(data.as_slice())),
        };

        Ok(Messages {
            path: &self.path,
            reader,
            line: Vec::new(),
            in_message: false,
            done: false,
        })
    }
}

fn store_error(path: &Path, e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::NotFound {
        Error::MailStoreNotFound(path.to_path_buf())
    } else {
        Error::io(path, e)
    }
}

/// Iterator over the raw bytes of each message, separator line excluded.
///
/// Content before the first separator is skipped. A read error is yielded
/// once and ends the iteration.
pub struct Messages<'a> {
    path: &'a Path,
    reader: Box<dyn BufRead + 'a>,
    line: Vec<u8>,
    in_message: bool,
    done: bool,
}

impl Iterator for Messages<'_> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut message = Vec::new();
        loop {
            self.line.clear();
            match self.reader.read_until(b'\n', &mut self.line) {
                Ok(0) => {
                    self.done = true;
                    return self.in_message.then_some(Ok(message));
                }
                Ok(_) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(Error::io(self.path, e)));
                }
            }

            if self.line.starts_with(SEPARATOR) {
                if self.in_message {
                    strip_line_break(&mut message);
                    return Some(Ok(message));
                }
                self.in_message = true;
            } else if self.in_message {
                message.extend_from_slice(&self.line);
            }
        }
    }
}

/// The line break in front of a separator belongs to the separator.
fn strip_line_break(message: &mut Vec<u8>) {
    if message.last() == Some(&b'\n') {
        message.pop();
        if message.last() == Some(&b'\r') {
            message.pop();
        }
    }
}
