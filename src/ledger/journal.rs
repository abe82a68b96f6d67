use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{JournalError, Result};
use crate::model::Identity;

use super::hash::Digest;
use super::Receipt;

/// Current on-disk format version.
pub const JOURNAL_VERSION: u32 = 1;

/// First line of every journal file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalHeader {
    pub version: u32,
    pub admin: Identity,
}

impl JournalHeader {
    pub fn new(admin: Identity) -> Self {
        Self {
            version: JOURNAL_VERSION,
            admin,
        }
    }

    /// The digest the receipt chain hangs off: SHA-256(version || admin).
    pub fn genesis(&self) -> Digest {
        let mut data = self.version.to_be_bytes().to_vec();
        data.extend_from_slice(self.admin.as_bytes());
        Digest::of(&data)
    }
}

/// Append handle on a journal file. One JSON document per line: the header,
/// then one [`Receipt`] per accepted transaction.
#[derive(Debug)]
pub(super) struct Journal {
    file: File,
}

impl Journal {
    /// Create a new journal, failing if the file already exists.
    pub fn create(path: &Path, header: &JournalHeader) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        let mut journal = Self { file };
        journal.write_line(header)?;
        debug!("Created journal {}", path.display());
        Ok(journal)
    }

    /// Reopen an existing journal for appending. The caller is responsible for
    /// having verified its contents first, and passes the length [`read`] found
    /// them to occupy. Anything past that is a torn write and is cut off, and a
    /// missing final newline is restored so the next receipt starts its own line.
    pub fn reopen(path: &Path, len: u64) -> Result<Self> {
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;
        if file.metadata()?.len() != len {
            warn!("Truncating torn write at the end of {}", path.display());
            file.set_len(len)?;
        }

        let mut last = [0_u8];
        file.seek(SeekFrom::End(-1))?;
        file.read_exact(&mut last)?;
        let mut journal = Self { file };
        if last[0] != b'\n' {
            journal.file.write_all(b"\n")?;
            journal.file.sync_data()?;
        }
        Ok(journal)
    }

    /// Durably append one receipt.
    pub fn append(&mut self, receipt: &Receipt) -> Result<()> {
        self.write_line(receipt)
    }

    fn write_line<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let mut line = serde_json::to_vec(value)?;
        line.push(b'\n');
        self.file.write_all(&line)?;
        self.file.sync_data()?;
        Ok(())
    }
}

/// Everything [`read`] found in a journal file.
#[derive(Debug)]
pub(super) struct Contents {
    pub header: JournalHeader,
    pub receipts: Vec<Receipt>,
    /// Bytes of the file taken up by the header and receipts.
    pub len: u64,
}

/// Read a whole journal without verifying anything beyond its syntax.
///
/// A final line that has no newline and does not parse is an append that was
/// interrupted part way, so it is dropped. Unparseable lines anywhere else are
/// an error.
pub(super) fn read(path: &Path) -> Result<Contents> {
    let data = fs::read(path)?;
    let mut header: Option<JournalHeader> = None;
    let mut receipts: Vec<Receipt> = Vec::new();
    let mut len = 0;

    let mut offset = 0;
    while offset < data.len() {
        let rest = &data[offset..];
        let (line, complete) = match rest.iter().position(|&b| b == b'\n') {
            Some(end) => (&rest[..end], true),
            None => (rest, false),
        };
        offset += line.len() + usize::from(complete);
        if line.iter().all(u8::is_ascii_whitespace) {
            if complete {
                len = offset;
            }
            continue;
        }

        let parsed = if header.is_none() {
            serde_json::from_slice(line).map(|h| header = Some(h))
        } else {
            serde_json::from_slice(line).map(|r| receipts.push(r))
        };
        match parsed {
            Ok(()) => len = offset,
            Err(e) if !complete => {
                warn!("Dropping torn final line of {}: {e}", path.display());
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    let header = header.ok_or(JournalError::MissingHeader)?;
    debug!("Read {} receipt(s) from {}", receipts.len(), path.display());
    Ok(Contents {
        header,
        receipts,
        len: len as u64,
    })
}
