// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Newline-delimited JSON log with per-record checksums

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::warn;
use vista_core::{Body, Micros, PersistError, Persister, Record};

/// One line of the log
#[derive(Debug, Serialize, Deserialize)]
struct LogLine {
    index: u64,
    us: Micros,
    entry: serde_json::Value,
    /// CRC32 of the compact JSON text of `entry`
    checksum: u32,
}

fn checksum(entry: &serde_json::Value) -> Result<u32, serde_json::Error> {
    let text = serde_json::to_string(entry)?;
    Ok(crc32fast::hash(text.as_bytes()))
}

/// Read one raw line, newline included, into `buf`; false at end of file
fn read_line(reader: &mut impl BufRead, buf: &mut Vec<u8>) -> io::Result<bool> {
    buf.clear();
    Ok(reader.read_until(b'\n', buf)? > 0)
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

/// Durable log for a stream of `E`, one JSON object per line
pub struct FileLog<E> {
    path: PathBuf,
    file: File,
    next_index: u64,
    last_us: Micros,
    _entry: PhantomData<fn() -> E>,
}

impl<E> FileLog<E> {
    /// Open or create a log at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)?;

        // Count existing lines so appends continue the sequence even
        // without a replay
        let mut reader = BufReader::new(File::open(&path)?);
        let mut line = Vec::new();
        let mut next_index = 0;
        let mut torn = false;
        while read_line(&mut reader, &mut line)? {
            torn = line.last() != Some(&b'\n');
            if !is_blank(&line) {
                next_index += 1;
            }
        }

        if torn {
            // A crash cut the last line short; end it so the next append
            // starts a line of its own
            warn!(path = %path.display(), "terminating torn final log line");
            file.write_all(b"\n")?;
            file.sync_all()?;
        }

        Ok(Self {
            path,
            file,
            next_index,
            last_us: 0,
            _entry: PhantomData,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Index the next appended record must carry
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    fn check(&self, line: &str, expected: u64) -> Result<(LogLine, E), String>
    where
        E: DeserializeOwned,
    {
        let parsed: LogLine = serde_json::from_str(line).map_err(|e| e.to_string())?;
        if parsed.index != expected {
            return Err(format!(
                "index {} out of sequence, expected {expected}",
                parsed.index
            ));
        }
        if parsed.us < self.last_us {
            return Err(format!(
                "timestamp {} precedes {}",
                parsed.us, self.last_us
            ));
        }
        let actual = checksum(&parsed.entry).map_err(|e| e.to_string())?;
        if actual != parsed.checksum {
            return Err(format!(
                "checksum mismatch: stored {:08x}, computed {actual:08x}",
                parsed.checksum
            ));
        }
        let entry = E::deserialize(&parsed.entry).map_err(|e| e.to_string())?;
        Ok((parsed, entry))
    }
}

impl<E> Persister<E> for FileLog<E>
where
    E: Serialize + DeserializeOwned,
{
    fn append(&mut self, record: &Record<E>) -> Result<(), PersistError> {
        let Body::Entry(entry) = &record.body else {
            return Err(PersistError::Rejected(
                "unparsable records are never appended".to_string(),
            ));
        };
        if record.index != self.next_index {
            return Err(PersistError::Rejected(format!(
                "index {} out of sequence, expected {}",
                record.index, self.next_index
            )));
        }

        let entry = serde_json::to_value(entry)?;
        let line = LogLine {
            index: record.index,
            us: record.us,
            checksum: checksum(&entry)?,
            entry,
        };
        let text = serde_json::to_string(&line)?;
        writeln!(self.file, "{}", text)?;
        self.file.sync_all()?;

        self.next_index += 1;
        self.last_us = self.last_us.max(record.us);
        Ok(())
    }

    fn replay(&mut self, on_record: &mut dyn FnMut(Record<E>)) -> Result<(), PersistError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let mut reader = BufReader::new(file);
        let mut bytes = Vec::new();
        let mut line_no = 0usize;
        let mut expected = 0u64;
        self.last_us = 0;
        while read_line(&mut reader, &mut bytes)? {
            line_no += 1;
            if is_blank(&bytes) {
                continue;
            }
            let outcome = match std::str::from_utf8(&bytes) {
                Ok(text) => self.check(text.trim_end(), expected),
                Err(e) => Err(format!("invalid UTF-8: {e}")),
            };
            match outcome {
                Ok((parsed, entry)) => {
                    self.last_us = parsed.us;
                    on_record(Record::entry(expected, parsed.us, entry));
                }
                Err(reason) => {
                    warn!(line = line_no, index = expected, %reason, "unparsable log line");
                    let raw = String::from_utf8_lossy(&bytes).trim_end().to_string();
                    on_record(Record::unparsable(expected, self.last_us, raw, reason));
                }
            }
            expected += 1;
        }

        self.next_index = expected;
        Ok(())
    }
}

#[cfg(test)]
#[path = "file_log_tests.rs"]
mod tests;
