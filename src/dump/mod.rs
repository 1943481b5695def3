use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::error::{HarnessError, Result};

/// Namespace of one capture run: wall-clock seconds and microseconds at
/// run start, rendered `<seconds>-<microseconds>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId {
    pub secs: u64,
    pub micros: u32,
}

impl RunId {
    pub fn now() -> Self {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self {
            secs: elapsed.as_secs(),
            micros: elapsed.subsec_micros(),
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        let (secs, micros) = input.split_once('-')?;
        if !is_decimal(secs) || !is_decimal(micros) {
            return None;
        }
        let micros = micros.parse::<u32>().ok()?;
        if micros >= 1_000_000 {
            return None;
        }
        Some(Self {
            secs: secs.parse().ok()?,
            micros,
        })
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.secs).ok()?;
        DateTime::from_timestamp(secs, self.micros * 1_000)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.secs, self.micros)
    }
}

impl Serialize for RunId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn is_decimal(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

pub fn record_file_name(namespace: &str, sequence: u64) -> String {
    format!("{namespace}.{sequence}")
}

/// Splits `<namespace>.<sequence>`; anything else is not a dump record.
pub fn parse_record_file_name(name: &str) -> Option<(&str, u64)> {
    let (namespace, sequence) = name.rsplit_once('.')?;
    if namespace.is_empty() || !is_decimal(sequence) {
        return None;
    }
    Some((namespace, sequence.parse().ok()?))
}

/// Every record of one namespace found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunListing {
    pub namespace: String,
    /// Sorted ascending.
    pub sequences: Vec<u64>,
}

impl RunListing {
    pub fn run_id(&self) -> Option<RunId> {
        RunId::parse(&self.namespace)
    }

    pub fn record_count(&self) -> usize {
        self.sequences.len()
    }

    /// Length of the gapless prefix `0..n`: what replay will consume.
    pub fn contiguous(&self) -> u64 {
        let mut expected = 0;
        for &sequence in &self.sequences {
            if sequence != expected {
                break;
            }
            expected += 1;
        }
        expected
    }

    /// First missing sequence when records exist past it.
    pub fn first_gap(&self) -> Option<u64> {
        let contiguous = self.contiguous();
        (self.sequences.len() as u64 > contiguous).then_some(contiguous)
    }

    /// Sequence of the last record replay will reach; for an interrupted
    /// capture this is the input that was being decoded.
    pub fn last_replayable(&self) -> Option<u64> {
        self.contiguous().checked_sub(1)
    }
}

/// Flat directory of raw input records.
#[derive(Debug, Clone)]
pub struct DumpDir {
    root: PathBuf,
}

impl DumpDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn record_path(&self, namespace: &str, sequence: u64) -> PathBuf {
        self.root.join(record_file_name(namespace, sequence))
    }

    pub fn ensure_exists(&self) -> Result<()> {
        let violation = |source| HarnessError::DumpDir {
            path: self.root.clone(),
            source,
        };
        match fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(violation(std::io::Error::new(
                ErrorKind::AlreadyExists,
                "path exists and is not a directory",
            ))),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                fs::create_dir_all(&self.root).map_err(violation)?;
                debug!(path = %self.root.display(), "created dump directory");
                Ok(())
            }
            Err(err) => Err(violation(err)),
        }
    }

    /// Writes `bytes` as record `(namespace, sequence)` and closes the file
    /// before returning.
    pub fn record(&self, namespace: &str, sequence: u64, bytes: &[u8]) -> Result<()> {
        let path = self.record_path(namespace, sequence);
        let mut file = match File::create(&path) {
            Ok(file) => file,
            Err(source) => return Err(HarnessError::Record { path, source }),
        };
        if let Err(source) = file.write_all(bytes) {
            return Err(HarnessError::Record { path, source });
        }
        drop(file);
        Ok(())
    }

    /// `Ok(None)` when the record does not exist.
    pub fn open(&self, namespace: &str, sequence: u64) -> Result<Option<File>> {
        let path = self.record_path(namespace, sequence);
        match File::open(&path) {
            Ok(file) => Ok(Some(file)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(HarnessError::Replay { path, source }),
        }
    }

    /// Deletes records `[0, count)`. Missing files are fine; the return
    /// value counts files actually removed.
    pub fn purge(&self, namespace: &str, count: u64) -> u64 {
        let mut removed = 0;
        for sequence in 0..count {
            if self.remove_record(namespace, sequence) {
                removed += 1;
            }
        }
        removed
    }

    /// Deletes the records of `namespace` found on disk, gaps included,
    /// optionally only those below `below`. Only existing files are visited,
    /// however large `below` is.
    pub fn purge_namespace(&self, namespace: &str, below: Option<u64>) -> Result<u64> {
        let Some(listing) = self
            .scan()?
            .into_iter()
            .find(|listing| listing.namespace == namespace)
        else {
            return Ok(0);
        };
        let mut removed = 0;
        for sequence in listing.sequences {
            if below.is_some_and(|below| sequence >= below) {
                break;
            }
            if self.remove_record(namespace, sequence) {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn remove_record(&self, namespace: &str, sequence: u64) -> bool {
        let path = self.record_path(namespace, sequence);
        match fs::remove_file(&path) {
            Ok(()) => true,
            Err(err) if err.kind() == ErrorKind::NotFound => false,
            Err(err) => {
                warn!(error = %err, path = %path.display(), "failed to remove dump record");
                false
            }
        }
    }

    /// All records on disk grouped by namespace. A missing directory has
    /// no records.
    pub fn scan(&self) -> Result<Vec<RunListing>> {
        let violation = |source| HarnessError::DumpDir {
            path: self.root.clone(),
            source,
        };
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(violation(err)),
        };

        let mut runs: BTreeMap<String, Vec<u64>> = BTreeMap::new();
        for entry in entries {
            let entry = entry.map_err(violation)?;
            if !entry.file_type().map_err(violation)?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some((namespace, sequence)) = parse_record_file_name(name) {
                runs.entry(namespace.to_string()).or_default().push(sequence);
            }
        }

        Ok(runs
            .into_iter()
            .map(|(namespace, mut sequences)| {
                sequences.sort_unstable();
                RunListing {
                    namespace,
                    sequences,
                }
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
