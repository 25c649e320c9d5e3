//! JSON-lines event reader

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use l1mu_core::{EventRecord, RawEvent};

/// Line bookkeeping for one input file
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadStats {
    pub lines: u64,
    pub decoded: u64,
    pub skipped: u64,
}

/// Streams decoded events out of a JSON-lines dump.
///
/// Blank lines are ignored. Lines that fail to parse or decode are logged
/// and skipped. A read failure ends the stream and is reported by
/// [`EventStream::finish`].
pub struct EventStream<R> {
    lines: Lines<R>,
    stats: ReadStats,
    error: Option<std::io::Error>,
}

impl<R: BufRead> EventStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            stats: ReadStats::default(),
            error: None,
        }
    }

    pub fn stats(&self) -> ReadStats {
        self.stats
    }

    /// Final bookkeeping, or the read error that cut the stream short.
    pub fn finish(self) -> Result<ReadStats> {
        match self.error {
            Some(err) => Err(err).with_context(|| format!("line {}", self.stats.lines + 1)),
            None => Ok(self.stats),
        }
    }
}

impl<R: BufRead> Iterator for EventStream<R> {
    type Item = EventRecord;

    fn next(&mut self) -> Option<EventRecord> {
        if self.error.is_some() {
            return None;
        }
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => {
                    self.error = Some(err);
                    return None;
                }
            };
            self.stats.lines += 1;
            if line.trim().is_empty() {
                continue;
            }

            match RawEvent::from_json_line(&line) {
                Ok(event) => {
                    self.stats.decoded += 1;
                    return Some(event);
                }
                Err(err) => {
                    warn!(line = self.stats.lines, error = %err, "skipping event");
                    self.stats.skipped += 1;
                }
            }
        }
    }
}

/// Open a JSON-lines dump as an [`EventStream`].
pub fn open_events(path: &Path) -> Result<EventStream<BufReader<File>>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open event file: {}", path.display()))?;
    info!(path = %path.display(), "reading events");
    Ok(EventStream::new(BufReader::new(file)))
}

/// Drain `stream` and log its bookkeeping.
pub fn finish_events<R: BufRead>(stream: EventStream<R>, path: &Path) -> Result<ReadStats> {
    let stats = stream
        .finish()
        .with_context(|| format!("Failed to read event file: {}", path.display()))?;
    info!(
        path = %path.display(),
        decoded = stats.decoded,
        skipped = stats.skipped,
        "events read"
    );
    Ok(stats)
}
