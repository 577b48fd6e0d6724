//! Line-oriented JSON log reading and flagged purchase writing
//!
//! Each non-blank input line is one JSON object. The batch log opens with a
//! configuration record (`{"D":"3","T":"50"}`) followed by events that build
//! the initial network; the stream log holds events to check for anomalies.

use crate::anomaly_engine::{AnomalyEngine, FlaggedPurchase};
use crate::events::Event;
use crate::{EngineConfig, EngineError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum LogError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed record on line {line}: {source}")]
    MalformedLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Batch log has no configuration record")]
    MissingConfiguration,

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Event on line {line} rejected: {source}")]
    EventRejected {
        line: usize,
        #[source]
        source: EngineError,
    },

    #[error("Failed to encode flagged purchase: {0}")]
    Encode(#[source] serde_json::Error),
}

/// What to do when the engine rejects a single event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorPolicy {
    /// Stop processing and return the error
    #[default]
    Abort,
    /// Log a warning and continue with the next event
    Skip,
}

impl ErrorPolicy {
    fn handle(self, line: usize, source: EngineError) -> Result<(), LogError> {
        match self {
            ErrorPolicy::Abort => Err(LogError::EventRejected { line, source }),
            ErrorPolicy::Skip => {
                warn!(line, error = %source, "Skipping rejected event");
                Ok(())
            }
        }
    }
}

/// Counters for one processed log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSummary {
    pub events: usize,
    pub flagged: usize,
    pub skipped: usize,
}

/// Non-blank lines of a log paired with their 1-based line numbers
pub struct LogLines<R> {
    lines: io::Lines<R>,
    line: usize,
}

impl<R: BufRead> LogLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }
}

impl<R: BufRead> Iterator for LogLines<R> {
    type Item = Result<(usize, String), LogError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(e) => return Some(Err(e.into())),
            };
            self.line += 1;
            if !text.trim().is_empty() {
                return Some(Ok((self.line, text)));
            }
        }
    }
}

/// Decode one log line
pub fn decode_line<T: DeserializeOwned>(line: usize, text: &str) -> Result<T, LogError> {
    serde_json::from_str(text).map_err(|source| LogError::MalformedLine { line, source })
}

/// Build an engine from a batch log without anomaly detection
pub fn load_batch<R: BufRead>(reader: R, policy: ErrorPolicy) -> Result<AnomalyEngine, LogError> {
    let mut lines = LogLines::new(reader);
    let (line, text) = lines.next().transpose()?.ok_or(LogError::MissingConfiguration)?;
    let record: serde_json::Value = decode_line(line, &text)?;
    let config = EngineConfig::from_record(&record)?;

    let mut engine = AnomalyEngine::new(config);
    let mut summary = StreamSummary::default();

    for entry in lines {
        let (line, text) = entry?;
        let event: Event = decode_line(line, &text)?;
        summary.events += 1;
        if let Err(source) = engine.ingest(&event) {
            policy.handle(line, source)?;
            summary.skipped += 1;
        }
    }

    info!(
        degree = config.degree,
        window_size = config.window_size,
        events = summary.events,
        skipped = summary.skipped,
        "Batch log loaded"
    );
    Ok(engine)
}

/// Run every stream event through the engine, writing flagged purchases as
/// they are detected
pub fn process_stream<R: BufRead, W: Write>(
    engine: &mut AnomalyEngine,
    reader: R,
    writer: &mut FlaggedWriter<W>,
    policy: ErrorPolicy,
) -> Result<StreamSummary, LogError> {
    let mut summary = StreamSummary::default();

    for entry in LogLines::new(reader) {
        let (line, text) = entry?;
        let event: Event = decode_line(line, &text)?;
        summary.events += 1;

        match engine.process(&event) {
            Ok(Some(flagged)) => {
                writer.write(&flagged)?;
                summary.flagged += 1;
            }
            Ok(None) => {}
            Err(source) => {
                policy.handle(line, source)?;
                summary.skipped += 1;
            }
        }
    }

    writer.flush()?;
    info!(
        events = summary.events,
        flagged = summary.flagged,
        skipped = summary.skipped,
        "Stream log processed"
    );
    Ok(summary)
}

/// Load `batch_log`, process `stream_log` and write flagged purchases to
/// `flagged_log` (created or truncated)
pub fn run(
    batch_log: &Path,
    stream_log: &Path,
    flagged_log: &Path,
    policy: ErrorPolicy,
) -> Result<(AnomalyEngine, StreamSummary), LogError> {
    let mut engine = load_batch(BufReader::new(File::open(batch_log)?), policy)?;
    let mut writer = FlaggedWriter::create(flagged_log)?;
    let summary = process_stream(
        &mut engine,
        BufReader::new(File::open(stream_log)?),
        &mut writer,
        policy,
    )?;
    Ok((engine, summary))
}

/// Writes flagged purchases as JSON lines
pub struct FlaggedWriter<W: Write> {
    inner: W,
    written: usize,
}

impl FlaggedWriter<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self, LogError> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> FlaggedWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    pub fn write(&mut self, flagged: &FlaggedPurchase) -> Result<(), LogError> {
        let line = flagged.to_json().map_err(LogError::Encode)?;
        writeln!(self.inner, "{}", line)?;
        self.written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), LogError> {
        self.inner.flush()?;
        Ok(())
    }

    /// Records written so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
