//! Streaming fixed-width to CSV conversion
//!
//! Drives a chunk stream through the [`LineReassembler`] and [`decode_line`],
//! writing one CSV record per decoded line. Row failures are collected in the
//! [`JobSummary`]; only source and sink failures abort the run.

use futures::{Stream, StreamExt};
use std::io::Write;
use tracing::{debug, info, trace};

use crate::decoder::decode_line;
use crate::error::{JobFailure, Result};
use crate::models::JobSummary;
use crate::reassembler::{LineReassembler, DEFAULT_MAX_LINE_BYTES};
use crate::schema::Schema;

/// Lines between progress messages
const PROGRESS_INTERVAL: u64 = 100_000;

pub struct IngestionPipeline<'a> {
    schema: &'a Schema,
    max_line_bytes: usize,
}

impl<'a> IngestionPipeline<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }

    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    /// Convert every line of `chunks` into CSV written to `sink`
    ///
    /// The header row is written before any data row, so even an empty
    /// source yields a valid CSV file.
    pub async fn run<S, B, W>(&self, mut chunks: S, sink: W) -> Result<JobSummary>
    where
        S: Stream<Item = anyhow::Result<B>> + Unpin,
        B: AsRef<[u8]>,
        W: Write,
    {
        let mut writer = csv::Writer::from_writer(sink);
        writer.write_record(self.schema.header())?;

        let mut reassembler = LineReassembler::new(self.max_line_bytes);
        let mut state = RunState::default();

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(JobFailure::Source)?;
            trace!(bytes = chunk.as_ref().len(), "Received chunk");
            reassembler.push(chunk.as_ref());
            self.drain(&mut reassembler, &mut writer, &mut state)?;
        }

        reassembler.finish();
        self.drain(&mut reassembler, &mut writer, &mut state)?;
        writer.flush()?;

        info!(
            lines = state.lines,
            records = state.summary.record_count,
            errors = state.summary.error_count(),
            "Conversion finished"
        );

        Ok(state.summary)
    }

    fn drain<W: Write>(
        &self,
        reassembler: &mut LineReassembler,
        writer: &mut csv::Writer<W>,
        state: &mut RunState,
    ) -> Result<()> {
        while let Some(line) = reassembler.next_line() {
            state.lines += 1;

            match line.and_then(|line| decode_line(&line, self.schema)) {
                Ok(row) => {
                    writer.write_record(&row)?;
                    state.summary.record_success();
                },
                Err(e) => {
                    debug!(line = state.lines, error = %e, "Skipping line");
                    state.summary.record_error(e.to_string());
                },
            }

            if state.lines % PROGRESS_INTERVAL == 0 {
                debug!(
                    lines = state.lines,
                    records = state.summary.record_count,
                    "Conversion progress"
                );
            }
        }

        Ok(())
    }
}

#[derive(Default)]
struct RunState {
    lines: u64,
    summary: JobSummary,
}
