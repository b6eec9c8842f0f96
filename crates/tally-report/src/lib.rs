//! Reporting sinks that render tally scan results.
//!
//! A [`ReportSink`] consumes a finished [`ScanResult`] together with the
//! pattern and a label for the scanned directory. Sinks only read the
//! result; nothing they do feeds back into scanning.
//!
//! - [`BarChart`] - one row per file with a `#` bar scaled to the largest count
//! - [`JsonReport`] - a JSON document with files in path order

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;
use tally_core::{Pattern, ScanResult};

/// Errors that can occur while rendering a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Writing to the output failed.
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing the JSON document failed.
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// A consumer of finished scan results.
pub trait ReportSink {
    /// Renders `result`, scanned with `pattern` under the directory `label`.
    fn render(
        &mut self,
        result: &ScanResult,
        pattern: &dyn Pattern,
        label: &str,
    ) -> Result<(), ReportError>;
}

/// Renders a text bar chart.
///
/// # Examples
///
/// ```
/// use tally_core::{ScanResult, compile_pattern};
/// use tally_report::{BarChart, ReportSink};
/// use camino::Utf8PathBuf;
///
/// let mut result = ScanResult::new();
/// result.insert(Utf8PathBuf::from("t1/a.txt"), 3).unwrap();
///
/// let mut chart = BarChart::new(Vec::new(), 10);
/// chart.render(&result, &compile_pattern("[0-9]").unwrap(), "t1").unwrap();
///
/// let output = String::from_utf8(chart.into_inner()).unwrap();
/// assert!(output.contains("t1/a.txt | ########## 3"));
/// ```
#[derive(Debug)]
pub struct BarChart<W> {
    out: W,
    width: usize,
}

impl<W: Write> BarChart<W> {
    /// Creates a chart writing to `out` whose longest bar is `width` wide.
    #[must_use]
    pub const fn new(out: W, width: usize) -> Self {
        Self { out, width }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Bar length for `count`, never zero for a non-zero count.
    fn bar_len(&self, count: usize, max: usize) -> usize {
        if count == 0 || max == 0 {
            return 0;
        }
        (count.saturating_mul(self.width) / max).max(1)
    }
}

impl<W: Write> ReportSink for BarChart<W> {
    fn render(
        &mut self,
        result: &ScanResult,
        pattern: &dyn Pattern,
        label: &str,
    ) -> Result<(), ReportError> {
        writeln!(
            self.out,
            "Files containing matches of \"{}\" within directory: {label}",
            pattern.as_str()
        )?;

        let entries = result.sorted();
        if entries.is_empty() {
            writeln!(self.out, "(no files)")?;
            return Ok(());
        }

        let pad = entries
            .iter()
            .map(|(path, _)| path.as_str().chars().count())
            .max()
            .unwrap_or(0);
        let max = entries.iter().map(|(_, count)| *count).max().unwrap_or(0);

        for (path, count) in &entries {
            let len = self.bar_len(*count, max);
            let bar = if len == 0 {
                String::new()
            } else {
                format!("{} ", "#".repeat(len))
            };
            writeln!(self.out, "{:<pad$} | {bar}{count}", path.as_str())?;
        }

        writeln!(
            self.out,
            "{} files, {} matches",
            result.len(),
            result.total_matches()
        )?;
        self.out.flush()?;
        Ok(())
    }
}

/// Renders a JSON document.
#[derive(Debug)]
pub struct JsonReport<W> {
    out: W,
    pretty: bool,
}

#[derive(Serialize)]
struct Document<'a> {
    pattern: &'a str,
    label: &'a str,
    total_matches: usize,
    files: BTreeMap<&'a str, usize>,
}

impl<W: Write> JsonReport<W> {
    /// Creates a report writing to `out`.
    #[must_use]
    pub const fn new(out: W, pretty: bool) -> Self {
        Self { out, pretty }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for JsonReport<W> {
    fn render(
        &mut self,
        result: &ScanResult,
        pattern: &dyn Pattern,
        label: &str,
    ) -> Result<(), ReportError> {
        let document = Document {
            pattern: pattern.as_str(),
            label,
            total_matches: result.total_matches(),
            files: result
                .iter()
                .map(|(path, count)| (path.as_str(), count))
                .collect(),
        };

        if self.pretty {
            serde_json::to_writer_pretty(&mut self.out, &document)?;
        } else {
            serde_json::to_writer(&mut self.out, &document)?;
        }
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
