
//! LogLoader stage: parses the captured simulation log into typed series.
//!
//! Log protocol: UTF-8 CSV, optional single header line
//! `step,setpoint,measurement,output`, then one numeric record per
//! control-loop iteration with strictly increasing step index.
//!
//! Header detection is deliberately two-step: row 0 is first parsed as data,
//! and only on parse failure is it classified as a header — which must then
//! match the canonical column names exactly. At most one row is ever
//! skipped, and the classification is recorded on the returned series so it
//! stays observable.

use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Canonical column order of the firmware's output protocol.
pub const COLUMNS: [&str; 4] = ["step", "setpoint", "measurement", "output"];

/// One control-loop iteration as reported by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Iteration counter, strictly increasing over the series.
    pub step: u64,
    /// Target speed the controller is driving toward.
    pub setpoint: f64,
    /// Measured speed (process variable).
    pub measurement: f64,
    /// Controller output (manipulated variable, duty cycle).
    pub output: f64,
}

/// Validated, ordered series of log records. Row order encodes time.
#[derive(Debug, Clone, PartialEq)]
pub struct LogSeries {
    records: Vec<LogRecord>,
    header_skipped: bool,
}

impl LogSeries {
    /// Builds a series from in-memory records, enforcing the same
    /// invariants as the file loader: non-empty, strictly increasing step.
    pub fn new(records: Vec<LogRecord>) -> Result<Self, PipelineError> {
        if records.is_empty() {
            return Err(PipelineError::LogFormat("series has no records".into()));
        }
        check_monotonic(&records)?;
        Ok(LogSeries {
            records,
            header_skipped: false,
        })
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether a header row was detected and skipped during loading.
    pub fn header_skipped(&self) -> bool {
        self.header_skipped
    }

    /// Column 0: step indices, in row order.
    pub fn step(&self) -> Vec<u64> {
        self.records.iter().map(|r| r.step).collect()
    }

    /// Column 1: setpoint, in row order.
    pub fn setpoint(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.setpoint).collect()
    }

    /// Column 2: measurement, in row order.
    pub fn measurement(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.measurement).collect()
    }

    /// Column 3: control output, in row order.
    pub fn output(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.output).collect()
    }

    /// Serializes the series back to the log format, header included.
    pub fn write_csv(&self, path: &Path) -> Result<(), PipelineError> {
        let mut wtr = WriterBuilder::new()
            .from_path(path)
            .map_err(|e| PipelineError::LogFormat(format!("cannot create {}: {}", path.display(), e)))?;
        for record in &self.records {
            wtr.serialize(record)
                .map_err(|e| PipelineError::LogFormat(e.to_string()))?;
        }
        wtr.flush()
            .map_err(|e| PipelineError::LogFormat(e.to_string()))?;
        Ok(())
    }
}

/// Loads and validates the log at `path`.
///
/// Fails with `LogNotFound` if the file is absent, `LogFormat` on any
/// content violation, and `LogShape` if the defensive post-parse column
/// check trips. Never returns a partially valid series.
pub fn load_log(path: &Path) -> Result<LogSeries, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::LogNotFound(path.to_path_buf()));
    }

    // has_headers(false) + flexible(true): every row reaches our own
    // validation, nothing is normalized away by the reader.
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| PipelineError::LogFormat(format!("cannot read {}: {}", path.display(), e)))?;

    let mut raw: Vec<StringRecord> = Vec::new();
    for record in rdr.records() {
        raw.push(record.map_err(|e| PipelineError::LogFormat(e.to_string()))?);
    }

    if raw.is_empty() {
        return Err(PipelineError::LogFormat(format!(
            "log file is empty: {}",
            path.display()
        )));
    }

    // Row 0: data if it parses strictly as numbers, otherwise it must be a
    // well-formed header.
    let header_skipped = match parse_record(&raw[0], 0) {
        Ok(_) => false,
        Err(_) => {
            validate_header(&raw[0])?;
            true
        }
    };

    let data = &raw[usize::from(header_skipped)..];
    if data.is_empty() {
        return Err(PipelineError::LogFormat(
            "log contains a header but no data rows".into(),
        ));
    }

    let mut records = Vec::with_capacity(data.len());
    for (i, row) in data.iter().enumerate() {
        let line = i + 1 + usize::from(header_skipped);
        if row.len() != COLUMNS.len() {
            return Err(PipelineError::LogFormat(format!(
                "line {}: expected {} fields, found {}",
                line,
                COLUMNS.len(),
                row.len()
            )));
        }
        records.push(parse_record(row, line)?);
    }

    check_monotonic(&records)?;
    check_shape(data, records.len())?;

    Ok(LogSeries {
        records,
        header_skipped,
    })
}

fn parse_record(row: &StringRecord, line: usize) -> Result<LogRecord, PipelineError> {
    if row.len() != COLUMNS.len() {
        return Err(PipelineError::LogFormat(format!(
            "line {}: expected {} fields, found {}",
            line,
            COLUMNS.len(),
            row.len()
        )));
    }

    let field = |idx: usize| row.get(idx).unwrap_or("");

    let step = field(0).parse::<u64>().map_err(|_| {
        PipelineError::LogFormat(format!(
            "line {}: field 'step' is not an unsigned integer: '{}'",
            line,
            field(0)
        ))
    })?;

    let mut values = [0.0f64; 3];
    for (slot, idx) in values.iter_mut().zip(1..=3) {
        *slot = field(idx).parse::<f64>().map_err(|_| {
            PipelineError::LogFormat(format!(
                "line {}: field '{}' is not a number: '{}'",
                line,
                COLUMNS[idx],
                field(idx)
            ))
        })?;
    }

    Ok(LogRecord {
        step,
        setpoint: values[0],
        measurement: values[1],
        output: values[2],
    })
}

fn validate_header(row: &StringRecord) -> Result<(), PipelineError> {
    if row.len() != COLUMNS.len() {
        return Err(PipelineError::LogFormat(format!(
            "malformed header: expected {} columns, found {}",
            COLUMNS.len(),
            row.len()
        )));
    }
    for (idx, expected) in COLUMNS.iter().enumerate() {
        let got = row.get(idx).unwrap_or("");
        if !got.eq_ignore_ascii_case(expected) {
            return Err(PipelineError::LogFormat(format!(
                "malformed header: column {} is '{}', expected '{}'",
                idx, got, expected
            )));
        }
    }
    Ok(())
}

fn check_monotonic(records: &[LogRecord]) -> Result<(), PipelineError> {
    for pair in records.windows(2) {
        if pair[1].step <= pair[0].step {
            return Err(PipelineError::LogFormat(format!(
                "step index not strictly increasing: {} follows {}",
                pair[1].step, pair[0].step
            )));
        }
    }
    Ok(())
}

// Defensive re-check, independent of the parse loop: the table must be a
// non-empty 4-column rectangle.
fn check_shape(data: &[StringRecord], parsed: usize) -> Result<(), PipelineError> {
    if parsed == 0 || parsed != data.len() {
        return Err(PipelineError::LogShape(format!(
            "{} rows parsed from {} data rows",
            parsed,
            data.len()
        )));
    }
    if let Some((i, row)) = data.iter().enumerate().find(|(_, r)| r.len() != COLUMNS.len()) {
        return Err(PipelineError::LogShape(format!(
            "data row {} has {} columns, expected {}",
            i,
            row.len(),
            COLUMNS.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_log(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_headered_log() {
        let (_dir, path) = write_log(
            "step,setpoint,measurement,output\n\
             0, 3.0000, 0.0000, 1.0000\n\
             1, 3.0000, 0.0096, 0.8000\n",
        );
        let series = load_log(&path).unwrap();
        assert!(series.header_skipped());
        assert_eq!(series.len(), 2);
        assert_eq!(series.step(), vec![0, 1]);
        assert_eq!(series.setpoint(), vec![3.0, 3.0]);
        assert_eq!(series.measurement()[1], 0.0096);
        assert_eq!(series.output(), vec![1.0, 0.8]);
    }

    #[test]
    fn loads_headerless_log() {
        let (_dir, path) = write_log("0,3.0,0.0,1.0\n1,3.0,0.5,0.9\n");
        let series = load_log(&path).unwrap();
        assert!(!series.header_skipped());
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn missing_file_is_log_not_found() {
        let dir = tempfile::tempdir().unwrap();
        match load_log(&dir.path().join("absent.csv")) {
            Err(PipelineError::LogNotFound(_)) => {}
            other => panic!("expected LogNotFound, got {:?}", other),
        }
    }

    #[test]
    fn empty_file_is_format_error() {
        let (_dir, path) = write_log("");
        match load_log(&path) {
            Err(PipelineError::LogFormat(msg)) => assert!(msg.contains("empty")),
            other => panic!("expected LogFormat, got {:?}", other),
        }
    }

    #[test]
    fn header_only_file_is_format_error() {
        let (_dir, path) = write_log("step,setpoint,measurement,output\n");
        match load_log(&path) {
            Err(PipelineError::LogFormat(msg)) => assert!(msg.contains("no data rows")),
            other => panic!("expected LogFormat, got {:?}", other),
        }
    }

    #[test]
    fn wrong_field_count_is_format_error() {
        let (_dir, path) = write_log("0,3.0,0.0,1.0\n1,3.0,0.5\n");
        match load_log(&path) {
            Err(PipelineError::LogFormat(msg)) => {
                assert!(msg.contains("line 2"), "{}", msg);
                assert!(msg.contains("found 3"), "{}", msg);
            }
            other => panic!("expected LogFormat, got {:?}", other),
        }
    }

    #[test]
    fn non_numeric_field_is_format_error() {
        let (_dir, path) = write_log("0,3.0,0.0,1.0\n1,3.0,abc,0.9\n");
        match load_log(&path) {
            Err(PipelineError::LogFormat(msg)) => {
                assert!(msg.contains("measurement"), "{}", msg);
                assert!(msg.contains("abc"), "{}", msg);
            }
            other => panic!("expected LogFormat, got {:?}", other),
        }
    }

    #[test]
    fn malformed_header_is_rejected_not_skipped() {
        // Row 0 fails numeric parse but is not the canonical header either.
        let (_dir, path) = write_log("tick,target,speed,duty\n0,3.0,0.0,1.0\n");
        match load_log(&path) {
            Err(PipelineError::LogFormat(msg)) => assert!(msg.contains("malformed header")),
            other => panic!("expected LogFormat, got {:?}", other),
        }
    }

    #[test]
    fn only_one_header_row_may_be_skipped() {
        let (_dir, path) = write_log(
            "step,setpoint,measurement,output\n\
             step,setpoint,measurement,output\n\
             0,3.0,0.0,1.0\n",
        );
        // The second header line must surface as a data parse failure.
        match load_log(&path) {
            Err(PipelineError::LogFormat(msg)) => assert!(msg.contains("step")),
            other => panic!("expected LogFormat, got {:?}", other),
        }
    }

    #[test]
    fn non_monotonic_step_is_format_error() {
        let (_dir, path) = write_log("0,3.0,0.0,1.0\n2,3.0,0.5,0.9\n2,3.0,0.6,0.8\n");
        match load_log(&path) {
            Err(PipelineError::LogFormat(msg)) => {
                assert!(msg.contains("strictly increasing"), "{}", msg)
            }
            other => panic!("expected LogFormat, got {:?}", other),
        }
    }

    #[test]
    fn round_trip_preserves_series() {
        let records = vec![
            LogRecord {
                step: 0,
                setpoint: 3.0,
                measurement: 0.0,
                output: 1.0,
            },
            LogRecord {
                step: 1,
                setpoint: 3.0,
                measurement: 1.5,
                output: 0.6,
            },
            LogRecord {
                step: 2,
                setpoint: 3.0,
                measurement: 2.7,
                output: 0.2,
            },
        ];
        let series = LogSeries::new(records.clone()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.csv");
        series.write_csv(&path).unwrap();

        let reloaded = load_log(&path).unwrap();
        assert!(reloaded.header_skipped());
        assert_eq!(reloaded.records(), &records[..]);
    }

    #[test]
    fn series_constructor_enforces_invariants() {
        assert!(matches!(
            LogSeries::new(vec![]),
            Err(PipelineError::LogFormat(_))
        ));

        let out_of_order = vec![
            LogRecord {
                step: 5,
                setpoint: 1.0,
                measurement: 0.0,
                output: 0.0,
            },
            LogRecord {
                step: 4,
                setpoint: 1.0,
                measurement: 0.0,
                output: 0.0,
            },
        ];
        assert!(matches!(
            LogSeries::new(out_of_order),
            Err(PipelineError::LogFormat(_))
        ));
    }
}
