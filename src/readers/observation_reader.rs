use crate::error::{ImportError, Result};
use crate::models::Observation;
use crate::utils::constants::{
    MAX_OBSERVATION_DATE, MIN_OBSERVATION_DATE, OBSERVATION_FIELD_COUNT,
};
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter, Trim};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::path::Path;
use validator::Validate;

/// Result of parsing one line of an observation file
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Parsed { line: u64, observation: Observation },
    Skipped(SkippedLine),
    Blank,
}

/// A line that was dropped without aborting the import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedLine {
    pub line: u64,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    FieldCount { found: usize },
    DateOutOfRange { date: u32 },
    InvalidDate { date: u32 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::FieldCount { found } => write!(
                f,
                "expected {} tab-separated fields, found {}",
                OBSERVATION_FIELD_COUNT, found
            ),
            SkipReason::DateOutOfRange { date } => write!(
                f,
                "date {} is outside {}..={}",
                date, MIN_OBSERVATION_DATE, MAX_OBSERVATION_DATE
            ),
            SkipReason::InvalidDate { date } => write!(f, "date {} is not a calendar date", date),
        }
    }
}

pub struct ObservationReader;

impl ObservationReader {
    pub fn new() -> Self {
        Self
    }

    /// Parse a single raw line (without its terminator)
    pub fn parse_line(&self, line: &str, line_number: u64) -> Result<LineOutcome> {
        let fields: Vec<&str> = line.trim().split('\t').map(str::trim).collect();
        parse_fields(&fields, line_number)
    }

    /// Read every line outcome from a file
    pub fn read_file(&self, path: &Path) -> Result<Vec<LineOutcome>> {
        self.stream(path)?.collect()
    }

    /// Stream line outcomes from a file
    pub fn stream(&self, path: &Path) -> Result<ObservationIterator> {
        let file = File::open(path)?;
        let reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .trim(Trim::All)
            .from_reader(file);

        Ok(ObservationIterator {
            records: reader.into_records(),
        })
    }
}

impl Default for ObservationReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the line outcomes of an observation file
pub struct ObservationIterator {
    records: StringRecordsIntoIter<File>,
}

impl Iterator for ObservationIterator {
    type Item = Result<LineOutcome>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e.into())),
        };
        Some(parse_record(&record))
    }
}

fn parse_record(record: &StringRecord) -> Result<LineOutcome> {
    let line_number = record.position().map_or(0, |p| p.line());
    let fields: Vec<&str> = record.iter().collect();
    parse_fields(&fields, line_number)
}

fn parse_fields(fields: &[&str], line_number: u64) -> Result<LineOutcome> {
    // Empty edge fields come from leading or trailing tabs; the line is trimmed as a whole
    let first = fields.iter().position(|f| !f.is_empty());
    let last = fields.iter().rposition(|f| !f.is_empty());
    let fields = match (first, last) {
        (Some(first), Some(last)) => &fields[first..=last],
        _ => return Ok(LineOutcome::Blank),
    };

    if fields.len() != OBSERVATION_FIELD_COUNT {
        return Ok(LineOutcome::Skipped(SkippedLine {
            line: line_number,
            reason: SkipReason::FieldCount {
                found: fields.len(),
            },
        }));
    }

    let date = parse_integer::<u32>(fields[0], "date", line_number)?;
    let max_temp = parse_integer::<i64>(fields[1], "max_temp", line_number)?;
    let min_temp = parse_integer::<i64>(fields[2], "min_temp", line_number)?;
    let precipitation = parse_integer::<i64>(fields[3], "precipitation", line_number)?;

    let observation = Observation::from_raw(date, max_temp, min_temp, precipitation);

    if observation.validate().is_err() {
        return Ok(LineOutcome::Skipped(SkippedLine {
            line: line_number,
            reason: SkipReason::DateOutOfRange { date },
        }));
    }

    if observation.calendar_date().is_none() {
        return Ok(LineOutcome::Skipped(SkippedLine {
            line: line_number,
            reason: SkipReason::InvalidDate { date },
        }));
    }

    Ok(LineOutcome::Parsed {
        line: line_number,
        observation,
    })
}

fn parse_integer<T: std::str::FromStr>(value: &str, field: &'static str, line: u64) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| ImportError::MalformedNumericField {
            file: String::new(),
            line,
            field,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parsed(outcome: LineOutcome) -> Observation {
        match outcome {
            LineOutcome::Parsed { observation, .. } => observation,
            other => panic!("expected parsed line, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_line() {
        let reader = ObservationReader::new();
        let obs = parsed(reader.parse_line("19900101\t250\t-9999\t5", 1).unwrap());

        assert_eq!(obs.date, 19900101);
        assert_eq!(obs.max_temp, Some(25.0));
        assert_eq!(obs.min_temp, None);
        assert_eq!(obs.precipitation, Some(0.5));
    }

    #[test]
    fn test_parse_fixed_width_line() {
        let reader = ObservationReader::new();
        let obs = parsed(reader.parse_line("19900102\t  -56\t -122\t    0\n", 2).unwrap());

        assert_eq!(obs.max_temp, Some(-5.6));
        assert_eq!(obs.min_temp, Some(-12.2));
        assert_eq!(obs.precipitation, Some(0.0));
    }

    #[test]
    fn test_all_sentinels() {
        let reader = ObservationReader::new();
        let obs = parsed(reader.parse_line("19900103\t-9999\t-9999\t-9999", 3).unwrap());

        assert_eq!(obs.max_temp, None);
        assert_eq!(obs.min_temp, None);
        assert_eq!(obs.precipitation, None);
    }

    #[test]
    fn test_wrong_field_count_is_skipped() {
        let reader = ObservationReader::new();

        let outcome = reader.parse_line("19900101\t250\t-9999", 4).unwrap();
        assert_eq!(
            outcome,
            LineOutcome::Skipped(SkippedLine {
                line: 4,
                reason: SkipReason::FieldCount { found: 3 },
            })
        );

        let outcome = reader.parse_line("19900101\t250\t-9999\t5\t1", 5).unwrap();
        assert!(matches!(
            outcome,
            LineOutcome::Skipped(SkippedLine {
                reason: SkipReason::FieldCount { found: 5 },
                ..
            })
        ));
    }

    #[test]
    fn test_out_of_range_date_is_skipped() {
        let reader = ObservationReader::new();

        let outcome = reader.parse_line("19841231\t10\t10\t10", 1).unwrap();
        assert!(matches!(
            outcome,
            LineOutcome::Skipped(SkippedLine {
                reason: SkipReason::DateOutOfRange { date: 19841231 },
                ..
            })
        ));

        let outcome = reader.parse_line("19900231\t10\t10\t10", 2).unwrap();
        assert!(matches!(
            outcome,
            LineOutcome::Skipped(SkippedLine {
                reason: SkipReason::InvalidDate { date: 19900231 },
                ..
            })
        ));
    }

    #[test]
    fn test_non_numeric_field_is_fatal() {
        let reader = ObservationReader::new();
        let err = reader.parse_line("19900101\tabc\t10\t10", 9).unwrap_err();

        match err {
            ImportError::MalformedNumericField {
                line, field, value, ..
            } => {
                assert_eq!(line, 9);
                assert_eq!(field, "max_temp");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(reader.parse_line("1990-01-01\t1\t1\t1", 1).is_err());
        assert!(reader.parse_line("19900101\t1\t1\t2.5", 1).is_err());
    }

    #[test]
    fn test_blank_line() {
        let reader = ObservationReader::new();
        assert_eq!(reader.parse_line("   ", 1).unwrap(), LineOutcome::Blank);
        assert_eq!(reader.parse_line("", 1).unwrap(), LineOutcome::Blank);
    }

    #[test]
    fn test_read_file() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "19900101\t250\t-9999\t5")?;
        writeln!(temp_file, "19900102\t260\t100")?;
        writeln!(temp_file)?;
        writeln!(temp_file, "19900103\t270\t110\t-9999")?;

        let reader = ObservationReader::new();
        let outcomes = reader.read_file(temp_file.path())?;

        let parsed: Vec<&Observation> = outcomes
            .iter()
            .filter_map(|o| match o {
                LineOutcome::Parsed { observation, .. } => Some(observation),
                _ => None,
            })
            .collect();
        let skipped: Vec<&SkippedLine> = outcomes
            .iter()
            .filter_map(|o| match o {
                LineOutcome::Skipped(s) => Some(s),
                _ => None,
            })
            .collect();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].date, 19900101);
        assert_eq!(parsed[1].date, 19900103);
        assert_eq!(parsed[1].precipitation, None);

        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].line, 2);
        assert_eq!(skipped[0].reason, SkipReason::FieldCount { found: 3 });

        Ok(())
    }

    #[test]
    fn test_edge_tabs_are_trimmed_like_the_whole_line() {
        let reader = ObservationReader::new();

        let obs = parsed(reader.parse_line("19900101\t250\t-9999\t5\t", 1).unwrap());
        assert_eq!(obs.max_temp, Some(25.0));

        let obs = parsed(reader.parse_line("\t19900102\t250\t-9999\t5", 2).unwrap());
        assert_eq!(obs.date, 19900102);

        // A missing trailing field is still a short line
        assert!(matches!(
            reader.parse_line("19900103\t250\t-9999\t", 3).unwrap(),
            LineOutcome::Skipped(SkippedLine {
                reason: SkipReason::FieldCount { found: 3 },
                ..
            })
        ));
    }

    #[test]
    fn test_read_file_with_edge_tabs() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "19900101\t250\t-9999\t5\t")?;
        writeln!(temp_file, "\t19900102\t260\t100\t0")?;
        writeln!(temp_file, " \t19900103\t270\t110\t1\t ")?;

        let reader = ObservationReader::new();
        let outcomes = reader.read_file(temp_file.path())?;

        let dates: Vec<u32> = outcomes
            .iter()
            .filter_map(|o| match o {
                LineOutcome::Parsed { observation, .. } => Some(observation.date),
                _ => None,
            })
            .collect();
        assert_eq!(dates, vec![19900101, 19900102, 19900103]);

        Ok(())
    }

    #[test]
    fn test_large_raw_values_parse() {
        let reader = ObservationReader::new();
        let obs = parsed(reader.parse_line("19900101\t3000000000\t-9999\t0", 1).unwrap());
        assert_eq!(obs.max_temp, Some(300000000.0));
    }

    #[test]
    fn test_read_file_propagates_malformed_number() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "19900101\t250\t-9999\t5")?;
        writeln!(temp_file, "19900102\tn/a\t100\t0")?;

        let reader = ObservationReader::new();
        let result = reader.read_file(temp_file.path());
        assert!(matches!(
            result,
            Err(ImportError::MalformedNumericField { line: 2, .. })
        ));

        Ok(())
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(
            SkipReason::FieldCount { found: 3 }.to_string(),
            "expected 4 tab-separated fields, found 3"
        );
        assert_eq!(
            SkipReason::DateOutOfRange { date: 20150101 }.to_string(),
            "date 20150101 is outside 19850101..=20141231"
        );
    }
}
