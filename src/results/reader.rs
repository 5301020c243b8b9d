//! Reader for the solver's GiD ASCII post-processing result files
//!
//! A result file is a sequence of blocks:
//!
//! ```text
//! GaussPoints "tri3_gp" ElemType Triangle
//! Number Of Gauss Points: 3
//! End GaussPoints
//! Result "VON_MISES_STRESS" "Kratos" 0.2 Scalar OnGaussPoints "tri3_gp"
//! Values
//! 1 45000.0
//!   45000.0
//!   45000.0
//! End Values
//! ```
//!
//! Every `Result` block becomes one [`ResultRecord`]. Records of the same
//! variable are kept in the order the file emits them.

use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::core::logger::Logger;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Where a result is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    OnNodes,
    OnGaussPoints,
}

/// Values reported for one node or element
#[derive(Debug, Clone, PartialEq)]
pub struct PointValue {
    /// Node or element id
    pub id: usize,
    /// One row per Gauss point (a single row for nodal values)
    pub value: Vec<Vec<f64>>,
}

impl PointValue {
    /// Components of the first row
    pub fn first_row(&self) -> Option<&[f64]> {
        self.value.first().map(Vec::as_slice)
    }

    /// True for an element reporting a scalar at three Gauss points
    pub fn is_tri3_scalar(&self) -> bool {
        self.value.len() == 3 && self.value.iter().all(|row| row.len() == 1)
    }
}

/// One variable at one time step
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub result_name: String,
    pub time: f64,
    pub location: Location,
    pub values: Vec<PointValue>,
}

/// Parsed content of a result file, in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultFile {
    results: Vec<(String, Vec<ResultRecord>)>,
}

impl ResultFile {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Variable names in order of first appearance
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.results.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&[ResultRecord]> {
        self.results
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, records)| records.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ResultRecord])> {
        self.results
            .iter()
            .map(|(name, records)| (name.as_str(), records.as_slice()))
    }

    /// Total number of records over all variables
    pub fn record_count(&self) -> usize {
        self.results.iter().map(|(_, records)| records.len()).sum()
    }

    /// Distinct times of the first variable that has any record
    pub fn time_steps(&self) -> Vec<f64> {
        let mut times: Vec<f64> = Vec::new();
        if let Some((_, records)) = self.results.iter().find(|(_, r)| !r.is_empty()) {
            for record in records {
                if !times.contains(&record.time) {
                    times.push(record.time);
                }
            }
        }
        times
    }

    fn push(&mut self, record: ResultRecord) {
        match self.results.iter_mut().find(|(n, _)| *n == record.result_name) {
            Some((_, records)) => records.push(record),
            None => self.results.push((record.result_name.clone(), vec![record])),
        }
    }
}

/// Reads result files, tolerating missing ones
pub struct GidResultReader<'a> {
    logger: &'a dyn Logger,
}

impl<'a> GidResultReader<'a> {
    pub fn new(logger: &'a dyn Logger) -> Self {
        Self { logger }
    }

    /// Read and parse `path`
    ///
    /// A missing file is not an error: it is logged as a warning and an
    /// empty [`ResultFile`] is returned so the caller can carry on.
    pub fn read(&self, path: &Path) -> Result<ResultFile, ReadError> {
        if !path.exists() {
            self.logger
                .warn(&format!("Missing result file: {}", path.display()));
            return Ok(ResultFile::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ReadError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let file = parse_result_file(&content)?;

        let names: Vec<&str> = file.names().collect();
        self.logger.info(&format!(
            "Available result keys in {}: {:?}",
            path.file_name().unwrap_or_default().to_string_lossy(),
            names
        ));
        self.logger.info(&format!(
            "Loaded {} entries from: {}",
            file.record_count(),
            path.display()
        ));
        Ok(file)
    }
}

/// Header of the `Result` block being read
struct OpenBlock {
    record: ResultRecord,
    gauss_points: usize,
    in_values: bool,
}

/// Parse the text of a GiD ASCII result file
pub fn parse_result_file(content: &str) -> Result<ResultFile, ReadError> {
    let mut file = ResultFile::default();
    let mut gauss_point_counts: HashMap<String, usize> = HashMap::new();
    let mut gauss_point_block: Option<String> = None;
    let mut open: Option<OpenBlock> = None;

    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(block) = open.as_mut().filter(|b| b.in_values) {
            if line.starts_with("End Values") {
                if let Some(block) = open.take() {
                    file.push(block.record);
                }
            } else {
                parse_value_line(block, line, line_no)?;
            }
            continue;
        }

        if line.starts_with("End GaussPoints") {
            gauss_point_block = None;
        } else if line.starts_with("GaussPoints") {
            let tokens = tokenize(line);
            let name = tokens.get(1).cloned().ok_or_else(|| ReadError::Parse {
                line: line_no,
                message: "GaussPoints header without a name".to_string(),
            })?;
            gauss_point_block = Some(name);
        } else if let Some(rest) = line.strip_prefix("Number Of Gauss Points:") {
            let count: usize = rest.trim().parse().map_err(|_| ReadError::Parse {
                line: line_no,
                message: format!("Invalid Gauss point count: {}", rest.trim()),
            })?;
            if let Some(name) = &gauss_point_block {
                gauss_point_counts.insert(name.clone(), count);
            }
        } else if line.starts_with("Result ") {
            if open.is_some() {
                return Err(ReadError::Parse {
                    line: line_no,
                    message: "Result header inside an unterminated block".to_string(),
                });
            }
            open = Some(parse_result_header(line, line_no, &gauss_point_counts)?);
        } else if line == "Values" || line.starts_with("Values ") {
            match open.as_mut() {
                Some(block) => block.in_values = true,
                None => {
                    return Err(ReadError::Parse {
                        line: line_no,
                        message: "Values block without a Result header".to_string(),
                    })
                }
            }
        }
        // ComponentNames, ResultRangesTable and the file banner carry nothing we need
    }

    if let Some(block) = open {
        return Err(ReadError::Parse {
            line: content.lines().count(),
            message: format!(
                "Result block '{}' is not terminated by End Values",
                block.record.result_name
            ),
        });
    }

    Ok(file)
}

fn parse_result_header(
    line: &str,
    line_no: usize,
    gauss_point_counts: &HashMap<String, usize>,
) -> Result<OpenBlock, ReadError> {
    let tokens = tokenize(line);
    if tokens.len() < 6 {
        return Err(ReadError::Parse {
            line: line_no,
            message: format!("Incomplete Result header: {}", line),
        });
    }

    let time: f64 = tokens[3].parse().map_err(|_| ReadError::Parse {
        line: line_no,
        message: format!("Invalid time value: {}", tokens[3]),
    })?;

    let (location, gauss_points) = match tokens[5].as_str() {
        "OnNodes" => (Location::OnNodes, 1),
        "OnGaussPoints" => {
            let count = tokens
                .get(6)
                .and_then(|name| gauss_point_counts.get(name))
                .copied()
                .unwrap_or(1);
            (Location::OnGaussPoints, count.max(1))
        }
        other => {
            return Err(ReadError::Parse {
                line: line_no,
                message: format!("Unknown result location: {}", other),
            })
        }
    };

    Ok(OpenBlock {
        record: ResultRecord {
            result_name: tokens[1].clone(),
            time,
            location,
            values: Vec::new(),
        },
        gauss_points,
        in_values: false,
    })
}

fn parse_value_line(block: &mut OpenBlock, line: &str, line_no: usize) -> Result<(), ReadError> {
    let mut words = line.split_whitespace();

    let continues_element = block.record.location == Location::OnGaussPoints
        && block
            .record
            .values
            .last()
            .is_some_and(|v| v.value.len() < block.gauss_points);

    if continues_element {
        let row = parse_numbers(words, line_no)?;
        if let Some(last) = block.record.values.last_mut() {
            last.value.push(row);
        }
        return Ok(());
    }

    let id_word = words.next().unwrap_or_default();
    let id: usize = id_word.parse().map_err(|_| ReadError::Parse {
        line: line_no,
        message: format!("Invalid node/element id: {}", id_word),
    })?;
    let row = parse_numbers(words, line_no)?;
    block.record.values.push(PointValue {
        id,
        value: vec![row],
    });
    Ok(())
}

fn parse_numbers<'s>(
    words: impl Iterator<Item = &'s str>,
    line_no: usize,
) -> Result<Vec<f64>, ReadError> {
    words
        .map(|w| {
            w.parse::<f64>().map_err(|_| ReadError::Parse {
                line: line_no,
                message: format!("Invalid number: {}", w),
            })
        })
        .collect()
}

/// Split on whitespace, keeping double-quoted words together (quotes removed)
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => {
                if quoted {
                    tokens.push(std::mem::take(&mut current));
                }
                quoted = !quoted;
            }
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::logger::{Level, MemoryLogger};

    const SAMPLE: &str = r#"GiD Post Results File 1.0
GaussPoints "tri3_gp" ElemType Triangle
Number Of Gauss Points: 3
Natural Coordinates: Internal
End GaussPoints
Result "DISPLACEMENT" "Kratos" 0.5 Vector OnNodes
Values
1 0.0 0.0 0.0
2 0.0 -0.1 0.0
End Values
Result "VON_MISES_STRESS" "Kratos" 0.5 Scalar OnGaussPoints "tri3_gp"
Values
1 10.0
  11.0
  12.0
2 20.0
  21.0
  22.0
End Values
Result "DISPLACEMENT" "Kratos" 1.0 Vector OnNodes
Values
1 0.0 0.0 0.0
2 0.0 -0.2 0.0
End Values
"#;

    #[test]
    fn test_tokenize_keeps_quoted_words() {
        assert_eq!(
            tokenize(r#"Result "CAUCHY_STRESS_TENSOR" "Kratos" 1 Matrix OnGaussPoints "tri3_gp""#),
            vec!["Result", "CAUCHY_STRESS_TENSOR", "Kratos", "1", "Matrix", "OnGaussPoints", "tri3_gp"]
        );
    }

    #[test]
    fn test_parse_groups_records_by_name_in_file_order() {
        let file = parse_result_file(SAMPLE).unwrap();
        let names: Vec<&str> = file.names().collect();
        assert_eq!(names, vec!["DISPLACEMENT", "VON_MISES_STRESS"]);

        let displacement = file.get("DISPLACEMENT").unwrap();
        assert_eq!(displacement.len(), 2);
        assert_eq!(displacement[0].time, 0.5);
        assert_eq!(displacement[1].time, 1.0);
        assert_eq!(displacement[1].values[1].value, vec![vec![0.0, -0.2, 0.0]]);
        assert_eq!(file.record_count(), 3);
    }

    #[test]
    fn test_parse_gauss_point_rows() {
        let file = parse_result_file(SAMPLE).unwrap();
        let vm = &file.get("VON_MISES_STRESS").unwrap()[0];
        assert_eq!(vm.location, Location::OnGaussPoints);
        assert_eq!(vm.values.len(), 2);
        assert_eq!(vm.values[0].id, 1);
        assert_eq!(vm.values[0].value, vec![vec![10.0], vec![11.0], vec![12.0]]);
        assert_eq!(vm.values[1].id, 2);
        assert!(vm.values[1].is_tri3_scalar());
    }

    #[test]
    fn test_time_steps_come_from_first_variable() {
        let file = parse_result_file(SAMPLE).unwrap();
        assert_eq!(file.time_steps(), vec![0.5, 1.0]);
    }

    #[test]
    fn test_time_steps_of_empty_file() {
        assert!(ResultFile::default().time_steps().is_empty());
    }

    #[test]
    fn test_unterminated_block_is_an_error() {
        let content = "Result \"X\" \"Kratos\" 1.0 Scalar OnNodes\nValues\n1 2.0\n";
        assert!(matches!(
            parse_result_file(content),
            Err(ReadError::Parse { .. })
        ));
    }

    #[test]
    fn test_bad_number_reports_line() {
        let content = "Result \"X\" \"Kratos\" 1.0 Scalar OnNodes\nValues\n1 abc\nEnd Values\n";
        match parse_result_file(content) {
            Err(ReadError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_returns_empty_and_warns() {
        let logger = MemoryLogger::new();
        let reader = GidResultReader::new(&logger);
        let file = reader
            .read(Path::new("definitely/not/here/output.post.res"))
            .unwrap();
        assert!(file.is_empty());
        assert!(logger.contains(Level::Warn, "Missing result file"));
    }
}
