//! Unified Dataset File
//!
//! Layout, one row per sample:
//!
//! ```text
//! sample_id,<parameter columns...>,status,<metric columns...>
//! ```
//!
//! The `status` column separates parameters from metrics. Status values are
//! `ok`, `missing` or `failed:<reason>`. An empty metric cell means the run
//! did not report that metric. Series metrics are written element-wise as
//! `name[k]` columns.

use std::collections::HashSet;
use std::io::{BufRead, Write};

use super::{MetricValue, OutputTable, RunStatus, UnifiedDataset, UnifiedRecord};
use crate::error::{Error, Result};
use crate::tabular::{format_float, parse_float, read_records, write_row};

const FAILED_PREFIX: &str = "failed:";

fn status_cell(status: &RunStatus) -> String {
    match status {
        RunStatus::Succeeded => "ok".to_string(),
        RunStatus::Missing => "missing".to_string(),
        RunStatus::Failed { reason } => format!("{}{}", FAILED_PREFIX, reason),
    }
}

fn parse_status(cell: &str, line: usize) -> Result<RunStatus> {
    match cell {
        "ok" => Ok(RunStatus::Succeeded),
        "missing" => Ok(RunStatus::Missing),
        "failed" => Ok(RunStatus::Failed { reason: String::new() }),
        _ => match cell.strip_prefix(FAILED_PREFIX) {
            Some(reason) => Ok(RunStatus::Failed { reason: reason.to_string() }),
            None => Err(Error::MalformedDataset {
                line,
                message: format!("unknown status '{}'", cell),
            }),
        },
    }
}

/// Write the dataset as comma-separated text
pub fn write_dataset<W: Write>(dataset: &UnifiedDataset, writer: &mut W) -> Result<()> {
    let metric_columns = dataset.metric_columns();

    let mut header = vec!["sample_id".to_string()];
    header.extend(dataset.parameter_names().iter().cloned());
    header.push("status".to_string());
    header.extend(metric_columns.iter().cloned());
    write_row(writer, &header)?;

    for record in dataset.records() {
        let mut row = Vec::with_capacity(header.len());
        row.push(record.sample_id.to_string());
        row.extend(record.parameters.iter().map(|&v| format_float(v)));
        row.push(status_cell(&record.status));
        row.extend(
            metric_columns
                .iter()
                .map(|c| record.metric(c).map(format_float).unwrap_or_default()),
        );
        write_row(writer, &row)?;
    }
    Ok(())
}

/// Read a dataset written by [`write_dataset`]
pub fn read_dataset<R: BufRead>(reader: R) -> Result<UnifiedDataset> {
    let mut rows = read_records(reader)?.into_iter();

    let header = match rows.next() {
        Some((_, fields)) => fields,
        None => {
            return Err(Error::MalformedDataset {
                line: 1,
                message: "empty dataset".into(),
            })
        }
    };
    if header.first().map(String::as_str) != Some("sample_id") {
        return Err(Error::MalformedDataset {
            line: 1,
            message: "first column must be 'sample_id'".into(),
        });
    }
    let status_col = header.iter().position(|h| h == "status").ok_or(Error::MalformedDataset {
        line: 1,
        message: "missing 'status' column".into(),
    })?;
    let parameter_names: Vec<String> = header[1..status_col].to_vec();
    let metric_names: &[String] = &header[status_col + 1..];

    let mut records = Vec::new();
    let mut seen = HashSet::new();

    for (line_no, fields) in rows {
        if fields.len() != header.len() {
            return Err(Error::MalformedDataset {
                line: line_no,
                message: format!("expected {} fields, found {}", header.len(), fields.len()),
            });
        }

        let sample_id: usize = fields[0].trim().parse().map_err(|_| Error::MalformedDataset {
            line: line_no,
            message: format!("invalid sample id '{}'", fields[0]),
        })?;
        if !seen.insert(sample_id) {
            return Err(Error::MalformedDataset {
                line: line_no,
                message: format!("duplicate sample id {}", sample_id),
            });
        }

        let parameters = parameter_names
            .iter()
            .zip(&fields[1..status_col])
            .map(|(name, cell)| parse_float(cell, line_no, name))
            .collect::<Result<Vec<f64>>>()?;
        let status = parse_status(&fields[status_col], line_no)?;

        let mut metrics = OutputTable::new();
        for (name, cell) in metric_names.iter().zip(&fields[status_col + 1..]) {
            if !cell.is_empty() {
                metrics.insert(name.clone(), MetricValue::Scalar(parse_float(cell, line_no, name)?));
            }
        }

        records.push(UnifiedRecord {
            sample_id,
            parameters,
            status,
            metrics,
        });
    }

    records.sort_by_key(|r| r.sample_id);
    Ok(UnifiedDataset::from_records(parameter_names, records))
}
