//! Comma-separated text rows
//!
//! Fields containing a comma, quote or line break are quoted with doubled
//! inner quotes. Floats are written with Rust's shortest round-trip
//! formatting so a written value parses back to the identical `f64`.

use std::io::{BufRead, Write};

use crate::error::{Error, Result};

pub(crate) fn write_row<W: Write, S: AsRef<str>>(writer: &mut W, fields: &[S]) -> Result<()> {
    let line: Vec<String> = fields.iter().map(|f| quote(f.as_ref())).collect();
    writeln!(writer, "{}", line.join(","))?;
    Ok(())
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Split one line into fields; `line_no` is 1-based, for error reports
pub(crate) fn parse_row(line: &str, line_no: usize) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    let mut quoted = false;

    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            ('"', true) => quoted = false,
            ('"', false) if current.is_empty() => quoted = true,
            (',', false) => fields.push(std::mem::take(&mut current)),
            (c, _) => current.push(c),
        }
    }
    if quoted {
        return Err(Error::MalformedDataset {
            line: line_no,
            message: "unterminated quoted field".into(),
        });
    }
    fields.push(current);
    Ok(fields)
}

/// One logical row: the 1-based line it starts on and its fields
pub(crate) type Record = (usize, Vec<String>);

/// Split text into rows; a quoted field may span several physical lines
pub(crate) fn read_records<R: BufRead>(mut reader: R) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    let mut pending = String::new();
    let mut start = 0;
    let mut line_no = 0;

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        line_no += 1;
        if pending.is_empty() {
            start = line_no;
        }
        pending.push_str(&line);

        // Doubled quotes cancel, so an odd count leaves a field open
        if pending.matches('"').count() % 2 == 1 {
            continue;
        }
        let text = std::mem::take(&mut pending);
        let text = text.strip_suffix('\n').unwrap_or(&text);
        let text = text.strip_suffix('\r').unwrap_or(text);
        if !text.trim().is_empty() {
            records.push((start, parse_row(text, start)?));
        }
    }

    if !pending.is_empty() {
        return Err(Error::MalformedDataset {
            line: start,
            message: "unterminated quoted field".into(),
        });
    }
    Ok(records)
}

pub(crate) fn format_float(value: f64) -> String {
    format!("{}", value)
}

pub(crate) fn parse_float(field: &str, line_no: usize, column: &str) -> Result<f64> {
    field.trim().parse::<f64>().map_err(|_| Error::MalformedDataset {
        line: line_no,
        message: format!("column '{}': '{}' is not a number", column, field),
    })
}
