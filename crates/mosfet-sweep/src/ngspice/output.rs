//! Parser for ngspice `print` tables written to standard output.
//!
//! In batch mode a `print` command emits a block like:
//!
//! ```text
//! Index   v(d)            v(g)            i(vds)
//! --------------------------------------------------------------
//! 0       0.000000e+00    0.000000e+00    0.000000e+00
//! 1       5.000000e-02    0.000000e+00    1.234000e-09
//! ```
//!
//! Only the first block is read. It ends at the first line that is empty or
//! does not start with a digit, even if more blocks follow.

use crate::error::{Error, Result};
use crate::ngspice::types::{INDEX_COLUMN, SimulationResult};

/// Parse the first data block of ngspice standard output.
pub fn parse_output(stdout: &str) -> Result<SimulationResult> {
    let mut lines = stdout.lines().enumerate();

    let (header_line, header) = lines
        .by_ref()
        .find(|(_, line)| line.starts_with(INDEX_COLUMN))
        .ok_or_else(|| parse_error("no data block found"))?;

    let columns: Vec<String> = header.split_whitespace().map(str::to_string).collect();

    // Separator row under the header.
    lines.next();

    let mut rows = Vec::new();
    for (line_no, line) in lines {
        if !line.starts_with(|c: char| c.is_ascii_digit()) {
            break;
        }
        rows.push(parse_row(line, line_no + 1, columns.len())?);
    }

    log::debug!(
        "parsed ngspice table at line {}: {} columns, {} rows",
        header_line + 1,
        columns.len(),
        rows.len()
    );

    SimulationResult::new(columns, rows)
        .ok_or_else(|| parse_error("row width does not match header"))
}

/// Parse one whitespace-separated data row.
fn parse_row(line: &str, line_no: usize, num_columns: usize) -> Result<Vec<f64>> {
    let values = line
        .split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|_| {
                parse_error(format!("line {}: invalid number '{}'", line_no, token))
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    if values.len() != num_columns {
        return Err(parse_error(format!(
            "line {}: expected {} values, found {}",
            line_no,
            num_columns,
            values.len()
        )));
    }

    Ok(values)
}

fn parse_error(reason: impl Into<String>) -> Error {
    Error::Parse {
        reason: reason.into(),
        diagnostics: String::new(),
    }
}
