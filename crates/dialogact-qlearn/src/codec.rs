//! Flat-text persistence of the hyper-parameters and the value table.
//!
//! ```text
//! GAMMA,remaining_iters,EXPLORE
//! q_0,q_1,...,q_{A-1}          one line per state id, ascending
//! ```
//!
//! Values are written in shortest round-trip notation, so a save followed by
//! a load reproduces every cell bit for bit. Exponents may use `e` or `E`.

use crate::error::{PolicyError, Result};
use crate::hyper::HyperParameters;
use crate::table::QTable;
use std::io::{BufRead, Write};

const DELIMITER: char = ',';

pub fn write_table<W: Write>(mut out: W, params: &HyperParameters, table: &QTable) -> Result<()> {
    writeln!(
        out,
        "{:?}{DELIMITER}{}{DELIMITER}{}",
        params.gamma(),
        params.remaining_iters(),
        params.explore()
    )?;
    for row in table.rows() {
        let line = row
            .iter()
            .map(|v| format!("{v:?}"))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}

fn format_error(line: usize, reason: impl Into<String>) -> PolicyError {
    PolicyError::Format {
        line,
        reason: reason.into(),
    }
}

fn parse_header(line: &str) -> Result<HyperParameters> {
    let fields: Vec<&str> = line.split(DELIMITER).map(str::trim).collect();
    let [gamma, remaining, explore] = fields.as_slice() else {
        return Err(format_error(
            1,
            format!("expected GAMMA,remaining_iters,EXPLORE, got {} fields", fields.len()),
        ));
    };
    let gamma: f64 = gamma
        .parse()
        .map_err(|e| format_error(1, format!("GAMMA {gamma:?}: {e}")))?;
    // Older writers let the counter run below zero; the schedule floors it.
    let remaining: i64 = remaining
        .parse()
        .map_err(|e| format_error(1, format!("remaining_iters {remaining:?}: {e}")))?;
    let remaining = u32::try_from(remaining.max(0))
        .map_err(|e| format_error(1, format!("remaining_iters {remaining}: {e}")))?;
    let explore: u32 = explore
        .parse()
        .map_err(|e| format_error(1, format!("EXPLORE {explore:?}: {e}")))?;
    HyperParameters::restore(gamma, remaining, explore)
}

fn parse_row(line_no: usize, line: &str, num_actions: usize, out: &mut Vec<f64>) -> Result<()> {
    let mut count = 0;
    for field in line.split(DELIMITER) {
        let field = field.trim();
        let value: f64 = field
            .parse()
            .map_err(|e| format_error(line_no, format!("value {field:?}: {e}")))?;
        if !value.is_finite() {
            return Err(format_error(line_no, format!("value {field:?} is not finite")));
        }
        out.push(value);
        count += 1;
    }
    if count != num_actions {
        return Err(format_error(
            line_no,
            format!("expected {num_actions} values, got {count}"),
        ));
    }
    Ok(())
}

/// Reads a table with exactly `num_states` rows of `num_actions` values.
///
/// Nothing is returned unless the whole input parsed; the caller decides
/// whether to commit the result.
pub fn read_table<R: BufRead>(
    input: R,
    num_states: usize,
    num_actions: usize,
) -> Result<(HyperParameters, QTable)> {
    let mut lines = input.lines();

    let header = lines
        .next()
        .ok_or_else(|| format_error(1, "missing header line"))??;
    let params = parse_header(&header)?;

    let mut values = Vec::with_capacity(num_states * num_actions);
    for state in 0..num_states {
        let line_no = state + 2;
        let line = lines.next().ok_or_else(|| {
            format_error(
                line_no,
                format!("expected {num_states} table rows, found {state}"),
            )
        })??;
        parse_row(line_no, &line, num_actions, &mut values)?;
    }

    for (offset, rest) in lines.enumerate() {
        if !rest?.trim().is_empty() {
            return Err(format_error(
                num_states + 2 + offset,
                "unexpected data after the last table row",
            ));
        }
    }

    let table = QTable::from_values(num_states, num_actions, values)
        .ok_or_else(|| format_error(num_states + 1, "table dimensions do not match"))?;
    Ok((params, table))
}
