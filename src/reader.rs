//! Reads transition tables stored as comma separated values.
//!
//! The layout is
//!
//! ```text
//! init,    q0
//! final,   q3
//! default, 0
//! <ignored>
//! <ignored>
//! actions, a, b, c
//! q0, q1, q0, q2, , 0, 1, 0
//! ...
//! ```
//!
//! Each state row holds the state, its next state for every action, one ignored separator
//! column and its output for every action. Fields are trimmed. The six header lines are
//! taken by position, so the two ignored lines may be blank. Blank lines among the state rows
//! are skipped.

use crate::error::TableError;
use crate::table::{TableRow, TransitionTable};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

pub type StringTable = TransitionTable<String, String, String>;

/// Reads a transition table from the file at `path`.
pub fn read_table_from_path<P: AsRef<Path>>(path: P) -> Result<StringTable, TableError> {
    info!("reading table from {}", path.as_ref().display());
    read_table(File::open(path)?)
}

/// Reads a transition table from `input`.
///
/// ```
/// use wmethod::reader::read_table;
///
/// let csv = "init, A\nfinal, B\ndefault, -\n-\n-\nactions, x, y\nA, B, A, , 0, 1\nB, A, B, , 1, 0\n";
/// let table = read_table(csv.as_bytes()).unwrap();
/// assert_eq!(table.actions, vec!["x", "y"]);
/// assert_eq!(table.rows.len(), 2);
/// ```
pub fn read_table<R: Read>(input: R) -> Result<StringTable, TableError> {
    let mut builder = ReaderBuilder::new();
    builder.has_headers(false).flexible(true).trim(Trim::All);
    let mut input = BufReader::new(input);

    // One physical line per header, blank ones included.
    let mut header = |name: &'static str| -> Result<StringRecord, TableError> {
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(TableError::MissingHeader(name));
        }
        let record = builder.from_reader(line.as_bytes()).records().next().transpose()?;
        Ok(record.unwrap_or_default())
    };

    let initial = second_field(&header("init")?, "init")?;
    let final_state = second_field(&header("final")?, "final")?;
    let default_output = second_field(&header("default")?, "default")?;
    header("blank")?;
    header("blank")?;
    let actions: Vec<String> = header("actions")?
        .iter()
        .skip(1)
        .filter(|field| !field.is_empty())
        .map(String::from)
        .collect();
    debug!("read actions {:?}", actions);

    let width = actions.len();
    let mut rows = Vec::new();
    for record in builder.from_reader(input).records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let state = record.get(0).unwrap_or_default().to_string();
        if record.len() < 2 * width + 2 {
            return Err(TableError::RowWidth {
                state,
                expected: 2 * width + 2,
                found: record.len(),
            });
        }
        let next = (1..=width).map(|i| record[i].to_string()).collect();
        let outputs = (width + 2..2 * width + 2)
            .map(|i| record[i].to_string())
            .collect();
        rows.push(TableRow {
            source: state,
            next,
            outputs,
        });
    }

    info!("read {} rows over {} actions", rows.len(), width);
    Ok(TransitionTable {
        initial,
        final_states: vec![final_state],
        default_output: Some(default_output),
        actions,
        rows,
    })
}

fn second_field(record: &StringRecord, name: &'static str) -> Result<String, TableError> {
    record
        .get(1)
        .filter(|field| !field.is_empty())
        .map(String::from)
        .ok_or(TableError::MissingHeader(name))
}
