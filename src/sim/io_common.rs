// Primitives shared by the voter readers.

use crate::sim::*;

pub const REQUIRED_COLUMNS: [&str; 7] = [
    "AGE",
    "GENDER",
    "STATE",
    "EDUCATION_LEVEL",
    "MARITAL_STATUS",
    "OCCUPATION_DESCRIPTION",
    "INCOME_LEVEL",
];

/// Optional column with a vote recorded by a previous run.
pub const VOTE_COLUMN: &str = "VOTE";

/// A voter as read from an input, with the vote it may carry.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LoadedVoter {
    pub record: VoterRecord,
    pub recorded_vote: Option<String>,
}

/// The positions of the known columns in a row.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnIndex {
    // In the order of REQUIRED_COLUMNS
    required: [usize; 7],
    vote: Option<usize>,
}

/// Locates the columns in the header. Names are compared without case.
///
/// All the missing columns are reported at once.
pub fn column_index(header: &[String]) -> SimResult<ColumnIndex> {
    let position = |name: &str| {
        header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };
    let mut required = [0usize; 7];
    let mut missing: Vec<String> = Vec::new();
    for (i, name) in REQUIRED_COLUMNS.iter().enumerate() {
        match position(name) {
            Some(pos) => required[i] = pos,
            None => missing.push(name.to_string()),
        }
    }
    ensure!(missing.is_empty(), MissingColumnsSnafu { missing });
    Ok(ColumnIndex {
        required,
        vote: position(VOTE_COLUMN),
    })
}

fn parse_int<T: std::str::FromStr>(lineno: usize, column: &str, s: &str) -> SimResult<T> {
    s.trim().parse::<T>().ok().context(InvalidValueSnafu {
        lineno,
        column,
        value: s,
    })
}

/// Builds a voter from the cells of one row.
///
/// `AGE` must be a positive integer and `INCOME_LEVEL` an integer between 1 and 10.
pub fn parse_row(lineno: usize, cells: &[String], idx: &ColumnIndex) -> SimResult<LoadedVoter> {
    let mut values: Vec<&str> = Vec::with_capacity(REQUIRED_COLUMNS.len());
    for pos in idx.required.iter() {
        let cell = cells.get(*pos).context(LineTooShortSnafu { lineno })?;
        values.push(cell.as_str());
    }

    let age: u32 = parse_int(lineno, "AGE", values[0])?;
    ensure!(
        age > 0,
        InvalidValueSnafu {
            lineno,
            column: "AGE",
            value: values[0],
        }
    );
    let income_level: u8 = parse_int(lineno, "INCOME_LEVEL", values[6])?;
    ensure!(
        (1..=10).contains(&income_level),
        InvalidValueSnafu {
            lineno,
            column: "INCOME_LEVEL",
            value: values[6],
        }
    );

    let recorded_vote = idx
        .vote
        .and_then(|pos| cells.get(pos))
        .map(|s| s.trim().to_string());
    let record = VoterRecord {
        age,
        gender: values[1].trim().to_string(),
        state: values[2].trim().to_string(),
        education_level: values[3].trim().to_string(),
        marital_status: values[4].trim().to_string(),
        occupation_description: values[5].trim().to_string(),
        income_level,
    };
    debug!("parse_row: lineno: {} {:?}", lineno, record);
    Ok(LoadedVoter {
        record,
        recorded_vote,
    })
}
