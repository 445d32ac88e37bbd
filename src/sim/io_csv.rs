// Primitives for reading CSV files.

use std::fs::File;
use std::io::{Read, Write};

use serde::Deserialize;

use crate::sim::{
    io_common::{column_index, parse_row, LoadedVoter, REQUIRED_COLUMNS, VOTE_COLUMN},
    *,
};

/// Reads voters from a CSV input with a header row.
pub fn read_csv_voters<R: Read>(rdr: R) -> SimResult<Vec<LoadedVoter>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(rdr);
    let header: Vec<String> = reader
        .headers()
        .context(CsvLineParseSnafu { lineno: 1usize })?
        .iter()
        .map(|s| s.to_string())
        .collect();
    debug!("read_csv_voters: header: {:?}", header);
    let idx = column_index(&header)?;

    let mut res: Vec<LoadedVoter> = Vec::new();
    for (i, line_r) in reader.records().enumerate() {
        // The header is line 1.
        let lineno = i + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let cells: Vec<String> = line.iter().map(|s| s.to_string()).collect();
        res.push(parse_row(lineno, &cells, &idx)?);
    }
    Ok(res)
}

pub fn read_csv_voters_path(path: &str) -> SimResult<Vec<LoadedVoter>> {
    let f = File::open(path).context(OpeningFileSnafu { path })?;
    read_csv_voters(f)
}

/// Writes the voters with their votes, in the format read by `read_csv_voters`.
///
/// Only the voters that have a vote are written: after a cancelled run, the
/// file holds the voters processed so far.
pub fn write_csv_votes<W: Write>(
    voters: &[VoterRecord],
    votes: &[SimulatedVote],
    wtr: W,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(wtr);
    let mut header: Vec<&str> = REQUIRED_COLUMNS.to_vec();
    header.push(VOTE_COLUMN);
    writer.write_record(&header)?;
    for (v, vote) in voters.iter().zip(votes.iter()) {
        writer.write_record(&[
            v.age.to_string(),
            v.gender.clone(),
            v.state.clone(),
            v.education_level.clone(),
            v.marital_status.clone(),
            v.occupation_description.clone(),
            v.income_level.to_string(),
            vote.raw_vote.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct HistoricalRow {
    #[serde(rename = "STATE")]
    state: String,
    #[serde(rename = "Democrat_real_percent")]
    democrat_real_percent: f64,
    #[serde(rename = "Republican_real_percent")]
    republican_real_percent: f64,
    #[serde(rename = "Winner_real")]
    winner_real: String,
    #[serde(rename = "Block")]
    block: String,
}

fn check_percent(lineno: usize, column: &str, value: f64) -> SimResult<f64> {
    // NaN fails the range check too.
    ensure!(
        (0.0..=100.0).contains(&value),
        InvalidValueSnafu {
            lineno,
            column,
            value: value.to_string(),
        }
    );
    Ok(value)
}

/// Reads a historical table. Every state may only appear once.
pub fn read_csv_historical<R: Read>(rdr: R) -> SimResult<HistoricalTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(rdr);
    let mut records: Vec<HistoricalRecord> = Vec::new();
    for (i, row_r) in reader.deserialize::<HistoricalRow>().enumerate() {
        let lineno = i + 2;
        let row = row_r.context(CsvLineParseSnafu { lineno })?;
        let winner_real = Party::parse(&row.winner_real).context(InvalidValueSnafu {
            lineno,
            column: "Winner_real",
            value: row.winner_real.clone(),
        })?;
        let block = PoliticalBlock::parse(&row.block).context(InvalidValueSnafu {
            lineno,
            column: "Block",
            value: row.block.clone(),
        })?;
        records.push(HistoricalRecord {
            state: row.state,
            democrat_real_percent: check_percent(
                lineno,
                "Democrat_real_percent",
                row.democrat_real_percent,
            )?,
            republican_real_percent: check_percent(
                lineno,
                "Republican_real_percent",
                row.republican_real_percent,
            )?,
            winner_real,
            block,
        });
    }
    HistoricalTable::new(records).context(SimulationSnafu {})
}

pub fn read_csv_historical_path(path: &str) -> SimResult<HistoricalTable> {
    let f = File::open(path).context(OpeningFileSnafu { path })?;
    read_csv_historical(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOTERS: &str = "\
AGE,GENDER,STATE,EDUCATION_LEVEL,MARITAL_STATUS,OCCUPATION_DESCRIPTION,INCOME_LEVEL,VOTE
25,male,California,bachelor,single,engineer,6,1
40,female,Texas,master,married,teacher,4,2
";

    #[test]
    fn voters_in_memory() {
        let voters = read_csv_voters(VOTERS.as_bytes()).unwrap();
        assert_eq!(voters.len(), 2);
        assert_eq!(voters[1].record.occupation_description, "teacher");
        assert_eq!(voters[0].recorded_vote, Some("1".to_string()));
    }

    #[test]
    fn votes_of_a_partial_run() {
        let voters: Vec<VoterRecord> = read_csv_voters(VOTERS.as_bytes())
            .unwrap()
            .into_iter()
            .map(|lv| lv.record)
            .collect();
        let votes = vec![SimulatedVote {
            state: "California".to_string(),
            raw_vote: "Undecided".to_string(),
            decision: VoteDecision::Undecided,
            outcome: None,
        }];
        let mut buf: Vec<u8> = Vec::new();
        write_csv_votes(&voters, &votes, &mut buf).unwrap();
        let back = read_csv_voters(buf.as_slice()).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].record, voters[0]);
        assert_eq!(back[0].recorded_vote, Some("Undecided".to_string()));
    }

    #[test]
    fn missing_columns_fail_at_load() {
        let data = "AGE,GENDER,STATE\n25,male,Ohio\n";
        assert!(matches!(
            read_csv_voters(data.as_bytes()),
            Err(SimError::MissingColumns { .. })
        ));
    }

    #[test]
    fn bad_income_names_the_line() {
        let data = "\
AGE,GENDER,STATE,EDUCATION_LEVEL,MARITAL_STATUS,OCCUPATION_DESCRIPTION,INCOME_LEVEL
25,male,Ohio,bachelor,single,engineer,6
25,male,Ohio,bachelor,single,engineer,high
";
        match read_csv_voters(data.as_bytes()) {
            Err(SimError::InvalidValue { lineno, column, .. }) => {
                assert_eq!(lineno, 3);
                assert_eq!(column, "INCOME_LEVEL");
            }
            x => panic!("unexpected {:?}", x),
        }
    }

    #[test]
    fn historical_table() {
        let data = "\
STATE,Democrat_real_percent,Republican_real_percent,Winner_real,Block
Ohio, 45.2, 53.3, Republican, Swing State
Vermont,66.1,30.7,Democrat,Solidly Democratic
";
        let h = read_csv_historical(data.as_bytes()).unwrap();
        assert_eq!(h.len(), 2);
        let vt = h.get("vermont").unwrap();
        assert_eq!(vt.winner_real, Party::Democrat);
        assert_eq!(vt.block, PoliticalBlock::SolidlyDemocratic);
        assert_eq!(h.get("OHIO").unwrap().democrat_real_percent, 45.2);
    }

    #[test]
    fn historical_errors() {
        let bad_winner = "\
STATE,Democrat_real_percent,Republican_real_percent,Winner_real,Block
Ohio,45.2,53.3,Green,Swing State
";
        assert!(matches!(
            read_csv_historical(bad_winner.as_bytes()),
            Err(SimError::InvalidValue { lineno: 2, .. })
        ));
        let duplicate = "\
STATE,Democrat_real_percent,Republican_real_percent,Winner_real,Block
Ohio,45.2,53.3,Republican,Swing State
OHIO,45.2,53.3,Republican,Swing State
";
        assert!(matches!(
            read_csv_historical(duplicate.as_bytes()),
            Err(SimError::Simulation {
                source: SimulationErrors::DuplicateState(_)
            })
        ));
    }

    #[test]
    fn historical_percentages_are_checked() {
        for (value, column) in [
            ("NaN,53.3", "Democrat_real_percent"),
            ("45.2,inf", "Republican_real_percent"),
            ("-1,53.3", "Democrat_real_percent"),
            ("45.2,100.5", "Republican_real_percent"),
        ] {
            let data = format!(
                "STATE,Democrat_real_percent,Republican_real_percent,Winner_real,Block\n\
                 Ohio,{},Republican,Swing State\n",
                value
            );
            match read_csv_historical(data.as_bytes()) {
                Err(SimError::InvalidValue {
                    lineno, column: c, ..
                }) => {
                    assert_eq!(lineno, 2);
                    assert_eq!(c, column);
                }
                x => panic!("unexpected {:?} for {}", x, value),
            }
        }
    }
}
