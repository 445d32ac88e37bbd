use clap::Parser;

/// This program simulates an election by asking a language model how each voter in a
/// sample would vote, and compares the outcome with historical results.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the simulation. The flags below
    /// override the values of this file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, votesim will
    /// check that the produced summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the simulation will be written in JSON format
    /// to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path, optional) If specified, the voters and their simulated votes are written to this
    /// CSV file, with a VOTE column that --replay can read back.
    #[clap(long, value_parser)]
    pub votes_out: Option<String>,

    /// (file path or empty) The file with the voter profiles. If not specified, a built-in sample is used.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv, xlsx or sample.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use. The first worksheet is used
    /// by default.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (file path, optional) A CSV file with the historical results per state. The 2020 results are
    /// used by default.
    #[clap(long, value_parser)]
    pub historical: Option<String>,

    /// (default 3) The number of times the oracle is asked for each voter.
    #[clap(long, value_parser)]
    pub repetitions: Option<u32>,

    /// (default 0.8) The share of the simulation in the adjusted results, between 0 and 1.
    #[clap(long, value_parser)]
    pub weight: Option<f64>,

    /// (default gpt-3.5-turbo) The model used as the oracle.
    #[clap(long, value_parser)]
    pub model: Option<String>,

    /// Uses the votes recorded in the VOTE column of the input instead of calling the oracle.
    #[clap(long, takes_value = false)]
    pub replay: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
