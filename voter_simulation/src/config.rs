// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The demographic profile of one simulated voter.
///
/// Records are produced by a loader (CSV, Excel or the built-in sample) and are
/// not modified afterwards.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct VoterRecord {
    pub age: u32,
    pub gender: String,
    /// Free text, compared case-insensitively.
    pub state: String,
    pub education_level: String,
    pub marital_status: String,
    pub occupation_description: String,
    /// On a scale of 1 to 10.
    pub income_level: u8,
}

/// The two parties that can win a state.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Party {
    Democrat,
    Republican,
}

impl Party {
    pub fn as_str(&self) -> &'static str {
        match self {
            Party::Democrat => "Democrat",
            Party::Republican => "Republican",
        }
    }

    /// Parses the historical winner label. Case and surrounding whitespace are ignored.
    pub fn parse(s: &str) -> Option<Party> {
        match s.trim().to_lowercase().as_str() {
            "democrat" => Some(Party::Democrat),
            "republican" => Some(Party::Republican),
            _ => None,
        }
    }
}

impl Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The decision attached to one voter after the ensemble vote.
///
/// This is the only vote category that exists downstream of the ensemble voter.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum VoteDecision {
    Democrat,
    Republican,
    Undecided,
}

impl VoteDecision {
    /// Maps a raw vote to a decision: "1" is Democrat, "2" is Republican and
    /// anything else (including errors and empty strings) is Undecided.
    ///
    /// ```
    /// use voter_simulation::VoteDecision;
    ///
    /// assert_eq!(VoteDecision::from_raw(" 1 "), VoteDecision::Democrat);
    /// assert_eq!(VoteDecision::from_raw("2"), VoteDecision::Republican);
    /// assert_eq!(VoteDecision::from_raw("Undecided"), VoteDecision::Undecided);
    /// ```
    pub fn from_raw(raw: &str) -> VoteDecision {
        match raw.trim() {
            "1" => VoteDecision::Democrat,
            "2" => VoteDecision::Republican,
            _ => VoteDecision::Undecided,
        }
    }

    /// The raw vote that produces this decision.
    pub fn raw_vote(&self) -> &'static str {
        match self {
            VoteDecision::Democrat => "1",
            VoteDecision::Republican => "2",
            VoteDecision::Undecided => "Undecided",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VoteDecision::Democrat => "Democrat",
            VoteDecision::Republican => "Republican",
            VoteDecision::Undecided => "Undecided",
        }
    }
}

impl Display for VoteDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The qualitative political lean of a state, used in the prompt.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum PoliticalBlock {
    SolidlyDemocratic,
    SolidlyRepublican,
    SwingState,
}

impl PoliticalBlock {
    /// Label used when a state is absent from the historical table.
    pub const UNKNOWN_LABEL: &'static str = "an unknown political leaning";

    pub fn label(&self) -> &'static str {
        match self {
            PoliticalBlock::SolidlyDemocratic => "solidly Democratic",
            PoliticalBlock::SolidlyRepublican => "solidly Republican",
            PoliticalBlock::SwingState => "swing state",
        }
    }

    pub fn parse(s: &str) -> Option<PoliticalBlock> {
        match s.trim().to_lowercase().as_str() {
            "solidly democratic" => Some(PoliticalBlock::SolidlyDemocratic),
            "solidly republican" => Some(PoliticalBlock::SolidlyRepublican),
            "swing state" => Some(PoliticalBlock::SwingState),
            _ => None,
        }
    }
}

impl Display for PoliticalBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One row of the historical reference table.
#[derive(PartialEq, Debug, Clone)]
pub struct HistoricalRecord {
    /// Uppercased state name.
    pub state: String,
    /// Not required to sum to 100 with the republican share: third parties are excluded.
    pub democrat_real_percent: f64,
    pub republican_real_percent: f64,
    pub winner_real: Party,
    pub block: PoliticalBlock,
}

// ******** Output data structures *********

/// The winner of a state. Undecided voters never win.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Winner {
    Democrat,
    Republican,
    Tie,
}

impl Winner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Winner::Democrat => "Democrat",
            Winner::Republican => "Republican",
            Winner::Tie => "Tie",
        }
    }
}

impl Display for Winner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The vote counts for one state.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct StateTally {
    /// Uppercased state name.
    pub state: String,
    pub democrat: u64,
    pub republican: u64,
    pub undecided: u64,
    pub winner: Winner,
}

/// The historical winner as seen from the comparison table.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum RealWinner {
    Democrat,
    Republican,
    /// The state is not in the historical table.
    NoRealData,
}

impl RealWinner {
    pub fn as_str(&self) -> &'static str {
        match self {
            RealWinner::Democrat => "Democrat",
            RealWinner::Republican => "Republican",
            RealWinner::NoRealData => "No Real Data",
        }
    }
}

impl From<Party> for RealWinner {
    fn from(p: Party) -> Self {
        match p {
            Party::Democrat => RealWinner::Democrat,
            Party::Republican => RealWinner::Republican,
        }
    }
}

impl Display for RealWinner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The block of a state as seen from the comparison table.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum BlockLabel {
    Known(PoliticalBlock),
    /// The state is not in the historical table.
    Unknown,
}

impl Display for BlockLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockLabel::Known(b) => write!(f, "{}", b),
            BlockLabel::Unknown => write!(f, "Unknown Block"),
        }
    }
}

/// A simulated state joined with its historical counterpart.
#[derive(PartialEq, Debug, Clone)]
pub struct ComparisonRecord {
    pub state: String,
    pub democrat: u64,
    pub republican: u64,
    pub undecided: u64,
    pub winner_simulated: Winner,
    pub democrat_real_percent: Option<f64>,
    pub republican_real_percent: Option<f64>,
    pub winner_real: RealWinner,
    pub block: BlockLabel,
    pub correct_prediction: bool,
}

/// The outcome of a state after blending the simulation with the historical shares.
#[derive(PartialEq, Debug, Clone)]
pub struct AdjustedRecord {
    pub state: String,
    pub democrat_sim_pct: f64,
    pub republican_sim_pct: f64,
    pub democrat_adj_pct: f64,
    pub republican_adj_pct: f64,
    pub winner_adjusted: Winner,
    /// False when the state had no historical data and the weight was ignored.
    pub blended: bool,
}

/// Errors that prevent the pipeline from completing.
#[derive(PartialEq, Debug, Clone)]
pub enum SimulationErrors {
    /// The ensemble needs at least one repetition per voter.
    NoRepetitions,
    /// More repetitions per voter than [`MAX_REPETITIONS`].
    TooManyRepetitions(u32),
    /// The simulation weight must be within [0, 1].
    InvalidWeight(f64),
    /// A record given to the aggregator lacks an identifying field.
    MissingField { record: usize, field: &'static str },
    /// Two historical rows share the same state key.
    DuplicateState(String),
    /// The number of recorded votes does not match the number of voters.
    ReplayMismatch { voters: usize, votes: usize },
}

impl Error for SimulationErrors {}

impl Display for SimulationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationErrors::NoRepetitions => {
                write!(f, "the number of repetitions per voter must be at least 1")
            }
            SimulationErrors::TooManyRepetitions(r) => write!(
                f,
                "at most {} repetitions per voter are allowed, got {}",
                MAX_REPETITIONS, r
            ),
            SimulationErrors::InvalidWeight(w) => {
                write!(f, "the simulation weight must be between 0 and 1, got {}", w)
            }
            SimulationErrors::MissingField { record, field } => {
                write!(f, "record #{} is missing the required field {}", record, field)
            }
            SimulationErrors::DuplicateState(s) => {
                write!(f, "state {} appears more than once in the historical table", s)
            }
            SimulationErrors::ReplayMismatch { voters, votes } => write!(
                f,
                "cannot replay {} recorded votes for {} voters",
                votes, voters
            ),
        }
    }
}

// ********* Configuration **********

#[derive(PartialEq, Debug, Clone, Copy)]
pub struct SimulationRules {
    /// Number of oracle calls per voter.
    pub repetitions: u32,
    /// Fraction of the adjusted outcome that comes from the simulation.
    pub simulation_weight: f64,
}

impl SimulationRules {
    pub const DEFAULT_RULES: SimulationRules = SimulationRules {
        repetitions: 3,
        simulation_weight: 0.8,
    };

    pub fn validate(&self) -> Result<(), SimulationErrors> {
        check_repetitions(self.repetitions)?;
        check_weight(self.simulation_weight)?;
        Ok(())
    }
}

/// Upper bound on the oracle calls per voter.
pub const MAX_REPETITIONS: u32 = 1000;

pub fn check_repetitions(repetitions: u32) -> Result<u32, SimulationErrors> {
    match repetitions {
        0 => Err(SimulationErrors::NoRepetitions),
        r if r > MAX_REPETITIONS => Err(SimulationErrors::TooManyRepetitions(r)),
        r => Ok(r),
    }
}

pub fn check_weight(weight: f64) -> Result<f64, SimulationErrors> {
    // Also rejects NaN.
    if (0.0..=1.0).contains(&weight) {
        Ok(weight)
    } else {
        Err(SimulationErrors::InvalidWeight(weight))
    }
}

/// The key used for every per-state table.
pub fn normalize_state(state: &str) -> String {
    state.trim().to_uppercase()
}
