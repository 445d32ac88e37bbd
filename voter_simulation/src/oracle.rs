use log::{debug, warn};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::Display;

/// One answer of the oracle, after parsing.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Sample {
    /// The first ticket (Democrat).
    One,
    /// The second ticket (Republican).
    Two,
    /// The oracle answered, but not with one of the two allowed values.
    Invalid,
}

impl Sample {
    /// Only the values 1 and 2 are accepted.
    pub fn from_value(v: i64) -> Sample {
        match v {
            1 => Sample::One,
            2 => Sample::Two,
            _ => Sample::Invalid,
        }
    }

    /// Reads the first non-blank character of a free-text answer.
    ///
    /// ```
    /// use voter_simulation::Sample;
    ///
    /// assert_eq!(Sample::from_text(" 2"), Sample::Two);
    /// assert_eq!(Sample::from_text("1. Harris"), Sample::One);
    /// assert_eq!(Sample::from_text("I would vote 1"), Sample::Invalid);
    /// ```
    pub fn from_text(text: &str) -> Sample {
        match text.trim().chars().next() {
            Some('1') => Sample::One,
            Some('2') => Sample::Two,
            _ => Sample::Invalid,
        }
    }
}

/// A failed oracle call. These never stand in for a vote.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum OracleError {
    /// The capability cannot be used, for example because the credential is missing.
    Unavailable(String),
    Timeout,
    CallFailed(String),
    MalformedResponse(String),
}

impl Error for OracleError {}

impl Display for OracleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleError::Unavailable(msg) => write!(f, "oracle unavailable: {}", msg),
            OracleError::Timeout => write!(f, "oracle call timed out"),
            OracleError::CallFailed(msg) => write!(f, "oracle call failed: {}", msg),
            OracleError::MalformedResponse(msg) => {
                write!(f, "malformed oracle response: {}", msg)
            }
        }
    }
}

/// An external capability that answers a ballot question.
///
/// Every call may be slow and costly. Implementations should not retry:
/// failures are absorbed by the ensemble voter.
pub trait OracleCapability {
    /// If true, `structured_vote` is used. Otherwise the answer is requested as free text.
    fn supports_structured_output(&self) -> bool;

    /// Asks for an answer constrained to the schema `{"vote": 1 | 2}` and returns the
    /// value of the `vote` field.
    fn structured_vote(&self, prompt: &str) -> Result<i64, OracleError>;

    /// Asks for a free-text answer.
    fn free_text(&self, prompt: &str) -> Result<String, OracleError>;
}

/// Performs one oracle call for the given prompt.
pub fn request_vote<O: OracleCapability + ?Sized>(
    prompt: &str,
    oracle: &O,
) -> Result<Sample, OracleError> {
    let sample = if oracle.supports_structured_output() {
        Sample::from_value(oracle.structured_vote(prompt)?)
    } else {
        let text = oracle.free_text(prompt)?;
        debug!("request_vote: free text answer: {:?}", text);
        Sample::from_text(&text)
    };
    if sample == Sample::Invalid {
        warn!("request_vote: the oracle did not answer with 1 or 2");
    }
    Ok(sample)
}

#[derive(Eq, PartialEq, Debug, Clone)]
enum Reply {
    Text(String),
    Value(i64),
    Failure(OracleError),
}

/// An oracle that plays back a fixed list of replies, in order.
///
/// Once the script is exhausted, every call fails. It is used for
/// deterministic runs and in tests.
///
/// ```
/// use voter_simulation::{request_vote, Sample, ScriptedOracle};
///
/// let oracle = ScriptedOracle::from_values(&[2, 7]);
/// assert_eq!(request_vote("prompt", &oracle), Ok(Sample::Two));
/// assert_eq!(request_vote("prompt", &oracle), Ok(Sample::Invalid));
/// assert!(request_vote("prompt", &oracle).is_err());
/// ```
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    structured: bool,
    replies: RefCell<VecDeque<Reply>>,
    calls: RefCell<usize>,
}

impl ScriptedOracle {
    /// An oracle answering with free text.
    pub fn from_texts(texts: &[&str]) -> ScriptedOracle {
        ScriptedOracle {
            structured: false,
            replies: RefCell::new(texts.iter().map(|s| Reply::Text(s.to_string())).collect()),
            calls: RefCell::new(0),
        }
    }

    /// An oracle answering with schema-constrained values.
    pub fn from_values(values: &[i64]) -> ScriptedOracle {
        ScriptedOracle {
            structured: true,
            replies: RefCell::new(values.iter().map(|v| Reply::Value(*v)).collect()),
            calls: RefCell::new(0),
        }
    }

    /// An oracle for which every call fails as unavailable.
    pub fn unavailable() -> ScriptedOracle {
        ScriptedOracle::default()
    }

    /// Appends a failing call to the script.
    pub fn then_fail(self, err: OracleError) -> ScriptedOracle {
        self.replies.borrow_mut().push_back(Reply::Failure(err));
        self
    }

    /// Appends a structured reply to the script.
    pub fn then_value(self, v: i64) -> ScriptedOracle {
        self.replies.borrow_mut().push_back(Reply::Value(v));
        self
    }

    /// Appends a free-text reply to the script.
    pub fn then_text(self, s: &str) -> ScriptedOracle {
        self.replies.borrow_mut().push_back(Reply::Text(s.to_string()));
        self
    }

    /// The number of calls received so far.
    pub fn calls(&self) -> usize {
        *self.calls.borrow()
    }

    fn next_reply(&self) -> Reply {
        *self.calls.borrow_mut() += 1;
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Reply::Failure(OracleError::Unavailable("script exhausted".to_string())))
    }
}

impl OracleCapability for ScriptedOracle {
    fn supports_structured_output(&self) -> bool {
        self.structured
    }

    fn structured_vote(&self, _prompt: &str) -> Result<i64, OracleError> {
        match self.next_reply() {
            Reply::Value(v) => Ok(v),
            Reply::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| OracleError::MalformedResponse(s.clone())),
            Reply::Failure(e) => Err(e),
        }
    }

    fn free_text(&self, _prompt: &str) -> Result<String, OracleError> {
        match self.next_reply() {
            Reply::Text(s) => Ok(s),
            Reply::Value(v) => Ok(v.to_string()),
            Reply::Failure(e) => Err(e),
        }
    }
}
