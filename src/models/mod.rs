pub mod matching;
pub mod stats;

pub use matching::{
    Candidate, MatchOutcome, MatchResult, MatchVerdict, MatchedCandidate, RawName, ScoreVector,
    Signal,
};
pub use stats::BatchStats;
