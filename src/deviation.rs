use std::error::Error;
use std::fmt;

use crate::locate::locate;
use crate::session::{ObjectKind, Snapshot};
use crate::util::dist_sq;

/// Fatal scoring conditions. Both mean the metric asking for the score is
/// broken for this session and must fail loudly instead of producing a
/// number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreError {
    /// The caller requested a score over zero snapshots. A metric only
    /// reaches the scorer once both bounding timestamps exist, so an empty
    /// window is a contract violation, not missing data.
    EmptyWindow,
    /// Every snapshot in the window lacked a comparable predicted and
    /// authoritative pair. The mean is undefined; reported as a distinct
    /// "no data" failure rather than some arbitrary number.
    NoComparablePairs,
}

impl fmt::Display for ScoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreError::EmptyWindow => write!(f, "deviation window is empty"),
            ScoreError::NoComparablePairs => {
                write!(f, "no snapshot in the window had a comparable object pair")
            }
        }
    }
}

impl Error for ScoreError {}

/// A computed deviation score plus the data-quality counters behind it.
///
/// `compared + skipped` always equals the window size; callers surface the
/// skip ratio for auditing but only `score` feeds the session report value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deviation {
    pub score: i64,
    pub compared: usize,
    pub skipped: usize,
}

/// Mean squared positional error between the predicted and authoritative
/// instances of `kind` over a snapshot window.
///
/// Snapshots where either instance is missing are skipped and counted; the
/// mean is taken over the comparable snapshots only and floored to an
/// integer.
pub fn score(window: &[Snapshot], kind: ObjectKind) -> Result<Deviation, ScoreError> {
    if window.is_empty() {
        return Err(ScoreError::EmptyWindow);
    }

    let mut sum = 0.0;
    let mut skipped = 0usize;
    for snapshot in window {
        match (
            locate(&snapshot.predicted, kind),
            locate(&snapshot.authoritative, kind),
        ) {
            (Some(predicted), Some(authoritative)) => {
                sum += dist_sq(predicted, authoritative);
            }
            _ => skipped += 1,
        }
    }

    let compared = window.len() - skipped;
    if compared == 0 {
        return Err(ScoreError::NoComparablePairs);
    }

    Ok(Deviation {
        score: (sum / compared as f64).floor() as i64,
        compared,
        skipped,
    })
}
