//! Errors surfaced by layer navigation.
//!
//! The simulation itself never fails: out-of-range queries return neutral
//! values and an empty unit pool yields an empty grid. Only navigation
//! requests can be refused.

use thiserror::Error;

/// Why a layer transition request was refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationError {
    /// No layer has been built yet.
    #[error("no layer is active yet")]
    NoActiveLayer,

    /// An animated transition is still running.
    #[error("a layer transition is already in progress")]
    TransitionInProgress,
}

/// Result type for navigation requests.
pub type NavResult<T> = Result<T, NavigationError>;
