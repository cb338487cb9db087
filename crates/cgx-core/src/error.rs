//! Fatal conversion errors.
//!
//! A conversion either completes (possibly with recoverable warnings recorded
//! in [`crate::ConversionDiagnostics`]) or stops at the first [`ConversionError`].
//! There is no partial model: callers never observe a half-built network.
//!
//! ```
//! use cgx_core::{ConversionError, ConversionResult};
//!
//! fn check_neutral(low: i32, high: i32, neutral: i32) -> ConversionResult<()> {
//!     if neutral < low || neutral > high {
//!         return Err(ConversionError::NeutralStepOutOfRange {
//!             tap_changer: "RTC1".into(),
//!             neutral,
//!             low,
//!             high,
//!         });
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_neutral(-10, 10, 11).is_err());
//! ```

use thiserror::Error;

/// Unrecoverable condition that aborts a conversion run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// Boundary node with several loads or an injection kind that cannot be
    /// folded into a dangling line.
    #[error("ambiguous boundary topology at node {node}: {reason}")]
    AmbiguousBoundaryTopology { node: String, reason: String },

    /// Boundary node whose branch layout cannot be mapped to a dangling line
    /// or a tie line.
    #[error("unsupported boundary topology at node {node}: {reason}")]
    UnsupportedBoundaryTopology { node: String, reason: String },

    #[error("tap changer {tap_changer}: neutral step {neutral} outside [{low}, {high}]")]
    NeutralStepOutOfRange {
        tap_changer: String,
        neutral: i32,
        low: i32,
        high: i32,
    },

    #[error("transformer {transformer} has {count} windings; only 2 or 3 are supported")]
    UnsupportedWindingCount { transformer: String, count: usize },

    #[error("boundary node {node} feeds transformer {transformer}")]
    BoundaryNodeFeedsTransformer { node: String, transformer: String },

    #[error("transformer {transformer} has more than one {kind} tap changer")]
    DuplicateTapChanger {
        transformer: String,
        kind: &'static str,
    },

    #[error("transformer {transformer} has ratio and phase tap changers on different windings")]
    TapChangerSidesMismatch { transformer: String },

    /// Description of a boundary node does not carry an `X...;` code.
    #[error("boundary node {node} has no boundary code in its description")]
    MissingBoundaryCode { node: String },

    #[error("phase tap changer on three-winding transformer {transformer} is not supported")]
    UnsupportedPhaseTapChanger { transformer: String },

    #[error(
        "three-winding transformer {transformer} windings do not have strictly descending rated voltages"
    )]
    NonDescendingRatedVoltages { transformer: String },

    /// A terminal was registered twice. Indicates a bug in an equipment
    /// builder or a terminal shared by two pieces of equipment.
    #[error("terminal {terminal} registered twice (first by {first}, then by {second})")]
    DuplicateTerminal {
        terminal: String,
        first: String,
        second: String,
    },

    #[error("{kind} {id} references unknown {target_kind} {target}")]
    UnknownReference {
        kind: &'static str,
        id: String,
        target_kind: &'static str,
        target: String,
    },
}

impl ConversionError {
    /// Shorthand for a dangling reference between source objects.
    pub fn unknown(
        kind: &'static str,
        id: impl Into<String>,
        target_kind: &'static str,
        target: impl Into<String>,
    ) -> Self {
        ConversionError::UnknownReference {
            kind,
            id: id.into(),
            target_kind,
            target: target.into(),
        }
    }
}

/// Convenience type alias for results of conversion steps.
pub type ConversionResult<T> = Result<T, ConversionError>;
