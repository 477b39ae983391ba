// src/domain/mod.rs
//
// Domain Root - plain data shared by every provider
//
// Nothing in here performs I/O or touches the bus. All other modules import
// from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod settings;
pub mod track;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Track Domain
pub use track::{
    validate_track_state, ControlSample, PlayState, RepeatMode, TrackData, TrackState,
};

// Settings Domain
pub use settings::{default_settings, get_path, merge_over_defaults, set_path};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of data invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
