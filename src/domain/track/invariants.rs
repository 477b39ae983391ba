use super::state::TrackState;
use crate::domain::{DomainError, DomainResult};

/// Validates a track state replacement.
///
/// `has_metadata` answers whether the metadata table holds an entry for a
/// track id; an active id without metadata is rejected.
pub fn validate_track_state<F>(state: &TrackState, has_metadata: F) -> DomainResult<()>
where
    F: Fn(&str) -> bool,
{
    if let Some(id) = state.id.as_deref() {
        if !has_metadata(id) {
            return Err(DomainError::InvariantViolation(format!(
                "active track {} has no metadata",
                id
            )));
        }
    }

    for (name, value) in [
        ("progress", state.progress),
        ("uiProgress", state.ui_progress),
        ("duration", state.duration),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(DomainError::InvariantViolation(format!(
                "{} must be a non-negative number, got {}",
                name, value
            )));
        }
    }

    Ok(())
}
