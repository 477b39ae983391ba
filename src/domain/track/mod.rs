pub mod entity;
pub mod invariants;
pub mod state;

pub use entity::{
    ContextVideoDetails, PageOwnerDetails, Thumbnail, ThumbnailList, TrackContext, TrackData,
    TrackMeta, VideoDetails,
};
pub use invariants::validate_track_state;
pub use state::{ControlSample, PlayState, RepeatMode, TrackState};
