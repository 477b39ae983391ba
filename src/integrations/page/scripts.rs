// Scripts submitted to the embedded page.
//
// They call into the helper object the host shell injects into the page
// (`window.__ytmdesk`), so the main process never depends on page markup.

/// Every script the core may submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageScript {
    /// Track id the player currently shows, or null.
    ActiveTrackId,
    /// `[liked, disliked]`
    LikeState,
    MutedState,
    /// Repeat button label ("Repeat off" | "Repeat one" | "Repeat all").
    RepeatLabel,
    IsPlaying,
    ClickLike,
    ClickDislike,
    ClickMute,
    ClickRepeat,
    ClickShuffle,
    ClickNext,
    ClickPrevious,
    ClickPlayPause,
}

impl PageScript {
    pub fn source(&self) -> &'static str {
        match self {
            PageScript::ActiveTrackId => "window.__ytmdesk.activeTrackId()",
            PageScript::LikeState => "window.__ytmdesk.likeState()",
            PageScript::MutedState => "window.__ytmdesk.mutedState()",
            PageScript::RepeatLabel => "window.__ytmdesk.repeatLabel()",
            PageScript::IsPlaying => "window.__ytmdesk.isPlaying()",
            PageScript::ClickLike => "window.__ytmdesk.click('like')",
            PageScript::ClickDislike => "window.__ytmdesk.click('dislike')",
            PageScript::ClickMute => "window.__ytmdesk.click('volume')",
            PageScript::ClickRepeat => "window.__ytmdesk.click('repeat')",
            PageScript::ClickShuffle => "window.__ytmdesk.click('shuffle')",
            PageScript::ClickNext => "window.__ytmdesk.click('next')",
            PageScript::ClickPrevious => "window.__ytmdesk.click('previous')",
            PageScript::ClickPlayPause => "window.__ytmdesk.click('play-pause')",
        }
    }

    /// Inverse of [`source`](Self::source); used by scripted pages in tests
    /// and by shells that dispatch natively instead of evaluating script.
    pub fn from_source(source: &str) -> Option<Self> {
        ALL_SCRIPTS.iter().copied().find(|s| s.source() == source)
    }
}

const ALL_SCRIPTS: [PageScript; 13] = [
    PageScript::ActiveTrackId,
    PageScript::LikeState,
    PageScript::MutedState,
    PageScript::RepeatLabel,
    PageScript::IsPlaying,
    PageScript::ClickLike,
    PageScript::ClickDislike,
    PageScript::ClickMute,
    PageScript::ClickRepeat,
    PageScript::ClickShuffle,
    PageScript::ClickNext,
    PageScript::ClickPrevious,
    PageScript::ClickPlayPause,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_round_trip() {
        for script in ALL_SCRIPTS {
            assert_eq!(PageScript::from_source(script.source()), Some(script));
        }
        assert_eq!(PageScript::from_source("alert(1)"), None);
    }
}
