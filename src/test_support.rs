// Shared fakes for unit and scenario tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::domain::RepeatMode;
use crate::error::{AppResult, ProbeError};
use crate::events::{EventArgs, EventBus, RendererBridge, Subscription, ViewId};
use crate::integrations::page::{PageProbe, PageScript};

/// Renderer bridge that remembers every message.
#[derive(Default)]
pub struct RecordingBridge {
    sent: Mutex<Vec<(ViewId, String, Vec<Value>)>>,
}

impl RecordingBridge {
    /// `(view, args)` for every send of `event`.
    pub fn sent_event(&self, event: &str) -> Vec<(ViewId, Vec<Value>)> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, name, _)| name == event)
            .map(|(view, _, args)| (*view, args.clone()))
            .collect()
    }

    pub fn sent_to(&self, view: ViewId, event: &str) -> Vec<Vec<Value>> {
        self.sent_event(event)
            .into_iter()
            .filter(|(v, _)| *v == view)
            .map(|(_, args)| args)
            .collect()
    }
}

impl RendererBridge for RecordingBridge {
    fn send(&self, view: ViewId, event: &str, args: &[Value]) -> AppResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((view, event.to_string(), args.to_vec()));
        Ok(())
    }
}

pub type Captured = Arc<Mutex<Vec<EventArgs>>>;

/// Record every local delivery of `event`.
pub fn capture(bus: &EventBus, event: &str) -> Captured {
    let seen: Captured = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    bus.subscribe(Subscription::new(event, move |args| {
        let sink = Arc::clone(&sink);
        async move {
            sink.lock().unwrap().push(args);
            Ok(())
        }
    }));
    seen
}

#[derive(Debug, Clone, Default)]
pub struct PageState {
    pub active_id: Option<String>,
    pub liked: bool,
    pub disliked: bool,
    pub muted: bool,
    pub repeat: RepeatMode,
    pub playing: bool,
    /// Every script fails when set.
    pub broken: bool,
}

/// In-memory player page. Clicks change the state the reads report.
#[derive(Default)]
pub struct ScriptedPage {
    state: Mutex<PageState>,
    calls: Mutex<Vec<PageScript>>,
}

impl ScriptedPage {
    pub fn with_state(state: PageState) -> Self {
        Self {
            state: Mutex::new(state),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn state(&self) -> PageState {
        self.state.lock().unwrap().clone()
    }

    pub fn update(&self, f: impl FnOnce(&mut PageState)) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn calls(&self) -> Vec<PageScript> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, script: PageScript) -> usize {
        self.calls().into_iter().filter(|s| *s == script).count()
    }
}

#[async_trait]
impl PageProbe for ScriptedPage {
    async fn execute(&self, script: &str) -> Result<Value, ProbeError> {
        let script = PageScript::from_source(script)
            .ok_or_else(|| ProbeError::Script(format!("unknown script {}", script)))?;
        self.calls.lock().unwrap().push(script);

        let mut state = self.state.lock().unwrap();
        if state.broken {
            return Err(ProbeError::Script("page crashed".to_string()));
        }

        Ok(match script {
            PageScript::ActiveTrackId => json!(state.active_id),
            PageScript::LikeState => {
                json!([state.liked.to_string(), state.disliked.to_string()])
            }
            PageScript::MutedState => json!(state.muted),
            PageScript::RepeatLabel => json!(format!("Repeat {}", state.repeat)),
            PageScript::IsPlaying => json!(state.playing),
            PageScript::ClickLike => {
                state.liked = !state.liked;
                if state.liked {
                    state.disliked = false;
                }
                Value::Null
            }
            PageScript::ClickDislike => {
                state.disliked = !state.disliked;
                if state.disliked {
                    state.liked = false;
                }
                Value::Null
            }
            PageScript::ClickMute => {
                state.muted = !state.muted;
                Value::Null
            }
            PageScript::ClickRepeat => {
                state.repeat = state.repeat.next();
                Value::Null
            }
            PageScript::ClickPlayPause => {
                state.playing = !state.playing;
                Value::Null
            }
            PageScript::ClickShuffle | PageScript::ClickNext | PageScript::ClickPrevious => {
                Value::Null
            }
        })
    }
}

/// Poll `condition` while letting spawned tasks and blocking I/O progress.
/// Works with a paused clock, where sleeps alone can outrun the blocking pool.
pub async fn wait_for(condition: impl Fn() -> bool) -> bool {
    for _ in 0..500 {
        if condition() {
            return true;
        }
        std::thread::sleep(std::time::Duration::from_millis(1));
        tokio::task::yield_now().await;
    }
    condition()
}
