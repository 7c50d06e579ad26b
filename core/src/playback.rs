//! Shared playback state driving every linked view.
//!
//! Playback is a two-state machine (paused and playing) over a sample index into the test
//! trajectory. Transitions are computed by the pure function [`transition`]; the
//! [`PlaybackController`] only owns the state and the trajectory length. Event registration and
//! view updates live elsewhere (see [`crate::session`]).
//!
//! | Event         | Paused                                         | Playing                                  |
//! |---------------|------------------------------------------------|------------------------------------------|
//! | `Scrub(i)`    | index = clamp(i)                               | index = clamp(i), pause                  |
//! | `TogglePlay`  | play if non-empty, rewinding from the last sample | pause                                 |
//! | `Tick`        | no change                                      | index += step, pause on reaching the end |
//!
//! Advancement is a fixed number of samples per rendering tick, independent of wall-clock time.
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    #[default]
    Paused,
    Playing,
}

/// Snapshot of the playback state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Current sample index, always within `[0, len - 1]` (0 for an empty trajectory)
    pub index: usize,
    pub mode: PlaybackMode,
    /// Host timestamp of the most recent tick processed while playing
    pub last_tick: Option<f64>,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        self.mode == PlaybackMode::Playing
    }
}

/// External events delivered to playback.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlaybackEvent {
    Scrub(usize),
    TogglePlay,
    /// One rendering frame at host time `timestamp`
    Tick { timestamp: f64 },
}

fn last_index(len: usize) -> usize {
    len.saturating_sub(1)
}

/// Compute the state that follows `state` after `event`, for a trajectory of `len` samples
/// advanced `step` samples per tick.
pub fn transition(
    state: PlaybackState,
    len: usize,
    step: usize,
    event: PlaybackEvent,
) -> PlaybackState {
    match event {
        PlaybackEvent::Scrub(index) => PlaybackState {
            index: index.min(last_index(len)),
            mode: PlaybackMode::Paused,
            last_tick: state.last_tick,
        },
        PlaybackEvent::TogglePlay => match state.mode {
            PlaybackMode::Playing => PlaybackState {
                mode: PlaybackMode::Paused,
                ..state
            },
            PlaybackMode::Paused if len == 0 => state,
            PlaybackMode::Paused => PlaybackState {
                index: if state.index >= last_index(len) {
                    0
                } else {
                    state.index
                },
                mode: PlaybackMode::Playing,
                last_tick: state.last_tick,
            },
        },
        PlaybackEvent::Tick { timestamp } => match state.mode {
            PlaybackMode::Paused => state,
            PlaybackMode::Playing => {
                let end = last_index(len);
                let index = state.index.saturating_add(step.max(1)).min(end);
                PlaybackState {
                    index,
                    mode: if index >= end {
                        PlaybackMode::Paused
                    } else {
                        PlaybackMode::Playing
                    },
                    last_tick: Some(timestamp),
                }
            }
        },
    }
}

/// Owner of the single shared playback index.
#[derive(Clone, Debug)]
pub struct PlaybackController {
    state: PlaybackState,
    len: usize,
    step: usize,
}

impl PlaybackController {
    /// A paused controller at index 0 for a trajectory of `len` samples.
    ///
    /// A `step` of zero is raised to one so playback always reaches the end.
    pub fn new(len: usize, step: usize) -> Self {
        PlaybackController {
            state: PlaybackState::default(),
            len,
            step: step.max(1),
        }
    }

    /// Discard all playback state for a newly loaded trajectory of `len` samples.
    pub fn reset(&mut self, len: usize) {
        self.state = PlaybackState::default();
        self.len = len;
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }
    pub fn index(&self) -> usize {
        self.state.index
    }
    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }
    pub fn step(&self) -> usize {
        self.step
    }

    /// Apply `event`, returning the new state.
    pub fn handle(&mut self, event: PlaybackEvent) -> PlaybackState {
        let next = transition(self.state, self.len, self.step, event);
        if next.mode != self.state.mode {
            debug!(
                "Playback {:?} -> {:?} at index {}",
                self.state.mode, next.mode, next.index
            );
        }
        self.state = next;
        next
    }

    pub fn scrub(&mut self, index: usize) -> PlaybackState {
        self.handle(PlaybackEvent::Scrub(index))
    }
    pub fn toggle_play(&mut self) -> PlaybackState {
        self.handle(PlaybackEvent::TogglePlay)
    }
    pub fn tick(&mut self, timestamp: f64) -> PlaybackState {
        self.handle(PlaybackEvent::Tick { timestamp })
    }
}
