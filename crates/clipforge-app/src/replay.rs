//! Headless replay of an editing session.
//!
//! A script names an asset and a list of user actions. The actions run
//! against a `TrimEditor` over a `SimulatedSurface` in virtual time;
//! play requests are accepted as soon as they are made.

use anyhow::{bail, Result};
use clipforge_core::{ClipDescriptor, EngineConfig, MediaAsset, TrimRange};
use clipforge_playback::{
    DragTarget, NetworkQuality, SimulatedSurface, TrackGeometry, TrimEditor,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Replay input.
#[derive(Debug, Deserialize)]
pub struct Script {
    pub asset: MediaAsset,
    /// Media length reported by the simulated surface.
    pub duration: f64,
    #[serde(default)]
    pub track: Option<TrackGeometry>,
    pub steps: Vec<Step>,
}

/// One user action or passage of time.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    PointerDown { target: DragTarget, x: f32 },
    PointerMove { x: f32 },
    PointerUp,
    SetStart { text: String },
    SetEnd { text: String },
    Play,
    Pause,
    Toggle,
    SetRate { rate: f64 },
    /// Let `ms` milliseconds of playback elapse.
    Advance { ms: u64 },
    /// Grow the buffered range to `seconds`.
    Buffer { seconds: f64 },
    CreateClip,
}

/// Replay output.
#[derive(Debug, Serialize)]
pub struct Report {
    pub clips: Vec<ClipDescriptor>,
    /// Rejected actions, in order.
    pub errors: Vec<String>,
    pub range: TrimRange,
    pub buffered_fraction: f64,
    pub network: NetworkQuality,
}

/// Run `script` to completion.
pub fn run(script: &Script, config: &EngineConfig) -> Result<Report> {
    if !script.duration.is_finite() || script.duration <= 0.0 {
        bail!("script duration must be positive, got {}", script.duration);
    }

    let origin = Instant::now();
    let mut clock = Duration::ZERO;
    let mut editor = TrimEditor::new(SimulatedSurface::new(script.duration), config);
    if let Some(track) = script.track {
        editor.set_track_geometry(track);
    }

    editor.load_asset(script.asset.clone(), origin);
    let metadata = editor.surface().metadata_event();
    editor.handle_event(metadata, origin);

    let mut clips = Vec::new();
    let mut errors = Vec::new();
    let step_len = config.playback.range_poll_interval();

    for (index, step) in script.steps.iter().enumerate() {
        debug!(index, ?step, "Replay step");
        match step {
            Step::PointerDown { target, x } => {
                editor.pointer_down(*target, *x);
            }
            Step::PointerMove { x } => {
                editor.pointer_move(*x);
            }
            Step::PointerUp => {
                editor.pointer_up();
            }
            Step::SetStart { text } => {
                if let Err(e) = editor.set_start_text(text) {
                    errors.push(e.to_string());
                }
            }
            Step::SetEnd { text } => {
                if let Err(e) = editor.set_end_text(text) {
                    errors.push(e.to_string());
                }
            }
            Step::Play => {
                editor.play();
                accept_pending(&mut editor, origin + clock);
            }
            Step::Pause => {
                editor.pause();
            }
            Step::Toggle => {
                editor.toggle();
                accept_pending(&mut editor, origin + clock);
            }
            Step::SetRate { rate } => {
                if let Err(e) = editor.set_rate(*rate) {
                    errors.push(e.to_string());
                }
            }
            Step::Advance { ms } => {
                let target = clock + Duration::from_millis(*ms);
                while clock < target {
                    let dt = step_len.min(target - clock);
                    clock += dt;
                    let now = origin + clock;
                    for event in editor.surface_mut().advance(dt.as_secs_f64()) {
                        editor.handle_event(event, now);
                    }
                    editor.tick(now);
                }
            }
            Step::Buffer { seconds } => {
                let event = editor.surface_mut().buffer_to(*seconds);
                editor.handle_event(event, origin + clock);
            }
            Step::CreateClip => match editor.create_clip() {
                Ok(clip) => clips.push(clip),
                Err(e) => {
                    warn!("Clip rejected: {}", e);
                    errors.push(e.to_string());
                }
            },
        }
    }

    let buffer = editor.buffer_state();
    Ok(Report {
        clips,
        errors,
        range: editor.snapshot(),
        buffered_fraction: buffer.buffered_fraction,
        network: editor.network_quality(),
    })
}

fn accept_pending(editor: &mut TrimEditor<SimulatedSurface>, now: Instant) {
    if let Some(event) = editor.surface_mut().accept_play() {
        editor.handle_event(event, now);
    }
}
