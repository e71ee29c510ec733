use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, Instant};

use gbahost_core::cadence::SAMPLE_FRAMES;
use gbahost_core::engine::Engine;
use gbahost_core::paths::SlotPaths;
use gbahost_core::session::{KeyOutcome, Session};
use gbahost_core::store::SnapshotStore;
use log::{debug, info, warn};
use thiserror::Error;

use crate::config::{ConfigError, HostConfig};
use crate::surface::Surface;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("cannot open ROM {}: {source}", path.display())]
    Rom {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("surface size {width}x{height} is empty")]
    EmptySurface { width: usize, height: usize },

    #[error("frame rate must be non-zero")]
    ZeroFrameRate,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseActionError {
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    #[error("expected FRAME=ACTION, got '{0}'")]
    MissingFrame(String),
    #[error("invalid frame number in '{0}'")]
    BadFrame(String),
}

/// A user input the host reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// F1..F8 (`key` 0..=7), optionally with Shift.
    SaveStateKey { key: u8, shifted: bool },
    UndoLoad,
    UndoSave,
    Reset,
    TogglePause,
    PauseNextFrame,
    Capture,
    /// The engine wrote to battery RAM.
    BatteryDirty,
}

fn parse_function_key(name: &str) -> Option<u8> {
    let n: u8 = name.strip_prefix('f')?.parse().ok()?;
    (1..=8).contains(&n).then(|| n - 1)
}

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let action = match name.as_str() {
            "f9" | "undo-load" => Self::UndoLoad,
            "f10" | "undo-save" => Self::UndoSave,
            "reset" => Self::Reset,
            "pause" => Self::TogglePause,
            "step" | "pause-next-frame" => Self::PauseNextFrame,
            "capture" | "screenshot" => Self::Capture,
            "battery-dirty" => Self::BatteryDirty,
            other => {
                let (shifted, key) = match other.strip_prefix("shift+") {
                    Some(rest) => (true, rest),
                    None => (false, other),
                };
                match parse_function_key(key) {
                    Some(key) => Self::SaveStateKey { key, shifted },
                    None => return Err(ParseActionError::UnknownAction(s.to_string())),
                }
            }
        };
        Ok(action)
    }
}

/// `FRAME=ACTION`: fire `ACTION` at host tick `FRAME`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledAction {
    pub tick: u64,
    pub action: Action,
}

impl FromStr for ScheduledAction {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((tick, action)) = s.split_once('=') else {
            return Err(ParseActionError::MissingFrame(s.to_string()));
        };
        let tick = tick
            .trim()
            .parse()
            .map_err(|_| ParseActionError::BadFrame(s.to_string()))?;
        Ok(Self {
            tick,
            action: action.parse()?,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub emulated: u64,
    pub rendered: u64,
}

/// Drives one engine: pacing, frame skipping, user actions.
pub struct Host<E: Engine> {
    engine: E,
    surface: Surface,
    session: Session,
    rate: u32,
    throttle: u32,
    script: BTreeMap<u64, Vec<Action>>,
    tick: u64,
    emulated: u64,
    rendered: u64,
    next_frame: Option<Instant>,
}

impl<E: Engine> Host<E> {
    /// Set up a session for `rom`. The ROM only needs to exist: its path
    /// names the per-game files.
    pub fn new(engine: E, rom: &Path, cfg: &HostConfig, surface: Surface) -> Result<Self, HostError> {
        std::fs::metadata(rom).map_err(|source| HostError::Rom {
            path: rom.to_path_buf(),
            source,
        })?;
        if surface.width() == 0 || surface.height() == 0 {
            return Err(HostError::EmptySurface {
                width: surface.width(),
                height: surface.height(),
            });
        }
        if cfg.frame_rate == 0 {
            return Err(HostError::ZeroFrameRate);
        }

        let paths = SlotPaths::for_rom(rom, cfg.storage_roots());
        info!("Savestates for {} use base name {}", rom.display(), paths.base_name());
        let store = SnapshotStore::new(paths, cfg.capture_format.into());
        let session = Session::new(store, cfg.session_options("gbahost"));

        Ok(Self {
            engine,
            surface,
            session,
            rate: cfg.frame_rate,
            throttle: cfg.throttle,
            script: BTreeMap::new(),
            tick: 0,
            emulated: 0,
            rendered: 0,
            next_frame: None,
        })
    }

    pub fn schedule(&mut self, entry: ScheduledAction) {
        self.script.entry(entry.tick).or_default().push(entry.action);
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn apply(&mut self, action: Action) {
        let engine = &mut self.engine;
        let ui = &mut self.surface;
        match action {
            Action::SaveStateKey { key, shifted } => {
                match self.session.handle_savestate_key(engine, ui, key, shifted) {
                    KeyOutcome::Failed(e) => debug!("savestate key F{}: {e}", key + 1),
                    outcome => debug!("savestate key F{}: {outcome:?}", key + 1),
                }
            }
            Action::UndoLoad => {
                if let Err(e) = self.session.undo_load(engine, ui) {
                    debug!("undo load: {e}");
                }
            }
            Action::UndoSave => {
                if let Err(e) = self.session.undo_save(engine, ui) {
                    debug!("undo save: {e}");
                }
            }
            Action::Reset => self.session.reset(engine, ui),
            Action::TogglePause => {
                self.session.toggle_pause();
            }
            Action::PauseNextFrame => self.session.request_pause_next_frame(),
            Action::Capture => {
                if let Err(e) = self.session.capture_screen(engine, ui) {
                    debug!("capture: {e}");
                }
            }
            Action::BatteryDirty => self.session.note_battery_updated(),
        }
    }

    /// Run `ticks` host iterations. Paused ticks emulate nothing.
    pub fn run(&mut self, ticks: u64) -> RunSummary {
        let start = self.tick;
        if start == 0 {
            // A game that never saved has no battery file yet.
            if let Err(e) = self.session.read_battery(&mut self.engine, &mut self.surface) {
                debug!("startup battery load: {e}");
            }
            self.session.start(Instant::now());
        }

        while self.tick < start + ticks {
            if let Some(actions) = self.script.remove(&self.tick) {
                for action in actions {
                    self.apply(action);
                }
            }

            if self.session.is_paused() {
                // Pacing restarts from the first frame after the pause.
                self.next_frame = None;
            } else {
                self.emulate_frame();
            }

            if self.surface.take_redraw() {
                self.surface.present(&self.engine.frame());
            }
            self.tick += 1;
        }

        RunSummary {
            ticks: self.tick,
            emulated: self.emulated,
            rendered: self.rendered,
        }
    }

    /// Flush battery RAM before the host goes away.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.session.write_battery(&mut self.engine, &mut self.surface) {
            debug!("battery flush on shutdown: {e}");
        }
    }

    fn emulate_frame(&mut self) {
        let render = self.session.should_render(self.emulated);
        self.engine.run_frame(render);
        if render {
            self.surface.present(&self.engine.frame());
            self.session.note_frame_rendered();
            self.rendered += 1;
        }
        self.emulated += 1;

        if self.session.pause_on_frame() {
            info!("Paused after frame {}", self.emulated);
        }

        if self.emulated.is_multiple_of(SAMPLE_FRAMES) {
            let now = Instant::now();
            let change = self
                .session
                .ten_frames(&mut self.engine, &mut self.surface, now, self.rate);
            debug!("cadence sample at frame {}: {change:?}", self.emulated);
        }

        if self.emulated.is_multiple_of(u64::from(self.rate)) {
            let speed = self.session.cadence().last_speed().unwrap_or(100);
            self.session.show_speed(&mut self.surface, speed);
        }

        self.throttle_frame();
    }

    fn throttle_frame(&mut self) {
        if self.throttle == 0 {
            self.next_frame = None;
            return;
        }
        let frame_time =
            Duration::from_secs(1) * 100 / (self.rate.saturating_mul(self.throttle).max(1));
        let target = self
            .next_frame
            .get_or_insert_with(|| Instant::now() + frame_time);

        let now = Instant::now();
        if now < *target {
            std::thread::sleep(*target - now);
            *target += frame_time;
        } else {
            if now - *target > frame_time * 10 {
                warn!("Host fell behind by {:?}; resynchronising", now - *target);
                *target = now;
            }
            *target += frame_time;
        }
    }
}
