use std::time::Instant;

use log::{debug, info, warn};

use crate::cadence::{CadenceController, SkipChange};
use crate::engine::{Engine, Presentation};
use crate::error::StoreError;
use crate::slot::SlotIndex;
use crate::status::{ShowSpeed, title_text};
use crate::store::{ExchangeReport, SnapshotStore, announce};

/// Cadence samples between the engine flagging battery RAM as dirty and the
/// battery file being written.
pub const BATTERY_SAVE_DELAY: u32 = 30;

/// Highest screenshot index probed when looking for a free file name.
const MAX_CAPTURE_INDEX: u32 = 99;

/// Which function keys save and which load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SaveKeyMode {
    /// Shift+F*n* saves slot *n*, F*n* loads it.
    #[default]
    Classic,
    /// F*n* saves slot *n*, Shift+F*n* loads it.
    Swapped,
    /// F5/F6 step the current slot down/up, F7 saves it, F8 loads it.
    SlotCycle,
}

impl SaveKeyMode {
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Classic),
            1 => Some(Self::Swapped),
            2 => Some(Self::SlotCycle),
            _ => None,
        }
    }

    pub const fn index(self) -> u8 {
        match self {
            Self::Classic => 0,
            Self::Swapped => 1,
            Self::SlotCycle => 2,
        }
    }
}

impl TryFrom<u8> for SaveKeyMode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_index(value).ok_or(value)
    }
}

#[derive(Debug)]
pub enum KeyOutcome {
    Saved {
        slot: SlotIndex,
        report: ExchangeReport,
    },
    Loaded {
        slot: SlotIndex,
    },
    /// Slot pointer moved (slot-cycle mode).
    SlotChanged(SlotIndex),
    /// Slot pointer already at the end of the range (slot-cycle mode).
    SlotAtLimit(SlotIndex),
    Ignored,
    Failed(StoreError),
}

/// Startup options of a [`Session`].
#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub save_key_mode: SaveKeyMode,
    pub auto_frame_skip: bool,
    pub frame_skip: u8,
    pub show_speed: ShowSpeed,
    pub fullscreen: bool,
    pub title: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            save_key_mode: SaveKeyMode::default(),
            auto_frame_skip: true,
            frame_skip: 0,
            show_speed: ShowSpeed::default(),
            fullscreen: false,
            title: "gbahost".to_string(),
        }
    }
}

/// Per-game host state: the savestate store, frame pacing and the user's
/// slot pointer. Created when a game is loaded and dropped with it.
pub struct Session {
    store: SnapshotStore,
    cadence: CadenceController,
    save_key_mode: SaveKeyMode,
    current_slot: SlotIndex,
    battery_countdown: u32,
    paused: bool,
    pause_next_frame: bool,
    rendered_frames: u32,
    show_speed: ShowSpeed,
    fullscreen: bool,
    title: String,
    next_capture: u32,
}

impl Session {
    pub fn new(store: SnapshotStore, options: SessionOptions) -> Self {
        Self {
            store,
            cadence: CadenceController::new(options.auto_frame_skip, options.frame_skip),
            save_key_mode: options.save_key_mode,
            current_slot: SlotIndex::FIRST,
            battery_countdown: 0,
            paused: false,
            pause_next_frame: false,
            rendered_frames: 0,
            show_speed: options.show_speed,
            fullscreen: options.fullscreen,
            title: options.title,
            next_capture: 1,
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn cadence(&self) -> &CadenceController {
        &self.cadence
    }

    pub fn cadence_mut(&mut self) -> &mut CadenceController {
        &mut self.cadence
    }

    pub fn save_key_mode(&self) -> SaveKeyMode {
        self.save_key_mode
    }

    pub fn current_slot(&self) -> SlotIndex {
        self.current_slot
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Handle F1..F8 (`key` 0..=7), with or without Shift.
    pub fn handle_savestate_key(
        &mut self,
        engine: &mut dyn Engine,
        ui: &mut dyn Presentation,
        key: u8,
        shifted: bool,
    ) -> KeyOutcome {
        let (save, slot) = match self.save_key_mode {
            SaveKeyMode::SlotCycle => match key {
                4 => return self.step_slot(false),
                5 => return self.step_slot(true),
                6 => (true, self.current_slot),
                7 => (false, self.current_slot),
                _ => return KeyOutcome::Ignored,
            },
            SaveKeyMode::Classic | SaveKeyMode::Swapped => {
                let Some(slot) = SlotIndex::new(key) else {
                    return KeyOutcome::Ignored;
                };
                self.current_slot = slot;
                let save = match self.save_key_mode {
                    SaveKeyMode::Classic => shifted,
                    _ => !shifted,
                };
                (save, slot)
            }
        };

        if save {
            self.save(engine, ui, slot)
        } else {
            self.load(engine, ui, slot)
        }
    }

    fn step_slot(&mut self, up: bool) -> KeyOutcome {
        let next = if up {
            self.current_slot.next()
        } else {
            self.current_slot.prev()
        };
        match next {
            Some(slot) => {
                self.current_slot = slot;
                info!("Changed savestate slot to {}.", slot.get() + 1);
                KeyOutcome::SlotChanged(slot)
            }
            None => {
                if up {
                    warn!("Can't increase slot number above {}.", SlotIndex::LAST.get() + 1);
                } else {
                    warn!("Can't decrease slot number below 1.");
                }
                KeyOutcome::SlotAtLimit(self.current_slot)
            }
        }
    }

    /// Save with backup into `slot`.
    pub fn save(
        &mut self,
        engine: &mut dyn Engine,
        ui: &mut dyn Presentation,
        slot: SlotIndex,
    ) -> KeyOutcome {
        match self.store.save_with_backup(engine, ui, slot) {
            Ok(report) => KeyOutcome::Saved { slot, report },
            Err(e) => KeyOutcome::Failed(e),
        }
    }

    /// Load `slot` after backing up the live state.
    pub fn load(
        &mut self,
        engine: &mut dyn Engine,
        ui: &mut dyn Presentation,
        slot: SlotIndex,
    ) -> KeyOutcome {
        match self.store.load_with_backup(engine, ui, slot) {
            Ok(()) => KeyOutcome::Loaded { slot },
            Err(e) => KeyOutcome::Failed(e),
        }
    }

    pub fn undo_load(
        &mut self,
        engine: &mut dyn Engine,
        ui: &mut dyn Presentation,
    ) -> Result<(), StoreError> {
        self.store.undo_load(engine, ui)
    }

    pub fn undo_save(
        &mut self,
        engine: &mut dyn Engine,
        ui: &mut dyn Presentation,
    ) -> Result<(), StoreError> {
        self.store.undo_save(engine, ui)
    }

    pub fn start(&mut self, now: Instant) {
        self.cadence.start(now);
    }

    /// Whether emulated frame `frame` should be drawn.
    pub fn should_render(&self, frame: u64) -> bool {
        self.cadence.should_render(frame)
    }

    pub fn note_frame_rendered(&mut self) {
        self.rendered_frames = self.rendered_frames.saturating_add(1);
    }

    /// The engine wrote to battery-backed RAM; flush it after a short delay
    /// so bursts of writes end up in one file write.
    pub fn note_battery_updated(&mut self) {
        self.battery_countdown = BATTERY_SAVE_DELAY;
    }

    /// Called every [`crate::cadence::SAMPLE_FRAMES`] emulated frames.
    pub fn ten_frames(
        &mut self,
        engine: &mut dyn Engine,
        ui: &mut dyn Presentation,
        now: Instant,
        rate: u32,
    ) -> SkipChange {
        let change = self.cadence.tick(now, rate);

        if self.battery_countdown > 0 {
            self.battery_countdown -= 1;
            if self.battery_countdown == 0 {
                if let Err(e) = self.store.write_battery(engine, ui) {
                    debug!("battery autosave: {e}");
                }
            }
        }

        change
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        if self.paused {
            self.cadence.note_pause();
        }
        info!("{}", if self.paused { "Pause on" } else { "Pause off" });
        self.paused
    }

    /// Run until the end of the next frame, then pause.
    pub fn request_pause_next_frame(&mut self) {
        if self.paused {
            self.paused = false;
        }
        self.pause_next_frame = true;
    }

    /// Polled once per frame; true when a pause-next-frame request fired.
    pub fn pause_on_frame(&mut self) -> bool {
        if self.pause_next_frame {
            self.pause_next_frame = false;
            self.paused = true;
            self.cadence.note_pause();
            return true;
        }
        false
    }

    pub fn reset(&mut self, engine: &mut dyn Engine, ui: &mut dyn Presentation) {
        engine.reset();
        announce(ui, "Reset");
    }

    /// Publish the speed measured by the host and restart the rendered-frame
    /// count. Returns the number of frames drawn since the previous call.
    pub fn show_speed(&mut self, ui: &mut dyn Presentation, speed: u32) -> u32 {
        let rendered = std::mem::take(&mut self.rendered_frames);
        if !self.fullscreen && self.show_speed != ShowSpeed::Off {
            ui.set_title(&title_text(
                &self.title,
                self.show_speed,
                speed,
                self.cadence.level(),
                rendered,
            ));
        }
        rendered
    }

    pub fn read_battery(
        &mut self,
        engine: &mut dyn Engine,
        ui: &mut dyn Presentation,
    ) -> Result<(), StoreError> {
        self.store.read_battery(engine, ui)
    }

    pub fn write_battery(
        &mut self,
        engine: &mut dyn Engine,
        ui: &mut dyn Presentation,
    ) -> Result<(), StoreError> {
        self.battery_countdown = 0;
        self.store.write_battery(engine, ui)
    }

    /// Capture to the first unused screenshot index.
    pub fn capture_screen(
        &mut self,
        engine: &mut dyn Engine,
        ui: &mut dyn Presentation,
    ) -> Result<std::path::PathBuf, StoreError> {
        let format = self.store.capture_format();
        let mut index = self.next_capture;
        while index < MAX_CAPTURE_INDEX && self.store.paths().screenshot(index, format).exists() {
            index += 1;
        }
        self.next_capture = (index + 1).min(MAX_CAPTURE_INDEX);
        self.store.capture_screen(engine, ui, index)
    }
}
