use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::engine::{Engine, Presentation};
use crate::error::StoreError;
use crate::paths::{CaptureFormat, SlotPaths};
use crate::slot::{Slot, SlotIndex};

/// Outcome of one rename in [`SnapshotStore::exchange`].
#[derive(Debug)]
pub enum ExchangeStep {
    /// Source and destination were the same slot.
    Skipped,
    Done,
    Failed(io::Error),
}

impl ExchangeStep {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Per-step result of a backup-and-exchange.
#[derive(Debug)]
pub struct ExchangeReport {
    /// `to` moved into `backup`.
    pub backup: ExchangeStep,
    /// `from` moved into `to`.
    pub promote: ExchangeStep,
}

impl ExchangeReport {
    pub fn is_clean(&self) -> bool {
        !self.backup.is_failed() && !self.promote.is_failed()
    }
}

/// Log a status line to the console and hand it to the presentation.
pub(crate) fn announce(ui: &mut dyn Presentation, text: &str) {
    info!("{text}");
    ui.set_status_message(text);
}

fn rename_step(src: &Path, dst: &Path, what: &str) -> ExchangeStep {
    match std::fs::rename(src, dst) {
        Ok(()) => ExchangeStep::Done,
        Err(e) => {
            if e.kind() == io::ErrorKind::NotFound {
                info!("savestate backup: {what}: {} does not exist", src.display());
            } else {
                warn!(
                    "savestate backup: {what} {} to {}: {e}",
                    src.display(),
                    dst.display()
                );
            }
            ExchangeStep::Failed(e)
        }
    }
}

/// Savestate slots of one game plus its battery and screenshot files.
#[derive(Clone, Debug)]
pub struct SnapshotStore {
    paths: SlotPaths,
    capture_format: CaptureFormat,
}

impl SnapshotStore {
    /// Creates the home fallback directory when some file kind has no
    /// dedicated root. A failure is logged; later writes report it again.
    pub fn new(paths: SlotPaths, capture_format: CaptureFormat) -> Self {
        if let Err(e) = paths.create_home_subdir() {
            warn!(
                "can't create {}: {e}",
                paths.home_subdir().unwrap_or_default().display()
            );
        }
        Self {
            paths,
            capture_format,
        }
    }

    pub fn paths(&self) -> &SlotPaths {
        &self.paths
    }

    pub fn capture_format(&self) -> CaptureFormat {
        self.capture_format
    }

    pub fn state_path(&self, slot: Slot) -> PathBuf {
        self.paths.state(slot)
    }

    /// Serialize the engine into `slot`, overwriting whatever was there.
    pub fn write_slot(
        &self,
        engine: &mut dyn Engine,
        ui: &mut dyn Presentation,
        slot: Slot,
    ) -> Result<PathBuf, StoreError> {
        let path = self.paths.state(slot);
        let result = engine.write_state(&path);

        let outcome = match result {
            Ok(()) => {
                match slot {
                    Slot::LoadBackup => announce(
                        ui,
                        &format!("Current state backed up to {}", slot.file_number()),
                    ),
                    Slot::Scratch => {}
                    Slot::Ordinary(_) | Slot::SaveBackup => {
                        announce(ui, &format!("Wrote state {}", slot.file_number()))
                    }
                }
                Ok(path)
            }
            Err(source) => {
                let err = StoreError::WriteState { slot, path, source };
                warn!("{err}");
                if slot != Slot::Scratch {
                    announce(ui, &format!("Failed to write state {}", slot.file_number()));
                }
                Err(err)
            }
        };

        ui.draw_screen();
        outcome
    }

    /// Restore the engine from `slot`.
    pub fn read_slot(
        &self,
        engine: &mut dyn Engine,
        ui: &mut dyn Presentation,
        slot: Slot,
    ) -> Result<(), StoreError> {
        let path = self.paths.state(slot);
        let outcome = match engine.read_state(&path) {
            Ok(()) => {
                let text = match slot {
                    Slot::LoadBackup => "Last load UNDONE".to_string(),
                    Slot::SaveBackup => "Last save UNDONE".to_string(),
                    _ => format!("Loaded state {}", slot.file_number()),
                };
                announce(ui, &text);
                Ok(())
            }
            Err(source) => {
                let err = StoreError::ReadState { slot, path, source };
                warn!("{err}");
                let text = match slot {
                    Slot::LoadBackup => "Cannot undo last load".to_string(),
                    Slot::SaveBackup => "Cannot undo last save".to_string(),
                    _ => format!("Failed to load state {}", slot.file_number()),
                };
                announce(ui, &text);
                Err(err)
            }
        };

        ui.draw_screen();
        outcome
    }

    /// Move `to` into `backup`, then `from` into `to`.
    ///
    /// Renames between identical slots are skipped. The steps are best
    /// effort: a failed first rename does not stop the second one, and
    /// nothing is rolled back.
    pub fn exchange(&self, from: Slot, to: Slot, backup: Slot) -> ExchangeReport {
        let from_path = self.paths.state(from);
        let to_path = self.paths.state(to);
        let backup_path = self.paths.state(backup);

        let backup_step = if to != backup {
            rename_step(&to_path, &backup_path, "can't backup old state")
        } else {
            ExchangeStep::Skipped
        };

        let promote_step = if to != from {
            rename_step(&from_path, &to_path, "can't move new state")
        } else {
            ExchangeStep::Skipped
        };

        info!(
            "Savestate store and backup committed to slot {}, backup in {}, using temporary slot {}",
            to.file_number(),
            backup.file_number(),
            from.file_number()
        );

        ExchangeReport {
            backup: backup_step,
            promote: promote_step,
        }
    }

    /// Save into `slot`, keeping its previous contents in
    /// [`Slot::SaveBackup`].
    ///
    /// The new state is staged in [`Slot::Scratch`] first; the old slot
    /// contents are moved aside before the staged file is promoted. If
    /// staging fails nothing is renamed.
    pub fn save_with_backup(
        &self,
        engine: &mut dyn Engine,
        ui: &mut dyn Presentation,
        slot: SlotIndex,
    ) -> Result<ExchangeReport, StoreError> {
        let target = Slot::Ordinary(slot);
        if let Err(e) = self.write_slot(engine, ui, Slot::Scratch) {
            announce(ui, &format!("Failed to save state {}", target.file_number()));
            return Err(e);
        }

        let report = self.exchange(Slot::Scratch, target, Slot::SaveBackup);
        if report.promote.is_done() {
            announce(ui, &format!("Wrote state {}", target.file_number()));
        } else {
            announce(ui, &format!("Failed to save state {}", target.file_number()));
        }
        Ok(report)
    }

    /// Load `slot`, keeping the live state in [`Slot::LoadBackup`] first.
    ///
    /// The load is attempted even when the backup could not be written.
    pub fn load_with_backup(
        &self,
        engine: &mut dyn Engine,
        ui: &mut dyn Presentation,
        slot: SlotIndex,
    ) -> Result<(), StoreError> {
        if let Err(e) = self.write_slot(engine, ui, Slot::LoadBackup) {
            debug!("continuing load without backup: {e}");
        }
        self.read_slot(engine, ui, Slot::Ordinary(slot))
    }

    /// Return to the state captured right before the last load.
    pub fn undo_load(
        &self,
        engine: &mut dyn Engine,
        ui: &mut dyn Presentation,
    ) -> Result<(), StoreError> {
        self.read_slot(engine, ui, Slot::LoadBackup)
    }

    /// Load whatever the last save overwrote.
    pub fn undo_save(
        &self,
        engine: &mut dyn Engine,
        ui: &mut dyn Presentation,
    ) -> Result<(), StoreError> {
        self.read_slot(engine, ui, Slot::SaveBackup)
    }

    pub fn write_battery(
        &self,
        engine: &mut dyn Engine,
        ui: &mut dyn Presentation,
    ) -> Result<(), StoreError> {
        let path = self.paths.battery();
        match engine.write_battery(&path) {
            Ok(()) => {
                announce(ui, "Wrote battery");
                Ok(())
            }
            Err(source) => {
                let err = StoreError::Battery { path, source };
                warn!("{err}");
                Err(err)
            }
        }
    }

    /// A missing battery file is normal for a game that never saved, so
    /// only other failures are logged as warnings.
    pub fn read_battery(
        &self,
        engine: &mut dyn Engine,
        ui: &mut dyn Presentation,
    ) -> Result<(), StoreError> {
        let path = self.paths.battery();
        match engine.read_battery(&path) {
            Ok(()) => {
                announce(ui, "Loaded battery");
                Ok(())
            }
            Err(source) => {
                if source.kind() == io::ErrorKind::NotFound {
                    debug!("no battery file at {}", path.display());
                } else {
                    warn!("battery load from {} failed: {source}", path.display());
                }
                Err(StoreError::Battery { path, source })
            }
        }
    }

    pub fn capture_screen(
        &self,
        engine: &mut dyn Engine,
        ui: &mut dyn Presentation,
        index: u32,
    ) -> Result<PathBuf, StoreError> {
        let path = self.paths.screenshot(index, self.capture_format);
        match engine.write_screenshot(&path, self.capture_format) {
            Ok(()) => {
                announce(ui, "Screen capture");
                Ok(path)
            }
            Err(source) => {
                let err = StoreError::Screenshot { path, source };
                warn!("{err}");
                Err(err)
            }
        }
    }
}
