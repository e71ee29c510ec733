mod common;

use std::fs;
use std::path::Path;

use common::{BlobEngine, RecordingUi, read, store_in};
use gbahost_core::error::StoreError;
use gbahost_core::paths::{CaptureFormat, HOME_SUBDIR, SlotPaths, StorageRoots};
use gbahost_core::slot::{Slot, SlotIndex};
use gbahost_core::store::{ExchangeStep, SnapshotStore};
use tempfile::tempdir;

fn slot(n: u8) -> Slot {
    Slot::ordinary(n).unwrap()
}

#[test]
fn state_files_use_one_based_names() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    assert_eq!(store.state_path(slot(0)), dir.path().join("game1.sgm"));
    assert_eq!(store.state_path(slot(7)), dir.path().join("game8.sgm"));
    assert_eq!(store.state_path(Slot::LoadBackup), dir.path().join("game9.sgm"));
    assert_eq!(store.state_path(Slot::SaveBackup), dir.path().join("game10.sgm"));
    assert_eq!(store.state_path(Slot::Scratch), dir.path().join("game0.sgm"));
}

#[test]
fn write_then_read_slot() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let mut engine = BlobEngine::with_state(b"live");
    let mut ui = RecordingUi::default();

    let path = store.write_slot(&mut engine, &mut ui, slot(2)).unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"live");
    assert_eq!(ui.messages, vec!["Wrote state 3"]);

    engine.state = b"other".to_vec();
    store.read_slot(&mut engine, &mut ui, slot(2)).unwrap();
    assert_eq!(engine.state, b"live");
    assert_eq!(ui.messages.last().unwrap(), "Loaded state 3");
    assert_eq!(ui.draws, 2);
}

#[test]
fn exchange_rotates_three_distinct_slots() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let (from, to, backup) = (slot(0), slot(1), slot(2));
    fs::write(store.state_path(from), b"new").unwrap();
    fs::write(store.state_path(to), b"old").unwrap();
    fs::write(store.state_path(backup), b"stale").unwrap();

    let report = store.exchange(from, to, backup);

    assert!(report.is_clean());
    assert_eq!(read(store.state_path(backup)).as_deref(), Some(&b"old"[..]));
    assert_eq!(read(store.state_path(to)).as_deref(), Some(&b"new"[..]));
    assert!(!store.state_path(from).exists());
}

#[test]
fn exchange_with_identical_slots_touches_nothing() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let k = slot(4);
    fs::write(store.state_path(k), b"keep").unwrap();

    let report = store.exchange(k, k, k);

    assert!(matches!(report.backup, ExchangeStep::Skipped));
    assert!(matches!(report.promote, ExchangeStep::Skipped));
    assert_eq!(read(store.state_path(k)).as_deref(), Some(&b"keep"[..]));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn exchange_continues_after_failed_backup_step() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    // Nothing in the destination yet: the first rename fails, the second
    // must still run.
    fs::write(store.state_path(Slot::Scratch), b"fresh").unwrap();

    let report = store.exchange(Slot::Scratch, slot(3), Slot::SaveBackup);

    match &report.backup {
        ExchangeStep::Failed(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
        other => panic!("expected failed backup step, got {other:?}"),
    }
    assert!(report.promote.is_done());
    assert_eq!(read(store.state_path(slot(3))).as_deref(), Some(&b"fresh"[..]));
    assert!(!store.state_path(Slot::SaveBackup).exists());
}

#[test]
fn exchange_reports_failed_promotion() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    fs::write(store.state_path(slot(1)), b"old").unwrap();

    let report = store.exchange(Slot::Scratch, slot(1), Slot::SaveBackup);

    assert!(report.backup.is_done());
    assert!(report.promote.is_failed());
    assert!(!report.is_clean());
    assert_eq!(read(store.state_path(Slot::SaveBackup)).as_deref(), Some(&b"old"[..]));
}

#[test]
fn save_with_backup_keeps_previous_contents() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let target = SlotIndex::new(2).unwrap();
    fs::write(store.state_path(Slot::Ordinary(target)), b"A").unwrap();

    let mut engine = BlobEngine::with_state(b"B");
    let mut ui = RecordingUi::default();
    let report = store.save_with_backup(&mut engine, &mut ui, target).unwrap();

    assert!(report.is_clean());
    assert_eq!(read(store.state_path(Slot::Ordinary(target))).as_deref(), Some(&b"B"[..]));
    assert_eq!(read(store.state_path(Slot::SaveBackup)).as_deref(), Some(&b"A"[..]));
    assert!(!store.state_path(Slot::Scratch).exists());
    assert_eq!(ui.messages, vec!["Wrote state 3"]);

    // Undoing the save brings A back into the engine.
    store.undo_save(&mut engine, &mut ui).unwrap();
    assert_eq!(engine.state, b"A");
    assert_eq!(ui.messages.last().unwrap(), "Last save UNDONE");
}

#[test]
fn failed_staging_leaves_slot_untouched() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let target = SlotIndex::new(0).unwrap();
    fs::write(store.state_path(Slot::Ordinary(target)), b"A").unwrap();

    let mut engine = BlobEngine::with_state(b"B");
    engine.fail_writes = true;
    let mut ui = RecordingUi::default();
    let err = store.save_with_backup(&mut engine, &mut ui, target).unwrap_err();

    assert!(matches!(err, StoreError::WriteState { slot: Slot::Scratch, .. }));
    assert_eq!(read(store.state_path(Slot::Ordinary(target))).as_deref(), Some(&b"A"[..]));
    assert!(!store.state_path(Slot::SaveBackup).exists());
    assert_eq!(ui.messages, vec!["Failed to save state 1"]);
}

#[test]
fn load_with_backup_allows_undo() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let target = SlotIndex::new(5).unwrap();
    fs::write(store.state_path(Slot::Ordinary(target)), b"saved").unwrap();

    let mut engine = BlobEngine::with_state(b"live");
    let mut ui = RecordingUi::default();
    store.load_with_backup(&mut engine, &mut ui, target).unwrap();
    assert_eq!(engine.state, b"saved");
    assert_eq!(read(store.state_path(Slot::LoadBackup)).as_deref(), Some(&b"live"[..]));
    assert_eq!(
        ui.messages,
        vec!["Current state backed up to 9", "Loaded state 6"]
    );

    store.undo_load(&mut engine, &mut ui).unwrap();
    assert_eq!(engine.state, b"live");
    assert_eq!(ui.messages.last().unwrap(), "Last load UNDONE");
}

#[test]
fn loading_an_empty_slot_reports_failure() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let mut engine = BlobEngine::with_state(b"live");
    let mut ui = RecordingUi::default();

    let err = store.read_slot(&mut engine, &mut ui, slot(6)).unwrap_err();
    assert!(matches!(err, StoreError::ReadState { .. }));
    assert_eq!(err.path(), store.state_path(slot(6)));
    assert_eq!(engine.state, b"live");
    assert_eq!(ui.messages, vec!["Failed to load state 7"]);
}

#[test]
fn battery_and_screenshot_names() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let mut engine = BlobEngine::with_state(b"");
    engine.battery = b"sram".to_vec();
    let mut ui = RecordingUi::default();

    store.write_battery(&mut engine, &mut ui).unwrap();
    assert_eq!(read(dir.path().join("game.sav")).as_deref(), Some(&b"sram"[..]));

    engine.battery.clear();
    store.read_battery(&mut engine, &mut ui).unwrap();
    assert_eq!(engine.battery, b"sram");

    let shot = store.capture_screen(&mut engine, &mut ui, 3).unwrap();
    assert_eq!(shot, dir.path().join("game03.png"));
    assert_eq!(
        ui.messages,
        vec!["Wrote battery", "Loaded battery", "Screen capture"]
    );
}

#[test]
fn missing_battery_is_quiet() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let mut engine = BlobEngine::with_state(b"");
    let mut ui = RecordingUi::default();

    assert!(store.read_battery(&mut engine, &mut ui).is_err());
    assert!(ui.messages.is_empty());
}

#[test]
fn home_only_roots_get_their_subdirectory_created() {
    let dir = tempdir().unwrap();
    let roots = StorageRoots {
        home_dir: Some(dir.path().to_path_buf()),
        ..StorageRoots::default()
    };
    let store = SnapshotStore::new(
        SlotPaths::for_rom(Path::new("roms/game.gba"), roots),
        CaptureFormat::Png,
    );
    let mut engine = BlobEngine::with_state(b"home");
    let mut ui = RecordingUi::default();

    let report = store
        .save_with_backup(&mut engine, &mut ui, SlotIndex::FIRST)
        .unwrap();
    assert!(report.promote.is_done());

    let saved = dir.path().join(HOME_SUBDIR).join("game1.sgm");
    assert_eq!(read(saved).as_deref(), Some(&b"home"[..]));
    assert_eq!(ui.messages.last().map(String::as_str), Some("Wrote state 1"));

    store.write_battery(&mut engine, &mut ui).unwrap();
    assert!(dir.path().join(HOME_SUBDIR).join("game.sav").exists());
}
