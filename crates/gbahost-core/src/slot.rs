use std::fmt;

/// Number of user-addressable savestate slots.
pub const ORDINARY_SLOTS: u8 = 8;

/// Savestate location.
///
/// Ordinary slots are numbered `0..=7` internally and shown to the user as
/// 1..8. The reserved variants are never user-addressable: `LoadBackup` holds
/// the live state captured right before a load, `SaveBackup` holds whatever a
/// save overwrote, and `Scratch` is the staging location a new save is
/// written to before it is promoted into its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    Ordinary(SlotIndex),
    LoadBackup,
    SaveBackup,
    Scratch,
}

/// Index of an ordinary slot, always within `0..ORDINARY_SLOTS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotIndex(u8);

impl SlotIndex {
    pub const FIRST: SlotIndex = SlotIndex(0);
    pub const LAST: SlotIndex = SlotIndex(ORDINARY_SLOTS - 1);

    pub const fn new(index: u8) -> Option<Self> {
        if index < ORDINARY_SLOTS {
            Some(Self(index))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub fn prev(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }

    pub fn next(self) -> Option<Self> {
        Self::new(self.0 + 1)
    }
}

impl Default for SlotIndex {
    fn default() -> Self {
        Self::FIRST
    }
}

impl Slot {
    pub const fn ordinary(index: u8) -> Option<Self> {
        match SlotIndex::new(index) {
            Some(i) => Some(Slot::Ordinary(i)),
            None => None,
        }
    }

    /// Number rendered into the savestate file name.
    ///
    /// This is the legacy 0-based index plus one, with the reserved slots
    /// sitting right after the ordinary range (`LoadBackup` = 9,
    /// `SaveBackup` = 10) and `Scratch` at 0.
    pub const fn file_number(self) -> u8 {
        match self {
            Slot::Ordinary(i) => i.0 + 1,
            Slot::LoadBackup => ORDINARY_SLOTS + 1,
            Slot::SaveBackup => ORDINARY_SLOTS + 2,
            Slot::Scratch => 0,
        }
    }

    pub const fn is_reserved(self) -> bool {
        !matches!(self, Slot::Ordinary(_))
    }

    pub fn all_ordinary() -> impl Iterator<Item = Slot> {
        (0..ORDINARY_SLOTS).map(|i| Slot::Ordinary(SlotIndex(i)))
    }
}

impl From<SlotIndex> for Slot {
    fn from(index: SlotIndex) -> Self {
        Slot::Ordinary(index)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Ordinary(i) => write!(f, "slot {}", i.0 + 1),
            Slot::LoadBackup => f.write_str("load backup"),
            Slot::SaveBackup => f.write_str("save backup"),
            Slot::Scratch => f.write_str("scratch"),
        }
    }
}
