//! ZIMO decoder sound bank (`.zpp`) container
//!
//! A sound bank is the binary resource dump produced by the decoder
//! programming tool. After a fixed 128-byte outer header it carries:
//!
//! - a 255-entry file directory (`{type_tag, offset:u24 BE}` per clip index),
//! - big-endian anchor pointers to the engine-scheme and tap-changer tables,
//! - several fixed-address classification runs (function map, special
//!   sounds, periodic sounds) relative to a `base` that floats with the
//!   embedded project-name length,
//! - the audio clips themselves (flags byte, three u24 LE offsets, raw PCM,
//!   then a length-prefixed Latin-1 display name).
//!
//! Data fields are little-endian; table-offset pointers are big-endian.
//! The two conventions are never interchangeable.
//!
//! Parsing is a single read-only pass over the in-memory image: the five
//! classification tables are decoded into a [`RoleMap`], the directory is
//! decoded into a [`ClipArena`] with offset-based dedup (several directory
//! indices may alias one physical clip), and the steam/diesel engine scheme
//! is expanded into per-index engine roles.

mod cursor;
mod engine;
mod reader;
mod tables;
mod types;

pub use cursor::BankCursor;
pub use engine::{EngineScheme, SpeedLevel, SteamLevel};
pub use reader::{BankSummary, ClipSummary, SoundBank};
pub use tables::{
    EngineRole, FunctionRole, PeriodicRole, RoleMap, RoleRecord, SpecialRole, TapChangeRole,
};
pub use types::{
    ClipArena, ClipId, ClipKind, ClipRecord, SampleRate, StageKind, volume_percent,
};

/// Size of the outer container header stripped before any offset math.
pub const OUTER_HEADER: usize = 0x80;

/// Offset of the project-name length byte (relative to the stripped image).
pub(crate) const PROJECT_NAME_LEN_OFFSET: usize = 0xA00;

/// Anchor slots for the steam engine-scheme table (3 x u16 BE).
pub(crate) const STEAM_ANCHORS: usize = 0x800;
/// Anchor slots for the diesel engine-scheme table (3 x u16 BE).
pub(crate) const DIESEL_ANCHORS: usize = 0x840;
/// Anchor slots for the tap-changer table (3 x u16 BE).
pub(crate) const TAP_ANCHORS: usize = 0x920;
/// Anchor slots per table family (alternate decoder-chip profiles).
pub(crate) const ANCHOR_SLOTS: usize = 3;

/// Function-map runs, relative to `base`: `(offset, first function id, count)`.
pub(crate) const FUNCTION_RUNS: [(usize, u8, usize); 3] = [
    (0x239, 0, 1),   // F0
    (0x200, 1, 19),  // F1 - F19
    (0x2A0, 20, 9),  // F20 - F28
];

/// Periodic-sound flags run (8 x `{clip, volume, flags}`), relative to `base`.
pub(crate) const PERIODIC_FLAGS_RUN: usize = 0x2E7;
/// Periodic-sound thresholds run (8 x `{min, max, duration}`), relative to `base`.
pub(crate) const PERIODIC_THRESHOLDS_RUN: usize = 0x13A;
/// Periodic slots per bank.
pub(crate) const PERIODIC_SLOTS: usize = 8;

/// Special-sound run (16 x `{clip, volume}`), relative to `base`.
pub(crate) const SPECIAL_RUN: usize = 0x23C;
/// Special-sound slots per bank.
pub(crate) const SPECIAL_SLOTS: usize = 16;

/// Number of directory entries (clip indices `1..=255`).
pub(crate) const DIRECTORY_ENTRIES: usize = 255;
