//! Classification table decoders
//!
//! Five independent tables assign semantic roles to clip indices: the
//! function map, the special-sound map, the periodic-sound map, the
//! tap-changer list, and the engine scheme (decoded in
//! [`engine`](super::engine) and synthesized into [`RoleRecord::Engine`]
//! entries). Each table reads a disjoint byte range of the image and
//! contributes records to one shared [`RoleMap`].
//!
//! Decoding policy: a zero value in any record slot means "unassigned" and
//! is skipped, never an error. A truncated run aborts that run only, with a
//! warning naming the offending offset.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use super::cursor::BankCursor;
use super::types::{ClipKind, StageKind, volume_percent};
use super::{ANCHOR_SLOTS, PERIODIC_SLOTS, SPECIAL_SLOTS};

/// A function-trigger assignment (`F0`..`F28`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionRole {
    /// Function id the clip is triggered by.
    pub function_id: u8,
    /// Playback volume in percent.
    pub volume: u8,
    /// The clip loops while the function is held (flag 0x08).
    pub looped: bool,
}

/// A special-effect assignment, one slot per [`ClipKind`] special.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecialRole {
    /// The special-sound kind this slot position stands for.
    pub kind: ClipKind,
    /// Playback volume in percent.
    pub volume: u8,
}

/// A periodic random-effect assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodicRole {
    /// Slot position in the periodic table.
    pub slot: u8,
    /// Playback volume in percent.
    pub volume: u8,
    /// Effect plays while the vehicle is moving (flag 0x40).
    pub while_moving: bool,
    /// Effect plays while the vehicle is stopped (flag 0x08).
    pub while_stopped: bool,
    /// Minimum delay between triggers, seconds.
    pub min_delay_s: u8,
    /// Maximum delay between triggers, seconds.
    pub max_delay_s: u8,
    /// Playback duration, seconds.
    pub duration_s: u8,
}

/// A tap-changer step assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TapChangeRole {
    /// Tap step number (position in the tap-changer list).
    pub step: u8,
}

/// An engine-sound stage assignment synthesized from the engine scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineRole {
    /// Playback stage.
    pub stage: StageKind,
    /// Minimum speed in percent; 0 and negative sentinels pass through
    /// from the scheme unscaled.
    pub speed: i16,
    /// Chuff period in milliseconds: 0 = threshold-triggered, -1 =
    /// aperiodic/driven, positive = fixed period.
    pub period_ms: i32,
    /// Chuff phase slot (steam fan-out), 0 for diesel stages.
    pub chuff: u8,
    /// Playback volume in percent.
    pub volume: u8,
}

/// A semantic role assignment pointing at a clip index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RoleRecord {
    Function(FunctionRole),
    Special(SpecialRole),
    Periodic(PeriodicRole),
    TapChange(TapChangeRole),
    Engine(EngineRole),
}

/// All role assignments discovered across the classification tables,
/// keyed by directory clip index.
///
/// A clip index may own zero, one, or many roles simultaneously; roles
/// referencing indices with no directory entry are simply never resolved.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RoleMap {
    roles: BTreeMap<u8, Vec<RoleRecord>>,
}

impl RoleMap {
    /// Record a role for a clip index. Index 0 is the "unassigned" sentinel
    /// and is silently dropped.
    pub(crate) fn push(&mut self, index: u8, role: RoleRecord) {
        if index == 0 {
            return;
        }
        self.roles.entry(index).or_default().push(role);
    }

    /// Roles recorded for a clip index.
    pub fn get(&self, index: u8) -> &[RoleRecord] {
        self.roles.get(&index).map_or(&[], Vec::as_slice)
    }

    /// All `(index, roles)` pairs in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &[RoleRecord])> {
        self.roles.iter().map(|(&idx, v)| (idx, v.as_slice()))
    }

    /// Total number of role records.
    pub fn role_count(&self) -> usize {
        self.roles.values().map(Vec::len).sum()
    }
}

/// Select the active table pointer for one anchor family: the first
/// non-zero big-endian u16 among the three slots. The format supports one
/// active scheme per family, so extra populated slots are only reported.
pub(crate) fn select_anchor(cur: &BankCursor, anchors: usize, family: &str) -> Option<usize> {
    let mut selected = None;
    for slot in 0..ANCHOR_SLOTS {
        let ptr = match cur.u16_be_at(anchors + 2 * slot) {
            Ok(ptr) => ptr,
            Err(err) => {
                warn!("{family} anchor slot {slot} unreadable: {err}");
                break;
            }
        };
        if ptr == 0 {
            continue;
        }
        if selected.is_none() {
            selected = Some(usize::from(ptr));
        } else {
            warn!("secondary {family} anchor slot {slot} populated, ignoring {ptr:#x}");
        }
    }
    selected
}

/// Decode one contiguous function-map run of 3-byte `{clip, volume, flags}`
/// records covering function ids `base_fn..base_fn + count`.
pub(crate) fn decode_function_run(
    cur: &BankCursor,
    map: &mut RoleMap,
    offset: usize,
    base_fn: u8,
    count: usize,
) {
    for i in 0..count {
        let addr = offset + 3 * i;
        let Ok(rec) = cur.bytes_at(addr, 3) else {
            warn!("function map truncated at {addr:#x}");
            return;
        };
        if rec[0] == 0 {
            continue;
        }
        map.push(
            rec[0],
            RoleRecord::Function(FunctionRole {
                function_id: base_fn + i as u8,
                volume: volume_percent(rec[1]),
                looped: rec[2] & 0x08 != 0,
            }),
        );
    }
}

/// Decode the special-sound run of 2-byte `{clip, volume}` records; slot
/// position selects the special kind.
pub(crate) fn decode_special_run(cur: &BankCursor, map: &mut RoleMap, offset: usize) {
    for i in 0..SPECIAL_SLOTS {
        let addr = offset + 2 * i;
        let Ok(rec) = cur.bytes_at(addr, 2) else {
            warn!("special-sound table truncated at {addr:#x}");
            return;
        };
        if rec[0] == 0 {
            continue;
        }
        map.push(
            rec[0],
            RoleRecord::Special(SpecialRole {
                kind: ClipKind::from_tag(0x80 + i as u8),
                volume: volume_percent(rec[1]),
            }),
        );
    }
}

/// Decode the two parallel periodic runs, joined positionally: the flags
/// run gives `{clip, volume, flags}`, the thresholds run gives
/// `{min, max, duration}` at the same slot.
pub(crate) fn decode_periodic_runs(
    cur: &BankCursor,
    map: &mut RoleMap,
    flags_offset: usize,
    thresholds_offset: usize,
) {
    for i in 0..PERIODIC_SLOTS {
        let addr = flags_offset + 3 * i;
        let addr2 = thresholds_offset + 3 * i;
        let (Ok(rec), Ok(thresholds)) = (cur.bytes_at(addr, 3), cur.bytes_at(addr2, 3)) else {
            warn!("periodic table truncated at slot {i}");
            return;
        };
        if rec[0] == 0 {
            continue;
        }
        let flags = rec[2];
        // Both activity bits set cancel each other out in this format.
        let both = flags & 0x48 == 0x48;
        map.push(
            rec[0],
            RoleRecord::Periodic(PeriodicRole {
                slot: i as u8,
                volume: volume_percent(rec[1]),
                while_moving: !both && flags & 0x40 != 0,
                while_stopped: !both && flags & 0x08 != 0,
                min_delay_s: thresholds[0],
                max_delay_s: thresholds[1],
                duration_s: thresholds[2],
            }),
        );
    }
}

/// Decode the tap-changer list: a length byte, five reserved bytes, then
/// one clip index per tap step.
pub(crate) fn decode_tap_run(cur: &BankCursor, map: &mut RoleMap, offset: usize) {
    let Ok(len) = cur.u8_at(offset) else {
        warn!("tap-changer table unreadable at {offset:#x}");
        return;
    };
    let list = offset + 6;
    for step in 0..len {
        let Ok(idx) = cur.u8_at(list + usize::from(step)) else {
            warn!("tap-changer list truncated at step {step}");
            return;
        };
        map.push(idx, RoleRecord::TapChange(TapChangeRole { step }));
    }
}
