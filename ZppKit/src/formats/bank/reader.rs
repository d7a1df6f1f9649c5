//! Sound bank parsing
//!
//! [`SoundBank::parse`] performs the single decode pass: strip the outer
//! header, locate the floating table base, decode the engine scheme and the
//! classification tables into a [`RoleMap`], then walk the file directory
//! into a [`ClipArena`] with offset dedup. The input buffer is immutable;
//! everything returned is derived state.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::cursor::BankCursor;
use super::engine::{EngineScheme, parse_diesel, parse_steam};
use super::tables::{
    RoleMap, RoleRecord, decode_function_run, decode_periodic_runs, decode_special_run,
    decode_tap_run, select_anchor,
};
use super::types::{ClipArena, ClipKind, ClipRecord, SampleRate};
use super::{
    DIESEL_ANCHORS, DIRECTORY_ENTRIES, FUNCTION_RUNS, OUTER_HEADER, PERIODIC_FLAGS_RUN,
    PERIODIC_THRESHOLDS_RUN, PROJECT_NAME_LEN_OFFSET, SPECIAL_RUN, STEAM_ANCHORS, TAP_ANCHORS,
};

/// A fully decoded sound bank.
#[derive(Debug, Clone)]
pub struct SoundBank {
    /// Project name embedded by the programming tool, if any.
    pub project_name: Option<String>,
    /// Physical clips with the directory index map.
    pub clips: ClipArena,
    /// All role assignments, keyed by directory index.
    pub roles: RoleMap,
    /// The engine scheme, when either anchor family is populated.
    pub scheme: Option<EngineScheme>,
}

impl SoundBank {
    /// Read and parse a `.zpp` bank from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read(path)?;
        Self::parse(&raw)
    }

    /// Parse a bank from the raw file bytes (outer header included).
    pub fn parse(raw: &[u8]) -> Result<Self> {
        // The fixed layout reaches up to the project-name length byte;
        // anything shorter cannot be a bank at all.
        let needed = OUTER_HEADER + PROJECT_NAME_LEN_OFFSET + 1;
        if raw.len() < needed {
            return Err(Error::BankTooSmall {
                size: raw.len(),
                needed,
            });
        }
        let data = &raw[OUTER_HEADER..];
        let cur = BankCursor::new(data);

        let name_len = usize::from(cur.u8_at(PROJECT_NAME_LEN_OFFSET)?);
        let base = PROJECT_NAME_LEN_OFFSET + name_len + 1;
        let project_name = cur
            .bytes_at(PROJECT_NAME_LEN_OFFSET + 1, name_len)
            .ok()
            .map(latin1)
            .filter(|name| !name.is_empty());

        let scheme = decode_scheme(&cur);

        let mut roles = RoleMap::default();
        for (run, base_fn, count) in FUNCTION_RUNS {
            decode_function_run(&cur, &mut roles, base + run, base_fn, count);
        }
        decode_periodic_runs(
            &cur,
            &mut roles,
            base + PERIODIC_FLAGS_RUN,
            base + PERIODIC_THRESHOLDS_RUN,
        );
        decode_special_run(&cur, &mut roles, base + SPECIAL_RUN);
        if let Some(ptr) = select_anchor(&cur, TAP_ANCHORS, "tap-changer") {
            decode_tap_run(&cur, &mut roles, ptr);
        }
        if let Some(scheme) = &scheme {
            scheme.synthesize(&mut roles);
        }

        let clips = decode_directory(&cur);

        Ok(Self {
            project_name,
            clips,
            roles,
            scheme,
        })
    }

    /// The directory-derived `index -> absolute offset` mapping, ascending,
    /// non-zero entries only.
    pub fn directory(&self) -> impl Iterator<Item = (u8, usize)> + '_ {
        self.clips
            .indices()
            .map(|(idx, id)| (idx, self.clips.get(id).offset))
    }

    /// Serializable summary of the decoded bank.
    pub fn summary(&self) -> BankSummary {
        let clips = self
            .clips
            .indices()
            .map(|(index, id)| {
                let clip = self.clips.get(id);
                ClipSummary {
                    index,
                    offset: clip.offset,
                    bytes: clip.data.len(),
                    sample_rate_hz: clip.sample_rate.hz(),
                    bits: clip.bits(),
                    kind: clip.kind.label(),
                    name: clip.embedded_name.clone(),
                    looped: clip.loop_region.is_some(),
                    roles: self.roles.get(index).to_vec(),
                }
            })
            .collect();
        BankSummary {
            project_name: self.project_name.clone(),
            scheme: self.scheme.as_ref().map(EngineScheme::name),
            clip_count: self.clips.len(),
            role_count: self.roles.role_count(),
            clips,
        }
    }
}

/// Serializable overview of a decoded bank, one entry per directory index.
#[derive(Debug, Clone, Serialize)]
pub struct BankSummary {
    pub project_name: Option<String>,
    pub scheme: Option<&'static str>,
    pub clip_count: usize,
    pub role_count: usize,
    pub clips: Vec<ClipSummary>,
}

/// Summary of one directory entry.
#[derive(Debug, Clone, Serialize)]
pub struct ClipSummary {
    pub index: u8,
    pub offset: usize,
    pub bytes: usize,
    pub sample_rate_hz: u32,
    pub bits: u8,
    pub kind: &'static str,
    pub name: Option<String>,
    pub looped: bool,
    pub roles: Vec<RoleRecord>,
}

/// Decode the engine scheme. Steam and diesel are logically exclusive;
/// when both anchor families are populated the diesel scheme wins, with a
/// warning so the inconsistency is visible.
fn decode_scheme(cur: &BankCursor) -> Option<EngineScheme> {
    let mut scheme = None;
    if let Some(ptr) = select_anchor(cur, STEAM_ANCHORS, "steam") {
        match parse_steam(cur, ptr) {
            Ok(steam) => scheme = Some(steam),
            Err(err) => warn!("steam scheme at {ptr:#x} unreadable: {err}"),
        }
    }
    if let Some(ptr) = select_anchor(cur, DIESEL_ANCHORS, "diesel") {
        if scheme.is_some() {
            warn!("both steam and diesel schemes populated, diesel takes precedence");
        }
        match parse_diesel(cur, ptr) {
            Ok(diesel) => scheme = Some(diesel),
            Err(err) => warn!("diesel scheme at {ptr:#x} unreadable: {err}"),
        }
    }
    scheme
}

/// Walk the file directory, decoding each referenced clip once and
/// aliasing repeated offsets to the already-built record.
fn decode_directory(cur: &BankCursor) -> ClipArena {
    let mut clips = ClipArena::default();
    for entry in 0..DIRECTORY_ENTRIES {
        let index = (entry + 1) as u8;
        let addr = entry * 4;
        let (Ok(tag), Ok(offset)) = (cur.u8_at(addr), cur.u24_be_at(addr + 1)) else {
            // Unreachable with the minimum-size guard in place.
            warn!("directory truncated at entry {index}");
            break;
        };
        let offset = offset as usize;
        if offset == 0 {
            continue;
        }
        if let Some(id) = clips.id_at_offset(offset) {
            debug!("index {index} aliases clip at {offset:#x}");
            clips.alias(index, id);
            continue;
        }
        match decode_clip(cur, offset, ClipKind::from_tag(tag)) {
            Ok(clip) => {
                clips.insert(index, clip);
            }
            Err(err) => warn!("skipping clip {index} at {offset:#x}: {err}"),
        }
    }
    clips
}

/// Decode one clip header and its sample data at `offset`.
fn decode_clip(cur: &BankCursor, offset: usize, kind: ClipKind) -> Result<ClipRecord> {
    let flags = cur.u8_at(offset)?;
    let data_end = cur.u24_le_at(offset + 1)? as usize;
    let loop_start = cur.u24_le_at(offset + 4)? as usize;
    let loop_end = cur.u24_le_at(offset + 7)? as usize;
    let data_offset = offset + 10;

    let sample_width: u8 = if flags & 0x80 != 0 { 2 } else { 1 };
    let sample_rate = SampleRate::from_flags(flags);

    // The last sample straddles data_end, so the data region runs one
    // sample width past it.
    let end = data_end + usize::from(sample_width);
    if end < data_offset {
        return Err(Error::InvalidClipRegion { offset, data_end });
    }
    let data = cur.bytes_at(data_offset, end - data_offset)?.to_vec();

    let embedded_name = read_embedded_name(cur, end + 2);
    let loop_region = normalize_loop(loop_start, loop_end, data_offset, data.len(), sample_width);

    Ok(ClipRecord {
        offset,
        data,
        sample_rate,
        sample_width,
        kind,
        embedded_name,
        loop_region,
    })
}

/// Read the length-prefixed Latin-1 display name trailing the sample data.
/// A missing or truncated name is absence, not an error.
fn read_embedded_name(cur: &BankCursor, offset: usize) -> Option<String> {
    let len = usize::from(cur.u8_at(offset).ok()?);
    if len == 0 {
        return None;
    }
    let bytes = cur.bytes_at(offset + 1, len).ok()?;
    let name: String = latin1(bytes).trim_end_matches('\0').to_string();
    (!name.is_empty()).then_some(name)
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Convert the absolute loop markers to a clip-relative region. Zeroed
/// markers, regions outside the data, inverted regions, and full-span
/// regions all mean "no loop region".
fn normalize_loop(
    start_abs: usize,
    end_abs: usize,
    data_offset: usize,
    len: usize,
    sample_width: u8,
) -> Option<(usize, usize)> {
    let start = start_abs.checked_sub(data_offset)?;
    let end = end_abs.checked_sub(data_offset)?;
    if start >= end || end > len {
        return None;
    }
    if start == 0 && end >= len.saturating_sub(usize::from(sample_width)) {
        return None;
    }
    Some((start, end))
}
