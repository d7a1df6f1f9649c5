//! Engine-scheme parsing and role synthesis
//!
//! A bank carries at most one engine scheme. Steam and diesel are mutually
//! exclusive variants selected by which anchor family is populated; when
//! both are, diesel takes precedence (reported as an inconsistency by the
//! reader, not here).

use serde::Serialize;

use crate::error::Result;

use super::cursor::BankCursor;
use super::tables::{EngineRole, RoleMap, RoleRecord};
use super::types::{StageKind, speed_percent, volume_percent};

/// One steam speed level: three chuff-base clip indices by tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SteamLevel {
    /// Accelerating-tier chuff base index (0 = unassigned).
    pub high_clip: u8,
    /// Steady-tier chuff base index.
    pub mid_clip: u8,
    /// Decelerating-tier chuff base index.
    pub low_clip: u8,
    /// Minimum speed this level applies from.
    pub min_speed: i16,
}

/// One diesel speed level: transition and sustain clip indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeedLevel {
    /// Spin-up transition clip index (0 = unassigned).
    pub on_clip: u8,
    /// Sustained loop clip index.
    pub loop_clip: u8,
    /// Spin-down transition clip index.
    pub off_clip: u8,
    /// Minimum speed this level applies from; the bottom levels use the
    /// sentinels -1 and 0.
    pub min_speed: i16,
}

/// The engine sound scheme of a bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum EngineScheme {
    /// Steam scheme: each level fans out across `chuffs` phase-shifted
    /// clips addressed contiguously from a tier's base index.
    Steam {
        /// Chuff phase count per tier.
        chuffs: u8,
        /// Speed levels, slowest first.
        levels: Vec<SteamLevel>,
    },
    /// Diesel scheme: each level carries ON/LOOP/OFF stage clips.
    Diesel {
        /// Speed levels, slowest first.
        levels: Vec<SpeedLevel>,
    },
}

/// Parse a steam scheme at `offset`: a chuff-count byte, a 0xFF-terminated
/// threshold list (at most 9 entries scanned), then one 3-byte
/// `{high, mid, low}` record per level.
pub(crate) fn parse_steam(cur: &BankCursor, offset: usize) -> Result<EngineScheme> {
    let chuffs = cur.u8_at(offset)?;
    let mut off = offset + 1;
    let thresholds = off;

    let mut count = 0;
    for i in 1..10 {
        if cur.u8_at(off)? == 0xFF {
            count = i;
            break;
        }
        off += 1;
    }
    off += 1;

    let mut levels = Vec::with_capacity(count);
    for i in 0..count {
        let rec = cur.bytes_at(off + 3 * i, 3)?;
        let min_speed = if i == 0 {
            1
        } else {
            i16::from(cur.u8_at(thresholds + i - 1)?)
        };
        levels.push(SteamLevel {
            high_clip: rec[0],
            mid_clip: rec[1],
            low_clip: rec[2],
            min_speed,
        });
    }
    Ok(EngineScheme::Steam { chuffs, levels })
}

/// Parse a diesel scheme at `offset`: a step-count byte, four drive/limit
/// selector bytes (not needed for naming), then `steps + 1` 3-byte
/// `{on, loop, off}` records with their speed thresholds trailing at a
/// fixed distance.
pub(crate) fn parse_diesel(cur: &BankCursor, offset: usize) -> Result<EngineScheme> {
    let steps = usize::from(cur.u8_at(offset)?);
    let table = offset + 5;

    let mut levels = Vec::with_capacity(steps + 1);
    for i in 0..=steps {
        let rec = cur.bytes_at(table + 3 * i, 3)?;
        let min_speed = if i >= 2 {
            i16::from(cur.u8_at(table + 0x22 + 2 * (i - 2))?)
        } else {
            i as i16 - 1
        };
        levels.push(SpeedLevel {
            on_clip: rec[0],
            loop_clip: rec[1],
            off_clip: rec[2],
            min_speed,
        });
    }
    Ok(EngineScheme::Diesel { levels })
}

impl EngineScheme {
    /// Short tag for diagnostics and summaries.
    pub fn name(&self) -> &'static str {
        match self {
            EngineScheme::Steam { .. } => "steam",
            EngineScheme::Diesel { .. } => "diesel",
        }
    }

    /// Expand the scheme into per-clip-index engine roles.
    ///
    /// Diesel levels contribute up to three threshold-triggered roles
    /// (`period = 0`). Steam levels fan each populated tier out across the
    /// chuff slots at contiguous indices: slot 0 runs on a 1000 ms period,
    /// slots >= 1 are driven aperiodically (`period = -1`).
    pub fn synthesize(&self, map: &mut RoleMap) {
        match self {
            EngineScheme::Steam { chuffs, levels } => {
                for level in levels {
                    let tiers = [
                        (level.high_clip, StageKind::LoopAccel),
                        (level.mid_clip, StageKind::Loop),
                        (level.low_clip, StageKind::LoopDecel),
                    ];
                    for (base, stage) in tiers {
                        if base == 0 {
                            continue;
                        }
                        for slot in 0..*chuffs {
                            // Indices past 255 cannot reference any
                            // directory entry; drop them like index 0.
                            let Some(index) = base.checked_add(slot) else {
                                continue;
                            };
                            map.push(
                                index,
                                RoleRecord::Engine(EngineRole {
                                    stage,
                                    speed: speed_percent(level.min_speed),
                                    period_ms: if slot == 0 { 1000 } else { -1 },
                                    chuff: slot,
                                    volume: volume_percent(0),
                                }),
                            );
                        }
                    }
                }
            }
            EngineScheme::Diesel { levels } => {
                for level in levels {
                    let stages = [
                        (level.on_clip, StageKind::On),
                        (level.loop_clip, StageKind::Loop),
                        (level.off_clip, StageKind::Off),
                    ];
                    for (index, stage) in stages {
                        map.push(
                            index,
                            RoleRecord::Engine(EngineRole {
                                stage,
                                speed: speed_percent(level.min_speed),
                                period_ms: 0,
                                chuff: 0,
                                volume: volume_percent(0),
                            }),
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn engine_roles(map: &RoleMap, index: u8) -> Vec<EngineRole> {
        map.get(index)
            .iter()
            .filter_map(|r| match r {
                RoleRecord::Engine(e) => Some(e.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn parse_steam_thresholds_and_levels() {
        // chuffs=2, thresholds [40, 0xFF], then two 3-byte levels.
        let data = [
            0x02, // chuffs
            40, 0xFF, // threshold list, 0xFF-terminated
            20, 0, 0, // level 0
            23, 0, 0, // level 1
        ];
        let cur = BankCursor::new(&data);
        let scheme = parse_steam(&cur, 0).unwrap();

        assert_eq!(
            scheme,
            EngineScheme::Steam {
                chuffs: 2,
                levels: vec![
                    SteamLevel { high_clip: 20, mid_clip: 0, low_clip: 0, min_speed: 1 },
                    SteamLevel { high_clip: 23, mid_clip: 0, low_clip: 0, min_speed: 40 },
                ],
            }
        );
    }

    #[test]
    fn parse_steam_without_terminator_has_no_levels() {
        let data = [0x03, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let cur = BankCursor::new(&data);
        let scheme = parse_steam(&cur, 0).unwrap();
        assert_eq!(scheme, EngineScheme::Steam { chuffs: 3, levels: Vec::new() });
    }

    #[test]
    fn parse_diesel_bottom_level_sentinels() {
        let mut data = vec![0u8; 0x60];
        data[0] = 2; // steps -> 3 levels
        // Levels at offset 5.
        data[5..8].copy_from_slice(&[10, 11, 12]);
        data[8..11].copy_from_slice(&[13, 14, 15]);
        data[11..14].copy_from_slice(&[16, 17, 18]);
        // Threshold for level 2 at table + 0x22.
        data[5 + 0x22] = 60;
        let cur = BankCursor::new(&data);
        let scheme = parse_diesel(&cur, 0).unwrap();

        let EngineScheme::Diesel { levels } = scheme else {
            panic!("expected diesel scheme");
        };
        assert_eq!(levels[0].min_speed, -1);
        assert_eq!(levels[1].min_speed, 0);
        assert_eq!(levels[2].min_speed, 60);
        assert_eq!(levels[2].on_clip, 16);
    }

    #[test]
    fn diesel_level_synthesizes_three_stages() {
        let scheme = EngineScheme::Diesel {
            levels: vec![SpeedLevel {
                on_clip: 10,
                loop_clip: 11,
                off_clip: 12,
                min_speed: 5,
            }],
        };
        let mut map = RoleMap::default();
        scheme.synthesize(&mut map);

        let expected_speed = speed_percent(5);
        for (index, stage) in [(10, StageKind::On), (11, StageKind::Loop), (12, StageKind::Off)] {
            let roles = engine_roles(&map, index);
            assert_eq!(roles.len(), 1, "index {index}");
            assert_eq!(roles[0].stage, stage);
            assert_eq!(roles[0].speed, expected_speed);
            assert_eq!(roles[0].period_ms, 0);
        }
    }

    #[test]
    fn steam_level_fans_out_chuffs() {
        let scheme = EngineScheme::Steam {
            chuffs: 3,
            levels: vec![SteamLevel {
                high_clip: 20,
                mid_clip: 0,
                low_clip: 0,
                min_speed: 1,
            }],
        };
        let mut map = RoleMap::default();
        scheme.synthesize(&mut map);

        for (index, period, chuff) in [(20, 1000, 0), (21, -1, 1), (22, -1, 2)] {
            let roles = engine_roles(&map, index);
            assert_eq!(roles.len(), 1, "index {index}");
            assert_eq!(roles[0].stage, StageKind::LoopAccel);
            assert_eq!(roles[0].period_ms, period);
            assert_eq!(roles[0].chuff, chuff);
        }
        assert_eq!(map.role_count(), 3);
    }

    #[test]
    fn unassigned_stage_clips_are_skipped() {
        let scheme = EngineScheme::Diesel {
            levels: vec![SpeedLevel {
                on_clip: 0,
                loop_clip: 9,
                off_clip: 0,
                min_speed: -1,
            }],
        };
        let mut map = RoleMap::default();
        scheme.synthesize(&mut map);
        assert_eq!(map.role_count(), 1);
        assert_eq!(engine_roles(&map, 9)[0].speed, -1);
    }
}
