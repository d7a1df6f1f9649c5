//! Role resolution and asset emission
//!
//! For every decoded clip, gather all role records referencing any of its
//! directory indices, build one output name per role from the naming
//! grammar, and hand the resulting PCM records to an [`AudioEncoder`].
//! Clips left without a single successful emission fall back to the
//! `unused` bucket under their embedded display name, exactly once per
//! physical clip regardless of how many indices alias it.
//!
//! Naming grammar:
//! `F<function>[_<STAGE>][<chuff>][_S<speed>][_P<period>][_V<volume>].wav`,
//! with the volume suffix omitted at 0% and 100%. Clips with a partial
//! loop region are split into `_ON` / `_LOOP` / `_OFF` sub-assets sliced
//! at the loop markers, each with the markers cleared.

pub mod batch;
pub mod encoder;

use std::fs;
use std::ops::Range;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::formats::bank::{ClipId, EngineRole, RoleRecord, SoundBank};

pub use batch::{BatchExtractResult, batch_extract, find_bank_files};
pub use encoder::{AssetBucket, AudioEncoder, EmittedAsset, WavEncoder};

/// First synthetic function id handed to periodic effects that have no
/// real function trigger; allocation counts down from here.
const FIRST_VIRTUAL_SLOT: u8 = 63;

/// Outcome of one bank extraction.
#[derive(Debug, Default, Clone)]
pub struct ExtractionSummary {
    /// Role-classified assets successfully encoded.
    pub assets_written: usize,
    /// Assets routed to the unused bucket.
    pub unused_written: usize,
    /// Periodic random-effect description lines (`logic.txt` content).
    pub logic_lines: Vec<String>,
    /// Per-record failures; the run itself always completes.
    pub warnings: Vec<String>,
}

/// Resolve every clip's roles and emit all assets through `encoder`.
///
/// Structural failures (a record the encoder rejects) are collected as
/// warnings and skip that one asset only.
pub fn extract_bank(bank: &SoundBank, encoder: &mut dyn AudioEncoder) -> ExtractionSummary {
    let mut resolver = Resolver::new(bank);
    for (index, id) in bank.clips.indices() {
        resolver.emit_index(encoder, index, id);
    }
    resolver.summary
}

/// Extract a bank file into a folder of WAV assets, writing `logic.txt`
/// alongside them when any periodic roles were found.
pub fn extract_to_dir(
    bank_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
) -> Result<ExtractionSummary> {
    let bank = SoundBank::open(bank_path)?;
    let output_dir = output_dir.as_ref();
    let mut encoder = WavEncoder::new(output_dir);
    let summary = extract_bank(&bank, &mut encoder);
    if !summary.logic_lines.is_empty() {
        fs::create_dir_all(output_dir)?;
        fs::write(
            output_dir.join("logic.txt"),
            summary.logic_lines.join("\n") + "\n",
        )?;
    }
    Ok(summary)
}

/// Per-run emission state: the write-once flag per physical clip and the
/// virtual function slot counter, threaded explicitly rather than kept as
/// module state.
struct Resolver<'a> {
    bank: &'a SoundBank,
    written: Vec<bool>,
    virtual_slot: u8,
    summary: ExtractionSummary,
}

impl<'a> Resolver<'a> {
    fn new(bank: &'a SoundBank) -> Self {
        Self {
            bank,
            written: vec![false; bank.clips.len()],
            virtual_slot: FIRST_VIRTUAL_SLOT,
            summary: ExtractionSummary::default(),
        }
    }

    /// Apply every role recorded for one directory index, then route the
    /// clip to the unused bucket if nothing has claimed it yet.
    fn emit_index(&mut self, enc: &mut dyn AudioEncoder, index: u8, id: ClipId) {
        let clip = self.bank.clips.get(id);
        let roles = self.bank.roles.get(index);
        let first_function = roles.iter().find_map(|role| match role {
            RoleRecord::Function(f) => Some(f.function_id),
            _ => None,
        });

        for role in roles {
            match role {
                RoleRecord::Function(f) => {
                    let stem = if clip.kind.is_unspecified() {
                        format!("F{}", f.function_id)
                    } else {
                        format!("F{}_{}", f.function_id, clip.kind.label())
                    };
                    self.emit(enc, id, &full_name(&stem, f.volume), AssetBucket::Primary);
                }
                RoleRecord::Special(s) => {
                    let stage = s.kind.stage();
                    let function = s
                        .kind
                        .function_id()
                        .or_else(|| stage.map(|_| 1));
                    match (function, stage) {
                        (Some(fid), Some(stage)) => {
                            let stem = format!("F{fid}_{}", stage.as_str());
                            self.emit(enc, id, &full_name(&stem, s.volume), AssetBucket::Primary);
                        }
                        (Some(fid), None) => {
                            let stem = format!("F{fid}");
                            self.emit(enc, id, &full_name(&stem, s.volume), AssetBucket::Primary);
                        }
                        (None, _) => {
                            debug!(
                                "special sound '{}' on clip {index} has no trigger mapping",
                                s.kind.label()
                            );
                        }
                    }
                }
                RoleRecord::Periodic(p) => {
                    let (function_id, is_virtual) = match first_function {
                        Some(fid) => (fid, false),
                        None => {
                            let slot = self.virtual_slot;
                            self.virtual_slot = slot.saturating_sub(1);
                            (slot, true)
                        }
                    };
                    let mut line = format!(
                        "F{function_id}_RAND_S{}_E{}_L{}",
                        p.min_delay_s,
                        p.max_delay_s,
                        u32::from(p.duration_s) * 1000
                    );
                    if p.while_moving {
                        line.push_str("_INMOVE");
                    }
                    if p.while_stopped {
                        line.push_str("_INSTOP");
                    }
                    self.summary.logic_lines.push(line);
                    if is_virtual {
                        let name = format!("F{function_id}.wav");
                        self.emit(enc, id, &name, AssetBucket::Primary);
                    }
                }
                RoleRecord::TapChange(_) => {
                    let name = clip.default_name(index);
                    self.emit(enc, id, &name, AssetBucket::Unused);
                }
                RoleRecord::Engine(e) => self.emit_engine(enc, id, e),
            }
        }

        if !self.written[id.0] {
            // A special-sound slot names the clip's effective kind even
            // when the directory entry left it untagged.
            let kind = roles
                .iter()
                .find_map(|role| match role {
                    RoleRecord::Special(s) => Some(s.kind),
                    _ => None,
                })
                .unwrap_or(clip.kind);
            let name = clip.name_with_kind(index, kind);
            info!(
                "unclassified clip {index}: '{name}' ({} bit, {} Hz)",
                clip.bits(),
                clip.sample_rate.hz(),
            );
            self.emit(enc, id, &name, AssetBucket::Unused);
        }
    }

    /// Emit one engine-stage role. Threshold-triggered roles in the
    /// noise floor (speed 1..=2 after rescaling) are dropped.
    fn emit_engine(&mut self, enc: &mut dyn AudioEncoder, id: ClipId, role: &EngineRole) {
        let stage = role.stage.as_str();
        if role.speed >= 0 || role.period_ms != 0 {
            if role.period_ms == 0 {
                if role.speed > 0 && role.speed < 3 {
                    debug!("dropping engine stage {stage} at noise-floor speed {}", role.speed);
                    return;
                }
                let speed = if role.speed == 0 { 1 } else { role.speed };
                let stem = format!("F1_{stage}_S{speed}");
                self.emit(enc, id, &full_name(&stem, role.volume), AssetBucket::Primary);
            } else {
                let period = if role.period_ms > 0 {
                    role.period_ms.to_string()
                } else {
                    "x".to_string()
                };
                let stem = format!("F1_{stage}{}_S{}_P{period}", role.chuff + 1, role.speed);
                self.emit(enc, id, &full_name(&stem, role.volume), AssetBucket::Primary);
            }
        } else {
            let stem = format!("F1_{stage}_S0");
            self.emit(enc, id, &full_name(&stem, role.volume), AssetBucket::Primary);
        }
    }

    /// Emit a clip under `name`, splitting at the loop markers when the
    /// clip carries a partial loop region (primary bucket only).
    fn emit(&mut self, enc: &mut dyn AudioEncoder, id: ClipId, name: &str, bucket: AssetBucket) {
        let clip = self.bank.clips.get(id);
        match (bucket, clip.loop_region) {
            (AssetBucket::Primary, Some((start, end))) => {
                let (on, sustain, off) = split_names(name);
                self.emit_slice(enc, id, &on, bucket, 0..start);
                self.emit_slice(enc, id, &sustain, bucket, start..end);
                self.emit_slice(enc, id, &off, bucket, end..clip.data.len());
            }
            _ => self.emit_slice(enc, id, name, bucket, 0..clip.data.len()),
        }
    }

    fn emit_slice(
        &mut self,
        enc: &mut dyn AudioEncoder,
        id: ClipId,
        name: &str,
        bucket: AssetBucket,
        range: Range<usize>,
    ) {
        let clip = self.bank.clips.get(id);
        let asset = EmittedAsset {
            name,
            bucket,
            samples: &clip.data[range],
            sample_rate: clip.sample_rate,
            sample_width: clip.sample_width,
        };
        match enc.encode(&asset) {
            Ok(()) => {
                self.written[id.0] = true;
                match bucket {
                    AssetBucket::Primary => self.summary.assets_written += 1,
                    AssetBucket::Unused => self.summary.unused_written += 1,
                }
            }
            Err(err) => {
                warn!("failed to encode {name}: {err}");
                self.summary.warnings.push(format!("{name}: {err}"));
            }
        }
    }
}

/// Append the volume suffix and extension. Volume 0% is the "stored zero"
/// full-volume case, so both 0 and 100 are left implicit.
fn full_name(stem: &str, volume: u8) -> String {
    if volume == 0 || volume == 100 {
        format!("{stem}.wav")
    } else {
        format!("{stem}_V{volume}.wav")
    }
}

/// Derive the `_ON` / `_LOOP` / `_OFF` sub-asset names: the tag slots in
/// after the first `_`-separated segment, or before the extension when the
/// name has no underscore.
fn split_names(name: &str) -> (String, String, String) {
    let (head, tail) = match name.split_once('_') {
        Some((head, tail)) => (head, format!("_{tail}")),
        None => match name.rsplit_once('.') {
            Some((head, ext)) => (head, format!(".{ext}")),
            None => (name, String::new()),
        },
    };
    (
        format!("{head}_ON{tail}"),
        format!("{head}_LOOP{tail}"),
        format!("{head}_OFF{tail}"),
    )
}
