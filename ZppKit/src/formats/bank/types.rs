//! Core types for decoded sound banks

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

/// Sample rate of a decoded clip (one of the three fixed decoder rates).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SampleRate {
    /// Default rate when neither rate flag is set.
    Hz11025,
    /// Selected by flag bit 0x04.
    Hz22050,
    /// Selected by flag bit 0x20.
    Hz44100,
}

impl SampleRate {
    /// Decode the rate from the clip flags byte. The two rate bits are
    /// mutually exclusive in well-formed banks; 0x20 wins when both are set.
    pub fn from_flags(flags: u8) -> Self {
        let mut rate = SampleRate::Hz11025;
        if flags & 0x04 != 0 {
            rate = SampleRate::Hz22050;
        }
        if flags & 0x20 != 0 {
            rate = SampleRate::Hz44100;
        }
        rate
    }

    /// The rate in Hertz.
    pub fn hz(self) -> u32 {
        match self {
            SampleRate::Hz11025 => 11025,
            SampleRate::Hz22050 => 22050,
            SampleRate::Hz44100 => 44100,
        }
    }
}

/// Playback stage of an engine or special sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StageKind {
    /// Spin-up transition into a speed level.
    On,
    /// Sustained level loop.
    Loop,
    /// Spin-down transition out of a speed level.
    Off,
    /// Accelerating chuff loop (steam, high tier).
    LoopAccel,
    /// Decelerating chuff loop (steam, low tier).
    LoopDecel,
    /// One-shot start sound.
    Start,
    /// One-shot stop sound.
    Stop,
    /// Direction-change sound.
    Dir,
}

impl StageKind {
    /// Stage tag as it appears in output asset names.
    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::On => "ON",
            StageKind::Loop => "LOOP",
            StageKind::Off => "OFF",
            StageKind::LoopAccel => "LOOPA",
            StageKind::LoopDecel => "LOOPD",
            StageKind::Start => "START",
            StageKind::Stop => "STOP",
            StageKind::Dir => "DIR",
        }
    }
}

/// Source category tag of a clip, drawn from the directory `type_tag` byte
/// or from a special-sound slot position.
///
/// Tags outside the enumerated set decode to [`ClipKind::Unspecified`];
/// an unknown tag is never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClipKind {
    ShortWhistle,
    LongWhistle,
    Bell,
    CoalShovels,
    Injector,
    AirPump,
    OilBurner,
    ConductorsWhistle,
    StationAnnouncement,
    Coupling,
    Generator,
    Horn,
    FalseStart,
    Idle,
    DirectionChange,
    BrakesSquealing,
    Thyristor,
    StartingWhistle,
    Draining,
    ElectricMotor,
    Switchgear,
    Thyristor2,
    PantoUp,
    PantoDownAir,
    PantoDownImpact,
    Turbocharger,
    ElectricBrake,
    CurveScreech,
    Engine,
    Unspecified,
}

impl ClipKind {
    /// Decode a directory type tag.
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            0x01 => ClipKind::ShortWhistle,
            0x02 => ClipKind::LongWhistle,
            0x03 => ClipKind::Bell,
            0x04 => ClipKind::CoalShovels,
            0x05 => ClipKind::Injector,
            0x06 => ClipKind::AirPump,
            0x07 => ClipKind::OilBurner,
            0x08 => ClipKind::ConductorsWhistle,
            0x09 => ClipKind::StationAnnouncement,
            0x0A => ClipKind::Coupling,
            0x0B => ClipKind::Generator,
            0x0C => ClipKind::Horn,
            0x0D => ClipKind::FalseStart,
            0x80 => ClipKind::Idle,
            0x81 => ClipKind::DirectionChange,
            0x82 => ClipKind::BrakesSquealing,
            0x83 => ClipKind::Thyristor,
            0x84 => ClipKind::StartingWhistle,
            0x85 => ClipKind::Draining,
            0x86 => ClipKind::ElectricMotor,
            0x88 => ClipKind::Switchgear,
            0x89 => ClipKind::Thyristor2,
            0x8A => ClipKind::PantoUp,
            0x8B => ClipKind::PantoDownAir,
            0x8C => ClipKind::PantoDownImpact,
            0x8D => ClipKind::Turbocharger,
            0x8E => ClipKind::ElectricBrake,
            0x8F => ClipKind::CurveScreech,
            0xFE | 0xFF => ClipKind::Engine,
            _ => ClipKind::Unspecified,
        }
    }

    /// Display label used in output names, matching the programming tool's
    /// own vocabulary.
    pub fn label(self) -> &'static str {
        match self {
            ClipKind::ShortWhistle => "short whistle",
            ClipKind::LongWhistle => "long whistle",
            ClipKind::Bell => "bell",
            ClipKind::CoalShovels => "coal shovels",
            ClipKind::Injector => "injector",
            ClipKind::AirPump => "air pump",
            ClipKind::OilBurner => "oil burner",
            ClipKind::ConductorsWhistle => "conductor's whistle",
            ClipKind::StationAnnouncement => "station announcement",
            ClipKind::Coupling => "coupling",
            ClipKind::Generator => "generator",
            ClipKind::Horn => "horn",
            ClipKind::FalseStart => "false start",
            ClipKind::Idle => "idle",
            ClipKind::DirectionChange => "change of direction",
            ClipKind::BrakesSquealing => "brakes squealing",
            ClipKind::Thyristor => "thyristor sound",
            ClipKind::StartingWhistle => "starting whistle",
            ClipKind::Draining => "draining",
            ClipKind::ElectricMotor => "e-motor sound",
            ClipKind::Switchgear => "switchgear",
            ClipKind::Thyristor2 => "thyristor2",
            ClipKind::PantoUp => "panto up",
            ClipKind::PantoDownAir => "panto down air",
            ClipKind::PantoDownImpact => "panto down impact",
            ClipKind::Turbocharger => "turbocharger",
            ClipKind::ElectricBrake => "electric brake",
            ClipKind::CurveScreech => "curve screech",
            ClipKind::Engine => "engine",
            ClipKind::Unspecified => "undefined",
        }
    }

    /// Playback stage implied when this kind appears as a special sound.
    pub fn stage(self) -> Option<StageKind> {
        match self {
            ClipKind::Idle | ClipKind::ElectricMotor => Some(StageKind::Loop),
            ClipKind::DirectionChange => Some(StageKind::Dir),
            ClipKind::BrakesSquealing => Some(StageKind::Stop),
            ClipKind::StartingWhistle => Some(StageKind::Start),
            _ => None,
        }
    }

    /// Function trigger implied when this kind appears as a special sound.
    pub fn function_id(self) -> Option<u8> {
        match self {
            ClipKind::Idle | ClipKind::DirectionChange | ClipKind::StartingWhistle => Some(1),
            ClipKind::CurveScreech => Some(13),
            ClipKind::ElectricMotor => Some(4),
            _ => None,
        }
    }

    /// True for the catch-all tag.
    pub fn is_unspecified(self) -> bool {
        self == ClipKind::Unspecified
    }
}

/// Normalize a raw volume byte to percent. A stored zero means "full
/// volume", so both 0 and 255 map to 100%.
pub fn volume_percent(raw: u8) -> u8 {
    let raw = if raw == 0 { 0xFF } else { raw };
    (u16::from(raw) * 100 / 0xFF) as u8
}

/// Rescale a raw speed threshold to percent. Positive values map onto
/// 1..=100 (never rounding down to zero); zero and negative sentinels pass
/// through unchanged.
pub(crate) fn speed_percent(raw: i16) -> i16 {
    if raw > 0 {
        ((i32::from(raw) * 100 / 0xFF).max(1)) as i16
    } else {
        raw
    }
}

/// Stable identifier of a physical clip inside a [`ClipArena`].
///
/// Several directory indices may resolve to the same `ClipId` when their
/// directory entries share a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ClipId(pub(crate) usize);

/// One physical audio clip decoded from the bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipRecord {
    /// Absolute offset of the clip header in the bank image. This is the
    /// clip's identity: directory entries pointing here alias this record.
    pub offset: usize,
    /// Raw PCM sample bytes.
    pub data: Vec<u8>,
    /// Sample rate.
    pub sample_rate: SampleRate,
    /// Bytes per sample (1 = 8-bit, 2 = 16-bit).
    pub sample_width: u8,
    /// Source category tag from the directory entry.
    pub kind: ClipKind,
    /// Display name embedded after the sample data, if any.
    pub embedded_name: Option<String>,
    /// Loop region in bytes relative to the start of `data`. `None` when
    /// the header carries no loop markers or the region spans the whole
    /// clip.
    pub loop_region: Option<(usize, usize)>,
}

impl ClipRecord {
    /// Sample depth in bits.
    pub fn bits(&self) -> u8 {
        self.sample_width * 8
    }

    /// Default output file name for a clip reached through directory
    /// index `index`: `<idx>[-<embedded name>][_<kind>].wav`.
    pub fn default_name(&self, index: u8) -> String {
        self.name_with_kind(index, self.kind)
    }

    /// Default name with the kind tag overridden, for clips whose
    /// effective kind comes from a role rather than the directory entry.
    pub fn name_with_kind(&self, index: u8, kind: ClipKind) -> String {
        let mut name = index.to_string();
        if let Some(embedded) = &self.embedded_name {
            name.push('-');
            name.push_str(embedded);
        }
        if !kind.is_unspecified() {
            name.push('_');
            name.push_str(kind.label());
        }
        name.push_str(".wav");
        name
    }
}

/// Arena-allocated clip storage with offset-based aliasing.
///
/// The directory index to `ClipId` map is built once during parsing; every
/// later stage holds identifiers only, never copies of the sample data, so
/// per-clip state (such as "already emitted") is naturally shared across
/// aliased indices.
#[derive(Debug, Default, Clone)]
pub struct ClipArena {
    clips: Vec<ClipRecord>,
    by_index: BTreeMap<u8, ClipId>,
    by_offset: HashMap<usize, ClipId>,
}

impl ClipArena {
    /// Insert a newly decoded clip under directory index `index`.
    pub fn insert(&mut self, index: u8, clip: ClipRecord) -> ClipId {
        let id = ClipId(self.clips.len());
        self.by_offset.insert(clip.offset, id);
        self.clips.push(clip);
        self.by_index.insert(index, id);
        id
    }

    /// Alias directory index `index` to an existing clip.
    pub fn alias(&mut self, index: u8, id: ClipId) {
        self.by_index.insert(index, id);
    }

    /// Clip already decoded at this byte offset, if any.
    pub fn id_at_offset(&self, offset: usize) -> Option<ClipId> {
        self.by_offset.get(&offset).copied()
    }

    /// Resolve a directory index.
    pub fn id_for_index(&self, index: u8) -> Option<ClipId> {
        self.by_index.get(&index).copied()
    }

    /// Borrow a clip by identifier.
    pub fn get(&self, id: ClipId) -> &ClipRecord {
        &self.clips[id.0]
    }

    /// Directory entries in ascending index order.
    pub fn indices(&self) -> impl Iterator<Item = (u8, ClipId)> + '_ {
        self.by_index.iter().map(|(&idx, &id)| (idx, id))
    }

    /// Number of physical clips (aliases not counted).
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// True when no clips were decoded.
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Number of populated directory entries (aliases counted).
    pub fn index_count(&self) -> usize {
        self.by_index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_zero_and_full_normalize_to_100() {
        assert_eq!(volume_percent(0), 100);
        assert_eq!(volume_percent(255), 100);
        assert_eq!(volume_percent(128), 50);
    }

    #[test]
    fn speed_rescale_clamps_to_one() {
        assert_eq!(speed_percent(1), 1);
        assert_eq!(speed_percent(255), 100);
        assert_eq!(speed_percent(0), 0);
        assert_eq!(speed_percent(-1), -1);
    }

    #[test]
    fn sample_rate_flags() {
        assert_eq!(SampleRate::from_flags(0x00), SampleRate::Hz11025);
        assert_eq!(SampleRate::from_flags(0x04), SampleRate::Hz22050);
        assert_eq!(SampleRate::from_flags(0x20), SampleRate::Hz44100);
        // 16-bit flag alone does not change the rate
        assert_eq!(SampleRate::from_flags(0x80), SampleRate::Hz11025);
    }

    #[test]
    fn unknown_tag_is_unspecified() {
        assert_eq!(ClipKind::from_tag(0x42), ClipKind::Unspecified);
        assert_eq!(ClipKind::from_tag(0x7F), ClipKind::Unspecified);
        assert_eq!(ClipKind::from_tag(0xFE), ClipKind::Engine);
    }

    #[test]
    fn special_kind_mappings() {
        assert_eq!(ClipKind::Idle.stage(), Some(StageKind::Loop));
        assert_eq!(ClipKind::Idle.function_id(), Some(1));
        assert_eq!(ClipKind::CurveScreech.stage(), None);
        assert_eq!(ClipKind::CurveScreech.function_id(), Some(13));
        assert_eq!(ClipKind::Bell.stage(), None);
        assert_eq!(ClipKind::Bell.function_id(), None);
    }

    #[test]
    fn aliased_indices_share_one_record() {
        let mut arena = ClipArena::default();
        let clip = ClipRecord {
            offset: 0x1000,
            data: vec![1, 2, 3],
            sample_rate: SampleRate::Hz11025,
            sample_width: 1,
            kind: ClipKind::Bell,
            embedded_name: None,
            loop_region: None,
        };
        let id = arena.insert(3, clip);
        arena.alias(7, id);

        assert_eq!(arena.id_for_index(3), Some(id));
        assert_eq!(arena.id_for_index(7), Some(id));
        assert_eq!(arena.id_at_offset(0x1000), Some(id));
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.index_count(), 2);
    }

    #[test]
    fn default_name_grammar() {
        let mut clip = ClipRecord {
            offset: 0,
            data: Vec::new(),
            sample_rate: SampleRate::Hz11025,
            sample_width: 1,
            kind: ClipKind::Unspecified,
            embedded_name: None,
            loop_region: None,
        };
        assert_eq!(clip.default_name(12), "12.wav");

        clip.embedded_name = Some("Glocke".to_string());
        clip.kind = ClipKind::Bell;
        assert_eq!(clip.default_name(12), "12-Glocke_bell.wav");
    }
}
