//! End-to-end tests over a synthetic sound bank image: parse the bank,
//! extract it to disk, and check the emitted WAV assets.

use std::fs;

use zppkit::extract::extract_to_dir;
use zppkit::formats::bank::{ClipKind, EngineScheme, OUTER_HEADER, SoundBank};

/// Offsets used by the synthetic bank (relative to the stripped image).
const BELL_CLIP: usize = 0x1400;
const EXTRA_CLIP: usize = 0x1500;
const ENGINE_CLIP: usize = 0x1600;

/// Write one clip blob at `offset`: flags, data-end and loop markers
/// (u24 LE), sample bytes, then the length-prefixed display name. The
/// loop markers span the whole clip, which parses as "no loop".
fn put_clip(image: &mut [u8], offset: usize, flags: u8, samples: &[u8], name: &str) {
    let width = if flags & 0x80 != 0 { 2 } else { 1 };
    let data_offset = offset + 10;
    let data_end = data_offset + samples.len() - width;
    image[offset] = flags;
    image[offset + 1..offset + 4].copy_from_slice(&(data_end as u32).to_le_bytes()[..3]);
    image[offset + 4..offset + 7].copy_from_slice(&(data_offset as u32).to_le_bytes()[..3]);
    image[offset + 7..offset + 10].copy_from_slice(&(data_end as u32).to_le_bytes()[..3]);
    image[data_offset..data_offset + samples.len()].copy_from_slice(samples);
    let name_offset = data_end + width + 2;
    image[name_offset] = name.len() as u8;
    image[name_offset + 1..name_offset + 1 + name.len()].copy_from_slice(name.as_bytes());
}

/// Point directory entry `index` at `offset` with type tag `tag`.
fn put_directory_entry(image: &mut [u8], index: u8, tag: u8, offset: usize) {
    let addr = (usize::from(index) - 1) * 4;
    image[addr] = tag;
    image[addr + 1..addr + 4].copy_from_slice(&(offset as u32).to_be_bytes()[1..]);
}

/// Build a small but complete bank:
///
/// - project name "Test"
/// - a diesel scheme with one idle level looping clip index 9
/// - function F2 triggering clip index 3 (a bell, also aliased at index 5)
/// - index 7 pointing at an unclassified clip named "Extra"
fn build_bank() -> Vec<u8> {
    let stripped = 0x1800;
    let mut raw = vec![0u8; OUTER_HEADER + stripped];
    let image = &mut raw[OUTER_HEADER..];

    put_directory_entry(image, 3, 0x03, BELL_CLIP);
    put_directory_entry(image, 5, 0x03, BELL_CLIP);
    put_directory_entry(image, 7, 0x00, EXTRA_CLIP);
    put_directory_entry(image, 9, 0xFE, ENGINE_CLIP);

    // Diesel anchor slot 0 -> table at 0x900: zero extra steps, one
    // level with only the loop stage assigned (clip 9).
    image[0x840..0x842].copy_from_slice(&0x0900u16.to_be_bytes());
    image[0x900] = 0;
    image[0x905..0x908].copy_from_slice(&[0, 9, 0]);

    // Project name; the classification base floats past it.
    image[0xA00] = 4;
    image[0xA01..0xA05].copy_from_slice(b"Test");
    let base = 0xA05;

    // Function map F1..F19 run: record 1 (= F2) -> clip 3, full volume.
    let f2 = base + 0x200 + 3;
    image[f2..f2 + 3].copy_from_slice(&[3, 0, 0]);

    put_clip(image, BELL_CLIP, 0x00, &[10, 20, 30, 40], "Glocke");
    put_clip(image, EXTRA_CLIP, 0x00, &[1, 2], "Extra");
    put_clip(image, ENGINE_CLIP, 0x80 | 0x04, &[0, 1, 2, 3, 4, 5, 6, 7], "");

    raw
}

#[test]
fn parses_the_synthetic_bank() {
    let bank = SoundBank::parse(&build_bank()).unwrap();

    assert_eq!(bank.project_name.as_deref(), Some("Test"));
    assert!(matches!(bank.scheme, Some(EngineScheme::Diesel { .. })));

    // Three physical clips behind four directory entries.
    assert_eq!(bank.clips.len(), 3);
    assert_eq!(bank.clips.index_count(), 4);
    let directory: Vec<(u8, usize)> = bank.directory().collect();
    assert_eq!(
        directory,
        vec![(3, BELL_CLIP), (5, BELL_CLIP), (7, EXTRA_CLIP), (9, ENGINE_CLIP)]
    );

    let bell = bank.clips.get(bank.clips.id_for_index(3).unwrap());
    assert_eq!(bell.kind, ClipKind::Bell);
    assert_eq!(bell.embedded_name.as_deref(), Some("Glocke"));
    assert_eq!(bell.data, vec![10, 20, 30, 40]);
    assert_eq!(bell.loop_region, None);

    let engine = bank.clips.get(bank.clips.id_for_index(9).unwrap());
    assert_eq!(engine.bits(), 16);
    assert_eq!(engine.sample_rate.hz(), 22050);
}

#[test]
fn extracts_named_wav_assets() {
    let dir = tempfile::tempdir().unwrap();
    let bank_path = dir.path().join("test.zpp");
    fs::write(&bank_path, build_bank()).unwrap();
    let out = dir.path().join("out");

    let summary = extract_to_dir(&bank_path, &out).unwrap();
    assert_eq!(summary.assets_written, 2);
    assert_eq!(summary.unused_written, 1);
    assert!(summary.warnings.is_empty());
    assert!(summary.logic_lines.is_empty());
    assert!(!out.join("logic.txt").exists());

    // The function-triggered bell, tagged with its kind label.
    let bell = hound::WavReader::open(out.join("F2_bell.wav")).unwrap();
    assert_eq!(bell.spec().sample_rate, 11025);
    assert_eq!(bell.spec().bits_per_sample, 8);
    assert_eq!(bell.len(), 4);

    // The diesel idle loop: one level, loop stage, S0 sentinel speed.
    let idle = hound::WavReader::open(out.join("F1_LOOP_S0.wav")).unwrap();
    assert_eq!(idle.spec().sample_rate, 22050);
    assert_eq!(idle.spec().bits_per_sample, 16);
    assert_eq!(idle.len(), 4);

    // The unclassified clip lands in unused/ under its display name,
    // once, even though index 5 aliases the bell.
    assert!(out.join("unused/7-Extra.wav").exists());
    assert!(!out.join("unused/5-Glocke_bell.wav").exists());
}

#[test]
fn summary_reflects_roles_and_scheme() {
    let bank = SoundBank::parse(&build_bank()).unwrap();
    let summary = bank.summary();

    assert_eq!(summary.project_name.as_deref(), Some("Test"));
    assert_eq!(summary.scheme, Some("diesel"));
    assert_eq!(summary.clip_count, 3);
    // F2 on index 3 plus the synthesized engine loop on index 9.
    assert_eq!(summary.role_count, 2);

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["project_name"], "Test");
    assert_eq!(json["clips"].as_array().unwrap().len(), 4);
}
