//! Audio-encode collaborator boundary
//!
//! The extractor is indifferent to how audio is encoded: it hands an
//! [`AudioEncoder`] one [`EmittedAsset`] per output and moves on. The
//! default [`WavEncoder`] writes mono PCM WAV files; swap in another
//! implementation for resampling or transcoding pipelines.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::formats::bank::SampleRate;

/// Destination bucket of an emitted asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetBucket {
    /// Role-classified output.
    Primary,
    /// Auxiliary or unclassified output (`unused/` subfolder).
    Unused,
}

/// One normalized output record handed to the encode collaborator.
#[derive(Debug, Clone, Copy)]
pub struct EmittedAsset<'a> {
    /// Final asset name, extension included.
    pub name: &'a str,
    /// Destination bucket.
    pub bucket: AssetBucket,
    /// Raw mono PCM sample bytes.
    pub samples: &'a [u8],
    /// Sample rate.
    pub sample_rate: SampleRate,
    /// Bytes per sample (1 = 8-bit unsigned, 2 = 16-bit little-endian).
    pub sample_width: u8,
}

/// External audio-encode collaborator: accepts PCM plus rate and depth,
/// writes an encoded file.
pub trait AudioEncoder {
    /// Encode one asset.
    fn encode(&mut self, asset: &EmittedAsset) -> Result<()>;
}

/// Default collaborator writing plain mono PCM WAV files under a
/// destination folder, with unused assets routed to an `unused/`
/// subfolder.
#[derive(Debug, Clone)]
pub struct WavEncoder {
    root: PathBuf,
}

impl WavEncoder {
    /// Create an encoder writing beneath `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Destination path for an asset.
    pub fn target(&self, asset: &EmittedAsset) -> PathBuf {
        match asset.bucket {
            AssetBucket::Primary => self.root.join(asset.name),
            AssetBucket::Unused => self.root.join("unused").join(asset.name),
        }
    }
}

fn encode_err(name: &str, err: impl std::fmt::Display) -> Error {
    Error::Encode {
        name: name.to_string(),
        message: err.to_string(),
    }
}

impl AudioEncoder for WavEncoder {
    fn encode(&mut self, asset: &EmittedAsset) -> Result<()> {
        let path = self.target(asset);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_wav(&path, asset)
    }
}

/// Write one asset as a mono PCM WAV file.
fn write_wav(path: &Path, asset: &EmittedAsset) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: asset.sample_rate.hz(),
        bits_per_sample: u16::from(asset.sample_width) * 8,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer =
        hound::WavWriter::create(path, spec).map_err(|e| encode_err(asset.name, e))?;

    if asset.sample_width == 2 {
        for pair in asset.samples.chunks_exact(2) {
            writer
                .write_sample(i16::from_le_bytes([pair[0], pair[1]]))
                .map_err(|e| encode_err(asset.name, e))?;
        }
    } else {
        // Bank samples are stored unsigned, like 8-bit WAV itself; hound
        // expects signed input and re-centers on write.
        for &byte in asset.samples {
            writer
                .write_sample(byte.wrapping_sub(128) as i8)
                .map_err(|e| encode_err(asset.name, e))?;
        }
    }
    writer.finalize().map_err(|e| encode_err(asset.name, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unused_assets_land_in_subfolder() {
        let enc = WavEncoder::new("/out");
        let asset = EmittedAsset {
            name: "12.wav",
            bucket: AssetBucket::Unused,
            samples: &[],
            sample_rate: SampleRate::Hz11025,
            sample_width: 1,
        };
        assert_eq!(enc.target(&asset), PathBuf::from("/out/unused/12.wav"));
    }

    #[test]
    fn writes_a_decodable_wav() {
        let dir = tempfile::tempdir().unwrap();
        let mut enc = WavEncoder::new(dir.path());
        let samples = [0u8, 1, 2, 3, 4, 5];
        let asset = EmittedAsset {
            name: "F1_LOOP.wav",
            bucket: AssetBucket::Primary,
            samples: &samples,
            sample_rate: SampleRate::Hz22050,
            sample_width: 2,
        };
        enc.encode(&asset).unwrap();

        let reader = hound::WavReader::open(dir.path().join("F1_LOOP.wav")).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.len(), 3);
    }

    #[test]
    fn eight_bit_samples_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut enc = WavEncoder::new(dir.path());
        let samples = [0u8, 128, 255];
        let asset = EmittedAsset {
            name: "8bit.wav",
            bucket: AssetBucket::Primary,
            samples: &samples,
            sample_rate: SampleRate::Hz11025,
            sample_width: 1,
        };
        enc.encode(&asset).unwrap();

        let mut reader = hound::WavReader::open(dir.path().join("8bit.wav")).unwrap();
        let decoded: Vec<i8> = reader.samples::<i8>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, vec![-128, 0, 127]);
    }
}
