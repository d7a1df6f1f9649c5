//! # ZppKit
//!
//! A pure-Rust library for working with ZIMO decoder sound banks (`.zpp`).
//!
//! A sound bank is the binary container a decoder programming tool writes
//! to the decoder's flash: raw PCM audio clips plus the classification
//! tables that tie them to function keys, engine speed stages, special
//! effects, periodic random effects, and tap-changer steps. ZppKit parses
//! a bank into a typed model and re-emits every clip as a semantically
//! named WAV asset.
//!
//! ## Quick Start
//!
//! ```no_run
//! use zppkit::formats::bank::SoundBank;
//! use zppkit::extract::extract_to_dir;
//!
//! // Inspect a bank without extracting.
//! let bank = SoundBank::open("Ae_6-6.zpp")?;
//! println!(
//!     "{} clips, {} roles",
//!     bank.clips.len(),
//!     bank.roles.role_count()
//! );
//!
//! // Extract a bank to a folder of named WAV assets.
//! let summary = extract_to_dir("Ae_6-6.zpp", "Ae_6-6/")?;
//! println!("{} assets written", summary.assets_written);
//! # Ok::<(), zppkit::Error>(())
//! ```
//!
//! ### Using the Prelude
//!
//! ```
//! use zppkit::prelude::*;
//! ```

pub mod error;
pub mod extract;
pub mod formats;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::extract::{
        AssetBucket, AudioEncoder, BatchExtractResult, EmittedAsset, ExtractionSummary,
        WavEncoder, batch_extract, extract_bank, extract_to_dir, find_bank_files,
    };
    pub use crate::formats::bank::{
        BankSummary, ClipArena, ClipId, ClipKind, ClipRecord, ClipSummary, EngineScheme,
        RoleMap, RoleRecord, SampleRate, SoundBank, StageKind,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
