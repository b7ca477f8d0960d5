//! Global constants for assetcore
//!
//! Consolidates font format, atlas and audio constants
//! to eliminate magic numbers throughout the codebase.

// ============================================================================
// Font File Format
// ============================================================================

/// Metadata file extension
pub const FONT_METADATA_EXT: &str = "met";

/// Glyph bitmap file extension
pub const FONT_BITMAP_EXT: &str = "fnt";

/// Font name length in UTF-16 code units
pub const FONT_NAME_UNITS: usize = 0x80;

/// Font name field size in bytes (UTF-16LE)
pub const FONT_NAME_BYTES: usize = FONT_NAME_UNITS * 2;

/// Size of one glyph identity record in the metadata stream
pub const GLYPH_RECORD_SIZE: usize = 16;

/// Run length byte announcing a 16-bit run length
pub const RUN_ESCAPE: u8 = 0xFF;

/// Pixel value for "on" mask pixels
pub const PIXEL_ON: u8 = 0xFF;

/// Pixel value for "off" mask pixels
pub const PIXEL_OFF: u8 = 0x00;

// ============================================================================
// Atlas Packing
// ============================================================================

/// Candidate atlas widths, smallest first
pub const ATLAS_WIDTHS: [u32; 4] = [512, 1024, 2048, 4096];

/// Fraction of a candidate width the estimated side must reach to select it
pub const ATLAS_WIDTH_THRESHOLD: f32 = 0.7;

/// Atlas height ceiling (the packer is only width-constrained below this)
pub const ATLAS_MAX_HEIGHT: u32 = 1024 * 32;

/// Padding added to each glyph rectangle to prevent bleeding between neighbours
pub const GLYPH_PADDING: u32 = 2;

// ============================================================================
// Audio
// ============================================================================

/// Global volume applied to freshly activated playback backends
pub const DEFAULT_GLOBAL_VOLUME: f32 = 0.5;

/// Simulated tick length for the CLI playback loop (~60 Hz)
pub const TICK_INTERVAL_MS: u64 = 16;
