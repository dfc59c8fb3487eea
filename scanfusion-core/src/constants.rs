//! Constants and limits for the scanning pipeline

use core::time::Duration;

/// Cooldown imposed after every accepted detection (3000 ms)
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(3000);

/// Default back-pressure depth of the analysis worker queue
pub const DEFAULT_WORKER_QUEUE: usize = 1;

/// Scale factor used when either side of a transform is not laid out yet
pub const DEGENERATE_SCALE: f32 = 1.0;

/// Largest pixel coordinate a crop edge is clamped to
pub const MAX_PIXEL_EDGE: f32 = 1_073_741_824.0;

/// Number of planes in a three-plane chroma-subsampled frame
pub const YUV_PLANE_COUNT: usize = 3;

/// Index of the luminance plane inside a YUV frame
pub const LUMA_PLANE_INDEX: usize = 0;

/// Side length of a binarizer block, in pixels
pub const BLOCK_SIZE: usize = 8;

/// log2 of [`BLOCK_SIZE`]
pub const BLOCK_SIZE_POWER: usize = 3;

/// Images with either side below this size use the global histogram threshold
pub const MINIMUM_DIMENSION: usize = BLOCK_SIZE * 5;

/// Blocks whose max - min is below this are treated as flat
pub const MIN_DYNAMIC_RANGE: u32 = 24;

/// Luminance bits kept by the global histogram binarizer
pub const LUMINANCE_BITS: usize = 5;

/// Number of histogram buckets used by the global binarizer
pub const LUMINANCE_BUCKETS: usize = 1 << LUMINANCE_BITS;

/// Sentinel native identifier for symbologies the whole-frame engine cannot detect
pub const DETECTOR_FORMAT_UNKNOWN: i32 = -1;
