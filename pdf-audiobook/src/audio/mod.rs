//! Audio assembly: joining per-chunk segments into the final file.

pub mod assembler;

pub use assembler::{Concatenator, assemble, cleanup_segments, create_concatenator};
