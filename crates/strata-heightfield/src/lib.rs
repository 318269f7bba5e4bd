//! Deterministic heightmap generation from smooth 2D noise.
//!
//! Produces normalized `size x size` height grids and, on request, a
//! row-major RGBA colour buffer visualizing the heights in grayscale.
//! Everything here is plain data suitable for handoff across threads;
//! nothing touches engine resources.

mod colour;
mod error;
mod heightmap;
mod noise_field;

pub use colour::{ColourBuffer, height_to_grey};
pub use error::HeightfieldError;
pub use heightmap::{Heightmap, HeightfieldData, HeightfieldGenerator};
pub use noise_field::{MAX_NOISE_SCALE, MIN_NOISE_SCALE, NoiseField};
