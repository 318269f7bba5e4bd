//! Heightmap grid generation.

use crate::colour::ColourBuffer;
use crate::error::HeightfieldError;
use crate::noise_field::NoiseField;

/// An immutable `size x size` grid of normalized heights in `[0, 1]`.
///
/// Stored row-major with `x` as the row axis: the value for grid cell
/// `(x, z)` lives at `values[x * size + z]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Heightmap {
    size: usize,
    values: Vec<f32>,
}

impl Heightmap {
    pub(crate) fn from_values(size: usize, values: Vec<f32>) -> Self {
        debug_assert_eq!(values.len(), size * size);
        Self { size, values }
    }

    /// Edge length of the grid.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Height at cell `(x, z)`.
    ///
    /// # Panics
    ///
    /// Panics if `x >= size` or `z >= size`.
    pub fn get(&self, x: usize, z: usize) -> f32 {
        assert!(x < self.size && z < self.size, "({x}, {z}) outside {0}x{0} heightmap", self.size);
        self.values[x * self.size + z]
    }

    /// The raw row-major values.
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// A generated heightmap paired with its grayscale colour buffer.
///
/// The two are positionally aligned: cell `(x, z)` of the heightmap maps to
/// pixel `(x, z)` of the colour buffer.
#[derive(Clone, Debug)]
pub struct HeightfieldData {
    pub heightmap: Heightmap,
    pub colour: ColourBuffer,
}

/// Generates heightmaps (and optional colour buffers) from seeded noise.
///
/// Cheap to clone; clones sample the identical field, which is what worker
/// threads rely on for reproducible output.
#[derive(Clone, Debug)]
pub struct HeightfieldGenerator {
    noise: NoiseField,
}

impl HeightfieldGenerator {
    /// Create a generator from a world seed.
    pub fn new(seed: u32) -> Self {
        Self {
            noise: NoiseField::new(seed),
        }
    }

    /// Generate a `size x size` heightmap sampled at `(x / scale, z / scale)`.
    ///
    /// Fails fast with [`HeightfieldError::InvalidSize`] for a zero size;
    /// the scale clamp happens inside the sampler.
    pub fn generate(&self, size: u32, scale: f32) -> Result<Heightmap, HeightfieldError> {
        if size == 0 {
            return Err(HeightfieldError::InvalidSize(size));
        }
        let n = size as usize;
        let mut values = Vec::with_capacity(n * n);
        for x in 0..n {
            for z in 0..n {
                values.push(self.noise.sample(x as f32, z as f32, scale));
            }
        }
        Ok(Heightmap::from_values(n, values))
    }

    /// Generate a heightmap together with its grayscale colour buffer.
    pub fn generate_with_colour(
        &self,
        size: u32,
        scale: f32,
    ) -> Result<HeightfieldData, HeightfieldError> {
        let heightmap = self.generate(size, scale)?;
        let colour = ColourBuffer::grayscale_of(&heightmap);
        Ok(HeightfieldData { heightmap, colour })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colour::height_to_grey;

    #[test]
    fn test_generate_exact_dimensions() {
        let generator = HeightfieldGenerator::new(0);
        for size in [1_u32, 2, 16, 33] {
            let map = generator.generate(size, 0.3).unwrap();
            assert_eq!(map.size(), size as usize);
            assert_eq!(map.values().len(), (size * size) as usize);
        }
    }

    #[test]
    fn test_generate_values_in_unit_range() {
        let generator = HeightfieldGenerator::new(9);
        let map = generator.generate(32, 0.3).unwrap();
        for (i, v) in map.values().iter().enumerate() {
            assert!((0.0..=1.0).contains(v), "value {v} out of range at {i}");
        }
    }

    #[test]
    fn test_generate_is_deterministic() {
        let generator = HeightfieldGenerator::new(42);
        let a = generator.generate(24, 0.3).unwrap();
        let b = generator.generate(24, 0.3).unwrap();
        assert_eq!(a, b, "identical inputs must reproduce the identical grid");
    }

    #[test]
    fn test_clones_sample_the_same_field() {
        let generator = HeightfieldGenerator::new(42);
        let clone = generator.clone();
        assert_eq!(
            generator.generate(16, 0.3).unwrap(),
            clone.generate(16, 0.3).unwrap()
        );
    }

    #[test]
    fn test_zero_size_fails_fast() {
        let generator = HeightfieldGenerator::new(0);
        assert_eq!(
            generator.generate(0, 0.3),
            Err(HeightfieldError::InvalidSize(0))
        );
    }

    #[test]
    fn test_get_indexes_row_major_by_x() {
        let generator = HeightfieldGenerator::new(5);
        let map = generator.generate(8, 0.3).unwrap();
        assert_eq!(map.get(3, 5), map.values()[3 * 8 + 5]);
    }

    #[test]
    fn test_colour_buffer_aligned_with_heights() {
        let generator = HeightfieldGenerator::new(21);
        let data = generator.generate_with_colour(16, 0.3).unwrap();
        assert_eq!(data.colour.size(), data.heightmap.size());
        for x in 0..16 {
            for z in 0..16 {
                let grey = height_to_grey(data.heightmap.get(x, z));
                assert_eq!(data.colour.get_pixel(x, z), (grey, grey, grey, 255));
            }
        }
    }
}
