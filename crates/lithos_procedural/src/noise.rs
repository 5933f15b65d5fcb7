//! # Lattice Noise
//!
//! Deterministic 3D scalar field built from octaves of value noise.
//!
//! ## Octaves
//!
//! Each octave places a coarse lattice of random values in `[-1, 1)` every
//! `scale` tiles and trilinearly interpolates between the 8 surrounding
//! lattice samples. Amplitude equals the scale, so the coarse octaves
//! dominate and the fine octaves only add surface detail:
//!
//! ```text
//! scale:      4    8   16   32   64
//! amplitude:  4    8   16   32   64    (sum = 124)
//! ```
//!
//! Interpolation is plain linear on the fractional lattice coordinate.
//!
//! ## Determinism Guarantee
//!
//! Lattice values come from a ChaCha stream seeded by
//! [`WorldSeed::derive`], so the same seed yields a bit-identical field on
//! every platform.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use lithos_shared::ChunkPosition;

/// Octave lattice spacings, finest first.
pub const OCTAVE_SCALES: [u32; 5] = [4, 8, 16, 32, 64];

/// Extra lattice cells past the field extent on every axis.
pub const LATTICE_PADDING: usize = 2;

/// World seed for deterministic generation.
///
/// All procedural generation derives from this seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives an independent sub-seed for a specific purpose.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }

    /// Derives the seed of one chunk.
    ///
    /// Each axis is tagged in the high bits so that `(1, 0, 0)` and
    /// `(0, 1, 0)` do not collide.
    #[inline]
    #[must_use]
    pub const fn for_chunk(self, position: ChunkPosition) -> Self {
        self.derive((1 << 32) | position.x as u32 as u64)
            .derive((2 << 32) | position.y as u32 as u64)
            .derive((3 << 32) | position.z as u32 as u64)
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(0xDEAD_BEEF_CAFE_BABE)
    }
}

/// Dense 3D noise field.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseField {
    width: usize,
    height: usize,
    depth: usize,
    values: Vec<f32>,
}

impl NoiseField {
    /// Generates a field of the given size.
    ///
    /// The result is the raw sum of all octaves; its magnitude never exceeds
    /// [`NoiseField::amplitude_sum`].
    #[must_use]
    pub fn generate(seed: WorldSeed, width: u32, height: u32, depth: u32) -> Self {
        let (width, height, depth) = (width as usize, height as usize, depth as usize);
        let mut values = vec![0.0f32; width * height * depth];

        for scale in OCTAVE_SCALES {
            let lattice = Lattice::random(seed.derive(u64::from(scale)), scale, [width, height, depth]);
            #[allow(clippy::cast_precision_loss)]
            let amplitude = scale as f32;

            let mut index = 0;
            for z in 0..depth {
                for y in 0..height {
                    for x in 0..width {
                        values[index] += lattice.sample(x, y, z) * amplitude;
                        index += 1;
                    }
                }
            }
        }

        Self {
            width,
            height,
            depth,
            values,
        }
    }

    /// Sum of all octave amplitudes; an upper bound on `|value|`.
    #[must_use]
    pub fn amplitude_sum() -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let sum = OCTAVE_SCALES.iter().sum::<u32>() as f32;
        sum
    }

    /// Raw value at a cell; 0 outside the field.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize, z: usize) -> f32 {
        if x >= self.width || y >= self.height || z >= self.depth {
            return 0.0;
        }
        self.values[x + y * self.width + z * self.width * self.height]
    }

    /// Value scaled into `[-1, 1]`.
    #[inline]
    #[must_use]
    pub fn normalized(&self, x: usize, y: usize, z: usize) -> f32 {
        self.get(x, y, z) / Self::amplitude_sum()
    }

    /// Raw values in `x + y * width + z * width * height` order.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// One octave's coarse lattice.
struct Lattice {
    scale: usize,
    dims: [usize; 3],
    values: Vec<f32>,
}

impl Lattice {
    fn random(seed: WorldSeed, scale: u32, extent: [usize; 3]) -> Self {
        let scale = scale as usize;
        let dims = extent.map(|len| len.div_ceil(scale) + LATTICE_PADDING);
        let mut rng = ChaCha8Rng::seed_from_u64(seed.value());
        let values = (0..dims[0] * dims[1] * dims[2])
            .map(|_| rng.gen_range(-1.0f32..1.0))
            .collect();
        Self { scale, dims, values }
    }

    #[inline]
    fn at(&self, x: usize, y: usize, z: usize) -> f32 {
        self.values[x + y * self.dims[0] + z * self.dims[0] * self.dims[1]]
    }

    /// Trilinear interpolation at a fine-grid cell.
    ///
    /// `ix + 1` stays inside the padded lattice because `x < extent`.
    #[allow(clippy::cast_precision_loss)]
    fn sample(&self, x: usize, y: usize, z: usize) -> f32 {
        let (ix, iy, iz) = (x / self.scale, y / self.scale, z / self.scale);
        let inv = 1.0 / self.scale as f32;
        let tx = (x % self.scale) as f32 * inv;
        let ty = (y % self.scale) as f32 * inv;
        let tz = (z % self.scale) as f32 * inv;

        let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;

        let c00 = lerp(self.at(ix, iy, iz), self.at(ix + 1, iy, iz), tx);
        let c10 = lerp(self.at(ix, iy + 1, iz), self.at(ix + 1, iy + 1, iz), tx);
        let c01 = lerp(self.at(ix, iy, iz + 1), self.at(ix + 1, iy, iz + 1), tx);
        let c11 = lerp(self.at(ix, iy + 1, iz + 1), self.at(ix + 1, iy + 1, iz + 1), tx);

        let c0 = lerp(c00, c10, ty);
        let c1 = lerp(c01, c11, ty);
        lerp(c0, c1, tz)
    }
}
