//! # Noise Field
//!
//! Fractal height function of a horizontal world coordinate.
//!
//! Each octave samples 2D Perlin gradient noise from the `noise` crate. Perlin
//! output lies roughly in `[-1, 1]` and is centred on 0. The extracted surface
//! sits at world `y = height(x, z)`, so the terrain bumps up and down around
//! world `y = 0` symmetrically.

use noise::{NoiseFn, Perlin};

use crate::engine_state::config::NoiseSettings;

/// Deterministic multi-octave gradient noise.
///
/// The only state is the permutation table selected by the seed, which is
/// fixed at construction. [`NoiseField::height`] is therefore a pure function
/// of its arguments and is safe to call from many threads at once.
#[derive(Clone, Debug)]
pub struct NoiseField {
    perlin: Perlin,
}

impl NoiseField {
    /// Creates a noise field with the given permutation seed.
    pub fn new(seed: u32) -> Self {
        NoiseField {
            perlin: Perlin::new(seed),
        }
    }

    /// Creates a noise field for the seed stored in `settings`.
    pub fn from_settings(settings: &NoiseSettings) -> Self {
        Self::new(settings.seed)
    }

    /// Terrain height offset at `(world_x, world_z)`.
    ///
    /// Sums `amplitude * perlin(sample_x, sample_z)` over the configured number
    /// of octaves, where `sample = (world + offset) * scale * frequency`. The
    /// amplitude starts at 1 and is multiplied by `persistence` after every
    /// octave; the frequency starts at 1 and is multiplied by `lacunarity`.
    /// The sum is finally scaled by `height_multiplier`.
    ///
    /// Accumulation happens in `f64` and is rounded once at the end.
    pub fn height(&self, world_x: f32, world_z: f32, settings: &NoiseSettings) -> f32 {
        let scale = settings.scale as f64;
        let x = (world_x + settings.offset[0]) as f64;
        let z = (world_z + settings.offset[1]) as f64;

        let mut amplitude = 1.0f64;
        let mut frequency = 1.0f64;
        let mut total = 0.0f64;

        for _ in 0..settings.octaves.max(0) {
            let sample_x = x * scale * frequency;
            let sample_z = z * scale * frequency;
            total += amplitude * self.perlin.get([sample_x, sample_z]);

            amplitude *= settings.persistence as f64;
            frequency *= settings.lacunarity as f64;
        }

        (total * settings.height_multiplier as f64) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> NoiseSettings {
        NoiseSettings {
            scale: 0.05,
            octaves: 5,
            persistence: 0.5,
            lacunarity: 2.0,
            height_multiplier: 8.0,
            offset: [13.5, -7.25],
            seed: 42,
        }
    }

    #[test]
    fn test_height_is_deterministic() {
        let settings = settings();
        let a = NoiseField::from_settings(&settings);
        let b = NoiseField::from_settings(&settings);

        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..256 {
            let x = rng.f32() * 2000.0 - 1000.0;
            let z = rng.f32() * 2000.0 - 1000.0;
            let first = a.height(x, z, &settings);
            assert_eq!(first.to_bits(), a.height(x, z, &settings).to_bits());
            assert_eq!(first.to_bits(), b.height(x, z, &settings).to_bits());
        }
    }

    #[test]
    fn test_zero_multiplier_flattens_terrain() {
        let settings = NoiseSettings {
            height_multiplier: 0.0,
            ..settings()
        };
        let field = NoiseField::from_settings(&settings);
        assert_eq!(field.height(12.3, 45.6, &settings), 0.0);
    }

    #[test]
    fn test_single_octave_stays_in_range() {
        let settings = NoiseSettings {
            octaves: 1,
            height_multiplier: 1.0,
            ..settings()
        };
        let field = NoiseField::from_settings(&settings);

        let mut rng = fastrand::Rng::with_seed(11);
        for _ in 0..512 {
            let h = field.height(rng.f32() * 500.0, rng.f32() * 500.0, &settings);
            assert!((-1.5..=1.5).contains(&h), "height {h} out of range");
        }
    }

    #[test]
    fn test_octaves_are_bounded_by_amplitude_sum() {
        let settings = settings();
        let field = NoiseField::from_settings(&settings);
        // 1 + 0.5 + 0.25 + 0.125 + 0.0625, scaled, with headroom for Perlin overshoot
        let bound = 1.9375 * settings.height_multiplier * 1.5;

        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..512 {
            let h = field.height(rng.f32() * 300.0, rng.f32() * 300.0, &settings);
            assert!(h.abs() <= bound, "height {h} exceeds {bound}");
        }
    }

    #[test]
    fn test_offset_shifts_the_field() {
        let base = settings();
        let shifted = NoiseSettings {
            offset: [base.offset[0] + 10.0, base.offset[1] - 4.0],
            ..base.clone()
        };
        let field = NoiseField::from_settings(&base);
        let a = field.height(20.0, 30.0, &shifted);
        let b = field.height(30.0, 26.0, &base);
        assert!((a - b).abs() < 1e-4, "{a} vs {b}");
    }
}
