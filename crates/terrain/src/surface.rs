use glam::{Mat4, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tumbler_common::{ConfigError, SurfaceConfig, WaveAdvance, WaveRanges};

use crate::geometry::cylinder_mesh;

/// Errors from surface construction.
#[derive(Debug, thiserror::Error)]
pub enum TerrainError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("wave state count {waves} does not match vertex count {vertices}")]
    LengthMismatch { vertices: usize, waves: usize },
}

/// Per-vertex orbit around the rest position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveState {
    /// Current phase in radians. Accumulates without wrapping.
    pub angle: f32,
    /// Orbit radius.
    pub amplitude: f32,
    /// Radians per second (or per tick under [`WaveAdvance::PerFrame`]).
    pub angular_speed: f32,
}

impl WaveState {
    /// Draw a wave state from the configured ranges.
    pub fn random(ranges: &WaveRanges, rng: &mut impl Rng) -> Self {
        let angle = if ranges.angle_max > 0.0 {
            rng.gen_range(0.0..ranges.angle_max)
        } else {
            0.0
        };
        Self {
            angle,
            amplitude: ranges.amplitude_base + rng.r#gen::<f32>() * ranges.amplitude_jitter,
            angular_speed: ranges.speed_base + rng.r#gen::<f32>() * ranges.speed_jitter,
        }
    }

    /// Offset from the rest position at the current phase.
    fn offset(&self) -> (f32, f32) {
        let (sin, cos) = self.angle.sin_cos();
        (cos * self.amplitude, sin * self.amplitude)
    }
}

/// The animated drum surface.
///
/// Owns the rest positions, the animated positions and one [`WaveState`] per
/// vertex, all indexed identically. The whole surface additionally spins about
/// its local Z axis.
#[derive(Debug, Clone)]
pub struct Surface {
    config: SurfaceConfig,
    original: Vec<Vec3>,
    current: Vec<Vec3>,
    waves: Vec<WaveState>,
    indices: Vec<u32>,
    /// Accumulated spin about local Z. Unbounded.
    rotation: f32,
    ticks: u64,
}

impl Surface {
    /// Build the cylinder described by `config` and seed each vertex's wave
    /// from `rng`.
    pub fn new(config: SurfaceConfig, rng: &mut impl Rng) -> Result<Self, TerrainError> {
        config.validate()?;
        let mesh = cylinder_mesh(
            config.radius,
            config.height,
            config.radial_segments,
            config.height_segments,
        );
        let waves = mesh
            .positions
            .iter()
            .map(|_| WaveState::random(&config.waves, rng))
            .collect();

        tracing::info!(
            vertices = mesh.positions.len(),
            triangles = mesh.indices.len() / 3,
            radius = config.radius,
            height = config.height,
            "built drum surface"
        );

        Ok(Self {
            config,
            current: mesh.positions.clone(),
            original: mesh.positions,
            waves,
            indices: mesh.indices,
            rotation: 0.0,
            ticks: 0,
        })
    }

    /// Build with a deterministic RNG seeded from `seed`.
    pub fn with_seed(config: SurfaceConfig, seed: u64) -> Result<Self, TerrainError> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::new(config, &mut rng)
    }

    /// Build over explicit rest positions and wave states.
    ///
    /// `indices` may be empty for point-only surfaces.
    pub fn from_parts(
        config: SurfaceConfig,
        positions: Vec<Vec3>,
        waves: Vec<WaveState>,
        indices: Vec<u32>,
    ) -> Result<Self, TerrainError> {
        if positions.len() != waves.len() {
            return Err(TerrainError::LengthMismatch {
                vertices: positions.len(),
                waves: waves.len(),
            });
        }
        Ok(Self {
            config,
            current: positions.clone(),
            original: positions,
            waves,
            indices,
            rotation: 0.0,
            ticks: 0,
        })
    }

    /// Advance the wave pattern and spin the drum.
    ///
    /// Each vertex is placed on its orbit at the current phase, then the phase
    /// advances. `dt` is trusted to be non-negative.
    pub fn tick(&mut self, dt: f32) {
        let _span = tracing::trace_span!("surface_tick", dt).entered();
        let advance = self.config.advance;

        for ((current, original), wave) in self
            .current
            .iter_mut()
            .zip(&self.original)
            .zip(self.waves.iter_mut())
        {
            let (dx, dy) = wave.offset();
            *current = Vec3::new(original.x + dx, original.y + dy, original.z);
            wave.angle += match advance {
                WaveAdvance::PerSecond => wave.angular_speed * dt,
                WaveAdvance::PerFrame => wave.angular_speed,
            };
        }

        self.rotation += dt * self.config.rotation_speed;
        self.ticks += 1;
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn vertex_count(&self) -> usize {
        self.original.len()
    }

    /// Animated positions in the surface's local frame.
    pub fn positions(&self) -> &[Vec3] {
        &self.current
    }

    /// Rest positions in the surface's local frame.
    pub fn original_positions(&self) -> &[Vec3] {
        &self.original
    }

    pub fn waves(&self) -> &[WaveState] {
        &self.waves
    }

    /// Triangle list indices into [`Self::positions`].
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Accumulated spin about local Z in radians.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Number of ticks applied so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Local-to-world matrix: vertical offset, then spin about Z.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, self.config.offset_y, 0.0))
            * Mat4::from_rotation_z(self.rotation)
    }

    /// Ground height for objects standing on the drum at `(x, z)`.
    ///
    /// The drum is treated as flat under the player, so this is the drum's
    /// vertical placement regardless of position.
    pub fn height_at(&self, _x: f32, _z: f32) -> f32 {
        self.config.offset_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn small_config() -> SurfaceConfig {
        SurfaceConfig {
            radius: 10.0,
            height: 20.0,
            radial_segments: 12,
            height_segments: 4,
            ..SurfaceConfig::default()
        }
    }

    fn single_vertex() -> Surface {
        Surface::from_parts(
            SurfaceConfig::default(),
            vec![Vec3::new(10.0, 0.0, 5.0)],
            vec![WaveState {
                angle: 0.0,
                amplitude: 3.0,
                angular_speed: 0.001,
            }],
            Vec::new(),
        )
        .unwrap()
    }

    #[test]
    fn single_vertex_one_tick() {
        let mut s = single_vertex();
        s.tick(1.0);
        assert!((s.positions()[0] - Vec3::new(13.0, 0.0, 5.0)).length() < 1e-5);
        assert!((s.waves()[0].angle - 0.001).abs() < 1e-7);
    }

    #[test]
    fn construction_seeds_every_vertex_within_ranges() {
        let s = Surface::with_seed(small_config(), 42).unwrap();
        assert_eq!(s.vertex_count(), 12 * 5);
        assert_eq!(s.waves().len(), s.vertex_count());
        for w in s.waves() {
            assert!((0.0..TAU).contains(&w.angle), "angle {}", w.angle);
            assert!(
                w.amplitude >= 3.0 && w.amplitude <= 3.0001 + 1e-6,
                "amp {}",
                w.amplitude
            );
            assert!(
                w.angular_speed >= 0.001 && w.angular_speed <= 0.0042 + 1e-6,
                "speed {}",
                w.angular_speed
            );
        }
    }

    #[test]
    fn wave_states_are_independent() {
        let s = Surface::with_seed(small_config(), 7).unwrap();
        let first = s.waves()[0];
        assert!(s.waves().iter().skip(1).any(|w| w.angle != first.angle));
    }

    #[test]
    fn same_seed_same_surface() {
        let a = Surface::with_seed(small_config(), 99).unwrap();
        let b = Surface::with_seed(small_config(), 99).unwrap();
        assert_eq!(a.waves(), b.waves());
        let c = Surface::with_seed(small_config(), 100).unwrap();
        assert_ne!(a.waves(), c.waves());
    }

    #[test]
    fn angle_accumulates_scaled_by_dt() {
        let mut s = Surface::with_seed(small_config(), 3).unwrap();
        let initial: Vec<WaveState> = s.waves().to_vec();
        let deltas = [0.016, 0.033, 0.0, 0.1, 0.02];
        for d in deltas {
            s.tick(d);
        }
        let total: f32 = deltas.iter().sum();
        for (w, w0) in s.waves().iter().zip(&initial) {
            let expected = w0.angle + total * w0.angular_speed;
            assert!((w.angle - expected).abs() < 1e-5);
            assert_eq!(w.amplitude, w0.amplitude);
            assert_eq!(w.angular_speed, w0.angular_speed);
        }
    }

    #[test]
    fn per_frame_advance_ignores_dt() {
        let config = SurfaceConfig {
            advance: WaveAdvance::PerFrame,
            ..small_config()
        };
        let mut s = Surface::with_seed(config, 5).unwrap();
        let initial: Vec<WaveState> = s.waves().to_vec();
        s.tick(0.0);
        s.tick(0.5);
        s.tick(2.0);
        for (w, w0) in s.waves().iter().zip(&initial) {
            assert!((w.angle - (w0.angle + 3.0 * w0.angular_speed)).abs() < 1e-5);
        }
    }

    #[test]
    fn z_never_changes() {
        let mut s = Surface::with_seed(small_config(), 11).unwrap();
        for i in 0..50 {
            s.tick(i as f32 * 0.01);
            for (p, o) in s.positions().iter().zip(s.original_positions()) {
                assert_eq!(p.z, o.z);
            }
        }
    }

    #[test]
    fn vertices_stay_on_their_orbit() {
        let mut s = Surface::with_seed(small_config(), 12).unwrap();
        s.tick(0.3);
        for ((p, o), w) in s
            .positions()
            .iter()
            .zip(s.original_positions())
            .zip(s.waves())
        {
            let r = (*p - *o).truncate().length();
            assert!((r - w.amplitude).abs() < 1e-3);
        }
    }

    #[test]
    fn rotation_is_sum_of_deltas_times_speed() {
        let mut s = Surface::with_seed(small_config(), 1).unwrap();
        let deltas = [0.5, 0.25, 1.0, 0.0, 2.0];
        for d in deltas {
            s.tick(d);
        }
        let expected = deltas.iter().sum::<f32>() * s.config().rotation_speed;
        assert!((s.rotation() - expected).abs() < 1e-6);
        assert_eq!(s.ticks(), deltas.len() as u64);
    }

    #[test]
    fn zero_delta_is_idempotent() {
        let mut s = Surface::with_seed(small_config(), 8).unwrap();
        s.tick(0.0);
        let positions = s.positions().to_vec();
        let rotation = s.rotation();
        for _ in 0..10 {
            s.tick(0.0);
        }
        assert_eq!(s.positions(), positions.as_slice());
        assert_eq!(s.rotation(), rotation);
    }

    #[test]
    fn from_parts_rejects_length_mismatch() {
        let err = Surface::from_parts(
            SurfaceConfig::default(),
            vec![Vec3::ZERO, Vec3::X],
            vec![WaveState {
                angle: 0.0,
                amplitude: 1.0,
                angular_speed: 1.0,
            }],
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TerrainError::LengthMismatch {
                vertices: 2,
                waves: 1
            }
        ));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SurfaceConfig {
            radial_segments: 2,
            ..SurfaceConfig::default()
        };
        assert!(matches!(
            Surface::with_seed(config, 0),
            Err(TerrainError::Config(_))
        ));
    }

    #[test]
    fn non_finite_wave_ranges_are_rejected_before_sampling() {
        let mut config = SurfaceConfig::default();
        config.waves.angle_max = f32::INFINITY;
        assert!(matches!(
            Surface::with_seed(config, 1),
            Err(TerrainError::Config(_))
        ));

        let mut config = SurfaceConfig::default();
        config.waves.speed_jitter = f32::NAN;
        assert!(matches!(
            Surface::with_seed(config, 1),
            Err(TerrainError::Config(_))
        ));
    }

    #[test]
    fn model_matrix_offsets_and_spins() {
        let mut s = single_vertex();
        s.tick(std::f32::consts::FRAC_PI_2 / s.config().rotation_speed);
        let m = s.model_matrix();
        // local +X turned a quarter turn about Z becomes +Y, then dropped by offset_y
        let p = m.transform_point3(Vec3::X);
        assert!((p - Vec3::new(0.0, 1.0 - 600.0, 0.0)).length() < 1e-3);
        assert_eq!(s.height_at(12.0, -4.0), -600.0);
    }
}
