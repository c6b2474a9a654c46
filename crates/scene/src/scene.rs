use tumbler_assets::{GltfFile, ModelSource};
use tumbler_common::SceneConfig;
use tumbler_rig::PlayerRig;
use tumbler_terrain::{Surface, TerrainError};

/// Errors from scene construction.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("terrain: {0}")]
    Terrain(#[from] TerrainError),
}

/// The drum, the rig, and the frame counter.
///
/// Built once at startup and kept for the whole session.
#[derive(Debug)]
pub struct Scene {
    config: SceneConfig,
    surface: Surface,
    rig: PlayerRig,
    frame: u64,
    elapsed: f64,
}

impl Scene {
    /// Build the drum from `seed` and a rig with no visual yet.
    pub fn new(config: SceneConfig, seed: u64) -> Result<Self, SceneError> {
        let surface = Surface::with_seed(config.surface, seed)?;
        let rig = PlayerRig::new(&config.rig);
        tracing::info!(
            seed,
            vertices = surface.vertex_count(),
            "scene ready"
        );
        Ok(Self {
            config,
            surface,
            rig,
            frame: 0,
            elapsed: 0.0,
        })
    }

    /// Kick off the rig's model fetch from the configured path.
    pub fn load_player_model(&mut self) {
        let source = GltfFile::new(&self.config.rig.model_path);
        self.rig.load_visual(source);
    }

    /// Kick off the rig's model fetch from an arbitrary source.
    pub fn load_player_model_from(&mut self, source: impl ModelSource) {
        self.rig.load_visual(source);
    }

    /// Advance one frame: surface first, then rig.
    pub fn tick(&mut self, dt: f32) {
        let _span = tracing::debug_span!("scene_tick", frame = self.frame).entered();
        self.surface.tick(dt);
        self.rig.tick(dt);
        self.frame += 1;
        self.elapsed += dt as f64;
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn rig(&self) -> &PlayerRig {
        &self.rig
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Simulated seconds since the scene was built.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}
