use glam::Vec3;
use tumbler_assets::{MeshData, ModelBundle, ModelSource};
use tumbler_common::{RigConfig, Transform};

use crate::loader::{LoadOutcome, PendingLoad};
use crate::mixer::AnimationMixer;

/// Placeholder box extents (width, height, depth).
pub const PLACEHOLDER_SIZE: Vec3 = Vec3::new(1.0, 2.0, 1.0);
/// Placeholder box colour, 0xRRGGBB.
pub const PLACEHOLDER_COLOR: u32 = 0x00ff00;

/// What the rig currently looks like.
#[derive(Debug, Clone, Default)]
pub enum Visual {
    /// Nothing yet: no load requested, or one is in flight.
    #[default]
    Absent,
    /// The fetched model, fitted to the configured height.
    Model(ModelBundle),
    /// Permanent stand-in after a failed fetch.
    Placeholder,
}

impl Visual {
    pub fn label(&self) -> &'static str {
        match self {
            Visual::Absent => "absent",
            Visual::Model(_) => "model",
            Visual::Placeholder => "placeholder",
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, Visual::Absent)
    }
}

/// Torch carried by the rig, in the rig's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorchLight {
    pub position: Vec3,
    pub target: Vec3,
    pub color: u32,
    pub intensity: f32,
    pub distance: f32,
    pub angle: f32,
    pub penumbra: f32,
}

impl Default for TorchLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.3, 1.2, 1.0),
            target: Vec3::new(0.0, 1.2, -1.0),
            color: 0xffee88,
            intensity: 1.0,
            distance: 100.0,
            angle: std::f32::consts::PI / 8.0,
            penumbra: 0.5,
        }
    }
}

#[derive(Debug)]
enum LoadState {
    Idle,
    InFlight(PendingLoad),
    Done,
}

/// The stationary player character with its attached camera.
#[derive(Debug)]
pub struct PlayerRig {
    transform: Transform,
    camera_offset: Vec3,
    look_height: f32,
    clip_index: usize,
    fit_height: f32,
    torch: TorchLight,
    visual: Visual,
    mixer: Option<AnimationMixer>,
    load: LoadState,
}

impl PlayerRig {
    pub fn new(config: &RigConfig) -> Self {
        Self {
            transform: Transform::from_position_yaw(config.position, config.yaw),
            camera_offset: config.camera_offset,
            look_height: config.look_height,
            clip_index: config.clip_index,
            fit_height: config.fit_height,
            torch: TorchLight::default(),
            visual: Visual::Absent,
            mixer: None,
            load: LoadState::Idle,
        }
    }

    /// Begin fetching the rig's model in the background.
    ///
    /// Only the first call starts a fetch; later calls are ignored. The
    /// outcome is applied by a later [`PlayerRig::tick`].
    pub fn load_visual(&mut self, source: impl ModelSource) {
        if !matches!(self.load, LoadState::Idle) {
            tracing::warn!(
                origin = %source.describe(),
                "model load already requested; ignoring"
            );
            return;
        }
        tracing::info!(origin = %source.describe(), "loading player model");
        self.load = LoadState::InFlight(PendingLoad::spawn(source));
    }

    /// Track an already-started load instead of spawning one.
    pub fn attach_load(&mut self, pending: PendingLoad) {
        if !matches!(self.load, LoadState::Idle) {
            tracing::warn!(origin = %pending.origin(), "model load already requested; ignoring");
            return;
        }
        self.load = LoadState::InFlight(pending);
    }

    /// Apply a finished load, then advance the animation mixer.
    pub fn tick(&mut self, dt: f32) {
        let _span = tracing::trace_span!("rig_tick", dt).entered();
        self.poll_load();
        if let Some(mixer) = &mut self.mixer {
            mixer.update(dt);
        }
    }

    fn poll_load(&mut self) {
        let LoadState::InFlight(pending) = &self.load else {
            return;
        };
        let Some(outcome) = pending.poll() else {
            return;
        };
        self.load = LoadState::Done;
        self.complete_load(outcome);
    }

    fn complete_load(&mut self, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Loaded(mut bundle) => {
                bundle.mesh.fit_to_height(self.fit_height);
                let mut mixer = AnimationMixer::new(bundle.clips.clone());
                if bundle.clip_count() > self.clip_index {
                    mixer.play(self.clip_index);
                    tracing::info!(
                        clip = self.clip_index,
                        name = bundle.clip(self.clip_index).and_then(|c| c.name.as_deref()),
                        "playing player clip"
                    );
                } else {
                    tracing::debug!(
                        clips = bundle.clip_count(),
                        wanted = self.clip_index,
                        "model has too few clips; not animating"
                    );
                }
                self.mixer = Some(mixer);
                self.visual = Visual::Model(bundle);
            }
            LoadOutcome::Failed(reason) => {
                tracing::error!("failed to load player model: {reason}");
                self.visual = Visual::Placeholder;
            }
        }
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn camera_offset(&self) -> Vec3 {
        self.camera_offset
    }

    /// Camera position in world space: the offset carried by the rig.
    pub fn camera_eye(&self) -> Vec3 {
        self.transform.transform_point(self.camera_offset)
    }

    /// Point the camera looks at.
    pub fn camera_target(&self) -> Vec3 {
        self.transform.position + Vec3::Y * self.look_height
    }

    pub fn visual(&self) -> &Visual {
        &self.visual
    }

    /// Mesh to draw for the current visual, if it is a loaded model.
    pub fn model_mesh(&self) -> Option<&MeshData> {
        match &self.visual {
            Visual::Model(bundle) => Some(&bundle.mesh),
            _ => None,
        }
    }

    pub fn mixer(&self) -> Option<&AnimationMixer> {
        self.mixer.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.load, LoadState::InFlight(_))
    }

    pub fn torch(&self) -> &TorchLight {
        &self.torch
    }

    /// Torch position and aim point in world space.
    pub fn torch_world(&self) -> (Vec3, Vec3) {
        (
            self.transform.transform_point(self.torch.position),
            self.transform.transform_point(self.torch.target),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};
    use tumbler_assets::{AssetError, AssetId, ClipInfo};

    fn bundle(clip_count: usize) -> ModelBundle {
        ModelBundle {
            id: AssetId(clip_count as u64),
            name: "bot".into(),
            mesh: MeshData {
                positions: vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 4.0, 0.0)],
                indices: vec![0, 1, 2],
            },
            clips: (0..clip_count)
                .map(|i| ClipInfo {
                    name: Some(format!("clip{i}")),
                    duration: 1.0,
                })
                .collect(),
        }
    }

    fn rig_with(outcome: LoadOutcome) -> PlayerRig {
        let mut rig = PlayerRig::new(&RigConfig::default());
        rig.attach_load(PendingLoad::ready(outcome, "test"));
        rig
    }

    /// Counts fetches so tests can prove no retry happens.
    struct Counting {
        fetches: Arc<AtomicUsize>,
    }

    impl ModelSource for Counting {
        fn fetch(&self) -> Result<ModelBundle, AssetError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Err(AssetError::NoGeometry("counting".into()))
        }

        fn describe(&self) -> String {
            "counting".into()
        }
    }

    #[test]
    fn new_rig_has_no_visual() {
        let rig = PlayerRig::new(&RigConfig::default());
        assert!(!rig.visual().is_present());
        assert!(rig.mixer().is_none());
        assert!(!rig.is_loading());
    }

    #[test]
    fn load_failure_gives_placeholder() {
        let mut rig = rig_with(LoadOutcome::Failed("missing".into()));
        assert!(rig.is_loading());
        rig.tick(0.016);
        assert!(matches!(rig.visual(), Visual::Placeholder));
        assert!(!rig.is_loading());
        for _ in 0..10 {
            rig.tick(0.016);
        }
        assert!(matches!(rig.visual(), Visual::Placeholder));
        assert!(rig.model_mesh().is_none());
    }

    #[test]
    fn failed_load_is_not_retried() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let mut rig = PlayerRig::new(&RigConfig::default());
        rig.load_visual(Counting {
            fetches: fetches.clone(),
        });

        let deadline = Instant::now() + Duration::from_secs(5);
        while !rig.visual().is_present() {
            assert!(Instant::now() < deadline, "load never resolved");
            std::thread::sleep(Duration::from_millis(1));
            rig.tick(0.0);
        }
        assert!(matches!(rig.visual(), Visual::Placeholder));

        rig.load_visual(Counting {
            fetches: fetches.clone(),
        });
        for _ in 0..5 {
            rig.tick(0.016);
        }
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert!(matches!(rig.visual(), Visual::Placeholder));
    }

    #[test]
    fn eight_clips_loops_clip_six() {
        let mut rig = rig_with(LoadOutcome::Loaded(bundle(8)));
        rig.tick(0.0);
        let action = rig.mixer().unwrap().active().unwrap();
        assert_eq!(action.clip_index, 6);
        assert_eq!(action.name.as_deref(), Some("clip6"));
        assert!(matches!(rig.visual(), Visual::Model(_)));
    }

    #[test]
    fn clip_threshold_is_strict() {
        for (count, plays) in [(5, false), (6, false), (7, true), (8, true)] {
            let mut rig = rig_with(LoadOutcome::Loaded(bundle(count)));
            rig.tick(0.0);
            let active = rig.mixer().unwrap().active().is_some();
            assert_eq!(active, plays, "clip count {count}");
        }
    }

    #[test]
    fn tick_advances_the_clip() {
        let mut rig = rig_with(LoadOutcome::Loaded(bundle(7)));
        rig.tick(0.25);
        rig.tick(0.5);
        let action = rig.mixer().unwrap().active().unwrap();
        assert!((action.time - 0.75).abs() < 1e-6);
        rig.tick(0.5);
        let action = rig.mixer().unwrap().active().unwrap();
        assert_eq!(action.loops, 1);
    }

    #[test]
    fn loaded_model_is_fitted() {
        let mut rig = rig_with(LoadOutcome::Loaded(bundle(0)));
        rig.tick(0.0);
        let (lo, hi) = rig.model_mesh().unwrap().bounds().unwrap();
        assert!((hi.y - lo.y - RigConfig::default().fit_height).abs() < 1e-5);
    }

    #[test]
    fn rig_stays_put_while_ticking() {
        let mut rig = rig_with(LoadOutcome::Loaded(bundle(8)));
        let before = *rig.transform();
        let eye = rig.camera_eye();
        for _ in 0..100 {
            rig.tick(0.016);
        }
        assert_eq!(*rig.transform(), before);
        assert_eq!(rig.camera_eye(), eye);
    }

    #[test]
    fn camera_sits_at_offset_in_rig_frame() {
        let rig = PlayerRig::new(&RigConfig::default());
        // yaw of a quarter turn maps local (0, 2, -4) to world (-4, 2, 0)
        let eye = rig.camera_eye();
        assert!((eye - Vec3::new(-4.0, 2.0, 0.0)).length() < 1e-5);
        assert_eq!(rig.camera_target(), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(rig.camera_offset(), Vec3::new(0.0, 2.0, -4.0));
    }

    #[test]
    fn torch_follows_rig_orientation() {
        let rig = PlayerRig::new(&RigConfig::default());
        let (pos, target) = rig.torch_world();
        assert!((pos - Vec3::new(1.0, 1.2, -0.3)).length() < 1e-5);
        assert!((target - Vec3::new(-1.0, 1.2, 0.0)).length() < 1e-5);
        assert_eq!(rig.torch().color, 0xffee88);
    }

    #[test]
    fn visual_labels() {
        assert_eq!(Visual::Absent.label(), "absent");
        assert_eq!(Visual::Placeholder.label(), "placeholder");
        assert!(Visual::Placeholder.is_present());
    }
}
