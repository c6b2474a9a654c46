use tumbler_assets::ClipInfo;

/// Playback state of one clip. Clips wrap to their start indefinitely.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipAction {
    pub clip_index: usize,
    pub name: Option<String>,
    pub duration: f32,
    /// Local time in seconds, within `[0, duration]`.
    pub time: f32,
    /// Completed passes through the clip.
    pub loops: u32,
}

impl ClipAction {
    fn advance(&mut self, dt: f32) {
        if self.duration <= 0.0 {
            self.time = 0.0;
            return;
        }
        self.time += dt;
        while self.time >= self.duration {
            self.time -= self.duration;
            self.loops += 1;
        }
    }
}

/// Drives clip playback for a loaded model.
///
/// Holds the clip list of the bundle it was built for and at most one active
/// action. Pose sampling is left to the renderer; the mixer only keeps time.
#[derive(Debug, Clone, Default)]
pub struct AnimationMixer {
    clips: Vec<ClipInfo>,
    active: Option<ClipAction>,
}

impl AnimationMixer {
    pub fn new(clips: Vec<ClipInfo>) -> Self {
        Self {
            clips,
            active: None,
        }
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    /// Start looping clip `index` from its beginning. Returns false if the
    /// bundle has no such clip.
    pub fn play(&mut self, index: usize) -> bool {
        let Some(clip) = self.clips.get(index) else {
            return false;
        };
        self.active = Some(ClipAction {
            clip_index: index,
            name: clip.name.clone(),
            duration: clip.duration,
            time: 0.0,
            loops: 0,
        });
        true
    }

    /// Advance the active action by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if let Some(action) = &mut self.active {
            action.advance(dt);
        }
    }

    pub fn active(&self) -> Option<&ClipAction> {
        self.active.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clips(durations: &[f32]) -> Vec<ClipInfo> {
        durations
            .iter()
            .enumerate()
            .map(|(i, &duration)| ClipInfo {
                name: Some(format!("clip{i}")),
                duration,
            })
            .collect()
    }

    #[test]
    fn play_unknown_clip_is_refused() {
        let mut mixer = AnimationMixer::new(clips(&[1.0]));
        assert!(!mixer.play(1));
        assert!(mixer.active().is_none());
    }

    #[test]
    fn repeat_wraps_and_counts_loops() {
        let mut mixer = AnimationMixer::new(clips(&[1.0, 2.0]));
        assert!(mixer.play(1));
        mixer.update(1.5);
        mixer.update(1.0);
        let action = mixer.active().unwrap();
        assert_eq!(action.clip_index, 1);
        assert_eq!(action.loops, 1);
        assert!((action.time - 0.5).abs() < 1e-6);
    }

    #[test]
    fn large_step_wraps_several_times() {
        let mut mixer = AnimationMixer::new(clips(&[0.5]));
        mixer.play(0);
        mixer.update(1.75);
        let action = mixer.active().unwrap();
        assert_eq!(action.loops, 3);
        assert!((action.time - 0.25).abs() < 1e-6);
    }

    #[test]
    fn zero_duration_clip_stays_at_start() {
        let mut mixer = AnimationMixer::new(clips(&[0.0]));
        mixer.play(0);
        mixer.update(1.0);
        assert_eq!(mixer.active().unwrap().time, 0.0);
    }

    #[test]
    fn update_without_action_is_a_no_op() {
        let mut mixer = AnimationMixer::new(Vec::new());
        mixer.update(0.25);
        assert!(mixer.active().is_none());
    }
}
