//! Multi-frame hand-off between two camera poses and visual profiles.
//!
//! A session runs three stages, one step per frame tick: the effect volume
//! fades in, the pose/FOV/visual blend advances along an easing curve, then
//! the volume fades out. Every stage lasts at least one tick and its last
//! tick lands exactly on the stage target.

use std::fmt;
use std::str::FromStr;

use embody_config::TransitionConfig;
use thiserror::Error;
use tracing::{debug, warn};

use crate::camera::CameraSnapshot;
use crate::visual::{VisualBlender, VisualSnapshot};

/// Unrecognized easing curve name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown easing curve '{0}'")]
pub struct EasingParseError(pub String);

/// Easing curves for the pose blend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EasingFunction {
    /// Constant speed, no acceleration.
    Linear,
    /// Slow start, fast end.
    EaseIn,
    /// Fast start, slow end.
    EaseOut,
    /// Slow start, fast middle, slow end (quadratic).
    EaseInOut,
    /// Half-cosine ease in and out.
    #[default]
    CosineInOut,
}

impl EasingFunction {
    /// Map a linear progress value (0.0..=1.0) to an eased value.
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            EasingFunction::Linear => t,
            EasingFunction::EaseIn => t * t,
            EasingFunction::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            EasingFunction::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            EasingFunction::CosineInOut => 0.5 - 0.5 * (std::f32::consts::PI * t).cos(),
        }
    }

    /// Parse a configured curve name, falling back to the default on unknown names.
    pub fn from_config(name: &str) -> Self {
        name.parse().unwrap_or_else(|err: EasingParseError| {
            let fallback = Self::default();
            warn!("{err}, using {fallback}");
            fallback
        })
    }
}

impl FromStr for EasingFunction {
    type Err = EasingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "ease-in" => Ok(Self::EaseIn),
            "ease-out" => Ok(Self::EaseOut),
            "ease-in-out" => Ok(Self::EaseInOut),
            "cosine-in-out" => Ok(Self::CosineInOut),
            _ => Err(EasingParseError(s.to_string())),
        }
    }
}

impl fmt::Display for EasingFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Linear => "linear",
            Self::EaseIn => "ease-in",
            Self::EaseOut => "ease-out",
            Self::EaseInOut => "ease-in-out",
            Self::CosineInOut => "cosine-in-out",
        };
        f.write_str(name)
    }
}

/// Current stage of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionStage {
    FadeIn,
    PoseBlend,
    FadeOut,
}

/// Output of one session step.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionFrame {
    /// Stage this step belonged to.
    pub stage: TransitionStage,
    /// View to show this frame.
    pub view: CameraSnapshot,
    /// Parameters for the effect volume this frame.
    pub visual: VisualSnapshot,
    pub blend_weight: f32,
    pub volume_weight: f32,
    /// True on the step that completed the session.
    pub finished: bool,
}

/// State of one in-flight hand-off.
#[derive(Debug)]
pub struct TransitionSession {
    from_view: CameraSnapshot,
    to_view: CameraSnapshot,
    from_visual: VisualSnapshot,
    to_visual: VisualSnapshot,
    blender: VisualBlender,
    easing: EasingFunction,
    fade_in_ticks: u32,
    blend_ticks: u32,
    fade_out_ticks: u32,
    stage: TransitionStage,
    elapsed_ticks: u32,
    blend_weight: f32,
    volume_weight: f32,
    finished: bool,
}

impl TransitionSession {
    /// Durations of 0 are clamped to one tick.
    pub fn new(
        from_view: CameraSnapshot,
        to_view: CameraSnapshot,
        from_visual: VisualSnapshot,
        to_visual: VisualSnapshot,
        config: &TransitionConfig,
        easing: EasingFunction,
    ) -> Self {
        Self {
            from_view,
            to_view,
            from_visual,
            to_visual,
            blender: VisualBlender::new(),
            easing,
            fade_in_ticks: config.fade_in_ticks.max(1),
            blend_ticks: config.blend_ticks.max(1),
            fade_out_ticks: config.fade_out_ticks.max(1),
            stage: TransitionStage::FadeIn,
            elapsed_ticks: 0,
            blend_weight: 0.0,
            volume_weight: 0.0,
            finished: false,
        }
    }

    pub fn stage(&self) -> TransitionStage {
        self.stage
    }

    pub fn blend_weight(&self) -> f32 {
        self.blend_weight
    }

    pub fn volume_weight(&self) -> f32 {
        self.volume_weight
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Total number of steps from start to finish.
    pub fn total_ticks(&self) -> u32 {
        self.fade_in_ticks + self.blend_ticks + self.fade_out_ticks
    }

    pub fn to_view(&self) -> &CameraSnapshot {
        &self.to_view
    }

    pub fn to_visual(&self) -> &VisualSnapshot {
        &self.to_visual
    }

    /// Advance one frame tick. Stepping a finished session repeats its final frame.
    pub fn step(&mut self) -> TransitionFrame {
        let stage = self.stage;
        if !self.finished {
            self.elapsed_ticks += 1;
            match self.stage {
                TransitionStage::FadeIn => {
                    self.volume_weight = progress(self.elapsed_ticks, self.fade_in_ticks);
                    if self.elapsed_ticks >= self.fade_in_ticks {
                        self.enter_stage(TransitionStage::PoseBlend);
                    }
                }
                TransitionStage::PoseBlend => {
                    let linear = progress(self.elapsed_ticks, self.blend_ticks);
                    self.blend_weight = if linear >= 1.0 {
                        1.0
                    } else {
                        self.easing.apply(linear).max(self.blend_weight)
                    };
                    if self.elapsed_ticks >= self.blend_ticks {
                        self.enter_stage(TransitionStage::FadeOut);
                    }
                }
                TransitionStage::FadeOut => {
                    self.volume_weight = 1.0 - progress(self.elapsed_ticks, self.fade_out_ticks);
                    if self.elapsed_ticks >= self.fade_out_ticks {
                        self.finished = true;
                        debug!("Transition session finished");
                    }
                }
            }
        }

        let view = if self.blend_weight >= 1.0 {
            self.to_view
        } else {
            self.from_view.interpolate(&self.to_view, self.blend_weight)
        };
        let visual = self
            .blender
            .blend(&self.from_visual, &self.to_visual, self.blend_weight);

        TransitionFrame {
            stage,
            view,
            visual,
            blend_weight: self.blend_weight,
            volume_weight: self.volume_weight,
            finished: self.finished,
        }
    }

    fn enter_stage(&mut self, stage: TransitionStage) {
        debug!(from = ?self.stage, to = ?stage, "Transition stage advanced");
        self.stage = stage;
        self.elapsed_ticks = 0;
    }
}

/// `elapsed / total`, exactly 1.0 on the last tick.
fn progress(elapsed: u32, total: u32) -> f32 {
    if elapsed >= total {
        1.0
    } else {
        elapsed as f32 / total as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visual::VisualValue;
    use glam::{Quat, Vec3};
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    fn view_a() -> CameraSnapshot {
        CameraSnapshot {
            position: Vec3::new(0.0, 1.1, 0.0),
            rotation: Quat::IDENTITY,
            fov_y: FRAC_PI_4,
        }
    }

    fn view_b() -> CameraSnapshot {
        CameraSnapshot {
            position: Vec3::new(2.0, 0.25, 0.0),
            rotation: Quat::from_rotation_y(FRAC_PI_2),
            fov_y: FRAC_PI_2,
        }
    }

    fn visual(exposure: f32) -> VisualSnapshot {
        let mut snapshot = VisualSnapshot::default();
        snapshot.insert("exposure", VisualValue::Scalar(exposure));
        snapshot
    }

    fn config(fade_in: u32, blend: u32, fade_out: u32) -> TransitionConfig {
        TransitionConfig {
            fade_in_ticks: fade_in,
            blend_ticks: blend,
            fade_out_ticks: fade_out,
            easing: "cosine-in-out".to_string(),
        }
    }

    fn session(fade_in: u32, blend: u32, fade_out: u32) -> TransitionSession {
        TransitionSession::new(
            view_a(),
            view_b(),
            visual(0.0),
            visual(1.0),
            &config(fade_in, blend, fade_out),
            EasingFunction::CosineInOut,
        )
    }

    fn run(session: &mut TransitionSession) -> Vec<TransitionFrame> {
        let mut frames = Vec::new();
        for _ in 0..1000 {
            let frame = session.step();
            let done = frame.finished;
            frames.push(frame);
            if done {
                break;
            }
        }
        frames
    }

    #[test]
    fn test_easing_endpoints() {
        for easing in [
            EasingFunction::Linear,
            EasingFunction::EaseIn,
            EasingFunction::EaseOut,
            EasingFunction::EaseInOut,
            EasingFunction::CosineInOut,
        ] {
            assert!(easing.apply(0.0).abs() < 1e-6, "{easing} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6, "{easing} at 1");
        }
        assert!((EasingFunction::CosineInOut.apply(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_easing_parse_and_display() {
        for name in ["linear", "ease-in", "ease-out", "ease-in-out", "cosine-in-out"] {
            let easing: EasingFunction = name.parse().unwrap();
            assert_eq!(easing.to_string(), name);
        }
        assert_eq!(
            "bounce".parse::<EasingFunction>(),
            Err(EasingParseError("bounce".to_string()))
        );
        assert_eq!(EasingFunction::from_config("bounce"), EasingFunction::CosineInOut);
        assert_eq!(EasingFunction::from_config(" Linear "), EasingFunction::Linear);
    }

    #[test]
    fn test_stage_lengths() {
        let mut session = session(3, 5, 4);
        assert_eq!(session.total_ticks(), 12);
        let frames = run(&mut session);
        assert_eq!(frames.len(), 12);
        let stages: Vec<TransitionStage> = frames.iter().map(|f| f.stage).collect();
        assert_eq!(&stages[..3], &[TransitionStage::FadeIn; 3]);
        assert_eq!(&stages[3..8], &[TransitionStage::PoseBlend; 5]);
        assert_eq!(&stages[8..], &[TransitionStage::FadeOut; 4]);
        assert!(session.is_finished());
    }

    #[test]
    fn test_volume_ramps_up_then_down() {
        let mut session = session(4, 6, 4);
        let frames = run(&mut session);

        let fade_in: Vec<f32> = frames[..4].iter().map(|f| f.volume_weight).collect();
        assert!(fade_in.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(fade_in[3], 1.0);

        assert!(frames[4..10].iter().all(|f| f.volume_weight == 1.0));

        let fade_out: Vec<f32> = frames[10..].iter().map(|f| f.volume_weight).collect();
        assert!(fade_out.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(*fade_out.last().unwrap(), 0.0);
    }

    #[test]
    fn test_blend_weight_monotonic_and_exact_at_end() {
        let mut session = session(2, 45, 2);
        let frames = run(&mut session);

        let weights: Vec<f32> = frames.iter().map(|f| f.blend_weight).collect();
        assert!(weights.windows(2).all(|w| w[0] <= w[1]));
        assert!(frames[..2].iter().all(|f| f.blend_weight == 0.0));
        assert_eq!(frames[2 + 44].blend_weight, 1.0);
        assert_eq!(*weights.last().unwrap(), 1.0);
    }

    #[test]
    fn test_view_and_visual_land_on_target() {
        let mut session = session(1, 10, 1);
        let frames = run(&mut session);
        let last = frames.last().unwrap();
        assert_eq!(last.view, view_b());
        assert_eq!(last.visual.get("exposure"), Some(&VisualValue::Scalar(1.0)));

        // Fade-in shows the start pose.
        assert_eq!(frames[0].view.position, view_a().position);
    }

    #[test]
    fn test_mid_blend_is_between_endpoints() {
        let mut session = session(1, 4, 1);
        session.step();
        session.step();
        let frame = session.step();
        assert_eq!(frame.stage, TransitionStage::PoseBlend);
        assert!((frame.blend_weight - 0.5).abs() < 1e-5);
        assert!((frame.view.position - Vec3::new(1.0, 0.675, 0.0)).length() < 1e-4);
        assert!((frame.view.fov_y - (FRAC_PI_4 + FRAC_PI_2) / 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_durations_take_one_tick_each() {
        let mut session = session(0, 0, 0);
        let frames = run(&mut session);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].volume_weight, 1.0);
        assert_eq!(frames[1].blend_weight, 1.0);
        assert_eq!(frames[2].volume_weight, 0.0);
        assert!(frames[2].finished);
    }

    #[test]
    fn test_step_after_finish_repeats_final_frame() {
        let mut session = session(1, 1, 1);
        let frames = run(&mut session);
        let again = session.step();
        assert_eq!(again.view, frames.last().unwrap().view);
        assert_eq!(again.volume_weight, 0.0);
        assert!(again.finished);
    }
}
