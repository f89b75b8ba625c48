//! Player-facing control: look, cameras, visual blending, embodiments, and
//! the coordinator that hands control between the standard and drone bodies.

pub mod camera;
pub mod coordinator;
pub mod embodiment;
pub mod input;
pub mod look;
pub mod transition;
pub mod visual;

pub use camera::{Camera, CameraSnapshot};
pub use coordinator::{ModeTransitionCoordinator, PhaseParseError, PlayPhase};
pub use embodiment::{BODY_LAYER, Embodiment, EmbodimentKind};
pub use input::{InputFrame, InputSource, ScriptedInput};
pub use look::{LookController, normalize_angle, turn_right};
pub use transition::{
    EasingFunction, EasingParseError, TransitionFrame, TransitionSession, TransitionStage,
};
pub use visual::{EffectVolume, VisualBlender, VisualSnapshot, VisualValue, blend_srgb};
