//! Top-level play phase state machine and embodiment hand-off.
//!
//! The coordinator owns both embodiments. Exactly one is active outside a
//! transition: its controllers are enabled, its body is awake and its camera
//! renders. The other is frozen with controls off. A switch freezes the
//! outgoing body, blends the view over several frames on the outgoing camera,
//! then wakes the incoming body and hands it the view.

use std::fmt;
use std::str::FromStr;

use bevy_ecs::prelude::*;
use embody_config::{Config, TransitionConfig};
use embody_physics::{GravityState, LocomotionTick, PhysicsWorld};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::camera::CameraSnapshot;
use crate::embodiment::{Embodiment, EmbodimentKind};
use crate::input::InputFrame;
use crate::transition::{EasingFunction, TransitionSession};
use crate::visual::EffectVolume;

/// Unrecognized play phase name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown play phase '{0}'")]
pub struct PhaseParseError(pub String);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PlayPhase {
    #[default]
    Standard,
    Drone,
    Transitioning,
}

impl PlayPhase {
    /// The embodiment in control during this phase, if any.
    pub fn embodiment(self) -> Option<EmbodimentKind> {
        match self {
            Self::Standard => Some(EmbodimentKind::Standard),
            Self::Drone => Some(EmbodimentKind::Drone),
            Self::Transitioning => None,
        }
    }
}

impl From<EmbodimentKind> for PlayPhase {
    fn from(kind: EmbodimentKind) -> Self {
        match kind {
            EmbodimentKind::Standard => Self::Standard,
            EmbodimentKind::Drone => Self::Drone,
        }
    }
}

impl FromStr for PlayPhase {
    type Err = PhaseParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "drone" => Ok(Self::Drone),
            "transitioning" => Ok(Self::Transitioning),
            _ => Err(PhaseParseError(s.to_string())),
        }
    }
}

impl fmt::Display for PlayPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Standard => "standard",
            Self::Drone => "drone",
            Self::Transitioning => "transitioning",
        };
        f.write_str(name)
    }
}

/// A session plus the bookkeeping needed to finish it.
#[derive(Debug)]
struct ActiveTransition {
    session: TransitionSession,
    from: EmbodimentKind,
    to: EmbodimentKind,
    /// The outgoing camera's own view, restored on exit.
    outgoing_view: CameraSnapshot,
}

#[derive(Resource, Debug)]
pub struct ModeTransitionCoordinator {
    phase: PlayPhase,
    standard: Embodiment,
    drone: Embodiment,
    volume: EffectVolume,
    transition: TransitionConfig,
    easing: EasingFunction,
    active: Option<ActiveTransition>,
}

impl ModeTransitionCoordinator {
    /// Starting phase comes from `config.start_phase`; unknown names fall back to standard.
    pub fn new(standard: Embodiment, drone: Embodiment, config: &Config) -> Self {
        let phase = match config.start_phase.parse::<PlayPhase>() {
            Ok(PlayPhase::Transitioning) => {
                warn!("Cannot start in the transitioning phase, starting as standard");
                PlayPhase::Standard
            }
            Ok(phase) => phase,
            Err(err) => {
                warn!("{err}, starting as standard");
                PlayPhase::Standard
            }
        };

        Self {
            phase,
            standard,
            drone,
            volume: EffectVolume::default(),
            transition: config.transition.clone(),
            easing: EasingFunction::from_config(&config.transition.easing),
            active: None,
        }
    }

    /// Put both embodiments into the state the starting phase requires.
    pub fn initialize<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) {
        let Some(current) = self.phase.embodiment() else {
            return;
        };
        for kind in [EmbodimentKind::Standard, EmbodimentKind::Drone] {
            let is_active = kind == current;
            let embodiment = self.embodiment_mut(kind);
            embodiment.initialize(world);
            embodiment.set_controls_enabled(is_active);
            embodiment.set_frozen(world, !is_active);
            embodiment.camera_mut().set_enabled(is_active);
        }
        self.volume.weight = 0.0;
        self.volume.parameters = self.embodiment(current).visual_profile().clone();
        info!(phase = %self.phase, "Mode coordinator initialized");
    }

    pub fn phase(&self) -> PlayPhase {
        self.phase
    }

    pub fn is_transitioning(&self) -> bool {
        self.phase == PlayPhase::Transitioning
    }

    pub fn embodiment(&self, kind: EmbodimentKind) -> &Embodiment {
        match kind {
            EmbodimentKind::Standard => &self.standard,
            EmbodimentKind::Drone => &self.drone,
        }
    }

    fn embodiment_mut(&mut self, kind: EmbodimentKind) -> &mut Embodiment {
        match kind {
            EmbodimentKind::Standard => &mut self.standard,
            EmbodimentKind::Drone => &mut self.drone,
        }
    }

    /// The embodiment in control, `None` while transitioning.
    pub fn active_embodiment(&self) -> Option<&Embodiment> {
        self.phase.embodiment().map(|kind| self.embodiment(kind))
    }

    pub fn volume(&self) -> &EffectVolume {
        &self.volume
    }

    pub fn session(&self) -> Option<&TransitionSession> {
        self.active.as_ref().map(|active| &active.session)
    }

    /// Embodiment whose camera is currently showing the view.
    pub fn viewing_embodiment(&self) -> EmbodimentKind {
        match (&self.active, self.phase.embodiment()) {
            (Some(active), _) => active.from,
            (None, Some(kind)) => kind,
            (None, None) => EmbodimentKind::Standard,
        }
    }

    /// Toggle between the standard and drone embodiments. Returns whether a transition began.
    pub fn request_switch<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) -> bool {
        match self.phase.embodiment() {
            Some(kind) => self.change_play_phase(world, kind.other().into()),
            None => {
                debug!("Switch ignored, a transition is already running");
                false
            }
        }
    }

    /// Request a phase by name. Unknown names are warned about and ignored.
    pub fn change_play_phase_named<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        name: &str,
    ) -> bool {
        match name.parse::<PlayPhase>() {
            Ok(target) => self.change_play_phase(world, target),
            Err(err) => {
                warn!("{err}, phase unchanged");
                false
            }
        }
    }

    /// Begin a transition to `target`. Returns whether one began.
    pub fn change_play_phase<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        target: PlayPhase,
    ) -> bool {
        let Some(to) = target.embodiment() else {
            warn!("Transitioning is not a valid target phase");
            return false;
        };
        let Some(from) = self.phase.embodiment() else {
            debug!(%target, "Phase change ignored, a transition is already running");
            return false;
        };
        if from == to {
            return false;
        }

        let outgoing = self.embodiment(from);
        let vy = outgoing.vertical_velocity(world);
        if vy != 0.0 {
            debug!(vy, "Switch rejected, outgoing body is moving vertically");
            return false;
        }
        // vy is still zero on the first airborne tick after leaving a ledge.
        if outgoing.locomotion().state() != GravityState::Ground {
            debug!("Switch rejected, outgoing body is airborne");
            return false;
        }

        self.begin_transition(world, from, to);
        true
    }

    fn begin_transition<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        from: EmbodimentKind,
        to: EmbodimentKind,
    ) {
        self.standard.sync_camera(world);
        self.drone.sync_camera(world);

        let outgoing = self.embodiment(from);
        let incoming = self.embodiment(to);
        let session = TransitionSession::new(
            outgoing.camera().snapshot(),
            incoming.camera().snapshot(),
            outgoing.visual_profile().clone(),
            incoming.visual_profile().clone(),
            &self.transition,
            self.easing,
        );
        let outgoing_view = outgoing.camera().snapshot();

        let outgoing = self.embodiment_mut(from);
        outgoing.set_controls_enabled(false);
        outgoing.set_frozen(world, true);

        self.volume.parameters = self.embodiment(from).visual_profile().clone();
        self.volume.weight = 0.0;
        self.active = Some(ActiveTransition {
            session,
            from,
            to,
            outgoing_view,
        });
        self.phase = PlayPhase::Transitioning;
        info!(%from, %to, "Embodiment transition started");
    }

    /// Frame tick: switch handling, input routing, transition step.
    pub fn on_frame_tick<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W, input: &InputFrame) {
        let was_transitioning = self.is_transitioning();
        if input.switch_pressed {
            self.request_switch(world);
        }

        if was_transitioning {
            self.step_transition(world);
        } else if let Some(kind) = self.phase.embodiment() {
            self.embodiment_mut(kind).on_frame_tick(input);
        }
    }

    /// Fixed tick: only the active embodiment simulates.
    pub fn on_fixed_tick<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        dt: f32,
    ) -> Option<LocomotionTick> {
        let kind = self.phase.embodiment()?;
        self.embodiment_mut(kind).on_fixed_tick(world, dt)
    }

    /// Late frame: the active camera follows its body.
    pub fn on_late_frame<W: PhysicsWorld + ?Sized>(&mut self, world: &W) {
        if let Some(kind) = self.phase.embodiment() {
            self.embodiment_mut(kind).sync_camera(world);
        }
    }

    fn step_transition<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let from = active.from;
        let frame = active.session.step();

        self.embodiment_mut(from).camera_mut().apply_snapshot(&frame.view);
        self.volume.weight = frame.volume_weight;
        self.volume.parameters = frame.visual;

        if frame.finished {
            self.finish_transition(world);
        }
    }

    fn finish_transition<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) {
        let Some(active) = self.active.take() else {
            return;
        };

        let incoming = self.embodiment_mut(active.to);
        incoming.set_frozen(world, false);
        incoming.set_controls_enabled(true);
        incoming.sync_camera(world);
        incoming.camera_mut().set_enabled(true);

        let outgoing = self.embodiment_mut(active.from).camera_mut();
        outgoing.apply_snapshot(&active.outgoing_view);
        outgoing.set_enabled(false);

        self.volume.weight = 0.0;
        self.volume.parameters = active.session.to_visual().clone();
        self.phase = active.to.into();
        info!(phase = %self.phase, "Embodiment transition finished");
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
