//! Floor sensing beneath a body.
//!
//! The sensor runs a multi-contact downward probe and orders the results by
//! distance from the body. The nearest contact is authoritative for snapping
//! and slope evaluation.

use embody_config::MovementConfig;
use glam::Vec3;

use crate::world::{BodyHandle, GroundQuery, LayerMask, PhysicsWorld, SurfaceHit};

/// Angle in degrees between a surface normal and world up.
pub fn slope_angle_deg(normal: Vec3) -> f32 {
    normal
        .normalize_or_zero()
        .dot(Vec3::Y)
        .clamp(-1.0, 1.0)
        .acos()
        .to_degrees()
}

/// A single supporting surface under the body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    pub point: Vec3,
    pub normal: Vec3,
    /// Distance from the body position to `point`.
    pub distance: f32,
    pub slope_deg: f32,
}

impl Contact {
    pub fn is_walkable(&self, max_slope_deg: f32) -> bool {
        self.slope_deg <= max_slope_deg
    }
}

/// Result of one probe. Contacts are sorted nearest first; ties keep query order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContactResult {
    contacts: Vec<Contact>,
}

impl ContactResult {
    /// Build a result from raw hits measured against `body_position`.
    pub fn from_hits(body_position: Vec3, hits: Vec<SurfaceHit>) -> Self {
        let mut contacts: Vec<Contact> = hits
            .into_iter()
            .map(|hit| Contact {
                point: hit.point,
                normal: hit.normal,
                distance: body_position.distance(hit.point),
                slope_deg: slope_angle_deg(hit.normal),
            })
            .collect();
        contacts.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Self { contacts }
    }

    pub fn has_contact(&self) -> bool {
        !self.contacts.is_empty()
    }

    pub fn nearest(&self) -> Option<&Contact> {
        self.contacts.first()
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Advisory: whether the nearest contact is within `max_slope_deg`.
    /// No contact is never walkable.
    pub fn is_walkable(&self, max_slope_deg: f32) -> bool {
        self.nearest()
            .is_some_and(|contact| contact.is_walkable(max_slope_deg))
    }
}

/// Downward multi-contact probe with a fixed origin offset, radius and layer filter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundSensor {
    pub probe_offset: Vec3,
    pub radius: f32,
    pub layers: LayerMask,
}

impl GroundSensor {
    pub fn new(probe_offset: Vec3, radius: f32, layers: LayerMask) -> Self {
        Self {
            probe_offset,
            radius,
            layers,
        }
    }

    /// Builds a sensor from movement tuning, resolving layer names against `layer_table`.
    pub fn from_config(config: &MovementConfig, layer_table: &[String]) -> Self {
        Self::new(
            Vec3::from_array(config.probe_offset),
            config.probe_radius,
            LayerMask::from_names(&config.ground_layers, layer_table),
        )
    }

    /// Probe below `body`, ignoring the body's own colliders.
    pub fn probe<W: PhysicsWorld + ?Sized>(
        &self,
        world: &W,
        body: BodyHandle,
        distance: f32,
    ) -> ContactResult {
        self.probe_at(world, world.position(body), distance, Some(body))
    }

    /// Probe below an arbitrary position.
    pub fn probe_at<W: PhysicsWorld + ?Sized>(
        &self,
        world: &W,
        position: Vec3,
        distance: f32,
        exclude: Option<BodyHandle>,
    ) -> ContactResult {
        let hits = world.query_ground(&GroundQuery {
            origin: position + self.probe_offset,
            max_distance: distance,
            radius: self.radius,
            layers: self.layers,
            exclude,
        });
        ContactResult::from_hits(position, hits)
    }
}
