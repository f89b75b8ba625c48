//! Post-processing parameter snapshots and blending between them.
//!
//! Scalars and vectors lerp, colors blend in linear light, and discrete
//! values (toggles, modes) switch to the end value as soon as the weight
//! leaves zero.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use tracing::warn;

pub use embody_config::VisualValue;

/// Named set of post-processing parameters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VisualSnapshot(BTreeMap<String, VisualValue>);

impl VisualSnapshot {
    pub fn get(&self, name: &str) -> Option<&VisualValue> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: VisualValue) {
        self.0.insert(name.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &VisualValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, VisualValue>> for VisualSnapshot {
    fn from(parameters: BTreeMap<String, VisualValue>) -> Self {
        Self(parameters)
    }
}

/// The post-processing surface written during transitions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectVolume {
    /// Overall contribution of the volume, 0..=1.
    pub weight: f32,
    pub parameters: VisualSnapshot,
}

fn srgb_to_linear(value: f32) -> f32 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(value: f32) -> f32 {
    if value <= 0.003_130_8 {
        value * 12.92
    } else {
        1.055 * value.powf(1.0 / 2.4) - 0.055
    }
}

fn lerp(a: f32, b: f32, w: f32) -> f32 {
    a * (1.0 - w) + b * w
}

/// Blend two sRGB colors in linear light. Alpha is blended linearly.
pub fn blend_srgb(a: [f32; 4], b: [f32; 4], w: f32) -> [f32; 4] {
    let channel = |i: usize| {
        linear_to_srgb(lerp(
            srgb_to_linear(a[i].max(0.0)),
            srgb_to_linear(b[i].max(0.0)),
            w,
        ))
    };
    [channel(0), channel(1), channel(2), lerp(a[3], b[3], w)]
}

/// Interpolates snapshots. Mismatched parameters are reported once per blender.
#[derive(Debug, Default)]
pub struct VisualBlender {
    reported: FxHashSet<String>,
}

impl VisualBlender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blend every parameter present in both snapshots with matching kinds.
    pub fn blend(&mut self, start: &VisualSnapshot, end: &VisualSnapshot, w: f32) -> VisualSnapshot {
        let w = w.clamp(0.0, 1.0);
        let mut out = VisualSnapshot::default();

        for (name, from) in start.iter() {
            let Some(to) = end.get(name) else {
                self.report(name, "missing from the target profile");
                continue;
            };
            match blend_value(from, to, w) {
                Some(value) => out.insert(name.clone(), value),
                None => self.report(name, "has different kinds in the two profiles"),
            }
        }
        for (name, _) in end.iter() {
            if start.get(name).is_none() {
                self.report(name, "missing from the source profile");
            }
        }

        out
    }

    /// Parameter names reported so far.
    pub fn reported(&self) -> impl Iterator<Item = &str> {
        self.reported.iter().map(String::as_str)
    }

    fn report(&mut self, name: &str, reason: &str) {
        if self.reported.insert(name.to_string()) {
            warn!("Visual parameter '{name}' {reason}, skipping");
        }
    }
}

fn blend_value(from: &VisualValue, to: &VisualValue, w: f32) -> Option<VisualValue> {
    let value = match (from, to) {
        (VisualValue::Scalar(a), VisualValue::Scalar(b)) => VisualValue::Scalar(lerp(*a, *b, w)),
        (VisualValue::Vector(a), VisualValue::Vector(b)) => VisualValue::Vector([
            lerp(a[0], b[0], w),
            lerp(a[1], b[1], w),
            lerp(a[2], b[2], w),
        ]),
        (VisualValue::Color(a), VisualValue::Color(b)) => VisualValue::Color(blend_srgb(*a, *b, w)),
        (VisualValue::Toggle(a), VisualValue::Toggle(b)) => {
            VisualValue::Toggle(if w > 0.0 { *b } else { *a })
        }
        (VisualValue::Mode(a), VisualValue::Mode(b)) => {
            VisualValue::Mode(if w > 0.0 { b.clone() } else { a.clone() })
        }
        _ => return None,
    };
    Some(value)
}
