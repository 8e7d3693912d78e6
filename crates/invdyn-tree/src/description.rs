//! Serializable model descriptions.
//!
//! A [`ModelDescription`] is the input to
//! [`TreeEngine::load_model`](crate::TreeEngine). It is plain data:
//! parse it from JSON with [`from_json_str`](ModelDescription::from_json_str)
//! or [`from_path`](ModelDescription::from_path), or build it in code.
//! Structural checks happen in [`validate`](ModelDescription::validate),
//! which model construction calls first.
//!
//! # Format
//!
//! ```json
//! {
//!   "name": "pendulum",
//!   "gravity": [0.0, -9.81, 0.0],
//!   "bodies": [{
//!     "name": "rod",
//!     "mass": 1.0,
//!     "mass_center": [0.0, -1.0, 0.0],
//!     "inertia": [0.0, 0.0, 0.1, 0.0, 0.0, 0.0],
//!     "joint": {
//!       "parent": "ground",
//!       "kind": "revolute",
//!       "axis": [0.0, 0.0, 1.0],
//!       "coordinate": { "name": "theta" }
//!     }
//!   }],
//!   "actuators": [{ "name": "theta_motor", "coordinate": "theta" }]
//! }
//! ```
//!
//! Bodies must be listed parent-first; `"ground"` is the implicit root.

use std::collections::HashSet;
use std::path::Path;

use invdyn_core::ModelLoadError;
use serde::{Deserialize, Serialize};

/// Name of the implicit root frame.
pub const GROUND: &str = "ground";

fn default_gravity() -> [f64; 3] {
    [0.0, -9.80665, 0.0]
}

fn default_axis() -> [f64; 3] {
    [0.0, 0.0, 1.0]
}

fn default_parent() -> String {
    GROUND.to_string()
}

fn default_optimal_force() -> f64 {
    1.0
}

/// Complete description of a rigid-body tree model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDescription {
    /// Model name, used in logs.
    pub name: String,
    /// Gravity vector in ground (m/s²). Default: `[0, -9.80665, 0]`.
    #[serde(default = "default_gravity")]
    pub gravity: [f64; 3],
    /// Bodies in parent-first order.
    pub bodies: Vec<BodyDescription>,
    /// Markers fixed on bodies.
    #[serde(default)]
    pub markers: Vec<MarkerDescription>,
    /// Coordinate actuators, one control each, in control-vector order.
    #[serde(default)]
    pub actuators: Vec<ActuatorDescription>,
    /// Muscles contributing to the metabolic probe.
    #[serde(default)]
    pub muscles: Vec<MuscleDescription>,
    /// Whole-body metabolic probe parameters.
    #[serde(default)]
    pub metabolic_probe: MetabolicProbeDescription,
}

/// One rigid body and the joint connecting it to its parent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BodyDescription {
    /// Unique body name.
    pub name: String,
    /// Mass (kg).
    pub mass: f64,
    /// Mass center in the body frame (m).
    #[serde(default)]
    pub mass_center: [f64; 3],
    /// Inertia about the mass center in the body frame:
    /// `[xx, yy, zz, xy, xz, yz]` (kg·m²).
    #[serde(default)]
    pub inertia: [f64; 6],
    /// Joint to the parent body.
    pub joint: JointDescription,
}

/// Kind of joint between a body and its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointKind {
    /// One rotational coordinate about `axis`.
    Revolute,
    /// One translational coordinate along `axis`.
    Prismatic,
    /// Rigid attachment, no coordinate.
    Weld,
}

/// Joint placement and its coordinate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JointDescription {
    /// Parent body name, or `"ground"`.
    #[serde(default = "default_parent")]
    pub parent: String,
    /// Joint kind.
    pub kind: JointKind,
    /// Joint axis in the parent frame. Normalized on load.
    #[serde(default = "default_axis")]
    pub axis: [f64; 3],
    /// Child frame origin in the parent frame (m).
    #[serde(default)]
    pub location_in_parent: [f64; 3],
    /// The joint's coordinate. Required for revolute and prismatic
    /// joints, forbidden for welds.
    #[serde(default)]
    pub coordinate: Option<CoordinateDescription>,
}

/// A generalized coordinate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoordinateDescription {
    /// Unique coordinate name.
    pub name: String,
    /// Value in a freshly initialized state (rad or m).
    #[serde(default)]
    pub default_value: f64,
    /// Speed in a freshly initialized state.
    #[serde(default)]
    pub default_speed: f64,
    /// Locked coordinates keep their default value.
    #[serde(default)]
    pub locked: bool,
}

/// A marker fixed on a body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkerDescription {
    /// Unique marker name.
    pub name: String,
    /// Parent body name.
    pub body: String,
    /// Location in the body frame (m).
    #[serde(default)]
    pub location: [f64; 3],
}

/// An ideal actuator applying `control * optimal_force` to one coordinate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActuatorDescription {
    /// Actuator name.
    pub name: String,
    /// Driven coordinate.
    pub coordinate: String,
    /// Force (or torque) per unit control. Default: 1.0.
    #[serde(default = "default_optimal_force")]
    pub optimal_force: f64,
}

/// A muscle spanning one coordinate, used for energetics only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MuscleDescription {
    /// Muscle name.
    pub name: String,
    /// Spanned coordinate.
    pub coordinate: String,
    /// Peak isometric force (N).
    pub max_isometric_force: f64,
    /// Signed moment arm about the spanned coordinate (m).
    pub moment_arm: f64,
    /// Muscle mass (kg).
    pub mass: f64,
    /// Activation heat rate per unit mass at full activation (W/kg).
    #[serde(default)]
    pub activation_heat_rate: f64,
    /// Maintenance heat rate per unit mass at full activation (W/kg).
    #[serde(default)]
    pub maintenance_heat_rate: f64,
}

/// Whole-body metabolic probe parameters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetabolicProbeDescription {
    /// Constant basal rate added to the muscle total (W).
    #[serde(default)]
    pub basal_rate: f64,
}

impl ModelDescription {
    /// Parse a description from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ModelLoadError> {
        serde_json::from_str(text).map_err(|e| ModelLoadError::Parse {
            reason: e.to_string(),
        })
    }

    /// Read and parse a JSON description from `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ModelLoadError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&text)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> String {
        // Plain data with string keys: serialization cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Check structural invariants.
    ///
    /// Bodies must be uniquely named and listed parent-first; joint
    /// kinds and coordinates must agree; every marker, actuator and
    /// muscle must reference an existing body or coordinate; all
    /// numeric parameters must be finite and physically meaningful.
    pub fn validate(&self) -> Result<(), ModelLoadError> {
        let invalid = |reason: String| Err(ModelLoadError::Invalid { reason });

        if self.name.trim().is_empty() {
            return invalid("model name is empty".into());
        }
        if !all_finite(&self.gravity) {
            return invalid(format!("gravity {:?} is not finite", self.gravity));
        }
        if self.bodies.is_empty() {
            return invalid("model has no bodies".into());
        }

        let mut bodies: HashSet<&str> = HashSet::new();
        let mut coordinates: HashSet<&str> = HashSet::new();
        let mut total_mass = 0.0;
        for body in &self.bodies {
            let name = body.name.as_str();
            if name.is_empty() || name == GROUND {
                return invalid(format!("body name '{name}' is reserved or empty"));
            }
            if !body.mass.is_finite() || body.mass < 0.0 {
                return invalid(format!("body '{name}' mass must be finite and >= 0"));
            }
            total_mass += body.mass;
            if !all_finite(&body.mass_center) || !all_finite(&body.inertia) {
                return invalid(format!("body '{name}' has non-finite mass properties"));
            }
            if body.inertia[..3].iter().any(|&m| m < 0.0) {
                return invalid(format!("body '{name}' has a negative principal moment"));
            }
            let joint = &body.joint;
            if joint.parent != GROUND && !bodies.contains(joint.parent.as_str()) {
                return invalid(format!(
                    "body '{name}' references parent '{}' which is not declared before it",
                    joint.parent
                ));
            }
            if !all_finite(&joint.location_in_parent) {
                return invalid(format!("joint of body '{name}' has a non-finite location"));
            }
            match (joint.kind, &joint.coordinate) {
                (JointKind::Weld, Some(c)) => {
                    return invalid(format!(
                        "weld joint of body '{name}' cannot carry coordinate '{}'",
                        c.name
                    ));
                }
                (JointKind::Revolute | JointKind::Prismatic, None) => {
                    return invalid(format!("joint of body '{name}' needs a coordinate"));
                }
                (JointKind::Revolute | JointKind::Prismatic, Some(c)) => {
                    let norm = joint.axis.iter().map(|a| a * a).sum::<f64>().sqrt();
                    if !norm.is_finite() || norm < 1e-12 {
                        return invalid(format!("joint of body '{name}' has a degenerate axis"));
                    }
                    if c.name.is_empty() || !coordinates.insert(c.name.as_str()) {
                        return invalid(format!(
                            "coordinate name '{}' is empty or duplicated",
                            c.name
                        ));
                    }
                    if !c.default_value.is_finite() || !c.default_speed.is_finite() {
                        return invalid(format!(
                            "coordinate '{}' has a non-finite default",
                            c.name
                        ));
                    }
                }
                (JointKind::Weld, None) => {}
            }
            if !bodies.insert(name) {
                return invalid(format!("duplicate body name '{name}'"));
            }
        }
        if total_mass <= 0.0 {
            return invalid("total model mass must be positive".into());
        }

        let mut markers: HashSet<&str> = HashSet::new();
        for marker in &self.markers {
            if !markers.insert(marker.name.as_str()) {
                return invalid(format!("duplicate marker name '{}'", marker.name));
            }
            if !bodies.contains(marker.body.as_str()) {
                return invalid(format!(
                    "marker '{}' references unknown body '{}'",
                    marker.name, marker.body
                ));
            }
            if !all_finite(&marker.location) {
                return invalid(format!("marker '{}' has a non-finite location", marker.name));
            }
        }

        for actuator in &self.actuators {
            if !coordinates.contains(actuator.coordinate.as_str()) {
                return invalid(format!(
                    "actuator '{}' references unknown coordinate '{}'",
                    actuator.name, actuator.coordinate
                ));
            }
            if !actuator.optimal_force.is_finite() {
                return invalid(format!(
                    "actuator '{}' optimal_force is not finite",
                    actuator.name
                ));
            }
        }

        for muscle in &self.muscles {
            if !coordinates.contains(muscle.coordinate.as_str()) {
                return invalid(format!(
                    "muscle '{}' references unknown coordinate '{}'",
                    muscle.name, muscle.coordinate
                ));
            }
            let params = [
                muscle.max_isometric_force,
                muscle.mass,
                muscle.activation_heat_rate,
                muscle.maintenance_heat_rate,
            ];
            if !muscle.moment_arm.is_finite() || params.iter().any(|p| !p.is_finite() || *p < 0.0)
            {
                return invalid(format!(
                    "muscle '{}' parameters must be finite and non-negative",
                    muscle.name
                ));
            }
        }

        if !self.metabolic_probe.basal_rate.is_finite() {
            return invalid("metabolic probe basal_rate is not finite".into());
        }
        Ok(())
    }
}

impl JointDescription {
    /// Revolute joint about `axis` carrying coordinate `coordinate`.
    pub fn revolute(parent: &str, axis: [f64; 3], coordinate: &str) -> Self {
        Self::with_coordinate(JointKind::Revolute, parent, axis, coordinate)
    }

    /// Prismatic joint along `axis` carrying coordinate `coordinate`.
    pub fn prismatic(parent: &str, axis: [f64; 3], coordinate: &str) -> Self {
        Self::with_coordinate(JointKind::Prismatic, parent, axis, coordinate)
    }

    /// Weld to `parent`.
    pub fn weld(parent: &str) -> Self {
        Self {
            parent: parent.to_string(),
            kind: JointKind::Weld,
            axis: default_axis(),
            location_in_parent: [0.0; 3],
            coordinate: None,
        }
    }

    /// Set the child-frame origin in the parent frame.
    pub fn at(mut self, location_in_parent: [f64; 3]) -> Self {
        self.location_in_parent = location_in_parent;
        self
    }

    /// Lock the joint's coordinate at `value`.
    pub fn locked_at(mut self, value: f64) -> Self {
        if let Some(c) = self.coordinate.as_mut() {
            c.locked = true;
            c.default_value = value;
        }
        self
    }

    fn with_coordinate(kind: JointKind, parent: &str, axis: [f64; 3], coordinate: &str) -> Self {
        Self {
            parent: parent.to_string(),
            kind,
            axis,
            location_in_parent: [0.0; 3],
            coordinate: Some(CoordinateDescription {
                name: coordinate.to_string(),
                default_value: 0.0,
                default_speed: 0.0,
                locked: false,
            }),
        }
    }
}

fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}
