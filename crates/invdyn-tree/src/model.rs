//! The loaded tree model.

use indexmap::IndexMap;
use invdyn_core::{
    BodyIndex, CoordinateAccess, CoordinateIndex, EngineError, FrameKinematics, MarkerIndex,
    ModelLoadError, MultibodyModel, Stage, Vec3,
};
use nalgebra::{Matrix3, Unit};

use crate::description::{JointKind, ModelDescription, GROUND};
use crate::dynamics::TreeSolver;
use crate::kinematics;
use crate::state::TreeState;

// ── Internal element types ─────────────────────────────────────────

#[derive(Clone, Debug)]
pub(crate) struct Joint {
    pub(crate) kind: JointKind,
    /// Unit axis in the parent frame.
    pub(crate) axis: Unit<Vec3>,
    pub(crate) location: Vec3,
    pub(crate) coordinate: Option<CoordinateIndex>,
}

#[derive(Clone, Debug)]
pub(crate) struct Body {
    pub(crate) parent: Option<BodyIndex>,
    pub(crate) mass: f64,
    pub(crate) mass_center: Vec3,
    /// About the mass center, body frame.
    pub(crate) inertia: Matrix3<f64>,
    pub(crate) joint: Joint,
}

#[derive(Clone, Debug)]
pub(crate) struct Coordinate {
    pub(crate) default_value: f64,
    pub(crate) default_speed: f64,
    pub(crate) locked: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct Marker {
    pub(crate) body: BodyIndex,
    pub(crate) location: Vec3,
}

#[derive(Clone, Debug)]
pub(crate) struct Actuator {
    pub(crate) coordinate: CoordinateIndex,
    pub(crate) optimal_force: f64,
}

#[derive(Clone, Debug)]
pub(crate) struct Muscle {
    pub(crate) coordinate: CoordinateIndex,
    pub(crate) max_isometric_force: f64,
    pub(crate) moment_arm: f64,
    pub(crate) mass: f64,
    pub(crate) activation_heat_rate: f64,
    pub(crate) maintenance_heat_rate: f64,
}

// ── TreeModel ──────────────────────────────────────────────────────

/// A validated open kinematic tree.
///
/// Bodies are stored parent-first, so a single forward sweep computes
/// kinematics and a single backward sweep accumulates joint forces.
/// Coordinates follow body order: the coordinate of the first
/// articulated body is `CoordinateIndex(0)`.
#[derive(Clone, Debug)]
pub struct TreeModel {
    name: String,
    gravity: Vec3,
    pub(crate) bodies: IndexMap<String, Body>,
    pub(crate) coordinates: IndexMap<String, Coordinate>,
    pub(crate) markers: IndexMap<String, Marker>,
    pub(crate) actuators: Vec<Actuator>,
    pub(crate) muscles: IndexMap<String, Muscle>,
    pub(crate) basal_rate: f64,
    pub(crate) total_mass: f64,
}

impl TreeModel {
    /// Validate `desc` and build a model from it.
    pub fn from_description(desc: &ModelDescription) -> Result<Self, ModelLoadError> {
        desc.validate()?;

        let mut bodies: IndexMap<String, Body> = IndexMap::with_capacity(desc.bodies.len());
        let mut coordinates: IndexMap<String, Coordinate> = IndexMap::new();
        for b in &desc.bodies {
            let parent = if b.joint.parent == GROUND {
                None
            } else {
                bodies.get_index_of(&b.joint.parent).map(BodyIndex)
            };
            let coordinate = b.joint.coordinate.as_ref().map(|c| {
                let (index, _) = coordinates.insert_full(
                    c.name.clone(),
                    Coordinate {
                        default_value: c.default_value,
                        default_speed: c.default_speed,
                        locked: c.locked,
                    },
                );
                CoordinateIndex(index)
            });
            let axis = Unit::try_new(Vec3::from(b.joint.axis), 1e-12).unwrap_or(Vec3::z_axis());
            let [xx, yy, zz, xy, xz, yz] = b.inertia;
            let inertia = Matrix3::new(xx, xy, xz, xy, yy, yz, xz, yz, zz);
            bodies.insert(
                b.name.clone(),
                Body {
                    parent,
                    mass: b.mass,
                    mass_center: Vec3::from(b.mass_center),
                    inertia,
                    joint: Joint {
                        kind: b.joint.kind,
                        axis,
                        location: Vec3::from(b.joint.location_in_parent),
                        coordinate,
                    },
                },
            );
        }

        let markers = desc
            .markers
            .iter()
            .filter_map(|m| {
                let body = bodies.get_index_of(&m.body)?;
                Some((
                    m.name.clone(),
                    Marker {
                        body: BodyIndex(body),
                        location: Vec3::from(m.location),
                    },
                ))
            })
            .collect();

        let actuators = desc
            .actuators
            .iter()
            .filter_map(|a| {
                Some(Actuator {
                    coordinate: CoordinateIndex(coordinates.get_index_of(&a.coordinate)?),
                    optimal_force: a.optimal_force,
                })
            })
            .collect();

        let muscles = desc
            .muscles
            .iter()
            .filter_map(|m| {
                Some((
                    m.name.clone(),
                    Muscle {
                        coordinate: CoordinateIndex(coordinates.get_index_of(&m.coordinate)?),
                        max_isometric_force: m.max_isometric_force,
                        moment_arm: m.moment_arm,
                        mass: m.mass,
                        activation_heat_rate: m.activation_heat_rate,
                        maintenance_heat_rate: m.maintenance_heat_rate,
                    },
                ))
            })
            .collect();

        let total_mass = bodies.values().map(|b| b.mass).sum();
        Ok(Self {
            name: desc.name.clone(),
            gravity: Vec3::from(desc.gravity),
            bodies,
            coordinates,
            markers,
            actuators,
            muscles,
            basal_rate: desc.metabolic_probe.basal_rate,
            total_mass,
        })
    }

    /// Gravity in ground.
    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Sum of body masses.
    pub fn total_mass(&self) -> f64 {
        self.total_mass
    }

    /// Coordinate names in native order.
    pub fn coordinate_names(&self) -> impl Iterator<Item = &str> {
        self.coordinates.keys().map(String::as_str)
    }

    pub(crate) fn check_coordinate(&self, c: CoordinateIndex) -> Result<(), EngineError> {
        check_index("coordinate", c.0, self.coordinates.len())
    }

    pub(crate) fn check_body(&self, b: BodyIndex) -> Result<(), EngineError> {
        check_index("body", b.0, self.bodies.len())
    }
}

pub(crate) fn check_index(kind: &'static str, index: usize, len: usize) -> Result<(), EngineError> {
    if index < len {
        Ok(())
    } else {
        Err(EngineError::IndexOutOfRange { kind, index, len })
    }
}

pub(crate) fn require_stage(state: &TreeState, required: Stage) -> Result<(), EngineError> {
    let current = state.stage();
    if current >= required {
        Ok(())
    } else {
        Err(EngineError::Stage { required, current })
    }
}

// ── Trait implementations ──────────────────────────────────────────

impl MultibodyModel for TreeModel {
    type State = TreeState;
    type Solver = TreeSolver;

    fn name(&self) -> &str {
        &self.name
    }

    fn init_state(&self) -> Result<TreeState, ModelLoadError> {
        let mut state = TreeState::new(self);
        kinematics::realize(self, &mut state);
        if state.poses.iter().any(|p| !p.origin.iter().all(|v| v.is_finite())) {
            return Err(ModelLoadError::InitialState {
                reason: format!("model '{}' has non-finite default pose", self.name),
            });
        }
        Ok(state)
    }

    fn make_solver(&self) -> TreeSolver {
        TreeSolver::new(self)
    }
}

impl CoordinateAccess for TreeModel {
    fn coordinate_count(&self) -> usize {
        self.coordinates.len()
    }

    fn coordinate_name(&self, c: CoordinateIndex) -> Option<&str> {
        self.coordinates.get_index(c.0).map(|(k, _)| k.as_str())
    }

    fn find_coordinate(&self, name: &str) -> Option<CoordinateIndex> {
        self.coordinates.get_index_of(name).map(CoordinateIndex)
    }

    fn is_locked(&self, c: CoordinateIndex) -> bool {
        self.coordinates
            .get_index(c.0)
            .is_some_and(|(_, coord)| coord.locked)
    }

    fn set_time(&self, state: &mut TreeState, time: f64) {
        state.time = time;
    }

    fn value(&self, state: &TreeState, c: CoordinateIndex) -> Result<f64, EngineError> {
        self.check_coordinate(c)?;
        Ok(state.q[c.0])
    }

    fn speed(&self, state: &TreeState, c: CoordinateIndex) -> Result<f64, EngineError> {
        self.check_coordinate(c)?;
        Ok(state.u[c.0])
    }

    fn set_value(
        &self,
        state: &mut TreeState,
        c: CoordinateIndex,
        value: f64,
    ) -> Result<(), EngineError> {
        self.check_coordinate(c)?;
        state.q[c.0] = value;
        state.stage = Stage::Time;
        Ok(())
    }

    fn set_speed(
        &self,
        state: &mut TreeState,
        c: CoordinateIndex,
        speed: f64,
    ) -> Result<(), EngineError> {
        self.check_coordinate(c)?;
        state.u[c.0] = speed;
        state.stage = Stage::Time;
        Ok(())
    }
}

impl FrameKinematics for TreeModel {
    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn find_body(&self, name: &str) -> Option<BodyIndex> {
        self.bodies.get_index_of(name).map(BodyIndex)
    }

    fn body_name(&self, b: BodyIndex) -> Option<&str> {
        self.bodies.get_index(b.0).map(|(k, _)| k.as_str())
    }

    fn marker_count(&self) -> usize {
        self.markers.len()
    }

    fn find_marker(&self, name: &str) -> Option<MarkerIndex> {
        self.markers.get_index_of(name).map(MarkerIndex)
    }

    fn marker_name(&self, m: MarkerIndex) -> Option<&str> {
        self.markers.get_index(m.0).map(|(k, _)| k.as_str())
    }

    fn marker_binding(&self, m: MarkerIndex) -> Option<(BodyIndex, Vec3)> {
        self.markers
            .get_index(m.0)
            .map(|(_, marker)| (marker.body, marker.location))
    }

    fn point_position(
        &self,
        state: &TreeState,
        body: BodyIndex,
        local: &Vec3,
    ) -> Result<Vec3, EngineError> {
        self.check_body(body)?;
        require_stage(state, Stage::Position)?;
        let pose = &state.poses[body.0];
        Ok(pose.origin + pose.rotation * local)
    }

    fn point_velocity(
        &self,
        state: &TreeState,
        body: BodyIndex,
        local: &Vec3,
    ) -> Result<Vec3, EngineError> {
        self.check_body(body)?;
        require_stage(state, Stage::Velocity)?;
        let pose = &state.poses[body.0];
        let motion = &state.motion[body.0];
        Ok(motion.linear + motion.angular.cross(&(pose.rotation * local)))
    }

    fn body_orientation_xyz(&self, state: &TreeState, body: BodyIndex) -> Result<Vec3, EngineError> {
        self.check_body(body)?;
        require_stage(state, Stage::Position)?;
        Ok(kinematics::body_fixed_xyz(state.poses[body.0].rotation.matrix()))
    }

    fn body_angular_velocity(
        &self,
        state: &TreeState,
        body: BodyIndex,
    ) -> Result<Vec3, EngineError> {
        self.check_body(body)?;
        require_stage(state, Stage::Velocity)?;
        Ok(state.motion[body.0].angular)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{BodyDescription, JointDescription, MarkerDescription};
    use invdyn_core::Realization;

    fn two_link() -> ModelDescription {
        let link = |name: &str, parent: &str, coord: &str, at: [f64; 3]| BodyDescription {
            name: name.into(),
            mass: 1.0,
            mass_center: [0.5, 0.0, 0.0],
            inertia: [0.0, 0.01, 0.01, 0.0, 0.0, 0.0],
            joint: JointDescription::revolute(parent, [0.0, 0.0, 1.0], coord).at(at),
        };
        ModelDescription {
            name: "two_link".into(),
            gravity: [0.0, -9.81, 0.0],
            bodies: vec![
                link("upper", GROUND, "shoulder", [0.0; 3]),
                link("lower", "upper", "elbow", [1.0, 0.0, 0.0]),
            ],
            markers: vec![MarkerDescription {
                name: "hand".into(),
                body: "lower".into(),
                location: [1.0, 0.0, 0.0],
            }],
            actuators: vec![],
            muscles: vec![],
            metabolic_probe: Default::default(),
        }
    }

    #[test]
    fn coordinates_follow_body_order() {
        let model = TreeModel::from_description(&two_link()).unwrap();
        assert_eq!(model.coordinate_count(), 2);
        assert_eq!(model.find_coordinate("shoulder"), Some(CoordinateIndex(0)));
        assert_eq!(model.find_coordinate("elbow"), Some(CoordinateIndex(1)));
        assert_eq!(model.coordinate_name(CoordinateIndex(1)), Some("elbow"));
        assert_eq!(model.find_coordinate("wrist"), None);
    }

    #[test]
    fn writing_a_value_drops_stage_to_time() {
        let model = TreeModel::from_description(&two_link()).unwrap();
        let mut state = model.init_state().unwrap();
        assert_eq!(model.stage(&state), Stage::Velocity);
        model.set_value(&mut state, CoordinateIndex(0), 0.3).unwrap();
        assert_eq!(model.stage(&state), Stage::Time);
        let err = model
            .point_position(&state, BodyIndex(0), &Vec3::zeros())
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Stage {
                required: Stage::Position,
                current: Stage::Time
            }
        );
    }

    #[test]
    fn out_of_range_coordinate_is_reported() {
        let model = TreeModel::from_description(&two_link()).unwrap();
        let mut state = model.init_state().unwrap();
        let err = model
            .set_speed(&mut state, CoordinateIndex(7), 1.0)
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::IndexOutOfRange {
                kind: "coordinate",
                index: 7,
                len: 2
            }
        );
    }

    #[test]
    fn marker_tracks_chain_pose() {
        let model = TreeModel::from_description(&two_link()).unwrap();
        let mut state = model.init_state().unwrap();
        let quarter = std::f64::consts::FRAC_PI_2;
        model.set_value(&mut state, CoordinateIndex(0), quarter).unwrap();
        model.realize_velocity(&mut state).unwrap();
        let hand = model.find_marker("hand").unwrap();
        let (body, local) = model.marker_binding(hand).unwrap();
        let p = model.point_position(&state, body, &local).unwrap();
        assert!((p - Vec3::new(0.0, 2.0, 0.0)).norm() < 1e-12, "got {p}");
    }

    #[test]
    fn elbow_speed_moves_hand_tangentially() {
        let model = TreeModel::from_description(&two_link()).unwrap();
        let mut state = model.init_state().unwrap();
        model.set_speed(&mut state, CoordinateIndex(1), 2.0).unwrap();
        model.realize_velocity(&mut state).unwrap();
        let (body, local) = model.marker_binding(MarkerIndex(0)).unwrap();
        let v = model.point_velocity(&state, body, &local).unwrap();
        assert!((v - Vec3::new(0.0, 2.0, 0.0)).norm() < 1e-12, "got {v}");
        let w = model.body_angular_velocity(&state, body).unwrap();
        assert!((w - Vec3::new(0.0, 0.0, 2.0)).norm() < 1e-12);
    }

    #[test]
    fn orientation_of_planar_chain_is_sum_of_angles() {
        let model = TreeModel::from_description(&two_link()).unwrap();
        let mut state = model.init_state().unwrap();
        model.set_value(&mut state, CoordinateIndex(0), 0.2).unwrap();
        model.set_value(&mut state, CoordinateIndex(1), 0.5).unwrap();
        model.realize_velocity(&mut state).unwrap();
        let xyz = model.body_orientation_xyz(&state, BodyIndex(1)).unwrap();
        assert!(xyz.x.abs() < 1e-12 && xyz.y.abs() < 1e-12);
        assert!((xyz.z - 0.7).abs() < 1e-12, "got {xyz}");
    }
}
