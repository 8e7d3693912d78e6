//! Collaborator traits a multibody-dynamics engine implements.
//!
//! The batch evaluator never does physics itself. It owns replicas of
//! an engine model, writes inputs into each replica's state, asks the
//! engine to realize and solve, and reads results back. These traits
//! are that contract, split by concern:
//!
//! - [`Engine`]: builds models from descriptions.
//! - [`EngineModel`]: the union of every capability below.
//! - [`MultibodyModel`]: the model handle; creates states and solvers.
//! - [`CoordinateAccess`]: coordinate lookup, locks, value/speed I/O.
//! - [`Realization`]: stage tracking and realization.
//! - [`ControlInput`]: actuator controls.
//! - [`FrameKinematics`]: bodies, markers and point transforms.
//! - [`MomentumQueries`]: system-level momentum and mass center.
//! - [`MuscleEnergetics`]: muscle activation and metabolic probe.
//! - [`InverseDynamicsSolver`]: the solve itself.
//!
//! # Threading
//!
//! A model handle and its state are `Send` so each worker can own one
//! replica. Nothing here is required to be `Sync`: engines are allowed
//! to keep non-reentrant per-model caches, which is why the evaluator
//! never shares a replica between workers.

use crate::error::{EngineError, ModelLoadError};
use crate::id::{BodyIndex, CoordinateIndex, MarkerIndex, MuscleIndex};
use crate::stage::Stage;
use crate::Vec3;

/// Builds model handles from descriptions.
///
/// One engine value is shared (by reference) across every replica
/// construction, so it must be `Sync`.
pub trait Engine: Send + Sync {
    /// What a model is built from (a parsed description, a file path, ...).
    type Description: ?Sized + Sync;

    /// The model handle type.
    type Model: EngineModel;

    /// Construct one model from `description`.
    ///
    /// Called once per replica. Implementations should keep their own
    /// construction diagnostics quiet; the evaluator logs one summary
    /// per pool.
    fn load_model(&self, description: &Self::Description) -> Result<Self::Model, ModelLoadError>;
}

/// Every capability the batch evaluator needs from a model.
///
/// Implemented automatically for any model with all the capability
/// traits below.
pub trait EngineModel:
    CoordinateAccess + Realization + ControlInput + FrameKinematics + MomentumQueries + MuscleEnergetics
{
}

impl<T> EngineModel for T where
    T: CoordinateAccess
        + Realization
        + ControlInput
        + FrameKinematics
        + MomentumQueries
        + MuscleEnergetics
{
}

/// A loaded multibody model.
///
/// Immutable after construction: every per-sample mutation goes
/// through `&mut Self::State`.
pub trait MultibodyModel: Send + Sized {
    /// Mutable simulation state for this model. Cloned to restore a
    /// replica to its initial state.
    type State: Send + Clone;

    /// Inverse-dynamics solver bound to this model.
    type Solver: InverseDynamicsSolver<Self> + Send;

    /// Human-readable model name for logs and errors.
    fn name(&self) -> &str;

    /// Create a state initialized to default coordinate values and
    /// speeds, realized as far as the engine can without inputs.
    fn init_state(&self) -> Result<Self::State, ModelLoadError>;

    /// Create an inverse-dynamics solver for this model.
    fn make_solver(&self) -> Self::Solver;
}

/// Generalized coordinate lookup and state I/O.
pub trait CoordinateAccess: MultibodyModel {
    /// Number of generalized coordinates (the length of every force vector).
    fn coordinate_count(&self) -> usize;

    /// Name of coordinate `c`, or `None` if out of range.
    fn coordinate_name(&self, c: CoordinateIndex) -> Option<&str>;

    /// Resolve a coordinate by name.
    fn find_coordinate(&self, name: &str) -> Option<CoordinateIndex>;

    /// Whether coordinate `c` is locked at its default value.
    fn is_locked(&self, c: CoordinateIndex) -> bool;

    /// Set the state's time.
    fn set_time(&self, state: &mut Self::State, time: f64);

    /// Current value of coordinate `c`.
    fn value(&self, state: &Self::State, c: CoordinateIndex) -> Result<f64, EngineError>;

    /// Current speed of coordinate `c`.
    fn speed(&self, state: &Self::State, c: CoordinateIndex) -> Result<f64, EngineError>;

    /// Write the value of coordinate `c`. Invalidates realization.
    fn set_value(
        &self,
        state: &mut Self::State,
        c: CoordinateIndex,
        value: f64,
    ) -> Result<(), EngineError>;

    /// Write the speed of coordinate `c`. Invalidates realization.
    fn set_speed(
        &self,
        state: &mut Self::State,
        c: CoordinateIndex,
        speed: f64,
    ) -> Result<(), EngineError>;
}

/// Realization of the dynamics pipeline.
pub trait Realization: MultibodyModel {
    /// Stage the state is currently realized to.
    fn stage(&self, state: &Self::State) -> Stage;

    /// Realize positions and velocities.
    fn realize_velocity(&self, state: &mut Self::State) -> Result<(), EngineError>;

    /// Realize applied forces. Requires controls marked valid.
    fn realize_dynamics(&self, state: &mut Self::State) -> Result<(), EngineError>;
}

/// Actuator controls.
pub trait ControlInput: MultibodyModel {
    /// Number of controls the model expects.
    fn control_count(&self) -> usize;

    /// Write the full control vector. Rejects a mismatched length
    /// without modifying the state.
    fn set_controls(&self, state: &mut Self::State, controls: &[f64]) -> Result<(), EngineError>;

    /// Declare the current controls valid for dynamics realization.
    fn mark_controls_valid(&self, state: &mut Self::State);
}

/// Bodies, markers, and point transforms.
pub trait FrameKinematics: MultibodyModel {
    /// Number of bodies (ground excluded).
    fn body_count(&self) -> usize;

    /// Resolve a body by name.
    fn find_body(&self, name: &str) -> Option<BodyIndex>;

    /// Name of body `b`, or `None` if out of range.
    fn body_name(&self, b: BodyIndex) -> Option<&str>;

    /// Number of markers.
    fn marker_count(&self) -> usize;

    /// Resolve a marker by name.
    fn find_marker(&self, name: &str) -> Option<MarkerIndex>;

    /// Name of marker `m`, or `None` if out of range.
    fn marker_name(&self, m: MarkerIndex) -> Option<&str>;

    /// Parent body and body-local offset of marker `m`.
    fn marker_binding(&self, m: MarkerIndex) -> Option<(BodyIndex, Vec3)>;

    /// Ground-frame position of `local` fixed on `body`. Needs [`Stage::Position`].
    fn point_position(
        &self,
        state: &Self::State,
        body: BodyIndex,
        local: &Vec3,
    ) -> Result<Vec3, EngineError>;

    /// Ground-frame velocity of `local` fixed on `body`. Needs [`Stage::Velocity`].
    fn point_velocity(
        &self,
        state: &Self::State,
        body: BodyIndex,
        local: &Vec3,
    ) -> Result<Vec3, EngineError>;

    /// Body-fixed XYZ Euler angles of `body` in ground. Needs [`Stage::Position`].
    fn body_orientation_xyz(&self, state: &Self::State, body: BodyIndex)
        -> Result<Vec3, EngineError>;

    /// Angular velocity of `body` expressed in ground. Needs [`Stage::Velocity`].
    fn body_angular_velocity(
        &self,
        state: &Self::State,
        body: BodyIndex,
    ) -> Result<Vec3, EngineError>;
}

/// System-level momentum queries.
pub trait MomentumQueries: MultibodyModel {
    /// Angular momentum of the whole system about its mass center.
    /// Needs [`Stage::Velocity`].
    fn central_angular_momentum(&self, state: &Self::State) -> Result<Vec3, EngineError>;

    /// Velocity of the system mass center in ground. Needs [`Stage::Velocity`].
    fn mass_center_velocity(&self, state: &Self::State) -> Result<Vec3, EngineError>;
}

/// Muscle activation and metabolic energy probe.
pub trait MuscleEnergetics: MultibodyModel {
    /// Number of muscles.
    fn muscle_count(&self) -> usize;

    /// Set the activation of muscle `m`.
    fn set_activation(
        &self,
        state: &mut Self::State,
        m: MuscleIndex,
        activation: f64,
    ) -> Result<(), EngineError>;

    /// Bring muscle internal state into equilibrium with the current
    /// activations. Default: no internal muscle state.
    fn equilibrate_muscles(&self, _state: &mut Self::State) -> Result<(), EngineError> {
        Ok(())
    }

    /// Whole-model metabolic energy rate (W). Needs [`Stage::Dynamics`].
    fn metabolic_rate(&self, state: &Self::State) -> Result<f64, EngineError>;
}

/// Inverse-dynamics solver bound to one model.
///
/// Takes `&mut self` so implementations can reuse scratch buffers.
pub trait InverseDynamicsSolver<M: MultibodyModel> {
    /// Generalized forces (native coordinate order) that produce the
    /// accelerations `udot` at the current state, net of applied
    /// actuator forces. Needs [`Stage::Dynamics`].
    fn solve(&mut self, model: &M, state: &M::State, udot: &[f64]) -> Result<Vec<f64>, EngineError>;
}
