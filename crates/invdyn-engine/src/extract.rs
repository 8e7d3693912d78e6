//! Derived-quantity extractors.
//!
//! [`ExtractionPlan::resolve`] turns an [`EvaluationRequest`] into
//! pre-resolved body indices and (body, offset) bindings before the
//! parallel region. The per-sample functions then only query the
//! engine.

use invdyn_core::{
    BodyIndex, EngineError, EngineModel, FrameKinematics, MarkerIndex, MomentumQueries,
    MuscleEnergetics, MuscleIndex, Realization, Vec3,
};

use crate::error::EvalError;
use crate::output::{OutputLayout, SampleRecord};
use crate::pool::Replica;
use crate::request::{BodyRef, EvaluationRequest, MarkerSelection};
use crate::trajectory::Trajectory;

/// A request resolved against one model.
#[derive(Clone, Debug, Default)]
pub struct ExtractionPlan {
    angular_momentum: bool,
    metabolic_cost: bool,
    mass_center_velocity: bool,
    orientation_bodies: Option<Vec<BodyIndex>>,
    angular_velocity_bodies: Option<Vec<BodyIndex>>,
    marker_names: Vec<String>,
    markers: Option<Vec<(BodyIndex, Vec3)>>,
    points: Option<Vec<(BodyIndex, Vec3)>>,
}

impl ExtractionPlan {
    /// Resolve `request` against `model`, checking every body and
    /// marker reference and the activation width for metabolic cost.
    pub fn resolve<M: EngineModel>(
        model: &M,
        request: &EvaluationRequest,
        trajectory: &Trajectory,
    ) -> Result<Self, EvalError> {
        let bodies = |refs: &Option<Vec<BodyRef>>| -> Result<Option<Vec<BodyIndex>>, EvalError> {
            refs.as_ref()
                .map(|list| list.iter().map(|b| resolve_body(model, b)).collect())
                .transpose()
        };

        let (marker_names, markers) = match &request.markers {
            MarkerSelection::None => (Vec::new(), None),
            MarkerSelection::All => {
                let mut names = Vec::with_capacity(model.marker_count());
                let mut bindings = Vec::with_capacity(model.marker_count());
                for m in 0..model.marker_count() {
                    let (body, local) = marker(model, MarkerIndex(m), || format!("#{m}"))?;
                    let name = model.marker_name(MarkerIndex(m)).unwrap_or_default();
                    names.push(name.to_string());
                    bindings.push((body, local));
                }
                (names, Some(bindings))
            }
            MarkerSelection::Named(list) => {
                let mut bindings = Vec::with_capacity(list.len());
                for name in list {
                    let index = model
                        .find_marker(name)
                        .ok_or_else(|| EvalError::UnknownMarker { name: name.clone() })?;
                    bindings.push(marker(model, index, || name.clone())?);
                }
                (list.clone(), Some(bindings))
            }
        };

        let points = if request.points.is_empty() {
            None
        } else {
            Some(
                request
                    .points
                    .iter()
                    .map(|p| Ok((resolve_body(model, &p.body)?, Vec3::from(p.offset))))
                    .collect::<Result<Vec<_>, EvalError>>()?,
            )
        };

        if request.metabolic_cost {
            let expected = model.muscle_count();
            let actual = trajectory.activations().map_or(0, |a| a.cols());
            if actual != expected {
                return Err(EvalError::DimensionMismatch {
                    what: "activations",
                    expected,
                    actual,
                });
            }
        }

        Ok(Self {
            angular_momentum: request.angular_momentum,
            metabolic_cost: request.metabolic_cost,
            mass_center_velocity: request.mass_center_velocity,
            orientation_bodies: bodies(&request.body_orientations)?,
            angular_velocity_bodies: bodies(&request.body_angular_velocities)?,
            marker_names,
            markers,
            points,
        })
    }

    /// Output buffer widths implied by the plan.
    pub(crate) fn layout(&self, coordinates: usize) -> OutputLayout {
        OutputLayout {
            coordinates,
            angular_momentum: self.angular_momentum,
            metabolic_cost: self.metabolic_cost,
            orientation_cols: self.orientation_bodies.as_ref().map(|b| 3 * b.len()),
            angular_velocity_cols: self.angular_velocity_bodies.as_ref().map(|b| 3 * b.len()),
            marker_cols: self.markers.as_ref().map(|m| 3 * m.len()),
            point_cols: self.points.as_ref().map(|p| 3 * p.len()),
            mass_center_velocity: self.mass_center_velocity,
        }
    }

    /// Names labelling the marker columns.
    pub fn marker_names(&self) -> &[String] {
        &self.marker_names
    }

    // ── Per-sample extraction ──────────────────────────────────────

    /// Angular momentum into `record`. Needs velocity realization.
    pub(crate) fn angular_momentum<M: EngineModel>(
        &self,
        replica: &Replica<M>,
        record: &mut SampleRecord,
    ) -> Result<(), EngineError> {
        if self.angular_momentum {
            let h = replica.model().central_angular_momentum(replica.state())?;
            record.angular_momentum = Some([h.x, h.y, h.z]);
        }
        Ok(())
    }

    /// Forward mass-center velocity into `record`. Needs velocity
    /// realization; the caller decides which samples qualify.
    pub(crate) fn mass_center_velocity<M: EngineModel>(
        &self,
        replica: &Replica<M>,
        record: &mut SampleRecord,
    ) -> Result<(), EngineError> {
        if self.mass_center_velocity {
            let v = replica.model().mass_center_velocity(replica.state())?;
            record.mass_center_x = Some(v.x);
        }
        Ok(())
    }

    /// Orientation, angular velocity, marker and point kinematics.
    pub(crate) fn kinematics<M: EngineModel>(
        &self,
        replica: &Replica<M>,
        record: &mut SampleRecord,
    ) -> Result<(), EngineError> {
        let model = replica.model();
        let state = replica.state();
        if let Some(bodies) = &self.orientation_bodies {
            for &b in bodies {
                push3(&mut record.orientations, model.body_orientation_xyz(state, b)?);
            }
        }
        if let Some(bodies) = &self.angular_velocity_bodies {
            for &b in bodies {
                push3(
                    &mut record.angular_velocities,
                    model.body_angular_velocity(state, b)?,
                );
            }
        }
        if let Some(markers) = &self.markers {
            for (b, local) in markers {
                push3(
                    &mut record.marker_positions,
                    model.point_position(state, *b, local)?,
                );
            }
        }
        if let Some(points) = &self.points {
            for (b, local) in points {
                push3(
                    &mut record.point_positions,
                    model.point_position(state, *b, local)?,
                );
                push3(
                    &mut record.point_velocities,
                    model.point_velocity(state, *b, local)?,
                );
            }
        }
        Ok(())
    }

    /// Set activations, realize dynamics, equilibrate, and read the
    /// metabolic probe into `record`.
    pub(crate) fn metabolic_cost<M: EngineModel>(
        &self,
        replica: &mut Replica<M>,
        activations: Option<&[f64]>,
        record: &mut SampleRecord,
    ) -> Result<(), EngineError> {
        if !self.metabolic_cost {
            return Ok(());
        }
        let (model, state) = replica.model_and_state();
        for (m, &a) in activations.unwrap_or_default().iter().enumerate() {
            model.set_activation(state, MuscleIndex(m), a)?;
        }
        model.realize_dynamics(state)?;
        model.equilibrate_muscles(state)?;
        record.metabolic = Some(model.metabolic_rate(state)?);
        Ok(())
    }
}

fn push3(out: &mut Vec<f64>, v: Vec3) {
    out.extend_from_slice(&[v.x, v.y, v.z]);
}

fn resolve_body<M: EngineModel>(model: &M, body: &BodyRef) -> Result<BodyIndex, EvalError> {
    let found = match body {
        BodyRef::Name(name) => model.find_body(name),
        BodyRef::Index(i) => (*i < model.body_count()).then_some(BodyIndex(*i)),
    };
    found.ok_or_else(|| EvalError::UnknownBody {
        body: body.to_string(),
    })
}

fn marker<M: EngineModel>(
    model: &M,
    index: MarkerIndex,
    name: impl FnOnce() -> String,
) -> Result<(BodyIndex, Vec3), EvalError> {
    model
        .marker_binding(index)
        .ok_or_else(|| EvalError::UnknownMarker { name: name() })
}
