//! Pushing actuator controls into a replica.

use invdyn_core::{ControlInput, EngineError};

use crate::error::EvalError;
use crate::pool::Replica;

/// Check a trajectory's control width against `model` before any
/// sample runs.
pub fn check_control_width<M: ControlInput>(model: &M, width: usize) -> Result<(), EvalError> {
    let expected = model.control_count();
    if width != expected {
        return Err(EvalError::DimensionMismatch {
            what: "controls",
            expected,
            actual: width,
        });
    }
    Ok(())
}

/// Write `controls` into `replica` and mark them valid for dynamics.
///
/// A mismatched length is rejected before anything is written.
pub fn apply_controls<M: ControlInput>(
    replica: &mut Replica<M>,
    controls: &[f64],
) -> Result<(), EngineError> {
    let (model, state) = replica.model_and_state();
    let expected = model.control_count();
    if controls.len() != expected {
        return Err(EngineError::DimensionMismatch {
            what: "controls",
            expected,
            actual: controls.len(),
        });
    }
    model.set_controls(state, controls)?;
    model.mark_controls_valid(state);
    Ok(())
}
