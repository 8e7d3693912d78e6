//! Mapping external acceleration columns onto native coordinates.
//!
//! Trajectory accelerations arrive in the trajectory's column order;
//! the solver wants them in the model's native order. The default
//! [`AccelerationMatching::ByName`] builds that map once from names.
//! The two value-matching modes instead pair each native coordinate
//! with the column whose *input value* equals the coordinate's current
//! value. They exist for output parity with older pipelines and share
//! their weakness: two coordinates with coinciding values pick up the
//! same acceleration.

use indexmap::IndexSet;
use invdyn_core::{CoordinateAccess, CoordinateIndex, EngineError};

use crate::config::AccelerationMatching;
use crate::pool::Replica;

#[derive(Clone, Debug)]
enum Mode {
    ByName(Vec<Option<usize>>),
    ValueTolerance(f64),
    ExactValue,
}

/// Builds native-order acceleration vectors from trajectory rows.
#[derive(Clone, Debug)]
pub struct AccelerationReconciler {
    mode: Mode,
    coordinates: usize,
}

impl AccelerationReconciler {
    /// Prepare a reconciler for `model` and the trajectory's column
    /// `names`. Native coordinates absent from `names` get zero
    /// acceleration.
    pub fn new<M: CoordinateAccess>(
        model: &M,
        names: &IndexSet<String>,
        matching: AccelerationMatching,
    ) -> Self {
        let coordinates = model.coordinate_count();
        let mode = match matching {
            AccelerationMatching::ByName => Mode::ByName(
                (0..coordinates)
                    .map(|c| {
                        model
                            .coordinate_name(CoordinateIndex(c))
                            .and_then(|name| names.get_index_of(name))
                    })
                    .collect(),
            ),
            AccelerationMatching::ValueTolerance { tolerance } => Mode::ValueTolerance(tolerance),
            AccelerationMatching::ExactValue => Mode::ExactValue,
        };
        Self { mode, coordinates }
    }

    /// Native-order accelerations for one sample.
    ///
    /// `values` and `accelerations` are the sample's trajectory rows;
    /// value-matching modes compare `values` against the replica's
    /// current (already bound) coordinate values.
    pub fn reconcile<M: CoordinateAccess>(
        &self,
        replica: &Replica<M>,
        values: &[f64],
        accelerations: &[f64],
    ) -> Result<Vec<f64>, EngineError> {
        let mut udot = vec![0.0; self.coordinates];
        match &self.mode {
            Mode::ByName(map) => {
                for (slot, column) in udot.iter_mut().zip(map) {
                    if let Some(k) = column {
                        *slot = accelerations[*k];
                    }
                }
            }
            Mode::ValueTolerance(tolerance) => {
                for (c, slot) in udot.iter_mut().enumerate() {
                    let q = replica.model().value(replica.state(), CoordinateIndex(c))?;
                    for (k, &v) in values.iter().enumerate() {
                        if (v - q).abs() <= *tolerance {
                            *slot = accelerations[k];
                        }
                    }
                }
            }
            Mode::ExactValue => {
                for (c, slot) in udot.iter_mut().enumerate() {
                    let q = replica.model().value(replica.state(), CoordinateIndex(c))?;
                    if q == 0.0 {
                        continue;
                    }
                    if let Some(k) = values.iter().position(|&v| v == q) {
                        *slot = accelerations[k];
                    }
                }
            }
        }
        Ok(udot)
    }
}
