//! Column-major output buffers.
//!
//! Every per-sample quantity lands in its own [`ColumnBuffer`] with one
//! row per sample. Three-component quantities occupy three contiguous
//! columns per entity: column `entity * 3 + component`.

use crate::metrics::EvaluationMetrics;

// ── ColumnBuffer ───────────────────────────────────────────────────

/// Dense column-major `rows × cols` matrix of `f64`.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnBuffer {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl ColumnBuffer {
    pub(crate) fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Number of rows (samples).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (channels).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Element at `(row, col)`, or `None` if out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        (row < self.rows && col < self.cols).then(|| self.data[col * self.rows + row])
    }

    /// Column `col` (one value per sample). Panics if out of range.
    pub fn column(&self, col: usize) -> &[f64] {
        &self.data[col * self.rows..(col + 1) * self.rows]
    }

    /// Row `row` gathered across columns.
    pub fn row(&self, row: usize) -> Vec<f64> {
        (0..self.cols)
            .map(|c| self.data[c * self.rows + row])
            .collect()
    }

    /// The raw column-major data.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Consume into the raw column-major data.
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    pub(crate) fn write_row(&mut self, row: usize, values: &[f64]) {
        debug_assert_eq!(values.len(), self.cols);
        for (c, &v) in values.iter().enumerate() {
            self.data[c * self.rows + row] = v;
        }
    }

    pub(crate) fn invalidate_row(&mut self, row: usize) {
        for c in 0..self.cols {
            self.data[c * self.rows + row] = f64::NAN;
        }
    }
}

// ── OutputRecords ──────────────────────────────────────────────────

/// Results of one evaluation.
///
/// Row `i` of every buffer belongs to input sample `i`. Quantities that
/// were not requested are `None`.
#[derive(Clone, Debug)]
pub struct OutputRecords {
    /// Model coordinate names labelling the force columns.
    pub coordinate_names: Vec<String>,
    /// Generalized forces, native coordinate order.
    pub generalized_forces: ColumnBuffer,
    /// Central angular momentum, 3 columns.
    pub angular_momentum: Option<ColumnBuffer>,
    /// Metabolic energy rate, 1 column.
    pub metabolic_cost: Option<ColumnBuffer>,
    /// Body-fixed XYZ Euler angles, 3 columns per requested body.
    pub body_orientations: Option<ColumnBuffer>,
    /// Ground-frame angular velocities, 3 columns per requested body.
    pub body_angular_velocities: Option<ColumnBuffer>,
    /// Marker names labelling [`marker_positions`](Self::marker_positions).
    pub marker_names: Vec<String>,
    /// Marker positions, 3 columns per marker.
    pub marker_positions: Option<ColumnBuffer>,
    /// Point positions, 3 columns per point.
    pub point_positions: Option<ColumnBuffer>,
    /// Point velocities, 3 columns per point.
    pub point_velocities: Option<ColumnBuffer>,
    /// Forward (x) mass-center velocity at `[first, last]` sample.
    pub mass_center_velocity: Option<[f64; 2]>,
    /// Samples whose rows were filled with NaN, ascending.
    pub failed_samples: Vec<usize>,
    /// Timing and scheduling statistics.
    pub metrics: EvaluationMetrics,
}

/// One sample's results, produced by a worker and scattered into the
/// buffers by the evaluator.
#[derive(Clone, Debug, Default)]
pub(crate) struct SampleRecord {
    pub(crate) forces: Vec<f64>,
    pub(crate) angular_momentum: Option<[f64; 3]>,
    pub(crate) mass_center_x: Option<f64>,
    pub(crate) orientations: Vec<f64>,
    pub(crate) angular_velocities: Vec<f64>,
    pub(crate) marker_positions: Vec<f64>,
    pub(crate) point_positions: Vec<f64>,
    pub(crate) point_velocities: Vec<f64>,
    pub(crate) metabolic: Option<f64>,
}

/// Buffer widths for one evaluation; `None` means not requested.
#[derive(Clone, Debug, Default)]
pub(crate) struct OutputLayout {
    pub(crate) coordinates: usize,
    pub(crate) angular_momentum: bool,
    pub(crate) metabolic_cost: bool,
    pub(crate) orientation_cols: Option<usize>,
    pub(crate) angular_velocity_cols: Option<usize>,
    pub(crate) marker_cols: Option<usize>,
    pub(crate) point_cols: Option<usize>,
    pub(crate) mass_center_velocity: bool,
}

/// Pre-sized buffers being filled sample by sample.
pub(crate) struct OutputBuilder {
    samples: usize,
    forces: ColumnBuffer,
    angular_momentum: Option<ColumnBuffer>,
    metabolic_cost: Option<ColumnBuffer>,
    orientations: Option<ColumnBuffer>,
    angular_velocities: Option<ColumnBuffer>,
    marker_positions: Option<ColumnBuffer>,
    point_positions: Option<ColumnBuffer>,
    point_velocities: Option<ColumnBuffer>,
    mass_center: Option<[f64; 2]>,
    failed: Vec<usize>,
}

impl OutputBuilder {
    pub(crate) fn new(layout: &OutputLayout, samples: usize) -> Self {
        let alloc = |cols: usize| ColumnBuffer::zeros(samples, cols);
        Self {
            samples,
            forces: alloc(layout.coordinates),
            angular_momentum: layout.angular_momentum.then(|| alloc(3)),
            metabolic_cost: layout.metabolic_cost.then(|| alloc(1)),
            orientations: layout.orientation_cols.map(alloc),
            angular_velocities: layout.angular_velocity_cols.map(alloc),
            marker_positions: layout.marker_cols.map(alloc),
            point_positions: layout.point_cols.map(alloc),
            point_velocities: layout.point_cols.map(alloc),
            mass_center: layout.mass_center_velocity.then_some([0.0; 2]),
            failed: Vec::new(),
        }
    }

    pub(crate) fn write(&mut self, sample: usize, record: &SampleRecord) {
        self.forces.write_row(sample, &record.forces);
        if let (Some(buf), Some(h)) = (self.angular_momentum.as_mut(), record.angular_momentum) {
            buf.write_row(sample, &h);
        }
        if let (Some(buf), Some(rate)) = (self.metabolic_cost.as_mut(), record.metabolic) {
            buf.write_row(sample, &[rate]);
        }
        let vectors = [
            (self.orientations.as_mut(), &record.orientations),
            (self.angular_velocities.as_mut(), &record.angular_velocities),
            (self.marker_positions.as_mut(), &record.marker_positions),
            (self.point_positions.as_mut(), &record.point_positions),
            (self.point_velocities.as_mut(), &record.point_velocities),
        ];
        for (buf, values) in vectors {
            if let Some(buf) = buf {
                buf.write_row(sample, values);
            }
        }
        if let (Some(mc), Some(x)) = (self.mass_center.as_mut(), record.mass_center_x) {
            if sample == 0 {
                mc[0] = x;
            }
            if sample + 1 == self.samples {
                mc[1] = x;
            }
        }
    }

    pub(crate) fn invalidate(&mut self, sample: usize) {
        self.forces.invalidate_row(sample);
        for buf in [
            self.angular_momentum.as_mut(),
            self.metabolic_cost.as_mut(),
            self.orientations.as_mut(),
            self.angular_velocities.as_mut(),
            self.marker_positions.as_mut(),
            self.point_positions.as_mut(),
            self.point_velocities.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            buf.invalidate_row(sample);
        }
        if let Some(mc) = self.mass_center.as_mut() {
            if sample == 0 {
                mc[0] = f64::NAN;
            }
            if sample + 1 == self.samples {
                mc[1] = f64::NAN;
            }
        }
        self.failed.push(sample);
    }

    pub(crate) fn finish(
        mut self,
        coordinate_names: Vec<String>,
        marker_names: Vec<String>,
        metrics: EvaluationMetrics,
    ) -> OutputRecords {
        self.failed.sort_unstable();
        OutputRecords {
            coordinate_names,
            generalized_forces: self.forces,
            angular_momentum: self.angular_momentum,
            metabolic_cost: self.metabolic_cost,
            body_orientations: self.orientations,
            body_angular_velocities: self.angular_velocities,
            marker_names,
            marker_positions: self.marker_positions,
            point_positions: self.point_positions,
            point_velocities: self.point_velocities,
            mass_center_velocity: self.mass_center,
            failed_samples: self.failed,
            metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_is_column_major() {
        let mut buf = ColumnBuffer::zeros(2, 3);
        buf.write_row(0, &[1.0, 2.0, 3.0]);
        buf.write_row(1, &[4.0, 5.0, 6.0]);
        assert_eq!(buf.as_slice(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert_eq!(buf.column(1), &[2.0, 5.0]);
        assert_eq!(buf.row(1), vec![4.0, 5.0, 6.0]);
        assert_eq!(buf.get(0, 2), Some(3.0));
        assert_eq!(buf.get(0, 3), None);
    }

    #[test]
    fn unrequested_quantities_are_not_allocated() {
        let layout = OutputLayout {
            coordinates: 2,
            marker_cols: Some(6),
            ..Default::default()
        };
        let out = OutputBuilder::new(&layout, 4).finish(vec![], vec![], Default::default());
        assert_eq!(out.generalized_forces.cols(), 2);
        assert_eq!(out.marker_positions.as_ref().map(|b| b.cols()), Some(6));
        assert!(out.angular_momentum.is_none());
        assert!(out.point_positions.is_none());
        assert!(out.mass_center_velocity.is_none());
    }

    #[test]
    fn mass_center_takes_first_and_last_sample() {
        let layout = OutputLayout {
            coordinates: 1,
            mass_center_velocity: true,
            ..Default::default()
        };
        let mut builder = OutputBuilder::new(&layout, 3);
        for (i, x) in [(2, 7.0), (0, 5.0)] {
            let record = SampleRecord {
                forces: vec![0.0],
                mass_center_x: Some(x),
                ..Default::default()
            };
            builder.write(i, &record);
        }
        let out = builder.finish(vec![], vec![], Default::default());
        assert_eq!(out.mass_center_velocity, Some([5.0, 7.0]));
    }

    #[test]
    fn invalidated_rows_are_nan_and_recorded() {
        let layout = OutputLayout {
            coordinates: 2,
            angular_momentum: true,
            ..Default::default()
        };
        let mut builder = OutputBuilder::new(&layout, 3);
        builder.invalidate(2);
        builder.invalidate(0);
        let out = builder.finish(vec![], vec![], Default::default());
        assert_eq!(out.failed_samples, vec![0, 2]);
        assert!(out.generalized_forces.row(2).iter().all(|v| v.is_nan()));
        assert!(out.generalized_forces.row(1).iter().all(|v| *v == 0.0));
        let h = out.angular_momentum.unwrap();
        assert!(h.get(0, 1).unwrap().is_nan());
    }
}
