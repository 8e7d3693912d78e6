//! Input trajectories.
//!
//! A [`Trajectory`] is a batch of independent samples. Per-sample
//! quantities are stored in row-major [`Table`]s (row = sample). Hosts
//! that hold column-major matrices convert with
//! [`Table::from_column_major`].

use indexmap::IndexSet;

use crate::error::EvalError;

// ── Table ──────────────────────────────────────────────────────────

/// Dense row-major `rows × cols` matrix of `f64`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Table {
    /// A table of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Wrap row-major `data`.
    pub fn from_row_major(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, EvalError> {
        check_len(rows, cols, data.len())?;
        Ok(Self { rows, cols, data })
    }

    /// Convert column-major `data` (the usual host matrix layout).
    pub fn from_column_major(rows: usize, cols: usize, data: &[f64]) -> Result<Self, EvalError> {
        check_len(rows, cols, data.len())?;
        let mut out = Vec::with_capacity(data.len());
        for r in 0..rows {
            out.extend((0..cols).map(|c| data[c * rows + r]));
        }
        Ok(Self {
            rows,
            cols,
            data: out,
        })
    }

    /// Build from a slice of equal-length rows.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, EvalError> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(EvalError::DimensionMismatch {
                    what: "table row width",
                    expected: cols,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row `r`. Panics if out of range.
    pub fn row(&self, r: usize) -> &[f64] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// Element at `(r, c)`, or `None` if out of range.
    pub fn get(&self, r: usize, c: usize) -> Option<f64> {
        (r < self.rows && c < self.cols).then(|| self.data[r * self.cols + c])
    }

    /// Table with rows taken from `self` in the order given.
    pub fn select_rows(&self, order: &[usize]) -> Self {
        let mut data = Vec::with_capacity(order.len() * self.cols);
        for &r in order {
            data.extend_from_slice(self.row(r));
        }
        Self {
            rows: order.len(),
            cols: self.cols,
            data,
        }
    }
}

fn check_len(rows: usize, cols: usize, len: usize) -> Result<(), EvalError> {
    if rows * cols != len {
        return Err(EvalError::DimensionMismatch {
            what: "table data length",
            expected: rows * cols,
            actual: len,
        });
    }
    Ok(())
}

// ── Trajectory ─────────────────────────────────────────────────────

/// A batch of trajectory samples.
///
/// Column `k` of the value, speed and acceleration tables belongs to
/// `coordinate_names()[k]`. That external order is independent of any
/// model's native coordinate order.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    time: Vec<f64>,
    coordinates: IndexSet<String>,
    values: Table,
    speeds: Table,
    accelerations: Table,
    controls: Table,
    activations: Option<Table>,
}

impl Trajectory {
    /// Assemble a trajectory, checking that every table has one row per
    /// time value and one column per coordinate name.
    ///
    /// `controls` may have any width; it is checked against the model
    /// at evaluation time.
    pub fn new<S: Into<String>>(
        time: Vec<f64>,
        coordinate_names: impl IntoIterator<Item = S>,
        values: Table,
        speeds: Table,
        accelerations: Table,
        controls: Table,
    ) -> Result<Self, EvalError> {
        let mut coordinates = IndexSet::new();
        for name in coordinate_names {
            let name = name.into();
            if coordinates.contains(&name) {
                return Err(EvalError::DuplicateCoordinate { name });
            }
            coordinates.insert(name);
        }
        let n = time.len();
        let width = coordinates.len();
        for (what, table) in [
            ("coordinate values", &values),
            ("coordinate speeds", &speeds),
            ("accelerations", &accelerations),
        ] {
            check_shape(what, table, n, Some(width))?;
        }
        check_shape("controls", &controls, n, None)?;
        Ok(Self {
            time,
            coordinates,
            values,
            speeds,
            accelerations,
            controls,
            activations: None,
        })
    }

    /// Attach per-sample muscle activations for the metabolic extractor.
    pub fn with_activations(mut self, activations: Table) -> Result<Self, EvalError> {
        check_shape("activations", &activations, self.len(), None)?;
        self.activations = Some(activations);
        Ok(self)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Whether the trajectory has no samples.
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Sample times.
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Coordinate names in external column order.
    pub fn coordinate_names(&self) -> &IndexSet<String> {
        &self.coordinates
    }

    /// Coordinate values.
    pub fn values(&self) -> &Table {
        &self.values
    }

    /// Coordinate speeds.
    pub fn speeds(&self) -> &Table {
        &self.speeds
    }

    /// Coordinate accelerations, external column order.
    pub fn accelerations(&self) -> &Table {
        &self.accelerations
    }

    /// Actuator controls.
    pub fn controls(&self) -> &Table {
        &self.controls
    }

    /// Muscle activations, if attached.
    pub fn activations(&self) -> Option<&Table> {
        self.activations.as_ref()
    }

    /// Trajectory whose sample `k` is `self`'s sample `order[k]`.
    /// Panics if an index is out of range.
    pub fn select_samples(&self, order: &[usize]) -> Self {
        Self {
            time: order.iter().map(|&i| self.time[i]).collect(),
            coordinates: self.coordinates.clone(),
            values: self.values.select_rows(order),
            speeds: self.speeds.select_rows(order),
            accelerations: self.accelerations.select_rows(order),
            controls: self.controls.select_rows(order),
            activations: self.activations.as_ref().map(|a| a.select_rows(order)),
        }
    }
}

fn check_shape(
    what: &'static str,
    table: &Table,
    rows: usize,
    cols: Option<usize>,
) -> Result<(), EvalError> {
    if table.rows() != rows {
        return Err(EvalError::DimensionMismatch {
            what,
            expected: rows,
            actual: table.rows(),
        });
    }
    if let Some(cols) = cols {
        if table.cols() != cols {
            return Err(EvalError::DimensionMismatch {
                what,
                expected: cols,
                actual: table.cols(),
            });
        }
    }
    Ok(())
}
