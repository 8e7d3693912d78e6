//! What an evaluation should compute beyond generalized forces.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A body referenced by name or by body-set index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BodyRef {
    /// Body-set index (ground excluded).
    Index(usize),
    /// Body name.
    Name(String),
}

impl fmt::Display for BodyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "#{i}"),
            Self::Name(n) => write!(f, "'{n}'"),
        }
    }
}

impl From<usize> for BodyRef {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

impl From<&str> for BodyRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for BodyRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// Which markers to report.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerSelection {
    /// No marker output.
    #[default]
    None,
    /// Every marker, in model order.
    All,
    /// The named markers, in the order given.
    Named(Vec<String>),
}

/// A point fixed on a body, tracked for position and velocity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointSpec {
    /// Body carrying the point.
    pub body: BodyRef,
    /// Offset in the body frame (m).
    pub offset: [f64; 3],
}

impl PointSpec {
    /// Point at `offset` on `body`.
    pub fn new(body: impl Into<BodyRef>, offset: [f64; 3]) -> Self {
        Self {
            body: body.into(),
            offset,
        }
    }
}

/// Optional outputs of an evaluation.
///
/// Generalized forces are always computed. Every other quantity gets a
/// buffer only when requested here.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvaluationRequest {
    /// Whole-body central angular momentum (3 columns).
    pub angular_momentum: bool,
    /// Metabolic energy rate (1 column). Needs trajectory activations.
    pub metabolic_cost: bool,
    /// Body-fixed XYZ Euler angles of these bodies (3 columns each).
    pub body_orientations: Option<Vec<BodyRef>>,
    /// Ground-frame angular velocity of these bodies (3 columns each).
    pub body_angular_velocities: Option<Vec<BodyRef>>,
    /// Forward mass-center velocity at the first and last sample.
    pub mass_center_velocity: bool,
    /// Marker positions (3 columns each).
    pub markers: MarkerSelection,
    /// Points tracked for position and velocity (3 columns each).
    pub points: Vec<PointSpec>,
}

impl EvaluationRequest {
    /// Generalized forces only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request angular momentum.
    pub fn with_angular_momentum(mut self) -> Self {
        self.angular_momentum = true;
        self
    }

    /// Request metabolic cost.
    pub fn with_metabolic_cost(mut self) -> Self {
        self.metabolic_cost = true;
        self
    }

    /// Request orientations of `bodies`.
    pub fn with_body_orientations<B: Into<BodyRef>>(
        mut self,
        bodies: impl IntoIterator<Item = B>,
    ) -> Self {
        self.body_orientations = Some(bodies.into_iter().map(Into::into).collect());
        self
    }

    /// Request angular velocities of `bodies`.
    pub fn with_body_angular_velocities<B: Into<BodyRef>>(
        mut self,
        bodies: impl IntoIterator<Item = B>,
    ) -> Self {
        self.body_angular_velocities = Some(bodies.into_iter().map(Into::into).collect());
        self
    }

    /// Request endpoint mass-center velocity.
    pub fn with_mass_center_velocity(mut self) -> Self {
        self.mass_center_velocity = true;
        self
    }

    /// Request marker positions.
    pub fn with_markers(mut self, markers: MarkerSelection) -> Self {
        self.markers = markers;
        self
    }

    /// Track `points`.
    pub fn with_points(mut self, points: Vec<PointSpec>) -> Self {
        self.points = points;
        self
    }
}
