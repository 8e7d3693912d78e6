//! Realization stages of a simulation state.

use std::fmt;

/// How far the dynamics pipeline has been computed for the current
/// state values.
///
/// Stages are totally ordered. Writing a coordinate value or speed
/// drops the state back to [`Stage::Time`]; writing controls drops it
/// to at most [`Stage::Velocity`]. A query that needs stage `S` is only
/// valid when `state.stage() >= S`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Time is set; nothing derived from coordinates is valid.
    Time,
    /// Body poses are valid.
    Position,
    /// Body velocities and momentum are valid.
    Velocity,
    /// Applied forces (including actuator controls) are valid.
    Dynamics,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Time => "time",
            Self::Position => "position",
            Self::Velocity => "velocity",
            Self::Dynamics => "dynamics",
        };
        f.write_str(name)
    }
}
