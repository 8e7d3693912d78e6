//! Binding named trajectory channels onto a replica's state.
//!
//! Channel names are resolved to model coordinates once per
//! evaluation ([`ChannelBindings::resolve`]); the resolved table is
//! read-only and shared by every worker. Per sample,
//! [`ChannelBindings::bind`] writes values then speeds into one
//! replica, skipping locked coordinates under
//! [`LockedCoordinatePolicy::Respect`].

use indexmap::IndexSet;
use invdyn_core::{CoordinateAccess, CoordinateIndex, EngineError};

use crate::config::{LockedCoordinatePolicy, UnknownCoordinatePolicy};
use crate::error::EvalError;
use crate::pool::Replica;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Channel {
    column: usize,
    coordinate: CoordinateIndex,
}

/// Resolved trajectory-column → coordinate table.
#[derive(Clone, Debug, Default)]
pub struct ChannelBindings {
    channels: Vec<Channel>,
    skipped_locked: Vec<CoordinateIndex>,
    ignored: Vec<String>,
}

impl ChannelBindings {
    /// Resolve `names` (trajectory column order) against `model`.
    ///
    /// # Errors
    ///
    /// [`EvalError::UnknownCoordinate`] for the first unresolvable name
    /// under [`UnknownCoordinatePolicy::Reject`].
    pub fn resolve<M: CoordinateAccess>(
        model: &M,
        names: &IndexSet<String>,
        unknown: UnknownCoordinatePolicy,
        locked: LockedCoordinatePolicy,
    ) -> Result<Self, EvalError> {
        let mut out = Self::default();
        for (column, name) in names.iter().enumerate() {
            let Some(coordinate) = model.find_coordinate(name) else {
                match unknown {
                    UnknownCoordinatePolicy::Reject => {
                        return Err(EvalError::UnknownCoordinate {
                            name: name.clone(),
                            column,
                        });
                    }
                    UnknownCoordinatePolicy::Ignore => {
                        out.ignored.push(name.clone());
                        continue;
                    }
                }
            };
            if locked == LockedCoordinatePolicy::Respect && model.is_locked(coordinate) {
                out.skipped_locked.push(coordinate);
                continue;
            }
            out.channels.push(Channel { column, coordinate });
        }
        if !out.ignored.is_empty() {
            tracing::warn!(
                names = ?out.ignored,
                "ignoring trajectory channels with no matching coordinate"
            );
        }
        Ok(out)
    }

    /// Number of channels that will be written.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether no channel will be written.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Names dropped under [`UnknownCoordinatePolicy::Ignore`].
    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }

    /// Locked coordinates whose channels are skipped.
    pub fn skipped_locked(&self) -> &[CoordinateIndex] {
        &self.skipped_locked
    }

    /// Write one sample's `values` and `speeds` (trajectory column
    /// order) into `replica`.
    pub fn bind<M: CoordinateAccess>(
        &self,
        replica: &mut Replica<M>,
        values: &[f64],
        speeds: &[f64],
    ) -> Result<(), EngineError> {
        let (model, state) = replica.model_and_state();
        for ch in &self.channels {
            model.set_value(state, ch.coordinate, values[ch.column])?;
            model.set_speed(state, ch.coordinate, speeds[ch.column])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invdyn_core::{Engine, MultibodyModel};
    use invdyn_test_utils::{locked_double_pendulum, LOCKED_KNEE_ANGLE};
    use invdyn_tree::{TreeEngine, TreeModel};

    fn replica() -> Replica<TreeModel> {
        let model = TreeEngine.load_model(&locked_double_pendulum()).unwrap();
        Replica::new(model).unwrap()
    }

    fn names(list: &[&str]) -> IndexSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn unknown_name_rejected_with_column() {
        let r = replica();
        let err = ChannelBindings::resolve(
            r.model(),
            &names(&["hip", "ankle"]),
            UnknownCoordinatePolicy::Reject,
            LockedCoordinatePolicy::Respect,
        )
        .unwrap_err();
        assert_eq!(
            err,
            EvalError::UnknownCoordinate {
                name: "ankle".into(),
                column: 1
            }
        );
    }

    #[test]
    fn unknown_name_ignored_when_configured() {
        let r = replica();
        let b = ChannelBindings::resolve(
            r.model(),
            &names(&["ankle", "hip"]),
            UnknownCoordinatePolicy::Ignore,
            LockedCoordinatePolicy::Respect,
        )
        .unwrap();
        assert_eq!(b.ignored(), &["ankle".to_string()]);
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn locked_coordinate_keeps_default() {
        let mut r = replica();
        let b = ChannelBindings::resolve(
            r.model(),
            &names(&["knee", "hip"]),
            UnknownCoordinatePolicy::Reject,
            LockedCoordinatePolicy::Respect,
        )
        .unwrap();
        b.bind(&mut r, &[1.2, 0.4], &[3.0, -1.0]).unwrap();
        let knee = r.model().find_coordinate("knee").unwrap();
        let hip = r.model().find_coordinate("hip").unwrap();
        assert_eq!(b.skipped_locked(), &[knee]);
        assert_eq!(r.model().value(r.state(), knee).unwrap(), LOCKED_KNEE_ANGLE);
        assert_eq!(r.model().speed(r.state(), knee).unwrap(), 0.0);
        assert_eq!(r.model().value(r.state(), hip).unwrap(), 0.4);
        assert_eq!(r.model().speed(r.state(), hip).unwrap(), -1.0);
    }

    #[test]
    fn overwrite_policy_writes_locked_coordinate() {
        let mut r = replica();
        let b = ChannelBindings::resolve(
            r.model(),
            &names(&["knee"]),
            UnknownCoordinatePolicy::Reject,
            LockedCoordinatePolicy::Overwrite,
        )
        .unwrap();
        b.bind(&mut r, &[1.2], &[0.5]).unwrap();
        let knee = r.model().find_coordinate("knee").unwrap();
        assert_eq!(r.model().value(r.state(), knee).unwrap(), 1.2);
        assert_eq!(r.model().name(), "locked_double_pendulum");
    }
}
