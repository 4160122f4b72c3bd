// ─────────────────────────────────────────────────────────────────────
// Attractor Forge — Injection Schedule Types
// ─────────────────────────────────────────────────────────────────────
//! Scheduled additive modulation of H, M or R at fixed timesteps.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RcdError, RcdResult};
use crate::manifold::Shape;

/// Which part of the state an injection perturbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InjectionTarget {
    H,
    M,
    R,
}

impl fmt::Display for InjectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InjectionTarget::H => "H",
            InjectionTarget::M => "M",
            InjectionTarget::R => "R",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for InjectionTarget {
    type Err = RcdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "H" | "h" => Ok(InjectionTarget::H),
            "M" | "m" => Ok(InjectionTarget::M),
            "R" | "r" => Ok(InjectionTarget::R),
            other => Err(RcdError::Config(format!(
                "unknown injection target '{other}' (expected H, M or R)"
            ))),
        }
    }
}

/// What gets added to the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionPayload {
    /// Elementwise addition; length must equal the manifold's element count.
    Vector(Vec<f64>),
    /// Scalar addition; R only.
    Scalar(f64),
    /// Elementwise N(mean, std) draw from the run's random source.
    Gaussian { mean: f64, std: f64 },
}

/// One scheduled injection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectionEvent {
    pub timestep: usize,
    pub target: InjectionTarget,
    pub payload: InjectionPayload,
}

impl InjectionEvent {
    pub fn new(timestep: usize, target: InjectionTarget, payload: InjectionPayload) -> Self {
        Self {
            timestep,
            target,
            payload,
        }
    }

    /// Check the payload against the manifold shape of the run.
    pub fn validate(&self, shape: Shape) -> RcdResult<()> {
        let mismatch = |got: String| RcdError::ShapeMismatch {
            target: self.target,
            expected: match self.target {
                InjectionTarget::R => "scalar".to_string(),
                _ => format!("{} ({} elements)", shape.describe(), shape.len()),
            },
            got,
        };

        match (&self.payload, self.target) {
            (InjectionPayload::Vector(v), InjectionTarget::H | InjectionTarget::M) => {
                if v.len() != shape.len() {
                    return Err(mismatch(format!("vector of {} elements", v.len())));
                }
                if v.iter().any(|x| !x.is_finite()) {
                    return Err(RcdError::Numerical(format!(
                        "injection at t={} into {} contains NaN or Inf",
                        self.timestep, self.target
                    )));
                }
            }
            (InjectionPayload::Vector(v), InjectionTarget::R) => {
                return Err(mismatch(format!("vector of {} elements", v.len())));
            }
            (InjectionPayload::Scalar(_), InjectionTarget::H | InjectionTarget::M) => {
                return Err(mismatch("scalar".to_string()));
            }
            (InjectionPayload::Scalar(s), InjectionTarget::R) => {
                if !s.is_finite() {
                    return Err(RcdError::Numerical(format!(
                        "injection at t={} into R is not finite: {s}",
                        self.timestep
                    )));
                }
            }
            (InjectionPayload::Gaussian { mean, std }, _) => {
                if !mean.is_finite() || !std.is_finite() || *std < 0.0 {
                    return Err(RcdError::Config(format!(
                        "gaussian injection at t={} needs finite mean and std >= 0, got N({mean}, {std})",
                        self.timestep
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Immutable set of injection events, consulted once per timestep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InjectionSchedule {
    events: Vec<InjectionEvent>,
}

impl InjectionSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event(mut self, event: InjectionEvent) -> Self {
        self.push(event);
        self
    }

    /// Insert keeping events ordered by timestep (stable for equal timesteps).
    pub fn push(&mut self, event: InjectionEvent) {
        let idx = self
            .events
            .partition_point(|e| e.timestep <= event.timestep);
        self.events.insert(idx, event);
    }

    pub fn extend(&mut self, other: InjectionSchedule) {
        for event in other.events {
            self.push(event);
        }
    }

    /// Events whose timestep equals `t`, in insertion order.
    pub fn events_at(&self, t: usize) -> impl Iterator<Item = &InjectionEvent> {
        let start = self.events.partition_point(|e| e.timestep < t);
        self.events[start..].iter().take_while(move |e| e.timestep == t)
    }

    pub fn events(&self) -> &[InjectionEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Fail fast on any payload that does not fit `shape`.
    pub fn validate(&self, shape: Shape) -> RcdResult<()> {
        self.events.iter().try_for_each(|e| e.validate(shape))
    }

    /// Attractor pulse at `timestep`: H += N(0.1, 0.05), M += N(-0.1, 0.05), R += 0.2.
    pub fn attractor_pulse(timestep: usize) -> Self {
        Self::new()
            .with_event(InjectionEvent::new(
                timestep,
                InjectionTarget::H,
                InjectionPayload::Gaussian {
                    mean: 0.1,
                    std: 0.05,
                },
            ))
            .with_event(InjectionEvent::new(
                timestep,
                InjectionTarget::M,
                InjectionPayload::Gaussian {
                    mean: -0.1,
                    std: 0.05,
                },
            ))
            .with_event(InjectionEvent::new(
                timestep,
                InjectionTarget::R,
                InjectionPayload::Scalar(0.2),
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_at_ordered_lookup() {
        let schedule = InjectionSchedule::new()
            .with_event(InjectionEvent::new(10, InjectionTarget::R, InjectionPayload::Scalar(0.5)))
            .with_event(InjectionEvent::new(3, InjectionTarget::R, InjectionPayload::Scalar(0.1)))
            .with_event(InjectionEvent::new(10, InjectionTarget::R, InjectionPayload::Scalar(0.2)));
        assert_eq!(schedule.events()[0].timestep, 3);
        let at_10: Vec<_> = schedule.events_at(10).collect();
        assert_eq!(at_10.len(), 2);
        assert_eq!(at_10[0].payload, InjectionPayload::Scalar(0.5));
        assert_eq!(at_10[1].payload, InjectionPayload::Scalar(0.2));
        assert_eq!(schedule.events_at(4).count(), 0);
    }

    #[test]
    fn test_vector_length_mismatch() {
        let event = InjectionEvent::new(0, InjectionTarget::H, InjectionPayload::Vector(vec![0.1; 10]));
        let err = event.validate(Shape::Vector(3)).unwrap_err();
        assert!(matches!(err, RcdError::ShapeMismatch { target: InjectionTarget::H, .. }));
    }

    #[test]
    fn test_matrix_accepts_flattened_payload() {
        let shape = Shape::Matrix { rows: 3, cols: 3 };
        let ok = InjectionEvent::new(0, InjectionTarget::M, InjectionPayload::Vector(vec![0.0; 9]));
        assert!(ok.validate(shape).is_ok());
        let bad = InjectionEvent::new(0, InjectionTarget::M, InjectionPayload::Vector(vec![0.0; 3]));
        assert!(bad.validate(shape).is_err());
    }

    #[test]
    fn test_scalar_into_manifold_rejected() {
        let event = InjectionEvent::new(0, InjectionTarget::M, InjectionPayload::Scalar(0.2));
        assert!(event.validate(Shape::Vector(3)).is_err());
    }

    #[test]
    fn test_vector_into_reflection_rejected() {
        let event = InjectionEvent::new(0, InjectionTarget::R, InjectionPayload::Vector(vec![0.2]));
        assert!(event.validate(Shape::Vector(1)).is_err());
    }

    #[test]
    fn test_attractor_pulse_valid_for_any_shape() {
        let pulse = InjectionSchedule::attractor_pulse(5);
        assert_eq!(pulse.len(), 3);
        assert!(pulse.validate(Shape::Vector(7)).is_ok());
        assert!(pulse.validate(Shape::Matrix { rows: 2, cols: 2 }).is_ok());
    }

    #[test]
    fn test_target_parse() {
        assert_eq!("h".parse::<InjectionTarget>().unwrap(), InjectionTarget::H);
        assert!("X".parse::<InjectionTarget>().is_err());
    }
}
