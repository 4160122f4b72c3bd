// ─────────────────────────────────────────────────────────────────────
// Attractor Forge — Manifold State
// ─────────────────────────────────────────────────────────────────────
//! Dense manifold arrays (vector or square matrix, row-major) and the
//! per-run `ManifoldState` {H, M, R}.

use serde::{Deserialize, Serialize};

use crate::error::{RcdError, RcdResult};
use crate::injection::InjectionTarget;

/// Shape of a manifold array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Vector(usize),
    Matrix { rows: usize, cols: usize },
}

impl Shape {
    pub fn len(&self) -> usize {
        match *self {
            Shape::Vector(n) => n,
            Shape::Matrix { rows, cols } => rows * cols,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn describe(&self) -> String {
        match *self {
            Shape::Vector(n) => format!("vector[{n}]"),
            Shape::Matrix { rows, cols } => format!("matrix[{rows}x{cols}]"),
        }
    }
}

/// One manifold array. Matrices are stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifold {
    shape: Shape,
    data: Vec<f64>,
}

impl Manifold {
    pub fn zeros(shape: Shape) -> Self {
        Self {
            shape,
            data: vec![0.0; shape.len()],
        }
    }

    pub fn vector(data: Vec<f64>) -> Self {
        Self {
            shape: Shape::Vector(data.len()),
            data,
        }
    }

    /// Build a square matrix from row-major data.
    pub fn square(n: usize, data: Vec<f64>) -> RcdResult<Self> {
        Self::from_shape(Shape::Matrix { rows: n, cols: n }, data)
    }

    pub fn from_shape(shape: Shape, data: Vec<f64>) -> RcdResult<Self> {
        if data.len() != shape.len() {
            return Err(RcdError::Config(format!(
                "{} needs {} elements, got {}",
                shape.describe(),
                shape.len(),
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self.shape, Shape::Matrix { .. })
    }

    /// (rows, cols); a vector is reported as a single row.
    pub fn dims(&self) -> (usize, usize) {
        match self.shape {
            Shape::Vector(n) => (1, n),
            Shape::Matrix { rows, cols } => (rows, cols),
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Element (row, col) of a matrix, or element `col` of a vector.
    /// `None` when out of range.
    pub fn at(&self, row: usize, col: usize) -> Option<f64> {
        let (rows, cols) = self.dims();
        if row >= rows || col >= cols {
            return None;
        }
        self.data.get(row * cols + col).copied()
    }

    /// Frobenius / Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.data.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    /// Elementwise `self += delta`. No broadcasting: `delta` must have
    /// exactly as many elements as `self`.
    pub fn add_assign(&mut self, target: InjectionTarget, delta: &[f64]) -> RcdResult<()> {
        if delta.len() != self.data.len() {
            return Err(RcdError::ShapeMismatch {
                target,
                expected: format!("{} ({} elements)", self.shape.describe(), self.data.len()),
                got: format!("{} elements", delta.len()),
            });
        }
        for (x, d) in self.data.iter_mut().zip(delta) {
            *x += d;
        }
        Ok(())
    }
}

/// Mutable per-run state: the two manifolds and the reflection scalar.
///
/// Owned by exactly one engine; H and M always share the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifoldState {
    pub h: Manifold,
    pub m: Manifold,
    pub r: f64,
}

impl ManifoldState {
    pub fn new(h: Manifold, m: Manifold, r: f64) -> RcdResult<Self> {
        if h.shape() != m.shape() {
            return Err(RcdError::Config(format!(
                "H and M must share a shape: {} vs {}",
                h.shape().describe(),
                m.shape().describe()
            )));
        }
        Ok(Self { h, m, r })
    }

    pub fn shape(&self) -> Shape {
        self.h.shape()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_row_major() {
        let m = Manifold::square(2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(m.at(0, 1), Some(2.0));
        assert_eq!(m.at(1, 0), Some(3.0));
        assert_eq!(m.at(2, 0), None);
        assert_eq!(m.at(0, 2), None);
        assert_eq!(Manifold::vector(vec![5.0, 6.0]).at(0, 1), Some(6.0));
        assert_eq!(m.dims(), (2, 2));
    }

    #[test]
    fn test_square_wrong_length() {
        assert!(Manifold::square(3, vec![0.0; 4]).is_err());
    }

    #[test]
    fn test_norm() {
        let v = Manifold::vector(vec![3.0, 4.0]);
        assert!((v.norm() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_add_assign_no_broadcast() {
        let mut v = Manifold::vector(vec![1.0, 1.0, 1.0]);
        let err = v.add_assign(InjectionTarget::H, &[1.0]).unwrap_err();
        assert!(matches!(err, RcdError::ShapeMismatch { .. }));
        v.add_assign(InjectionTarget::H, &[0.5, 0.5, 0.5]).unwrap();
        assert_eq!(v.as_slice(), &[1.5, 1.5, 1.5]);
    }

    #[test]
    fn test_state_requires_same_shape() {
        let h = Manifold::vector(vec![0.0; 3]);
        let m = Manifold::vector(vec![0.0; 4]);
        assert!(ManifoldState::new(h, m, 0.1).is_err());
    }
}
