// ─────────────────────────────────────────────────────────────────────
// Attractor Forge — Dense Linear Algebra Helpers
// ─────────────────────────────────────────────────────────────────────
//! Small row-major matrix helpers and a pure-Rust cyclic Jacobi
//! eigensolver for symmetric matrices.
//!
//! Manifolds are at most 20×20, so the O(N³ × sweeps) Jacobi solver
//! converges well within its sweep budget.

/// C = A · B for row-major A (r×k) and B (k×c).
pub fn matmul(a: &[f64], b: &[f64], r: usize, k: usize, c: usize) -> Vec<f64> {
    let mut out = vec![0.0; r * c];
    for i in 0..r {
        for p in 0..k {
            let aip = a[i * k + p];
            if aip == 0.0 {
                continue;
            }
            for j in 0..c {
                out[i * c + j] += aip * b[p * c + j];
            }
        }
    }
    out
}

/// Aᵗ for row-major A (r×c).
pub fn transpose(a: &[f64], r: usize, c: usize) -> Vec<f64> {
    let mut out = vec![0.0; r * c];
    for i in 0..r {
        for j in 0..c {
            out[j * r + i] = a[i * c + j];
        }
    }
    out
}

/// Gram matrix A · Aᵗ (r×r) for row-major A (r×c).
pub fn gram(a: &[f64], r: usize, c: usize) -> Vec<f64> {
    let mut out = vec![0.0; r * r];
    for i in 0..r {
        for j in i..r {
            let mut dot = 0.0;
            for p in 0..c {
                dot += a[i * c + p] * a[j * c + p];
            }
            out[i * r + j] = dot;
            out[j * r + i] = dot;
        }
    }
    out
}

/// Eigenvalues of a symmetric n×n matrix, ascending.
///
/// Returns `None` if the input or any eigenvalue is non-finite.
pub fn symmetric_eigenvalues(a: &[f64], n: usize) -> Option<Vec<f64>> {
    if a.len() != n * n || a.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let mut work = a.to_vec();
    let mut eigvals = vec![0.0; n];
    jacobi_eigenvalues(&mut work, n, &mut eigvals);
    if eigvals.iter().any(|v| !v.is_finite()) {
        return None;
    }
    eigvals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Some(eigvals)
}

/// Singular values of a row-major r×c matrix, descending.
///
/// Computed as √λ of the c×c matrix AᵗA; small negative eigenvalues
/// from round-off are clamped to zero.
pub fn singular_values(a: &[f64], r: usize, c: usize) -> Option<Vec<f64>> {
    let at = transpose(a, r, c);
    let ata = gram(&at, c, r);
    let mut eig = symmetric_eigenvalues(&ata, c)?;
    eig.reverse();
    Some(eig.into_iter().map(|l| l.max(0.0).sqrt()).collect())
}

/// Cyclic Jacobi eigenvalue iteration for a symmetric n×n matrix.
///
/// `a` is n×n row-major and is destroyed (diagonal becomes eigenvalues).
/// `eigvals_out` receives the n eigenvalues (unsorted).
fn jacobi_eigenvalues(a: &mut [f64], n: usize, eigvals_out: &mut [f64]) {
    const MAX_SWEEPS: usize = 50;
    const TOL: f64 = 1e-14;

    for sweep in 0..MAX_SWEEPS {
        let mut max_off = 0.0;
        for p in 0..n {
            for q in (p + 1)..n {
                let v = a[p * n + q].abs();
                if v > max_off {
                    max_off = v;
                }
            }
        }
        // Relative tolerance so large-norm Gram matrices still terminate.
        let scale = (0..n).map(|i| a[i * n + i].abs()).fold(1.0, f64::max);
        if max_off < TOL * scale {
            break;
        }

        let threshold = if sweep < 4 {
            0.2 * max_off / (n * n) as f64
        } else {
            0.0
        };

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[p * n + q];
                if apq == 0.0 || apq.abs() < threshold {
                    continue;
                }

                let app = a[p * n + p];
                let aqq = a[q * n + q];
                let diff = aqq - app;

                let t = if diff.abs() < 1e-300 {
                    if apq > 0.0 {
                        1.0
                    } else {
                        -1.0
                    }
                } else {
                    let tau = diff / (2.0 * apq);
                    if tau >= 0.0 {
                        1.0 / (tau + (1.0 + tau * tau).sqrt())
                    } else {
                        -1.0 / (-tau + (1.0 + tau * tau).sqrt())
                    }
                };

                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = t * c;
                let tau_rot = s / (1.0 + c);

                a[p * n + p] -= t * apq;
                a[q * n + q] += t * apq;
                a[p * n + q] = 0.0;
                a[q * n + p] = 0.0;

                for r in 0..n {
                    if r == p || r == q {
                        continue;
                    }
                    let arp = a[r * n + p];
                    let arq = a[r * n + q];
                    a[r * n + p] = arp - s * (arq + tau_rot * arp);
                    a[p * n + r] = a[r * n + p];
                    a[r * n + q] = arq + s * (arp - tau_rot * arq);
                    a[q * n + r] = a[r * n + q];
                }
            }
        }
    }

    for i in 0..n {
        eigvals_out[i] = a[i * n + i];
    }
}
