use crate::error::TransferError;
use crate::math::{dominant_axis, Vector3, TOLERANCE};

/// Reflects direction `a` off a mirror with normal `n`.
///
/// The component along the normal's dominant axis `k` is solved from
/// `a' = a - 2 (a.n) n / |n|^2`; the other two follow from keeping `a`,
/// `a'` and `n` coplanar: `a'_j = a_j + (n_j / n_k)(a'_k - a_k)`. The result
/// is renormalized.
///
/// The sign of `n` does not matter.
///
/// # Errors
///
/// Returns [`TransferError::DegenerateNormal`] for a zero or non-finite normal.
pub fn reflect(a: &Vector3, n: &Vector3) -> Result<Vector3, TransferError> {
    let n2 = n.norm_squared();
    if !(n2 > TOLERANCE * TOLERANCE) || !n2.is_finite() {
        return Err(TransferError::DegenerateNormal);
    }
    let k = dominant_axis(n);
    let ki = k.index();
    let nk = n[ki];

    let mut out = *a;
    out[ki] = a[ki] - 2.0 * a.dot(n) * nk / n2;
    let shift = out[ki] - a[ki];
    let (j1, j2) = k.others();
    for j in [j1, j2] {
        let ji = j.index();
        out[ji] = a[ji] + n[ji] / nk * shift;
    }
    Ok(out.normalize())
}
