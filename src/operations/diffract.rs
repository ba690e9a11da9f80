use std::f64::consts::FRAC_PI_2;

use crate::error::TransferError;
use crate::math::{Matrix3, Vector3, TOLERANCE};

/// Groove direction and spacing correction at a point on a grating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrooveFrame {
    /// Unit vector along the rulings.
    pub groove: Vector3,
    /// Factor `delta` dividing the nominal line spacing at this point.
    pub spacing_factor: f64,
}

impl GrooveFrame {
    /// Effective line spacing `d / delta`.
    #[must_use]
    pub fn effective_spacing(&self, line_spacing: f64) -> f64 {
        line_spacing / self.spacing_factor
    }
}

/// Computes the groove vector for a grating ruled along its vertex tangent.
///
/// The tangent `x = (sin(pi/2 - alpha), 0, cos(pi/2 - alpha))` is fixed by
/// the grating tilt. The grooves run along `x cross n`; away from the pole
/// the projected spacing grows by `1 / delta` with
/// `delta = |x_z n_x - x_x n_z|` and `n` reduced to its x-z projection.
///
/// # Errors
///
/// Returns [`TransferError::DegenerateGrooveFrame`] if the normal is parallel
/// to the ruling tangent or has no x-z component.
pub fn groove_vector(normal: &Vector3, tilt: f64) -> Result<GrooveFrame, TransferError> {
    let angle = FRAC_PI_2 - tilt;
    let tangent = Vector3::new(angle.sin(), 0.0, angle.cos());

    let groove = tangent.cross(normal);
    let len = groove.norm();
    if !(len > TOLERANCE) {
        return Err(TransferError::DegenerateGrooveFrame);
    }

    let xz = normal.x.hypot(normal.z);
    if !(xz > TOLERANCE) {
        return Err(TransferError::DegenerateGrooveFrame);
    }
    let (nx, nz) = (normal.x / xz, normal.z / xz);
    let spacing_factor = (tangent.z * nx - tangent.x * nz).abs();
    if !(spacing_factor > TOLERANCE) {
        return Err(TransferError::DegenerateGrooveFrame);
    }

    Ok(GrooveFrame {
        groove: groove / len,
        spacing_factor,
    })
}

/// Rotation into the frame whose third axis is the groove and whose second
/// axis is the normal.
fn groove_rotation(normal: &Vector3, groove: &Vector3) -> Result<Matrix3, TransferError> {
    let a = (1.0 - groove.z * groove.z).sqrt();
    if !(a > TOLERANCE) {
        return Err(TransferError::DegenerateGrooveFrame);
    }
    let u = Vector3::new(groove.y, -groove.x, 0.0) / a;
    let w = Vector3::new(-groove.x * groove.z, -groove.y * groove.z, a * a) / a;
    let p = normal.dot(&u);
    let q = normal.dot(&w);
    let across = w * p - u * q;
    let up = u * p + w * q;
    Ok(Matrix3::from_rows(&[
        across.transpose(),
        up.transpose(),
        groove.transpose(),
    ]))
}

/// Diffracts `incident` off a grating with `normal` and `groove` direction.
///
/// In the groove frame the grating equation reads `o1 = m lambda / d + i1`,
/// `o3 = i3` with `o2` fixed by unit length. The groove vector has an
/// inherent sign ambiguity: if the incident ray has a negative first
/// component the groove is flipped and the frame rebuilt once, which always
/// makes that component non-negative. The result is renormalized. Order 0
/// gives the specular reflection.
///
/// `line_spacing` and `wavelength` share a unit (Angstroms).
///
/// # Errors
///
/// - [`TransferError::UnphysicalDiffractionOrder`] if the order is evanescent.
/// - [`TransferError::DegenerateGrooveFrame`] if the groove is parallel to z.
pub fn vecray(
    order: f64,
    line_spacing: f64,
    wavelength: f64,
    incident: &Vector3,
    normal: &Vector3,
    groove: &Vector3,
) -> Result<Vector3, TransferError> {
    let mut rotation = groove_rotation(normal, groove)?;
    let mut local = rotation * incident;
    if local.x < 0.0 {
        rotation = groove_rotation(normal, &-groove)?;
        local = rotation * incident;
    }

    let o1 = order * wavelength / line_spacing + local.x;
    let o3 = local.z;
    let radicand = 1.0 - o1 * o1 - o3 * o3;
    if radicand < 0.0 {
        return Err(TransferError::UnphysicalDiffractionOrder { radicand });
    }
    let out = rotation.transpose() * Vector3::new(o1, radicand.sqrt(), o3);
    Ok(out.normalize())
}
