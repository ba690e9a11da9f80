use serde::{Deserialize, Serialize};

use crate::math::{Point3, TOLERANCE};

/// Clear aperture of an element, tested on the projected `(x, y)` position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Aperture {
    /// Accepts every ray.
    #[default]
    Unbounded,
    /// A disk of `radius` around `(center_x, center_y)`.
    Circular {
        #[serde(default)]
        center_x: f64,
        #[serde(default)]
        center_y: f64,
        radius: f64,
    },
    /// A ring between `inner` and `outer` around the z axis.
    Annular { inner: f64, outer: f64 },
}

impl Aperture {
    /// Creates a circular aperture centred on the z axis.
    #[must_use]
    pub fn circular(radius: f64) -> Self {
        Aperture::Circular {
            center_x: 0.0,
            center_y: 0.0,
            radius,
        }
    }

    /// Creates an annular aperture centred on the z axis.
    #[must_use]
    pub fn annular(inner: f64, outer: f64) -> Self {
        Aperture::Annular { inner, outer }
    }

    /// Returns `true` if the point lies within the aperture.
    ///
    /// Edges are inclusive with a slack of [`TOLERANCE`], so a ray grazing
    /// the rim is kept.
    #[must_use]
    pub fn contains(&self, point: &Point3) -> bool {
        match *self {
            Aperture::Unbounded => true,
            Aperture::Circular {
                center_x,
                center_y,
                radius,
            } => (point.x - center_x).hypot(point.y - center_y) <= radius + TOLERANCE,
            Aperture::Annular { inner, outer } => {
                let r = point.x.hypot(point.y);
                r + TOLERANCE >= inner && r <= outer + TOLERANCE
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_accepts_everything() {
        assert!(Aperture::Unbounded.contains(&Point3::new(1e9, -1e9, 0.0)));
    }

    #[test]
    fn circular_rim_is_inclusive() {
        let ap = Aperture::circular(0.5);
        assert!(ap.contains(&Point3::new(0.5, 0.0, -4.0)));
        assert!(ap.contains(&Point3::new(0.3, 0.4, 7.0)));
        assert!(!ap.contains(&Point3::new(0.5 + 1e-9, 0.0, 0.0)));
    }

    #[test]
    fn off_center_circle() {
        let ap = Aperture::Circular {
            center_x: 1.0,
            center_y: 0.0,
            radius: 0.1,
        };
        assert!(ap.contains(&Point3::new(1.05, 0.0, 0.0)));
        assert!(!ap.contains(&Point3::origin()));
    }

    #[test]
    fn annulus_rejects_hole() {
        let ap = Aperture::annular(0.1, 0.5);
        assert!(!ap.contains(&Point3::new(0.05, 0.0, 0.0)));
        assert!(ap.contains(&Point3::new(0.0, 0.2, 0.0)));
        assert!(!ap.contains(&Point3::new(0.0, 0.6, 0.0)));
    }

    #[test]
    fn parses_tagged_toml() {
        let ap: Aperture = toml::from_str("kind = \"circular\"\nradius = 0.1").unwrap();
        assert_eq!(ap, Aperture::circular(0.1));
        let ap: Aperture = toml::from_str("kind = \"annular\"\ninner = 0.1\nouter = 0.5").unwrap();
        assert_eq!(ap, Aperture::annular(0.1, 0.5));
    }
}
