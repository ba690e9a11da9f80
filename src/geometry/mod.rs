pub mod aperture;
pub mod instrument;
pub mod ray;
pub mod surface;

pub use aperture::Aperture;
pub use instrument::{eccentricity_from_focal_ratios, InstrumentGeometry};
pub use ray::Ray;
pub use surface::{OpticalSurface, Surface, SurfaceKind};
