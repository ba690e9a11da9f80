//! TOML instrument descriptions.
//!
//! A description names the design record, an ordered list of elements and
//! the initial ensemble:
//!
//! ```toml
//! name = "Cassegrain + Rowland"
//!
//! [geometry]
//! focal_length = 3.0
//! tilt_sine = 0.576
//!
//! [[elements]]
//! name = "grating"
//! surface = "toroidal_grating"
//! interaction = { diffract = { order = -1.0 } }
//!
//! [source]
//! pattern = "disk"
//! count = 10000
//! ```

use std::f64::consts::FRAC_1_SQRT_2;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ensemble::{Ensemble, Pattern, RaySource};
use crate::error::{ConfigError, Result};
use crate::geometry::surface::{Plane, Surface, SurfaceKind};
use crate::geometry::{eccentricity_from_focal_ratios, Aperture, InstrumentGeometry};
use crate::math::{Bracket, Point3, Vector3};
use crate::pipeline::{Element, InteractionKind, Pipeline};

/// A complete instrument and source description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// Display name.
    pub name: String,
    /// Design parameters shared by the derived surfaces.
    #[serde(default)]
    pub geometry: GeometryConfig,
    /// Stages in propagation order.
    pub elements: Vec<ElementConfig>,
    /// Initial ensemble.
    #[serde(default)]
    pub source: RaySource,
}

/// Design parameters as written in a file.
///
/// Missing fields take the Cassegrain + Rowland values. The eccentricity is
/// taken from `eccentricity` if present, otherwise derived from
/// `final_ratio` and `primary_ratio` (the latter defaulting to
/// `focal_length / primary_diameter`). The tilt is taken from `tilt`
/// (radians) if present, otherwise from `tilt_sine`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    pub focal_length: f64,
    pub back_distance: f64,
    pub vertex_distance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eccentricity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_ratio: Option<f64>,
    pub primary_diameter: f64,
    pub rowland_diameter: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tilt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tilt_sine: Option<f64>,
    pub line_spacing: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        let g = InstrumentGeometry::cassegrain_rowland();
        Self {
            focal_length: g.focal_length,
            back_distance: g.back_distance,
            vertex_distance: g.vertex_distance,
            eccentricity: None,
            final_ratio: Some(20.0),
            primary_ratio: None,
            primary_diameter: g.primary_diameter,
            rowland_diameter: g.rowland_diameter,
            tilt: None,
            tilt_sine: Some(0.576),
            line_spacing: g.line_spacing,
        }
    }
}

impl GeometryConfig {
    /// Resolves the derived parameters into a design record.
    ///
    /// # Errors
    ///
    /// Returns an error if neither form of the eccentricity or tilt is
    /// given, a ratio is out of range, or the record fails validation.
    pub fn resolve(&self) -> Result<InstrumentGeometry> {
        let tilt = match (self.tilt, self.tilt_sine) {
            (Some(t), _) => t,
            (None, Some(s)) if (-1.0..=1.0).contains(&s) => s.asin(),
            (None, Some(s)) => {
                return Err(ConfigError::invalid("tilt_sine", s, "must lie in [-1, 1]").into())
            }
            (None, None) => return Err(ConfigError::MissingParameter("tilt").into()),
        };
        let mut geometry = InstrumentGeometry {
            focal_length: self.focal_length,
            back_distance: self.back_distance,
            vertex_distance: self.vertex_distance,
            eccentricity: self.eccentricity.unwrap_or_default(),
            primary_diameter: self.primary_diameter,
            rowland_diameter: self.rowland_diameter,
            tilt,
            line_spacing: self.line_spacing,
        };
        geometry.eccentricity = match (self.eccentricity, self.final_ratio) {
            (Some(e), _) => e,
            (None, Some(final_ratio)) => {
                let primary_ratio = self
                    .primary_ratio
                    .unwrap_or_else(|| geometry.primary_ratio());
                eccentricity_from_focal_ratios(final_ratio, primary_ratio)?
            }
            (None, None) => return Err(ConfigError::MissingParameter("eccentricity").into()),
        };
        geometry.validate()?;
        Ok(geometry)
    }
}

/// One element as written in a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementConfig {
    pub name: String,
    pub surface: SurfaceKind,
    pub interaction: InteractionConfig,
    /// Search interval `[lower, upper]` overriding the surface default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bracket: Option<[f64; 2]>,
    /// Point on a `plane` surface.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<[f64; 3]>,
    /// Normal of a `plane` surface.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal: Option<[f64; 3]>,
    #[serde(default)]
    pub aperture: Aperture,
}

/// Interaction as written in a file; `line_spacing` defaults to the
/// geometry's.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionConfig {
    Block,
    Reflect,
    Detect,
    Diffract {
        order: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        line_spacing: Option<f64>,
    },
}

impl ElementConfig {
    fn build(&self, geometry: &InstrumentGeometry) -> Result<Element> {
        let surface: Surface = match self.surface {
            SurfaceKind::Plane => {
                let center = self.center.ok_or(ConfigError::MissingParameter("center"))?;
                let normal = self.normal.ok_or(ConfigError::MissingParameter("normal"))?;
                Plane::new(Point3::from(center), Vector3::from(normal))?.into()
            }
            kind => geometry.surface(kind)?,
        };
        let kind = match self.interaction {
            InteractionConfig::Block => InteractionKind::Block,
            InteractionConfig::Reflect => InteractionKind::Reflect,
            InteractionConfig::Detect => InteractionKind::Detect,
            InteractionConfig::Diffract {
                order,
                line_spacing,
            } => InteractionKind::Diffract {
                order,
                line_spacing: line_spacing.unwrap_or(geometry.line_spacing),
            },
        };
        let mut element = Element::new(self.name.clone(), surface, kind)?.with_aperture(self.aperture);
        if let Some([lower, upper]) = self.bracket {
            if !(upper > lower) {
                return Err(ConfigError::invalid(
                    "bracket",
                    upper,
                    "upper end must exceed lower end",
                )
                .into());
            }
            element = element.with_bracket(Bracket::new(lower, upper));
        }
        Ok(element)
    }
}

impl InstrumentConfig {
    /// Parses a TOML description.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed input.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Reads and parses a TOML description.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] for malformed input.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::from)?;
        Self::from_toml_str(&text)
    }

    /// Serializes the description back to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if a value has no TOML representation.
    pub fn to_toml_string(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for invalid geometry, a plane without
    /// `center`/`normal`, a diffracting non-grating, a bad bracket or an
    /// empty element list.
    pub fn build_pipeline(&self) -> Result<Pipeline> {
        let geometry = self.geometry.resolve()?;
        debug!(name = %self.name, ?geometry, "building pipeline");
        let elements = self
            .elements
            .iter()
            .map(|e| e.build(&geometry))
            .collect::<Result<Vec<_>>>()?;
        Pipeline::new(elements)
    }

    /// Builds the initial ensemble.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidParameter`] for a non-positive wavelength
    /// or a negative radius.
    pub fn build_ensemble(&self) -> Result<Ensemble> {
        let source = &self.source;
        if !(source.wavelength > 0.0) {
            return Err(
                ConfigError::invalid("wavelength", source.wavelength, "must be positive").into(),
            );
        }
        if !(source.radius >= 0.0) {
            return Err(
                ConfigError::invalid("radius", source.radius, "must not be negative").into(),
            );
        }
        Ok(source.generate())
    }

    /// The 1 m Cassegrain feeding a toroidal-grating Rowland spectrograph.
    #[must_use]
    pub fn cassegrain_rowland() -> Self {
        let geometry = GeometryConfig::default();
        let g = InstrumentGeometry::cassegrain_rowland();
        Self {
            name: "Cassegrain + Rowland".to_owned(),
            geometry,
            elements: vec![
                element(
                    "secondary shadow",
                    SurfaceKind::Secondary,
                    InteractionConfig::Block,
                    Aperture::circular(g.secondary_diameter() / 2.0),
                ),
                element(
                    "primary",
                    SurfaceKind::Primary,
                    InteractionConfig::Reflect,
                    Aperture::circular(g.primary_diameter / 2.0),
                ),
                element(
                    "secondary",
                    SurfaceKind::Secondary,
                    InteractionConfig::Reflect,
                    Aperture::Unbounded,
                ),
                element(
                    "grating",
                    SurfaceKind::ToroidalGrating,
                    InteractionConfig::Diffract {
                        order: -1.0,
                        line_spacing: None,
                    },
                    Aperture::Unbounded,
                ),
                element(
                    "detector",
                    SurfaceKind::CylindricalDetector,
                    InteractionConfig::Detect,
                    Aperture::Unbounded,
                ),
            ],
            source: RaySource::default(),
        }
    }

    /// A 10" f/6 Newtonian with a 2" diagonal flat.
    #[must_use]
    pub fn newtonian() -> Self {
        let diameter = 10.0 * 0.0254;
        let focal_length = 6.0 * diameter;
        let flat_radius = 0.0254;
        let flat_center = [0.0, 0.0, 0.9 * focal_length];
        let flat_normal = [FRAC_1_SQRT_2, 0.0, -FRAC_1_SQRT_2];

        let flat = |name: &str, interaction| ElementConfig {
            name: name.to_owned(),
            surface: SurfaceKind::Plane,
            interaction,
            aperture: Aperture::circular(flat_radius),
            bracket: None,
            center: Some(flat_center),
            normal: Some(flat_normal),
        };

        Self {
            name: "Newtonian".to_owned(),
            geometry: GeometryConfig {
                focal_length,
                vertex_distance: 0.0,
                primary_diameter: diameter,
                ..GeometryConfig::default()
            },
            elements: vec![
                flat("diagonal shadow", InteractionConfig::Block),
                element(
                    "primary",
                    SurfaceKind::Primary,
                    InteractionConfig::Reflect,
                    Aperture::circular(diameter / 2.0),
                ),
                flat("diagonal", InteractionConfig::Reflect),
            ],
            source: RaySource {
                pattern: Pattern::Disk,
                radius: diameter / 2.0,
                height: 2.0,
                wavelength: 5500.0,
                ..RaySource::default()
            },
        }
    }
}

fn element(
    name: &str,
    surface: SurfaceKind,
    interaction: InteractionConfig,
    aperture: Aperture,
) -> ElementConfig {
    ElementConfig {
        name: name.to_owned(),
        surface,
        interaction,
        aperture,
        bracket: None,
        center: None,
        normal: None,
    }
}
