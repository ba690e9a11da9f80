use crate::error::{ConfigError, Result};
use crate::geometry::surface::{OpticalSurface, Surface};
use crate::geometry::{Aperture, Ray};
use crate::math::Bracket;
use crate::operations::{groove_vector, reflect, vecray, FreeDistance};

use super::report::LossReason;

/// What happens to a ray at an element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionKind {
    /// An obstruction: rays striking it inside the aperture are lost, rays
    /// missing it pass without moving.
    Block,
    /// A mirror.
    Reflect,
    /// A reflection grating diffracting into `order` with groove spacing
    /// `line_spacing` (Angstroms per line).
    Diffract { order: f64, line_spacing: f64 },
    /// A recording surface: the ray is advanced and kept, direction unchanged.
    Detect,
}

/// One stage of a [`Pipeline`](super::Pipeline).
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: String,
    surface: Surface,
    kind: InteractionKind,
    aperture: Aperture,
    bracket: Bracket,
}

impl Element {
    /// Creates an element with an unbounded aperture and the surface's
    /// default search bracket.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotAGrating`] for a diffracting element on a
    /// surface without rulings, and [`ConfigError::InvalidParameter`] for a
    /// non-positive line spacing.
    pub fn new(
        name: impl Into<String>,
        surface: impl Into<Surface>,
        kind: InteractionKind,
    ) -> Result<Self> {
        let name = name.into();
        let surface = surface.into();
        if let InteractionKind::Diffract { line_spacing, .. } = kind {
            if surface.grating_tilt().is_none() {
                return Err(ConfigError::NotAGrating(name).into());
            }
            if !(line_spacing > 0.0) {
                return Err(
                    ConfigError::invalid("line_spacing", line_spacing, "must be positive").into(),
                );
            }
        }
        let bracket = surface.default_bracket();
        Ok(Self {
            name,
            surface,
            kind,
            aperture: Aperture::Unbounded,
            bracket,
        })
    }

    /// Sets the clear aperture.
    #[must_use]
    pub fn with_aperture(mut self, aperture: Aperture) -> Self {
        self.aperture = aperture;
        self
    }

    /// Overrides the intersection search bracket.
    #[must_use]
    pub fn with_bracket(mut self, bracket: Bracket) -> Self {
        self.bracket = bracket;
        self
    }

    /// Returns the element name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the surface.
    #[must_use]
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Returns the interaction kind.
    #[must_use]
    pub fn kind(&self) -> InteractionKind {
        self.kind
    }

    /// Returns the clear aperture.
    #[must_use]
    pub fn aperture(&self) -> &Aperture {
        &self.aperture
    }

    /// Returns the intersection search bracket.
    #[must_use]
    pub fn bracket(&self) -> Bracket {
        self.bracket
    }

    /// Carries one live ray through this element.
    ///
    /// On success the ray sits on the surface (unless it passed a
    /// [`InteractionKind::Block`]) with its outgoing direction. On failure the
    /// caller marks the ray lost; its position is whatever was last valid.
    ///
    /// # Errors
    ///
    /// Returns the [`LossReason`] that removes the ray from the ensemble.
    pub fn interact(&self, ray: &mut Ray) -> std::result::Result<(), LossReason> {
        let query = FreeDistance::new(&self.surface).with_bracket(self.bracket);

        if self.kind == InteractionKind::Block {
            // Not reaching the obstruction within the bracket is a miss.
            let Ok(t) = query.execute(ray) else {
                return Ok(());
            };
            let hit = ray.at(t);
            if self.aperture.contains(&hit) {
                ray.position = hit;
                return Err(LossReason::Blocked);
            }
            return Ok(());
        }

        let t = query.execute(ray)?;
        ray.advance(t);
        if !self.aperture.contains(&ray.position) {
            return Err(LossReason::OutsideAperture);
        }

        match self.kind {
            InteractionKind::Reflect => {
                let normal = self.surface.normal(&ray.position)?;
                ray.direction = reflect(&ray.direction, &normal)?;
            }
            InteractionKind::Diffract {
                order,
                line_spacing,
            } => {
                let normal = self.surface.normal(&ray.position)?;
                // Checked in the constructor.
                let tilt = self.surface.grating_tilt().unwrap_or_default();
                let frame = groove_vector(&normal, tilt)?;
                ray.direction = vecray(
                    order,
                    frame.effective_spacing(line_spacing),
                    ray.wavelength,
                    &ray.direction,
                    &normal,
                    &frame.groove,
                )?;
            }
            InteractionKind::Detect | InteractionKind::Block => {}
        }
        Ok(())
    }
}
