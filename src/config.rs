use glam::{Mat4, Vec2, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{grid::Grid, ClothError, RestClass};

/// Integration steps run per rendered frame by default.
pub const DEFAULT_SUBSTEPS: u32 = 1000;

/// Constants shared by every particle. Fixed for the lifetime of a simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhysicalConstants {
    pub gravity: Vec3,
    pub particle_mass: f32,
    pub spring_stiffness: f32,
    pub damping: f32,
    /// Timestep used by frame-based advancement.
    pub timestep: f32,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0., -10., 0.),
            particle_mass: 0.1,
            spring_stiffness: 2000.,
            damping: 0.1,
            timestep: 0.000005,
        }
    }
}

impl PhysicalConstants {
    #[inline]
    pub fn inv_mass(&self) -> f32 {
        1. / self.particle_mass
    }

    pub fn validate(&self) -> Result<(), ClothError> {
        fn check(name: &'static str, value: f32, ok: bool) -> Result<(), ClothError> {
            if value.is_finite() && ok {
                Ok(())
            } else {
                Err(ClothError::InvalidConstant { name, value })
            }
        }

        if !self.gravity.is_finite() {
            return Err(ClothError::InvalidGravity(self.gravity));
        }
        check("particle mass", self.particle_mass, self.particle_mass > 0.)?;
        check(
            "spring stiffness",
            self.spring_stiffness,
            self.spring_stiffness >= 0.,
        )?;
        check("damping", self.damping, self.damping >= 0.)?;
        check("timestep", self.timestep, self.timestep > 0.)
    }
}

/// Unstretched spring lengths per direction class.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RestLengths {
    pub horizontal: f32,
    pub vertical: f32,
    pub diagonal: f32,
}

impl RestLengths {
    /// Rest lengths of a sheet laid out with the given column and row spacing.
    pub fn from_spacing(dx: f32, dy: f32) -> Self {
        Self {
            horizontal: dx,
            vertical: dy,
            diagonal: (dx * dx + dy * dy).sqrt(),
        }
    }

    #[inline]
    pub fn for_class(&self, class: RestClass) -> f32 {
        match class {
            RestClass::Horizontal => self.horizontal,
            RestClass::Vertical => self.vertical,
            RestClass::Diagonal => self.diagonal,
        }
    }

    pub fn validate(&self) -> Result<(), ClothError> {
        [
            (RestClass::Horizontal, self.horizontal),
            (RestClass::Vertical, self.vertical),
            (RestClass::Diagonal, self.diagonal),
        ]
        .into_iter()
        .try_for_each(|(class, value)| {
            if value.is_finite() && value > 0. {
                Ok(())
            } else {
                Err(ClothError::InvalidRestLength { class, value })
            }
        })
    }
}

/// Everything needed to seed a cloth.
///
/// Particles start on a regular sheet in the `z = 0` plane, particle `(x, y)` at
/// `(x * horizontal, y * vertical, 0)`, then `transform` is applied to every point.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClothDesc {
    pub width: u32,
    pub height: u32,
    pub rest_lengths: RestLengths,
    pub constants: PhysicalConstants,
    pub transform: Mat4,
    pub substeps: u32,
}

impl ClothDesc {
    pub fn new(width: u32, height: u32, rest_lengths: RestLengths) -> Self {
        Self {
            width,
            height,
            rest_lengths,
            constants: PhysicalConstants::default(),
            transform: Mat4::IDENTITY,
            substeps: DEFAULT_SUBSTEPS,
        }
    }

    /// A `width × height` grid stretched over a sheet of the given physical size.
    pub fn from_size(width: u32, height: u32, size: Vec2) -> Self {
        let dx = size.x / width.saturating_sub(1) as f32;
        let dy = size.y / height.saturating_sub(1) as f32;
        Self::new(width, height, RestLengths::from_spacing(dx, dy))
    }

    pub fn with_constants(mut self, constants: PhysicalConstants) -> Self {
        self.constants = constants;
        self
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_substeps(mut self, substeps: u32) -> Self {
        self.substeps = substeps;
        self
    }

    /// Tilts the sheet by `angle_degrees` about the x axis through its top edge, so the
    /// top row keeps its place and the rest of the sheet swings out of the `z = 0`
    /// plane.
    pub fn draped(self, angle_degrees: f32) -> Self {
        let top = Vec3::new(0., self.size().y, 0.);
        let transform = Mat4::from_translation(top)
            * Mat4::from_rotation_x(angle_degrees.to_radians())
            * Mat4::from_translation(-top);
        self.with_transform(transform)
    }

    #[inline]
    pub fn grid(&self) -> Grid {
        Grid::new(self.width, self.height)
    }

    /// Extent of the untransformed sheet.
    pub fn size(&self) -> Vec2 {
        Vec2::new(
            self.width.saturating_sub(1) as f32 * self.rest_lengths.horizontal,
            self.height.saturating_sub(1) as f32 * self.rest_lengths.vertical,
        )
    }

    pub fn validate(&self) -> Result<(), ClothError> {
        let (width, height) = (self.width, self.height);
        if width == 0 || height == 0 {
            return Err(ClothError::EmptyGrid { width, height });
        }
        if width == 1 && height == 1 {
            return Err(ClothError::NoNeighbors);
        }
        if width as u64 * height as u64 > u32::MAX as u64 {
            return Err(ClothError::TooManyParticles { width, height });
        }
        self.rest_lengths.validate()?;
        self.constants.validate()?;
        if !self.transform.is_finite() {
            return Err(ClothError::InvalidTransform);
        }
        Ok(())
    }
}
