//! Mass-spring cloth simulation on a fixed `W × H` particle grid.
//!
//! Each particle is tied to its 8 grid neighbours by structural (horizontal and
//! vertical) and shear (diagonal) springs. A step accumulates gravity, spring and
//! damping forces per particle, integrates them with a semi-implicit Euler step into
//! the next buffer generation, then re-estimates per-vertex normals from the result.
//!
//! Two backends share the same kernels and semantics: [`cpu::CpuSimulation`] runs one
//! rayon task per particle, [`gpu::GpuSimulation`] one compute invocation per particle.

use thiserror::Error;

pub mod config;
pub mod cpu;
pub mod gpu;
pub mod grid;
pub mod kernels;
pub mod mesh;

pub use config::{ClothDesc, PhysicalConstants, RestLengths};
pub use grid::{Direction, Grid, RestClass};

/// Rejected cloth configuration.
#[derive(Debug, Clone, Error)]
pub enum ClothError {
    #[error("cloth grid must have a non-zero size, got {width}x{height}")]
    EmptyGrid { width: u32, height: u32 },
    #[error("a 1x1 cloth grid has no springs")]
    NoNeighbors,
    #[error("cloth grid {width}x{height} has more particles than 32-bit indices can address")]
    TooManyParticles { width: u32, height: u32 },
    #[error("{class:?} rest length must be positive and finite, got {value}")]
    InvalidRestLength { class: RestClass, value: f32 },
    #[error("{name} is out of range: {value}")]
    InvalidConstant { name: &'static str, value: f32 },
    #[error("gravity must be finite, got {0}")]
    InvalidGravity(glam::Vec3),
    #[error("initial placement transform must be finite")]
    InvalidTransform,
}
