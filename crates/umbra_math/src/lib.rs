//! Umbra math types.
//!
//! Rays, parametric intervals, slabs and axis-aligned bounding boxes used by
//! the path tracer. Vector and rotation types come straight from glam.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod ray;
mod slab;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;
pub use slab::Slab;
