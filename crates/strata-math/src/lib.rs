//! Shared spatial math for the terrain core.

mod aabb;

pub use aabb::Aabb;
