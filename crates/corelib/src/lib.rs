//! Core math types: glam re-exports, node Transform, bounding boxes.

pub use glam::{Mat4, Quat, Vec3, vec3};

pub mod bounds;
pub mod transform;

pub use bounds::Aabb;
pub use transform::Transform;
