//! Voxel ray traversal shared by picking and shading

pub mod occupancy;
pub mod dda;
pub mod interaction;

pub use occupancy::OccupancySource;
pub use dda::{traverse, MissReason, Traversal, TraversalHit, TraversalLimits, ITERATION_CAP};
pub use interaction::{raycast, RaycastHit, INTERACTION_MAX_DISTANCE};
