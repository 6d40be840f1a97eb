//! Physics simulation module
//!
//! Built on top of rapier3d. The agent core only sees the [`WorldQuery`]
//! trait; [`Physics`] is the rapier-backed implementation the host uses.

mod query;
mod world;

pub use query::{layers, RayProbe, RaycastHit, WorldQuery};
pub use world::{
    ColliderHandle, ColliderOptions, ColliderShape, Physics, PhysicsBody, RigidBodyHandle,
};
