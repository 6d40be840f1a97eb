//! Entity Component System module
//!
//! Built on top of the hecs ECS library

mod components;
pub mod hierarchy;
mod world;

pub use components::{Name, Tag, Transform};
pub use hierarchy::{Children, Parent};
pub use world::World;
