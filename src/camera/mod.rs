//! Camera module for view and projection.

mod perspective;

pub use perspective::{Camera, Projection};
