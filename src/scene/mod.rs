//! # Scene Module
//!
//! Scene graph with hierarchical transforms, tagged node payloads and ray
//! queries.

mod node;
mod raycast;
mod scene;
mod transform;

pub use node::{Payload, SceneNode, UpdateFn};
pub use raycast::{RaycastHit, LINE_OF_SIGHT_TOLERANCE};
pub use scene::{Scene, ROOT_NAME};
pub use transform::Transform;
