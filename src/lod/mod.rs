//! Level-of-detail selection with hysteresis and blended transitions.

mod group;
mod transition;

pub use group::{LodDraw, LodGroup, LodLevel, LodMetric};
pub use transition::{LodTransition, TransitionMode};
