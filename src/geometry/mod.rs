//! Drawable primitives: triangles, quads, lines, discs and indexed meshes.
//!
//! Positions are in the owning node's local space; the renderer maps them
//! through the node's world matrix.

mod circle;
mod line;
mod mesh;
mod quad;
mod triangle;

pub use circle::Circle;
pub use line::Line;
pub use mesh::Mesh;
pub use quad::Quad;
pub use triangle::Triangle;
