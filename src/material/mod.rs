//! Surface materials for the software pipeline.

mod phong;

pub use phong::Material;
