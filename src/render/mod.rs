//! Drawing surfaces and the frame renderer.

pub mod renderer;
pub mod surface;
