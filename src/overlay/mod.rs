//! Overlay sprite trajectory and hit geometry.
//!
//! Everything here is pure math over frame progress and surface size, so it can be exercised
//! without a live surface.

pub mod animator;
pub mod geometry;
