use crate::overlay::geometry::OverlayGeometry;

/// Pointer input routed to the session listener, in surface-local pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointerEvent {
    Click { x: f64, y: f64 },
}

/// Whether a click at `(x, y)` lands on the last drawn overlay. No overlay means no hit.
pub fn hit_test(geometry: Option<&OverlayGeometry>, x: f64, y: f64) -> bool {
    geometry.is_some_and(|g| g.contains(x, y))
}
