//! Touch hot areas.
//!
//! Overlay nodes report the rectangles that should accept touches; the
//! window receives the union of all of them. With nothing registered the
//! window keeps a 1x1 area so touches fall through to the parent.

use crate::geometry::Rect;
use crate::window::WindowRect;

use super::Subwindow;

/// Hot area a window falls back to when no node registered one.
pub const MIN_WINDOW_HOT_AREA: Rect = Rect::new(0.0, 0.0, 1.0, 1.0);

/// Converts a logical rect to window coordinates, truncating fractions.
pub fn rect_converter(rect: &Rect) -> WindowRect {
    WindowRect::from_logical(rect)
}

impl Subwindow {
    /// Registers `rects` as the hot areas of `node_id` and pushes the union
    /// of all registered areas to the window. A negative `node_id` records
    /// nothing and re-pushes the current union.
    pub fn set_hot_areas(&self, rects: &[Rect], node_id: i32) {
        self.check_ui_thread("set_hot_areas");
        let converted: Vec<WindowRect> = rects.iter().map(rect_converter).collect();
        let Some(window) = self.window() else {
            tracing::error!(subwindow_id = self.id, "set hot areas: window is null");
            return;
        };
        let union = {
            let mut state = self.state();
            if node_id >= 0 {
                state.hot_areas.insert(node_id, converted);
            }
            state.hot_areas.values().flatten().copied().collect::<Vec<WindowRect>>()
        };
        tracing::debug!(subwindow_id = self.id, node_id, areas = union.len(), "set hot areas");
        if let Err(err) = window.set_touch_hot_areas(&union) {
            tracing::error!(subwindow_id = self.id, error = %err, "set hot areas failed");
        }
    }

    /// Forgets the hot areas of `node_id` and pushes the remaining union, or
    /// the 1x1 fallback when none are left.
    pub fn delete_hot_areas(&self, node_id: i32) {
        self.check_ui_thread("delete_hot_areas");
        let remaining: Vec<WindowRect> = {
            let mut state = self.state();
            state.hot_areas.remove(&node_id);
            state.hot_areas.values().flatten().copied().collect()
        };
        let Some(window) = self.window() else {
            return;
        };
        let areas = if remaining.is_empty() {
            vec![rect_converter(&MIN_WINDOW_HOT_AREA)]
        } else {
            remaining
        };
        if let Err(err) = window.set_touch_hot_areas(&areas) {
            tracing::error!(subwindow_id = self.id, error = %err, "delete hot areas failed");
        }
    }

    /// Node ids with registered hot areas, ascending.
    pub fn hot_area_nodes(&self) -> Vec<i32> {
        self.state().hot_areas.keys().copied().collect()
    }
}
