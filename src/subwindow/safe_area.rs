use crate::geometry::RectF;
use crate::window::AvoidAreaType;

use super::Subwindow;

impl Subwindow {
    /// Pushes the system, navigation and (when enabled) cutout insets of
    /// the window into the child pipeline.
    ///
    /// When overlays expand to the display, or the parent floats in free
    /// multi-window mode, insets are computed against the full display
    /// instead of the window.
    pub fn initialize_safe_area(&self) {
        let Some(window) = self.window() else {
            return;
        };
        let Some(container) = self.child_container() else {
            tracing::warn!(subwindow_id = self.id, "safe area: child container is null");
            return;
        };
        let Some(pipeline) = container.pipeline() else {
            return;
        };
        let Some(parent) = self.parent_container() else {
            return;
        };

        let window_rect = if pipeline.expand_display() || parent.is_free_multi_window() {
            self.platform
                .displays
                .display_by_id(window.display_id())
                .map(|display| RectF::new(0.0, 0.0, display.width as f32, display.height as f32))
        } else {
            None
        };

        let system = container.view_safe_area(AvoidAreaType::System, window_rect);
        let navigation = container.view_safe_area(AvoidAreaType::NavigationIndicator, window_rect);
        pipeline.update_system_safe_area(system);
        pipeline.update_nav_safe_area(navigation);
        if pipeline.use_cutout() {
            let cutout = container.view_safe_area(AvoidAreaType::Cutout, window_rect);
            pipeline.update_cutout_safe_area(cutout);
        }
        tracing::debug!(
            subwindow_id = self.id,
            safe_area = ?pipeline.safe_area_without_process(),
            "subwindow safe area initialized"
        );
    }
}
