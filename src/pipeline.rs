//! Render pipeline bridge.

use std::fmt;
use std::sync::Arc;

use crate::geometry::SafeAreaInsets;
use crate::overlay::{NodeRef, OverlayManager, StackElement};
use crate::window::WindowRect;

/// Which pipeline generation backs a container. Resolved once when the
/// container is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PipelineKind {
    Legacy,
    #[default]
    NextGen,
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineKind::Legacy => write!(f, "legacy"),
            PipelineKind::NextGen => write!(f, "next-gen"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyboardAnimationConfig {
    pub curve_type: String,
    pub curve_params: Vec<f32>,
    pub duration_in_ms: u32,
    pub duration_out_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowChange {
    Added,
    Removed,
}

/// Page-change notification sent to accessibility when a subwindow appears
/// or disappears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessibilityEvent {
    pub window_id: u32,
    pub change: WindowChange,
}

/// Settings a sub pipeline inherits from the pipeline of its parent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InheritedSettings {
    pub min_platform_version: i32,
    pub keyboard_animation: KeyboardAnimationConfig,
    pub drag_node_grayscale: f32,
    pub max_app_font_scale: f32,
    pub follow_system: bool,
    pub font_scale: f32,
    pub api_target_version: i32,
}

pub trait Pipeline: Send + Sync {
    fn kind(&self) -> PipelineKind;
    fn window_id(&self) -> u32;
    fn density(&self) -> f64;

    fn overlay_manager(&self) -> Option<Arc<dyn OverlayManager>>;
    /// Children currently mounted on the root element, in paint order.
    fn root_children(&self) -> Vec<NodeRef>;
    fn mount_to_root(&self, node: NodeRef);
    fn mark_last_child_dirty(&self) -> bool;
    /// Top stack element of a legacy pipeline; `None` for next-gen pipelines.
    fn last_stack(&self) -> Option<Arc<dyn StackElement>>;

    fn set_parent_pipeline(&self, parent_container_id: i32);
    fn setup_sub_root_element(&self);

    fn inherited_settings(&self) -> InheritedSettings;
    fn apply_inherited_settings(&self, settings: &InheritedSettings);
    fn set_min_platform_version(&self, version: i32);
    fn set_api_target_version(&self, version: i32);
    fn set_follow_system(&self, follow: bool);
    fn set_max_app_font_scale(&self, scale: f32);
    fn set_font_scale(&self, scale: f32);
    fn use_cutout(&self) -> bool;
    fn set_use_cutout(&self, use_cutout: bool);

    fn flush_pipeline_immediately(&self);
    fn set_root_default_has_focused(&self, focused: bool);
    fn set_is_focus_active(&self, active: bool);
    /// Window that owns focus for this pipeline; the host window for UI
    /// extensions.
    fn focus_window_id(&self) -> u32;
    fn container_modal_unfocus(&self);
    fn send_accessibility_event(&self, event: AccessibilityEvent);

    fn update_system_safe_area(&self, insets: SafeAreaInsets);
    fn update_nav_safe_area(&self, insets: SafeAreaInsets);
    fn update_cutout_safe_area(&self, insets: SafeAreaInsets);
    fn safe_area_without_process(&self) -> SafeAreaInsets;

    /// Whether the active theme asks overlays to span the whole display.
    fn expand_display(&self) -> bool;
    fn display_window_rect(&self) -> WindowRect;
}
