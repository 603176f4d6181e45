//! Containers and the registry that resolves them.
//!
//! A container is one execution context (pipeline, task executor, frontend)
//! backing a window. Subwindows never hold their parent container directly;
//! they keep its id and look it up here on every use.

use std::sync::Arc;

use crate::executor::TaskExecutor;
use crate::frontend::Frontend;
use crate::geometry::{RectF, SafeAreaInsets};
use crate::pipeline::Pipeline;
use crate::window::{AvoidAreaType, FoldStatus, Window};

mod scope;

pub use scope::ContainerScope;

/// Resources a sub container borrows from its parent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContainerResources {
    pub token: Option<String>,
    pub asset_manager: Option<String>,
    pub resource_configuration: String,
    pub package_path: String,
    pub hap_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubContainerKind {
    /// Content of a regular subwindow.
    #[default]
    Subwindow,
    /// Content of a toast/dialog window created without a UI container.
    Dialog,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubContainerConfig {
    pub kind: SubContainerKind,
    pub window_id: u32,
    pub parent_id: i32,
    pub resources: ContainerResources,
    pub use_shared_runtime: bool,
}

/// Metrics of the view surface attached to a container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewConfig {
    pub width: i32,
    pub height: i32,
    pub density: f64,
}

impl ViewConfig {
    pub fn new(width: i32, height: i32, density: f64) -> Self {
        Self {
            width,
            height,
            density,
        }
    }
}

pub trait Container: Send + Sync {
    fn id(&self) -> i32;
    fn parent_id(&self) -> i32;

    fn pipeline(&self) -> Option<Arc<dyn Pipeline>>;
    fn task_executor(&self) -> Option<Arc<dyn TaskExecutor>>;
    fn frontend(&self) -> Option<Arc<dyn Frontend>>;

    fn ui_window(&self) -> Option<Arc<dyn Window>>;
    fn set_ui_window(&self, window: Option<Arc<dyn Window>>);
    fn window_id(&self) -> u32;
    fn window_name(&self) -> String;
    fn current_display_id(&self) -> u64;

    fn is_scene_board_window(&self) -> bool;
    fn is_scene_board_enabled(&self) -> bool;
    fn is_ui_extension_window(&self) -> bool;
    fn is_free_multi_window(&self) -> bool;
    fn is_cross_axis_window(&self) -> bool;
    fn is_dialog_container(&self) -> bool;
    fn current_fold_status(&self) -> FoldStatus;
    fn api_target_version(&self) -> i32;

    fn resources(&self) -> ContainerResources;
    /// Marks the container as a sub container of `config.parent_id` and
    /// initializes it.
    fn configure_sub_container(&self, config: SubContainerConfig);

    fn view(&self) -> Option<ViewConfig>;
    fn set_view(&self, config: ViewConfig);
    fn surface_changed(&self, width: i32, height: i32);
    fn view_safe_area(&self, kind: AvoidAreaType, window_rect: Option<RectF>) -> SafeAreaInsets;
    fn set_font_scale_and_weight_scale(&self);

    fn hide_window(&self);
    fn close_window(&self);
}

/// Process-wide lookup of containers.
pub trait ContainerRegistry: Send + Sync {
    fn container(&self, id: i32) -> Option<Arc<dyn Container>>;
    /// Id of the container backing `window_id`.
    ///
    /// The platform creates the container when content is attached to the
    /// window, so this resolves once [`Window::set_ui_content`] succeeded.
    fn container_id_for_window(&self, window_id: u32) -> Option<i32>;
    fn destroy_container(&self, id: i32);
}
