use std::sync::Arc;

use crate::config::DeviceOrientation;
use crate::constants::{
    DEFAULT_DISPLAY_ID, ENABLE_APP_SUB_WINDOW_AVOID_AREA, ENABLE_SYSTEM_WINDOW_AVOID_AREA,
    SUBWINDOW_NAME_PREFIX,
};
use crate::container::{Container, ContainerScope, SubContainerConfig, SubContainerKind, ViewConfig};
use crate::error::InitError;
use crate::geometry::Size;
use crate::pipeline::PipelineKind;
use crate::window::{FoldStatus, Window, WindowOption, WindowType};

use super::{Subwindow, WindowKindInputs, resolve_window_kind};

impl Subwindow {
    /// Creates the OS window and wires the child container behind it.
    ///
    /// Returns early once both exist, so repeated calls are harmless.
    pub fn init_container(&self) -> Result<(), InitError> {
        {
            let state = self.state();
            if state.window.is_some() && state.child_container_id >= 0 {
                return Ok(());
            }
        }
        let parent_id = self.parent_container_id;
        let parent = self
            .parent_container()
            .ok_or(InitError::ParentContainerMissing(parent_id))?;
        let parent_pipeline = parent
            .pipeline()
            .ok_or(InitError::ParentPipelineMissing(parent_id))?;

        let window = match self.window() {
            Some(window) => window,
            None => self.create_window(parent.as_ref(), parent_pipeline.focus_window_id())?,
        };

        if window.set_surface_shadow_elevation(0.0).is_err() {
            tracing::error!(subwindow_id = self.id, "window surface is missing");
            return Err(InitError::SurfaceMissing);
        }
        if let Err(err) = window.set_ui_content() {
            tracing::warn!(subwindow_id = self.id, error = %err, "attaching window content failed");
        }

        let window_id = window.window_id();
        let child_id = self
            .platform
            .containers
            .container_id_for_window(window_id)
            .ok_or(InitError::ChildContainerMissing(window_id))?;
        self.platform
            .manager
            .add_parent_container_id(child_id, parent_id);
        let child = self
            .container(child_id)
            .ok_or(InitError::ChildContainerMissing(window_id))?;
        self.state().child_container_id = child_id;

        child.configure_sub_container(SubContainerConfig {
            kind: SubContainerKind::Subwindow,
            window_id,
            parent_id,
            resources: parent.resources(),
            use_shared_runtime: true,
        });
        child.set_ui_window(Some(Arc::clone(&window)));
        let request = window.request_rect();
        let (width, height) = (request.width as i32, request.height as i32);
        child.set_view(ViewConfig::new(width, height, parent_pipeline.density()));
        child.surface_changed(width, height);
        child.set_font_scale_and_weight_scale();

        self.register_free_multi_window_listener(window.as_ref(), child_id);
        if let Err(err) = window
            .set_avoid_area_option(ENABLE_SYSTEM_WINDOW_AVOID_AREA | ENABLE_APP_SUB_WINDOW_AVOID_AREA)
        {
            tracing::warn!(subwindow_id = self.id, error = %err, "set avoid area option failed");
        }

        let sub_pipeline = child
            .pipeline()
            .ok_or(InitError::SubPipelineMissing(child_id))?;
        let _scope = ContainerScope::new(child_id);
        sub_pipeline.set_parent_pipeline(parent_id);
        sub_pipeline.setup_sub_root_element();
        sub_pipeline.apply_inherited_settings(&parent_pipeline.inherited_settings());
        if sub_pipeline.kind() == PipelineKind::NextGen {
            sub_pipeline.set_use_cutout(parent_pipeline.use_cutout());
        }
        tracing::info!(
            subwindow_id = self.id,
            parent_id,
            child_id,
            window_id,
            pipeline = %sub_pipeline.kind(),
            "subwindow initialized"
        );
        Ok(())
    }

    fn create_window(
        &self,
        parent: &dyn Container,
        host_window_id: u32,
    ) -> Result<Arc<dyn Window>, InitError> {
        let parent_id = self.parent_container_id;
        let parent_window_name = parent.window_name();
        let parent_window = self
            .platform
            .windows
            .find(&parent_window_name)
            .ok_or(InitError::ParentWindowMissing(parent_id))?;
        let options = self.options();
        let inputs = WindowKindInputs {
            system_top_most: options.system_top_most,
            above_apps: options.above_apps,
            toast_window_type: options.toast_window_type,
            select_overlay: options.select_overlay,
            main_window_id: options.main_window_id,
            scene_board_enabled: parent.is_scene_board_enabled(),
            scene_board_window: parent.is_scene_board_window(),
            parent_is_ui_extension: parent.is_ui_extension_window(),
            parent_window_type: parent_window.window_type(),
            parent_window_id: parent_window.window_id(),
            parent_ui_ext_sub_window: parent_window.is_ui_ext_first_sub_window()
                || parent_window.is_ui_ext_any_sub_window(),
            host_window_id,
        };
        let kind = resolve_window_kind(&inputs);

        if inputs.parent_window_type == WindowType::UiExtension {
            let host_rect = parent_window.host_window_rect(host_window_id);
            if host_rect.width == 0 || host_rect.height == 0 {
                tracing::warn!(
                    parent_id,
                    host_window_id,
                    "ui extension host window is not ready, check window permissions"
                );
                return Err(InitError::HostWindowNotReady(host_window_id));
            }
        }

        let display_id = parent.current_display_id();
        let display = self
            .platform
            .displays
            .display_by_id(display_id)
            .ok_or(InitError::DisplayMissing(display_id))?;

        let mut option = WindowOption::new(kind.window_type);
        option.rect = display.bounds();
        option.parent_id = kind.parent_id;
        option.display_id = display_id;
        option.ui_ext_first_sub_window = kind.ui_ext_first_sub_window;
        option.ui_ext_any_sub_window = kind.ui_ext_any_sub_window;
        for flag in &kind.flags {
            option.add_flag(*flag);
        }
        let name = format!(
            "{SUBWINDOW_NAME_PREFIX}{}{parent_window_name}{}",
            kind.tag, self.id
        );
        let window = self.platform.windows.create(&name, option)?;
        tracing::info!(
            subwindow_id = self.id,
            window_id = window.window_id(),
            %name,
            window_type = ?kind.window_type,
            parent_window = ?kind.parent_id,
            "subwindow window created"
        );
        if let Err(err) = window.set_follow_screen_change(kind.follow_screen) {
            tracing::warn!(subwindow_id = self.id, error = %err, "set follow screen change failed");
        }

        let mut state = self.state();
        state.window = Some(Arc::clone(&window));
        state.parent_window = Some(parent_window);
        state.default_display_id = display_id;
        if kind.ui_extension_host.is_some() {
            state.ui_extension_host_window_id = kind.ui_extension_host;
        }
        Ok(window)
    }

    /// Size a full-screen subwindow should take on `display_id`.
    ///
    /// Super-fold devices exclude the crease for cross-axis and scene-board
    /// parents while folded.
    pub(crate) fn sub_window_size(&self, display_id: u64) -> Option<Size> {
        let display = self.platform.displays.display_by_id(display_id)?;
        let mut size = display.size();
        if !self.platform.system.super_fold_display_device {
            return Some(size);
        }
        let Some(parent) = self.parent_container() else {
            return Some(size);
        };
        if parent.current_fold_status() == FoldStatus::Expand {
            return Some(size);
        }
        if parent.is_cross_axis_window() || parent.is_scene_board_window() {
            match self.platform.displays.visible_area_display(DEFAULT_DISPLAY_ID) {
                Some(visible) => size = visible.size(),
                None => tracing::info!(display_id, "no visible area display"),
            }
        }
        tracing::info!(display_id, %size, "super fold subwindow size");
        Some(size)
    }

    /// Resizes the window to the size of its display.
    pub fn resize_window(&self) {
        let Some(window) = self.window() else {
            tracing::error!(subwindow_id = self.id, "resize window: window is null");
            return;
        };
        let Some(size) = self.sub_window_size(window.display_id()) else {
            tracing::error!(subwindow_id = self.id, "resize window: display not found");
            return;
        };
        match window.resize(size.width, size.height) {
            Ok(()) => tracing::info!(subwindow_id = self.id, %size, "subwindow resized"),
            Err(err) => tracing::error!(subwindow_id = self.id, error = %err, "resize window failed"),
        }
    }

    /// Resizes the window for a menu. In landscape, unless overlays expand
    /// to the display, a menu stays within the parent's window.
    pub fn resize_window_for_menu(&self) {
        let Some(parent) = self.parent_container() else {
            tracing::error!(subwindow_id = self.id, "resize for menu: parent container is null");
            return;
        };
        let Some(parent_pipeline) = parent.pipeline() else {
            return;
        };
        let expand = parent_pipeline.expand_display() || parent.is_free_multi_window();
        if expand || self.platform.system.orientation != DeviceOrientation::Landscape {
            self.resize_window();
            return;
        }
        let Some(window) = self.window() else {
            return;
        };
        let rect = if parent.is_ui_extension_window() {
            super::hot_area::rect_converter(&self.ui_extension_host_window_rect())
        } else {
            parent_pipeline.display_window_rect()
        };
        match window.resize(rect.width, rect.height) {
            Ok(()) => tracing::info!(subwindow_id = self.id, %rect, "menu subwindow resized"),
            Err(err) => tracing::error!(subwindow_id = self.id, error = %err, "resize for menu failed"),
        }
    }

    pub fn resize_window_for_fold_status(&self) {
        let Some(window) = self.window() else {
            tracing::error!(subwindow_id = self.id, "fold status resize: window is null");
            return;
        };
        let Some(display) = self.platform.displays.default_display() else {
            tracing::error!(subwindow_id = self.id, "fold status resize: no default display");
            return;
        };
        let display_size = display.size();
        match window.resize(display.width, display.height) {
            Ok(()) => tracing::info!(
                subwindow_id = self.id,
                size = %display_size,
                "subwindow resized for fold status"
            ),
            Err(err) => tracing::error!(subwindow_id = self.id, error = %err, "fold status resize failed"),
        }
    }

    /// Fold-status resize on behalf of `parent_id`. App parents resize
    /// directly; service parents resize their dialog window on the
    /// toast/dialog loop.
    pub fn resize_window_for_fold_status_of(&self, parent_id: i32) {
        if parent_id > 0 && parent_id < crate::constants::MIN_PA_SERVICE_ID {
            self.resize_window_for_fold_status();
            return;
        }
        let Some(handler) = self.event_handler() else {
            tracing::warn!(parent_id, "fold status resize: no toast/dialog event loop");
            return;
        };
        let platform = self.platform.clone();
        handler.post_task(
            Box::new(move || {
                let Some(subwindow) = platform.manager.current_dialog_window(parent_id) else {
                    tracing::error!(parent_id, "fold status resize: no dialog subwindow");
                    return;
                };
                let child_id = subwindow.child_container_id();
                let _scope = ContainerScope::new(child_id);
                let Some(container) = platform.containers.container(child_id) else {
                    return;
                };
                let Some(window) = container.ui_window() else {
                    return;
                };
                let Some(display) = platform.displays.default_display() else {
                    return;
                };
                if let Err(err) = window.resize(display.width, display.height) {
                    tracing::error!(parent_id, error = %err, "dialog window resize failed");
                    return;
                }
                container.surface_changed(display.width as i32, display.height as i32);
            }),
            "ArkUISubwindowResizeWindowForFoldStatus",
            crate::executor::TaskPriority::High,
        );
    }

    /// Resizes a dialog subwindow to the default display, on the task
    /// executor of the container currently in scope.
    pub fn resize_dialog_subwindow(&self) {
        let Some(display) = self.platform.displays.default_display() else {
            return;
        };
        let Some(window) = self.window() else {
            return;
        };
        let rect = window.rect();
        if rect.width == display.width && rect.height == display.height {
            return;
        }
        let current_id = ContainerScope::current_id();
        let Some(executor) = self
            .container(current_id)
            .and_then(|container| container.task_executor())
        else {
            tracing::warn!(current_id, "resize dialog subwindow: no task executor");
            return;
        };
        let this = self.this.clone();
        executor.post_task(
            Box::new(move || {
                if let Some(subwindow) = this.upgrade() {
                    subwindow.resize_window();
                }
            }),
            crate::executor::TaskType::Ui,
            "ArkUIResizeDialogSubwindow",
            crate::executor::TaskPriority::High,
        );
    }
}
