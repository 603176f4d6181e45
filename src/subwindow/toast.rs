//! Toasts and dialogs.
//!
//! Callers with a UI container (abilities) present through their child
//! container's frontend. Service callers have no container to present in,
//! so the subwindow creates a full-screen toast/dialog window with its own
//! dialog container and drives it from a dedicated event loop; tasks on
//! that loop run strictly in posting order.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::{
    APP_FONT_MAX_SCALE, APP_FONT_SIZE_SCALE, FOLLOW_SYSTEM, SYSTEM_FONT_SIZE_SCALE, parse_scale,
};
use crate::constants::{
    INSTANCE_ID_UNDEFINED, PLATFORM_VERSION_TEN, TOAST_DIALOG_NAME_PREFIX, TOAST_DIALOG_RUNNER_NAME,
};
use crate::container::{ContainerScope, SubContainerConfig, SubContainerKind, ViewConfig};
use crate::error::InitError;
use crate::event_loop::EventRunner;
use crate::executor::TaskPriority;
use crate::frontend::{DialogRequest, Frontend};
use crate::overlay::{
    ButtonInfo, CustomDialogCallback, DialogCallback, PromptDialogAttr, ToastCallback, ToastInfo,
};
use crate::window::{WindowMode, WindowOption, WindowRect, WindowType};

use super::{Subwindow, dialog_routes_to_service, toast_routes_to_service};

/// Placement of a toast/dialog window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToastDialogGeometry {
    pub rect: WindowRect,
    pub density: f32,
}

impl Default for ToastDialogGeometry {
    fn default() -> Self {
        Self {
            rect: WindowRect::default(),
            density: 1.0,
        }
    }
}

impl Subwindow {
    /// Starts the toast/dialog event loop if it is not running yet.
    pub fn create_event_runner(&self) -> bool {
        let mut runner = self.event_runner.lock().unwrap_or_else(|e| e.into_inner());
        if runner.is_some() {
            return true;
        }
        match EventRunner::create(TOAST_DIALOG_RUNNER_NAME) {
            Ok(created) => {
                *runner = Some(created);
                true
            }
            Err(err) => {
                tracing::error!(subwindow_id = self.id, error = %err, "toast/dialog event loop failed to start");
                false
            }
        }
    }

    /// Full-screen geometry on the display of the current dialog window of
    /// this parent, or on the default display.
    pub fn toast_dialog_window_property(&self) -> ToastDialogGeometry {
        let dialog_display = self
            .platform
            .manager
            .current_dialog_window(self.parent_container_id)
            .and_then(|subwindow| subwindow.dialog_window())
            .and_then(|window| self.platform.displays.display_by_id(window.display_id()));
        let display = dialog_display.or_else(|| self.platform.displays.default_display());
        match display {
            Some(display) => ToastDialogGeometry {
                rect: display.bounds(),
                density: display.virtual_pixel_ratio,
            },
            None => {
                tracing::warn!(subwindow_id = self.id, "toast/dialog window: no display");
                ToastDialogGeometry::default()
            }
        }
    }

    /// Creates the full-screen toast or dialog window and adjusts
    /// `geometry` to the size of the display it landed on.
    pub fn init_toast_dialog_window(
        &self,
        geometry: &mut ToastDialogGeometry,
        is_toast: bool,
    ) -> Result<(), InitError> {
        let window_type = match (is_toast, self.options().system_top_most) {
            (true, true) => WindowType::SystemToast,
            (true, false) => WindowType::Toast,
            (false, _) => WindowType::AppMainWindow,
        };
        let mut option = WindowOption::new(window_type);
        option.rect = geometry.rect;
        option.mode = WindowMode::FullScreen;
        option.focusable = !is_toast;
        option.application_context = is_toast;
        let name = format!(
            "{TOAST_DIALOG_NAME_PREFIX}{}",
            self.platform.manager.next_toast_dialog_id()
        );
        let window = self.platform.windows.create(&name, option)?;
        if let Err(err) = window.set_layout_full_screen(true) {
            tracing::warn!(subwindow_id = self.id, error = %err, "toast/dialog layout full screen failed");
        }
        self.state().dialog_window = Some(Arc::clone(&window));

        let display_id = window.display_id();
        let display = self
            .platform
            .displays
            .display_by_id(display_id)
            .ok_or(InitError::DisplayMissing(display_id))?;
        geometry.rect.width = display.width;
        geometry.rect.height = display.height;
        tracing::info!(
            subwindow_id = self.id,
            %name,
            window_id = window.window_id(),
            is_toast,
            "toast/dialog window created"
        );
        Ok(())
    }

    /// Creates the dialog container behind the toast/dialog window.
    pub fn init_toast_dialog_view(&self, geometry: &ToastDialogGeometry) -> Result<(), InitError> {
        let window = self.dialog_window().ok_or(InitError::DialogWindowMissing)?;
        if let Err(err) = window.set_ui_content() {
            tracing::warn!(subwindow_id = self.id, error = %err, "attaching dialog content failed");
        }
        let window_id = window.window_id();
        let child_id = self
            .platform
            .containers
            .container_id_for_window(window_id)
            .ok_or(InitError::ChildContainerMissing(window_id))?;
        self.platform
            .manager
            .add_parent_container_id(child_id, self.parent_container_id);
        self.state().child_container_id = child_id;
        let _scope = ContainerScope::new(child_id);
        let container = self
            .container(child_id)
            .ok_or(InitError::ChildContainerMissing(window_id))?;

        container.configure_sub_container(SubContainerConfig {
            kind: SubContainerKind::Dialog,
            window_id,
            parent_id: self.parent_container_id,
            resources: Default::default(),
            use_shared_runtime: true,
        });
        container.set_ui_window(Some(window));
        let (width, height) = (geometry.rect.width as i32, geometry.rect.height as i32);
        container.set_view(ViewConfig::new(width, height, f64::from(geometry.density)));
        container.surface_changed(width, height);

        let pipeline = container
            .pipeline()
            .ok_or(InitError::SubPipelineMissing(child_id))?;
        pipeline.setup_sub_root_element();
        match self.parent_container() {
            Some(parent) => {
                let parent_pipeline = parent
                    .pipeline()
                    .ok_or(InitError::ParentPipelineMissing(self.parent_container_id))?;
                let settings = parent_pipeline.inherited_settings();
                pipeline.set_min_platform_version(settings.min_platform_version);
                pipeline.set_api_target_version(settings.api_target_version);
            }
            None => {
                pipeline.set_min_platform_version(PLATFORM_VERSION_TEN);
                pipeline.set_api_target_version(container.api_target_version());
            }
        }
        tracing::info!(subwindow_id = self.id, child_id, window_id, "toast/dialog view initialized");
        Ok(())
    }

    /// Applies the application font configuration to the dialog pipeline.
    /// Returns `false` when there is no configuration or no pipeline.
    pub fn init_toast_service_config(&self) -> bool {
        let Some(config) = self.platform.app_configuration.clone() else {
            return false;
        };
        let Some(pipeline) = self.child_pipeline() else {
            return false;
        };
        let follow = config.item(APP_FONT_SIZE_SCALE);
        let is_follow_system = follow == Some(FOLLOW_SYSTEM);
        if follow.is_some() {
            pipeline.set_follow_system(is_follow_system);
        }
        if let Some(max_scale) = config.item(APP_FONT_MAX_SCALE) {
            pipeline.set_max_app_font_scale(parse_scale(max_scale));
        }
        if !is_follow_system {
            pipeline.set_font_scale(1.0);
        }
        if let Some(scale) = config.item(SYSTEM_FONT_SIZE_SCALE) {
            pipeline.set_font_scale(parse_scale(scale));
        }
        true
    }

    /// Pushes new view metrics to `container_id` when the size changed.
    pub fn update_ace_view(&self, width: i32, height: i32, density: f32, container_id: i32) {
        let Some(container) = self.container(container_id) else {
            return;
        };
        let Some(view) = container.view() else {
            return;
        };
        if view.width != width || view.height != height {
            container.set_view(ViewConfig::new(width, height, f64::from(density)));
            container.surface_changed(width, height);
        }
    }

    fn show_toast_dialog_window(&self, geometry: &ToastDialogGeometry, is_toast: bool) {
        let Some(window) = self.dialog_window() else {
            return;
        };
        window.set_need_default_animation(false);
        if is_toast {
            if let Err(err) = window.set_touchable(false) {
                tracing::warn!(subwindow_id = self.id, error = %err, "toast set touchable failed");
            }
        }
        let rect = geometry.rect;
        if let Err(err) = window.move_to(rect.pos_x, rect.pos_y) {
            tracing::warn!(subwindow_id = self.id, error = %err, "toast/dialog move failed");
        }
        if let Err(err) = window.resize(rect.width, rect.height) {
            tracing::warn!(subwindow_id = self.id, error = %err, "toast/dialog resize failed");
        }
        if let Err(err) = window.show(false, !is_toast) {
            tracing::error!(subwindow_id = self.id, code = err.code(), "toast/dialog show failed");
            return;
        }
        if !is_toast {
            if let Err(err) = window.request_focus() {
                tracing::warn!(subwindow_id = self.id, error = %err, "dialog request focus failed");
            }
        }
    }

    /// Creates the dialog window and its container. Logs and returns
    /// `None` on failure.
    fn init_toast_dialog(&self, is_toast: bool) -> Option<ToastDialogGeometry> {
        let mut geometry = self.toast_dialog_window_property();
        let result = self
            .init_toast_dialog_window(&mut geometry, is_toast)
            .and_then(|()| self.init_toast_dialog_view(&geometry));
        match result {
            Ok(()) => Some(geometry),
            Err(err) => {
                tracing::error!(subwindow_id = self.id, error = %err, is_toast, "toast/dialog init failed");
                None
            }
        }
    }

    fn child_frontend(&self) -> Option<Arc<dyn Frontend>> {
        self.child_container()?.frontend()
    }

    /// Posts `task` on the toast/dialog loop, starting it if needed. The
    /// subwindow becomes the dialog subwindow of its parent before the post.
    fn post_service_task(&self, name: &'static str, task: impl FnOnce(Arc<Subwindow>) + Send + 'static) -> bool {
        if !self.create_event_runner() {
            return false;
        }
        let Some(handler) = self.event_handler() else {
            return false;
        };
        self.register_dialog_subwindow();
        let this = self.this.clone();
        handler.post_task(
            Box::new(move || {
                if let Some(subwindow) = this.upgrade() {
                    task(subwindow);
                }
            }),
            name,
            TaskPriority::High,
        )
    }

    /// Blocks until every task queued on the toast/dialog loop so far has
    /// run. Returns `false` when the loop was never started.
    pub fn sync_service_loop(&self) -> bool {
        let Some(handler) = self.event_handler() else {
            return false;
        };
        handler.post_sync_task(Box::new(|| {}), "ArkUISubwindowSync")
    }

    // toast

    /// Shows a toast, on the service loop or through the child container,
    /// depending on who asked.
    pub fn show_toast(&self, info: ToastInfo, callback: ToastCallback) {
        tracing::info!(
            subwindow_id = self.id,
            parent_id = self.parent_container_id,
            show_mode = ?info.show_mode,
            "show toast"
        );
        if toast_routes_to_service(self.parent_container_id, info.show_mode) {
            self.show_toast_for_service(info, callback);
        } else {
            self.show_toast_for_ability(info, callback);
        }
    }

    fn show_toast_for_service(&self, info: ToastInfo, callback: ToastCallback) {
        let parent_id = self.parent_container_id;
        let posted = self.post_service_task("ArkUISubwindowShowToastForService", move |subwindow| {
            let target = subwindow
                .platform
                .manager
                .current_dialog_window(parent_id)
                .unwrap_or(subwindow);
            target.run_service_toast(info, callback);
        });
        if !posted {
            tracing::error!(subwindow_id = self.id, "show toast: service loop unavailable");
        }
    }

    fn run_service_toast(&self, info: ToastInfo, callback: ToastCallback) {
        let reuse = self.is_toast_window()
            && self.dialog_window().is_some()
            && self.child_container().is_some_and(|c| c.ui_window().is_some());
        let geometry = if reuse {
            tracing::info!(subwindow_id = self.id, "reuse toast window");
            self.toast_dialog_window_property()
        } else {
            let Some(geometry) = self.init_toast_dialog(true) else {
                return;
            };
            self.set_is_toast_window(true);
            geometry
        };
        let child_id = self.child_container_id();
        let _scope = ContainerScope::new(child_id);
        let (width, height) = (geometry.rect.width as i32, geometry.rect.height as i32);
        self.update_ace_view(width, height, geometry.density, child_id);
        let Some(container) = self.container(child_id) else {
            return;
        };
        container.set_font_scale_and_weight_scale();
        self.init_toast_service_config();
        self.show_toast_dialog_window(&geometry, true);
        let Some(frontend) = container.frontend() else {
            tracing::error!(subwindow_id = self.id, "show toast: frontend is null");
            return;
        };
        frontend.show_toast(info, callback);
    }

    fn show_toast_for_ability(&self, info: ToastInfo, callback: ToastCallback) {
        let Some(parent) = self.parent_container() else {
            tracing::error!(subwindow_id = self.id, "show toast: parent container is null");
            return;
        };
        let is_toast = info.is_top_most() || parent.is_scene_board_window();
        self.set_is_toast_window(is_toast);
        let Some(frontend) = self.child_frontend() else {
            tracing::error!(subwindow_id = self.id, "show toast: child frontend is null");
            return;
        };
        let _scope = self.enter_child_scope();
        if is_toast {
            self.resize_window();
            self.state().need_set_current_window = false;
            if let Err(err) = self.show_window(false) {
                tracing::warn!(subwindow_id = self.id, error = %err, "show toast: show window failed");
            }
            if let Some(window) = self.window() {
                if let Err(err) = window.set_touchable(false) {
                    tracing::warn!(subwindow_id = self.id, error = %err, "toast set touchable failed");
                }
            }
        }
        frontend.show_toast(info, callback);
    }

    pub fn close_toast(&self, toast_id: i32, callback: ToastCallback) {
        let parent_id = self.parent_container_id;
        tracing::info!(subwindow_id = self.id, parent_id, toast_id, "close toast");
        if dialog_routes_to_service(parent_id) {
            let Some(subwindow) = self.platform.manager.current_dialog_window(parent_id) else {
                tracing::warn!(parent_id, "close toast: no dialog subwindow");
                return;
            };
            let child_id = subwindow.child_container_id();
            if child_id == INSTANCE_ID_UNDEFINED {
                return;
            }
            let _scope = ContainerScope::new(child_id);
            let Some(frontend) = self.container(child_id).and_then(|c| c.frontend()) else {
                return;
            };
            frontend.close_toast(toast_id, callback);
        } else {
            let Some(frontend) = self.child_frontend() else {
                return;
            };
            let _scope = self.enter_child_scope();
            frontend.close_toast(toast_id, callback);
        }
    }

    /// Clears the toast shown in this subwindow and hides it.
    pub fn clear_toast(&self) {
        if !self.is_toast_window() {
            tracing::warn!(subwindow_id = self.id, "clear toast: not a toast subwindow");
            return;
        }
        let Some(ctx) = self.child_context() else {
            return;
        };
        let _scope = ContainerScope::new(ctx.container.id());
        ctx.overlay.clear_toast();
        ctx.pipeline.flush_pipeline_immediately();
        self.hide_window();
    }

    // dialogs without an overlay node

    pub fn show_dialog(&self, request: DialogRequest, callback: DialogCallback) {
        tracing::info!(subwindow_id = self.id, parent_id = self.parent_container_id, "show dialog");
        if dialog_routes_to_service(self.parent_container_id) {
            let posted = self.post_service_task("ArkUISubwindowShowDialogForService", move |subwindow| {
                subwindow.run_service_dialog(|frontend| frontend.show_dialog(request, callback), true);
            });
            if !posted {
                tracing::error!(subwindow_id = self.id, "show dialog: service loop unavailable");
            }
            return;
        }
        let Some(frontend) = self.ability_frontend() else {
            return;
        };
        frontend.show_dialog(request, callback);
    }

    pub fn show_dialog_with_attr(
        &self,
        attr: PromptDialogAttr,
        buttons: Vec<ButtonInfo>,
        callback: DialogCallback,
        callbacks: BTreeSet<String>,
    ) {
        tracing::info!(subwindow_id = self.id, parent_id = self.parent_container_id, "show dialog");
        if dialog_routes_to_service(self.parent_container_id) {
            let posted = self.post_service_task("ArkUISubwindowShowDialogForService", move |subwindow| {
                subwindow.run_service_dialog(
                    |frontend| frontend.show_dialog_with_attr(attr, buttons, callback, callbacks),
                    false,
                );
            });
            if !posted {
                tracing::error!(subwindow_id = self.id, "show dialog: service loop unavailable");
            }
            return;
        }
        let Some(frontend) = self.ability_frontend() else {
            return;
        };
        frontend.show_dialog_with_attr(attr, buttons, callback, callbacks);
    }

    pub fn show_action_menu(&self, title: String, buttons: Vec<ButtonInfo>, callback: DialogCallback) {
        tracing::info!(subwindow_id = self.id, parent_id = self.parent_container_id, "show action menu");
        if dialog_routes_to_service(self.parent_container_id) {
            let posted = self.post_service_task("ArkUISubwindowShowActionMenuForService", move |subwindow| {
                subwindow.run_service_dialog(
                    |frontend| frontend.show_action_menu(title, buttons, callback),
                    true,
                );
            });
            if !posted {
                tracing::error!(subwindow_id = self.id, "show action menu: service loop unavailable");
            }
            return;
        }
        let Some(frontend) = self.ability_frontend() else {
            return;
        };
        frontend.show_action_menu(title, buttons, callback);
    }

    /// Custom dialogs need a UI container; service callers only get a
    /// warning.
    pub fn open_custom_dialog(&self, attr: PromptDialogAttr, callback: CustomDialogCallback) {
        if dialog_routes_to_service(self.parent_container_id) {
            tracing::warn!(
                subwindow_id = self.id,
                parent_id = self.parent_container_id,
                "custom dialog is not supported for service callers"
            );
            return;
        }
        let Some(frontend) = self.ability_frontend() else {
            return;
        };
        frontend.open_custom_dialog(attr, callback);
    }

    /// Closes the dialog presented by container `instance_id`.
    pub fn close_dialog(&self, instance_id: i32) {
        tracing::info!(subwindow_id = self.id, instance_id, "close dialog");
        let Some(container) = self.container(instance_id) else {
            tracing::warn!(instance_id, "close dialog: container is null");
            return;
        };
        container.close_window();
    }

    /// Publishes this subwindow as the dialog subwindow of its parent before
    /// any service task is queued, so close requests find it right away.
    fn register_dialog_subwindow(&self) {
        if let Some(this) = self.arc() {
            self.platform.manager.set_current_dialog_subwindow(this);
        }
    }

    fn run_service_dialog(&self, present: impl FnOnce(&dyn Frontend), apply_font_scale: bool) {
        self.set_is_toast_window(false);
        let Some(geometry) = self.init_toast_dialog(false) else {
            return;
        };
        let child_id = self.child_container_id();
        let _scope = ContainerScope::new(child_id);
        let Some(container) = self.container(child_id) else {
            return;
        };
        if apply_font_scale {
            container.set_font_scale_and_weight_scale();
        }
        self.show_toast_dialog_window(&geometry, false);
        let Some(frontend) = container.frontend() else {
            tracing::error!(subwindow_id = self.id, "service dialog: frontend is null");
            return;
        };
        present(frontend.as_ref());
    }

    /// Frontend of the child container for ability callers; marks this
    /// subwindow current for its parent.
    fn ability_frontend(&self) -> Option<Arc<dyn Frontend>> {
        if let Some(this) = self.arc() {
            self.platform.manager.set_current_subwindow(this);
        }
        let frontend = self.child_frontend();
        if frontend.is_none() {
            tracing::error!(subwindow_id = self.id, "child frontend is null");
        }
        frontend
    }
}
