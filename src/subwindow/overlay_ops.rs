//! Overlay operations.
//!
//! Every show operation follows one pattern: size the window, show it,
//! make it touchable, then hand the request to the child pipeline's overlay
//! manager inside the child container's scope. Hide operations do the
//! reverse and also clean the transient drag visuals left on the parent.

use std::sync::Arc;

use crate::constants::MENU_WRAPPER_TAG;
use crate::container::{Container, ContainerScope};
use crate::geometry::OffsetF;
use crate::overlay::{
    ComponentKind, ComponentRef, CustomDialogCallback, DialogProperties, DismissCallback,
    MenuParam, MenuPreviewMode, NodeBuilder, NodeRef, PopupInfo,
};
use crate::window::Window;

use super::Subwindow;

impl Subwindow {
    // popups

    pub fn show_popup_ng(
        &self,
        target_id: i32,
        info: &PopupInfo,
        on_will_dismiss: Option<DismissCallback>,
        interactive_dismiss: bool,
    ) {
        self.state().popup_target_id = target_id;
        let Some(ctx) = self.child_context() else {
            tracing::error!(subwindow_id = self.id, "show popup: child context is null");
            return;
        };
        let Some(window) = self.window() else {
            return;
        };
        self.resize_window();
        if let Err(err) = self.show_window(info.focusable) {
            tracing::warn!(subwindow_id = self.id, error = %err, "show popup: show window failed");
        }
        set_touchable(window.as_ref(), true);
        let _scope = ContainerScope::new(ctx.container.id());
        self.state().need_avoid_keyboard = info.is_avoid_keyboard;
        ctx.overlay
            .show_popup(target_id, info, on_will_dismiss, interactive_dismiss);
        if let Err(err) = window.set_focusable(true) {
            tracing::warn!(subwindow_id = self.id, error = %err, "show popup: set focusable failed");
        }
    }

    /// Hides the popup of `target_id`; `-1` means the popup shown last.
    pub fn hide_popup_ng(&self, target_id: i32) {
        let target_id = if target_id == -1 {
            self.popup_target_id()
        } else {
            target_id
        };
        tracing::info!(subwindow_id = self.id, target_id, "hide popup");
        let Some(ctx) = self.child_context() else {
            return;
        };
        let mut info = ctx.overlay.popup_info(target_id);
        info.mark_need_update = true;
        {
            let _scope = ContainerScope::new(ctx.container.id());
            ctx.overlay.hide_popup(target_id, &info);
            ctx.pipeline.flush_pipeline_immediately();
        }
        self.hide_event_column();
        self.hide_pixel_map(false, 0.0, 0.0, false);
        self.hide_window();
    }

    pub fn popup_info_ng(&self, target_id: i32) -> Option<PopupInfo> {
        let ctx = self.child_context()?;
        Some(ctx.overlay.popup_info(target_id))
    }

    pub fn show_tips_ng(
        &self,
        target_id: i32,
        info: &PopupInfo,
        appearing_time: i32,
        appearing_time_with_continuous_operation: i32,
    ) {
        self.state().popup_target_id = target_id;
        let Some(ctx) = self.child_context() else {
            return;
        };
        let Some(window) = self.window() else {
            return;
        };
        self.resize_window();
        if let Err(err) = self.show_window(info.focusable) {
            tracing::warn!(subwindow_id = self.id, error = %err, "show tips: show window failed");
        }
        set_touchable(window.as_ref(), true);
        let _scope = ContainerScope::new(ctx.container.id());
        ctx.overlay.show_tips(
            target_id,
            info,
            appearing_time,
            appearing_time_with_continuous_operation,
            true,
        );
        if let Err(err) = window.set_focusable(true) {
            tracing::warn!(subwindow_id = self.id, error = %err, "show tips: set focusable failed");
        }
    }

    pub fn hide_tips_ng(&self, target_id: i32, disappearing_time: i32) {
        let target_id = if target_id == -1 {
            self.popup_target_id()
        } else {
            target_id
        };
        let Some(ctx) = self.child_context() else {
            return;
        };
        let mut info = ctx.overlay.popup_info(target_id);
        info.mark_need_update = true;
        {
            let _scope = ContainerScope::new(ctx.container.id());
            ctx.overlay.hide_tips(target_id, &info, disappearing_time);
            ctx.pipeline.flush_pipeline_immediately();
        }
        self.hide_event_column();
        self.hide_pixel_map(false, 0.0, 0.0, false);
        self.hide_window();
    }

    /// Removes every popup from the subwindow and hides it.
    pub fn clear_popup_ng(&self, force_clear: bool) {
        let Some(ctx) = self.child_context() else {
            return;
        };
        let _scope = ContainerScope::new(ctx.container.id());
        ctx.overlay.clean_popup_in_sub_window(force_clear);
        self.hide_window();
        ctx.pipeline.flush_pipeline_immediately();
    }

    // menus

    /// Shows an already built menu. Content that is not yet wrapped is
    /// wrapped for `target` first.
    pub fn show_menu_ng(
        &self,
        custom: NodeRef,
        param: &MenuParam,
        target: Option<&NodeRef>,
        offset: OffsetF,
    ) {
        let Some(target) = target else {
            tracing::info!(subwindow_id = self.id, "show menu: target node is null");
            return;
        };
        let Some(ctx) = self.child_context() else {
            return;
        };
        let Some(window) = self.window() else {
            return;
        };
        let _scope = ContainerScope::new(ctx.container.id());
        let menu = if custom.tag == MENU_WRAPPER_TAG {
            custom
        } else {
            match ctx.overlay.build_menu(custom, target, param, None) {
                Some(menu) => menu,
                None => {
                    tracing::warn!(subwindow_id = self.id, "show menu: menu build failed");
                    return;
                }
            }
        };
        self.resize_window_for_menu();
        if let Err(err) = self.show_window(true) {
            tracing::warn!(subwindow_id = self.id, error = %err, "show menu: show window failed");
        }
        set_touchable(window.as_ref(), true);
        ctx.overlay.show_menu_in_sub_window(target.id, offset, menu);
    }

    /// Builds the menu content (and a custom preview, when the preview mode
    /// asks for one) inside the subwindow, then shows it.
    pub fn show_menu_ng_with_builder(
        &self,
        build: NodeBuilder,
        preview_build: Option<NodeBuilder>,
        param: &MenuParam,
        target: Option<&NodeRef>,
        offset: OffsetF,
    ) {
        let Some(target) = target else {
            tracing::info!(subwindow_id = self.id, "show menu: target node is null");
            return;
        };
        let Some(ctx) = self.child_context() else {
            return;
        };
        let Some(window) = self.window() else {
            return;
        };
        let _scope = ContainerScope::new(ctx.container.id());
        self.resize_window_for_menu();
        if let Err(err) = self.show_window(true) {
            tracing::warn!(subwindow_id = self.id, error = %err, "show menu: show window failed");
        }
        set_touchable(window.as_ref(), true);
        let Some(custom) = build() else {
            tracing::warn!(subwindow_id = self.id, "show menu: content build failed");
            return;
        };
        let preview = match (param.preview_mode, preview_build) {
            (MenuPreviewMode::Custom, Some(preview_build)) => preview_build(),
            _ => None,
        };
        let Some(menu) = ctx.overlay.build_menu(custom, target, param, preview) else {
            return;
        };
        ctx.overlay.show_menu_in_sub_window(target.id, offset, menu);
    }

    pub fn hide_menu_ng(&self, show_preview_animation: bool, start_drag: bool) {
        if !self.is_showed() {
            return;
        }
        tracing::info!(subwindow_id = self.id, show_preview_animation, start_drag, "hide menu");
        let Some(ctx) = self.child_context() else {
            return;
        };
        {
            let _scope = ContainerScope::new(ctx.container.id());
            ctx.overlay
                .hide_menu_in_sub_window(show_preview_animation, start_drag);
            ctx.pipeline.flush_pipeline_immediately();
        }
        self.hide_event_column();
        self.hide_pixel_map(start_drag, 0.0, 0.0, false);
        self.hide_filter(false);
        self.hide_window();
    }

    /// Hides one menu node of `target_id`, leaving other menus alone.
    pub fn hide_menu_node_ng(&self, menu: &NodeRef, target_id: i32) {
        if !self.is_showed() {
            return;
        }
        let Some(ctx) = self.child_context() else {
            return;
        };
        {
            let _scope = ContainerScope::new(ctx.container.id());
            ctx.overlay.hide_menu_node_in_sub_window(menu, target_id);
            ctx.pipeline.flush_pipeline_immediately();
        }
        self.hide_event_column();
        self.hide_pixel_map(false, 0.0, 0.0, false);
        // refused while other menus are still mounted
        self.hide_window();
    }

    pub fn clear_menu_ng(&self, target_id: i32, in_window: bool, show_animation: bool) {
        tracing::info!(subwindow_id = self.id, target_id, in_window, show_animation, "clear menu");
        let Some(ctx) = self.child_context() else {
            return;
        };
        {
            let _scope = ContainerScope::new(ctx.container.id());
            if show_animation {
                ctx.overlay.clean_menu_in_sub_window_with_animation();
            } else {
                ctx.overlay.clean_menu_in_sub_window(target_id);
            }
        }
        self.hide_window();
        if ctx.overlay.menu_node(target_id).is_some() {
            ctx.pipeline.flush_pipeline_immediately();
        }
        ctx.overlay.erase_menu_info(target_id);
        if in_window {
            self.hide_event_column();
        }
        self.hide_pixel_map(false, 0.0, 0.0, false);
        self.hide_filter(show_animation);
    }

    /// Keeps the drag pixel map glued to the menu preview.
    pub fn update_preview_position(&self) {
        let Some(ctx) = self.child_context() else {
            return;
        };
        let _scope = ContainerScope::new(ctx.container.id());
        if ctx.overlay.has_pixel_map() {
            return;
        }
        ctx.overlay.update_pixel_map_position(true);
    }

    pub fn menu_preview_center(&self) -> Option<OffsetF> {
        let ctx = self.child_context()?;
        let _scope = ContainerScope::new(ctx.container.id());
        ctx.overlay.menu_preview_center()
    }

    pub fn update_hide_menu_offset_ng(
        &self,
        offset: OffsetF,
        menu_scale: f32,
        is_redrag_start: bool,
        menu_wrapper_id: i32,
    ) {
        let Some(ctx) = self.child_context() else {
            return;
        };
        let _scope = ContainerScope::new(ctx.container.id());
        if ctx.overlay.is_context_menu_drag_hide_finished() {
            return;
        }
        ctx.overlay.update_context_menu_disappear_position(
            offset,
            menu_scale,
            is_redrag_start,
            menu_wrapper_id,
        );
    }

    pub fn context_menu_switch_drag_preview_animation_ng(
        &self,
        drag_preview: Option<&NodeRef>,
        offset: OffsetF,
    ) {
        let Some(preview) = drag_preview else {
            return;
        };
        let Some(ctx) = self.child_context() else {
            return;
        };
        let _scope = ContainerScope::new(ctx.container.id());
        ctx.overlay
            .context_menu_switch_drag_preview_animation(preview, offset);
    }

    // dialogs

    /// Shared preamble of every dialog presentation. Returns the window and
    /// parent container once the window is shown.
    fn prepare_dialog(
        &self,
        ctx: &super::ChildContext,
        props: &DialogProperties,
    ) -> Option<(Arc<dyn Window>, Arc<dyn Container>)> {
        let parent = self.parent_container()?;
        if ctx.overlay.dialog_count() == 0 {
            let Some(parent_overlay) = self.parent_overlay() else {
                tracing::error!(subwindow_id = self.id, "show dialog: parent overlay is null");
                return None;
            };
            parent_overlay.set_sub_window_id(ctx.container.id());
            parent_overlay.set_modal_dialog_display_id(self.display_id());
        }
        let expand = ctx.pipeline.expand_display() || parent.is_free_multi_window();
        if expand {
            self.set_follow_parent_window_layout_enabled(false);
            self.resize_window();
        } else {
            self.set_follow_parent_window_layout_enabled(true);
        }
        if let Err(err) = self.show_window(props.focusable) {
            tracing::warn!(subwindow_id = self.id, error = %err, "show dialog: show window failed");
        }
        let window = self.window()?;
        if let Err(err) = window.set_full_screen(true) {
            tracing::warn!(subwindow_id = self.id, error = %err, "show dialog: full screen failed");
        }
        set_touchable(window.as_ref(), true);
        Some((window, parent))
    }

    /// Records a shown dialog. Modal dialogs of UI-extension parents follow
    /// the host window and are registered as dialog subwindows.
    fn finish_dialog(
        &self,
        window: &dyn Window,
        parent: &dyn Container,
        props: &DialogProperties,
        dialog: Option<&NodeRef>,
    ) {
        if let Some(dialog) = dialog {
            if parent.is_ui_extension_window() && props.is_modal {
                if let Err(err) = window.set_follow_parent_window_layout_enabled(true) {
                    tracing::warn!(subwindow_id = self.id, error = %err, "follow parent layout failed");
                }
                self.state().node_id = Some(dialog.id);
                if let Some(this) = self.arc() {
                    self.platform
                        .manager
                        .add_dialog_subwindow(self.parent_container_id, dialog.id, this);
                }
            }
        }
        self.state().have_dialog = true;
    }

    pub fn show_dialog_ng(&self, props: &DialogProperties, build: NodeBuilder) -> Option<NodeRef> {
        let ctx = self.child_context()?;
        let (window, parent) = self.prepare_dialog(&ctx, props)?;
        let _scope = ContainerScope::new(ctx.container.id());
        let dialog = ctx.overlay.show_dialog(props, build);
        self.finish_dialog(window.as_ref(), parent.as_ref(), props, dialog.as_ref());
        tracing::info!(subwindow_id = self.id, dialog = ?dialog.as_ref().map(|d| d.id), "dialog shown");
        dialog
    }

    pub fn show_dialog_ng_with_node(
        &self,
        props: &DialogProperties,
        custom_node: NodeRef,
    ) -> Option<NodeRef> {
        let ctx = self.child_context()?;
        let (window, parent) = self.prepare_dialog(&ctx, props)?;
        let _scope = ContainerScope::new(ctx.container.id());
        let dialog = ctx.overlay.show_dialog_with_node(props, custom_node);
        self.finish_dialog(window.as_ref(), parent.as_ref(), props, dialog.as_ref());
        dialog
    }

    pub fn open_custom_dialog_ng(&self, props: &DialogProperties, callback: CustomDialogCallback) {
        let Some(ctx) = self.child_context() else {
            return;
        };
        let Some((window, parent)) = self.prepare_dialog(&ctx, props) else {
            return;
        };
        let _scope = ContainerScope::new(ctx.container.id());
        let dialog = ctx.overlay.open_custom_dialog(props, callback);
        self.finish_dialog(window.as_ref(), parent.as_ref(), props, dialog.as_ref());
    }

    pub fn close_dialog_ng(&self, dialog: &NodeRef) {
        let Some(ctx) = self.child_context() else {
            return;
        };
        let _scope = ContainerScope::new(ctx.container.id());
        ctx.overlay.close_dialog(dialog);
    }

    pub fn close_custom_dialog_ng(&self, dialog_id: i32) {
        let Some(ctx) = self.child_context() else {
            return;
        };
        let _scope = ContainerScope::new(ctx.container.id());
        ctx.overlay.close_custom_dialog(dialog_id);
    }

    pub fn close_custom_dialog_ng_by_node(&self, node: &NodeRef, callback: CustomDialogCallback) {
        let Some(ctx) = self.child_context() else {
            return;
        };
        let _scope = ContainerScope::new(ctx.container.id());
        ctx.overlay.close_custom_dialog_by_node(node, callback);
    }

    pub fn update_custom_dialog_ng(
        &self,
        node: &NodeRef,
        props: &DialogProperties,
        callback: CustomDialogCallback,
    ) {
        let Some(ctx) = self.child_context() else {
            return;
        };
        let _scope = ContainerScope::new(ctx.container.id());
        ctx.overlay.update_custom_dialog(node, props, callback);
    }

    /// Closes a custom dialog opened through the frontend path.
    pub fn close_custom_dialog(&self, dialog_id: i32) {
        tracing::info!(subwindow_id = self.id, dialog_id, "close custom dialog");
        self.close_custom_dialog_ng(dialog_id);
    }

    pub fn close_custom_dialog_by_node(&self, node: &NodeRef, callback: CustomDialogCallback) {
        tracing::info!(subwindow_id = self.id, node = node.id, "close custom dialog");
        self.close_custom_dialog_ng_by_node(node, callback);
    }

    /// Re-marks the top dialog dirty so it re-reads the safe area.
    pub fn mark_dirty_dialog_safe_area(&self) {
        let Some(pipeline) = self.child_pipeline() else {
            return;
        };
        if !pipeline.mark_last_child_dirty() {
            tracing::debug!(subwindow_id = self.id, "no dialog to mark dirty");
        }
    }

    // drag preview

    /// Shows the window for a drag preview. Returns whether it is shown.
    pub fn show_preview_ng(&self, is_start_dragging_from_sub_window: bool) -> bool {
        let Some(window) = self.window() else {
            return false;
        };
        self.resize_window();
        if let Err(err) = self.show_window(false) {
            tracing::warn!(subwindow_id = self.id, error = %err, "show preview failed");
            return false;
        }
        if !is_start_dragging_from_sub_window {
            set_touchable(window.as_ref(), false);
        }
        true
    }

    pub fn hide_preview_ng(&self) {
        let Some(ctx) = self.child_context() else {
            return;
        };
        {
            let _scope = ContainerScope::new(ctx.container.id());
            ctx.overlay.remove_pixel_map();
            ctx.overlay.remove_preview_badge_node();
            ctx.overlay.remove_gather_node();
            ctx.overlay.remove_event_column();
            ctx.pipeline.flush_pipeline_immediately();
        }
        self.hide_sub_window_ng();
    }

    /// Hides the subwindow. A dialog container is hidden when it shows a
    /// toast and torn down otherwise.
    pub fn hide_sub_window_ng(&self) {
        let child_id = self.child_container_id();
        let _scope = ContainerScope::new(child_id);
        let Some(container) = self.container(child_id) else {
            return;
        };
        if container.is_dialog_container() {
            if self.is_toast_window() {
                container.hide_window();
            } else {
                container.close_window();
                self.platform.containers.destroy_container(child_id);
            }
            return;
        }
        if let Some(pipeline) = container.pipeline() {
            pipeline.flush_pipeline_immediately();
        }
        self.hide_window();
    }

    /// Removes the drag pixel map from the parent container.
    pub fn hide_pixel_map(&self, start_drag: bool, x: f64, y: f64, show_animation: bool) {
        let Some(overlay) = self.parent_overlay() else {
            return;
        };
        let _scope = ContainerScope::new(self.parent_container_id);
        if show_animation {
            overlay.remove_pixel_map_animation(start_drag, x, y, true);
        } else {
            overlay.remove_pixel_map();
        }
        overlay.remove_gather_node_with_animation();
    }

    /// Removes the drag event column from the parent container.
    pub fn hide_event_column(&self) {
        let Some(overlay) = self.parent_overlay() else {
            return;
        };
        let _scope = ContainerScope::new(self.parent_container_id);
        overlay.remove_event_column();
    }

    /// Removes the menu dim filter from this subwindow and its parent.
    pub fn hide_filter(&self, show_animation: bool) {
        if let Some(overlay) = self.overlay_manager() {
            let _scope = self.enter_child_scope();
            overlay.remove_filter();
        }
        let Some(parent_overlay) = self.parent_overlay() else {
            return;
        };
        let _scope = ContainerScope::new(self.parent_container_id);
        if show_animation {
            parent_overlay.remove_filter_animation();
        } else {
            parent_overlay.remove_filter();
        }
    }

    // legacy pipeline

    pub fn show_popup(&self, component: ComponentRef, disable_touch_event: bool) {
        if component.kind != ComponentKind::Popup {
            tracing::warn!(subwindow_id = self.id, "show popup: component is not a popup");
            return;
        }
        if let Err(err) = self.show_window(true) {
            tracing::warn!(subwindow_id = self.id, error = %err, "show popup: show window failed");
        }
        let Some(stack) = self.legacy_stack() else {
            return;
        };
        let _scope = self.enter_child_scope();
        stack.pop_popup(&component.id);
        stack.push_component(component, disable_touch_event);
    }

    /// Pops the popup `popup_id`; returns `false` without a legacy stack.
    pub fn cancel_popup(&self, popup_id: &str) -> bool {
        let Some(stack) = self.legacy_stack() else {
            return false;
        };
        {
            let _scope = self.enter_child_scope();
            stack.pop_popup(popup_id);
        }
        if let Some(pipeline) = self.child_pipeline() {
            pipeline.flush_pipeline_immediately();
        }
        self.hide_window();
        true
    }

    pub fn add_menu(&self, component: ComponentRef) {
        let Some(stack) = self.legacy_stack() else {
            return;
        };
        let _scope = self.enter_child_scope();
        stack.pop_menu();
        stack.push_component(component.clone(), false);
        if component.kind == ComponentKind::SelectPopup {
            self.state().legacy_menu = Some(component);
        }
    }

    /// Removes the legacy menu; skipped while a dialog is shown.
    pub fn clear_menu(&self) {
        if self.have_dialog() {
            return;
        }
        let Some(stack) = self.legacy_stack() else {
            return;
        };
        {
            let _scope = self.enter_child_scope();
            stack.pop_menu();
        }
        if let Some(pipeline) = self.child_pipeline() {
            pipeline.flush_pipeline_immediately();
        }
        self.hide_window();
    }

    pub fn show_menu(&self, component: ComponentRef) {
        if let Err(err) = self.show_window(true) {
            tracing::warn!(subwindow_id = self.id, error = %err, "show menu: show window failed");
        }
        self.add_menu(component);
    }

    pub fn close_menu(&self) {
        if !self.is_showed() {
            return;
        }
        let Some(menu) = self.state().legacy_menu.clone() else {
            return;
        };
        let Some(stack) = self.legacy_stack() else {
            return;
        };
        let _scope = self.enter_child_scope();
        stack.close_context_menu(&menu);
    }

    // select overlay

    /// Mounts a text selection menu on the subwindow root. Returns `false`
    /// when the window could not be shown.
    pub fn show_select_overlay(&self, overlay_node: NodeRef) -> bool {
        let _scope = self.enter_child_scope();
        let Some(window) = self.window() else {
            return false;
        };
        self.resize_window();
        if let Err(err) = self.show_window(false) {
            tracing::warn!(subwindow_id = self.id, error = %err, "show select overlay failed");
        }
        if !self.is_showed() {
            tracing::warn!(subwindow_id = self.id, "select overlay window is not shown");
            return false;
        }
        let Some(pipeline) = self.child_pipeline() else {
            return false;
        };
        pipeline.mount_to_root(overlay_node);
        pipeline.mark_last_child_dirty();
        set_touchable(window.as_ref(), true);
        if let Err(err) = window.keep_keyboard_on_focus(true) {
            tracing::warn!(subwindow_id = self.id, error = %err, "keep keyboard on focus failed");
        }
        if let Err(err) = window.set_focusable(false) {
            tracing::warn!(subwindow_id = self.id, error = %err, "select overlay: set focusable failed");
        }
        true
    }
}

fn set_touchable(window: &dyn Window, touchable: bool) {
    if let Err(err) = window.set_touchable(touchable) {
        tracing::warn!(window_id = window.window_id(), touchable, error = %err, "set touchable failed");
    }
}
