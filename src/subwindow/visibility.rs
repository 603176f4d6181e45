use std::sync::atomic::Ordering;

use crate::constants::{DEFAULT_DISPLAY_ID, KEYBOARD_TAG};
use crate::error::{WmError, WmResult};
use crate::geometry::{Rect, RectF};
use crate::overlay::NodeRef;
use crate::pipeline::{AccessibilityEvent, PipelineKind, WindowChange};

use super::Subwindow;
use super::hot_area::MIN_WINDOW_HOT_AREA;

/// What a [`Subwindow::hide_window`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideOutcome {
    Hidden,
    /// Overlay content is still mounted; the window stays visible.
    Refused,
    /// Nothing to hide: no window or no child container.
    Skipped,
    Failed(WmError),
}

impl HideOutcome {
    pub fn is_hidden(self) -> bool {
        self == HideOutcome::Hidden
    }
}

/// Whether the mounted root children still need the window on screen. The
/// soft keyboard alone does not.
pub(crate) fn keeps_window_visible(children: &[NodeRef]) -> bool {
    match children {
        [] => false,
        [only] => only.tag != KEYBOARD_TAG,
        _ => true,
    }
}

impl Subwindow {
    /// Shows the window; a no-op apart from focus handling if it is already
    /// shown.
    pub fn show_window(&self, need_focus: bool) -> WmResult {
        let Some(window) = self.window() else {
            tracing::error!(subwindow_id = self.id, "show window: window is null");
            return Err(WmError::InvalidWindow);
        };
        self.check_ui_thread("show_window");
        if self.is_showed() {
            tracing::info!(subwindow_id = self.id, "subwindow is already shown");
            if need_focus {
                if let Err(err) = window.set_focusable(true) {
                    tracing::warn!(subwindow_id = self.id, error = %err, "set focusable failed");
                }
                self.request_focus();
            }
            return Ok(());
        }

        if let Err(err) = window.set_touch_hot_areas(&[super::rect_converter(&MIN_WINDOW_HOT_AREA)]) {
            tracing::warn!(subwindow_id = self.id, error = %err, "set default hot area failed");
        }
        window.set_need_default_animation(false);
        if let Err(err) = window.set_focusable(need_focus) {
            tracing::error!(subwindow_id = self.id, error = %err, "set focusable failed");
        }
        if let Err(err) = window.show(false, need_focus) {
            tracing::error!(
                subwindow_id = self.id,
                code = err.code(),
                "show subwindow failed"
            );
            return Err(err);
        }
        if need_focus {
            self.request_focus();
        }
        self.initialize_safe_area();

        match self.child_pipeline() {
            Some(pipeline) => pipeline.send_accessibility_event(AccessibilityEvent {
                window_id: window.window_id(),
                change: WindowChange::Added,
            }),
            None => tracing::warn!(subwindow_id = self.id, "show window: child container is null"),
        }

        let need_set_current = {
            let mut state = self.state();
            state.is_showed = true;
            state.need_set_current_window
        };
        if need_set_current {
            if let Some(this) = self.arc() {
                self.platform.manager.set_current_subwindow(this);
            }
        }
        tracing::info!(subwindow_id = self.id, window_id = window.window_id(), "subwindow shown");
        Ok(())
    }

    /// Hides the window unless overlay content other than the soft keyboard
    /// is still mounted on the child root.
    pub fn hide_window(&self) -> HideOutcome {
        let Some(window) = self.window() else {
            tracing::error!(subwindow_id = self.id, "hide window: window is null");
            return HideOutcome::Skipped;
        };
        self.check_ui_thread("hide_window");
        let Some(container) = self.child_container() else {
            tracing::error!(subwindow_id = self.id, "hide window: child container is null");
            return HideOutcome::Skipped;
        };
        let Some(pipeline) = container.pipeline() else {
            return HideOutcome::Skipped;
        };

        match pipeline.kind() {
            PipelineKind::NextGen => {
                let children = pipeline.root_children();
                if keeps_window_visible(&children) {
                    let last = children.last();
                    tracing::warn!(
                        subwindow_id = self.id,
                        last_child = last.map(|node| node.tag.as_str()),
                        "subwindow still has overlay content, keep it shown"
                    );
                    let rects = last.and_then(|node| self.state().hot_areas.get(&node.id).cloned());
                    if let Some(rects) = rects {
                        if let Err(err) = window.set_touch_hot_areas(&rects) {
                            tracing::warn!(subwindow_id = self.id, error = %err, "restore hot areas failed");
                        }
                    }
                    return HideOutcome::Refused;
                }
                pipeline.set_root_default_has_focused(false);
                pipeline.set_is_focus_active(false);
            }
            PipelineKind::Legacy => pipeline.set_root_default_has_focused(false),
        }

        if !window.is_focused() {
            self.container_modal_unfocus();
        }

        let hidden = window.hide();
        match self.parent_container() {
            Some(parent) if parent.is_scene_board_window() => {
                if let Err(err) = window.set_touchable(true) {
                    tracing::warn!(subwindow_id = self.id, error = %err, "set touchable failed");
                }
            }
            Some(_) => {}
            None => tracing::error!(subwindow_id = self.id, "hide window: parent container is null"),
        }
        if let Err(err) = hidden {
            tracing::error!(subwindow_id = self.id, code = err.code(), "hide subwindow failed");
            return HideOutcome::Failed(err);
        }

        self.state().is_showed = false;
        pipeline.send_accessibility_event(AccessibilityEvent {
            window_id: window.window_id(),
            change: WindowChange::Removed,
        });
        tracing::info!(subwindow_id = self.id, window_id = window.window_id(), "subwindow hidden");
        HideOutcome::Hidden
    }

    /// Drops the modal focus decoration of the parent window if it is
    /// focusable but lost focus to this subwindow.
    pub(crate) fn container_modal_unfocus(&self) {
        let Some(parent) = self.parent_container() else {
            return;
        };
        let Some(parent_window) = self.platform.windows.find(&parent.window_name()) else {
            return;
        };
        if parent_window.focusable() && !parent_window.is_focused() {
            if let Some(pipeline) = parent.pipeline() {
                pipeline.container_modal_unfocus();
            }
        }
    }

    pub fn request_focus(&self) {
        let Some(window) = self.window() else {
            return;
        };
        if window.is_focused() {
            tracing::info!(subwindow_id = self.id, "subwindow is already focused");
            return;
        }
        if let Err(err) = window.request_focus() {
            tracing::warn!(subwindow_id = self.id, error = %err, "request focus failed");
        }
    }

    pub fn is_focused(&self) -> bool {
        self.window().is_some_and(|window| window.is_focused())
    }

    /// Unregisters listeners and destroys the window. Returns `false` when
    /// there is nothing to close, a close is already running, or the window
    /// service refused.
    pub fn close(&self) -> bool {
        let Some(window) = self.window() else {
            return false;
        };
        if self
            .closing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::info!(subwindow_id = self.id, "subwindow is already closing");
            return false;
        }
        let listener = self.state().free_multi_window_listener.take();
        if listener.is_some() {
            if let Err(err) = window.unregister_free_multi_window_listener() {
                tracing::warn!(subwindow_id = self.id, error = %err, "unregister listener failed");
            }
        }
        let destroyed = window.destroy();
        self.closing.store(false, Ordering::Release);
        if let Err(err) = destroyed {
            tracing::error!(subwindow_id = self.id, error = %err, "destroy subwindow failed");
            return false;
        }
        if let Some(container) = self.child_container() {
            container.set_ui_window(None);
        }
        self.state().is_showed = false;
        tracing::info!(subwindow_id = self.id, "subwindow closed");
        true
    }

    pub fn destroy_window(&self) {
        let Some(window) = self.window() else {
            return;
        };
        if let Err(err) = window.destroy() {
            tracing::error!(subwindow_id = self.id, error = %err, "destroy window failed");
        }
    }

    pub fn is_toast_sub_window(&self) -> bool {
        self.window()
            .is_some_and(|window| window.window_type().is_toast())
    }

    /// Display the window is on, or the default display when there is no
    /// window.
    pub fn display_id(&self) -> u64 {
        self.window()
            .map_or(DEFAULT_DISPLAY_ID, |window| window.display_id())
    }

    /// Whether the window shares a display with the parent container.
    /// `use_initialized_id` compares the display recorded at creation
    /// instead of the live one.
    pub fn is_same_display_with_parent_window(&self, use_initialized_id: bool) -> bool {
        let Some(parent) = self.parent_container() else {
            return false;
        };
        let own = if use_initialized_id {
            self.state().default_display_id
        } else {
            self.display_id()
        };
        own == parent.current_display_id()
    }

    /// Whether a UI-extension parent's host window has a usable rect.
    pub fn check_host_window_status(&self) -> bool {
        let Some(parent) = self.parent_container() else {
            return false;
        };
        if !parent.is_ui_extension_window() {
            return true;
        }
        let rect = self.ui_extension_host_window_rect();
        if !rect.is_valid() {
            tracing::warn!(
                parent_id = self.parent_container_id,
                "ui extension host window is not ready, check window permissions"
            );
            return false;
        }
        true
    }

    /// Available area of an expanded fold display.
    pub fn fold_expand_available_rect(&self) -> Rect {
        let display_id = self.display_id();
        match self.platform.displays.expand_available_area(display_id) {
            Ok(rect) => Rect::from(rect),
            Err(err) => {
                tracing::warn!(display_id, error = %err, "no expand available area");
                Rect::default()
            }
        }
    }

    pub fn parent_window_rect(&self) -> Rect {
        self.state()
            .parent_window
            .as_ref()
            .map(|window| Rect::from(window.rect()))
            .unwrap_or_default()
    }

    /// Rect of the host window embedding a UI-extension parent.
    pub fn ui_extension_host_window_rect(&self) -> Rect {
        let (parent_window, host_id) = {
            let state = self.state();
            (state.parent_window.clone(), state.ui_extension_host_window_id)
        };
        let Some(parent_window) = parent_window else {
            return Rect::default();
        };
        let host_id = match host_id {
            Some(id) => id,
            None => match self.parent_container().and_then(|parent| parent.pipeline()) {
                Some(pipeline) => pipeline.focus_window_id(),
                None => return Rect::default(),
            },
        };
        Rect::from(parent_window.host_window_rect(host_id))
    }

    pub fn window_rect(&self) -> RectF {
        self.window()
            .map(|window| RectF::from(window.rect()))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_alone_does_not_keep_window() {
        assert!(!keeps_window_visible(&[]));
        assert!(!keeps_window_visible(&[NodeRef::new(3, KEYBOARD_TAG)]));
        assert!(keeps_window_visible(&[NodeRef::new(3, "Popup")]));
        assert!(keeps_window_visible(&[
            NodeRef::new(3, KEYBOARD_TAG),
            NodeRef::new(4, KEYBOARD_TAG)
        ]));
    }
}
