//! Free multi-window mode notifications and follow-parent-window layout.

use std::sync::{Arc, Weak};

use crate::container::{ContainerRegistry, ContainerScope};
use crate::executor::{TaskPriority, TaskType};
use crate::manager::SubwindowManager;
use crate::window::{FreeMultiWindowListener, Window};

use super::Subwindow;

/// Called with the new free multi-window state.
pub type FreeMultiWindowCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Registered with the window service for one child container.
///
/// Holds the registry and manager weakly; the window service may outlive
/// both.
pub(crate) struct SwitchFreeMultiWindowListener {
    instance_id: i32,
    containers: Weak<dyn ContainerRegistry>,
    manager: Weak<SubwindowManager>,
}

impl FreeMultiWindowListener for SwitchFreeMultiWindowListener {
    fn on_switch_free_multi_window(&self, enable: bool) {
        tracing::info!(instance_id = self.instance_id, enable, "free multi window switched");
        let Some(containers) = self.containers.upgrade() else {
            return;
        };
        let Some(container) = containers.container(self.instance_id) else {
            tracing::warn!(instance_id = self.instance_id, "free multi window: container is null");
            return;
        };
        let Some(manager) = self.manager.upgrade() else {
            return;
        };
        let Some(subwindow) = manager.subwindow_by_id(self.instance_id) else {
            tracing::warn!(instance_id = self.instance_id, "free multi window: subwindow is null");
            return;
        };
        let Some(executor) = container.task_executor() else {
            return;
        };
        let _scope = ContainerScope::new(self.instance_id);
        executor.post_task(
            Box::new(move || {
                subwindow.on_free_multi_window_switch(enable);
                subwindow.switch_follow_parent_window_layout(enable);
            }),
            TaskType::Ui,
            "ArkUIFreeMultiWindowSwitch",
            TaskPriority::High,
        );
    }
}

impl Subwindow {
    pub(super) fn register_free_multi_window_listener(&self, window: &dyn Window, child_id: i32) {
        let listener: Arc<dyn FreeMultiWindowListener> = Arc::new(SwitchFreeMultiWindowListener {
            instance_id: child_id,
            containers: Arc::downgrade(&self.platform.containers),
            manager: Arc::downgrade(&self.platform.manager),
        });
        if let Err(err) = window.register_free_multi_window_listener(Arc::clone(&listener)) {
            tracing::warn!(subwindow_id = self.id, error = %err, "register free multi window listener failed");
            return;
        }
        self.state().free_multi_window_listener = Some(listener);
    }

    /// Whether the parent window floats in free multi-window mode.
    pub fn is_free_multi_window(&self) -> bool {
        let parent_window = self.state().parent_window.clone();
        match parent_window {
            Some(window) => window.is_free_multi_window_enabled(),
            None => {
                tracing::warn!(subwindow_id = self.id, "free multi window: parent window is null");
                false
            }
        }
    }

    /// Fans `enable` out to every registered callback.
    pub fn on_free_multi_window_switch(&self, enable: bool) {
        let callbacks: Vec<FreeMultiWindowCallback> = self
            .state()
            .free_multi_window_callbacks
            .values()
            .cloned()
            .collect();
        for callback in callbacks {
            callback(enable);
        }
    }

    /// Returns the id to unregister with. Ids start at 1.
    pub fn register_free_multi_window_switch_callback(&self, callback: FreeMultiWindowCallback) -> i32 {
        let mut state = self.state();
        state.last_callback_id += 1;
        let id = state.last_callback_id;
        state.free_multi_window_callbacks.insert(id, callback);
        id
    }

    pub fn unregister_free_multi_window_switch_callback(&self, callback_id: i32) {
        self.state().free_multi_window_callbacks.remove(&callback_id);
    }

    pub fn set_follow_parent_window_layout_enabled(&self, enable: bool) {
        let Some(window) = self.window() else {
            return;
        };
        if let Err(err) = window.set_follow_parent_window_layout_enabled(enable) {
            tracing::warn!(subwindow_id = self.id, enable, error = %err, "follow parent layout failed");
        }
    }

    /// Follows the parent window's layout while tracked nodes need it and
    /// the window is not floating freely; otherwise spans the display.
    pub fn switch_follow_parent_window_layout(&self, free_multi_window_enable: bool) {
        let need_follow = !self.state().follow_parent_layout_nodes.is_empty();
        let expand = self.platform.manager.is_expand_display();
        tracing::info!(
            subwindow_id = self.id,
            need_follow,
            expand,
            free_multi_window_enable,
            "switch follow parent window layout"
        );
        if need_follow && !expand && !free_multi_window_enable {
            self.set_follow_parent_window_layout_enabled(true);
        } else {
            self.set_follow_parent_window_layout_enabled(false);
            self.resize_window();
        }
    }

    pub fn add_follow_parent_window_layout_node(&self, node_id: i32) {
        let first = {
            let mut state = self.state();
            if state.follow_parent_layout_nodes.contains(&node_id) {
                return;
            }
            state.follow_parent_layout_nodes.push(node_id);
            state.follow_parent_layout_nodes.len() == 1
        };
        if first {
            self.switch_follow_parent_window_layout(self.is_free_multi_window());
        }
    }

    pub fn remove_follow_parent_window_layout_node(&self, node_id: i32) {
        let emptied = {
            let mut state = self.state();
            let before = state.follow_parent_layout_nodes.len();
            state.follow_parent_layout_nodes.retain(|id| *id != node_id);
            before > 0 && state.follow_parent_layout_nodes.is_empty()
        };
        if emptied {
            self.switch_follow_parent_window_layout(self.is_free_multi_window());
        }
    }
}
