//! Registry of live subwindows, keyed by the container that owns them.
//!
//! Every registry sits behind one `Mutex`. It is reached from the UI threads
//! of several containers and from the toast/dialog event loops, so the lock
//! is real rather than a convention. Subwindows are never called while the
//! lock is held.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::subwindow::Subwindow;

/// Role a subwindow was registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubwindowKind {
    /// Popups, menus and previews of a parent container.
    Main,
    /// Modal dialog hosted for a UI-extension parent.
    Dialog,
    /// Top-most toast window.
    Toast,
}

#[derive(Default)]
struct Registries {
    /// child container id -> parent container id
    parents: BTreeMap<i32, i32>,
    subwindows: BTreeMap<(i32, SubwindowKind), Arc<Subwindow>>,
    /// dialog node id -> parent container id, for dialog subwindows
    dialog_nodes: BTreeMap<i32, i32>,
    current: BTreeMap<i32, Arc<Subwindow>>,
    current_dialog: BTreeMap<i32, Arc<Subwindow>>,
}

pub struct SubwindowManager {
    registries: Mutex<Registries>,
    next_subwindow_id: AtomicI32,
    next_toast_dialog_id: AtomicI32,
    expand_display: AtomicBool,
}

impl Default for SubwindowManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SubwindowManager {
    pub fn new() -> Self {
        Self {
            registries: Mutex::new(Registries::default()),
            next_subwindow_id: AtomicI32::new(0),
            next_toast_dialog_id: AtomicI32::new(0),
            expand_display: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Registries> {
        self.registries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Process-unique id for a new subwindow.
    pub fn next_subwindow_id(&self) -> i32 {
        self.next_subwindow_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Process-unique suffix for a toast/dialog window name.
    pub fn next_toast_dialog_id(&self) -> i32 {
        self.next_toast_dialog_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn add_parent_container_id(&self, child_id: i32, parent_id: i32) {
        tracing::debug!(child_id, parent_id, "register child container");
        self.lock().parents.insert(child_id, parent_id);
    }

    pub fn parent_container_id(&self, child_id: i32) -> Option<i32> {
        self.lock().parents.get(&child_id).copied()
    }

    pub fn remove_parent_container_id(&self, child_id: i32) {
        self.lock().parents.remove(&child_id);
    }

    pub fn add_subwindow(&self, parent_id: i32, kind: SubwindowKind, subwindow: Arc<Subwindow>) {
        tracing::debug!(
            parent_id,
            ?kind,
            subwindow_id = subwindow.subwindow_id(),
            "add subwindow"
        );
        self.lock().subwindows.insert((parent_id, kind), subwindow);
    }

    /// Registers `subwindow` as the dialog subwindow hosting `node_id`.
    pub fn add_dialog_subwindow(&self, parent_id: i32, node_id: i32, subwindow: Arc<Subwindow>) {
        let mut registries = self.lock();
        registries.dialog_nodes.insert(node_id, parent_id);
        registries
            .subwindows
            .insert((parent_id, SubwindowKind::Dialog), subwindow);
    }

    pub fn dialog_node_parent(&self, node_id: i32) -> Option<i32> {
        self.lock().dialog_nodes.get(&node_id).copied()
    }

    /// Main subwindow of `parent_id`.
    pub fn subwindow(&self, parent_id: i32) -> Option<Arc<Subwindow>> {
        self.subwindow_of_kind(parent_id, SubwindowKind::Main)
    }

    pub fn subwindow_of_kind(&self, parent_id: i32, kind: SubwindowKind) -> Option<Arc<Subwindow>> {
        self.lock().subwindows.get(&(parent_id, kind)).cloned()
    }

    pub fn remove_subwindow(&self, parent_id: i32, kind: SubwindowKind) -> Option<Arc<Subwindow>> {
        self.lock().subwindows.remove(&(parent_id, kind))
    }

    /// Subwindow whose content lives in container `child_id`.
    pub fn subwindow_by_id(&self, child_id: i32) -> Option<Arc<Subwindow>> {
        let registries = self.lock();
        registries
            .subwindows
            .values()
            .chain(registries.current.values())
            .chain(registries.current_dialog.values())
            .find(|subwindow| subwindow.child_container_id() == child_id)
            .cloned()
    }

    pub fn set_current_subwindow(&self, subwindow: Arc<Subwindow>) {
        let parent_id = subwindow.parent_container_id();
        self.lock().current.insert(parent_id, subwindow);
    }

    /// Most recently shown subwindow of `parent_id`.
    pub fn current_window(&self, parent_id: i32) -> Option<Arc<Subwindow>> {
        self.lock().current.get(&parent_id).cloned()
    }

    pub fn set_current_dialog_subwindow(&self, subwindow: Arc<Subwindow>) {
        let parent_id = subwindow.parent_container_id();
        tracing::debug!(
            parent_id,
            subwindow_id = subwindow.subwindow_id(),
            "set current dialog subwindow"
        );
        self.lock().current_dialog.insert(parent_id, subwindow);
    }

    /// Subwindow serving toast/dialog requests of `parent_id` without a UI
    /// container.
    pub fn current_dialog_window(&self, parent_id: i32) -> Option<Arc<Subwindow>> {
        self.lock().current_dialog.get(&parent_id).cloned()
    }

    /// Child container id of the current dialog subwindow of `parent_id`.
    pub fn dialog_subwindow_instance_id(&self, parent_id: i32) -> Option<i32> {
        self.current_dialog_window(parent_id)
            .map(|subwindow| subwindow.child_container_id())
    }

    pub fn set_expand_display(&self, expand: bool) {
        self.expand_display.store(expand, Ordering::Relaxed);
    }

    pub fn is_expand_display(&self) -> bool {
        self.expand_display.load(Ordering::Relaxed)
    }

    /// Drops every entry owned by `parent_id` and closes the subwindows that
    /// are no longer referenced by any registry.
    pub fn on_container_destroyed(&self, parent_id: i32) {
        let removed: Vec<Arc<Subwindow>> = {
            let mut registries = self.lock();
            let mut removed = Vec::new();
            let keys: Vec<_> = registries
                .subwindows
                .keys()
                .filter(|(parent, _)| *parent == parent_id)
                .copied()
                .collect();
            for key in keys {
                if let Some(subwindow) = registries.subwindows.remove(&key) {
                    removed.push(subwindow);
                }
            }
            removed.extend(registries.current.remove(&parent_id));
            removed.extend(registries.current_dialog.remove(&parent_id));
            registries.dialog_nodes.retain(|_, parent| *parent != parent_id);
            let children: Vec<i32> = removed
                .iter()
                .map(|subwindow| subwindow.child_container_id())
                .collect();
            registries
                .parents
                .retain(|child, parent| *parent != parent_id && !children.contains(child));
            removed
        };
        let mut closed: Vec<i32> = Vec::new();
        for subwindow in removed {
            let id = subwindow.subwindow_id();
            if closed.contains(&id) {
                continue;
            }
            closed.push(id);
            if !subwindow.close() {
                tracing::debug!(subwindow_id = id, "subwindow had nothing to close");
            }
        }
        tracing::info!(parent_id, closed = closed.len(), "parent container destroyed");
    }
}
