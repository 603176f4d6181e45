//! Overlay manager bridge.
//!
//! The overlay manager lives inside a pipeline and stacks popups, menus,
//! dialogs, toasts and drag previews above the page. The coordinator never
//! builds that content itself; it sizes and shows the window around these
//! calls and cleans up the transient visuals afterwards.

use crate::geometry::OffsetF;

/// Handle to a node in a pipeline's tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub id: i32,
    pub tag: String,
}

impl NodeRef {
    pub fn new(id: i32, tag: impl Into<String>) -> Self {
        Self {
            id,
            tag: tag.into(),
        }
    }
}

pub type DismissCallback = Box<dyn FnMut(i32) + Send>;
pub type NodeBuilder = Box<dyn FnOnce() -> Option<NodeRef> + Send>;
/// Receives the dialog result as `(callback type, button index)`.
pub type DialogCallback = Box<dyn FnMut(i32, i32) + Send>;
pub type CustomDialogCallback = Box<dyn FnOnce(i32) + Send>;
/// Receives the toast id assigned by the frontend.
pub type ToastCallback = Box<dyn FnOnce(i32) + Send>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PopupInfo {
    pub target_id: i32,
    pub focusable: bool,
    pub is_avoid_keyboard: bool,
    pub mark_need_update: bool,
    pub is_current_on_show: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuPreviewMode {
    #[default]
    None,
    Image,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MenuParam {
    pub title: String,
    pub preview_mode: MenuPreviewMode,
    pub is_show_in_sub_window: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DialogProperties {
    pub title: String,
    pub content: String,
    pub focusable: bool,
    pub is_modal: bool,
    pub auto_cancel: bool,
}

impl Default for DialogProperties {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            focusable: true,
            is_modal: true,
            auto_cancel: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastShowMode {
    #[default]
    Default,
    TopMost,
    SystemTopMost,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToastInfo {
    pub message: String,
    pub duration_ms: u32,
    pub show_mode: ToastShowMode,
}

impl ToastInfo {
    pub fn is_top_most(&self) -> bool {
        matches!(
            self.show_mode,
            ToastShowMode::TopMost | ToastShowMode::SystemTopMost
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ButtonInfo {
    pub text: String,
    pub text_color: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PromptDialogAttr {
    pub title: String,
    pub message: String,
    pub auto_cancel: bool,
    pub show_in_sub_window: bool,
    pub is_modal: bool,
}

pub trait OverlayManager: Send + Sync {
    // popups and tips
    fn show_popup(
        &self,
        target_id: i32,
        info: &PopupInfo,
        on_will_dismiss: Option<DismissCallback>,
        interactive_dismiss: bool,
    );
    fn hide_popup(&self, target_id: i32, info: &PopupInfo);
    fn popup_info(&self, target_id: i32) -> PopupInfo;
    fn show_tips(
        &self,
        target_id: i32,
        info: &PopupInfo,
        appearing_time: i32,
        appearing_time_with_continuous_operation: i32,
        is_subwindow: bool,
    );
    fn hide_tips(&self, target_id: i32, info: &PopupInfo, disappearing_time: i32);
    fn clean_popup_in_sub_window(&self, force_clear: bool);

    // menus
    /// Wraps `content` into a menu wrapper node for `target`.
    fn build_menu(
        &self,
        content: NodeRef,
        target: &NodeRef,
        param: &MenuParam,
        preview: Option<NodeRef>,
    ) -> Option<NodeRef>;
    fn show_menu_in_sub_window(&self, target_id: i32, offset: OffsetF, menu: NodeRef);
    fn hide_menu_in_sub_window(&self, show_preview_animation: bool, start_drag: bool);
    fn hide_menu_node_in_sub_window(&self, menu: &NodeRef, target_id: i32);
    fn clean_menu_in_sub_window(&self, target_id: i32);
    fn clean_menu_in_sub_window_with_animation(&self);
    fn menu_node(&self, target_id: i32) -> Option<NodeRef>;
    fn erase_menu_info(&self, target_id: i32);
    fn has_pixel_map(&self) -> bool;
    fn update_pixel_map_position(&self, just_update: bool);
    fn menu_preview_center(&self) -> Option<OffsetF>;
    fn is_context_menu_drag_hide_finished(&self) -> bool;
    fn update_context_menu_disappear_position(
        &self,
        offset: OffsetF,
        menu_scale: f32,
        is_redrag_start: bool,
        menu_wrapper_id: i32,
    );
    fn context_menu_switch_drag_preview_animation(&self, preview: &NodeRef, offset: OffsetF);

    // dialogs
    fn show_dialog(&self, props: &DialogProperties, build: NodeBuilder) -> Option<NodeRef>;
    fn show_dialog_with_node(&self, props: &DialogProperties, node: NodeRef) -> Option<NodeRef>;
    fn close_dialog(&self, dialog: &NodeRef);
    fn open_custom_dialog(
        &self,
        props: &DialogProperties,
        callback: CustomDialogCallback,
    ) -> Option<NodeRef>;
    fn close_custom_dialog(&self, dialog_id: i32);
    fn close_custom_dialog_by_node(&self, node: &NodeRef, callback: CustomDialogCallback);
    fn update_custom_dialog(
        &self,
        node: &NodeRef,
        props: &DialogProperties,
        callback: CustomDialogCallback,
    );
    /// Number of dialogs currently stacked.
    fn dialog_count(&self) -> usize;
    fn set_sub_window_id(&self, sub_window_id: i32);
    fn set_modal_dialog_display_id(&self, display_id: u64);

    fn clear_toast(&self);

    // transient visuals
    fn remove_pixel_map(&self);
    fn remove_pixel_map_animation(&self, start_drag: bool, x: f64, y: f64, is_sub_window: bool);
    fn remove_preview_badge_node(&self);
    fn remove_gather_node(&self);
    fn remove_gather_node_with_animation(&self);
    fn remove_event_column(&self);
    fn remove_filter(&self);
    fn remove_filter_animation(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Popup,
    SelectPopup,
    Other,
}

/// Component pushed onto the legacy pipeline's stack element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRef {
    pub id: String,
    pub kind: ComponentKind,
}

impl ComponentRef {
    pub fn new(id: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

/// Top stack of a legacy pipeline.
pub trait StackElement: Send + Sync {
    fn push_component(&self, component: ComponentRef, disable_touch_event: bool);
    fn pop_popup(&self, id: &str);
    fn pop_menu(&self);
    fn close_context_menu(&self, menu: &ComponentRef);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_most_modes() {
        let mut info = ToastInfo::default();
        assert!(!info.is_top_most());
        info.show_mode = ToastShowMode::SystemTopMost;
        assert!(info.is_top_most());
    }

    #[test]
    fn dialog_defaults_are_modal_and_focusable() {
        let props = DialogProperties::default();
        assert!(props.focusable);
        assert!(props.is_modal);
    }
}
