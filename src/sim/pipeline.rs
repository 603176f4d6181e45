//! Pipeline, overlay manager and legacy stack sharing one root element.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::geometry::{OffsetF, SafeAreaInsets};
use crate::overlay::{
    ComponentRef, CustomDialogCallback, DialogProperties, DismissCallback, MenuParam, NodeBuilder,
    NodeRef, OverlayManager, PopupInfo, StackElement,
};
use crate::pipeline::{AccessibilityEvent, InheritedSettings, Pipeline, PipelineKind};
use crate::window::WindowRect;

use super::Recorder;

/// Children mounted on a pipeline root, shared with its overlay manager.
#[derive(Debug, Clone, Default)]
pub struct RootElement {
    children: Arc<Mutex<Vec<NodeRef>>>,
}

impl RootElement {
    fn lock(&self) -> MutexGuard<'_, Vec<NodeRef>> {
        self.children.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn children(&self) -> Vec<NodeRef> {
        self.lock().clone()
    }

    pub fn mount(&self, node: NodeRef) {
        self.lock().push(node);
    }

    pub fn unmount(&self, id: i32) -> bool {
        let mut children = self.lock();
        let before = children.len();
        children.retain(|node| node.id != id);
        children.len() != before
    }

    pub fn unmount_tag(&self, tag: &str) {
        self.lock().retain(|node| node.tag != tag);
    }
}

/// Node ids are shared per backend so nodes never collide across pipelines.
#[derive(Debug, Clone)]
pub struct NodeIds(Arc<AtomicI32>);

impl Default for NodeIds {
    fn default() -> Self {
        Self(Arc::new(AtomicI32::new(100)))
    }
}

impl NodeIds {
    pub fn next(&self) -> i32 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

#[derive(Default)]
struct OverlayState {
    popups: BTreeMap<i32, (PopupInfo, NodeRef)>,
    menus: BTreeMap<i32, NodeRef>,
    dialogs: Vec<NodeRef>,
    has_pixel_map: bool,
    drag_hide_finished: bool,
    sub_window_id: Option<i32>,
    modal_display_id: Option<u64>,
}

/// Overlay manager that mounts every shown overlay on the root element.
pub struct RecordingOverlayManager {
    target: String,
    recorder: Recorder,
    root: RootElement,
    ids: NodeIds,
    state: Mutex<OverlayState>,
}

pub const POPUP_TAG: &str = "Popup";
pub const MENU_TAG: &str = "Menu";
pub const DIALOG_TAG: &str = "Dialog";
pub const TOAST_TAG: &str = "Toast";

impl RecordingOverlayManager {
    pub fn new(container_id: i32, recorder: Recorder, root: RootElement, ids: NodeIds) -> Self {
        Self {
            target: format!("overlay:{container_id}"),
            recorder,
            root,
            ids,
            state: Mutex::new(OverlayState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, OverlayState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, op: impl Into<String>) {
        self.recorder.record(self.target.clone(), op);
    }

    pub fn set_has_pixel_map(&self, has: bool) {
        self.lock().has_pixel_map = has;
    }

    pub fn set_drag_hide_finished(&self, finished: bool) {
        self.lock().drag_hide_finished = finished;
    }

    pub fn sub_window_id(&self) -> Option<i32> {
        self.lock().sub_window_id
    }

    pub fn modal_display_id(&self) -> Option<u64> {
        self.lock().modal_display_id
    }

    /// Mounts a toast node, the way a frontend showing a toast would.
    pub fn mount_toast(&self) -> NodeRef {
        let node = NodeRef::new(self.ids.next(), TOAST_TAG);
        self.root.mount(node.clone());
        node
    }

    fn mount_dialog(&self) -> NodeRef {
        let node = NodeRef::new(self.ids.next(), DIALOG_TAG);
        self.root.mount(node.clone());
        self.lock().dialogs.push(node.clone());
        node
    }

    fn unmount_dialog(&self, id: i32) {
        self.root.unmount(id);
        self.lock().dialogs.retain(|node| node.id != id);
    }
}

impl OverlayManager for RecordingOverlayManager {
    fn show_popup(
        &self,
        target_id: i32,
        info: &PopupInfo,
        _on_will_dismiss: Option<DismissCallback>,
        interactive_dismiss: bool,
    ) {
        self.record(format!("show_popup {target_id} interactive={interactive_dismiss}"));
        let node = NodeRef::new(self.ids.next(), POPUP_TAG);
        self.root.mount(node.clone());
        let mut info = info.clone();
        info.target_id = target_id;
        info.is_current_on_show = true;
        self.lock().popups.insert(target_id, (info, node));
    }

    fn hide_popup(&self, target_id: i32, info: &PopupInfo) {
        self.record(format!("hide_popup {target_id} update={}", info.mark_need_update));
        if let Some((_, node)) = self.lock().popups.remove(&target_id) {
            self.root.unmount(node.id);
        }
    }

    fn popup_info(&self, target_id: i32) -> PopupInfo {
        self.lock()
            .popups
            .get(&target_id)
            .map(|(info, _)| info.clone())
            .unwrap_or_default()
    }

    fn show_tips(
        &self,
        target_id: i32,
        info: &PopupInfo,
        appearing_time: i32,
        _appearing_time_with_continuous_operation: i32,
        is_subwindow: bool,
    ) {
        self.record(format!("show_tips {target_id} appearing={appearing_time} sub={is_subwindow}"));
        let node = NodeRef::new(self.ids.next(), POPUP_TAG);
        self.root.mount(node.clone());
        self.lock().popups.insert(target_id, (info.clone(), node));
    }

    fn hide_tips(&self, target_id: i32, _info: &PopupInfo, disappearing_time: i32) {
        self.record(format!("hide_tips {target_id} disappearing={disappearing_time}"));
        if let Some((_, node)) = self.lock().popups.remove(&target_id) {
            self.root.unmount(node.id);
        }
    }

    fn clean_popup_in_sub_window(&self, force_clear: bool) {
        self.record(format!("clean_popup_in_sub_window force={force_clear}"));
        let popups = std::mem::take(&mut self.lock().popups);
        for (_, node) in popups.values() {
            self.root.unmount(node.id);
        }
    }

    fn build_menu(
        &self,
        content: NodeRef,
        target: &NodeRef,
        param: &MenuParam,
        preview: Option<NodeRef>,
    ) -> Option<NodeRef> {
        self.record(format!(
            "build_menu content={} target={} preview={}",
            content.id,
            target.id,
            preview.is_some()
        ));
        if param.title == "fail" {
            return None;
        }
        Some(NodeRef::new(self.ids.next(), crate::constants::MENU_WRAPPER_TAG))
    }

    fn show_menu_in_sub_window(&self, target_id: i32, offset: OffsetF, menu: NodeRef) {
        self.record(format!("show_menu_in_sub_window {target_id} at {},{}", offset.x, offset.y));
        self.root.mount(menu.clone());
        self.lock().menus.insert(target_id, menu);
    }

    fn hide_menu_in_sub_window(&self, show_preview_animation: bool, start_drag: bool) {
        self.record(format!(
            "hide_menu_in_sub_window animation={show_preview_animation} drag={start_drag}"
        ));
        let menus = std::mem::take(&mut self.lock().menus);
        for menu in menus.values() {
            self.root.unmount(menu.id);
        }
    }

    fn hide_menu_node_in_sub_window(&self, menu: &NodeRef, target_id: i32) {
        self.record(format!("hide_menu_node_in_sub_window {} {target_id}", menu.id));
        self.root.unmount(menu.id);
        self.lock().menus.retain(|_, node| node.id != menu.id);
    }

    fn clean_menu_in_sub_window(&self, target_id: i32) {
        self.record(format!("clean_menu_in_sub_window {target_id}"));
        let menus = std::mem::take(&mut self.lock().menus);
        for menu in menus.values() {
            self.root.unmount(menu.id);
        }
    }

    fn clean_menu_in_sub_window_with_animation(&self) {
        self.record("clean_menu_in_sub_window_with_animation");
        let menus = std::mem::take(&mut self.lock().menus);
        for menu in menus.values() {
            self.root.unmount(menu.id);
        }
    }

    fn menu_node(&self, target_id: i32) -> Option<NodeRef> {
        self.lock().menus.get(&target_id).cloned()
    }

    fn erase_menu_info(&self, target_id: i32) {
        self.record(format!("erase_menu_info {target_id}"));
        self.lock().menus.remove(&target_id);
    }

    fn has_pixel_map(&self) -> bool {
        self.lock().has_pixel_map
    }

    fn update_pixel_map_position(&self, just_update: bool) {
        self.record(format!("update_pixel_map_position {just_update}"));
    }

    fn menu_preview_center(&self) -> Option<OffsetF> {
        self.lock()
            .menus
            .values()
            .next()
            .map(|_| OffsetF::new(540.0, 1170.0))
    }

    fn is_context_menu_drag_hide_finished(&self) -> bool {
        self.lock().drag_hide_finished
    }

    fn update_context_menu_disappear_position(
        &self,
        offset: OffsetF,
        menu_scale: f32,
        is_redrag_start: bool,
        menu_wrapper_id: i32,
    ) {
        self.record(format!(
            "update_context_menu_disappear_position {},{} scale={menu_scale} redrag={is_redrag_start} wrapper={menu_wrapper_id}",
            offset.x, offset.y
        ));
    }

    fn context_menu_switch_drag_preview_animation(&self, preview: &NodeRef, offset: OffsetF) {
        self.record(format!(
            "context_menu_switch_drag_preview_animation {} {},{}",
            preview.id, offset.x, offset.y
        ));
    }

    fn show_dialog(&self, props: &DialogProperties, build: NodeBuilder) -> Option<NodeRef> {
        self.record(format!("show_dialog {}", props.title));
        build()?;
        Some(self.mount_dialog())
    }

    fn show_dialog_with_node(&self, props: &DialogProperties, node: NodeRef) -> Option<NodeRef> {
        self.record(format!("show_dialog_with_node {} content={}", props.title, node.id));
        Some(self.mount_dialog())
    }

    fn close_dialog(&self, dialog: &NodeRef) {
        self.record(format!("close_dialog {}", dialog.id));
        self.unmount_dialog(dialog.id);
    }

    fn open_custom_dialog(
        &self,
        props: &DialogProperties,
        callback: CustomDialogCallback,
    ) -> Option<NodeRef> {
        self.record(format!("open_custom_dialog {}", props.title));
        let node = self.mount_dialog();
        callback(node.id);
        Some(node)
    }

    fn close_custom_dialog(&self, dialog_id: i32) {
        self.record(format!("close_custom_dialog {dialog_id}"));
        self.unmount_dialog(dialog_id);
    }

    fn close_custom_dialog_by_node(&self, node: &NodeRef, callback: CustomDialogCallback) {
        self.record(format!("close_custom_dialog_by_node {}", node.id));
        self.unmount_dialog(node.id);
        callback(0);
    }

    fn update_custom_dialog(
        &self,
        node: &NodeRef,
        props: &DialogProperties,
        callback: CustomDialogCallback,
    ) {
        self.record(format!("update_custom_dialog {} {}", node.id, props.title));
        callback(0);
    }

    fn dialog_count(&self) -> usize {
        self.lock().dialogs.len()
    }

    fn set_sub_window_id(&self, sub_window_id: i32) {
        self.record(format!("set_sub_window_id {sub_window_id}"));
        self.lock().sub_window_id = Some(sub_window_id);
    }

    fn set_modal_dialog_display_id(&self, display_id: u64) {
        self.record(format!("set_modal_dialog_display_id {display_id}"));
        self.lock().modal_display_id = Some(display_id);
    }

    fn clear_toast(&self) {
        self.record("clear_toast");
        self.root.unmount_tag(TOAST_TAG);
    }

    fn remove_pixel_map(&self) {
        self.record("remove_pixel_map");
        self.lock().has_pixel_map = false;
    }

    fn remove_pixel_map_animation(&self, start_drag: bool, x: f64, y: f64, is_sub_window: bool) {
        self.record(format!(
            "remove_pixel_map_animation drag={start_drag} {x},{y} sub={is_sub_window}"
        ));
        self.lock().has_pixel_map = false;
    }

    fn remove_preview_badge_node(&self) {
        self.record("remove_preview_badge_node");
    }

    fn remove_gather_node(&self) {
        self.record("remove_gather_node");
    }

    fn remove_gather_node_with_animation(&self) {
        self.record("remove_gather_node_with_animation");
    }

    fn remove_event_column(&self) {
        self.record("remove_event_column");
    }

    fn remove_filter(&self) {
        self.record("remove_filter");
    }

    fn remove_filter_animation(&self) {
        self.record("remove_filter_animation");
    }
}

/// Legacy stack element backed by the root element.
pub struct RecordingStack {
    target: String,
    recorder: Recorder,
    components: Mutex<Vec<ComponentRef>>,
}

impl RecordingStack {
    pub fn new(container_id: i32, recorder: Recorder) -> Self {
        Self {
            target: format!("stack:{container_id}"),
            recorder,
            components: Mutex::new(Vec::new()),
        }
    }

    pub fn components(&self) -> Vec<ComponentRef> {
        self.components
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl StackElement for RecordingStack {
    fn push_component(&self, component: ComponentRef, disable_touch_event: bool) {
        self.recorder.record(
            self.target.clone(),
            format!("push_component {} disable_touch={disable_touch_event}", component.id),
        );
        self.components
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(component);
    }

    fn pop_popup(&self, id: &str) {
        self.recorder
            .record(self.target.clone(), format!("pop_popup {id}"));
        self.components
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|component| component.id != id);
    }

    fn pop_menu(&self) {
        self.recorder.record(self.target.clone(), "pop_menu");
        self.components
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|component| component.kind != crate::overlay::ComponentKind::SelectPopup);
    }

    fn close_context_menu(&self, menu: &ComponentRef) {
        self.recorder
            .record(self.target.clone(), format!("close_context_menu {}", menu.id));
    }
}

struct PipelineState {
    settings: InheritedSettings,
    use_cutout: bool,
    expand_display: bool,
    parent_pipeline: Option<i32>,
    root_default_has_focused: bool,
    focus_active: bool,
    accessibility: Vec<AccessibilityEvent>,
    system_safe_area: SafeAreaInsets,
    nav_safe_area: SafeAreaInsets,
    cutout_safe_area: SafeAreaInsets,
    display_window_rect: WindowRect,
    focus_window_id: u32,
}

/// Pipeline configuration of a simulated container.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSpec {
    pub kind: PipelineKind,
    pub window_id: u32,
    pub density: f64,
    pub display_window_rect: WindowRect,
}

pub struct MemoryPipeline {
    target: String,
    spec: PipelineSpec,
    recorder: Recorder,
    root: RootElement,
    overlay: Arc<RecordingOverlayManager>,
    stack: Option<Arc<RecordingStack>>,
    state: Mutex<PipelineState>,
}

impl MemoryPipeline {
    pub fn new(container_id: i32, spec: PipelineSpec, recorder: Recorder, ids: NodeIds) -> Self {
        let root = RootElement::default();
        let overlay = Arc::new(RecordingOverlayManager::new(
            container_id,
            recorder.clone(),
            root.clone(),
            ids,
        ));
        let stack = (spec.kind == PipelineKind::Legacy)
            .then(|| Arc::new(RecordingStack::new(container_id, recorder.clone())));
        let state = PipelineState {
            settings: InheritedSettings {
                min_platform_version: 12,
                api_target_version: 12,
                font_scale: 1.0,
                max_app_font_scale: 3.2,
                ..InheritedSettings::default()
            },
            use_cutout: false,
            expand_display: false,
            parent_pipeline: None,
            root_default_has_focused: true,
            focus_active: true,
            accessibility: Vec::new(),
            system_safe_area: SafeAreaInsets::default(),
            nav_safe_area: SafeAreaInsets::default(),
            cutout_safe_area: SafeAreaInsets::default(),
            display_window_rect: spec.display_window_rect,
            focus_window_id: spec.window_id,
        };
        Self {
            target: format!("pipeline:{container_id}"),
            spec,
            recorder,
            root,
            overlay,
            stack,
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PipelineState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, op: impl Into<String>) {
        self.recorder.record(self.target.clone(), op);
    }

    pub fn root(&self) -> &RootElement {
        &self.root
    }

    pub fn overlay(&self) -> &Arc<RecordingOverlayManager> {
        &self.overlay
    }

    pub fn stack(&self) -> Option<&Arc<RecordingStack>> {
        self.stack.as_ref()
    }

    pub fn settings(&self) -> InheritedSettings {
        self.lock().settings.clone()
    }

    pub fn parent_pipeline(&self) -> Option<i32> {
        self.lock().parent_pipeline
    }

    pub fn accessibility_events(&self) -> Vec<AccessibilityEvent> {
        self.lock().accessibility.clone()
    }

    pub fn system_safe_area(&self) -> SafeAreaInsets {
        self.lock().system_safe_area
    }

    pub fn cutout_safe_area(&self) -> SafeAreaInsets {
        self.lock().cutout_safe_area
    }

    pub fn focus_active(&self) -> bool {
        self.lock().focus_active
    }

    pub fn set_expand_display(&self, expand: bool) {
        self.lock().expand_display = expand;
    }

    pub fn set_focus_window_id(&self, window_id: u32) {
        self.lock().focus_window_id = window_id;
    }

    pub fn set_settings(&self, settings: InheritedSettings) {
        self.lock().settings = settings;
    }
}

impl Pipeline for MemoryPipeline {
    fn kind(&self) -> PipelineKind {
        self.spec.kind
    }

    fn window_id(&self) -> u32 {
        self.spec.window_id
    }

    fn density(&self) -> f64 {
        self.spec.density
    }

    fn overlay_manager(&self) -> Option<Arc<dyn OverlayManager>> {
        match self.spec.kind {
            PipelineKind::NextGen => Some(Arc::clone(&self.overlay) as Arc<dyn OverlayManager>),
            PipelineKind::Legacy => None,
        }
    }

    fn root_children(&self) -> Vec<NodeRef> {
        self.root.children()
    }

    fn mount_to_root(&self, node: NodeRef) {
        self.record(format!("mount_to_root {} {}", node.id, node.tag));
        self.root.mount(node);
    }

    fn mark_last_child_dirty(&self) -> bool {
        self.record("mark_last_child_dirty");
        !self.root.children().is_empty()
    }

    fn last_stack(&self) -> Option<Arc<dyn StackElement>> {
        self.stack
            .as_ref()
            .map(|stack| Arc::clone(stack) as Arc<dyn StackElement>)
    }

    fn set_parent_pipeline(&self, parent_container_id: i32) {
        self.record(format!("set_parent_pipeline {parent_container_id}"));
        self.lock().parent_pipeline = Some(parent_container_id);
    }

    fn setup_sub_root_element(&self) {
        self.record("setup_sub_root_element");
    }

    fn inherited_settings(&self) -> InheritedSettings {
        self.lock().settings.clone()
    }

    fn apply_inherited_settings(&self, settings: &InheritedSettings) {
        self.record("apply_inherited_settings");
        self.lock().settings = settings.clone();
    }

    fn set_min_platform_version(&self, version: i32) {
        self.lock().settings.min_platform_version = version;
    }

    fn set_api_target_version(&self, version: i32) {
        self.lock().settings.api_target_version = version;
    }

    fn set_follow_system(&self, follow: bool) {
        self.record(format!("set_follow_system {follow}"));
        self.lock().settings.follow_system = follow;
    }

    fn set_max_app_font_scale(&self, scale: f32) {
        self.record(format!("set_max_app_font_scale {scale}"));
        self.lock().settings.max_app_font_scale = scale;
    }

    fn set_font_scale(&self, scale: f32) {
        self.record(format!("set_font_scale {scale}"));
        self.lock().settings.font_scale = scale;
    }

    fn use_cutout(&self) -> bool {
        self.lock().use_cutout
    }

    fn set_use_cutout(&self, use_cutout: bool) {
        self.lock().use_cutout = use_cutout;
    }

    fn flush_pipeline_immediately(&self) {
        self.record("flush_pipeline_immediately");
    }

    fn set_root_default_has_focused(&self, focused: bool) {
        self.lock().root_default_has_focused = focused;
    }

    fn set_is_focus_active(&self, active: bool) {
        self.lock().focus_active = active;
    }

    fn focus_window_id(&self) -> u32 {
        self.lock().focus_window_id
    }

    fn container_modal_unfocus(&self) {
        self.record("container_modal_unfocus");
    }

    fn send_accessibility_event(&self, event: AccessibilityEvent) {
        self.record(format!("accessibility {:?} {}", event.change, event.window_id));
        self.lock().accessibility.push(event);
    }

    fn update_system_safe_area(&self, insets: SafeAreaInsets) {
        self.lock().system_safe_area = insets;
    }

    fn update_nav_safe_area(&self, insets: SafeAreaInsets) {
        self.lock().nav_safe_area = insets;
    }

    fn update_cutout_safe_area(&self, insets: SafeAreaInsets) {
        self.lock().cutout_safe_area = insets;
    }

    fn safe_area_without_process(&self) -> SafeAreaInsets {
        self.lock().system_safe_area
    }

    fn expand_display(&self) -> bool {
        self.lock().expand_display
    }

    fn display_window_rect(&self) -> WindowRect {
        self.lock().display_window_rect
    }
}
