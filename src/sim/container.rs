//! Containers, container registry and frontend.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::constants::MIN_SUBCONTAINER_ID;
use crate::container::{
    Container, ContainerRegistry, ContainerResources, SubContainerConfig, SubContainerKind,
    ViewConfig,
};
use crate::executor::TaskExecutor;
use crate::frontend::{DialogRequest, Frontend};
use crate::geometry::{InsetBand, RectF, SafeAreaInsets};
use crate::overlay::{
    ButtonInfo, CustomDialogCallback, DialogCallback, PromptDialogAttr, ToastCallback, ToastInfo,
};
use crate::pipeline::{Pipeline, PipelineKind};
use crate::window::{AvoidAreaType, FoldStatus, Window, WindowRect};

use super::executor::InlineExecutor;
use super::pipeline::{MemoryPipeline, NodeIds, PipelineSpec};
use super::window::MemoryWindowService;
use super::Recorder;

/// Frontend that records every request and answers toasts with an id.
pub struct RecordingFrontend {
    target: String,
    recorder: Recorder,
    next_toast_id: AtomicI32,
    toasts: Mutex<Vec<ToastInfo>>,
    dialogs: Mutex<Vec<String>>,
}

impl RecordingFrontend {
    pub fn new(container_id: i32, recorder: Recorder) -> Self {
        Self {
            target: format!("frontend:{container_id}"),
            recorder,
            next_toast_id: AtomicI32::new(1),
            toasts: Mutex::new(Vec::new()),
            dialogs: Mutex::new(Vec::new()),
        }
    }

    pub fn toasts(&self) -> Vec<ToastInfo> {
        self.toasts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Titles of every dialog and action menu shown, in order.
    pub fn dialogs(&self) -> Vec<String> {
        self.dialogs.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn push_dialog(&self, title: String) {
        self.dialogs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(title);
    }
}

impl Frontend for RecordingFrontend {
    fn show_toast(&self, info: ToastInfo, callback: ToastCallback) {
        self.recorder
            .record(self.target.clone(), format!("show_toast {}", info.message));
        self.toasts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(info);
        callback(self.next_toast_id.fetch_add(1, Ordering::Relaxed));
    }

    fn close_toast(&self, toast_id: i32, callback: ToastCallback) {
        self.recorder
            .record(self.target.clone(), format!("close_toast {toast_id}"));
        callback(toast_id);
    }

    fn show_dialog(&self, request: DialogRequest, mut callback: DialogCallback) {
        self.recorder
            .record(self.target.clone(), format!("show_dialog {}", request.title));
        self.push_dialog(request.title);
        callback(0, 0);
    }

    fn show_dialog_with_attr(
        &self,
        attr: PromptDialogAttr,
        buttons: Vec<ButtonInfo>,
        mut callback: DialogCallback,
        _callbacks: BTreeSet<String>,
    ) {
        self.recorder.record(
            self.target.clone(),
            format!("show_dialog_with_attr {} buttons={}", attr.title, buttons.len()),
        );
        self.push_dialog(attr.title);
        callback(0, 0);
    }

    fn show_action_menu(&self, title: String, buttons: Vec<ButtonInfo>, mut callback: DialogCallback) {
        self.recorder.record(
            self.target.clone(),
            format!("show_action_menu {title} buttons={}", buttons.len()),
        );
        self.push_dialog(title);
        callback(0, 0);
    }

    fn open_custom_dialog(&self, attr: PromptDialogAttr, callback: CustomDialogCallback) {
        self.recorder
            .record(self.target.clone(), format!("open_custom_dialog {}", attr.title));
        self.push_dialog(attr.title);
        callback(0);
    }
}

/// Flags of a simulated container.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerFlags {
    pub scene_board_window: bool,
    pub scene_board_enabled: bool,
    pub ui_extension: bool,
    pub free_multi_window: bool,
    pub cross_axis: bool,
    pub fold_status: FoldStatus,
    pub api_target_version: i32,
    pub display_id: u64,
    /// Insets reported for every avoid-area type.
    pub safe_area: SafeAreaInsets,
}

impl Default for ContainerFlags {
    fn default() -> Self {
        Self {
            scene_board_window: false,
            scene_board_enabled: false,
            ui_extension: false,
            free_multi_window: false,
            cross_axis: false,
            fold_status: FoldStatus::Unknown,
            api_target_version: 12,
            display_id: 0,
            safe_area: SafeAreaInsets {
                top: InsetBand { start: 0, end: 120 },
                ..SafeAreaInsets::default()
            },
        }
    }
}

pub struct MemoryContainer {
    id: i32,
    target: String,
    recorder: Recorder,
    window_id: u32,
    window_name: String,
    pipeline: Arc<MemoryPipeline>,
    executor: Arc<dyn TaskExecutor>,
    frontend: Arc<RecordingFrontend>,
    ui_window: Mutex<Option<Arc<dyn Window>>>,
    flags: Mutex<ContainerFlags>,
    view: Mutex<Option<ViewConfig>>,
    sub_config: Mutex<Option<SubContainerConfig>>,
    closed: Mutex<bool>,
}

impl MemoryContainer {
    pub fn new(
        id: i32,
        window: Arc<dyn Window>,
        pipeline: Arc<MemoryPipeline>,
        executor: Arc<dyn TaskExecutor>,
        recorder: Recorder,
    ) -> Self {
        Self {
            id,
            target: format!("container:{id}"),
            frontend: Arc::new(RecordingFrontend::new(id, recorder.clone())),
            recorder,
            window_id: window.window_id(),
            window_name: window.window_name(),
            pipeline,
            executor,
            ui_window: Mutex::new(Some(window)),
            flags: Mutex::new(ContainerFlags::default()),
            view: Mutex::new(None),
            sub_config: Mutex::new(None),
            closed: Mutex::new(false),
        }
    }

    fn record(&self, op: impl Into<String>) {
        self.recorder.record(self.target.clone(), op);
    }

    fn flags(&self) -> MutexGuard<'_, ContainerFlags> {
        self.flags.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn update_flags(&self, update: impl FnOnce(&mut ContainerFlags)) {
        update(&mut self.flags());
    }

    pub fn memory_pipeline(&self) -> &Arc<MemoryPipeline> {
        &self.pipeline
    }

    pub fn recording_frontend(&self) -> &Arc<RecordingFrontend> {
        &self.frontend
    }

    pub fn sub_config(&self) -> Option<SubContainerConfig> {
        self.sub_config
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Container for MemoryContainer {
    fn id(&self) -> i32 {
        self.id
    }

    fn parent_id(&self) -> i32 {
        self.sub_config().map_or(-1, |config| config.parent_id)
    }

    fn pipeline(&self) -> Option<Arc<dyn Pipeline>> {
        Some(Arc::clone(&self.pipeline) as Arc<dyn Pipeline>)
    }

    fn task_executor(&self) -> Option<Arc<dyn TaskExecutor>> {
        Some(Arc::clone(&self.executor))
    }

    fn frontend(&self) -> Option<Arc<dyn Frontend>> {
        Some(Arc::clone(&self.frontend) as Arc<dyn Frontend>)
    }

    fn ui_window(&self) -> Option<Arc<dyn Window>> {
        self.ui_window
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn set_ui_window(&self, window: Option<Arc<dyn Window>>) {
        self.record(format!("set_ui_window {}", window.is_some()));
        *self.ui_window.lock().unwrap_or_else(|e| e.into_inner()) = window;
    }

    fn window_id(&self) -> u32 {
        self.window_id
    }

    fn window_name(&self) -> String {
        self.window_name.clone()
    }

    fn current_display_id(&self) -> u64 {
        self.flags().display_id
    }

    fn is_scene_board_window(&self) -> bool {
        self.flags().scene_board_window
    }

    fn is_scene_board_enabled(&self) -> bool {
        self.flags().scene_board_enabled
    }

    fn is_ui_extension_window(&self) -> bool {
        self.flags().ui_extension
    }

    fn is_free_multi_window(&self) -> bool {
        self.flags().free_multi_window
    }

    fn is_cross_axis_window(&self) -> bool {
        self.flags().cross_axis
    }

    fn is_dialog_container(&self) -> bool {
        self.sub_config()
            .is_some_and(|config| config.kind == SubContainerKind::Dialog)
    }

    fn current_fold_status(&self) -> FoldStatus {
        self.flags().fold_status
    }

    fn api_target_version(&self) -> i32 {
        self.flags().api_target_version
    }

    fn resources(&self) -> ContainerResources {
        ContainerResources {
            package_path: format!("/data/app/{}", self.id),
            hap_path: format!("/data/app/{}/entry.hap", self.id),
            ..ContainerResources::default()
        }
    }

    fn configure_sub_container(&self, config: SubContainerConfig) {
        self.record(format!("configure_sub_container {:?} parent={}", config.kind, config.parent_id));
        *self.sub_config.lock().unwrap_or_else(|e| e.into_inner()) = Some(config);
    }

    fn view(&self) -> Option<ViewConfig> {
        *self.view.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_view(&self, config: ViewConfig) {
        self.record(format!("set_view {}x{}@{}", config.width, config.height, config.density));
        *self.view.lock().unwrap_or_else(|e| e.into_inner()) = Some(config);
    }

    fn surface_changed(&self, width: i32, height: i32) {
        self.record(format!("surface_changed {width}x{height}"));
    }

    fn view_safe_area(&self, kind: AvoidAreaType, window_rect: Option<RectF>) -> SafeAreaInsets {
        self.record(format!("view_safe_area {kind:?} override={}", window_rect.is_some()));
        self.flags().safe_area
    }

    fn set_font_scale_and_weight_scale(&self) {
        self.record("set_font_scale_and_weight_scale");
    }

    fn hide_window(&self) {
        self.record("hide_window");
        if let Some(window) = self.ui_window() {
            if let Err(err) = window.hide() {
                tracing::warn!(container_id = self.id, error = %err, "sim container hide failed");
            }
        }
    }

    fn close_window(&self) {
        self.record("close_window");
        *self.closed.lock().unwrap_or_else(|e| e.into_inner()) = true;
        if let Some(window) = self.ui_window() {
            if let Err(err) = window.close() {
                tracing::warn!(container_id = self.id, error = %err, "sim container close failed");
            }
        }
    }
}

/// Registry that creates a child container for any window with content
/// attached, on first lookup.
pub struct MemoryContainerRegistry {
    recorder: Recorder,
    windows: Arc<MemoryWindowService>,
    ids: NodeIds,
    next_child_id: AtomicI32,
    child_pipeline_kind: Mutex<PipelineKind>,
    child_executor: Mutex<Arc<dyn TaskExecutor>>,
    density: f64,
    containers: Mutex<BTreeMap<i32, Arc<MemoryContainer>>>,
    by_window: Mutex<BTreeMap<u32, i32>>,
    destroyed: Mutex<Vec<i32>>,
    window_counter: AtomicU32,
}

impl MemoryContainerRegistry {
    pub fn new(recorder: Recorder, windows: Arc<MemoryWindowService>, ids: NodeIds, density: f64) -> Self {
        Self {
            recorder,
            windows,
            ids,
            next_child_id: AtomicI32::new(MIN_SUBCONTAINER_ID),
            child_pipeline_kind: Mutex::new(PipelineKind::NextGen),
            child_executor: Mutex::new(Arc::new(InlineExecutor)),
            density,
            containers: Mutex::new(BTreeMap::new()),
            by_window: Mutex::new(BTreeMap::new()),
            destroyed: Mutex::new(Vec::new()),
            window_counter: AtomicU32::new(0),
        }
    }

    pub fn set_child_pipeline_kind(&self, kind: PipelineKind) {
        *self.child_pipeline_kind.lock().unwrap_or_else(|e| e.into_inner()) = kind;
    }

    pub fn set_child_executor(&self, executor: Arc<dyn TaskExecutor>) {
        *self.child_executor.lock().unwrap_or_else(|e| e.into_inner()) = executor;
    }

    pub fn insert(&self, container: Arc<MemoryContainer>) {
        self.by_window
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(container.window_id, container.id);
        self.containers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(container.id, container);
    }

    pub fn memory_container(&self, id: i32) -> Option<Arc<MemoryContainer>> {
        self.containers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .cloned()
    }

    pub fn destroyed(&self) -> Vec<i32> {
        self.destroyed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of child containers created so far.
    pub fn children_created(&self) -> u32 {
        self.window_counter.load(Ordering::Relaxed)
    }

    fn create_child(&self, window_id: u32) -> Option<i32> {
        let window = self.windows.window(window_id)?;
        if !window.has_content() {
            return None;
        }
        let id = self.next_child_id.fetch_add(1, Ordering::Relaxed);
        let kind = *self.child_pipeline_kind.lock().unwrap_or_else(|e| e.into_inner());
        let rect = window.request_rect();
        let pipeline = Arc::new(MemoryPipeline::new(
            id,
            PipelineSpec {
                kind,
                window_id,
                density: self.density,
                display_window_rect: WindowRect::new(0, 0, rect.width, rect.height),
            },
            self.recorder.clone(),
            self.ids.clone(),
        ));
        let executor = Arc::clone(&*self.child_executor.lock().unwrap_or_else(|e| e.into_inner()));
        let container = Arc::new(MemoryContainer::new(
            id,
            window,
            pipeline,
            executor,
            self.recorder.clone(),
        ));
        self.insert(container);
        self.window_counter.fetch_add(1, Ordering::Relaxed);
        self.recorder
            .record("containers", format!("create_child {id} window={window_id}"));
        Some(id)
    }
}

impl ContainerRegistry for MemoryContainerRegistry {
    fn container(&self, id: i32) -> Option<Arc<dyn Container>> {
        self.memory_container(id)
            .map(|container| container as Arc<dyn Container>)
    }

    fn container_id_for_window(&self, window_id: u32) -> Option<i32> {
        let known = self
            .by_window
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&window_id)
            .copied();
        known.or_else(|| self.create_child(window_id))
    }

    fn destroy_container(&self, id: i32) {
        self.recorder
            .record("containers", format!("destroy_container {id}"));
        let removed = self
            .containers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
        if let Some(container) = removed {
            self.by_window
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&container.window_id);
        }
        self.destroyed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(id);
    }
}
