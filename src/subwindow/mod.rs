//! The subwindow coordinator.
//!
//! One [`Subwindow`] drives one overlay surface above a parent container:
//! it lazily creates the OS window and the child container behind it, shows
//! and hides it around overlay operations, tracks touch hot areas, and runs
//! the toast/dialog flow for callers that have no UI container.
//!
//! State lives behind a single `Mutex` that is never held across calls into
//! windows, containers or the overlay manager; collaborators are cloned out
//! of the state first.

use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::constants::{INSTANCE_ID_UNDEFINED, MIN_PA_SERVICE_ID, MIN_SUBCONTAINER_ID};
use crate::container::{Container, ContainerScope};
use crate::event_loop::{EventHandler, EventRunner};
use crate::executor::TaskType;
use crate::geometry::RectF;
use crate::manager::SubwindowKind;
use crate::overlay::{ComponentRef, OverlayManager, ToastShowMode};
use crate::pipeline::Pipeline;
use crate::platform::Platform;
use crate::window::{FreeMultiWindowListener, Window, WindowFlag, WindowRect, WindowType};

mod free_multi_window;
mod hot_area;
mod init;
mod overlay_ops;
mod safe_area;
mod toast;
mod visibility;

pub use free_multi_window::FreeMultiWindowCallback;
pub use hot_area::{MIN_WINDOW_HOT_AREA, rect_converter};
pub use toast::ToastDialogGeometry;
pub use visibility::HideOutcome;

/// Window type used for "above apps" toasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastWindowType {
    #[default]
    AppSubWindow,
    SystemSubWindow,
    SystemFloat,
}

/// Presentation options fixed before the window is created.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubwindowOptions {
    /// System-wide top-most toast.
    pub system_top_most: bool,
    /// Toast shown above other applications.
    pub above_apps: bool,
    pub toast_window_type: ToastWindowType,
    /// Main window of the application, parent of above-apps toasts.
    pub main_window_id: u32,
    /// Text selection menu hosted in its own subwindow.
    pub select_overlay: bool,
}

/// Everything the window-kind decision depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowKindInputs {
    pub system_top_most: bool,
    pub above_apps: bool,
    pub toast_window_type: ToastWindowType,
    pub select_overlay: bool,
    pub main_window_id: u32,
    pub scene_board_enabled: bool,
    pub scene_board_window: bool,
    pub parent_is_ui_extension: bool,
    pub parent_window_type: WindowType,
    pub parent_window_id: u32,
    /// The parent window is itself a UI-extension sub window.
    pub parent_ui_ext_sub_window: bool,
    /// Window focused on behalf of the parent pipeline; the host window for
    /// UI extensions.
    pub host_window_id: u32,
}

/// Outcome of the window-kind decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowKind {
    pub window_type: WindowType,
    pub parent_id: Option<u32>,
    /// Inserted into the window name after the common prefix.
    pub tag: &'static str,
    pub follow_screen: bool,
    pub flags: Vec<WindowFlag>,
    pub ui_ext_first_sub_window: bool,
    pub ui_ext_any_sub_window: bool,
    /// Host window the subwindow is parented to, for UI-extension parents.
    pub ui_extension_host: Option<u32>,
}

impl WindowKind {
    fn new(window_type: WindowType, parent_id: Option<u32>) -> Self {
        Self {
            window_type,
            parent_id,
            tag: "",
            follow_screen: false,
            flags: Vec::new(),
            ui_ext_first_sub_window: false,
            ui_ext_any_sub_window: false,
            ui_extension_host: None,
        }
    }
}

fn toast_window_type(kind: ToastWindowType, scene_board_enabled: bool, select_overlay: bool) -> WindowType {
    match kind {
        ToastWindowType::AppSubWindow if !scene_board_enabled && !select_overlay => WindowType::Toast,
        ToastWindowType::AppSubWindow => WindowType::AppSubWindow,
        ToastWindowType::SystemSubWindow => WindowType::Toast,
        ToastWindowType::SystemFloat => WindowType::SystemFloat,
    }
}

/// Picks the window type and parent for a new subwindow. The first matching
/// rule wins; the result depends on nothing but `inputs`.
pub fn resolve_window_kind(inputs: &WindowKindInputs) -> WindowKind {
    let mut app_sub_window = false;
    let mut kind = if inputs.system_top_most {
        let mut kind = WindowKind::new(WindowType::SystemToast, None);
        kind.tag = "TOAST_SYSTEM_";
        kind.follow_screen = true;
        kind
    } else if inputs.above_apps {
        let window_type = toast_window_type(
            inputs.toast_window_type,
            inputs.scene_board_enabled,
            inputs.select_overlay,
        );
        let main_window_id = if inputs.select_overlay {
            inputs.parent_window_id
        } else {
            inputs.main_window_id
        };
        let mut kind = WindowKind::new(window_type, Some(main_window_id));
        if window_type == WindowType::AppSubWindow {
            app_sub_window = true;
            kind.flags.push(if inputs.select_overlay {
                WindowFlag::IsTextMenu
            } else {
                WindowFlag::IsToast
            });
        }
        if inputs.parent_is_ui_extension {
            kind.ui_ext_any_sub_window = true;
            kind.parent_id = Some(inputs.host_window_id);
            kind.ui_extension_host = Some(inputs.host_window_id);
        }
        kind.tag = if inputs.select_overlay {
            "TEXT_MENU_"
        } else {
            "TOAST_TOPMOST_"
        };
        kind
    } else if inputs.scene_board_window || inputs.parent_window_type == WindowType::Desktop {
        let mut kind = WindowKind::new(WindowType::SystemFloat, None);
        kind.follow_screen = true;
        kind
    } else if inputs.parent_window_type == WindowType::UiExtension {
        app_sub_window = true;
        let mut kind = WindowKind::new(WindowType::AppSubWindow, Some(inputs.host_window_id));
        kind.ui_ext_first_sub_window = true;
        kind.ui_extension_host = Some(inputs.host_window_id);
        kind
    } else if inputs.parent_window_type.is_system() {
        let mut kind = WindowKind::new(WindowType::SystemSubWindow, Some(inputs.parent_window_id));
        kind.follow_screen = true;
        kind
    } else {
        app_sub_window = true;
        WindowKind::new(WindowType::AppSubWindow, Some(inputs.parent_window_id))
    };
    if app_sub_window && inputs.parent_ui_ext_sub_window {
        kind.ui_ext_any_sub_window = true;
    }
    kind
}

/// Whether a toast requested by `parent_id` is served by the dedicated
/// toast/dialog event loop instead of the parent's own frontend.
pub fn toast_routes_to_service(parent_id: i32, show_mode: ToastShowMode) -> bool {
    let top_most = show_mode == ToastShowMode::TopMost;
    (top_most && (MIN_PA_SERVICE_ID..MIN_SUBCONTAINER_ID).contains(&parent_id))
        || (!top_most && parent_id >= MIN_PA_SERVICE_ID)
        || parent_id < 0
}

/// Whether dialogs and action menus requested by `parent_id` are served by
/// the dedicated toast/dialog event loop.
pub fn dialog_routes_to_service(parent_id: i32) -> bool {
    parent_id >= MIN_PA_SERVICE_ID || parent_id < 0
}

pub(crate) struct State {
    window: Option<Arc<dyn Window>>,
    parent_window: Option<Arc<dyn Window>>,
    dialog_window: Option<Arc<dyn Window>>,
    child_container_id: i32,
    default_display_id: u64,
    rect: RectF,
    options: SubwindowOptions,
    is_showed: bool,
    is_toast_window: bool,
    have_dialog: bool,
    need_set_current_window: bool,
    need_avoid_keyboard: bool,
    popup_target_id: i32,
    node_id: Option<i32>,
    ui_extension_host_window_id: Option<u32>,
    hot_areas: BTreeMap<i32, Vec<WindowRect>>,
    free_multi_window_listener: Option<Arc<dyn FreeMultiWindowListener>>,
    free_multi_window_callbacks: BTreeMap<i32, FreeMultiWindowCallback>,
    last_callback_id: i32,
    follow_parent_layout_nodes: Vec<i32>,
    legacy_menu: Option<ComponentRef>,
}

impl State {
    fn new(options: SubwindowOptions) -> Self {
        Self {
            window: None,
            parent_window: None,
            dialog_window: None,
            child_container_id: INSTANCE_ID_UNDEFINED,
            default_display_id: 0,
            rect: RectF::default(),
            options,
            is_showed: false,
            is_toast_window: false,
            have_dialog: false,
            need_set_current_window: true,
            need_avoid_keyboard: false,
            popup_target_id: -1,
            node_id: None,
            ui_extension_host_window_id: None,
            hot_areas: BTreeMap::new(),
            free_multi_window_listener: None,
            free_multi_window_callbacks: BTreeMap::new(),
            last_callback_id: 0,
            follow_parent_layout_nodes: Vec::new(),
            legacy_menu: None,
        }
    }
}

/// Child container plus the collaborators every overlay operation needs.
pub(crate) struct ChildContext {
    container: Arc<dyn Container>,
    pipeline: Arc<dyn Pipeline>,
    overlay: Arc<dyn OverlayManager>,
}

pub struct Subwindow {
    id: i32,
    parent_container_id: i32,
    platform: Platform,
    this: Weak<Subwindow>,
    state: Mutex<State>,
    event_runner: Mutex<Option<EventRunner>>,
    closing: AtomicBool,
}

impl Subwindow {
    /// Constructs a coordinator without creating any window.
    pub fn new(platform: Platform, parent_container_id: i32) -> Arc<Self> {
        Self::with_options(platform, parent_container_id, SubwindowOptions::default())
    }

    pub fn with_options(
        platform: Platform,
        parent_container_id: i32,
        options: SubwindowOptions,
    ) -> Arc<Self> {
        let id = platform.manager.next_subwindow_id();
        tracing::info!(subwindow_id = id, parent_container_id, "create subwindow");
        Arc::new_cyclic(|this| Self {
            id,
            parent_container_id,
            platform,
            this: this.clone(),
            state: Mutex::new(State::new(options)),
            event_runner: Mutex::new(None),
            closing: AtomicBool::new(false),
        })
    }

    /// Constructs a coordinator, initializes its window and child container
    /// and registers it with the subwindow manager.
    pub fn create(
        platform: Platform,
        parent_container_id: i32,
        options: SubwindowOptions,
    ) -> Result<Arc<Self>, crate::error::InitError> {
        let kind = if options.system_top_most || options.above_apps {
            SubwindowKind::Toast
        } else {
            SubwindowKind::Main
        };
        let manager = Arc::clone(&platform.manager);
        let subwindow = Self::with_options(platform, parent_container_id, options);
        if let Err(err) = subwindow.init_container() {
            tracing::warn!(
                subwindow_id = subwindow.id,
                parent_container_id,
                error = %err,
                "subwindow initialization failed"
            );
            return Err(err);
        }
        manager.add_subwindow(parent_container_id, kind, Arc::clone(&subwindow));
        Ok(subwindow)
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn subwindow_id(&self) -> i32 {
        self.id
    }

    pub fn parent_container_id(&self) -> i32 {
        self.parent_container_id
    }

    /// Container holding this subwindow's content, or
    /// `INSTANCE_ID_UNDEFINED` before initialization.
    pub fn child_container_id(&self) -> i32 {
        self.state().child_container_id
    }

    pub fn options(&self) -> SubwindowOptions {
        self.state().options.clone()
    }

    pub fn set_options(&self, options: SubwindowOptions) {
        self.state().options = options;
    }

    pub fn window(&self) -> Option<Arc<dyn Window>> {
        self.state().window.clone()
    }

    pub fn dialog_window(&self) -> Option<Arc<dyn Window>> {
        self.state().dialog_window.clone()
    }

    pub fn is_showed(&self) -> bool {
        self.state().is_showed
    }

    pub fn is_toast_window(&self) -> bool {
        self.state().is_toast_window
    }

    pub fn set_is_toast_window(&self, is_toast: bool) {
        self.state().is_toast_window = is_toast;
    }

    pub fn have_dialog(&self) -> bool {
        self.state().have_dialog
    }

    pub fn popup_target_id(&self) -> i32 {
        self.state().popup_target_id
    }

    pub fn need_avoid_keyboard(&self) -> bool {
        self.state().need_avoid_keyboard
    }

    /// Dialog node this subwindow was registered for, if any.
    pub fn node_id(&self) -> Option<i32> {
        self.state().node_id
    }

    pub fn rect(&self) -> RectF {
        self.state().rect
    }

    pub fn set_rect(&self, rect: RectF) {
        self.state().rect = rect;
    }

    pub fn ui_extension_host_window_id(&self) -> Option<u32> {
        self.state().ui_extension_host_window_id
    }

    fn arc(&self) -> Option<Arc<Subwindow>> {
        self.this.upgrade()
    }

    fn container(&self, id: i32) -> Option<Arc<dyn Container>> {
        self.platform.containers.container(id)
    }

    fn parent_container(&self) -> Option<Arc<dyn Container>> {
        self.container(self.parent_container_id)
    }

    fn child_container(&self) -> Option<Arc<dyn Container>> {
        self.container(self.child_container_id())
    }

    pub(crate) fn child_pipeline(&self) -> Option<Arc<dyn Pipeline>> {
        self.child_container()?.pipeline()
    }

    fn child_context(&self) -> Option<ChildContext> {
        let container = self.child_container()?;
        let pipeline = container.pipeline()?;
        let overlay = pipeline.overlay_manager()?;
        Some(ChildContext {
            container,
            pipeline,
            overlay,
        })
    }

    pub fn overlay_manager(&self) -> Option<Arc<dyn OverlayManager>> {
        self.child_pipeline()?.overlay_manager()
    }

    fn parent_overlay(&self) -> Option<Arc<dyn OverlayManager>> {
        self.parent_container()?.pipeline()?.overlay_manager()
    }

    fn event_handler(&self) -> Option<EventHandler> {
        self.event_runner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(EventRunner::handler)
    }

    /// State-mutating operations run on the UI thread of the owning
    /// container or on this subwindow's toast/dialog loop.
    fn check_ui_thread(&self, operation: &'static str) {
        if self
            .event_handler()
            .is_some_and(|handler| handler.is_worker_thread())
        {
            return;
        }
        let Some(executor) = self
            .child_container()
            .or_else(|| self.parent_container())
            .and_then(|container| container.task_executor())
        else {
            return;
        };
        if !executor.runs_on_current_thread(TaskType::Ui) {
            tracing::warn!(
                subwindow_id = self.id,
                operation,
                "subwindow state mutated off the UI thread"
            );
        }
    }

    /// Legacy pipeline top stack of the child container.
    fn legacy_stack(&self) -> Option<Arc<dyn crate::overlay::StackElement>> {
        self.child_pipeline()?.last_stack()
    }

    fn enter_child_scope(&self) -> ContainerScope {
        ContainerScope::new(self.child_container_id())
    }
}

impl std::fmt::Debug for Subwindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subwindow")
            .field("id", &self.id)
            .field("parent_container_id", &self.parent_container_id)
            .field("child_container_id", &self.child_container_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_inputs(parent_window_type: WindowType) -> WindowKindInputs {
        WindowKindInputs {
            system_top_most: false,
            above_apps: false,
            toast_window_type: ToastWindowType::AppSubWindow,
            select_overlay: false,
            main_window_id: 1,
            scene_board_enabled: false,
            scene_board_window: false,
            parent_is_ui_extension: false,
            parent_window_type,
            parent_window_id: 42,
            parent_ui_ext_sub_window: false,
            host_window_id: 7,
        }
    }

    #[test]
    fn app_main_parent_gets_app_sub_window() {
        let kind = resolve_window_kind(&app_inputs(WindowType::AppMainWindow));
        assert_eq!(kind.window_type, WindowType::AppSubWindow);
        assert_eq!(kind.parent_id, Some(42));
        assert!(!kind.follow_screen);
        assert_eq!(kind.tag, "");
    }

    #[test]
    fn system_top_most_wins_over_everything() {
        let mut inputs = app_inputs(WindowType::UiExtension);
        inputs.system_top_most = true;
        inputs.above_apps = true;
        inputs.scene_board_window = true;
        let kind = resolve_window_kind(&inputs);
        assert_eq!(kind.window_type, WindowType::SystemToast);
        assert_eq!(kind.parent_id, None);
        assert_eq!(kind.tag, "TOAST_SYSTEM_");
        assert!(kind.follow_screen);
    }

    #[test]
    fn above_apps_toast_sub_kinds() {
        let mut inputs = app_inputs(WindowType::AppMainWindow);
        inputs.above_apps = true;
        let kind = resolve_window_kind(&inputs);
        assert_eq!(kind.window_type, WindowType::Toast);
        assert_eq!(kind.parent_id, Some(1));
        assert!(kind.flags.is_empty());

        inputs.scene_board_enabled = true;
        let kind = resolve_window_kind(&inputs);
        assert_eq!(kind.window_type, WindowType::AppSubWindow);
        assert_eq!(kind.flags, vec![WindowFlag::IsToast]);
        assert_eq!(kind.tag, "TOAST_TOPMOST_");

        inputs.toast_window_type = ToastWindowType::SystemFloat;
        assert_eq!(resolve_window_kind(&inputs).window_type, WindowType::SystemFloat);
    }

    #[test]
    fn select_overlay_uses_parent_window_and_text_menu_flag() {
        let mut inputs = app_inputs(WindowType::AppMainWindow);
        inputs.above_apps = true;
        inputs.select_overlay = true;
        let kind = resolve_window_kind(&inputs);
        assert_eq!(kind.window_type, WindowType::AppSubWindow);
        assert_eq!(kind.parent_id, Some(42));
        assert_eq!(kind.flags, vec![WindowFlag::IsTextMenu]);
        assert_eq!(kind.tag, "TEXT_MENU_");
    }

    #[test]
    fn ui_extension_parent_is_hosted() {
        let kind = resolve_window_kind(&app_inputs(WindowType::UiExtension));
        assert_eq!(kind.window_type, WindowType::AppSubWindow);
        assert_eq!(kind.parent_id, Some(7));
        assert!(kind.ui_ext_first_sub_window);
        assert_eq!(kind.ui_extension_host, Some(7));
    }

    #[test]
    fn scene_board_and_system_parents() {
        let mut inputs = app_inputs(WindowType::AppMainWindow);
        inputs.scene_board_window = true;
        assert_eq!(resolve_window_kind(&inputs).window_type, WindowType::SystemFloat);

        let kind = resolve_window_kind(&app_inputs(WindowType::Desktop));
        assert_eq!(kind.window_type, WindowType::SystemFloat);

        let kind = resolve_window_kind(&app_inputs(WindowType::SystemFloat));
        assert_eq!(kind.window_type, WindowType::SystemSubWindow);
        assert_eq!(kind.parent_id, Some(42));
        assert!(kind.follow_screen);
    }

    #[test]
    fn ui_extension_sub_window_flag_is_inherited() {
        let mut inputs = app_inputs(WindowType::AppSubWindow);
        inputs.parent_ui_ext_sub_window = true;
        assert!(resolve_window_kind(&inputs).ui_ext_any_sub_window);
        let mut inputs = app_inputs(WindowType::SystemFloat);
        inputs.parent_ui_ext_sub_window = true;
        assert!(!resolve_window_kind(&inputs).ui_ext_any_sub_window);
    }

    #[test]
    fn resolution_is_deterministic() {
        let inputs = app_inputs(WindowType::UiExtension);
        assert_eq!(resolve_window_kind(&inputs), resolve_window_kind(&inputs));
    }

    #[test]
    fn toast_routing_table() {
        use ToastShowMode::{Default, TopMost};
        let cases = [
            (-1, Default, true),
            (-1, TopMost, true),
            (0, Default, false),
            (5, TopMost, false),
            (MIN_PA_SERVICE_ID - 1, Default, false),
            (MIN_PA_SERVICE_ID, Default, true),
            (MIN_PA_SERVICE_ID, TopMost, true),
            (MIN_SUBCONTAINER_ID - 1, TopMost, true),
            (MIN_SUBCONTAINER_ID, TopMost, false),
            (MIN_SUBCONTAINER_ID, Default, true),
        ];
        for (parent_id, mode, expected) in cases {
            assert_eq!(
                toast_routes_to_service(parent_id, mode),
                expected,
                "parent {parent_id} mode {mode:?}"
            );
        }
    }

    #[test]
    fn dialog_routing_table() {
        for (parent_id, expected) in [
            (-1, true),
            (0, false),
            (MIN_PA_SERVICE_ID - 1, false),
            (MIN_PA_SERVICE_ID, true),
            (MIN_SUBCONTAINER_ID, true),
        ] {
            assert_eq!(dialog_routes_to_service(parent_id), expected);
        }
    }
}
