//! In-memory window service and display manager.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{WmError, WmResult};
use crate::window::{
    DisplayInfo, DisplayManager, FreeMultiWindowListener, Window, WindowOption, WindowRect,
    WindowService, WindowType,
};

use super::Recorder;

#[derive(Default)]
struct WindowState {
    rect: WindowRect,
    request_rect: WindowRect,
    shown: bool,
    focusable: bool,
    focused: bool,
    touchable: bool,
    hot_areas: Vec<WindowRect>,
    has_content: bool,
    destroyed: bool,
    full_screen: bool,
    follow_parent_layout: bool,
    free_multi_window: bool,
    host_rect: WindowRect,
    listener: Option<Arc<dyn FreeMultiWindowListener>>,
    failures: BTreeMap<&'static str, WmError>,
}

/// A window that records every call and can be told to fail.
pub struct MemoryWindow {
    id: u32,
    name: String,
    option: WindowOption,
    recorder: Recorder,
    state: Mutex<WindowState>,
}

impl MemoryWindow {
    fn new(id: u32, name: &str, option: WindowOption, recorder: Recorder) -> Self {
        let state = WindowState {
            rect: option.rect,
            request_rect: option.rect,
            focusable: option.focusable,
            touchable: true,
            ..WindowState::default()
        };
        Self {
            id,
            name: name.to_string(),
            option,
            recorder,
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn target(&self) -> String {
        format!("window:{}", self.id)
    }

    fn record(&self, op: impl Into<String>) {
        self.recorder.record(self.target(), op);
    }

    fn check(&self, op: &'static str) -> WmResult {
        let state = self.lock();
        if state.destroyed {
            return Err(WmError::InvalidWindow);
        }
        match state.failures.get(op) {
            Some(err) => Err(*err),
            None => Ok(()),
        }
    }

    /// Makes every later call named `op` fail with `err`.
    pub fn fail_on(&self, op: &'static str, err: WmError) {
        self.lock().failures.insert(op, err);
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    pub fn option(&self) -> &WindowOption {
        &self.option
    }

    pub fn is_shown(&self) -> bool {
        self.lock().shown
    }

    pub fn is_touchable(&self) -> bool {
        self.lock().touchable
    }

    pub fn hot_areas(&self) -> Vec<WindowRect> {
        self.lock().hot_areas.clone()
    }

    pub fn has_content(&self) -> bool {
        self.lock().has_content
    }

    pub fn is_destroyed(&self) -> bool {
        self.lock().destroyed
    }

    pub fn is_full_screen(&self) -> bool {
        self.lock().full_screen
    }

    pub fn follows_parent_layout(&self) -> bool {
        self.lock().follow_parent_layout
    }

    pub fn set_focused(&self, focused: bool) {
        self.lock().focused = focused;
    }

    pub fn set_host_rect(&self, rect: WindowRect) {
        self.lock().host_rect = rect;
    }

    pub fn has_listener(&self) -> bool {
        self.lock().listener.is_some()
    }

    /// Toggles free multi-window mode and notifies the registered listener
    /// the way the window service does.
    pub fn switch_free_multi_window(&self, enable: bool) {
        let listener = {
            let mut state = self.lock();
            state.free_multi_window = enable;
            state.listener.clone()
        };
        if let Some(listener) = listener {
            listener.on_switch_free_multi_window(enable);
        }
    }
}

impl Window for MemoryWindow {
    fn window_id(&self) -> u32 {
        self.id
    }

    fn window_name(&self) -> String {
        self.name.clone()
    }

    fn window_type(&self) -> WindowType {
        self.option.window_type
    }

    fn display_id(&self) -> u64 {
        self.option.display_id
    }

    fn rect(&self) -> WindowRect {
        self.lock().rect
    }

    fn request_rect(&self) -> WindowRect {
        self.lock().request_rect
    }

    fn show(&self, with_animation: bool, with_focus: bool) -> WmResult {
        self.record(format!("show animation={with_animation} focus={with_focus}"));
        self.check("show")?;
        let mut state = self.lock();
        state.shown = true;
        if with_focus && state.focusable {
            state.focused = true;
        }
        Ok(())
    }

    fn hide(&self) -> WmResult {
        self.record("hide");
        self.check("hide")?;
        let mut state = self.lock();
        state.shown = false;
        state.focused = false;
        Ok(())
    }

    fn resize(&self, width: u32, height: u32) -> WmResult {
        self.record(format!("resize {width}x{height}"));
        self.check("resize")?;
        let mut state = self.lock();
        state.rect.width = width;
        state.rect.height = height;
        state.request_rect = state.rect;
        Ok(())
    }

    fn move_to(&self, x: i32, y: i32) -> WmResult {
        self.record(format!("move_to {x},{y}"));
        self.check("move_to")?;
        let mut state = self.lock();
        state.rect.pos_x = x;
        state.rect.pos_y = y;
        Ok(())
    }

    fn set_focusable(&self, focusable: bool) -> WmResult {
        self.record(format!("set_focusable {focusable}"));
        self.check("set_focusable")?;
        self.lock().focusable = focusable;
        Ok(())
    }

    fn focusable(&self) -> bool {
        self.lock().focusable
    }

    fn request_focus(&self) -> WmResult {
        self.record("request_focus");
        self.check("request_focus")?;
        let mut state = self.lock();
        if !state.focusable {
            return Err(WmError::Denied);
        }
        state.focused = true;
        Ok(())
    }

    fn is_focused(&self) -> bool {
        self.lock().focused
    }

    fn set_touchable(&self, touchable: bool) -> WmResult {
        self.record(format!("set_touchable {touchable}"));
        self.check("set_touchable")?;
        self.lock().touchable = touchable;
        Ok(())
    }

    fn set_touch_hot_areas(&self, rects: &[WindowRect]) -> WmResult {
        let listed: Vec<String> = rects.iter().map(ToString::to_string).collect();
        self.record(format!("set_touch_hot_areas {}", listed.join(";")));
        self.check("set_touch_hot_areas")?;
        self.lock().hot_areas = rects.to_vec();
        Ok(())
    }

    fn set_avoid_area_option(&self, option: u32) -> WmResult {
        self.record(format!("set_avoid_area_option {option}"));
        self.check("set_avoid_area_option")
    }

    fn set_need_default_animation(&self, enabled: bool) {
        self.record(format!("set_need_default_animation {enabled}"));
    }

    fn set_full_screen(&self, enabled: bool) -> WmResult {
        self.record(format!("set_full_screen {enabled}"));
        self.check("set_full_screen")?;
        self.lock().full_screen = enabled;
        Ok(())
    }

    fn set_layout_full_screen(&self, enabled: bool) -> WmResult {
        self.record(format!("set_layout_full_screen {enabled}"));
        self.check("set_layout_full_screen")
    }

    fn set_follow_screen_change(&self, enabled: bool) -> WmResult {
        self.record(format!("set_follow_screen_change {enabled}"));
        self.check("set_follow_screen_change")
    }

    fn set_follow_parent_window_layout_enabled(&self, enabled: bool) -> WmResult {
        self.record(format!("set_follow_parent_window_layout_enabled {enabled}"));
        self.check("set_follow_parent_window_layout_enabled")?;
        self.lock().follow_parent_layout = enabled;
        Ok(())
    }

    fn keep_keyboard_on_focus(&self, keep: bool) -> WmResult {
        self.record(format!("keep_keyboard_on_focus {keep}"));
        self.check("keep_keyboard_on_focus")
    }

    fn set_surface_shadow_elevation(&self, elevation: f32) -> WmResult {
        self.record(format!("set_surface_shadow_elevation {elevation}"));
        self.check("set_surface_shadow_elevation")
    }

    fn set_ui_content(&self) -> WmResult {
        self.record("set_ui_content");
        self.check("set_ui_content")?;
        self.lock().has_content = true;
        Ok(())
    }

    fn host_window_rect(&self, host_window_id: u32) -> WindowRect {
        self.record(format!("host_window_rect {host_window_id}"));
        self.lock().host_rect
    }

    fn is_free_multi_window_enabled(&self) -> bool {
        self.lock().free_multi_window
    }

    fn is_ui_ext_first_sub_window(&self) -> bool {
        self.option.ui_ext_first_sub_window
    }

    fn is_ui_ext_any_sub_window(&self) -> bool {
        self.option.ui_ext_any_sub_window
    }

    fn register_free_multi_window_listener(
        &self,
        listener: Arc<dyn FreeMultiWindowListener>,
    ) -> WmResult {
        self.record("register_free_multi_window_listener");
        self.check("register_free_multi_window_listener")?;
        self.lock().listener = Some(listener);
        Ok(())
    }

    fn unregister_free_multi_window_listener(&self) -> WmResult {
        self.record("unregister_free_multi_window_listener");
        self.lock().listener = None;
        Ok(())
    }

    fn close(&self) -> WmResult {
        self.record("close");
        self.check("close")?;
        self.lock().shown = false;
        Ok(())
    }

    fn destroy(&self) -> WmResult {
        self.record("destroy");
        self.check("destroy")?;
        let mut state = self.lock();
        state.destroyed = true;
        state.shown = false;
        state.listener = None;
        Ok(())
    }
}

/// Window service keeping every created window in memory.
pub struct MemoryWindowService {
    recorder: Recorder,
    next_id: AtomicU32,
    windows: Mutex<BTreeMap<u32, Arc<MemoryWindow>>>,
    fail_create: Mutex<Option<WmError>>,
}

impl MemoryWindowService {
    pub fn new(recorder: Recorder) -> Self {
        Self {
            recorder,
            next_id: AtomicU32::new(1),
            windows: Mutex::new(BTreeMap::new()),
            fail_create: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<u32, Arc<MemoryWindow>>> {
        self.windows.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Makes every later `create` fail with `err`; `None` restores it.
    pub fn fail_create(&self, err: Option<WmError>) {
        *self.fail_create.lock().unwrap_or_else(|e| e.into_inner()) = err;
    }

    fn insert(&self, name: &str, option: WindowOption) -> Arc<MemoryWindow> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let window = Arc::new(MemoryWindow::new(id, name, option, self.recorder.clone()));
        self.lock().insert(id, Arc::clone(&window));
        window
    }

    /// Registers a window that exists outside the coordinator, such as the
    /// main window of a parent container.
    pub fn add_existing(&self, name: &str, option: WindowOption) -> Arc<MemoryWindow> {
        self.insert(name, option)
    }

    pub fn window(&self, id: u32) -> Option<Arc<MemoryWindow>> {
        self.lock().get(&id).cloned()
    }

    pub fn window_by_name(&self, name: &str) -> Option<Arc<MemoryWindow>> {
        self.lock().values().find(|w| w.name == name).cloned()
    }

    /// Windows whose name starts with `prefix`, in creation order.
    pub fn windows_with_prefix(&self, prefix: &str) -> Vec<Arc<MemoryWindow>> {
        self.lock()
            .values()
            .filter(|w| w.name.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl WindowService for MemoryWindowService {
    fn create(&self, name: &str, option: WindowOption) -> WmResult<Arc<dyn Window>> {
        self.recorder
            .record("windows", format!("create {name} {:?}", option.window_type));
        if let Some(err) = *self.fail_create.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(err);
        }
        let window: Arc<dyn Window> = self.insert(name, option);
        Ok(window)
    }

    fn find(&self, name: &str) -> Option<Arc<dyn Window>> {
        self.window_by_name(name)
            .map(|window| window as Arc<dyn Window>)
    }
}

/// Display manager over a fixed set of displays.
pub struct MemoryDisplayManager {
    displays: Mutex<BTreeMap<u64, DisplayInfo>>,
    visible_area: Mutex<Option<DisplayInfo>>,
    default_id: u64,
}

impl MemoryDisplayManager {
    pub fn new(default: DisplayInfo) -> Self {
        let mut displays = BTreeMap::new();
        displays.insert(default.id, default);
        Self {
            displays: Mutex::new(displays),
            visible_area: Mutex::new(None),
            default_id: default.id,
        }
    }

    pub fn add_display(&self, display: DisplayInfo) {
        self.displays
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(display.id, display);
    }

    pub fn set_visible_area(&self, display: Option<DisplayInfo>) {
        *self.visible_area.lock().unwrap_or_else(|e| e.into_inner()) = display;
    }
}

impl DisplayManager for MemoryDisplayManager {
    fn display_by_id(&self, id: u64) -> Option<DisplayInfo> {
        self.displays
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .copied()
    }

    fn default_display(&self) -> Option<DisplayInfo> {
        self.display_by_id(self.default_id)
    }

    fn visible_area_display(&self, _id: u64) -> Option<DisplayInfo> {
        *self.visible_area.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn expand_available_area(&self, id: u64) -> WmResult<WindowRect> {
        self.display_by_id(id)
            .map(|display| display.bounds())
            .ok_or(WmError::InvalidParam)
    }
}
