//! Window handle abstraction over the OS window service.
//!
//! Every call is synchronous and returns the service status; the coordinator
//! decides which failures abort an operation and which are only logged.

use std::fmt;
use std::sync::Arc;

use crate::error::WmResult;
use crate::geometry::{Rect, Size};

mod display;

pub use display::{DisplayInfo, DisplayManager, FoldStatus};

/// Signed window origin with unsigned size, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowRect {
    pub pos_x: i32,
    pub pos_y: i32,
    pub width: u32,
    pub height: u32,
}

impl WindowRect {
    pub const fn new(pos_x: i32, pos_y: i32, width: u32, height: u32) -> Self {
        Self {
            pos_x,
            pos_y,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Truncating conversion from a logical rectangle.
    ///
    /// Integer-valued, non-negative inputs convert losslessly.
    pub fn from_logical(rect: &Rect) -> Self {
        Self {
            pos_x: rect.x as i32,
            pos_y: rect.y as i32,
            width: rect.width as u32,
            height: rect.height as u32,
        }
    }
}

impl fmt::Display for WindowRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.pos_x, self.pos_y, self.width, self.height
        )
    }
}

const APP_SUB_WINDOW_BASE: u32 = 1000;
/// Window types at or above this value belong to the system.
pub const SYSTEM_WINDOW_BASE: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WindowType {
    AppMainWindow,
    AppSubWindow,
    AppComponent,
    UiExtension,
    Toast,
    Desktop,
    SystemFloat,
    SystemToast,
    SystemSubWindow,
}

impl WindowType {
    /// Numeric window type as known to the window service.
    pub fn raw(self) -> u32 {
        match self {
            WindowType::AppMainWindow => 1,
            WindowType::AppSubWindow => APP_SUB_WINDOW_BASE,
            WindowType::AppComponent => APP_SUB_WINDOW_BASE + 2,
            WindowType::UiExtension => APP_SUB_WINDOW_BASE + 3,
            WindowType::Toast => SYSTEM_WINDOW_BASE + 8,
            WindowType::Desktop => SYSTEM_WINDOW_BASE + 15,
            WindowType::SystemFloat => SYSTEM_WINDOW_BASE + 24,
            WindowType::SystemToast => SYSTEM_WINDOW_BASE + 27,
            WindowType::SystemSubWindow => SYSTEM_WINDOW_BASE + 500,
        }
    }

    pub fn is_system(self) -> bool {
        self.raw() >= SYSTEM_WINDOW_BASE
    }

    pub fn is_toast(self) -> bool {
        matches!(self, WindowType::Toast | WindowType::SystemToast)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowMode {
    #[default]
    Floating,
    FullScreen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowFlag {
    IsToast,
    IsTextMenu,
}

/// Creation options handed to [`WindowService::create`].
#[derive(Debug, Clone, PartialEq)]
pub struct WindowOption {
    pub window_type: WindowType,
    pub mode: WindowMode,
    pub rect: WindowRect,
    pub parent_id: Option<u32>,
    pub display_id: u64,
    pub focusable: bool,
    pub flags: Vec<WindowFlag>,
    pub ui_ext_first_sub_window: bool,
    pub ui_ext_any_sub_window: bool,
    /// Created on behalf of the application context rather than a parent.
    pub application_context: bool,
}

impl WindowOption {
    pub fn new(window_type: WindowType) -> Self {
        Self {
            window_type,
            mode: WindowMode::Floating,
            rect: WindowRect::default(),
            parent_id: None,
            display_id: 0,
            focusable: true,
            flags: Vec::new(),
            ui_ext_first_sub_window: false,
            ui_ext_any_sub_window: false,
            application_context: false,
        }
    }

    pub fn add_flag(&mut self, flag: WindowFlag) {
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AvoidAreaType {
    System,
    Cutout,
    NavigationIndicator,
}

/// Notified when the host toggles free multi-window mode.
pub trait FreeMultiWindowListener: Send + Sync {
    fn on_switch_free_multi_window(&self, enable: bool);
}

/// One OS-level window.
pub trait Window: Send + Sync {
    fn window_id(&self) -> u32;
    fn window_name(&self) -> String;
    fn window_type(&self) -> WindowType;
    fn display_id(&self) -> u64;
    /// Current on-screen rectangle.
    fn rect(&self) -> WindowRect;
    /// Rectangle requested at creation or by the last resize.
    fn request_rect(&self) -> WindowRect;

    fn show(&self, with_animation: bool, with_focus: bool) -> WmResult;
    fn hide(&self) -> WmResult;
    fn resize(&self, width: u32, height: u32) -> WmResult;
    fn move_to(&self, x: i32, y: i32) -> WmResult;

    fn set_focusable(&self, focusable: bool) -> WmResult;
    fn focusable(&self) -> bool;
    fn request_focus(&self) -> WmResult;
    fn is_focused(&self) -> bool;

    fn set_touchable(&self, touchable: bool) -> WmResult;
    fn set_touch_hot_areas(&self, rects: &[WindowRect]) -> WmResult;
    fn set_avoid_area_option(&self, option: u32) -> WmResult;
    fn set_need_default_animation(&self, enabled: bool);
    fn set_full_screen(&self, enabled: bool) -> WmResult;
    fn set_layout_full_screen(&self, enabled: bool) -> WmResult;
    fn set_follow_screen_change(&self, enabled: bool) -> WmResult;
    fn set_follow_parent_window_layout_enabled(&self, enabled: bool) -> WmResult;
    fn keep_keyboard_on_focus(&self, keep: bool) -> WmResult;

    /// Sets the shadow elevation of the window surface; fails when the
    /// surface has not been created.
    fn set_surface_shadow_elevation(&self, elevation: f32) -> WmResult;
    /// Attaches an empty content placeholder, which makes the platform create
    /// the container backing this window.
    fn set_ui_content(&self) -> WmResult;

    fn host_window_rect(&self, host_window_id: u32) -> WindowRect;
    fn is_free_multi_window_enabled(&self) -> bool;
    fn is_ui_ext_first_sub_window(&self) -> bool;
    fn is_ui_ext_any_sub_window(&self) -> bool;

    fn register_free_multi_window_listener(
        &self,
        listener: Arc<dyn FreeMultiWindowListener>,
    ) -> WmResult;
    fn unregister_free_multi_window_listener(&self) -> WmResult;

    fn close(&self) -> WmResult;
    fn destroy(&self) -> WmResult;
}

/// Creation and lookup of OS windows.
pub trait WindowService: Send + Sync {
    fn create(&self, name: &str, option: WindowOption) -> WmResult<Arc<dyn Window>>;
    fn find(&self, name: &str) -> Option<Arc<dyn Window>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_range_starts_at_base() {
        assert!(!WindowType::AppMainWindow.is_system());
        assert!(!WindowType::AppSubWindow.is_system());
        assert!(!WindowType::UiExtension.is_system());
        assert!(WindowType::Toast.is_system());
        assert!(WindowType::SystemSubWindow.is_system());
        assert!(WindowType::Desktop.raw() >= SYSTEM_WINDOW_BASE);
    }

    #[test]
    fn logical_conversion_truncates() {
        let rect = WindowRect::from_logical(&Rect::new(1.9, 2.2, 10.7, 3.0));
        assert_eq!(rect, WindowRect::new(1, 2, 10, 3));
    }

    #[test]
    fn option_flags_are_unique() {
        let mut option = WindowOption::new(WindowType::AppSubWindow);
        option.add_flag(WindowFlag::IsToast);
        option.add_flag(WindowFlag::IsToast);
        assert_eq!(option.flags, vec![WindowFlag::IsToast]);
    }
}
