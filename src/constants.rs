//! Shared crate-wide constants.

/// Container id reported when no container scope is active on the thread.
pub const INSTANCE_ID_UNDEFINED: i32 = -1;

/// First container id handed out to service (ability-less) instances.
///
/// Ids at or above this value, as well as negative ids, have no UI container
/// of their own, so toast/dialog requests from them are routed to the
/// dedicated event loop of the subwindow.
pub const MIN_PA_SERVICE_ID: i32 = 100_000;

/// First container id handed out to sub containers (subwindow content).
///
/// A top-most toast requested from a sub container is still served by the
/// sub container itself, which is why the top-most service range stops here.
pub const MIN_SUBCONTAINER_ID: i32 = 1_000_000;

/// Id of the display used when a window does not report one.
pub const DEFAULT_DISPLAY_ID: u64 = 0;

/// Avoid-area option bit enabling system window avoid areas.
pub const ENABLE_SYSTEM_WINDOW_AVOID_AREA: u32 = 1;

/// Avoid-area option bit enabling app sub window avoid areas.
pub const ENABLE_APP_SUB_WINDOW_AVOID_AREA: u32 = 1 << 1;

/// Minimum platform version used by dialog pipelines without a parent.
pub const PLATFORM_VERSION_TEN: i32 = 10;

/// Node tag of the soft keyboard, the only root child that does not keep a
/// subwindow on screen.
pub const KEYBOARD_TAG: &str = "Keyboard";

/// Node tag of a menu that is already wrapped and can be shown directly.
pub const MENU_WRAPPER_TAG: &str = "MenuWrapper";

/// Prefix of every main subwindow name.
pub const SUBWINDOW_NAME_PREFIX: &str = "ARK_APP_SUBWINDOW_";

/// Prefix of every toast/dialog window created for service callers.
pub const TOAST_DIALOG_NAME_PREFIX: &str = "ARK_APP_SUBWINDOW_TOAST_DIALOG_";

/// Name of the dedicated toast/dialog event loop thread.
pub const TOAST_DIALOG_RUNNER_NAME: &str = "Subwindow_Toast_Dialog";
