use crate::error::WmResult;
use crate::geometry::Size;

use super::WindowRect;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayInfo {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    pub virtual_pixel_ratio: f32,
}

impl DisplayInfo {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Full bounds of the display with the origin at zero.
    pub fn bounds(&self) -> WindowRect {
        WindowRect::new(0, 0, self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FoldStatus {
    #[default]
    Unknown,
    Expand,
    Folded,
    HalfFold,
}

pub trait DisplayManager: Send + Sync {
    fn display_by_id(&self, id: u64) -> Option<DisplayInfo>;
    fn default_display(&self) -> Option<DisplayInfo>;
    /// Area of the display not covered by the crease on super-fold devices.
    fn visible_area_display(&self, id: u64) -> Option<DisplayInfo>;
    fn expand_available_area(&self, id: u64) -> WmResult<WindowRect>;
}
