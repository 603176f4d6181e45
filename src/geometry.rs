//! Logical geometry used by callers of the coordinator.
//!
//! OS-level rectangles live in [`crate::window::WindowRect`]; the types here
//! are the logical (floating point) values produced by layout.

use std::fmt;

use crate::window::WindowRect;

/// Logical rectangle in layout units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect (x:{:.2}, y:{:.2}) - [{:.2} x {:.2}]",
            self.x, self.y, self.width, self.height
        )
    }
}

impl From<WindowRect> for Rect {
    fn from(rect: WindowRect) -> Self {
        Self::new(
            rect.pos_x as f64,
            rect.pos_y as f64,
            rect.width as f64,
            rect.height as f64,
        )
    }
}

/// Rectangle used by the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectF {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl From<WindowRect> for RectF {
    fn from(rect: WindowRect) -> Self {
        Self::new(
            rect.pos_x as f32,
            rect.pos_y as f32,
            rect.width as f32,
            rect.height as f32,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OffsetF {
    pub x: f32,
    pub y: f32,
}

impl OffsetF {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} x {}]", self.width, self.height)
    }
}

/// One inset band (start/end) along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InsetBand {
    pub start: u32,
    pub end: u32,
}

/// Insets reported by the window service for one avoid-area type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SafeAreaInsets {
    pub left: InsetBand,
    pub top: InsetBand,
    pub right: InsetBand,
    pub bottom: InsetBand,
}

impl SafeAreaInsets {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_validity_requires_positive_size() {
        assert!(Rect::new(0.0, 0.0, 1.0, 1.0).is_valid());
        assert!(!Rect::new(10.0, 10.0, 0.0, 5.0).is_valid());
        assert!(!Rect::new(10.0, 10.0, 5.0, -1.0).is_valid());
    }

    #[test]
    fn window_rect_to_logical() {
        let rect = Rect::from(WindowRect::new(-4, 8, 100, 200));
        assert_eq!(rect, Rect::new(-4.0, 8.0, 100.0, 200.0));
        let rectf = RectF::from(WindowRect::new(1, 2, 3, 4));
        assert_eq!(rectf, RectF::new(1.0, 2.0, 3.0, 4.0));
    }
}
