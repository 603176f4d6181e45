//! Coordinator for application subwindows: the secondary OS windows that
//! host popups, menus, dialogs, toasts and overlays above a parent window.
//!
//! The OS window service, containers and pipelines are reached through the
//! traits in [`window`], [`container`] and [`pipeline`]; [`sim`] provides an
//! in-memory implementation of all of them.

pub mod config;
pub mod constants;
pub mod container;
pub mod error;
pub mod event_loop;
pub mod executor;
pub mod frontend;
pub mod geometry;
pub mod manager;
pub mod overlay;
pub mod pipeline;
pub mod platform;
pub mod sim;
pub mod subwindow;
pub mod tracing_sub;
pub mod window;

pub use error::{ConfigError, InitError, WmError, WmResult};
pub use platform::Platform;
pub use subwindow::Subwindow;
