//! In-memory backend for the window service, containers and pipelines.
//!
//! Every collaborator records the calls it receives into one shared
//! [`Recorder`], so the simulator binary and the tests can assert on the
//! exact sequence of window and overlay operations a subwindow performs.

use std::sync::Arc;

use crate::config::{AppConfiguration, SystemProperties};
use crate::executor::TaskExecutor;
use crate::pipeline::PipelineKind;
use crate::platform::Platform;
use crate::window::{DisplayInfo, Window, WindowOption, WindowRect, WindowType};

mod container;
mod executor;
mod pipeline;
mod recorder;
mod window;

pub use container::{ContainerFlags, MemoryContainer, MemoryContainerRegistry, RecordingFrontend};
pub use executor::{InlineExecutor, QueuedExecutor};
pub use pipeline::{
    DIALOG_TAG, MENU_TAG, MemoryPipeline, NodeIds, POPUP_TAG, PipelineSpec, RecordingOverlayManager,
    RecordingStack, RootElement, TOAST_TAG,
};
pub use recorder::{Recorder, SimEvent};
pub use window::{MemoryDisplayManager, MemoryWindow, MemoryWindowService};

/// Display used when none is given: a portrait phone panel.
pub const DEFAULT_DISPLAY: DisplayInfo = DisplayInfo {
    id: 0,
    width: 1080,
    height: 2340,
    virtual_pixel_ratio: 3.0,
};

/// Parent container to register with [`SimBackend::add_parent`].
#[derive(Clone)]
pub struct ParentSpec {
    pub id: i32,
    pub window_type: WindowType,
    pub pipeline_kind: PipelineKind,
    pub rect: Option<WindowRect>,
    pub flags: ContainerFlags,
    pub executor: Option<Arc<dyn TaskExecutor>>,
}

impl ParentSpec {
    pub fn new(id: i32) -> Self {
        Self {
            id,
            window_type: WindowType::AppMainWindow,
            pipeline_kind: PipelineKind::NextGen,
            rect: None,
            flags: ContainerFlags::default(),
            executor: None,
        }
    }

    pub fn window_type(mut self, window_type: WindowType) -> Self {
        self.window_type = window_type;
        self
    }

    pub fn legacy(mut self) -> Self {
        self.pipeline_kind = PipelineKind::Legacy;
        self
    }

    pub fn rect(mut self, rect: WindowRect) -> Self {
        self.rect = Some(rect);
        self
    }

    pub fn flags(mut self, update: impl FnOnce(&mut ContainerFlags)) -> Self {
        update(&mut self.flags);
        self
    }

    pub fn executor(mut self, executor: Arc<dyn TaskExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }
}

/// Wires the in-memory services into a [`Platform`].
pub struct SimBackend {
    pub recorder: Recorder,
    pub windows: Arc<MemoryWindowService>,
    pub displays: Arc<MemoryDisplayManager>,
    pub containers: Arc<MemoryContainerRegistry>,
    ids: NodeIds,
    display: DisplayInfo,
    platform: Platform,
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBackend {
    pub fn new() -> Self {
        Self::with_display(DEFAULT_DISPLAY)
    }

    pub fn with_display(display: DisplayInfo) -> Self {
        let recorder = Recorder::new();
        let ids = NodeIds::default();
        let windows = Arc::new(MemoryWindowService::new(recorder.clone()));
        let displays = Arc::new(MemoryDisplayManager::new(display));
        let containers = Arc::new(MemoryContainerRegistry::new(
            recorder.clone(),
            Arc::clone(&windows),
            ids.clone(),
            f64::from(display.virtual_pixel_ratio),
        ));
        let platform = Platform::new(
            Arc::clone(&windows) as _,
            Arc::clone(&displays) as _,
            Arc::clone(&containers) as _,
        );
        Self {
            recorder,
            windows,
            displays,
            containers,
            ids,
            display,
            platform,
        }
    }

    pub fn with_system_properties(mut self, system: SystemProperties) -> Self {
        self.platform.system = system;
        self
    }

    pub fn with_app_configuration(mut self, config: AppConfiguration) -> Self {
        self.platform.app_configuration = Some(Arc::new(config));
        self
    }

    /// Services shared by every subwindow created against this backend.
    pub fn platform(&self) -> Platform {
        self.platform.clone()
    }

    /// Creates the main window of a parent container and registers the
    /// container under `spec.id`.
    pub fn add_parent(&self, spec: ParentSpec) -> Arc<MemoryContainer> {
        let rect = spec.rect.unwrap_or_else(|| self.display.bounds());
        let mut option = WindowOption::new(spec.window_type);
        option.rect = rect;
        option.display_id = spec.flags.display_id;
        let window = self
            .windows
            .add_existing(&format!("main_window_{}", spec.id), option);
        let pipeline = Arc::new(MemoryPipeline::new(
            spec.id,
            PipelineSpec {
                kind: spec.pipeline_kind,
                window_id: window.window_id(),
                density: f64::from(self.display.virtual_pixel_ratio),
                display_window_rect: rect,
            },
            self.recorder.clone(),
            self.ids.clone(),
        ));
        let executor = spec
            .executor
            .unwrap_or_else(|| Arc::new(InlineExecutor) as Arc<dyn TaskExecutor>);
        let container = Arc::new(MemoryContainer::new(
            spec.id,
            window,
            pipeline,
            executor,
            self.recorder.clone(),
        ));
        container.update_flags(|flags| *flags = spec.flags);
        self.containers.insert(Arc::clone(&container));
        container
    }

    /// Main window created by [`SimBackend::add_parent`].
    pub fn parent_window(&self, parent_id: i32) -> Option<Arc<MemoryWindow>> {
        self.windows.window_by_name(&format!("main_window_{parent_id}"))
    }
}
