use std::sync::Arc;

use crate::config::{AppConfiguration, SystemProperties};
use crate::container::ContainerRegistry;
use crate::manager::SubwindowManager;
use crate::window::{DisplayManager, WindowService};

/// Services every subwindow talks to.
///
/// Handed to each coordinator at construction instead of being reached
/// through process-wide statics, so tests can wire in fakes.
#[derive(Clone)]
pub struct Platform {
    pub windows: Arc<dyn WindowService>,
    pub displays: Arc<dyn DisplayManager>,
    pub containers: Arc<dyn ContainerRegistry>,
    pub manager: Arc<SubwindowManager>,
    pub system: SystemProperties,
    /// Application-wide configuration; absent when running without an
    /// application context.
    pub app_configuration: Option<Arc<AppConfiguration>>,
}

impl Platform {
    pub fn new(
        windows: Arc<dyn WindowService>,
        displays: Arc<dyn DisplayManager>,
        containers: Arc<dyn ContainerRegistry>,
    ) -> Self {
        Self {
            windows,
            displays,
            containers,
            manager: Arc::new(SubwindowManager::new()),
            system: SystemProperties::default(),
            app_configuration: None,
        }
    }

    pub fn with_system_properties(mut self, system: SystemProperties) -> Self {
        self.system = system;
        self
    }

    pub fn with_app_configuration(mut self, config: AppConfiguration) -> Self {
        self.app_configuration = Some(Arc::new(config));
        self
    }
}
