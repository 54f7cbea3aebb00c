pub mod cli;
pub mod config;
pub mod desktop;
pub mod engine;
pub mod refresh;
pub mod registry;

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use crate::config::{LauncherSettings, default_config_path};
use crate::refresh::REFRESH_TOOLS;
pub use crate::registry::{Launcher, LauncherRegistry, launcher_id};

/// Entry point tying user settings to the launcher registry.
pub struct WebAppManager {
    settings: LauncherSettings,
    config_path: Option<PathBuf>,
    registry: LauncherRegistry,
}

impl WebAppManager {
    /// Construct a manager using explicit settings.
    pub fn from_settings(settings: LauncherSettings) -> Result<Self> {
        let registry = LauncherRegistry::from_settings(&settings)?;
        Ok(Self {
            settings,
            config_path: None,
            registry,
        })
    }

    /// Load configuration from the default path (or an override) and build the registry.
    pub fn bootstrap(config_path_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_path_override {
            Some(path) => path,
            None => default_config_path()?,
        };
        let settings = LauncherSettings::load_or_default(&config_path)?;
        info!(path = %config_path.display(), "loaded launcher config");

        let mut manager = Self::from_settings(settings)?;
        manager.config_path = Some(config_path);
        Ok(manager)
    }

    pub fn settings(&self) -> &LauncherSettings {
        &self.settings
    }

    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config_path.as_ref()
    }

    pub fn registry(&self) -> &LauncherRegistry {
        &self.registry
    }

    /// Produce a diagnostics report without mutating anything on disk.
    pub fn diagnostics(&self) -> Result<DiagnosticsReport> {
        let paths = self.registry.paths();
        let locations = [
            ("descriptors", &paths.applications_dir),
            ("icons", &paths.icon_dir),
            ("profiles", &paths.profile_root),
        ]
        .into_iter()
        .map(|(label, path)| LocationHealth {
            label,
            path: path.clone(),
            exists: path.is_dir(),
        })
        .collect();

        let browser = self.registry.browser();
        let browser = match browser.locate_binary() {
            Ok(path) => BrowserHealth {
                label: browser.label(),
                token: browser.token().to_string(),
                binary: Some(path),
                error: None,
            },
            Err(err) => BrowserHealth {
                label: browser.label(),
                token: browser.token().to_string(),
                binary: None,
                error: Some(err.to_string()),
            },
        };

        let refresh_tools = REFRESH_TOOLS
            .into_iter()
            .map(|tool| ToolHealth {
                name: tool,
                binary: which::which(tool).ok(),
            })
            .collect();

        Ok(DiagnosticsReport {
            config_path: self.config_path.clone(),
            locations,
            browser,
            refresh_enabled: self.settings.refresh_caches,
            refresh_tools,
            launcher_count: self.registry.list_launchers()?.len(),
        })
    }
}

/// Summary of the environment the registry operates in.
#[derive(Debug, Clone)]
pub struct DiagnosticsReport {
    pub config_path: Option<PathBuf>,
    pub locations: Vec<LocationHealth>,
    pub browser: BrowserHealth,
    pub refresh_enabled: bool,
    pub refresh_tools: Vec<ToolHealth>,
    pub launcher_count: usize,
}

#[derive(Debug, Clone)]
pub struct LocationHealth {
    pub label: &'static str,
    pub path: PathBuf,
    pub exists: bool,
}

#[derive(Debug, Clone)]
pub struct BrowserHealth {
    pub label: String,
    pub token: String,
    pub binary: Option<PathBuf>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ToolHealth {
    pub name: &'static str,
    pub binary: Option<PathBuf>,
}
