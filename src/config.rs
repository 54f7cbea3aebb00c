use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};

/// Generic icon name written when no custom icon is available.
pub const DEFAULT_FALLBACK_ICON: &str = "web-browser";

/// Browser token used in generated `Exec=` lines.
pub const DEFAULT_BROWSER_COMMAND: &str = "firefox";

/// User configuration for the web app manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LauncherSettings {
    /// Optional override for the XDG data home that hosts icons, entries and profiles.
    #[serde(default)]
    pub data_home: Option<PathBuf>,
    #[serde(default)]
    pub browser: BrowserSettings,
    /// Icon name used when a launcher has no custom icon.
    #[serde(default = "LauncherSettings::default_fallback_icon")]
    pub fallback_icon: String,
    /// Run the desktop database and icon cache updaters after each change.
    #[serde(default = "bool_true")]
    pub refresh_caches: bool,
}

impl LauncherSettings {
    fn default_fallback_icon() -> String {
        DEFAULT_FALLBACK_ICON.into()
    }

    /// Load settings from disk, writing defaults if missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Unable to read config at {}", path.display()))?;
            let parsed: Self = serde_json::from_str(&raw)
                .with_context(|| format!("Malformed config at {}", path.display()))?;
            Ok(parsed)
        } else {
            let settings = Self::default();
            settings.save(path).with_context(|| {
                format!("Failed to write default config to {}", path.display())
            })?;
            Ok(settings)
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory {}", parent.display())
            })?;
        }
        let serialised = serde_json::to_string_pretty(self)?;
        fs::write(path, serialised)
            .with_context(|| format!("Failed to persist config to {}", path.display()))
    }

    /// Resolve the data home root (`$XDG_DATA_HOME` or `~/.local/share`).
    pub fn resolve_data_home(&self) -> Result<PathBuf> {
        if let Some(path) = &self.data_home {
            return Ok(path.clone());
        }
        let dirs = BaseDirs::new().context("Unable to resolve the user's home directory")?;
        Ok(dirs.data_dir().to_path_buf())
    }

    /// Resolve the three managed locations from the configured data home.
    pub fn resolve_paths(&self) -> Result<RegistryPaths> {
        Ok(RegistryPaths::from_data_home(self.resolve_data_home()?))
    }
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            data_home: None,
            browser: BrowserSettings::default(),
            fallback_icon: Self::default_fallback_icon(),
            refresh_caches: true,
        }
    }
}

fn bool_true() -> bool {
    true
}

/// Kiosk-capable browser configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSettings {
    /// Command written into descriptors and used to recognise managed entries.
    #[serde(default = "BrowserSettings::default_command")]
    pub command: String,
    /// Optional explicit binary path, only consulted by diagnostics.
    #[serde(default)]
    pub binary_path: Option<PathBuf>,
}

impl BrowserSettings {
    fn default_command() -> String {
        DEFAULT_BROWSER_COMMAND.into()
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            command: Self::default_command(),
            binary_path: None,
        }
    }
}

/// Well-known directories the registry reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryPaths {
    /// `<data-home>/icons/hicolor/scalable/apps`
    pub icon_dir: PathBuf,
    /// `<data-home>/icons`, handed to the icon cache updater.
    pub icon_theme_root: PathBuf,
    /// `<data-home>/applications`
    pub applications_dir: PathBuf,
    /// `<data-home>/webapp-launcher/profiles`
    pub profile_root: PathBuf,
}

impl RegistryPaths {
    pub fn from_data_home(data_home: impl AsRef<Path>) -> Self {
        let data_home = data_home.as_ref();
        let icon_theme_root = data_home.join("icons");
        Self {
            icon_dir: icon_theme_root.join("hicolor").join("scalable").join("apps"),
            icon_theme_root,
            applications_dir: data_home.join("applications"),
            profile_root: data_home.join("webapp-launcher").join("profiles"),
        }
    }

    pub fn descriptor_path(&self, id: &str) -> PathBuf {
        self.applications_dir.join(format!("{id}.desktop"))
    }

    pub fn profile_path(&self, id: &str) -> PathBuf {
        self.profile_root.join(id)
    }
}

/// Compute the default path to the configuration file.
pub fn default_config_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("org", "webapp-launcher", "WebAppLauncher")
        .context("Unable to resolve platform config directory")?;
    Ok(dirs.config_dir().join("config.json"))
}
