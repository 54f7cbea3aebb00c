use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::config::{LauncherSettings, RegistryPaths};
use crate::desktop::{DescriptorFields, DesktopEntry, icon_field};
use crate::engine::KioskBrowser;
use crate::refresh::{CacheRefresh, NoopCacheRefresher, SystemCacheRefresher};

/// A web app launcher as recovered from its descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Launcher {
    pub id: String,
    pub name: String,
    pub url: String,
    pub icon: String,
    pub descriptor_path: PathBuf,
    pub profile_path: PathBuf,
}

/// Filesystem-backed registry of kiosk launchers.
///
/// Nothing is cached: the descriptor directory is the source of truth and is
/// rescanned on every [`LauncherRegistry::list_launchers`] call.
pub struct LauncherRegistry {
    paths: RegistryPaths,
    browser: KioskBrowser,
    fallback_icon: String,
    refresher: Box<dyn CacheRefresh>,
}

impl LauncherRegistry {
    pub fn new(
        paths: RegistryPaths,
        browser: KioskBrowser,
        fallback_icon: impl Into<String>,
        refresher: Box<dyn CacheRefresh>,
    ) -> Self {
        Self {
            paths,
            browser,
            fallback_icon: fallback_icon.into(),
            refresher,
        }
    }

    pub fn from_settings(settings: &LauncherSettings) -> Result<Self> {
        let paths = settings.resolve_paths()?;
        let refresher: Box<dyn CacheRefresh> = if settings.refresh_caches {
            Box::new(SystemCacheRefresher)
        } else {
            Box::new(NoopCacheRefresher)
        };
        Ok(Self::new(
            paths,
            KioskBrowser::new(settings.browser.clone()),
            settings.fallback_icon.clone(),
            refresher,
        ))
    }

    pub fn paths(&self) -> &RegistryPaths {
        &self.paths
    }

    pub fn browser(&self) -> &KioskBrowser {
        &self.browser
    }

    /// Enumerate every descriptor that launches the kiosk browser.
    pub fn list_launchers(&self) -> Result<Vec<Launcher>> {
        let dir = &self.paths.applications_dir;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(dir)
            .with_context(|| format!("Unable to read descriptor directory {}", dir.display()))?;
        let mut launchers = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| {
                format!("Unable to enumerate descriptor directory {}", dir.display())
            })?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("desktop") || !path.is_file()
            {
                continue;
            }
            let Some(id) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
            else {
                continue;
            };
            if validate_id(&id).is_err() {
                debug!(path = %path.display(), "skipping descriptor with unusable id");
                continue;
            }

            let content = read_descriptor(&path)?;
            if !self.browser.recognizes(&content) {
                continue;
            }

            let fields = DescriptorFields::parse(&content);
            launchers.push(Launcher {
                name: fields.name.unwrap_or_else(|| id.clone()),
                url: fields.url.unwrap_or_default(),
                icon: self.displayable_icon(fields.icon),
                profile_path: self.paths.profile_path(&id),
                descriptor_path: path,
                id,
            });
        }

        debug!(count = launchers.len(), dir = %dir.display(), "scanned descriptors");
        Ok(launchers)
    }

    /// Create (or overwrite) the launcher whose id derives from `name`.
    pub fn install_launcher(
        &self,
        name: &str,
        url: &str,
        icon_source: Option<&Path>,
    ) -> Result<Launcher> {
        for (field, value) in [("name", name), ("url", url)] {
            if value.chars().any(char::is_control) {
                bail!("Launcher {field} {value:?} contains control characters");
            }
        }

        let id = launcher_id(name);
        if id.is_empty() {
            bail!("Launcher name {name:?} contains no letters or digits");
        }

        let span = info_span!("registry.install", id = %id);
        let _span_guard = span.enter();

        for dir in [
            &self.paths.icon_dir,
            &self.paths.applications_dir,
            &self.paths.profile_root,
        ] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Unable to create directory {}", dir.display()))?;
        }

        let profile_path = self.paths.profile_path(&id);
        fs::create_dir_all(&profile_path).with_context(|| {
            format!("Unable to create profile directory {}", profile_path.display())
        })?;

        let descriptor_path = self.paths.descriptor_path(&id);
        let previous = if descriptor_path.exists() {
            warn!(path = %descriptor_path.display(), "overwriting launcher with the same id");
            Some(read_descriptor(&descriptor_path)?)
        } else {
            None
        };

        let icon = match icon_source.filter(|source| source.exists()) {
            Some(source) => self.stage_icon(&id, source)?.to_string_lossy().into_owned(),
            None => self.fallback_icon.clone(),
        };

        if let Some(previous) = previous {
            if icon_field(&previous).as_deref() != Some(icon.as_str()) {
                self.remove_managed_icon(&previous)?;
            }
        }

        let exec = self.browser.kiosk_command(&profile_path, url);
        let entry = DesktopEntry {
            name,
            exec: &exec,
            icon: &icon,
        };
        fs::write(&descriptor_path, entry.render()).with_context(|| {
            format!("Failed to write descriptor {}", descriptor_path.display())
        })?;
        mark_executable(&descriptor_path)?;

        info!(
            path = %descriptor_path.display(),
            profile = %profile_path.display(),
            icon = %icon,
            "installed web app launcher"
        );
        self.refresher.refresh(&self.paths);

        Ok(Launcher {
            id,
            name: name.to_string(),
            url: url.to_string(),
            icon,
            descriptor_path,
            profile_path,
        })
    }

    /// Remove a launcher's descriptor, managed icon and profile directory.
    /// Returns `false` without touching anything when no descriptor exists.
    pub fn uninstall_launcher(&self, id: &str) -> Result<bool> {
        validate_id(id)?;

        let descriptor_path = self.paths.descriptor_path(id);
        if !descriptor_path.exists() {
            debug!(id, path = %descriptor_path.display(), "no descriptor to uninstall");
            return Ok(false);
        }

        let span = info_span!("registry.uninstall", id = %id);
        let _span_guard = span.enter();

        let content = read_descriptor(&descriptor_path)?;
        self.remove_managed_icon(&content)?;

        let profile_path = self.paths.profile_path(id);
        if profile_path.exists() {
            fs::remove_dir_all(&profile_path).with_context(|| {
                format!("Failed to remove profile directory {}", profile_path.display())
            })?;
        }

        fs::remove_file(&descriptor_path).with_context(|| {
            format!("Failed to remove descriptor {}", descriptor_path.display())
        })?;

        info!(path = %descriptor_path.display(), "uninstalled web app launcher");
        self.refresher.refresh(&self.paths);
        Ok(true)
    }

    fn displayable_icon(&self, icon: Option<String>) -> String {
        match icon {
            None => String::new(),
            Some(icon) if Path::new(&icon).is_absolute() && !Path::new(&icon).exists() => {
                debug!(icon = %icon, "icon file missing; using fallback");
                self.fallback_icon.clone()
            }
            Some(icon) => icon,
        }
    }

    fn stage_icon(&self, id: &str, source: &Path) -> Result<PathBuf> {
        let file_name = match source.extension() {
            Some(ext) => format!("{id}.{}", ext.to_string_lossy()),
            None => id.to_string(),
        };
        let destination = self.paths.icon_dir.join(file_name);

        if same_file(source, &destination) {
            return Ok(destination);
        }
        fs::copy(source, &destination).with_context(|| {
            format!(
                "Failed to copy icon {} to {}",
                source.display(),
                destination.display()
            )
        })?;
        Ok(destination)
    }

    /// Delete the icon referenced by `descriptor` if it lives in the managed
    /// icon directory. Theme icon names and foreign paths are left alone.
    fn remove_managed_icon(&self, descriptor: &str) -> Result<()> {
        let Some(icon) = icon_field(descriptor) else {
            return Ok(());
        };
        let icon_path = Path::new(&icon);
        let Ok(relative) = icon_path.strip_prefix(&self.paths.icon_dir) else {
            return Ok(());
        };
        let contained = relative.components().next().is_some()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !contained {
            warn!(icon = %icon_path.display(), "icon path escapes the managed icon directory");
            return Ok(());
        }
        if icon_path.is_file() {
            fs::remove_file(icon_path)
                .with_context(|| format!("Failed to remove icon {}", icon_path.display()))?;
            debug!(icon = %icon_path.display(), "removed managed icon");
        }
        Ok(())
    }
}

/// Derive a launcher id: letters and digits of `name`, lower-cased.
pub fn launcher_id(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn validate_id(id: &str) -> Result<()> {
    let mut components = Path::new(id).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => bail!("Invalid launcher id {id:?}"),
    }
}

/// Read descriptor text. Desktop entries should be UTF-8, but legacy files in
/// other encodings are decoded lossily rather than failing the whole scan.
fn read_descriptor(path: &Path) -> Result<String> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read descriptor {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("Failed to mark {} executable", path.display()))
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> Result<()> {
    Ok(())
}
