use std::{io::ErrorKind, process::Output};

use tracing::{debug, warn};

use crate::config::RegistryPaths;
use crate::engine::CommandSpec;

/// Tools invoked after every registry mutation, in order.
pub const REFRESH_TOOLS: [&str; 3] = ["update-desktop-database", "touch", "gtk-update-icon-cache"];

/// Seam for refreshing desktop environment caches after a mutation.
///
/// Implementations must not fail: a mutation is complete once the files are
/// written, whatever the caches do.
pub trait CacheRefresh {
    fn refresh(&self, paths: &RegistryPaths);
}

/// Runs the freedesktop cache updaters as child processes.
#[derive(Debug, Clone, Default)]
pub struct SystemCacheRefresher;

impl SystemCacheRefresher {
    pub fn commands(paths: &RegistryPaths) -> Vec<CommandSpec> {
        let applications = paths.applications_dir.to_string_lossy().into_owned();
        vec![
            CommandSpec::new(REFRESH_TOOLS[0], vec![applications.clone()]),
            CommandSpec::new(REFRESH_TOOLS[1], vec![applications]),
            CommandSpec::new(
                REFRESH_TOOLS[2],
                vec![
                    "--ignore-theme-index".into(),
                    paths.icon_theme_root.to_string_lossy().into_owned(),
                ],
            ),
        ]
    }
}

impl CacheRefresh for SystemCacheRefresher {
    fn refresh(&self, paths: &RegistryPaths) {
        for spec in Self::commands(paths) {
            run_best_effort(&spec);
        }
    }
}

/// Skips cache refresh entirely (`refresh_caches = false`).
#[derive(Debug, Clone, Default)]
pub struct NoopCacheRefresher;

impl CacheRefresh for NoopCacheRefresher {
    fn refresh(&self, _paths: &RegistryPaths) {
        debug!("cache refresh disabled");
    }
}

fn run_best_effort(spec: &CommandSpec) -> Option<Output> {
    let command_line = spec.describe();
    match spec.to_command().output() {
        Ok(output) if output.status.success() => {
            debug!(command = %command_line, "cache refresh step finished");
            Some(output)
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                command = %command_line,
                status = ?output.status.code(),
                stderr = %stderr.trim(),
                "cache refresh step failed"
            );
            Some(output)
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!(tool = %spec.binary().display(), "cache refresh tool not installed");
            None
        }
        Err(err) => {
            warn!(command = %command_line, error = %err, "failed to execute cache refresh step");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_target_managed_directories() {
        let paths = RegistryPaths::from_data_home("/data");
        let rendered: Vec<String> = SystemCacheRefresher::commands(&paths)
            .iter()
            .map(CommandSpec::describe)
            .collect();
        assert_eq!(
            rendered,
            vec![
                "update-desktop-database /data/applications".to_string(),
                "touch /data/applications".to_string(),
                "gtk-update-icon-cache --ignore-theme-index /data/icons".to_string(),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn failing_tool_is_swallowed() {
        let spec = CommandSpec::new("false", vec![]);
        let output = run_best_effort(&spec).expect("false should be runnable");
        assert!(!output.status.success());
    }

    #[test]
    fn missing_tool_is_swallowed() {
        let spec = CommandSpec::new("webapp-launcher-definitely-missing-tool", vec![]);
        assert!(run_best_effort(&spec).is_none());
    }
}
