use std::{
    env,
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{Result, bail};

use crate::config::BrowserSettings;

/// Flag that puts the browser into single-window fullscreen mode.
pub const KIOSK_FLAG: &str = "--kiosk";

/// Materialised command specification ready to be spawned or rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    binary: PathBuf,
    args: Vec<String>,
}

impl CommandSpec {
    pub fn new(binary: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            args,
        }
    }

    pub fn binary(&self) -> &PathBuf {
        &self.binary
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.binary);
        command.args(&self.args);
        command
    }

    /// Render as a single shell-style line, as used by `Exec=`.
    pub fn describe(&self) -> String {
        if self.args.is_empty() {
            return self.binary.display().to_string();
        }
        format!("{} {}", self.binary.display(), self.args.join(" "))
    }
}

/// The single kiosk-capable browser launchers are generated for.
#[derive(Debug, Clone)]
pub struct KioskBrowser {
    config: BrowserSettings,
}

impl KioskBrowser {
    pub fn new(config: BrowserSettings) -> Self {
        Self { config }
    }

    pub fn label(&self) -> String {
        format!("Kiosk browser ({})", self.config.command)
    }

    /// Token that marks a descriptor as one of ours.
    pub fn token(&self) -> &str {
        &self.config.command
    }

    /// Build the launch command for a web app. The URL must stay the final
    /// argument: descriptor parsing reads everything after `--kiosk`.
    pub fn kiosk_command(&self, profile_dir: &Path, url: &str) -> CommandSpec {
        let args = vec![
            "--new-instance".into(),
            "--profile".into(),
            profile_dir.to_string_lossy().into_owned(),
            KIOSK_FLAG.into(),
            url.to_string(),
        ];
        CommandSpec::new(&self.config.command, args)
    }

    /// Substring check on raw descriptor text.
    pub fn recognizes(&self, content: &str) -> bool {
        content.contains(self.token()) && content.contains(KIOSK_FLAG)
    }

    pub fn locate_binary(&self) -> Result<PathBuf> {
        if let Some(path) = &self.config.binary_path {
            return Ok(path.clone());
        }
        if let Ok(path) = env::var("WEBAPP_LAUNCHER_BROWSER") {
            return Ok(PathBuf::from(path));
        }
        if let Ok(path) = which::which(&self.config.command) {
            return Ok(path);
        }
        bail!(
            "{} not found on PATH; set WEBAPP_LAUNCHER_BROWSER or configure browser.binary_path",
            self.config.command
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn firefox() -> KioskBrowser {
        KioskBrowser::new(BrowserSettings::default())
    }

    #[test]
    fn kiosk_command_keeps_url_last() {
        let command = firefox().kiosk_command(
            Path::new("/data/webapp-launcher/profiles/mytv"),
            "https://tv.example.com",
        );
        assert_eq!(
            command.describe(),
            "firefox --new-instance --profile /data/webapp-launcher/profiles/mytv --kiosk https://tv.example.com"
        );
        assert_eq!(
            command.args().last().map(String::as_str),
            Some("https://tv.example.com")
        );
    }

    #[test]
    fn recognizes_requires_both_tokens() {
        let browser = firefox();
        assert!(browser.recognizes("Exec=firefox --kiosk https://a.example"));
        assert!(!browser.recognizes("Exec=firefox https://a.example"));
        assert!(!browser.recognizes("Exec=chromium --kiosk https://a.example"));
    }

    #[test]
    fn configured_binary_path_wins() {
        let browser = KioskBrowser::new(BrowserSettings {
            command: "firefox".into(),
            binary_path: Some(PathBuf::from("/opt/firefox/firefox")),
        });
        assert_eq!(
            browser.locate_binary().unwrap(),
            PathBuf::from("/opt/firefox/firefox")
        );
    }

    #[test]
    fn label_names_configured_browser() {
        assert_eq!(firefox().label(), "Kiosk browser (firefox)");
        let browser = KioskBrowser::new(BrowserSettings {
            command: "librewolf".into(),
            binary_path: None,
        });
        assert_eq!(browser.label(), "Kiosk browser (librewolf)");
    }

    #[test]
    fn describe_without_args_is_binary_only() {
        let command = CommandSpec::new("touch", vec![]);
        assert_eq!(command.describe(), "touch");
    }
}
