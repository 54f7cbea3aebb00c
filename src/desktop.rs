//! Desktop entry rendering and lenient field extraction.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::engine::CommandSpec;

static NAME_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^Name=(.*)$").unwrap());
static KIOSK_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)Exec=.* --kiosk (.*)$").unwrap());
static ICON_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^Icon=(.*)$").unwrap());

/// A launcher descriptor ready to be written to `<id>.desktop`.
#[derive(Debug, Clone)]
pub struct DesktopEntry<'a> {
    pub name: &'a str,
    pub exec: &'a CommandSpec,
    pub icon: &'a str,
}

impl DesktopEntry<'_> {
    pub fn render(&self) -> String {
        format!(
            "[Desktop Entry]\n\
             Version=1.0\n\
             Type=Application\n\
             Name={name}\n\
             Comment=Launch {name}\n\
             Exec={exec}\n\
             Icon={icon}\n\
             Terminal=false\n\
             StartupNotify=true\n\
             Categories=Network;WebBrowser;\n",
            name = self.name,
            exec = self.exec.describe(),
            icon = self.icon,
        )
    }
}

/// Fields recovered from descriptor text. Each one is matched on its own line
/// and left `None` when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorFields {
    pub name: Option<String>,
    pub url: Option<String>,
    pub icon: Option<String>,
}

impl DescriptorFields {
    pub fn parse(content: &str) -> Self {
        Self {
            name: capture(&NAME_LINE, content),
            url: capture(&KIOSK_URL, content),
            icon: capture(&ICON_LINE, content),
        }
    }
}

pub fn icon_field(content: &str) -> Option<String> {
    capture(&ICON_LINE, content)
}

fn capture(pattern: &Regex, content: &str) -> Option<String> {
    pattern
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|value| value.as_str().trim_end_matches('\r').to_string())
}
