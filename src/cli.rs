use std::{
    io::{self, IsTerminal},
    path::PathBuf,
};

use anyhow::{Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use dialoguer::{Confirm, theme::ColorfulTheme};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{DiagnosticsReport, Launcher, WebAppManager};

#[derive(Parser, Debug)]
#[command(name = "webapp-launcher", version, about = "Manage kiosk-mode web app launchers", long_about = None)]
pub struct Cli {
    /// Increase logging verbosity.
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    pub verbose: bool,

    /// Custom config path.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// List installed web apps (the default).
    List {
        /// Emit a JSON array instead of a table.
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
    /// Create a launcher that opens URL in kiosk mode.
    Add {
        /// Display name; the launcher id is derived from it.
        name: String,
        /// Address opened by the launcher.
        url: String,
        /// Image copied into the icon theme directory.
        #[arg(long, value_name = "FILE")]
        icon: Option<PathBuf>,
    },
    /// Remove a launcher with its icon and browser profile.
    Remove {
        /// Launcher id as shown by `list`.
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long, short = 'y', action = ArgAction::SetTrue)]
        yes: bool,
    },
    /// Show storage locations and external tool availability.
    Diagnostics,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "webapp_launcher=debug"
    } else {
        "webapp_launcher=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn render_launchers(launchers: &[Launcher]) -> String {
    if launchers.is_empty() {
        return "No web apps installed".into();
    }
    let id_width = launchers
        .iter()
        .map(|launcher| launcher.id.chars().count())
        .max()
        .unwrap_or(0);
    let mut lines = Vec::with_capacity(launchers.len() * 2);
    for launcher in launchers {
        lines.push(format!(
            "{:<id_width$}  {}  <{}>",
            launcher.id, launcher.name, launcher.url
        ));
        let icon = if launcher.icon.is_empty() {
            "(none)"
        } else {
            launcher.icon.as_str()
        };
        lines.push(format!("{:<id_width$}    icon: {icon}", ""));
    }
    lines.join("\n")
}

fn print_diagnostics(report: &DiagnosticsReport) {
    println!("Web app launcher diagnostics");
    match &report.config_path {
        Some(path) => println!("  Config      : {}", path.display()),
        None => println!("  Config      : (in-memory)"),
    }
    for location in &report.locations {
        let state = if location.exists { "" } else { "(missing) " };
        println!(
            "  {:<11} : {state}{}",
            location.label,
            location.path.display()
        );
    }
    match (&report.browser.binary, &report.browser.error) {
        (Some(path), _) => println!(
            "  Browser     : {} [{}] => {}",
            report.browser.label,
            report.browser.token,
            path.display()
        ),
        (None, Some(err)) => println!(
            "  Browser     : {} [{}] => (missing) {err}",
            report.browser.label, report.browser.token
        ),
        (None, None) => println!(
            "  Browser     : {} [{}] => (missing)",
            report.browser.label, report.browser.token
        ),
    }
    let refresh_state = if report.refresh_enabled {
        "enabled"
    } else {
        "disabled"
    };
    println!("  Cache refresh ({refresh_state}):");
    for tool in &report.refresh_tools {
        match &tool.binary {
            Some(path) => println!("    - {:<24} => {}", tool.name, path.display()),
            None => println!("    - {:<24} => (missing)", tool.name),
        }
    }
    println!("  Launchers   : {}", report.launcher_count);
}

fn confirm_removal(manager: &WebAppManager, id: &str) -> Result<bool> {
    if !(io::stdin().is_terminal() && io::stdout().is_terminal()) {
        bail!("refusing to remove {id} without --yes in a non-interactive session");
    }
    let known = manager
        .registry()
        .list_launchers()?
        .into_iter()
        .find(|launcher| launcher.id == id);
    let prompt = match &known {
        Some(launcher) => format!(
            "Uninstall {}? This removes the desktop entry, icon and profile for {}",
            launcher.name, launcher.url
        ),
        None => format!("Uninstall {id}?"),
    };
    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()?;
    Ok(confirmed)
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let manager = WebAppManager::bootstrap(cli.config.clone())?;
    let command = cli.command.unwrap_or(Command::List { json: false });

    match command {
        Command::List { json } => {
            let launchers = manager.registry().list_launchers()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&launchers)?);
            } else {
                println!("{}", render_launchers(&launchers));
            }
        }
        Command::Add { name, url, icon } => {
            let name = name.trim();
            let url = url.trim();
            if name.is_empty() || url.is_empty() {
                bail!("both a name and a URL are required");
            }
            let launcher = manager
                .registry()
                .install_launcher(name, url, icon.as_deref())?;
            println!(
                "Installed {} ({}) at {}",
                launcher.name,
                launcher.id,
                launcher.descriptor_path.display()
            );
        }
        Command::Remove { id, yes } => {
            if !yes && !confirm_removal(&manager, &id)? {
                info!(id = %id, "removal cancelled");
                println!("Cancelled.");
                return Ok(());
            }
            if manager.registry().uninstall_launcher(&id)? {
                println!("Removed {id}");
            } else {
                println!("No launcher named {id}");
            }
        }
        Command::Diagnostics => {
            let report = manager.diagnostics()?;
            print_diagnostics(&report);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_add_with_icon() {
        let cli = Cli::try_parse_from([
            "webapp-launcher",
            "add",
            "My TV",
            "https://tv.example.com",
            "--icon",
            "/tmp/tv.png",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Add {
                name: "My TV".into(),
                url: "https://tv.example.com".into(),
                icon: Some(PathBuf::from("/tmp/tv.png")),
            })
        );
    }

    #[test]
    fn parses_remove_with_global_flags() {
        let cli = Cli::try_parse_from(["webapp-launcher", "remove", "mytv", "-y", "--verbose"])
            .unwrap();
        assert!(cli.verbose);
        assert_eq!(
            cli.command,
            Some(Command::Remove {
                id: "mytv".into(),
                yes: true,
            })
        );
    }

    #[test]
    fn bare_invocation_has_no_subcommand() {
        let cli = Cli::try_parse_from(["webapp-launcher"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn render_empty_list() {
        assert_eq!(render_launchers(&[]), "No web apps installed");
    }

    #[test]
    fn render_aligns_ids() {
        let launchers = vec![
            Launcher {
                id: "mytv".into(),
                name: "My TV".into(),
                url: "https://tv.example.com".into(),
                icon: "web-browser".into(),
                descriptor_path: PathBuf::from("/d/mytv.desktop"),
                profile_path: PathBuf::from("/p/mytv"),
            },
            Launcher {
                id: "mail".into(),
                name: "Mail".into(),
                url: "https://mail.example.com".into(),
                icon: String::new(),
                descriptor_path: PathBuf::from("/d/mail.desktop"),
                profile_path: PathBuf::from("/p/mail"),
            },
        ];
        let rendered = render_launchers(&launchers);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "mytv  My TV  <https://tv.example.com>");
        assert_eq!(lines[1], "        icon: web-browser");
        assert_eq!(lines[2], "mail  Mail  <https://mail.example.com>");
        assert_eq!(lines[3], "        icon: (none)");
    }
}
