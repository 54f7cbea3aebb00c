use std::{fs, path::Path};

use tempfile::tempdir;
use webapp_launcher::{
    WebAppManager,
    config::{BrowserSettings, LauncherSettings},
};

fn manager_for(root: &Path) -> WebAppManager {
    let settings = LauncherSettings {
        data_home: Some(root.to_path_buf()),
        refresh_caches: false,
        browser: BrowserSettings::default(),
        ..LauncherSettings::default()
    };
    WebAppManager::from_settings(settings).unwrap()
}

#[test]
fn install_list_uninstall_round_trip() {
    let temp = tempdir().unwrap();
    let manager = manager_for(temp.path());
    let registry = manager.registry();

    let icon_source = temp.path().join("tv.png");
    fs::write(&icon_source, [0x89, b'P', b'N', b'G']).unwrap();

    let installed = registry
        .install_launcher("My TV", "https://tv.example.com", Some(&icon_source))
        .unwrap();
    registry
        .install_launcher("Mail", "https://mail.example.com", None)
        .unwrap();

    let mut listed = registry.list_launchers().unwrap();
    listed.sort_by(|a, b| a.id.cmp(&b.id));
    let ids: Vec<&str> = listed.iter().map(|launcher| launcher.id.as_str()).collect();
    assert_eq!(ids, vec!["mail", "mytv"]);
    assert_eq!(listed[1], installed);

    assert!(registry.uninstall_launcher("mytv").unwrap());
    assert!(!installed.descriptor_path.exists());
    assert!(!installed.profile_path.exists());
    assert!(!Path::new(&installed.icon).exists());

    let remaining = registry.list_launchers().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "mail");
    assert_eq!(remaining[0].icon, "web-browser");

    assert!(!registry.uninstall_launcher("mytv").unwrap());
}

#[test]
fn foreign_desktop_entries_survive_and_stay_hidden() {
    let temp = tempdir().unwrap();
    let manager = manager_for(temp.path());
    let registry = manager.registry();

    let applications = &registry.paths().applications_dir;
    fs::create_dir_all(applications).unwrap();
    let foreign = applications.join("org.gnome.Maps.desktop");
    fs::write(
        &foreign,
        "[Desktop Entry]\nName=Maps\nExec=gnome-maps %U\nIcon=org.gnome.Maps\n",
    )
    .unwrap();

    registry
        .install_launcher("Maps Web", "https://maps.example.com", None)
        .unwrap();

    let listed = registry.list_launchers().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "mapsweb");

    assert!(registry.uninstall_launcher("mapsweb").unwrap());
    assert!(foreign.exists());
}
