use std::path::{Path, PathBuf};

use anyhow::Result;
use davfs_nautilus::{FileStatusProvider, FileUiInfo, StatusConfig, SyncState};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct PathReport {
    pub path: String,
    pub state: SyncState,
    pub mount_point: Option<String>,
    pub label: Option<&'static str>,
    pub emblem: Option<&'static str>,
}

impl PathReport {
    pub fn collect(provider: &FileStatusProvider, path: &Path) -> Self {
        let (state, mount_point) = provider.resolver().resolve_with_mount(path);
        let info = FileUiInfo::for_state(state);
        Self {
            path: path.display().to_string(),
            state,
            mount_point: mount_point.map(|mount_point| mount_point.to_string()),
            label: info.as_ref().map(|info| info.label),
            emblem: info.as_ref().map(|info| info.emblem),
        }
    }
}

pub fn print_path_reports(provider: &FileStatusProvider, paths: &[PathBuf]) -> Result<()> {
    let reports: Vec<PathReport> = paths
        .iter()
        .map(|path| PathReport::collect(provider, path))
        .collect();
    print_json(&reports)
}

pub fn print_mount_points(provider: &FileStatusProvider) -> Result<()> {
    let points: Vec<String> = provider
        .resolver()
        .registry()
        .mount_points()
        .iter()
        .map(ToString::to_string)
        .collect();
    print_json(&points)
}

pub fn print_mount_notice(provider: &FileStatusProvider, path: &Path) -> Result<()> {
    print_json(&provider.mount_notice(path))
}

pub fn print_settings(config: &StatusConfig) -> Result<()> {
    print_json(config)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
