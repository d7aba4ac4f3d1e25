pub mod config;
pub mod mounts;
pub mod resolver;
mod xattr;

use std::path::{Path, PathBuf};

use davfs_integrations::ids::{MENU_ITEM_INFO, STATUS_ATTRIBUTE};
use davfs_integrations::{NoticeIcon, StatusIndicator, emblem_for_indicator};
use serde::Serialize;
use thiserror::Error;
use url::Url;

pub use config::StatusConfig;
pub use mounts::{Clock, MountFilter, MountPoint, MountRegistry, MountTableSource, ProcMounts};
pub use resolver::{AttributeReader, StatusResolver, XattrReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Cached,
    Cloud,
    Unknown,
    /// The path is not under any managed mount.
    NotApplicable,
}

impl SyncState {
    /// Maps a raw `user.davfs.state` value; anything but an exact token is `Unknown`.
    pub fn from_attr(value: &[u8]) -> Self {
        match value {
            b"cached" => Self::Cached,
            b"cloud" => Self::Cloud,
            _ => Self::Unknown,
        }
    }

    pub fn indicator(self) -> Option<StatusIndicator> {
        match self {
            Self::Cached => Some(StatusIndicator::Checkmark),
            Self::Cloud => Some(StatusIndicator::Cloud),
            Self::Unknown | Self::NotApplicable => None,
        }
    }

    pub fn label(self) -> Option<&'static str> {
        match self {
            Self::Cached => Some("WebDAV Directory (cached)"),
            Self::Cloud => Some("Available Online"),
            Self::Unknown | Self::NotApplicable => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileUiInfo {
    pub state: SyncState,
    pub emblem: &'static str,
    pub attribute: &'static str,
    pub label: &'static str,
}

impl FileUiInfo {
    /// Returns `None` for states that stay silent in the file manager.
    pub fn for_state(state: SyncState) -> Option<Self> {
        let indicator = state.indicator()?;
        let label = state.label()?;
        Some(Self {
            state,
            emblem: emblem_for_indicator(indicator),
            attribute: STATUS_ATTRIBUTE,
            label,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItemSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub tip: &'static str,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountNotice {
    pub title: &'static str,
    pub body: String,
    pub icon: &'static str,
    pub mount_point: Option<String>,
}

impl MountNotice {
    fn inside(mount_point: &MountPoint) -> Self {
        Self {
            title: "WebDAV Mount",
            body: format!(
                "File is in WebDAV mount at: {mount_point}\n\n\
                 Note: Files are NOT downloaded locally.\n\
                 This is a read-only online view."
            ),
            icon: NoticeIcon::RemoteFolder.icon_name(),
            mount_point: Some(mount_point.to_string()),
        }
    }

    fn outside() -> Self {
        Self {
            title: "WebDAV Mount",
            body: "File is not in a WebDAV mount".to_string(),
            icon: NoticeIcon::Information.icon_name(),
            mount_point: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("failed to read mount table {table}: {source}")]
    MountTable {
        table: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid uri: {0}")]
    InvalidUri(#[from] url::ParseError),
    #[error("not a local file uri (scheme {0})")]
    NotLocalFile(String),
    #[error("uri has no local path: {0}")]
    InvalidPath(String),
}

pub fn local_path_from_uri(uri: &str) -> Result<PathBuf, ExtensionError> {
    let url = Url::parse(uri)?;
    if url.scheme() != "file" {
        return Err(ExtensionError::NotLocalFile(url.scheme().to_string()));
    }
    url.to_file_path()
        .map_err(|_| ExtensionError::InvalidPath(uri.to_string()))
}

/// Entry point for a file-manager extension: turns paths and URIs into
/// emblems, labels, menu items and notices.
pub struct FileStatusProvider {
    resolver: StatusResolver,
}

impl FileStatusProvider {
    pub fn new(resolver: StatusResolver) -> Self {
        Self { resolver }
    }

    pub fn from_config(config: &StatusConfig) -> Self {
        Self::new(StatusResolver::new(MountRegistry::from_config(config)))
    }

    pub fn resolver(&self) -> &StatusResolver {
        &self.resolver
    }

    pub fn file_info_for_path(&self, path: &Path) -> Option<FileUiInfo> {
        FileUiInfo::for_state(self.resolver.resolve(path))
    }

    pub fn file_info_for_uri(&self, uri: &str) -> Result<Option<FileUiInfo>, ExtensionError> {
        let path = local_path_from_uri(uri)?;
        Ok(self.file_info_for_path(&path))
    }

    pub fn menu_for_selection(&self, paths: &[PathBuf]) -> Vec<MenuItemSpec> {
        let [path] = paths else {
            return Vec::new();
        };
        if !self.resolver.registry().is_contained(path) {
            return Vec::new();
        }
        vec![MenuItemSpec {
            id: MENU_ITEM_INFO,
            label: "WebDAV Info",
            tip: "Show WebDAV mount information",
            path: path.clone(),
        }]
    }

    pub fn mount_notice(&self, path: &Path) -> MountNotice {
        match self.resolver.registry().mount_point_for(path) {
            Some(mount_point) => MountNotice::inside(&mount_point),
            None => MountNotice::outside(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
