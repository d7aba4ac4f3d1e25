use std::io;
use std::path::Path;

use davfs_integrations::ids::XATTR_STATE;

use crate::SyncState;
use crate::mounts::{MountPoint, MountRegistry};
use crate::xattr;

pub trait AttributeReader: Send + Sync {
    /// Raw value of `user.davfs.state` for `path`, symlinks not followed.
    fn read_state_attr(&self, path: &Path) -> io::Result<Vec<u8>>;
}

impl<T: AttributeReader + ?Sized> AttributeReader for std::sync::Arc<T> {
    fn read_state_attr(&self, path: &Path) -> io::Result<Vec<u8>> {
        (**self).read_state_attr(path)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct XattrReader;

impl AttributeReader for XattrReader {
    fn read_state_attr(&self, path: &Path) -> io::Result<Vec<u8>> {
        xattr::read_nofollow(path, XATTR_STATE)
    }
}

pub struct StatusResolver {
    registry: MountRegistry,
    attributes: Box<dyn AttributeReader>,
}

impl StatusResolver {
    pub fn new(registry: MountRegistry) -> Self {
        Self {
            registry,
            attributes: Box::new(XattrReader),
        }
    }

    pub fn with_attribute_reader(mut self, attributes: impl AttributeReader + 'static) -> Self {
        self.attributes = Box::new(attributes);
        self
    }

    pub fn registry(&self) -> &MountRegistry {
        &self.registry
    }

    /// Never fails: paths outside every mount are `NotApplicable`, and an
    /// unreadable attribute falls back to [`heuristic_state`].
    pub fn resolve(&self, path: &Path) -> SyncState {
        self.resolve_with_mount(path).0
    }

    /// Like [`resolve`](Self::resolve), also returning the containing mount.
    /// Both come from the same registry snapshot.
    pub fn resolve_with_mount(&self, path: &Path) -> (SyncState, Option<MountPoint>) {
        let Some(mount_point) = self.registry.mount_point_for(path) else {
            return (SyncState::NotApplicable, None);
        };
        let state = self
            .attribute_state(path)
            .unwrap_or_else(|| heuristic_state(path));
        (state, Some(mount_point))
    }

    fn attribute_state(&self, path: &Path) -> Option<SyncState> {
        match self.attributes.read_state_attr(path) {
            Ok(value) => Some(SyncState::from_attr(&value)),
            Err(err) => {
                tracing::trace!(
                    path = %path.display(),
                    error = %err,
                    "state attribute unavailable, using heuristic"
                );
                None
            }
        }
    }
}

/// Directories count as cached, everything else (symlinks included) as
/// cloud. A path that cannot be stat'ed is assumed to be cloud.
pub fn heuristic_state(path: &Path) -> SyncState {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => SyncState::Cached,
        Ok(_) => SyncState::Cloud,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "stat failed, assuming cloud");
            SyncState::Cloud
        }
    }
}
