use std::ffi::OsString;
use std::fmt;
use std::io;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use davfs_integrations::ids::{DEFAULT_MOUNT_TABLE, DRIVER_NAME};
use serde::Serialize;

use crate::{ExtensionError, StatusConfig};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Root of a network-backed mount, exactly as listed in the mount table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MountPoint(PathBuf);

impl MountPoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Plain byte-prefix test; `..`, symlinks and separators are not normalized.
    pub fn prefixes(&self, path: &Path) -> bool {
        path.as_os_str()
            .as_bytes()
            .starts_with(self.0.as_os_str().as_bytes())
    }
}

impl fmt::Display for MountPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MountFilter {
    /// Only mounts whose device or type field names the sync driver.
    #[default]
    DriverOnly,
    /// Any FUSE mount, in addition to the driver's own.
    AnyFuse,
}

impl MountFilter {
    pub fn accepts(self, device: &str, fs_type: &str) -> bool {
        if device.contains(DRIVER_NAME) || fs_type.contains(DRIVER_NAME) {
            return true;
        }
        match self {
            Self::DriverOnly => false,
            Self::AnyFuse => {
                fs_type == "fuse" || fs_type == "fuseblk" || fs_type.starts_with("fuse.")
            }
        }
    }
}

pub trait MountTableSource: Send + Sync {
    fn read_table(&self) -> io::Result<Vec<u8>>;

    fn describe(&self) -> String {
        "mount table".to_string()
    }
}

impl<T: MountTableSource + ?Sized> MountTableSource for Arc<T> {
    fn read_table(&self) -> io::Result<Vec<u8>> {
        (**self).read_table()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

#[derive(Debug, Clone)]
pub struct ProcMounts {
    path: PathBuf,
}

impl ProcMounts {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for ProcMounts {
    fn default() -> Self {
        Self::new(DEFAULT_MOUNT_TABLE)
    }
}

impl MountTableSource for ProcMounts {
    fn read_table(&self) -> io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Decodes the `\NNN` octal escapes the kernel uses for whitespace and
/// backslashes in mount table fields. Malformed escapes are kept as-is.
pub fn decode_octal_escapes(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut idx = 0;
    while idx < raw.len() {
        if raw[idx] == b'\\'
            && let Some(byte) = raw.get(idx + 1..idx + 4).and_then(parse_octal_triplet)
        {
            out.push(byte);
            idx += 4;
            continue;
        }
        out.push(raw[idx]);
        idx += 1;
    }
    out
}

fn parse_octal_triplet(digits: &[u8]) -> Option<u8> {
    let mut value: u16 = 0;
    for digit in digits {
        if !(b'0'..=b'7').contains(digit) {
            return None;
        }
        value = value * 8 + u16::from(digit - b'0');
    }
    u8::try_from(value).ok()
}

pub fn parse_mount_table(contents: &[u8], filter: MountFilter) -> Vec<MountPoint> {
    contents
        .split(|byte| *byte == b'\n')
        .filter_map(|line| {
            let mut fields = line
                .split(|byte| byte.is_ascii_whitespace())
                .filter(|field| !field.is_empty());
            let device = fields.next()?;
            let mount_path = fields.next()?;
            let fs_type = fields.next()?;
            let accepted = filter.accepts(
                &String::from_utf8_lossy(device),
                &String::from_utf8_lossy(fs_type),
            );
            accepted.then(|| {
                let decoded = OsString::from_vec(decode_octal_escapes(mount_path));
                MountPoint::new(decoded)
            })
        })
        .collect()
}

struct Snapshot {
    generation: u64,
    points: Arc<[MountPoint]>,
}

#[derive(Default)]
struct RefreshClaim {
    at: Option<Instant>,
    generation: u64,
}

/// Time-bounded cache of the sync driver's mount points.
///
/// Readers always see a snapshot from one complete discovery pass: a refresh
/// builds a new list and swaps the shared `Arc` in a single write. Each
/// refresh claims a generation up front; a pass that finishes after a newer
/// one has been installed is dropped.
pub struct MountRegistry {
    source: Box<dyn MountTableSource>,
    clock: Box<dyn Clock>,
    filter: MountFilter,
    refresh_interval: Duration,
    snapshot: RwLock<Snapshot>,
    last_refresh: Mutex<RefreshClaim>,
}

impl MountRegistry {
    pub fn new(source: impl MountTableSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            clock: Box::new(SystemClock),
            filter: MountFilter::default(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            snapshot: RwLock::new(Snapshot {
                generation: 0,
                points: Arc::from(Vec::new()),
            }),
            last_refresh: Mutex::new(RefreshClaim::default()),
        }
    }

    pub fn from_config(config: &StatusConfig) -> Self {
        Self::new(ProcMounts::new(config.mount_table.clone()))
            .with_filter(config.mount_filter)
            .with_refresh_interval(config.refresh_interval())
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_filter(mut self, filter: MountFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_refresh_interval(mut self, refresh_interval: Duration) -> Self {
        self.refresh_interval = refresh_interval;
        self
    }

    pub fn mount_points(&self) -> Arc<[MountPoint]> {
        self.refresh_if_stale();
        self.snapshot()
    }

    pub fn is_contained(&self, path: &Path) -> bool {
        let points = self.mount_points();
        if points.is_empty() {
            return false;
        }
        points.iter().any(|mount_point| mount_point.prefixes(path))
    }

    pub fn mount_point_for(&self, path: &Path) -> Option<MountPoint> {
        self.mount_points()
            .iter()
            .find(|mount_point| mount_point.prefixes(path))
            .cloned()
    }

    /// Re-reads the mount table when the cached list is older than the
    /// refresh interval. Returns whether a read was attempted.
    ///
    /// A failed read keeps the previous list and still counts as a refresh,
    /// so a broken table is retried at most once per interval.
    pub fn refresh_if_stale(&self) -> bool {
        let now = self.clock.now();
        let generation = {
            let mut claim = self
                .last_refresh
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(previous) = claim.at
                && now.saturating_duration_since(previous) <= self.refresh_interval
            {
                return false;
            }
            claim.at = Some(now);
            claim.generation += 1;
            claim.generation
        };

        match self.discover() {
            Ok(points) => self.install(generation, points),
            Err(err) => {
                tracing::warn!(error = %err, "keeping previous mount points");
            }
        }
        true
    }

    fn install(&self, generation: u64, points: Vec<MountPoint>) {
        let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        if generation <= snapshot.generation {
            tracing::debug!(
                generation,
                installed = snapshot.generation,
                "dropping mount points from an outdated refresh"
            );
            return;
        }
        tracing::debug!(generation, count = points.len(), "mount points refreshed");
        *snapshot = Snapshot {
            generation,
            points: points.into(),
        };
    }

    fn discover(&self) -> Result<Vec<MountPoint>, ExtensionError> {
        let contents = self
            .source
            .read_table()
            .map_err(|source| ExtensionError::MountTable {
                table: self.source.describe(),
                source,
            })?;
        Ok(parse_mount_table(&contents, self.filter))
    }

    fn snapshot(&self) -> Arc<[MountPoint]> {
        let guard = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard.points)
    }
}
