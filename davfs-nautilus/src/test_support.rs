use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::mounts::{Clock, MountTableSource};
use crate::resolver::AttributeReader;

pub struct FakeTable {
    contents: Mutex<Option<Vec<u8>>>,
    reads: AtomicUsize,
}

impl FakeTable {
    pub fn with_contents(contents: &str) -> Arc<Self> {
        Arc::new(Self {
            contents: Mutex::new(Some(contents.as_bytes().to_vec())),
            reads: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            contents: Mutex::new(None),
            reads: AtomicUsize::new(0),
        })
    }

    pub fn set_contents(&self, contents: &str) {
        *self.contents.lock().unwrap() = Some(contents.as_bytes().to_vec());
    }

    pub fn fail(&self) {
        *self.contents.lock().unwrap() = None;
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl MountTableSource for FakeTable {
    fn read_table(&self) -> io::Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.contents
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::PermissionDenied, "mount table hidden"))
    }
}

/// Holds its first read until released, then serves `later` to every read.
pub struct GatedTable {
    gate: Mutex<Option<(Sender<()>, Receiver<()>)>>,
    first: Vec<u8>,
    later: Vec<u8>,
}

impl GatedTable {
    pub fn new(
        first: &str,
        later: &str,
        started: Sender<()>,
        release: Receiver<()>,
    ) -> Arc<Self> {
        Arc::new(Self {
            gate: Mutex::new(Some((started, release))),
            first: first.as_bytes().to_vec(),
            later: later.as_bytes().to_vec(),
        })
    }
}

impl MountTableSource for GatedTable {
    fn read_table(&self) -> io::Result<Vec<u8>> {
        let gate = self.gate.lock().unwrap().take();
        let Some((started, release)) = gate else {
            return Ok(self.later.clone());
        };
        started.send(()).unwrap();
        release.recv().unwrap();
        Ok(self.first.clone())
    }
}

/// Cycles through `tables`, one per read.
pub struct RotatingTable {
    tables: Vec<Vec<u8>>,
    reads: AtomicUsize,
}

impl RotatingTable {
    pub fn new(tables: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            tables: tables.iter().map(|table| table.as_bytes().to_vec()).collect(),
            reads: AtomicUsize::new(0),
        })
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl MountTableSource for RotatingTable {
    fn read_table(&self) -> io::Result<Vec<u8>> {
        let idx = self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.tables[idx % self.tables.len()].clone())
    }
}

pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        })
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap()
    }
}

#[derive(Default)]
pub struct FakeAttributes {
    values: Mutex<HashMap<PathBuf, Vec<u8>>>,
    reads: AtomicUsize,
}

impl FakeAttributes {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, path: &Path, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), value.as_bytes().to_vec());
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl AttributeReader for FakeAttributes {
    fn read_state_attr(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.values
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such attribute"))
    }
}

/// Mount table line for `root`, escaped the way the kernel writes it.
pub fn driver_mount_line(root: &Path) -> String {
    let escaped = root
        .to_string_lossy()
        .replace('\\', "\\134")
        .replace(' ', "\\040")
        .replace('\t', "\\011");
    format!("/dev/fuse {escaped} fuse.davfs-sync rw,nosuid,nodev 0 0\n")
}
