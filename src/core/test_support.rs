//! Shared fakes for the unit tests under `core`.

use crate::core::{ConfigProvider, Storage};
use crate::domain::ports::SourceReader;
use crate::utils::error::{EtlError, Result};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Yields `fail_at` bytes of `data`, then fails like a dropped connection.
pub struct InterruptedReader {
    data: Vec<u8>,
    position: usize,
    fail_at: usize,
}

impl InterruptedReader {
    pub fn new(data: Vec<u8>, fail_at: usize) -> Self {
        Self {
            data,
            position: 0,
            fail_at,
        }
    }
}

impl Read for InterruptedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let limit = self.fail_at.min(self.data.len());
        if self.position >= limit {
            return Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "source stream interrupted",
            ));
        }
        let n = buf.len().min(limit - self.position);
        buf[..n].copy_from_slice(&self.data[self.position..self.position + n]);
        self.position += n;
        Ok(n)
    }
}

/// Blocks inside `read` until its sender is used or dropped, like a source
/// whose writer went silent.
pub struct StalledReader {
    release: Receiver<()>,
}

impl Read for StalledReader {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
        let _ = self.release.recv();
        Err(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "source stalled",
        ))
    }
}

#[derive(Clone)]
enum MockFile {
    Complete(Vec<u8>),
    Interrupted(Vec<u8>, usize),
    Stalled(Arc<Mutex<Option<Receiver<()>>>>),
}

#[derive(Clone, Default)]
pub struct MockStorage {
    files: Arc<Mutex<HashMap<String, MockFile>>>,
    opens: Arc<AtomicUsize>,
    gate: Option<Arc<Semaphore>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `open` waits for one permit from `gate`.
    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn insert(&self, path: &str, data: Vec<u8>) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), MockFile::Complete(data));
    }

    pub fn insert_interrupted(&self, path: &str, data: Vec<u8>, fail_at: usize) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), MockFile::Interrupted(data, fail_at));
    }

    /// The next `open` of `path` returns a [`StalledReader`]. Dropping the
    /// returned sender unblocks it.
    pub fn insert_stalled(&self, path: &str) -> Sender<()> {
        let (release, receiver) = mpsc::channel();
        self.files.lock().unwrap().insert(
            path.to_string(),
            MockFile::Stalled(Arc::new(Mutex::new(Some(receiver)))),
        );
        release
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl Storage for MockStorage {
    async fn open(&self, path: &str) -> Result<SourceReader> {
        self.opens.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|_| EtlError::source(path, "gate closed"))?
                .forget();
        }

        let file = self.files.lock().unwrap().get(path).cloned();
        match file {
            Some(MockFile::Complete(data)) => Ok(Box::new(Cursor::new(data))),
            Some(MockFile::Interrupted(data, fail_at)) => {
                Ok(Box::new(InterruptedReader::new(data, fail_at)))
            }
            Some(MockFile::Stalled(receiver)) => match receiver.lock().unwrap().take() {
                Some(release) => Ok(Box::new(StalledReader { release })),
                None => Err(EtlError::source(path, "stalled source already opened")),
            },
            None => Err(EtlError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", path),
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockConfig {
    pub source_path: String,
    pub interval: Duration,
    pub max_run: Duration,
    pub run_on_start: bool,
    pub default_page_size: u64,
    pub max_page_size: u64,
}

impl MockConfig {
    pub fn new(source_path: &str) -> Self {
        Self {
            source_path: source_path.to_string(),
            interval: Duration::from_secs(60),
            max_run: Duration::from_secs(5),
            run_on_start: true,
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl ConfigProvider for MockConfig {
    fn source_path(&self) -> &str {
        &self.source_path
    }

    fn schedule_interval(&self) -> Duration {
        self.interval
    }

    fn max_run_duration(&self) -> Duration {
        self.max_run
    }

    fn run_on_start(&self) -> bool {
        self.run_on_start
    }

    fn default_page_size(&self) -> u64 {
        self.default_page_size
    }

    fn max_page_size(&self) -> u64 {
        self.max_page_size
    }
}
