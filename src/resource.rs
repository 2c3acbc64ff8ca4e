use polars::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::RTVError;

#[derive(Debug)]
enum FileType {
    CSV,
    PARQUET,
    ARROW,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Success,
    Error,
}

pub enum ResourceUrl {
    Static(String),
    Dynamic(fn() -> Option<String>),
}

impl ResourceUrl {
    pub fn resolve(&self) -> Option<String> {
        match self {
            ResourceUrl::Static(url) => Some(url.clone()),
            ResourceUrl::Dynamic(url) => url(),
        }
    }
}

/// Where a resource lives and how its raw frame becomes rows.
pub struct ResourceDef<T> {
    pub url: ResourceUrl,
    pub parse: fn(DataFrame) -> Result<Vec<T>, RTVError>,
}

impl<T> ResourceDef<T> {
    pub fn new(url: impl Into<String>, parse: fn(DataFrame) -> Result<Vec<T>, RTVError>) -> Self {
        Self {
            url: ResourceUrl::Static(url.into()),
            parse,
        }
    }
}

fn detect_file_type(path: &Path) -> Result<FileType, RTVError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(FileType::CSV),
        Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
        _ => Err(RTVError::UnknownFileType),
    }
}

fn check_file(path: &Path) -> Result<(), RTVError> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => RTVError::FileNotFound,
        ErrorKind::PermissionDenied => RTVError::PermissionDenied,
        _ => RTVError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(RTVError::LoadingFailed("Not a file!".into()));
    }
    Ok(())
}

/// Expands `~` and environment variables in a user supplied path.
pub fn expand_path(url: &str) -> Result<PathBuf, RTVError> {
    shellexpand::full(url)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| RTVError::LoadingFailed(e.to_string()))
}

/// Lazily scans the file behind `url`, picking the reader by extension.
pub fn scan_frame(url: &str) -> Result<LazyFrame, RTVError> {
    let path = expand_path(url)?;
    check_file(&path)?;
    let frame = match detect_file_type(&path)? {
        FileType::CSV => LazyCsvReader::new(PlPath::Local(path.as_path().into()))
            .with_has_header(true)
            .finish()?,
        FileType::PARQUET => LazyFrame::scan_parquet(
            PlPath::Local(path.as_path().into()),
            ScanArgsParquet::default(),
        )?,
        FileType::ARROW => LazyFrame::scan_ipc(
            PlPath::Local(path.as_path().into()),
            polars::io::ipc::IpcScanOptions,
            UnifiedScanArgs::default(),
        )?,
    };
    Ok(frame)
}

/// Loads and parses a resource, returning the resolved url together with
/// the rows so the caller can seed a store with them.
pub fn fetch_resource_data<T>(def: &ResourceDef<T>) -> Result<(String, Vec<T>), RTVError> {
    let url = def.url.resolve().ok_or(RTVError::UnresolvedUrl)?;
    let start_time = Instant::now();
    let df = scan_frame(&url)?.collect()?;
    let data = (def.parse)(df)?;
    info!(
        "Loaded {} rows from {url} in {}ms",
        data.len(),
        start_time.elapsed().as_millis()
    );
    Ok((url, data))
}

/// Url keyed cache of loaded row snapshots.
pub struct ResourceStore<T> {
    entries: HashMap<String, Arc<Vec<T>>>,
}

impl<T> Default for ResourceStore<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> ResourceStore<T> {
    pub fn get(&self, url: &str) -> Option<Arc<Vec<T>>> {
        self.entries.get(url).cloned()
    }

    pub fn insert(&mut self, url: impl Into<String>, data: Arc<Vec<T>>) {
        self.entries.insert(url.into(), data);
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    pub fn invalidate(&mut self, url: &str) {
        self.entries.remove(url);
    }
}

/// Seeds a store with data fetched ahead of time. Applies its entries once
/// per instance, later calls are no-ops.
pub struct Hydrator<T> {
    entries: Vec<(String, Vec<T>)>,
    hydrated: bool,
}

impl<T> Hydrator<T> {
    pub fn new(entries: Vec<(String, Vec<T>)>) -> Self {
        Self {
            entries,
            hydrated: false,
        }
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    pub fn hydrate(&mut self, store: &mut ResourceStore<T>) {
        if self.hydrated {
            return;
        }
        for (url, data) in self.entries.drain(..) {
            debug!("Preloading {} rows for {url}", data.len());
            store.insert(url, Arc::new(data));
        }
        self.hydrated = true;
    }
}

/// Handle on one resource. Reading it never blocks; a requested fetch is
/// performed by the next call to [`Resource::poll`].
pub struct Resource<T> {
    def: ResourceDef<T>,
    store: ResourceStore<T>,
    data: Option<Arc<Vec<T>>>,
    state: LoadState,
    error: Option<RTVError>,
    pending: Option<bool>, // Requested fetch, bypassing the cache or not
}

impl<T> Resource<T> {
    pub fn new(def: ResourceDef<T>) -> Self {
        Self {
            def,
            store: ResourceStore::default(),
            data: None,
            state: LoadState::Idle,
            error: None,
            pending: None,
        }
    }

    /// Fetches `def` ahead of the first poll and seeds the cache with the
    /// result. A failed fetch is logged and leaves the cache empty, so the
    /// first poll reports the error instead.
    pub fn preloaded(def: ResourceDef<T>) -> Self {
        let preload = match fetch_resource_data(&def) {
            Ok(entry) => vec![entry],
            Err(e) => {
                warn!("Preloading resource failed: {e}");
                Vec::new()
            }
        };
        let mut resource = Self::new(def);
        Hydrator::new(preload).hydrate(resource.store_mut());
        resource
    }

    pub fn data(&self) -> Option<Arc<Vec<T>>> {
        self.data.clone()
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn error(&self) -> Option<&RTVError> {
        self.error.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut ResourceStore<T> {
        &mut self.store
    }

    pub fn refetch(&mut self, bypass_cache: bool) {
        self.state = LoadState::Loading;
        self.pending = Some(self.pending.unwrap_or(false) || bypass_cache);
    }

    /// Runs a requested fetch. Returns `true` when the data changed.
    pub fn poll(&mut self) -> bool {
        let Some(bypass_cache) = self.pending.take() else {
            return false;
        };

        let cached = self.def.url.resolve().and_then(|url| self.store.get(&url));
        if let Some(data) = cached.filter(|_| !bypass_cache) {
            debug!("Serving {} rows from cache", data.len());
            self.data = Some(data);
            self.state = LoadState::Success;
            self.error = None;
            return true;
        }

        match fetch_resource_data(&self.def) {
            Ok((url, data)) => {
                let data = Arc::new(data);
                self.store.insert(url, Arc::clone(&data));
                self.data = Some(data);
                self.state = LoadState::Success;
                self.error = None;
                true
            }
            Err(e) => {
                // Keep showing the last good snapshot.
                warn!("Fetching resource failed: {e}");
                self.state = LoadState::Error;
                self.error = Some(e);
                false
            }
        }
    }
}
