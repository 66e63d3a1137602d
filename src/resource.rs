//! Transient binary resources backing the original and compressed images.
//!
//! A [`BinaryResourceHandle`] is an opaque reference to a byte buffer held by
//! a [`ResourceBackend`]. The [`ResourceLifecycleManager`] allocates and
//! revokes handles on behalf of the workflow controller and enforces that a
//! role never has more than one live handle.

use crate::error::{CompressionError, Result};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use tracing::debug;

/// Which image a handle backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceRole {
    Original,
    Result,
}

impl fmt::Display for ResourceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRole::Original => write!(f, "original"),
            ResourceRole::Result => write!(f, "result"),
        }
    }
}

/// Opaque reference to an allocated byte buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BinaryResourceHandle {
    id: u64,
    role: ResourceRole,
    len: u64,
    uri: String,
}

impl BinaryResourceHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn role(&self) -> ResourceRole {
        self.role
    }

    /// Byte length of the backing buffer.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Address of the buffer in the backend (`blob:` or `file://`).
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl fmt::Display for BinaryResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri)
    }
}

/// Host mechanism that stores the bytes behind handles.
pub trait ResourceBackend: Send {
    /// Store `bytes` and return a fresh handle for them.
    fn allocate(&mut self, role: ResourceRole, bytes: Vec<u8>) -> Result<BinaryResourceHandle>;

    /// Release the buffer behind `handle`. Revoking twice is a no-op.
    fn revoke(&mut self, handle: &BinaryResourceHandle);

    /// Read the buffer behind a live handle.
    fn read(&self, handle: &BinaryResourceHandle) -> Result<Vec<u8>>;

    fn is_live(&self, handle: &BinaryResourceHandle) -> bool;

    /// Number of live handles with the given role.
    fn live_count(&self, role: ResourceRole) -> usize;
}

/// In-memory blobs; `read` hands out owned copies.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    next_id: u64,
    blobs: HashMap<u64, (ResourceRole, Vec<u8>)>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResourceBackend for InMemoryBackend {
    fn allocate(&mut self, role: ResourceRole, bytes: Vec<u8>) -> Result<BinaryResourceHandle> {
        self.next_id += 1;
        let id = self.next_id;
        let handle = BinaryResourceHandle {
            id,
            role,
            len: bytes.len() as u64,
            uri: format!("blob:pca-squeeze/{}/{}", role, id),
        };
        self.blobs.insert(id, (role, bytes));
        Ok(handle)
    }

    fn revoke(&mut self, handle: &BinaryResourceHandle) {
        self.blobs.remove(&handle.id);
    }

    fn read(&self, handle: &BinaryResourceHandle) -> Result<Vec<u8>> {
        self.blobs
            .get(&handle.id)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| CompressionError::ResourceRevoked(handle.uri.clone()))
    }

    fn is_live(&self, handle: &BinaryResourceHandle) -> bool {
        self.blobs.contains_key(&handle.id)
    }

    fn live_count(&self, role: ResourceRole) -> usize {
        self.blobs.values().filter(|(r, _)| *r == role).count()
    }
}

/// Scoped temporary files inside a private directory.
///
/// Files are deleted when revoked; the directory goes away with the backend.
#[derive(Debug)]
pub struct TempFileBackend {
    dir: TempDir,
    next_id: u64,
    files: HashMap<u64, (ResourceRole, NamedTempFile)>,
}

impl TempFileBackend {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("pca-squeeze-").tempdir()?;
        Ok(Self {
            dir,
            next_id: 0,
            files: HashMap::new(),
        })
    }
}

impl ResourceBackend for TempFileBackend {
    fn allocate(&mut self, role: ResourceRole, bytes: Vec<u8>) -> Result<BinaryResourceHandle> {
        self.next_id += 1;
        let id = self.next_id;

        let mut file = tempfile::Builder::new()
            .prefix(&format!("{}-{}-", role, id))
            .tempfile_in(self.dir.path())?;
        file.write_all(&bytes)?;
        file.flush()?;

        let handle = BinaryResourceHandle {
            id,
            role,
            len: bytes.len() as u64,
            uri: format!("file://{}", file.path().display()),
        };
        self.files.insert(id, (role, file));
        Ok(handle)
    }

    fn revoke(&mut self, handle: &BinaryResourceHandle) {
        if let Some((_, file)) = self.files.remove(&handle.id) {
            if let Err(e) = file.close() {
                debug!("failed to delete {}: {}", handle.uri, e);
            }
        }
    }

    fn read(&self, handle: &BinaryResourceHandle) -> Result<Vec<u8>> {
        let (_, file) = self
            .files
            .get(&handle.id)
            .ok_or_else(|| CompressionError::ResourceRevoked(handle.uri.clone()))?;
        Ok(fs::read(file.path())?)
    }

    fn is_live(&self, handle: &BinaryResourceHandle) -> bool {
        self.files.contains_key(&handle.id)
    }

    fn live_count(&self, role: ResourceRole) -> usize {
        self.files.values().filter(|(r, _)| *r == role).count()
    }
}

/// Allocation and revocation discipline over a [`ResourceBackend`].
pub struct ResourceLifecycleManager {
    backend: Box<dyn ResourceBackend>,
}

impl ResourceLifecycleManager {
    pub fn new(backend: Box<dyn ResourceBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(InMemoryBackend::new()))
    }

    pub fn temp_files() -> Result<Self> {
        Ok(Self::new(Box::new(TempFileBackend::new()?)))
    }

    /// Revoke whatever `slot` holds, then allocate `bytes` into it.
    ///
    /// The slot is empty if allocation fails, never pointing at a revoked
    /// handle.
    pub fn replace(
        &mut self,
        slot: &mut Option<BinaryResourceHandle>,
        role: ResourceRole,
        bytes: Vec<u8>,
    ) -> Result<BinaryResourceHandle> {
        self.release(slot);
        let handle = self.backend.allocate(role, bytes)?;
        debug!("allocated {} handle {}", role, handle);
        *slot = Some(handle.clone());
        Ok(handle)
    }

    /// Revoke and clear `slot`.
    pub fn release(&mut self, slot: &mut Option<BinaryResourceHandle>) {
        if let Some(handle) = slot.take() {
            self.revoke(&handle);
        }
    }

    /// Revoke a handle; already revoked handles are ignored.
    pub fn revoke(&mut self, handle: &BinaryResourceHandle) {
        if self.backend.is_live(handle) {
            debug!("revoking {} handle {}", handle.role(), handle);
            self.backend.revoke(handle);
        }
    }

    pub fn read(&self, handle: &BinaryResourceHandle) -> Result<Vec<u8>> {
        self.backend.read(handle)
    }

    pub fn is_live(&self, handle: &BinaryResourceHandle) -> bool {
        self.backend.is_live(handle)
    }

    pub fn live_count(&self, role: ResourceRole) -> usize {
        self.backend.live_count(role)
    }
}

impl fmt::Debug for ResourceLifecycleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceLifecycleManager")
            .field("live_originals", &self.live_count(ResourceRole::Original))
            .field("live_results", &self.live_count(ResourceRole::Result))
            .finish()
    }
}
