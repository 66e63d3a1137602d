//! Compression workflow state machine.
//!
//! [`WorkflowState`] is a plain value; [`reduce`] computes the next state for
//! a [`WorkflowEvent`] without side effects. [`CompressionWorkflowController`]
//! owns the state and performs the resource allocation and revocation around
//! each transition.
//!
//! Phases: `Empty -> Ready -> Compressing -> {Result, Failed}`. A new
//! selection always returns to `Ready`; a compress trigger from `Ready`,
//! `Result` or `Failed` enters `Compressing`.

use crate::constants::{download_file_name, DEFAULT_UPLOAD_NAME, MAX_FILE_SIZE};
use crate::error::{CompressionError, Result};
use crate::formatters::{calculate_reduction, StatsSnapshot};
use crate::media::detect_content_type;
use crate::resource::{BinaryResourceHandle, ResourceLifecycleManager, ResourceRole};
use crate::service::{CompressionService, UploadRequest};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// A file chosen by the user, with its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Load an image from disk, inferring its content type.
    ///
    /// Files that are not recognised as `image/*` are refused here, before
    /// anything is allocated or uploaded.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(CompressionError::FileNotFound(path.to_path_buf()));
        }

        let file_size = fs::metadata(path)?.len();
        if file_size > MAX_FILE_SIZE {
            return Err(CompressionError::FileTooLarge(file_size, MAX_FILE_SIZE));
        }

        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_UPLOAD_NAME.to_string());
        let content_type = detect_content_type(path, &bytes);
        if !content_type.starts_with("image/") {
            return Err(CompressionError::NotAnImage(path.to_path_buf(), content_type));
        }

        Ok(Self::new(name, content_type, bytes))
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Name and content type of the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub content_type: String,
}

/// The request currently awaiting a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlight {
    pub request_id: u64,
    pub k: u32,
    pub started_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowPhase {
    Empty,
    Ready,
    Compressing,
    Result,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowState {
    original: Option<BinaryResourceHandle>,
    original_size: u64,
    selected: Option<FileInfo>,
    result: Option<BinaryResourceHandle>,
    result_size: u64,
    result_k: Option<u32>,
    elapsed_ms: f64,
    in_flight: Option<InFlight>,
    last_error: Option<String>,
}

impl WorkflowState {
    pub fn original(&self) -> Option<&BinaryResourceHandle> {
        self.original.as_ref()
    }

    pub fn original_size(&self) -> u64 {
        self.original_size
    }

    pub fn selected(&self) -> Option<&FileInfo> {
        self.selected.as_ref()
    }

    pub fn result(&self) -> Option<&BinaryResourceHandle> {
        self.result.as_ref()
    }

    pub fn result_size(&self) -> u64 {
        self.result_size
    }

    /// K used for the current result.
    pub fn result_k(&self) -> Option<u32> {
        self.result_k
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn in_flight(&self) -> Option<&InFlight> {
        self.in_flight.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn phase(&self) -> WorkflowPhase {
        if self.original.is_none() {
            WorkflowPhase::Empty
        } else if self.in_flight.is_some() {
            WorkflowPhase::Compressing
        } else if self.result.is_some() {
            WorkflowPhase::Result
        } else if self.last_error.is_some() {
            WorkflowPhase::Failed
        } else {
            WorkflowPhase::Ready
        }
    }

    /// Whether a response to `request_id` would still be applied.
    pub fn is_current(&self, request_id: u64) -> bool {
        self.in_flight
            .map(|pending| pending.request_id == request_id)
            .unwrap_or(false)
    }

    pub fn reduction_percent(&self) -> String {
        calculate_reduction(self.original_size, self.result_size)
    }

    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot::new(
            self.original.as_ref().map(|_| self.original_size),
            self.result
                .as_ref()
                .map(|_| (self.result_size, self.elapsed_ms)),
        )
    }

    fn handles(&self) -> impl Iterator<Item = &BinaryResourceHandle> {
        self.original.iter().chain(self.result.iter())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    FileSelected {
        original: BinaryResourceHandle,
        file: FileInfo,
    },
    /// The selection could not be stored; back to `Empty`.
    SelectionCleared,
    CompressionStarted {
        request_id: u64,
        k: u32,
        started_at: Instant,
    },
    CompressionSucceeded {
        request_id: u64,
        result: BinaryResourceHandle,
        elapsed_ms: f64,
    },
    CompressionFailed {
        request_id: u64,
        message: String,
    },
}

/// Compute the state that follows `event`.
///
/// Events that are not allowed in the current state (a start while busy or
/// without a file, a completion for a request that is no longer in flight)
/// leave the state unchanged.
pub fn reduce(state: &WorkflowState, event: WorkflowEvent) -> WorkflowState {
    match event {
        WorkflowEvent::FileSelected { original, file } => WorkflowState {
            original_size: original.len(),
            original: Some(original),
            selected: Some(file),
            ..WorkflowState::default()
        },
        WorkflowEvent::SelectionCleared => WorkflowState::default(),
        WorkflowEvent::CompressionStarted {
            request_id,
            k,
            started_at,
        } => {
            if state.original.is_none() || state.is_busy() || k == 0 {
                return state.clone();
            }
            WorkflowState {
                in_flight: Some(InFlight {
                    request_id,
                    k,
                    started_at,
                }),
                last_error: None,
                ..state.clone()
            }
        }
        WorkflowEvent::CompressionSucceeded {
            request_id,
            result,
            elapsed_ms,
        } => match state.in_flight {
            Some(pending) if pending.request_id == request_id => WorkflowState {
                result_size: result.len(),
                result: Some(result),
                result_k: Some(pending.k),
                elapsed_ms,
                in_flight: None,
                last_error: None,
                ..state.clone()
            },
            _ => state.clone(),
        },
        WorkflowEvent::CompressionFailed {
            request_id,
            message,
        } => {
            if !state.is_current(request_id) {
                return state.clone();
            }
            WorkflowState {
                result: None,
                result_size: 0,
                result_k: None,
                elapsed_ms: 0.0,
                in_flight: None,
                last_error: Some(message),
                ..state.clone()
            }
        }
    }
}

/// Handles held by `old` that `new` no longer references.
pub fn released_handles(old: &WorkflowState, new: &WorkflowState) -> Vec<BinaryResourceHandle> {
    old.handles()
        .filter(|handle| !new.handles().any(|kept| kept == *handle))
        .cloned()
        .collect()
}

/// A started request, ready to be sent.
#[derive(Debug)]
pub struct CompressionTicket {
    request_id: u64,
    started_at: Instant,
    request: UploadRequest,
}

impl CompressionTicket {
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    pub fn k(&self) -> u32 {
        self.request.k
    }

    /// Send the request and wait for its resolution.
    pub async fn execute<S>(self, service: &S) -> CompressionOutcome
    where
        S: CompressionService + ?Sized,
    {
        let result = service.compress(self.request).await;
        CompressionOutcome {
            request_id: self.request_id,
            started_at: self.started_at,
            completed_at: Instant::now(),
            result,
        }
    }
}

/// Resolution of a [`CompressionTicket`].
#[derive(Debug)]
pub struct CompressionOutcome {
    pub request_id: u64,
    pub started_at: Instant,
    pub completed_at: Instant,
    pub result: Result<Vec<u8>>,
}

impl CompressionOutcome {
    pub fn elapsed_ms(&self) -> f64 {
        self.completed_at
            .saturating_duration_since(self.started_at)
            .as_secs_f64()
            * 1000.0
    }
}

/// What applying an outcome did to the workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Succeeded { result_size: u64, elapsed_ms: f64 },
    Failed { message: String },
    /// A newer selection superseded the request; the response was dropped.
    Stale,
}

/// Drives the workflow and owns its state and resources.
#[derive(Debug)]
pub struct CompressionWorkflowController {
    state: WorkflowState,
    resources: ResourceLifecycleManager,
    next_request_id: u64,
}

impl Default for CompressionWorkflowController {
    fn default() -> Self {
        Self::new(ResourceLifecycleManager::in_memory())
    }
}

impl CompressionWorkflowController {
    pub fn new(resources: ResourceLifecycleManager) -> Self {
        Self {
            state: WorkflowState::default(),
            resources,
            next_request_id: 0,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.state.phase()
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn resources(&self) -> &ResourceLifecycleManager {
        &self.resources
    }

    pub fn reduction_percent(&self) -> String {
        self.state.reduction_percent()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.state.stats()
    }

    /// Replace the current selection.
    ///
    /// `None` is ignored and returns `Ok(false)`. Otherwise both previous
    /// handles are revoked, a new original handle is allocated and the
    /// result, error and timing fields are reset.
    pub fn select_file(&mut self, file: Option<SelectedFile>) -> Result<bool> {
        let Some(SelectedFile {
            name,
            content_type,
            bytes,
        }) = file
        else {
            return Ok(false);
        };

        let mut original = self.state.original.clone();
        let mut result = self.state.result.clone();
        self.resources.release(&mut result);

        match self
            .resources
            .replace(&mut original, ResourceRole::Original, bytes)
        {
            Ok(handle) => {
                info!("selected {} ({} bytes)", name, handle.len());
                self.apply(WorkflowEvent::FileSelected {
                    original: handle,
                    file: FileInfo { name, content_type },
                });
                Ok(true)
            }
            Err(e) => {
                warn!("could not store selected file {}: {}", name, e);
                self.apply(WorkflowEvent::SelectionCleared);
                Err(e)
            }
        }
    }

    /// Enter `Compressing` and prepare the upload.
    ///
    /// Fails with `NoFileSelected`, `RequestInFlight` or `InvalidK` without
    /// touching the state.
    pub fn begin_compress(&mut self, k: u32) -> Result<CompressionTicket> {
        let (original, file) = match (&self.state.original, &self.state.selected) {
            (Some(original), Some(file)) => (original, file),
            _ => return Err(CompressionError::NoFileSelected),
        };
        if self.state.is_busy() {
            return Err(CompressionError::RequestInFlight);
        }
        if k == 0 {
            return Err(CompressionError::InvalidK(k));
        }

        let request = UploadRequest {
            file_name: file.name.clone(),
            content_type: file.content_type.clone(),
            bytes: self.resources.read(original)?,
            k,
        };

        self.next_request_id += 1;
        let request_id = self.next_request_id;
        let started_at = Instant::now();
        self.apply(WorkflowEvent::CompressionStarted {
            request_id,
            k,
            started_at,
        });
        info!("compression request #{} started with k={}", request_id, k);

        Ok(CompressionTicket {
            request_id,
            started_at,
            request,
        })
    }

    /// Apply the resolution of a request.
    ///
    /// Responses for requests that are no longer in flight are discarded
    /// without allocating anything.
    pub fn finish(&mut self, outcome: CompressionOutcome) -> Completion {
        let request_id = outcome.request_id;
        if !self.state.is_current(request_id) {
            debug!("discarding stale response for request #{}", request_id);
            return Completion::Stale;
        }

        let elapsed_ms = outcome.elapsed_ms();
        let bytes = match outcome.result {
            Ok(bytes) => bytes,
            Err(e) => return self.fail(request_id, e),
        };

        let mut slot = self.state.result.clone();
        match self.resources.replace(&mut slot, ResourceRole::Result, bytes) {
            Ok(handle) => {
                let result_size = handle.len();
                self.apply(WorkflowEvent::CompressionSucceeded {
                    request_id,
                    result: handle,
                    elapsed_ms,
                });
                info!(
                    "compression request #{} finished: {} bytes in {:.0} ms",
                    request_id, result_size, elapsed_ms
                );
                Completion::Succeeded {
                    result_size,
                    elapsed_ms,
                }
            }
            Err(e) => self.fail(request_id, e),
        }
    }

    /// Run one compression end to end.
    pub async fn compress<S>(&mut self, service: &S, k: u32) -> Result<Completion>
    where
        S: CompressionService + ?Sized,
    {
        let ticket = self.begin_compress(k)?;
        let outcome = ticket.execute(service).await;
        Ok(self.finish(outcome))
    }

    pub fn original_bytes(&self) -> Result<Vec<u8>> {
        let handle = self
            .state
            .original
            .as_ref()
            .ok_or(CompressionError::NoFileSelected)?;
        self.resources.read(handle)
    }

    pub fn result_bytes(&self) -> Result<Vec<u8>> {
        let handle = self
            .state
            .result
            .as_ref()
            .ok_or(CompressionError::NoResult)?;
        self.resources.read(handle)
    }

    /// Filename offered for the current result, `compressed_k{K}.jpg`.
    pub fn download_file_name(&self) -> Option<String> {
        self.state
            .result
            .as_ref()
            .and(self.state.result_k)
            .map(download_file_name)
    }

    /// Write the current result into `dir` under its download name.
    pub fn save_result(&self, dir: &Path) -> Result<PathBuf> {
        let file_name = self.download_file_name().ok_or(CompressionError::NoResult)?;
        let bytes = self.result_bytes()?;

        fs::create_dir_all(dir)?;
        let path = dir.join(file_name);
        fs::write(&path, bytes)?;
        Ok(path)
    }

    fn fail(&mut self, request_id: u64, error: CompressionError) -> Completion {
        let message = error.to_string();
        if error.is_request_failure() {
            warn!("compression request #{} failed: {}", request_id, message);
        } else {
            error!("could not store result of request #{}: {}", request_id, message);
        }
        self.apply(WorkflowEvent::CompressionFailed {
            request_id,
            message: message.clone(),
        });
        Completion::Failed { message }
    }

    fn apply(&mut self, event: WorkflowEvent) {
        let next = reduce(&self.state, event);
        for handle in released_handles(&self.state, &next) {
            self.resources.revoke(&handle);
        }
        debug!("{:?} -> {:?}", self.state.phase(), next.phase());
        self.state = next;
    }
}

impl Drop for CompressionWorkflowController {
    fn drop(&mut self) {
        let mut original = self.state.original.take();
        let mut result = self.state.result.take();
        self.resources.release(&mut original);
        self.resources.release(&mut result);
    }
}
