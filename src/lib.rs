pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod formatters;
pub mod logger;
pub mod media;
pub mod resource;
pub mod service;
pub mod session;
pub mod utils;
pub mod workflow;

pub use config::ServiceConfig;
pub use error::{CompressionError, Result};
pub use formatters::{calculate_reduction, format_bytes, format_bytes_with, StatsSnapshot};
pub use resource::{
    BinaryResourceHandle, InMemoryBackend, ResourceBackend, ResourceLifecycleManager,
    ResourceRole, TempFileBackend,
};
pub use service::{CompressionService, HttpCompressionService, UploadRequest};
pub use session::{Session, SessionCommand};
pub use workflow::{
    reduce, Completion, CompressionOutcome, CompressionTicket, CompressionWorkflowController,
    SelectedFile, WorkflowEvent, WorkflowPhase, WorkflowState,
};
