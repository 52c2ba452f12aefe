//! Infracost Tasks Core
//!
//! Domain logic shared by the infracost pipeline tasks:
//! - Comment request value types (paths, behavior, target type, provider)
//! - The comment planner (format selection, support checks, notes, rendering)
//! - Provider credential mapping
//! - The task error taxonomy

pub mod credentials;
pub mod error;
pub mod planner;
pub mod request;
pub mod telemetry;

pub use credentials::{resolve_credential, Credential, CredentialInput};
pub use error::{Result, TaskError, FAILURE_CONTEXT};
pub use planner::{feedback_block, CommentFormat, CommentPlanner, OutputFormat, RenderedComment};
pub use request::{CommentRequest, RepoProvider, ReportPaths, TargetType, UpdateBehavior};
pub use telemetry::init_tracing;
