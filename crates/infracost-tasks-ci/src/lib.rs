//! Infracost Tasks CI - pipeline task orchestration
//!
//! Provides the pieces around the comment planner:
//! - Task inputs and CI environment snapshots
//! - Report generation through the infracost CLI
//! - Comment delivery to GitHub and Azure Repos
//! - The comment and configure task entry points

pub mod command;
pub mod environment;
pub mod inputs;
pub mod platform;
pub mod report;
pub mod result;
pub mod setup;
pub mod task;

// Re-export key types
pub use environment::CiEnvironment;
pub use inputs::TaskInputs;
pub use platform::{CommentPlatform, DetectOptions, EnvPlatformDetector, PlatformDetector};
pub use report::{InfracostCli, ReportGenerator, ReportInvocation};
pub use result::{AgentLog, TaskResult};
pub use setup::ConfigureTask;
pub use task::{CommentOutcome, CommentTask, CommentTaskOptions};
