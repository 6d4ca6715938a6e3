use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Configuration;
use crate::error::{FileNamerError, GenerationError, RequestError};

/// Everything a single generation needs, frozen at the moment it is built.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    title: String,
    ideas: String,
    config: Arc<Configuration>,
    destination_dir: PathBuf,
}

impl GenerationRequest {
    /// Trim and check the user input, keeping the given configuration snapshot.
    pub fn new(
        title: impl AsRef<str>,
        ideas: impl AsRef<str>,
        config: Arc<Configuration>,
        destination_dir: impl Into<PathBuf>,
    ) -> Result<Self, RequestError> {
        let title = title.as_ref().trim();
        if title.is_empty() {
            return Err(RequestError::EmptyTitle);
        }

        let ideas = ideas.as_ref().trim();
        if ideas.is_empty() {
            return Err(RequestError::EmptyIdeas);
        }

        Ok(Self {
            title: title.to_string(),
            ideas: ideas.to_string(),
            config,
            destination_dir: destination_dir.into(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn ideas(&self) -> &str {
        &self.ideas
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn destination_dir(&self) -> &std::path::Path {
        &self.destination_dir
    }
}

/// Pipeline stage boundaries, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Compose,
    Generate,
    Name,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Compose => "compose",
            Stage::Generate => "generate",
            Stage::Name => "name",
            Stage::Write => "write",
        };
        f.write_str(name)
    }
}

/// Why a task ended in `Failed`, tagged by the stage that failed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    #[error("generation failed: {0}")]
    Generate(#[from] GenerationError),

    #[error("file naming failed: {0}")]
    Name(#[from] FileNamerError),

    #[error("writing the document failed: {0}")]
    Write(String),

    #[error("task aborted: {0}")]
    Aborted(String),
}

impl FailureReason {
    /// The stage the failure belongs to, if it happened inside one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            FailureReason::Generate(_) => Some(Stage::Generate),
            FailureReason::Name(_) => Some(Stage::Name),
            FailureReason::Write(_) => Some(Stage::Write),
            FailureReason::Aborted(_) => None,
        }
    }
}

/// The single terminal result delivered for a non-cancelled task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Success { content: String, saved_path: PathBuf },
    Failure { reason: FailureReason },
}

impl GenerationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Success { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Cancelled | TaskState::Failed
        )
    }
}
