use serde::{Deserialize, Serialize};

/// Artifact kinds a caller may request synchronously.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
	Summary,
	Quiz,
}
impl GenerationKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Summary => "summary",
			Self::Quiz => "quiz",
		}
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
	Summary,
	Quiz,
	Extract,
}
impl JobKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Summary => "summary",
			Self::Quiz => "quiz",
			Self::Extract => "extract",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"summary" => Some(Self::Summary),
			"quiz" => Some(Self::Quiz),
			"extract" => Some(Self::Extract),
			_ => None,
		}
	}
}
impl From<GenerationKind> for JobKind {
	fn from(kind: GenerationKind) -> Self {
		match kind {
			GenerationKind::Summary => Self::Summary,
			GenerationKind::Quiz => Self::Quiz,
		}
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
	Pending,
	Running,
	Completed,
	Failed,
}
impl JobStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Pending => "pending",
			Self::Running => "running",
			Self::Completed => "completed",
			Self::Failed => "failed",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"pending" => Some(Self::Pending),
			"running" => Some(Self::Running),
			"completed" => Some(Self::Completed),
			"failed" => Some(Self::Failed),
			_ => None,
		}
	}

	/// `Pending -> Completed` covers a summary request that is already satisfied when queued.
	pub fn can_transition_to(self, next: Self) -> bool {
		matches!(
			(self, next),
			(Self::Pending, Self::Running)
				| (Self::Pending, Self::Completed)
				| (Self::Running, Self::Completed)
				| (Self::Running, Self::Failed)
		)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Job cannot move from {from:?} to {to:?}.")]
pub struct InvalidTransition {
	pub from: JobStatus,
	pub to: JobStatus,
}

pub fn transition(from: JobStatus, to: JobStatus) -> Result<JobStatus, InvalidTransition> {
	if from.can_transition_to(to) { Ok(to) } else { Err(InvalidTransition { from, to }) }
}
