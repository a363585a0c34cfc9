use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Requirements,
    Architecture,
    Specification,
    Implementation,
}

impl Stage {
    pub fn all() -> &'static [Stage] {
        &[
            Stage::Requirements,
            Stage::Architecture,
            Stage::Specification,
            Stage::Implementation,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Requirements => "requirements",
            Stage::Architecture => "architecture",
            Stage::Specification => "specification",
            Stage::Implementation => "implementation",
        }
    }

    /// CLI command that produces this stage's output. Used in error guidance.
    pub fn command(self) -> &'static str {
        match self {
            Stage::Requirements => "refine-requirements",
            Stage::Architecture => "design-architecture",
            Stage::Specification => "specify",
            Stage::Implementation => "implement-functional",
        }
    }

    /// The stage whose output this stage consumes.
    pub fn predecessor(self) -> Option<Stage> {
        let all = Stage::all();
        let i = self as usize;
        i.checked_sub(1).and_then(|p| all.get(p).copied())
    }

    /// Pipeline state reached when this stage completes.
    pub fn completed_state(self) -> PipelineState {
        match self {
            Stage::Requirements => PipelineState::RequirementsDrafted,
            Stage::Architecture => PipelineState::ArchitectureDrafted,
            Stage::Specification => PipelineState::Specified,
            Stage::Implementation => PipelineState::Implemented,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = crate::error::PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requirements" => Ok(Stage::Requirements),
            "architecture" => Ok(Stage::Architecture),
            "specification" => Ok(Stage::Specification),
            "implementation" => Ok(Stage::Implementation),
            _ => Err(crate::error::PipelineError::InvalidStage(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Created,
    RequirementsDrafted,
    ArchitectureDrafted,
    Specified,
    Implemented,
}

impl PipelineState {
    pub fn all() -> &'static [PipelineState] {
        &[
            PipelineState::Created,
            PipelineState::RequirementsDrafted,
            PipelineState::ArchitectureDrafted,
            PipelineState::Specified,
            PipelineState::Implemented,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PipelineState::Created => "created",
            PipelineState::RequirementsDrafted => "requirements_drafted",
            PipelineState::ArchitectureDrafted => "architecture_drafted",
            PipelineState::Specified => "specified",
            PipelineState::Implemented => "implemented",
        }
    }

    pub fn next(self) -> Option<PipelineState> {
        let all = PipelineState::all();
        all.get(self as usize + 1).copied()
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    MustHave,
    ShouldHave,
    NiceToHave,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::MustHave => "must-have",
            Priority::ShouldHave => "should-have",
            Priority::NiceToHave => "nice-to-have",
        }
    }

    pub fn parse(s: &str) -> Option<Priority> {
        match s {
            "must-have" | "must_have" => Some(Priority::MustHave),
            "should-have" | "should_have" => Some(Priority::ShouldHave),
            "nice-to-have" | "nice_to_have" => Some(Priority::NiceToHave),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Depth
// ---------------------------------------------------------------------------

/// Editorial label for how much complexity a module's interface hides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Depth {
    Deep,
    Medium,
    Shallow,
}

impl Depth {
    pub fn as_str(self) -> &'static str {
        match self {
            Depth::Deep => "deep",
            Depth::Medium => "medium",
            Depth::Shallow => "shallow",
        }
    }

    pub fn parse(s: &str) -> Option<Depth> {
        match s {
            "deep" => Some(Depth::Deep),
            "medium" => Some(Depth::Medium),
            "shallow" => Some(Depth::Shallow),
            _ => None,
        }
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
