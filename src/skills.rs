//! The [`Skill`] trait and [`SkillRegistry`] for trailing-command dispatch.
//!
//! A command tag names an action (`open_app`, `set_volume`, ...) and one
//! parameter. Each skill declares the command keys it handles; the
//! registry routes an extracted command to the first skill claiming its
//! name. Real skills (app launching, shortcuts, system control) are OS
//! integrations owned by the embedding application; this crate only
//! defines the seam.

use crate::error::Result;
use crate::tags::CommandTag;
use async_trait::async_trait;
use tracing::{error, info};

/// A named capability that handles one or more command keys.
#[async_trait]
pub trait Skill: Send + Sync {
    /// Unique human-readable identifier (e.g. `"launcher"`).
    fn name(&self) -> &str;

    /// Short description shown in diagnostics.
    fn description(&self) -> &str;

    /// Command keys this skill handles.
    fn commands(&self) -> &[&str];

    /// Execute one command with its raw parameter string.
    async fn execute(&self, command: &str, param: &str) -> Result<()>;
}

/// Result of routing a command through the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A skill claimed the command (its own failure is contained and logged).
    Handled {
        /// Name of the skill that ran.
        skill: String,
    },
    /// No registered skill handles this command name.
    Unknown,
}

/// Registry mapping command names to skill handlers.
#[derive(Default)]
pub struct SkillRegistry {
    skills: Vec<Box<dyn Skill>>,
}

impl SkillRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a skill. Registration order breaks ties when two skills
    /// claim the same command key.
    pub fn register(&mut self, skill: Box<dyn Skill>) {
        self.skills.push(skill);
    }

    /// The skill that handles `command`, if any.
    pub fn handler_for(&self, command: &str) -> Option<&dyn Skill> {
        self.skills
            .iter()
            .find(|s| s.commands().contains(&command))
            .map(|s| s.as_ref())
    }

    /// Number of registered skills.
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Route a command to its handler by exact name match.
    ///
    /// A failing handler is logged and still reported as handled: one
    /// skill's error never fails the turn.
    pub async fn dispatch(&self, command: &CommandTag) -> DispatchOutcome {
        let Some(skill) = self.handler_for(&command.name) else {
            return DispatchOutcome::Unknown;
        };
        info!(skill = skill.name(), command = %command.name, param = %command.param, "executing command");
        if let Err(e) = skill.execute(&command.name, &command.param).await {
            error!(skill = skill.name(), command = %command.name, "skill failed: {e}");
        }
        DispatchOutcome::Handled {
            skill: skill.name().to_owned(),
        }
    }
}
