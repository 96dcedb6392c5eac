//! Shared state and result types of the pull-up operations.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::GenerifyConfig;
use crate::diff::{ClassChange, DiffSummary};
use crate::error::{MemberFailure, Result};
use crate::generify::CommitReport;
use crate::model::{ClassId, JavaLoader, MemberRef, Workspace};

/// A loaded workspace, the class being refactored, and the settings.
#[derive(Debug, Clone)]
pub struct RefactoringContext {
    /// The classes the operation works on.
    pub workspace: Workspace,
    /// The class whose members are pulled up.
    pub source_class: ClassId,
    pub config: GenerifyConfig,
}

impl RefactoringContext {
    /// Wrap an already built workspace, with default settings.
    pub fn new(workspace: Workspace, source_class: ClassId) -> Self {
        Self {
            workspace,
            source_class,
            config: GenerifyConfig::default(),
        }
    }

    /// Load every `.java` file under `root` and select `class_name` as source.
    pub fn load(root: impl AsRef<Path>, class_name: &str, config: GenerifyConfig) -> Result<Self> {
        config.validate()?;
        let workspace = JavaLoader::new()
            .excludes(config.exclude_patterns.iter().cloned())
            .load_dir(root.as_ref())?;
        let source_class = workspace.require_class(class_name)?;
        Ok(Self {
            workspace,
            source_class,
            config,
        })
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: GenerifyConfig) -> Self {
        self.config = config;
        self
    }

    /// The directory subclass lookups are restricted to, if any.
    pub fn scope(&self) -> Option<PathBuf> {
        self.config
            .restrict_to_directory
            .then(|| self.workspace.class(self.source_class).directory.clone())
    }

    pub fn source_name(&self) -> &str {
        self.workspace.class_name(self.source_class)
    }
}

/// Outcome of [`RefactoringOperation::validate`](super::RefactoringOperation::validate).
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Why the operation cannot run.
    pub errors: Vec<String>,
    /// Members that will be skipped, and similar notes.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            errors: vec![error.into()],
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Record an error; the result becomes invalid.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.is_valid = false;
        self.errors.push(error.into());
        self
    }
}

/// What happened to one selected member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// An abstract method now lives in the target.
    Committed(CommitReport),
    /// The target now declares the interface.
    InterfaceMoved,
    Failed { failure: MemberFailure },
}

/// A selected member and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberOutcome {
    pub member: MemberRef,
    pub display: String,
    pub outcome: Outcome,
}

impl MemberOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, Outcome::Failed { .. })
    }

    pub fn failure(&self) -> Option<&MemberFailure> {
        match &self.outcome {
            Outcome::Failed { failure } => Some(failure),
            _ => None,
        }
    }
}

/// What an operation would change, computed on a scratch copy.
#[derive(Debug, Clone)]
pub struct RefactoringPreview {
    pub description: String,
    /// Files whose outline would change.
    pub affected_files: Vec<PathBuf>,
    pub changes: Vec<ClassChange>,
    pub outcomes: Vec<MemberOutcome>,
    /// Unified diff of every changed outline.
    pub diff: String,
}

impl RefactoringPreview {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            affected_files: Vec::new(),
            changes: Vec::new(),
            outcomes: Vec::new(),
            diff: String::new(),
        }
    }

    /// Add an outline change and its file.
    pub fn add_change(&mut self, change: ClassChange) {
        if !self.affected_files.contains(&change.path) {
            self.affected_files.push(change.path.clone());
        }
        self.changes.push(change);
    }

    pub fn with_diff(mut self, diff: impl Into<String>) -> Self {
        self.diff = diff.into();
        self
    }
}

/// What an applied operation did.
#[derive(Debug, Clone, Serialize)]
pub struct RefactoringResult {
    /// Whether every selected member was pulled up.
    pub success: bool,
    pub description: String,
    /// Classes whose declarations changed.
    pub modified_classes: Vec<ClassId>,
    pub outcomes: Vec<MemberOutcome>,
    pub summary: DiffSummary,
    /// The failed members, joined, when any member failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RefactoringResult {
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            success: true,
            description: description.into(),
            modified_classes: Vec::new(),
            outcomes: Vec::new(),
            summary: DiffSummary::default(),
            error: None,
        }
    }

    /// A result for an operation that could not run at all.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            description: String::new(),
            modified_classes: Vec::new(),
            outcomes: Vec::new(),
            summary: DiffSummary::default(),
            error: Some(error.into()),
        }
    }

    /// Record member outcomes; any failure marks the result unsuccessful.
    pub fn with_outcomes(mut self, outcomes: Vec<MemberOutcome>) -> Self {
        let failed: Vec<_> = outcomes
            .iter()
            .filter_map(|o| o.failure().map(|f| format!("{}: {f}", o.display)))
            .collect();
        if !failed.is_empty() {
            self.success = false;
            self.error = Some(failed.join("; "));
        }
        self.outcomes = outcomes;
        self
    }

    /// Record the changed classes.
    pub fn with_changes(mut self, changes: &[ClassChange]) -> Self {
        for change in changes {
            if !self.modified_classes.contains(&change.class) {
                self.modified_classes.push(change.class);
            }
        }
        self.summary = crate::diff::summarize(changes);
        self
    }

    /// Members that could not be pulled up.
    pub fn failures(&self) -> impl Iterator<Item = &MemberOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassDecl, MethodId};

    #[test]
    fn test_context_scope_follows_config() {
        let mut ws = Workspace::new();
        let dog = ws.add_class(ClassDecl::class("Dog").in_directory("zoo"));
        let ctx = RefactoringContext::new(ws, dog);
        assert_eq!(ctx.scope(), Some(PathBuf::from("zoo")));
        assert_eq!(ctx.source_name(), "Dog");

        let mut config = GenerifyConfig::default();
        config.restrict_to_directory = false;
        let ctx = ctx.with_config(config);
        assert_eq!(ctx.scope(), None);
    }

    #[test]
    fn test_validation_errors_invalidate() {
        let skipped = ValidationResult::valid().with_warning("dig(): void: not in Cat");
        assert!(skipped.is_valid);
        assert_eq!(skipped.warnings.len(), 1);

        let rejected = skipped.with_error("No members selected");
        assert!(!rejected.is_valid);
        assert_eq!(rejected.errors, vec!["No members selected".to_string()]);
        assert!(!ValidationResult::invalid("Class 'Zebra' not found").is_valid);
    }

    #[test]
    fn test_failed_outcomes_mark_result_unsuccessful() {
        let failed = MemberOutcome {
            member: MemberRef::Method { id: MethodId(0) },
            display: "dig(): void".to_string(),
            outcome: Outcome::Failed {
                failure: MemberFailure::MemberNotImplemented {
                    member: "dig".to_string(),
                    class: "Cat".to_string(),
                },
            },
        };
        let result = RefactoringResult::success("pull up").with_outcomes(vec![failed]);
        assert!(!result.success);
        assert_eq!(result.failures().count(), 1);
        assert_eq!(
            result.error.as_deref(),
            Some("dig(): void: 'dig' is not implemented by class Cat")
        );
    }
}
