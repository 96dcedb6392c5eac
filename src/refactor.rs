//! Main refactoring entry point over a Java source tree.

pub mod operations;

use std::path::{Path, PathBuf};

use crate::config::GenerifyConfig;
use crate::diff::{ClassChange, DiffSummary, outline_changes, summarize};
use crate::error::Result;
use crate::model::Workspace;
use operations::{RefactoringContext, RefactoringOperation, RefactoringResult, RefactoringRunner};

/// The result of running an operation through [`Refactor`].
#[derive(Debug)]
pub struct RefactorResult {
    /// The workspace after the operation (unchanged for dry runs).
    pub workspace: Workspace,
    pub result: RefactoringResult,
    /// Outline changes, computed for dry runs too.
    pub changes: Vec<ClassChange>,
    pub summary: DiffSummary,
}

impl RefactorResult {
    /// Returns the number of classes whose outline changed.
    pub fn classes_modified(&self) -> usize {
        self.changes.len()
    }

    /// Generates a unified diff of all outline changes.
    pub fn diff(&self) -> String {
        self.changes
            .iter()
            .map(ClassChange::unified)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Generates a colorized diff for terminal display.
    pub fn colorized_diff(&self) -> String {
        self.changes
            .iter()
            .map(ClassChange::colorized)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Loads a source tree and runs one operation on a class of it.
///
/// ```rust,no_run
/// use pullup_gen::prelude::*;
///
/// let result = Refactor::in_dir("src/main/java")
///     .dry_run()
///     .run("Dog", &PullUpGeneric::new("Animal").method("feed"))?;
///
/// println!("{}", result.diff());
/// # Ok::<(), pullup_gen::error::GenerifyError>(())
/// ```
pub struct Refactor {
    root: PathBuf,
    config: GenerifyConfig,
    dry_run: bool,
}

impl Refactor {
    /// Creates a refactoring over the sources under `path`.
    pub fn in_dir(path: impl Into<PathBuf>) -> Self {
        Self {
            root: path.into(),
            config: GenerifyConfig::default(),
            dry_run: false,
        }
    }

    /// Creates a refactoring in the current directory.
    pub fn current_dir() -> Result<Self> {
        Ok(Self::in_dir(std::env::current_dir()?))
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: GenerifyConfig) -> Self {
        self.config = config;
        self
    }

    /// Enables dry-run mode (preview changes without keeping them).
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Loads the sources and runs `operation` with `class` as source class.
    pub fn run(self, class: &str, operation: &dyn RefactoringOperation) -> Result<RefactorResult> {
        let mut ctx = RefactoringContext::load(&self.root, class, self.config)?;
        let before = ctx.workspace.clone();

        // A dry run applies to the loaded copy and hands back the original.
        let result = RefactoringRunner::new().run(operation, &mut ctx)?;
        let changes = outline_changes(&before, &ctx.workspace);
        let workspace = if self.dry_run { before } else { ctx.workspace };
        tracing::debug!(
            root = %self.root.display(),
            dry_run = self.dry_run,
            classes = changes.len(),
            "refactoring finished"
        );

        Ok(RefactorResult {
            workspace,
            summary: summarize(&changes),
            result,
            changes,
        })
    }

    /// Returns the root path.
    pub fn root(&self) -> &Path {
        &self.root
    }
}
