//! Pull-up refactorings with generification.
//!
//! Each operation implements the [`RefactoringOperation`] trait: it can be
//! validated, previewed as an outline diff, and applied to the workspace of
//! a [`RefactoringContext`].
//!
//! Two operations exist: [`PullUpGeneric`] moves members into an existing
//! superclass or interface, [`ExtractSuperclass`] first creates a new
//! abstract superclass for the sister classes.
//!
//! Members that cannot be pulled up do not abort the operation; they are
//! reported as failed [`MemberOutcome`]s next to the committed ones.
//!
//! ```rust,no_run
//! use pullup_gen::GenerifyConfig;
//! use pullup_gen::refactor::operations::{PullUpGeneric, RefactoringContext, RefactoringOperation};
//!
//! let mut ctx = RefactoringContext::load("src/main/java", "Dog", GenerifyConfig::default())?;
//! let op = PullUpGeneric::new("Animal").method("feed");
//!
//! let validation = op.validate(&ctx)?;
//! if validation.is_valid {
//!     println!("{}", op.preview(&ctx)?.diff);
//!     let result = op.apply(&mut ctx)?;
//!     println!("{}", result.description);
//! }
//! # Ok::<(), pullup_gen::error::GenerifyError>(())
//! ```

mod context;
mod extract_superclass;
mod pull_up;

pub use context::{
    MemberOutcome, Outcome, RefactoringContext, RefactoringPreview, RefactoringResult,
    ValidationResult,
};
pub use extract_superclass::ExtractSuperclass;
pub use pull_up::{MemberSelector, PullUpGeneric, Selection};

use crate::error::{GenerifyError, Result};

/// A pull-up style refactoring over a [`RefactoringContext`].
///
/// `validate` and `preview` never touch the context's workspace; only
/// `apply` does.
pub trait RefactoringOperation {
    /// Display name, used in logs and results.
    fn name(&self) -> &'static str;

    /// Check the operation against the context. Members that cannot be
    /// pulled up become warnings; an operation with nothing left to do is
    /// invalid.
    fn validate(&self, ctx: &RefactoringContext) -> Result<ValidationResult>;

    /// Run the operation on a copy of the workspace and report the outline
    /// changes and member outcomes.
    fn preview(&self, ctx: &RefactoringContext) -> Result<RefactoringPreview>;

    /// Apply to the context's workspace.
    fn apply(&self, ctx: &mut RefactoringContext) -> Result<RefactoringResult>;

    /// `validate`, then `apply` if valid.
    fn execute(&self, ctx: &mut RefactoringContext) -> Result<RefactoringResult> {
        let validation = self.validate(ctx)?;
        if !validation.is_valid {
            return Err(GenerifyError::InvalidConfig(validation.errors.join("; ")));
        }
        self.apply(ctx)
    }
}

/// Validates an operation, logs its warnings, then previews or applies it.
pub struct RefactoringRunner {
    dry_run: bool,
}

impl Default for RefactoringRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl RefactoringRunner {
    pub fn new() -> Self {
        Self { dry_run: false }
    }

    /// Preview only; the context is left untouched.
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Fails with [`GenerifyError::InvalidConfig`] when validation fails.
    pub fn run(
        &self,
        operation: &dyn RefactoringOperation,
        ctx: &mut RefactoringContext,
    ) -> Result<RefactoringResult> {
        let validation = operation.validate(ctx)?;

        if !validation.is_valid {
            return Err(GenerifyError::InvalidConfig(validation.errors.join("; ")));
        }

        for warning in &validation.warnings {
            tracing::warn!(operation = operation.name(), "{warning}");
        }

        if self.dry_run {
            let preview = operation.preview(ctx)?;
            Ok(RefactoringResult::success(format!(
                "[DRY RUN] Would apply: {}\n{}",
                operation.name(),
                preview.diff
            ))
            .with_outcomes(preview.outcomes))
        } else {
            operation.apply(ctx)
        }
    }
}
