//! # pullup-gen
//!
//! Generifying "Pull Members Up" and "Extract Superclass" refactorings for
//! Java class hierarchies.
//!
//! When sister classes implement the same method with different types, a
//! plain pull-up cannot write a single abstract declaration for their common
//! superclass. This crate computes the most specific generic declaration
//! that fits every implementation: it anti-unifies the member types, adds
//! fresh type parameters to the superclass and instantiates them in each
//! subclass's `extends` or `implements` reference.
//!
//! This crate provides:
//! - A source model of classes and members, loaded from Java with tree-sitter
//! - The anti-unification engine and hierarchy analysis ([`generify`])
//! - A member selection table with per-member eligibility ([`selection`])
//! - Refactoring operations with validation, preview and apply ([`refactor`])
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pullup_gen::prelude::*;
//!
//! // Pull Dog.feed(Bone) into Animal, generifying over the food type
//! let result = Refactor::in_dir("./src/main/java")
//!     .dry_run()
//!     .run("Dog", &PullUpGeneric::new("Animal").method("feed"))?;
//!
//! println!("{}", result.diff());
//! for failure in result.result.failures() {
//!     println!("skipped {}: {:?}", failure.display, failure.failure());
//! }
//! # Ok::<(), pullup_gen::error::GenerifyError>(())
//! ```
//!
//! ## Member Table
//!
//! ```rust,no_run
//! use pullup_gen::prelude::*;
//!
//! let workspace = JavaLoader::new().load_dir("./src/main/java")?;
//! let dog = workspace.require_class("Dog")?;
//! let animal = workspace.require_class("Animal")?;
//!
//! let mut table = MemberTable::for_class(&workspace, dog);
//! table.refresh(&workspace, animal, None)?;
//! for row in table.rows() {
//!     println!("{:<30} {:?}", row.display, row.can_make_abstract);
//! }
//! # Ok::<(), pullup_gen::error::GenerifyError>(())
//! ```
//!
//! ## Extract Superclass
//!
//! ```rust,no_run
//! use pullup_gen::prelude::*;
//!
//! let result = Refactor::in_dir("./src/main/java")
//!     .run("Dog", &ExtractSuperclass::new("Animal").method("feed"))?;
//! println!("{}", result.summary);
//! # Ok::<(), pullup_gen::error::GenerifyError>(())
//! ```

pub mod config;
pub mod diff;
pub mod error;
pub mod generify;
pub mod lang;
pub mod model;
pub mod refactor;
pub mod selection;

pub use config::GenerifyConfig;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::GenerifyConfig;
    pub use crate::diff::{ClassChange, DiffSummary};
    pub use crate::error::{GenerifyError, MemberFailure, Result};
    pub use crate::generify::{
        AntiUnifier, CommitReport, Coverage, GenerificationPlan, MemberGenerification,
        MemberState, Slot, compute_can_generify, compute_coverage, plan_generification,
    };
    pub use crate::lang::{Java, Language};
    pub use crate::model::{
        ClassDecl, ClassId, JavaLoader, JavaType, MemberRef, MethodDecl, MethodId, TypeParam,
        Workspace,
    };
    pub use crate::refactor::operations::{
        ExtractSuperclass, MemberOutcome, MemberSelector, Outcome, PullUpGeneric,
        RefactoringContext, RefactoringOperation, RefactoringPreview,
        RefactoringResult as OpRefactoringResult, RefactoringRunner, Selection, ValidationResult,
    };
    pub use crate::refactor::{Refactor, RefactorResult};
    pub use crate::selection::{CanMakeAbstract, MemberInfo, MemberTable};
}

pub use prelude::*;
