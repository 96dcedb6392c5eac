//! Generification engine for pulling members up a class hierarchy.
//!
//! When a method is pulled up into a superclass or interface, the sibling
//! implementations of that method often differ only in the concrete types
//! they mention (`feed(Bone)` in `Dog`, `feed(Fish)` in `Cat`). The engine
//! finds the most specific common signature, introduces type parameters on
//! the target where the siblings diverge, and instantiates those parameters
//! in every `extends`/`implements` reference on the way down.
//!
//! The work is split in three phases:
//!
//! 1. [`compute_can_generify`] walks the hierarchy below the target and
//!    returns the [`Coverage`]: the sister classes holding a counterpart and
//!    the abstract classes the walk passed through.
//! 2. [`plan_generification`] anti-unifies the sister signatures and returns
//!    a [`GenerificationPlan`] without touching the workspace.
//! 3. [`commit`] applies the plan.
//!
//! ```rust
//! use pullup_gen::generify::{commit, compute_can_generify, plan_generification};
//! use pullup_gen::model::{ClassDecl, JavaType, MemberRef, MethodDecl, Workspace};
//! use pullup_gen::GenerifyConfig;
//!
//! let mut ws = Workspace::new();
//! let animal = ws.add_class(ClassDecl::class("Animal").abstract_class().in_directory("zoo"));
//! let dog = ws.add_class(ClassDecl::class("Dog").extends(JavaType::class("Animal")).in_directory("zoo"));
//! let cat = ws.add_class(ClassDecl::class("Cat").extends(JavaType::class("Animal")).in_directory("zoo"));
//! let feed = ws.add_method(dog, MethodDecl::new("feed").public().param("food", JavaType::class("Bone")));
//! ws.add_method(cat, MethodDecl::new("feed").public().param("food", JavaType::class("Fish")));
//!
//! let config = GenerifyConfig::default();
//! let coverage = compute_can_generify(&ws, &MemberRef::Method { id: feed }, animal, None).unwrap();
//! let plan = plan_generification(&ws, feed, &coverage, animal, &config).unwrap();
//! commit(&mut ws, &plan, &config).unwrap();
//!
//! assert_eq!(ws.class(animal).type_params[0].name(), "TFeed0");
//! assert_eq!(ws.class(dog).extends[0].to_string(), "Animal<Bone>");
//! ```

mod antiunify;
pub mod compare;
mod driver;
mod group;
mod hierarchy;
mod slot;
mod substitution;

pub use antiunify::{AntiUnifier, SlotTypes};
pub use driver::{
    CommitReport, ForwardedParams, GenerificationPlan, GenerifiedSlot, ImplementsPlan,
    MemberGenerification, MemberState, ReferencePatch, SisterMethod, baseline_substitution,
    collect_sister_methods, commit, commit_implements, plan_generification, plan_implements,
    resolve_target_args,
};
pub use group::TypeGroup;
pub use hierarchy::{
    Coverage, can_generify, check_final_signature, check_target_overloads, compute_can_generify,
    compute_coverage, direct_abstract_pullup, find_compatible_methods, is_compatible,
    is_semi_compatible,
};
pub use slot::Slot;
pub use substitution::DependentSubstitution;
