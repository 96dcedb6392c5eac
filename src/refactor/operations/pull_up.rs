//! Pull members up into a superclass or interface, generifying as needed.

use std::path::Path;

use crate::diff::outline_changes;
use crate::error::{GenerifyError, MemberFailure, Result};
use crate::generify::{
    MemberGenerification, MemberState, commit_implements, compute_can_generify, plan_implements,
};
use crate::model::{ClassId, JavaType, MemberRef, Workspace};
use crate::selection::MemberTable;

use super::RefactoringOperation;
use super::context::{
    MemberOutcome, Outcome, RefactoringContext, RefactoringPreview, RefactoringResult,
    ValidationResult,
};

/// How a member of the source class is named by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberSelector {
    /// First method with this name.
    Method(String),
    /// An interface named in the `implements` clause.
    Implements(String),
    Member(MemberRef),
}

impl MemberSelector {
    /// Resolve against the members `class` declares.
    pub fn resolve(&self, ws: &Workspace, class: ClassId) -> Result<MemberRef> {
        match self {
            MemberSelector::Method(name) => Ok(MemberRef::Method {
                id: ws.require_method(class, name)?,
            }),
            MemberSelector::Implements(name) => ws
                .class(class)
                .super_types()
                .find(|t| t.raw_name() == Some(name.as_str()))
                .map(|interface| MemberRef::Implements {
                    class,
                    interface: interface.clone(),
                })
                .ok_or_else(|| GenerifyError::MemberNotFound {
                    class: ws.class_name(class).to_string(),
                    member: format!("implements {name}"),
                }),
            MemberSelector::Member(member) => Ok(member.clone()),
        }
    }
}

/// Which members an operation pulls up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selectors: Vec<MemberSelector>,
    all_eligible: bool,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, selector: MemberSelector) {
        self.selectors.push(selector);
    }

    pub fn select_all_eligible(&mut self) {
        self.all_eligible = true;
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty() && !self.all_eligible
    }

    /// Build the member table of `source` against `target` and mark the
    /// selected rows. Rows that cannot be selected come back as failures.
    pub(crate) fn apply_to_table(
        &self,
        ws: &Workspace,
        source: ClassId,
        target: ClassId,
        scope: Option<&Path>,
    ) -> Result<(MemberTable, Vec<MemberOutcome>)> {
        let mut table = MemberTable::for_class(ws, source);
        table.refresh(ws, target, scope)?;
        if self.all_eligible {
            table.select_all_abstract();
        }

        let mut rejected = Vec::new();
        for selector in &self.selectors {
            let member = selector.resolve(ws, source)?;
            let marked = table
                .set_checked(&member, true)
                .and_then(|()| table.set_to_abstract(&member, true));
            match marked {
                Ok(()) => {}
                Err(GenerifyError::Member(failure)) => {
                    let display = table
                        .row(&member)
                        .map(|r| r.display.clone())
                        .unwrap_or_else(|| ws.member_name(&member));
                    rejected.push(MemberOutcome {
                        member,
                        display,
                        outcome: Outcome::Failed { failure },
                    });
                }
                Err(err) => return Err(err),
            }
        }
        Ok((table, rejected))
    }
}

/// Pull the selected members of the source class up into every branch
/// below `target`, as abstract generified members.
#[derive(Debug, Clone)]
pub struct PullUpGeneric {
    target: String,
    selection: Selection,
}

impl PullUpGeneric {
    /// Pull up into the class or interface named `target`.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            selection: Selection::new(),
        }
    }

    /// Select the first method named `name`.
    pub fn method(mut self, name: impl Into<String>) -> Self {
        self.selection.push(MemberSelector::Method(name.into()));
        self
    }

    /// Select an `implements` clause entry.
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.selection.push(MemberSelector::Implements(interface.into()));
        self
    }

    /// Select a member by reference.
    pub fn member(mut self, member: MemberRef) -> Self {
        self.selection.push(MemberSelector::Member(member));
        self
    }

    /// Select every member that can be made abstract in the target.
    pub fn all_eligible(mut self) -> Self {
        self.selection.select_all_eligible();
        self
    }

    fn resolve_target(&self, ctx: &RefactoringContext) -> Result<ClassId> {
        ctx.workspace.require_class(&self.target)
    }
}

/// Whether `ancestor` is reachable from `class` through super references.
pub(crate) fn is_supertype(ws: &Workspace, class: ClassId, ancestor: ClassId) -> bool {
    let mut pending = ws.direct_supertypes(class);
    let mut seen = Vec::new();
    while let Some(next) = pending.pop() {
        if next == ancestor {
            return true;
        }
        if !seen.contains(&next) {
            seen.push(next);
            pending.extend(ws.direct_supertypes(next));
        }
    }
    false
}

/// Pull the selected members into `target` one after another.
///
/// Each member is analyzed against the workspace as left by the previous
/// commits, so later members reuse parameters introduced by earlier ones.
pub(crate) fn pull_up_selected(
    ctx: &mut RefactoringContext,
    target: ClassId,
    selection: &Selection,
) -> Result<Vec<MemberOutcome>> {
    let scope = ctx.scope();
    let (table, mut outcomes) =
        selection.apply_to_table(&ctx.workspace, ctx.source_class, target, scope.as_deref())?;

    for row in table.selected() {
        let outcome = match &row.member {
            MemberRef::Method { id } => {
                let mut run = MemberGenerification::new(*id, target);
                match run.run(&mut ctx.workspace, scope.as_deref(), &ctx.config)? {
                    MemberState::Committed(report) => Outcome::Committed(report.clone()),
                    MemberState::AnalyzedIncompatible(failure) => Outcome::Failed {
                        failure: failure.clone(),
                    },
                    other => {
                        return Err(GenerifyError::internal(format!(
                            "generification of '{}' stopped in state {other:?}",
                            row.display
                        )));
                    }
                }
            }
            MemberRef::Implements { class, interface } => {
                let moved = move_interface(
                    &mut ctx.workspace,
                    &row.member,
                    *class,
                    interface,
                    target,
                    scope.as_deref(),
                );
                match moved {
                    Ok(()) => Outcome::InterfaceMoved,
                    Err(GenerifyError::Member(failure)) => Outcome::Failed { failure },
                    Err(err) => return Err(err),
                }
            }
            MemberRef::Field { .. } => Outcome::Failed {
                failure: MemberFailure::UnsupportedMember {
                    member: row.display.clone(),
                },
            },
        };
        if let Outcome::Failed { failure } = &outcome {
            tracing::debug!(member = %row.display, reason = %failure, "member not pulled up");
        }
        outcomes.push(MemberOutcome {
            member: row.member.clone(),
            display: row.display.clone(),
            outcome,
        });
    }
    Ok(outcomes)
}

fn move_interface(
    ws: &mut Workspace,
    member: &MemberRef,
    class: ClassId,
    interface: &JavaType,
    target: ClassId,
    scope: Option<&Path>,
) -> Result<()> {
    let coverage = compute_can_generify(ws, member, target, scope)?;
    let plan = plan_implements(ws, class, interface, &coverage)?;
    commit_implements(ws, &plan)
}

impl RefactoringOperation for PullUpGeneric {
    fn name(&self) -> &'static str {
        "Pull Members Up (Generic)"
    }

    fn validate(&self, ctx: &RefactoringContext) -> Result<ValidationResult> {
        let ws = &ctx.workspace;
        let Some(target) = ws.find_class(&self.target) else {
            return Ok(ValidationResult::invalid(format!(
                "Target class '{}' not found",
                self.target
            )));
        };
        if target == ctx.source_class {
            return Ok(ValidationResult::invalid(
                "Cannot pull members up into the class itself",
            ));
        }
        if !is_supertype(ws, ctx.source_class, target) {
            return Ok(ValidationResult::invalid(format!(
                "'{}' is not a supertype of '{}'",
                self.target,
                ctx.source_name()
            )));
        }
        if self.selection.is_empty() {
            return Ok(ValidationResult::invalid("No members selected"));
        }

        let scope = ctx.scope();
        let mut result = ValidationResult::valid();
        let (table, rejected) =
            match self.selection.apply_to_table(ws, ctx.source_class, target, scope.as_deref()) {
                Ok(marked) => marked,
                Err(err @ GenerifyError::MemberNotFound { .. }) => {
                    return Ok(ValidationResult::invalid(err.to_string()));
                }
                Err(err) => return Err(err),
            };
        for outcome in &rejected {
            if let Some(failure) = outcome.failure() {
                result = result.with_warning(format!("{}: {failure}", outcome.display));
            }
        }
        if table.selected().next().is_none() {
            result = result.with_error("None of the selected members can be pulled up");
        }
        Ok(result)
    }

    fn preview(&self, ctx: &RefactoringContext) -> Result<RefactoringPreview> {
        let mut scratch = ctx.clone();
        let outcomes = pull_up_selected(&mut scratch, self.resolve_target(ctx)?, &self.selection)?;

        let mut preview = RefactoringPreview::new(format!(
            "Pull members of {} up into {}",
            ctx.source_name(),
            self.target
        ));
        let changes = outline_changes(&ctx.workspace, &scratch.workspace);
        let diff: Vec<_> = changes.iter().map(|c| c.unified()).collect();
        for change in changes {
            preview.add_change(change);
        }
        preview.outcomes = outcomes;
        Ok(preview.with_diff(diff.join("\n")))
    }

    fn apply(&self, ctx: &mut RefactoringContext) -> Result<RefactoringResult> {
        let target = self.resolve_target(ctx)?;
        let before = ctx.workspace.clone();
        let outcomes = pull_up_selected(ctx, target, &self.selection)?;
        let changes = outline_changes(&before, &ctx.workspace);

        let committed = outcomes.iter().filter(|o| !o.is_failure()).count();
        tracing::info!(
            source = ctx.source_name(),
            target = %self.target,
            committed,
            failed = outcomes.len() - committed,
            "pull-up finished"
        );
        Ok(RefactoringResult::success(format!(
            "Pulled {committed} member(s) of {} up into {}",
            ctx.source_name(),
            self.target
        ))
        .with_outcomes(outcomes)
        .with_changes(&changes))
    }
}
