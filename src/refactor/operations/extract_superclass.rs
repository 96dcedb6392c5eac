//! Extract a common abstract superclass from sister classes.

use crate::diff::outline_changes;
use crate::error::{GenerifyError, MemberFailure, Result};
use crate::generify::{compare::implements_interface, find_compatible_methods};
use crate::model::{ClassDecl, ClassId, JavaType, MemberRef, Workspace};

use super::RefactoringOperation;
use super::context::{RefactoringContext, RefactoringPreview, RefactoringResult, ValidationResult};
use super::pull_up::{MemberSelector, Selection, pull_up_selected};

/// Create a new abstract class between the source class (and every sister
/// sharing the selected members) and their current superclass, then pull
/// the selected members up into it.
#[derive(Debug, Clone)]
pub struct ExtractSuperclass {
    name: String,
    selectors: Vec<MemberSelector>,
}

impl ExtractSuperclass {
    /// Extract a superclass called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selectors: Vec::new(),
        }
    }

    /// Select the first method named `name`.
    pub fn method(mut self, name: impl Into<String>) -> Self {
        self.selectors.push(MemberSelector::Method(name.into()));
        self
    }

    /// Select an `implements` clause entry.
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.selectors.push(MemberSelector::Implements(interface.into()));
        self
    }

    /// Select a member by reference.
    pub fn member(mut self, member: MemberRef) -> Self {
        self.selectors.push(MemberSelector::Member(member));
        self
    }

    fn selection(&self) -> Selection {
        let mut selection = Selection::new();
        for selector in &self.selectors {
            selection.push(selector.clone());
        }
        selection
    }

    fn resolve_members(&self, ctx: &RefactoringContext) -> Result<Vec<MemberRef>> {
        self.selectors
            .iter()
            .map(|s| s.resolve(&ctx.workspace, ctx.source_class))
            .collect()
    }

    /// Classes that will extend the new superclass: the source and every
    /// class of its directory with the same superclass that has a
    /// counterpart for each selected member.
    pub fn sister_classes(&self, ctx: &RefactoringContext) -> Result<Vec<ClassId>> {
        let ws = &ctx.workspace;
        let members = self.resolve_members(ctx)?;
        let source = ws.class(ctx.source_class);
        let superclass = source.extends.first().and_then(JavaType::raw_name);
        let scope = ctx.scope();

        let mut sisters = Vec::new();
        for (id, decl) in ws.classes() {
            if !decl.is_plain_class()
                || decl.extends.first().and_then(JavaType::raw_name) != superclass
                || scope.as_ref().is_some_and(|dir| &decl.directory != dir)
            {
                continue;
            }
            if has_counterparts(ws, id, &members)? {
                sisters.push(id);
            }
        }
        Ok(sisters)
    }
}

fn has_counterparts(ws: &Workspace, class: ClassId, members: &[MemberRef]) -> Result<bool> {
    for member in members {
        let found = match member {
            MemberRef::Method { id } => {
                let candidate = ws
                    .method(*id)
                    .ok_or_else(|| GenerifyError::internal("selected method vanished"))?;
                match find_compatible_methods(ws, candidate, class, false).count() {
                    0 => false,
                    1 => true,
                    _ => {
                        return Err(MemberFailure::AmbiguousOverloading {
                            member: candidate.name.clone(),
                            class: ws.class_name(class).to_string(),
                        }
                        .into());
                    }
                }
            }
            MemberRef::Implements { interface, .. } => implements_interface(ws, class, interface),
            MemberRef::Field { .. } => {
                return Err(MemberFailure::UnsupportedMember {
                    member: ws.member_name(member),
                }
                .into());
            }
        };
        if !found {
            return Ok(false);
        }
    }
    Ok(true)
}

fn is_java_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

impl RefactoringOperation for ExtractSuperclass {
    fn name(&self) -> &'static str {
        "Extract Superclass (Generic)"
    }

    fn validate(&self, ctx: &RefactoringContext) -> Result<ValidationResult> {
        let ws = &ctx.workspace;
        if !is_java_identifier(&self.name) {
            return Ok(ValidationResult::invalid(format!(
                "'{}' is not a valid class name",
                self.name
            )));
        }
        if ws.find_class(&self.name).is_some() {
            return Ok(ValidationResult::invalid(format!(
                "Class '{}' already exists",
                self.name
            )));
        }
        let source = ws.class(ctx.source_class);
        if !source.is_plain_class() {
            return Ok(ValidationResult::invalid(format!(
                "Cannot extract a superclass from {} {}",
                source.kind.keyword(),
                source.name
            )));
        }
        if self.selectors.is_empty() {
            return Ok(ValidationResult::invalid("No members selected"));
        }

        match self.sister_classes(ctx) {
            Ok(sisters) if sisters.len() < 2 => Ok(ValidationResult::valid().with_warning(
                format!("No sister class of {} shares the selected members", ctx.source_name()),
            )),
            Ok(_) => Ok(ValidationResult::valid()),
            Err(err @ (GenerifyError::Member(_) | GenerifyError::MemberNotFound { .. })) => {
                Ok(ValidationResult::invalid(err.to_string()))
            }
            Err(err) => Err(err),
        }
    }

    fn preview(&self, ctx: &RefactoringContext) -> Result<RefactoringPreview> {
        let mut scratch = ctx.clone();
        let result = self.apply(&mut scratch)?;

        let mut preview = RefactoringPreview::new(format!(
            "Extract superclass {} from {}",
            self.name,
            ctx.source_name()
        ));
        let changes = outline_changes(&ctx.workspace, &scratch.workspace);
        let diff: Vec<_> = changes.iter().map(|c| c.unified()).collect();
        for change in changes {
            preview.add_change(change);
        }
        preview.outcomes = result.outcomes;
        Ok(preview.with_diff(diff.join("\n")))
    }

    fn apply(&self, ctx: &mut RefactoringContext) -> Result<RefactoringResult> {
        let sisters = self.sister_classes(ctx)?;
        let before = ctx.workspace.clone();

        let source = ctx.workspace.class(ctx.source_class);
        let mut decl = ClassDecl::class(self.name.clone())
            .public()
            .abstract_class()
            .in_directory(source.directory.clone());
        decl.extends = source.extends.clone();
        let superclass = ctx.workspace.add_class(decl);

        let reference = JavaType::class(self.name.clone());
        for sister in &sisters {
            ctx.workspace.class_mut(*sister).extends = vec![reference.clone()];
        }
        tracing::info!(
            superclass = %self.name,
            sisters = sisters.len(),
            "created superclass"
        );

        let outcomes = pull_up_selected(ctx, superclass, &self.selection())?;
        let changes = outline_changes(&before, &ctx.workspace);
        Ok(RefactoringResult::success(format!(
            "Extracted {} from {} class(es)",
            self.name,
            sisters.len()
        ))
        .with_outcomes(outcomes)
        .with_changes(&changes))
    }
}
