//! Generification driver: plans and commits one pulled-up member.
//!
//! Planning is pure over the workspace. It gathers the sister methods,
//! reads the substitution already implied by the target's type parameters,
//! anti-unifies every slot, and records the abstract skeleton together with
//! every type parameter and type argument that has to be added. Only
//! [`commit`] mutates the workspace.

use serde::Serialize;

use super::antiunify::AntiUnifier;
use super::compare::same_method;
use super::group::TypeGroup;
use super::hierarchy::{self, Coverage};
use super::slot::Slot;
use super::substitution::DependentSubstitution;
use crate::config::GenerifyConfig;
use crate::error::{GenerifyError, MemberFailure, Result};
use crate::model::{
    ClassId, JavaType, MemberRef, MethodDecl, MethodId, TypeParam, TypeVarOwner, Visibility,
    Workspace,
};

const OVERRIDE: &str = "Override";

/// A sister class and its counterpart method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SisterMethod {
    pub class: ClassId,
    pub method: MethodId,
}

/// The type a slot of the abstract method gets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerifiedSlot {
    pub slot: Slot,
    pub ty: JavaType,
}

/// Type arguments appended to the reference from `class` to `parent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferencePatch {
    pub class: ClassId,
    pub parent: ClassId,
    /// `Object` arguments filling a raw or short reference first.
    pub padding: Vec<JavaType>,
    pub args: Vec<JavaType>,
}

/// Type parameters an intermediate class declares to pass new target
/// parameters through to its own subclasses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForwardedParams {
    pub class: ClassId,
    pub params: Vec<TypeParam>,
}

/// Everything committing one generified method changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerificationPlan {
    pub member: MethodId,
    pub source: ClassId,
    pub target: ClassId,
    pub sisters: Vec<SisterMethod>,
    /// Substitution implied by the target's existing type parameters.
    pub baseline: DependentSubstitution,
    pub slots: Vec<GenerifiedSlot>,
    pub skeleton: MethodDecl,
    /// Parameters to append to the target, in order.
    pub new_parameters: DependentSubstitution,
    pub reference_patches: Vec<ReferencePatch>,
    pub forwarded: Vec<ForwardedParams>,
    /// Abstract method of the target with the final signature, replaced on commit.
    pub replaces_stub: Option<MethodId>,
    /// Method of the target the skeleton is inserted before.
    pub anchor: Option<MethodId>,
    /// Declarations removed on commit.
    pub removes: Vec<MethodId>,
    pub make_target_abstract: bool,
}

impl GenerificationPlan {
    /// Whether the plan introduces type parameters.
    pub fn is_generic(&self) -> bool {
        !self.new_parameters.is_empty() || !self.slots.is_empty()
    }

    /// A short human-readable account of the plan.
    pub fn describe(&self, ws: &Workspace) -> String {
        let in_interface = ws.class(self.target).is_interface();
        let mut lines = vec![format!(
            "{} -> {}: {}",
            ws.class_name(self.source),
            ws.class_name(self.target),
            crate::model::outline::method_line(&self.skeleton, in_interface)
        )];
        for (param, group) in self.new_parameters.iter() {
            lines.push(format!("  new type parameter {} = {}", param, group.describe(ws)));
        }
        for patch in &self.reference_patches {
            let args: Vec<_> = patch
                .padding
                .iter()
                .chain(&patch.args)
                .map(|t| t.to_string())
                .collect();
            lines.push(format!(
                "  {} -> {}: append <{}>",
                ws.class_name(patch.class),
                ws.class_name(patch.parent),
                args.join(", ")
            ));
        }
        lines.join("\n")
    }
}

/// What a commit did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitReport {
    /// The abstract method now declared by the target.
    pub method: MethodId,
    pub replaced_stub: bool,
    pub new_type_params: Vec<TypeParam>,
    pub patched_references: usize,
    pub annotated: Vec<MethodId>,
    pub removed: Vec<MethodId>,
    pub target_made_abstract: bool,
}

/// Collect the one compatible method of every sister class.
pub fn collect_sister_methods(
    ws: &Workspace,
    candidate: &MethodDecl,
    coverage: &Coverage,
) -> Result<Vec<SisterMethod>> {
    let must_be_public = ws.class(coverage.target).is_interface();
    coverage
        .sisters()
        .map(|class| {
            let mut found = hierarchy::find_compatible_methods(ws, candidate, class, must_be_public);
            match (found.next(), found.next()) {
                (Some((method, _)), None) => Ok(SisterMethod { class, method }),
                (None, _) => Err(GenerifyError::internal(format!(
                    "sister class {} lost its '{}' counterpart",
                    ws.class_name(class),
                    candidate.name
                ))),
                (Some(_), Some(_)) => Err(GenerifyError::internal(format!(
                    "sister class {} has several '{}' counterparts",
                    ws.class_name(class),
                    candidate.name
                ))),
            }
        })
        .collect()
}

// Arguments of the reference from `child` to `parent`, padded with Object
// up to the parent's arity.
fn reference_args(ws: &Workspace, child: ClassId, parent: ClassId) -> Result<Vec<JavaType>> {
    let reference = ws.reference_to(child, parent).ok_or_else(|| {
        GenerifyError::internal(format!(
            "{} does not reference {}",
            ws.class_name(child),
            ws.class_name(parent)
        ))
    })?;
    let arity = ws.class(parent).type_params.len();
    let mut args = reference.type_args().to_vec();
    if args.len() < arity {
        args.resize(arity, JavaType::object());
    }
    Ok(args)
}

/// The type arguments `class` effectively passes to the target, resolved
/// through the super references of every intermediate class on its path.
pub fn resolve_target_args(
    ws: &Workspace,
    coverage: &Coverage,
    class: ClassId,
) -> Result<Vec<JavaType>> {
    let path = coverage.path_from_target(class);
    let Some(first) = path.first() else {
        return Ok(Vec::new());
    };
    let mut args = reference_args(ws, *first, coverage.target)?;

    for pair in path.windows(2) {
        let (upper, lower) = (pair[0], pair[1]);
        let upper_decl = ws.class(upper);
        let lower_args = reference_args(ws, lower, upper)?;
        let lookup = |owner: &TypeVarOwner, name: &str| {
            if *owner != TypeVarOwner::class(upper_decl.name.as_str()) {
                return None;
            }
            upper_decl
                .type_params
                .iter()
                .position(|p| p.name() == name)
                .and_then(|i| lower_args.get(i).cloned())
        };
        args = args.iter().map(|a| a.substitute(&lookup)).collect();
    }
    Ok(args)
}

/// The substitution already implied by the target's type parameters.
pub fn baseline_substitution(ws: &Workspace, coverage: &Coverage) -> Result<DependentSubstitution> {
    let mut resolved = Vec::new();
    for class in coverage.sisters() {
        resolved.push((class, resolve_target_args(ws, coverage, class)?));
    }

    let mut baseline = DependentSubstitution::new();
    for (index, param) in ws.class(coverage.target).type_params.iter().enumerate() {
        let group = resolved
            .iter()
            .map(|(class, args)| {
                args.get(index).cloned().map(|t| (*class, t)).ok_or_else(|| {
                    GenerifyError::internal(format!(
                        "{} passes no argument for {param}",
                        ws.class_name(*class)
                    ))
                })
            })
            .collect::<Result<TypeGroup>>()?;
        baseline.insert(param.clone(), group)?;
    }
    Ok(baseline)
}

fn build_skeleton(
    representative: &MethodDecl,
    slots: &[GenerifiedSlot],
    target_is_interface: bool,
) -> Result<MethodDecl> {
    let mut skeleton = representative.clone();
    skeleton.has_body = false;
    skeleton.modifiers.is_abstract = true;
    skeleton.modifiers.is_default = false;
    skeleton.modifiers.is_static = false;
    skeleton.modifiers.is_final = false;
    skeleton.annotations.retain(|a| a != OVERRIDE);
    if target_is_interface {
        skeleton.modifiers.visibility = Visibility::Public;
    }
    for generified in slots {
        if !generified.slot.set_in(&mut skeleton, generified.ty.clone()) {
            return Err(GenerifyError::internal(format!(
                "skeleton of {} has no {}",
                representative.name, generified.slot
            )));
        }
    }
    Ok(skeleton)
}

fn fresh_forwarded_name(
    config: &GenerifyConfig,
    base: &TypeParam,
    bound: &mut Vec<String>,
) -> TypeParam {
    let mut name = base.name().to_string();
    while bound.contains(&name) {
        name.push(config.filler);
    }
    bound.push(name.clone());
    TypeParam::new(name)
}

// The first method after `member` in the source whose exact counterpart the
// target already declares.
fn find_anchor(ws: &Workspace, member: MethodId, source: ClassId, target: ClassId) -> Option<MethodId> {
    ws.methods_of(source)
        .skip_while(|(id, _)| *id != member)
        .skip(1)
        .find_map(|(_, sibling)| {
            ws.find_methods_by_name(target, &sibling.name)
                .find(|(_, m)| same_method(m, sibling))
                .map(|(id, _)| id)
        })
}

/// Plan the generified pull-up of `member` into `target`.
///
/// `coverage` must come from [`hierarchy::compute_can_generify`] for the
/// same member and target.
pub fn plan_generification(
    ws: &Workspace,
    member: MethodId,
    coverage: &Coverage,
    target: ClassId,
    config: &GenerifyConfig,
) -> Result<GenerificationPlan> {
    if coverage.target != target {
        return Err(GenerifyError::internal(format!(
            "coverage computed for {} used with target {}",
            ws.class_name(coverage.target),
            ws.class_name(target)
        )));
    }
    let candidate = ws
        .method(member)
        .ok_or_else(|| GenerifyError::internal(format!("method#{} is not in the workspace", member.0)))?;
    let source = ws
        .method_owner(member)
        .ok_or_else(|| GenerifyError::internal("method without owner"))?;
    let target_decl = ws.class(target);

    let sisters = collect_sister_methods(ws, candidate, coverage)?;
    let sister_decls = sisters
        .iter()
        .map(|s| {
            ws.method(s.method)
                .map(|m| (s.class, m))
                .ok_or_else(|| GenerifyError::internal("sister method vanished"))
        })
        .collect::<Result<Vec<_>>>()?;

    let baseline = baseline_substitution(ws, coverage)?;
    let mut working = baseline.clone();

    let mut bound_names = ws.bound_type_names(target);
    bound_names.extend(baseline.keys().map(|k| k.name().to_string()));
    bound_names.extend(candidate.type_params.iter().map(|p| p.name().to_string()));
    let mut unifier = AntiUnifier::new(
        config,
        target_decl.name.clone(),
        candidate.name.clone(),
        bound_names,
    );
    let slot_types = unifier.antiunify_signature(&sister_decls, &mut working)?;

    let slots: Vec<_> = slot_types
        .into_iter()
        .map(|(slot, ty)| GenerifiedSlot { slot, ty })
        .collect();

    // The source's own declaration when it is a sister, the first sister otherwise.
    let representative = sister_decls
        .iter()
        .find(|(class, _)| *class == source)
        .or_else(|| sister_decls.first())
        .map(|(_, m)| *m)
        .unwrap_or(candidate);
    let skeleton = build_skeleton(representative, &slots, target_decl.is_interface())?;
    let replaces_stub = hierarchy::check_final_signature(ws, &skeleton, target)?;

    let new_parameters = DependentSubstitution::difference(&working, &baseline);

    let mut forwarded = Vec::new();
    if !new_parameters.is_empty() {
        for intermediate in &coverage.intermediates {
            let mut bound = ws.bound_type_names(*intermediate);
            let params = new_parameters
                .keys()
                .map(|p| fresh_forwarded_name(config, p, &mut bound))
                .collect();
            forwarded.push(ForwardedParams {
                class: *intermediate,
                params,
            });
        }
    }

    let mut reference_patches = Vec::new();
    if !new_parameters.is_empty() {
        for (child, parent) in coverage.edges() {
            let args = if let Some(f) = forwarded.iter().find(|f| f.class == child) {
                let owner = ws.class_name(child);
                f.params.iter().map(|p| p.as_type_in(owner)).collect()
            } else {
                new_parameters
                    .keys()
                    .map(|p| new_parameters.get_concrete(p, child).cloned())
                    .collect::<Result<Vec<_>>>()?
            };
            let arity = ws.class(parent).type_params.len();
            let present = ws
                .reference_to(child, parent)
                .map(|r| r.type_args().len())
                .unwrap_or_default();
            let padding = vec![JavaType::object(); arity.saturating_sub(present)];
            reference_patches.push(ReferencePatch {
                class: child,
                parent,
                padding,
                args,
            });
        }
    }

    let removes = if candidate.modifiers.is_abstract || candidate.modifiers.is_default {
        vec![member]
    } else {
        Vec::new()
    };

    let plan = GenerificationPlan {
        member,
        source,
        target,
        sisters,
        baseline,
        slots,
        skeleton,
        new_parameters,
        reference_patches,
        forwarded,
        replaces_stub,
        anchor: find_anchor(ws, member, source, target),
        removes,
        make_target_abstract: !target_decl.is_interface() && !target_decl.is_abstract(),
    };
    tracing::debug!(
        member = %candidate.name,
        target = ws.class_name(target),
        new_parameters = plan.new_parameters.len(),
        "planned generification"
    );
    Ok(plan)
}

/// Apply a plan to the workspace.
///
/// The overload guard runs again against the current state of the target,
/// so a plan made stale by an earlier commit is refused rather than applied.
pub fn commit(
    ws: &mut Workspace,
    plan: &GenerificationPlan,
    config: &GenerifyConfig,
) -> Result<CommitReport> {
    let stub = hierarchy::check_final_signature(ws, &plan.skeleton, plan.target)?;
    for sister in &plan.sisters {
        if ws.method(sister.method).is_none() {
            return Err(GenerifyError::internal(format!(
                "sister method#{} vanished before commit",
                sister.method.0
            )));
        }
    }

    let new_type_params: Vec<TypeParam> = plan.new_parameters.keys().cloned().collect();
    for param in &new_type_params {
        ws.add_type_param(plan.target, param.clone());
    }
    for forwarded in &plan.forwarded {
        for param in &forwarded.params {
            ws.add_type_param(forwarded.class, param.clone());
        }
    }
    for patch in &plan.reference_patches {
        let mut args = patch.padding.clone();
        args.extend(patch.args.iter().cloned());
        ws.append_reference_args(patch.class, patch.parent, &args)?;
    }

    let method = match stub {
        Some(stub) => {
            ws.replace_method(stub, plan.skeleton.clone())?;
            stub
        }
        None => {
            let anchor = plan.anchor.filter(|a| ws.method_owner(*a) == Some(plan.target));
            ws.insert_method(plan.target, plan.skeleton.clone(), anchor)
        }
    };

    let mut annotated = Vec::new();
    if config.add_override_annotations {
        for sister in &plan.sisters {
            if plan.removes.contains(&sister.method) {
                continue;
            }
            if let Some(decl) = ws.method_mut(sister.method)
                && !decl.annotations.iter().any(|a| a == OVERRIDE)
            {
                decl.annotations.push(OVERRIDE.to_string());
                annotated.push(sister.method);
            }
        }
    }

    let mut removed = Vec::new();
    for id in &plan.removes {
        if ws.remove_method(*id).is_some() {
            removed.push(*id);
        }
    }

    let target_made_abstract = plan.make_target_abstract && !ws.class(plan.target).is_abstract();
    if target_made_abstract {
        ws.class_mut(plan.target).modifiers.is_abstract = true;
    }

    tracing::info!(
        member = %plan.skeleton.name,
        target = ws.class_name(plan.target),
        new_type_params = new_type_params.len(),
        patched = plan.reference_patches.len(),
        "committed generified pull-up"
    );

    Ok(CommitReport {
        method,
        replaced_stub: stub.is_some(),
        new_type_params,
        patched_references: plan.reference_patches.len(),
        annotated,
        removed,
        target_made_abstract,
    })
}

/// Pull-up of an `implements` clause shared by every branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImplementsPlan {
    pub source: ClassId,
    pub target: ClassId,
    pub interface: JavaType,
    pub covered: Vec<ClassId>,
}

/// Plan moving `interface` from `source` to `target`.
pub fn plan_implements(
    ws: &Workspace,
    source: ClassId,
    interface: &JavaType,
    coverage: &Coverage,
) -> Result<ImplementsPlan> {
    if !super::compare::implements_interface(ws, source, interface) {
        return Err(MemberFailure::MemberNotImplemented {
            member: interface.to_string(),
            class: ws.class_name(source).to_string(),
        }
        .into());
    }
    Ok(ImplementsPlan {
        source,
        target: coverage.target,
        interface: interface.clone(),
        covered: coverage.sisters().collect(),
    })
}

/// Declare the interface on the target and drop it from the source.
pub fn commit_implements(ws: &mut Workspace, plan: &ImplementsPlan) -> Result<()> {
    let name = plan
        .interface
        .raw_name()
        .ok_or_else(|| GenerifyError::internal("implements marker is not a class type"))?
        .to_string();

    let target = ws.class_mut(plan.target);
    let already = target
        .super_types()
        .any(|t| t.raw_name() == Some(name.as_str()));
    if !already {
        if target.is_interface() {
            target.extends.push(plan.interface.clone());
        } else {
            target.implements.push(plan.interface.clone());
        }
    }

    let source = ws.class_mut(plan.source);
    source
        .implements
        .retain(|t| t.raw_name() != Some(name.as_str()));
    if source.is_interface() {
        source.extends.retain(|t| t.raw_name() != Some(name.as_str()));
    }
    tracing::info!(interface = %plan.interface, "committed implements pull-up");
    Ok(())
}

/// Where one member stands in a generification pass.
#[derive(Debug, Clone)]
pub enum MemberState {
    Unanalyzed,
    AnalyzedCompatible(Coverage),
    AnalyzedIncompatible(MemberFailure),
    Planned(Box<GenerificationPlan>),
    Committed(CommitReport),
}

impl MemberState {
    /// Whether no further transition is possible in this pass.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MemberState::AnalyzedIncompatible(_) | MemberState::Committed(_)
        )
    }

    pub fn failure(&self) -> Option<&MemberFailure> {
        match self {
            MemberState::AnalyzedIncompatible(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Drives one method member through analysis, planning and commit.
///
/// Member-level failures move it to [`MemberState::AnalyzedIncompatible`];
/// internal errors are returned.
#[derive(Debug, Clone)]
pub struct MemberGenerification {
    pub member: MethodId,
    pub target: ClassId,
    state: MemberState,
}

impl MemberGenerification {
    pub fn new(member: MethodId, target: ClassId) -> Self {
        Self {
            member,
            target,
            state: MemberState::Unanalyzed,
        }
    }

    pub fn state(&self) -> &MemberState {
        &self.state
    }

    fn settle<T>(&mut self, outcome: Result<T>, next: impl FnOnce(T) -> MemberState) -> Result<()> {
        match outcome {
            Ok(value) => {
                self.state = next(value);
                Ok(())
            }
            Err(GenerifyError::Member(failure)) => {
                self.state = MemberState::AnalyzedIncompatible(failure);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    pub fn analyze(&mut self, ws: &Workspace, scope: Option<&std::path::Path>) -> Result<()> {
        if !matches!(self.state, MemberState::Unanalyzed) {
            return Ok(());
        }
        let member = MemberRef::Method { id: self.member };
        let outcome = hierarchy::compute_can_generify(ws, &member, self.target, scope);
        self.settle(outcome, MemberState::AnalyzedCompatible)
    }

    pub fn plan(&mut self, ws: &Workspace, config: &GenerifyConfig) -> Result<()> {
        let MemberState::AnalyzedCompatible(coverage) = &self.state else {
            return Ok(());
        };
        let outcome = plan_generification(ws, self.member, coverage, self.target, config);
        self.settle(outcome, |plan| MemberState::Planned(Box::new(plan)))
    }

    pub fn commit(&mut self, ws: &mut Workspace, config: &GenerifyConfig) -> Result<()> {
        let MemberState::Planned(plan) = &self.state else {
            return Ok(());
        };
        let outcome = commit(ws, plan, config);
        self.settle(outcome, MemberState::Committed)
    }

    /// Analyze, plan and commit in one go.
    pub fn run(
        &mut self,
        ws: &mut Workspace,
        scope: Option<&std::path::Path>,
        config: &GenerifyConfig,
    ) -> Result<&MemberState> {
        self.analyze(ws, scope)?;
        self.plan(ws, config)?;
        self.commit(ws, config)?;
        Ok(&self.state)
    }
}
