//! Hierarchy compatibility analysis.
//!
//! Walks the direct subclasses of a target class (inside a directory scope)
//! and checks that every branch has exactly one counterpart of a candidate
//! member. Abstract classes and interfaces may defer the member to all of
//! their own subclasses; concrete classes may not.

use indexmap::{IndexMap, IndexSet};
use std::path::Path;

use super::compare::{
    anti_unifiable, has_same_field, has_same_method, implements_interface, params_anti_unifiable,
    same_name, same_signature,
};
use crate::error::{GenerifyError, MemberFailure, Result};
use crate::model::{ClassId, FieldDecl, JavaType, MemberRef, MethodDecl, MethodId, Workspace};

/// Same name, neither private, anti-unifiable return and parameter types.
/// With `must_be_public`, `other` must also be public.
pub fn is_compatible(candidate: &MethodDecl, other: &MethodDecl, must_be_public: bool) -> bool {
    same_name(candidate, other)
        && !candidate.modifiers.is_private()
        && !other.modifiers.is_private()
        && (!must_be_public || other.modifiers.is_public())
        && anti_unifiable(&candidate.return_type, &other.return_type)
        && params_anti_unifiable(candidate, other)
}

/// Same name and anti-unifiable parameter types; the return type is free.
pub fn is_semi_compatible(candidate: &MethodDecl, other: &MethodDecl) -> bool {
    same_name(candidate, other) && params_anti_unifiable(candidate, other)
}

/// Methods of `class` compatible with `candidate`.
pub fn find_compatible_methods<'a>(
    ws: &'a Workspace,
    candidate: &'a MethodDecl,
    class: ClassId,
    must_be_public: bool,
) -> impl Iterator<Item = (MethodId, &'a MethodDecl)> + 'a {
    ws.find_methods_by_name(class, &candidate.name)
        .filter(move |(_, m)| is_compatible(candidate, m, must_be_public))
}

/// The classes covering every branch below a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coverage {
    pub target: ClassId,
    /// Classes holding the counterpart, in discovery order.
    pub accepted: IndexSet<ClassId>,
    /// Abstract classes and interfaces the walk passed through.
    pub intermediates: IndexSet<ClassId>,
    parents: IndexMap<ClassId, ClassId>,
}

impl Coverage {
    fn new(target: ClassId) -> Self {
        Self {
            target,
            accepted: IndexSet::new(),
            intermediates: IndexSet::new(),
            parents: IndexMap::new(),
        }
    }

    /// The sister classes.
    pub fn sisters(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.accepted.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    /// The node through which `class` was reached.
    pub fn parent(&self, class: ClassId) -> Option<ClassId> {
        self.parents.get(&class).copied()
    }

    /// Every `(child, parent)` edge the walk followed, in discovery order.
    pub fn edges(&self) -> impl Iterator<Item = (ClassId, ClassId)> + '_ {
        self.parents.iter().map(|(c, p)| (*c, *p))
    }

    /// The classes between the target and `class`, starting below the
    /// target and ending with `class` itself.
    pub fn path_from_target(&self, class: ClassId) -> Vec<ClassId> {
        let mut path = vec![class];
        let mut current = class;
        while let Some(parent) = self.parent(current) {
            if parent == self.target {
                break;
            }
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    fn visit(&mut self, class: ClassId, parent: ClassId) -> bool {
        if class == self.target || self.parents.contains_key(&class) {
            return false;
        }
        self.parents.insert(class, parent);
        true
    }
}

enum BranchTest<'a> {
    Compatible {
        candidate: &'a MethodDecl,
        must_be_public: bool,
    },
    SameMethod(&'a MethodDecl),
    SameField(&'a FieldDecl),
    Implements(&'a JavaType),
}

impl BranchTest<'_> {
    fn count(&self, ws: &Workspace, class: ClassId) -> usize {
        match self {
            BranchTest::Compatible {
                candidate,
                must_be_public,
            } => find_compatible_methods(ws, candidate, class, *must_be_public).count(),
            BranchTest::SameMethod(method) => usize::from(has_same_method(ws, method, class)),
            BranchTest::SameField(field) => usize::from(has_same_field(ws, field, class)),
            BranchTest::Implements(interface) => {
                usize::from(implements_interface(ws, class, interface))
            }
        }
    }
}

fn walk(
    ws: &Workspace,
    node: ClassId,
    test: &BranchTest<'_>,
    scope: Option<&Path>,
    member: &str,
    coverage: &mut Coverage,
) -> Result<()> {
    for child in ws.direct_subclasses(node, scope) {
        if !coverage.visit(child, node) {
            continue;
        }
        match test.count(ws, child) {
            1 => {
                tracing::debug!(member, class = ws.class_name(child), "counterpart found");
                coverage.accepted.insert(child);
            }
            0 if ws.class(child).may_defer_members() => {
                tracing::debug!(member, class = ws.class_name(child), "descending into intermediate");
                coverage.intermediates.insert(child);
                walk(ws, child, test, scope, member, coverage)?;
            }
            0 => {
                return Err(MemberFailure::MemberNotImplemented {
                    member: member.to_string(),
                    class: ws.class_name(child).to_string(),
                }
                .into());
            }
            _ => {
                return Err(MemberFailure::AmbiguousOverloading {
                    member: member.to_string(),
                    class: ws.class_name(child).to_string(),
                }
                .into());
            }
        }
    }
    Ok(())
}

fn require_method(ws: &Workspace, id: MethodId) -> Result<&MethodDecl> {
    ws.method(id)
        .ok_or_else(|| GenerifyError::internal(format!("method#{} is not in the workspace", id.0)))
}

/// Find the classes covering every branch below `target` for `member`.
///
/// Methods need a compatible counterpart, fields an identical one, and
/// implements markers a class directly naming the interface.
pub fn compute_coverage(
    ws: &Workspace,
    member: &MemberRef,
    target: ClassId,
    scope: Option<&Path>,
) -> Result<Coverage> {
    let name = ws.member_name(member);
    let mut coverage = Coverage::new(target);

    match member {
        MemberRef::Method { id } => {
            let candidate = require_method(ws, *id)?;
            let test = BranchTest::Compatible {
                candidate,
                must_be_public: ws.class(target).is_interface(),
            };
            walk(ws, target, &test, scope, &name, &mut coverage)?;
        }
        MemberRef::Field { id } => {
            let field = ws.field(*id).ok_or_else(|| {
                GenerifyError::internal(format!("field#{} is not in the workspace", id.0))
            })?;
            walk(ws, target, &BranchTest::SameField(field), scope, &name, &mut coverage)?;
        }
        MemberRef::Implements { interface, .. } => {
            walk(ws, target, &BranchTest::Implements(interface), scope, &name, &mut coverage)?;
        }
    }

    if coverage.is_empty() {
        return Err(MemberFailure::MemberNotImplemented {
            member: name,
            class: ws.class_name(target).to_string(),
        }
        .into());
    }
    Ok(coverage)
}

/// Full generification precondition for a member: hierarchy coverage plus
/// the overload guard on the target.
pub fn compute_can_generify(
    ws: &Workspace,
    member: &MemberRef,
    target: ClassId,
    scope: Option<&Path>,
) -> Result<Coverage> {
    match member {
        MemberRef::Method { id } => {
            let candidate = require_method(ws, *id)?;
            if candidate.modifiers.is_private() {
                return Err(MemberFailure::PrivateMember {
                    member: candidate.name.clone(),
                }
                .into());
            }
            if candidate.modifiers.is_static {
                return Err(MemberFailure::UnsupportedMember {
                    member: candidate.name.clone(),
                }
                .into());
            }
            if ws.class(target).is_interface() && !candidate.modifiers.is_public() {
                return Err(MemberFailure::NotPublic {
                    member: candidate.name.clone(),
                    target: ws.class_name(target).to_string(),
                }
                .into());
            }
            let coverage = compute_coverage(ws, member, target, scope)?;
            check_target_overloads(ws, candidate, target)?;
            Ok(coverage)
        }
        MemberRef::Implements { .. } => compute_coverage(ws, member, target, scope),
        MemberRef::Field { .. } => Err(MemberFailure::UnsupportedMember {
            member: ws.member_name(member),
        }
        .into()),
    }
}

/// The sister classes when `member` can be generified, `None` otherwise.
pub fn can_generify(
    ws: &Workspace,
    member: &MemberRef,
    target: ClassId,
    scope: Option<&Path>,
) -> Option<IndexSet<ClassId>> {
    match compute_can_generify(ws, member, target, scope) {
        Ok(coverage) => Some(coverage.accepted),
        Err(err) if err.is_member_level() => {
            tracing::debug!(member = %ws.member_name(member), reason = %err, "not generifiable");
            None
        }
        Err(err) => {
            tracing::warn!(member = %ws.member_name(member), error = %err, "generification analysis failed");
            None
        }
    }
}

/// Whether every branch below `target` already has an identical counterpart,
/// so the member can be pulled up as abstract without generification.
///
/// Always false for fields, which have no abstract form.
pub fn direct_abstract_pullup(
    ws: &Workspace,
    member: &MemberRef,
    target: ClassId,
    scope: Option<&Path>,
) -> bool {
    let test = match member {
        MemberRef::Method { id } => match ws.method(*id) {
            Some(method) => BranchTest::SameMethod(method),
            None => return false,
        },
        MemberRef::Field { .. } => return false,
        MemberRef::Implements { interface, .. } => BranchTest::Implements(interface),
    };
    let mut seen = Coverage::new(target);
    covers_all(ws, target, &test, scope, &mut seen)
}

fn covers_all(
    ws: &Workspace,
    node: ClassId,
    test: &BranchTest<'_>,
    scope: Option<&Path>,
    seen: &mut Coverage,
) -> bool {
    ws.direct_subclasses(node, scope).into_iter().all(|child| {
        if !seen.visit(child, node) || test.count(ws, child) > 0 {
            return true;
        }
        ws.class(child).may_defer_members() && covers_all(ws, child, test, scope, seen)
    })
}

/// Refuse a candidate whose parameters collide with a target method that it
/// could not be unified with.
pub fn check_target_overloads(ws: &Workspace, candidate: &MethodDecl, target: ClassId) -> Result<()> {
    let collides = ws
        .find_methods_by_name(target, &candidate.name)
        .any(|(_, m)| is_semi_compatible(candidate, m) && !is_compatible(candidate, m, false));
    if collides {
        return Err(MemberFailure::AmbiguousOverloadInTarget {
            member: candidate.name.clone(),
            target: ws.class_name(target).to_string(),
        }
        .into());
    }
    Ok(())
}

/// Check the final generified signature against the target's methods.
///
/// An abstract method with exactly the same signature is a stub the new
/// method replaces; its id is returned. Any other method whose parameters
/// are anti-unifiable with the final ones would be an ambiguous overload.
pub fn check_final_signature(
    ws: &Workspace,
    method: &MethodDecl,
    target: ClassId,
) -> Result<Option<MethodId>> {
    let mut stub = None;
    for (id, existing) in ws.find_methods_by_name(target, &method.name) {
        if !params_anti_unifiable(method, existing) {
            continue;
        }
        if existing.modifiers.is_abstract && same_signature(existing, method) && stub.is_none() {
            stub = Some(id);
            continue;
        }
        return Err(MemberFailure::AmbiguousOverloadInTarget {
            member: method.name.clone(),
            target: ws.class_name(target).to_string(),
        }
        .into());
    }
    Ok(stub)
}
