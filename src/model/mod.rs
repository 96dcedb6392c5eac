//! In-memory source model consumed by the generification engine.
//!
//! A [`Workspace`] owns class declarations and their members. It answers the
//! structural queries the engine needs (direct subclasses inside a scope,
//! methods by name, super references) and exposes the few mutation
//! primitives a commit applies: adding type parameters, extending super
//! reference argument lists, inserting and removing methods.
//!
//! Classes are usually loaded from Java sources with
//! [`JavaLoader`](loader::JavaLoader), or assembled with the builder API:
//!
//! ```rust
//! use pullup_gen::model::{ClassDecl, JavaType, MethodDecl, Workspace};
//!
//! let mut ws = Workspace::new();
//! let animal = ws.add_class(ClassDecl::class("Animal").abstract_class().in_directory("zoo"));
//! let dog = ws.add_class(
//!     ClassDecl::class("Dog").extends(JavaType::class("Animal")).in_directory("zoo"),
//! );
//! ws.add_method(dog, MethodDecl::new("bark").public());
//!
//! assert_eq!(ws.direct_subclasses(animal, None), vec![dog]);
//! ```

mod decl;
pub mod loader;
pub mod outline;
mod types;

pub use decl::{
    ClassDecl, ClassId, ClassKind, FieldDecl, FieldId, MemberRef, MethodDecl, MethodId,
    Modifiers, Parameter, Visibility,
};
pub use loader::JavaLoader;
pub use types::{JavaType, PrimitiveKind, TypeParam, TypeVarOwner, WildcardBound};

use indexmap::IndexMap;
use std::path::Path;

use crate::error::{GenerifyError, Result};

#[derive(Debug, Clone)]
struct MethodEntry {
    owner: ClassId,
    decl: MethodDecl,
}

#[derive(Debug, Clone)]
struct FieldEntry {
    owner: ClassId,
    decl: FieldDecl,
}

/// The set of classes an operation works on.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    classes: Vec<ClassDecl>,
    methods: IndexMap<MethodId, MethodEntry>,
    fields: IndexMap<FieldId, FieldEntry>,
    next_method: usize,
    next_field: usize,
}

impl Workspace {
    /// Create an empty workspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class declaration and return its id.
    pub fn add_class(&mut self, mut decl: ClassDecl) -> ClassId {
        decl.methods.clear();
        decl.fields.clear();
        let id = ClassId(self.classes.len());
        self.classes.push(decl);
        id
    }

    /// Add a method to a class, after its existing methods.
    pub fn add_method(&mut self, class: ClassId, decl: MethodDecl) -> MethodId {
        let id = MethodId(self.next_method);
        self.next_method += 1;
        self.methods.insert(id, MethodEntry { owner: class, decl });
        self.classes[class.0].methods.push(id);
        id
    }

    /// Add a field to a class.
    pub fn add_field(&mut self, class: ClassId, decl: FieldDecl) -> FieldId {
        let id = FieldId(self.next_field);
        self.next_field += 1;
        self.fields.insert(id, FieldEntry { owner: class, decl });
        self.classes[class.0].fields.push(id);
        id
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Get a class declaration.
    pub fn class(&self, id: ClassId) -> &ClassDecl {
        &self.classes[id.0]
    }

    /// Get a mutable class declaration.
    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassDecl {
        &mut self.classes[id.0]
    }

    /// The simple name of a class.
    pub fn class_name(&self, id: ClassId) -> &str {
        &self.classes[id.0].name
    }

    /// All classes in insertion order.
    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &ClassDecl)> {
        self.classes.iter().enumerate().map(|(i, c)| (ClassId(i), c))
    }

    /// Find a class by simple name.
    pub fn find_class(&self, name: &str) -> Option<ClassId> {
        self.classes().find(|(_, c)| c.name == name).map(|(id, _)| id)
    }

    /// Find a class by simple name, failing with [`GenerifyError::ClassNotFound`].
    pub fn require_class(&self, name: &str) -> Result<ClassId> {
        self.find_class(name)
            .ok_or_else(|| GenerifyError::ClassNotFound(name.to_string()))
    }

    /// Get a method declaration, if it still exists.
    pub fn method(&self, id: MethodId) -> Option<&MethodDecl> {
        self.methods.get(&id).map(|e| &e.decl)
    }

    /// Get a mutable method declaration.
    pub fn method_mut(&mut self, id: MethodId) -> Option<&mut MethodDecl> {
        self.methods.get_mut(&id).map(|e| &mut e.decl)
    }

    /// The class declaring a method.
    pub fn method_owner(&self, id: MethodId) -> Option<ClassId> {
        self.methods.get(&id).map(|e| e.owner)
    }

    /// Get a field declaration.
    pub fn field(&self, id: FieldId) -> Option<&FieldDecl> {
        self.fields.get(&id).map(|e| &e.decl)
    }

    /// The class declaring a field.
    pub fn field_owner(&self, id: FieldId) -> Option<ClassId> {
        self.fields.get(&id).map(|e| e.owner)
    }

    /// Methods declared by a class (not inherited), in declaration order.
    pub fn methods_of(&self, class: ClassId) -> impl Iterator<Item = (MethodId, &MethodDecl)> {
        self.classes[class.0]
            .methods
            .iter()
            .filter_map(|id| self.method(*id).map(|m| (*id, m)))
    }

    /// Declared methods with the given name.
    pub fn find_methods_by_name<'a>(
        &'a self,
        class: ClassId,
        name: &'a str,
    ) -> impl Iterator<Item = (MethodId, &'a MethodDecl)> + 'a {
        self.methods_of(class).filter(move |(_, m)| m.name == name)
    }

    /// Find a declared method by name, failing when absent.
    pub fn require_method(&self, class: ClassId, name: &str) -> Result<MethodId> {
        self.find_methods_by_name(class, name)
            .map(|(id, _)| id)
            .next()
            .ok_or_else(|| GenerifyError::MemberNotFound {
                class: self.class_name(class).to_string(),
                member: name.to_string(),
            })
    }

    /// A readable name for a member: the method or field name, or the
    /// implemented interface.
    pub fn member_name(&self, member: &MemberRef) -> String {
        match member {
            MemberRef::Method { id } => self
                .method(*id)
                .map(|m| m.name.clone())
                .unwrap_or_else(|| member.to_string()),
            MemberRef::Field { id } => self
                .field(*id)
                .map(|f| f.name.clone())
                .unwrap_or_else(|| member.to_string()),
            MemberRef::Implements { interface, .. } => interface.to_string(),
        }
    }

    /// The class a member belongs to.
    pub fn member_owner(&self, member: &MemberRef) -> Option<ClassId> {
        match member {
            MemberRef::Method { id } => self.method_owner(*id),
            MemberRef::Field { id } => self.field_owner(*id),
            MemberRef::Implements { class, .. } => Some(*class),
        }
    }

    /// Fields declared by a class, in declaration order.
    pub fn fields_of(&self, class: ClassId) -> impl Iterator<Item = (FieldId, &FieldDecl)> {
        self.classes[class.0]
            .fields
            .iter()
            .filter_map(|id| self.field(*id).map(|f| (*id, f)))
    }

    /// Insert a method before `anchor`, or append when there is no anchor.
    pub fn insert_method(
        &mut self,
        class: ClassId,
        decl: MethodDecl,
        anchor: Option<MethodId>,
    ) -> MethodId {
        let id = self.add_method(class, decl);
        if let Some(anchor) = anchor {
            let methods = &mut self.classes[class.0].methods;
            if let Some(pos) = methods.iter().position(|m| *m == anchor) {
                methods.pop();
                methods.insert(pos, id);
            }
        }
        id
    }

    /// Replace a method declaration in place, keeping its id and position.
    pub fn replace_method(&mut self, id: MethodId, decl: MethodDecl) -> Result<()> {
        let entry = self
            .methods
            .get_mut(&id)
            .ok_or_else(|| GenerifyError::internal(format!("method#{} vanished", id.0)))?;
        entry.decl = decl;
        Ok(())
    }

    /// Remove a method from its class.
    pub fn remove_method(&mut self, id: MethodId) -> Option<MethodDecl> {
        let entry = self.methods.shift_remove(&id)?;
        self.classes[entry.owner.0].methods.retain(|m| *m != id);
        Some(entry.decl)
    }

    /// Resolve a class type to a class of this workspace by raw name.
    ///
    /// Classes in `near`'s directory win over same-named classes elsewhere.
    pub fn resolve(&self, ty: &JavaType, near: Option<ClassId>) -> Option<ClassId> {
        let name = ty.raw_name()?;
        let mut candidates = self.classes().filter(|(_, c)| c.name == name);
        let first = candidates.next()?;
        let Some(near) = near else {
            return Some(first.0);
        };
        let dir = &self.class(near).directory;
        std::iter::once(first)
            .chain(candidates)
            .find(|(_, c)| &c.directory == dir)
            .map(|(id, _)| id)
            .or(Some(first.0))
    }

    /// The super reference in `child` that names `parent`, if any.
    pub fn reference_to(&self, child: ClassId, parent: ClassId) -> Option<&JavaType> {
        self.class(child)
            .super_types()
            .find(|ty| self.resolve(ty, Some(child)) == Some(parent))
    }

    /// Direct supertypes of a class that are part of the workspace.
    pub fn direct_supertypes(&self, class: ClassId) -> Vec<ClassId> {
        let mut result = Vec::new();
        for ty in self.class(class).super_types() {
            if let Some(id) = self.resolve(ty, Some(class))
                && !result.contains(&id)
            {
                result.push(id);
            }
        }
        result
    }

    /// The superclass of a class (first `extends` entry), if in the workspace.
    pub fn superclass(&self, class: ClassId) -> Option<ClassId> {
        let decl = self.class(class);
        decl.extends
            .first()
            .and_then(|ty| self.resolve(ty, Some(class)))
    }

    /// Direct subclasses (and sub-interfaces/implementors) of `parent`.
    ///
    /// With a scope, only classes whose directory equals the scope are
    /// returned; the lookup never searches the whole workspace in that case.
    pub fn direct_subclasses(&self, parent: ClassId, scope: Option<&Path>) -> Vec<ClassId> {
        self.classes()
            .filter(|(_, c)| scope.is_none_or(|dir| c.directory == dir))
            .filter(|(id, _)| *id != parent && self.reference_to(*id, parent).is_some())
            .map(|(id, _)| id)
            .collect()
    }

    /// Type names already bound where new type parameters of `class` will be
    /// visible: the class itself, its type parameters, nested types, and every
    /// class of the workspace.
    pub fn bound_type_names(&self, class: ClassId) -> Vec<String> {
        let decl = self.class(class);
        let mut names = vec![decl.name.clone()];
        names.extend(decl.type_params.iter().map(|p| p.name().to_string()));
        names.extend(decl.nested.iter().cloned());
        for (_, c) in self.classes() {
            if !names.contains(&c.name) {
                names.push(c.name.clone());
            }
        }
        names
    }

    /// Append type arguments to the reference from `child` to `parent`.
    pub fn append_reference_args(
        &mut self,
        child: ClassId,
        parent: ClassId,
        new_args: &[JavaType],
    ) -> Result<()> {
        let decl = &self.classes[child.0];
        let index = decl
            .super_types()
            .position(|ty| self.resolve(ty, Some(child)) == Some(parent))
            .ok_or_else(|| {
                GenerifyError::internal(format!(
                    "{} has no reference to {}",
                    self.class_name(child),
                    self.class_name(parent)
                ))
            })?;
        let extends_len = decl.extends.len();
        let decl = &mut self.classes[child.0];
        let reference = if index < extends_len {
            &mut decl.extends[index]
        } else {
            &mut decl.implements[index - extends_len]
        };
        match reference {
            JavaType::Class { args, .. } => {
                args.extend(new_args.iter().cloned());
                Ok(())
            }
            other => Err(GenerifyError::internal(format!(
                "super reference {other} is not a class type"
            ))),
        }
    }

    /// Declare a new type parameter on a class.
    pub fn add_type_param(&mut self, class: ClassId, param: TypeParam) {
        let params = &mut self.classes[class.0].type_params;
        if !params.contains(&param) {
            params.push(param);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zoo() -> (Workspace, ClassId, ClassId, ClassId) {
        let mut ws = Workspace::new();
        let animal = ws.add_class(ClassDecl::class("Animal").abstract_class().in_directory("zoo"));
        let dog = ws.add_class(
            ClassDecl::class("Dog")
                .extends(JavaType::class("Animal"))
                .in_directory("zoo"),
        );
        let cat = ws.add_class(
            ClassDecl::class("Cat")
                .extends(JavaType::class("Animal"))
                .in_directory("elsewhere"),
        );
        (ws, animal, dog, cat)
    }

    #[test]
    fn test_direct_subclasses_respect_scope() {
        let (ws, animal, dog, cat) = zoo();
        assert_eq!(ws.direct_subclasses(animal, None), vec![dog, cat]);
        assert_eq!(
            ws.direct_subclasses(animal, Some(Path::new("zoo"))),
            vec![dog]
        );
    }

    #[test]
    fn test_method_insert_and_remove() {
        let (mut ws, _, dog, _) = zoo();
        let bark = ws.add_method(dog, MethodDecl::new("bark"));
        let eat = ws.add_method(dog, MethodDecl::new("eat"));
        let sleep = ws.insert_method(dog, MethodDecl::new("sleep"), Some(eat));

        let names: Vec<_> = ws.methods_of(dog).map(|(_, m)| m.name.clone()).collect();
        assert_eq!(names, vec!["bark", "sleep", "eat"]);
        assert_eq!(ws.method_owner(sleep), Some(dog));

        assert!(ws.remove_method(bark).is_some());
        assert!(ws.method(bark).is_none());
        assert_eq!(ws.methods_of(dog).count(), 2);
    }

    #[test]
    fn test_append_reference_args() {
        let (mut ws, animal, dog, _) = zoo();
        ws.append_reference_args(dog, animal, &[JavaType::class("Bone")])
            .unwrap();
        assert_eq!(
            ws.reference_to(dog, animal),
            Some(&JavaType::generic("Animal", vec![JavaType::class("Bone")]))
        );

        let err = ws.append_reference_args(animal, dog, &[]).unwrap_err();
        assert!(matches!(err, GenerifyError::Internal(_)));
    }

    #[test]
    fn test_bound_type_names() {
        let (mut ws, animal, _, _) = zoo();
        ws.add_type_param(animal, TypeParam::new("T"));
        let names = ws.bound_type_names(animal);
        assert!(names.contains(&"Animal".to_string()));
        assert!(names.contains(&"T".to_string()));
        assert!(names.contains(&"Dog".to_string()));
    }
}
