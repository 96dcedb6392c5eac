//! Class, method and field declarations of the source model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use super::types::{JavaType, TypeParam};

/// Stable identity of a class in a [`Workspace`](super::Workspace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(pub(crate) usize);

/// Stable identity of a method in a [`Workspace`](super::Workspace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodId(pub(crate) usize);

/// Stable identity of a field in a [`Workspace`](super::Workspace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(pub(crate) usize);

/// Declared visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Protected,
    #[default]
    Package,
    Private,
}

impl Visibility {
    /// The keyword, empty for package-private.
    pub fn keyword(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Package => "",
            Visibility::Private => "private",
        }
    }
}

/// Modifiers relevant to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    pub visibility: Visibility,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub is_default: bool,
}

impl Modifiers {
    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

/// A formal parameter of a method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: JavaType,
}

impl Parameter {
    /// Create a new parameter.
    pub fn new(name: impl Into<String>, ty: JavaType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A method declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub modifiers: Modifiers,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<TypeParam>,
    pub return_type: JavaType,
    pub params: Vec<Parameter>,
    /// Whether the declaration carries a body.
    pub has_body: bool,
}

impl MethodDecl {
    /// Create a new package-private `void` method with a body.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modifiers: Modifiers::default(),
            annotations: Vec::new(),
            type_params: Vec::new(),
            return_type: JavaType::VOID,
            params: Vec::new(),
            has_body: true,
        }
    }

    /// Set the return type.
    pub fn returns(mut self, ty: JavaType) -> Self {
        self.return_type = ty;
        self
    }

    /// Append a parameter.
    pub fn param(mut self, name: impl Into<String>, ty: JavaType) -> Self {
        self.params.push(Parameter::new(name, ty));
        self
    }

    /// Declare a method type parameter.
    pub fn type_param(mut self, name: impl Into<String>) -> Self {
        self.type_params.push(TypeParam::new(name));
        self
    }

    /// Set the visibility.
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.modifiers.visibility = visibility;
        self
    }

    /// Make this method public.
    pub fn public(self) -> Self {
        self.visibility(Visibility::Public)
    }

    /// Make this method private.
    pub fn private(self) -> Self {
        self.visibility(Visibility::Private)
    }

    /// Make this method abstract (no body).
    pub fn abstract_method(mut self) -> Self {
        self.modifiers.is_abstract = true;
        self.has_body = false;
        self
    }

    /// Add an annotation by simple name (without `@`).
    pub fn annotated(mut self, annotation: impl Into<String>) -> Self {
        let annotation = annotation.into();
        if !self.annotations.contains(&annotation) {
            self.annotations.push(annotation);
        }
        self
    }

    /// The parameter types, in order.
    pub fn param_types(&self) -> impl Iterator<Item = &JavaType> {
        self.params.iter().map(|p| &p.ty)
    }

    /// `name(T1, T2): R` rendering used in messages.
    pub fn signature(&self) -> String {
        let params: Vec<_> = self.params.iter().map(|p| p.ty.to_string()).collect();
        format!("{}({}): {}", self.name, params.join(", "), self.return_type)
    }
}

/// A field declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: JavaType,
    pub modifiers: Modifiers,
}

impl FieldDecl {
    /// Create a new package-private field.
    pub fn new(name: impl Into<String>, ty: JavaType) -> Self {
        Self {
            name: name.into(),
            ty,
            modifiers: Modifiers::default(),
        }
    }

    /// Set the visibility.
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.modifiers.visibility = visibility;
        self
    }

    /// Make this field static.
    pub fn static_field(mut self) -> Self {
        self.modifiers.is_static = true;
        self
    }
}

/// The kind of a type declaration.
///
/// Enums and records are concrete: they can implement interfaces but never
/// defer a member to subclasses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Enum,
    Record,
}

impl ClassKind {
    /// The declaring keyword.
    pub fn keyword(&self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Interface => "interface",
            ClassKind::Enum => "enum",
            ClassKind::Record => "record",
        }
    }
}

/// A class, interface, enum or record declaration.
///
/// Members are owned by the workspace and referenced by id so that they keep
/// their identity while declarations are edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    pub kind: ClassKind,
    pub modifiers: Modifiers,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<TypeParam>,
    /// `extends` clause: the superclass for classes, super-interfaces for interfaces.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<JavaType>,
    /// `implements` clause (classes only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implements: Vec<JavaType>,
    /// Simple names of nested type declarations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested: Vec<String>,
    /// Directory holding the declaring file; sister lookups stay inside it.
    pub directory: PathBuf,
    /// The declaring file, when loaded from source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    pub(crate) methods: Vec<MethodId>,
    pub(crate) fields: Vec<FieldId>,
}

impl ClassDecl {
    /// Create a new package-private class.
    pub fn class(name: impl Into<String>) -> Self {
        Self::with_kind(name, ClassKind::Class)
    }

    /// Create a new interface.
    pub fn interface(name: impl Into<String>) -> Self {
        Self::with_kind(name, ClassKind::Interface)
    }

    /// Create a new enum.
    pub fn enumeration(name: impl Into<String>) -> Self {
        Self::with_kind(name, ClassKind::Enum)
    }

    /// Create a new record.
    pub fn record(name: impl Into<String>) -> Self {
        Self::with_kind(name, ClassKind::Record)
    }

    pub(crate) fn with_kind(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            modifiers: Modifiers::default(),
            type_params: Vec::new(),
            extends: Vec::new(),
            implements: Vec::new(),
            nested: Vec::new(),
            directory: PathBuf::new(),
            file: None,
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Add a type to the `extends` clause.
    pub fn extends(mut self, ty: JavaType) -> Self {
        self.extends.push(ty);
        self
    }

    /// Add a type to the `implements` clause.
    pub fn implements(mut self, ty: JavaType) -> Self {
        self.implements.push(ty);
        self
    }

    /// Declare a type parameter.
    pub fn type_param(mut self, name: impl Into<String>) -> Self {
        self.type_params.push(TypeParam::new(name));
        self
    }

    /// Make the class abstract.
    pub fn abstract_class(mut self) -> Self {
        self.modifiers.is_abstract = true;
        self
    }

    /// Make the class public.
    pub fn public(mut self) -> Self {
        self.modifiers.visibility = Visibility::Public;
        self
    }

    /// Set the directory (scope) the class lives in.
    pub fn in_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directory = dir.into();
        self
    }

    /// Set the declaring file; the directory follows the file's parent.
    pub fn in_file(mut self, file: impl Into<PathBuf>) -> Self {
        let file = file.into();
        self.directory = file.parent().map(Path::to_path_buf).unwrap_or_default();
        self.file = Some(file);
        self
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers.is_abstract
    }

    /// Whether this is a class proper, the only kind with a superclass clause.
    pub fn is_plain_class(&self) -> bool {
        self.kind == ClassKind::Class
    }

    /// Interfaces and abstract classes may leave members to their subclasses.
    pub fn may_defer_members(&self) -> bool {
        self.is_interface() || (self.is_plain_class() && self.is_abstract())
    }

    /// Every super reference in declaration order.
    pub fn super_types(&self) -> impl Iterator<Item = &JavaType> {
        self.extends.iter().chain(self.implements.iter())
    }

    /// Method ids in declaration order.
    pub fn method_ids(&self) -> &[MethodId] {
        &self.methods
    }

    /// Field ids in declaration order.
    pub fn field_ids(&self) -> &[FieldId] {
        &self.fields
    }
}

/// A member candidate for pull-up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemberRef {
    Method { id: MethodId },
    Field { id: FieldId },
    /// The fact that `class` implements `interface`.
    Implements { class: ClassId, interface: JavaType },
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberRef::Method { id } => write!(f, "method#{}", id.0),
            MemberRef::Field { id } => write!(f, "field#{}", id.0),
            MemberRef::Implements { interface, .. } => write!(f, "implements {interface}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_builder() {
        let m = MethodDecl::new("feed")
            .public()
            .param("food", JavaType::class("Bone"))
            .returns(JavaType::INT);
        assert_eq!(m.signature(), "feed(Bone): int");
        assert!(m.modifiers.is_public());
        assert!(m.has_body);

        let a = m.clone().abstract_method();
        assert!(a.modifiers.is_abstract);
        assert!(!a.has_body);
    }

    #[test]
    fn test_annotation_is_not_duplicated() {
        let m = MethodDecl::new("bark").annotated("Override").annotated("Override");
        assert_eq!(m.annotations, vec!["Override".to_string()]);
    }

    #[test]
    fn test_class_in_file_sets_directory() {
        let c = ClassDecl::class("Dog").in_file("zoo/Dog.java");
        assert_eq!(c.directory, PathBuf::from("zoo"));
        assert!(!c.may_defer_members());
        assert!(ClassDecl::interface("Pet").may_defer_members());
        assert!(ClassDecl::class("Base").abstract_class().may_defer_members());
    }
}
