//! Java type representation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A primitive Java type. `void` is treated as a primitive, as the Java
/// type system does for method return types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl PrimitiveKind {
    /// Parses a primitive keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "boolean" => PrimitiveKind::Boolean,
            "byte" => PrimitiveKind::Byte,
            "char" => PrimitiveKind::Char,
            "short" => PrimitiveKind::Short,
            "int" => PrimitiveKind::Int,
            "long" => PrimitiveKind::Long,
            "float" => PrimitiveKind::Float,
            "double" => PrimitiveKind::Double,
            "void" => PrimitiveKind::Void,
            _ => return None,
        })
    }

    /// The Java keyword for this primitive.
    pub fn keyword(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Void => "void",
        }
    }
}

/// Direction of a wildcard bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WildcardBound {
    Extends,
    Super,
}

/// The declaration a type variable belongs to.
///
/// Two class-level variables are the same type only when name and declaring
/// class agree, so `X` of `Dog<X>` and `X` of `Cat<X>` are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum TypeVarOwner {
    /// Declared in the header of a class or interface.
    Class { class: String },
    /// Declared by a generic method, at `index` of its type parameter list.
    Method {
        class: String,
        method: String,
        index: usize,
    },
}

impl TypeVarOwner {
    pub fn class(class: impl Into<String>) -> Self {
        TypeVarOwner::Class {
            class: class.into(),
        }
    }

    pub fn method(class: impl Into<String>, method: impl Into<String>, index: usize) -> Self {
        TypeVarOwner::Method {
            class: class.into(),
            method: method.into(),
            index,
        }
    }

    pub fn is_method(&self) -> bool {
        matches!(self, TypeVarOwner::Method { .. })
    }
}

/// A Java type as seen by the generification engine.
///
/// Class types are identified by the simple name of their raw declaration;
/// two class types share a raw declaration when names and arity agree.
/// Type variables carry the declaration that introduced them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JavaType {
    Primitive { primitive: PrimitiveKind },
    Array { component: Box<JavaType> },
    Class { name: String, args: Vec<JavaType> },
    TypeVariable { name: String, owner: TypeVarOwner },
    Wildcard {
        bound: Option<(WildcardBound, Box<JavaType>)>,
    },
}

impl JavaType {
    pub const VOID: JavaType = JavaType::Primitive {
        primitive: PrimitiveKind::Void,
    };
    pub const INT: JavaType = JavaType::Primitive {
        primitive: PrimitiveKind::Int,
    };
    pub const BOOLEAN: JavaType = JavaType::Primitive {
        primitive: PrimitiveKind::Boolean,
    };

    /// Create a primitive type.
    pub fn primitive(primitive: PrimitiveKind) -> Self {
        JavaType::Primitive { primitive }
    }

    /// Create a non-generic class type.
    pub fn class(name: impl Into<String>) -> Self {
        JavaType::Class {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Create a parameterized class type.
    pub fn generic(name: impl Into<String>, args: Vec<JavaType>) -> Self {
        JavaType::Class {
            name: name.into(),
            args,
        }
    }

    /// Create a reference to a type variable declared by `owner`.
    pub fn type_variable(name: impl Into<String>, owner: TypeVarOwner) -> Self {
        JavaType::TypeVariable {
            name: name.into(),
            owner,
        }
    }

    /// Create a reference to a type parameter of `class`.
    pub fn class_variable(class: impl Into<String>, name: impl Into<String>) -> Self {
        Self::type_variable(name, TypeVarOwner::class(class))
    }

    /// Create a reference to the `index`-th type parameter of a generic method.
    pub fn method_variable(
        class: impl Into<String>,
        method: impl Into<String>,
        index: usize,
        name: impl Into<String>,
    ) -> Self {
        Self::type_variable(name, TypeVarOwner::method(class, method, index))
    }

    /// Create an array type with this type as component.
    pub fn array_of(self) -> Self {
        JavaType::Array {
            component: Box::new(self),
        }
    }

    /// Create an unbounded wildcard (`?`).
    pub fn wildcard() -> Self {
        JavaType::Wildcard { bound: None }
    }

    /// Create a bounded wildcard (`? extends T` or `? super T`).
    pub fn bounded_wildcard(bound: WildcardBound, ty: JavaType) -> Self {
        JavaType::Wildcard {
            bound: Some((bound, Box::new(ty))),
        }
    }

    /// `java.lang.Object`, used to pad raw references.
    pub fn object() -> Self {
        JavaType::class("Object")
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, JavaType::Primitive { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self, JavaType::Array { .. })
    }

    pub fn is_class(&self) -> bool {
        matches!(self, JavaType::Class { .. })
    }

    /// Whether a type variable of a generic method occurs anywhere in this type.
    pub fn mentions_method_variable(&self) -> bool {
        match self {
            JavaType::TypeVariable { owner, .. } => owner.is_method(),
            JavaType::Array { component } => component.mentions_method_variable(),
            JavaType::Class { args, .. } => args.iter().any(JavaType::mentions_method_variable),
            JavaType::Wildcard {
                bound: Some((_, ty)),
            } => ty.mentions_method_variable(),
            JavaType::Primitive { .. } | JavaType::Wildcard { bound: None } => false,
        }
    }

    /// The component type of an array type.
    pub fn component(&self) -> Option<&JavaType> {
        match self {
            JavaType::Array { component } => Some(component),
            _ => None,
        }
    }

    /// The raw declaration name of a class type.
    pub fn raw_name(&self) -> Option<&str> {
        match self {
            JavaType::Class { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The type arguments of a class type (empty for everything else).
    pub fn type_args(&self) -> &[JavaType] {
        match self {
            JavaType::Class { args, .. } => args,
            _ => &[],
        }
    }

    /// Replace type variables for which `lookup` has a binding.
    pub fn substitute(
        &self,
        lookup: &impl Fn(&TypeVarOwner, &str) -> Option<JavaType>,
    ) -> JavaType {
        match self {
            JavaType::TypeVariable { name, owner } => {
                lookup(owner, name).unwrap_or_else(|| self.clone())
            }
            JavaType::Array { component } => component.substitute(lookup).array_of(),
            JavaType::Class { name, args } => JavaType::generic(
                name.clone(),
                args.iter().map(|a| a.substitute(lookup)).collect(),
            ),
            JavaType::Wildcard {
                bound: Some((kind, ty)),
            } => JavaType::bounded_wildcard(*kind, ty.substitute(lookup)),
            JavaType::Primitive { .. } | JavaType::Wildcard { bound: None } => self.clone(),
        }
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaType::Primitive { primitive } => f.write_str(primitive.keyword()),
            JavaType::Array { component } => write!(f, "{component}[]"),
            JavaType::Class { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    let args: Vec<_> = args.iter().map(|a| a.to_string()).collect();
                    write!(f, "<{}>", args.join(", "))?;
                }
                Ok(())
            }
            JavaType::TypeVariable { name, .. } => f.write_str(name),
            JavaType::Wildcard { bound: None } => f.write_str("?"),
            JavaType::Wildcard {
                bound: Some((WildcardBound::Extends, ty)),
            } => write!(f, "? extends {ty}"),
            JavaType::Wildcard {
                bound: Some((WildcardBound::Super, ty)),
            } => write!(f, "? super {ty}"),
        }
    }
}

/// A type parameter declared on a class or introduced by generification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeParam(String);

impl TypeParam {
    /// Create a type parameter from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// The type that refers to this parameter as declared by `class`.
    pub fn as_type_in(&self, class: impl Into<String>) -> JavaType {
        JavaType::class_variable(class, self.0.clone())
    }
}

impl fmt::Display for TypeParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
