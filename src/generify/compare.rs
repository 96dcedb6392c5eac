//! Structural comparison of types, methods and fields.
//!
//! Pure predicates; nothing here introduces type parameters.

use crate::model::{ClassId, FieldDecl, JavaType, MethodDecl, TypeVarOwner, Workspace};

/// Structural type equality.
///
/// Class-level type variables are equal only when they come from the same
/// declaration. Variables of generic methods are equal up to renaming: the
/// `i`-th type parameter of one method matches the `i`-th of another.
pub fn types_equal(t1: &JavaType, t2: &JavaType) -> bool {
    match (t1, t2) {
        (
            JavaType::TypeVariable {
                owner: TypeVarOwner::Method { index: i1, .. },
                ..
            },
            JavaType::TypeVariable {
                owner: TypeVarOwner::Method { index: i2, .. },
                ..
            },
        ) => i1 == i2,
        (JavaType::Array { component: c1 }, JavaType::Array { component: c2 }) => {
            types_equal(c1, c2)
        }
        (
            JavaType::Class { name: n1, args: a1 },
            JavaType::Class { name: n2, args: a2 },
        ) => n1 == n2 && a1.len() == a2.len() && a1.iter().zip(a2).all(|(a, b)| types_equal(a, b)),
        (
            JavaType::Wildcard {
                bound: Some((k1, b1)),
            },
            JavaType::Wildcard {
                bound: Some((k2, b2)),
            },
        ) => k1 == k2 && types_equal(b1, b2),
        _ => t1 == t2,
    }
}

/// True for fewer than two types, or when every type equals the first.
pub fn all_equal<'a>(types: impl IntoIterator<Item = &'a JavaType>) -> bool {
    let mut iter = types.into_iter();
    match iter.next() {
        Some(first) => iter.all(|t| types_equal(first, t)),
        None => true,
    }
}

pub fn is_primitive(t: &JavaType) -> bool {
    t.is_primitive()
}

pub fn all_arrays<'a>(types: impl IntoIterator<Item = &'a JavaType>) -> bool {
    types.into_iter().all(JavaType::is_array)
}

pub fn all_class_types<'a>(types: impl IntoIterator<Item = &'a JavaType>) -> bool {
    types.into_iter().all(JavaType::is_class)
}

/// Equal, or both non-primitive. A primitive only unifies with itself.
pub fn anti_unifiable(t1: &JavaType, t2: &JavaType) -> bool {
    types_equal(t1, t2) || (!is_primitive(t1) && !is_primitive(t2))
}

/// Same arity and pairwise anti-unifiable parameter types.
pub fn params_anti_unifiable(m1: &MethodDecl, m2: &MethodDecl) -> bool {
    m1.params.len() == m2.params.len()
        && m1
            .param_types()
            .zip(m2.param_types())
            .all(|(a, b)| anti_unifiable(a, b))
}

pub fn same_name(m1: &MethodDecl, m2: &MethodDecl) -> bool {
    m1.name == m2.name
}

/// Equal return types and pairwise equal parameter types.
pub fn same_signature(m1: &MethodDecl, m2: &MethodDecl) -> bool {
    types_equal(&m1.return_type, &m2.return_type)
        && m1.params.len() == m2.params.len()
        && m1
            .param_types()
            .zip(m2.param_types())
            .all(|(a, b)| types_equal(a, b))
}

pub fn same_method(m1: &MethodDecl, m2: &MethodDecl) -> bool {
    same_name(m1, m2) && same_signature(m1, m2)
}

pub fn same_field(f1: &FieldDecl, f2: &FieldDecl) -> bool {
    f1.name == f2.name && types_equal(&f1.ty, &f2.ty)
}

/// Whether `class` declares a method with exactly the signature of `method`.
pub fn has_same_method(ws: &Workspace, method: &MethodDecl, class: ClassId) -> bool {
    ws.find_methods_by_name(class, &method.name)
        .any(|(_, m)| same_signature(m, method))
}

/// Whether `class` declares a field equal to `field`.
pub fn has_same_field(ws: &Workspace, field: &FieldDecl, class: ClassId) -> bool {
    ws.fields_of(class).any(|(_, f)| same_field(f, field))
}

/// Whether `class` directly names `interface` among its super references.
///
/// Raw names are compared; type arguments are ignored.
pub fn implements_interface(ws: &Workspace, class: ClassId, interface: &JavaType) -> bool {
    let Some(name) = interface.raw_name() else {
        return false;
    };
    ws.class(class)
        .super_types()
        .any(|ty| ty.raw_name() == Some(name))
}
