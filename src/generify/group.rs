//! Type groups: the types sister classes use at one structural position.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::compare;
use crate::model::{ClassId, JavaType, Workspace};

/// An immutable, hashable map from sister class to the type it uses at one
/// slot. Ordered by class id so equal contents compare and hash equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeGroup(BTreeMap<ClassId, JavaType>);

impl TypeGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy with `class` mapped to `ty`.
    pub fn with(mut self, class: ClassId, ty: JavaType) -> Self {
        self.0.insert(class, ty);
        self
    }

    pub fn get(&self, class: ClassId) -> Option<&JavaType> {
        self.0.get(&class)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &JavaType)> {
        self.0.iter().map(|(c, t)| (*c, t))
    }

    pub fn classes(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.0.keys().copied()
    }

    pub fn types(&self) -> impl Iterator<Item = &JavaType> {
        self.0.values()
    }

    /// The type every class agrees on, if they all agree.
    pub fn common(&self) -> Option<&JavaType> {
        if compare::all_equal(self.types()) {
            self.types().next()
        } else {
            None
        }
    }

    pub fn all_equal(&self) -> bool {
        compare::all_equal(self.types())
    }

    pub fn any_primitive(&self) -> bool {
        self.types().any(compare::is_primitive)
    }

    /// The group of component types, when every type is an array.
    pub fn components(&self) -> Option<TypeGroup> {
        self.iter()
            .map(|(c, t)| t.component().map(|comp| (c, comp.clone())))
            .collect()
    }

    /// Whether every type is a class type of the same raw declaration
    /// (same name and same number of type arguments).
    pub fn same_raw_class(&self) -> bool {
        if !compare::all_class_types(self.types()) {
            return false;
        }
        let mut raws = self.types().map(|t| (t.raw_name(), t.type_args().len()));
        match raws.next() {
            Some(first) => raws.all(|r| r == first),
            None => true,
        }
    }

    /// The group of `index`-th type arguments. `None` if a type lacks one.
    pub fn argument(&self, index: usize) -> Option<TypeGroup> {
        self.iter()
            .map(|(c, t)| t.type_args().get(index).map(|a| (c, a.clone())))
            .collect()
    }

    /// Render as `{Dog: Bone, Cat: Fish}` using class names.
    pub fn describe(&self, ws: &Workspace) -> String {
        let entries: Vec<_> = self
            .iter()
            .map(|(c, t)| format!("{}: {}", ws.class_name(c), t))
            .collect();
        format!("{{{}}}", entries.join(", "))
    }
}

impl FromIterator<(ClassId, JavaType)> for TypeGroup {
    fn from_iter<I: IntoIterator<Item = (ClassId, JavaType)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
