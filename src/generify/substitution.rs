//! Dependent substitutions: type parameter to per-class instantiation.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::group::TypeGroup;
use crate::error::{GenerifyError, Result};
use crate::model::{ClassId, JavaType, TypeParam};

/// Maps each type parameter to the concrete type every sister class uses
/// for it, in the order parameters were introduced.
///
/// Append-only: once a parameter is bound, rebinding it to a different
/// group is an internal error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependentSubstitution(IndexMap<TypeParam, TypeGroup>);

impl DependentSubstitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `param` to `group`. Binding the same group again is a no-op.
    pub fn insert(&mut self, param: TypeParam, group: TypeGroup) -> Result<()> {
        match self.0.get(&param) {
            Some(existing) if *existing == group => Ok(()),
            Some(_) => Err(GenerifyError::internal(format!(
                "type parameter {param} rebound to a different type group"
            ))),
            None => {
                self.0.insert(param, group);
                Ok(())
            }
        }
    }

    pub fn get(&self, param: &TypeParam) -> Option<&TypeGroup> {
        self.0.get(param)
    }

    /// The concrete type `class` uses for `param`.
    pub fn get_concrete(&self, param: &TypeParam, class: ClassId) -> Result<&JavaType> {
        self.0
            .get(param)
            .and_then(|group| group.get(class))
            .ok_or_else(|| {
                GenerifyError::internal(format!(
                    "no instantiation of {param} for class#{}",
                    class.0
                ))
            })
    }

    pub fn contains_key(&self, param: &TypeParam) -> bool {
        self.0.contains_key(param)
    }

    /// The first parameter bound to exactly `group`.
    pub fn key_for(&self, group: &TypeGroup) -> Option<&TypeParam> {
        self.0.iter().find(|(_, g)| *g == group).map(|(p, _)| p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TypeParam, &TypeGroup)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &TypeParam> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries of `newer` whose key is absent from `older`, in `newer`'s order.
    pub fn difference(newer: &Self, older: &Self) -> Self {
        Self(
            newer
                .0
                .iter()
                .filter(|(k, _)| !older.contains_key(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}
