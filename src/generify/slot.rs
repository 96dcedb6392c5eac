//! Structural positions of a method signature.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{JavaType, MethodDecl};

/// A slot of a method signature: its return type or one parameter.
///
/// At serialization boundaries a slot is a plain integer: `-1` is the return
/// type and `0..n` are 0-based parameter indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum Slot {
    Return,
    Parameter(usize),
}

impl Slot {
    /// The integer position of this slot.
    pub fn position(self) -> i32 {
        match self {
            Slot::Return => -1,
            Slot::Parameter(i) => i as i32,
        }
    }

    /// Parse an integer position; anything below `-1` is invalid.
    pub fn from_position(position: i32) -> Option<Self> {
        match position {
            -1 => Some(Slot::Return),
            i if i >= 0 => Some(Slot::Parameter(i as usize)),
            _ => None,
        }
    }

    /// The return slot followed by every parameter slot of `method`.
    pub fn all(method: &MethodDecl) -> impl Iterator<Item = Slot> + use<> {
        std::iter::once(Slot::Return).chain((0..method.params.len()).map(Slot::Parameter))
    }

    /// The type at this slot of `method`.
    pub fn type_in(self, method: &MethodDecl) -> Option<&JavaType> {
        match self {
            Slot::Return => Some(&method.return_type),
            Slot::Parameter(i) => method.params.get(i).map(|p| &p.ty),
        }
    }

    /// Replace the type at this slot of `method`. Returns false if the slot
    /// does not exist.
    pub fn set_in(self, method: &mut MethodDecl, ty: JavaType) -> bool {
        match self {
            Slot::Return => {
                method.return_type = ty;
                true
            }
            Slot::Parameter(i) => match method.params.get_mut(i) {
                Some(param) => {
                    param.ty = ty;
                    true
                }
                None => false,
            },
        }
    }
}

impl From<Slot> for i32 {
    fn from(slot: Slot) -> Self {
        slot.position()
    }
}

impl TryFrom<i32> for Slot {
    type Error = String;

    fn try_from(position: i32) -> Result<Self, Self::Error> {
        Slot::from_position(position).ok_or_else(|| format!("invalid slot position {position}"))
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Return => write!(f, "return type"),
            Slot::Parameter(i) => write!(f, "parameter {i}"),
        }
    }
}
