//! Member selection table for pull-up refactorings.
//!
//! One row per member of the class being refactored: its methods, its
//! fields and each interface it implements. Rows carry the user's choices
//! (`checked`, `to_abstract`) and three derived columns recomputed by
//! [`MemberTable::refresh`] in a fixed order:
//!
//! 1. can the member be generified into the target,
//! 2. can it be pulled up as abstract without generification,
//! 3. the combined [`CanMakeAbstract`] verdict.
//!
//! Rows are addressed by [`MemberRef`], never by position.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{GenerifyError, MemberFailure, Result};
use crate::generify::{compute_can_generify, direct_abstract_pullup};
use crate::model::{ClassId, MemberRef, Workspace};

/// Whether a member can end up abstract in the target, and how.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanMakeAbstract {
    #[default]
    No,
    /// Every branch already has the identical signature.
    YesPlain,
    /// Possible once type parameters are introduced.
    YesGenerics,
}

impl CanMakeAbstract {
    pub fn is_possible(self) -> bool {
        self != CanMakeAbstract::No
    }
}

/// One row of the table.
#[derive(Debug, Clone, Serialize)]
pub struct MemberInfo {
    pub member: MemberRef,
    /// Display name: signature for methods, `name: Type` for fields.
    pub display: String,
    pub checked: bool,
    pub to_abstract: bool,
    pub can_generify: bool,
    pub direct_abstract_pullup: bool,
    pub can_make_abstract: CanMakeAbstract,
    /// Why the member cannot be generified, after a refresh.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<MemberFailure>,
}

impl MemberInfo {
    fn new(member: MemberRef, display: String) -> Self {
        Self {
            member,
            display,
            checked: false,
            to_abstract: false,
            can_generify: false,
            direct_abstract_pullup: false,
            can_make_abstract: CanMakeAbstract::No,
            failure: None,
        }
    }

    fn is_method(&self) -> bool {
        matches!(self.member, MemberRef::Method { .. })
    }
}

/// The members of one class, analyzed against a target.
#[derive(Debug, Clone, Serialize)]
pub struct MemberTable {
    source: ClassId,
    target: Option<ClassId>,
    target_is_interface: bool,
    scope: Option<PathBuf>,
    rows: Vec<MemberInfo>,
}

impl MemberTable {
    /// Build an unanalyzed table over the members `class` declares.
    pub fn for_class(ws: &Workspace, class: ClassId) -> Self {
        let mut rows = Vec::new();
        for (id, method) in ws.methods_of(class) {
            rows.push(MemberInfo::new(MemberRef::Method { id }, method.signature()));
        }
        for (id, field) in ws.fields_of(class) {
            rows.push(MemberInfo::new(
                MemberRef::Field { id },
                format!("{}: {}", field.name, field.ty),
            ));
        }
        for interface in &ws.class(class).implements {
            rows.push(MemberInfo::new(
                MemberRef::Implements {
                    class,
                    interface: interface.clone(),
                },
                format!("implements {interface}"),
            ));
        }
        Self {
            source: class,
            target: None,
            target_is_interface: false,
            scope: None,
            rows,
        }
    }

    pub fn source(&self) -> ClassId {
        self.source
    }

    /// The target of the last refresh.
    pub fn target(&self) -> Option<ClassId> {
        self.target
    }

    pub fn scope(&self) -> Option<&Path> {
        self.scope.as_deref()
    }

    /// Recompute the derived columns of every row against `target`.
    ///
    /// Rows that cannot be made abstract are unchecked. Checked methods
    /// become abstract when the target is an interface.
    pub fn refresh(&mut self, ws: &Workspace, target: ClassId, scope: Option<&Path>) -> Result<()> {
        self.target = Some(target);
        self.target_is_interface = ws.class(target).is_interface();
        self.scope = scope.map(Path::to_path_buf);

        for row in &mut self.rows {
            match compute_can_generify(ws, &row.member, target, scope) {
                Ok(_) => {
                    row.can_generify = true;
                    row.failure = None;
                }
                Err(GenerifyError::Member(failure)) => {
                    row.can_generify = false;
                    row.failure = Some(failure);
                }
                Err(err) => return Err(err),
            }
        }

        for row in &mut self.rows {
            row.direct_abstract_pullup = direct_abstract_pullup(ws, &row.member, target, scope);
        }

        for row in &mut self.rows {
            let disqualified = row
                .failure
                .as_ref()
                .is_some_and(MemberFailure::disqualifies_member);
            row.can_make_abstract = if row.direct_abstract_pullup && !disqualified {
                CanMakeAbstract::YesPlain
            } else if row.can_generify {
                CanMakeAbstract::YesGenerics
            } else {
                CanMakeAbstract::No
            };
            if !row.can_make_abstract.is_possible() {
                row.checked = false;
                row.to_abstract = false;
            } else if row.checked && row.is_method() && self.target_is_interface {
                row.to_abstract = true;
            }
        }

        tracing::debug!(
            class = ws.class_name(self.source),
            target = ws.class_name(target),
            enabled = self.rows.iter().filter(|r| r.can_make_abstract.is_possible()).count(),
            "refreshed member table"
        );
        Ok(())
    }

    fn row_mut(&mut self, member: &MemberRef) -> Result<&mut MemberInfo> {
        self.rows
            .iter_mut()
            .find(|r| &r.member == member)
            .ok_or_else(|| GenerifyError::InvalidConfig(format!("{member} is not in the member table")))
    }

    // Selecting requires an analysis that found the member eligible.
    fn ensure_enabled(row: &MemberInfo) -> Result<()> {
        if row.can_make_abstract.is_possible() {
            return Ok(());
        }
        match &row.failure {
            Some(failure) => Err(failure.clone().into()),
            None => Err(GenerifyError::InvalidConfig(format!(
                "'{}' has not been analyzed against a target",
                row.display
            ))),
        }
    }

    /// Select or deselect a member.
    pub fn set_checked(&mut self, member: &MemberRef, checked: bool) -> Result<()> {
        let to_interface = self.target_is_interface;
        let row = self.row_mut(member)?;
        if checked {
            Self::ensure_enabled(row)?;
            if to_interface && row.is_method() {
                row.to_abstract = true;
            }
        }
        row.checked = checked;
        Ok(())
    }

    /// Mark a member to become abstract in the target.
    pub fn set_to_abstract(&mut self, member: &MemberRef, to_abstract: bool) -> Result<()> {
        let to_interface = self.target_is_interface;
        let row = self.row_mut(member)?;
        if to_abstract {
            Self::ensure_enabled(row)?;
        } else if to_interface && row.is_method() {
            return Err(GenerifyError::InvalidConfig(format!(
                "'{}' is always abstract in an interface",
                row.display
            )));
        }
        row.to_abstract = to_abstract;
        Ok(())
    }

    pub fn rows(&self) -> &[MemberInfo] {
        &self.rows
    }

    pub fn row(&self, member: &MemberRef) -> Option<&MemberInfo> {
        self.rows.iter().find(|r| &r.member == member)
    }

    /// The checked rows, in table order.
    pub fn selected(&self) -> impl Iterator<Item = &MemberInfo> {
        self.rows.iter().filter(|r| r.checked)
    }

    /// Check and mark abstract every method that can be made abstract.
    pub fn select_all_abstract(&mut self) {
        for row in &mut self.rows {
            if row.can_make_abstract.is_possible() {
                row.checked = true;
                row.to_abstract = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassDecl, FieldDecl, JavaType, MethodDecl};

    const ZOO: &str = "zoo";

    struct Zoo {
        ws: Workspace,
        animal: ClassId,
        dog: ClassId,
        bark: MemberRef,
        feed: MemberRef,
        dig: MemberRef,
        name: MemberRef,
    }

    fn zoo() -> Zoo {
        let mut ws = Workspace::new();
        let animal = ws.add_class(ClassDecl::class("Animal").abstract_class().in_directory(ZOO));
        let dog = ws.add_class(
            ClassDecl::class("Dog")
                .extends(JavaType::class("Animal"))
                .implements(JavaType::class("Pet"))
                .in_directory(ZOO),
        );
        let cat = ws.add_class(
            ClassDecl::class("Cat")
                .extends(JavaType::class("Animal"))
                .implements(JavaType::class("Pet"))
                .in_directory(ZOO),
        );
        let bark = ws.add_method(dog, MethodDecl::new("bark").public());
        ws.add_method(cat, MethodDecl::new("bark").public());
        let feed = ws.add_method(
            dog,
            MethodDecl::new("feed").public().param("food", JavaType::class("Bone")),
        );
        ws.add_method(
            cat,
            MethodDecl::new("feed").public().param("food", JavaType::class("Fish")),
        );
        let dig = ws.add_method(dog, MethodDecl::new("dig").public());
        let name = ws.add_field(dog, FieldDecl::new("name", JavaType::class("String")));
        Zoo {
            ws,
            animal,
            dog,
            bark: MemberRef::Method { id: bark },
            feed: MemberRef::Method { id: feed },
            dig: MemberRef::Method { id: dig },
            name: MemberRef::Field { id: name },
        }
    }

    #[test]
    fn test_rows_cover_methods_fields_and_interfaces() {
        let z = zoo();
        let table = MemberTable::for_class(&z.ws, z.dog);
        let display: Vec<_> = table.rows().iter().map(|r| r.display.as_str()).collect();
        assert_eq!(
            display,
            vec!["bark(): void", "feed(Bone): void", "dig(): void", "name: String", "implements Pet"]
        );
        assert!(table.rows().iter().all(|r| !r.can_make_abstract.is_possible()));
    }

    #[test]
    fn test_refresh_pipeline() {
        let z = zoo();
        let mut table = MemberTable::for_class(&z.ws, z.dog);
        table.refresh(&z.ws, z.animal, Some(Path::new(ZOO))).unwrap();

        let bark = table.row(&z.bark).unwrap();
        assert!(bark.can_generify && bark.direct_abstract_pullup);
        assert_eq!(bark.can_make_abstract, CanMakeAbstract::YesPlain);

        let feed = table.row(&z.feed).unwrap();
        assert!(feed.can_generify && !feed.direct_abstract_pullup);
        assert_eq!(feed.can_make_abstract, CanMakeAbstract::YesGenerics);

        let dig = table.row(&z.dig).unwrap();
        assert_eq!(dig.can_make_abstract, CanMakeAbstract::No);
        assert_eq!(
            dig.failure,
            Some(MemberFailure::MemberNotImplemented {
                member: "dig".to_string(),
                class: "Cat".to_string(),
            })
        );

        let name = table.row(&z.name).unwrap();
        assert!(matches!(name.failure, Some(MemberFailure::UnsupportedMember { .. })));
    }

    #[test]
    fn test_checking_requires_eligibility() {
        let z = zoo();
        let mut table = MemberTable::for_class(&z.ws, z.dog);
        assert!(matches!(
            table.set_checked(&z.feed, true),
            Err(GenerifyError::InvalidConfig(_))
        ));

        table.refresh(&z.ws, z.animal, Some(Path::new(ZOO))).unwrap();
        table.set_checked(&z.feed, true).unwrap();
        table.set_to_abstract(&z.feed, true).unwrap();
        let err = table.set_checked(&z.dig, true).unwrap_err();
        assert!(err.is_member_level());

        let selected: Vec<_> = table.selected().map(|r| r.member.clone()).collect();
        assert_eq!(selected, vec![z.feed]);
    }

    #[test]
    fn test_refresh_unchecks_rows_that_became_ineligible() {
        let mut z = zoo();
        let mut table = MemberTable::for_class(&z.ws, z.dog);
        table.refresh(&z.ws, z.animal, Some(Path::new(ZOO))).unwrap();
        table.set_checked(&z.bark, true).unwrap();
        table.set_to_abstract(&z.bark, true).unwrap();

        let cat = z.ws.require_class("Cat").unwrap();
        let cat_bark = z.ws.require_method(cat, "bark").unwrap();
        z.ws.remove_method(cat_bark);
        table.refresh(&z.ws, z.animal, Some(Path::new(ZOO))).unwrap();

        let bark = table.row(&z.bark).unwrap();
        assert!(!bark.checked && !bark.to_abstract);
        assert_eq!(table.selected().count(), 0);
    }

    #[test]
    fn test_identical_private_methods_stay_ineligible() {
        let mut z = zoo();
        let cat = z.ws.require_class("Cat").unwrap();
        let groom = MemberRef::Method {
            id: z.ws.add_method(z.dog, MethodDecl::new("groom").private()),
        };
        z.ws.add_method(cat, MethodDecl::new("groom").private());

        let mut table = MemberTable::for_class(&z.ws, z.dog);
        table.refresh(&z.ws, z.animal, Some(Path::new(ZOO))).unwrap();

        let row = table.row(&groom).unwrap();
        assert!(row.direct_abstract_pullup);
        assert_eq!(row.can_make_abstract, CanMakeAbstract::No);
        assert!(matches!(row.failure, Some(MemberFailure::PrivateMember { .. })));
        assert!(table.set_checked(&groom, true).unwrap_err().is_member_level());
    }

    #[test]
    fn test_interface_target_forces_abstract() {
        let mut ws = Workspace::new();
        let pet = ws.add_class(ClassDecl::interface("Pet").in_directory(ZOO));
        let dog = ws.add_class(
            ClassDecl::class("Dog")
                .implements(JavaType::class("Pet"))
                .in_directory(ZOO),
        );
        let play = MemberRef::Method {
            id: ws.add_method(dog, MethodDecl::new("play").public()),
        };

        let mut table = MemberTable::for_class(&ws, dog);
        table.refresh(&ws, pet, Some(Path::new(ZOO))).unwrap();
        table.set_checked(&play, true).unwrap();
        assert!(table.row(&play).unwrap().to_abstract);
        assert!(table.set_to_abstract(&play, false).is_err());
    }
}
