//! Structural anti-unification of sister types.
//!
//! Given the types sister classes use at one slot, the anti-unifier finds the
//! most specific common generalization: nothing when they already agree, a
//! parameterized type when they share a raw declaration, and a type parameter
//! where they diverge. Every parameter it introduces is recorded in the
//! working [`DependentSubstitution`] with the per-class instantiation.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::group::TypeGroup;
use super::slot::Slot;
use super::substitution::DependentSubstitution;
use crate::config::GenerifyConfig;
use crate::error::{GenerifyError, MemberFailure, Result};
use crate::model::{ClassId, JavaType, MethodDecl, TypeParam, WildcardBound};

/// The generified type of each slot that needed one, return slot first.
pub type SlotTypes = BTreeMap<Slot, JavaType>;

/// Anti-unifier for the slots of one member.
///
/// The memo and bound names are shared across all slots it processes, so a
/// group that recurs at another slot gets the same result. Parameters it
/// returns are type variables of `target`.
#[derive(Debug)]
pub struct AntiUnifier<'a> {
    config: &'a GenerifyConfig,
    target: String,
    base_name: String,
    bound_names: HashSet<String>,
    memo: HashMap<TypeGroup, Option<JavaType>>,
}

impl<'a> AntiUnifier<'a> {
    /// Create an anti-unifier for parameters of `target`, naming fresh ones
    /// after `base_name`.
    pub fn new(
        config: &'a GenerifyConfig,
        target: impl Into<String>,
        base_name: impl Into<String>,
        bound_names: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            config,
            target: target.into(),
            base_name: base_name.into(),
            bound_names: bound_names.into_iter().collect(),
            memo: HashMap::new(),
        }
    }

    /// Names that fresh parameters must avoid, including the ones minted so far.
    pub fn bound_names(&self) -> &HashSet<String> {
        &self.bound_names
    }

    /// Anti-unify one group.
    ///
    /// Returns `None` when every class already uses the same type, otherwise
    /// the type to put at `slot`. Fresh parameters are bound in `subst`.
    pub fn antiunify(
        &mut self,
        group: &TypeGroup,
        subst: &mut DependentSubstitution,
        slot: Slot,
    ) -> Result<Option<JavaType>> {
        if let Some(hit) = self.memo.get(group) {
            tracing::trace!(member = %self.base_name, %slot, "anti-unification memo hit");
            return Ok(hit.clone());
        }

        if group.all_equal() {
            self.memo.insert(group.clone(), None);
            return Ok(None);
        }

        if group.any_primitive() {
            let types: Vec<_> = group.types().map(|t| t.to_string()).collect();
            return Err(MemberFailure::CannotGenerifyPrimitive {
                member: self.base_name.clone(),
                slot,
                types: types.join(", "),
            }
            .into());
        }

        // Earlier members and earlier refactorings already introduced a
        // parameter for exactly this instantiation.
        if let Some(existing) = subst.key_for(group) {
            tracing::debug!(member = %self.base_name, %slot, param = %existing, "reusing type parameter");
            let ty = existing.as_type_in(self.target.as_str());
            self.memo.insert(group.clone(), Some(ty.clone()));
            return Ok(Some(ty));
        }

        let result = if let Some(components) = group.components() {
            self.antiunify(&components, subst, slot)?
                .map(JavaType::array_of)
        } else if let Some((kind, bounds)) = self.wildcard_bounds(group) {
            let unified = self.unify_or_common(&bounds, subst, slot)?;
            Some(JavaType::bounded_wildcard(kind, unified))
        } else if group.same_raw_class() {
            Some(self.unify_arguments(group, subst, slot)?)
        } else {
            Some(self.introduce(group, subst, slot)?)
        };

        self.memo.insert(group.clone(), result.clone());
        Ok(result)
    }

    /// Anti-unify every slot of the sister methods, return slot first.
    pub fn antiunify_signature(
        &mut self,
        sisters: &[(ClassId, &MethodDecl)],
        subst: &mut DependentSubstitution,
    ) -> Result<SlotTypes> {
        let mut result = SlotTypes::new();
        let Some((_, representative)) = sisters.first() else {
            return Ok(result);
        };

        for slot in Slot::all(representative) {
            let group = sisters
                .iter()
                .map(|(class, method)| {
                    slot.type_in(method)
                        .map(|t| (*class, t.clone()))
                        .ok_or_else(|| {
                            GenerifyError::internal(format!(
                                "sister method {} has no {slot}",
                                method.signature()
                            ))
                        })
                })
                .collect::<Result<TypeGroup>>()?;
            if let Some(ty) = self.antiunify(&group, subst, slot)? {
                result.insert(slot, ty);
            }
        }
        Ok(result)
    }

    // `List<Foo>` and `List<Bar>` become `List<T>`, not `T`.
    fn unify_arguments(
        &mut self,
        group: &TypeGroup,
        subst: &mut DependentSubstitution,
        slot: Slot,
    ) -> Result<JavaType> {
        let first = group
            .types()
            .next()
            .ok_or_else(|| GenerifyError::internal("empty type group"))?;
        let name = first.raw_name().unwrap_or_default().to_string();
        let arity = first.type_args().len();

        let mut args = Vec::with_capacity(arity);
        for index in 0..arity {
            let arg_group = group.argument(index).ok_or_else(|| {
                GenerifyError::internal(format!("type argument {index} missing in group"))
            })?;
            args.push(self.unify_or_common(&arg_group, subst, slot)?);
        }
        Ok(JavaType::generic(name, args))
    }

    fn unify_or_common(
        &mut self,
        group: &TypeGroup,
        subst: &mut DependentSubstitution,
        slot: Slot,
    ) -> Result<JavaType> {
        match self.antiunify(group, subst, slot)? {
            Some(ty) => Ok(ty),
            None => group
                .common()
                .cloned()
                .ok_or_else(|| GenerifyError::internal("unequal group reported as equal")),
        }
    }

    // Wildcards with the same bound kind unify through their bounds.
    fn wildcard_bounds(&self, group: &TypeGroup) -> Option<(WildcardBound, TypeGroup)> {
        let mut kind = None;
        let mut bounds = TypeGroup::new();
        for (class, ty) in group.iter() {
            let JavaType::Wildcard {
                bound: Some((k, bound)),
            } = ty
            else {
                return None;
            };
            if kind.is_some_and(|seen| seen != *k) {
                return None;
            }
            kind = Some(*k);
            bounds = bounds.with(class, (**bound).clone());
        }
        kind.map(|k| (k, bounds))
    }

    fn introduce(
        &mut self,
        group: &TypeGroup,
        subst: &mut DependentSubstitution,
        slot: Slot,
    ) -> Result<JavaType> {
        // The instantiation lands in a class header, where method type
        // parameters are out of scope.
        if let Some(ty) = group.types().find(|t| t.mentions_method_variable()) {
            return Err(MemberFailure::MethodTypeVariable {
                member: self.base_name.clone(),
                slot,
                ty: ty.to_string(),
            }
            .into());
        }
        let param = self.fresh_param(subst, slot);
        tracing::debug!(member = %self.base_name, %slot, param = %param, "introducing type parameter");
        subst.insert(param.clone(), group.clone())?;
        Ok(param.as_type_in(self.target.as_str()))
    }

    fn fresh_param(&mut self, subst: &DependentSubstitution, slot: Slot) -> TypeParam {
        let mut name = self.config.base_type_parameter_name(&self.base_name, slot);
        while self.bound_names.contains(&name) || subst.contains_key(&TypeParam::new(name.as_str())) {
            name.push(self.config.filler);
        }
        self.bound_names.insert(name.clone());
        TypeParam::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassDecl, Workspace};

    struct Fixture {
        config: GenerifyConfig,
        dog: ClassId,
        cat: ClassId,
    }

    fn fixture() -> Fixture {
        let mut ws = Workspace::new();
        let dog = ws.add_class(ClassDecl::class("Dog"));
        let cat = ws.add_class(ClassDecl::class("Cat"));
        Fixture {
            config: GenerifyConfig::default(),
            dog,
            cat,
        }
    }

    fn group(f: &Fixture, dog: JavaType, cat: JavaType) -> TypeGroup {
        TypeGroup::new().with(f.dog, dog).with(f.cat, cat)
    }

    fn param(name: &str) -> JavaType {
        JavaType::class_variable("Animal", name)
    }

    #[test]
    fn test_all_equal_needs_no_parameter() {
        let f = fixture();
        let mut au = AntiUnifier::new(&f.config, "Animal", "feed", Vec::new());
        let mut subst = DependentSubstitution::new();
        let g = group(&f, JavaType::class("Bone"), JavaType::class("Bone"));

        assert_eq!(au.antiunify(&g, &mut subst, Slot::Parameter(0)).unwrap(), None);
        assert!(subst.is_empty());
    }

    #[test]
    fn test_primitive_fails() {
        let f = fixture();
        let mut au = AntiUnifier::new(&f.config, "Animal", "feed", Vec::new());
        let mut subst = DependentSubstitution::new();
        let g = group(&f, JavaType::INT, JavaType::class("Integer"));

        let err = au.antiunify(&g, &mut subst, Slot::Return).unwrap_err();
        assert!(matches!(
            err.as_member_failure(),
            Some(MemberFailure::CannotGenerifyPrimitive { slot: Slot::Return, .. })
        ));
        assert!(subst.is_empty());
    }

    #[test]
    fn test_fresh_parameter_and_reuse() {
        let f = fixture();
        let mut au = AntiUnifier::new(&f.config, "Animal", "feed", Vec::new());
        let mut subst = DependentSubstitution::new();
        let g = group(&f, JavaType::class("Bone"), JavaType::class("Fish"));

        let first = au.antiunify(&g, &mut subst, Slot::Parameter(0)).unwrap();
        let second = au.antiunify(&g.clone(), &mut subst, Slot::Parameter(1)).unwrap();
        assert_eq!(first, Some(param("TFeed0")));
        assert_eq!(first, second);
        assert_eq!(subst.len(), 1);
        assert_eq!(subst.get(&TypeParam::new("TFeed0")), Some(&g));
    }

    #[test]
    fn test_reuse_from_substitution() {
        let f = fixture();
        let g = group(&f, JavaType::class("Bone"), JavaType::class("Fish"));
        let mut subst = DependentSubstitution::new();
        subst.insert(TypeParam::new("F"), g.clone()).unwrap();

        let mut au = AntiUnifier::new(&f.config, "Animal", "eat", vec!["F".to_string()]);
        let result = au.antiunify(&g, &mut subst, Slot::Parameter(0)).unwrap();
        assert_eq!(result, Some(param("F")));
        assert_eq!(subst.len(), 1);
    }

    #[test]
    fn test_structural_recursion_into_arguments() {
        let f = fixture();
        let mut au = AntiUnifier::new(&f.config, "Animal", "feed", Vec::new());
        let mut subst = DependentSubstitution::new();
        let g = group(
            &f,
            JavaType::generic("Map", vec![JavaType::class("String"), JavaType::class("Foo")]),
            JavaType::generic("Map", vec![JavaType::class("String"), JavaType::class("Bar")]),
        );

        let result = au.antiunify(&g, &mut subst, Slot::Parameter(0)).unwrap();
        assert_eq!(
            result,
            Some(JavaType::generic(
                "Map",
                vec![JavaType::class("String"), param("TFeed0")]
            ))
        );
        let (param, instantiation) = subst.iter().next().unwrap();
        assert_eq!(param.name(), "TFeed0");
        assert_eq!(
            instantiation,
            &group(&f, JavaType::class("Foo"), JavaType::class("Bar"))
        );
    }

    #[test]
    fn test_arrays_recurse_on_components() {
        let f = fixture();
        let mut au = AntiUnifier::new(&f.config, "Animal", "feed", Vec::new());
        let mut subst = DependentSubstitution::new();
        let g = group(
            &f,
            JavaType::class("Bone").array_of(),
            JavaType::class("Fish").array_of(),
        );

        let result = au.antiunify(&g, &mut subst, Slot::Return).unwrap();
        assert_eq!(result, Some(param("TFeedRET").array_of()));
        assert_eq!(
            subst.get(&TypeParam::new("TFeedRET")),
            Some(&group(&f, JavaType::class("Bone"), JavaType::class("Fish")))
        );
    }

    #[test]
    fn test_mixed_shapes_get_a_parameter() {
        let f = fixture();
        let mut au = AntiUnifier::new(&f.config, "Animal", "feed", Vec::new());
        let mut subst = DependentSubstitution::new();
        let g = group(
            &f,
            JavaType::class("Bone").array_of(),
            JavaType::generic("List", vec![JavaType::class("Fish")]),
        );

        let result = au.antiunify(&g, &mut subst, Slot::Parameter(0)).unwrap();
        assert_eq!(result, Some(param("TFeed0")));
        assert_eq!(subst.get(&TypeParam::new("TFeed0")), Some(&g));
    }

    #[test]
    fn test_bounded_wildcards_unify_through_bounds() {
        let f = fixture();
        let mut au = AntiUnifier::new(&f.config, "Animal", "feed", Vec::new());
        let mut subst = DependentSubstitution::new();
        let wild = |name: &str| {
            JavaType::generic(
                "List",
                vec![JavaType::bounded_wildcard(
                    WildcardBound::Extends,
                    JavaType::class(name),
                )],
            )
        };
        let g = group(&f, wild("Bone"), wild("Fish"));

        let result = au.antiunify(&g, &mut subst, Slot::Parameter(0)).unwrap();
        assert_eq!(
            result,
            Some(JavaType::generic(
                "List",
                vec![JavaType::bounded_wildcard(
                    WildcardBound::Extends,
                    param("TFeed0")
                )]
            ))
        );
    }

    #[test]
    fn test_fresh_names_avoid_bound_names() {
        let f = fixture();
        let bound = vec!["TFeed0".to_string(), "TFeed0x".to_string()];
        let mut au = AntiUnifier::new(&f.config, "Animal", "feed", bound);
        let mut subst = DependentSubstitution::new();
        let g = group(&f, JavaType::class("Bone"), JavaType::class("Fish"));

        let result = au.antiunify(&g, &mut subst, Slot::Parameter(0)).unwrap();
        assert_eq!(result, Some(param("TFeed0xx")));
        assert!(au.bound_names().contains("TFeed0xx"));
    }

    #[test]
    fn test_signature_slots() {
        let f = fixture();
        let dog_feed = MethodDecl::new("feed")
            .returns(JavaType::class("Bone"))
            .param("food", JavaType::class("Bone"))
            .param("times", JavaType::INT);
        let cat_feed = MethodDecl::new("feed")
            .returns(JavaType::class("Fish"))
            .param("food", JavaType::class("Fish"))
            .param("times", JavaType::INT);

        let mut au = AntiUnifier::new(&f.config, "Animal", "feed", Vec::new());
        let mut subst = DependentSubstitution::new();
        let slots = au
            .antiunify_signature(&[(f.dog, &dog_feed), (f.cat, &cat_feed)], &mut subst)
            .unwrap();

        let feed_ret = param("TFeedRET");
        assert_eq!(slots.get(&Slot::Return), Some(&feed_ret));
        assert_eq!(slots.get(&Slot::Parameter(0)), Some(&feed_ret));
        assert!(!slots.contains_key(&Slot::Parameter(1)));
        assert_eq!(subst.len(), 1);
    }

    #[test]
    fn test_same_named_class_variables_get_a_parameter() {
        let f = fixture();
        let mut au = AntiUnifier::new(&f.config, "Animal", "feed", Vec::new());
        let mut subst = DependentSubstitution::new();
        let g = group(
            &f,
            JavaType::class_variable("Dog", "X"),
            JavaType::class_variable("Cat", "X"),
        );

        let result = au.antiunify(&g, &mut subst, Slot::Parameter(0)).unwrap();
        assert_eq!(result, Some(param("TFeed0")));
        assert_eq!(subst.get(&TypeParam::new("TFeed0")), Some(&g));
    }

    #[test]
    fn test_renamed_method_variables_agree() {
        let f = fixture();
        let mut au = AntiUnifier::new(&f.config, "Animal", "feed", Vec::new());
        let mut subst = DependentSubstitution::new();
        let g = group(
            &f,
            JavaType::method_variable("Dog", "feed", 0, "U"),
            JavaType::method_variable("Cat", "feed", 0, "V"),
        );

        assert_eq!(au.antiunify(&g, &mut subst, Slot::Parameter(0)).unwrap(), None);
        assert!(subst.is_empty());
    }

    #[test]
    fn test_method_variable_cannot_instantiate_a_parameter() {
        let f = fixture();
        let mut au = AntiUnifier::new(&f.config, "Animal", "feed", Vec::new());
        let mut subst = DependentSubstitution::new();
        let g = group(
            &f,
            JavaType::generic("List", vec![JavaType::method_variable("Dog", "feed", 0, "U")]),
            JavaType::generic("List", vec![JavaType::class("Fish")]),
        );

        let err = au.antiunify(&g, &mut subst, Slot::Parameter(0)).unwrap_err();
        assert!(matches!(
            err.as_member_failure(),
            Some(MemberFailure::MethodTypeVariable { ty, .. }) if ty == "U"
        ));
        assert!(subst.is_empty());
    }
}
