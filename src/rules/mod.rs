//! The lint rule registry.
//!
//! Rules are plain values implementing [`LintRule`]; the [`Registry`] is
//! populated explicitly at startup via [`Registry::with_default_rules`] and
//! never mutated afterwards. Registering two rules under one id is a fatal
//! initialization error.

use crate::env::LintEnv;
use crate::error::{Error, Result};

mod compacted_if;
mod constant_variable;
mod element_predicate;
mod global_reified;
mod globals_in_function;
mod non_func_hint;
mod one_based_arrays;
mod operator_on_var;
mod symmetry_breaking;
mod unbounded_variable;
mod unused_var_funcs;
mod var_in_gen;
mod var_in_if_where;
mod zero_one_vars;

/// High-level classification of a rule, usable for suppression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Challenge,
    Style,
    Unsure,
    Performance,
    Redundant,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Challenge,
        Category::Style,
        Category::Unsure,
        Category::Performance,
        Category::Redundant,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Challenge => "challenge",
            Category::Style => "style",
            Category::Unsure => "unsure",
            Category::Performance => "performance",
            Category::Redundant => "redundant",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Category> {
        Category::ALL.iter().copied().find(|c| c.as_str() == name)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single analysis over a [`LintEnv`].
pub trait LintRule {
    fn id(&self) -> u32;
    fn name(&self) -> &'static str;
    fn category(&self) -> Category;
    fn run(&self, env: &LintEnv<'_>) -> Result<()>;
}

/// Process-lifetime table of rules, iterated in ascending id order.
pub struct Registry {
    rules: Vec<Box<dyn LintRule>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Register a rule. Fails with [`Error::DuplicateRuleId`] when the id is
    /// already taken.
    pub fn add(&mut self, rule: Box<dyn LintRule>) -> Result<()> {
        if self.rules.iter().any(|r| r.id() == rule.id()) {
            return Err(Error::DuplicateRuleId(rule.id()));
        }
        let pos = self
            .rules
            .partition_point(|r| r.id() < rule.id());
        self.rules.insert(pos, rule);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: u32) -> Option<&dyn LintRule> {
        self.rules.iter().find(|r| r.id() == id).map(|r| &**r)
    }

    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&dyn LintRule> {
        self.rules.iter().find(|r| r.name() == name).map(|r| &**r)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn LintRule> {
        self.rules.iter().map(|r| &**r)
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.rules.len()
    }

    /// The full built-in rule catalogue.
    pub fn with_default_rules() -> Result<Self> {
        let mut registry = Self::new();
        registry.add(Box::new(unused_var_funcs::UnusedVarFuncs))?;
        registry.add(Box::new(constant_variable::ConstantVariable))?;
        registry.add(Box::new(globals_in_function::GlobalsInFunction))?;
        registry.add(Box::new(symmetry_breaking::SymmetryBreaking))?;
        registry.add(Box::new(var_in_gen::VarInGen))?;
        registry.add(Box::new(non_func_hint::NonFuncHint))?;
        registry.add(Box::new(unbounded_variable::UnboundedVariable))?;
        registry.add(Box::new(element_predicate::ElementPredicate))?;
        registry.add(Box::new(global_reified::GlobalReified))?;
        registry.add(Box::new(operator_on_var::OperatorOnVar))?;
        registry.add(Box::new(one_based_arrays::OneBasedArrays))?;
        registry.add(Box::new(compacted_if::CompactedIf))?;
        registry.add(Box::new(zero_one_vars::ZeroOneVars))?;
        registry.add(Box::new(var_in_if_where::VarInIfWhere))?;
        Ok(registry)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_is_sorted_and_complete() {
        let registry = Registry::with_default_rules().expect("no duplicate ids");
        let ids: Vec<u32> = registry.iter().map(LintRule::id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
        assert_eq!(registry.size(), 14);
        for id in &ids {
            assert_eq!(registry.get(*id).unwrap().id(), *id);
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        struct Dummy;
        impl LintRule for Dummy {
            fn id(&self) -> u32 {
                13
            }
            fn name(&self) -> &'static str {
                "dummy"
            }
            fn category(&self) -> Category {
                Category::Style
            }
            fn run(&self, _env: &LintEnv<'_>) -> Result<()> {
                Ok(())
            }
        }

        let mut registry = Registry::with_default_rules().unwrap();
        assert!(matches!(
            registry.add(Box::new(Dummy)),
            Err(Error::DuplicateRuleId(13))
        ));
    }

    #[test]
    fn rules_are_found_by_name() {
        let registry = Registry::with_default_rules().unwrap();
        assert_eq!(registry.find_by_name("unbounded-variable").unwrap().id(), 13);
        assert!(registry.find_by_name("no-such-rule").is_none());
    }

    #[test]
    fn category_names_round_trip() {
        for c in Category::ALL {
            assert_eq!(Category::from_name(c.as_str()), Some(c));
        }
        assert_eq!(Category::from_name("bogus"), None);
    }
}
