//! lzn: a linter for MiniZinc models.
//!
//! The pipeline: the frontend in [`parser`] turns source text into a typed
//! [`ast::Model`]; [`LintEngine`] wraps a [`rules::Registry`] and runs each
//! rule over a shared [`env::LintEnv`]; rules find AST shapes through the
//! pattern searches in [`search`] and report [`diagnostics::LintResult`]s,
//! which [`render`] formats for the terminal.

pub mod ast;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod env;
pub mod error;
pub mod parser;
pub mod render;
pub mod rewrite;
pub mod rules;
pub mod search;
pub mod telemetry;

use std::path::Path;

use crate::ast::Model;
use crate::diagnostics::LintResult;
use crate::env::LintEnv;
use crate::error::Result;
use crate::rules::{Category, LintRule, Registry};

/// Which rules to skip, resolved from CLI flags and config.
#[derive(Debug, Default)]
pub struct IgnoreSet {
    ids: Vec<u32>,
    names: Vec<String>,
    categories: Vec<Category>,
}

impl IgnoreSet {
    /// Add an id-or-name entry: numeric strings are rule ids, anything else
    /// a rule name.
    pub fn add_rule(&mut self, id_or_name: &str) {
        match id_or_name.parse::<u32>() {
            Ok(id) => self.ids.push(id),
            Err(_) => self.names.push(id_or_name.to_string()),
        }
    }

    /// Add a category by name; unknown names are an error.
    pub fn add_category(&mut self, name: &str) -> Result<()> {
        let category = Category::from_name(name)
            .ok_or_else(|| error::Error::UnknownCategory(name.to_string()))?;
        self.categories.push(category);
        Ok(())
    }

    /// Collect ignore entries from repeatable flag values.
    pub fn from_options<'a>(
        rules: impl IntoIterator<Item = &'a str>,
        categories: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self> {
        let mut set = Self::default();
        for r in rules {
            set.add_rule(r);
        }
        for c in categories {
            set.add_category(c)?;
        }
        Ok(set)
    }

    #[must_use]
    pub fn is_ignored(&self, rule: &dyn LintRule) -> bool {
        self.ids.contains(&rule.id())
            || self.names.iter().any(|n| n == rule.name())
            || self.categories.contains(&rule.category())
    }
}

/// Runs a rule registry over parsed models.
pub struct LintEngine {
    registry: Registry,
}

impl LintEngine {
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// Engine with the full built-in rule set.
    pub fn with_default_rules() -> Result<Self> {
        Ok(Self::new(Registry::with_default_rules()?))
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run every rule not excluded by `ignore` over `model`, in registry
    /// order, and return the accumulated findings.
    pub fn lint_model(&self, model: &Model, ignore: &IgnoreSet) -> Result<Vec<LintResult>> {
        let env = LintEnv::new(model, parser::std_include_paths());
        for rule in self.registry.iter() {
            if ignore.is_ignored(rule) {
                continue;
            }
            rule.run(&env)?;
        }
        Ok(env.into_results())
    }

    /// Parse, type-check and lint an in-memory model.
    pub fn lint_source(&self, source: &str, name: &str) -> Result<Vec<LintResult>> {
        let model = parser::parse_model_str(source, name)?;
        self.lint_model(&model, &IgnoreSet::default())
    }

    /// Parse, type-check and lint a model file.
    pub fn lint_file(&self, path: &Path, ignore: &IgnoreSet) -> Result<Vec<LintResult>> {
        let model = parser::parse_model_file(path)?;
        self.lint_model(&model, ignore)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_engine_lints_source() {
        let engine = LintEngine::with_default_rules().expect("registry builds");
        let results = engine
            .lint_source("var int: x;", "testmodel")
            .expect("linting should succeed");
        assert!(results.iter().any(|r| r.rule_id == 13));
    }

    #[test]
    fn ignore_set_matches_by_id_name_and_category() {
        let engine = LintEngine::with_default_rules().unwrap();
        let rule = engine.registry().get(13).unwrap();

        let by_id = IgnoreSet::from_options(["13"], []).unwrap();
        assert!(by_id.is_ignored(rule));

        let by_name = IgnoreSet::from_options(["unbounded-variable"], []).unwrap();
        assert!(by_name.is_ignored(rule));

        let by_category = IgnoreSet::from_options([], ["performance"]).unwrap();
        assert!(by_category.is_ignored(rule));

        let unrelated = IgnoreSet::from_options(["4"], ["style"]).unwrap();
        assert!(!unrelated.is_ignored(rule));
    }

    #[test]
    fn unknown_categories_are_rejected() {
        assert!(IgnoreSet::from_options([], ["nonsense"]).is_err());
    }

    #[test]
    fn ignored_rules_produce_no_results() {
        let engine = LintEngine::with_default_rules().unwrap();
        let model = parser::parse_model_str("var int: x;", "testmodel").unwrap();
        let ignore = IgnoreSet::from_options(["13", "9", "1"], []).unwrap();
        let results = engine.lint_model(&model, &ignore).unwrap();
        assert!(results.iter().all(|r| ![13, 9, 1].contains(&r.rule_id)));
    }
}
