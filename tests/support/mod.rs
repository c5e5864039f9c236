//! Shared helpers for the scenario tests.
//!
//! Diagnostics are compared as sorted `(rule, region)` sets so the tests are
//! insensitive to discovery order, mirroring how result identity is defined.

// Not every test binary uses every helper.
#![allow(dead_code)]

use lzn::ast::Model;
use lzn::diagnostics::{LintResult, Region};
use lzn::env::LintEnv;
use lzn::parser::{parse_model_str, std_include_paths};
use lzn::rules::Registry;

pub const MODEL_FILENAME: &str = "testmodel";

pub fn parse(source: &str) -> Model {
    parse_model_str(source, MODEL_FILENAME).expect("model should parse and type-check")
}

/// Run a single rule over `source` and return its findings.
pub fn run_rule(rule_id: u32, source: &str) -> Vec<LintResult> {
    let model = parse(source);
    let registry = Registry::with_default_rules().expect("registry builds");
    let rule = registry.get(rule_id).expect("rule id should be registered");
    let env = LintEnv::new(&model, std_include_paths());
    rule.run(&env).expect("rule should run cleanly");
    env.into_results()
}

/// A single-line marked region, the shape almost every rule reports.
pub fn olm(line: u32, startcol: u32, endcol: u32) -> Region {
    Region::OneLineMarked {
        line,
        startcol,
        endcol: Some(endcol),
    }
}

/// Assert that `rule_id` run over `source` reports exactly `expected`
/// regions (in any order), all in the test model file.
#[track_caller]
pub fn expect_lints(rule_id: u32, source: &str, mut expected: Vec<Region>) {
    let results = run_rule(rule_id, source);
    let mut actual = Vec::new();
    for r in &results {
        assert_eq!(r.rule_id, rule_id, "unexpected rule id in {r:?}");
        assert_eq!(
            r.content.filename, MODEL_FILENAME,
            "diagnostic outside the test model: {r:?}"
        );
        assert!(r.content.is_valid(), "invalid contents: {r:?}");
        actual.push(r.content.region.clone());
    }
    actual.sort();
    expected.sort();
    assert_eq!(actual, expected, "for model:\n{source}");
}
