//! Driver-level tests: linting real files, config discovery, rendering.

use std::io::Write as _;

use lzn::render::{self, CachedFileReader};
use lzn::{IgnoreSet, LintEngine, config};

#[test]
fn lint_file_reports_against_the_real_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.mzn");
    std::fs::write(&path, "var int: x;\n").unwrap();

    let engine = LintEngine::with_default_rules().unwrap();
    let results = engine.lint_file(&path, &IgnoreSet::default()).unwrap();
    assert!(!results.is_empty());
    for r in &results {
        assert_eq!(r.content.filename, path.to_string_lossy());
    }
}

#[test]
fn includes_resolve_relative_to_the_model() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("defs.mzn"), "var int: shared;\n").unwrap();
    let path = dir.path().join("model.mzn");
    std::fs::write(
        &path,
        "include \"defs.mzn\";\nconstraint shared = 1;\n",
    )
    .unwrap();

    let engine = LintEngine::with_default_rules().unwrap();
    let results = engine.lint_file(&path, &IgnoreSet::default()).unwrap();
    // `shared` is declared in the include and used by the model; nothing
    // should claim it is unused.
    assert!(results.iter().all(|r| r.rule_id != 1));
}

#[test]
fn config_ignores_apply_like_cli_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.mzn");
    std::fs::write(&path, "var int: x;\n").unwrap();
    std::fs::write(
        dir.path().join(config::DEFAULT_CONFIG_FILE_NAME),
        "ignore = [\"unbounded-variable\"]\n\"ignore-category\" = [\"unsure\"]\n",
    )
    .unwrap();

    let (_, cfg) = config::load_config(None, dir.path()).unwrap().unwrap();
    let mut ignore = IgnoreSet::default();
    for entry in &cfg.ignore {
        ignore.add_rule(entry);
    }
    for entry in &cfg.ignore_category {
        ignore.add_category(entry).unwrap();
    }

    let engine = LintEngine::with_default_rules().unwrap();
    let results = engine.lint_file(&path, &ignore).unwrap();
    assert!(results.iter().all(|r| r.rule_id != 13));
    assert!(results.iter().all(|r| r.rule_id != 9), "unsure is ignored");
}

#[test]
fn end_to_end_render_includes_snippets() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.mzn");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "var int: x;").unwrap();
    drop(f);

    let engine = LintEngine::with_default_rules().unwrap();
    let ignore = IgnoreSet::from_options(["1", "9"], []).unwrap();
    let results = engine.lint_file(&path, &ignore).unwrap();

    let mut out = Vec::new();
    let mut reader = CachedFileReader::new();
    render::render_results(&mut out, &results, &mut reader).unwrap();
    let rendered = String::from_utf8(out).unwrap();
    assert!(rendered.contains("unbounded-variable(13)"));
    assert!(rendered.contains("var int: x;"));
    assert!(rendered.contains('^'));
}

#[test]
fn parse_errors_surface_as_errors_not_diagnostics() {
    let engine = LintEngine::with_default_rules().unwrap();
    let err = engine.lint_source("var int x;", "broken").unwrap_err();
    assert!(matches!(err, lzn::error::Error::Parse { .. }));

    let err = engine.lint_source("constraint nowhere = 1;", "broken").unwrap_err();
    assert!(matches!(err, lzn::error::Error::Type { .. }));
}
