use crate::ast::{ExprCat, ExprKind};
use crate::diagnostics::{FileContents, LintResult};
use crate::env::LintEnv;
use crate::error::Result;
use crate::rewrite::RewriteExpr;
use crate::rules::{Category, LintRule};
use crate::search::SearchBuilder;

/// Constraints that are well-known symmetry breakers should say so by
/// wrapping themselves in `symmetry_breaking_constraint(...)`, letting
/// solvers that cannot exploit them drop them.
pub struct SymmetryBreaking;

const SYMMETRY_BREAKERS: &[&str] = &[
    "lex2",
    "lex_greater",
    "lex_greatereq",
    "lex_less",
    "lex_lesseq",
    "strict_lex2",
    "seq_precede_chain",
    "value_precede",
    "value_precede_chain",
    "increasing",
    "decreasing",
];

impl LintRule for SymmetryBreaking {
    fn id(&self) -> u32 {
        6
    }

    fn name(&self) -> &'static str {
        "symmetry-breaking"
    }

    fn category(&self) -> Category {
        Category::Unsure
    }

    fn run(&self, env: &LintEnv<'_>) -> Result<()> {
        let model = env.model();
        let search = SearchBuilder::new().direct(ExprCat::Call).capture().build()?;

        for &con in env.constraints() {
            let mut searcher = search.search_expr(model, con);
            if !searcher.next() {
                continue;
            }
            let call = searcher.capture(0);
            let ExprKind::Call { name, .. } = model.kind(call) else {
                continue;
            };
            if SYMMETRY_BREAKERS.contains(&name.as_str()) {
                let rewrite = RewriteExpr::call(
                    "symmetry_breaking_constraint",
                    vec![RewriteExpr::Existing(call)],
                );
                env.add_result(
                    LintResult::new(
                        self.id(),
                        self.name(),
                        "common symmetry breaker",
                        FileContents::one_line(model, model.loc(call)),
                    )
                    .with_rewrite(rewrite.print(model)),
                );
            }
        }
        Ok(())
    }
}
