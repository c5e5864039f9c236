use crate::ast::{BinOp, ExprCat, ExprKind};
use crate::diagnostics::{FileContents, LintResult};
use crate::env::LintEnv;
use crate::error::Result;
use crate::rewrite::RewriteExpr;
use crate::rules::{Category, LintRule};

/// `element(i, xs, v)` is the predicate form of an array access; `xs[i] = v`
/// reads better.
pub struct ElementPredicate;

impl LintRule for ElementPredicate {
    fn id(&self) -> u32 {
        15
    }

    fn name(&self) -> &'static str {
        "element-predicate"
    }

    fn category(&self) -> Category {
        Category::Style
    }

    fn run(&self, env: &LintEnv<'_>) -> Result<()> {
        let model = env.model();
        let search = env
            .userdef_only_builder()
            .in_everywhere()
            .under(ExprCat::Call)
            .capture()
            .build()?;

        let mut searcher = search.search_model(model);
        while searcher.next() {
            let call = searcher.capture(0);
            let ExprKind::Call { name, args, .. } = model.kind(call) else {
                continue;
            };
            if name != "element" || args.len() != 3 {
                continue;
            }
            let rewrite = RewriteExpr::binop(
                RewriteExpr::access(
                    RewriteExpr::Existing(args[1]),
                    vec![RewriteExpr::Existing(args[0])],
                ),
                BinOp::Eq,
                RewriteExpr::Existing(args[2]),
            );
            env.add_result(
                LintResult::new(
                    self.id(),
                    self.name(),
                    "hard to read array access",
                    FileContents::one_line(model, model.loc(call)),
                )
                .with_rewrite(rewrite.print(model)),
            );
        }
        Ok(())
    }
}
