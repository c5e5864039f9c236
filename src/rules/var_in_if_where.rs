use crate::ast::{ExprCat, ExprKind};
use crate::diagnostics::{FileContents, LintResult};
use crate::env::LintEnv;
use crate::error::Result;
use crate::rules::{Category, LintRule};

/// Var conditions in `where` clauses and if-then-else force option types on
/// everything downstream; challenge models are usually better off with a
/// reformulation.
pub struct VarInIfWhere;

impl LintRule for VarInIfWhere {
    fn id(&self) -> u32 {
        26
    }

    fn name(&self) -> &'static str {
        "var-in-if-where"
    }

    fn category(&self) -> Category {
        Category::Challenge
    }

    fn run(&self, env: &LintEnv<'_>) -> Result<()> {
        self.find_where(env);
        self.find_if(env)
    }
}

impl VarInIfWhere {
    fn find_where(&self, env: &LintEnv<'_>) {
        let model = env.model();
        for &comp in env.comprehensions() {
            let ExprKind::Comprehension { generators, .. } = model.kind(comp) else {
                continue;
            };
            for g in generators {
                let Some(where_expr) = g.where_expr else {
                    continue;
                };
                if model.ty(where_expr).is_var() {
                    env.add_result(LintResult::new(
                        self.id(),
                        self.name(),
                        "avoid var-expressions in where clauses",
                        FileContents::one_line(model, model.loc(where_expr)),
                    ));
                }
            }
        }
    }

    fn find_if(&self, env: &LintEnv<'_>) -> Result<()> {
        let model = env.model();
        let search = env
            .userdef_only_builder()
            .in_everywhere()
            .under(ExprCat::IfThenElse)
            .capture()
            .build()?;

        let mut searcher = search.search_model(model);
        while searcher.next() {
            let ite = searcher.capture(0);
            let ExprKind::IfThenElse { branches, .. } = model.kind(ite) else {
                continue;
            };
            for (cond, _) in branches {
                if model.ty(*cond).is_var() {
                    env.add_result(LintResult::new(
                        self.id(),
                        self.name(),
                        "avoid var-expressions in if statements",
                        FileContents::one_line(model, model.loc(*cond)),
                    ));
                }
            }
        }
        Ok(())
    }
}
