use crate::ast::ExprKind;
use crate::diagnostics::{FileContents, LintResult};
use crate::env::LintEnv;
use crate::error::Result;
use crate::rules::{Category, LintRule};

/// Comprehension generators iterating over a `var set` force the compiler
/// into option types and reification; usually an input-data set was meant.
pub struct VarInGen;

impl LintRule for VarInGen {
    fn id(&self) -> u32 {
        7
    }

    fn name(&self) -> &'static str {
        "var-in-gen"
    }

    fn category(&self) -> Category {
        Category::Unsure
    }

    fn run(&self, env: &LintEnv<'_>) -> Result<()> {
        let model = env.model();
        for &comp in env.comprehensions() {
            let ExprKind::Comprehension { generators, .. } = model.kind(comp) else {
                continue;
            };
            for g in generators {
                let ty = model.ty(g.in_expr);
                if ty.is_int_set() && ty.is_var() {
                    env.add_result(LintResult::new(
                        self.id(),
                        self.name(),
                        "avoid variables in generators",
                        FileContents::one_line(model, model.loc(g.in_expr)),
                    ));
                }
            }
        }
        Ok(())
    }
}
