use crate::ast::{ExprCat, ExprKind, ItemKind};
use crate::diagnostics::{FileContents, LintResult};
use crate::env::LintEnv;
use crate::error::Result;
use crate::rules::{Category, LintRule};

/// Flags references to top-level `var`s inside function bodies; globals
/// hidden in functions make models harder to reason about and reuse.
pub struct GlobalsInFunction;

impl LintRule for GlobalsInFunction {
    fn id(&self) -> u32 {
        5
    }

    fn name(&self) -> &'static str {
        "globals-in-function"
    }

    fn category(&self) -> Category {
        Category::Style
    }

    fn run(&self, env: &LintEnv<'_>) -> Result<()> {
        let model = env.model();
        let search = env
            .userdef_only_builder()
            .under(ExprCat::Id)
            .capture()
            .build()?;

        for &item in env.user_defined_functions() {
            let ItemKind::Function {
                body: Some(body), ..
            } = &model.item(item).kind
            else {
                continue;
            };
            let mut searcher = search.search_expr(model, *body);
            while searcher.next() {
                let id = searcher.capture(0);
                let ExprKind::Id {
                    decl: Some(decl), ..
                } = model.kind(id)
                else {
                    continue;
                };
                if model.decl_toplevel(*decl) && model.ty(id).is_var() {
                    env.add_result(LintResult::new(
                        self.id(),
                        self.name(),
                        "avoid using globals in functions, pass as an argument instead",
                        FileContents::one_line(model, model.loc(id)),
                    ));
                }
            }
        }
        Ok(())
    }
}
