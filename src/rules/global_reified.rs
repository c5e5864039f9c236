use crate::ast::{ExprCat, ExprKind, ItemKind};
use crate::diagnostics::{FileContents, LintResult};
use crate::env::{LintEnv, is_not_reified};
use crate::error::Result;
use crate::rules::{Category, LintRule};

/// Global constraints used in a reified position lose their dedicated
/// propagators on most solvers; the model usually meant something else.
pub struct GlobalReified;

impl LintRule for GlobalReified {
    fn id(&self) -> u32 {
        17
    }

    fn name(&self) -> &'static str {
        "global-reified"
    }

    fn category(&self) -> Category {
        Category::Challenge
    }

    fn run(&self, env: &LintEnv<'_>) -> Result<()> {
        let model = env.model();
        let search = env
            .userdef_only_builder()
            .under(ExprCat::Call)
            .capture()
            .build()?;

        for &con in env.constraints() {
            let mut searcher = search.search_expr(model, con);
            while searcher.next() {
                let call = searcher.capture(0);
                let ExprKind::Call {
                    decl: Some(item), ..
                } = model.kind(call)
                else {
                    continue;
                };
                let ItemKind::Function {
                    return_ti,
                    from_stdlib,
                    ..
                } = &model.item(*item).kind
                else {
                    continue;
                };
                let decl_file = model.file_name(model.item(*item).loc.file);
                if decl_file.is_empty() || !env.is_stdlib_file(decl_file) {
                    continue;
                }
                if *from_stdlib || !model.ty(*return_ti).is_var_bool() {
                    continue;
                }
                if is_not_reified(model, searcher.current_path().skip(1)) {
                    continue;
                }
                env.add_result(LintResult::new(
                    self.id(),
                    self.name(),
                    "reified global constraint",
                    FileContents::one_line(model, model.loc(call)),
                ));
            }
        }
        Ok(())
    }
}
