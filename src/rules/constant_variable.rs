use crate::diagnostics::{FileContents, LintResult};
use crate::env::LintEnv;
use crate::error::Result;
use crate::rules::{Category, LintRule};

/// Flags `var` declarations that are only ever assigned par values, either
/// through their own definition or through top-level equality constraints;
/// such variables could be parameters.
pub struct ConstantVariable;

impl LintRule for ConstantVariable {
    fn id(&self) -> u32 {
        4
    }

    fn name(&self) -> &'static str {
        "constant-variable"
    }

    fn category(&self) -> Category {
        Category::Unsure
    }

    fn run(&self, env: &LintEnv<'_>) -> Result<()> {
        let model = env.model();
        for &decl in env.user_defined_variable_declarations() {
            if !model.ty(decl).is_var() {
                continue;
            }

            let rhs = model
                .decl_rhs(decl)
                .or_else(|| env.get_equal_constrained_rhs(decl));
            if let Some(rhs) = rhs {
                if model.ty(rhs).is_par() {
                    env.add_result(LintResult::new(
                        self.id(),
                        self.name(),
                        "is only assigned to par values, shouldn't be var",
                        FileContents::one_line(model, model.loc(decl)),
                    ));
                }
                continue;
            }

            // Arrays without a direct witness: if every index is pinned by
            // conjunctive equalities and all of them are par, the whole
            // array is constant.
            if !env.is_every_index_touched(decl) {
                continue;
            }
            let Some(witnesses) = env.array_equal_constrained().get(&decl) else {
                continue;
            };
            if !witnesses.iter().all(|w| model.ty(w.rhs).is_par()) {
                continue;
            }
            let mut result = LintResult::new(
                self.id(),
                self.name(),
                "is only assigned to par values, shouldn't be var",
                FileContents::one_line(model, model.loc(decl)),
            );
            for w in witnesses {
                result.add_sub(
                    "constrained here",
                    FileContents::one_line(model, model.loc(w.access)),
                );
            }
            env.add_result(result);
        }
        Ok(())
    }
}
