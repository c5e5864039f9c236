use crate::ast::{BinOp, ExprId, ExprKind, Model};
use crate::diagnostics::{FileContents, LintResult};
use crate::env::{LintEnv, eval_par_int};
use crate::error::Result;
use crate::rules::{Category, LintRule};

/// Solvers and library functions assume 1-based arrays; other index ranges
/// cost conversions and confusion.
pub struct OneBasedArrays;

impl LintRule for OneBasedArrays {
    fn id(&self) -> u32 {
        19
    }

    fn name(&self) -> &'static str {
        "one-based-arrays"
    }

    fn category(&self) -> Category {
        Category::Performance
    }

    fn run(&self, env: &LintEnv<'_>) -> Result<()> {
        let model = env.model();
        for &decl in env.user_defined_variable_declarations() {
            let ti = model.decl_ti(decl);
            if !model.ti_is_array(ti) {
                continue;
            }
            for &range in model.ti_ranges(ti) {
                if starts_at_one(model, range) {
                    continue;
                }
                let mut result = LintResult::new(
                    self.id(),
                    self.name(),
                    "better to start at 1",
                    FileContents::one_line(model, model.loc(range)),
                );
                if let Some(domain) = model.ti_domain(range) {
                    result.add_relevant_decl(model, domain);
                }
                env.add_result(result);
            }
        }
        Ok(())
    }
}

fn starts_at_one(model: &Model, range: ExprId) -> bool {
    let Some(domain) = model.ti_domain(range) else {
        return false;
    };
    let Some(followed) = model.follow_id(domain) else {
        return false;
    };
    match model.kind(followed) {
        ExprKind::SetLit { elems } => {
            elems.iter().any(|e| model.is_int_literal(*e, 1))
                || set_lit_min(model, elems) == Some(1)
        }
        ExprKind::BinOp {
            op: BinOp::DotDot,
            lhs,
            ..
        } => model.is_int_literal(*lhs, 1),
        _ => false,
    }
}

/// Evaluated minimum of a set literal of par expressions; `None` when any
/// element cannot be evaluated.
fn set_lit_min(model: &Model, elems: &[ExprId]) -> Option<i64> {
    elems
        .iter()
        .map(|e| eval_par_int(model, *e).ok())
        .collect::<Option<Vec<i64>>>()?
        .into_iter()
        .min()
}
