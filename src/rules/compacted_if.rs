use crate::ast::{BinOp, ExprCat, ExprId, ExprKind, Model};
use crate::diagnostics::{FileContents, LintResult};
use crate::env::LintEnv;
use crate::error::Result;
use crate::rewrite::RewriteExpr;
use crate::rules::{Category, LintRule};

/// A two-armed numeric conditional with one zero arm is a multiplication in
/// disguise: `if c then e else 0 endif` is `(c) * e`.
pub struct CompactedIf;

impl LintRule for CompactedIf {
    fn id(&self) -> u32 {
        20
    }

    fn name(&self) -> &'static str {
        "compacted-if"
    }

    fn category(&self) -> Category {
        Category::Style
    }

    fn run(&self, env: &LintEnv<'_>) -> Result<()> {
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
            let Some((cond, nonzero, else_is_nonzero)) = compactable_parts(model, ite) else {
                continue;
            };
            let cond_rewrite = if else_is_nonzero {
                RewriteExpr::not(RewriteExpr::Existing(cond))
            } else {
                RewriteExpr::Existing(cond)
            };
            let rewrite = RewriteExpr::binop(
                cond_rewrite,
                BinOp::Mult,
                RewriteExpr::Existing(nonzero),
            );
            env.add_result(
                LintResult::new(
                    self.id(),
                    self.name(),
                    "should be compacted",
                    FileContents::one_line(model, model.loc(ite)),
                )
                .with_rewrite(rewrite.print(model)),
            );
        }
        Ok(())
    }
}

/// Returns `(condition, nonzero arm, else-arm-is-nonzero)` when the
/// conditional is compactable: a single var branch pair of the same numeric
/// type with exactly one zero arm.
fn compactable_parts(model: &Model, ite: ExprId) -> Option<(ExprId, ExprId, bool)> {
    let ExprKind::IfThenElse {
        branches,
        else_expr: Some(else_expr),
    } = model.kind(ite)
    else {
        return None;
    };
    if branches.len() != 1 {
        return None;
    }
    let (cond, then_expr) = branches[0];
    // A par conditional is constant-foldable; only var conditions are worth
    // turning into multiplications.
    if !model.ty(cond).is_var() {
        return None;
    }
    if !same_number_type(model, then_expr, *else_expr) {
        return None;
    }
    match (is_zero(model, then_expr), is_zero(model, *else_expr)) {
        (true, false) => Some((cond, *else_expr, true)),
        (false, true) => Some((cond, then_expr, false)),
        _ => None,
    }
}

fn same_number_type(model: &Model, l: ExprId, r: ExprId) -> bool {
    let lt = model.ty(l);
    let rt = model.ty(r);
    lt.is_present()
        && rt.is_present()
        && ((lt.is_int() && rt.is_int()) || (lt.is_float() && rt.is_float()))
}

fn is_zero(model: &Model, e: ExprId) -> bool {
    model.is_int_literal(e, 0) || model.is_float_literal(e, 0.0)
}
