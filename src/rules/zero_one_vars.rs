use crate::ast::{BinOp, ExprCat, ExprId, ExprKind, Model};
use crate::diagnostics::{FileContents, LintResult};
use crate::env::{
    LintEnv, IntBounds, compute_int_bounds, comprehension_contains_where,
    comprehension_covers_whole_array, comprehension_satisfies_access, depends_on_instance,
    is_array_access_simple,
};
use crate::error::Result;
use crate::rewrite::RewriteExpr;
use crate::rules::{Category, LintRule};
use crate::search::{filter_arrayaccess_name, filter_comprehension_body};

/// Recognizes implication and sum idioms on 0..1 variables that have direct
/// integer formulations (`e1 = 1 -> e2 = 1` is `e1 <= e2`; summing
/// `arr[i] = 1` over the whole array is `sum(arr)`).
pub struct ZeroOneVars;

impl LintRule for ZeroOneVars {
    fn id(&self) -> u32 {
        22
    }

    fn name(&self) -> &'static str {
        "zero-one-vars"
    }

    fn category(&self) -> Category {
        Category::Performance
    }

    fn run(&self, env: &LintEnv<'_>) -> Result<()> {
        self.case_impl(env, BinOp::Leq, 1)?;
        self.case_impl(env, BinOp::Geq, 0)?;
        self.case_sum(env)
    }
}

fn impl_lhs_only(model: &Model, root: ExprId, child: ExprId) -> bool {
    match model.kind(root) {
        ExprKind::BinOp {
            op: BinOp::Impl,
            lhs,
            ..
        } => child == *lhs,
        _ => true,
    }
}

impl ZeroOneVars {
    /// `e1 = K -> e2 = K` over 0..1 expressions, rewritten to an inequality.
    fn case_impl(&self, env: &LintEnv<'_>, rewrite_op: BinOp, equal_to: i64) -> Result<()> {
        let model = env.model();
        let main_search = env
            .userdef_only_builder()
            .in_everywhere()
            .under(BinOp::Impl)
            .capture()
            .filter(impl_lhs_only)
            .direct(BinOp::Eq)
            .capture()
            .direct(ExprCat::IntLit)
            .capture()
            .build()?;
        let off_search = crate::search::SearchBuilder::new()
            .direct(BinOp::Eq)
            .capture()
            .direct(ExprCat::IntLit)
            .capture()
            .build()?;

        let mut main = main_search.search_model(model);
        while main.next() {
            let implication = main.capture(0);
            let lhs_eq = main.capture(1);
            let lhs_lit = main.capture(2);
            if !model.is_int_literal(lhs_lit, equal_to) {
                continue;
            }
            let Some(other_side) = model.other_side(implication, lhs_eq) else {
                continue;
            };

            let mut off = off_search.search_expr(model, other_side);
            if !off.next() {
                continue;
            }
            let rhs_eq = off.capture(0);
            let rhs_lit = off.capture(1);
            if !model.is_int_literal(rhs_lit, equal_to) {
                continue;
            }

            let Some(expr1) = model.other_side(lhs_eq, lhs_lit) else {
                continue;
            };
            let Some(expr2) = model.other_side(rhs_eq, rhs_lit) else {
                continue;
            };
            if !is_zero_one_expr(model, expr1) || !is_zero_one_expr(model, expr2) {
                continue;
            }

            let rewrite = RewriteExpr::binop(
                RewriteExpr::Existing(expr1),
                rewrite_op,
                RewriteExpr::Existing(expr2),
            );
            let mut result = LintResult::new(
                self.id(),
                self.name(),
                "abuse 0..1 domain",
                FileContents::one_line(model, model.loc(implication)),
            )
            .with_rewrite(rewrite.print(model));
            if depends_on_instance(model, Some(expr1)) || depends_on_instance(model, Some(expr2)) {
                result.set_depends_on_instance();
            }
            result.add_sub(
                "has domain 0..1",
                FileContents::one_line(model, model.loc(expr1)),
            );
            result.add_sub(
                "has domain 0..1",
                FileContents::one_line(model, model.loc(expr2)),
            );
            env.add_result(result);
        }
        Ok(())
    }

    /// `sum(i in r)(arr[i] = 1)` with `r` covering the whole array,
    /// rewritten to `sum(arr)`.
    fn case_sum(&self, env: &LintEnv<'_>) -> Result<()> {
        let model = env.model();
        let search = env
            .userdef_only_builder()
            .in_everywhere()
            .under(ExprCat::Call)
            .capture()
            .direct(ExprCat::Comprehension)
            .capture()
            .filter(filter_comprehension_body)
            .direct(BinOp::Eq)
            .capture()
            .direct(ExprCat::ArrayAccess)
            .capture()
            .filter(filter_arrayaccess_name)
            .direct(ExprCat::Id)
            .capture()
            .build()?;

        let mut searcher = search.search_model(model);
        while searcher.next() {
            let sum = searcher.capture(0);
            let ExprKind::Call { name, .. } = model.kind(sum) else {
                continue;
            };
            if name != "sum" {
                continue;
            }
            let comp = searcher.capture(1);
            let eq = searcher.capture(2);
            let access = searcher.capture(3);
            let array_id = searcher.capture(4);
            let ExprKind::Id {
                decl: Some(decl), ..
            } = model.kind(array_id)
            else {
                continue;
            };

            let Some(rhs) = model.other_side(eq, access) else {
                continue;
            };
            if !model.is_int_literal(rhs, 1)
                || !is_array_access_simple(model, access)
                || !comprehension_satisfies_access(model, comp, access)
                || comprehension_contains_where(model, comp)
                || !comprehension_covers_whole_array(model, comp, *decl)
                || !is_zero_one_expr(model, access)
            {
                continue;
            }

            let rewrite = RewriteExpr::call("sum", vec![RewriteExpr::Existing(array_id)]);
            let mut result = LintResult::new(
                self.id(),
                self.name(),
                "abuse 0..1 domain",
                FileContents::one_line(model, model.loc(sum)),
            )
            .with_rewrite(rewrite.print(model));
            if depends_on_instance(model, model.ti_domain(model.decl_ti(*decl))) {
                result.set_depends_on_instance();
            }
            result.add_sub(
                "has domain 0..1",
                FileContents::one_line(model, model.loc(access)),
            );
            env.add_result(result);
        }
        Ok(())
    }
}

/// Bounds are exactly 0..1; unknown bounds disqualify the expression.
fn is_zero_one_expr(model: &Model, expr: ExprId) -> bool {
    compute_int_bounds(model, expr) == Ok(IntBounds { lo: 0, hi: 1 })
}
