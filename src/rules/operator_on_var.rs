use crate::ast::{BinOp, ExprCat, ExprKind, Location, Model, UnOp};
use crate::diagnostics::{FileContents, LintResult, Region};
use crate::env::LintEnv;
use crate::error::Result;
use crate::rules::{Category, LintRule};

/// Some operators decompose badly on var operands (`div`, `mod`, `pow`,
/// reifying logic connectives); point at the operator when they do.
pub struct OperatorOnVar;

const FLAGGED_BINOPS: &[BinOp] = &[
    BinOp::Pow,
    BinOp::Div,
    BinOp::Mod,
    BinOp::IDiv,
    BinOp::Xor,
    BinOp::Or,
    BinOp::Impl,
    BinOp::RImpl,
    BinOp::Equiv,
];

impl LintRule for OperatorOnVar {
    fn id(&self) -> u32 {
        18
    }

    fn name(&self) -> &'static str {
        "operator-on-var"
    }

    fn category(&self) -> Category {
        Category::Unsure
    }

    fn run(&self, env: &LintEnv<'_>) -> Result<()> {
        self.find_binops(env)?;
        self.find_unops(env)
    }
}

impl OperatorOnVar {
    fn find_binops(&self, env: &LintEnv<'_>) -> Result<()> {
        let model = env.model();
        let search = env
            .userdef_only_builder()
            .in_everywhere()
            .under(ExprCat::BinOp)
            .capture()
            .build()?;

        let mut searcher = search.search_model(model);
        while searcher.next() {
            let bin = searcher.capture(0);
            let ExprKind::BinOp { op, lhs, rhs } = model.kind(bin) else {
                continue;
            };
            if !FLAGGED_BINOPS.contains(op) {
                continue;
            }
            if !model.ty(*lhs).is_var() && !model.ty(*rhs).is_var() {
                continue;
            }
            let content = operator_region(model, model.loc(bin), model.loc(*lhs), model.loc(*rhs));
            env.add_result(LintResult::new(
                self.id(),
                self.name(),
                format!("avoid using {op} on var-expressions"),
                content,
            ));
        }
        Ok(())
    }

    fn find_unops(&self, env: &LintEnv<'_>) -> Result<()> {
        let model = env.model();
        let search = env
            .userdef_only_builder()
            .in_everywhere()
            .under(UnOp::Not)
            .capture()
            .build()?;

        let mut searcher = search.search_model(model);
        while searcher.next() {
            let unop = searcher.capture(0);
            let ExprKind::UnOp { operand, .. } = model.kind(unop) else {
                continue;
            };
            if !model.ty(*operand).is_var() {
                continue;
            }
            let loc = model.loc(unop);
            let content = FileContents::one_line_cols(
                model,
                loc,
                loc.first_col,
                Some(loc.first_col + 2),
            );
            env.add_result(LintResult::new(
                self.id(),
                self.name(),
                "avoid using not on var-expressions",
                content,
            ));
        }
        Ok(())
    }
}

/// Mark the gap between the operands (the operator itself) when it can be
/// derived, the whole expression otherwise.
fn operator_region(model: &Model, whole: Location, left: Location, right: Location) -> FileContents {
    if !left.introduced
        && !right.introduced
        && (left.last_line < right.first_line
            || (left.last_line == right.first_line && left.last_col <= right.first_col))
    {
        let region = if left.last_line == right.first_line {
            Region::OneLineMarked {
                line: left.last_line,
                startcol: left.last_col,
                endcol: Some(right.first_col),
            }
        } else {
            Region::OneLineMarked {
                line: left.last_line,
                startcol: left.last_col,
                endcol: None,
            }
        };
        return FileContents {
            region,
            filename: model.file_name(whole.file).to_string(),
        };
    }
    FileContents::one_line(model, whole)
}
