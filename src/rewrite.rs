//! Synthetic replacement expressions for suggested rewrites.
//!
//! Rules cannot allocate into the shared model arena, so a rewrite is built
//! as a small owned tree that may splice existing nodes, and is serialized
//! to text immediately; only the string travels with the diagnostic.

use itertools::Itertools;

use crate::ast::print::expr_to_string;
use crate::ast::{BinOp, ExprCat, ExprId, Model, UnOp};

#[derive(Debug, Clone)]
pub enum RewriteExpr {
    /// A node from the model, printed as-is.
    Existing(ExprId),
    Id(String),
    Int(i64),
    BinOp(Box<RewriteExpr>, BinOp, Box<RewriteExpr>),
    UnOp(UnOp, Box<RewriteExpr>),
    Call(String, Vec<RewriteExpr>),
    ArrayAccess(Box<RewriteExpr>, Vec<RewriteExpr>),
}

impl RewriteExpr {
    #[must_use]
    pub fn binop(lhs: RewriteExpr, op: BinOp, rhs: RewriteExpr) -> Self {
        RewriteExpr::BinOp(Box::new(lhs), op, Box::new(rhs))
    }

    #[must_use]
    pub fn not(operand: RewriteExpr) -> Self {
        RewriteExpr::UnOp(UnOp::Not, Box::new(operand))
    }

    #[must_use]
    pub fn call(name: impl Into<String>, args: Vec<RewriteExpr>) -> Self {
        RewriteExpr::Call(name.into(), args)
    }

    #[must_use]
    pub fn access(array: RewriteExpr, idx: Vec<RewriteExpr>) -> Self {
        RewriteExpr::ArrayAccess(Box::new(array), idx)
    }

    /// Serialize, parenthesizing spliced or nested compound operands.
    #[must_use]
    pub fn print(&self, model: &Model) -> String {
        match self {
            RewriteExpr::Existing(id) => expr_to_string(model, *id),
            RewriteExpr::Id(name) => name.clone(),
            RewriteExpr::Int(v) => v.to_string(),
            RewriteExpr::BinOp(lhs, op, rhs) => {
                format!(
                    "{} {} {}",
                    lhs.print_operand(model),
                    op.as_str(),
                    rhs.print_operand(model)
                )
            }
            RewriteExpr::UnOp(op, operand) => match op {
                UnOp::Not => format!("not {}", operand.print_operand(model)),
                _ => format!("{}{}", op.as_str(), operand.print_operand(model)),
            },
            RewriteExpr::Call(name, args) => {
                format!("{name}({})", args.iter().map(|a| a.print(model)).join(", "))
            }
            RewriteExpr::ArrayAccess(array, idx) => {
                format!(
                    "{}[{}]",
                    array.print_operand(model),
                    idx.iter().map(|a| a.print(model)).join(", ")
                )
            }
        }
    }

    fn print_operand(&self, model: &Model) -> String {
        let compound = match self {
            RewriteExpr::BinOp(..) | RewriteExpr::UnOp(..) => true,
            RewriteExpr::Existing(id) => matches!(
                model.cat(*id),
                ExprCat::BinOp | ExprCat::UnOp | ExprCat::IfThenElse | ExprCat::Let
            ),
            _ => false,
        };
        let printed = self.print(model);
        if compound {
            format!("({printed})")
        } else {
            printed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ExprKind;
    use crate::parser::parse_model_str;

    #[test]
    fn spliced_operands_are_parenthesized() {
        let model = parse_model_str("var int: a;\nconstraint a + 1 = 2;", "testmodel").unwrap();
        let plus = (0..model.num_exprs())
            .map(|i| ExprId(i as u32))
            .find(|id| matches!(model.kind(*id), ExprKind::BinOp { op: BinOp::Plus, .. }))
            .unwrap();
        let rewritten = RewriteExpr::binop(
            RewriteExpr::Existing(plus),
            BinOp::Mult,
            RewriteExpr::Int(3),
        );
        assert_eq!(rewritten.print(&model), "(a + 1) * 3");
    }

    #[test]
    fn calls_and_accesses_print_flat() {
        let model = parse_model_str("var int: a;", "testmodel").unwrap();
        let r = RewriteExpr::call(
            "sum",
            vec![RewriteExpr::access(
                RewriteExpr::Id("xs".into()),
                vec![RewriteExpr::Int(1)],
            )],
        );
        assert_eq!(r.print(&model), "sum(xs[1])");
    }
}
