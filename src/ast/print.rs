//! Pretty-printing of AST nodes back to MiniZinc surface syntax.
//!
//! Used by suggested rewrites and by debug output. The printer is precedence
//! aware: nested operators are parenthesized only when required.

use super::{BinOp, ExprId, ExprKind, Model, SolveGoal, UnOp};

/// Binding strength, tighter binds higher. Mirrors the MiniZinc operator
/// table closely enough to round-trip the expressions this crate builds.
fn binop_prec(op: BinOp) -> u8 {
    match op {
        BinOp::Equiv => 1,
        BinOp::Impl | BinOp::RImpl => 2,
        BinOp::Or | BinOp::Xor => 3,
        BinOp::And => 4,
        BinOp::Eq
        | BinOp::Neq
        | BinOp::Lt
        | BinOp::Leq
        | BinOp::Gt
        | BinOp::Geq
        | BinOp::In
        | BinOp::Subset
        | BinOp::Superset => 5,
        BinOp::Union | BinOp::Diff | BinOp::SymDiff => 6,
        BinOp::DotDot => 7,
        BinOp::Plus | BinOp::Minus => 8,
        BinOp::Mult | BinOp::Div | BinOp::IDiv | BinOp::Mod | BinOp::Intersect => 9,
        BinOp::Pow => 10,
        BinOp::PlusPlus => 11,
    }
}

/// Serialize a single expression.
#[must_use]
pub fn expr_to_string(model: &Model, id: ExprId) -> String {
    let mut out = String::new();
    write_expr(model, id, 0, &mut out);
    out
}

fn write_parenthesized(model: &Model, id: ExprId, min_prec: u8, out: &mut String) {
    let needs_parens = match model.kind(id) {
        ExprKind::BinOp { op, .. } => binop_prec(*op) < min_prec,
        ExprKind::UnOp { .. } | ExprKind::Let { .. } | ExprKind::IfThenElse { .. } => min_prec > 0,
        _ => false,
    };
    if needs_parens {
        out.push('(');
        write_expr(model, id, 0, out);
        out.push(')');
    } else {
        write_expr(model, id, min_prec, out);
    }
}

fn write_list(model: &Model, ids: &[ExprId], out: &mut String) {
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(model, *id, 0, out);
    }
}

fn write_expr(model: &Model, id: ExprId, min_prec: u8, out: &mut String) {
    match model.kind(id) {
        ExprKind::IntLit(v) => out.push_str(&v.to_string()),
        ExprKind::FloatLit(v) => {
            let s = v.to_string();
            out.push_str(&s);
            // A float must not read back as an int literal.
            if !s.contains('.') && !s.contains('e') && !s.contains("inf") {
                out.push_str(".0");
            }
        }
        ExprKind::BoolLit(v) => out.push_str(if *v { "true" } else { "false" }),
        ExprKind::StringLit(s) => {
            out.push('"');
            out.push_str(&s.replace('\\', "\\\\").replace('"', "\\\""));
            out.push('"');
        }
        ExprKind::Id { name, .. } => out.push_str(name),
        ExprKind::SetLit { elems } => {
            out.push('{');
            write_list(model, elems, out);
            out.push('}');
        }
        ExprKind::ArrayLit { elems } => {
            out.push('[');
            write_list(model, elems, out);
            out.push(']');
        }
        ExprKind::ArrayAccess { array, idx } => {
            write_parenthesized(model, *array, u8::MAX, out);
            out.push('[');
            write_list(model, idx, out);
            out.push(']');
        }
        ExprKind::BinOp { op, lhs, rhs } => {
            let prec = binop_prec(*op);
            if prec < min_prec {
                out.push('(');
                write_expr(model, id, 0, out);
                out.push(')');
                return;
            }
            // Left associative: the right operand needs one level more.
            write_parenthesized(model, *lhs, prec, out);
            if *op == BinOp::DotDot {
                out.push_str("..");
            } else {
                out.push(' ');
                out.push_str(op.as_str());
                out.push(' ');
            }
            write_parenthesized(model, *rhs, prec + 1, out);
        }
        ExprKind::UnOp { op, operand } => {
            out.push_str(op.as_str());
            if *op == UnOp::Not {
                out.push(' ');
            }
            write_parenthesized(model, *operand, u8::MAX, out);
        }
        ExprKind::Call { name, args, .. } => {
            out.push_str(name);
            out.push('(');
            write_list(model, args, out);
            out.push(')');
        }
        ExprKind::Comprehension {
            generators,
            body,
            is_set,
        } => {
            out.push(if *is_set { '{' } else { '[' });
            write_expr(model, *body, 0, out);
            out.push_str(" | ");
            for (i, g) in generators.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                for (j, d) in g.decls.iter().enumerate() {
                    if j > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(model.decl_name(*d));
                }
                out.push_str(" in ");
                write_expr(model, g.in_expr, 0, out);
                if let Some(w) = g.where_expr {
                    out.push_str(" where ");
                    write_expr(model, w, 0, out);
                }
            }
            out.push(if *is_set { '}' } else { ']' });
        }
        ExprKind::IfThenElse {
            branches,
            else_expr,
        } => {
            for (i, (cond, then)) in branches.iter().enumerate() {
                out.push_str(if i == 0 { "if " } else { " elseif " });
                write_expr(model, *cond, 0, out);
                out.push_str(" then ");
                write_expr(model, *then, 0, out);
            }
            if let Some(e) = else_expr {
                out.push_str(" else ");
                write_expr(model, *e, 0, out);
            }
            out.push_str(" endif");
        }
        ExprKind::Let { items, body } => {
            out.push_str("let {");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str("; ");
                }
                match model.kind(*item) {
                    ExprKind::VarDecl { .. } => write_expr(model, *item, 0, out),
                    _ => {
                        out.push_str("constraint ");
                        write_expr(model, *item, 0, out);
                    }
                }
            }
            out.push_str("} in ");
            write_expr(model, *body, 0, out);
        }
        ExprKind::VarDecl { ti, name, rhs, .. } => {
            write_expr(model, *ti, 0, out);
            out.push_str(": ");
            out.push_str(name);
            if let Some(r) = rhs {
                out.push_str(" = ");
                write_expr(model, *r, 0, out);
            }
        }
        ExprKind::TypeInst { ranges, domain } => {
            if !ranges.is_empty() {
                out.push_str("array[");
                write_list(model, ranges, out);
                out.push_str("] of ");
            }
            let ty = model.ty(id);
            let elem = ty.elem();
            if elem.is_var() {
                out.push_str("var ");
            }
            if elem.set == super::SetType::Set {
                out.push_str("set of ");
            }
            if let Some(d) = domain {
                write_expr(model, *d, 0, out);
            } else {
                out.push_str(match elem.base {
                    super::BaseType::Bool => "bool",
                    super::BaseType::Int => "int",
                    super::BaseType::Float => "float",
                    super::BaseType::Str => "string",
                    super::BaseType::Ann => "ann",
                    super::BaseType::Bot => "int",
                });
            }
        }
    }
}

/// Serialize a top-level item, without the trailing semicolon.
#[must_use]
pub fn item_to_string(model: &Model, id: super::ItemId) -> String {
    use super::ItemKind;
    match &model.item(id).kind {
        ItemKind::Include { path, .. } => format!("include \"{path}\""),
        ItemKind::VarDecl { decl } => expr_to_string(model, *decl),
        ItemKind::Assign { name, rhs, .. } => {
            format!("{name} = {}", expr_to_string(model, *rhs))
        }
        ItemKind::Constraint { expr } => format!("constraint {}", expr_to_string(model, *expr)),
        ItemKind::Solve {
            goal, objective, ..
        } => match goal {
            SolveGoal::Satisfy => "solve satisfy".to_string(),
            SolveGoal::Minimize => format!(
                "solve minimize {}",
                objective.map_or(String::new(), |o| expr_to_string(model, o))
            ),
            SolveGoal::Maximize => format!(
                "solve maximize {}",
                objective.map_or(String::new(), |o| expr_to_string(model, o))
            ),
        },
        ItemKind::Output { expr } => format!("output {}", expr_to_string(model, *expr)),
        ItemKind::Function {
            name,
            params,
            return_ti,
            body,
            ..
        } => {
            let mut out = String::new();
            out.push_str("function ");
            out.push_str(&expr_to_string(model, *return_ti));
            out.push_str(": ");
            out.push_str(name);
            out.push('(');
            for (i, p) in params.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&expr_to_string(model, *p));
            }
            out.push(')');
            if let Some(b) = body {
                out.push_str(" = ");
                out.push_str(&expr_to_string(model, *b));
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{BaseType, ExprKind, Location, Model, Type};

    #[test]
    fn precedence_inserts_parentheses_where_needed() {
        let mut m = Model::new();
        let f = m.add_file("test");
        let loc = Location::new(f, 1, 1, 1, 1);
        let int = Type::par(BaseType::Int);
        let a = m.alloc_expr(ExprKind::IntLit(1), int, loc);
        let b = m.alloc_expr(ExprKind::IntLit(2), int, loc);
        let c = m.alloc_expr(ExprKind::IntLit(3), int, loc);
        let plus = m.alloc_expr(
            ExprKind::BinOp {
                op: super::BinOp::Plus,
                lhs: a,
                rhs: b,
            },
            int,
            loc,
        );
        let mult = m.alloc_expr(
            ExprKind::BinOp {
                op: super::BinOp::Mult,
                lhs: plus,
                rhs: c,
            },
            int,
            loc,
        );
        assert_eq!(super::expr_to_string(&m, mult), "(1 + 2) * 3");

        let mult2 = m.alloc_expr(
            ExprKind::BinOp {
                op: super::BinOp::Mult,
                lhs: b,
                rhs: c,
            },
            int,
            loc,
        );
        let plus2 = m.alloc_expr(
            ExprKind::BinOp {
                op: super::BinOp::Plus,
                lhs: a,
                rhs: mult2,
            },
            int,
            loc,
        );
        assert_eq!(super::expr_to_string(&m, plus2), "1 + 2 * 3");
    }
}
