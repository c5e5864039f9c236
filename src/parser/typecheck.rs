//! Name resolution and type assignment.
//!
//! Runs in three steps over the freshly parsed arenas:
//!
//! 1. collect every top-level declaration into a global scope and give each
//!    declaration its declared type (so forward references type-check);
//! 2. merge assignment items into their declaration's right-hand side;
//! 3. resolve and type every expression bottom-up, maintaining a scope stack
//!    for function parameters, `let` locals and comprehension generators.

use std::collections::HashMap;

use crate::ast::{
    BaseType, BinOp, ExprId, ExprKind, Generator, Inst, ItemId, ItemKind, Model, SetType, Type,
    UnOp,
};
use crate::error::{Error, Result};

pub(super) fn run(model: &mut Model) -> Result<()> {
    let mut checker = Checker {
        globals: HashMap::new(),
        scopes: Vec::new(),
    };
    checker.collect_globals(model);
    checker.merge_assignments(model)?;
    checker.check_items(model)
}

struct Checker {
    globals: HashMap<String, ExprId>,
    scopes: Vec<HashMap<String, ExprId>>,
}

impl Checker {
    fn collect_globals(&mut self, model: &mut Model) {
        for idx in 0..model.num_items() {
            let item = ItemId(idx as u32);
            if let ItemKind::VarDecl { decl } = model.item(item).kind {
                let name = model.decl_name(decl).to_string();
                let ti = model.decl_ti(decl);
                let declared = declared_type(model, ti);
                model.expr_mut(ti).ty = declared;
                model.expr_mut(decl).ty = declared;
                self.globals.insert(name, decl);
            }
        }
    }

    fn merge_assignments(&mut self, model: &mut Model) -> Result<()> {
        for idx in 0..model.num_items() {
            let item = ItemId(idx as u32);
            let ItemKind::Assign { name, rhs, .. } = &model.item(item).kind else {
                continue;
            };
            let name = name.clone();
            let rhs = *rhs;
            let Some(&decl) = self.globals.get(&name) else {
                let loc = model.item(item).loc;
                return Err(Error::type_error(
                    model.file_name(loc.file).to_string(),
                    loc.first_line,
                    loc.first_col,
                    format!("assignment to undeclared identifier '{name}'"),
                ));
            };
            if let ItemKind::Assign { decl: slot, .. } = &mut model.item_mut(item).kind {
                *slot = Some(decl);
            }
            if let ExprKind::VarDecl { rhs: slot, .. } = &mut model.expr_mut(decl).kind
                && slot.is_none()
            {
                *slot = Some(rhs);
            }
        }
        Ok(())
    }

    fn check_items(&mut self, model: &mut Model) -> Result<()> {
        for idx in 0..model.num_items() {
            let item = ItemId(idx as u32);
            match model.item(item).kind.clone() {
                ItemKind::Include { .. } => {}
                ItemKind::VarDecl { decl } => {
                    self.type_expr(model, decl)?;
                }
                ItemKind::Assign { rhs, .. } => {
                    self.type_expr(model, rhs)?;
                }
                ItemKind::Constraint { expr } | ItemKind::Output { expr } => {
                    self.type_expr(model, expr)?;
                }
                ItemKind::Solve {
                    objective, anns, ..
                } => {
                    if let Some(obj) = objective {
                        self.type_expr(model, obj)?;
                    }
                    for ann in anns {
                        self.type_expr(model, ann)?;
                    }
                }
                ItemKind::Function {
                    params,
                    return_ti,
                    body,
                    ..
                } => {
                    self.scopes.push(HashMap::new());
                    for param in &params {
                        self.type_expr(model, *param)?;
                        let name = model.decl_name(*param).to_string();
                        self.scopes.last_mut().unwrap().insert(name, *param);
                    }
                    self.type_expr(model, return_ti)?;
                    if let Some(body) = body {
                        self.type_expr(model, body)?;
                    }
                    self.scopes.pop();
                }
            }
        }
        Ok(())
    }

    fn resolve(&self, name: &str) -> Option<ExprId> {
        for scope in self.scopes.iter().rev() {
            if let Some(&decl) = scope.get(name) {
                return Some(decl);
            }
        }
        self.globals.get(name).copied()
    }

    fn type_expr(&mut self, model: &mut Model, id: ExprId) -> Result<()> {
        match model.kind(id).clone() {
            ExprKind::IntLit(_) => model.expr_mut(id).ty = Type::par(BaseType::Int),
            ExprKind::FloatLit(_) => model.expr_mut(id).ty = Type::par(BaseType::Float),
            ExprKind::BoolLit(_) => model.expr_mut(id).ty = Type::par(BaseType::Bool),
            ExprKind::StringLit(_) => model.expr_mut(id).ty = Type::par(BaseType::Str),

            ExprKind::Id { name, .. } => {
                // `$T` names are polymorphic index placeholders from stdlib
                // signatures; they denote some par set of int.
                if name.starts_with('$') {
                    model.expr_mut(id).ty = Type::par(BaseType::Int).with_set(SetType::Set);
                    return Ok(());
                }
                let Some(decl) = self.resolve(&name) else {
                    let loc = model.loc(id);
                    return Err(Error::type_error(
                        model.file_name(loc.file).to_string(),
                        loc.first_line,
                        loc.first_col,
                        format!("undeclared identifier '{name}'"),
                    ));
                };
                let ty = model.ty(decl);
                let data = model.expr_mut(id);
                data.ty = ty;
                if let ExprKind::Id { decl: slot, .. } = &mut data.kind {
                    *slot = Some(decl);
                }
            }

            ExprKind::SetLit { elems } => {
                let mut base = BaseType::Int;
                let mut inst = Inst::Par;
                for (i, e) in elems.iter().enumerate() {
                    self.type_expr(model, *e)?;
                    let t = model.ty(*e);
                    if i == 0 {
                        base = t.base;
                    }
                    base = join_base(base, t.base);
                    inst = join_inst(inst, t.inst);
                }
                model.expr_mut(id).ty = Type {
                    base,
                    set: SetType::Set,
                    dim: 0,
                    inst,
                    present: true,
                };
            }

            ExprKind::ArrayLit { elems } => {
                let mut base = BaseType::Int;
                let mut inst = Inst::Par;
                for (i, e) in elems.iter().enumerate() {
                    self.type_expr(model, *e)?;
                    let t = model.ty(*e);
                    if i == 0 {
                        base = t.base;
                    }
                    base = join_base(base, t.base);
                    inst = join_inst(inst, t.inst);
                }
                model.expr_mut(id).ty = Type {
                    base,
                    set: SetType::Plain,
                    dim: 1,
                    inst,
                    present: true,
                };
            }

            ExprKind::ArrayAccess { array, idx } => {
                self.type_expr(model, array)?;
                let mut inst = model.ty(array).inst;
                for i in &idx {
                    self.type_expr(model, *i)?;
                    inst = join_inst(inst, model.ty(*i).inst);
                }
                model.expr_mut(id).ty = model.ty(array).elem().with_inst(inst);
            }

            ExprKind::BinOp { op, lhs, rhs } => {
                self.type_expr(model, lhs)?;
                self.type_expr(model, rhs)?;
                let lt = model.ty(lhs);
                let rt = model.ty(rhs);
                let inst = join_inst(lt.inst, rt.inst);
                let ty = match op {
                    BinOp::And
                    | BinOp::Or
                    | BinOp::Impl
                    | BinOp::RImpl
                    | BinOp::Equiv
                    | BinOp::Xor
                    | BinOp::Eq
                    | BinOp::Neq
                    | BinOp::Lt
                    | BinOp::Leq
                    | BinOp::Gt
                    | BinOp::Geq
                    | BinOp::In
                    | BinOp::Subset
                    | BinOp::Superset => Type::par(BaseType::Bool).with_inst(inst),
                    BinOp::DotDot => Type {
                        base: join_base(lt.base, rt.base),
                        set: SetType::Set,
                        dim: 0,
                        inst,
                        present: true,
                    },
                    BinOp::Union | BinOp::Diff | BinOp::SymDiff | BinOp::Intersect => {
                        lt.with_inst(inst)
                    }
                    BinOp::PlusPlus => lt.with_inst(inst),
                    BinOp::Plus
                    | BinOp::Minus
                    | BinOp::Mult
                    | BinOp::Div
                    | BinOp::IDiv
                    | BinOp::Mod
                    | BinOp::Pow => {
                        let base = if op == BinOp::Div {
                            BaseType::Float
                        } else {
                            join_base(lt.base, rt.base)
                        };
                        Type::par(base).with_inst(inst)
                    }
                };
                model.expr_mut(id).ty = ty;
            }

            ExprKind::UnOp { op, operand } => {
                self.type_expr(model, operand)?;
                let t = model.ty(operand);
                model.expr_mut(id).ty = match op {
                    UnOp::Not => Type::par(BaseType::Bool).with_inst(t.inst),
                    UnOp::Minus | UnOp::Plus => t,
                };
            }

            ExprKind::Call { name, args, .. } => {
                let mut inst = Inst::Par;
                for a in &args {
                    self.type_expr(model, *a)?;
                    inst = join_inst(inst, model.ty(*a).inst);
                }
                let Some(&decl) = model.functions_named(&name).first() else {
                    let loc = model.loc(id);
                    return Err(Error::type_error(
                        model.file_name(loc.file).to_string(),
                        loc.first_line,
                        loc.first_col,
                        format!("undeclared function '{name}'"),
                    ));
                };
                let ItemKind::Function { return_ti, .. } = &model.item(decl).kind else {
                    unreachable!("function table holds function items");
                };
                let return_ti = *return_ti;
                // Par-neutral signatures instantiate from the arguments.
                let mut ty = model.ty(return_ti);
                if ty.is_par() && inst == Inst::Var && !ty.is_ann() {
                    ty = ty.with_inst(Inst::Var);
                }
                let data = model.expr_mut(id);
                data.ty = ty;
                if let ExprKind::Call { decl: slot, .. } = &mut data.kind {
                    *slot = Some(decl);
                }
            }

            ExprKind::Comprehension {
                generators,
                body,
                is_set,
            } => {
                self.scopes.push(HashMap::new());
                let mut gen_inst = Inst::Par;
                for Generator {
                    decls,
                    in_expr,
                    where_expr,
                } in &generators
                {
                    self.type_expr(model, *in_expr)?;
                    let in_ty = model.ty(*in_expr);
                    gen_inst = join_inst(gen_inst, in_ty.inst);
                    let elem_ty = if in_ty.set == SetType::Set {
                        Type::par(in_ty.base)
                    } else if in_ty.dim > 0 {
                        in_ty.elem()
                    } else {
                        Type::par(BaseType::Int)
                    };
                    for d in decls {
                        let ti = model.decl_ti(*d);
                        model.expr_mut(ti).ty = elem_ty;
                        model.expr_mut(*d).ty = elem_ty;
                        let name = model.decl_name(*d).to_string();
                        self.scopes.last_mut().unwrap().insert(name, *d);
                    }
                    if let Some(w) = where_expr {
                        self.type_expr(model, *w)?;
                    }
                }
                self.type_expr(model, body)?;
                let body_ty = model.ty(body);
                self.scopes.pop();
                let inst = join_inst(body_ty.inst, gen_inst);
                model.expr_mut(id).ty = if is_set {
                    Type {
                        base: body_ty.base,
                        set: SetType::Set,
                        dim: 0,
                        inst,
                        present: true,
                    }
                } else {
                    Type {
                        base: body_ty.base,
                        set: SetType::Plain,
                        dim: 1,
                        inst,
                        present: true,
                    }
                };
            }

            ExprKind::IfThenElse {
                branches,
                else_expr,
            } => {
                let mut inst = Inst::Par;
                let mut base = BaseType::Bool;
                for (i, (cond, then)) in branches.iter().enumerate() {
                    self.type_expr(model, *cond)?;
                    self.type_expr(model, *then)?;
                    inst = join_inst(inst, model.ty(*cond).inst);
                    inst = join_inst(inst, model.ty(*then).inst);
                    if i == 0 {
                        base = model.ty(*then).base;
                    } else {
                        base = join_base(base, model.ty(*then).base);
                    }
                }
                if let Some(e) = else_expr {
                    self.type_expr(model, e)?;
                    inst = join_inst(inst, model.ty(e).inst);
                    base = join_base(base, model.ty(e).base);
                }
                let set = branches
                    .first()
                    .map_or(SetType::Plain, |(_, t)| model.ty(*t).set);
                model.expr_mut(id).ty = Type {
                    base,
                    set,
                    dim: 0,
                    inst,
                    present: true,
                };
            }

            ExprKind::Let { items, body } => {
                self.scopes.push(HashMap::new());
                for item in &items {
                    self.type_expr(model, *item)?;
                    if let ExprKind::VarDecl { name, .. } = model.kind(*item) {
                        let name = name.clone();
                        self.scopes.last_mut().unwrap().insert(name, *item);
                    }
                }
                self.type_expr(model, body)?;
                let ty = model.ty(body);
                self.scopes.pop();
                model.expr_mut(id).ty = ty;
            }

            ExprKind::VarDecl { ti, rhs, anns, .. } => {
                self.type_expr(model, ti)?;
                let ty = model.ty(ti);
                model.expr_mut(id).ty = ty;
                for ann in anns {
                    self.type_expr(model, ann)?;
                }
                if let Some(rhs) = rhs {
                    self.type_expr(model, rhs)?;
                }
            }

            ExprKind::TypeInst { ranges, domain } => {
                for r in &ranges {
                    self.type_expr(model, *r)?;
                }
                let mut ty = model.ty(id);
                if let Some(dom) = domain {
                    self.type_expr(model, dom)?;
                    let dom_ty = model.ty(dom);
                    if dom_ty.base != BaseType::Bot {
                        ty.base = dom_ty.base;
                    }
                }
                if ty.base == BaseType::Bot {
                    ty.base = BaseType::Int;
                }
                model.expr_mut(id).ty = ty;
            }
        }
        Ok(())
    }
}

/// The type a type-inst denotes, judged syntactically: enough for forward
/// references; the full pass refines float domains later.
fn declared_type(model: &Model, ti: ExprId) -> Type {
    let mut ty = model.ty(ti);
    if let Some(dom) = model.ti_domain(ti)
        && domain_is_float(model, dom)
    {
        ty.base = BaseType::Float;
    }
    if ty.base == BaseType::Bot {
        ty.base = BaseType::Int;
    }
    ty
}

fn domain_is_float(model: &Model, dom: ExprId) -> bool {
    match model.kind(dom) {
        ExprKind::FloatLit(_) => true,
        ExprKind::BinOp { lhs, rhs, .. } => {
            domain_is_float(model, *lhs) || domain_is_float(model, *rhs)
        }
        ExprKind::UnOp { operand, .. } => domain_is_float(model, *operand),
        ExprKind::SetLit { elems } => elems.iter().any(|e| domain_is_float(model, *e)),
        _ => false,
    }
}

fn join_base(a: BaseType, b: BaseType) -> BaseType {
    match (a, b) {
        (BaseType::Float, _) | (_, BaseType::Float) => BaseType::Float,
        (BaseType::Bot, other) => other,
        (other, _) => other,
    }
}

fn join_inst(a: Inst, b: Inst) -> Inst {
    if a == Inst::Var || b == Inst::Var {
        Inst::Var
    } else {
        Inst::Par
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{ExprCat, ExprId, ExprKind, Model};
    use crate::parser::parse_model_str;

    fn parse(src: &str) -> Model {
        parse_model_str(src, "testmodel").expect("model should type-check")
    }

    fn decl(model: &Model, name: &str) -> ExprId {
        (0..model.num_exprs())
            .map(|i| ExprId(i as u32))
            .find(|id| {
                matches!(model.kind(*id), ExprKind::VarDecl { name: n, .. } if n == name)
            })
            .expect("declaration should exist")
    }

    #[test]
    fn var_decls_get_their_declared_type() {
        let m = parse("var int: x;\nint: n = 3;\nvar 0..1: b;");
        assert!(m.ty(decl(&m, "x")).is_var());
        assert!(m.ty(decl(&m, "x")).is_int());
        assert!(m.ty(decl(&m, "n")).is_par());
        assert!(m.ty(decl(&m, "b")).is_var());
        assert!(m.ty(decl(&m, "b")).is_int());
    }

    #[test]
    fn float_domains_refine_the_base_type() {
        let m = parse("var 0.0..1.0: x;");
        assert!(m.ty(decl(&m, "x")).is_float());
    }

    #[test]
    fn assignment_items_merge_into_declarations() {
        let m = parse("var int: x;\nx = 2;");
        assert!(m.decl_rhs(decl(&m, "x")).is_some());
    }

    #[test]
    fn call_types_instantiate_from_arguments() {
        let m = parse("array[1..3] of var int: xs;\nconstraint forall([xs[1] = 1]);");
        let call = (0..m.num_exprs())
            .map(|i| ExprId(i as u32))
            .find(|id| matches!(m.kind(*id), ExprKind::Call { name, .. } if name == "forall"))
            .unwrap();
        assert!(m.ty(call).is_var_bool());
    }

    #[test]
    fn comprehension_generators_bind_par_iterators() {
        let m = parse("constraint forall(i in 1..3)(i > 0);");
        let comp = (0..m.num_exprs())
            .map(|i| ExprId(i as u32))
            .find(|id| m.cat(*id) == ExprCat::Comprehension)
            .unwrap();
        let ExprKind::Comprehension { generators, .. } = m.kind(comp) else {
            unreachable!()
        };
        let d = generators[0].decls[0];
        assert!(m.ty(d).is_par());
        assert!(m.ty(d).is_int());
    }

    #[test]
    fn solve_annotations_resolve_stdlib_names() {
        let m = parse("var int: a;\nsolve :: int_search([a], input_order, indomain) satisfy;");
        assert!(m.num_items() > 0);
    }

    #[test]
    fn predicates_return_var_bool() {
        let m = parse("include \"globals.mzn\";\narray[1..5] of var int: xs;\nconstraint alldifferent(xs);");
        let call = (0..m.num_exprs())
            .map(|i| ExprId(i as u32))
            .find(|id| matches!(m.kind(*id), ExprKind::Call { name, .. } if name == "alldifferent"))
            .unwrap();
        assert!(m.ty(call).is_var_bool());
    }
}
