//! The linting environment: shared, lazily computed semantic indices over a
//! typed model, plus the accumulating list of findings.
//!
//! Rules only ever read from the environment's indices and append results;
//! every index is computed at most once and is immutable afterwards. The
//! result list lives behind a `RefCell` so a rule can hold references into
//! an index while appending (single-threaded by design).

use std::cell::{OnceCell, RefCell};
use std::collections::{HashMap, HashSet};

use crate::ast::{BinOp, ExprCat, ExprId, ExprKind, ItemId, ItemKind, Model};
use crate::diagnostics::LintResult;
use crate::search::SearchBuilder;

/// Witness for one conjunctive `d[idx] = rhs` constraint.
#[derive(Debug, Clone, Copy)]
pub struct ArrayConstraint {
    pub access: ExprId,
    pub rhs: ExprId,
    /// The enclosing comprehension, when the equality sits under a
    /// `forall(...)(...)`.
    pub comp: Option<ExprId>,
}

pub struct LintEnv<'m> {
    model: &'m Model,
    include_path: Vec<String>,
    results: RefCell<Vec<LintResult>>,

    equal_constrained: OnceCell<HashMap<ExprId, Vec<ExprId>>>,
    array_equal_constrained: OnceCell<HashMap<ExprId, Vec<ArrayConstraint>>>,
    user_defined_functions: OnceCell<Vec<ItemId>>,
    user_defined_variable_declarations: OnceCell<Vec<ExprId>>,
    constraints: OnceCell<Vec<ExprId>>,
    search_hinted_variables: OnceCell<HashSet<ExprId>>,
    comprehensions: OnceCell<Vec<ExprId>>,
}

impl<'m> LintEnv<'m> {
    #[must_use]
    pub fn new(model: &'m Model, include_path: Vec<String>) -> Self {
        Self {
            model,
            include_path,
            results: RefCell::new(Vec::new()),
            equal_constrained: OnceCell::new(),
            array_equal_constrained: OnceCell::new(),
            user_defined_functions: OnceCell::new(),
            user_defined_variable_declarations: OnceCell::new(),
            constraints: OnceCell::new(),
            search_hinted_variables: OnceCell::new(),
            comprehensions: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn model(&self) -> &'m Model {
        self.model
    }

    #[must_use]
    pub fn include_path(&self) -> &[String] {
        &self.include_path
    }

    /// True when `file` belongs to the standard library.
    #[must_use]
    pub fn is_stdlib_file(&self, file: &str) -> bool {
        self.include_path.iter().any(|p| file.starts_with(p.as_str()))
    }

    /// A builder preconfigured for user-defined code: include recursion is
    /// on and standard-library files are skipped.
    #[must_use]
    pub fn userdef_only_builder(&self) -> SearchBuilder {
        SearchBuilder::new()
            .only_user_defined(self.include_path.clone())
            .recursive(true)
    }

    pub fn add_result(&self, result: LintResult) {
        self.results.borrow_mut().push(result);
    }

    /// Hand out the accumulated findings, consuming the environment.
    #[must_use]
    pub fn into_results(self) -> Vec<LintResult> {
        self.results.into_inner()
    }

    // ------------------------------------------------------------------
    // Cached indices
    // ------------------------------------------------------------------

    /// Flattened constraint roots: the body of every constraint item in
    /// user-defined code plus every non-declaration expression directly
    /// under any `let`.
    pub fn constraints(&self) -> &[ExprId] {
        self.constraints.get_or_init(|| {
            let model = self.model;
            let mut roots = Vec::new();

            let items = self
                .userdef_only_builder()
                .in_constraint()
                .build()
                .expect("static search spec");
            let mut searcher = items.search_model(model);
            while searcher.next() {
                if let Some(item) = searcher.cur_item()
                    && let ItemKind::Constraint { expr } = &model.item(item).kind
                {
                    roots.push(*expr);
                }
            }

            let lets = self
                .userdef_only_builder()
                .in_everywhere()
                .under(ExprCat::Let)
                .capture()
                .build()
                .expect("static search spec");
            let mut searcher = lets.search_model(model);
            while searcher.next() {
                let ExprKind::Let { items, body } = model.kind(searcher.capture(0)) else {
                    continue;
                };
                for item in items {
                    if model.cat(*item) != ExprCat::VarDecl {
                        roots.push(*item);
                    }
                }
                roots.push(*body);
            }
            roots
        })
    }

    /// Variables with a top-level-conjunctive `d = e` (or `e = d`)
    /// constraint, mapped to their witness expressions.
    pub fn equal_constrained(&self) -> &HashMap<ExprId, Vec<ExprId>> {
        self.equal_constrained.get_or_init(|| {
            let model = self.model;
            let mut map: HashMap<ExprId, Vec<ExprId>> = HashMap::new();
            for root in self.constraints() {
                equal_constrained_variables(model, *root, &mut |eq, id| {
                    let Some(decl) = (match model.kind(id) {
                        ExprKind::Id { decl, .. } => *decl,
                        _ => None,
                    }) else {
                        return;
                    };
                    if let Some(other) = model.other_side(eq, id) {
                        map.entry(decl).or_default().push(other);
                    }
                });
            }
            map
        })
    }

    /// Arrays with conjunctive `d[idx] = rhs` constraints, mapped to their
    /// witnesses.
    pub fn array_equal_constrained(&self) -> &HashMap<ExprId, Vec<ArrayConstraint>> {
        self.array_equal_constrained.get_or_init(|| {
            let model = self.model;
            let mut map: HashMap<ExprId, Vec<ArrayConstraint>> = HashMap::new();
            for root in self.constraints() {
                equal_constrained_access(model, *root, &mut |_eq, access, array_decl, rhs, comp| {
                    map.entry(array_decl).or_default().push(ArrayConstraint {
                        access,
                        rhs,
                        comp,
                    });
                });
            }
            map
        })
    }

    /// Function items defined by the user (not builtins, not under a
    /// standard-library path), with auto-generated duplicates sharing the
    /// same name and location removed.
    pub fn user_defined_functions(&self) -> &[ItemId] {
        self.user_defined_functions.get_or_init(|| {
            let model = self.model;
            let mut seen = HashSet::new();
            let mut out = Vec::new();
            for idx in 0..model.num_items() {
                let item = ItemId(idx as u32);
                let ItemKind::Function {
                    name, from_stdlib, ..
                } = &model.item(item).kind
                else {
                    continue;
                };
                if *from_stdlib {
                    continue;
                }
                let loc = model.item(item).loc;
                let file = model.file_name(loc.file);
                if self.is_stdlib_file(file) {
                    continue;
                }
                if seen.insert((name.clone(), loc.first_line, loc.first_col, loc.file)) {
                    out.push(item);
                }
            }
            out
        })
    }

    /// Every variable declaration in user-defined code, including `let`
    /// locals, parameters and generators, plus the declaration behind the
    /// solve objective (appended once).
    pub fn user_defined_variable_declarations(&self) -> &[ExprId] {
        self.user_defined_variable_declarations.get_or_init(|| {
            let model = self.model;
            let mut out = Vec::new();
            let search = self
                .userdef_only_builder()
                .in_everywhere()
                .under(ExprCat::VarDecl)
                .capture()
                .build()
                .expect("static search spec");
            let mut searcher = search.search_model(model);
            while searcher.next() {
                let decl = searcher.capture(0);
                // Merged assignments make a declaration reachable from both
                // its own item and the assign item; keep the first visit.
                if !out.contains(&decl) {
                    out.push(decl);
                }
            }

            for idx in 0..model.num_items() {
                let ItemKind::Solve {
                    objective: Some(obj),
                    ..
                } = &model.item(ItemId(idx as u32)).kind
                else {
                    continue;
                };
                if let Some(decl) = model.follow_id_to_decl(*obj)
                    && !out.contains(&decl)
                {
                    out.push(decl);
                }
            }
            out
        })
    }

    /// Variable declarations referenced anywhere inside the solve item's
    /// annotation list.
    pub fn search_hinted_variables(&self) -> &HashSet<ExprId> {
        self.search_hinted_variables.get_or_init(|| {
            let model = self.model;
            let mut hinted = HashSet::new();
            let ids = SearchBuilder::new()
                .under(ExprCat::Id)
                .capture()
                .build()
                .expect("static search spec");
            for idx in 0..model.num_items() {
                let ItemKind::Solve { anns, .. } = &model.item(ItemId(idx as u32)).kind else {
                    continue;
                };
                for ann in anns {
                    let mut searcher = ids.search_expr(model, *ann);
                    while searcher.next() {
                        if let ExprKind::Id {
                            decl: Some(decl), ..
                        } = model.kind(searcher.capture(0))
                        {
                            hinted.insert(*decl);
                        }
                    }
                }
            }
            hinted
        })
    }

    /// Every comprehension reachable in user-defined code.
    pub fn comprehensions(&self) -> &[ExprId] {
        self.comprehensions.get_or_init(|| {
            let model = self.model;
            let mut out = Vec::new();
            let search = self
                .userdef_only_builder()
                .in_everywhere()
                .under(ExprCat::Comprehension)
                .capture()
                .build()
                .expect("static search spec");
            let mut searcher = search.search_model(model);
            while searcher.next() {
                let comp = searcher.capture(0);
                if !out.contains(&comp) {
                    out.push(comp);
                }
            }
            out
        })
    }

    // ------------------------------------------------------------------
    // Derived queries
    // ------------------------------------------------------------------

    /// Any one witness expression equal-constrained to `decl`.
    #[must_use]
    pub fn get_equal_constrained_rhs(&self, decl: ExprId) -> Option<ExprId> {
        self.equal_constrained()
            .get(&decl)
            .and_then(|v| v.first())
            .copied()
    }

    #[must_use]
    pub fn is_search_hinted(&self, decl: ExprId) -> bool {
        self.search_hinted_variables().contains(&decl)
    }

    /// True when some witness constraint provably touches every index of
    /// the array `decl`: a simple access, bound by a comprehension without
    /// `where` clauses whose generators cover exactly the array's index
    /// domains.
    #[must_use]
    pub fn is_every_index_touched(&self, decl: ExprId) -> bool {
        let model = self.model;
        let Some(witnesses) = self.array_equal_constrained().get(&decl) else {
            return false;
        };
        witnesses.iter().any(|w| {
            let Some(comp) = w.comp else {
                return false;
            };
            is_array_access_simple(model, w.access)
                && comprehension_satisfies_access(model, comp, w.access)
                && !comprehension_contains_where(model, comp)
                && comprehension_covers_whole_array(model, comp, decl)
        })
    }
}

// ============================================================================
// Conjunctive-context analysis
// ============================================================================

/// True when every ancestor on `path` (newest first, hit already skipped)
/// keeps the expression in a conjunctive context: `/\`, a `let`, or a
/// comprehension directly wrapped by a `forall` call.
pub fn is_conjunctive(model: &Model, path: impl Iterator<Item = ExprId>) -> bool {
    let mut last_comp = false;
    for e in path {
        if last_comp {
            last_comp = false;
            let ExprKind::Call { name, .. } = model.kind(e) else {
                return false;
            };
            if name != "forall" {
                return false;
            }
            continue;
        }
        match model.kind(e) {
            ExprKind::BinOp { op: BinOp::And, .. } | ExprKind::Let { .. } => {}
            ExprKind::Comprehension { .. } => last_comp = true,
            _ => return false,
        }
    }
    !last_comp
}

/// True when the path is certainly not reified. Unlike [`is_conjunctive`]
/// this does not admit `forall` over a comprehension, but it does admit
/// constraint annotations (`redundant_constraint`, `implied_constraint`)
/// and conditionals whose conditions are all par.
pub fn is_not_reified(model: &Model, path: impl Iterator<Item = ExprId>) -> bool {
    for e in path {
        match model.kind(e) {
            ExprKind::BinOp { op: BinOp::And, .. } | ExprKind::Let { .. } => {}
            ExprKind::Call { name, .. }
                if name == "redundant_constraint" || name == "implied_constraint" => {}
            ExprKind::IfThenElse { branches, .. }
                if branches.iter().all(|(cond, _)| model.ty(*cond).is_par()) => {}
            _ => return false,
        }
    }
    true
}

/// Invoke `cb(eq, id_side)` for every conjunctive equality under `root`
/// with an identifier on either side.
pub fn equal_constrained_variables(
    model: &Model,
    root: ExprId,
    cb: &mut dyn FnMut(ExprId, ExprId),
) {
    let search = SearchBuilder::new()
        .under(BinOp::Eq)
        .capture()
        .build()
        .expect("static search spec");
    let mut searcher = search.search_expr(model, root);
    while searcher.next() {
        let eq = searcher.capture(0);
        if !is_conjunctive(model, searcher.current_path().skip(1)) {
            continue;
        }
        let ExprKind::BinOp { lhs, rhs, .. } = model.kind(eq) else {
            continue;
        };
        for side in [*lhs, *rhs] {
            if model.cat(side) == ExprCat::Id {
                cb(eq, side);
            }
        }
    }
}

/// Invoke `cb(eq, access, array_decl, rhs, comp)` for every conjunctive
/// `a[..] = rhs` under `root` where `a` resolves to a declaration. `comp`
/// is the innermost comprehension on the (conjunctive) path, if any.
pub fn equal_constrained_access(
    model: &Model,
    root: ExprId,
    cb: &mut dyn FnMut(ExprId, ExprId, ExprId, ExprId, Option<ExprId>),
) {
    let search = SearchBuilder::new()
        .under(BinOp::Eq)
        .capture()
        .build()
        .expect("static search spec");
    let mut searcher = search.search_expr(model, root);
    while searcher.next() {
        let eq = searcher.capture(0);
        if !is_conjunctive(model, searcher.current_path().skip(1)) {
            continue;
        }
        let comp = searcher
            .current_path()
            .skip(1)
            .find(|e| model.cat(*e) == ExprCat::Comprehension);
        let ExprKind::BinOp { lhs, rhs, .. } = model.kind(eq) else {
            continue;
        };
        for side in [*lhs, *rhs] {
            let ExprKind::ArrayAccess { array, .. } = model.kind(side) else {
                continue;
            };
            let Some(array_decl) = model.follow_id_to_decl(*array) else {
                continue;
            };
            let Some(other) = model.other_side(eq, side) else {
                continue;
            };
            cb(eq, side, array_decl, other, comp);
        }
    }
}

// ============================================================================
// Comprehension/access helpers
// ============================================================================

/// All index expressions of the access are plain identifiers.
#[must_use]
pub fn is_array_access_simple(model: &Model, access: ExprId) -> bool {
    match model.kind(access) {
        ExprKind::ArrayAccess { idx, .. } => {
            idx.iter().all(|i| model.cat(*i) == ExprCat::Id)
        }
        _ => false,
    }
}

/// Every identifier indexing the access is bound by `comp`.
#[must_use]
pub fn comprehension_satisfies_access(model: &Model, comp: ExprId, access: ExprId) -> bool {
    let ExprKind::Comprehension { generators, .. } = model.kind(comp) else {
        return false;
    };
    let ExprKind::ArrayAccess { idx, .. } = model.kind(access) else {
        return false;
    };
    idx.iter().all(|i| match model.kind(*i) {
        ExprKind::Id {
            decl: Some(decl), ..
        } => generators.iter().any(|g| g.decls.contains(decl)),
        _ => false,
    })
}

#[must_use]
pub fn comprehension_contains_where(model: &Model, comp: ExprId) -> bool {
    match model.kind(comp) {
        ExprKind::Comprehension { generators, .. } => {
            generators.iter().any(|g| g.where_expr.is_some())
        }
        _ => false,
    }
}

/// The generators' `in` expressions, as a multiset, equal the array's index
/// domains (compared structurally).
#[must_use]
pub fn comprehension_covers_whole_array(model: &Model, comp: ExprId, array_decl: ExprId) -> bool {
    let ExprKind::Comprehension { generators, .. } = model.kind(comp) else {
        return false;
    };
    let ti = model.decl_ti(array_decl);
    let ranges = model.ti_ranges(ti);

    let mut comp_domains = Vec::new();
    for g in generators {
        for _ in &g.decls {
            comp_domains.push(g.in_expr);
        }
    }
    if comp_domains.len() != ranges.len() {
        return false;
    }

    let mut used = vec![false; comp_domains.len()];
    for r in ranges {
        let Some(domain) = model.ti_domain(*r) else {
            return false;
        };
        let found = comp_domains.iter().enumerate().find(|(i, c)| {
            !used[*i] && model.expr_equal(**c, domain)
        });
        match found {
            Some((i, _)) => used[i] = true,
            None => return false,
        }
    }
    true
}

// ============================================================================
// Bounds and instance dependence
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntBounds {
    pub lo: i64,
    pub hi: i64,
}

/// Bounds could not be derived for the expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundsError;

/// Conservative integer bounds from literals, declared domains and linear
/// arithmetic. Everything else reports [`BoundsError`].
pub fn compute_int_bounds(model: &Model, expr: ExprId) -> Result<IntBounds, BoundsError> {
    match model.kind(expr) {
        ExprKind::IntLit(v) => Ok(IntBounds { lo: *v, hi: *v }),
        ExprKind::Id {
            decl: Some(decl), ..
        } => decl_bounds(model, *decl),
        ExprKind::ArrayAccess { array, .. } => match model.kind(*array) {
            ExprKind::Id {
                decl: Some(decl), ..
            } => decl_bounds(model, *decl),
            _ => Err(BoundsError),
        },
        ExprKind::BinOp { op, lhs, rhs } => {
            let l = compute_int_bounds(model, *lhs)?;
            let r = compute_int_bounds(model, *rhs)?;
            match op {
                BinOp::Plus => Ok(IntBounds {
                    lo: l.lo + r.lo,
                    hi: l.hi + r.hi,
                }),
                BinOp::Minus => Ok(IntBounds {
                    lo: l.lo - r.hi,
                    hi: l.hi - r.lo,
                }),
                BinOp::Mult => {
                    let products = [l.lo * r.lo, l.lo * r.hi, l.hi * r.lo, l.hi * r.hi];
                    Ok(IntBounds {
                        lo: *products.iter().min().unwrap(),
                        hi: *products.iter().max().unwrap(),
                    })
                }
                _ => Err(BoundsError),
            }
        }
        ExprKind::UnOp {
            op: crate::ast::UnOp::Minus,
            operand,
        } => {
            let b = compute_int_bounds(model, *operand)?;
            Ok(IntBounds {
                lo: -b.hi,
                hi: -b.lo,
            })
        }
        _ => Err(BoundsError),
    }
}

fn decl_bounds(model: &Model, decl: ExprId) -> Result<IntBounds, BoundsError> {
    let ti = model.decl_ti(decl);
    if let Some(domain) = model.ti_domain(ti) {
        return set_bounds(model, domain);
    }
    match model.decl_rhs(decl) {
        Some(rhs) => compute_int_bounds(model, rhs),
        None => Err(BoundsError),
    }
}

/// Bounds of a set expression used as a domain.
pub fn set_bounds(model: &Model, expr: ExprId) -> Result<IntBounds, BoundsError> {
    let followed = model.follow_id(expr).ok_or(BoundsError)?;
    match model.kind(followed) {
        ExprKind::BinOp {
            op: BinOp::DotDot,
            lhs,
            rhs,
        } => Ok(IntBounds {
            lo: eval_par_int(model, *lhs)?,
            hi: eval_par_int(model, *rhs)?,
        }),
        ExprKind::SetLit { elems } if !elems.is_empty() => {
            let mut lo = i64::MAX;
            let mut hi = i64::MIN;
            for e in elems {
                let v = eval_par_int(model, *e)?;
                lo = lo.min(v);
                hi = hi.max(v);
            }
            Ok(IntBounds { lo, hi })
        }
        _ => Err(BoundsError),
    }
}

/// Evaluate a par integer expression.
pub fn eval_par_int(model: &Model, expr: ExprId) -> Result<i64, BoundsError> {
    match model.kind(expr) {
        ExprKind::IntLit(v) => Ok(*v),
        ExprKind::Id {
            decl: Some(decl), ..
        } => match model.decl_rhs(*decl) {
            Some(rhs) => eval_par_int(model, rhs),
            None => Err(BoundsError),
        },
        ExprKind::UnOp {
            op: crate::ast::UnOp::Minus,
            operand,
        } => Ok(-eval_par_int(model, *operand)?),
        ExprKind::BinOp { op, lhs, rhs } => {
            let l = eval_par_int(model, *lhs)?;
            let r = eval_par_int(model, *rhs)?;
            match op {
                BinOp::Plus => Ok(l + r),
                BinOp::Minus => Ok(l - r),
                BinOp::Mult => Ok(l * r),
                BinOp::IDiv if r != 0 => Ok(l / r),
                BinOp::Mod if r != 0 => Ok(l % r),
                _ => Err(BoundsError),
            }
        }
        _ => Err(BoundsError),
    }
}

/// True when the expression references a top-level parameter, directly or
/// transitively through a declaration's domain.
#[must_use]
pub fn depends_on_instance(model: &Model, expr: Option<ExprId>) -> bool {
    let Some(expr) = expr else {
        return false;
    };
    let mut visited = HashSet::new();
    depends_on_instance_rec(model, expr, &mut visited)
}

fn depends_on_instance_rec(model: &Model, expr: ExprId, visited: &mut HashSet<ExprId>) -> bool {
    if !visited.insert(expr) {
        return false;
    }
    if let ExprKind::Id {
        decl: Some(decl), ..
    } = model.kind(expr)
    {
        if model.ty(expr).is_par() && model.decl_toplevel(*decl) {
            return true;
        }
        let ti = model.decl_ti(*decl);
        if let Some(domain) = model.ti_domain(ti)
            && depends_on_instance_rec(model, domain, visited)
        {
            return true;
        }
    }
    model
        .children(expr)
        .into_iter()
        .any(|c| depends_on_instance_rec(model, c, visited))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_model_str, std_include_paths};

    fn env_for(model: &Model) -> LintEnv<'_> {
        LintEnv::new(model, std_include_paths())
    }

    fn parse(src: &str) -> Model {
        parse_model_str(src, "testmodel").expect("model should parse")
    }

    fn first_array_decl(env: &LintEnv<'_>) -> ExprId {
        let model = env.model();
        *env.user_defined_variable_declarations()
            .iter()
            .find(|d| model.ti_is_array(model.decl_ti(**d)))
            .expect("an array declaration should exist")
    }

    #[test]
    fn every_index_touched_one_dimension() {
        let m = parse("array[1..3] of var int: arr;\nconstraint forall(i in 1..3)(arr[i] = 1);");
        let env = env_for(&m);
        assert!(env.is_every_index_touched(first_array_decl(&env)));
    }

    #[test]
    fn every_index_touched_via_par() {
        let m = parse(
            "int: n = 5;\narray[1..n] of var int: arr;\nconstraint forall(i in 1..n)(arr[i] = 1);",
        );
        let env = env_for(&m);
        assert!(env.is_every_index_touched(first_array_decl(&env)));
    }

    #[test]
    fn every_index_touched_via_set_identifier() {
        let m = parse(
            "set of int: ns = 4..5;\narray[ns] of var int: arr;\nconstraint forall(i in ns)(arr[i] = 1);",
        );
        let env = env_for(&m);
        assert!(env.is_every_index_touched(first_array_decl(&env)));
    }

    #[test]
    fn value_equal_domains_do_not_count_as_coverage() {
        // `ns` and `4..5` denote the same set but are structurally
        // different expressions.
        let m = parse(
            "set of int: ns = 4..5;\narray[ns] of var int: arr;\nconstraint forall(i in 4..5)(arr[i] = 1);",
        );
        let env = env_for(&m);
        assert!(!env.is_every_index_touched(first_array_decl(&env)));
    }

    #[test]
    fn every_index_touched_two_dimensions() {
        let m = parse(
            "set of int: ns = 4..5;\narray[ns, 1..3] of var int: arr;\nconstraint forall(i in ns, j in 1..3)(arr[i,j] = 1);",
        );
        let env = env_for(&m);
        assert!(env.is_every_index_touched(first_array_decl(&env)));
    }

    #[test]
    fn where_clause_defeats_coverage() {
        let m = parse(
            "array[1..3] of var int: arr;\nconstraint forall(i in 1..3 where true)(arr[i] = 1);",
        );
        let env = env_for(&m);
        assert!(!env.is_every_index_touched(first_array_decl(&env)));
    }

    #[test]
    fn plain_assignment_is_not_coverage() {
        let m = parse("array[1..1] of var int: arr;\nconstraint arr[1] = 1;");
        let env = env_for(&m);
        assert!(!env.is_every_index_touched(first_array_decl(&env)));
    }

    #[test]
    fn wrong_or_split_ranges_are_not_coverage() {
        let m = parse("array[1..10] of var int: arr;\nconstraint forall(i in 1..3)(arr[i] = 1);");
        let env = env_for(&m);
        assert!(!env.is_every_index_touched(first_array_decl(&env)));

        let m2 = parse(
            "array[1..10] of var int: arr;\nconstraint forall(i in 1..3)(arr[i] = 1);\nconstraint forall(i in 4..10)(arr[i] = 2);",
        );
        let env2 = env_for(&m2);
        assert!(!env2.is_every_index_touched(first_array_decl(&env2)));
    }

    #[test]
    fn equal_constrained_sees_through_conjunctions_only() {
        let m = parse(
            "var int: a;\nvar int: b;\nvar int: c;\nconstraint a = 2 /\\ true;\nconstraint if 1 = 1 then b = 2 endif;\nconstraint c = 3 \\/ true;",
        );
        let env = env_for(&m);
        let map = env.equal_constrained();
        let decls = env.user_defined_variable_declarations();
        let model = env.model();
        let by_name = |n: &str| {
            *decls
                .iter()
                .find(|d| model.decl_name(**d) == n)
                .expect("decl")
        };
        assert!(map.contains_key(&by_name("a")));
        assert!(!map.contains_key(&by_name("b")));
        assert!(!map.contains_key(&by_name("c")));
    }

    #[test]
    fn equal_constrained_inside_let() {
        let m = parse("var int: x = let {var int: y; constraint y = 3;} in y;");
        let env = env_for(&m);
        let model = env.model();
        let y = *env
            .user_defined_variable_declarations()
            .iter()
            .find(|d| model.decl_name(**d) == "y")
            .unwrap();
        assert!(env.get_equal_constrained_rhs(y).is_some());
    }

    #[test]
    fn conditional_array_constraints_contribute_nothing() {
        let m = parse(
            "array[1..3] of var int: a;\nconstraint if true then a[1] = 1 endif;",
        );
        let env = env_for(&m);
        assert!(env.array_equal_constrained().is_empty());
    }

    #[test]
    fn cached_indices_are_stable() {
        let m = parse("var int: x;\nconstraint x = 2;");
        let env = env_for(&m);
        let first = env.constraints().to_vec();
        let second = env.constraints().to_vec();
        assert_eq!(first, second);
        let ec1: Vec<_> = env.equal_constrained().keys().copied().collect();
        let ec2: Vec<_> = env.equal_constrained().keys().copied().collect();
        assert_eq!(ec1, ec2);
    }

    #[test]
    fn search_hints_collect_identifiers_from_solve_annotations() {
        let m = parse(
            "var int: a;\nvar int: b;\nsolve :: int_search([a], input_order, indomain) satisfy;",
        );
        let env = env_for(&m);
        let model = env.model();
        let decls = env.user_defined_variable_declarations();
        let a = *decls.iter().find(|d| model.decl_name(**d) == "a").unwrap();
        let b = *decls.iter().find(|d| model.decl_name(**d) == "b").unwrap();
        assert!(env.is_search_hinted(a));
        assert!(!env.is_search_hinted(b));
    }

    #[test]
    fn bounds_from_domains_and_arithmetic() {
        let m = parse("var 0..1: a;\nvar 1..2: b;\nconstraint a = 1 -> (b-1) = 1;");
        let env = env_for(&m);
        let model = env.model();
        let decls = env.user_defined_variable_declarations();
        let a = *decls.iter().find(|d| model.decl_name(**d) == "a").unwrap();
        let ti = model.decl_ti(a);
        let dom = model.ti_domain(ti).unwrap();
        assert_eq!(set_bounds(model, dom), Ok(IntBounds { lo: 0, hi: 1 }));

        let minus = (0..model.num_exprs())
            .map(|i| ExprId(i as u32))
            .find(|id| matches!(model.kind(*id), ExprKind::BinOp { op: BinOp::Minus, .. }))
            .unwrap();
        assert_eq!(
            compute_int_bounds(model, minus),
            Ok(IntBounds { lo: 0, hi: 1 })
        );
    }

    #[test]
    fn unbounded_expressions_report_bounds_errors() {
        let m = parse("var int: a;\nconstraint a = 1;");
        let env = env_for(&m);
        let model = env.model();
        let a_decl = *env.user_defined_variable_declarations().first().unwrap();
        assert_eq!(decl_bounds(model, a_decl), Err(BoundsError));
    }

    #[test]
    fn instance_dependence_follows_domains() {
        let m = parse("int: n;\nvar 0..n: x;\nvar 0..1: y;\nconstraint x = 1 /\\ y = 1;");
        let env = env_for(&m);
        let model = env.model();
        let decls = env.user_defined_variable_declarations();
        let x = *decls.iter().find(|d| model.decl_name(**d) == "x").unwrap();
        let y = *decls.iter().find(|d| model.decl_name(**d) == "y").unwrap();
        let x_dom = model.ti_domain(model.decl_ti(x)).unwrap();
        let y_dom = model.ti_domain(model.decl_ti(y)).unwrap();
        assert!(depends_on_instance(model, Some(x_dom)));
        assert!(!depends_on_instance(model, Some(y_dom)));
    }
}
