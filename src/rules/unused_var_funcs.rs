use std::collections::{HashMap, HashSet};

use crate::ast::{ExprCat, ExprId, ExprKind, ItemId, ItemKind, Location, Model};
use crate::diagnostics::{FileContents, LintResult};
use crate::env::LintEnv;
use crate::error::Result;
use crate::rules::{Category, LintRule};
use crate::search::{Search, SearchBuilder, filter_out_vardecls};

/// Reports user-defined functions and variables that nothing reachable from
/// a constraint or the solve item depends on.
pub struct UnusedVarFuncs;

/// A dependency-graph node: a function item or a variable declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Thing {
    Func(ItemId),
    Var(ExprId),
}

type Graph = HashMap<Thing, Vec<Thing>>;

impl LintRule for UnusedVarFuncs {
    fn id(&self) -> u32 {
        1
    }

    fn name(&self) -> &'static str {
        "unused-var-funcs"
    }

    fn category(&self) -> Category {
        Category::Redundant
    }

    fn run(&self, env: &LintEnv<'_>) -> Result<()> {
        let model = env.model();
        let id_search = SearchBuilder::new()
            .global_filter(filter_out_vardecls)
            .under(ExprCat::Id)
            .capture()
            .build()?;
        let call_search = SearchBuilder::new()
            .global_filter(filter_out_vardecls)
            .under(ExprCat::Call)
            .capture()
            .build()?;

        let mut deps = self.find_dependencies(env, &id_search, &call_search);
        let mut uses = Vec::new();
        self.find_uses(env, ExprCat::Id, &mut uses)?;
        self.find_uses(env, ExprCat::Call, &mut uses)?;
        recursively_remove(&mut deps, uses);

        let mut unused: HashSet<Thing> = deps.keys().copied().collect();
        let containment = self.find_containment(env)?;
        // A declaration living inside `t` disappears together with `t`; it
        // is only worth a separate report when `t` does not itself use it.
        for (t, decl) in &containment {
            let contained_used = deps
                .get(t)
                .is_some_and(|targets| targets.contains(&Thing::Var(*decl)));
            if contained_used {
                unused.remove(&Thing::Var(*decl));
            }
        }

        let mut report: Vec<(Location, Thing)> = unused
            .into_iter()
            .map(|t| {
                let loc = match t {
                    Thing::Func(item) => model.item(item).loc,
                    Thing::Var(decl) => model.loc(decl),
                };
                (loc, t)
            })
            .collect();
        report.sort_by_key(|(loc, _)| (loc.file, loc.first_line, loc.first_col));

        for (loc, thing) in report {
            let message = match thing {
                Thing::Func(_) => "unused function",
                Thing::Var(_) => "unused variable/parameter",
            };
            env.add_result(LintResult::new(
                self.id(),
                self.name(),
                message,
                FileContents::one_line(model, loc),
            ));
        }
        Ok(())
    }
}

impl UnusedVarFuncs {
    fn find_dependencies(
        &self,
        env: &LintEnv<'_>,
        id_search: &Search,
        call_search: &Search,
    ) -> Graph {
        let model = env.model();
        let mut graph = Graph::new();

        for &item in env.user_defined_functions() {
            let ItemKind::Function { params, body, .. } = &model.item(item).kind else {
                continue;
            };
            collect(model, &mut graph, Thing::Func(item), *body, id_search, call_search);
            graph.entry(Thing::Func(item)).or_default();
            for param in params {
                collect_var(model, &mut graph, *param, id_search, call_search);
            }
        }
        for &decl in env.user_defined_variable_declarations() {
            collect_var(model, &mut graph, decl, id_search, call_search);
        }
        graph
    }

    fn find_uses(&self, env: &LintEnv<'_>, cat: ExprCat, uses: &mut Vec<Thing>) -> Result<()> {
        let model = env.model();
        let search = env
            .userdef_only_builder()
            .global_filter(filter_out_vardecls)
            .in_solve()
            .in_constraint()
            .in_output()
            .under(cat)
            .capture()
            .build()?;
        let mut searcher = search.search_model(model);
        while searcher.next() {
            if let Some(thing) = resolve_thing(model, searcher.capture(0)) {
                uses.push(thing);
            }
        }
        Ok(())
    }

    fn find_containment(&self, env: &LintEnv<'_>) -> Result<Vec<(Thing, ExprId)>> {
        let model = env.model();
        let mut containment = Vec::new();
        let decl_search = env
            .userdef_only_builder()
            .under(ExprCat::VarDecl)
            .capture()
            .build()?;

        let find_decls = |thing: Thing, expr: Option<ExprId>, out: &mut Vec<(Thing, ExprId)>| {
            let Some(expr) = expr else { return };
            let mut searcher = decl_search.search_expr(model, expr);
            while searcher.next() {
                out.push((thing, searcher.capture(0)));
            }
        };

        for &item in env.user_defined_functions() {
            let ItemKind::Function { params, body, .. } = &model.item(item).kind else {
                continue;
            };
            find_decls(Thing::Func(item), *body, &mut containment);
            for param in params {
                containment.push((Thing::Func(item), *param));
            }
        }
        for &decl in env.user_defined_variable_declarations() {
            find_decls(Thing::Var(decl), model.decl_rhs(decl), &mut containment);
        }
        Ok(containment)
    }
}

fn collect(
    model: &Model,
    graph: &mut Graph,
    thing: Thing,
    expr: Option<ExprId>,
    id_search: &Search,
    call_search: &Search,
) {
    let Some(expr) = expr else { return };
    collect_dependants(model, graph, thing, expr, id_search);
    collect_dependants(model, graph, thing, expr, call_search);
}

fn collect_var(
    model: &Model,
    graph: &mut Graph,
    decl: ExprId,
    id_search: &Search,
    call_search: &Search,
) {
    collect(model, graph, Thing::Var(decl), model.decl_rhs(decl), id_search, call_search);
    let ti = model.decl_ti(decl);
    collect(model, graph, Thing::Var(decl), model.ti_domain(ti), id_search, call_search);
    for r in model.ti_ranges(ti) {
        collect(model, graph, Thing::Var(decl), model.ti_domain(*r), id_search, call_search);
    }
    graph.entry(Thing::Var(decl)).or_default();
}

fn collect_dependants(model: &Model, graph: &mut Graph, thing: Thing, expr: ExprId, search: &Search) {
    let mut searcher = search.search_expr(model, expr);
    while searcher.next() {
        if let Some(target) = resolve_thing(model, searcher.capture(0)) {
            graph.entry(thing).or_default().push(target);
        }
    }
}

fn resolve_thing(model: &Model, expr: ExprId) -> Option<Thing> {
    match model.kind(expr) {
        ExprKind::Id { decl, .. } => decl.map(Thing::Var),
        ExprKind::Call { decl, .. } => decl.map(Thing::Func),
        _ => None,
    }
}

/// Remove everything reachable from `worklist` from the graph; whatever
/// remains has no path from a use site.
fn recursively_remove(graph: &mut Graph, mut worklist: Vec<Thing>) {
    while let Some(used) = worklist.pop() {
        if let Some(targets) = graph.remove(&used) {
            worklist.extend(targets);
        }
    }
}
