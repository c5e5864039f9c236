use std::collections::HashSet;

use crate::ast::{ExprCat, ExprId, ExprKind, ItemId, ItemKind, Model};
use crate::diagnostics::{FileContents, LintResult};
use crate::env::{LintEnv, equal_constrained_access, equal_constrained_variables, is_conjunctive};
use crate::error::Result;
use crate::rules::{Category, LintRule};
use crate::search::Search;

/// Variables that are neither functionally defined by the constraints nor
/// mentioned in the search hint: the solver has to label them, and the
/// modeller probably forgot one or the other.
pub struct NonFuncHint;

impl LintRule for NonFuncHint {
    fn id(&self) -> u32 {
        9
    }

    fn name(&self) -> &'static str {
        "non-func-hint"
    }

    fn category(&self) -> Category {
        Category::Unsure
    }

    fn run(&self, env: &LintEnv<'_>) -> Result<()> {
        let model = env.model();

        let mut candidates: HashSet<ExprId> = env
            .user_defined_variable_declarations()
            .iter()
            .copied()
            .filter(|&d| {
                model.decl_rhs(d).is_none()
                    && model.decl_toplevel(d)
                    && model.ty(d).is_var()
                    && !env.is_search_hinted(d)
            })
            .collect();

        for decl in env.equal_constrained().keys() {
            candidates.remove(decl);
        }
        for decl in env.array_equal_constrained().keys() {
            candidates.remove(decl);
        }

        self.remove_functionally_defined(env, &mut candidates)?;

        let mut remaining: Vec<ExprId> = candidates.into_iter().collect();
        remaining.sort_by_key(|d| {
            let loc = model.loc(*d);
            (loc.file, loc.first_line, loc.first_col)
        });
        for decl in remaining {
            env.add_result(LintResult::new(
                self.id(),
                self.name(),
                "possibly non-functionally defined variable not in search hint",
                FileContents::one_line(model, model.loc(decl)),
            ));
        }
        Ok(())
    }
}

impl NonFuncHint {
    /// Remove arguments of conjunctive calls whose callee functionally
    /// defines the corresponding parameter through chained conjunctive
    /// equalities.
    fn remove_functionally_defined(
        &self,
        env: &LintEnv<'_>,
        candidates: &mut HashSet<ExprId>,
    ) -> Result<()> {
        let model = env.model();
        let call_search = env
            .userdef_only_builder()
            .in_constraint()
            .under(ExprCat::Call)
            .capture()
            .build()?;

        let mut searcher = call_search.search_model(model);
        while searcher.next() {
            let call = searcher.capture(0);
            if !is_conjunctive(model, searcher.current_path().skip(1)) {
                continue;
            }
            let mut visited = HashSet::new();
            let defined = functionally_defined_params(env, call, &mut visited, &call_search);
            let ExprKind::Call { args, .. } = model.kind(call) else {
                continue;
            };
            for (arg, is_defined) in args.iter().zip(&defined) {
                if !is_defined {
                    continue;
                }
                if let Some(decl) = argument_to_vardecl(model, *arg)
                    && model.decl_toplevel(decl)
                    && model.ty(decl).is_var()
                {
                    candidates.remove(&decl);
                }
            }
        }
        Ok(())
    }
}

/// For each argument position of `call`, whether the callee functionally
/// defines the corresponding parameter. Recurses through conjunctive calls
/// in the callee's body; a visited set breaks call cycles.
fn functionally_defined_params(
    env: &LintEnv<'_>,
    call: ExprId,
    visited: &mut HashSet<ItemId>,
    call_search: &Search,
) -> Vec<bool> {
    let model = env.model();
    let ExprKind::Call { args, decl, .. } = model.kind(call) else {
        return Vec::new();
    };
    let mut defined = vec![false; args.len()];

    let Some(item) = *decl else {
        return defined;
    };
    let ItemKind::Function {
        params,
        body: Some(body),
        from_stdlib,
        ..
    } = &model.item(item).kind
    else {
        return defined;
    };
    if *from_stdlib || env.is_stdlib_file(model.file_name(model.item(item).loc.file)) {
        return defined;
    }
    if !visited.insert(item) {
        #[cfg(feature = "telemetry")]
        tracing::warn!("cyclic function calls detected, giving up on this chain");
        return defined;
    }

    let mark = |param_decl: ExprId, defined: &mut Vec<bool>| {
        if let Some(i) = params.iter().position(|p| *p == param_decl)
            && i < defined.len()
        {
            defined[i] = true;
        }
    };

    equal_constrained_variables(model, *body, &mut |_eq, id| {
        if let ExprKind::Id {
            decl: Some(decl), ..
        } = model.kind(id)
        {
            mark(*decl, &mut defined);
        }
    });
    equal_constrained_access(model, *body, &mut |_eq, _access, array_decl, _rhs, _comp| {
        mark(array_decl, &mut defined);
    });

    let mut searcher = call_search.search_expr(model, *body);
    while searcher.next() {
        let inner = searcher.capture(0);
        if !is_conjunctive(model, searcher.current_path().skip(1)) {
            continue;
        }
        let inner_defined = functionally_defined_params(env, inner, visited, call_search);
        let ExprKind::Call {
            args: inner_args, ..
        } = model.kind(inner)
        else {
            continue;
        };
        for (arg, is_defined) in inner_args.iter().zip(&inner_defined) {
            if *is_defined
                && let Some(decl) = argument_to_vardecl(model, *arg)
            {
                mark(decl, &mut defined);
            }
        }
    }

    visited.remove(&item);
    defined
}

/// The declaration an argument stands for, seeing through `array1d`
/// wrappers and array accesses.
fn argument_to_vardecl(model: &Model, arg: ExprId) -> Option<ExprId> {
    match model.kind(arg) {
        ExprKind::Id { decl, .. } => *decl,
        ExprKind::Call { name, args, .. } if name == "array1d" && args.len() == 1 => {
            argument_to_vardecl(model, args[0])
        }
        ExprKind::ArrayAccess { array, .. } => argument_to_vardecl(model, *array),
        _ => None,
    }
}
