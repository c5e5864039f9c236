use crate::ast::BaseType;
use crate::diagnostics::{FileContents, LintResult};
use crate::env::LintEnv;
use crate::error::Result;
use crate::rules::{Category, LintRule};

/// Flags var int/float declarations that have no domain, no right-hand side
/// and no top-level equality pinning them down. Unbounded variables blow up
/// the solver's search space.
pub struct UnboundedVariable;

impl LintRule for UnboundedVariable {
    fn id(&self) -> u32 {
        13
    }

    fn name(&self) -> &'static str {
        "unbounded-variable"
    }

    fn category(&self) -> Category {
        Category::Performance
    }

    fn run(&self, env: &LintEnv<'_>) -> Result<()> {
        let model = env.model();
        for &decl in env.user_defined_variable_declarations() {
            let ty = model.ty(decl);
            let elem = ty.elem();
            if !ty.is_var()
                || !matches!(elem.base, BaseType::Int | BaseType::Float)
                || elem.set != crate::ast::SetType::Plain
                || !ty.is_present()
            {
                continue;
            }
            let ti = model.decl_ti(decl);
            if model.ti_domain(ti).is_some() {
                continue;
            }
            if model.decl_rhs(decl).is_some() {
                continue;
            }
            if env.get_equal_constrained_rhs(decl).is_some() {
                continue;
            }
            env.add_result(LintResult::new(
                self.id(),
                self.name(),
                "unbounded variable, consider adding a domain",
                FileContents::one_line(model, model.loc(decl)),
            ));
        }
        Ok(())
    }
}
