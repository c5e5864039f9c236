//! MiniZinc frontend: lexing, parsing, include resolution and type checking.
//!
//! The linter core consumes an already-typed [`Model`]; this module is the
//! collaborator that produces one. It understands the subset of MiniZinc the
//! lint rules reason about: all item kinds, type-insts with ranges and
//! domains, the full operator table, comprehensions, generator calls,
//! if-then-else, `let`, calls, array accesses and literals.
//!
//! A small embedded standard library (declaration stubs) is parsed into
//! every model under the virtual `<std>/` prefix, so user models can
//! `include "globals.mzn"` without a MiniZinc installation.

mod lexer;
mod stdlib;
mod typecheck;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::ast::{
    BinOp, ExprId, ExprKind, FileId, Generator, ItemId, ItemKind, Location, Model, SolveGoal,
    Type, UnOp,
};
use crate::error::{Error, Result};

use lexer::{Lexer, TokKind, Token};

/// Virtual path prefix under which the embedded standard library lives.
pub const STD_PREFIX: &str = "<std>/";

/// Include-path roots identifying standard-library files; everything whose
/// filename starts with one of these is not "user-defined" to the linter.
#[must_use]
pub fn std_include_paths() -> Vec<String> {
    vec![STD_PREFIX.to_string()]
}

/// Parse and type-check a model given as a string. Includes resolve against
/// the embedded standard library only.
pub fn parse_model_str(source: &str, name: &str) -> Result<Model> {
    parse_model_impl(source, name, None)
}

/// Parse and type-check a model from disk. Includes resolve against the
/// embedded standard library first, then relative to the model's directory.
pub fn parse_model_file(path: &Path) -> Result<Model> {
    let source = std::fs::read_to_string(path)?;
    let base_dir = path.parent().map(Path::to_path_buf);
    parse_model_impl(&source, &path.to_string_lossy(), base_dir)
}

fn parse_model_impl(source: &str, name: &str, base_dir: Option<PathBuf>) -> Result<Model> {
    let mut model = Model::new();
    let mut ctx = ParseCtx {
        included: HashSet::new(),
        base_dir,
    };

    // The builtins are always available, as if the model began with an
    // include of the standard library.
    ctx.included.insert("stdlib.mzn".to_string());
    let std_items = parse_into(&mut model, &mut ctx, stdlib::STDLIB_SOURCE, "<std>/stdlib.mzn")?;
    let inc = model.alloc_item(
        ItemKind::Include {
            path: "stdlib.mzn".to_string(),
            resolved: "<std>/stdlib.mzn".to_string(),
            items: std_items,
        },
        Location::introduced(FileId(0)),
    );
    model.push_top_item(inc);

    let items = parse_into(&mut model, &mut ctx, source, name)?;
    for item in items {
        model.push_top_item(item);
    }

    typecheck::run(&mut model)?;
    Ok(model)
}

struct ParseCtx {
    included: HashSet<String>,
    base_dir: Option<PathBuf>,
}

fn parse_into(
    model: &mut Model,
    ctx: &mut ParseCtx,
    source: &str,
    file_name: &str,
) -> Result<Vec<ItemId>> {
    let tokens = Lexer::new(source, file_name).tokenize()?;
    let file = model.add_file(file_name);
    let mut parser = Parser {
        tokens,
        pos: 0,
        file,
        file_name: file_name.to_string(),
        from_stdlib: file_name == "<std>/stdlib.mzn",
        model,
        ctx,
    };
    parser.items()
}

struct Parser<'m> {
    tokens: Vec<Token>,
    pos: usize,
    file: FileId,
    file_name: String,
    from_stdlib: bool,
    model: &'m mut Model,
    ctx: &'m mut ParseCtx,
}

impl Parser<'_> {
    // ------------------------------------------------------------------
    // Token plumbing
    // ------------------------------------------------------------------

    fn cur(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn cur_kind(&self) -> &TokKind {
        &self.cur().kind
    }

    fn at(&self, kind: &TokKind) -> bool {
        self.cur_kind() == kind
    }

    fn bump(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, kind: &TokKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokKind, what: &str) -> Result<Token> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.err_here(format!("expected {what}")))
        }
    }

    fn err_here(&self, message: impl Into<String>) -> Error {
        let t = self.cur();
        Error::parse(&self.file_name, t.line, t.col, message)
    }

    fn tok_loc(&self, tok: &Token) -> Location {
        Location::new(self.file, tok.line, tok.col, tok.end_line, tok.end_col)
    }

    fn loc_between(&self, start: &Token, end: &Token) -> Location {
        Location::new(self.file, start.line, start.col, end.end_line, end.end_col)
    }

    fn prev_tok(&self) -> Token {
        self.tokens[self.pos.saturating_sub(1)].clone()
    }

    fn alloc(&mut self, kind: ExprKind, loc: Location) -> ExprId {
        self.model.alloc_expr(kind, Type::unknown(), loc)
    }

    fn expr_loc(&self, id: ExprId) -> Location {
        self.model.loc(id)
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    fn items(&mut self) -> Result<Vec<ItemId>> {
        let mut items = Vec::new();
        while !self.at(&TokKind::Eof) {
            if self.eat(&TokKind::Semi) {
                continue;
            }
            items.push(self.item()?);
            if !self.at(&TokKind::Eof) {
                self.expect(&TokKind::Semi, "';' after item")?;
            }
        }
        Ok(items)
    }

    fn item(&mut self) -> Result<ItemId> {
        match self.cur_kind().clone() {
            TokKind::KwInclude => self.include_item(),
            TokKind::KwConstraint => self.constraint_item(),
            TokKind::KwSolve => self.solve_item(),
            TokKind::KwOutput => self.output_item(),
            TokKind::KwFunction | TokKind::KwPredicate | TokKind::KwTest | TokKind::KwAnnotation => {
                self.function_item()
            }
            TokKind::Ident(name)
                if self.tokens.get(self.pos + 1).map(|t| &t.kind) == Some(&TokKind::Eq) =>
            {
                let start = self.bump();
                self.bump(); // '='
                let rhs = self.expr()?;
                let loc = self.loc_between(&start, &self.prev_tok());
                Ok(self
                    .model
                    .alloc_item(ItemKind::Assign { name, rhs, decl: None }, loc))
            }
            _ => self.vardecl_item(),
        }
    }

    fn include_item(&mut self) -> Result<ItemId> {
        let start = self.bump(); // 'include'
        let tok = self.bump();
        let TokKind::StringLit(ref path) = tok.kind else {
            return Err(self.err_here("expected string literal after 'include'"));
        };
        let path = path.clone();
        let loc = self.loc_between(&start, &tok);

        if self.ctx.included.contains(&path) {
            return Ok(self.model.alloc_item(
                ItemKind::Include {
                    path: path.clone(),
                    resolved: String::new(),
                    items: vec![],
                },
                loc,
            ));
        }
        self.ctx.included.insert(path.clone());

        let (resolved, source) = self.resolve_include(&path)?;
        let items = parse_into(self.model, self.ctx, &source, &resolved)?;
        Ok(self.model.alloc_item(
            ItemKind::Include {
                path,
                resolved,
                items,
            },
            loc,
        ))
    }

    fn resolve_include(&self, path: &str) -> Result<(String, String)> {
        if let Some(src) = stdlib::lookup(path) {
            return Ok((format!("{STD_PREFIX}{path}"), src.to_string()));
        }
        if let Some(base) = &self.ctx.base_dir {
            let candidate = base.join(path);
            if candidate.is_file() {
                let src = std::fs::read_to_string(&candidate)?;
                return Ok((candidate.to_string_lossy().into_owned(), src));
            }
        }
        Err(Error::UnresolvedInclude(path.to_string()))
    }

    fn constraint_item(&mut self) -> Result<ItemId> {
        let start = self.bump(); // 'constraint'
        let expr = self.expr()?;
        let loc = self.loc_between(&start, &self.prev_tok());
        Ok(self.model.alloc_item(ItemKind::Constraint { expr }, loc))
    }

    fn output_item(&mut self) -> Result<ItemId> {
        let start = self.bump(); // 'output'
        let expr = self.expr()?;
        let loc = self.loc_between(&start, &self.prev_tok());
        Ok(self.model.alloc_item(ItemKind::Output { expr }, loc))
    }

    fn solve_item(&mut self) -> Result<ItemId> {
        let start = self.bump(); // 'solve'
        let mut anns = Vec::new();
        while self.eat(&TokKind::DoubleColon) {
            anns.push(self.unary_expr()?);
        }
        let (goal, objective) = match self.cur_kind().clone() {
            TokKind::KwSatisfy => {
                self.bump();
                (SolveGoal::Satisfy, None)
            }
            TokKind::KwMinimize => {
                self.bump();
                (SolveGoal::Minimize, Some(self.expr()?))
            }
            TokKind::KwMaximize => {
                self.bump();
                (SolveGoal::Maximize, Some(self.expr()?))
            }
            _ => return Err(self.err_here("expected 'satisfy', 'minimize' or 'maximize'")),
        };
        let loc = self.loc_between(&start, &self.prev_tok());
        Ok(self.model.alloc_item(
            ItemKind::Solve {
                goal,
                objective,
                anns,
            },
            loc,
        ))
    }

    fn vardecl_item(&mut self) -> Result<ItemId> {
        let decl = self.var_decl(true)?;
        let loc = self.expr_loc(decl);
        Ok(self.model.alloc_item(ItemKind::VarDecl { decl }, loc))
    }

    /// `typeinst ':' ident anns? ('=' expr)?`.
    ///
    /// For top-level declarations and parameters the node's location is cut
    /// at the identifier; `let`-local declarations span their RHS as well.
    fn var_decl(&mut self, toplevel: bool) -> Result<ExprId> {
        let start = self.cur().clone();
        let ti = self.type_inst()?;
        self.expect(&TokKind::Colon, "':' in declaration")?;
        let name_tok = self.bump();
        let TokKind::Ident(name) = name_tok.kind.clone() else {
            return Err(self.err_here("expected identifier in declaration"));
        };
        let mut anns = Vec::new();
        while self.eat(&TokKind::DoubleColon) {
            anns.push(self.unary_expr()?);
        }
        let rhs = if self.eat(&TokKind::Eq) {
            Some(self.expr()?)
        } else {
            None
        };
        let loc = if toplevel || rhs.is_none() {
            self.loc_between(&start, &name_tok)
        } else {
            self.loc_between(&start, &self.prev_tok())
        };
        Ok(self.alloc(
            ExprKind::VarDecl {
                ti,
                name,
                rhs,
                anns,
                toplevel,
            },
            loc,
        ))
    }

    fn function_item(&mut self) -> Result<ItemId> {
        let start = self.bump();
        let (return_ti, name_tok) = match start.kind {
            TokKind::KwFunction => {
                let ti = self.type_inst()?;
                self.expect(&TokKind::Colon, "':' after function return type")?;
                (ti, self.bump())
            }
            TokKind::KwPredicate => {
                let loc = Location::introduced(self.file);
                let ti = self.model.alloc_expr(
                    ExprKind::TypeInst {
                        ranges: vec![],
                        domain: None,
                    },
                    Type::var(crate::ast::BaseType::Bool),
                    loc,
                );
                (ti, self.bump())
            }
            TokKind::KwTest => {
                let loc = Location::introduced(self.file);
                let ti = self.model.alloc_expr(
                    ExprKind::TypeInst {
                        ranges: vec![],
                        domain: None,
                    },
                    Type::par(crate::ast::BaseType::Bool),
                    loc,
                );
                (ti, self.bump())
            }
            TokKind::KwAnnotation => {
                let loc = Location::introduced(self.file);
                let ti = self.model.alloc_expr(
                    ExprKind::TypeInst {
                        ranges: vec![],
                        domain: None,
                    },
                    Type::par(crate::ast::BaseType::Ann),
                    loc,
                );
                (ti, self.bump())
            }
            _ => unreachable!("function_item called on non-function keyword"),
        };
        let TokKind::Ident(name) = name_tok.kind.clone() else {
            return Err(self.err_here("expected function name"));
        };

        let mut params = Vec::new();
        if self.eat(&TokKind::LParen) {
            if !self.at(&TokKind::RParen) {
                loop {
                    params.push(self.var_decl(false)?);
                    if !self.eat(&TokKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(&TokKind::RParen, "')' after parameters")?;
        }

        let body = if self.eat(&TokKind::Eq) {
            Some(self.expr()?)
        } else {
            None
        };

        let loc = self.loc_between(&start, &self.prev_tok());
        let item = self.model.alloc_item(
            ItemKind::Function {
                name: name.clone(),
                params,
                return_ti,
                body,
                from_stdlib: self.from_stdlib,
            },
            loc,
        );
        self.model.register_function(&name, item);
        Ok(item)
    }

    // ------------------------------------------------------------------
    // Type-insts
    // ------------------------------------------------------------------

    fn type_inst(&mut self) -> Result<ExprId> {
        let start = self.cur().clone();
        if self.at(&TokKind::KwArray) {
            self.bump();
            self.expect(&TokKind::LBracket, "'[' after 'array'")?;
            let mut ranges = Vec::new();
            loop {
                ranges.push(self.ti_range()?);
                if !self.eat(&TokKind::Comma) {
                    break;
                }
            }
            self.expect(&TokKind::RBracket, "']' after array ranges")?;
            self.expect(&TokKind::KwOf, "'of' after array ranges")?;
            let elem = self.base_type_inst()?;
            let elem_ty = self.model.ty(elem);
            let domain = self.model.ti_domain(elem);
            let loc = self.loc_between(&start, &self.prev_tok());
            let dim = ranges.len() as u8;
            let id = self.alloc(ExprKind::TypeInst { ranges, domain }, loc);
            self.model.expr_mut(id).ty = elem_ty.with_dim(dim);
            return Ok(id);
        }
        self.base_type_inst()
    }

    fn ti_range(&mut self) -> Result<ExprId> {
        use crate::ast::{BaseType, SetType};
        if self.at(&TokKind::KwInt) {
            let tok = self.bump();
            let loc = self.tok_loc(&tok);
            let id = self.alloc(
                ExprKind::TypeInst {
                    ranges: vec![],
                    domain: None,
                },
                loc,
            );
            self.model.expr_mut(id).ty = Type::par(BaseType::Int).with_set(SetType::Set);
            return Ok(id);
        }
        let expr = self.expr()?;
        let loc = self.expr_loc(expr);
        let id = self.alloc(
            ExprKind::TypeInst {
                ranges: vec![],
                domain: Some(expr),
            },
            loc,
        );
        self.model.expr_mut(id).ty = Type::par(BaseType::Int).with_set(SetType::Set);
        Ok(id)
    }

    fn base_type_inst(&mut self) -> Result<ExprId> {
        use crate::ast::{BaseType, Inst, SetType};
        let start = self.cur().clone();

        let inst = if self.eat(&TokKind::KwVar) {
            Inst::Var
        } else {
            self.eat(&TokKind::KwPar);
            Inst::Par
        };

        let set = if self.at(&TokKind::KwSet) {
            self.bump();
            self.expect(&TokKind::KwOf, "'of' after 'set'")?;
            SetType::Set
        } else {
            SetType::Plain
        };

        let (base, domain) = match self.cur_kind().clone() {
            TokKind::KwInt => {
                self.bump();
                (BaseType::Int, None)
            }
            TokKind::KwFloat => {
                self.bump();
                (BaseType::Float, None)
            }
            TokKind::KwBool => {
                self.bump();
                (BaseType::Bool, None)
            }
            TokKind::KwString => {
                self.bump();
                (BaseType::Str, None)
            }
            TokKind::KwAnn => {
                self.bump();
                (BaseType::Ann, None)
            }
            _ => {
                // A domain expression; its base type is refined by the type
                // checker (float ranges, set-typed identifiers).
                let dom = self.expr()?;
                (BaseType::Int, Some(dom))
            }
        };

        let loc = self.loc_between(&start, &self.prev_tok());
        let id = self.alloc(ExprKind::TypeInst { ranges: vec![], domain }, loc);
        self.model.expr_mut(id).ty = Type {
            base,
            set,
            dim: 0,
            inst,
            present: true,
        };
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn expr(&mut self) -> Result<ExprId> {
        self.binary_expr(0)
    }

    fn binop_at(&self, min_prec: u8) -> Option<(BinOp, u8)> {
        let (op, prec) = match self.cur_kind() {
            TokKind::DoubleArrow => (BinOp::Equiv, 1),
            TokKind::Arrow => (BinOp::Impl, 2),
            TokKind::LeftArrow => (BinOp::RImpl, 2),
            TokKind::Or => (BinOp::Or, 3),
            TokKind::KwXor => (BinOp::Xor, 3),
            TokKind::And => (BinOp::And, 4),
            TokKind::Eq | TokKind::EqEq => (BinOp::Eq, 5),
            TokKind::Neq => (BinOp::Neq, 5),
            TokKind::Lt => (BinOp::Lt, 5),
            TokKind::Leq => (BinOp::Leq, 5),
            TokKind::Gt => (BinOp::Gt, 5),
            TokKind::Geq => (BinOp::Geq, 5),
            TokKind::KwIn => (BinOp::In, 5),
            TokKind::KwSubset => (BinOp::Subset, 5),
            TokKind::KwSuperset => (BinOp::Superset, 5),
            TokKind::KwUnion => (BinOp::Union, 6),
            TokKind::KwDiff => (BinOp::Diff, 6),
            TokKind::KwSymdiff => (BinOp::SymDiff, 6),
            TokKind::DotDot => (BinOp::DotDot, 7),
            TokKind::Plus => (BinOp::Plus, 8),
            TokKind::Minus => (BinOp::Minus, 8),
            TokKind::Star => (BinOp::Mult, 9),
            TokKind::Slash => (BinOp::Div, 9),
            TokKind::KwDiv => (BinOp::IDiv, 9),
            TokKind::KwMod => (BinOp::Mod, 9),
            TokKind::KwIntersect => (BinOp::Intersect, 9),
            TokKind::Caret => (BinOp::Pow, 10),
            TokKind::PlusPlus => (BinOp::PlusPlus, 11),
            _ => return None,
        };
        (prec >= min_prec).then_some((op, prec))
    }

    fn binary_expr(&mut self, min_prec: u8) -> Result<ExprId> {
        let mut lhs = self.unary_expr()?;
        while let Some((op, prec)) = self.binop_at(min_prec) {
            self.bump();
            let rhs = self.binary_expr(prec + 1)?;
            let loc = self.expr_loc(lhs).span_to(self.expr_loc(rhs));
            lhs = self.alloc(ExprKind::BinOp { op, lhs, rhs }, loc);
        }
        Ok(lhs)
    }

    fn unary_expr(&mut self) -> Result<ExprId> {
        let op = match self.cur_kind() {
            TokKind::KwNot => Some(UnOp::Not),
            TokKind::Minus => Some(UnOp::Minus),
            TokKind::Plus => Some(UnOp::Plus),
            _ => None,
        };
        if let Some(op) = op {
            let tok = self.bump();
            let operand = self.unary_expr()?;
            let loc = self.tok_loc(&tok).span_to(self.expr_loc(operand));
            return Ok(self.alloc(ExprKind::UnOp { op, operand }, loc));
        }
        self.postfix_expr()
    }

    fn postfix_expr(&mut self) -> Result<ExprId> {
        let mut expr = self.atom()?;
        while self.at(&TokKind::LBracket) {
            self.bump();
            let mut idx = Vec::new();
            if !self.at(&TokKind::RBracket) {
                loop {
                    idx.push(self.expr()?);
                    if !self.eat(&TokKind::Comma) {
                        break;
                    }
                }
            }
            let close = self.expect(&TokKind::RBracket, "']' after array access")?;
            let loc = self.expr_loc(expr).span_to(self.tok_loc(&close));
            expr = self.alloc(ExprKind::ArrayAccess { array: expr, idx }, loc);
        }
        Ok(expr)
    }

    fn atom(&mut self) -> Result<ExprId> {
        match self.cur_kind().clone() {
            TokKind::IntLit(v) => {
                let tok = self.bump();
                let loc = self.tok_loc(&tok);
                Ok(self.alloc(ExprKind::IntLit(v), loc))
            }
            TokKind::FloatLit(v) => {
                let tok = self.bump();
                let loc = self.tok_loc(&tok);
                Ok(self.alloc(ExprKind::FloatLit(v), loc))
            }
            TokKind::KwTrue => {
                let tok = self.bump();
                let loc = self.tok_loc(&tok);
                Ok(self.alloc(ExprKind::BoolLit(true), loc))
            }
            TokKind::KwFalse => {
                let tok = self.bump();
                let loc = self.tok_loc(&tok);
                Ok(self.alloc(ExprKind::BoolLit(false), loc))
            }
            TokKind::StringLit(s) => {
                let tok = self.bump();
                let loc = self.tok_loc(&tok);
                Ok(self.alloc(ExprKind::StringLit(s), loc))
            }
            TokKind::Ident(name) => self.ident_or_call(name),
            TokKind::LParen => {
                self.bump();
                let inner = self.expr()?;
                self.expect(&TokKind::RParen, "')'")?;
                // Parentheses are grouping only; the inner span is kept.
                Ok(inner)
            }
            TokKind::LBrace => self.set_like(),
            TokKind::LBracket => self.array_like(),
            TokKind::KwIf => self.if_then_else(),
            TokKind::KwLet => self.let_expr(),
            _ => Err(self.err_here("expected expression")),
        }
    }

    fn ident_or_call(&mut self, name: String) -> Result<ExprId> {
        let ident = self.bump();
        if !self.at(&TokKind::LParen) {
            let loc = self.tok_loc(&ident);
            return Ok(self.alloc(ExprKind::Id { name, decl: None }, loc));
        }
        self.bump(); // '('

        // Generator-call syntax: `sum(i in 1..5)(expr)`.
        let snapshot = self.pos;
        if let Some(generators) = self.try_generators()? {
            let close_gens = self.expect(&TokKind::RParen, "')' after generators")?;
            if self.at(&TokKind::LParen) {
                self.bump();
                let body = self.expr()?;
                let close = self.expect(&TokKind::RParen, "')' after generator call body")?;
                let loc = self.tok_loc(&ident).span_to(self.tok_loc(&close));
                let comp_loc = self.tok_loc(&ident).span_to(self.tok_loc(&close));
                let comp = self.alloc(
                    ExprKind::Comprehension {
                        generators,
                        body,
                        is_set: false,
                    },
                    comp_loc,
                );
                return Ok(self.alloc(
                    ExprKind::Call {
                        name,
                        args: vec![comp],
                        decl: None,
                    },
                    loc,
                ));
            }
            // `f(i in s)` without a body part is a plain call whose argument
            // is an `in` binop; re-parse it as such.
            let _ = close_gens;
            self.pos = snapshot;
        } else {
            self.pos = snapshot;
        }

        let mut args = Vec::new();
        if !self.at(&TokKind::RParen) {
            loop {
                args.push(self.expr()?);
                if !self.eat(&TokKind::Comma) {
                    break;
                }
            }
        }
        let close = self.expect(&TokKind::RParen, "')' after call arguments")?;
        let loc = self.tok_loc(&ident).span_to(self.tok_loc(&close));
        Ok(self.alloc(
            ExprKind::Call {
                name,
                args,
                decl: None,
            },
            loc,
        ))
    }

    /// Attempt to parse a generator list `x, y in e where w, ...`; returns
    /// `None` (with the position untouched by the caller) when the tokens do
    /// not form one.
    fn try_generators(&mut self) -> Result<Option<Vec<Generator>>> {
        let snapshot = self.pos;
        let mut generators = Vec::new();
        loop {
            let mut decls = Vec::new();
            loop {
                let TokKind::Ident(name) = self.cur_kind().clone() else {
                    self.pos = snapshot;
                    return Ok(None);
                };
                let tok = self.bump();
                let loc = self.tok_loc(&tok);
                let ti = self.model.alloc_expr(
                    ExprKind::TypeInst {
                        ranges: vec![],
                        domain: None,
                    },
                    Type::unknown(),
                    Location::introduced(self.file),
                );
                let decl = self.alloc(
                    ExprKind::VarDecl {
                        ti,
                        name,
                        rhs: None,
                        anns: vec![],
                        toplevel: false,
                    },
                    loc,
                );
                decls.push(decl);
                if !self.eat(&TokKind::Comma) {
                    break;
                }
            }
            if !self.eat(&TokKind::KwIn) {
                self.pos = snapshot;
                return Ok(None);
            }
            let in_expr = self.expr()?;
            let where_expr = if self.eat(&TokKind::KwWhere) {
                Some(self.expr()?)
            } else {
                None
            };
            generators.push(Generator {
                decls,
                in_expr,
                where_expr,
            });
            if !self.eat(&TokKind::Comma) {
                break;
            }
        }
        Ok(Some(generators))
    }

    fn set_like(&mut self) -> Result<ExprId> {
        let open = self.bump(); // '{'
        if self.at(&TokKind::RBrace) {
            let close = self.bump();
            let loc = self.loc_between(&open, &close);
            return Ok(self.alloc(ExprKind::SetLit { elems: vec![] }, loc));
        }
        let first = self.expr()?;
        if self.eat(&TokKind::Pipe) {
            let Some(generators) = self.try_generators()? else {
                return Err(self.err_here("expected generators after '|'"));
            };
            let close = self.expect(&TokKind::RBrace, "'}' after comprehension")?;
            let loc = self.loc_between(&open, &close);
            return Ok(self.alloc(
                ExprKind::Comprehension {
                    generators,
                    body: first,
                    is_set: true,
                },
                loc,
            ));
        }
        let mut elems = vec![first];
        while self.eat(&TokKind::Comma) {
            elems.push(self.expr()?);
        }
        let close = self.expect(&TokKind::RBrace, "'}' after set literal")?;
        let loc = self.loc_between(&open, &close);
        Ok(self.alloc(ExprKind::SetLit { elems }, loc))
    }

    fn array_like(&mut self) -> Result<ExprId> {
        let open = self.bump(); // '['
        if self.at(&TokKind::RBracket) {
            let close = self.bump();
            let loc = self.loc_between(&open, &close);
            return Ok(self.alloc(ExprKind::ArrayLit { elems: vec![] }, loc));
        }
        let first = self.expr()?;
        if self.eat(&TokKind::Pipe) {
            let Some(generators) = self.try_generators()? else {
                return Err(self.err_here("expected generators after '|'"));
            };
            let close = self.expect(&TokKind::RBracket, "']' after comprehension")?;
            let loc = self.loc_between(&open, &close);
            return Ok(self.alloc(
                ExprKind::Comprehension {
                    generators,
                    body: first,
                    is_set: false,
                },
                loc,
            ));
        }
        let mut elems = vec![first];
        while self.eat(&TokKind::Comma) {
            elems.push(self.expr()?);
        }
        let close = self.expect(&TokKind::RBracket, "']' after array literal")?;
        let loc = self.loc_between(&open, &close);
        Ok(self.alloc(ExprKind::ArrayLit { elems }, loc))
    }

    fn if_then_else(&mut self) -> Result<ExprId> {
        let start = self.bump(); // 'if'
        let mut branches = Vec::new();
        let cond = self.expr()?;
        self.expect(&TokKind::KwThen, "'then'")?;
        let then = self.expr()?;
        branches.push((cond, then));
        while self.eat(&TokKind::KwElseif) {
            let cond = self.expr()?;
            self.expect(&TokKind::KwThen, "'then' after 'elseif'")?;
            let then = self.expr()?;
            branches.push((cond, then));
        }
        let else_expr = if self.eat(&TokKind::KwElse) {
            Some(self.expr()?)
        } else {
            None
        };
        let end = self.expect(&TokKind::KwEndif, "'endif'")?;
        let loc = self.loc_between(&start, &end);
        Ok(self.alloc(
            ExprKind::IfThenElse {
                branches,
                else_expr,
            },
            loc,
        ))
    }

    fn let_expr(&mut self) -> Result<ExprId> {
        let start = self.bump(); // 'let'
        self.expect(&TokKind::LBrace, "'{' after 'let'")?;
        let mut items = Vec::new();
        while !self.at(&TokKind::RBrace) {
            if self.at(&TokKind::KwConstraint) {
                self.bump();
                items.push(self.expr()?);
            } else {
                items.push(self.var_decl(false)?);
            }
            if !self.eat(&TokKind::Comma) && !self.eat(&TokKind::Semi) {
                break;
            }
        }
        self.expect(&TokKind::RBrace, "'}' after let items")?;
        self.expect(&TokKind::KwIn, "'in' after let items")?;
        let body = self.expr()?;
        let loc = self.tok_loc(&start).span_to(self.expr_loc(body));
        Ok(self.alloc(ExprKind::Let { items, body }, loc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ExprCat;

    fn parse(src: &str) -> Model {
        parse_model_str(src, "testmodel").expect("model should parse")
    }

    fn find_decl(model: &Model, name: &str) -> ExprId {
        for i in 0..model.num_exprs() {
            let id = ExprId(i as u32);
            if let ExprKind::VarDecl { name: n, .. } = model.kind(id)
                && n == name
            {
                return id;
            }
        }
        panic!("no declaration named {name}");
    }

    #[test]
    fn toplevel_decl_location_is_cut_at_identifier() {
        let m = parse("var int: x = 4;");
        let d = find_decl(&m, "x");
        let loc = m.loc(d);
        assert_eq!((loc.first_line, loc.first_col, loc.last_col), (1, 1, 10));
        assert!(m.decl_rhs(d).is_some());
    }

    #[test]
    fn let_decl_location_spans_rhs() {
        let m = parse("int: x = let {int: y = 2} in 1;");
        let d = find_decl(&m, "y");
        let loc = m.loc(d);
        assert_eq!((loc.first_col, loc.last_col), (15, 24));
    }

    #[test]
    fn call_location_spans_through_closing_paren() {
        let m = parse(
            "include \"globals.mzn\";\narray[1..5] of var int: xs;\nconstraint alldifferent(xs);",
        );
        let call = (0..m.num_exprs())
            .map(|i| ExprId(i as u32))
            .find(|id| {
                matches!(m.kind(*id), ExprKind::Call { name, .. } if name == "alldifferent")
            })
            .expect("call should exist");
        let loc = m.loc(call);
        assert_eq!((loc.first_line, loc.first_col, loc.last_col), (3, 12, 27));
    }

    #[test]
    fn parenthesized_expressions_keep_inner_span() {
        let m = parse("var int: b;\nvar int: a;\nconstraint (a = 1) \\/ (b = 1);");
        let or = (0..m.num_exprs())
            .map(|i| ExprId(i as u32))
            .find(|id| matches!(m.kind(*id), ExprKind::BinOp { op: BinOp::Or, .. }))
            .expect("or should exist");
        let ExprKind::BinOp { lhs, rhs, .. } = m.kind(or) else {
            unreachable!()
        };
        assert_eq!(m.loc(*lhs).last_col, 17);
        assert_eq!(m.loc(*rhs).first_col, 24);
    }

    #[test]
    fn generator_call_parses_as_call_of_comprehension() {
        let m = parse("array[1..5] of var 0..1: as;\nconstraint 0 = sum(i in 1..5)(as[i]);");
        let sum = (0..m.num_exprs())
            .map(|i| ExprId(i as u32))
            .find(|id| matches!(m.kind(*id), ExprKind::Call { name, .. } if name == "sum"))
            .expect("sum call");
        let ExprKind::Call { args, .. } = m.kind(sum) else {
            unreachable!()
        };
        assert_eq!(args.len(), 1);
        assert_eq!(m.cat(args[0]), ExprCat::Comprehension);
        assert_eq!((m.loc(sum).first_col, m.loc(sum).last_col), (16, 36));
    }

    #[test]
    fn negative_range_binds_unary_minus_tighter_than_dotdot() {
        let m = parse("array[1..2] of var -1..1: as;");
        let dotdot = (0..m.num_exprs())
            .map(|i| ExprId(i as u32))
            .filter(|id| matches!(m.kind(*id), ExprKind::BinOp { op: BinOp::DotDot, .. }))
            .last()
            .expect("range");
        let ExprKind::BinOp { lhs, .. } = m.kind(dotdot) else {
            unreachable!()
        };
        assert_eq!(m.cat(*lhs), ExprCat::UnOp);
    }

    #[test]
    fn unknown_identifier_is_a_type_error() {
        let err = parse_model_str("constraint y = 2;", "testmodel").unwrap_err();
        assert!(matches!(err, Error::Type { .. }), "got {err:?}");
    }

    #[test]
    fn unresolved_include_errors() {
        let err = parse_model_str("include \"nope.mzn\";", "testmodel").unwrap_err();
        assert!(matches!(err, Error::UnresolvedInclude(_)));
    }
}
