//! Typed abstract syntax tree for MiniZinc models.
//!
//! The AST is arena-based: a [`Model`] owns flat vectors of expression and
//! item nodes, and nodes refer to each other through [`ExprId`] / [`ItemId`]
//! indices. Rules and the search engine only ever hold ids plus a shared
//! `&Model`, so nothing in the linting phase can move or mutate the tree.

use std::collections::HashMap;
use std::fmt;

pub mod print;

/// Index of a source file registered in a [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

/// Index of an expression node in the model arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub u32);

/// Index of a top-level item in the model arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u32);

impl ExprId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ItemId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Source region of a node, with 1-based inclusive line/column bounds.
///
/// `introduced` marks nodes synthesized by the frontend (coercions, merged
/// assignments); those have no meaningful region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub file: FileId,
    pub first_line: u32,
    pub first_col: u32,
    pub last_line: u32,
    pub last_col: u32,
    pub introduced: bool,
}

impl Location {
    #[must_use]
    pub fn new(file: FileId, first_line: u32, first_col: u32, last_line: u32, last_col: u32) -> Self {
        Self {
            file,
            first_line,
            first_col,
            last_line,
            last_col,
            introduced: false,
        }
    }

    /// A location for nodes that do not come from any source text.
    #[must_use]
    pub fn introduced(file: FileId) -> Self {
        Self {
            file,
            first_line: 0,
            first_col: 0,
            last_line: 0,
            last_col: 0,
            introduced: true,
        }
    }

    /// Smallest location covering both `self` and `other`.
    #[must_use]
    pub fn span_to(self, other: Location) -> Location {
        let (first_line, first_col) =
            if (other.first_line, other.first_col) < (self.first_line, self.first_col) {
                (other.first_line, other.first_col)
            } else {
                (self.first_line, self.first_col)
            };
        let (last_line, last_col) =
            if (other.last_line, other.last_col) > (self.last_line, self.last_col) {
                (other.last_line, other.last_col)
            } else {
                (self.last_line, self.last_col)
            };
        Location {
            file: self.file,
            first_line,
            first_col,
            last_line,
            last_col,
            introduced: self.introduced || other.introduced,
        }
    }
}

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Bool,
    Int,
    Float,
    Str,
    Ann,
    /// Not yet determined (pre-typecheck, or an unresolvable polymorphic slot).
    Bot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SetType {
    #[default]
    Plain,
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Inst {
    #[default]
    Par,
    Var,
}

/// The type of an expression: base type, set-ness, array dimension,
/// par/var instantiation and presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Type {
    pub base: BaseType,
    pub set: SetType,
    pub dim: u8,
    pub inst: Inst,
    pub present: bool,
}

impl Type {
    #[must_use]
    pub const fn par(base: BaseType) -> Self {
        Self {
            base,
            set: SetType::Plain,
            dim: 0,
            inst: Inst::Par,
            present: true,
        }
    }

    #[must_use]
    pub const fn var(base: BaseType) -> Self {
        Self {
            base,
            set: SetType::Plain,
            dim: 0,
            inst: Inst::Var,
            present: true,
        }
    }

    #[must_use]
    pub const fn unknown() -> Self {
        Self::par(BaseType::Bot)
    }

    #[must_use]
    pub fn with_inst(mut self, inst: Inst) -> Self {
        self.inst = inst;
        self
    }

    #[must_use]
    pub fn with_dim(mut self, dim: u8) -> Self {
        self.dim = dim;
        self
    }

    #[must_use]
    pub fn with_set(mut self, set: SetType) -> Self {
        self.set = set;
        self
    }

    /// Element type of an array type.
    #[must_use]
    pub fn elem(mut self) -> Self {
        self.dim = 0;
        self
    }

    #[must_use]
    pub fn is_var(&self) -> bool {
        self.inst == Inst::Var
    }

    #[must_use]
    pub fn is_par(&self) -> bool {
        self.inst == Inst::Par
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        self.present
    }

    #[must_use]
    pub fn is_int(&self) -> bool {
        self.base == BaseType::Int && self.set == SetType::Plain && self.dim == 0
    }

    #[must_use]
    pub fn is_float(&self) -> bool {
        self.base == BaseType::Float && self.set == SetType::Plain && self.dim == 0
    }

    #[must_use]
    pub fn is_bool(&self) -> bool {
        self.base == BaseType::Bool && self.set == SetType::Plain && self.dim == 0
    }

    #[must_use]
    pub fn is_var_bool(&self) -> bool {
        self.is_bool() && self.is_var()
    }

    #[must_use]
    pub fn is_int_set(&self) -> bool {
        self.base == BaseType::Int && self.set == SetType::Set && self.dim == 0
    }

    #[must_use]
    pub fn is_ann(&self) -> bool {
        self.base == BaseType::Ann
    }
}

// ============================================================================
// Operators
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Plus,
    Minus,
    Mult,
    Div,
    IDiv,
    Mod,
    Pow,
    PlusPlus,
    Eq,
    Neq,
    Lt,
    Leq,
    Gt,
    Geq,
    In,
    Subset,
    Superset,
    Union,
    Diff,
    SymDiff,
    Intersect,
    DotDot,
    And,
    Or,
    Impl,
    RImpl,
    Equiv,
    Xor,
}

impl BinOp {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Plus => "+",
            BinOp::Minus => "-",
            BinOp::Mult => "*",
            BinOp::Div => "/",
            BinOp::IDiv => "div",
            BinOp::Mod => "mod",
            BinOp::Pow => "^",
            BinOp::PlusPlus => "++",
            BinOp::Eq => "=",
            BinOp::Neq => "!=",
            BinOp::Lt => "<",
            BinOp::Leq => "<=",
            BinOp::Gt => ">",
            BinOp::Geq => ">=",
            BinOp::In => "in",
            BinOp::Subset => "subset",
            BinOp::Superset => "superset",
            BinOp::Union => "union",
            BinOp::Diff => "diff",
            BinOp::SymDiff => "symdiff",
            BinOp::Intersect => "intersect",
            BinOp::DotDot => "..",
            BinOp::And => "/\\",
            BinOp::Or => "\\/",
            BinOp::Impl => "->",
            BinOp::RImpl => "<-",
            BinOp::Equiv => "<->",
            BinOp::Xor => "xor",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnOp {
    Not,
    Minus,
    Plus,
}

impl UnOp {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            UnOp::Not => "not",
            UnOp::Minus => "-",
            UnOp::Plus => "+",
        }
    }
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Expressions
// ============================================================================

/// Kind tag of an expression node, without its payload. This is what search
/// patterns match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprCat {
    IntLit,
    FloatLit,
    BoolLit,
    StringLit,
    Id,
    SetLit,
    ArrayLit,
    ArrayAccess,
    BinOp,
    UnOp,
    Call,
    Comprehension,
    IfThenElse,
    Let,
    VarDecl,
    TypeInst,
}

/// One `v in e` (or `v1, v2 in e where w`) generator of a comprehension.
#[derive(Debug, Clone)]
pub struct Generator {
    /// Implicitly declared iteration variables, one `VarDecl` expr each.
    pub decls: Vec<ExprId>,
    pub in_expr: ExprId,
    pub where_expr: Option<ExprId>,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    IntLit(i64),
    FloatLit(f64),
    BoolLit(bool),
    StringLit(String),
    Id {
        name: String,
        decl: Option<ExprId>,
    },
    SetLit {
        elems: Vec<ExprId>,
    },
    ArrayLit {
        elems: Vec<ExprId>,
    },
    ArrayAccess {
        array: ExprId,
        idx: Vec<ExprId>,
    },
    BinOp {
        op: BinOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    UnOp {
        op: UnOp,
        operand: ExprId,
    },
    Call {
        name: String,
        args: Vec<ExprId>,
        decl: Option<ItemId>,
    },
    Comprehension {
        generators: Vec<Generator>,
        body: ExprId,
        is_set: bool,
    },
    IfThenElse {
        /// `(condition, then-branch)` pairs: the `if` plus any `elseif`s.
        branches: Vec<(ExprId, ExprId)>,
        else_expr: Option<ExprId>,
    },
    Let {
        /// `VarDecl` exprs and constraint exprs, in declaration order.
        items: Vec<ExprId>,
        body: ExprId,
    },
    VarDecl {
        ti: ExprId,
        name: String,
        rhs: Option<ExprId>,
        anns: Vec<ExprId>,
        toplevel: bool,
    },
    /// A type-inst: `var 1..9`, `array[1..n] of var int`, `set of int`.
    /// For arrays, `ranges` holds one `TypeInst` expr per dimension and
    /// `domain` describes the element domain.
    TypeInst {
        ranges: Vec<ExprId>,
        domain: Option<ExprId>,
    },
}

impl ExprKind {
    #[must_use]
    pub fn cat(&self) -> ExprCat {
        match self {
            ExprKind::IntLit(_) => ExprCat::IntLit,
            ExprKind::FloatLit(_) => ExprCat::FloatLit,
            ExprKind::BoolLit(_) => ExprCat::BoolLit,
            ExprKind::StringLit(_) => ExprCat::StringLit,
            ExprKind::Id { .. } => ExprCat::Id,
            ExprKind::SetLit { .. } => ExprCat::SetLit,
            ExprKind::ArrayLit { .. } => ExprCat::ArrayLit,
            ExprKind::ArrayAccess { .. } => ExprCat::ArrayAccess,
            ExprKind::BinOp { .. } => ExprCat::BinOp,
            ExprKind::UnOp { .. } => ExprCat::UnOp,
            ExprKind::Call { .. } => ExprCat::Call,
            ExprKind::Comprehension { .. } => ExprCat::Comprehension,
            ExprKind::IfThenElse { .. } => ExprCat::IfThenElse,
            ExprKind::Let { .. } => ExprCat::Let,
            ExprKind::VarDecl { .. } => ExprCat::VarDecl,
            ExprKind::TypeInst { .. } => ExprCat::TypeInst,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExprData {
    pub kind: ExprKind,
    pub ty: Type,
    pub loc: Location,
}

// ============================================================================
// Items
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveGoal {
    Satisfy,
    Minimize,
    Maximize,
}

#[derive(Debug, Clone)]
pub enum ItemKind {
    Include {
        /// Path as written in the source.
        path: String,
        /// Resolved file name; stdlib files live under the `<std>/` prefix.
        resolved: String,
        /// Top-level items of the included file, resolved by the frontend.
        items: Vec<ItemId>,
    },
    VarDecl {
        decl: ExprId,
    },
    Assign {
        name: String,
        rhs: ExprId,
        decl: Option<ExprId>,
    },
    Constraint {
        expr: ExprId,
    },
    Solve {
        goal: SolveGoal,
        objective: Option<ExprId>,
        anns: Vec<ExprId>,
    },
    Output {
        expr: ExprId,
    },
    Function {
        name: String,
        params: Vec<ExprId>,
        return_ti: ExprId,
        body: Option<ExprId>,
        /// True for compiler builtins (declared in the embedded `stdlib.mzn`).
        from_stdlib: bool,
    },
}

#[derive(Debug, Clone)]
pub struct ItemData {
    pub kind: ItemKind,
    pub loc: Location,
}

// ============================================================================
// Model
// ============================================================================

/// A parsed, type-checked model together with everything it includes.
///
/// All nodes of all files live in the same arenas; the entry file's items are
/// listed in `top_items`, and each `Include` item carries the item list of
/// the file it pulled in.
#[derive(Debug, Default)]
pub struct Model {
    files: Vec<String>,
    exprs: Vec<ExprData>,
    items: Vec<ItemData>,
    top_items: Vec<ItemId>,
    functions: HashMap<String, Vec<ItemId>>,
}

impl Model {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, name: impl Into<String>) -> FileId {
        self.files.push(name.into());
        FileId((self.files.len() - 1) as u32)
    }

    #[must_use]
    pub fn file_name(&self, id: FileId) -> &str {
        &self.files[id.0 as usize]
    }

    pub fn alloc_expr(&mut self, kind: ExprKind, ty: Type, loc: Location) -> ExprId {
        self.exprs.push(ExprData { kind, ty, loc });
        ExprId((self.exprs.len() - 1) as u32)
    }

    pub fn alloc_item(&mut self, kind: ItemKind, loc: Location) -> ItemId {
        self.items.push(ItemData { kind, loc });
        ItemId((self.items.len() - 1) as u32)
    }

    pub fn push_top_item(&mut self, item: ItemId) {
        self.top_items.push(item);
    }

    #[must_use]
    pub fn expr(&self, id: ExprId) -> &ExprData {
        &self.exprs[id.index()]
    }

    pub fn expr_mut(&mut self, id: ExprId) -> &mut ExprData {
        &mut self.exprs[id.index()]
    }

    #[must_use]
    pub fn item(&self, id: ItemId) -> &ItemData {
        &self.items[id.index()]
    }

    pub fn item_mut(&mut self, id: ItemId) -> &mut ItemData {
        &mut self.items[id.index()]
    }

    #[must_use]
    pub fn kind(&self, id: ExprId) -> &ExprKind {
        &self.expr(id).kind
    }

    #[must_use]
    pub fn cat(&self, id: ExprId) -> ExprCat {
        self.expr(id).kind.cat()
    }

    #[must_use]
    pub fn ty(&self, id: ExprId) -> Type {
        self.expr(id).ty
    }

    #[must_use]
    pub fn loc(&self, id: ExprId) -> Location {
        self.expr(id).loc
    }

    /// Top-level items of the entry file.
    #[must_use]
    pub fn top_items(&self) -> &[ItemId] {
        &self.top_items
    }

    #[must_use]
    pub fn num_exprs(&self) -> usize {
        self.exprs.len()
    }

    #[must_use]
    pub fn num_items(&self) -> usize {
        self.items.len()
    }

    pub fn register_function(&mut self, name: &str, item: ItemId) {
        self.functions.entry(name.to_string()).or_default().push(item);
    }

    /// All function items registered under `name`, in registration order.
    #[must_use]
    pub fn functions_named(&self, name: &str) -> &[ItemId] {
        self.functions.get(name).map_or(&[], |v| v.as_slice())
    }

    /// Every direct structural child of `id`, each exactly once, in a fixed
    /// order. The node itself is never yielded.
    #[must_use]
    pub fn children(&self, id: ExprId) -> Vec<ExprId> {
        let mut out = Vec::new();
        match self.kind(id) {
            ExprKind::IntLit(_)
            | ExprKind::FloatLit(_)
            | ExprKind::BoolLit(_)
            | ExprKind::StringLit(_)
            | ExprKind::Id { .. } => {}
            ExprKind::SetLit { elems } | ExprKind::ArrayLit { elems } => {
                out.extend_from_slice(elems);
            }
            ExprKind::ArrayAccess { array, idx } => {
                out.push(*array);
                out.extend_from_slice(idx);
            }
            ExprKind::BinOp { lhs, rhs, .. } => {
                out.push(*lhs);
                out.push(*rhs);
            }
            ExprKind::UnOp { operand, .. } => out.push(*operand),
            ExprKind::Call { args, .. } => out.extend_from_slice(args),
            ExprKind::Comprehension {
                generators, body, ..
            } => {
                for g in generators {
                    out.extend_from_slice(&g.decls);
                    out.push(g.in_expr);
                    if let Some(w) = g.where_expr {
                        out.push(w);
                    }
                }
                out.push(*body);
            }
            ExprKind::IfThenElse {
                branches,
                else_expr,
            } => {
                for (cond, then) in branches {
                    out.push(*cond);
                    out.push(*then);
                }
                if let Some(e) = else_expr {
                    out.push(*e);
                }
            }
            ExprKind::Let { items, body } => {
                out.extend_from_slice(items);
                out.push(*body);
            }
            ExprKind::VarDecl { ti, rhs, anns, .. } => {
                out.push(*ti);
                out.extend_from_slice(anns);
                if let Some(r) = rhs {
                    out.push(*r);
                }
            }
            ExprKind::TypeInst { ranges, domain } => {
                out.extend_from_slice(ranges);
                if let Some(d) = domain {
                    out.push(*d);
                }
            }
        }
        out
    }

    /// Follows identifier right-hand sides: while `id` is an identifier whose
    /// declaration has a RHS, step to that RHS. Returns `None` when given an
    /// unresolved identifier or one with no RHS to follow.
    #[must_use]
    pub fn follow_id(&self, mut id: ExprId) -> Option<ExprId> {
        loop {
            match self.kind(id) {
                ExprKind::Id { decl, .. } => {
                    let decl = (*decl)?;
                    match self.kind(decl) {
                        ExprKind::VarDecl { rhs: Some(rhs), .. } => id = *rhs,
                        _ => return None,
                    }
                }
                _ => return Some(id),
            }
        }
    }

    /// Follows an identifier chain to the declaration at its end.
    #[must_use]
    pub fn follow_id_to_decl(&self, mut id: ExprId) -> Option<ExprId> {
        loop {
            match self.kind(id) {
                ExprKind::Id { decl, .. } => {
                    let decl = (*decl)?;
                    match self.kind(decl) {
                        ExprKind::VarDecl { rhs: Some(rhs), .. }
                            if matches!(self.kind(*rhs), ExprKind::Id { .. }) =>
                        {
                            id = *rhs;
                        }
                        ExprKind::VarDecl { .. } => return Some(decl),
                        _ => return None,
                    }
                }
                _ => return None,
            }
        }
    }

    /// Value-equal test against an integer literal.
    #[must_use]
    pub fn is_int_literal(&self, id: ExprId, v: i64) -> bool {
        matches!(self.kind(id), ExprKind::IntLit(x) if *x == v)
    }

    /// Value-equal test against a float literal.
    #[must_use]
    pub fn is_float_literal(&self, id: ExprId, v: f64) -> bool {
        matches!(self.kind(id), ExprKind::FloatLit(x) if *x == v)
    }

    /// True when the type-inst expression declares an array.
    #[must_use]
    pub fn ti_is_array(&self, ti: ExprId) -> bool {
        matches!(self.kind(ti), ExprKind::TypeInst { ranges, .. } if !ranges.is_empty())
    }

    #[must_use]
    pub fn ti_ranges(&self, ti: ExprId) -> &[ExprId] {
        match self.kind(ti) {
            ExprKind::TypeInst { ranges, .. } => ranges,
            _ => &[],
        }
    }

    #[must_use]
    pub fn ti_domain(&self, ti: ExprId) -> Option<ExprId> {
        match self.kind(ti) {
            ExprKind::TypeInst { domain, .. } => *domain,
            _ => None,
        }
    }

    /// Convenience accessors for `VarDecl` payloads. Panics on other kinds;
    /// callers are expected to have checked the node kind already.
    #[must_use]
    pub fn decl_ti(&self, decl: ExprId) -> ExprId {
        match self.kind(decl) {
            ExprKind::VarDecl { ti, .. } => *ti,
            _ => panic!("decl_ti on non-declaration node"),
        }
    }

    #[must_use]
    pub fn decl_rhs(&self, decl: ExprId) -> Option<ExprId> {
        match self.kind(decl) {
            ExprKind::VarDecl { rhs, .. } => *rhs,
            _ => panic!("decl_rhs on non-declaration node"),
        }
    }

    #[must_use]
    pub fn decl_name(&self, decl: ExprId) -> &str {
        match self.kind(decl) {
            ExprKind::VarDecl { name, .. } => name,
            _ => panic!("decl_name on non-declaration node"),
        }
    }

    #[must_use]
    pub fn decl_toplevel(&self, decl: ExprId) -> bool {
        match self.kind(decl) {
            ExprKind::VarDecl { toplevel, .. } => *toplevel,
            _ => false,
        }
    }

    /// The other operand of a binary operation, given one of its sides.
    #[must_use]
    pub fn other_side(&self, binop: ExprId, side: ExprId) -> Option<ExprId> {
        match self.kind(binop) {
            ExprKind::BinOp { lhs, rhs, .. } => {
                if *lhs == side {
                    Some(*rhs)
                } else if *rhs == side {
                    Some(*lhs)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Structural expression equality. Identifiers compare by declaration
    /// when both sides are resolved, by name otherwise.
    #[must_use]
    pub fn expr_equal(&self, a: ExprId, b: ExprId) -> bool {
        if a == b {
            return true;
        }
        match (self.kind(a), self.kind(b)) {
            (ExprKind::IntLit(x), ExprKind::IntLit(y)) => x == y,
            (ExprKind::FloatLit(x), ExprKind::FloatLit(y)) => x == y,
            (ExprKind::BoolLit(x), ExprKind::BoolLit(y)) => x == y,
            (ExprKind::StringLit(x), ExprKind::StringLit(y)) => x == y,
            (
                ExprKind::Id { name: na, decl: da },
                ExprKind::Id { name: nb, decl: db },
            ) => match (da, db) {
                (Some(da), Some(db)) => da == db,
                _ => na == nb,
            },
            (ExprKind::SetLit { elems: ea }, ExprKind::SetLit { elems: eb })
            | (ExprKind::ArrayLit { elems: ea }, ExprKind::ArrayLit { elems: eb }) => {
                ea.len() == eb.len()
                    && ea.iter().zip(eb).all(|(x, y)| self.expr_equal(*x, *y))
            }
            (
                ExprKind::ArrayAccess { array: aa, idx: ia },
                ExprKind::ArrayAccess { array: ab, idx: ib },
            ) => {
                self.expr_equal(*aa, *ab)
                    && ia.len() == ib.len()
                    && ia.iter().zip(ib).all(|(x, y)| self.expr_equal(*x, *y))
            }
            (
                ExprKind::BinOp {
                    op: oa,
                    lhs: la,
                    rhs: ra,
                },
                ExprKind::BinOp {
                    op: ob,
                    lhs: lb,
                    rhs: rb,
                },
            ) => oa == ob && self.expr_equal(*la, *lb) && self.expr_equal(*ra, *rb),
            (
                ExprKind::UnOp { op: oa, operand: ea },
                ExprKind::UnOp { op: ob, operand: eb },
            ) => oa == ob && self.expr_equal(*ea, *eb),
            (
                ExprKind::Call { name: na, args: aa, .. },
                ExprKind::Call { name: nb, args: ab, .. },
            ) => {
                na == nb
                    && aa.len() == ab.len()
                    && aa.iter().zip(ab).all(|(x, y)| self.expr_equal(*x, *y))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_model() -> (Model, ExprId, ExprId, ExprId) {
        let mut m = Model::new();
        let f = m.add_file("test");
        let loc = Location::new(f, 1, 1, 1, 1);
        let one = m.alloc_expr(ExprKind::IntLit(1), Type::par(BaseType::Int), loc);
        let two = m.alloc_expr(ExprKind::IntLit(2), Type::par(BaseType::Int), loc);
        let plus = m.alloc_expr(
            ExprKind::BinOp {
                op: BinOp::Plus,
                lhs: one,
                rhs: two,
            },
            Type::par(BaseType::Int),
            loc,
        );
        (m, one, two, plus)
    }

    #[test]
    fn children_yield_direct_subexpressions_only() {
        let (m, one, two, plus) = small_model();
        assert_eq!(m.children(plus), vec![one, two]);
        assert!(m.children(one).is_empty());
    }

    #[test]
    fn other_side_resolves_both_directions() {
        let (m, one, two, plus) = small_model();
        assert_eq!(m.other_side(plus, one), Some(two));
        assert_eq!(m.other_side(plus, two), Some(one));
        assert_eq!(m.other_side(plus, plus), None);
    }

    #[test]
    fn structural_equality_compares_by_value() {
        let (mut m, one, _, plus) = small_model();
        let f = FileId(0);
        let loc = Location::new(f, 2, 1, 2, 1);
        let one_b = m.alloc_expr(ExprKind::IntLit(1), Type::par(BaseType::Int), loc);
        let two_b = m.alloc_expr(ExprKind::IntLit(2), Type::par(BaseType::Int), loc);
        let plus_b = m.alloc_expr(
            ExprKind::BinOp {
                op: BinOp::Plus,
                lhs: one_b,
                rhs: two_b,
            },
            Type::par(BaseType::Int),
            loc,
        );
        assert!(m.expr_equal(one, one_b));
        assert!(m.expr_equal(plus, plus_b));
        assert!(!m.expr_equal(one, plus));
    }

    #[test]
    fn follow_id_steps_through_definitions() {
        let mut m = Model::new();
        let f = m.add_file("test");
        let loc = Location::new(f, 1, 1, 1, 1);
        let three = m.alloc_expr(ExprKind::IntLit(3), Type::par(BaseType::Int), loc);
        let ti = m.alloc_expr(
            ExprKind::TypeInst {
                ranges: vec![],
                domain: None,
            },
            Type::par(BaseType::Int),
            loc,
        );
        let decl = m.alloc_expr(
            ExprKind::VarDecl {
                ti,
                name: "n".into(),
                rhs: Some(three),
                anns: vec![],
                toplevel: true,
            },
            Type::par(BaseType::Int),
            loc,
        );
        let id = m.alloc_expr(
            ExprKind::Id {
                name: "n".into(),
                decl: Some(decl),
            },
            Type::par(BaseType::Int),
            loc,
        );
        assert_eq!(m.follow_id(id), Some(three));
        assert_eq!(m.follow_id_to_decl(id), Some(decl));
        assert_eq!(m.follow_id(three), Some(three));
    }
}
