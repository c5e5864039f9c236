//! Declarative AST pattern search.
//!
//! A [`SearchBuilder`] records a path of node matchers (each attached
//! `direct`ly under the previous match or anywhere `under` it), per-node and
//! global descent filters, and the set of top-level item kinds to start
//! from. [`SearchBuilder::build`] compiles that into an immutable [`Search`]
//! which hands out stateful searchers: [`ExprSearcher`] walks one expression
//! tree, [`ModelSearcher`] composes item iteration (optionally recursing
//! into included models) with expression search.
//!
//! The expression searcher is an iterative state machine over three stacks
//! (work, ancestor path, hits) rather than a recursive walk: hits must be
//! reportable mid-traversal together with the full ancestor chain, and the
//! traversal must resume exactly where it stopped.

use crate::ast::{BinOp, ExprCat, ExprId, ExprKind, ItemId, ItemKind, Model, UnOp};
use crate::error::{Error, Result};

/// Descent predicate: given a parent node and a candidate child, decide
/// whether the search may enter the child.
pub type ExprFilter = fn(&Model, ExprId, ExprId) -> bool;

/// Blocks descent into declaration nodes.
pub fn filter_out_vardecls(model: &Model, _root: ExprId, child: ExprId) -> bool {
    model.cat(child) != ExprCat::VarDecl
}

/// Blocks descent into the annotations of a declaration.
pub fn filter_out_annotations(model: &Model, root: ExprId, child: ExprId) -> bool {
    match model.kind(root) {
        ExprKind::VarDecl { anns, .. } => !anns.contains(&child),
        _ => true,
    }
}

/// Under an array access, descend only into the accessed array.
pub fn filter_arrayaccess_name(model: &Model, root: ExprId, child: ExprId) -> bool {
    match model.kind(root) {
        ExprKind::ArrayAccess { array, .. } => child == *array,
        _ => true,
    }
}

/// Under an array access, descend only into the index expressions.
pub fn filter_arrayaccess_idx(model: &Model, root: ExprId, child: ExprId) -> bool {
    match model.kind(root) {
        ExprKind::ArrayAccess { idx, .. } => idx.contains(&child),
        _ => true,
    }
}

/// Under a comprehension, descend only into its body.
pub fn filter_comprehension_body(model: &Model, root: ExprId, child: ExprId) -> bool {
    match model.kind(root) {
        ExprKind::Comprehension { body, .. } => child == *body,
        _ => true,
    }
}

/// What a single matcher position accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeTarget {
    Cat(ExprCat),
    Bin(BinOp),
    Un(UnOp),
}

impl From<ExprCat> for NodeTarget {
    fn from(cat: ExprCat) -> Self {
        NodeTarget::Cat(cat)
    }
}

impl From<BinOp> for NodeTarget {
    fn from(op: BinOp) -> Self {
        NodeTarget::Bin(op)
    }
}

impl From<UnOp> for NodeTarget {
    fn from(op: UnOp) -> Self {
        NodeTarget::Un(op)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attach {
    Direct,
    Under,
}

#[derive(Clone)]
struct SearchNode {
    attach: Attach,
    target: NodeTarget,
    capturable: bool,
    filter: Option<ExprFilter>,
}

impl SearchNode {
    fn matches(&self, model: &Model, id: ExprId) -> bool {
        match self.target {
            NodeTarget::Cat(cat) => model.cat(id) == cat,
            NodeTarget::Bin(op) => {
                matches!(model.kind(id), ExprKind::BinOp { op: o, .. } if *o == op)
            }
            NodeTarget::Un(op) => {
                matches!(model.kind(id), ExprKind::UnOp { op: o, .. } if *o == op)
            }
        }
    }

    fn is_under(&self) -> bool {
        self.attach == Attach::Under
    }

    fn is_direct(&self) -> bool {
        self.attach == Attach::Direct
    }
}

/// Which top-level item kinds (and which sub-parts of multi-part items) are
/// entry points for traversal.
#[derive(Debug, Clone, Copy, Default)]
struct SearchLocs {
    include: bool,
    vardecl: bool,
    constraint: bool,
    solve: bool,
    output: bool,
    function_body: bool,
    function_params: bool,
    function_return: bool,
    assign_rhs: bool,
    assign_decl: bool,
}

impl SearchLocs {
    fn should_visit(&self, kind: &ItemKind) -> bool {
        match kind {
            ItemKind::Include { .. } => self.include,
            ItemKind::VarDecl { .. } => self.vardecl,
            ItemKind::Assign { .. } => self.assign_rhs || self.assign_decl,
            ItemKind::Constraint { .. } => self.constraint,
            ItemKind::Solve { .. } => self.solve,
            ItemKind::Output { .. } => self.output,
            ItemKind::Function { .. } => {
                self.function_body || self.function_params || self.function_return
            }
        }
    }
}

/// A compiled, reusable search specification.
pub struct Search {
    nodes: Vec<SearchNode>,
    locations: SearchLocs,
    global_filters: Vec<ExprFilter>,
    include_path: Option<Vec<String>>,
    recursive: bool,
}

impl Search {
    /// Start a search over a single expression tree.
    #[must_use]
    pub fn search_expr<'s, 'm>(&'s self, model: &'m Model, root: ExprId) -> ExprSearcher<'s, 'm> {
        assert!(
            !self.nodes.is_empty(),
            "expression search requires at least one matcher"
        );
        let mut searcher = ExprSearcher {
            nodes: &self.nodes,
            global_filters: &self.global_filters,
            model,
            path: Vec::new(),
            dfs: Vec::new(),
            hits: Vec::with_capacity(self.nodes.len()),
            nodes_pos: 0,
        };
        searcher.new_search(root);
        searcher
    }

    /// Start a search over the top-level items of a model.
    #[must_use]
    pub fn search_model<'s, 'm>(&'s self, model: &'m Model) -> ModelSearcher<'s, 'm> {
        let expr_searcher = (!self.nodes.is_empty()).then(|| ExprSearcher {
            nodes: &self.nodes,
            global_filters: &self.global_filters,
            model,
            path: Vec::new(),
            dfs: Vec::new(),
            hits: Vec::with_capacity(self.nodes.len()),
            nodes_pos: 0,
        });
        ModelSearcher {
            search: self,
            model,
            frames: vec![Frame {
                items: model.top_items().to_vec(),
                pos: 0,
                fresh: true,
            }],
            current: None,
            item_child: 0,
            expr_searcher,
        }
    }

    /// The standard-library prefixes this search was configured with, if
    /// restricted to user-defined code.
    #[must_use]
    pub fn include_path(&self) -> Option<&[String]> {
        self.include_path.as_deref()
    }

    /// True when `file` is under one of the configured standard-library
    /// prefixes (always false for an unrestricted search).
    #[must_use]
    pub fn is_stdlib_file(&self, file: &str) -> bool {
        self.include_path
            .as_ref()
            .is_some_and(|prefixes| prefixes.iter().any(|p| file.starts_with(p.as_str())))
    }

    fn include_allowed(&self, resolved: &str) -> bool {
        if resolved.is_empty() {
            return false;
        }
        match &self.include_path {
            None => true,
            Some(prefixes) => !prefixes.iter().any(|p| resolved.starts_with(p.as_str())),
        }
    }
}

/// Fluent constructor for [`Search`].
#[derive(Default)]
pub struct SearchBuilder {
    nodes: Vec<SearchNode>,
    locations: SearchLocs,
    global_filters: Vec<ExprFilter>,
    include_path: Option<Vec<String>>,
    recursive: bool,
    spec_error: Option<String>,
}

impl SearchBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict model searches to user-defined code: includes whose resolved
    /// path begins with one of `standard_lib_prefixes` are not entered, and
    /// rules can query the prefixes to classify declarations.
    #[must_use]
    pub fn only_user_defined(mut self, standard_lib_prefixes: Vec<String>) -> Self {
        self.include_path = Some(standard_lib_prefixes);
        self
    }

    /// Whether model searches follow include items into the included model.
    #[must_use]
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    #[must_use]
    pub fn in_include(mut self) -> Self {
        self.locations.include = true;
        self
    }

    #[must_use]
    pub fn in_vardecl(mut self) -> Self {
        self.locations.vardecl = true;
        self
    }

    #[must_use]
    pub fn in_constraint(mut self) -> Self {
        self.locations.constraint = true;
        self
    }

    #[must_use]
    pub fn in_solve(mut self) -> Self {
        self.locations.solve = true;
        self
    }

    #[must_use]
    pub fn in_output(mut self) -> Self {
        self.locations.output = true;
        self
    }

    #[must_use]
    pub fn in_function_body(mut self) -> Self {
        self.locations.function_body = true;
        self
    }

    #[must_use]
    pub fn in_function_params(mut self) -> Self {
        self.locations.function_params = true;
        self
    }

    #[must_use]
    pub fn in_function_return(mut self) -> Self {
        self.locations.function_return = true;
        self
    }

    #[must_use]
    pub fn in_function(self) -> Self {
        self.in_function_body()
            .in_function_params()
            .in_function_return()
    }

    #[must_use]
    pub fn in_assign_rhs(mut self) -> Self {
        self.locations.assign_rhs = true;
        self
    }

    #[must_use]
    pub fn in_assign_decl(mut self) -> Self {
        self.locations.assign_decl = true;
        self
    }

    #[must_use]
    pub fn in_assign(self) -> Self {
        self.in_assign_rhs().in_assign_decl()
    }

    #[must_use]
    pub fn in_everywhere(self) -> Self {
        self.in_include()
            .in_vardecl()
            .in_constraint()
            .in_solve()
            .in_output()
            .in_function()
            .in_assign()
    }

    /// Add a filter applied at every descent, regardless of position.
    #[must_use]
    pub fn global_filter(mut self, f: ExprFilter) -> Self {
        self.global_filters.push(f);
        self
    }

    /// Add a descent filter to the most recently added matcher.
    #[must_use]
    pub fn filter(mut self, f: ExprFilter) -> Self {
        match self.nodes.last_mut() {
            Some(node) => node.filter = Some(f),
            None => {
                self.spec_error
                    .get_or_insert_with(|| "there is nothing to add a filter to".to_string());
            }
        }
        self
    }

    /// The next match must be a direct child of the previous one (or the
    /// search root itself for the first matcher).
    #[must_use]
    pub fn direct(mut self, target: impl Into<NodeTarget>) -> Self {
        self.nodes.push(SearchNode {
            attach: Attach::Direct,
            target: target.into(),
            capturable: false,
            filter: None,
        });
        self
    }

    /// The next match may be any descendant of the previous one.
    #[must_use]
    pub fn under(mut self, target: impl Into<NodeTarget>) -> Self {
        self.nodes.push(SearchNode {
            attach: Attach::Under,
            target: target.into(),
            capturable: false,
            filter: None,
        });
        self
    }

    /// Mark the most recently added matcher as capturable.
    #[must_use]
    pub fn capture(mut self) -> Self {
        match self.nodes.last_mut() {
            Some(node) => node.capturable = true,
            None => {
                self.spec_error
                    .get_or_insert_with(|| "there is nothing to capture".to_string());
            }
        }
        self
    }

    /// Compile the recorded specification.
    pub fn build(self) -> Result<Search> {
        if let Some(message) = self.spec_error {
            return Err(Error::SearchSpec(message));
        }
        Ok(Search {
            nodes: self.nodes,
            locations: self.locations,
            global_filters: self.global_filters,
            include_path: self.include_path,
            recursive: self.recursive,
        })
    }
}

// ============================================================================
// Expression search
// ============================================================================

/// Stateful depth-first matcher over one expression tree.
pub struct ExprSearcher<'s, 'm> {
    nodes: &'s [SearchNode],
    global_filters: &'s [ExprFilter],
    model: &'m Model,
    path: Vec<ExprId>,
    dfs: Vec<ExprId>,
    hits: Vec<ExprId>,
    nodes_pos: usize,
}

impl ExprSearcher<'_, '_> {
    /// Reset the searcher onto a new root expression.
    pub fn new_search(&mut self, root: ExprId) {
        self.abort();
        self.dfs.push(root);
    }

    /// Drop all traversal state.
    pub fn abort(&mut self) {
        self.dfs.clear();
        self.path.clear();
        self.hits.clear();
        self.nodes_pos = 0;
    }

    #[must_use]
    pub fn has_result(&self) -> bool {
        self.nodes_pos == self.nodes.len()
    }

    #[must_use]
    pub fn is_searching(&self) -> bool {
        !self.dfs.is_empty()
    }

    /// Advance to the next hit. Returns true when one was found; the hit can
    /// then be inspected through [`capture`](Self::capture) and
    /// [`current_path`](Self::current_path).
    pub fn next(&mut self) -> bool {
        while let Some(cur) = self.dfs.pop() {
            // Seeing the path top again means we are returning out of that
            // subtree. If it was the most recent hit, un-hit it; an `under`
            // matcher then resumes enumeration below it at the previous
            // position.
            if self.path.last() == Some(&cur) {
                self.path.pop();
                if self.hits.last() == Some(&cur) {
                    self.hits.pop();
                    self.nodes_pos -= 1;
                    if self.nodes[self.nodes_pos].is_under() {
                        self.path.push(cur);
                        self.dfs.push(cur);
                        self.queue_children(cur, self.nodes[self.nodes_pos].filter);
                    }
                }
                continue;
            }

            let target = &self.nodes[self.nodes_pos];
            if target.matches(self.model, cur) {
                self.hits.push(cur);
                self.nodes_pos += 1;
            } else if target.is_direct() {
                continue;
            }

            self.path.push(cur);
            self.dfs.push(cur);
            if self.has_result() {
                return true;
            }
            let hit_filter = if self.hits.last() == Some(&cur) {
                self.nodes[self.nodes_pos - 1].filter
            } else {
                None
            };
            self.queue_children(cur, hit_filter);
        }
        false
    }

    fn queue_children(&mut self, cur: ExprId, extra: Option<ExprFilter>) {
        for child in self.model.children(cur) {
            if self
                .global_filters
                .iter()
                .all(|f| f(self.model, cur, child))
                && extra.is_none_or(|f| f(self.model, cur, child))
            {
                self.dfs.push(child);
            }
        }
    }

    /// The node matched by the `n`-th capturable matcher of the current hit.
    ///
    /// # Panics
    ///
    /// Panics when no result is available or `n` is out of range; both are
    /// programming errors in the calling rule.
    #[must_use]
    pub fn capture(&self, n: usize) -> ExprId {
        assert!(
            self.has_result(),
            "capture() called without an available result"
        );
        let mut remaining = n;
        for (i, node) in self.nodes.iter().enumerate() {
            if node.capturable {
                if remaining == 0 {
                    return self.hits[i];
                }
                remaining -= 1;
            }
        }
        panic!("capture index {n} is larger than the number of captures");
    }

    /// Ancestor chain of the deepest hit, newest first (the hit itself is
    /// the first element, the search root the last).
    pub fn current_path(&self) -> impl Iterator<Item = ExprId> + '_ {
        self.path.iter().rev().copied()
    }
}

// ============================================================================
// Model search
// ============================================================================

struct Frame {
    items: Vec<ItemId>,
    pos: usize,
    fresh: bool,
}

/// Composes item iteration with expression search. With an empty matcher
/// path it yields the selected items themselves.
pub struct ModelSearcher<'s, 'm> {
    search: &'s Search,
    model: &'m Model,
    frames: Vec<Frame>,
    current: Option<ItemId>,
    item_child: usize,
    expr_searcher: Option<ExprSearcher<'s, 'm>>,
}

impl ModelSearcher<'_, '_> {
    fn is_items_only(&self) -> bool {
        self.expr_searcher.is_none()
    }

    /// Advance to the next hit (or, for an items-only search, the next
    /// selected item).
    pub fn next(&mut self) -> bool {
        if self.is_items_only() {
            return self.advance_item();
        }
        loop {
            let searching = self
                .expr_searcher
                .as_ref()
                .is_some_and(ExprSearcher::is_searching);
            if !searching && !self.advance_starting_point() {
                return false;
            }
            let searcher = self.expr_searcher.as_mut().expect("not items-only");
            searcher.next();
            if searcher.has_result() {
                return true;
            }
        }
    }

    /// The item containing the latest hit; `None` before the first hit and
    /// after exhaustion.
    #[must_use]
    pub fn cur_item(&self) -> Option<ItemId> {
        self.current
    }

    /// See [`ExprSearcher::capture`].
    #[must_use]
    pub fn capture(&self, n: usize) -> ExprId {
        self.expr_searcher
            .as_ref()
            .expect("capture() on an items-only search")
            .capture(n)
    }

    /// Ancestor chain of the deepest hit, newest first.
    pub fn current_path(&self) -> impl Iterator<Item = ExprId> + '_ {
        self.expr_searcher.iter().flat_map(|s| s.current_path())
    }

    /// Abort the current item entirely and continue with the next one.
    pub fn skip_item(&mut self) {
        if let Some(searcher) = &mut self.expr_searcher {
            searcher.abort();
        }
        self.item_child = usize::MAX;
    }

    fn advance_starting_point(&mut self) -> bool {
        loop {
            if self.current.is_some() && self.next_starting_point() {
                return true;
            }
            if !self.advance_item() {
                return false;
            }
        }
    }

    fn advance_item(&mut self) -> bool {
        let model = self.model;
        loop {
            let Some(top) = self.frames.last_mut() else {
                self.current = None;
                return false;
            };
            let next = if top.fresh { 0 } else { top.pos + 1 };
            top.fresh = false;
            if next >= top.items.len() {
                self.frames.pop();
                continue;
            }
            top.pos = next;
            let item = top.items[next];
            self.item_child = 0;

            if let ItemKind::Include {
                resolved, items, ..
            } = &model.item(item).kind
                && self.search.recursive
                && !items.is_empty()
                && self.search.include_allowed(resolved)
            {
                let child_items = items.clone();
                let visit = self.search.locations.include;
                self.frames.push(Frame {
                    items: child_items,
                    pos: 0,
                    fresh: true,
                });
                if visit {
                    self.current = Some(item);
                    return true;
                }
                continue;
            }

            if self.search.locations.should_visit(&model.item(item).kind) {
                self.current = Some(item);
                return true;
            }
        }
    }

    /// Select the next sub-expression of the current item as a fresh root
    /// for the expression searcher.
    fn next_starting_point(&mut self) -> bool {
        let Some(item) = self.current else {
            return false;
        };
        let model = self.model;
        let locs = &self.search.locations;
        loop {
            let (next, done): (Option<ExprId>, bool) = match &model.item(item).kind {
                ItemKind::Function {
                    params,
                    return_ti,
                    body,
                    ..
                } => match self.item_child {
                    0 => (if locs.function_body { *body } else { None }, false),
                    1 => (locs.function_return.then_some(*return_ti), false),
                    n => match n.checked_sub(2) {
                        Some(k) if k < params.len() => {
                            (locs.function_params.then(|| params[k]), false)
                        }
                        _ => (None, true),
                    },
                },
                ItemKind::Assign { rhs, decl, .. } => match self.item_child {
                    0 => (locs.assign_rhs.then_some(*rhs), false),
                    1 => (if locs.assign_decl { *decl } else { None }, false),
                    _ => (None, true),
                },
                ItemKind::VarDecl { decl } => match self.item_child {
                    0 => (locs.vardecl.then_some(*decl), false),
                    _ => (None, true),
                },
                ItemKind::Constraint { expr } => match self.item_child {
                    0 => (locs.constraint.then_some(*expr), false),
                    _ => (None, true),
                },
                ItemKind::Output { expr } => match self.item_child {
                    0 => (locs.output.then_some(*expr), false),
                    _ => (None, true),
                },
                ItemKind::Solve { objective, .. } => match self.item_child {
                    0 => (if locs.solve { *objective } else { None }, false),
                    _ => (None, true),
                },
                ItemKind::Include { .. } => (None, true),
            };
            if done {
                return false;
            }
            self.item_child += 1;
            if let Some(root) = next {
                self.expr_searcher
                    .as_mut()
                    .expect("not items-only")
                    .new_search(root);
                return true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_model_str;

    fn parse(src: &str) -> Model {
        parse_model_str(src, "testmodel").expect("model should parse")
    }

    fn constraint_root(model: &Model) -> ExprId {
        model
            .top_items()
            .iter()
            .find_map(|i| match &model.item(*i).kind {
                ItemKind::Constraint { expr } => Some(*expr),
                _ => None,
            })
            .expect("model should have a constraint")
    }

    fn count_hits(searcher: &mut ModelSearcher<'_, '_>) -> usize {
        let mut n = 0;
        while searcher.next() {
            n += 1;
        }
        n
    }

    #[test]
    fn single_node_tree_matches_both_attachments() {
        let model = parse("constraint 42;");
        let root = constraint_root(&model);
        for build in [
            SearchBuilder::new().direct(ExprCat::IntLit),
            SearchBuilder::new().under(ExprCat::IntLit),
        ] {
            let search = build.build().unwrap();
            let mut searcher = search.search_expr(&model, root);
            assert!(searcher.next());
            assert!(searcher.has_result());
            assert!(!searcher.next());
            assert!(!searcher.is_searching());
        }
    }

    #[test]
    #[should_panic(expected = "larger than the number of captures")]
    fn capture_without_capturable_matchers_panics() {
        let model = parse("constraint 42;");
        let root = constraint_root(&model);
        let search = SearchBuilder::new().direct(ExprCat::IntLit).build().unwrap();
        let mut searcher = search.search_expr(&model, root);
        assert!(searcher.next());
        let _ = searcher.capture(0);
    }

    #[test]
    fn non_matching_search_terminates() {
        let model = parse("constraint 1 + 2;");
        let root = constraint_root(&model);
        let search = SearchBuilder::new().under(ExprCat::UnOp).build().unwrap();
        let mut searcher = search.search_expr(&model, root);
        assert!(!searcher.next());
        assert!(!searcher.has_result());
        assert!(!searcher.is_searching());
    }

    // The shared shape for the path tests: `(1+5)+(3+15) = -420`, giving one
    // equality, three additions and an unary minus.
    fn big_tree() -> Model {
        parse("constraint (1+5)+(3+15) = -420;")
    }

    #[test]
    fn single_direct_matcher_matches_the_root_only() {
        let model = big_tree();
        let root = constraint_root(&model);
        let search = SearchBuilder::new()
            .direct(BinOp::Eq)
            .capture()
            .build()
            .unwrap();
        let mut searcher = search.search_expr(&model, root);
        assert!(searcher.next());
        assert_eq!(searcher.capture(0), root);
        assert!(!searcher.next());
    }

    #[test]
    fn single_under_matcher_enumerates_descendants() {
        let model = big_tree();
        let root = constraint_root(&model);
        let search = SearchBuilder::new()
            .under(BinOp::Plus)
            .capture()
            .build()
            .unwrap();
        let mut searcher = search.search_expr(&model, root);
        let mut hits = Vec::new();
        while searcher.next() {
            hits.push(searcher.capture(0));
        }
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn direct_after_under_only_matches_direct_children() {
        let model = big_tree();
        let root = constraint_root(&model);
        let search = SearchBuilder::new()
            .under(BinOp::Plus)
            .capture()
            .direct(BinOp::Plus)
            .capture()
            .build()
            .unwrap();
        let mut searcher = search.search_expr(&model, root);
        let mut hits = Vec::new();
        while searcher.next() {
            hits.push((searcher.capture(0), searcher.capture(1)));
        }
        // Only the outer addition has additions as direct children.
        assert_eq!(hits.len(), 2);
        let outer = hits[0].0;
        assert!(hits.iter().all(|(top, _)| *top == outer));
        assert!(hits[0].1 != hits[1].1);
    }

    #[test]
    fn under_under_re_enumerates_for_every_ancestor() {
        let model = big_tree();
        let root = constraint_root(&model);
        let search = SearchBuilder::new()
            .under(BinOp::Plus)
            .capture()
            .under(ExprCat::IntLit)
            .capture()
            .build()
            .unwrap();
        let mut searcher = search.search_expr(&model, root);
        let mut hits = Vec::new();
        while searcher.next() {
            hits.push((searcher.capture(0), searcher.capture(1)));
        }
        // Four literals under the outer addition, two under each inner one.
        assert_eq!(hits.len(), 8);
    }

    #[test]
    fn current_path_is_an_unbroken_ancestor_chain() {
        let model = big_tree();
        let root = constraint_root(&model);
        let search = SearchBuilder::new()
            .under(ExprCat::IntLit)
            .capture()
            .build()
            .unwrap();
        let mut searcher = search.search_expr(&model, root);
        assert!(searcher.next());
        let path: Vec<ExprId> = searcher.current_path().collect();
        assert_eq!(path[0], searcher.capture(0));
        assert_eq!(*path.last().unwrap(), root);
        for pair in path.windows(2) {
            assert!(model.children(pair[1]).contains(&pair[0]));
        }
    }

    #[test]
    fn items_only_search_yields_selected_items() {
        let model = parse(
            "var int: x;\nconstraint 1+2+3+4+5 = x;\nconstraint 1 = 2;\nsolve satisfy;",
        );
        let constraints = SearchBuilder::new().in_constraint().build().unwrap();
        assert_eq!(count_hits(&mut constraints.search_model(&model)), 2);

        let vars = SearchBuilder::new().in_vardecl().build().unwrap();
        assert_eq!(count_hits(&mut vars.search_model(&model)), 1);

        let all = SearchBuilder::new()
            .in_vardecl()
            .in_solve()
            .in_constraint()
            .build()
            .unwrap();
        assert_eq!(count_hits(&mut all.search_model(&model)), 4);
    }

    #[test]
    fn model_search_tracks_the_current_item() {
        let model = parse("constraint 1+2+3+4+5 = 6;");
        let search = SearchBuilder::new()
            .in_constraint()
            .direct(BinOp::Eq)
            .capture()
            .build()
            .unwrap();
        let mut searcher = search.search_model(&model);
        assert_eq!(searcher.cur_item(), None);
        assert!(searcher.next());
        assert!(searcher.cur_item().is_some());
        assert!(!searcher.next());
        assert_eq!(searcher.cur_item(), None);
    }

    #[test]
    fn empty_specification_yields_nothing() {
        let model = parse("constraint 1 = 2;");
        let search = SearchBuilder::new().build().unwrap();
        let mut searcher = search.search_model(&model);
        assert!(!searcher.next());
        assert_eq!(searcher.cur_item(), None);
    }

    #[test]
    fn function_sub_parts_are_independent_starting_points() {
        let model = parse("function var int: f(int: x, var int: y) = x = y;");

        let cases: [(SearchBuilder, usize); 4] = [
            (SearchBuilder::new().in_function(), 3),
            (SearchBuilder::new().in_function_return(), 1),
            (SearchBuilder::new().in_function_params(), 2),
            (SearchBuilder::new().in_function_body(), 0),
        ];
        for (builder, expected) in cases {
            let search = builder.under(ExprCat::TypeInst).build().unwrap();
            assert_eq!(count_hits(&mut search.search_model(&model)), expected);
        }
    }

    #[test]
    fn skip_item_aborts_the_current_item() {
        let model = parse("constraint 1 = 2;\nconstraint 3 = 4;");
        let search = SearchBuilder::new()
            .in_constraint()
            .under(ExprCat::IntLit)
            .capture()
            .build()
            .unwrap();
        let mut searcher = search.search_model(&model);
        assert!(searcher.next());
        let first_item = searcher.cur_item();
        searcher.skip_item();
        assert!(searcher.next());
        assert_ne!(searcher.cur_item(), first_item);
    }

    #[test]
    fn filter_restricts_descent_into_hit_children() {
        // Only the index side of an access may be entered, so the access
        // sitting in the array position is never reported.
        let model = parse("array[1..5] of var int: a;\nconstraint a[1][2] = 1;");
        let root = constraint_root(&model);

        let unfiltered = SearchBuilder::new()
            .under(ExprCat::ArrayAccess)
            .capture()
            .build()
            .unwrap();
        let mut searcher = unfiltered.search_expr(&model, root);
        let mut hits = 0;
        while searcher.next() {
            hits += 1;
        }
        assert_eq!(hits, 2);

        let filtered = SearchBuilder::new()
            .under(ExprCat::ArrayAccess)
            .capture()
            .filter(filter_arrayaccess_idx)
            .build()
            .unwrap();
        let mut searcher = filtered.search_expr(&model, root);
        let mut hits = 0;
        while searcher.next() {
            hits += 1;
        }
        assert_eq!(hits, 1);
    }

    #[test]
    fn builder_rejects_dangling_filters_and_captures() {
        assert!(matches!(
            SearchBuilder::new().filter(filter_out_vardecls).build(),
            Err(Error::SearchSpec(_))
        ));
        assert!(matches!(
            SearchBuilder::new().capture().build(),
            Err(Error::SearchSpec(_))
        ));
    }

    #[test]
    fn recursive_search_enters_user_includes_only() {
        let model = parse("include \"globals.mzn\";\nvar int: x;");
        // Not restricted to user-defined code: the globals catalogue is
        // traversed and its declarations show up.
        let unrestricted = SearchBuilder::new()
            .recursive(true)
            .in_vardecl()
            .build()
            .unwrap();
        let n_all = count_hits(&mut unrestricted.search_model(&model));

        let restricted = SearchBuilder::new()
            .recursive(true)
            .only_user_defined(crate::parser::std_include_paths())
            .in_vardecl()
            .build()
            .unwrap();
        let n_user = count_hits(&mut restricted.search_model(&model));

        assert_eq!(n_user, 1);
        assert!(n_all > n_user);
    }
}
