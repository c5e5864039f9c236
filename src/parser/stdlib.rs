//! Embedded standard-library stubs.
//!
//! Declaration-only signatures for the builtins and global constraints the
//! linter needs to resolve. `stdlib.mzn` holds the compiler builtins (its
//! items are marked `from_stdlib`); `globals.mzn` holds the global
//! constraint catalogue a model pulls in with `include "globals.mzn"`.
//!
//! Signatures are par-neutral where MiniZinc overloads on instantiation;
//! the type checker instantiates a call's type from its arguments.

/// Builtins, implicitly included into every model.
pub const STDLIB_SOURCE: &str = r#"
function bool: forall(array[int] of bool: x);
function bool: exists(array[int] of bool: x);
function bool: xorall(array[int] of bool: x);
function int: sum(array[int] of int: x);
function int: product(array[int] of int: x);
function int: bool2int(bool: b);
function int: abs(int: x);
function int: min(int: x, int: y);
function int: max(int: x, int: y);
function int: length(array[int] of int: x);
function int: card(set of int: s);
function int: count(array[int] of int: x, int: y);
function set of int: index_set(array[int] of int: x);
function array[int] of int: array1d(array[int] of int: x);
function bool: assert(bool: b, string: msg, bool: arg);
function bool: index_sets_agree(array[int] of int: x, array[int] of int: y);
function string: show(int: x);
function string: concat(array[int] of string: s);
function string: join(string: sep, array[int] of string: s);
predicate element(var int: idx, array[int] of var int: arr, var int: v);
predicate redundant_constraint(var bool: b);
predicate implied_constraint(var bool: b);
predicate symmetry_breaking_constraint(var bool: b);

ann: input_order;
ann: first_fail;
ann: smallest;
ann: largest;
ann: indomain;
ann: indomain_min;
ann: indomain_max;
ann: indomain_median;
ann: indomain_split;
ann: indomain_random;
ann: complete;
ann: add_to_output;
function ann: int_search(array[int] of var int: x, ann: varchoice, ann: valchoice);
function ann: bool_search(array[int] of var bool: x, ann: varchoice, ann: valchoice);
function ann: seq_search(array[int] of ann: s);
"#;

/// Global constraints, available through `include "globals.mzn"`.
pub const GLOBALS_SOURCE: &str = r#"
predicate alldifferent(array[int] of var int: x);
predicate all_different(array[int] of var int: x);
predicate alldifferent_except_0(array[int] of var int: x);
predicate increasing(array[int] of var int: x);
predicate decreasing(array[int] of var int: x);
predicate strictly_increasing(array[int] of var int: x);
predicate strictly_decreasing(array[int] of var int: x);
predicate lex2(array[int, int] of var int: x);
predicate strict_lex2(array[int, int] of var int: x);
predicate lex_less(array[int] of var int: x, array[int] of var int: y);
predicate lex_lesseq(array[int] of var int: x, array[int] of var int: y);
predicate lex_greater(array[int] of var int: x, array[int] of var int: y);
predicate lex_greatereq(array[int] of var int: x, array[int] of var int: y);
predicate value_precede(int: s, int: t, array[int] of var int: x);
predicate value_precede_chain(array[int] of int: c, array[int] of var int: x);
predicate seq_precede_chain(array[int] of var int: x);
predicate global_cardinality(array[int] of var int: x, array[int] of int: cover, array[int] of var int: counts);
predicate count_eq(array[int] of var int: x, var int: y, var int: c);
predicate cumulative(array[int] of var int: s, array[int] of var int: d, array[int] of var int: r, var int: b);
predicate disjunctive(array[int] of var int: s, array[int] of var int: d);
predicate inverse(array[int] of var int: f, array[int] of var int: invf);
predicate circuit(array[int] of var int: x);
predicate subcircuit(array[int] of var int: x);
predicate table(array[int] of var int: x, array[int, int] of int: t);
predicate member(array[int] of var int: x, var int: y);
predicate maximum(var int: m, array[int] of var int: x);
predicate minimum(var int: m, array[int] of var int: x);
predicate nvalue(var int: n, array[int] of var int: x);
predicate bin_packing(int: c, array[int] of var int: bin, array[int] of int: w);
predicate diffn(array[int] of var int: x, array[int] of var int: y, array[int] of var int: dx, array[int] of var int: dy);
"#;

/// Resolve an include path against the embedded library.
#[must_use]
pub fn lookup(path: &str) -> Option<&'static str> {
    match path {
        "stdlib.mzn" => Some(STDLIB_SOURCE),
        "globals.mzn" => Some(GLOBALS_SOURCE),
        // Per-constraint include files re-export from the catalogue.
        "alldifferent.mzn" | "all_different.mzn" | "increasing.mzn" | "decreasing.mzn"
        | "lex2.mzn" | "lex_less.mzn" | "lex_lesseq.mzn" | "lex_greater.mzn"
        | "lex_greatereq.mzn" => Some(GLOBALS_SOURCE),
        _ => None,
    }
}
