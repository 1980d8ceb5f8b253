//! AST for the restricted graph query language (spec.md §4.2).

/// A single node pattern: `(var:Label)` or `(var)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    /// The bound variable name (e.g. `x`); unused beyond matching field
    /// references, since the language supports only one bound node.
    pub var: String,
    /// The optional type label to filter on.
    pub label: Option<String>,
}

/// A boolean predicate expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Logical AND of two sub-expressions.
    And(Box<Expr>, Box<Expr>),
    /// Logical OR of two sub-expressions.
    Or(Box<Expr>, Box<Expr>),
    /// A single attribute comparison.
    Compare { field: FieldRef, op: Op, value: Value },
}

/// A dotted path into a node's `attrs`, e.g. `x.labels` or `x.meta.priority`
/// (first segment is the bound variable, dropped at evaluation time).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    /// Path segments after the leading variable, e.g. `["labels"]`.
    pub path: Vec<String>,
}

/// Comparison operators the language supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Neq,
    Contains,
    In,
}

/// A literal or parameter value on the right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
    Param(String),
    List(Vec<Value>),
}

/// Sort direction for `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// An `ORDER BY <field> [ASC|DESC]` clause (single attribute, per spec.md
/// §4.2's "over a single attribute").
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: FieldRef,
    pub direction: SortDirection,
}

/// A fully parsed query: the node pattern, optional predicate, and
/// optional ordering. Any trailing `RETURN` clause is parsed and discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    pub pattern: Pattern,
    pub predicate: Option<Expr>,
    pub order_by: Option<OrderBy>,
}
