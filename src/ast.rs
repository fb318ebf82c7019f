use crate::lexer::Lexeme;
use crate::stack::ensure_sufficient_stack;
use std::collections::BTreeMap;
use std::fmt;

/// Static type tag carried by literal leaves. Everything else is `ErrType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    ErrType,
    IntType,
    StrType,
    BoolType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // Statements
    StmtList,
    IfStatement,
    Assignment,
    PrintStatement,

    // Arithmetic
    PlusExpr,
    MinusExpr,
    TimesExpr,
    DivideExpr,

    // Logic (both sides always evaluated)
    LogicAndExpr,
    LogicOrExpr,

    // Comparison
    EqExpr,
    NEqExpr,
    LtExpr,
    LEqExpr,
    GtExpr,
    GEqExpr,

    // Leaves
    IConst(i64),
    BoolConst(bool),
    SConst(String),
    Ident(String),
}

impl NodeKind {
    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            NodeKind::PlusExpr
                | NodeKind::MinusExpr
                | NodeKind::TimesExpr
                | NodeKind::DivideExpr
                | NodeKind::LogicAndExpr
                | NodeKind::LogicOrExpr
                | NodeKind::EqExpr
                | NodeKind::NEqExpr
                | NodeKind::LtExpr
                | NodeKind::LEqExpr
                | NodeKind::GtExpr
                | NodeKind::GEqExpr
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::StmtList => "StmtList",
            NodeKind::IfStatement => "IfStatement",
            NodeKind::Assignment => "Assignment",
            NodeKind::PrintStatement => "PrintStatement",
            NodeKind::PlusExpr => "PlusExpr",
            NodeKind::MinusExpr => "MinusExpr",
            NodeKind::TimesExpr => "TimesExpr",
            NodeKind::DivideExpr => "DivideExpr",
            NodeKind::LogicAndExpr => "LogicAndExpr",
            NodeKind::LogicOrExpr => "LogicOrExpr",
            NodeKind::EqExpr => "EqExpr",
            NodeKind::NEqExpr => "NEqExpr",
            NodeKind::LtExpr => "LtExpr",
            NodeKind::LEqExpr => "LEqExpr",
            NodeKind::GtExpr => "GtExpr",
            NodeKind::GEqExpr => "GEqExpr",
            NodeKind::IConst(_) => "IConst",
            NodeKind::BoolConst(_) => "BoolConst",
            NodeKind::SConst(_) => "SConst",
            NodeKind::Ident(_) => "Ident",
        }
    }
}

/// A node of the syntax tree. Each node owns its children outright, so the
/// tree is acyclic and dropping the root frees everything below it.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub line: usize,
    pub left: Option<Box<Node>>,
    pub right: Option<Box<Node>>,
}

impl Node {
    pub fn new(kind: NodeKind, line: usize, left: Option<Node>, right: Option<Node>) -> Self {
        Node {
            kind,
            line,
            left: left.map(Box::new),
            right: right.map(Box::new),
        }
    }

    pub fn leaf(kind: NodeKind, line: usize) -> Self {
        Node::new(kind, line, None, None)
    }

    /// Statement lists are synthetic and carry line 0.
    pub fn stmt_list(stmt: Node, next: Option<Node>) -> Self {
        Node::new(NodeKind::StmtList, 0, Some(stmt), next)
    }

    pub fn if_statement(line: usize, cond: Node, then: Node) -> Self {
        Node::new(NodeKind::IfStatement, line, Some(cond), Some(then))
    }

    pub fn assignment(line: usize, target: Node, expr: Node) -> Self {
        Node::new(NodeKind::Assignment, line, Some(target), Some(expr))
    }

    pub fn print(line: usize, expr: Node) -> Self {
        Node::new(NodeKind::PrintStatement, line, Some(expr), None)
    }

    pub fn binary(kind: NodeKind, line: usize, lhs: Node, rhs: Node) -> Self {
        debug_assert!(kind.is_binary(), "{} is not a binary operator", kind.name());
        Node::new(kind, line, Some(lhs), Some(rhs))
    }

    pub fn iconst(line: usize, value: i64) -> Self {
        Node::leaf(NodeKind::IConst(value), line)
    }

    pub fn bool_const(line: usize, value: bool) -> Self {
        Node::leaf(NodeKind::BoolConst(value), line)
    }

    /// String constant from a lexeme; the lexeme text is used verbatim.
    pub fn sconst(lexeme: &Lexeme) -> Self {
        Node::leaf(NodeKind::SConst(lexeme.text.clone()), lexeme.line)
    }

    pub fn ident(lexeme: &Lexeme) -> Self {
        Node::leaf(NodeKind::Ident(lexeme.text.clone()), lexeme.line)
    }

    pub fn left(&self) -> Option<&Node> {
        self.left.as_deref()
    }

    pub fn right(&self) -> Option<&Node> {
        self.right.as_deref()
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn node_type(&self) -> NodeType {
        match self.kind {
            NodeKind::IConst(_) => NodeType::IntType,
            NodeKind::SConst(_) => NodeType::StrType,
            NodeKind::BoolConst(_) => NodeType::BoolType,
            _ => NodeType::ErrType,
        }
    }

    pub fn is_ident(&self) -> bool {
        matches!(self.kind, NodeKind::Ident(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self.kind, NodeKind::SConst(_))
    }

    /// Variable name of an identifier node.
    pub fn id(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    fn children(&self) -> impl Iterator<Item = &Node> {
        self.left().into_iter().chain(self.right())
    }

    /// Every node of this subtree, parent first, then left before right.
    /// Walks with an explicit stack, so tree depth doesn't matter.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        let mut pending = vec![self];
        std::iter::from_fn(move || {
            let node = pending.pop()?;
            pending.extend(node.right());
            pending.extend(node.left());
            Some(node)
        })
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes().filter(|n| n.is_leaf()).count()
    }

    pub fn ident_count(&self) -> usize {
        self.nodes().filter(|n| n.is_ident()).count()
    }

    pub fn string_count(&self) -> usize {
        self.nodes().filter(|n| n.is_string()).count()
    }

    /// Add every identifier occurrence in this subtree to `vars`.
    pub fn collect_vars(&self, vars: &mut BTreeMap<String, usize>) {
        for id in self.nodes().filter_map(Node::id) {
            *vars.entry(id.to_string()).or_insert(0) += 1;
        }
    }

    /// Occurrence count of each distinct identifier in this subtree.
    pub fn vars(&self) -> BTreeMap<String, usize> {
        let mut vars = BTreeMap::new();
        self.collect_vars(&mut vars);
        vars
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}{}", "", self.kind.name(), indent = depth * 2)?;
        match &self.kind {
            NodeKind::IConst(n) => write!(f, " {}", n)?,
            NodeKind::BoolConst(b) => write!(f, " {}", b)?,
            NodeKind::SConst(s) => write!(f, " \"{}\"", s)?,
            NodeKind::Ident(name) => write!(f, " {}", name)?,
            _ => {}
        }
        if self.line > 0 {
            write!(f, " (line {})", self.line)?;
        }
        writeln!(f)?;
        ensure_sufficient_stack(|| {
            for child in self.children() {
                child.fmt_indented(f, depth + 1)?;
            }
            Ok(())
        })
    }
}

// Statement lists nest to the right and operator chains to the left, one
// level per statement or operator. Unlink children onto a worklist so that
// dropping a deep tree never recurses.
impl Drop for Node {
    fn drop(&mut self) {
        let mut pending: Vec<Box<Node>> = Vec::new();
        pending.extend(self.left.take());
        pending.extend(self.right.take());
        while let Some(mut node) = pending.pop() {
            pending.extend(node.left.take());
            pending.extend(node.right.take());
        }
    }
}

/// Indented outline of the tree, one node per line.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
