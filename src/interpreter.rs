use crate::ast::*;
use crate::environment::Environment;
use crate::stack::ensure_sufficient_stack;
use crate::value::{Value, ValueError};
use std::io::{self, Write};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorKind {
    #[error("Invalid IF and THEN expression")]
    InvalidCondition,
    #[error("Invalid variable assignment")]
    InvalidAssignment,
    #[error("Cannot do AND Logic")]
    InvalidAnd,
    #[error("Cannot do OR Logic")]
    InvalidOr,
    #[error("Unable to access undefined variable {0}")]
    UndefinedVar(String),
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error("Unable to write output: {0}")]
    Output(String),
}

/// The one error evaluation can raise. Every runtime error is fatal to the run.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{line}: RUNTIME ERROR {kind}")]
pub struct RuntimeError {
    pub line: usize,
    pub kind: ErrorKind,
}

impl RuntimeError {
    pub fn new(line: usize, kind: impl Into<ErrorKind>) -> Self {
        RuntimeError {
            line,
            kind: kind.into(),
        }
    }
}

/// Tree-walking evaluator. Owns the variable store and the sink that
/// `print` writes to.
pub struct Interpreter<W: Write = io::Stdout> {
    env: Environment,
    out: W,
}

impl Interpreter<io::Stdout> {
    pub fn new() -> Self {
        Interpreter::with_output(io::stdout())
    }
}

impl Default for Interpreter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    pub fn with_output(out: W) -> Self {
        Interpreter {
            env: Environment::new(),
            out,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Evaluate a program root once, discarding its value.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run(&mut self, root: &Node) -> Result<(), RuntimeError> {
        let result = self.eval(root).map(|_| ());
        let flushed = self
            .out
            .flush()
            .map_err(|e| RuntimeError::new(root.line, ErrorKind::Output(e.to_string())));
        if let Err(e) = &result {
            tracing::debug!(line = e.line, error = %e.kind, "run aborted");
        }
        result.and(flushed)
    }

    pub fn eval(&mut self, node: &Node) -> Result<Value, RuntimeError> {
        ensure_sufficient_stack(|| self.eval_node(node))
    }

    fn eval_node(&mut self, node: &Node) -> Result<Value, RuntimeError> {
        match &node.kind {
            // Walk the right spine iteratively so long programs don't grow the stack.
            NodeKind::StmtList => {
                let mut list = node;
                loop {
                    self.eval_child(list.left())?;
                    match list.right() {
                        Some(next) if next.kind == NodeKind::StmtList => list = next,
                        Some(next) => {
                            self.eval(next)?;
                            break;
                        }
                        None => break,
                    }
                }
                Ok(Value::Empty)
            }

            NodeKind::IfStatement => {
                let cond = self.eval_child(node.left())?;
                match cond {
                    Value::Bool(true) => self.eval_child(node.right()),
                    Value::Bool(false) => Ok(Value::Empty),
                    _ => Err(RuntimeError::new(node.line, ErrorKind::InvalidCondition)),
                }
            }

            NodeKind::Assignment => {
                let name = match node.left().and_then(Node::id) {
                    Some(name) => name.to_string(),
                    None => return Err(RuntimeError::new(node.line, ErrorKind::InvalidAssignment)),
                };
                let value = self.eval_child(node.right())?;
                self.env.bind(name, value.clone());
                Ok(value)
            }

            NodeKind::PrintStatement => {
                let value = self.eval_child(node.left())?;
                tracing::trace!(line = node.line, %value, "print");
                writeln!(self.out, "{}", value)
                    .map_err(|e| RuntimeError::new(node.line, ErrorKind::Output(e.to_string())))?;
                Ok(Value::Empty)
            }

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
            | NodeKind::GEqExpr => self.eval_chain(node),

            NodeKind::IConst(n) => Ok(Value::Int(*n)),
            NodeKind::BoolConst(b) => Ok(Value::Bool(*b)),
            NodeKind::SConst(s) => Ok(Value::Str(s.clone())),

            NodeKind::Ident(name) => match self.env.lookup(name) {
                Some(value) => Ok(value.clone()),
                None => Err(RuntimeError::new(
                    node.line,
                    ErrorKind::UndefinedVar(name.clone()),
                )),
            },
        }
    }

    /// A missing child evaluates to empty; the parser never builds one.
    fn eval_child(&mut self, child: Option<&Node>) -> Result<Value, RuntimeError> {
        match child {
            Some(child) => self.eval(child),
            None => Ok(Value::Empty),
        }
    }

    /// Operators nest to the left: `1 + 2 + 3` is `(1 + 2) + 3`. Walk down the
    /// left operands, then apply each operator on the way back up, so a chain
    /// of any length runs in constant stack. Operands are still evaluated left
    /// to right, each operator right after its right operand.
    fn eval_chain(&mut self, node: &Node) -> Result<Value, RuntimeError> {
        let mut chain = Vec::new();
        let mut current = Some(node);
        while let Some(op_node) = current {
            match Operator::of(&op_node.kind) {
                Some(op) => {
                    chain.push((op_node, op));
                    current = op_node.left();
                }
                None => break,
            }
        }

        let mut acc = self.eval_child(current)?;
        for (op_node, op) in chain.into_iter().rev() {
            let rhs = self.eval_child(op_node.right())?;
            acc = op.apply(op_node.line, acc, rhs)?;
        }
        Ok(acc)
    }
}

/// What a binary node does with its two evaluated operands.
#[derive(Clone, Copy)]
enum Operator {
    Value(fn(&Value, &Value) -> Result<Value, ValueError>),
    // Both operands are evaluated before either is inspected.
    And,
    Or,
}

impl Operator {
    fn of(kind: &NodeKind) -> Option<Operator> {
        let op = match kind {
            NodeKind::PlusExpr => Operator::Value(Value::add),
            NodeKind::MinusExpr => Operator::Value(Value::sub),
            NodeKind::TimesExpr => Operator::Value(Value::mul),
            NodeKind::DivideExpr => Operator::Value(Value::div),
            NodeKind::EqExpr => Operator::Value(Value::equals),
            NodeKind::NEqExpr => Operator::Value(Value::not_equals),
            NodeKind::LtExpr => Operator::Value(Value::less),
            NodeKind::LEqExpr => Operator::Value(Value::less_equal),
            NodeKind::GtExpr => Operator::Value(Value::greater),
            NodeKind::GEqExpr => Operator::Value(Value::greater_equal),
            NodeKind::LogicAndExpr => Operator::And,
            NodeKind::LogicOrExpr => Operator::Or,
            _ => return None,
        };
        Some(op)
    }

    fn apply(self, line: usize, l: Value, r: Value) -> Result<Value, RuntimeError> {
        match (self, l, r) {
            (Operator::Value(op), l, r) => op(&l, &r).map_err(|e| RuntimeError::new(line, e)),
            (Operator::And, Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a && b)),
            (Operator::And, _, _) => Err(RuntimeError::new(line, ErrorKind::InvalidAnd)),
            (Operator::Or, Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a || b)),
            (Operator::Or, _, _) => Err(RuntimeError::new(line, ErrorKind::InvalidOr)),
        }
    }
}
