//! Typed syntax tree shared by every back end.
//!
//! The parser lowers the tree-sitter concrete tree into these nodes once; the
//! translators only read them. Constructs without a translation rule are kept
//! as [`Unsupported`] nodes so the back ends can degrade instead of failing.

#[derive(Debug, PartialEq, Clone)]
pub enum Constant {
    String(String),
    Integer(i64),
    /// Float literal, or an integer literal too large for `i64`, already in
    /// canonical decimal spelling.
    Number(String),
    Boolean(bool),
    None,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Constant(Constant),
    Name(String),
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
    Logical {
        left: Box<Expression>,
        op: LogicalOperator,
        right: Box<Expression>,
    },
    Compare {
        left: Box<Expression>,
        ops: Vec<CompareOperator>,
        comparators: Vec<Expression>,
    },
    Call {
        callee: Box<Expression>,
        args: Vec<Expression>,
    },
    Attribute {
        object: Box<Expression>,
        name: String,
    },
    Index {
        object: Box<Expression>,
        index: Box<Expression>,
    },
    List(Vec<Expression>),
    Dict(Vec<(Expression, Expression)>),
    InterpolatedString(Vec<StringSegment>),
    Unsupported(Unsupported),
}

impl Expression {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn integer(value: i64) -> Self {
        Self::Constant(Constant::Integer(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::Constant(Constant::String(value.into()))
    }

    pub fn binary(left: Expression, op: BinaryOperator, right: Expression) -> Self {
        Self::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn call(callee: &str, args: Vec<Expression>) -> Self {
        Self::Call {
            callee: Box::new(Self::name(callee)),
            args,
        }
    }

    /// Operator expressions whose rendering may need parentheses when nested.
    pub fn is_compound(&self) -> bool {
        matches!(
            self,
            Self::BinaryOp { .. } | Self::UnaryOp { .. } | Self::Logical { .. } | Self::Compare { .. }
        )
    }

    /// Calls `visit` with every identifier the expression reads or binds.
    pub fn visit_names<'a, F: FnMut(&'a str)>(&'a self, visit: &mut F) {
        match self {
            Self::Constant(_) | Self::Unsupported(_) => {}
            Self::Name(name) => visit(name.as_str()),
            Self::BinaryOp { left, right, .. } | Self::Logical { left, right, .. } => {
                left.visit_names(visit);
                right.visit_names(visit);
            }
            Self::UnaryOp { operand, .. } => operand.visit_names(visit),
            Self::Compare {
                left, comparators, ..
            } => {
                left.visit_names(visit);
                comparators.iter().for_each(|expr| expr.visit_names(visit));
            }
            Self::Call { callee, args } => {
                callee.visit_names(visit);
                args.iter().for_each(|expr| expr.visit_names(visit));
            }
            Self::Attribute { object, .. } => object.visit_names(visit),
            Self::Index { object, index } => {
                object.visit_names(visit);
                index.visit_names(visit);
            }
            Self::List(items) => items.iter().for_each(|expr| expr.visit_names(visit)),
            Self::Dict(entries) => {
                for (key, value) in entries {
                    key.visit_names(visit);
                    value.visit_names(visit);
                }
            }
            Self::InterpolatedString(segments) => {
                for segment in segments {
                    if let StringSegment::Expr(expr) = segment {
                        expr.visit_names(visit);
                    }
                }
            }
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum StringSegment {
    Text(String),
    Expr(Expression),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    FloorDiv,
}

impl BinaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Self::Add),
            "-" => Some(Self::Sub),
            "*" => Some(Self::Mul),
            "/" => Some(Self::Div),
            "%" => Some(Self::Mod),
            "**" => Some(Self::Pow),
            "//" => Some(Self::FloorDiv),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UnaryOperator {
    Not,
    Neg,
    Pos,
    Invert,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LogicalOperator {
    And,
    Or,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CompareOperator {
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Is,
    IsNot,
    In,
    NotIn,
}

impl CompareOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "==" => Some(Self::Eq),
            "!=" => Some(Self::NotEq),
            "<" => Some(Self::Less),
            "<=" => Some(Self::LessEq),
            ">" => Some(Self::Greater),
            ">=" => Some(Self::GreaterEq),
            "is" => Some(Self::Is),
            "is not" => Some(Self::IsNot),
            "in" => Some(Self::In),
            "not in" => Some(Self::NotIn),
            _ => None,
        }
    }
}

/// A well-formed construct the lowering has no node for.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Unsupported {
    /// Grammar node kind, e.g. `class_definition`.
    pub kind: String,
    pub source: String,
    pub line: usize,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Parameter {
    pub name: String,
    pub default: Option<Expression>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Statement {
    FunctionDef {
        name: String,
        params: Vec<Parameter>,
        body: Vec<Statement>,
    },
    Return(Option<Expression>),
    /// `a = b = value` keeps every target, left to right.
    Assign {
        targets: Vec<Expression>,
        value: Expression,
    },
    AugAssign {
        target: Expression,
        op: BinaryOperator,
        value: Expression,
    },
    /// `elif` clauses are nested as a single `If` inside `orelse`.
    If {
        test: Expression,
        body: Vec<Statement>,
        orelse: Vec<Statement>,
    },
    For {
        target: Expression,
        iterable: Expression,
        body: Vec<Statement>,
    },
    While {
        test: Expression,
        body: Vec<Statement>,
    },
    Expr(Expression),
    Pass,
    Break,
    Continue,
    Unsupported(Unsupported),
}

impl Statement {
    /// Calls `visit` with every identifier mentioned by the statement,
    /// nested blocks and function bodies included.
    pub fn visit_names<'a, F: FnMut(&'a str)>(&'a self, visit: &mut F) {
        match self {
            Self::FunctionDef { name, params, body } => {
                visit(name.as_str());
                for param in params {
                    visit(param.name.as_str());
                    if let Some(default) = &param.default {
                        default.visit_names(visit);
                    }
                }
                body.iter().for_each(|statement| statement.visit_names(visit));
            }
            Self::Return(value) => {
                if let Some(value) = value {
                    value.visit_names(visit);
                }
            }
            Self::Assign { targets, value } => {
                targets.iter().for_each(|target| target.visit_names(visit));
                value.visit_names(visit);
            }
            Self::AugAssign { target, value, .. } => {
                target.visit_names(visit);
                value.visit_names(visit);
            }
            Self::If { test, body, orelse } => {
                test.visit_names(visit);
                body.iter().chain(orelse).for_each(|statement| statement.visit_names(visit));
            }
            Self::For {
                target,
                iterable,
                body,
            } => {
                target.visit_names(visit);
                iterable.visit_names(visit);
                body.iter().for_each(|statement| statement.visit_names(visit));
            }
            Self::While { test, body } => {
                test.visit_names(visit);
                body.iter().for_each(|statement| statement.visit_names(visit));
            }
            Self::Expr(expr) => expr.visit_names(visit),
            Self::Pass | Self::Break | Self::Continue | Self::Unsupported(_) => {}
        }
    }
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Module {
    pub body: Vec<Statement>,
}
