//! Abstract Syntax Tree
//!
//! AST node definitions for directive expressions.

use super::token::Span;

/// AST Node ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// Abstract Syntax Tree container
#[derive(Debug, Default)]
pub struct Ast {
    nodes: Vec<AstNode>,
    root: Option<NodeId>,
}

impl Ast {
    pub fn new() -> Self { Self::default() }

    pub fn add_node(&mut self, node: AstNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&AstNode> { self.nodes.get(id.0 as usize) }
    pub fn set_root(&mut self, id: NodeId) { self.root = Some(id); }
    pub fn root(&self) -> Option<NodeId> { self.root }
    pub fn len(&self) -> usize { self.nodes.len() }
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }
}

/// AST Node
#[derive(Debug, Clone)]
pub struct AstNode {
    pub kind: AstNodeKind,
    pub span: Span,
}

impl AstNode {
    pub fn new(kind: AstNodeKind, span: Span) -> Self { Self { kind, span } }
}

/// AST Node kinds
#[derive(Debug, Clone)]
pub enum AstNodeKind {
    // Statements
    Program { body: Vec<NodeId> },
    ExpressionStatement { expr: NodeId },
    EmptyStatement,

    // Expressions
    Identifier { name: Box<str> },
    Literal { value: LiteralValue },
    ObjectExpression { properties: Vec<(Box<str>, NodeId)> },
    MemberExpression { object: NodeId, property: MemberProperty },
    UnaryExpression { op: UnaryOp, argument: NodeId },
    UpdateExpression { op: UpdateOp, prefix: bool, argument: NodeId },
    BinaryExpression { op: BinaryOp, left: NodeId, right: NodeId },
    LogicalExpression { op: LogicalOp, left: NodeId, right: NodeId },
    ConditionalExpression { test: NodeId, consequent: NodeId, alternate: NodeId },
    AssignmentExpression { op: AssignOp, target: NodeId, value: NodeId },
    SequenceExpression { expressions: Vec<NodeId> },
}

/// `obj.name` or `obj[expr]`
#[derive(Debug, Clone)]
pub enum MemberProperty {
    Named(Box<str>),
    Computed(NodeId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Number(f64),
    String(Box<str>),
    Boolean(bool),
    Null,
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp { Not, Minus, Plus, Typeof }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp { Increment, Decrement }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add, Sub, Mul, Div, Mod,
    Lt, Gt, LtEq, GtEq,
    Eq, NotEq, StrictEq, StrictNotEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp { And, Or, Nullish }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
}

impl AssignOp {
    /// Binary operator a compound assignment applies
    pub fn binary(self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::AddAssign => Some(BinaryOp::Add),
            AssignOp::SubAssign => Some(BinaryOp::Sub),
            AssignOp::MulAssign => Some(BinaryOp::Mul),
            AssignOp::DivAssign => Some(BinaryOp::Div),
        }
    }
}
