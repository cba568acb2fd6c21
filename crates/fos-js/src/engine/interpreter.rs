//! Tree-walking interpreter
//!
//! Runs parsed expressions against a reactive `Scope`. Names resolve
//! through read-only locals (`$event`) first, then the scope.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::ast::{
    Ast, AstNode, AstNodeKind, BinaryOp, LiteralValue, LogicalOp, MemberProperty, NodeId,
    UnaryOp, UpdateOp,
};
use super::parser::Parser;
use crate::{JsError, JsValue, Scope};

/// Read-only names visible to an expression
#[derive(Debug, Clone, Default)]
pub struct Locals {
    vars: Vec<(String, JsValue)>,
}

impl Locals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a local
    pub fn with(mut self, name: &str, value: JsValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: JsValue) {
        match self.vars.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.vars.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&JsValue> {
        self.vars.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Expression interpreter with a per-source compile cache
#[derive(Default)]
pub struct Interpreter {
    cache: RefCell<HashMap<String, Rc<Ast>>>,
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("cached", &self.cache.borrow().len())
            .finish()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `source`, reusing an earlier parse of the same text
    pub fn compile(&self, source: &str) -> Result<Rc<Ast>, JsError> {
        if let Some(ast) = self.cache.borrow().get(source) {
            return Ok(Rc::clone(ast));
        }

        let ast = Parser::new(source)
            .parse()
            .map_err(|e| JsError::Syntax(e.to_string()))?;
        let ast = Rc::new(ast);
        self.cache.borrow_mut().insert(source.to_string(), Rc::clone(&ast));
        Ok(ast)
    }

    /// Number of distinct sources compiled so far
    pub fn cached_programs(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Evaluate `source`; the result is the value of its last statement
    pub fn evaluate(&self, source: &str, scope: &Scope, locals: &Locals) -> Result<JsValue, JsError> {
        let ast = self.compile(source)?;
        Eval { ast: &ast, scope, locals }.run()
    }
}

/// Writable location: a property path rooted in the scope
struct Reference {
    path: Vec<String>,
}

struct Eval<'a> {
    ast: &'a Ast,
    scope: &'a Scope,
    locals: &'a Locals,
}

impl Eval<'_> {
    fn run(&self) -> Result<JsValue, JsError> {
        let Some(root) = self.ast.root() else {
            return Ok(JsValue::Undefined);
        };
        let AstNodeKind::Program { body } = &self.node(root)?.kind else {
            return self.eval(root);
        };

        let mut result = JsValue::Undefined;
        for &statement in body {
            if let AstNodeKind::ExpressionStatement { expr } = &self.node(statement)?.kind {
                result = self.eval(*expr)?;
            }
        }
        Ok(result)
    }

    fn node(&self, id: NodeId) -> Result<&AstNode, JsError> {
        self.ast
            .get(id)
            .ok_or_else(|| JsError::Runtime(format!("invalid AST node {}", id.0)))
    }

    fn eval(&self, id: NodeId) -> Result<JsValue, JsError> {
        match &self.node(id)?.kind {
            AstNodeKind::Literal { value } => Ok(match value {
                LiteralValue::Number(n) => JsValue::Number(*n),
                LiteralValue::String(s) => JsValue::String(s.to_string()),
                LiteralValue::Boolean(b) => JsValue::Bool(*b),
                LiteralValue::Null => JsValue::Null,
                LiteralValue::Undefined => JsValue::Undefined,
            }),

            AstNodeKind::Identifier { name } => self.lookup(name),

            AstNodeKind::ObjectExpression { properties } => {
                let mut pairs = Vec::with_capacity(properties.len());
                for (key, value) in properties {
                    pairs.push((key.to_string(), self.eval(*value)?));
                }
                Ok(JsValue::object_from(pairs))
            }

            AstNodeKind::MemberExpression { object, property } => {
                let object = self.eval(*object)?;
                let key = self.property_key(property)?;
                read_member(&object, &key)
            }

            AstNodeKind::UnaryExpression { op, argument } => {
                if *op == UnaryOp::Typeof {
                    // `typeof undeclared` is not a ReferenceError.
                    let value = match self.eval(*argument) {
                        Err(JsError::Reference(_)) => JsValue::Undefined,
                        other => other?,
                    };
                    return Ok(JsValue::from(value.type_of()));
                }
                let value = self.eval(*argument)?;
                Ok(match op {
                    UnaryOp::Not => JsValue::Bool(!value.truthy()),
                    UnaryOp::Minus => JsValue::Number(-value.to_number()),
                    UnaryOp::Plus | UnaryOp::Typeof => JsValue::Number(value.to_number()),
                })
            }

            AstNodeKind::UpdateExpression { op, prefix, argument } => {
                let reference = self.reference(*argument)?;
                let old = self.read_reference(&reference).to_number();
                let new = match op {
                    UpdateOp::Increment => old + 1.0,
                    UpdateOp::Decrement => old - 1.0,
                };
                self.scope.set_path(&reference.path, JsValue::Number(new))?;
                Ok(JsValue::Number(if *prefix { new } else { old }))
            }

            AstNodeKind::BinaryExpression { op, left, right } => {
                let left = self.eval(*left)?;
                let right = self.eval(*right)?;
                Ok(binary(*op, &left, &right))
            }

            AstNodeKind::LogicalExpression { op, left, right } => {
                let left = self.eval(*left)?;
                let short_circuit = match op {
                    LogicalOp::And => !left.truthy(),
                    LogicalOp::Or => left.truthy(),
                    LogicalOp::Nullish => !left.is_nullish(),
                };
                if short_circuit { Ok(left) } else { self.eval(*right) }
            }

            AstNodeKind::ConditionalExpression { test, consequent, alternate } => {
                if self.eval(*test)?.truthy() {
                    self.eval(*consequent)
                } else {
                    self.eval(*alternate)
                }
            }

            AstNodeKind::AssignmentExpression { op, target, value } => {
                let reference = self.reference(*target)?;
                let value = match op.binary() {
                    None => self.eval(*value)?,
                    Some(binary_op) => {
                        let current = self.read_reference(&reference);
                        let rhs = self.eval(*value)?;
                        binary(binary_op, &current, &rhs)
                    }
                };
                self.scope.set_path(&reference.path, value.clone())?;
                Ok(value)
            }

            AstNodeKind::SequenceExpression { expressions } => {
                let mut last = JsValue::Undefined;
                for &expr in expressions {
                    last = self.eval(expr)?;
                }
                Ok(last)
            }

            AstNodeKind::Program { .. } | AstNodeKind::ExpressionStatement { .. } | AstNodeKind::EmptyStatement => {
                Err(JsError::Runtime("statement in expression position".to_string()))
            }
        }
    }

    fn lookup(&self, name: &str) -> Result<JsValue, JsError> {
        if let Some(value) = self.locals.get(name) {
            return Ok(value.clone());
        }
        if self.scope.has(name) {
            return Ok(self.scope.get(name));
        }
        Err(JsError::Reference(name.to_string()))
    }

    fn property_key(&self, property: &MemberProperty) -> Result<String, JsError> {
        match property {
            MemberProperty::Named(name) => Ok(name.to_string()),
            MemberProperty::Computed(expr) => Ok(self.eval(*expr)?.to_js_string()),
        }
    }

    /// Resolve an assignment target to a scope path
    fn reference(&self, id: NodeId) -> Result<Reference, JsError> {
        match &self.node(id)?.kind {
            AstNodeKind::Identifier { name } => {
                if self.locals.contains(name) {
                    return Err(JsError::TypeError(format!("Assignment to constant variable '{}'", name)));
                }
                Ok(Reference { path: vec![name.to_string()] })
            }
            AstNodeKind::MemberExpression { object, property } => {
                let mut reference = self.reference(*object)?;
                reference.path.push(self.property_key(property)?);
                Ok(reference)
            }
            _ => Err(JsError::TypeError("Invalid assignment target".to_string())),
        }
    }

    fn read_reference(&self, reference: &Reference) -> JsValue {
        let Some((first, rest)) = reference.path.split_first() else {
            return JsValue::Undefined;
        };
        rest.iter()
            .fold(self.scope.get(first), |value, key| value.get(key))
    }
}

fn read_member(object: &JsValue, key: &str) -> Result<JsValue, JsError> {
    if object.is_nullish() {
        return Err(JsError::TypeError(format!(
            "Cannot read properties of {} (reading '{}')",
            object.to_js_string(),
            key
        )));
    }
    Ok(object.get(key))
}

fn binary(op: BinaryOp, left: &JsValue, right: &JsValue) -> JsValue {
    match op {
        BinaryOp::Add => {
            let concat = |v: &JsValue| matches!(v, JsValue::String(_) | JsValue::Object(_));
            if concat(left) || concat(right) {
                JsValue::String(left.to_js_string() + &right.to_js_string())
            } else {
                JsValue::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOp::Sub => JsValue::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => JsValue::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => JsValue::Number(left.to_number() / right.to_number()),
        BinaryOp::Mod => JsValue::Number(left.to_number() % right.to_number()),
        BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq | BinaryOp::GtEq => {
            let ordering = match (left, right) {
                (JsValue::String(a), JsValue::String(b)) => Some(a.cmp(b)),
                _ => left.to_number().partial_cmp(&right.to_number()),
            };
            let Some(ordering) = ordering else {
                return JsValue::Bool(false);
            };
            JsValue::Bool(match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Gt => ordering.is_gt(),
                BinaryOp::LtEq => ordering.is_le(),
                _ => ordering.is_ge(),
            })
        }
        BinaryOp::Eq => JsValue::Bool(left.loose_equals(right)),
        BinaryOp::NotEq => JsValue::Bool(!left.loose_equals(right)),
        BinaryOp::StrictEq => JsValue::Bool(left.strict_equals(right)),
        BinaryOp::StrictNotEq => JsValue::Bool(!left.strict_equals(right)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str, scope: &Scope) -> Result<JsValue, JsError> {
        Interpreter::new().evaluate(source, scope, &Locals::new())
    }

    #[test]
    fn test_assignment_updates_scope() {
        let scope = Scope::from_pairs([("foo", JsValue::from("bar"))]);
        assert_eq!(eval("foo = 'baz'", &scope).unwrap(), JsValue::from("baz"));
        assert_eq!(scope.get("foo"), JsValue::from("baz"));
    }

    #[test]
    fn test_nested_assignment() {
        let scope = Scope::from_pairs([(
            "nested",
            JsValue::object_from([("foo", JsValue::from("bar"))]),
        )]);
        eval("nested.foo = 'baz'", &scope).unwrap();
        assert_eq!(scope.get_path("nested.foo"), JsValue::from("baz"));
        eval("nested['foo'] += '!'", &scope).unwrap();
        assert_eq!(scope.get_path("nested.foo"), JsValue::from("baz!"));
    }

    #[test]
    fn test_update_expressions() {
        let scope = Scope::from_pairs([("count", JsValue::from(0))]);
        assert_eq!(eval("count++", &scope).unwrap(), JsValue::Number(0.0));
        assert_eq!(eval("++count", &scope).unwrap(), JsValue::Number(2.0));
        assert_eq!(eval("count--; count", &scope).unwrap(), JsValue::Number(1.0));
    }

    #[test]
    fn test_operators() {
        let scope = Scope::from_pairs([("a", JsValue::from(2)), ("s", JsValue::from("x"))]);
        assert_eq!(eval("a * 3 + 1", &scope).unwrap(), JsValue::Number(7.0));
        assert_eq!(eval("s + a", &scope).unwrap(), JsValue::from("x2"));
        assert_eq!(eval("a > 1 && s === 'x'", &scope).unwrap(), JsValue::Bool(true));
        assert_eq!(eval("a == '2'", &scope).unwrap(), JsValue::Bool(true));
        assert_eq!(eval("missing ?? 'd'", &scope).unwrap_err(), JsError::Reference("missing".to_string()));
        assert_eq!(eval("null ?? 'd'", &scope).unwrap(), JsValue::from("d"));
        assert_eq!(eval("a > 5 ? 'big' : 'small'", &scope).unwrap(), JsValue::from("small"));
        assert_eq!(eval("typeof nope", &scope).unwrap(), JsValue::from("undefined"));
        assert_eq!(eval("!a", &scope).unwrap(), JsValue::Bool(false));
    }

    #[test]
    fn test_locals_shadow_and_are_read_only() {
        let scope = Scope::from_pairs([("key", JsValue::from("scope"))]);
        let locals = Locals::new().with(
            "$event",
            JsValue::object_from([("key", JsValue::from("Enter"))]),
        );
        let interpreter = Interpreter::new();

        assert_eq!(
            interpreter.evaluate("key = $event.key", &scope, &locals).unwrap(),
            JsValue::from("Enter")
        );
        assert!(matches!(
            interpreter.evaluate("$event = 1", &scope, &locals),
            Err(JsError::TypeError(_))
        ));
    }

    #[test]
    fn test_errors() {
        let scope = Scope::new();
        assert!(matches!(eval("nope", &scope), Err(JsError::Reference(_))));
        assert!(matches!(eval("foo = ", &scope), Err(JsError::Syntax(_))));
        assert!(matches!(
            eval("u = undefined; u.x", &scope),
            Err(JsError::TypeError(_))
        ));
    }

    #[test]
    fn test_empty_source_and_cache() {
        let scope = Scope::new();
        let interpreter = Interpreter::new();
        assert_eq!(interpreter.evaluate("", &scope, &Locals::new()).unwrap(), JsValue::Undefined);
        interpreter.evaluate("x = 1", &scope, &Locals::new()).unwrap();
        interpreter.evaluate("x = 1", &scope, &Locals::new()).unwrap();
        assert_eq!(interpreter.cached_programs(), 2);
    }

    #[test]
    fn test_undeclared_assignment_creates_property() {
        let scope = Scope::new();
        eval("fresh = true", &scope).unwrap();
        assert_eq!(scope.get("fresh"), JsValue::Bool(true));
    }
}
