use std::{
    cell::RefCell,
    fmt::{self, Debug, Display},
    rc::Rc,
};

use crate::{environment::Environment, stmt};

/// A constant written directly in the source.
#[derive(Debug, PartialEq, Clone)]
pub(crate) enum Literal {
    Bool(bool),
    Nil,
    Number(f64),
    String(String),
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Literal::Number(n)
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&Value::from(self), f)
    }
}

/// A runtime value.
#[derive(Clone)]
pub enum Value {
    Bool(bool),
    Function(Rc<Function>),
    NativeFn(NativeFn),
    Nil,
    Number(f64),
    String(String),
}

impl Value {
    pub(crate) fn new_function(
        declaration: stmt::Function,
        closure: Rc<RefCell<Environment>>,
    ) -> Self {
        Value::Function(Rc::new(Function { declaration, closure }))
    }

    pub(crate) fn new_native_fn(
        name: &'static str,
        arity: usize,
        body: fn(&[Value]) -> Value,
    ) -> Self {
        Value::NativeFn(NativeFn { name, arity, body })
    }

    /// Same-variant comparison; values of different variants are never equal.
    pub fn is_equal(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Nil, Nil) => true,
            (Bool(s), Bool(o)) => s == o,
            (Number(s), Number(o)) => s == o,
            (String(s), String(o)) => s == o,
            (Function(s), Function(o)) => Rc::ptr_eq(s, o),
            (NativeFn(s), NativeFn(o)) => s.name == o.name,
            _ => false,
        }
    }

    /// `nil` and `false` are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        use Value::*;
        !matches!(self, Bool(false) | Nil)
    }

    pub(crate) fn type_name(&self) -> &'static str {
        use Value::*;
        match self {
            Bool(_) => "boolean",
            Function(_) | NativeFn(_) => "function",
            Nil => "nil",
            Number(_) => "number",
            String(_) => "string",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        self.is_equal(other)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<&Literal> for Value {
    fn from(l: &Literal) -> Self {
        match l {
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Nil => Value::Nil,
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => Value::String(s.clone()),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Value::*;
        match self {
            Bool(b) => write!(f, "{}", b),
            Function(fnc) => write!(f, "{}", fnc),
            NativeFn(_) => write!(f, "<native fn>"),
            Nil => write!(f, "nil"),
            Number(n) => write!(f, "{}", n),
            String(s) => write!(f, "{}", s),
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            v => write!(f, "{}", v),
        }
    }
}

#[derive(Clone)]
pub struct NativeFn {
    pub(crate) name: &'static str,
    pub(crate) arity: usize,
    pub(crate) body: fn(&[Value]) -> Value,
}

/// A user-defined function together with the scope it was declared in.
pub struct Function {
    pub(crate) declaration: stmt::Function,
    pub(crate) closure: Rc<RefCell<Environment>>,
}

impl Function {
    pub(crate) fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}
