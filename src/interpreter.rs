use std::{
    cell::RefCell,
    io::Write,
    mem,
    rc::Rc,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{
    environment::Environment,
    error::{Error, Result},
    expr::{self, Expr},
    stmt::{self, Stmt},
    token::{Token, TokenKind},
    value::Value,
};

const MAX_CALL_DEPTH: usize = 5_000;

/// What executing a statement asks its enclosing construct to do next.
#[derive(Debug, PartialEq)]
pub(crate) enum Flow {
    Next,
    Return(Value),
}

pub struct Interpreter<W> {
    environment: Rc<RefCell<Environment>>,
    writer: W,
    call_depth: usize,
}

impl <W: Write> Interpreter<W> {
    pub fn new(writer: W) -> Self {
        let mut globals = Environment::new();
        globals.define("clock", Value::new_native_fn("clock", 0, |_| {
            let seconds = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs_f64())
                .unwrap_or_default();
            Value::from(seconds)
        }));
        let environment = Rc::new(RefCell::new(globals));
        Interpreter { environment, writer, call_depth: 0 }
    }

    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        let result = statements.iter().try_for_each(|s| self.execute(s).map(|_| ()));
        self.writer.flush()?;
        result
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn execute(&mut self, s: &Stmt) -> Result<Flow> {
        s.accept(self)
    }

    /// Runs `statements` in `environment`, restoring the current scope
    /// afterwards whether or not execution succeeded.
    pub(crate) fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Environment,
    ) -> Result<Flow> {
        let previous = mem::replace(&mut self.environment, Rc::new(RefCell::new(environment)));
        let result = self.execute_all(statements);
        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for statement in statements {
            if let Flow::Return(value) = self.execute(statement)? {
                return Ok(Flow::Return(value))
            }
        }
        Ok(Flow::Next)
    }

    fn evaluate(&mut self, e: &Expr) -> Result<Value> {
        e.accept(self)
    }
}

impl <W: Write> stmt::Visitor<Result<Flow>> for Interpreter<W> {
    fn visit_block_stmt(&mut self, b: &stmt::Block) -> Result<Flow> {
        log::trace!("entering block scope");
        let environment = Environment::from(&self.environment);
        self.execute_block(&b.statements, environment)
    }

    fn visit_expression_stmt(&mut self, e: &stmt::Expression) -> Result<Flow> {
        self.evaluate(&e.expression)?;
        Ok(Flow::Next)
    }

    fn visit_function_stmt(&mut self, f: &stmt::Function) -> Result<Flow> {
        let function = Value::new_function(f.clone(), Rc::clone(&self.environment));
        self.environment.borrow_mut().define(f.name.lexeme.clone(), function);
        Ok(Flow::Next)
    }

    fn visit_if_stmt(&mut self, i: &stmt::If) -> Result<Flow> {
        if self.evaluate(&i.condition)?.is_truthy() {
            self.execute(&i.then_branch)
        } else if let Some(else_branch) = &i.else_branch {
            self.execute(else_branch)
        } else {
            Ok(Flow::Next)
        }
    }

    fn visit_print_stmt(&mut self, p: &stmt::Print) -> Result<Flow> {
        let value = self.evaluate(&p.expression)?;
        writeln!(self.writer, "{}", value)?;
        Ok(Flow::Next)
    }

    fn visit_return_stmt(&mut self, r: &stmt::Return) -> Result<Flow> {
        let value = match &r.value {
            Some(value) => self.evaluate(value)?,
            None => Value::Nil,
        };
        Ok(Flow::Return(value))
    }

    fn visit_var_stmt(&mut self, v: &stmt::Var) -> Result<Flow> {
        let value = if let Some(initializer) = &v.initializer {
            self.evaluate(initializer)?
        } else {
            Value::Nil
        };

        let var_name = v.name.lexeme.clone();

        self.environment.borrow_mut().define(var_name, value);
        Ok(Flow::Next)
    }

    fn visit_while_stmt(&mut self, w: &stmt::While) -> Result<Flow> {
        while self.evaluate(&w.condition)?.is_truthy() {
            if let Flow::Return(value) = self.execute(&w.body)? {
                return Ok(Flow::Return(value))
            }
        }
        Ok(Flow::Next)
    }
}

impl <W: Write> expr::Visitor<Result<Value>> for Interpreter<W> {
    fn visit_assign_expr(&mut self, a: &expr::Assign) -> Result<Value> {
        let value = self.evaluate(&a.value)?;
        self.environment.borrow_mut().assign(&a.name, value.clone())?;
        Ok(value)
    }

    fn visit_binary_expr(&mut self, e: &expr::Binary) -> Result<Value> {
        let left = self.evaluate(e.left.as_ref())?;
        let right = self.evaluate(e.right.as_ref())?;

        use Value::{Number, String, Bool};
        match e.op.kind {
            TokenKind::Minus => compute_if_numbers(&e.op, left, right, |l, r| l - r),
            TokenKind::Plus => match (left, right) {
                (Number(left), Number(right)) => Ok(Number(left + right)),
                (String(mut left), String(right)) => {
                    left.push_str(right.as_str());
                    Ok(String(left))
                },
                (left, right) => Err(Error::runtime(
                    e.op.clone(),
                    format!(
                        "Operands must be two numbers or two strings, got {} and {}.",
                        left.type_name(),
                        right.type_name()
                    )
                )),
            },
            TokenKind::Slash => compute_if_numbers(&e.op, left, right, |l, r| l / r),
            TokenKind::Star => compute_if_numbers(&e.op, left, right, |l, r| l * r),
            TokenKind::Greater => compute_if_numbers(&e.op, left, right, |l, r| l > r),
            TokenKind::GreaterEqual => compute_if_numbers(&e.op, left, right, |l, r| l >= r),
            TokenKind::Less => compute_if_numbers(&e.op, left, right, |l, r| l < r),
            TokenKind::LessEqual => compute_if_numbers(&e.op, left, right, |l, r| l <= r),
            TokenKind::EqualEqual => Ok(Bool(left.is_equal(&right))),
            TokenKind::BangEqual => Ok(Bool(!left.is_equal(&right))),
            _ => unreachable!("Binary expression with non-binary operator {:?}.", e.op.kind),
        }
    }

    fn visit_call_expr(&mut self, e: &expr::Call) -> Result<Value> {
        let callee = self.evaluate(&e.callee)?;

        let args: Vec<Value> = e.arguments.iter()
            .map(|a| self.evaluate(a))
            .collect::<Result<_>>()?;

        let callable = callee.callable::<W>()
            .ok_or_else(|| Error::runtime(e.paren.clone(), "Can only call functions."))?;

        if args.len() != callable.arity() {
            return Err(Error::runtime(
                e.paren.clone(),
                format!("Expected {} arguments but got {}.", callable.arity(), args.len())
            ))
        }

        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(Error::runtime(e.paren.clone(), "Stack overflow."))
        }

        self.call_depth += 1;
        let result = callable.call(self, args);
        self.call_depth -= 1;
        result
    }

    fn visit_grouping_expr(&mut self, e: &expr::Grouping) -> Result<Value> {
        self.evaluate(&e.expression)
    }

    fn visit_literal_expr(&mut self, e: &expr::Literal) -> Result<Value> {
        Ok(Value::from(&e.value))
    }

    fn visit_logical_expr(&mut self, e: &expr::Logical) -> Result<Value> {
        let left = self.evaluate(&e.left)?;

        use TokenKind::*;
        Ok(match (&e.op.kind, left.is_truthy()) {
            (Or, true) | (And, false) => left,
            (Or, false) | (And, true) => self.evaluate(&e.right)?,
            _ => unreachable!("Logical expression must be either And or Or.")
        })
    }

    fn visit_unary_expr(&mut self, e: &expr::Unary) -> Result<Value> {
        let right = self.evaluate(e.right.as_ref())?;

        use Value::*;
        match (&e.op.kind, right) {
            (TokenKind::Minus, Number(right)) => Ok(Number(-right)),
            (TokenKind::Minus, _) => Err(Error::runtime(e.op.clone(), "Operand must be a number.")),
            (TokenKind::Bang, right) => Ok(Bool(!right.is_truthy())),
            _ => unreachable!("Unary expression must be either Minus or Bang."),
        }
    }

    fn visit_variable_expr(&mut self, e: &expr::Variable) -> Result<Value> {
        self.environment.borrow().get(&e.name)
    }
}

fn compute_if_numbers<T: Into<Value>>(
    op: &Token,
    left: Value,
    right: Value,
    f: impl Fn(f64, f64) -> T
) -> Result<Value> {
    use Value::Number;
    if let (Number(left), Number(right)) = (&left, &right) {
        return Ok(f(*left, *right).into())
    }
    Err(Error::runtime(op.clone(), "Operands must be numbers."))
}
