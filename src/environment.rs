use std::{
    cell::RefCell,
    collections::HashMap,
    rc::Rc,
};
use crate::{
    error::{Error, Result},
    token::Token,
    value::Value,
};

/// One scope in the chain. Lookups and assignments walk outward through
/// `enclosing` until a scope binding the name is found.
#[derive(Default)]
pub struct Environment {
    enclosing: Option<Rc<RefCell<Environment>>>,
    values: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self { enclosing: None, values: HashMap::new() }
    }

    pub fn from(e: &Rc<RefCell<Environment>>) -> Self {
        Self { enclosing: Some(Rc::clone(e)), values: HashMap::new() }
    }

    pub fn get(&self, name: &Token) -> Result<Value> {
        match self.values.get(&name.lexeme) {
            Some(v) => Ok(v.clone()),
            None => match &self.enclosing {
                Some(e) => e.borrow().get(name),
                None => Err(undefined_var_error(name)),
            },
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        match self.values.get_mut(&name.lexeme) {
            Some(v) => {
                *v = value;
                Ok(())
            },
            None => match &self.enclosing {
                Some(e) => e.borrow_mut().assign(name, value),
                None => Err(undefined_var_error(name)),
            },
        }
    }

    /// Binds `name` in this scope, replacing any earlier binding here.
    pub fn define<S: Into<String>>(&mut self, name: S, value: Value) {
        self.values.insert(name.into(), value);
    }
}

fn undefined_var_error(name: &Token) -> Error {
    Error::runtime(
        name.clone(),
        format!("Undefined variable '{}'.", name.lexeme)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn ident(name: &str) -> Token {
        Token { kind: TokenKind::Identifier, lexeme: name.into(), line: 1 }
    }

    fn chain() -> (Rc<RefCell<Environment>>, Environment) {
        let global = Rc::new(RefCell::new(Environment::new()));
        let local = Environment::from(&global);
        (global, local)
    }

    #[test]
    fn redefinition_overwrites() -> Result<()> {
        let mut env = Environment::new();
        env.define("a", Value::from(1.0));
        env.define("a", Value::from("two"));
        assert_eq!(Value::from("two"), env.get(&ident("a"))?);
        Ok(())
    }

    #[test]
    fn lookup_walks_the_chain() -> Result<()> {
        let (global, local) = chain();
        global.borrow_mut().define("a", Value::from(1.0));
        assert_eq!(Value::from(1.0), local.get(&ident("a"))?);
        Ok(())
    }

    #[test]
    fn inner_definition_shadows_outer() -> Result<()> {
        let (global, mut local) = chain();
        global.borrow_mut().define("a", Value::from(1.0));
        local.define("a", Value::from(2.0));
        assert_eq!(Value::from(2.0), local.get(&ident("a"))?);
        assert_eq!(Value::from(1.0), global.borrow().get(&ident("a"))?);
        Ok(())
    }

    #[test]
    fn assignment_mutates_nearest_binding() -> Result<()> {
        let (global, mut local) = chain();
        global.borrow_mut().define("a", Value::from(1.0));
        local.assign(&ident("a"), Value::from(3.0))?;
        assert_eq!(Value::from(3.0), global.borrow().get(&ident("a"))?);
        Ok(())
    }

    #[test]
    fn unbound_names_are_errors() {
        let (_global, mut local) = chain();
        let e = local.get(&ident("missing")).unwrap_err();
        assert!(e.is_runtime_error());
        assert_eq!("Undefined variable 'missing'.", e.message());
        assert!(local.assign(&ident("missing"), Value::Nil).is_err());
    }
}
