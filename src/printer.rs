use crate::{
    expr::{self, Expr},
    stmt::{self, Stmt},
};

/// Renders an expression in parenthesized prefix form, e.g. `(+ 1 (* 2 3))`.
pub fn print_expr(e: &Expr) -> String {
    e.accept(&mut AstPrinter)
}

pub fn print_stmt(s: &Stmt) -> String {
    s.accept(&mut AstPrinter)
}

struct AstPrinter;

impl AstPrinter {
    fn parenthesize(&mut self, name: &str, parts: &[String]) -> String {
        let mut s = String::new();
        s.push('(');
        s.push_str(name);

        for part in parts.iter() {
            s.push(' ');
            s.push_str(part.as_str());
        }

        s.push(')');
        s
    }

    fn expr(&mut self, e: &Expr) -> String {
        e.accept(self)
    }

    fn stmts(&mut self, statements: &[Stmt]) -> Vec<String> {
        statements.iter().map(|s| s.accept(self)).collect()
    }
}

impl expr::Visitor<String> for AstPrinter {
    fn visit_assign_expr(&mut self, e: &expr::Assign) -> String {
        let parts = [e.name.lexeme.clone(), self.expr(&e.value)];
        self.parenthesize("=", &parts)
    }

    fn visit_binary_expr(&mut self, e: &expr::Binary) -> String {
        let parts = [self.expr(&e.left), self.expr(&e.right)];
        self.parenthesize(e.op.lexeme.as_str(), &parts)
    }

    fn visit_call_expr(&mut self, e: &expr::Call) -> String {
        let mut parts = vec![self.expr(&e.callee)];
        parts.extend(e.arguments.iter().map(|a| self.expr(a)));
        self.parenthesize("call", &parts)
    }

    fn visit_grouping_expr(&mut self, e: &expr::Grouping) -> String {
        let parts = [self.expr(&e.expression)];
        self.parenthesize("group", &parts)
    }

    fn visit_literal_expr(&mut self, e: &expr::Literal) -> String {
        e.value.to_string()
    }

    fn visit_logical_expr(&mut self, e: &expr::Logical) -> String {
        let parts = [self.expr(&e.left), self.expr(&e.right)];
        self.parenthesize(e.op.lexeme.as_str(), &parts)
    }

    fn visit_unary_expr(&mut self, e: &expr::Unary) -> String {
        let parts = [self.expr(&e.right)];
        self.parenthesize(e.op.lexeme.as_str(), &parts)
    }

    fn visit_variable_expr(&mut self, e: &expr::Variable) -> String {
        e.name.lexeme.clone()
    }
}

impl stmt::Visitor<String> for AstPrinter {
    fn visit_block_stmt(&mut self, s: &stmt::Block) -> String {
        let parts = self.stmts(&s.statements);
        self.parenthesize("block", &parts)
    }

    fn visit_expression_stmt(&mut self, s: &stmt::Expression) -> String {
        let parts = [self.expr(&s.expression)];
        self.parenthesize(";", &parts)
    }

    fn visit_function_stmt(&mut self, s: &stmt::Function) -> String {
        let params: Vec<_> = s.params.iter().map(|p| p.lexeme.as_str()).collect();
        let mut parts = vec![
            s.name.lexeme.clone(),
            format!("({})", params.join(" ")),
        ];
        parts.extend(self.stmts(&s.body));
        self.parenthesize("fun", &parts)
    }

    fn visit_if_stmt(&mut self, s: &stmt::If) -> String {
        let mut parts = vec![self.expr(&s.condition), s.then_branch.accept(self)];
        if let Some(else_branch) = &s.else_branch {
            parts.push(else_branch.accept(self));
        }
        self.parenthesize("if", &parts)
    }

    fn visit_print_stmt(&mut self, s: &stmt::Print) -> String {
        let parts = [self.expr(&s.expression)];
        self.parenthesize("print", &parts)
    }

    fn visit_return_stmt(&mut self, s: &stmt::Return) -> String {
        let parts: Vec<_> = s.value.iter().map(|v| self.expr(v)).collect();
        self.parenthesize("return", &parts)
    }

    fn visit_var_stmt(&mut self, s: &stmt::Var) -> String {
        let mut parts = vec![s.name.lexeme.clone()];
        if let Some(initializer) = &s.initializer {
            parts.push(self.expr(initializer));
        }
        self.parenthesize("var", &parts)
    }

    fn visit_while_stmt(&mut self, s: &stmt::While) -> String {
        let parts = [self.expr(&s.condition), s.body.accept(self)];
        self.parenthesize("while", &parts)
    }
}
