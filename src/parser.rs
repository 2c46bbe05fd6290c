use std::{iter::Peekable, rc::Rc};

use crate::{
    error::{Error, Result},
    expr::Expr,
    stmt::{self, Stmt},
    token::*,
    value,
};

const MAX_ARITY: usize = 255;
const MAX_NESTING: usize = 1_000;

const EQUALITY_TOKENS: &[&TokenKind] = &[
    &TokenKind::BangEqual,
    &TokenKind::EqualEqual,
];

const COMPARISON_TOKENS: &[&TokenKind] = &[
    &TokenKind::Greater,
    &TokenKind::GreaterEqual,
    &TokenKind::Less,
    &TokenKind::LessEqual,
];

const TERM_TOKENS: &[&TokenKind] = &[
    &TokenKind::Minus,
    &TokenKind::Plus,
];

const FACTOR_TOKENS: &[&TokenKind] = &[
    &TokenKind::Star,
    &TokenKind::Slash,
];

const UNARY_TOKENS: &[&TokenKind] = &[
    &TokenKind::Bang,
    &TokenKind::Minus,
];

/// Recursive-descent parser with one token of lookahead. The first error
/// aborts the whole parse.
pub struct Parser<T> {
    tokens: T,
    function_depth: usize,
    nesting: usize,
}

impl <T: Iterator<Item = Token>> Parser<Peekable<T>> {
    pub fn new(tokens: T) -> Self {
        let tokens = tokens.peekable();
        Parser { tokens, function_depth: 0, nesting: 0 }
    }

    pub fn parse(&mut self) -> Result<Vec<Stmt>> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            statements.push(self.declaration()?);
        }
        log::debug!("parsed {} top-level statements", statements.len());
        Ok(statements)
    }

    fn declaration(&mut self) -> Result<Stmt> {
        if self.match_single(&TokenKind::Fun).is_some() {
            self.function("function").map(Stmt::Function)
        } else if self.match_single(&TokenKind::Var).is_some() {
            self.var_declaration()
        } else {
            self.statement()
        }
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name = self.consume(&TokenKind::Identifier, "Expected variable name.")?;

        let initializer = if self.match_single(&TokenKind::Equal).is_some() {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(&TokenKind::Semicolon, "Expected ';' after variable declaration.")?;
        Ok(Stmt::new_var(name, initializer))
    }

    fn statement(&mut self) -> Result<Stmt> {
        self.nested(Self::unnested_statement)
    }

    fn unnested_statement(&mut self) -> Result<Stmt> {
        if self.match_single(&TokenKind::If).is_some() {
            self.if_statement()
        } else if self.match_single(&TokenKind::Print).is_some() {
            self.print_statement()
        } else if let Some(token) = self.match_single(&TokenKind::Return) {
            self.return_statement(token)
        } else if self.match_single(&TokenKind::While).is_some() {
            self.while_statement()
        } else if self.match_single(&TokenKind::LeftBrace).is_some() {
            Ok(Stmt::new_block(self.block()?))
        } else {
            self.expression_statement()
        }
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.consume(&TokenKind::LeftParen, "Expected '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(&TokenKind::RightParen, "Expected ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_single(&TokenKind::Else).is_some() {
            Some(Box::new(self.statement()?))
        } else { None };

        Ok(Stmt::new_if(condition, then_branch, else_branch))
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        let expression = self.expression()?;
        self.consume(&TokenKind::Semicolon, "Expected ';' after value.")?;
        Ok(Stmt::new_print(expression))
    }

    fn return_statement(&mut self, keyword: Token) -> Result<Stmt> {
        if self.function_depth == 0 {
            return Err(Error::syntactic(keyword, "Can't return from top-level code."))
        }
        let value = if !self.check_next(&TokenKind::Semicolon) {
            Some(self.expression()?)
        } else { None };
        self.consume(&TokenKind::Semicolon, "Expected ';' after return value.")?;
        Ok(Stmt::new_return(keyword, value))
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(&TokenKind::LeftParen, "Expected '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(&TokenKind::RightParen, "Expected ')' after condition.")?;
        let body = Box::new(self.statement()?);

        Ok(Stmt::new_while(condition, body))
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expression = self.expression()?;
        self.consume(&TokenKind::Semicolon, "Expected ';' after expression.")?;
        Ok(Stmt::new_expression(expression))
    }

    fn function(&mut self, kind: &str) -> Result<stmt::Function> {
        let name = self.consume(
            &TokenKind::Identifier,
            format!("Expected {} name.", kind).as_str()
        )?;
        self.consume(
            &TokenKind::LeftParen,
            format!("Expected '(' after {} name.", kind).as_str()
        )?;

        let mut params = Vec::new();
        if !self.check_next(&TokenKind::RightParen) {
            loop {
                let param = self.consume(&TokenKind::Identifier, "Expected parameter name.")?;
                if params.len() >= MAX_ARITY {
                    return Err(Error::syntactic(param, "Can't have more than 255 parameters."))
                }
                params.push(param);
                if self.match_single(&TokenKind::Comma).is_none() { break }
            }
        }

        self.consume(&TokenKind::RightParen, "Expected ')' after parameters.")?;
        self.consume(
            &TokenKind::LeftBrace,
            format!("Expected '{{' before {} body.", kind).as_str()
        )?;

        self.function_depth += 1;
        let body = self.block();
        self.function_depth -= 1;

        Ok(stmt::Function { name, params, body: Rc::new(body?) })
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.check_next(&TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }

        self.consume(&TokenKind::RightBrace, "Expected '}' after block.")?;
        Ok(statements)
    }

    fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        self.nested(Self::unnested_assignment)
    }

    fn unnested_assignment(&mut self) -> Result<Expr> {
        let expr = self.or()?;
        if let Some(equals) = self.match_single(&TokenKind::Equal) {
            if let Expr::Variable(lhs) = expr {
                let value = self.assignment()?;
                Ok(Expr::new_assign(lhs.name, Box::new(value)))
            } else {
                Err(Error::syntactic(equals, "Invalid assignment target."))
            }
        } else {
            Ok(expr)
        }
    }

    fn or(&mut self) -> Result<Expr> {
        let mut e = self.and()?;

        while let Some(op) = self.match_single(&TokenKind::Or) {
            let right = Box::new(self.and()?);
            e = Expr::new_logical(Box::new(e), op, right);
        }

        Ok(e)
    }

    fn and(&mut self) -> Result<Expr> {
        let mut e = self.equality()?;

        while let Some(op) = self.match_single(&TokenKind::And) {
            let right = Box::new(self.equality()?);
            e = Expr::new_logical(Box::new(e), op, right);
        }

        Ok(e)
    }

    fn equality(&mut self) -> Result<Expr> {
        self.match_binary_precedence_with_tokens(
            Self::comparison,
            EQUALITY_TOKENS
        )
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.match_binary_precedence_with_tokens(
            Self::term,
            COMPARISON_TOKENS
        )
    }

    fn term(&mut self) -> Result<Expr> {
        self.match_binary_precedence_with_tokens(
            Self::factor,
            TERM_TOKENS
        )
    }

    fn factor(&mut self) -> Result<Expr> {
        self.match_binary_precedence_with_tokens(
            Self::unary,
            FACTOR_TOKENS
        )
    }

    fn unary(&mut self) -> Result<Expr> {
        if let Some(token) = self.match_any(UNARY_TOKENS) {
            let right = Box::new(self.nested(Self::unary)?);
            Ok(Expr::new_unary(token, right))
        } else {
            self.call()
        }
    }

    fn call(&mut self) -> Result<Expr> {
        let mut e = self.primary()?;

        while self.match_single(&TokenKind::LeftParen).is_some() {
            e = self.finish_call(e)?;
        }

        Ok(e)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut args = Vec::new();

        if !self.check_next(&TokenKind::RightParen) {
            args.push(self.expression()?);
            while self.match_single(&TokenKind::Comma).is_some() {
                args.push(self.expression()?);
            }
        }
        let paren = self.consume(
            &TokenKind::RightParen,
            "Expected ')' after arguments."
        )?;

        if args.len() > MAX_ARITY {
            Err(Error::syntactic(paren, "Can't have more than 255 arguments."))
        } else {
            Ok(Expr::new_call(Box::new(callee), paren, args))
        }
    }

    fn primary(&mut self) -> Result<Expr> {
        let (next, kind) = {
            let next = self.tokens.next().ok_or_else(Error::unexpected)?;
            let kind = next.kind.clone();
            (next, kind)
        };

        match kind {
            TokenKind::True => Ok(Expr::new_literal(true.into())),
            TokenKind::False => Ok(Expr::new_literal(false.into())),
            TokenKind::Nil => Ok(Expr::new_literal(value::Literal::Nil)),
            TokenKind::Number(n) => Ok(Expr::new_literal(n.into())),
            TokenKind::String(s) => Ok(Expr::new_literal(s.into())),
            TokenKind::Identifier => Ok(Expr::new_variable(next)),
            TokenKind::LeftParen => {
                let expression = Box::new(self.expression()?);
                self.consume(&TokenKind::RightParen, "Expected ')' after expression.")?;
                Ok(Expr::new_grouping(expression))
            },
            kind if kind.is_unsupported_keyword() => Err(unsupported_keyword(next)),
            _ => Err(Error::syntactic(next, "Expected expression.")),
        }
    }

    /// Runs `parse` one nesting level deeper, failing instead of recursing
    /// past `MAX_NESTING`.
    fn nested<R>(&mut self, parse: impl Fn(&mut Self) -> Result<R>) -> Result<R> {
        if self.nesting >= MAX_NESTING {
            let token = match self.tokens.peek() {
                Some(t) => t.clone(),
                None => return Err(Error::unexpected()),
            };
            return Err(Error::syntactic(token, "Expression nesting too deep."))
        }
        self.nesting += 1;
        let result = parse(self);
        self.nesting -= 1;
        result
    }

    fn is_at_end(&mut self) -> bool {
        self.tokens.peek()
            .map(|t| t.kind == TokenKind::EndOfFile)
            .unwrap_or(true)
    }

    fn check_next(&mut self, kind: &TokenKind) -> bool {
        self.tokens.peek()
            .map(|t| &t.kind == kind)
            .unwrap_or(false)
    }

    fn consume(&mut self, kind: &TokenKind, error_msg: &str) -> Result<Token> {
        if let Some(token) = self.match_single(kind) {
            return Ok(token)
        }
        // Leave EndOfFile in place so later lookahead still sees the end.
        let found = match self.tokens.peek() {
            Some(t) if t.kind == TokenKind::EndOfFile => t.clone(),
            Some(_) => self.tokens.next().ok_or_else(Error::unexpected)?,
            None => return Err(Error::unexpected()),
        };
        if found.kind.is_unsupported_keyword() {
            Err(unsupported_keyword(found))
        } else {
            Err(Error::syntactic(found, error_msg))
        }
    }

    fn match_binary_precedence_with_tokens(
        &mut self,
        parse: impl Fn(&mut Self) -> Result<Expr>,
        kinds: &[&TokenKind]
    ) -> Result<Expr> {
        let mut e = parse(self)?;

        while let Some(token) = self.match_any(kinds) {
            let right = Box::new(parse(self)?);
            e = Expr::new_binary(Box::new(e), token, right)
        }

        Ok(e)
    }

    fn match_single(&mut self, kind: &TokenKind) -> Option<Token> {
        if self.check_next(kind) {
            self.tokens.next()
        } else {
            None
        }
    }

    fn match_any(&mut self, kinds: &[&TokenKind]) -> Option<Token> {
        kinds.iter().find_map(|k| self.match_single(k))
    }
}

fn unsupported_keyword(token: Token) -> Error {
    let message = format!("'{}' is reserved but not supported.", token.lexeme);
    Error::syntactic(token, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorKind, printer, scanner::Scanner};
    use std::io;

    fn assert_tokens_parse_to_expr(tokens: Vec<Token>, expr: Expr) -> io::Result<()> {
        let mut parser = Parser::new(tokens.into_iter());
        let parsed = parser.expression()?;
        assert_eq!(expr, parsed);
        Ok(())
    }

    fn parse_source(src: &str) -> Result<Vec<Stmt>> {
        let tokens = Scanner::new(src).scan_tokens()?;
        Parser::new(tokens.into_iter()).parse()
    }

    fn on_large_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
        std::thread::Builder::new()
            .stack_size(crate::STACK_SIZE)
            .spawn(f)
            .expect("test thread should spawn")
            .join()
            .expect("test thread should not panic")
    }

    fn parse_to_sexpr(src: &str) -> Result<String> {
        let statements = parse_source(src)?;
        Ok(statements.iter().map(printer::print_stmt).collect::<Vec<_>>().join(" "))
    }

    #[test]
    fn string_literal_token() -> io::Result<()> {
        assert_tokens_parse_to_expr(
            vec![
                Token { kind: TokenKind::String("abc".into()), lexeme: "".into(), line: 1 },
            ],
            Expr::new_literal(value::Literal::String("abc".into()))
        )
    }

    #[test]
    fn number_literal_token() -> io::Result<()> {
        assert_tokens_parse_to_expr(
            vec![
                Token { kind: TokenKind::Number(5.1), lexeme: "".into(), line: 1 },
            ],
            Expr::new_literal(value::Literal::Number(5.1))
        )
    }

    #[test]
    fn nil_literal_token() -> io::Result<()> {
        assert_tokens_parse_to_expr(
            vec![
                Token { kind: TokenKind::Nil, lexeme: "".into(), line: 1 },
            ],
            Expr::new_literal(value::Literal::Nil)
        )
    }

    #[test]
    fn unary_op_tokens() -> io::Result<()> {
        let not = Token::make(TokenKind::Bang);
        assert_tokens_parse_to_expr(
            vec![
                not.clone(),
                Token::make(TokenKind::True),
            ],
            Expr::new_unary(not, Box::new(Expr::make(true)))
        )
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() -> Result<()> {
        assert_eq!("(; (+ 1 (* 2 3)))", parse_to_sexpr("1 + 2 * 3;")?);
        Ok(())
    }

    #[test]
    fn subtraction_is_left_associative() -> Result<()> {
        assert_eq!("(; (- (- 10 3) 2))", parse_to_sexpr("10 - 3 - 2;")?);
        Ok(())
    }

    #[test]
    fn assignment_is_right_associative() -> Result<()> {
        assert_eq!("(; (= a (= b 1)))", parse_to_sexpr("a = b = 1;")?);
        Ok(())
    }

    #[test]
    fn or_binds_looser_than_and() -> Result<()> {
        assert_eq!("(; (or a (and b c)))", parse_to_sexpr("a or b and c;")?);
        Ok(())
    }

    #[test]
    fn comparison_binds_tighter_than_equality() -> Result<()> {
        assert_eq!("(; (== (< 1 2) true))", parse_to_sexpr("1 < 2 == true;")?);
        Ok(())
    }

    #[test]
    fn calls_chain() -> Result<()> {
        assert_eq!("(; (call (call f 1) 2 3))", parse_to_sexpr("f(1)(2, 3);")?);
        Ok(())
    }

    #[test]
    fn statements() -> Result<()> {
        assert_eq!(
            "(var x 1) (if x (block (print x)) (while false (; (= x 2))))",
            parse_to_sexpr("var x = 1; if (x) { print x; } else while (false) x = 2;")?
        );
        Ok(())
    }

    #[test]
    fn function_declaration() -> Result<()> {
        assert_eq!(
            "(fun add (a b) (return (+ a b)))",
            parse_to_sexpr("fun add(a, b) { return a + b; }")?
        );
        Ok(())
    }

    #[test]
    fn missing_paren_names_expected_token() {
        let e = parse_source("(1 + 2").unwrap_err();
        assert!(matches!(e.kind(), ErrorKind::Syntactic { .. }));
        assert_eq!("Expected ')' after expression.", e.message());
        assert_eq!("[line 1] Error at end: Expected ')' after expression.", e.to_string());
    }

    #[test]
    fn missing_semicolon() {
        let e = parse_source("print 1\nprint 2;").unwrap_err();
        assert_eq!("[line 2] Error at 'print': Expected ';' after value.", e.to_string());
    }

    #[test]
    fn invalid_assignment_target() {
        let e = parse_source("1 + a = 3;").unwrap_err();
        assert_eq!("Invalid assignment target.", e.message());
    }

    #[test]
    fn unclosed_block() {
        let e = parse_source("{ print 1;").unwrap_err();
        assert_eq!("Expected '}' after block.", e.message());
    }

    #[test]
    fn reserved_words_are_rejected() {
        for src in &["for (;;) {}", "class A {}", "print this;", "super.x();"] {
            let e = parse_source(src).unwrap_err();
            assert!(
                e.message().ends_with("is reserved but not supported."),
                "{}: {}", src, e
            );
        }
    }

    #[test]
    fn too_many_parameters() {
        let params: Vec<_> = (0..256).map(|i| format!("p{}", i)).collect();
        let src = format!("fun f({}) {{}}", params.join(", "));
        let e = parse_source(&src).unwrap_err();
        assert_eq!("Can't have more than 255 parameters.", e.message());
    }

    #[test]
    fn return_outside_function() {
        let e = parse_source("return 1;").unwrap_err();
        assert_eq!("[line 1] Error at 'return': Can't return from top-level code.", e.to_string());
    }

    #[test]
    fn nesting_just_under_the_limit_parses() -> Result<()> {
        let depth = MAX_NESTING - 10;
        let src = format!("print {}1{};", "(".repeat(depth), ")".repeat(depth));
        let count = on_large_stack(move || parse_source(&src).map(|s| s.len()))?;
        assert_eq!(1, count);
        Ok(())
    }

    #[test]
    fn deeply_nested_groupings_are_rejected() {
        let src = format!("print {}1{};", "(".repeat(20_000), ")".repeat(20_000));
        let e = on_large_stack(move || parse_source(&src).map(|_| ())).unwrap_err();
        assert!(matches!(e.kind(), ErrorKind::Syntactic { .. }));
        assert_eq!("Expression nesting too deep.", e.message());
    }

    #[test]
    fn deeply_nested_unary_and_blocks_are_rejected() {
        for src in &[
            format!("print {}1;", "-".repeat(20_000)),
            format!("{}{}", "{".repeat(20_000), "}".repeat(20_000)),
            format!("{}1;", "a = ".repeat(20_000)),
        ] {
            let src = src.clone();
            let e = on_large_stack(move || parse_source(&src).map(|_| ())).unwrap_err();
            assert_eq!("Expression nesting too deep.", e.message());
        }
    }

    #[test]
    fn empty_program() -> Result<()> {
        assert!(parse_source("// nothing here\n")?.is_empty());
        Ok(())
    }

    impl Token {
        fn make(kind: TokenKind) -> Token {
            Token { kind, lexeme: "".into(), line: 0 }
        }
    }

    impl Expr {
        fn make(b: bool) -> Expr {
            Expr::new_literal(value::Literal::Bool(b))
        }
    }
}
