//! Recursive-descent parser for the Ember language.
//!
//! Grammar:
//! ```text
//! program      = (func_decl | global_var_decl)* EOF
//! func_decl    = "func" IDENT "(" params? ")" (":" TYPE)? (block | "=>" expr ";")
//! params       = IDENT ":" TYPE ("," IDENT ":" TYPE)*
//! block        = "{" stmt* "}"
//! stmt         = var_decl | assign_stmt | return_stmt | if_stmt | while_stmt
//!              | incr_decr_stmt | block | expr_stmt
//! var_decl     = TYPE IDENT "=" expr ";"
//! assign_stmt  = IDENT ("=" | "+=" | "-=" | "*=" | "/=") expr ";"
//! if_stmt      = "if" "(" expr ")" block ("else" "if" "(" expr ")" block)*
//!                ("else" block)?
//! while_stmt   = "while" "(" expr ")" block
//! expr         = precedence-climbed binary/unary/call/increment grammar
//! ```
//!
//! Expressions use precedence climbing: parse a prefix term, then while the
//! next token is an infix form binding tighter than the current minimum,
//! consume it and parse its right-hand side at its own precedence. Calls and
//! postfix `++`/`--` are infix forms on an identifier.
//!
//! The parser is fail-fast: the first structural mismatch produces a
//! location-tagged [`CompileError`] and no partial AST is returned.

use crate::ast::{
    AssignOp, BinOp, Block, Expr, IncDecOp, Param, Program, Stmt, Type, UnaryOp,
};
use crate::errors::{CompileError, Phase, Result};
use crate::lexer::{tokenize, SpannedToken, Token};

/// Binding strength of infix forms, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equality,    // == or !=
    LessGreater, // < or >
    Sum,         // + or -
    Product,     // *, / or %
    Prefix,      // -x, !x, ++x
    Call,        // f(x)
}

/// The precedence an infix occurrence of `token` binds with.
fn precedence_of(token: Token) -> Precedence {
    match token {
        Token::EqualEqual | Token::BangEqual => Precedence::Equality,
        Token::Less | Token::Greater => Precedence::LessGreater,
        Token::Plus | Token::Minus => Precedence::Sum,
        Token::Star | Token::Slash | Token::Percent => Precedence::Product,
        Token::PlusPlus | Token::MinusMinus => Precedence::Prefix,
        Token::LParen => Precedence::Call,
        _ => Precedence::Lowest,
    }
}

/// Recursive-descent parser over a pre-lexed token vector.
pub struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    /// Create a new parser by lexing the full source up-front.
    pub fn new(source: &str) -> Result<Self> {
        Ok(Self { tokens: tokenize(source)?, pos: 0 })
    }

    // ── helpers ──────────────────────────────────────────────────────

    /// The kind of the current token.
    fn peek(&self) -> Token {
        self.tokens[self.pos].token
    }

    /// The kind of the token after the current one.
    fn peek_next(&self) -> Token {
        self.tokens.get(self.pos + 1).map_or(Token::Eof, |t| t.token)
    }

    /// Consume and return the current token. The Eof sentinel is never
    /// consumed, so the cursor cannot run off the end.
    fn advance(&mut self) -> SpannedToken {
        let tok = self.tokens[self.pos].clone();
        if tok.token != Token::Eof {
            self.pos += 1;
        }
        tok
    }

    /// Consume the current token and require it to be `expected`.
    fn expect(&mut self, expected: Token) -> Result<SpannedToken> {
        let tok = self.advance();
        if tok.token != expected {
            return Err(self.error_at(
                &tok,
                format!("expected {}, got {}", expected.describe(), tok.token.describe()),
            ));
        }
        Ok(tok)
    }

    fn error_at(&self, tok: &SpannedToken, message: String) -> CompileError {
        CompileError::new(Phase::Parse, format!("({}) {message}", tok.loc))
    }

    // ── grammar rules ───────────────────────────────────────────────

    /// Entry point — parse the entire source into a [`Program`].
    ///
    /// Only function declarations and global variable declarations are
    /// valid at the top level.
    pub fn parse_program(&mut self) -> Result<Program> {
        let mut statements = Vec::new();

        while self.peek() != Token::Eof {
            let stmt = match self.peek() {
                Token::Func => self.parse_func_decl()?,
                Token::TypeName => self.parse_global_var_decl()?,
                _ => {
                    let tok = self.advance();
                    return Err(self.error_at(
                        &tok,
                        format!("unexpected {} at top level", tok.token.describe()),
                    ));
                }
            };
            statements.push(stmt);
        }

        Ok(Program { statements })
    }

    /// Parse a function declaration.
    ///
    /// Block form:  `func name(a:int):int { … }`
    /// Arrow form:  `func name(a:int):int => a + 1;`
    fn parse_func_decl(&mut self) -> Result<Stmt> {
        self.expect(Token::Func)?;
        let name = self.expect(Token::Ident)?.lexeme;

        self.expect(Token::LParen)?;
        let params = self.parse_params()?;
        self.expect(Token::RParen)?;

        // ── optional return type: func name():int ────────────────
        let return_type = if self.peek() == Token::Colon {
            self.advance();
            Some(self.parse_type()?)
        } else {
            None
        };

        // ── arrow body: desugar to a one-statement return block ──
        if self.peek() == Token::FatArrow {
            self.advance();
            let value = self.parse_expression(Precedence::Lowest)?;
            self.expect(Token::Semi)?;
            let body = Block { statements: vec![Stmt::Return(Some(value))] };
            return Ok(Stmt::FuncDecl { name, params, return_type, body });
        }

        let body = self.parse_block()?;
        Ok(Stmt::FuncDecl { name, params, return_type, body })
    }

    /// Parse a comma-separated `name:type` parameter list (parens excluded).
    fn parse_params(&mut self) -> Result<Vec<Param>> {
        let mut params = Vec::new();

        if self.peek() == Token::RParen {
            return Ok(params);
        }

        loop {
            let name = self.expect(Token::Ident)?.lexeme;
            self.expect(Token::Colon)?;
            let ty = self.parse_type()?;
            params.push(Param { name, ty });

            if self.peek() == Token::Comma {
                self.advance();
            } else {
                break;
            }
        }

        Ok(params)
    }

    /// Consume a type keyword token and map it to a [`Type`].
    fn parse_type(&mut self) -> Result<Type> {
        let tok = self.expect(Token::TypeName)?;
        Type::from_keyword(&tok.lexeme)
            .ok_or_else(|| self.error_at(&tok, format!("unknown type name '{}'", tok.lexeme)))
    }

    /// Parse a braced statement list.
    fn parse_block(&mut self) -> Result<Block> {
        self.expect(Token::LBrace)?;

        let mut statements = Vec::new();
        while self.peek() != Token::RBrace && self.peek() != Token::Eof {
            statements.push(self.parse_statement()?);
        }

        self.expect(Token::RBrace)?;
        Ok(Block { statements })
    }

    /// Parse a single statement inside a block.
    fn parse_statement(&mut self) -> Result<Stmt> {
        match self.peek() {
            Token::TypeName => self.parse_var_decl(),
            Token::Return => self.parse_return(),
            Token::If => self.parse_if(),
            Token::While => self.parse_while(),
            Token::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            Token::Ident => match self.peek_next() {
                // f(…);
                Token::LParen => self.parse_expression_stmt(),
                // x++; and x--;
                Token::PlusPlus | Token::MinusMinus => self.parse_expression_stmt(),
                _ => self.parse_assign(),
            },
            // ++x; and --x;
            Token::PlusPlus | Token::MinusMinus => self.parse_expression_stmt(),
            _ => self.parse_expression_stmt(),
        }
    }

    /// Parse a local variable declaration: `int x = expr;`
    fn parse_var_decl(&mut self) -> Result<Stmt> {
        let ty = self.parse_type()?;
        let name = self.expect(Token::Ident)?.lexeme;
        self.expect(Token::Equal)?;
        let init = self.parse_expression(Precedence::Lowest)?;
        self.expect(Token::Semi)?;
        Ok(Stmt::VarDecl { ty, name, init })
    }

    /// Parse a file-scope variable declaration — same shape as a local one.
    fn parse_global_var_decl(&mut self) -> Result<Stmt> {
        match self.parse_var_decl()? {
            Stmt::VarDecl { ty, name, init } => Ok(Stmt::GlobalVarDecl { ty, name, init }),
            _ => unreachable!("parse_var_decl only builds VarDecl"),
        }
    }

    /// Parse an assignment: `x = expr;`, `x += expr;`, …
    fn parse_assign(&mut self) -> Result<Stmt> {
        let name = self.expect(Token::Ident)?.lexeme;

        let op_tok = self.advance();
        let op = match op_tok.token {
            Token::Equal      => AssignOp::Assign,
            Token::PlusEqual  => AssignOp::AddAssign,
            Token::MinusEqual => AssignOp::SubAssign,
            Token::StarEqual  => AssignOp::MulAssign,
            Token::SlashEqual => AssignOp::DivAssign,
            other => {
                return Err(self.error_at(
                    &op_tok,
                    format!(
                        "expected assignment operator after identifier, got {}",
                        other.describe(),
                    ),
                ));
            }
        };

        let value = self.parse_expression(Precedence::Lowest)?;
        self.expect(Token::Semi)?;
        Ok(Stmt::Assign { name, op, value })
    }

    /// Parse `return expr;` or a bare `return;`.
    fn parse_return(&mut self) -> Result<Stmt> {
        self.expect(Token::Return)?;

        if self.peek() == Token::Semi {
            self.advance();
            return Ok(Stmt::Return(None));
        }

        let value = self.parse_expression(Precedence::Lowest)?;
        self.expect(Token::Semi)?;
        Ok(Stmt::Return(Some(value)))
    }

    /// Parse an `if` statement with optional `else if` chain and `else`.
    fn parse_if(&mut self) -> Result<Stmt> {
        self.expect(Token::If)?;
        self.expect(Token::LParen)?;
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect(Token::RParen)?;
        let then_block = self.parse_block()?;

        let mut else_ifs = Vec::new();
        while self.peek() == Token::Else && self.peek_next() == Token::If {
            self.advance(); // 'else'
            self.advance(); // 'if'
            self.expect(Token::LParen)?;
            let cond = self.parse_expression(Precedence::Lowest)?;
            self.expect(Token::RParen)?;
            let block = self.parse_block()?;
            else_ifs.push((cond, block));
        }

        let else_block = if self.peek() == Token::Else {
            self.advance();
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(Stmt::If { condition, then_block, else_ifs, else_block })
    }

    /// Parse a `while` loop.
    fn parse_while(&mut self) -> Result<Stmt> {
        self.expect(Token::While)?;
        self.expect(Token::LParen)?;
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect(Token::RParen)?;
        let body = self.parse_block()?;
        Ok(Stmt::While { condition, body })
    }

    /// Parse an expression followed by `;`.
    fn parse_expression_stmt(&mut self) -> Result<Stmt> {
        let value = self.parse_expression(Precedence::Lowest)?;
        self.expect(Token::Semi)?;
        Ok(Stmt::Expr(value))
    }

    // ── expressions ─────────────────────────────────────────────────

    /// Precedence climbing: parse a prefix term, then fold infix forms
    /// binding tighter than `min`.
    fn parse_expression(&mut self, min: Precedence) -> Result<Expr> {
        let mut left = self.parse_prefix()?;

        while min < precedence_of(self.peek()) {
            left = self.parse_infix(left)?;
        }

        Ok(left)
    }

    /// Parse a prefix term: literal, identifier, unary operator, prefix
    /// increment/decrement or parenthesised grouping.
    fn parse_prefix(&mut self) -> Result<Expr> {
        let tok = self.advance();

        match tok.token {
            Token::Ident => Ok(Expr::Identifier(tok.lexeme)),
            Token::Int => Ok(Expr::IntLiteral(tok.lexeme)),
            Token::Str => Ok(Expr::StringLiteral(tok.lexeme)),
            Token::True => Ok(Expr::BoolLiteral(true)),
            Token::False => Ok(Expr::BoolLiteral(false)),
            Token::Minus => Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(self.parse_expression(Precedence::Prefix)?),
            }),
            Token::Bang => Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(self.parse_expression(Precedence::Prefix)?),
            }),
            Token::PlusPlus | Token::MinusMinus => {
                let op = if tok.token == Token::PlusPlus {
                    IncDecOp::Increment
                } else {
                    IncDecOp::Decrement
                };
                let target = self.expect(Token::Ident)?.lexeme;
                Ok(Expr::IncDec { op, target, is_prefix: true })
            }
            Token::LParen => {
                let inner = self.parse_expression(Precedence::Lowest)?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            other => Err(self.error_at(
                &tok,
                format!("expected an expression, got {}", other.describe()),
            )),
        }
    }

    /// Fold one infix form onto `left`: a binary operator, a call, or a
    /// postfix increment/decrement.
    fn parse_infix(&mut self, left: Expr) -> Result<Expr> {
        match self.peek() {
            Token::Plus | Token::Minus | Token::Star | Token::Slash | Token::Percent
            | Token::EqualEqual | Token::BangEqual | Token::Less | Token::Greater => {
                let op_tok = self.advance();
                let op = match op_tok.token {
                    Token::Plus       => BinOp::Add,
                    Token::Minus      => BinOp::Sub,
                    Token::Star       => BinOp::Mul,
                    Token::Slash      => BinOp::Div,
                    Token::Percent    => BinOp::Rem,
                    Token::EqualEqual => BinOp::Eq,
                    Token::BangEqual  => BinOp::Ne,
                    Token::Less       => BinOp::Lt,
                    Token::Greater    => BinOp::Gt,
                    _ => unreachable!("guarded by the outer match"),
                };
                let right = self.parse_expression(precedence_of(op_tok.token))?;
                Ok(Expr::Binary { left: Box::new(left), op, right: Box::new(right) })
            }

            // An identifier immediately followed by '(' is a call.
            Token::LParen => {
                let lparen = self.advance();
                let callee = match left {
                    Expr::Identifier(name) => name,
                    _ => {
                        return Err(self.error_at(
                            &lparen,
                            "expected a function name before '('".to_string(),
                        ));
                    }
                };
                let args = self.parse_args()?;
                self.expect(Token::RParen)?;
                Ok(Expr::Call { callee, args })
            }

            Token::PlusPlus | Token::MinusMinus => {
                let op_tok = self.advance();
                let op = if op_tok.token == Token::PlusPlus {
                    IncDecOp::Increment
                } else {
                    IncDecOp::Decrement
                };
                let target = match left {
                    Expr::Identifier(name) => name,
                    _ => {
                        return Err(self.error_at(
                            &op_tok,
                            format!(
                                "expected identifier before {}",
                                op_tok.token.describe(),
                            ),
                        ));
                    }
                };
                Ok(Expr::IncDec { op, target, is_prefix: false })
            }

            other => {
                let tok = self.advance();
                Err(self.error_at(
                    &tok,
                    format!("expected an infix operator, got {}", other.describe()),
                ))
            }
        }
    }

    /// Parse a comma-separated argument list (parens excluded).
    fn parse_args(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();

        if self.peek() == Token::RParen {
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression(Precedence::Lowest)?);
            if self.peek() == Token::Comma {
                self.advance();
            } else {
                break;
            }
        }

        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(source: &str) -> Result<Program> {
        Parser::new(source)?.parse_program()
    }

    /// Parse `source` as the body of a throwaway function and return the
    /// first statement.
    fn parse_stmt(source: &str) -> Stmt {
        let wrapped = format!("func t() {{ {source} }}");
        let program = parse(&wrapped).unwrap();
        match program.statements.into_iter().next().unwrap() {
            Stmt::FuncDecl { body, .. } => body.statements.into_iter().next().unwrap(),
            other => panic!("expected FuncDecl, got {other:?}"),
        }
    }

    fn parse_expr(source: &str) -> Expr {
        match parse_stmt(&format!("return {source};")) {
            Stmt::Return(Some(expr)) => expr,
            other => panic!("expected return statement, got {other:?}"),
        }
    }

    fn int(text: &str) -> Expr {
        Expr::IntLiteral(text.to_string())
    }

    fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
        Expr::Binary { left: Box::new(left), op, right: Box::new(right) }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(
            parse_expr("1 + 2 * 3"),
            binary(int("1"), BinOp::Add, binary(int("2"), BinOp::Mul, int("3"))),
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(
            parse_expr("10 - 2 - 3"),
            binary(binary(int("10"), BinOp::Sub, int("2")), BinOp::Sub, int("3")),
        );
    }

    #[test]
    fn comparison_binds_looser_than_arithmetic() {
        assert_eq!(
            parse_expr("a + 1 < b * 2"),
            binary(
                binary(Expr::Identifier("a".into()), BinOp::Add, int("1")),
                BinOp::Lt,
                binary(Expr::Identifier("b".into()), BinOp::Mul, int("2")),
            ),
        );
    }

    #[test]
    fn unary_minus_binds_tighter_than_multiplication() {
        assert_eq!(
            parse_expr("-a * 2"),
            binary(
                Expr::Unary { op: UnaryOp::Neg, operand: Box::new(Expr::Identifier("a".into())) },
                BinOp::Mul,
                int("2"),
            ),
        );
    }

    #[test]
    fn grouping_overrides_precedence() {
        assert_eq!(
            parse_expr("(1 + 2) * 3"),
            binary(binary(int("1"), BinOp::Add, int("2")), BinOp::Mul, int("3")),
        );
    }

    #[test]
    fn call_with_expression_arguments() {
        assert_eq!(
            parse_expr("add(2, 3 * x)"),
            Expr::Call {
                callee: "add".into(),
                args: vec![
                    int("2"),
                    binary(int("3"), BinOp::Mul, Expr::Identifier("x".into())),
                ],
            },
        );
    }

    #[test]
    fn postfix_and_prefix_increment() {
        assert_eq!(
            parse_stmt("x++;"),
            Stmt::Expr(Expr::IncDec {
                op: IncDecOp::Increment,
                target: "x".into(),
                is_prefix: false,
            }),
        );
        assert_eq!(
            parse_stmt("--x;"),
            Stmt::Expr(Expr::IncDec {
                op: IncDecOp::Decrement,
                target: "x".into(),
                is_prefix: true,
            }),
        );
    }

    #[test]
    fn compound_assignment() {
        assert_eq!(
            parse_stmt("x += 5;"),
            Stmt::Assign { name: "x".into(), op: AssignOp::AddAssign, value: int("5") },
        );
    }

    #[test]
    fn arrow_function_desugars_to_return_block() {
        let program = parse("func add(a:int, b:int):int => a + b;").unwrap();
        assert_eq!(
            program.statements,
            vec![Stmt::FuncDecl {
                name: "add".into(),
                params: vec![
                    Param { name: "a".into(), ty: Type::Int },
                    Param { name: "b".into(), ty: Type::Int },
                ],
                return_type: Some(Type::Int),
                body: Block {
                    statements: vec![Stmt::Return(Some(binary(
                        Expr::Identifier("a".into()),
                        BinOp::Add,
                        Expr::Identifier("b".into()),
                    )))],
                },
            }],
        );
    }

    #[test]
    fn if_else_if_else_chain() {
        let stmt = parse_stmt(indoc! {"
            if (x == 0) {
                return 1;
            } else if (x == 1) {
                return 2;
            } else {
                return 3;
            }
        "});
        match stmt {
            Stmt::If { else_ifs, else_block, .. } => {
                assert_eq!(else_ifs.len(), 1);
                assert!(else_block.is_some());
            }
            other => panic!("expected if statement, got {other:?}"),
        }
    }

    #[test]
    fn global_var_decl_at_top_level() {
        let program = parse("int g = 10;").unwrap();
        assert_eq!(
            program.statements,
            vec![Stmt::GlobalVarDecl { ty: Type::Int, name: "g".into(), init: int("10") }],
        );
    }

    #[test]
    fn rejects_plain_statement_at_top_level() {
        let err = parse("return 1;").unwrap_err();
        assert_eq!(err.phase, Phase::Parse);
        assert!(err.message.contains("at top level"), "{}", err.message);
    }

    #[test]
    fn reports_expected_and_actual_with_location() {
        let err = parse("func main() { int x 5; }").unwrap_err();
        assert_eq!(err.phase, Phase::Parse);
        assert_eq!(err.message, "(1:21) expected '=', got integer literal");
    }

    #[test]
    fn reports_missing_closing_brace() {
        let err = parse("func main() { return 1;").unwrap_err();
        assert!(
            err.message.contains("expected '}', got end of input"),
            "{}",
            err.message,
        );
    }

    #[test]
    fn rejects_missing_semicolon_after_assignment() {
        let err = parse("func main() { x = 1 }").unwrap_err();
        assert!(err.message.contains("expected ';'"), "{}", err.message);
    }
}
