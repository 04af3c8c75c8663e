//! Tokenizer for the Ember language.
//!
//! The token enum is a [`logos`] lexer; [`tokenize`] runs it over the whole
//! source up-front and produces a flat vector of tokens with (line, column)
//! locations, terminated by a single [`Token::Eof`] sentinel.

use logos::Logos;

use crate::errors::{CompileError, Phase, Result};

#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
#[logos(skip r"[ \t\n\r\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    // ── keywords ────────────────────────────────────────────────
    #[token("func")]
    Func,

    #[token("return")]
    Return,

    #[token("if")]
    If,

    #[token("else")]
    Else,

    #[token("while")]
    While,

    #[token("true")]
    True,

    #[token("false")]
    False,

    /// A type keyword: `int`, `bool` or `string`.
    #[token("int")]
    #[token("bool")]
    #[token("string")]
    TypeName,

    // ── punctuation ─────────────────────────────────────────────
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,

    #[token(";")]
    Semi,

    // ── operators ───────────────────────────────────────────────
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("=")]
    Equal,

    #[token("+=")]
    PlusEqual,

    #[token("-=")]
    MinusEqual,

    #[token("*=")]
    StarEqual,

    #[token("/=")]
    SlashEqual,

    #[token("==")]
    EqualEqual,

    #[token("!=")]
    BangEqual,

    #[token("<")]
    Less,

    #[token(">")]
    Greater,

    #[token("++")]
    PlusPlus,

    #[token("--")]
    MinusMinus,

    #[token("=>")]
    FatArrow,

    #[token("!")]
    Bang,

    // ── literals ────────────────────────────────────────────────

    /// Integer literal: 42, 0, 100
    #[regex(r"[0-9]+")]
    Int,

    /// String literal: "hello world"
    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,

    /// Identifier: foo, main, my_var
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    /// End-of-input sentinel, appended by [`tokenize`]. Source text never
    /// contains a NUL byte, so the pattern never fires on real input.
    #[token("\0")]
    Eof,
}

impl Token {
    /// Human-readable form used in "expected X, got Y" diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            Token::Func       => "'func'",
            Token::Return     => "'return'",
            Token::If         => "'if'",
            Token::Else       => "'else'",
            Token::While      => "'while'",
            Token::True       => "'true'",
            Token::False      => "'false'",
            Token::TypeName   => "type name",
            Token::LParen     => "'('",
            Token::RParen     => "')'",
            Token::LBrace     => "'{'",
            Token::RBrace     => "'}'",
            Token::Comma      => "','",
            Token::Colon      => "':'",
            Token::Semi       => "';'",
            Token::Plus       => "'+'",
            Token::Minus      => "'-'",
            Token::Star       => "'*'",
            Token::Slash      => "'/'",
            Token::Percent    => "'%'",
            Token::Equal      => "'='",
            Token::PlusEqual  => "'+='",
            Token::MinusEqual => "'-='",
            Token::StarEqual  => "'*='",
            Token::SlashEqual => "'/='",
            Token::EqualEqual => "'=='",
            Token::BangEqual  => "'!='",
            Token::Less       => "'<'",
            Token::Greater    => "'>'",
            Token::PlusPlus   => "'++'",
            Token::MinusMinus => "'--'",
            Token::FatArrow   => "'=>'",
            Token::Bang       => "'!'",
            Token::Int        => "integer literal",
            Token::Str        => "string literal",
            Token::Ident      => "identifier",
            Token::Eof        => "end of input",
        }
    }
}

/// A (line, column) source position, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub col: usize,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// A single token together with the source text it matched.
#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub lexeme: String,
    pub loc: Location,
}

/// Lex the full source into an owned token vector ending in [`Token::Eof`].
///
/// Fails on the first unknown character or unterminated string literal.
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let loc = location_at(source, span.start);

        match result {
            Ok(token) => {
                // String lexemes drop the surrounding quotes and resolve
                // escape sequences; everything else keeps the raw slice.
                let lexeme = if token == Token::Str {
                    unescape(&source[span.start + 1..span.end - 1])
                } else {
                    lexer.slice().to_string()
                };
                tokens.push(SpannedToken { token, lexeme, loc });
            }
            Err(()) => {
                let offending = source[span.clone()].chars().next().unwrap_or('\0');
                let message = if offending == '"' {
                    format!("({loc}) unterminated string literal")
                } else {
                    format!("({loc}) unknown character '{offending}'")
                };
                return Err(CompileError::new(Phase::Lex, message));
            }
        }
    }

    tokens.push(SpannedToken {
        token: Token::Eof,
        lexeme: String::new(),
        loc: location_at(source, source.len()),
    });

    Ok(tokens)
}

/// Translate a byte offset into a 1-based (line, column) pair.
fn location_at(source: &str, offset: usize) -> Location {
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let col = offset - before.rfind('\n').map_or(0, |i| i + 1) + 1;
    Location { line, col }
}

/// Resolve the escape sequences a string literal may contain.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n')  => out.push('\n'),
            Some('t')  => out.push('\t'),
            Some('r')  => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('"')  => out.push('"'),
            Some('0')  => out.push('\0'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source).unwrap().into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn lexes_function_header() {
        assert_eq!(
            kinds("func add(a:int, b:int):int"),
            vec![
                Token::Func, Token::Ident, Token::LParen,
                Token::Ident, Token::Colon, Token::TypeName, Token::Comma,
                Token::Ident, Token::Colon, Token::TypeName, Token::RParen,
                Token::Colon, Token::TypeName, Token::Eof,
            ],
        );
    }

    #[test]
    fn lexes_compound_operators_greedily() {
        assert_eq!(
            kinds("+ += ++ = == => ! != -- -="),
            vec![
                Token::Plus, Token::PlusEqual, Token::PlusPlus,
                Token::Equal, Token::EqualEqual, Token::FatArrow,
                Token::Bang, Token::BangEqual,
                Token::MinusMinus, Token::MinusEqual, Token::Eof,
            ],
        );
    }

    #[test]
    fn skips_line_comments() {
        assert_eq!(
            kinds("x // trailing comment\ny"),
            vec![Token::Ident, Token::Ident, Token::Eof],
        );
    }

    #[test]
    fn tracks_line_and_column() {
        let tokens = tokenize("func main\n  x").unwrap();
        assert_eq!(tokens[0].loc, Location { line: 1, col: 1 });
        assert_eq!(tokens[1].loc, Location { line: 1, col: 6 });
        assert_eq!(tokens[2].loc, Location { line: 2, col: 3 });
    }

    #[test]
    fn string_lexeme_drops_quotes_and_unescapes() {
        let tokens = tokenize(r#""value: %d\n""#).unwrap();
        assert_eq!(tokens[0].token, Token::Str);
        assert_eq!(tokens[0].lexeme, "value: %d\n");
    }

    #[test]
    fn rejects_unknown_character() {
        let err = tokenize("int x = 1 @").unwrap_err();
        assert_eq!(err.phase, Phase::Lex);
        assert!(err.message.contains("unknown character '@'"), "{}", err.message);
    }

    #[test]
    fn rejects_unterminated_string() {
        let err = tokenize("\"no closing quote").unwrap_err();
        assert_eq!(err.phase, Phase::Lex);
        assert!(err.message.contains("unterminated string"), "{}", err.message);
    }
}
