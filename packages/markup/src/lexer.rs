//! Lexer for canvas markup using logos
//!
//! Markup is lexed in two layers. [`Token`] splits a document into tags,
//! text runs, comments and doctypes. The interior of a start tag is then
//! lexed with [`AttrToken`] into names, `=` and values.

use logos::{Lexer, Logos};

/// Top-level markup tokens
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'src> {
    #[token("<!--", skip_comment)]
    Comment,

    #[regex(r"<![^-][^>]*>")]
    Doctype,

    // Whole start tag including attributes; quoted values may contain `>`
    #[regex(r#"<[a-zA-Z][a-zA-Z0-9:_.-]*([^>"']|"[^"]*"|'[^']*')*>"#, |lex| lex.slice())]
    StartTag(&'src str),

    #[regex(r"</[a-zA-Z][a-zA-Z0-9:_.-]*[ \t\r\n]*>", |lex| lex.slice())]
    EndTag(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),
}

fn skip_comment<'src>(lex: &mut Lexer<'src, Token<'src>>) -> bool {
    match lex.remainder().find("-->") {
        Some(end) => {
            lex.bump(end + 3);
            true
        }
        None => false,
    }
}

/// Tokens inside a start tag
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum AttrToken<'src> {
    #[regex(r#"[^ \t\r\n\f"'<>=]+"#, |lex| lex.slice())]
    Word(&'src str),

    #[token("=")]
    Eq,

    #[regex(r#""[^"]*""#, strip_quotes)]
    #[regex(r"'[^']*'", strip_quotes)]
    Quoted(&'src str),
}

fn strip_quotes<'src>(lex: &mut Lexer<'src, AttrToken<'src>>) -> &'src str {
    let s = lex.slice();
    &s[1..s.len() - 1]
}

/// Byte range of a token in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
}

impl TokenSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Shift a span lexed from a slice back into document coordinates
    pub fn offset(self, by: usize) -> Self {
        Self {
            start: self.start + by,
            end: self.end + by,
        }
    }
}

impl From<std::ops::Range<usize>> for TokenSpan {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// A token with its span
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken<'src> {
    pub token: Token<'src>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub span: TokenSpan,
    pub message: String,
}

/// Lex markup into top-level tokens with spans
pub fn lex(source: &str) -> impl Iterator<Item = Result<SpannedToken<'_>, LexError>> + '_ {
    Token::lexer(source)
        .spanned()
        .map(|(result, span)| match result {
            Ok(token) => Ok(SpannedToken {
                token,
                span: span.into(),
            }),
            Err(_) => Err(LexError {
                span: span.into(),
                message: "Unterminated tag or stray '<'".to_string(),
            }),
        })
}
