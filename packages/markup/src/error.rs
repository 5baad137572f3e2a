use crate::lexer::TokenSpan;
use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token at {span:?}: expected {expected}, found {found}")]
    UnexpectedToken {
        span: TokenSpan,
        expected: String,
        found: String,
    },

    #[error("Closing tag </{tag}> at {span:?} has no matching open element")]
    UnmatchedClose { span: TokenSpan, tag: String },

    #[error("Unterminated {construct} starting at {span:?}")]
    Unterminated { span: TokenSpan, construct: String },

    #[error("Lexer error at {span:?}: {message}")]
    LexError { span: TokenSpan, message: String },
}

impl ParseError {
    pub fn unexpected_token(
        span: TokenSpan,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::UnexpectedToken {
            span,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unmatched_close(span: TokenSpan, tag: impl Into<String>) -> Self {
        Self::UnmatchedClose {
            span,
            tag: tag.into(),
        }
    }

    pub fn unterminated(span: TokenSpan, construct: impl Into<String>) -> Self {
        Self::Unterminated {
            span,
            construct: construct.into(),
        }
    }

    pub fn lex_error(span: TokenSpan, message: impl Into<String>) -> Self {
        Self::LexError {
            span,
            message: message.into(),
        }
    }

    pub fn span(&self) -> TokenSpan {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::UnmatchedClose { span, .. }
            | ParseError::Unterminated { span, .. }
            | ParseError::LexError { span, .. } => *span,
        }
    }

    /// Short label used when rendering diagnostics
    pub fn label(&self) -> String {
        match self {
            ParseError::UnexpectedToken { expected, .. } => format!("expected {}", expected),
            ParseError::UnmatchedClose { tag, .. } => format!("no open <{}> to close", tag),
            ParseError::Unterminated { construct, .. } => format!("{} never ends", construct),
            ParseError::LexError { message, .. } => message.clone(),
        }
    }
}

/// Pretty-print a parse error with source context using ariadne
#[cfg(feature = "pretty-errors")]
pub mod pretty {
    use super::ParseError;
    use ariadne::{Color, Label, Report, ReportKind, Source};

    pub fn format_error(error: &ParseError, filename: &str, source: &str) -> String {
        let span = error.span();
        let start = span.start.min(source.len());
        let end = span.end.clamp(start, source.len());

        let mut output = Vec::new();
        let report = Report::build(ReportKind::Error, filename, start)
            .with_message(error.to_string())
            .with_label(
                Label::new((filename, start..end))
                    .with_color(Color::Red)
                    .with_message(error.label()),
            )
            .finish();

        if report
            .write((filename, Source::from(source)), &mut output)
            .is_err()
        {
            return error.to_string();
        }

        String::from_utf8(output).unwrap_or_else(|_| error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_fragment;

    #[test]
    fn test_parser_errors_carry_span_and_label() {
        let err = parse_fragment("<div></span></div>").unwrap_err();
        assert!(matches!(err, ParseError::UnmatchedClose { .. }));
        assert_eq!(err.span(), TokenSpan::new(5, 12));
        assert_eq!(err.label(), "no open <span> to close");

        let err = parse_fragment("<p id=\"a\"").unwrap_err();
        assert!(matches!(err, ParseError::Unterminated { .. }));
        assert_eq!(err.label(), "start tag never ends");
        assert_eq!(err.span().start, 0);
    }
}
