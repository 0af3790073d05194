//! Error types for parsing

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::parser::lexer::Token;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Parse error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },
}

impl ParseError {
    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let mut buf = Vec::new();
        match self {
            ParseError::Syntax {
                span,
                message,
                expected,
            } => {
                let expected_str = if expected.is_empty() {
                    String::new()
                } else {
                    format!("\nExpected: {}", expected.join(", "))
                };

                let written = Report::build(ReportKind::Error, filename, span.start)
                    .with_message(message)
                    .with_label(
                        Label::new((filename, span.clone()))
                            .with_message(format!("{}{}", message, expected_str))
                            .with_color(Color::Red),
                    )
                    .finish()
                    .write((filename, Source::from(source)), &mut buf);
                if written.is_err() {
                    return self.to_string();
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl<'a> From<chumsky::error::Rich<'a, Token>> for ParseError {
    fn from(err: chumsky::error::Rich<'a, Token>) -> Self {
        let message = match err.found() {
            Some(tok) => format!("Unexpected {}", format_token(tok)),
            None => "Unexpected end of input".to_string(),
        };

        let expected: Vec<String> = err.expected().map(|e| format!("{:?}", e)).collect();

        ParseError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &Token) -> String {
    match tok {
        Token::Text(s) => format!("text {:?}", s),
        Token::Comment(_) => "comment".to_string(),
        Token::Tag(tag) => format!("tag <{}>", tag.name),
        Token::Marker(m) => format!("marker {}", m),
        Token::Newline => "newline".to_string(),
        other => format!("'{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_includes_message() {
        let err = ParseError::Syntax {
            span: 2..4,
            message: "Unexpected '}}'".to_string(),
            expected: vec!["'|'".to_string()],
        };
        let report = err.format("a {{ b", "page.wiki");
        assert!(report.contains("Unexpected '}}'"));
        assert!(report.contains("page.wiki"));
    }

    #[test]
    fn test_format_token() {
        assert_eq!(format_token(&Token::TemplateClose), "'}}'");
        assert_eq!(format_token(&Token::Text("x".into())), "text \"x\"");
    }
}
