//! Magic word and template evaluation
//!
//! Markup is parsed into nodes and flattened by an [`Evaluator`] walking the
//! tree inside a stack of [`Frame`]s. Each template node becomes a frame
//! that the [`HandlerRegistry`] dispatches to a handler; unresolved
//! invocations are emitted as their original markup and recorded in
//! [`UnhandledWords`].

pub mod builtins;
mod evaluator;
mod frame;
mod registry;

pub use evaluator::Evaluator;
pub use frame::{Frame, Parameters};
pub use registry::{Handler, HandlerKind, HandlerRegistry, RegistryError, UnhandledWords};

use thiserror::Error;

use crate::error::ParseError;
use crate::parser::{parse_with_tags, Node};
use crate::site::{Site, MAIN_NAMESPACE};
use crate::title::Title;

/// Errors that can occur during evaluation
#[derive(Debug, Error)]
pub enum EvalError {
    /// A parameter node was reached outside its template
    #[error("parameter node visited outside of a template")]
    ParameterVisited,

    /// The markup could not be parsed
    #[error("parse errors: {}", format_parse_errors(.0))]
    Parse(Vec<ParseError>),
}

impl From<Vec<ParseError>> for EvalError {
    fn from(errors: Vec<ParseError>) -> Self {
        EvalError::Parse(errors)
    }
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A page being evaluated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub title: String,
    pub content: Option<String>,
}

impl Page {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// Everything handlers may consult while an evaluation runs
#[derive(Debug, Clone)]
pub struct Context<'s> {
    site: &'s Site,
    registry: &'s HandlerRegistry,
    page: Option<Page>,
    title: Option<Title>,
}

impl<'s> Context<'s> {
    pub fn new(site: &'s Site, registry: &'s HandlerRegistry) -> Self {
        Self {
            site,
            registry,
            page: None,
            title: None,
        }
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }

    /// Override the title title-words resolve against
    pub fn with_title(mut self, title: Title) -> Self {
        self.title = Some(title);
        self
    }

    pub fn site(&self) -> &'s Site {
        self.site
    }

    pub fn registry(&self) -> &'s HandlerRegistry {
        self.registry
    }

    pub fn page(&self) -> Option<&Page> {
        self.page.as_ref()
    }

    /// The explicit title, else the page's title
    pub fn current_title(&self) -> Option<Title> {
        self.title.clone().or_else(|| {
            self.page
                .as_ref()
                .map(|page| Title::parse(self.site, &page.title, MAIN_NAMESPACE))
        })
    }
}

/// The result of flattening: output text and the invocations nobody handled
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    text: String,
    unhandled_words: UnhandledWords,
}

impl Evaluation {
    pub fn new(text: String, unhandled_words: UnhandledWords) -> Self {
        Self {
            text,
            unhandled_words,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn unhandled_words(&self) -> &UnhandledWords {
        &self.unhandled_words
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn into_parts(self) -> (String, UnhandledWords) {
        (self.text, self.unhandled_words)
    }
}

/// Parse and flatten markup in a fresh root frame
pub fn evaluate_text(raw: &str, context: &Context<'_>) -> Result<Evaluation, EvalError> {
    if raw.is_empty() {
        return Ok(Evaluation::default());
    }
    let nodes = parse_with_tags(raw, context.site().extension_tags().clone())?;
    evaluate_nodes(&nodes, context, &Frame::root())
}

/// Flatten already parsed nodes within `frame`
pub fn evaluate_nodes(
    nodes: &[Node],
    context: &Context<'_>,
    frame: &Frame<'_>,
) -> Result<Evaluation, EvalError> {
    Evaluator::new(context, frame).evaluate(nodes)
}

/// Flatten the content of the context's page; a page without content
/// flattens to nothing
pub fn evaluate_page(context: &Context<'_>) -> Result<Evaluation, EvalError> {
    match context.page().and_then(|page| page.content.as_deref()) {
        Some(content) => evaluate_text(content, context),
        None => Ok(Evaluation::default()),
    }
}
