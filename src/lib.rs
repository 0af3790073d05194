//! Wikiflat - flatten wiki markup by evaluating magic words and templates
//!
//! This library parses wiki markup, resolves the magic words, parser
//! functions and templates it has handlers for, and leaves everything else
//! as the original markup.
//!
//! # Example
//!
//! ```rust
//! use wikiflat::{flatten_with_config, FlattenConfig};
//!
//! let config = FlattenConfig::new().with_title("Help:Editing");
//! let result = flatten_with_config("You are reading {{PAGENAME}}.", &config).unwrap();
//! assert_eq!(result.text(), "You are reading Editing.");
//! ```

pub mod compare;
pub mod error;
pub mod eval;
pub mod parser;
pub mod site;
pub mod title;

pub use compare::{FlatteningComparer, Markup, TextComparison};
pub use error::ParseError;
pub use eval::{
    evaluate_nodes, evaluate_page, evaluate_text, Context, EvalError, Evaluation, Frame, Handler,
    HandlerKind, HandlerRegistry, Page, Parameters, RegistryError, UnhandledWords,
};
pub use parser::{parse, Node};
pub use site::{Site, SiteError};
pub use title::Title;

use thiserror::Error;

/// Errors that can occur during the flatten pipeline
#[derive(Debug, Error)]
pub enum FlattenError {
    /// Error loading the site
    #[error("site error: {0}")]
    Site(#[from] SiteError),

    /// Error registering the built-in handlers
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Error during evaluation
    #[error("{0}")]
    Eval(#[from] EvalError),
}

/// Configuration for the flatten pipeline
#[derive(Debug, Clone, Default)]
pub struct FlattenConfig {
    /// Namespaces, magic words and extension tags
    pub site: Site,
    /// Title of the page being flattened, for the title magic words
    pub title: Option<String>,
}

impl FlattenConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the site
    pub fn with_site(mut self, site: Site) -> Self {
        self.site = site;
        self
    }

    /// Set the page title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Flatten markup with the default site and no page title
///
/// # Example
///
/// ```rust
/// use wikiflat::flatten;
///
/// let result = flatten("a {{lc:LOUD}} [[Target|link]] {{Unknown}}").unwrap();
/// assert_eq!(result.text(), "a loud link {{Unknown}}");
/// assert!(result.unhandled_words().contains("Unknown"));
/// ```
pub fn flatten(source: &str) -> Result<Evaluation, FlattenError> {
    flatten_with_config(source, &FlattenConfig::default())
}

/// Flatten markup with the built-in handlers registered for `config.site`
pub fn flatten_with_config(source: &str, config: &FlattenConfig) -> Result<Evaluation, FlattenError> {
    let registry = HandlerRegistry::with_defaults(&config.site)?;
    let mut context = Context::new(&config.site, &registry);
    if let Some(title) = &config.title {
        context = context.with_title(config.site.parse_title(title, site::MAIN_NAMESPACE));
    }
    Ok(evaluate_text(source, &context)?)
}
