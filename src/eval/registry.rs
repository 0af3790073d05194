//! Handler registry for magic words, parser functions and templates

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::trace;

use crate::site::{MagicWord, Site, TEMPLATE_NAMESPACE};
use crate::title::Title;

use super::builtins;
use super::frame::Frame;
use super::Context;

/// A resolver for one magic word or template.
///
/// Returning `None` declines the invocation; the evaluator then emits the
/// original markup.
pub type Handler = Arc<dyn Fn(&Context<'_>, &Frame<'_>) -> Option<String> + Send + Sync>;

/// Errors that can occur while registering handlers
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The magic word id is not in the site catalog
    #[error("magic word not found in site catalog: {word}")]
    UnknownMagicWord { word: String },
}

/// Which table a magic word handler is registered in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// `{{NAME}}` with no first argument and no parameters
    Variable,
    /// `{{name:argument|...}}`
    ParserFunction,
}

/// Invocation names that are never expanded while flattening
const SUBSTITUTIONS: [&str; 2] = ["subst", "safesubst"];
/// Message and raw transclusion prefixes, left as markup
const UNSUPPORTED_PREFIXES: [&str; 3] = ["msg", "msgnw", "raw"];

/// Alias table with a case-sensitive index and a case-folded index
#[derive(Default, Clone)]
struct HandlerTable {
    exact: HashMap<String, Handler>,
    folded: HashMap<String, Handler>,
}

impl HandlerTable {
    fn insert(&mut self, word: &MagicWord, handler: &Handler) {
        for alias in &word.aliases {
            let alias = alias.trim_end_matches(':');
            self.exact.insert(alias.to_string(), handler.clone());
            if !word.case_sensitive {
                self.folded.insert(alias.to_lowercase(), handler.clone());
            }
        }
    }

    fn get(&self, name: &str) -> Option<&Handler> {
        self.exact
            .get(name)
            .or_else(|| self.folded.get(&name.to_lowercase()))
    }

    fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.exact.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Magic words and templates that had no handler, by invocation name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnhandledWords(BTreeSet<String>);

impl UnhandledWords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a name; returns false if it was already present
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.0.insert(name.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.as_str())
    }
}

impl Extend<String> for UnhandledWords {
    fn extend<T: IntoIterator<Item = String>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl IntoIterator for UnhandledWords {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Registry of handlers, consulted by the evaluator for each template node
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    variables: HandlerTable,
    functions: HandlerTable,
    /// Normalised `Template:` title -> handler
    templates: HashMap<String, Handler>,
}

impl HandlerRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in title, case and behaviour-switch handlers
    pub fn with_defaults(site: &Site) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        builtins::register_defaults(&mut registry, site)?;
        Ok(registry)
    }

    /// Register a handler under every alias of the magic word `word`.
    ///
    /// Aliases are indexed as written; case-insensitive words are also
    /// indexed lower-cased. A trailing `:` on an alias is not part of the
    /// name.
    pub fn register<F>(
        &mut self,
        site: &Site,
        kind: HandlerKind,
        word: &str,
        handler: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&Context<'_>, &Frame<'_>) -> Option<String> + Send + Sync + 'static,
    {
        self.register_handler(site, kind, word, Arc::new(handler))
    }

    /// Register an already shared handler
    pub fn register_handler(
        &mut self,
        site: &Site,
        kind: HandlerKind,
        word: &str,
        handler: Handler,
    ) -> Result<(), RegistryError> {
        let magic_word = site
            .magic_word(word)
            .ok_or_else(|| RegistryError::UnknownMagicWord {
                word: word.to_string(),
            })?;
        let table = match kind {
            HandlerKind::Variable => &mut self.variables,
            HandlerKind::ParserFunction => &mut self.functions,
        };
        table.insert(magic_word, &handler);
        Ok(())
    }

    pub fn register_variable<F>(&mut self, site: &Site, word: &str, handler: F) -> Result<(), RegistryError>
    where
        F: Fn(&Context<'_>, &Frame<'_>) -> Option<String> + Send + Sync + 'static,
    {
        self.register(site, HandlerKind::Variable, word, handler)
    }

    pub fn register_function<F>(&mut self, site: &Site, word: &str, handler: F) -> Result<(), RegistryError>
    where
        F: Fn(&Context<'_>, &Frame<'_>) -> Option<String> + Send + Sync + 'static,
    {
        self.register(site, HandlerKind::ParserFunction, word, handler)
    }

    /// Register a template handler. `name` is resolved in the template
    /// namespace, so `Infobox` and `Template:infobox` are the same key.
    pub fn register_template<F>(&mut self, site: &Site, name: &str, handler: F)
    where
        F: Fn(&Context<'_>, &Frame<'_>) -> Option<String> + Send + Sync + 'static,
    {
        let title = Title::parse(site, name, TEMPLATE_NAMESPACE);
        self.templates.insert(title.full_name(), Arc::new(handler));
    }

    pub fn variable(&self, name: &str) -> Option<&Handler> {
        self.variables.get(name)
    }

    pub fn function(&self, name: &str) -> Option<&Handler> {
        self.functions.get(name)
    }

    pub fn template(&self, site: &Site, name: &str) -> Option<&Handler> {
        let title = Title::parse(site, name, TEMPLATE_NAMESPACE);
        self.templates.get(&title.full_name())
    }

    /// Find the handler for a frame.
    ///
    /// Precedence, first match wins:
    /// 1. `subst` and `safesubst` are never handled
    /// 2. a variable, when the frame has no first argument and no parameters
    /// 3. `msg`, `msgnw` and `raw` are never handled
    /// 4. a parser function, when the frame has a first argument
    /// 5. a template named by the frame name, in the template namespace
    ///
    /// Falling through all steps records the frame name in `unhandled`.
    pub fn dispatch(
        &self,
        site: &Site,
        frame: &Frame<'_>,
        unhandled: &mut UnhandledWords,
    ) -> Option<&Handler> {
        let name = frame.name();

        if SUBSTITUTIONS.contains(&name) {
            trace!(name, "substitution left unexpanded");
            return None;
        }

        if frame.may_be_variable() {
            if let Some(handler) = self.variable(name) {
                trace!(name, "dispatch to variable");
                return Some(handler);
            }
        }

        if UNSUPPORTED_PREFIXES.contains(&name) {
            trace!(name, "unsupported transclusion prefix");
            return None;
        }

        if frame.first_argument().is_some() {
            if let Some(handler) = self.function(name) {
                trace!(name, "dispatch to parser function");
                return Some(handler);
            }
        }

        if let Some(handler) = self.template(site, frame.name()) {
            trace!(name, "dispatch to template");
            return Some(handler);
        }

        trace!(name, "no handler");
        unhandled.insert(name);
        None
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut templates: Vec<_> = self.templates.keys().collect();
        templates.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("variables", &self.variables)
            .field("functions", &self.functions)
            .field("templates", &templates)
            .finish()
    }
}
