//! Site configuration: namespaces, magic words and extension tags
//!
//! A [`Site`] is the read-only collaborator the evaluator consults for magic
//! word aliases and title normalisation. Sites are described in TOML; an
//! embedded default mirrors a stock MediaWiki installation.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::parser::lexer::ExtensionTags;
use crate::title::Title;

/// Errors that can occur when loading or validating a site description
#[derive(Error, Debug)]
pub enum SiteError {
    #[error("Failed to read site file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse site TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("duplicate namespace id {0}")]
    DuplicateNamespaceId(i32),
    #[error("namespace name {name:?} is used by both {first} and {second}")]
    DuplicateNamespaceName { name: String, first: i32, second: i32 },
    #[error("site does not define namespace {0}")]
    MissingNamespace(i32),
}

/// Namespace id of ordinary articles
pub const MAIN_NAMESPACE: i32 = 0;
/// Namespace id templates are resolved in
pub const TEMPLATE_NAMESPACE: i32 = 10;

/// A namespace as described by the site
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Namespace {
    pub id: i32,
    /// Local display name, empty for the main namespace
    pub name: String,
    #[serde(default)]
    pub canonical: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Whether the first letter of page names is case-sensitive
    #[serde(default)]
    pub case_sensitive: bool,
    /// Whether `/` separates subpages
    #[serde(default)]
    pub subpages: bool,
}

impl Namespace {
    fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str())
            .chain(self.canonical.as_deref())
            .chain(self.aliases.iter().map(|s| s.as_str()))
    }
}

/// A magic word from the site catalog
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MagicWord {
    #[serde(default)]
    pub case_sensitive: bool,
    pub aliases: Vec<String>,
}

/// A wiki site: the namespace table and magic word catalog
#[derive(Debug, Clone)]
pub struct Site {
    pub name: Option<String>,
    namespaces: BTreeMap<i32, Namespace>,
    /// Folded namespace name or alias -> namespace id
    namespace_names: HashMap<String, i32>,
    magic_words: HashMap<String, MagicWord>,
    extension_tags: ExtensionTags,
}

/// TOML structure for deserializing sites
#[derive(Deserialize)]
struct TomlSite {
    metadata: Option<TomlMetadata>,
    extension_tags: Option<Vec<String>>,
    #[serde(default)]
    namespaces: Vec<Namespace>,
    #[serde(default)]
    magic_words: HashMap<String, MagicWord>,
}

#[derive(Deserialize)]
struct TomlMetadata {
    name: Option<String>,
}

/// Default site: stock MediaWiki namespaces and the magic words the
/// built-in handlers are registered under
const DEFAULT_SITE: &str = r#"
[metadata]
name = "MediaWiki"

[[namespaces]]
id = -2
name = "Media"

[[namespaces]]
id = -1
name = "Special"

[[namespaces]]
id = 0
name = ""

[[namespaces]]
id = 1
name = "Talk"
subpages = true

[[namespaces]]
id = 2
name = "User"
subpages = true

[[namespaces]]
id = 3
name = "User talk"
subpages = true

[[namespaces]]
id = 4
name = "Project"
subpages = true

[[namespaces]]
id = 5
name = "Project talk"
subpages = true

[[namespaces]]
id = 6
name = "File"
aliases = ["Image"]

[[namespaces]]
id = 7
name = "File talk"
aliases = ["Image talk"]
subpages = true

[[namespaces]]
id = 8
name = "MediaWiki"
subpages = true

[[namespaces]]
id = 9
name = "MediaWiki talk"
subpages = true

[[namespaces]]
id = 10
name = "Template"
subpages = true

[[namespaces]]
id = 11
name = "Template talk"
subpages = true

[[namespaces]]
id = 12
name = "Help"
subpages = true

[[namespaces]]
id = 13
name = "Help talk"
subpages = true

[[namespaces]]
id = 14
name = "Category"

[[namespaces]]
id = 15
name = "Category talk"
subpages = true

[magic_words.fullpagename]
case_sensitive = true
aliases = ["FULLPAGENAME"]

[magic_words.pagename]
case_sensitive = true
aliases = ["PAGENAME"]

[magic_words.namespace]
case_sensitive = true
aliases = ["NAMESPACE"]

[magic_words.basepagename]
case_sensitive = true
aliases = ["BASEPAGENAME"]

[magic_words.rootpagename]
case_sensitive = true
aliases = ["ROOTPAGENAME"]

[magic_words.subpagename]
case_sensitive = true
aliases = ["SUBPAGENAME"]

[magic_words.talkpagename]
case_sensitive = true
aliases = ["TALKPAGENAME"]

[magic_words."!"]
case_sensitive = true
aliases = ["!"]

[magic_words.lc]
aliases = ["LC:"]

[magic_words.uc]
aliases = ["UC:"]

[magic_words.lcfirst]
aliases = ["LCFIRST:"]

[magic_words.ucfirst]
aliases = ["UCFIRST:"]

[magic_words.defaultsort]
case_sensitive = true
aliases = ["DEFAULTSORT:", "DEFAULTSORTKEY:", "DEFAULTCATEGORYSORT:"]

[magic_words.displaytitle]
case_sensitive = true
aliases = ["DISPLAYTITLE"]
"#;

/// Namespace names compare case-insensitively with `_` as space
fn fold_namespace_name(name: &str) -> String {
    name.replace('_', " ").trim().to_lowercase()
}

impl Site {
    /// Load a site from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, SiteError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load a site from a TOML string
    pub fn from_str(content: &str) -> Result<Self, SiteError> {
        let parsed: TomlSite = toml::from_str(content)?;

        let mut namespaces = BTreeMap::new();
        let mut namespace_names = HashMap::new();
        for namespace in parsed.namespaces {
            let id = namespace.id;
            for name in namespace.names() {
                let folded = fold_namespace_name(name);
                if let Some(&first) = namespace_names.get(&folded) {
                    if first != id {
                        return Err(SiteError::DuplicateNamespaceName {
                            name: name.to_string(),
                            first,
                            second: id,
                        });
                    }
                }
                namespace_names.insert(folded, id);
            }
            if namespaces.insert(id, namespace).is_some() {
                return Err(SiteError::DuplicateNamespaceId(id));
            }
        }
        for required in [MAIN_NAMESPACE, TEMPLATE_NAMESPACE] {
            if !namespaces.contains_key(&required) {
                return Err(SiteError::MissingNamespace(required));
            }
        }

        let extension_tags = parsed
            .extension_tags
            .map(ExtensionTags::new)
            .unwrap_or_default();

        Ok(Site {
            name: parsed.metadata.and_then(|m| m.name),
            namespaces,
            namespace_names,
            magic_words: parsed.magic_words,
            extension_tags,
        })
    }

    /// Look up a magic word by its canonical id
    pub fn magic_word(&self, id: &str) -> Option<&MagicWord> {
        self.magic_words.get(id)
    }

    pub fn namespace(&self, id: i32) -> Option<&Namespace> {
        self.namespaces.get(&id)
    }

    /// Find a namespace by local name, canonical name or alias
    pub fn namespace_by_name(&self, name: &str) -> Option<&Namespace> {
        // The main namespace has an empty name and is never a prefix
        if name.trim().is_empty() {
            return None;
        }
        self.namespace_names
            .get(&fold_namespace_name(name))
            .and_then(|id| self.namespaces.get(id))
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.namespaces.values()
    }

    pub fn extension_tags(&self) -> &ExtensionTags {
        &self.extension_tags
    }

    /// Normalise a page name within a namespace
    pub fn normalize_title(&self, namespace_id: i32, name: &str) -> Title {
        Title::new(self, namespace_id, name)
    }

    /// Parse a title that may carry a namespace prefix
    pub fn parse_title(&self, text: &str, default_namespace: i32) -> Title {
        Title::parse(self, text, default_namespace)
    }
}

impl Default for Site {
    fn default() -> Self {
        Self::from_str(DEFAULT_SITE).expect("Default site should be valid TOML")
    }
}
