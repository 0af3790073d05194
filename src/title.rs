//! Page titles normalised against a site's namespace table

use std::fmt;

use crate::site::{Site, MAIN_NAMESPACE};

/// A normalised page title
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Title {
    namespace_id: i32,
    namespace_name: String,
    page_name: String,
    subpages: bool,
}

/// Underscores become spaces, whitespace runs collapse, ends are trimmed
fn normalize_page_name(name: &str) -> String {
    name.replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl Title {
    /// Build a title in a known namespace
    ///
    /// Unknown namespace ids keep the id but carry an empty namespace name.
    pub fn new(site: &Site, namespace_id: i32, page_name: &str) -> Self {
        let page_name = normalize_page_name(page_name);
        let (namespace_name, case_sensitive, subpages) = match site.namespace(namespace_id) {
            Some(ns) => (ns.name.clone(), ns.case_sensitive, ns.subpages),
            None => (String::new(), false, false),
        };
        let page_name = if case_sensitive {
            page_name
        } else {
            upper_first(&page_name)
        };
        Self {
            namespace_id,
            namespace_name,
            page_name,
            subpages,
        }
    }

    /// Parse `Namespace:Page`, falling back to `default_namespace` when the
    /// prefix is not a namespace. A leading colon forces the main namespace.
    pub fn parse(site: &Site, text: &str, default_namespace: i32) -> Self {
        let text = normalize_page_name(text);
        if let Some(rest) = text.strip_prefix(':') {
            return Self::parse(site, rest, MAIN_NAMESPACE);
        }
        if let Some((prefix, rest)) = text.split_once(':') {
            if let Some(ns) = site.namespace_by_name(prefix) {
                return Self::new(site, ns.id, rest);
            }
        }
        Self::new(site, default_namespace, &text)
    }

    pub fn namespace_id(&self) -> i32 {
        self.namespace_id
    }

    pub fn namespace_name(&self) -> &str {
        &self.namespace_name
    }

    /// Page name without the namespace prefix
    pub fn page_name(&self) -> &str {
        &self.page_name
    }

    /// `Namespace:Page`, or just `Page` in the main namespace
    pub fn full_name(&self) -> String {
        if self.namespace_name.is_empty() {
            self.page_name.clone()
        } else {
            format!("{}:{}", self.namespace_name, self.page_name)
        }
    }

    /// Page name without the last subpage component
    pub fn base_page_name(&self) -> &str {
        match self.page_name.rsplit_once('/') {
            Some((base, _)) if self.subpages => base,
            _ => &self.page_name,
        }
    }

    /// Page name up to the first subpage separator
    pub fn root_page_name(&self) -> &str {
        match self.page_name.split_once('/') {
            Some((root, _)) if self.subpages => root,
            _ => &self.page_name,
        }
    }

    /// Last subpage component, or the whole page name
    pub fn sub_page_name(&self) -> &str {
        match self.page_name.rsplit_once('/') {
            Some((_, sub)) if self.subpages => sub,
            _ => &self.page_name,
        }
    }

    /// The associated talk page; virtual namespaces have none
    pub fn talk_page(&self, site: &Site) -> Option<Title> {
        if self.namespace_id < 0 {
            return None;
        }
        let talk_id = self.namespace_id | 1;
        Some(Title::new(site, talk_id, &self.page_name))
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::TEMPLATE_NAMESPACE;

    #[test]
    fn test_parse_with_namespace() {
        let site = Site::default();
        let title = Title::parse(&site, "user_talk:some__body", MAIN_NAMESPACE);
        assert_eq!(title.namespace_id(), 3);
        assert_eq!(title.namespace_name(), "User talk");
        assert_eq!(title.page_name(), "Some body");
        assert_eq!(title.full_name(), "User talk:Some body");
    }

    #[test]
    fn test_parse_unknown_prefix_stays_in_default_namespace() {
        let site = Site::default();
        let title = Title::parse(&site, "Foo: bar", MAIN_NAMESPACE);
        assert_eq!(title.namespace_id(), 0);
        assert_eq!(title.full_name(), "Foo: bar");
    }

    #[test]
    fn test_parse_template_default_namespace() {
        let site = Site::default();
        assert_eq!(
            Title::parse(&site, "infobox", TEMPLATE_NAMESPACE).full_name(),
            "Template:Infobox"
        );
        assert_eq!(
            Title::parse(&site, "Template:Infobox", TEMPLATE_NAMESPACE).full_name(),
            "Template:Infobox"
        );
        assert_eq!(
            Title::parse(&site, ":Main page", TEMPLATE_NAMESPACE).full_name(),
            "Main page"
        );
    }

    #[test]
    fn test_subpage_components() {
        let site = Site::default();
        let title = Title::parse(&site, "Help:A/B/C", MAIN_NAMESPACE);
        assert_eq!(title.base_page_name(), "A/B");
        assert_eq!(title.root_page_name(), "A");
        assert_eq!(title.sub_page_name(), "C");

        // No subpages in the main namespace
        let title = Title::parse(&site, "AC/DC", MAIN_NAMESPACE);
        assert_eq!(title.base_page_name(), "AC/DC");
        assert_eq!(title.sub_page_name(), "AC/DC");
    }

    #[test]
    fn test_talk_page() {
        let site = Site::default();
        let title = Title::parse(&site, "Category:Foo", MAIN_NAMESPACE);
        assert_eq!(
            title.talk_page(&site).map(|t| t.full_name()),
            Some("Category talk:Foo".to_string())
        );
        let talk = Title::parse(&site, "Talk:Foo", MAIN_NAMESPACE);
        assert_eq!(talk.talk_page(&site), Some(talk.clone()));
        assert!(Title::parse(&site, "Special:Search", MAIN_NAMESPACE)
            .talk_page(&site)
            .is_none());
    }
}
