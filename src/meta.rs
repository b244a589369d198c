//! The `<link rel="search">` tag that lets browsers discover the description
//! document from any page.

use std::collections::BTreeMap;

use maud::{html, Markup};

use crate::config::OpenSearchConfig;

/// Variables available while rendering a page.
pub type Context = BTreeMap<String, String>;

pub const DESCRIPTION: &str = "DESCRIPTION";

/// Returns a copy of `context` with `DESCRIPTION` set to the configured
/// description. Everything else in the context is left as-is.
pub fn opensearch_meta(context: &Context, config: &OpenSearchConfig) -> Context {
    let mut context = context.clone();
    context.insert(DESCRIPTION.to_string(), config.description.clone());
    context
}

/// Render the autodiscovery link from a context prepared by
/// [`opensearch_meta`]. `href` is wherever the description document is
/// routed.
pub fn render(context: &Context, href: &str) -> Markup {
    let title = context.get(DESCRIPTION).map(String::as_str).unwrap_or_default();
    html! {
        link rel="search" type="application/opensearchdescription+xml" title=(title) href=(href);
    }
}
