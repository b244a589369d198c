use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
};
use html_escape::{encode_double_quoted_attribute, encode_text};
use tracing::debug;

use crate::config::{Config, OpenSearchConfig};

pub const CONTENT_TYPE: &str = "application/opensearchdescription+xml";

pub async fn route(headers: HeaderMap, State(config): State<Arc<Config>>) -> impl IntoResponse {
    let origin = super::request_origin(&headers, &config.site.scheme);
    debug!("serving opensearch description for {origin}");

    (
        [(header::CONTENT_TYPE, CONTENT_TYPE)],
        render_document(&config.opensearch, &origin),
    )
}

/// Make urls that start with a `/` absolute by putting the origin in front.
/// The subdirectory isn't added, relative urls are resolved from the host
/// root.
fn absolute(url: &str, origin: &str) -> String {
    if url.starts_with('/') && !url.starts_with("//") {
        format!("{origin}{url}")
    } else {
        url.to_string()
    }
}

/// Drop the characters XML 1.0 doesn't allow anywhere in a document, like
/// most of the C0 control characters. They can't be escaped either.
fn xml_chars(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            matches!(c, '\t' | '\n' | '\r')
                || ('\u{20}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || c >= '\u{10000}'
        })
        .collect()
}

fn text(s: &str) -> String {
    encode_text(&xml_chars(s)).into_owned()
}

fn attribute(s: &str) -> String {
    encode_double_quoted_attribute(&xml_chars(s)).into_owned()
}

pub fn render_document(config: &OpenSearchConfig, origin: &str) -> String {
    let mut extra_elements = String::new();
    if !config.suggestions_url.is_empty() {
        extra_elements.push_str(&format!(
            "\n    <Url type=\"application/x-suggestions+json\" method=\"get\" template=\"{}\"/>",
            attribute(&absolute(&config.suggestions_url, origin))
        ));
    }
    if let Some(favicon) = &config.favicon {
        extra_elements.push_str(&format!(
            "\n    <Image width=\"{}\" height=\"{}\" type=\"{}\">{}</Image>",
            favicon.width,
            favicon.height,
            attribute(&favicon.mime_type),
            text(&absolute(&favicon.path, origin))
        ));
    }

    let contact = if config.contact_email.is_empty() {
        String::new()
    } else {
        format!(
            "\n    <Contact>{}</Contact>",
            text(&config.contact_email)
        )
    };

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<OpenSearchDescription xmlns="http://a9.com/-/spec/opensearch/1.1/">
    <ShortName>{short_name}</ShortName>
    <Description>{description}</Description>{contact}
    <Url type="text/html" method="get" template="{search_url}"/>{extra_elements}
    <InputEncoding>{input_encoding}</InputEncoding>
    <OutputEncoding>{output_encoding}</OutputEncoding>
</OpenSearchDescription>
"#,
        short_name = text(&config.short_name),
        description = text(&config.description),
        search_url = attribute(&absolute(&config.search_url, origin)),
        input_encoding = text(&config.input_encoding),
        output_encoding = text(&config.output_encoding),
    )
}
