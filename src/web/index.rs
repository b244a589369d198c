use std::sync::Arc;

use axum::{extract::State, http::header, response::IntoResponse};
use maud::{html, DOCTYPE};

use crate::{config::Config, meta::Context, web::head_html};

pub async fn route(State(config): State<Arc<Config>>) -> impl IntoResponse {
    let html = html! {
        (DOCTYPE)
        html lang="en" {
            {(head_html(None, &Context::new(), &config))}
            body {
                main {
                    h1 { (config.opensearch.short_name) }
                    @if !config.opensearch.description.is_empty() {
                        p { (config.opensearch.description) }
                    }
                    a href=(format!("{}{}", config.site.subdirectory, config.opensearch.path)) {
                        "OpenSearch description"
                    }
                }
            }
        }
    }
    .into_string();

    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], html)
}
