pub mod index;
pub mod opensearch;

use std::sync::Arc;

use axum::{http::HeaderMap, routing::get, Router};
use maud::{html, Markup};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    config::Config,
    meta::{self, Context},
};

/// Build the router. Host applications can merge this into their own
/// router instead of calling [`run`].
pub fn router(config: Arc<Config>) -> Router {
    let subdirectory = &config.site.subdirectory;
    let index_path = format!("{subdirectory}/");
    let opensearch_path = format!("{subdirectory}{}", config.opensearch.path);

    let mut router = Router::new().route(&opensearch_path, get(opensearch::route));
    // the document can be configured to live where the index would be
    if opensearch_path != index_path {
        router = router.route(&index_path, get(index::route));
    }

    router
        .layer(TraceLayer::new_for_http())
        .with_state(config)
}

pub async fn run(config: Config) -> eyre::Result<()> {
    let config = Arc::new(config);
    let bind = config.bind;

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Listening on http://{bind}");

    axum::serve(listener, router(config)).await?;
    Ok(())
}

/// The `scheme://host` the request was made to, used to make relative urls
/// in the description document absolute.
pub fn request_origin(headers: &HeaderMap, default_scheme: &str) -> String {
    let host = headers
        .get("host")
        .and_then(|host| host.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|proto| proto.to_str().ok())
        .and_then(|proto| proto.split(',').next())
        .map(str::trim)
        .filter(|proto| !proto.is_empty())
        .unwrap_or(default_scheme);

    format!("{scheme}://{host}")
}

pub fn head_html(title: Option<&str>, context: &Context, config: &Config) -> Markup {
    let context = meta::opensearch_meta(context, &config.opensearch);
    let opensearch_href = format!("{}{}", config.site.subdirectory, config.opensearch.path);

    html! {
        head {
            meta charset="UTF-8";
            meta name="viewport" content="width=device-width, initial-scale=1.0";
            title {
                @if let Some(title) = title {
                    { (title) " - " (config.site.name) }
                } @else {
                    { (config.site.name) }
                }
            }
            (meta::render(&context, &opensearch_href))
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    fn test_config(extra: &str) -> Arc<Config> {
        let config = format!(
            r#"
            [opensearch]
            description = "Example Site"
            short_name = "Example"
            {extra}
            "#
        );
        Arc::new(Config::from_toml(&config).unwrap())
    }

    async fn get_body(
        app: Router,
        uri: &str,
        headers: &[(&str, &str)],
    ) -> (StatusCode, HeaderMap, String) {
        let mut request = Request::builder().uri(uri);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = app
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_opensearch_route() {
        let app = router(test_config(""));
        let (status, headers, body) =
            get_body(app, "/opensearch.xml", &[("host", "example.com")]).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers.get(header::CONTENT_TYPE).unwrap(),
            opensearch::CONTENT_TYPE
        );
        assert!(body.contains("<ShortName>Example</ShortName>"));
        assert!(body.contains("<Description>Example Site</Description>"));
        assert!(body.contains(r#"template="https://example.com/search?q={searchTerms}""#));
    }

    #[tokio::test]
    async fn test_opensearch_route_under_subdirectory() {
        let app = router(test_config(
            r#"
            path = "/osd.xml"
            [site]
            subdirectory = "/find"
            "#,
        ));
        let (status, _, _) = get_body(app.clone(), "/find/osd.xml", &[]).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, _) = get_body(app, "/opensearch.xml", &[]).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_subdirectory_without_leading_slash() {
        let app = router(test_config(
            r#"
            [site]
            subdirectory = "find"
            "#,
        ));
        let (status, _, _) = get_body(app.clone(), "/find/opensearch.xml", &[]).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, body) = get_body(app, "/find/", &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"href="/find/opensearch.xml""#));
    }

    #[tokio::test]
    async fn test_relative_search_url_ignores_subdirectory() {
        let app = router(test_config(
            r#"
            [site]
            subdirectory = "/find"
            "#,
        ));
        let (_, _, body) =
            get_body(app, "/find/opensearch.xml", &[("host", "example.com")]).await;
        assert!(body.contains(r#"template="https://example.com/search?q={searchTerms}""#));
    }

    #[tokio::test]
    async fn test_opensearch_at_root_replaces_index() {
        for path in ["/", ""] {
            let app = router(test_config(&format!("path = {path:?}")));
            let (status, headers, body) = get_body(app, "/", &[]).await;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(
                headers.get(header::CONTENT_TYPE).unwrap(),
                opensearch::CONTENT_TYPE
            );
            assert!(body.contains("<ShortName>Example</ShortName>"));
        }
    }

    #[tokio::test]
    async fn test_index_has_autodiscovery_link() {
        let app = router(test_config(""));
        let (status, _, body) = get_body(app, "/", &[]).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(
            r#"<link rel="search" type="application/opensearchdescription+xml" title="Example Site" href="/opensearch.xml">"#
        ));
    }

    #[test]
    fn test_request_origin() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_origin(&headers, "https"), "https://localhost");

        headers.insert("host", "example.com:8080".parse().unwrap());
        assert_eq!(request_origin(&headers, "https"), "https://example.com:8080");

        headers.insert("x-forwarded-proto", "http, https".parse().unwrap());
        assert_eq!(request_origin(&headers, "https"), "http://example.com:8080");
    }
}
