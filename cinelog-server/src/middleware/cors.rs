//! Access-control filter.

use cinelog_config::{CorsConfig, parse_cors_allow_lists};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::errors::PipelineResult;

/// Build the CORS layer from the configured allow-lists.
///
/// A `*` origin anywhere in the list allows every origin. Preflight requests
/// are answered by the layer itself and never reach inner services.
pub fn cors_layer(config: &CorsConfig) -> PipelineResult<CorsLayer> {
    let lists = parse_cors_allow_lists(config)?;
    let allow_origin = match lists.origins {
        None => AllowOrigin::any(),
        Some(origins) => AllowOrigin::list(origins),
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::list(lists.methods))
        .allow_headers(AllowHeaders::list(lists.headers)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PipelineError;
    use axum::{
        Router,
        body::Body,
        extract::Request,
        http::{Method, StatusCode, header},
        routing::get,
    };
    use cinelog_config::ConfigGuardRailError;
    use tower::ServiceExt;

    fn app(config: &CorsConfig) -> Router {
        Router::new()
            .route("/manifest.json", get(|| async { "{}" }))
            .layer(cors_layer(config).unwrap())
    }

    #[tokio::test]
    async fn default_config_allows_any_origin() {
        let response = app(&CorsConfig::default())
            .oneshot(
                Request::get("/manifest.json")
                    .header(header::ORIGIN, "https://web.stremio.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn answers_preflight_with_allow_lists() {
        let response = app(&CorsConfig::default())
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/manifest.json")
                    .header(header::ORIGIN, "https://web.stremio.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(), "GET");
        let allowed = headers
            .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
            .unwrap()
            .to_str()
            .unwrap()
            .to_ascii_lowercase();
        for name in ["accept", "accept-language", "content-type", "origin", "x-requested-with"] {
            assert!(allowed.contains(name), "{name} missing from {allowed}");
        }
    }

    #[tokio::test]
    async fn explicit_origins_are_echoed_back() {
        let config = CorsConfig {
            allowed_origins: vec![" https://web.stremio.com".into()],
            ..CorsConfig::default()
        };
        let response = app(&config)
            .oneshot(
                Request::get("/manifest.json")
                    .header(header::ORIGIN, "https://web.stremio.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://web.stremio.com"
        );
    }

    #[test]
    fn rejects_invalid_allow_lists() {
        let config = CorsConfig {
            allowed_methods: vec!["GET POST".into()],
            ..CorsConfig::default()
        };
        assert_eq!(
            cors_layer(&config).unwrap_err(),
            PipelineError::Cors(ConfigGuardRailError::InvalidCorsMethod("GET POST".into()))
        );

        let config = CorsConfig {
            allowed_headers: vec!["bad header".into()],
            ..CorsConfig::default()
        };
        assert_eq!(
            cors_layer(&config).unwrap_err(),
            PipelineError::Cors(ConfigGuardRailError::InvalidCorsHeader("bad header".into()))
        );

        let config = CorsConfig {
            allowed_origins: vec!["https://ok.example".into(), "bad\norigin".into()],
            ..CorsConfig::default()
        };
        assert_eq!(
            cors_layer(&config).unwrap_err(),
            PipelineError::Cors(ConfigGuardRailError::InvalidCorsOrigin("bad\norigin".into()))
        );
    }
}
