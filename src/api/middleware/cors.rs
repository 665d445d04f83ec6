use http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::api::middleware::MiddlewareResult;

/// Allows GET/POST from the configured origins, or from anywhere when none (or `*`) are listed.
pub fn cors_layer(origins: &[String]) -> MiddlewareResult<CorsLayer> {
    let allowed = if origins.is_empty() || origins.iter().any(|org| org == "*") {
        AllowOrigin::any()
    } else {
        let origins = origins
            .iter()
            .map(|org| HeaderValue::from_str(org))
            .collect::<Result<Vec<_>, _>>()?;

        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_origin(allowed))
}
