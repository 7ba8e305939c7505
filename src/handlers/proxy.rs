use std::collections::HashMap;

use actix_web::http::header;
use actix_web::{HttpResponse, web};

use crate::proxy::rewrite::ContentKind;
use crate::proxy::{ProxyClient, ProxyError, parse_target};

/// GET /api/proxy?url=: fetch an external page for framing, with HTML and
/// CSS references pointed back through this endpoint.
pub async fn relay(
    client: web::Data<ProxyClient>,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, ProxyError> {
    let target = parse_target(query.get("url").map(String::as_str))?;
    let relayed = client.relay(&target).await?;

    let mut response = HttpResponse::Ok();
    response
        .insert_header((header::CONTENT_TYPE, relayed.content_type.as_str()))
        .insert_header(("X-Frame-Options", "ALLOWALL"))
        .insert_header(("Content-Security-Policy", "frame-ancestors *;"))
        .insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .insert_header((
            header::ACCESS_CONTROL_ALLOW_METHODS,
            "GET, POST, PUT, DELETE, OPTIONS",
        ))
        .insert_header((
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            "Content-Type, Authorization",
        ));
    if relayed.kind != ContentKind::Html {
        response.insert_header((header::CACHE_CONTROL, "public, max-age=3600"));
    }
    for (name, value) in &relayed.passthrough {
        response.insert_header((*name, value.as_str()));
    }

    Ok(response.body(relayed.body))
}
