//! Relay target parsing, reference rewriting and failure classification.
//!
//! Run with: `cargo test --test proxy_test`
use actix_web::ResponseError;
use actix_web::http::StatusCode;
use reqwest::Url;

use formfolio_backend::proxy::rewrite::{
    ContentKind, RELAY_PREFIX, relay_target, relay_url, rewrite_body, rewrite_css, rewrite_html,
};
use formfolio_backend::proxy::{
    FetchFailure, ProxyError, classify_message, parse_target, upstream_message,
};

fn base() -> Url {
    Url::parse("http://hotel.example.com/rooms/index.html").unwrap()
}

#[test]
fn test_parse_target_requires_http_url() {
    assert!(matches!(parse_target(None), Err(ProxyError::MissingUrl)));
    assert!(matches!(parse_target(Some("  ")), Err(ProxyError::MissingUrl)));
    assert!(matches!(parse_target(Some("not a url")), Err(ProxyError::InvalidUrl)));
    assert!(matches!(
        parse_target(Some("ftp://files.example.com/a")),
        Err(ProxyError::InvalidProtocol)
    ));
    assert_eq!(
        parse_target(Some("https://example.com/x")).unwrap().as_str(),
        "https://example.com/x"
    );
}

#[test]
fn test_preserved_references_are_untouched() {
    for reference in [
        "#top",
        "data:image/png;base64,AAAA",
        "javascript:void(0)",
        "JavaScript:alert(1)",
        "mailto:front@hotel.example.com",
        "tel:+82-2-000-0000",
        "",
    ] {
        assert_eq!(relay_target(reference, &base()), None, "{reference}");
    }
}

#[test]
fn test_relative_references_resolve_against_base() {
    assert_eq!(
        relay_target("/css/site.css", &base()).unwrap().as_str(),
        "http://hotel.example.com/css/site.css"
    );
    assert_eq!(
        relay_target("deluxe.jpg", &base()).unwrap().as_str(),
        "http://hotel.example.com/rooms/deluxe.jpg"
    );
}

#[test]
fn test_absolute_references_only_for_foreign_http() {
    assert_eq!(
        relay_target("http://cdn.example.net/a.js", &base()).unwrap().as_str(),
        "http://cdn.example.net/a.js"
    );
    assert_eq!(relay_target("https://cdn.example.net/a.js", &base()), None);
    assert_eq!(relay_target("http://hotel.example.com/a.js", &base()), None);
    assert_eq!(
        relay_target("//cdn.example.net/font.woff", &base()).unwrap().as_str(),
        "http://cdn.example.net/font.woff"
    );
    assert_eq!(relay_target("ftp://files.example.net/a", &base()), None);
}

#[test]
fn test_already_relayed_reference_is_untouched() {
    let reference = format!("{RELAY_PREFIX}http%3A%2F%2Fexample.com");
    assert_eq!(relay_target(&reference, &base()), None);
}

#[test]
fn test_relay_url_encodes_target() {
    let target = Url::parse("http://example.com/a?b=c").unwrap();
    assert_eq!(
        relay_url(&target),
        "/api/proxy?url=http%3A%2F%2Fexample.com%2Fa%3Fb%3Dc"
    );
}

#[test]
fn test_html_rewrite_and_base_tag() {
    let html = r##"<html><head><title>Rooms</title></head>
<body><a href="#book">Book</a><img src='/img/a.png'><a href="mailto:x@y.z">Mail</a></body></html>"##;

    let out = rewrite_html(html, &base());

    assert!(out.contains(r#"<head>
<base href="http://hotel.example.com/rooms/index.html">"#));
    assert!(out.contains(r##"href="#book""##));
    assert!(out.contains(r#"href="mailto:x@y.z""#));
    assert!(out.contains("src='/api/proxy?url=http%3A%2F%2Fhotel.example.com%2Fimg%2Fa.png'"));
}

#[test]
fn test_existing_base_tag_is_kept() {
    let html = r#"<html><head><base href="/"></head><body></body></html>"#;
    let out = rewrite_html(html, &base());
    assert_eq!(out.matches("<base").count(), 1);
}

#[test]
fn test_css_url_and_import_rewrite() {
    let css = r#"@import "print.css"; body { background: url('bg.png'); } .x { background: url(data:image/gif;base64,R0) }"#;

    let out = rewrite_css(css, &base());

    assert!(out.contains(r#"@import "/api/proxy?url=http%3A%2F%2Fhotel.example.com%2Frooms%2Fprint.css""#));
    assert!(out.contains(r#"url("/api/proxy?url=http%3A%2F%2Fhotel.example.com%2Frooms%2Fbg.png")"#));
    assert!(out.contains("url(data:image/gif;base64,R0)"));
}

#[test]
fn test_other_content_passes_through() {
    let body = r#"{"href": "/a"}"#;
    assert_eq!(rewrite_body(ContentKind::Other, body, &base()), body);
    assert_eq!(
        ContentKind::from_content_type("text/html; charset=utf-8"),
        ContentKind::Html
    );
    assert_eq!(ContentKind::from_content_type("TEXT/CSS"), ContentKind::Css);
    assert_eq!(
        ContentKind::from_content_type("application/json"),
        ContentKind::Other
    );
}

#[test]
fn test_classify_transport_failures() {
    assert_eq!(
        classify_message("error sending request: dns error: failed to lookup address"),
        FetchFailure::Dns
    );
    assert_eq!(
        classify_message("tcp connect error: Connection refused (os error 111)"),
        FetchFailure::Refused
    );
    assert_eq!(classify_message("connection timed out"), FetchFailure::ConnectTimeout);
    assert_eq!(
        classify_message("invalid peer certificate: UnknownIssuer"),
        FetchFailure::Tls
    );
    assert_eq!(classify_message("connection reset"), FetchFailure::Network);
}

#[test]
fn test_error_statuses() {
    assert_eq!(ProxyError::MissingUrl.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        ProxyError::Timeout {
            url: "http://slow.example.com".to_string()
        }
        .status_code(),
        StatusCode::REQUEST_TIMEOUT
    );
    assert_eq!(
        ProxyError::Fetch {
            failure: FetchFailure::Dns,
            url: "http://nowhere.invalid".to_string()
        }
        .status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        ProxyError::Upstream {
            status: 404,
            reason: "Not Found".to_string(),
            url: "http://example.com/gone".to_string()
        }
        .status_code(),
        StatusCode::NOT_FOUND
    );
}

#[test]
fn test_upstream_messages() {
    assert!(upstream_message(404).contains("could not be found"));
    assert!(upstream_message(403).contains("denied"));
    assert_eq!(upstream_message(502), upstream_message(503));
    assert_eq!(
        upstream_message(418),
        "Could not reach the site (error code: 418)"
    );
}
