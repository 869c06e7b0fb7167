//! Turn a `RequestDescriptor` and optional JSON body into an `http::Request`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use envelope_core::RequestDescriptor;
use http::header::{AUTHORIZATION, HOST};
use http_body_util::Full;

use crate::transport::OutboundRequest;

/// Build the outbound request.
///
/// `auth` becomes a Basic `Authorization` header unless the descriptor
/// already sets one explicitly. `Host` is derived from the authority unless
/// the descriptor sets it. IPv6 literals are bracketed.
pub fn build_request(
    descriptor: &RequestDescriptor,
    body: Option<String>,
    scheme: &str,
) -> Result<OutboundRequest, http::Error> {
    let host = if descriptor.hostname.contains(':') && !descriptor.hostname.starts_with('[') {
        format!("[{}]", descriptor.hostname)
    } else {
        descriptor.hostname.clone()
    };
    let authority = match descriptor.port {
        Some(port) => format!("{host}:{port}"),
        None => host,
    };
    let path = if descriptor.path.is_empty() {
        "/"
    } else {
        descriptor.path.as_str()
    };

    let mut builder = http::Request::builder()
        .method(descriptor.method.as_str())
        .uri(format!("{scheme}://{authority}{path}"));
    if !has_header(descriptor, HOST.as_str()) {
        builder = builder.header(HOST, authority.as_str());
    }

    for (name, value) in &descriptor.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    if let (Some(auth), false) = (
        &descriptor.auth,
        has_header(descriptor, AUTHORIZATION.as_str()),
    ) {
        builder = builder.header(AUTHORIZATION, format!("Basic {}", STANDARD.encode(auth)));
    }

    builder.body(Full::new(body.map(Bytes::from).unwrap_or_default()))
}

fn has_header(descriptor: &RequestDescriptor, name: &str) -> bool {
    descriptor
        .headers
        .iter()
        .any(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use envelope_core::HttpMethod;
    use http_body_util::BodyExt;

    fn descriptor() -> RequestDescriptor {
        RequestDescriptor::new(HttpMethod::Get, "api.example.com", "/v1/widgets/w-1")
    }

    async fn body_string(request: OutboundRequest) -> String {
        let bytes = request.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn uri_uses_scheme_host_and_path() {
        let req = build_request(&descriptor(), None, "https").unwrap();
        assert_eq!(req.method(), http::Method::GET);
        assert_eq!(req.uri(), "https://api.example.com/v1/widgets/w-1");
        assert_eq!(req.headers()[HOST], "api.example.com");
    }

    #[test]
    fn port_is_part_of_authority() {
        let req = build_request(&descriptor().with_port(8080), None, "http").unwrap();
        assert_eq!(req.uri(), "http://api.example.com:8080/v1/widgets/w-1");
        assert_eq!(req.headers()[HOST], "api.example.com:8080");
    }

    #[test]
    fn ipv6_literal_is_bracketed() {
        let desc = RequestDescriptor::new(HttpMethod::Get, "::1", "/v1/widgets").with_port(8080);
        let req = build_request(&desc, None, "http").unwrap();
        assert_eq!(req.uri(), "http://[::1]:8080/v1/widgets");
        assert_eq!(req.headers()[HOST], "[::1]:8080");

        let bracketed = RequestDescriptor::new(HttpMethod::Get, "[::1]", "/v1/widgets");
        let req = build_request(&bracketed, None, "http").unwrap();
        assert_eq!(req.uri(), "http://[::1]/v1/widgets");
    }

    #[test]
    fn explicit_host_is_not_duplicated() {
        let desc = descriptor().with_header("Host", "proxy.example.com");
        let req = build_request(&desc, None, "https").unwrap();
        let values: Vec<_> = req.headers().get_all(HOST).iter().collect();
        assert_eq!(values, vec!["proxy.example.com"]);
        assert_eq!(req.uri(), "https://api.example.com/v1/widgets/w-1");
    }

    #[test]
    fn empty_path_becomes_root() {
        let desc = RequestDescriptor::new(HttpMethod::Get, "api.example.com", "");
        let req = build_request(&desc, None, "http").unwrap();
        assert_eq!(req.uri().path(), "/");
    }

    #[test]
    fn auth_becomes_basic_header() {
        let req = build_request(&descriptor().with_auth("key:"), None, "https").unwrap();
        assert_eq!(req.headers()[AUTHORIZATION], "Basic a2V5Og==");
    }

    #[test]
    fn explicit_authorization_wins_over_auth() {
        let desc = descriptor()
            .with_auth("key:")
            .with_header("Authorization", "Bearer t0ken");
        let req = build_request(&desc, None, "https").unwrap();
        let values: Vec<_> = req.headers().get_all(AUTHORIZATION).iter().collect();
        assert_eq!(values, vec!["Bearer t0ken"]);
    }

    #[test]
    fn custom_headers_are_forwarded() {
        let desc = descriptor().with_header("content-type", "application/json");
        let req = build_request(&desc, None, "http").unwrap();
        assert_eq!(req.headers()["content-type"], "application/json");
    }

    #[test]
    fn invalid_header_name_is_an_error() {
        let desc = descriptor().with_header("bad header", "x");
        assert!(build_request(&desc, None, "http").is_err());
    }

    #[tokio::test]
    async fn body_is_written_verbatim() {
        let mut desc = descriptor();
        desc.method = HttpMethod::Post;
        let req = build_request(&desc, Some(r#"{"name":"cog"}"#.to_string()), "http").unwrap();
        assert_eq!(req.method(), http::Method::POST);
        assert_eq!(body_string(req).await, r#"{"name":"cog"}"#);
    }

    #[tokio::test]
    async fn no_payload_means_empty_body() {
        let req = build_request(&descriptor(), None, "http").unwrap();
        assert_eq!(body_string(req).await, "");
    }
}
