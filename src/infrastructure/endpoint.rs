use crate::types::{ENDPOINT_PATH, RealtimeError, Result};
use url::Url;

/// Derives the realtime endpoint from the origin the console was served from.
///
/// `https://host` maps to `wss://host/ws`, `http://host` to `ws://host/ws`.
/// Port is kept; path, query and fragment of the origin are discarded.
pub fn origin_to_ws_endpoint(origin: &str) -> Result<Url> {
    let origin = Url::parse(origin)?;

    let scheme = match origin.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => {
            return Err(RealtimeError::Config(format!(
                "unsupported origin scheme '{}'",
                other
            )));
        }
    };

    let host = origin
        .host_str()
        .ok_or_else(|| RealtimeError::Config(format!("origin '{}' has no host", origin)))?;

    let authority = match origin.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    Ok(Url::parse(&format!("{}://{}{}", scheme, authority, ENDPOINT_PATH))?)
}

/// Validates an explicit WebSocket endpoint
pub fn parse_ws_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint)?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(RealtimeError::Config(format!(
            "endpoint scheme must be ws or wss, got '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_origin_uses_wss() {
        let url = origin_to_ws_endpoint("https://ops.example.com/orders?page=2").unwrap();
        assert_eq!(url.as_str(), "wss://ops.example.com/ws");
    }

    #[test]
    fn test_insecure_origin_keeps_port() {
        let url = origin_to_ws_endpoint("http://localhost:5173").unwrap();
        assert_eq!(url.as_str(), "ws://localhost:5173/ws");
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert!(matches!(
            origin_to_ws_endpoint("ftp://files.example.com"),
            Err(RealtimeError::Config(_))
        ));
        assert!(matches!(
            origin_to_ws_endpoint("not a url"),
            Err(RealtimeError::UrlParse(_))
        ));
    }

    #[test]
    fn test_parse_ws_endpoint() {
        assert!(parse_ws_endpoint("wss://ops.example.com/ws").is_ok());
        assert!(matches!(
            parse_ws_endpoint("https://ops.example.com/ws"),
            Err(RealtimeError::Config(_))
        ));
    }
}
