//! Metadatos de la petición para auditoría
//!
//! IP del cliente, navegador y sistema operativo extraídos del user-agent,
//! y la ruta original (antes del `nest`).

use std::{convert::Infallible, net::SocketAddr};

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts, OriginalUri},
    http::{header, request::Parts},
};
use lazy_static::lazy_static;
use regex::Regex;

use crate::models::activity_log::UserAgentInfo;

lazy_static! {
    static ref BROWSER_PATTERNS: Vec<(&'static str, Regex)> = vec![
        ("Edge", Regex::new(r"Edg(?:e|A|iOS)?/([\d.]+)").unwrap()),
        ("Opera", Regex::new(r"OPR/([\d.]+)").unwrap()),
        ("Chrome", Regex::new(r"Chrome/([\d.]+)").unwrap()),
        ("Firefox", Regex::new(r"Firefox/([\d.]+)").unwrap()),
        ("Safari", Regex::new(r"Version/([\d.]+).*Safari/").unwrap()),
        ("curl", Regex::new(r"curl/([\d.]+)").unwrap()),
        ("PostmanRuntime", Regex::new(r"PostmanRuntime/([\d.]+)").unwrap()),
    ];
    static ref OS_PATTERNS: Vec<(&'static str, Regex)> = vec![
        ("Windows", Regex::new(r"Windows NT ([\d.]+)").unwrap()),
        ("Android", Regex::new(r"Android ([\d.]+)").unwrap()),
        ("iOS", Regex::new(r"(?:iPhone|CPU) OS ([\d_]+)").unwrap()),
        ("macOS", Regex::new(r"Mac OS X ([\d_.]+)").unwrap()),
        ("Linux", Regex::new(r"Linux()").unwrap()),
    ];
}

fn first_match(patterns: &[(&'static str, Regex)], agent: &str) -> String {
    patterns
        .iter()
        .find_map(|(name, re)| {
            re.captures(agent).map(|caps| {
                let version = caps
                    .get(1)
                    .map(|m| m.as_str().replace('_', "."))
                    .unwrap_or_default();
                format!("{} {}", name, version).trim().to_string()
            })
        })
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn parse_user_agent(agent: &str) -> UserAgentInfo {
    UserAgentInfo {
        browser: first_match(&BROWSER_PATTERNS, agent),
        os: first_match(&OS_PATTERNS, agent),
    }
}

#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub ip_address: String,
    pub user_agent: UserAgentInfo,
    pub method: String,
    pub path: String,
}

impl RequestMeta {
    pub fn from_parts(parts: &Parts) -> Self {
        let headers = &parts.headers;

        let ip_address = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| {
                headers
                    .get("x-real-ip")
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v.trim().to_string())
            })
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());

        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(parse_user_agent)
            .unwrap_or_else(|| UserAgentInfo {
                browser: "unknown".to_string(),
                os: "unknown".to_string(),
            });

        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map(|OriginalUri(uri)| uri.path().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        Self {
            ip_address,
            user_agent,
            method: parts.method.to_string(),
            path,
        }
    }

    /// `METHOD /ruta`
    pub fn route(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn test_parse_common_user_agents() {
        let chrome = parse_user_agent(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        );
        assert_eq!(chrome.browser, "Chrome 120.0.0.0");
        assert_eq!(chrome.os, "Windows 10.0");

        let iphone = parse_user_agent(
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Mobile/15E148 Safari/604.1",
        );
        assert_eq!(iphone.browser, "Safari 17.1");
        assert_eq!(iphone.os, "iOS 17.1");

        let unknown = parse_user_agent("");
        assert_eq!(unknown.browser, "unknown");
    }

    #[test]
    fn test_forwarded_ip_takes_precedence() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/plans")
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .header(header::USER_AGENT, "curl/8.4.0")
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();

        let meta = RequestMeta::from_parts(&parts);
        assert_eq!(meta.ip_address, "203.0.113.7");
        assert_eq!(meta.user_agent.browser, "curl 8.4.0");
        assert_eq!(meta.route(), "POST /api/v1/plans");
    }
}
