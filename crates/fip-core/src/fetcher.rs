//! Schedule retrieval over [`RawHttpClient`].

use tracing::{debug, info, warn};

use crate::config::{NetworkConfig, ScheduleConfig};
use crate::http::{build_get_request, random_user_agent, AgentPicker, RawHttpClient, RawHttpResponse};
use crate::schedule::ScheduleDocument;
use crate::{FipError, Result};

pub struct MetadataFetcher {
    client: RawHttpClient,
    host: String,
    port: u16,
    path: String,
    pick_agent: AgentPicker,
}

impl MetadataFetcher {
    pub fn new(client: RawHttpClient, host: impl Into<String>, port: u16, path: impl Into<String>) -> Self {
        Self {
            client,
            host: host.into(),
            port,
            path: path.into(),
            pick_agent: random_user_agent,
        }
    }

    pub fn from_config(schedule: &ScheduleConfig, network: &NetworkConfig) -> Self {
        let client = RawHttpClient::with_timeouts(network.connect_timeout(), network.read_timeout());
        Self::new(client, &schedule.host, schedule.port, &schedule.path)
    }

    /// Replace the random User-Agent choice, e.g. with a fixed one in tests.
    pub fn with_agent_picker(mut self, pick_agent: AgentPicker) -> Self {
        self.pick_agent = pick_agent;
        self
    }

    pub fn request(&self) -> String {
        build_get_request(&self.host, &self.path, self.pick_agent)
    }

    pub async fn get_schedule(&self) -> Result<ScheduleDocument> {
        let response = self.client.fetch(&self.host, self.port, &self.request()).await?;
        let doc = parse_schedule_response(&response, &self.host)?;
        info!(
            "[schedule] fetched {} steps from {}{}",
            doc.steps.len(),
            self.host,
            self.path
        );
        Ok(doc)
    }
}

/// Strip the header block and parse the body as a schedule document.
pub fn parse_schedule_response(response: &RawHttpResponse, host: &str) -> Result<ScheduleDocument> {
    match response.status() {
        Some(status) if !(200..300).contains(&status) => {
            return Err(FipError::HttpStatus {
                addr: host.to_string(),
                status,
            });
        }
        Some(status) => debug!("[schedule] HTTP {}", status),
        None => warn!("[schedule] response has no recognizable status line"),
    }

    let body = response.body()?;
    let text = String::from_utf8_lossy(&body);
    ScheduleDocument::from_json(text.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(s: &str) -> RawHttpResponse {
        RawHttpResponse::new(s.as_bytes().to_vec())
    }

    #[test]
    fn test_parse_schedule_response() {
        let doc = parse_schedule_response(
            &response(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n\
                 {\"levels\":[{\"items\":[\"a\"],\"position\":0}],\"steps\":{\"a\":{\"start\":1,\"end\":2}}}",
            ),
            "host",
        )
        .unwrap();
        assert_eq!(doc.levels[0].items, ["a"]);
        assert!(doc.steps.contains_key("a"));
    }

    #[test]
    fn test_non_2xx_is_rejected_before_parsing() {
        let err = parse_schedule_response(&response("HTTP/1.1 503 Busy\r\n\r\n{}"), "host").unwrap_err();
        assert!(matches!(err, FipError::HttpStatus { status: 503, .. }));
    }

    #[test]
    fn test_html_body_is_parse_error() {
        let err = parse_schedule_response(&response("HTTP/1.1 200 OK\r\n\r\n<html>"), "host").unwrap_err();
        assert!(matches!(err, FipError::Parse(_)));
    }

    #[test]
    fn test_request_uses_injected_agent() {
        let fetcher = MetadataFetcher::new(RawHttpClient::new(), "www.fipradio.fr", 80, "/livemeta/7")
            .with_agent_picker(|_| "test-agent");
        let req = fetcher.request();
        assert!(req.starts_with("GET /livemeta/7 HTTP/1.1\r\n"));
        assert!(req.contains("\r\nUser-Agent: test-agent\r\n"));
        assert!(req.contains("\r\nConnection: close\r\n"));
        assert!(req.ends_with("\r\n\r\n"));
    }
}
