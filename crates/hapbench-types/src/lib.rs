//! Shared types for hapbench
//!
//! This crate contains the parsed log record and the log format selector
//! used by both the parser crate and the CLI.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::Deserialize;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Log Format
// ============================================================================

/// HAProxy log layout the parser is built for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// HAProxy default HTTP log format, optional `{..}` header captures
    #[default]
    Standard,
    /// Custom HTTP log format with individually quoted captures
    Extended,
}

impl LogFormat {
    /// Config/CLI spelling of this format
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Extended => "extended",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" | "default" => Ok(Self::Standard),
            "extended" | "custom" => Ok(Self::Extended),
            other => Err(format!(
                "unknown log format '{}' (expected 'standard' or 'extended')",
                other
            )),
        }
    }
}

// ============================================================================
// Log Record
// ============================================================================

/// Field names visible to extras templates, in record order
pub const RECORD_FIELDS: &[&str] = &[
    "ProcessId",
    "ClientIp",
    "ClientPort",
    "Date",
    "FrontendName",
    "BackendName",
    "ServerName",
    "SendTime",
    "WaitTime",
    "ConnectionTime",
    "ResponseTime",
    "TotalTime",
    "StatusCode",
    "BytesRead",
    "RequestCookie",
    "ResponseCookie",
    "TerminationState",
    "ActiveConnections",
    "FrontendConnections",
    "BackendConnections",
    "ServerConnections",
    "Retries",
    "ServerQueue",
    "BackendQueue",
    "Referer",
    "XForward",
    "UserAgent",
    "AuthHeader",
    "ResponseHeaders",
    "HttpMethod",
    "HttpUri",
    "UriComplete",
    "Time",
];

/// A single parsed HAProxy log line
///
/// Every text field holds the token exactly as captured, or an empty string
/// when the active format does not carry it. Timer and counter values stay
/// textual so sentinels like `-1` survive untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    pub process_id: String,
    pub client_ip: String,
    pub client_port: String,

    /// Raw accept-date token
    pub date: String,

    pub frontend_name: String,
    pub backend_name: String,
    pub server_name: String,

    /// Tq: time spent receiving the request
    pub send_time: String,
    /// Tw: time spent in queues
    pub wait_time: String,
    /// Tc: time to establish the server connection
    pub connection_time: String,
    /// Tr: server response time
    pub response_time: String,
    /// Tt: total session time
    pub total_time: String,

    pub status_code: String,
    pub bytes_read: String,

    pub request_cookie: String,
    pub response_cookie: String,

    /// Session termination state flags (e.g. `----`, `CD--`)
    pub termination_state: String,

    pub active_connections: String,
    pub frontend_connections: String,
    pub backend_connections: String,
    pub server_connections: String,
    pub retries: String,

    pub server_queue: String,
    pub backend_queue: String,

    pub referer: String,
    pub x_forward: String,
    pub user_agent: String,
    pub auth_header: String,
    pub response_headers: String,

    pub http_method: String,
    pub http_uri: String,

    /// Whether the request line carried its protocol token
    pub uri_complete: bool,

    /// Parsed accept date
    pub time: DateTime<FixedOffset>,
}

impl LogRecord {
    /// Look up a field by its template name
    pub fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        let text: &str = match name {
            "ProcessId" => &self.process_id,
            "ClientIp" => &self.client_ip,
            "ClientPort" => &self.client_port,
            "Date" => &self.date,
            "FrontendName" => &self.frontend_name,
            "BackendName" => &self.backend_name,
            "ServerName" => &self.server_name,
            "SendTime" => &self.send_time,
            "WaitTime" => &self.wait_time,
            "ConnectionTime" => &self.connection_time,
            "ResponseTime" => &self.response_time,
            "TotalTime" => &self.total_time,
            "StatusCode" => &self.status_code,
            "BytesRead" => &self.bytes_read,
            "RequestCookie" => &self.request_cookie,
            "ResponseCookie" => &self.response_cookie,
            "TerminationState" => &self.termination_state,
            "ActiveConnections" => &self.active_connections,
            "FrontendConnections" => &self.frontend_connections,
            "BackendConnections" => &self.backend_connections,
            "ServerConnections" => &self.server_connections,
            "Retries" => &self.retries,
            "ServerQueue" => &self.server_queue,
            "BackendQueue" => &self.backend_queue,
            "Referer" => &self.referer,
            "XForward" => &self.x_forward,
            "UserAgent" => &self.user_agent,
            "AuthHeader" => &self.auth_header,
            "ResponseHeaders" => &self.response_headers,
            "HttpMethod" => &self.http_method,
            "HttpUri" => &self.http_uri,
            "UriComplete" => {
                return Some(Cow::Borrowed(if self.uri_complete { "true" } else { "false" }));
            }
            "Time" => {
                return Some(Cow::Owned(
                    self.time.to_rfc3339_opts(SecondsFormat::AutoSi, true),
                ));
            }
            _ => return None,
        };
        Some(Cow::Borrowed(text))
    }
}
