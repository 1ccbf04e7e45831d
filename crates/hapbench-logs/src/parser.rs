use regex::Captures;

use hapbench_types::{LogFormat, LogRecord};

use crate::error::ParseError;
use crate::grammar::Grammar;

/// Parser for one HAProxy log format
///
/// The grammar is resolved once at construction; `parse` holds no state
/// between calls.
#[derive(Clone, Copy, Debug)]
pub struct LogParser {
    grammar: &'static Grammar,
}

impl LogParser {
    /// Create a parser for the given format
    pub fn new(format: LogFormat) -> Self {
        Self {
            grammar: Grammar::for_format(format),
        }
    }

    /// The format this parser accepts
    pub fn format(&self) -> LogFormat {
        self.grammar.format()
    }

    /// Parse a raw log line into a LogRecord
    pub fn parse(&self, raw: &str) -> Result<LogRecord, ParseError> {
        let line = raw.trim_end_matches(['\r', '\n']);

        let caps = self
            .grammar
            .pattern()
            .captures(line)
            .ok_or_else(|| ParseError::NoMatch {
                format: self.format(),
                line: line.to_string(),
            })?;

        let date = capture(&caps, "date");
        let time = self
            .grammar
            .date_layout()
            .parse(&date)
            .map_err(|source| ParseError::InvalidDate {
                date: date.clone(),
                line: line.to_string(),
                source,
            })?;

        // No protocol token means the request line was cut short
        let uri_complete = !capture(&caps, "httpprotocol").is_empty();
        let mut http_uri = capture(&caps, "httpuri");
        if uri_complete {
            http_uri = escape_commas(&http_uri);
        }

        Ok(LogRecord {
            process_id: capture(&caps, "pid"),
            client_ip: capture(&caps, "clientip"),
            client_port: capture(&caps, "clientport"),
            date,
            frontend_name: capture(&caps, "frontend"),
            backend_name: capture(&caps, "backend"),
            server_name: capture(&caps, "server"),
            send_time: capture(&caps, "timesend"),
            wait_time: capture(&caps, "timewait"),
            connection_time: capture(&caps, "timeconnection"),
            response_time: capture(&caps, "timeresponse"),
            total_time: capture(&caps, "timetotal"),
            status_code: capture(&caps, "statuscode"),
            bytes_read: capture(&caps, "bytesread"),
            request_cookie: capture(&caps, "requestcookie"),
            response_cookie: capture(&caps, "responsecookie"),
            termination_state: capture(&caps, "terminationstate"),
            active_connections: capture(&caps, "activeconnections"),
            frontend_connections: capture(&caps, "frontendconnections"),
            backend_connections: capture(&caps, "backendconnections"),
            server_connections: capture(&caps, "serverconnections"),
            retries: capture(&caps, "retries"),
            server_queue: capture(&caps, "serverqueue"),
            backend_queue: capture(&caps, "backendqueue"),
            referer: capture(&caps, "referer"),
            x_forward: capture(&caps, "xforward"),
            user_agent: capture(&caps, "useragent"),
            auth_header: capture(&caps, "authheader"),
            response_headers: capture(&caps, "responseheaders"),
            http_method: capture(&caps, "httpmethod"),
            http_uri,
            uri_complete,
            time,
        })
    }
}

/// Text of a named group, or empty if the group is unknown or did not participate
fn capture(caps: &Captures<'_>, name: &str) -> String {
    caps.name(name)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Output is comma separated, so commas inside the URI must not survive
fn escape_commas(uri: &str) -> String {
    uri.replace(',', "%2c")
}
