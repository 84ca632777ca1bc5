//! Access log line rendering
//!
//! One line per invocation, in one of the classic web server layouts
//! (`combined`, `common`), as a JSON object (`json`), or from a pattern with
//! `$variable` placeholders.

use chrono::{DateTime, Local};
use std::time::Duration;

use crate::envelope::{EnvelopeResponse, InvocationEnvelope};

const CLF_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";

/// What happened during one invocation
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Value of the client address header, `-` when absent
    pub remote_addr: String,
    pub time: DateTime<Local>,
    /// Activation id assigned by the hosting runtime
    pub activation_id: Option<String>,
    pub method: String,
    /// Canonical request path
    pub path: String,
    /// Query string without the leading `?`
    pub query: Option<String>,
    pub status: u16,
    /// Length of the envelope body after transport encoding
    pub body_bytes: usize,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub request_time_us: u64,
}

impl AccessLogEntry {
    pub fn new(remote_addr: String, method: String, path: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            activation_id: None,
            method,
            path,
            query: None,
            status: 200,
            body_bytes: 0,
            referer: None,
            user_agent: None,
            request_time_us: 0,
        }
    }

    /// Start an entry from an inbound envelope
    ///
    /// `ip_header` names the header carrying the client address.
    pub fn from_invocation(envelope: &InvocationEnvelope, ip_header: &str) -> Self {
        let remote_addr = envelope
            .header(ip_header)
            .filter(|v| !v.is_empty())
            .unwrap_or("-")
            .to_string();
        let method = envelope.method().map_or_else(
            |_| envelope.method.clone(),
            |method| method.as_str().to_string(),
        );
        let (path, query) = envelope.request_url().map_or_else(
            |_| (envelope.path.clone(), envelope.query.clone()),
            |url| (url.path, url.query),
        );
        let mut entry = Self::new(remote_addr, method, path);
        entry.query = Some(query).filter(|q| !q.is_empty());
        entry.referer = envelope.header("referer").map(ToString::to_string);
        entry.user_agent = envelope.header("user-agent").map(ToString::to_string);
        entry
    }

    /// Record the outcome of the invocation
    pub fn complete(&mut self, response: &EnvelopeResponse, elapsed: Duration) {
        self.status = response.status_code;
        self.body_bytes = response.body.as_ref().map_or(0, String::len);
        self.request_time_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
    }

    /// Render the entry; anything other than a named layout is a pattern
    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => format!(
                "{} \"{}\" \"{}\"",
                self.common_line(),
                dash(self.referer.as_deref()),
                dash(self.user_agent.as_deref()),
            ),
            "common" => self.common_line(),
            "json" => self.json_line(),
            pattern => self.expand(pattern),
        }
    }

    fn request_uri(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{query}", self.path),
            None => self.path.clone(),
        }
    }

    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn common_line(&self) -> String {
        format!(
            "{} - - [{}] \"{} {}\" {} {}",
            self.remote_addr,
            self.time.format(CLF_TIME),
            self.method,
            self.request_uri(),
            self.status,
            self.body_bytes,
        )
    }

    fn json_line(&self) -> String {
        serde_json::json!({
            "remote_addr": self.remote_addr,
            "time": self.time.to_rfc3339(),
            "activation_id": self.activation_id,
            "method": self.method,
            "path": self.path,
            "query": self.query,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "referer": self.referer,
            "user_agent": self.user_agent,
            "request_time_us": self.request_time_us,
        })
        .to_string()
    }

    /// Value of a `$variable`, `None` for unknown names
    fn variable(&self, name: &str) -> Option<String> {
        let value = match name {
            "remote_addr" => self.remote_addr.clone(),
            "time_local" => self.time.format(CLF_TIME).to_string(),
            "time_iso8601" => self.time.to_rfc3339(),
            "activation_id" => dash(self.activation_id.as_deref()).to_string(),
            "request" => format!("{} {}", self.method, self.request_uri()),
            "request_method" => self.method.clone(),
            "request_uri" => self.request_uri(),
            "status" => self.status.to_string(),
            "body_bytes_sent" => self.body_bytes.to_string(),
            "http_referer" => dash(self.referer.as_deref()).to_string(),
            "http_user_agent" => dash(self.user_agent.as_deref()).to_string(),
            "request_time" => {
                #[allow(clippy::cast_precision_loss)]
                let seconds = self.request_time_us as f64 / 1_000_000.0;
                format!("{seconds:.3}")
            }
            _ => return None,
        };
        Some(value)
    }

    /// Substitute `$name` placeholders in a single left-to-right pass
    ///
    /// A name is the longest run of `[a-z0-9_]` after the `$`; unknown names
    /// are copied through unchanged.
    fn expand(&self, pattern: &str) -> String {
        let mut out = String::with_capacity(pattern.len() * 2);
        let mut rest = pattern;
        while let Some(start) = rest.find('$') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let len = after
                .find(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'))
                .unwrap_or(after.len());
            let name = &after[..len];
            match self.variable(name) {
                Some(value) => out.push_str(&value),
                None => {
                    out.push('$');
                    out.push_str(name);
                }
            }
            rest = &after[len..];
        }
        out.push_str(rest);
        out
    }
}

fn dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}
