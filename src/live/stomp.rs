//! Minimal STOMP 1.2 frame codec
//!
//! Only what the chat broker needs: CONNECT / SUBSCRIBE / SEND / DISCONNECT
//! going out, CONNECTED / MESSAGE / RECEIPT / ERROR coming in. One frame per
//! WebSocket text message.

use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StompError {
    #[error("frame has no command line")]
    Empty,
    #[error("unknown STOMP command: {0}")]
    UnknownCommand(String),
    #[error("malformed header line: {0}")]
    BadHeader(String),
    #[error("frame is not NUL-terminated")]
    Unterminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    Connected,
    Subscribe,
    Unsubscribe,
    Send,
    Message,
    Receipt,
    Error,
    Disconnect,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Connect => "CONNECT",
            Command::Connected => "CONNECTED",
            Command::Subscribe => "SUBSCRIBE",
            Command::Unsubscribe => "UNSUBSCRIBE",
            Command::Send => "SEND",
            Command::Message => "MESSAGE",
            Command::Receipt => "RECEIPT",
            Command::Error => "ERROR",
            Command::Disconnect => "DISCONNECT",
        }
    }

    fn parse(s: &str) -> Result<Self, StompError> {
        Ok(match s {
            "CONNECT" | "STOMP" => Command::Connect,
            "CONNECTED" => Command::Connected,
            "SUBSCRIBE" => Command::Subscribe,
            "UNSUBSCRIBE" => Command::Unsubscribe,
            "SEND" => Command::Send,
            "MESSAGE" => Command::Message,
            "RECEIPT" => Command::Receipt,
            "ERROR" => Command::Error,
            "DISCONNECT" => Command::Disconnect,
            other => return Err(StompError::UnknownCommand(other.to_string())),
        })
    }

    /// CONNECT and CONNECTED headers are sent verbatim (STOMP 1.2 §"Value Encoding").
    fn escapes_headers(&self) -> bool {
        !matches!(self, Command::Connect | Command::Connected)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: Command,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: String) -> Self {
        self.body = body;
        self
    }

    /// First value of a header. Repeated headers keep the first occurrence.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn connect(host: &str, bearer: Option<&str>) -> Self {
        let frame = Frame::new(Command::Connect)
            .header("accept-version", "1.2,1.1")
            .header("host", host)
            .header("heart-beat", "0,0");
        match bearer {
            Some(token) => frame.header("Authorization", &format!("Bearer {}", token)),
            None => frame,
        }
    }

    pub fn subscribe(id: &str, destination: &str) -> Self {
        Frame::new(Command::Subscribe)
            .header("id", id)
            .header("destination", destination)
            .header("ack", "auto")
    }

    pub fn send_json(destination: &str, body: String) -> Self {
        Frame::new(Command::Send)
            .header("destination", destination)
            .header("content-type", "application/json")
            .header("content-length", &body.len().to_string())
            .with_body(body)
    }

    pub fn disconnect() -> Self {
        Frame::new(Command::Disconnect)
    }

    /// Wire form, including the trailing NUL.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(64 + self.body.len());
        out.push_str(self.command.as_str());
        out.push('\n');
        for (name, value) in &self.headers {
            if self.command.escapes_headers() {
                out.push_str(&escape(name));
                out.push(':');
                out.push_str(&escape(value));
            } else {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    /// Parse one frame. `Ok(None)` is a heart-beat (bare EOLs).
    pub fn decode(raw: &str) -> Result<Option<Self>, StompError> {
        let raw = raw.trim_start_matches(['\r', '\n']);
        if raw.is_empty() {
            return Ok(None);
        }

        // Headers end at the first blank line, LF or CRLF.
        let lf = raw.find("\n\n").map(|i| (i, 2));
        let crlf = raw.find("\n\r\n").map(|i| (i, 3));
        let (end, eol) = match (lf, crlf) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => return Err(StompError::Unterminated),
        };
        let (head, rest) = (&raw[..end], &raw[end + eol..]);

        let mut lines = head.lines();
        let command_line = lines.next().ok_or(StompError::Empty)?.trim_end_matches('\r');
        if command_line.is_empty() {
            return Err(StompError::Empty);
        }
        let command = Command::parse(command_line)?;

        let mut headers = Vec::new();
        for line in lines {
            let line = line.trim_end_matches('\r');
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| StompError::BadHeader(line.to_string()))?;
            if command.escapes_headers() {
                headers.push((unescape(name), unescape(value)));
            } else {
                headers.push((name.to_string(), value.to_string()));
            }
        }

        let frame = Frame {
            command,
            headers,
            body: String::new(),
        };

        let body = match frame.get("content-length").and_then(|n| n.parse::<usize>().ok()) {
            Some(len) if rest.len() > len && rest.is_char_boundary(len) => &rest[..len],
            _ => rest.split('\0').next().unwrap_or(""),
        };
        if !rest.contains('\0') {
            return Err(StompError::Unterminated);
        }

        Ok(Some(Frame {
            body: body.to_string(),
            ..frame
        }))
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_frame_carries_bearer() {
        let wire = Frame::connect("localhost", Some("jwt.token")).encode();
        assert!(wire.starts_with("CONNECT\n"));
        assert!(wire.contains("Authorization:Bearer jwt.token\n"));
        assert!(wire.ends_with("\n\n\0"));
    }

    #[test]
    fn test_send_frame_layout() {
        let wire = Frame::send_json("/app/chat/send/7", r#"{"content":"안녕"}"#.to_string()).encode();
        let expected_len = r#"{"content":"안녕"}"#.len();
        assert_eq!(
            wire,
            format!(
                "SEND\ndestination:/app/chat/send/7\ncontent-type:application/json\ncontent-length:{}\n\n{{\"content\":\"안녕\"}}\0",
                expected_len
            )
        );
    }

    #[test]
    fn test_decode_message() {
        let raw = "MESSAGE\ndestination:/topic/room/7\nsubscription:sub-0\nmessage-id:1\ncontent-type:application/json\n\n{\"content\":\"hi\"}\0";
        let frame = Frame::decode(raw).unwrap().unwrap();
        assert_eq!(frame.command, Command::Message);
        assert_eq!(frame.get("destination"), Some("/topic/room/7"));
        assert_eq!(frame.body, "{\"content\":\"hi\"}");
    }

    #[test]
    fn test_decode_crlf_frame_with_blank_lines_in_body() {
        let raw = "MESSAGE\r\ndestination:/topic/room/7\r\n\r\n첫 줄\n\n셋째 줄\0";
        let frame = Frame::decode(raw).unwrap().unwrap();
        assert_eq!(frame.get("destination"), Some("/topic/room/7"));
        assert_eq!(frame.body, "첫 줄\n\n셋째 줄");
    }

    #[test]
    fn test_decode_respects_content_length() {
        let raw = "MESSAGE\ncontent-length:3\n\nab\0\0";
        let frame = Frame::decode(raw).unwrap().unwrap();
        assert_eq!(frame.body, "ab\0");
    }

    #[test]
    fn test_heartbeat_is_none() {
        assert_eq!(Frame::decode("\n"), Ok(None));
        assert_eq!(Frame::decode("\r\n"), Ok(None));
    }

    #[test]
    fn test_header_escaping() {
        let frame = Frame::new(Command::Send).header("note", "a:b\nc");
        let wire = frame.encode();
        assert!(wire.contains("note:a\\cb\\nc\n"));

        let back = Frame::decode(&wire).unwrap().unwrap();
        assert_eq!(back.get("note"), Some("a:b\nc"));
    }

    #[test]
    fn test_connected_headers_not_unescaped() {
        let frame = Frame::decode("CONNECTED\nversion:1.2\nuser-name:a\\cb\n\n\0")
            .unwrap()
            .unwrap();
        assert_eq!(frame.get("user-name"), Some("a\\cb"));
    }

    #[test]
    fn test_error_frame_and_bad_input() {
        let frame = Frame::decode("ERROR\nmessage:Invalid token\n\n\0").unwrap().unwrap();
        assert_eq!(frame.command, Command::Error);
        assert_eq!(frame.get("message"), Some("Invalid token"));

        assert_eq!(
            Frame::decode("BOGUS\n\n\0"),
            Err(StompError::UnknownCommand("BOGUS".to_string()))
        );
        assert_eq!(Frame::decode("MESSAGE\nno-colon\n\n\0"), Err(StompError::BadHeader("no-colon".to_string())));
        assert_eq!(Frame::decode("MESSAGE\n\nbody"), Err(StompError::Unterminated));
    }
}
