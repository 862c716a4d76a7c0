use crate::{Command, ParseError};
use regex::Regex;
use std::sync::OnceLock;

/// The fields of an inbound SMS webhook that the relay cares about.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Inbound {
    pub message_sid: String,
    pub from: String,
    /// The message text, trimmed
    pub body: String,
}

impl Inbound {
    /// Decode a form-encoded webhook body, requiring `MessageSid`, `From`, and `Body`.
    pub fn from_form(form: &[u8]) -> Result<Self, Rejection> {
        let mut message_sid = None;
        let mut from = None;
        let mut body = None;

        for (key, value) in url::form_urlencoded::parse(form) {
            match key.as_ref() {
                "MessageSid" => message_sid = Some(value.into_owned()),
                "From" => from = Some(value.into_owned()),
                "Body" => body = Some(value.into_owned()),
                _ => {}
            }
        }

        let message_sid = message_sid
            .filter(|v| !v.is_empty())
            .ok_or(Rejection::MissingMessageSid)?;
        let from = from
            .filter(|v| !v.is_empty())
            .ok_or(Rejection::MissingFrom)?;
        let body = body
            .filter(|v| !v.is_empty())
            .ok_or(Rejection::MissingBody)?;

        let body = body.trim().to_string();
        if !only_valid_chars(&body) {
            return Err(Rejection::InvalidCharacters(body));
        }

        Ok(Self {
            message_sid,
            from,
            body,
        })
    }

    /// Decode and validate a webhook body, then parse the command it carries.
    pub fn accept(form: &[u8]) -> Result<(Self, Command), Rejection> {
        let inbound = Self::from_form(form)?;
        let command = Command::parse(&inbound.body).map_err(Rejection::Command)?;
        Ok((inbound, command))
    }
}

/// Letters (`L*`), decimal digits (`Nd`), and whitespace, and nothing else.
fn valid_chars_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[\p{L}\p{Nd}\s]*$").expect("failed to compile valid characters regex")
    })
}

/// Whether `s` holds nothing but letters, digits, and whitespace
pub fn only_valid_chars(s: &str) -> bool {
    valid_chars_re().is_match(s)
}

/// Why an inbound message was not processed.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Rejection {
    MissingMessageSid,
    MissingFrom,
    MissingBody,
    InvalidCharacters(String),
    Command(ParseError),
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Rejection::MissingMessageSid => f.write_str("incoming request had no message sid"),
            Rejection::MissingFrom => f.write_str("incoming request had no from number"),
            Rejection::MissingBody => f.write_str("incoming request had no body"),
            Rejection::InvalidCharacters(body) => write!(
                f,
                "incoming body has invalid contents, probably not an airport: {:?}",
                body
            ),
            Rejection::Command(e) => write!(f, "incoming body is not a command: {}", e),
        }
    }
}

impl std::error::Error for Rejection {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Rejection::Command(e) => Some(e),
            _ => None,
        }
    }
}
