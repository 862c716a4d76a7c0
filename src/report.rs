use serde::Deserialize;

/// The kinds of report the relay can fetch.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ReportKind {
    /// A routine surface observation
    Metar,
    /// A terminal aerodrome forecast
    Taf,
}

impl ReportKind {
    /// The path segment naming this kind in the weather API
    pub fn path(self) -> &'static str {
        match self {
            ReportKind::Metar => "metar",
            ReportKind::Taf => "taf",
        }
    }

    /// The `filter` query parameter, which is also the name of the content field in the reply
    pub fn filter(self) -> &'static str {
        match self {
            ReportKind::Metar => "sanitized",
            ReportKind::Taf => "raw",
        }
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ReportKind::Metar => f.write_str("METAR"),
            ReportKind::Taf => f.write_str("TAF"),
        }
    }
}

/// A report successfully fetched for one airport.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Report {
    pub kind: ReportKind,

    /// The code the report was found under, which carries the `K` prefix if one was added
    pub code: String,

    /// The report text
    pub content: String,
}

/// The body of a weather API reply.
///
/// A non-empty `error` means the service had nothing for the requested code.
#[derive(Debug, Default, Clone, Eq, PartialEq, Deserialize)]
pub(crate) struct Payload {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub sanitized: Option<String>,
    #[serde(default)]
    pub raw: Option<String>,
}

impl Payload {
    /// The upstream error message, if there is a non-empty one
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }

    pub fn into_report(self, kind: ReportKind, code: &str) -> Report {
        let content = match kind {
            ReportKind::Metar => self.sanitized,
            ReportKind::Taf => self.raw,
        };

        Report {
            kind,
            code: code.to_string(),
            content: content.unwrap_or_default(),
        }
    }
}
