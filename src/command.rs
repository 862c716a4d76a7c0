use std::str::FromStr;

/// A request extracted from the text of an inbound message.
///
/// The message names an airport and, optionally, which reports it wants. A message that names
/// neither `METAR` nor `TAF` wants both.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Command {
    /// The uppercased airport code, which may be empty when the message only held keywords
    pub code: String,

    /// Whether a METAR was requested
    pub wants_metar: bool,

    /// Whether a TAF was requested
    pub wants_taf: bool,
}

impl Command {
    /// Parse the body of a text message.
    ///
    /// Tokens are compared case-insensitively. `METAR` and `TAF` select report types, and any
    /// other token is taken as the airport code, with the last one winning. Length is counted in
    /// characters, not bytes.
    ///
    /// # Example
    ///
    /// ```
    /// let command = metar_sms::Command::parse("kpao metar").unwrap();
    /// assert_eq!(command.code, "KPAO");
    /// assert_eq!(command.wants_metar, true);
    /// assert_eq!(command.wants_taf, false);
    ///
    /// assert!(metar_sms::Command::parse("  k ").is_err());
    /// ```
    pub fn parse(message: &str) -> Result<Self, ParseError> {
        let message = message.trim().to_uppercase();
        if message.chars().count() < 3 {
            return Err(ParseError::TooShort(message));
        }

        let mut command = Command {
            code: String::new(),
            wants_metar: false,
            wants_taf: false,
        };

        for token in message.split_whitespace() {
            match token {
                "METAR" => command.wants_metar = true,
                "TAF" => command.wants_taf = true,
                code => command.code = code.to_string(),
            }
        }

        if !command.wants_metar && !command.wants_taf {
            command.wants_metar = true;
            command.wants_taf = true;
        }

        Ok(command)
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::parse(s)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ParseError {
    /// The normalized message was too short to hold an airport code
    TooShort(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ParseError::TooShort(message) => {
                write!(f, "message {:?} is too short to name an airport", message)
            }
        }
    }
}

impl std::error::Error for ParseError {}
