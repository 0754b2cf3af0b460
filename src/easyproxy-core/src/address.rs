//! `host:port` parsing and port validation.

use super::ParseError;

/// Lowest valid TCP port.
pub const MIN_PORT: u16 = 1;

/// A proxy address split into host and port.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProxyAddress {
    pub host: String,
    pub port: u16,
}

impl ProxyAddress {
    /// Parse an address from `host:port` text.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let (host, port) = parse_host_port(text)?;
        Ok(Self { host, port })
    }
}

impl std::fmt::Display for ProxyAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl std::str::FromStr for ProxyAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split `host:port` text into its host and port.
///
/// The text must contain exactly one colon with a non-empty host before it.
/// Any other colon count is rejected rather than defaulted, so bracketed IPv6
/// literals are not accepted here. The host is returned exactly as written.
pub fn parse_host_port(text: &str) -> Result<(String, u16), ParseError> {
    let mut parts = text.split(':');
    let (Some(host), Some(port), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ParseError::MalformedAddress(text.to_string()));
    };

    if host.is_empty() {
        return Err(ParseError::MalformedAddress(text.to_string()));
    }

    let port = parse_port(port).map_err(ParseError::InvalidPort)?;
    tracing::trace!(host, port, "parsed proxy address");
    Ok((host.to_string(), port))
}

/// Parse a port from text. Only ASCII digits are accepted.
///
/// The error is a human-readable reason.
pub(crate) fn parse_port(text: &str) -> Result<u16, String> {
    if text.is_empty() {
        return Err("port is empty".to_string());
    }
    if !text.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("`{}` is not a number", text));
    }
    // All digits, so the only possible failure is overflow.
    text.parse::<u64>()
        .ok()
        .and_then(|value| u16::try_from(value).ok())
        .filter(|port| *port >= MIN_PORT)
        .ok_or_else(|| out_of_range(text))
}

/// Check that a numeric port lies within 1-65535.
pub(crate) fn check_port(value: i64) -> Result<u16, String> {
    match u16::try_from(value) {
        Ok(port) if port >= MIN_PORT => Ok(port),
        _ => Err(out_of_range(value)),
    }
}

fn out_of_range(value: impl std::fmt::Display) -> String {
    format!("{} is out of range {}-{}", value, MIN_PORT, u16::MAX)
}
