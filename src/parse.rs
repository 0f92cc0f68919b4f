use crate::error::EndpointParseError;

pub const DEFAULT_SFTP_PORT: u16 = 22;

/// Parse `host[:port]` into its parts. Port defaults to 22 and must be
/// non-zero. A bracketed IPv6 literal (`[::1]:2222`) keeps its colons.
pub fn parse_endpoint(input: &str) -> Result<(String, u16), EndpointParseError> {
    let s = input.trim();
    let (host, port_str) = if let Some(rest) = s.strip_prefix('[') {
        match rest.split_once(']') {
            Some((h, tail)) => (h, tail.strip_prefix(':')),
            None => (s, None),
        }
    } else {
        match s.rsplit_once(':') {
            // more than one ':' without brackets is a bare IPv6 address
            Some((h, p)) if !h.contains(':') => (h, Some(p)),
            _ => (s, None),
        }
    };
    let host = host.trim();
    if host.is_empty() {
        return Err(EndpointParseError::EmptyHost(input.to_string()));
    }
    let port = match port_str {
        Some(p) => parse_port(input, p)?,
        None => DEFAULT_SFTP_PORT,
    };
    Ok((host.to_string(), port))
}

pub(crate) fn parse_port(input: &str, p: &str) -> Result<u16, EndpointParseError> {
    match p.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(EndpointParseError::InvalidPort {
            input: input.to_string(),
            port: p.to_string(),
        }),
        Ok(n) => Ok(n),
    }
}
