use std::fmt;
use std::str::FromStr;

use cli_table::{Cell, CellStruct, Style, Table, format::Justify, print_stdout};
use serde::{Deserialize, Serialize};

use crate::error::EndpointParseError;

/// One remote SFTP target. Equality is by (host, port).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(try_from = "EndpointRepr")]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    /// `host:port`, bracketing IPv6 literals so the result is dialable.
    pub fn addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.addr())
    }
}

impl FromStr for Endpoint {
    type Err = EndpointParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = crate::parse::parse_endpoint(s)?;
        Ok(Endpoint { host, port })
    }
}

// Accepted config shapes: "host:port", ["host", port], {"host": .., "port": ..}
#[derive(Deserialize)]
#[serde(untagged)]
enum EndpointRepr {
    Addr(String),
    Pair(String, u32),
    Full { host: String, port: Option<u32> },
}

impl TryFrom<EndpointRepr> for Endpoint {
    type Error = EndpointParseError;

    fn try_from(repr: EndpointRepr) -> Result<Self, Self::Error> {
        match repr {
            EndpointRepr::Addr(s) => s.parse(),
            EndpointRepr::Pair(host, port) => checked(host, Some(port)),
            EndpointRepr::Full { host, port } => checked(host, port),
        }
    }
}

fn checked(host: String, port: Option<u32>) -> Result<Endpoint, EndpointParseError> {
    let host = host.trim().to_string();
    if host.is_empty() {
        return Err(EndpointParseError::EmptyHost(host));
    }
    let port = match port {
        Some(p) => {
            crate::parse::parse_port(&format!("{}:{}", host, p), &p.to_string())?
        }
        None => crate::parse::DEFAULT_SFTP_PORT,
    };
    Ok(Endpoint { host, port })
}

/// Reachability row printed by `srelay --check`.
#[derive(Debug, Clone)]
pub struct EndpointStatus {
    pub endpoint: Endpoint,
    pub error: Option<String>,
}

pub fn show_status_table(rows: &[EndpointStatus]) -> anyhow::Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    let title = vec![
        "#".cell().bold(true),
        "Host".cell().bold(true),
        "Port".cell().bold(true),
        "Status".cell().bold(true),
    ];
    let mut table: Vec<Vec<CellStruct>> = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let status = match &row.error {
            None => "ok".to_string(),
            Some(e) => format!("unreachable: {}", e),
        };
        table.push(vec![
            (i + 1).cell(),
            row.endpoint.host.clone().cell().justify(Justify::Right),
            row.endpoint.port.cell().justify(Justify::Right),
            status.cell(),
        ]);
    }
    print_stdout(table.table().title(title))?;
    Ok(())
}
