//! Listings extracted from API responses, printable as tables or JSON.

use serde::Serialize;
use serde_json::Value;

use super::table::{IntoTable, Table};
use crate::{die, ListingFormat};

pub(crate) fn print_json<S: Serialize + ?Sized>(object: &S) {
    match serde_json::to_string_pretty(object) {
        Ok(output) => println!("{}", output),
        Err(err) => die!("failed to serialize output: {}", err),
    }
}

pub(crate) fn format_output<O: IntoTable + Serialize>(object: O, format: ListingFormat) {
    match format {
        ListingFormat::Json => print_json(&object),
        ListingFormat::Table => {
            let tab = object.into_table();

            print!("{}", tab);
        }
        ListingFormat::HeaderlessTable => {
            let mut tab = object.into_table();

            tab.print_header(false);

            print!("{}", tab);
        }
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn str_list(value: &Value, key: &str) -> Vec<String> {
    match value.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

#[derive(Serialize, Debug, PartialEq)]
pub(crate) struct PortListing(Vec<u64>);

impl From<&Value> for PortListing {
    fn from(value: &Value) -> Self {
        let mut ports: Vec<u64> = value
            .as_array()
            .map(|ports| ports.iter().filter_map(Value::as_u64).collect())
            .unwrap_or_default();

        ports.sort_unstable();

        PortListing(ports)
    }
}

impl From<PortListing> for Table {
    fn from(value: PortListing) -> Self {
        let mut tab = Table::new(vec!["PORT"]);

        for port in value.0 {
            tab.add_row(vec![port.to_string()]);
        }

        tab
    }
}

#[derive(Serialize, Debug)]
pub(crate) struct Protocol {
    name: String,
    description: String,
}

#[derive(Serialize, Debug)]
pub(crate) struct ProtocolListing(Vec<Protocol>);

impl From<&Value> for ProtocolListing {
    fn from(value: &Value) -> Self {
        let mut protocols: Vec<Protocol> = value
            .as_object()
            .map(|map| {
                map.iter()
                    .map(|(name, description)| Protocol {
                        name: name.clone(),
                        description: description.as_str().unwrap_or_default().to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        protocols.sort_by(|a, b| a.name.cmp(&b.name));

        ProtocolListing(protocols)
    }
}

impl From<ProtocolListing> for Table {
    fn from(value: ProtocolListing) -> Self {
        let mut tab = Table::new(vec!["PROTOCOL", "DESCRIPTION"]);

        for protocol in value.0 {
            tab.add_row(vec![protocol.name, protocol.description]);
        }

        tab
    }
}

#[derive(Serialize, Debug)]
pub(crate) struct Match {
    ip: String,
    port: Option<u64>,
    org: Option<String>,
    hostnames: Vec<String>,
}

/// One page of host search results.
#[derive(Serialize, Debug)]
pub(crate) struct SearchListing {
    total: u64,
    matches: Vec<Match>,
}

impl From<&Value> for SearchListing {
    fn from(value: &Value) -> Self {
        let matches = value
            .get("matches")
            .and_then(Value::as_array)
            .map(|matches| {
                matches
                    .iter()
                    .map(|m| Match {
                        ip: str_field(m, "ip_str").unwrap_or_default(),
                        port: m.get("port").and_then(Value::as_u64),
                        org: str_field(m, "org"),
                        hostnames: str_list(m, "hostnames"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        SearchListing {
            total: value.get("total").and_then(Value::as_u64).unwrap_or(0),
            matches,
        }
    }
}

impl From<SearchListing> for Table {
    fn from(value: SearchListing) -> Self {
        let mut tab = Table::new(vec!["IP", "PORT", "ORG", "HOSTNAMES"]);

        for m in value.matches {
            tab.add_row(vec![
                m.ip,
                m.port.map(|p| p.to_string()).unwrap_or_default(),
                m.org.unwrap_or_default(),
                m.hostnames.join(","),
            ]);
        }

        tab
    }
}

#[derive(Serialize, Debug)]
pub(crate) struct Exploit {
    id: String,
    source: Option<String>,
    cve: Vec<String>,
    description: String,
}

#[derive(Serialize, Debug)]
pub(crate) struct ExploitListing {
    total: u64,
    matches: Vec<Exploit>,
}

impl From<&Value> for ExploitListing {
    fn from(value: &Value) -> Self {
        let matches = value
            .get("matches")
            .and_then(Value::as_array)
            .map(|matches| {
                matches
                    .iter()
                    .map(|m| Exploit {
                        id: str_field(m, "_id").unwrap_or_default(),
                        source: str_field(m, "source"),
                        cve: str_list(m, "cve"),
                        description: str_field(m, "description").unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        ExploitListing {
            total: value.get("total").and_then(Value::as_u64).unwrap_or(0),
            matches,
        }
    }
}

impl From<ExploitListing> for Table {
    fn from(value: ExploitListing) -> Self {
        let mut tab = Table::new(vec!["ID", "SOURCE", "CVE", "DESCRIPTION"]);

        for e in value.matches {
            tab.add_row(vec![
                e.id,
                e.source.unwrap_or_default(),
                e.cve.join(","),
                e.description,
            ]);
        }

        tab
    }
}
