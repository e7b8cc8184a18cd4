//! Per-interface static route table (route-<name> / route6-<name>)

use super::store::{KeyValueStore, Value, make_header, quote_value};
use crate::SysconfigError;
use crate::config::paths;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Address family selecting which route file is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    /// Family of a textual address; a colon means IPv6
    pub fn of_address(address: &str) -> Self {
        if address.contains(':') {
            Self::Ipv6
        } else {
            Self::Ipv4
        }
    }
}

impl FromStr for AddressFamily {
    type Err = SysconfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ipv4" => Ok(Self::Ipv4),
            "ipv6" => Ok(Self::Ipv6),
            other => Err(SysconfigError::InvalidArgument(format!(
                "Unknown protocol '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ipv4 => f.write_str("ipv4"),
            Self::Ipv6 => f.write_str("ipv6"),
        }
    }
}

/// Static routes of a single interface
///
/// IPv4 and IPv6 routes share one index pool (`ADDRESS1`, `ADDRESS2`, ...);
/// the family split happens at serialization time.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteTable {
    store: KeyValueStore,
    name: String,
    scripts_dir: PathBuf,
    next_index: usize,
    default_route_set_ipv4: bool,
    default_route_set_ipv6: bool,
}

impl RouteTable {
    pub fn new(name: impl Into<String>, scripts_dir: impl AsRef<Path>) -> Self {
        Self {
            store: KeyValueStore::new(),
            name: name.into(),
            scripts_dir: scripts_dir.as_ref().to_path_buf(),
            next_index: 1,
            default_route_set_ipv4: false,
            default_route_set_ipv6: false,
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.store.set(key, value);
    }

    pub fn get(&self, key: &str) -> Result<&Value, SysconfigError> {
        self.store.get(key)
    }

    pub fn store(&self) -> &KeyValueStore {
        &self.store
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn has_default_route(&self, family: AddressFamily) -> bool {
        match family {
            AddressFamily::Ipv4 => self.default_route_set_ipv4,
            AddressFamily::Ipv6 => self.default_route_set_ipv6,
        }
    }

    /// Record that the owning interface now provides the default route for
    /// `family`. Fails if one was already recorded.
    pub fn mark_default_route(&mut self, family: AddressFamily) -> Result<(), SysconfigError> {
        if self.has_default_route(family) {
            return Err(SysconfigError::DuplicateDefaultRoute {
                interface: self.name.clone(),
            });
        }
        match family {
            AddressFamily::Ipv4 => self.default_route_set_ipv4 = true,
            AddressFamily::Ipv6 => self.default_route_set_ipv6 = true,
        }
        Ok(())
    }

    /// Append a non-default route under the next free index and return
    /// that index
    pub fn add_route(&mut self, network: &str, netmask: Option<&str>, gateway: Option<&str>) -> usize {
        let index = self.next_index;
        self.next_index += 1;

        self.store.set(format!("ADDRESS{}", index), network);
        if let Some(netmask) = netmask {
            self.store.set(format!("NETMASK{}", index), netmask);
        }
        if let Some(gateway) = gateway {
            self.store.set(format!("GATEWAY{}", index), gateway);
        }
        index
    }

    pub fn path(&self, family: AddressFamily) -> PathBuf {
        paths::route_path(&self.scripts_dir, &self.name, family)
    }

    /// Render the route file for `family`
    ///
    /// IPv4 entries are renumbered densely from zero in index order; IPv6
    /// entries become `<address>/<netmask> via <gateway>` lines.
    pub fn serialize(&self, family: AddressFamily) -> String {
        let mut out = make_header('#');
        if !self.store.is_empty() {
            out.push('\n');
        }

        let mut indices: Vec<(u64, &str)> = self
            .store
            .iter()
            .filter_map(|(key, _)| {
                let suffix = key.strip_prefix("ADDRESS")?;
                suffix.parse::<u64>().ok().map(|n| (n, suffix))
            })
            .collect();
        indices.sort_unstable();

        let mut reindex = 0usize;
        for (_, suffix) in indices {
            let field = |prefix: &str| {
                self.store
                    .get(&format!("{}{}", prefix, suffix))
                    .ok()
                    .map(Value::to_string)
            };
            let Some(address) = field("ADDRESS") else {
                continue;
            };
            if AddressFamily::of_address(&address) != family {
                continue;
            }

            match family {
                AddressFamily::Ipv4 => {
                    out.push_str(&format!("ADDRESS{}={}\n", reindex, quote_value(&address)));
                    if let Some(gateway) = field("GATEWAY") {
                        out.push_str(&format!("GATEWAY{}={}\n", reindex, quote_value(&gateway)));
                    }
                    if let Some(netmask) = field("NETMASK") {
                        out.push_str(&format!("NETMASK{}={}\n", reindex, quote_value(&netmask)));
                    }
                    reindex += 1;
                }
                AddressFamily::Ipv6 => {
                    let mut line = address;
                    if let Some(netmask) = field("NETMASK") {
                        line = format!("{}/{}", line, netmask);
                    }
                    if let Some(gateway) = field("GATEWAY") {
                        line = format!("{} via {}", line, gateway);
                    }
                    out.push_str(&line);
                    out.push('\n');
                }
            }
        }
        out
    }
}
