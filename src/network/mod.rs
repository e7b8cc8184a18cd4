//! Network state model
//!
//! The interface/subnet/route graph that renderers consume. A state is
//! either loaded directly from a dumped document or built from a cloud-init
//! network config v1 (see [`v1`]).

pub mod render;
pub mod resolv_conf;
pub mod udev;
pub mod v1;

use crate::SysconfigError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Complete network state handed to a renderer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkState {
    #[serde(default, deserialize_with = "null_as_default")]
    pub interfaces: BTreeMap<String, Interface>,
    /// Global routes; carried through but not attached to any interface
    #[serde(default, deserialize_with = "null_as_default")]
    pub routes: Vec<Route>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dns: DnsState,
}

/// Interface role in the network state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceType {
    #[default]
    Physical,
    Bond,
    Bridge,
    Vlan,
}

/// A single interface and everything attached to it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    #[serde(rename = "type", default)]
    pub iface_type: InterfaceType,
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub mtu: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subnets: Vec<Subnet>,
    /// Name of the bond this interface is enslaved to
    #[serde(rename = "bond-master", alias = "bond_master", default)]
    pub bond_master: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bridge_ports: Vec<String>,
    #[serde(rename = "vlan-raw-device", alias = "vlan_link", default)]
    pub vlan_raw_device: Option<String>,
    #[serde(default)]
    pub vlan_id: Option<u16>,
    /// Remaining free-form parameters (bond_mode, bridge_stp, ...)
    #[serde(flatten)]
    pub params: BTreeMap<String, Param>,
}

/// Free-form interface parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Param {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<String>),
}

/// One address assignment method attached to an interface
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subnet {
    /// static, static6, dhcp, dhcp4 or dhcp6
    #[serde(rename = "type")]
    pub subnet_type: String,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub netmask: Option<String>,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub routes: Vec<Route>,
}

/// A static route
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(deserialize_with = "scalar_string")]
    pub network: String,
    /// Dotted netmask for IPv4, prefix length for IPv6
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub netmask: Option<String>,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub metric: Option<u32>,
}

/// Global DNS state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DnsState {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nameservers: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub search: Vec<String>,
}

/// Selects which interfaces [`NetworkState::iter_interfaces`] yields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceFilter {
    All,
    Physical,
    Bond,
    Bridge,
    Vlan,
    /// Any interface enslaved to a bond, whatever its own type
    BondMember,
}

impl InterfaceFilter {
    pub fn matches(&self, iface: &Interface) -> bool {
        match self {
            Self::All => true,
            Self::Physical => iface.iface_type == InterfaceType::Physical,
            Self::Bond => iface.iface_type == InterfaceType::Bond,
            Self::Bridge => iface.iface_type == InterfaceType::Bridge,
            Self::Vlan => iface.iface_type == InterfaceType::Vlan,
            Self::BondMember => iface.bond_master.is_some(),
        }
    }
}

impl NetworkState {
    /// Parse a dumped network state from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, SysconfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a dumped network state from JSON
    pub fn from_json(json: &str) -> Result<Self, SysconfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Iterate interfaces (in name order) matching `filter`
    pub fn iter_interfaces(&self, filter: InterfaceFilter) -> impl Iterator<Item = &Interface> {
        self.interfaces
            .values()
            .filter(move |iface| filter.matches(iface))
    }

    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.get(name)
    }

    pub fn dns_nameservers(&self) -> &[String] {
        &self.dns.nameservers
    }

    pub fn dns_searchdomains(&self) -> &[String] {
        &self.dns.search
    }
}

impl Interface {
    pub fn new(name: impl Into<String>, iface_type: InterfaceType) -> Self {
        Self {
            name: name.into(),
            iface_type,
            ..Default::default()
        }
    }

    /// Look up a parameter, treating explicit nulls as absent
    pub fn param(&self, key: &str) -> Option<&Param> {
        self.params.get(key).filter(|p| !matches!(p, Param::Null))
    }
}

impl Param {
    /// Render as a single option string; lists are space separated
    pub fn to_option_string(&self) -> String {
        match self {
            Param::Null => String::new(),
            Param::Bool(b) => b.to_string(),
            Param::Int(i) => i.to_string(),
            Param::Float(f) => f.to_string(),
            Param::Str(s) => s.clone(),
            Param::List(items) => items.join(" "),
        }
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Str(value.to_string())
    }
}

impl From<bool> for Param {
    fn from(value: bool) -> Self {
        Param::Bool(value)
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Param::Int(value)
    }
}

impl Subnet {
    /// Whether this subnet requests IPv6 (a `6` suffixed type or a static
    /// IPv6 address)
    pub fn is_ipv6(&self) -> bool {
        if self.subnet_type.ends_with('6') {
            return true;
        }
        self.subnet_type == "static" && self.address.as_deref().is_some_and(|a| a.contains(':'))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Int(i64),
}

impl From<Scalar> for String {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Str(s) => s,
            Scalar::Int(i) => i.to_string(),
        }
    }
}

fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Scalar::deserialize(deserializer).map(String::from)
}

fn opt_scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(String::from))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dumped_state() {
        let yaml = r#"
interfaces:
  eth0:
    name: eth0
    type: physical
    mac_address: "52:54:00:12:34:00"
    mtu: null
    inet: inet
    mode: manual
    address: null
    subnets:
      - type: static
        address: 10.0.0.5
        netmask: 255.255.255.0
        routes:
          - network: 0.0.0.0
            netmask: 0.0.0.0
            gateway: 10.0.0.1
  eth1:
    name: eth1
    type: physical
    bond-master: bond0
    bond-mode: 802.3ad
    subnets: null
dns:
  nameservers: [8.8.8.8]
  search: [example.com]
"#;
        let state = NetworkState::from_yaml(yaml).unwrap();
        assert_eq!(state.interfaces.len(), 2);

        let eth0 = state.interface("eth0").unwrap();
        assert_eq!(eth0.mac_address.as_deref(), Some("52:54:00:12:34:00"));
        assert_eq!(eth0.mtu, None);
        assert_eq!(eth0.subnets[0].routes[0].gateway.as_deref(), Some("10.0.0.1"));
        assert_eq!(eth0.param("inet"), Some(&Param::from("inet")));
        assert_eq!(eth0.param("address"), None);

        let eth1 = state.interface("eth1").unwrap();
        assert_eq!(eth1.bond_master.as_deref(), Some("bond0"));
        assert!(eth1.subnets.is_empty());
        assert_eq!(eth1.param("bond-mode"), Some(&Param::from("802.3ad")));

        assert_eq!(state.dns_nameservers(), ["8.8.8.8"]);
        assert_eq!(state.dns_searchdomains(), ["example.com"]);
    }

    #[test]
    fn test_numeric_netmask_is_stringified() {
        let json = r#"{"interfaces": {"eth0": {"name": "eth0", "type": "physical",
            "subnets": [{"type": "static", "address": "2001:db8::5", "netmask": 64}]}}}"#;
        let state = NetworkState::from_json(json).unwrap();
        let subnet = &state.interface("eth0").unwrap().subnets[0];
        assert_eq!(subnet.netmask.as_deref(), Some("64"));
        assert!(subnet.is_ipv6());
    }

    #[test]
    fn test_iter_interfaces_filters() {
        let mut state = NetworkState::default();
        let mut eth0 = Interface::new("eth0", InterfaceType::Physical);
        eth0.bond_master = Some("bond0".to_string());
        state.interfaces.insert("eth0".into(), eth0);
        state
            .interfaces
            .insert("bond0".into(), Interface::new("bond0", InterfaceType::Bond));
        state
            .interfaces
            .insert("eth0.100".into(), Interface::new("eth0.100", InterfaceType::Vlan));

        let names = |f| {
            state
                .iter_interfaces(f)
                .map(|i| i.name.as_str())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(InterfaceFilter::All), ["bond0", "eth0", "eth0.100"]);
        assert_eq!(names(InterfaceFilter::Physical), ["eth0"]);
        assert_eq!(names(InterfaceFilter::Bond), ["bond0"]);
        assert_eq!(names(InterfaceFilter::BondMember), ["eth0"]);
        assert_eq!(names(InterfaceFilter::Vlan), ["eth0.100"]);
        assert!(names(InterfaceFilter::Bridge).is_empty());
    }

    #[test]
    fn test_subnet_is_ipv6() {
        let subnet = |t: &str, addr: Option<&str>| Subnet {
            subnet_type: t.to_string(),
            address: addr.map(str::to_string),
            ..Default::default()
        };
        assert!(subnet("dhcp6", None).is_ipv6());
        assert!(subnet("static6", Some("10.0.0.1")).is_ipv6());
        assert!(subnet("static", Some("fe80::1")).is_ipv6());
        assert!(!subnet("static", Some("10.0.0.1")).is_ipv6());
        assert!(!subnet("dhcp4", None).is_ipv6());
    }

    #[test]
    fn test_param_option_string() {
        assert_eq!(Param::Int(100).to_option_string(), "100");
        assert_eq!(
            Param::List(vec!["a".into(), "b".into()]).to_option_string(),
            "a b"
        );
        assert_eq!(Param::Bool(false).to_option_string(), "false");
    }
}
