//! Network config v1 interpretation
//!
//! Parses the dictionary-based cloud-init network configuration format and
//! folds its commands into a [`NetworkState`].

use super::{DnsState, Interface, InterfaceType, NetworkState, Param, Route, Subnet};
use crate::SysconfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::Ipv6Addr;
use tracing::debug;

/// Network config v1 format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkConfigV1 {
    /// Version (should be 1)
    pub version: u8,
    /// Network configuration items
    #[serde(default)]
    pub config: Vec<ConfigItem>,
}

/// Individual configuration item in v1 format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConfigItem {
    /// Physical network interface
    #[serde(rename = "physical")]
    Physical(PhysicalConfig),
    /// Bond interface
    #[serde(rename = "bond")]
    Bond(BondConfigV1),
    /// Bridge interface
    #[serde(rename = "bridge")]
    Bridge(BridgeConfigV1),
    /// VLAN interface
    #[serde(rename = "vlan")]
    Vlan(VlanConfigV1),
    /// Nameserver configuration
    #[serde(rename = "nameserver")]
    Nameserver(NameserverConfigV1),
    /// Global route
    #[serde(rename = "route")]
    Route(RouteConfigV1),
}

/// Physical interface configuration (v1)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhysicalConfig {
    /// Interface name
    pub name: String,
    /// MAC address, also used for persistent naming
    pub mac_address: Option<String>,
    /// MTU
    pub mtu: Option<u32>,
    /// Subnets (IP configuration)
    #[serde(default)]
    pub subnets: Vec<SubnetConfig>,
    /// Free-form interface parameters
    #[serde(default)]
    pub params: BTreeMap<String, Param>,
}

/// Bond configuration (v1)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BondConfigV1 {
    /// Interface name
    pub name: String,
    /// Interfaces to enslave
    #[serde(default)]
    pub bond_interfaces: Vec<String>,
    /// bond-mode, bond-miimon, bond-xmit-hash-policy, ...
    #[serde(default)]
    pub params: BTreeMap<String, Param>,
    /// MAC address
    pub mac_address: Option<String>,
    /// MTU
    pub mtu: Option<u32>,
    /// Subnets
    #[serde(default)]
    pub subnets: Vec<SubnetConfig>,
}

/// Bridge configuration (v1)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfigV1 {
    /// Interface name
    pub name: String,
    /// Bridge ports
    #[serde(default)]
    pub bridge_interfaces: Vec<String>,
    /// bridge_stp, bridge_ageing, bridge_bridgeprio, ...
    #[serde(default)]
    pub params: BTreeMap<String, Param>,
    /// MAC address
    pub mac_address: Option<String>,
    /// MTU
    pub mtu: Option<u32>,
    /// Subnets
    #[serde(default)]
    pub subnets: Vec<SubnetConfig>,
}

/// VLAN configuration (v1)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VlanConfigV1 {
    /// Interface name (e.g., "eth0.100")
    pub name: String,
    /// VLAN ID
    pub vlan_id: u16,
    /// Parent interface
    pub vlan_link: String,
    /// MAC address
    pub mac_address: Option<String>,
    /// MTU
    pub mtu: Option<u32>,
    /// Subnets
    #[serde(default)]
    pub subnets: Vec<SubnetConfig>,
}

/// Subnet/IP configuration (v1)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubnetConfig {
    /// static, static6, dhcp, dhcp4, dhcp6
    #[serde(rename = "type")]
    pub subnet_type: String,
    /// IP address, optionally in CIDR form (for static)
    pub address: Option<String>,
    /// Network prefix/netmask
    pub netmask: Option<serde_yaml::Value>,
    /// Gateway
    pub gateway: Option<String>,
    /// Routes
    #[serde(default)]
    pub routes: Vec<RouteConfigV1>,
}

/// Nameserver configuration (v1)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NameserverConfigV1 {
    /// Nameserver addresses
    #[serde(default)]
    pub address: Vec<String>,
    /// Search domains
    #[serde(default)]
    pub search: Vec<String>,
}

/// Route configuration (v1)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteConfigV1 {
    /// Destination in CIDR form
    pub destination: Option<String>,
    /// Gateway
    pub gateway: Option<String>,
    /// Route metric
    pub metric: Option<u32>,
    /// Network (alternative to destination)
    pub network: Option<String>,
    /// Netmask or prefix length for `network`
    pub netmask: Option<serde_yaml::Value>,
}

impl NetworkConfigV1 {
    /// Parse v1 config from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        // Handle both top-level and nested "network:" key
        #[derive(Deserialize)]
        struct Wrapper {
            network: Option<NetworkConfigV1>,
            #[serde(flatten)]
            config: Option<NetworkConfigV1>,
        }

        let wrapper: Wrapper = serde_yaml::from_str(yaml)?;

        if let Some(network) = wrapper.network {
            Ok(network)
        } else if let Some(config) = wrapper.config {
            Ok(config)
        } else {
            Ok(NetworkConfigV1::default())
        }
    }

    /// Fold every command into a network state
    pub fn to_network_state(&self) -> Result<NetworkState, SysconfigError> {
        debug!("Interpreting {} network config v1 items", self.config.len());

        let mut builder = StateBuilder::default();
        for item in &self.config {
            match item {
                ConfigItem::Physical(phys) => builder.handle_physical(phys)?,
                ConfigItem::Bond(bond) => builder.handle_bond(bond)?,
                ConfigItem::Bridge(bridge) => builder.handle_bridge(bridge)?,
                ConfigItem::Vlan(vlan) => builder.handle_vlan(vlan)?,
                ConfigItem::Nameserver(ns) => builder.handle_nameserver(ns),
                ConfigItem::Route(route) => builder.handle_route(route)?,
            }
        }
        Ok(builder.state)
    }
}

#[derive(Default)]
struct StateBuilder {
    state: NetworkState,
}

/// Fields every interface command carries
struct InterfaceCommand<'a> {
    name: &'a str,
    iface_type: InterfaceType,
    mac_address: Option<&'a String>,
    mtu: Option<u32>,
    subnets: &'a [SubnetConfig],
    params: Option<&'a BTreeMap<String, Param>>,
}

impl StateBuilder {
    fn upsert(&mut self, cmd: InterfaceCommand<'_>) -> Result<&mut Interface, SysconfigError> {
        let subnets = cmd
            .subnets
            .iter()
            .map(convert_subnet)
            .collect::<Result<Vec<_>, _>>()?;

        let iface = self
            .state
            .interfaces
            .entry(cmd.name.to_string())
            .or_default();
        if let Some(params) = cmd.params {
            iface
                .params
                .extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        iface.name = cmd.name.to_string();
        iface.iface_type = cmd.iface_type;
        iface.mac_address = cmd.mac_address.cloned();
        iface.mtu = cmd.mtu;
        iface.subnets = subnets;
        Ok(iface)
    }

    fn placeholder(&mut self, name: &str) {
        if !self.state.interfaces.contains_key(name) {
            debug!("Injecting placeholder interface {}", name);
            self.state.interfaces.insert(
                name.to_string(),
                Interface::new(name, InterfaceType::Physical),
            );
        }
    }

    fn handle_physical(&mut self, phys: &PhysicalConfig) -> Result<(), SysconfigError> {
        self.upsert(InterfaceCommand {
            name: &phys.name,
            iface_type: InterfaceType::Physical,
            mac_address: phys.mac_address.as_ref(),
            mtu: phys.mtu,
            subnets: &phys.subnets,
            params: Some(&phys.params),
        })?;
        Ok(())
    }

    fn handle_vlan(&mut self, vlan: &VlanConfigV1) -> Result<(), SysconfigError> {
        let iface = self.upsert(InterfaceCommand {
            name: &vlan.name,
            iface_type: InterfaceType::Vlan,
            mac_address: vlan.mac_address.as_ref(),
            mtu: vlan.mtu,
            subnets: &vlan.subnets,
            params: None,
        })?;
        iface.vlan_raw_device = Some(vlan.vlan_link.clone());
        iface.vlan_id = Some(vlan.vlan_id);
        Ok(())
    }

    fn handle_bond(&mut self, bond: &BondConfigV1) -> Result<(), SysconfigError> {
        self.upsert(InterfaceCommand {
            name: &bond.name,
            iface_type: InterfaceType::Bond,
            mac_address: bond.mac_address.as_ref(),
            mtu: bond.mtu,
            subnets: &bond.subnets,
            params: Some(&bond.params),
        })?;

        for member in &bond.bond_interfaces {
            self.placeholder(member);
            if let Some(iface) = self.state.interfaces.get_mut(member) {
                iface.bond_master = Some(bond.name.clone());
                iface
                    .params
                    .extend(bond.params.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        Ok(())
    }

    fn handle_bridge(&mut self, bridge: &BridgeConfigV1) -> Result<(), SysconfigError> {
        for port in &bridge.bridge_interfaces {
            self.placeholder(port);
        }

        let iface = self.upsert(InterfaceCommand {
            name: &bridge.name,
            iface_type: InterfaceType::Bridge,
            mac_address: bridge.mac_address.as_ref(),
            mtu: bridge.mtu,
            subnets: &bridge.subnets,
            params: Some(&bridge.params),
        })?;
        iface.bridge_ports = bridge.bridge_interfaces.clone();
        Ok(())
    }

    fn handle_nameserver(&mut self, ns: &NameserverConfigV1) {
        let DnsState { nameservers, search } = &mut self.state.dns;
        nameservers.extend(ns.address.iter().cloned());
        search.extend(ns.search.iter().cloned());
    }

    fn handle_route(&mut self, route: &RouteConfigV1) -> Result<(), SysconfigError> {
        self.state.routes.push(convert_route(route)?);
        Ok(())
    }
}

fn convert_subnet(subnet: &SubnetConfig) -> Result<Subnet, SysconfigError> {
    let is_static = subnet.subnet_type.starts_with("static");
    let mut address = subnet.address.clone();
    let mut netmask = subnet.netmask.as_ref().and_then(yaml_scalar);

    // "10.0.0.5/24" carries its own prefix
    if is_static
        && let Some(addr) = &subnet.address
        && let Some((ip, prefix)) = addr.split_once('/')
    {
        address = Some(ip.to_string());
        if netmask.is_none() {
            netmask = Some(prefix.to_string());
        }
    }

    let is_ipv6 = subnet.subnet_type.ends_with('6')
        || address.as_deref().is_some_and(|a| a.contains(':'));

    if is_static {
        netmask = netmask
            .map(|mask| normalize_netmask(&mask, is_ipv6))
            .transpose()?;
    }

    Ok(Subnet {
        subnet_type: subnet.subnet_type.clone(),
        address,
        netmask,
        gateway: subnet.gateway.clone(),
        routes: subnet
            .routes
            .iter()
            .map(convert_route)
            .collect::<Result<_, _>>()?,
    })
}

fn convert_route(route: &RouteConfigV1) -> Result<Route, SysconfigError> {
    let (network, netmask) = match (&route.destination, &route.network) {
        (Some(dest), _) => match dest.split_once('/') {
            Some((net, prefix)) => (net.to_string(), Some(prefix.to_string())),
            None => (dest.clone(), None),
        },
        (None, Some(net)) => (net.clone(), route.netmask.as_ref().and_then(yaml_scalar)),
        (None, None) => {
            return Err(SysconfigError::Config(format!(
                "route via {} has neither destination nor network",
                route.gateway.as_deref().unwrap_or("no gateway")
            )));
        }
    };

    // family comes from the route's own network
    let ipv6 = network.contains(':');
    Ok(Route {
        netmask: netmask
            .map(|mask| normalize_netmask(&mask, ipv6))
            .transpose()?,
        network,
        gateway: route.gateway.clone(),
        metric: route.metric,
    })
}

fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// IPv4 netmasks end up dotted, IPv6 netmasks end up as a prefix length
fn normalize_netmask(mask: &str, ipv6: bool) -> Result<String, SysconfigError> {
    if ipv6 {
        return Ok(mask2cidr(mask));
    }
    match mask.parse::<u32>() {
        Ok(prefix) => u8::try_from(prefix)
            .ok()
            .filter(|p| *p <= 32)
            .map(cidr2mask)
            .ok_or_else(|| {
                SysconfigError::Config(format!("IPv4 prefix length {} is out of range", prefix))
            }),
        Err(_) => Ok(mask.to_string()),
    }
}

/// Convert an IPv4 prefix length to a dotted netmask
pub fn cidr2mask(prefix: u8) -> String {
    let mask: u32 = match prefix {
        0 => 0,
        p if p >= 32 => 0xffffffff,
        p => 0xffffffff << (32 - p),
    };
    format!(
        "{}.{}.{}.{}",
        (mask >> 24) & 0xff,
        (mask >> 16) & 0xff,
        (mask >> 8) & 0xff,
        mask & 0xff
    )
}

/// Convert a dotted IPv4 or colon-separated IPv6 netmask to a prefix
/// length; anything else is returned unchanged
pub fn mask2cidr(mask: &str) -> String {
    if mask.contains(':') {
        match mask.parse::<Ipv6Addr>() {
            Ok(addr) => u128::from(addr).leading_ones().to_string(),
            Err(_) => mask.to_string(),
        }
    } else if mask.contains('.') {
        let octets: Vec<u8> = mask.split('.').filter_map(|s| s.parse().ok()).collect();
        if octets.len() != 4 {
            return mask.to_string();
        }
        octets
            .iter()
            .map(|o| o.count_ones())
            .sum::<u32>()
            .to_string()
    } else {
        mask.to_string()
    }
}

/// Detect and parse a network state from either a v1 config or a dumped
/// state document
pub fn parse_network_state(yaml: &str) -> Result<NetworkState, SysconfigError> {
    #[derive(Deserialize)]
    struct VersionCheck {
        version: Option<u8>,
        network: Option<Box<VersionCheck>>,
        network_state: Option<NetworkState>,
        config: Option<serde_yaml::Value>,
        interfaces: Option<serde_yaml::Value>,
    }

    let check: VersionCheck = serde_yaml::from_str(yaml)?;
    if let Some(state) = check.network_state {
        return Ok(state);
    }

    let version = check
        .version
        .or_else(|| check.network.as_ref().and_then(|n| n.version));

    match version {
        Some(1) => NetworkConfigV1::from_yaml(yaml)?.to_network_state(),
        Some(other) => Err(SysconfigError::Config(format!(
            "unsupported network config version {}",
            other
        ))),
        // a command list without a version is not a dumped state either
        None if check.interfaces.is_none()
            && (check.config.is_some()
                || check.network.as_ref().is_some_and(|n| n.config.is_some())) =>
        {
            Err(SysconfigError::Config(
                "network config has a 'config' list but no version".to_string(),
            ))
        }
        None => NetworkState::from_yaml(yaml),
    }
}
