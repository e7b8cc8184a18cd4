//! RHEL-family sysconfig renderer
//!
//! Generates `ifcfg-*`, `route-*` and `route6-*` files under
//! `<sysconf_dir>/network-scripts`, plus resolv.conf and persistent net
//! naming rules.
//!
//! Rendering runs in ordered passes over a name → [`InterfaceConfig`]
//! table: shared defaults, physical subnets and routes, bonds, VLANs,
//! bridges. Bond and bridge passes reach into other entries of the table by
//! name. Nothing is written here; the caller gets the complete file set or
//! an error.

mod interface;
mod route;
mod store;

pub use interface::{InterfaceConfig, InterfaceKind};
pub use route::{AddressFamily, RouteTable};
pub use store::{KeyValueStore, Value, make_header, quote_value};

use super::{RenderedFile, Renderer};
use crate::SysconfigError;
use crate::config::{RendererConfig, SysconfigPaths};
use crate::network::resolv_conf::ResolvConf;
use crate::network::{Interface, InterfaceFilter, NetworkState, Param, Route, Subnet, udev};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Working set of the render, keyed by interface name
type InterfaceTable = BTreeMap<String, InterfaceConfig>;

/// Keys every ifcfg file starts with
const IFACE_DEFAULTS: &[(&str, Value)] = &[
    ("ONBOOT", Value::Bool(false)),
    ("USERCTL", Value::Bool(false)),
    ("BOOTPROTO", Value::Str(Cow::Borrowed("none"))),
];

/// Bond parameter → option name inside `BONDING_OPTS`
const BOND_OPTIONS: &[(&str, &str)] = &[
    ("bond_mode", "mode"),
    ("bond_xmit_hash_policy", "xmit_hash_policy"),
    ("bond_miimon", "miimon"),
];

/// Bridge parameter → ifcfg key
const BRIDGE_OPTIONS: &[(&str, &str)] = &[
    ("bridge_stp", "STP"),
    ("bridge_ageing", "AGEING"),
    ("bridge_bridgeprio", "PRIO"),
];

/// Something that contributes files to the rendered output
pub trait Renderable {
    /// `(path, content)` pairs in emission order
    fn rendered_files(&self) -> Vec<(PathBuf, String)>;
}

impl Renderable for InterfaceConfig {
    fn rendered_files(&self) -> Vec<(PathBuf, String)> {
        let mut files = Vec::new();
        if !self.is_empty() || !self.children().is_empty() {
            files.push((self.path(), self.serialize()));
            for child in self.children() {
                if !child.is_empty() {
                    files.push((child.path(), child.serialize()));
                }
            }
        }
        files
    }
}

impl Renderable for RouteTable {
    /// Both route files, even when empty
    fn rendered_files(&self) -> Vec<(PathBuf, String)> {
        [AddressFamily::Ipv4, AddressFamily::Ipv6]
            .into_iter()
            .map(|family| (self.path(family), self.serialize(family)))
            .collect()
    }
}

/// How a subnet asks for its addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubnetKind {
    Dhcp4,
    Dhcp6,
    Static,
}

impl SubnetKind {
    fn classify(subnet: &Subnet, interface: &str) -> Result<Self, SysconfigError> {
        match subnet.subnet_type.as_str() {
            "dhcp" | "dhcp4" => Ok(Self::Dhcp4),
            "dhcp6" => Ok(Self::Dhcp6),
            "static" | "static6" => Ok(Self::Static),
            other => Err(SysconfigError::unknown_subnet(other, interface)),
        }
    }
}

/// Prefix length of a netmask given as a length or as an address mask
fn prefix_len(netmask: &str) -> Option<u32> {
    if let Ok(prefix) = netmask.parse::<u32>() {
        return Some(prefix);
    }
    match netmask.parse::<IpAddr>().ok()? {
        IpAddr::V4(mask) => Some(u32::from(mask).leading_ones()),
        IpAddr::V6(mask) => Some(u128::from(mask).leading_ones()),
    }
}

/// Family of `route` if it covers the whole address space
fn default_route_family(route: &Route) -> Option<AddressFamily> {
    let network: IpAddr = route.network.parse().ok()?;
    if !network.is_unspecified() {
        return None;
    }
    let prefix = prefix_len(route.netmask.as_deref()?)?;
    if prefix != 0 {
        return None;
    }
    Some(match network {
        IpAddr::V4(_) => AddressFamily::Ipv4,
        IpAddr::V6(_) => AddressFamily::Ipv6,
    })
}

fn param_value(param: &Param) -> Value {
    match param {
        Param::Bool(b) => Value::Bool(*b),
        Param::Int(i) => Value::Int(*i),
        other => Value::from(other.to_option_string()),
    }
}

fn lookup<'a>(
    table: &'a mut InterfaceTable,
    name: &str,
    referenced_by: &str,
) -> Result<&'a mut InterfaceConfig, SysconfigError> {
    table
        .get_mut(name)
        .ok_or_else(|| SysconfigError::unknown_interface(name, referenced_by))
}

/// Renders network state in the /etc/sysconfig format
#[derive(Debug, Clone, Default)]
pub struct SysconfigRenderer {
    config: RendererConfig,
}

impl SysconfigRenderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    fn render_iface_shared(iface: &Interface, cfg: &mut InterfaceConfig) {
        for (key, value) in IFACE_DEFAULTS {
            cfg.set(*key, value.clone());
        }
        if let Some(mac) = &iface.mac_address {
            cfg.set("HWADDR", mac);
        }
        if let Some(mtu) = iface.mtu {
            cfg.set("MTU", mtu);
        }
    }

    fn render_subnets(cfg: &mut InterfaceConfig, subnets: &[Subnet]) -> Result<(), SysconfigError> {
        cfg.set("BOOTPROTO", "none");

        let mut kinds = Vec::with_capacity(subnets.len());
        for subnet in subnets {
            let kind = SubnetKind::classify(subnet, cfg.name())?;
            match kind {
                SubnetKind::Dhcp6 => {
                    cfg.set("IPV6INIT", true);
                    cfg.set("DHCPV6C", true);
                    cfg.set("BOOTPROTO", "none");
                }
                SubnetKind::Dhcp4 => cfg.set("BOOTPROTO", "none"),
                SubnetKind::Static => {
                    if subnet.is_ipv6() {
                        cfg.set("IPV6INIT", true);
                    }
                }
            }
            kinds.push(kind);
        }

        let mut ipv4_count = 0usize;
        let mut ipv6_addrs: Vec<String> = Vec::new();
        for (subnet, kind) in subnets.iter().zip(kinds) {
            if kind != SubnetKind::Static {
                continue;
            }
            let Some(address) = subnet.address.as_deref() else {
                warn!("Static subnet without address on {}, skipping", cfg.name());
                continue;
            };

            if subnet.is_ipv6() {
                let cidr = match subnet.netmask.as_deref().filter(|m| !m.is_empty()) {
                    Some(netmask) => format!("{}/{}", address, netmask),
                    None => address.to_string(),
                };
                ipv6_addrs.push(cidr);
            } else {
                let suffix = if ipv4_count == 0 {
                    String::new()
                } else {
                    ipv4_count.to_string()
                };
                cfg.set(format!("IPADDR{}", suffix), address);
                if let Some(netmask) = subnet.netmask.as_deref() {
                    cfg.set(format!("NETMASK{}", suffix), netmask);
                }
                ipv4_count += 1;
            }
        }

        let mut ipv6_addrs = ipv6_addrs.into_iter();
        if let Some(primary) = ipv6_addrs.next() {
            cfg.set("IPV6ADDR", primary);
        }
        let secondaries: Vec<String> = ipv6_addrs.collect();
        if !secondaries.is_empty() {
            cfg.set("IPV6ADDR_SECONDARIES", secondaries.join(" "));
        }
        Ok(())
    }

    fn render_subnet_routes(
        cfg: &mut InterfaceConfig,
        subnets: &[Subnet],
    ) -> Result<(), SysconfigError> {
        for route in subnets.iter().flat_map(|s| &s.routes) {
            match default_route_family(route) {
                Some(family) => {
                    // The owning interface provides the default route
                    cfg.routes_mut().mark_default_route(family)?;
                    cfg.set("DEFROUTE", true);
                    if let Some(gateway) = &route.gateway {
                        let key = match family {
                            AddressFamily::Ipv4 => "GATEWAY",
                            AddressFamily::Ipv6 => "IPV6_DEFAULTGW",
                        };
                        cfg.set(key, gateway);
                    }
                    debug!("{} provides the {} default route", cfg.name(), family);
                }
                None => {
                    let index = cfg.routes_mut().add_route(
                        &route.network,
                        route.netmask.as_deref(),
                        route.gateway.as_deref(),
                    );
                    debug!("Route {} on {} stored as index {}", route.network, cfg.name(), index);
                }
            }
        }
        Ok(())
    }

    fn render_bonding_opts(cfg: &mut InterfaceConfig, iface: &Interface) {
        let opts: Vec<String> = BOND_OPTIONS
            .iter()
            .filter_map(|(key, option)| {
                // either spelling may be used
                let param = iface
                    .param(key)
                    .or_else(|| iface.param(&key.replace('_', "-")))?;
                Some(format!("{}={}", option, param.to_option_string()))
            })
            .collect();
        if !opts.is_empty() {
            cfg.set("BONDING_OPTS", opts.join(" "));
        }
    }

    fn render_physical_interfaces(
        state: &NetworkState,
        table: &mut InterfaceTable,
    ) -> Result<(), SysconfigError> {
        for iface in state.iter_interfaces(InterfaceFilter::Physical) {
            let cfg = lookup(table, &iface.name, &iface.name)?;
            Self::render_subnets(cfg, &iface.subnets)?;
            Self::render_subnet_routes(cfg, &iface.subnets)?;
        }
        Ok(())
    }

    fn render_bond_interfaces(
        state: &NetworkState,
        table: &mut InterfaceTable,
    ) -> Result<(), SysconfigError> {
        for iface in state.iter_interfaces(InterfaceFilter::BondMember) {
            let Some(master) = iface.bond_master.as_deref() else {
                continue;
            };
            let cfg = lookup(table, &iface.name, &iface.name)?;
            Self::render_bonding_opts(cfg, iface);
            cfg.set("MASTER", master);
            cfg.set("SLAVE", true);

            // Make sure the master (and any of its children) is a bond
            let master_cfg = lookup(table, master, &iface.name)?;
            master_cfg.apply_with_children(|c| {
                c.set("BONDING_MASTER", true);
                c.set_kind(InterfaceKind::Bond);
            });
        }

        for iface in state.iter_interfaces(InterfaceFilter::Bond) {
            if iface.bond_master.is_some() {
                continue;
            }
            let cfg = lookup(table, &iface.name, &iface.name)?;
            Self::render_bonding_opts(cfg, iface);
            cfg.apply_with_children(|c| {
                c.set("BONDING_MASTER", true);
                c.set_kind(InterfaceKind::Bond);
            });
        }
        Ok(())
    }

    fn render_vlan_interfaces(
        state: &NetworkState,
        table: &mut InterfaceTable,
    ) -> Result<(), SysconfigError> {
        for iface in state.iter_interfaces(InterfaceFilter::Vlan) {
            let cfg = lookup(table, &iface.name, &iface.name)?;
            cfg.set("VLAN", true);

            let physdev = match iface.name.rfind('.') {
                Some(pos) => Some(&iface.name[..pos]),
                None => iface.vlan_raw_device.as_deref(),
            };
            match physdev {
                Some(physdev) => cfg.set("PHYSDEV", physdev),
                None => warn!("Cannot derive PHYSDEV for VLAN {}", iface.name),
            }
        }
        Ok(())
    }

    fn render_bridge_interfaces(
        state: &NetworkState,
        table: &mut InterfaceTable,
    ) -> Result<(), SysconfigError> {
        for iface in state.iter_interfaces(InterfaceFilter::Bridge) {
            let cfg = lookup(table, &iface.name, &iface.name)?;
            cfg.set_kind(InterfaceKind::Bridge);
            for (old_key, new_key) in BRIDGE_OPTIONS {
                if let Some(param) = iface.param(old_key) {
                    cfg.set(*new_key, param_value(param));
                }
            }

            for port in &iface.bridge_ports {
                let port_cfg = lookup(table, port, &iface.name)?;
                port_cfg.apply_with_children(|c| c.set("BRIDGE", iface.name.as_str()));
            }
        }
        Ok(())
    }

    /// Render every ifcfg and route file for `state`, rooted at
    /// `scripts_dir`
    pub fn render_sysconfig(
        scripts_dir: &Path,
        state: &NetworkState,
    ) -> Result<BTreeMap<PathBuf, String>, SysconfigError> {
        let mut table = Self::build_table(scripts_dir, state);
        Self::render_table(state, &mut table)
    }

    fn build_table(scripts_dir: &Path, state: &NetworkState) -> InterfaceTable {
        let mut table = InterfaceTable::new();
        for iface in state.iter_interfaces(InterfaceFilter::All) {
            let mut cfg = InterfaceConfig::new(iface.name.clone(), scripts_dir);
            Self::render_iface_shared(iface, &mut cfg);
            table.insert(iface.name.clone(), cfg);
        }
        table
    }

    /// Run the passes over `table` and collect every file
    fn render_table(
        state: &NetworkState,
        table: &mut InterfaceTable,
    ) -> Result<BTreeMap<PathBuf, String>, SysconfigError> {
        Self::render_physical_interfaces(state, table)?;
        Self::render_bond_interfaces(state, table)?;
        Self::render_vlan_interfaces(state, table)?;
        Self::render_bridge_interfaces(state, table)?;

        let mut contents = BTreeMap::new();
        for cfg in table.values() {
            contents.extend(cfg.rendered_files());
            contents.extend(cfg.routes().rendered_files());
        }
        debug!("Rendered {} sysconfig files", contents.len());
        Ok(contents)
    }

    /// Render resolv.conf on top of `existing` content, if any
    pub fn render_dns(state: &NetworkState, existing: Option<&str>) -> Result<String, SysconfigError> {
        let mut content = existing.map(ResolvConf::parse).unwrap_or_default();
        for nameserver in state.dns_nameservers() {
            content.add_nameserver(nameserver)?;
        }
        for domain in state.dns_searchdomains() {
            content.add_search_domain(domain)?;
        }
        Ok(format!("{}\n{}", make_header(';'), content))
    }
}

impl Renderer for SysconfigRenderer {
    fn name(&self) -> &'static str {
        "sysconfig"
    }

    fn render(&self, state: &NetworkState, target: &Path) -> Result<Vec<RenderedFile>, SysconfigError> {
        let paths = SysconfigPaths::new(target, &self.config);

        let mut files: Vec<RenderedFile> =
            Self::render_sysconfig(&paths.network_scripts_dir(), state)?
                .into_iter()
                .map(|(path, content)| RenderedFile::new(path, content))
                .collect();

        if let Some(dns_path) = paths.dns() {
            let existing = if dns_path.is_file() {
                debug!("Merging existing {}", dns_path.display());
                Some(std::fs::read_to_string(&dns_path)?)
            } else {
                None
            };
            let content = Self::render_dns(state, existing.as_deref())?;
            files.push(RenderedFile::new(dns_path, content));
        }

        if let Some(rules_path) = paths.netrules() {
            files.push(RenderedFile::new(rules_path, udev::render_persistent_net(state)));
        }

        info!("Rendered {} files for {} interfaces", files.len(), state.interfaces.len());
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::InterfaceType;

    const DIR: &str = "/etc/sysconfig/network-scripts";

    fn physical(name: &str, subnets: Vec<Subnet>) -> Interface {
        Interface {
            subnets,
            ..Interface::new(name, InterfaceType::Physical)
        }
    }

    fn static4(address: &str, netmask: &str) -> Subnet {
        Subnet {
            subnet_type: "static".into(),
            address: Some(address.into()),
            netmask: Some(netmask.into()),
            ..Default::default()
        }
    }

    fn static6(address: &str, prefix: Option<&str>) -> Subnet {
        Subnet {
            subnet_type: "static".into(),
            address: Some(address.into()),
            netmask: prefix.map(str::to_string),
            ..Default::default()
        }
    }

    fn route(network: &str, netmask: &str, gateway: &str) -> Route {
        Route {
            network: network.into(),
            netmask: Some(netmask.into()),
            gateway: Some(gateway.into()),
            metric: None,
        }
    }

    fn state_of(ifaces: Vec<Interface>) -> NetworkState {
        let mut state = NetworkState::default();
        for iface in ifaces {
            state.interfaces.insert(iface.name.clone(), iface);
        }
        state
    }

    fn ifcfg(files: &BTreeMap<PathBuf, String>, name: &str) -> String {
        files[&Path::new(DIR).join(format!("ifcfg-{}", name))].clone()
    }

    fn route_file(files: &BTreeMap<PathBuf, String>, name: &str) -> String {
        files[&Path::new(DIR).join(format!("route-{}", name))].clone()
    }

    fn render(state: &NetworkState) -> BTreeMap<PathBuf, String> {
        SysconfigRenderer::render_sysconfig(Path::new(DIR), state).unwrap()
    }

    #[test]
    fn test_shared_defaults() {
        let mut eth0 = physical("eth0", vec![]);
        eth0.mac_address = Some("52:54:00:12:34:00".into());
        eth0.mtu = Some(9000);
        let files = render(&state_of(vec![eth0]));

        let out = ifcfg(&files, "eth0");
        for line in [
            "BOOTPROTO=none",
            "DEVICE=eth0",
            "HWADDR=52:54:00:12:34:00",
            "MTU=9000",
            "ONBOOT=no",
            "TYPE=Ethernet",
            "USERCTL=no",
        ] {
            assert!(out.contains(&format!("{}\n", line)), "missing {}", line);
        }
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn test_two_static_ipv4_subnets() {
        let eth0 = physical(
            "eth0",
            vec![
                static4("10.0.0.5", "255.255.255.0"),
                static4("10.0.0.6", "255.255.255.0"),
            ],
        );
        let out = ifcfg(&render(&state_of(vec![eth0])), "eth0");
        assert!(out.contains("IPADDR=10.0.0.5\n"));
        assert!(out.contains("NETMASK=255.255.255.0\n"));
        assert!(out.contains("IPADDR1=10.0.0.6\n"));
        assert!(out.contains("NETMASK1=255.255.255.0\n"));
        assert!(!out.contains("IPV6INIT"));
    }

    #[test]
    fn test_dual_stack_counters_independent() {
        let eth0 = physical(
            "eth0",
            vec![
                static6("2001:db8::5", Some("64")),
                static4("10.0.0.5", "255.255.255.0"),
                static6("2001:db8::6", Some("64")),
                static6("2001:db8::7", None),
                static4("10.0.0.6", "255.255.255.0"),
            ],
        );
        let out = ifcfg(&render(&state_of(vec![eth0])), "eth0");
        assert!(out.contains("IPV6INIT=yes\n"));
        assert!(out.contains("IPV6ADDR=2001:db8::5/64\n"));
        assert!(out.contains("IPV6ADDR_SECONDARIES=\"2001:db8::6/64 2001:db8::7\"\n"));
        assert!(out.contains("IPADDR=10.0.0.5\n"));
        assert!(out.contains("IPADDR1=10.0.0.6\n"));
        assert!(!out.contains("IPADDR2"));
    }

    #[test]
    fn test_dhcp_subnets() {
        let eth0 = physical(
            "eth0",
            vec![
                Subnet {
                    subnet_type: "dhcp4".into(),
                    ..Default::default()
                },
                Subnet {
                    subnet_type: "dhcp6".into(),
                    ..Default::default()
                },
            ],
        );
        let out = ifcfg(&render(&state_of(vec![eth0])), "eth0");
        assert!(out.contains("BOOTPROTO=none\n"));
        assert!(out.contains("IPV6INIT=yes\n"));
        assert!(out.contains("DHCPV6C=yes\n"));
    }

    #[test]
    fn test_unknown_subnet_type() {
        let eth0 = physical(
            "eth0",
            vec![Subnet {
                subnet_type: "foo".into(),
                ..Default::default()
            }],
        );
        let err = SysconfigRenderer::render_sysconfig(Path::new(DIR), &state_of(vec![eth0]))
            .unwrap_err();
        assert!(matches!(
            err,
            SysconfigError::UnknownSubnetType { ref subnet_type, ref interface }
                if subnet_type == "foo" && interface == "eth0"
        ));
    }

    #[test]
    fn test_default_route_goes_to_ifcfg() {
        let mut subnet = static4("10.0.0.5", "255.255.255.0");
        subnet.routes = vec![
            route("0.0.0.0", "0.0.0.0", "10.0.0.1"),
            route("192.168.0.0", "255.255.0.0", "10.0.0.254"),
        ];
        let files = render(&state_of(vec![physical("eth0", vec![subnet])]));

        let out = ifcfg(&files, "eth0");
        assert!(out.contains("DEFROUTE=yes\n"));
        assert!(out.contains("GATEWAY=10.0.0.1\n"));

        let routes = route_file(&files, "eth0");
        assert!(!routes.contains("0.0.0.0"));
        assert!(routes.contains("ADDRESS0=192.168.0.0\n"));
        assert!(routes.contains("GATEWAY0=10.0.0.254\n"));
        assert!(routes.contains("NETMASK0=255.255.0.0\n"));
    }

    #[test]
    fn test_ipv6_default_route() {
        let mut subnet = static6("2001:db8::5", Some("64"));
        subnet.routes = vec![
            route("::", "0", "2001:db8::1"),
            route("2001:db8:1::", "48", "2001:db8::2"),
        ];
        let files = render(&state_of(vec![physical("eth0", vec![subnet])]));

        let out = ifcfg(&files, "eth0");
        assert!(out.contains("DEFROUTE=yes\n"));
        assert!(out.contains("IPV6_DEFAULTGW=2001:db8::1\n"));
        assert!(!out.contains("\nGATEWAY="));

        let route6 = &files[&Path::new(DIR).join("route6-eth0")];
        assert!(route6.ends_with("2001:db8:1::/48 via 2001:db8::2\n"));
    }

    #[test]
    fn test_duplicate_default_route() {
        let mut first = static4("10.0.0.5", "255.255.255.0");
        first.routes = vec![route("0.0.0.0", "0.0.0.0", "10.0.0.1")];
        let mut second = static4("10.0.1.5", "255.255.255.0");
        second.routes = vec![route("0.0.0.0", "0", "10.0.1.1")];

        let err = SysconfigRenderer::render_sysconfig(
            Path::new(DIR),
            &state_of(vec![physical("eth0", vec![first, second])]),
        )
        .unwrap_err();
        assert!(matches!(err, SysconfigError::DuplicateDefaultRoute { .. }));
    }

    #[test]
    fn test_one_default_route_per_family_is_fine() {
        let mut subnet = static4("10.0.0.5", "255.255.255.0");
        subnet.routes = vec![
            route("0.0.0.0", "0.0.0.0", "10.0.0.1"),
            route("::", "::", "2001:db8::1"),
        ];
        let out = ifcfg(&render(&state_of(vec![physical("eth0", vec![subnet])])), "eth0");
        assert!(out.contains("GATEWAY=10.0.0.1\n"));
        assert!(out.contains("IPV6_DEFAULTGW=2001:db8::1\n"));
    }

    #[test]
    fn test_default_route_detection() {
        assert_eq!(
            default_route_family(&route("0.0.0.0", "0.0.0.0", "gw")),
            Some(AddressFamily::Ipv4)
        );
        assert_eq!(
            default_route_family(&route("::", "0", "gw")),
            Some(AddressFamily::Ipv6)
        );
        assert_eq!(
            default_route_family(&route("0:0::0", "::", "gw")),
            Some(AddressFamily::Ipv6)
        );
        assert_eq!(default_route_family(&route("0.0.0.0", "255.0.0.0", "gw")), None);
        assert_eq!(default_route_family(&route("10.0.0.0", "0", "gw")), None);
        assert_eq!(default_route_family(&route("bogus", "0", "gw")), None);
    }

    #[test]
    fn test_bond_member_and_master() {
        let mut eth0 = physical("eth0", vec![]);
        eth0.bond_master = Some("bond0".into());
        eth0.params.insert("bond-mode".into(), Param::from("802.3ad"));
        eth0.params.insert("bond_miimon".into(), Param::Int(100));
        eth0.params
            .insert("bond-xmit-hash-policy".into(), Param::from("layer3+4"));
        let bond0 = Interface::new("bond0", InterfaceType::Bond);

        let files = render(&state_of(vec![eth0, bond0]));

        let member = ifcfg(&files, "eth0");
        assert!(member.contains(
            "BONDING_OPTS=\"mode=802.3ad xmit_hash_policy=layer3+4 miimon=100\"\n"
        ));
        assert!(member.contains("MASTER=bond0\n"));
        assert!(member.contains("SLAVE=yes\n"));

        let master = ifcfg(&files, "bond0");
        assert!(master.contains("BONDING_MASTER=yes\n"));
        assert!(master.contains("TYPE=Bond\n"));
    }

    #[test]
    fn test_bond_without_options() {
        let mut eth0 = physical("eth0", vec![]);
        eth0.bond_master = Some("bond0".into());
        let bond0 = Interface::new("bond0", InterfaceType::Bond);
        let out = ifcfg(&render(&state_of(vec![eth0, bond0])), "eth0");
        assert!(!out.contains("BONDING_OPTS"));
    }

    #[test]
    fn test_missing_bond_master() {
        let mut eth0 = physical("eth0", vec![]);
        eth0.bond_master = Some("bond9".into());
        let err = SysconfigRenderer::render_sysconfig(Path::new(DIR), &state_of(vec![eth0]))
            .unwrap_err();
        assert!(matches!(
            err,
            SysconfigError::UnknownInterface { ref name, .. } if name == "bond9"
        ));
    }

    fn render_with_child(
        state: &NetworkState,
        parent: &str,
        child: &str,
    ) -> BTreeMap<PathBuf, String> {
        let mut table = SysconfigRenderer::build_table(Path::new(DIR), state);
        table
            .get_mut(parent)
            .unwrap()
            .add_child(InterfaceConfig::new(child, DIR));
        SysconfigRenderer::render_table(state, &mut table).unwrap()
    }

    #[test]
    fn test_bond_master_children_become_bonds() {
        let mut eth0 = physical("eth0", vec![]);
        eth0.bond_master = Some("bond0".into());
        let state = state_of(vec![eth0, Interface::new("bond0", InterfaceType::Bond)]);

        let files = render_with_child(&state, "bond0", "bond0:1");
        let child = ifcfg(&files, "bond0:1");
        assert!(child.contains("BONDING_MASTER=yes\n"));
        assert!(child.contains("TYPE=Bond\n"));
        assert!(child.contains("DEVICE=bond0:1\n"));
        assert!(!child.contains("SLAVE"));
    }

    #[test]
    fn test_bridge_port_children_join_bridge() {
        let mut br0 = Interface::new("br0", InterfaceType::Bridge);
        br0.bridge_ports = vec!["eth0".into()];
        let state = state_of(vec![br0, physical("eth0", vec![])]);

        let files = render_with_child(&state, "eth0", "eth0:1");
        assert!(ifcfg(&files, "eth0").contains("BRIDGE=br0\n"));
        let child = ifcfg(&files, "eth0:1");
        assert!(child.contains("BRIDGE=br0\n"));
        assert!(child.contains("TYPE=Ethernet\n"));
    }

    #[test]
    fn test_vlan_physdev() {
        let vlan = Interface::new("eth0.100", InterfaceType::Vlan);
        let out = ifcfg(&render(&state_of(vec![vlan])), "eth0.100");
        assert!(out.contains("VLAN=yes\n"));
        assert!(out.contains("PHYSDEV=eth0\n"));
    }

    #[test]
    fn test_vlan_without_dot_uses_raw_device() {
        let mut vlan = Interface::new("vlan100", InterfaceType::Vlan);
        vlan.vlan_raw_device = Some("eth1".into());
        let out = ifcfg(&render(&state_of(vec![vlan])), "vlan100");
        assert!(out.contains("PHYSDEV=eth1\n"));
    }

    #[test]
    fn test_bridge_pass() {
        let mut br0 = Interface::new("br0", InterfaceType::Bridge);
        br0.bridge_ports = vec!["eth0".into(), "eth1".into()];
        br0.params.insert("bridge_stp".into(), Param::from("off"));
        br0.params.insert("bridge_bridgeprio".into(), Param::Int(22));
        br0.params.insert("bridge_fd".into(), Param::Int(0));

        let files = render(&state_of(vec![
            br0,
            physical("eth0", vec![]),
            physical("eth1", vec![]),
        ]));

        let bridge = ifcfg(&files, "br0");
        assert!(bridge.contains("TYPE=Bridge\n"));
        assert!(bridge.contains("STP=off\n"));
        assert!(bridge.contains("PRIO=22\n"));
        assert!(!bridge.contains("AGEING"));
        for port in ["eth0", "eth1"] {
            assert!(ifcfg(&files, port).contains("BRIDGE=br0\n"));
        }
    }

    #[test]
    fn test_route_files_always_emitted() {
        let files = render(&state_of(vec![physical("eth0", vec![])]));
        let header = make_header('#');
        assert_eq!(route_file(&files, "eth0"), header);
        assert_eq!(files[&Path::new(DIR).join("route6-eth0")], header);
    }

    #[test]
    fn test_children_emitted_after_parent() {
        let mut cfg = InterfaceConfig::new("eth0", DIR);
        cfg.add_child(InterfaceConfig::new("eth0:1", DIR));
        let files = cfg.rendered_files();
        assert_eq!(files.len(), 2);
        assert!(files[0].0.ends_with("ifcfg-eth0"));
        assert!(files[1].0.ends_with("ifcfg-eth0:1"));
    }

    #[test]
    fn test_render_dns() {
        let mut state = NetworkState::default();
        state.dns.nameservers = vec!["10.0.0.2".into()];
        state.dns.search = vec!["example.com".into()];

        let out = SysconfigRenderer::render_dns(&state, None).unwrap();
        assert_eq!(
            out,
            "; Created by cloud-init on instance boot automatically, do not edit.\n;\n\
             nameserver 10.0.0.2\nsearch example.com\n"
        );

        let merged =
            SysconfigRenderer::render_dns(&state, Some("nameserver 10.0.0.9\n")).unwrap();
        assert!(merged.ends_with("nameserver 10.0.0.9\nnameserver 10.0.0.2\nsearch example.com\n"));
    }
}
