//! Persistent interface naming rules
//!
//! Pins each physical interface's name to its MAC address through udev.

use super::{InterfaceFilter, NetworkState};
use tracing::debug;

/// One udev rule mapping `mac` to `interface`
pub fn generate_udev_rule(interface: &str, mac: &str) -> String {
    let rule = [
        r#"SUBSYSTEM=="net""#.to_string(),
        r#"ACTION=="add""#.to_string(),
        r#"DRIVERS=="?*""#.to_string(),
        format!(r#"ATTR{{address}}=="{}""#, mac),
        format!(r#"NAME="{}""#, interface),
    ];
    format!("{}\n", rule.join(", "))
}

/// Rules for every physical interface that has a MAC address
pub fn render_persistent_net(state: &NetworkState) -> String {
    let mut content = String::new();
    for iface in state.iter_interfaces(InterfaceFilter::Physical) {
        if let Some(mac) = iface.mac_address.as_deref().filter(|m| !m.is_empty()) {
            debug!("Pinning {} to {}", iface.name, mac);
            content.push_str(&generate_udev_rule(&iface.name, mac));
        }
    }
    content
}
