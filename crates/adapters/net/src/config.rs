//! Wake-on-LAN configuration.

use std::net::Ipv4Addr;

use serde::Deserialize;

/// Where magic packets are sent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WolConfig {
    /// Broadcast address of the LAN the devices live on.
    pub broadcast: Ipv4Addr,
    /// UDP ports; the packet is sent to each of them.
    pub ports: Vec<u16>,
}

impl Default for WolConfig {
    fn default() -> Self {
        Self {
            broadcast: Ipv4Addr::BROADCAST,
            ports: vec![9, 7],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = WolConfig::default();
        assert_eq!(config.broadcast, Ipv4Addr::new(255, 255, 255, 255));
        assert_eq!(config.ports, [9, 7]);
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            broadcast = "192.168.1.255"
            ports = [9]
        "#;
        let config: WolConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.broadcast, Ipv4Addr::new(192, 168, 1, 255));
        assert_eq!(config.ports, [9]);
    }

    #[test]
    fn should_use_defaults_for_missing_fields() {
        let config: WolConfig = toml::from_str(r#"broadcast = "10.0.0.255""#).unwrap();
        assert_eq!(config.ports, [9, 7]);
    }

    #[test]
    fn should_reject_invalid_broadcast_address() {
        let result: Result<WolConfig, _> = toml::from_str(r#"broadcast = "lan""#);
        assert!(result.is_err());
    }
}
