//! Network device enumeration seam.
//!
//! The network probe family enumerates devices from a bus-management
//! service's property dictionaries rather than walking sysfs directly.
//! The transport is opaque behind [`NetworkDeviceSource`]; the production
//! source queries NetworkManager through `nmcli` in terse mode.

use crate::runtime::command::{CommandError, CommandExecutor};

#[derive(Debug, thiserror::Error)]
pub enum NetworkSourceError {
    #[error("device enumeration failed: {0}")]
    Query(#[from] CommandError),

    #[error("device listing exited with status {0}")]
    ListingFailed(i32),
}

/// One enumerated network device, as reported by the management service.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NetworkDevice {
    /// Kernel interface name, e.g. `wlan0`.
    pub interface: String,
    /// Normalized device type: `wifi`, `ethernet` or `cellular`.
    pub device_type: String,
}

pub trait NetworkDeviceSource: Send + Sync {
    fn devices(&self) -> Result<Vec<NetworkDevice>, NetworkSourceError>;
}

/// Production source: `nmcli -t -f DEVICE,TYPE device`.
pub struct NmcliDeviceSource {
    executor: CommandExecutor,
}

impl NmcliDeviceSource {
    pub fn new(executor: CommandExecutor) -> Self {
        Self { executor }
    }

    fn normalize_type(raw: &str) -> Option<&'static str> {
        match raw {
            "wifi" | "802-11-wireless" => Some("wifi"),
            "ethernet" | "802-3-ethernet" => Some("ethernet"),
            "gsm" | "cdma" => Some("cellular"),
            _ => None,
        }
    }

    fn parse_listing(listing: &str) -> Vec<NetworkDevice> {
        let mut devices = Vec::new();
        for line in listing.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            // Terse format: DEVICE:TYPE
            let Some((interface, raw_type)) = line.split_once(':') else {
                continue;
            };
            let Some(device_type) = Self::normalize_type(raw_type) else {
                continue;
            };
            devices.push(NetworkDevice {
                interface: interface.to_string(),
                device_type: device_type.to_string(),
            });
        }
        devices
    }
}

impl NetworkDeviceSource for NmcliDeviceSource {
    fn devices(&self) -> Result<Vec<NetworkDevice>, NetworkSourceError> {
        let output = self
            .executor
            .execute("nmcli", &["-t", "-f", "DEVICE,TYPE", "device"], None)?;
        if !output.success() {
            return Err(NetworkSourceError::ListingFailed(output.status_code));
        }
        Ok(Self::parse_listing(&output.stdout))
    }
}

/// Fixed device list, for tests and embedding.
pub struct StaticDeviceSource {
    devices: Vec<NetworkDevice>,
}

impl StaticDeviceSource {
    pub fn new(devices: Vec<NetworkDevice>) -> Self {
        Self { devices }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl NetworkDeviceSource for StaticDeviceSource {
    fn devices(&self) -> Result<Vec<NetworkDevice>, NetworkSourceError> {
        Ok(self.devices.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_terse_listing() {
        let listing = "wlan0:wifi\neth0:ethernet\nlo:loopback\nwwan0:gsm\n";
        let devices = NmcliDeviceSource::parse_listing(listing);
        assert_eq!(
            devices,
            vec![
                NetworkDevice {
                    interface: "wlan0".to_string(),
                    device_type: "wifi".to_string()
                },
                NetworkDevice {
                    interface: "eth0".to_string(),
                    device_type: "ethernet".to_string()
                },
                NetworkDevice {
                    interface: "wwan0".to_string(),
                    device_type: "cellular".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let devices = NmcliDeviceSource::parse_listing("no-colon-here\n\n");
        assert!(devices.is_empty());
    }
}
