//! Device identity derived from the ESP32 factory MAC address.
//!
//! - Device id `esp<12 hex>` (full MAC, lowercase) seeds the MQTT client id
//!   and the default access token.
//! - Hostname `vrpc-agent-xxyyzz` (last 3 MAC bytes) is reported in the
//!   presence announcement.

use core::fmt::Write;

/// Fixed-size device id: "esp" + 12 hex chars.
pub type DeviceIdString = heapless::String<16>;

/// Fixed-size hostname: "vrpc-agent-" + 6 hex chars.
pub type HostnameString = heapless::String<24>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

pub fn device_id(mac: &MacAddress) -> DeviceIdString {
    let mut id = DeviceIdString::new();
    let _ = write!(id, "esp");
    for b in mac {
        let _ = write!(id, "{b:02x}");
    }
    id
}

pub fn hostname(mac: &MacAddress) -> HostnameString {
    let mut name = HostnameString::new();
    let _ = write!(name, "vrpc-agent-{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    name
}
