use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Capabilities the voice layer knows how to drive, in priority order.
/// The first one present in a device's raw capability map becomes its
/// primary capability.
pub const CAPABILITY_PRIORITY: [&str; 5] = [
    "onoff",
    "dim",
    "target_temperature",
    "button",
    "speaker_playing",
];

/// One controllable device in the hub inventory.
#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    /// Zone the device is located in.
    #[serde(rename = "zone", default)]
    pub zone_id: Option<String>,
    /// Raw capability map as reported by the hub: name -> {"value": ...}.
    #[serde(default)]
    pub capabilities: HashMap<String, Value>,
    /// Primary capability, derived from `capabilities`.
    #[serde(skip)]
    pub capability: String,
    /// Current on/off state of the primary capability.
    #[serde(skip)]
    pub on: bool,
    /// Display name of the zone, cross-linked by the executor.
    #[serde(skip)]
    pub zone_name: Option<String>,
    /// Last written or observed target temperature, used as the base for
    /// relative adjustments within one session.
    #[serde(skip)]
    pub cached_target_temperature: Option<f64>,
}

impl Device {
    /// Pick the primary capability from the raw capability map and derive
    /// the on/off state from its value. Falls back to `onoff`/on when the
    /// map contains nothing the voice layer can drive.
    pub fn derive_primary_capability(&mut self) {
        for capability in CAPABILITY_PRIORITY {
            let Some(data) = self.capabilities.get(capability) else {
                continue;
            };
            self.capability = capability.to_string();

            if capability == "button" {
                // Buttons carry no value; treat them as ready to press.
                self.on = true;
                return;
            }

            match data.get("value") {
                Some(value) if !value.is_null() => {
                    self.on = value.as_bool().unwrap_or(false);
                    if capability == "target_temperature" {
                        self.cached_target_temperature = value.as_f64();
                    }
                }
                _ => {
                    eprintln!(
                        "hub: device {}: capability {} missing value field",
                        self.name, capability
                    );
                    self.on = false;
                }
            }
            return;
        }

        self.capability = "onoff".to_string();
        self.on = true;
    }
}

/// A named location grouping devices.
#[derive(Debug, Clone, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
}

/// A named automation a voice command can trigger.
#[derive(Debug, Clone, Deserialize)]
pub struct Flow {
    pub id: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub triggerable: bool,
}

fn default_true() -> bool {
    true
}

/// Narrow contract to the surrounding application's hub connection.
///
/// This is the only way the command core reads inventory or changes device
/// state; everything behind it (transport, auth, caching) is someone else's
/// problem.
pub trait HubClient: Send + Sync {
    fn devices(&self) -> Result<HashMap<String, Device>, String>;
    fn zones(&self) -> Result<HashMap<String, Zone>, String>;
    fn flows(&self) -> Result<HashMap<String, Flow>, String>;

    /// Write one capability value on one device.
    fn set_capability_value(
        &self,
        device_id: &str,
        capability: &str,
        value: Value,
    ) -> Result<(), String>;

    /// Start the flow with the given id.
    fn trigger_flow(&self, flow_id: &str) -> Result<(), String>;

    /// Fresh read of a single device, used as the fallback source for
    /// relative temperature adjustments.
    fn refresh_device(&self, device_id: &str) -> Result<Option<Device>, String>;
}
