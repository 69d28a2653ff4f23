use crate::error::{HeimdError, Result};
use crate::hub::{Device, Flow, HubClient, Zone};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// On-disk inventory snapshot: the JSON export a hub connection would
/// otherwise deliver live.
#[derive(Debug, Deserialize)]
struct InventoryFile {
    #[serde(default)]
    devices: Vec<Device>,
    #[serde(default)]
    zones: Vec<Zone>,
    #[serde(default)]
    flows: Vec<Flow>,
}

/// [`HubClient`] backed by an inventory file.
///
/// Reads serve the parsed snapshot; writes and flow triggers are logged
/// instead of transmitted, so a transcript can be replayed against a saved
/// inventory without touching a real home.
pub struct FileHub {
    devices: HashMap<String, Device>,
    zones: HashMap<String, Zone>,
    flows: HashMap<String, Flow>,
}

impl FileHub {
    pub fn from_path(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path).map_err(|e| HeimdError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json_str(&s).map_err(|message| HeimdError::ParseError {
            path: path.to_path_buf(),
            kind: "json",
            message,
        })
    }

    pub fn from_json_str(s: &str) -> std::result::Result<Self, String> {
        let file: InventoryFile = serde_json::from_str(s).map_err(|e| e.to_string())?;

        let mut devices = HashMap::new();
        for mut device in file.devices {
            device.derive_primary_capability();
            devices.insert(device.id.clone(), device);
        }
        let zones: HashMap<String, Zone> =
            file.zones.into_iter().map(|z| (z.id.clone(), z)).collect();
        let flows: HashMap<String, Flow> =
            file.flows.into_iter().map(|f| (f.id.clone(), f)).collect();

        eprintln!(
            "hub: loaded inventory ({} devices, {} zones, {} flows)",
            devices.len(),
            zones.len(),
            flows.len()
        );

        Ok(Self {
            devices,
            zones,
            flows,
        })
    }
}

impl HubClient for FileHub {
    fn devices(&self) -> std::result::Result<HashMap<String, Device>, String> {
        Ok(self.devices.clone())
    }

    fn zones(&self) -> std::result::Result<HashMap<String, Zone>, String> {
        Ok(self.zones.clone())
    }

    fn flows(&self) -> std::result::Result<HashMap<String, Flow>, String> {
        Ok(self.flows.clone())
    }

    fn set_capability_value(
        &self,
        device_id: &str,
        capability: &str,
        value: Value,
    ) -> std::result::Result<(), String> {
        let device = self
            .devices
            .get(device_id)
            .ok_or_else(|| format!("unknown device id '{}'", device_id))?;
        eprintln!(
            "hub: set {} ({}) {} = {}",
            device.name, device_id, capability, value
        );
        Ok(())
    }

    fn trigger_flow(&self, flow_id: &str) -> std::result::Result<(), String> {
        let flow = self
            .flows
            .get(flow_id)
            .ok_or_else(|| format!("unknown flow id '{}'", flow_id))?;
        eprintln!("hub: trigger flow {} ({})", flow.name, flow_id);
        Ok(())
    }

    fn refresh_device(&self, device_id: &str) -> std::result::Result<Option<Device>, String> {
        Ok(self.devices.get(device_id).cloned())
    }
}
