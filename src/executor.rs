use crate::hub::{Device, Flow, HubClient, Zone};
use crate::intent::Intent;
use crate::matcher::FuzzyMatcher;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

const DEFAULT_TEMPERATURE: f64 = 20.0;
const MIN_TEMPERATURE: f64 = 5.0;
const MAX_TEMPERATURE: f64 = 30.0;

/// Outcome of executing one intent against the inventory snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub success: bool,
    pub message: String,
    pub affected_devices: u32,
}

impl ExecutionResult {
    fn ok(message: impl Into<String>, affected_devices: u32) -> Self {
        Self {
            success: true,
            message: message.into(),
            affected_devices,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            affected_devices: 0,
        }
    }
}

/// Resolves intents against a point-in-time inventory snapshot and issues
/// the corresponding hub calls.
///
/// The snapshot is loaded once at construction; build a new executor to see
/// inventory changes. The only snapshot state mutated afterwards is the
/// per-device target-temperature cache.
pub struct CommandExecutor {
    hub: Arc<dyn HubClient>,
    devices: HashMap<String, Device>,
    zones: HashMap<String, Zone>,
    flows: HashMap<String, Flow>,
    matcher: FuzzyMatcher,
}

impl CommandExecutor {
    pub fn new(hub: Arc<dyn HubClient>) -> Self {
        Self::with_matcher(hub, FuzzyMatcher::new())
    }

    /// A load failure degrades that part of the inventory to empty; the
    /// executor then reports "nothing found" instead of refusing to start.
    pub fn with_matcher(hub: Arc<dyn HubClient>, matcher: FuzzyMatcher) -> Self {
        let mut devices = hub.devices().unwrap_or_else(|e| {
            eprintln!("executor: failed to load devices: {}", e);
            HashMap::new()
        });
        let zones = hub.zones().unwrap_or_else(|e| {
            eprintln!("executor: failed to load zones: {}", e);
            HashMap::new()
        });
        let flows = hub.flows().unwrap_or_else(|e| {
            eprintln!("executor: failed to load flows: {}", e);
            HashMap::new()
        });

        // Cross-link zone display names onto the devices.
        for device in devices.values_mut() {
            if let Some(zone_id) = &device.zone_id {
                if let Some(zone) = zones.get(zone_id) {
                    device.zone_name = Some(zone.name.clone());
                }
            }
        }

        Self {
            hub,
            devices,
            zones,
            flows,
            matcher,
        }
    }

    /// Dispatch one parsed intent. Never returns an error: every path folds
    /// into an [`ExecutionResult`] with a user-facing message.
    pub fn execute(&mut self, intent: &Intent) -> ExecutionResult {
        match intent {
            Intent::LightOn { room, device_name } => {
                self.switch_lights(room.as_deref(), device_name.as_deref(), true)
            }
            Intent::LightOff { room, device_name } => {
                self.switch_lights(room.as_deref(), device_name.as_deref(), false)
            }
            Intent::Dim {
                room,
                device_name,
                level,
            } => self.dim(room.as_deref(), device_name.as_deref(), *level),
            Intent::AllOff { room } => self.all_off(room.as_deref()),
            Intent::SceneActivate { scene_name } => self.activate_scene(scene_name),
            Intent::Temperature {
                room,
                degrees,
                relative,
            } => self.set_temperature(room.as_deref(), *degrees, *relative),
            Intent::Unknown { .. } => ExecutionResult::failed("Befehl nicht verstanden"),
        }
    }

    fn switch_lights(
        &mut self,
        room: Option<&str>,
        device_name: Option<&str>,
        on: bool,
    ) -> ExecutionResult {
        let targets = self.find_target_devices(room, device_name, "onoff");
        if targets.is_empty() {
            return ExecutionResult::failed("Keine Geräte gefunden");
        }

        let count = self.switch_targets(&targets, on);
        if count == 0 {
            return ExecutionResult::failed(if on {
                "Fehler beim Einschalten"
            } else {
                "Fehler beim Ausschalten"
            });
        }

        let message = match (on, count) {
            (true, 1) => "Licht eingeschaltet".to_string(),
            (true, n) => format!("{} Lichter eingeschaltet", n),
            (false, 1) => "Licht ausgeschaltet".to_string(),
            (false, n) => format!("{} Lichter ausgeschaltet", n),
        };
        ExecutionResult::ok(message, count)
    }

    fn all_off(&mut self, room: Option<&str>) -> ExecutionResult {
        let targets = self.find_target_devices(room, None, "onoff");
        if targets.is_empty() {
            return ExecutionResult::failed("Keine Geräte gefunden");
        }

        let count = self.switch_targets(&targets, false);
        if count == 0 {
            return ExecutionResult::failed("Fehler beim Ausschalten");
        }
        ExecutionResult::ok(format!("Alles ausgeschaltet ({} Geräte)", count), count)
    }

    /// Switch every target whose state differs from `on`. Returns how many
    /// state-changing calls succeeded; failures are logged and skipped so
    /// one bad device cannot stall the batch.
    fn switch_targets(&mut self, target_ids: &[String], on: bool) -> u32 {
        let mut count = 0u32;
        for id in target_ids {
            let Some(device) = self.devices.get(id) else {
                continue;
            };
            if device.on == on {
                continue;
            }
            match self.hub.set_capability_value(id, "onoff", Value::Bool(on)) {
                Ok(()) => count += 1,
                Err(e) => {
                    eprintln!("executor: failed to switch {}: {}", device.name, e);
                }
            }
        }
        count
    }

    fn dim(&mut self, room: Option<&str>, device_name: Option<&str>, level: u8) -> ExecutionResult {
        let targets = self.find_target_devices(room, device_name, "dim");
        if targets.is_empty() {
            return ExecutionResult::failed("Keine dimmbaren Geräte gefunden");
        }

        let dim_value = level as f64 / 100.0;
        let mut count = 0u32;
        for id in &targets {
            match self
                .hub
                .set_capability_value(id, "dim", Value::from(dim_value))
            {
                Ok(()) => count += 1,
                Err(e) => {
                    let name = self.devices.get(id).map(|d| d.name.as_str()).unwrap_or(id);
                    eprintln!("executor: failed to dim {}: {}", name, e);
                }
            }
        }

        if count == 0 {
            return ExecutionResult::failed("Fehler beim Dimmen");
        }
        ExecutionResult::ok(format!("Helligkeit auf {}% gesetzt", level), count)
    }

    fn activate_scene(&mut self, scene_name: &str) -> ExecutionResult {
        if self.flows.is_empty() {
            return ExecutionResult::failed("Keine Szenen gefunden");
        }

        let mut flows: Vec<&Flow> = self
            .flows
            .values()
            .filter(|f| f.enabled && f.triggerable)
            .collect();
        // Snapshot maps carry no order; sort so resolution is reproducible.
        flows.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        let candidates: Vec<(&str, &str)> = flows
            .iter()
            .map(|f| (f.name.as_str(), f.id.as_str()))
            .collect();

        let Some(found) = self.matcher.find_best_match(scene_name, &candidates) else {
            return ExecutionResult::failed("Szene nicht gefunden");
        };

        match self.hub.trigger_flow(&found.matched_id) {
            Ok(()) => {
                let name = self
                    .flows
                    .get(&found.matched_id)
                    .map(|f| f.name.as_str())
                    .unwrap_or(found.matched_id.as_str());
                ExecutionResult::ok(format!("Szene aktiviert: {}", name), 1)
            }
            Err(e) => {
                eprintln!("executor: failed to trigger flow {}: {}", found.matched_id, e);
                ExecutionResult::failed("Fehler beim Aktivieren")
            }
        }
    }

    fn set_temperature(
        &mut self,
        room: Option<&str>,
        degrees: f64,
        relative: bool,
    ) -> ExecutionResult {
        let targets = self.find_target_devices(room, None, "target_temperature");
        if targets.is_empty() {
            return ExecutionResult::failed("Keine Heizgeräte gefunden");
        }

        let mut count = 0u32;
        for id in &targets {
            let target_temp = if relative {
                let base = match self.relative_base(id) {
                    Some(base) => base,
                    // Fresh read failed outright: this target is a failed
                    // batch item, not a guess.
                    None => continue,
                };
                base + degrees
            } else {
                degrees
            };
            let target_temp = target_temp.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE);

            match self
                .hub
                .set_capability_value(id, "target_temperature", Value::from(target_temp))
            {
                Ok(()) => {
                    if let Some(device) = self.devices.get_mut(id) {
                        device.cached_target_temperature = Some(target_temp);
                    }
                    count += 1;
                }
                Err(e) => {
                    let name = self.devices.get(id).map(|d| d.name.as_str()).unwrap_or(id);
                    eprintln!("executor: failed to set temperature on {}: {}", name, e);
                }
            }
        }

        if count == 0 {
            return ExecutionResult::failed("Fehler beim Einstellen");
        }
        let message = if relative {
            "Temperatur angepasst".to_string()
        } else {
            format!("Temperatur auf {:.1}°C gesetzt", degrees)
        };
        ExecutionResult::ok(message, count)
    }

    /// Base value for a relative adjustment: session cache, then a fresh
    /// device read, then the fixed default. `None` only when the fresh read
    /// itself errored.
    fn relative_base(&self, device_id: &str) -> Option<f64> {
        if let Some(cached) = self
            .devices
            .get(device_id)
            .and_then(|d| d.cached_target_temperature)
        {
            return Some(cached);
        }
        match self.hub.refresh_device(device_id) {
            Ok(Some(fresh)) => Some(
                fresh
                    .cached_target_temperature
                    .unwrap_or(DEFAULT_TEMPERATURE),
            ),
            Ok(None) => Some(DEFAULT_TEMPERATURE),
            Err(e) => {
                eprintln!("executor: failed to refresh {}: {}", device_id, e);
                None
            }
        }
    }

    /// Resolve an intent's room/device fields to concrete device ids.
    ///
    /// An explicit device name picks at most the single best fuzzy match.
    /// A room collects devices from every zone clearing the match threshold,
    /// not just the best one. With neither, every compatible device is in.
    fn find_target_devices(
        &self,
        room: Option<&str>,
        device_name: Option<&str>,
        capability: &str,
    ) -> Vec<String> {
        if self.devices.is_empty() {
            return Vec::new();
        }

        let mut devices: Vec<&Device> = self.devices.values().collect();
        devices.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        if let Some(device_name) = device_name.filter(|n| !n.is_empty()) {
            let candidates: Vec<(&str, &str)> = devices
                .iter()
                .filter(|d| has_capability(d, capability))
                .map(|d| (d.name.as_str(), d.id.as_str()))
                .collect();
            return match self.matcher.find_best_match(device_name, &candidates) {
                Some(found) => vec![found.matched_id],
                None => Vec::new(),
            };
        }

        let mut target_zone_ids: Vec<&str> = Vec::new();
        if let Some(room) = room.filter(|r| !r.is_empty()) {
            let mut zones: Vec<&Zone> = self.zones.values().collect();
            zones.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
            for zone in zones {
                if self.matcher.matches(room, &zone.name) {
                    target_zone_ids.push(zone.id.as_str());
                }
            }
        }

        let mut targets = Vec::new();
        for device in devices {
            if !has_capability(device, capability) {
                continue;
            }
            match room.filter(|r| !r.is_empty()) {
                None => targets.push(device.id.clone()),
                Some(_) => {
                    if let Some(zone_id) = &device.zone_id {
                        if target_zone_ids.contains(&zone_id.as_str()) {
                            targets.push(device.id.clone());
                        }
                    }
                }
            }
        }
        targets
    }
}

/// Capability compatibility: exact, with button and speaker devices
/// additionally accepted for on/off commands.
fn has_capability(device: &Device, capability: &str) -> bool {
    if device.capability == capability {
        return true;
    }
    capability == "onoff" && matches!(device.capability.as_str(), "button" | "speaker_playing")
}
