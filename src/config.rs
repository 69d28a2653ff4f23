use serde::Deserialize;
use std::collections::BTreeMap;

/// Top-level configuration loaded from `config.toml`.
///
/// Everything is optional; a missing config file means built-in defaults.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Optional human-readable name for this installation.
    pub name: Option<String>,
    /// Optional description for documentation purposes.
    pub description: Option<String>,
    /// Inventory source configuration
    #[serde(default)]
    pub inventory: InventoryCfg,
    /// Vocabulary extensions for the parser and matcher
    #[serde(default)]
    pub voice: VoiceCfg,
}

impl Config {
    /// Parse a TOML string into `Config`.
    pub fn from_toml_str(s: &str) -> Result<Self, String> {
        toml::from_str::<Config>(s).map_err(|e| e.to_string())
    }
}

/// Where the device/zone/flow snapshot comes from.
#[derive(Debug, Deserialize, Default)]
pub struct InventoryCfg {
    /// Path to the inventory JSON file. The --inventory flag overrides it.
    pub path: Option<String>,
}

/// Vocabulary extensions. The built-in room aliases and compound fragments
/// always apply; these only add to them. A BTreeMap keeps the extra aliases
/// in a stable order, which matters for the parser's fallback room scan.
#[derive(Debug, Deserialize, Default)]
pub struct VoiceCfg {
    /// Extra spoken-name -> canonical-room pairs, e.g. stube = "wohnzimmer".
    #[serde(default)]
    pub extra_room_aliases: BTreeMap<String, String>,
    /// Extra compound-word fragments for fuzzy sub-word matching.
    #[serde(default)]
    pub extra_compound_fragments: Vec<String>,
}

impl VoiceCfg {
    pub fn alias_pairs(&self) -> Vec<(String, String)> {
        self.extra_room_aliases
            .iter()
            .map(|(alias, canonical)| (alias.clone(), canonical.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_parses_to_defaults() {
        let cfg = Config::from_toml_str("").unwrap();
        assert!(cfg.name.is_none());
        assert!(cfg.inventory.path.is_none());
        assert!(cfg.voice.extra_room_aliases.is_empty());
        assert!(cfg.voice.extra_compound_fragments.is_empty());
    }

    #[test]
    fn full_config_round_trips() {
        let cfg = Config::from_toml_str(
            r#"
            name = "zuhause"

            [inventory]
            path = "/var/lib/heimd/inventory.json"

            [voice]
            extra_compound_fragments = ["terrasse"]

            [voice.extra_room_aliases]
            stube = "wohnzimmer"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.name.as_deref(), Some("zuhause"));
        assert_eq!(
            cfg.inventory.path.as_deref(),
            Some("/var/lib/heimd/inventory.json")
        );
        assert_eq!(
            cfg.voice.alias_pairs(),
            vec![("stube".to_string(), "wohnzimmer".to_string())]
        );
        assert_eq!(cfg.voice.extra_compound_fragments, vec!["terrasse"]);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(Config::from_toml_str("inventory = 3").is_err());
    }
}
