use regex::Regex;

/// Structured command produced from one transcript. Exactly one variant per
/// parse; the executor dispatches exhaustively over this set.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    LightOn {
        room: Option<String>,
        device_name: Option<String>,
    },
    LightOff {
        room: Option<String>,
        device_name: Option<String>,
    },
    Dim {
        room: Option<String>,
        device_name: Option<String>,
        level: u8,
    },
    AllOff {
        room: Option<String>,
    },
    SceneActivate {
        scene_name: String,
    },
    Temperature {
        room: Option<String>,
        degrees: f64,
        relative: bool,
    },
    Unknown {
        original: String,
    },
}

/// Spelling variants mapped to one canonical room name. Scanned in this
/// order when no preposition introduces the room, so the table order is part
/// of the contract.
const ROOM_ALIASES: [(&str, &str); 14] = [
    ("wohnzimmer", "wohnzimmer"),
    ("schlafzimmer", "schlafzimmer"),
    ("küche", "küche"),
    ("kueche", "küche"),
    ("bad", "bad"),
    ("badezimmer", "bad"),
    ("flur", "flur"),
    ("büro", "büro"),
    ("buero", "büro"),
    ("keller", "keller"),
    ("garage", "garage"),
    ("kinderzimmer", "kinderzimmer"),
    ("esszimmer", "esszimmer"),
    ("garten", "garten"),
];

const ALL_OFF_PHRASES: [&str; 3] = ["alles aus", "alle aus", "komplett aus"];
const WARMER_WORDS: [&str; 2] = ["wärmer", "waermer"];
const COLDER_WORDS: [&str; 4] = ["kälter", "kaelter", "kühler", "kuehler"];

/// Pattern-rule parser for German voice commands.
///
/// All patterns and the alias table are built once at construction; parsing
/// itself is pure and reusable across transcripts.
pub struct IntentParser {
    aliases: Vec<(String, String)>,
    room_re: Regex,
    room_phrase_re: Regex,
    scene_re: Regex,
    temp_abs_re: Regex,
    temp_rel_re: Regex,
    dim_re: Regex,
    light_on_re: Regex,
    light_off_re: Regex,
    stop_word_re: Regex,
    number_re: Regex,
}

impl IntentParser {
    pub fn new() -> Self {
        Self::with_aliases(&[])
    }

    /// Extra alias pairs are appended after the built-in table, keys folded
    /// to lowercase.
    pub fn with_aliases(extra: &[(String, String)]) -> Self {
        let mut aliases: Vec<(String, String)> = ROOM_ALIASES
            .iter()
            .map(|(a, c)| (a.to_string(), c.to_string()))
            .collect();
        for (alias, canonical) in extra {
            let alias = alias.trim().to_lowercase();
            if !alias.is_empty() {
                aliases.push((alias, canonical.clone()));
            }
        }

        Self {
            aliases,
            room_re: Regex::new(r"(?:im|in der|in)\s+(\w+)").expect("static pattern"),
            room_phrase_re: Regex::new(r"(?:im|in der|in)\s+\w+").expect("static pattern"),
            scene_re: Regex::new(r"(?:aktiviere|starte|scene|szene)\s+(.+)")
                .expect("static pattern"),
            temp_abs_re: Regex::new(r"(?:auf|temperatur)\s+(\d+)(?:\s*grad)?")
                .expect("static pattern"),
            temp_rel_re: Regex::new(r"(\d+)\s*grad\s*(mehr|weniger)").expect("static pattern"),
            dim_re: Regex::new(r"(?:auf|helligkeit|dimme auf|dimmen auf)\s*(\d+)\s*(?:%|prozent)?")
                .expect("static pattern"),
            light_on_re: Regex::new(
                r"licht an|licht ein|schalte licht ein|mach.*licht an|licht anmachen",
            )
            .expect("static pattern"),
            light_off_re: Regex::new(r"licht aus|schalte licht aus|mach.*licht aus|licht ausmachen")
                .expect("static pattern"),
            stop_word_re: Regex::new(
                r"(?:licht|an|aus|ein|schalte|mach|auf|helligkeit|dimme|im|in der|in)\s*",
            )
            .expect("static pattern"),
            number_re: Regex::new(r"(\d+)").expect("static pattern"),
        }
    }

    /// Parse one raw transcript into exactly one [`Intent`].
    ///
    /// Rules are tried in fixed priority order; the first hit wins. Anything
    /// that matches no rule comes back as `Unknown` carrying the raw text.
    pub fn parse(&self, raw_command: &str) -> Intent {
        if raw_command.trim().is_empty() {
            return Intent::Unknown {
                original: String::new(),
            };
        }

        let command = raw_command.to_lowercase().trim().to_string();
        let room = self.extract_room(&command);

        if ALL_OFF_PHRASES.iter().any(|p| command.contains(p)) {
            return Intent::AllOff { room };
        }

        if let Some(intent) = self.parse_scene_activation(&command) {
            return intent;
        }

        if let Some(intent) = self.parse_temperature(&command, &room) {
            return intent;
        }

        if let Some(intent) = self.parse_dimming(&command, &room) {
            return intent;
        }

        if let Some(intent) = self.parse_light_command(&command, &room) {
            return intent;
        }

        Intent::Unknown {
            original: raw_command.to_string(),
        }
    }

    /// Room from a preposition phrase ("im X", "in der X", "in X"), else
    /// from an alias-table key the command ends with or contains as a word.
    fn extract_room(&self, command: &str) -> Option<String> {
        if let Some(captures) = self.room_re.captures(command) {
            let extracted = captures[1].to_string();
            return Some(self.canonical_room(&extracted));
        }

        for (alias, canonical) in &self.aliases {
            if command.ends_with(alias.as_str()) || command.contains(&format!("{} ", alias)) {
                return Some(canonical.clone());
            }
        }

        None
    }

    /// Canonical spelling for a room word; unknown words pass through.
    fn canonical_room(&self, room: &str) -> String {
        self.aliases
            .iter()
            .find(|(alias, _)| alias == room)
            .map(|(_, canonical)| canonical.clone())
            .unwrap_or_else(|| room.to_string())
    }

    fn parse_scene_activation(&self, command: &str) -> Option<Intent> {
        let captures = self.scene_re.captures(command)?;
        let raw_name = captures[1].trim().to_string();
        // Room references are not part of the scene name.
        let scene_name = self
            .room_phrase_re
            .replace_all(&raw_name, "")
            .trim()
            .to_string();
        Some(Intent::SceneActivate { scene_name })
    }

    fn parse_temperature(&self, command: &str, room: &Option<String>) -> Option<Intent> {
        // Absolute: "auf 21 grad", "temperatur 20"
        if let Some(captures) = self.temp_abs_re.captures(command) {
            let degrees: f64 = captures[1].parse().unwrap_or(0.0);
            return Some(Intent::Temperature {
                room: room.clone(),
                degrees,
                relative: false,
            });
        }

        // Relative by direction word, with an optional explicit magnitude.
        if WARMER_WORDS.iter().any(|w| command.contains(w)) {
            let magnitude = self.first_number(command);
            let degrees = if magnitude == 0.0 { 1.0 } else { magnitude };
            return Some(Intent::Temperature {
                room: room.clone(),
                degrees,
                relative: true,
            });
        }

        if COLDER_WORDS.iter().any(|w| command.contains(w)) {
            let magnitude = self.first_number(command);
            let degrees = if magnitude == 0.0 { -1.0 } else { -magnitude };
            return Some(Intent::Temperature {
                room: room.clone(),
                degrees,
                relative: true,
            });
        }

        // Relative by signed phrase: "2 grad mehr", "1 grad weniger"
        if let Some(captures) = self.temp_rel_re.captures(command) {
            let mut degrees: f64 = captures[1].parse().unwrap_or(0.0);
            if &captures[2] == "weniger" {
                degrees = -degrees;
            }
            return Some(Intent::Temperature {
                room: room.clone(),
                degrees,
                relative: true,
            });
        }

        None
    }

    fn parse_dimming(&self, command: &str, room: &Option<String>) -> Option<Intent> {
        let captures = self.dim_re.captures(command)?;
        let requested: f64 = captures[1].parse().unwrap_or(0.0);
        let level = requested.clamp(0.0, 100.0) as u8;
        let device_name = self.extract_device_name(command);
        Some(Intent::Dim {
            room: room.clone(),
            device_name,
            level,
        })
    }

    fn parse_light_command(&self, command: &str, room: &Option<String>) -> Option<Intent> {
        let is_on = if self.light_on_re.is_match(command) {
            true
        } else if self.light_off_re.is_match(command) {
            false
        } else {
            return None;
        };

        let device_name = self.extract_device_name(command);
        let room = room.clone();

        Some(if is_on {
            Intent::LightOn { room, device_name }
        } else {
            Intent::LightOff { room, device_name }
        })
    }

    /// Whatever survives stop-word deletion, if it is long enough and not
    /// itself a room alias, counts as an explicit device name.
    fn extract_device_name(&self, command: &str) -> Option<String> {
        let cleaned = self.stop_word_re.replace_all(command, "");
        let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

        let is_room_alias = self.aliases.iter().any(|(alias, _)| alias == &cleaned);
        if cleaned.chars().count() > 2 && !is_room_alias {
            Some(cleaned)
        } else {
            None
        }
    }

    /// First integer anywhere in the command, 0.0 when there is none.
    fn first_number(&self, command: &str) -> f64 {
        self.number_re
            .captures(command)
            .and_then(|c| c[1].parse().ok())
            .unwrap_or(0.0)
    }
}

impl Default for IntentParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> IntentParser {
        IntentParser::new()
    }

    #[test]
    fn empty_input_is_unknown() {
        assert_eq!(
            parser().parse("   "),
            Intent::Unknown {
                original: String::new()
            }
        );
    }

    #[test]
    fn gibberish_is_unknown_with_raw_text() {
        let intent = parser().parse("Blaue Elefanten tanzen");
        assert_eq!(
            intent,
            Intent::Unknown {
                original: "Blaue Elefanten tanzen".to_string()
            }
        );
    }

    #[test]
    fn all_off_with_room() {
        let intent = parser().parse("alles aus im wohnzimmer");
        assert_eq!(
            intent,
            Intent::AllOff {
                room: Some("wohnzimmer".to_string())
            }
        );
    }

    #[test]
    fn all_off_without_room() {
        assert_eq!(parser().parse("komplett aus"), Intent::AllOff { room: None });
    }

    #[test]
    fn scene_activation_strips_room_phrase() {
        let intent = parser().parse("starte kino im wohnzimmer");
        assert_eq!(
            intent,
            Intent::SceneActivate {
                scene_name: "kino".to_string()
            }
        );
    }

    #[test]
    fn scene_activation_keeps_multi_word_names() {
        let intent = parser().parse("aktiviere gute nacht");
        assert_eq!(
            intent,
            Intent::SceneActivate {
                scene_name: "gute nacht".to_string()
            }
        );
    }

    #[test]
    fn absolute_temperature() {
        let intent = parser().parse("Temperatur auf 21 Grad");
        assert_eq!(
            intent,
            Intent::Temperature {
                room: None,
                degrees: 21.0,
                relative: false,
            }
        );
    }

    #[test]
    fn warmer_defaults_to_one_degree() {
        let intent = parser().parse("wärmer");
        assert_eq!(
            intent,
            Intent::Temperature {
                room: None,
                degrees: 1.0,
                relative: true,
            }
        );
    }

    #[test]
    fn colder_defaults_to_minus_one_degree() {
        let intent = parser().parse("kälter");
        assert_eq!(
            intent,
            Intent::Temperature {
                room: None,
                degrees: -1.0,
                relative: true,
            }
        );
    }

    #[test]
    fn warmer_with_explicit_magnitude() {
        let intent = parser().parse("2 grad wärmer im bad");
        assert_eq!(
            intent,
            Intent::Temperature {
                room: Some("bad".to_string()),
                degrees: 2.0,
                relative: true,
            }
        );
    }

    #[test]
    fn signed_relative_phrase() {
        let intent = parser().parse("2 grad weniger");
        assert_eq!(
            intent,
            Intent::Temperature {
                room: None,
                degrees: -2.0,
                relative: true,
            }
        );
    }

    #[test]
    fn dim_level_is_clamped() {
        let p = parser();
        match p.parse_dimming("dimme auf 150%", &None) {
            Some(Intent::Dim { level, .. }) => assert_eq!(level, 100),
            other => panic!("expected dim intent, got {:?}", other),
        }
        match p.parse_dimming("dimme auf 0", &None) {
            Some(Intent::Dim { level, .. }) => assert_eq!(level, 0),
            other => panic!("expected dim intent, got {:?}", other),
        }
    }

    #[test]
    fn brightness_keyword_dims() {
        let intent = parser().parse("helligkeit 70 prozent");
        match intent {
            Intent::Dim { level, room, .. } => {
                assert_eq!(level, 70);
                assert_eq!(room, None);
            }
            other => panic!("expected dim intent, got {:?}", other),
        }
    }

    #[test]
    fn light_on_with_room() {
        let intent = parser().parse("mach licht an im schlafzimmer");
        match intent {
            Intent::LightOn { room, .. } => {
                assert_eq!(room, Some("schlafzimmer".to_string()));
            }
            other => panic!("expected light-on intent, got {:?}", other),
        }
    }

    #[test]
    fn light_off_with_room() {
        let intent = parser().parse("licht aus in der küche");
        match intent {
            Intent::LightOff { room, .. } => {
                assert_eq!(room, Some("küche".to_string()));
            }
            other => panic!("expected light-off intent, got {:?}", other),
        }
    }

    #[test]
    fn light_on_with_device_name() {
        let intent = parser().parse("stehlampe licht an");
        match intent {
            Intent::LightOn { device_name, .. } => {
                assert_eq!(device_name, Some("stehlampe".to_string()));
            }
            other => panic!("expected light-on intent, got {:?}", other),
        }
    }

    #[test]
    fn room_alias_is_canonicalized() {
        let intent = parser().parse("licht an in der kueche");
        match intent {
            Intent::LightOn { room, .. } => assert_eq!(room, Some("küche".to_string())),
            other => panic!("expected light-on intent, got {:?}", other),
        }
    }

    #[test]
    fn trailing_room_without_preposition() {
        let intent = parser().parse("licht aus schlafzimmer");
        match intent {
            Intent::LightOff { room, .. } => {
                assert_eq!(room, Some("schlafzimmer".to_string()));
            }
            other => panic!("expected light-off intent, got {:?}", other),
        }
    }

    #[test]
    fn extra_aliases_extend_the_table() {
        let p = IntentParser::with_aliases(&[("stube".to_string(), "wohnzimmer".to_string())]);
        let intent = p.parse("licht an in der stube");
        match intent {
            Intent::LightOn { room, .. } => assert_eq!(room, Some("wohnzimmer".to_string())),
            other => panic!("expected light-on intent, got {:?}", other),
        }
    }

    #[test]
    fn bare_number_after_auf_is_temperature_not_dim() {
        // "auf N" is claimed by the temperature rule first; dimming needs
        // one of its own keywords without a preceding "auf"/"temperatur".
        let intent = parser().parse("dimme auf 30");
        assert_eq!(
            intent,
            Intent::Temperature {
                room: None,
                degrees: 30.0,
                relative: false,
            }
        );
    }
}
