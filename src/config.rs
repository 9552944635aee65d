//! Configuration for nuke behaviour.
//!
//! Nothing here is global: callers pass a [`NukeConfig`] into every
//! operation, so a daemon can reload its configuration without the engine
//! noticing.

use std::path::PathBuf;

use serde::Deserialize;

/// What happens to the directory tree once settlement is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NukeAction {
    /// Delete the contents and the directory itself.
    DeleteAll,
    /// Delete the contents, then rename the emptied directory.
    DeleteFiles,
    /// Keep the contents and rename the directory as-is.
    #[default]
    Keep,
}

/// How a nuked directory is renamed and when it counts as empty.
#[derive(Debug, Clone, Deserialize)]
pub struct NukedirStyle {
    /// Naming template for the renamed directory; `%D` is replaced with
    /// the original directory name.
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub action: NukeAction,
    /// Trees totalling fewer kilobytes than this are settled as empty.
    #[serde(default = "default_empty_kbytes")]
    pub empty_kbytes: i64,
}

impl Default for NukedirStyle {
    fn default() -> Self {
        Self {
            format: default_format(),
            action: NukeAction::default(),
            empty_kbytes: default_empty_kbytes(),
        }
    }
}

/// A named region of the site. Sections decide which credit pool a nuke
/// settles against and how the event is attributed in transfer stats.
#[derive(Debug, Clone, Deserialize)]
pub struct SectionConfig {
    pub name: String,
    /// Glob patterns of virtual paths belonging to this section.
    pub paths: Vec<String>,
    /// When set, the section keeps its own credit pool instead of the
    /// default one.
    #[serde(default)]
    pub separate_credits: bool,
}

impl SectionConfig {
    pub fn matches(&self, virtual_path: &str) -> bool {
        self.paths.iter().any(|pattern| {
            glob::Pattern::new(pattern)
                .map(|pattern| pattern.matches(virtual_path))
                .unwrap_or(false)
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NukeConfig {
    /// Filesystem root the virtual namespace is resolved against.
    pub site_root: PathBuf,
    #[serde(default)]
    pub nukedir_style: NukedirStyle,
    /// Flat penalty debited from the directory owner when a nuked tree has
    /// no countable content at all.
    #[serde(default = "default_empty_nuke")]
    pub empty_nuke: i64,
    /// Upper bound accepted for the multiplier; `None` means unlimited.
    #[serde(default)]
    pub multiplier_max: Option<i32>,
    #[serde(default)]
    pub sections: Vec<SectionConfig>,
}

impl NukeConfig {
    pub fn new(site_root: impl Into<PathBuf>) -> Self {
        Self {
            site_root: site_root.into(),
            nukedir_style: NukedirStyle::default(),
            empty_nuke: default_empty_nuke(),
            multiplier_max: None,
            sections: Vec::new(),
        }
    }

    /// Resolves a virtual path to its location under the site root.
    pub fn resolve(&self, virtual_path: &str) -> PathBuf {
        self.site_root.join(virtual_path.trim_start_matches('/'))
    }

    /// First section whose path globs match, in configuration order.
    pub fn section_for_path(&self, virtual_path: &str) -> Option<&SectionConfig> {
        self.sections.iter().find(|section| section.matches(virtual_path))
    }

    /// Looks a section up by name. Records store an empty section name when
    /// no section matched, which never resolves back to one.
    pub fn section_by_name(&self, name: &str) -> Option<&SectionConfig> {
        if name.is_empty() {
            return None;
        }
        self.sections.iter().find(|section| section.name == name)
    }
}

fn default_format() -> String {
    "NUKED-%D".to_string()
}

fn default_empty_kbytes() -> i64 {
    25
}

fn default_empty_nuke() -> i64 {
    102_400
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_sections() -> NukeConfig {
        let mut config = NukeConfig::new("/srv/site");
        config.sections = vec![
            SectionConfig {
                name: "GAMES".to_string(),
                paths: vec!["/games/*".to_string()],
                separate_credits: true,
            },
            SectionConfig {
                name: "MISC".to_string(),
                paths: vec!["/incoming/*".to_string(), "/misc/*".to_string()],
                separate_credits: false,
            },
        ];
        config
    }

    #[test]
    fn resolve_joins_under_site_root() {
        let config = NukeConfig::new("/srv/site");
        assert_eq!(config.resolve("/games/foo"), PathBuf::from("/srv/site/games/foo"));
        assert_eq!(config.resolve("games/foo"), PathBuf::from("/srv/site/games/foo"));
    }

    #[test]
    fn section_match_uses_globs_in_order() {
        let config = config_with_sections();

        let games = config.section_for_path("/games/foo").unwrap();
        assert_eq!(games.name, "GAMES");

        let misc = config.section_for_path("/misc/stuff").unwrap();
        assert_eq!(misc.name, "MISC");

        assert!(config.section_for_path("/elsewhere/foo").is_none());
    }

    #[test]
    fn section_by_name_ignores_empty_names() {
        let config = config_with_sections();
        assert!(config.section_by_name("").is_none());
        assert!(config.section_by_name("GAMES").is_some());
        assert!(config.section_by_name("NOPE").is_none());
    }

    #[test]
    fn invalid_glob_patterns_never_match() {
        let section = SectionConfig {
            name: "BAD".to_string(),
            paths: vec!["/games/[".to_string()],
            separate_credits: false,
        };
        assert!(!section.matches("/games/["));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: NukeConfig = serde_json::from_str(
            r#"{
                "site_root": "/srv/site",
                "sections": [
                    { "name": "GAMES", "paths": ["/games/*"], "separate_credits": true }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.nukedir_style.format, "NUKED-%D");
        assert_eq!(config.nukedir_style.action, NukeAction::Keep);
        assert_eq!(config.nukedir_style.empty_kbytes, 25);
        assert_eq!(config.empty_nuke, 102_400);
        assert_eq!(config.multiplier_max, None);
        assert!(config.sections[0].separate_credits);
    }

    #[test]
    fn deserializes_actions_lowercase() {
        let style: NukedirStyle = serde_json::from_str(
            r#"{ "format": "[NUKED]-%D", "action": "deleteall", "empty_kbytes": 100 }"#,
        )
        .unwrap();
        assert_eq!(style.action, NukeAction::DeleteAll);
        assert_eq!(style.format, "[NUKED]-%D");
    }
}
