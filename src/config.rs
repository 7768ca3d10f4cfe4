//! Hotkey definitions and the TOML file they load from
//!
//! A definition names the controls to hold and the command to run. The
//! file form is a list of `[[hotkey]]` tables; the same shape is built
//! directly from command-line flags for a single inline hotkey.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// One hotkey: the controls to hold and the command to run
#[derive(Debug, Clone, Deserialize)]
pub struct HotkeyDefinition {
    /// Optional label used in diagnostics, defaults to the command
    #[serde(default)]
    pub name: Option<String>,
    /// Key names that must be held
    #[serde(default)]
    pub keys: Vec<String>,
    /// Button numbers or names that must be held
    #[serde(default)]
    pub buttons: Vec<String>,
    /// Shell command run while the combination is held
    pub command: String,
}

impl HotkeyDefinition {
    /// Label for diagnostics
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.command)
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default, rename = "hotkey")]
    hotkeys: Vec<HotkeyDefinition>,
}

/// Load hotkey definitions from a TOML file
pub fn load_hotkeys(path: &Path) -> Result<Vec<HotkeyDefinition>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read hotkey file {}", path.display()))?;

    let config: ConfigFile = toml::from_str(&raw)
        .with_context(|| format!("failed to parse hotkey file {}", path.display()))?;

    Ok(config.hotkeys)
}

/// Reject definitions the daemon cannot act on
pub fn validate(definitions: &[HotkeyDefinition]) -> Result<()> {
    if definitions.is_empty() {
        bail!("no hotkeys defined");
    }

    for definition in definitions {
        if definition.keys.is_empty() && definition.buttons.is_empty() {
            bail!(
                "hotkey '{}' has no keys or buttons to hold",
                definition.label()
            );
        }
        if definition.command.trim().is_empty() {
            bail!("hotkey '{}' has an empty command", definition.label());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("hotkeys.toml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_full_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
            [[hotkey]]
            name = "push-to-talk"
            keys = ["KEY_LEFTCTRL", "KEY_SPACE"]
            command = "pactl set-source-mute @DEFAULT_SOURCE@ 0"

            [[hotkey]]
            buttons = ["BTN_SIDE"]
            command = "playerctl pause"
            "#,
        );

        let hotkeys = load_hotkeys(&path).unwrap();
        assert_eq!(hotkeys.len(), 2);

        assert_eq!(hotkeys[0].label(), "push-to-talk");
        assert_eq!(hotkeys[0].keys, vec!["KEY_LEFTCTRL", "KEY_SPACE"]);
        assert!(hotkeys[0].buttons.is_empty());

        assert_eq!(hotkeys[1].label(), "playerctl pause");
        assert_eq!(hotkeys[1].buttons, vec!["BTN_SIDE"]);
    }

    #[test]
    fn test_missing_lists_default_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
            [[hotkey]]
            keys = ["KEY_F1"]
            command = "true"
            "#,
        );

        let hotkeys = load_hotkeys(&path).unwrap();
        assert_eq!(hotkeys.len(), 1);
        assert!(hotkeys[0].name.is_none());
        assert!(hotkeys[0].buttons.is_empty());
    }

    #[test]
    fn test_hotkey_requires_command() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
            [[hotkey]]
            keys = ["KEY_F1"]
            "#,
        );

        assert!(load_hotkeys(&path).is_err());
    }

    #[test]
    fn test_missing_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("does-not-exist.toml");
        assert!(load_hotkeys(&path).is_err());
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[[hotkey\nkeys = [");
        assert!(load_hotkeys(&path).is_err());
    }

    fn definition(keys: &[&str], buttons: &[&str], command: &str) -> HotkeyDefinition {
        HotkeyDefinition {
            name: None,
            keys: keys.iter().map(|s| s.to_string()).collect(),
            buttons: buttons.iter().map(|s| s.to_string()).collect(),
            command: command.to_string(),
        }
    }

    #[test]
    fn test_validate_rejects_empty_list() {
        assert!(validate(&[]).is_err());
    }

    #[test]
    fn test_validate_rejects_hotkey_without_controls() {
        let defs = vec![definition(&[], &[], "true")];
        assert!(validate(&defs).is_err());
    }

    #[test]
    fn test_validate_rejects_empty_command() {
        let defs = vec![definition(&["KEY_A"], &[], "  ")];
        assert!(validate(&defs).is_err());
    }

    #[test]
    fn test_validate_accepts_button_only_hotkey() {
        let defs = vec![definition(&[], &["BTN_LEFT"], "true")];
        assert!(validate(&defs).is_ok());
    }
}
