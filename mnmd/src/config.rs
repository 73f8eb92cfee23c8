//! Configuration loader (C12, §6, §10).
//!
//! `~/.mnmdrc` is YAML, loaded with a "warn and fall back to defaults"
//! idiom mirroring the reference tool's own config handling, rather than
//! aborting the process on a malformed file.

use crate::helpers::escape_html;
use serde::{Deserialize, Serialize};

/// Which editor protocol a `Source` field's back-link is built for (§6).
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
pub enum EditorProtocol {
    #[default]
    Vscode,
    Vscodium,
    Nvim,
    Obsidian,
    File,
}

/// `~/.mnmdrc`'s shape. Every field defaults so a config file naming only
/// one key still loads.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub editor_protocol: EditorProtocol,
    pub anki_url: String,
    pub default_deck: String,
    pub default_tags: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            editor_protocol: EditorProtocol::default(),
            anki_url: "http://localhost:8765".to_string(),
            default_deck: "Default".to_string(),
            default_tags: Vec::new(),
        }
    }
}

impl Config {
    /// Loads `~/.mnmdrc`. A missing file is silent (defaults apply); an
    /// unreadable or malformed file is logged as a warning and defaults
    /// apply all the same (§7: Config errors never abort).
    #[must_use]
    pub fn load() -> Self {
        let Some(home) = dirs_home() else {
            return Self::default();
        };
        let path = home.join(".mnmdrc");
        let Ok(raw) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        match serde_yaml::from_str(&raw) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{} is not valid YAML ({e}); using defaults", path.display());
                Self::default()
            }
        }
    }
}

fn dirs_home() -> Option<std::path::PathBuf> {
    std::env::var_os("HOME").map(std::path::PathBuf::from)
}

/// Builds the `Source` field's anchor for one cloze's back-link (§6),
/// HTML-escaping both the URL and the visible text.
#[must_use]
pub fn editor_anchor(protocol: EditorProtocol, absolute_path: &str, line: usize) -> String {
    let (url, label) = match protocol {
        EditorProtocol::Vscode => (
            format!("vscode://file{absolute_path}:{line}:1"),
            "Open in VS Code",
        ),
        EditorProtocol::Vscodium => (
            format!("vscodium://file{absolute_path}:{line}:1"),
            "Open in VSCodium",
        ),
        EditorProtocol::Nvim => (
            format!("nvim://open?file={absolute_path}&line={line}"),
            "Open in Neovim",
        ),
        EditorProtocol::Obsidian => (
            format!("obsidian://open?path={absolute_path}"),
            "Open in Obsidian",
        ),
        EditorProtocol::File => (format!("file://{absolute_path}"), "Open File"),
    };
    format!(
        r#"<a href="{}">{}</a>"#,
        escape_html(&url),
        escape_html(label)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.anki_url, "http://localhost:8765");
        assert_eq!(config.editor_protocol, EditorProtocol::Vscode);
    }

    #[test]
    fn test_partial_yaml_uses_defaults_for_missing_keys() {
        let config: Config = serde_yaml::from_str("default_deck: Study").unwrap();
        assert_eq!(config.default_deck, "Study");
        assert_eq!(config.anki_url, "http://localhost:8765");
    }

    #[test]
    fn test_editor_anchor_vscode() {
        let anchor = editor_anchor(EditorProtocol::Vscode, "/home/user/notes.md", 5);
        assert_eq!(
            anchor,
            r#"<a href="vscode://file/home/user/notes.md:5:1">Open in VS Code</a>"#
        );
    }

    #[test]
    fn test_editor_anchor_nvim() {
        let anchor = editor_anchor(EditorProtocol::Nvim, "/a.md", 1);
        assert_eq!(
            anchor,
            r#"<a href="nvim://open?file=/a.md&amp;line=1">Open in Neovim</a>"#
        );
    }
}
