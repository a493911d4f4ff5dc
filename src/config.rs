//! Persisted flag defaults.
//!
//! A global config file plus a local `.merganserrc` override hold plain CLI
//! tokens (one or more per line, `#` comments allowed). File flags merge
//! under CLI flags.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::render::Theme;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub watch: bool,
    pub in_place: bool,
    pub no_inject: bool,
    pub theme: Option<Theme>,
    pub script_src: Option<String>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            watch: self.watch || other.watch,
            in_place: self.in_place || other.in_place,
            no_inject: self.no_inject || other.no_inject,
            theme: other.theme.or(self.theme),
            script_src: other.script_src.clone().or_else(|| self.script_src.clone()),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("merganser").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("merganser")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("merganser").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("merganser")
                .join("config");
        }
    }

    PathBuf::from(".merganserrc")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".merganserrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# merganser defaults (saved with --save)".to_string());
    if flags.watch {
        lines.push("--watch".to_string());
    }
    if flags.in_place {
        lines.push("--in-place".to_string());
    }
    if flags.no_inject {
        lines.push("--no-inject".to_string());
    }
    if let Some(theme) = flags.theme {
        lines.push(format!("--theme {}", theme_token(theme)));
    }
    if let Some(src) = &flags.script_src {
        lines.push(format!("--script-src {src}"));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if token == "--watch" {
            flags.watch = true;
        } else if token == "--in-place" {
            flags.in_place = true;
        } else if token == "--no-inject" {
            flags.no_inject = true;
        } else if token == "--theme" {
            if let Some(next) = tokens.get(i + 1) {
                flags.theme = parse_theme(next);
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--theme=") {
            flags.theme = parse_theme(value);
        } else if token == "--script-src" {
            if let Some(next) = tokens.get(i + 1) {
                flags.script_src = Some(next.clone());
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--script-src=") {
            flags.script_src = Some(value.to_string());
        }
        i += 1;
    }
    flags
}

fn parse_theme(s: &str) -> Option<Theme> {
    match s {
        "default" => Some(Theme::Default),
        "dark" => Some(Theme::Dark),
        "forest" => Some(Theme::Forest),
        "neutral" => Some(Theme::Neutral),
        _ => None,
    }
}

const fn theme_token(theme: Theme) -> &'static str {
    match theme {
        Theme::Default => "default",
        Theme::Dark => "dark",
        Theme::Forest => "forest",
        Theme::Neutral => "neutral",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let args = vec![
            "merganser".to_string(),
            "--watch".to_string(),
            "--in-place".to_string(),
            "--theme".to_string(),
            "dark".to_string(),
            "--script-src=/js/mermaid.min.js".to_string(),
            "page.html".to_string(),
        ];
        let flags = parse_flag_tokens(&args);
        assert!(flags.watch);
        assert!(flags.in_place);
        assert!(!flags.no_inject);
        assert_eq!(flags.theme, Some(Theme::Dark));
        assert_eq!(flags.script_src, Some("/js/mermaid.min.js".to_string()));
    }

    #[test]
    fn test_unknown_theme_token_ignored() {
        let args = vec!["--theme".to_string(), "sepia".to_string()];
        assert_eq!(parse_flag_tokens(&args).theme, None);
    }

    #[test]
    fn test_config_union_cli_overrides_options() {
        let file = ConfigFlags {
            watch: true,
            theme: Some(Theme::Forest),
            script_src: Some("/a.js".to_string()),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            no_inject: true,
            theme: Some(Theme::Dark),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.watch);
        assert!(merged.no_inject);
        assert_eq!(merged.theme, Some(Theme::Dark));
        assert_eq!(merged.script_src, Some("/a.js".to_string()));
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".merganserrc");
        let flags = ConfigFlags {
            watch: true,
            in_place: true,
            no_inject: true,
            theme: Some(Theme::Neutral),
            script_src: Some("https://example.com/mermaid.js".to_string()),
        };

        save_config_flags(&path, &flags).unwrap();
        let loaded = load_config_flags(&path).unwrap();
        assert_eq!(loaded, flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
        assert_eq!(load_config_flags(&path).unwrap(), ConfigFlags::default());
    }
}
