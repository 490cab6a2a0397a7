//! Configuration management utilities.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::domain::model::NamespaceMap;
use crate::domain::symbols::default_namespace_map;
use crate::infra::grammar::{GrammarOptions, default_library_path};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".remusing/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub grammar: GrammarSettings,
    #[serde(default)]
    pub symbols: Symbols,
}

/// Grammar source checkout and compiled library cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GrammarSettings {
    #[serde(default)]
    pub source: Option<PathBuf>,
    #[serde(default)]
    pub cache: Option<PathBuf>,
}

impl GrammarSettings {
    /// Grammar options with CLI flags taking precedence over configured values.
    pub fn options(&self, source: Option<PathBuf>, cache: Option<PathBuf>) -> GrammarOptions {
        GrammarOptions {
            source: source.or_else(|| self.source.clone()),
            library: cache
                .or_else(|| self.cache.clone())
                .unwrap_or_else(default_library_path),
        }
    }
}

/// Fallback namespace table settings.
///
/// `builtin` stays unset unless a layer mentions it, so a later file without the key cannot
/// re-enable a table an earlier layer switched off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Symbols {
    #[serde(default)]
    builtin: Option<bool>,
    #[serde(default)]
    pub namespaces: BTreeMap<String, String>,
}

impl Symbols {
    fn default_builtin() -> bool {
        true
    }

    /// Whether the built-in `std` table is part of the fallback.
    pub fn builtin(&self) -> bool {
        self.builtin.unwrap_or_else(Self::default_builtin)
    }

    /// The fallback table: built-in entries (if enabled) overlaid with configured ones.
    pub fn fallback_map(&self) -> NamespaceMap {
        let mut map = if self.builtin() {
            default_namespace_map()
        } else {
            NamespaceMap::new()
        };
        map.extend(
            self.namespaces
                .iter()
                .map(|(symbol, namespace)| (symbol.as_str(), namespace.as_str())),
        );
        map
    }
}

/// Environment overrides for grammar locations.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    grammar_source: Option<PathBuf>,
    grammar_cache: Option<PathBuf>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            grammar_source: env::var_os("REMUSING_TS_SOURCE").map(PathBuf::from),
            grammar_cache: env::var_os("REMUSING_TS_OUT").map(PathBuf::from),
        }
    }

    #[cfg(test)]
    fn for_tests(source: &str, cache: &str) -> Self {
        Self {
            grammar_source: Some(source.into()),
            grammar_cache: Some(cache.into()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            grammar: merge_grammar(self.grammar, other.grammar),
            symbols: merge_symbols(self.symbols, other.symbols),
        }
    }
}

fn merge_grammar(base: GrammarSettings, overlay: GrammarSettings) -> GrammarSettings {
    GrammarSettings {
        source: overlay.source.or(base.source),
        cache: overlay.cache.or(base.cache),
    }
}

fn merge_symbols(mut base: Symbols, overlay: Symbols) -> Symbols {
    if let Some(value) = overlay.builtin {
        base.builtin = Some(value);
    }
    base.namespaces.extend(overlay.namespaces);
    base
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("remusing/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(source) = env.grammar_source {
        config.grammar.source = Some(source);
    }
    if let Some(cache) = env.grammar_cache {
        config.grammar.cache = Some(cache);
    }
    config
}
