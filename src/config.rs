use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Environment variable naming a JSON configuration file for the CLI.
pub const CONFIG_ENV: &str = "CONNECT_HOOKS_CONFIG";

/// Names the rewrite looks for and the names it generates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Imported name of the wrapper factory (`connect`).
    pub factory_name: String,
    /// Modules the factory may be imported from.
    pub factory_sources: Vec<String>,
    /// Module the selector / dispatch hooks are imported from.
    pub hooks_source: String,
    pub selector_hook: String,
    pub dispatch_hook: String,
    pub callback_hook: String,
    /// Module `callback_hook` is imported from.
    pub callback_source: String,
    /// Local the dispatch hook result is bound to.
    pub dispatch_name: String,
    /// Drop the factory import and add the hook imports.
    pub rewrite_imports: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            factory_name: "connect".into(),
            factory_sources: vec!["react-redux".into()],
            hooks_source: "react-redux".into(),
            selector_hook: "useSelector".into(),
            dispatch_hook: "useDispatch".into(),
            callback_hook: "useCallback".into(),
            callback_source: "react".into(),
            dispatch_name: "dispatch".into(),
            rewrite_imports: true,
        }
    }
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier pattern compiles"))
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Loads the file named by [`CONFIG_ENV`], or the defaults when it is unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::from_file(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let names = [
            ("factory_name", &self.factory_name),
            ("selector_hook", &self.selector_hook),
            ("dispatch_hook", &self.dispatch_hook),
            ("callback_hook", &self.callback_hook),
            ("dispatch_name", &self.dispatch_name),
        ];
        for (field, value) in names {
            if !identifier_re().is_match(value) {
                return Err(Error::Config(format!(
                    "`{field}` must be an identifier, got {value:?}"
                )));
            }
        }
        if self.factory_sources.is_empty() {
            return Err(Error::Config("`factory_sources` must not be empty".into()));
        }
        Ok(())
    }
}

/// Name of the stable callback generated for an action: `increment` -> `dispatchIncrement`.
pub fn wrapper_name(action: &str) -> String {
    let mut chars = action.chars();
    match chars.next() {
        Some(first) => format!("dispatch{}{}", first.to_uppercase(), chars.as_str()),
        None => "dispatch".to_string(),
    }
}
