use serde::{Deserialize, Deserializer};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use crate::api::Fields;
use crate::error::Result;
use crate::oauth::Credentials;

pub const CONFIG_FILENAME: &str = "marketoctl.yaml";

/// Points at a configuration file directly.
pub const CONFIG_ENV: &str = "MARKETOCTL_CONFIG";

/// Directory holding the configuration when installed as a snap.
pub const SNAP_CONFIG_DIR_ENV: &str = "SNAP_USER_COMMON";

/// Written out for the user to fill in the first time around.
pub const DEFAULT_CONFIG: &str = "# marketoctl configuration

service_root: https://<xxx-XXX-xxx>.mktorest.com
client_id: <CLIENT-ID>
client_secret: <CLIENT-SECRET>

lead:
  overrides:
    snapcraftio: true
    snapcraftioEnvironment: staging
";

/// Connection settings, loaded once and never changed afterwards.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    pub service_root: Url,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub lead: LeadConfig,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct LeadConfig {
    /// Merged into every lead that is created or updated.
    #[serde(default, deserialize_with = "overrides")]
    pub overrides: Fields,
}

/// Overrides may be a plain mapping or a list of single-entry mappings.
#[derive(Deserialize)]
#[serde(untagged)]
enum Overrides {
    Map(Fields),
    List(Vec<Fields>),
}

fn overrides<'de, D>(deserializer: D) -> std::result::Result<Fields, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Overrides>::deserialize(deserializer)? {
        None => Fields::new(),
        Some(Overrides::Map(fields)) => fields,
        Some(Overrides::List(entries)) => entries.into_iter().flatten().collect(),
    })
}

impl Config {
    pub fn from_yaml(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
        }
    }
}

/// Where the configuration lives.
///
/// An explicit path wins, then `$MARKETOCTL_CONFIG`, then
/// `$SNAP_USER_COMMON/marketoctl.yaml`, then `./marketoctl.yaml`.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(path) = env::var_os(CONFIG_ENV).filter(|path| !path.is_empty()) {
        return PathBuf::from(path);
    }
    let dir = env::var_os(SNAP_CONFIG_DIR_ENV)
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    dir.join(CONFIG_FILENAME)
}
