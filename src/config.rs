//! Configuration file handling for the MIS checker.
//!
//! The configuration file is stored at `$MIS_HOME/config.json`. It holds the sheet layout
//! settings (which row has the headers), the mismatch tolerance, and any sheet names that should
//! be checked by a rule set in addition to the built-in ones.

use crate::recon::{RunOptions, DEFAULT_HEADER_ROW};
use crate::rules::RuleRegistry;
use crate::{utils, Result};
use anyhow::{bail, Context};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_NAME: &str = "mis";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$MIS_HOME` and from there it loads `$MIS_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the `$MIS_HOME` directory and writes an initial `config.json` with default
    /// settings.
    ///
    /// # Errors
    /// - Returns an error if `config.json` already exists.
    /// - Returns an error if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the mis home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A config file already exists at '{}'",
                config_path.display()
            );
        }
        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            config_path,
            config_file,
        })
    }

    /// This will
    /// - validate that `mis_home` exists and that the config file exists
    /// - load and validate the config file
    /// - return the loaded configuration object
    pub async fn load(mis_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = mis_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("MIS Home is missing")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        Ok(Self {
            root,
            config_path,
            config_file,
        })
    }

    /// Loads `$MIS_HOME/config.json` if it exists, otherwise returns the default settings. A
    /// config file that exists but is invalid is still an error.
    pub async fn load_or_default(mis_home: impl Into<PathBuf>) -> Result<Self> {
        let root = mis_home.into();
        let config_path = root.join(CONFIG_JSON);
        if config_path.is_file() {
            return Self::load(root).await;
        }
        debug!(
            "No config file at '{}', using default settings",
            config_path.display()
        );
        Ok(Self {
            root,
            config_path,
            config_file: ConfigFile::default(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// The 1-based row of each sheet that holds the column headers.
    pub fn header_row(&self) -> usize {
        self.config_file.header_row
    }

    pub fn tolerance(&self) -> Decimal {
        self.config_file.tolerance
    }

    /// Extra sheet name to rule set mappings.
    pub fn sheets(&self) -> &BTreeMap<String, String> {
        &self.config_file.sheets
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions::new(self.header_row(), self.tolerance())
    }

    /// The built-in rule sets, with the sheet mappings of this config added.
    pub fn rules(&self) -> RuleRegistry {
        RuleRegistry::default().with_sheets(self.sheets().clone())
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "mis",
///   "config_version": 1,
///   "header_row": 3,
///   "tolerance": "0",
///   "sheets": {
///     "Gold Hill-Main Meal": "vendor_commission"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "mis"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// The 1-based row that holds the column headers of every sheet
    #[serde(default = "default_header_row")]
    header_row: usize,

    /// The largest difference between a stored and a recomputed value that is not reported.
    /// Zero means values must be exactly equal.
    #[serde(default)]
    tolerance: Decimal,

    /// Sheet name -> rule set, in addition to the built-in sheet names
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    sheets: BTreeMap<String, String>,
}

fn default_header_row() -> usize {
    DEFAULT_HEADER_ROW
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            header_row: DEFAULT_HEADER_ROW,
            tolerance: Decimal::ZERO,
            sheets: BTreeMap::new(),
        }
    }
}

impl ConfigFile {
    /// Loads and validates a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or holds invalid settings
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.config_version == CONFIG_VERSION,
            "Unsupported config_version {} in config file, expected {}",
            config.config_version,
            CONFIG_VERSION
        );
        anyhow::ensure!(
            config.header_row >= 1,
            "Invalid header_row in config file: rows are numbered from 1"
        );
        anyhow::ensure!(
            !config.tolerance.is_sign_negative(),
            "Invalid tolerance in config file: {} is negative",
            config.tolerance
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}
