use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory and an initial `config.json` with default settings.
///
/// # Arguments
/// - `mis_home` - The directory that will be the root of data directory, e.g. `$HOME/mis`
///
/// # Errors
/// - Returns an error if a config file already exists.
/// - Returns an error if any file operations fail.
pub async fn init(mis_home: &Path) -> Result<Out<()>> {
    let config = Config::create(mis_home)
        .await
        .context("Unable to create the data directory and config")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the config file at {}",
        config.config_path().display()
    )
    .into())
}
