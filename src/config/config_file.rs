/* Copyright © 2024-2025 Adam Train <adam@trainrelay.net>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 */
use anyhow::{anyhow, Error};
use dirs::home_dir;
use serde::Deserialize;
use std::fs;
use std::fs::File;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
	/// Where the ledger file lives. The -f flag overrides this.
	pub ledger: Option<String>,
}

/// Fetches the config from the given path, or the default path if none.
/// The default config file is created empty on first use; a custom path
/// that does not exist is an error, since the user asked for it.
pub fn get_config(
	custom_config_path: Option<&String>,
) -> Result<Config, Error> {
	let config_path = match &custom_config_path {
		None => default_dir().join("config.toml"),
		Some(p) => PathBuf::from(p),
	};

	if !config_path.exists() && custom_config_path.is_none() {
		if let Some(parent) = config_path.parent() {
			fs::create_dir_all(parent)?;
		}
		File::create(config_path.clone())?;
	}

	let content = fs::read_to_string(config_path)?;
	let config: Config = toml::from_str(&content)
		.map_err(|e| anyhow!("failed to parse config: {}", e))?;

	Ok(config)
}

/// Where the ledger goes when neither the config nor the -f flag names
/// one.
pub fn default_ledger_path() -> PathBuf {
	default_dir().join("ledger.json")
}

fn default_dir() -> PathBuf {
	let home = home_dir()
		.unwrap_or_else(|| panic!("Unable to determine home directory"));
	home.join(".config/lotkeeper")
}
