use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{presets, Attribute, Cell, Color, Table};
use owo_colors::OwoColorize;
use serde_json::json;
use watchlist_sync_config::{
    mask, Config, CredentialStore, PathManager, CONFIG_DIR_ENV, LETTERBOXD_USERNAME_ENV, PLEX_TOKEN_ENV,
    PLEX_URL_ENV,
};

pub fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    let paths = PathManager::new().map_err(|e| eyre!("{}", e))?;
    match cmd {
        ConfigCommands::Show { full } => show_config(&paths, full, output),
        ConfigCommands::Plex { token, server_url } => configure_plex(&paths, token, server_url, output),
        ConfigCommands::Letterboxd { username } => configure_letterboxd(&paths, username, output),
        ConfigCommands::Path => show_path(&paths, output),
    }
}

fn load_config(paths: &PathManager) -> Result<Config> {
    let config_file = paths.config_file();
    Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))
}

fn load_credentials(paths: &PathManager) -> Result<CredentialStore> {
    let credentials_file = paths.credentials_file();
    let mut cred_store = CredentialStore::new(credentials_file.clone());
    cred_store
        .load()
        .map_err(|e| eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;
    Ok(cred_store)
}

fn env_override(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn display_or_unset(value: &str) -> String {
    if value.trim().is_empty() {
        "<not set>".to_string()
    } else {
        value.to_string()
    }
}

fn show_config(paths: &PathManager, full: bool, output: &Output) -> Result<()> {
    let config = load_config(paths)?;
    let cred_store = load_credentials(paths)?;

    let token = cred_store.get_plex_token().map(|t| if full { t.clone() } else { mask(t) });
    let overrides: Vec<&str> = [PLEX_TOKEN_ENV, PLEX_URL_ENV, LETTERBOXD_USERNAME_ENV]
        .into_iter()
        .filter(|name| env_override(name).is_some())
        .collect();

    if !output.is_human() {
        output.json(&json!({
            "config_file": paths.config_file().display().to_string(),
            "letterboxd": {
                "username": config.letterboxd.username,
                "base_url": config.letterboxd.base_url,
                "request_timeout_secs": config.letterboxd.request_timeout_secs,
            },
            "plex": {
                "server_url": config.plex.server_url,
                "discover_url": config.plex.discover_url,
                "request_timeout_secs": config.plex.request_timeout_secs,
                "token": token,
            },
            "matching": {
                "fallback": config.matching.fallback,
            },
            "environment_overrides": overrides,
        }));
        return Ok(());
    }
    if output.is_quiet() {
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Setting").fg(Color::Cyan).add_attribute(Attribute::Bold),
            Cell::new("Value").fg(Color::Cyan).add_attribute(Attribute::Bold),
        ]);
    table.add_row(vec![Cell::new("Config file"), Cell::new(paths.config_file().display())]);
    table.add_row(vec![Cell::new("Letterboxd username"), Cell::new(display_or_unset(&config.letterboxd.username))]);
    table.add_row(vec![Cell::new("Letterboxd list service"), Cell::new(&config.letterboxd.base_url)]);
    table.add_row(vec![Cell::new("Plex server URL"), Cell::new(display_or_unset(&config.plex.server_url))]);
    table.add_row(vec![Cell::new("Plex Discover URL"), Cell::new(&config.plex.discover_url)]);
    table.add_row(vec![
        Cell::new("Plex token"),
        Cell::new(token.unwrap_or_else(|| "<not set>".to_string())),
    ]);
    table.add_row(vec![
        Cell::new("Fallback matcher"),
        Cell::new(format!("{:?}", config.matching.fallback)),
    ]);
    table.add_row(vec![
        Cell::new("Request timeouts"),
        Cell::new(format!(
            "Letterboxd {}s, Plex {}s",
            config.letterboxd.request_timeout_secs, config.plex.request_timeout_secs
        )),
    ]);

    output.println("");
    output.println(format!("{}", "Configuration".bright_cyan().bold()));
    output.println(table.to_string());

    if !overrides.is_empty() {
        output.info(format!(
            "Overridden by environment: {}",
            overrides.join(", ").yellow()
        ));
    }
    Ok(())
}

/// Store the Plex token in credentials.toml and the server URL in config.toml
fn save_plex(paths: &PathManager, token: &str, server_url: &str) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
        return Err(eyre!("Plex token is required"));
    }
    let server_url = server_url.trim().trim_end_matches('/');
    if !(server_url.starts_with("http://") || server_url.starts_with("https://")) {
        return Err(eyre!("Plex server URL must start with http:// or https://"));
    }

    let mut config = load_config(paths)?;
    config.plex.server_url = server_url.to_string();
    let config_file = paths.config_file();
    config
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to save config to {}: {}", config_file.display(), e))?;

    let mut cred_store = load_credentials(paths)?;
    cred_store.set_plex_token(token.to_string());
    cred_store
        .save()
        .map_err(|e| eyre!("Failed to save credentials to {}: {}", paths.credentials_file().display(), e))?;
    Ok(())
}

fn save_letterboxd(paths: &PathManager, username: &str) -> Result<()> {
    let username = username.trim().trim_start_matches('@');
    if username.is_empty() || username.contains('/') || username.contains(char::is_whitespace) {
        return Err(eyre!("'{}' is not a valid Letterboxd username", username));
    }

    let mut config = load_config(paths)?;
    config.letterboxd.username = username.to_string();
    let config_file = paths.config_file();
    config
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to save config to {}: {}", config_file.display(), e))
}

fn configure_plex(
    paths: &PathManager,
    token_arg: Option<String>,
    server_url_arg: Option<String>,
    output: &Output,
) -> Result<()> {
    let token = match token_arg {
        Some(token) => token,
        None => {
            output.println("Your Plex token is sent as the X-Plex-Token header by Plex Web.");
            rpassword::prompt_password("Plex API Token: ").map_err(|e| eyre!("Failed to read token: {}", e))?
        }
    };

    let server_url = match server_url_arg {
        Some(url) => url,
        None => {
            let existing = load_config(paths)?.plex.server_url;
            let mut input = dialoguer::Input::<String>::new().with_prompt("Plex Server URL");
            if !existing.is_empty() {
                input = input.default(existing);
            }
            input.interact_text().map_err(|e| eyre!("Failed to read input: {}", e))?
        }
    };

    save_plex(paths, &token, &server_url)?;

    output.success("Plex configuration saved");
    output.println(format!("  Server URL: {}", server_url.trim().trim_end_matches('/')));
    output.println("  Run 'letterplex sync --dry-run' to check the token against plex.tv");
    Ok(())
}

fn configure_letterboxd(paths: &PathManager, username_arg: Option<String>, output: &Output) -> Result<()> {
    let username = match username_arg {
        Some(username) => username,
        None => dialoguer::Input::<String>::new()
            .with_prompt("Letterboxd username")
            .interact_text()
            .map_err(|e| eyre!("Failed to read input: {}", e))?,
    };

    save_letterboxd(paths, &username)?;
    output.success(format!("Letterboxd username set to '{}'", username.trim().trim_start_matches('@')));
    Ok(())
}

fn show_path(paths: &PathManager, output: &Output) -> Result<()> {
    if output.is_human() {
        output.println(paths.config_dir().display().to_string());
        output.println(format!("  (override with {})", CONFIG_DIR_ENV).dimmed().to_string());
    } else {
        output.json(&json!({
            "config_dir": paths.config_dir().display().to_string(),
            "config_file": paths.config_file().display().to_string(),
            "credentials_file": paths.credentials_file().display().to_string(),
        }));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_paths() -> (TempDir, PathManager) {
        let dir = TempDir::new().unwrap();
        let paths = PathManager::with_base_dir(dir.path().to_path_buf());
        (dir, paths)
    }

    #[test]
    fn test_save_plex_writes_config_and_credentials() {
        let (_dir, paths) = temp_paths();
        save_plex(&paths, " abc123token ", "http://192.168.1.10:32400/").unwrap();

        let config = Config::load_from_file(&paths.config_file()).unwrap();
        assert_eq!(config.plex.server_url, "http://192.168.1.10:32400");

        let creds = load_credentials(&paths).unwrap();
        assert_eq!(creds.get_plex_token().map(String::as_str), Some("abc123token"));
    }

    #[test]
    fn test_save_plex_rejects_bad_input() {
        let (_dir, paths) = temp_paths();
        assert!(save_plex(&paths, "", "http://localhost:32400").is_err());
        assert!(save_plex(&paths, "token", "localhost:32400").is_err());
        assert!(!paths.config_file().exists());
    }

    #[test]
    fn test_save_letterboxd_keeps_other_settings() {
        let (_dir, paths) = temp_paths();
        save_plex(&paths, "token", "https://plex.example.test").unwrap();
        save_letterboxd(&paths, "@cinephile").unwrap();

        let config = Config::load_from_file(&paths.config_file()).unwrap();
        assert_eq!(config.letterboxd.username, "cinephile");
        assert_eq!(config.plex.server_url, "https://plex.example.test");

        assert!(save_letterboxd(&paths, "letterboxd.com/cinephile").is_err());
    }
}
