use super::prompts;
use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};
use owo_colors::OwoColorize;
use plexsync_config::{Config, CredentialStore, PathManager};
use plexsync_sources::{verify_plex_token, TraktClient};
use serde_json::json;
use std::path::PathBuf;

pub async fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full } => show_config(full, output),
        ConfigCommands::Plex { token, server_url } => configure_plex(token, server_url, output).await,
        ConfigCommands::Trakt { client_id, client_secret } => configure_trakt(client_id, client_secret, output).await,
        ConfigCommands::Sync { collection, ratings, watched_status } => {
            configure_sync(collection, ratings, watched_status, output)
        }
    }
}

fn load_config(path_manager: &PathManager) -> Result<(Config, PathBuf)> {
    path_manager
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create configuration directories: {}", e))?;
    let config_file = path_manager.config_file();
    let config = Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    Ok((config, config_file))
}

fn load_credentials(path_manager: &PathManager) -> Result<CredentialStore> {
    let credentials_file = path_manager.credentials_file();
    let mut store = CredentialStore::new(credentials_file.clone());
    store
        .load()
        .map_err(|e| eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;
    Ok(store)
}

fn save_config(config: &Config, config_file: &PathBuf) -> Result<()> {
    config
        .save_to_file(config_file)
        .map_err(|e| eyre!("Failed to save config to {}: {}", config_file.display(), e))
}

fn show_config(full: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::detect().map_err(|e| eyre!("{}", e))?;
    let config_file = path_manager.config_file();
    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Run 'plexsync config plex' and 'plexsync config trakt' to create it.");
        return Ok(());
    }

    let config = Config::load_from_file(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    let credentials = load_credentials(&path_manager)?;
    let secret = |value: &str| if full { value.to_string() } else { mask_string(value) };
    let token_state = |token: Option<&String>| token.map(|t| secret(t.as_str())).unwrap_or_else(|| "<not set>".to_string());

    if !output.is_human() {
        output.json(&json!({
            "config_file": config_file.display().to_string(),
            "config_origin": path_manager.origin().to_string(),
            "plex": {
                "server_url": config.plex.server_url,
                "token": token_state(credentials.get_plex_token()),
            },
            "trakt": {
                "client_id": secret(&config.trakt.client_id),
                "client_secret": secret(&config.trakt.client_secret),
                "authorized": credentials.get_trakt_access_token().is_some(),
                "token_expires": credentials.get_trakt_token_expires().map(|t| t.to_rfc3339()),
            },
            "sync": config.sync,
        }));
        return Ok(());
    }

    output.info(format!("Config file: {} ({})", config_file.display(), path_manager.origin()));

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("Setting").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);

    let server_url = if config.is_plex_configured() { config.plex.server_url.clone() } else { "<not set>".to_string() };
    table.add_row(vec![Cell::new("Plex server").fg(Color::Cyan), Cell::new(server_url)]);
    table.add_row(vec![Cell::new("Plex token").fg(Color::Cyan), Cell::new(token_state(credentials.get_plex_token()))]);
    table.add_row(vec![Cell::new("Trakt client id").fg(Color::Cyan), Cell::new(secret(&config.trakt.client_id))]);
    table.add_row(vec![
        Cell::new("Trakt client secret").fg(Color::Cyan),
        Cell::new(secret(&config.trakt.client_secret)),
    ]);
    let authorized = match (credentials.get_trakt_access_token(), credentials.get_trakt_token_expires()) {
        (Some(_), Some(expires)) => format!("yes (expires {})", expires.format("%Y-%m-%d %H:%M")),
        (Some(_), None) => "yes".to_string(),
        (None, _) => "no".to_string(),
    };
    table.add_row(vec![Cell::new("Trakt authorized").fg(Color::Cyan), Cell::new(authorized)]);
    for (name, enabled) in [
        ("Sync collection", config.sync.collection),
        ("Sync ratings", config.sync.ratings),
        ("Sync watched status", config.sync.watched_status),
    ] {
        let mark = if enabled { "✓".green().to_string() } else { "✗".red().to_string() };
        table.add_row(vec![Cell::new(name).fg(Color::Cyan), Cell::new(mark)]);
    }
    println!("{}", table);

    if !full {
        output.info("Secrets are masked. Use --full to show them.");
    }
    Ok(())
}

async fn configure_plex(token_arg: Option<String>, server_url_arg: Option<String>, output: &Output) -> Result<()> {
    let path_manager = PathManager::detect().map_err(|e| eyre!("{}", e))?;
    let (mut config, config_file) = load_config(&path_manager)?;
    let mut credentials = load_credentials(&path_manager)?;

    print_section_header("Plex Setup", output);
    print_instruction_list(
        &[
            "Find your token by inspecting a request in Plex Web (X-Plex-Token)",
            "The server URL is the address of your Plex Media Server, e.g. http://localhost:32400",
        ],
        output,
    );

    let token = match token_arg {
        Some(token) => token,
        None => loop {
            let input = prompts::prompt_secret("Plex Token")?;
            if input.trim().is_empty() {
                output.error("Token cannot be empty");
                continue;
            }
            break input.trim().to_string();
        },
    };

    let server_url = match server_url_arg {
        Some(url) => url,
        None => {
            let existing = Some(config.plex.server_url.as_str()).filter(|url| !url.is_empty());
            prompts::prompt_string("Plex Server URL", existing.or(Some("http://localhost:32400")))?
        }
    };
    let server_url = server_url.trim().trim_end_matches('/').to_string();
    if server_url.is_empty() {
        return Err(eyre!("Plex server URL is required"));
    }

    let spinner = indicatif::ProgressBar::new_spinner();
    spinner.set_message("Verifying token...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    let verified = verify_plex_token(&token).await;
    spinner.finish_and_clear();

    match verified {
        Ok(Some(username)) => output.success(format!("Token verified for Plex user {}", username)),
        Ok(None) => {
            output.warn("Token verification failed. The token may be invalid.");
            if !prompts::prompt_yes_no("Continue anyway?", false)? {
                return Err(eyre!("Token verification failed"));
            }
        }
        Err(e) => output.warn(format!("Could not verify token: {}. Continuing anyway...", e)),
    }

    config.plex.server_url = server_url.clone();
    save_config(&config, &config_file)?;
    credentials.set_plex_token(token);
    credentials.save().map_err(|e| eyre!("Failed to save credentials: {}", e))?;

    output.success("Plex configuration saved!");
    output.field("Server URL", server_url);
    Ok(())
}

async fn configure_trakt(client_id_arg: Option<String>, client_secret_arg: Option<String>, output: &Output) -> Result<()> {
    let path_manager = PathManager::detect().map_err(|e| eyre!("{}", e))?;
    let (mut config, config_file) = load_config(&path_manager)?;
    let mut credentials = load_credentials(&path_manager)?;

    print_section_header("Trakt API Setup", output);
    print_instruction_list(
        &[
            "Login to Trakt and navigate to your API apps page: https://trakt.tv/oauth/applications",
            "Create a new API application named 'plexsync'",
            "Use 'urn:ietf:wg:oauth:2.0:oob' as the Redirect URI",
        ],
        output,
    );

    let existing_id = config.is_trakt_configured().then(|| config.trakt.client_id.clone());
    let client_id = match client_id_arg {
        Some(id) => id,
        None => loop {
            let input = prompts::prompt_string("Trakt Client ID", existing_id.as_deref())?;
            match validate_client_id(input.trim()) {
                Ok(()) => break input.trim().to_string(),
                Err(e) => output.error(format!("Validation error: {}", e)),
            }
        },
    };
    let client_secret = match client_secret_arg {
        Some(secret) => secret,
        None => loop {
            let input = prompts::prompt_secret("Trakt Client Secret")?;
            match validate_client_id(input.trim()) {
                Ok(()) => break input.trim().to_string(),
                Err(e) => output.error(format!("Validation error: {}", e.replace("Client ID", "Client Secret"))),
            }
        },
    };

    config.trakt.client_id = client_id;
    config.trakt.client_secret = client_secret;
    save_config(&config, &config_file)?;

    print_oauth_progress("Starting OAuth authorization...", output);
    credentials.clear_trakt_tokens();
    let mut trakt = TraktClient::from_config(&config.trakt, 1);
    trakt
        .authenticate(&mut credentials)
        .await
        .map_err(|e| eyre!("Trakt authorization failed: {}", e))?;

    output.success("Trakt configuration saved and authorized!");
    Ok(())
}

fn configure_sync(
    collection: Option<bool>,
    ratings: Option<bool>,
    watched_status: Option<bool>,
    output: &Output,
) -> Result<()> {
    let path_manager = PathManager::detect().map_err(|e| eyre!("{}", e))?;
    let (mut config, config_file) = load_config(&path_manager)?;
    let interactive = collection.is_none() && ratings.is_none() && watched_status.is_none();

    let current = config.sync;
    let resolve = |arg: Option<bool>, prompt: &str, default: bool| -> Result<bool> {
        match arg {
            Some(value) => Ok(value),
            None if interactive => prompts::prompt_yes_no(prompt, default),
            None => Ok(default),
        }
    };

    config.sync.collection = resolve(collection, "Add Plex items to the Trakt collection?", current.collection)?;
    config.sync.ratings = resolve(ratings, "Sync ratings?", current.ratings)?;
    config.sync.watched_status = resolve(watched_status, "Sync watched status?", current.watched_status)?;
    save_config(&config, &config_file)?;

    output.success("Sync options saved!");
    output.field("Collection", config.sync.collection);
    output.field("Ratings", config.sync.ratings);
    output.field("Watched", config.sync.watched_status);
    Ok(())
}

fn mask_string(s: &str) -> String {
    if s.is_empty() || s == "YOUR_CLIENT_ID" || s == "YOUR_CLIENT_SECRET" {
        return "<not set>".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

fn validate_client_id(input: &str) -> Result<(), &'static str> {
    if input.is_empty() {
        return Err("Client ID cannot be empty");
    }
    if input.len() < 10 {
        return Err("Client ID seems too short. Please verify it's correct.");
    }
    Ok(())
}

fn print_section_header(title: &str, output: &Output) {
    output.info("");
    output.info(format!("{}", title.bold().bright_cyan()));
    output.info(format!("{}", "─".repeat(title.len()).bright_cyan()));
}

fn print_instruction_list(items: &[&str], output: &Output) {
    for (idx, item) in items.iter().enumerate() {
        output.info(format!("  {}. {}", idx + 1, item));
    }
}

fn print_oauth_progress(message: &str, output: &Output) {
    output.info(format!("{} {}", "→".bright_blue(), message.bright_white()));
}
