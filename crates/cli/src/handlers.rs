//! Command handlers for the wetransfer CLI

use crate::wizard::run_init_wizard;
use crate::OutputFormat;
use anyhow::{Context, Result};
use clap::Command;
use clap_complete::{generate, Shell as ClapShell};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tabled::{Table, Tabled};
use tracing::{debug, info};
use walkdir::WalkDir;
use wetransfer_core::{
    config_exists, get_config_path, load_config, validate_config, Board, ClientConfig, Link,
    WeTransferClient,
};

/// Handle init command
pub async fn handle_init() -> Result<()> {
    run_init_wizard().await
}

/// Client settings from the config file, with `--api-key` taking precedence
fn client_config(api_key: Option<&str>) -> Result<ClientConfig> {
    if config_exists() {
        let file = load_config()?;
        validate_config(&file)?;

        let mut config = ClientConfig::from(&file);
        if let Some(key) = api_key {
            config.api_key = key.to_string();
        }
        return Ok(config);
    }

    match api_key {
        Some(key) => Ok(ClientConfig::new(key)),
        None => Err(anyhow::anyhow!(
            "No configuration found at {} (run 'wetransfer init' or pass --api-key)",
            get_config_path()?.display()
        )),
    }
}

async fn connect(api_key: Option<&str>) -> Result<WeTransferClient> {
    let client = WeTransferClient::connect(client_config(api_key)?)
        .await
        .context("Could not authorize with WeTransfer")?;
    Ok(client)
}

/// Handle config commands
pub async fn handle_config(action: &str, api_key: Option<&str>) -> Result<()> {
    match action {
        "show" => {
            let config = load_config()?;

            println!("Current configuration ({}):", get_config_path()?.display());
            println!();
            println!("API:");
            println!("  API key: {}", mask_key(&config.api.api_key));
            println!(
                "  User identifier: {}",
                config.api.user_identifier.as_deref().unwrap_or("(none)")
            );
            println!("  Endpoint: {}", config.api.endpoint);
            println!("  Private endpoint: {}", config.api.private_endpoint);

            match &config.email {
                Some(email) => {
                    println!();
                    println!("Email delivery:");
                    println!("  Sender: {}", email.sender);
                    println!("  Recipients: {}", email.recipients.join(", "));
                    println!("  Language: {}", email.language);
                }
                None => {
                    println!();
                    println!("Email delivery: disabled");
                }
            }

            if let Some(advanced) = &config.advanced {
                println!();
                println!("Advanced:");
                println!("  Timeout: {}s", advanced.timeout);
                println!("  Log HTTP bodies: {}", advanced.log_http_bodies);
                println!("  Legacy part count: {}", advanced.legacy_part_count);
            }

            Ok(())
        }
        "validate" => {
            println!("Validating configuration...");

            let config = load_config()?;
            validate_config(&config)?;
            println!("  ✅ Valid configuration format");

            println!("  Testing API key...");
            connect(api_key).await?;
            println!("  ✅ Authorization successful!");

            Ok(())
        }
        "edit" => {
            let config_path = get_config_path()?;
            println!("Opening editor...");
            println!("  File: {}", config_path.display());
            println!();

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
            let status = std::process::Command::new(editor)
                .arg(&config_path)
                .status()?;

            if status.success() {
                println!("  ✅ Configuration edited");

                let config = load_config()?;
                validate_config(&config)?;
                println!("  ✅ Configuration valid");
            } else {
                println!("  ⚠️  Editor exited with error");
            }

            Ok(())
        }
        _ => {
            println!("Unknown action: {}", action);
            println!("Available actions: show, edit, validate");
            Ok(())
        }
    }
}

/// Handle the upload command
pub async fn handle_upload(
    api_key: Option<&str>,
    paths: &[PathBuf],
    message: &str,
    recursive: bool,
    output: OutputFormat,
) -> Result<()> {
    let files = collect_files(paths, recursive)?;
    if files.is_empty() {
        return Err(anyhow::anyhow!("No files to upload"));
    }

    let client = connect(api_key).await?;

    let total: u64 = files
        .iter()
        .map(|f| f.metadata().map(|m| m.len()).unwrap_or(0))
        .sum();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    spinner.set_message(format!("Uploading {} file(s), {}...", files.len(), format_bytes(total)));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = client.upload_files(&files, message).await;
    spinner.finish_and_clear();
    let url = result?;
    info!(files = files.len(), bytes = total, %url, "upload finished");

    match output {
        OutputFormat::Json => {
            let entries: Vec<_> = files
                .iter()
                .map(|f| {
                    serde_json::json!({
                        "path": f.display().to_string(),
                        "size": f.metadata().map(|m| m.len()).unwrap_or(0),
                    })
                })
                .collect();

            println!(
                "{}",
                serde_json::json!({
                    "url": url,
                    "message": message,
                    "files": entries,
                    "email": client.email_delivery().is_some(),
                    "uploaded_at": chrono::Utc::now().to_rfc3339(),
                })
            );
        }
        OutputFormat::Table => {
            #[derive(Tabled)]
            struct FileRow {
                file: String,
                size: String,
            }

            let rows: Vec<FileRow> = files
                .iter()
                .map(|f| FileRow {
                    file: f.display().to_string(),
                    size: format_bytes(f.metadata().map(|m| m.len()).unwrap_or(0)),
                })
                .collect();

            println!("{}", Table::new(rows));
            println!();
            if let Some(delivery) = client.email_delivery() {
                println!("  ✅ Sent to {}", delivery.recipients.join(", "));
            } else {
                println!("  ✅ Upload complete");
            }
            println!("  {}", style(&url).cyan().bold());
        }
    }

    Ok(())
}

/// Expand the command line paths into regular files
fn collect_files(paths: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            if !recursive {
                return Err(anyhow::anyhow!(
                    "{} is a directory (use --recursive)",
                    path.display()
                ));
            }
            let before = files.len();
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = entry?;
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
            debug!(dir = %path.display(), files = files.len() - before, "expanded directory");
        } else {
            return Err(anyhow::anyhow!("File not found: {}", path.display()));
        }
    }

    Ok(files)
}

/// Handle board commands
pub async fn handle_board(
    api_key: Option<&str>,
    action: &str,
    target: &str,
    paths: &[PathBuf],
    link: Option<Link>,
) -> Result<()> {
    match action {
        "create" => {
            let client = connect(api_key).await?;
            println!("Creating board '{}'...", target);

            let board = client.create_board(target).await?;
            info!(board = %board.id, "board created");

            println!("  ✅ Board created");
            print_board(&board);
            Ok(())
        }
        "show" => {
            let client = connect(api_key).await?;
            let board = client.get_board(target).await?;
            print_board(&board);
            Ok(())
        }
        "add-files" => {
            let files = collect_files(paths, false)?;
            let client = connect(api_key).await?;

            let spinner = ProgressBar::new_spinner();
            spinner.set_message(format!("Uploading {} file(s) to board {}...", files.len(), target));
            spinner.enable_steady_tick(Duration::from_millis(120));

            let result = client.add_files_to_board(target, &files).await;
            spinner.finish_and_clear();
            let board = result?;
            info!(board = %board.id, files = files.len(), "files added to board");

            println!("  ✅ {} file(s) added", files.len());
            print_board(&board);
            Ok(())
        }
        "add-link" => {
            let link = link.ok_or_else(|| anyhow::anyhow!("Link URL required"))?;
            let client = connect(api_key).await?;

            let board = client.add_links_to_board(target, &[link]).await?;
            info!(board = %board.id, "link added to board");

            println!("  ✅ Link added");
            print_board(&board);
            Ok(())
        }
        _ => {
            println!("Unknown action: {}", action);
            println!("Available actions: create, show, add-files, add-link");
            Ok(())
        }
    }
}

fn print_board(board: &Board) {
    println!();
    println!("Board: {}", style(&board.name).bold());
    println!("  ID: {}", board.id);
    if let Some(description) = &board.description {
        println!("  Description: {}", description);
    }
    if let Some(state) = &board.state {
        println!("  State: {}", state);
    }
    if let Some(url) = &board.url {
        println!("  URL: {}", style(url).cyan());
    }

    if board.items.is_empty() {
        println!("  Empty board");
        return;
    }

    #[derive(Tabled)]
    struct ItemRow {
        kind: String,
        name: String,
        detail: String,
    }

    let rows: Vec<ItemRow> = board
        .items
        .iter()
        .map(|item| ItemRow {
            kind: format!("{:?}", item.kind).to_lowercase(),
            name: item.label().to_string(),
            detail: match (item.size, &item.url) {
                (Some(size), _) => format_bytes(size),
                (None, Some(url)) => url.clone(),
                (None, None) => String::new(),
            },
        })
        .collect();

    println!();
    println!("{}", Table::new(rows));
}

/// Handle doctor commands
pub async fn handle_doctor(action: &str, api_key: Option<&str>) -> Result<()> {
    match action {
        "check" => {
            println!("Checking wetransfer installation...");

            println!("  ✅ wetransfer is installed");
            println!("  Version: {}", env!("CARGO_PKG_VERSION"));

            let config_path = get_config_path()?;
            debug!(path = %config_path.display(), "checking configuration");
            if config_path.exists() {
                println!("  ✅ Configuration found");

                let config = load_config()?;
                validate_config(&config)?;
                println!("  ✅ Configuration valid");

                if config.email.is_some() {
                    println!("  ⚠️  Email delivery uses the private v4 API, which may change without notice");
                }
            } else if api_key.is_some() {
                println!("  ✅ API key provided on the command line");
            } else {
                println!("  ⚠️  Configuration not found (run 'wetransfer init')");
            }

            Ok(())
        }
        "test-connection" => {
            println!("Testing WeTransfer connection...");

            connect(api_key).await?;
            println!("  ✅ Authorization OK");

            Ok(())
        }
        _ => {
            println!("Unknown action: {}", action);
            println!("Available actions: check, test-connection");
            Ok(())
        }
    }
}

/// Show the first characters of a secret
fn mask_key(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    if key.chars().count() > 4 {
        format!("{}...", visible)
    } else {
        "****".to_string()
    }
}

/// Format bytes to human-readable size
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

/// Handle shell completion generation
pub async fn handle_completion(shell: &str, cmd: &mut Command) -> Result<()> {
    use std::io;

    let clap_shell = match shell {
        "bash" => ClapShell::Bash,
        "zsh" => ClapShell::Zsh,
        "fish" => ClapShell::Fish,
        "elvish" => ClapShell::Elvish,
        "powershell" | "pwsh" => ClapShell::PowerShell,
        _ => {
            return Err(anyhow::anyhow!(
                "Unsupported shell: {}\nSupported shells: bash, zsh, fish, elvish, powershell",
                shell
            ));
        }
    };

    // Script on stdout so it can be sourced directly
    generate(clap_shell, cmd, "wetransfer", &mut io::stdout());

    eprintln!();
    eprintln!("Installation instructions:");
    match shell {
        "bash" => {
            eprintln!("  # Add to your ~/.bashrc:");
            eprintln!("  source <(wetransfer completion bash)");
        }
        "zsh" => {
            eprintln!("  wetransfer completion zsh > ~/.zsh/completion/_wetransfer");
            eprintln!("  # then add to ~/.zshrc:");
            eprintln!("  fpath=(~/.zsh/completion $fpath)");
            eprintln!("  autoload -U compinit && compinit");
        }
        "fish" => {
            eprintln!("  wetransfer completion fish > ~/.config/fish/completions/wetransfer.fish");
        }
        "elvish" => {
            eprintln!("  wetransfer completion elvish > ~/.elvish/lib/wetransfer.elv");
            eprintln!("  # then add to rc.elv:");
            eprintln!("  use ~/.elvish/lib/wetransfer");
        }
        _ => {
            eprintln!("  wetransfer completion powershell | Out-String | Invoke-Expression");
        }
    }

    Ok(())
}
