//! Interactive setup wizard for the wetransfer configuration

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use wetransfer_core::{save_config, validate_config, ConfigFile, EmailConfig};

/// Run the interactive setup wizard
pub async fn run_init_wizard() -> Result<()> {
    println!("🚀 Welcome to wetransfer setup!\n");

    println!("This wizard will guide you through the configuration process.");
    println!("You will need:");
    println!("  1. A WeTransfer API key (https://developers.wetransfer.com)");
    println!("  2. Optionally, a sender address and recipients for email delivery\n");

    let api_key = prompt_api_key()?;
    let user_identifier = prompt_user_identifier()?;
    let email = prompt_email()?;

    println!("\n📋 Configuration summary:");
    println!("  API key: {}...", api_key.chars().take(4).collect::<String>());
    println!(
        "  User identifier: {}",
        user_identifier.as_deref().unwrap_or("(none)")
    );
    match &email {
        Some(email) => println!(
            "  Email delivery: {} -> {}",
            email.sender,
            email.recipients.join(", ")
        ),
        None => println!("  Email delivery: disabled"),
    }

    let confirm = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Save this configuration?")
        .default(false)
        .interact()?;

    if !confirm {
        println!("❌ Configuration cancelled");
        return Ok(());
    }

    let mut config = ConfigFile::new(api_key);
    config.api.user_identifier = user_identifier;
    config.email = email;
    validate_config(&config)?;

    let pb = ProgressBar::new(2);
    pb.set_style(
        ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.set_message("Saving configuration...");

    let path = save_config(&config)?;

    pb.inc(1);
    pb.finish_with_message("✅ Configuration saved!");

    println!("\n🎉 Setup complete!");
    println!("\nConfiguration saved to: {}", path.display());
    println!("\nYou can now use wetransfer:");
    println!("  $ wetransfer upload photo.jpg -m \"Holiday pictures\"");
    println!("  $ wetransfer board create \"My board\"");
    println!("  $ wetransfer config show");

    Ok(())
}

fn prompt_api_key() -> Result<String> {
    Password::with_theme(&ColorfulTheme::default())
        .with_prompt("API key")
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("API key cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to get API key: {}", e))
}

fn prompt_user_identifier() -> Result<Option<String>> {
    let input: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("User identifier (optional)")
        .allow_empty(true)
        .interact_text()
        .map_err(|e| anyhow::anyhow!("Failed to get user identifier: {}", e))?;

    let input = input.trim();
    Ok((!input.is_empty()).then(|| input.to_string()))
}

/// Email delivery goes through the private API, so it is opt-in
fn prompt_email() -> Result<Option<EmailConfig>> {
    let theme = ColorfulTheme::default();

    let enabled = Confirm::with_theme(&theme)
        .with_prompt("Send transfers directly to recipients by email? (unofficial API)")
        .default(false)
        .interact()?;
    if !enabled {
        return Ok(None);
    }

    let sender: String = Input::with_theme(&theme)
        .with_prompt("Sender email")
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.contains('@') {
                Ok(())
            } else {
                Err("Not an email address")
            }
        })
        .interact_text()
        .map_err(|e| anyhow::anyhow!("Failed to get sender: {}", e))?;

    let recipients: String = Input::with_theme(&theme)
        .with_prompt("Recipients (comma separated)")
        .validate_with(|input: &String| -> Result<(), &str> {
            let addresses = split_recipients(input);
            if addresses.is_empty() {
                Err("At least one recipient is required")
            } else if addresses.iter().any(|a| !a.contains('@')) {
                Err("Every recipient must be an email address")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .map_err(|e| anyhow::anyhow!("Failed to get recipients: {}", e))?;

    let language: String = Input::with_theme(&theme)
        .with_prompt("Notification language")
        .default("en".to_string())
        .interact_text()
        .map_err(|e| anyhow::anyhow!("Failed to get language: {}", e))?;

    Ok(Some(EmailConfig {
        sender,
        recipients: split_recipients(&recipients),
        language,
    }))
}

fn split_recipients(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
