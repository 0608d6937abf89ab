//! Interactive confirmation prompts

use crate::error::{NetappDeleterError, Result};
use dialoguer::{theme::ColorfulTheme, Confirm};

/// Asks the operator before anything destructive happens
#[cfg_attr(test, mockall::automock)]
pub trait ConfirmationPrompt: Send + Sync {
    /// Returns true only on an explicit yes
    fn confirm(&self, message: &str) -> Result<bool>;
}

/// Terminal prompt backed by dialoguer, defaulting to "no"
pub struct TerminalPrompt {
    theme: ColorfulTheme,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmationPrompt for TerminalPrompt {
    fn confirm(&self, message: &str) -> Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(message)
            .default(false)
            .interact()
            .map_err(|e| NetappDeleterError::invalid_argument(format!("Failed to get user input: {e}")))
    }
}

/// Validate Azure subscription ID format
pub fn validate_subscription_id(subscription_id: &str) -> std::result::Result<(), String> {
    if subscription_id.trim().is_empty() {
        return Err("Subscription ID cannot be empty".to_string());
    }

    let guid_pattern = regex::Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
    )
    .map_err(|_| "Invalid regex pattern".to_string())?;

    if !guid_pattern.is_match(subscription_id.trim()) {
        return Err("Subscription ID must be a valid GUID format".to_string());
    }

    Ok(())
}
