//! Validation for the merged `Config`.

use super::Config;
use crate::core::error::{AppError, Result};

/// Validates the configuration after loading and overrides. Clamps values
/// where a sensible correction exists and errors where none does.
pub(crate) fn validate_config(config: &mut Config) -> Result<()> {
    if config.probe_delay.0 < 0.0 || config.page_delay.0 < 0.0 {
        return Err(AppError::Config(
            "Delay bounds cannot be negative.".to_string(),
        ));
    }
    if config.probe_delay.0 > config.probe_delay.1 {
        tracing::warn!(
            "Min probe delay ({:.2}s) > max ({:.2}s). Setting max = min.",
            config.probe_delay.0,
            config.probe_delay.1
        );
        config.probe_delay.1 = config.probe_delay.0;
    }
    if config.page_delay.0 > config.page_delay.1 {
        tracing::warn!(
            "Min page delay ({:.2}s) > max ({:.2}s). Setting max = min.",
            config.page_delay.0,
            config.page_delay.1
        );
        config.page_delay.1 = config.page_delay.0;
    }
    if config.save_batch_size == 0 {
        tracing::warn!("Save batch size was 0. Setting to 1.");
        config.save_batch_size = 1;
    }
    if config.max_pages_per_site == 0 {
        tracing::warn!("Max pages per site was 0. Setting to 1.");
        config.max_pages_per_site = 1;
    }
    if !config.smtp_sender_email.contains('@') || !config.smtp_sender_email.contains('.') {
        return Err(AppError::Config(format!(
            "Invalid SMTP sender email format: {}",
            config.smtp_sender_email
        )));
    }
    if config.input_path.trim().is_empty()
        || config.output_path.trim().is_empty()
        || config.final_output_path.trim().is_empty()
    {
        return Err(AppError::Config(
            "Input, output, and final output paths must all be non-empty.".to_string(),
        ));
    }
    if config.checkpoint_max_age_days <= 0 {
        return Err(AppError::Config(
            "Checkpoint validity window must be at least one day.".to_string(),
        ));
    }
    Ok(())
}
