// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Interactive prompts using dialoguer

use crate::error::{AppError, Result};
use crate::services::migrator::Prompt;
use dialoguer::{Confirm, Input};
use std::path::PathBuf;

/// Asks on the terminal; Enter means yes.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        Confirm::new()
            .with_prompt(question)
            .default(true)
            .interact()
            .map_err(|e| AppError::Internal(e.into()))
    }
}

/// Ask for the export archive path.
pub fn ask_export_path() -> Result<PathBuf> {
    let raw: String = Input::new()
        .with_prompt("Path to your Runkeeper activity export (.zip)")
        .interact_text()
        .map_err(|e| AppError::Internal(e.into()))?;

    let trimmed = raw.trim().trim_matches(|c| c == '"' || c == '\'');
    if trimmed.is_empty() {
        return Err(AppError::Input("no export selected".to_string()));
    }
    Ok(PathBuf::from(trimmed))
}
