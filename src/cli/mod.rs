// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Terminal-facing pieces: arguments, prompts, progress display, browser.

pub mod args;
pub mod browser;
pub mod progress;
pub mod prompts;

pub use args::Cli;
pub use prompts::TerminalPrompt;
