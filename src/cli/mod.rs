// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! CLI module for studychat
//!
//! Handles command-line argument parsing and interactive input parsing.

pub mod args;
pub mod repl;

pub use args::*;
pub use repl::{is_exit_command, parse_input, parse_input_with_attachments, ReplCommand};
