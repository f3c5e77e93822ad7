// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! backfill library
//!
//! This module exports the CLI configuration and subcommands for use in
//! integration tests and as a library.

pub mod commands;
pub mod config;
