// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for `git status --porcelain` parsing
//!
//! This fuzzes `parse_porcelain`, which decides whether a slot has anything
//! staged to commit.

#![no_main]

use libfuzzer_sys::fuzz_target;

use backfill_git::cli::parse_porcelain;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        for entry in parse_porcelain(input) {
            assert!(!entry.path.is_empty());
            let _ = entry.is_staged();
        }
    }
});
