// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for plan loading
//!
//! This fuzzes `Plan::from_json` followed by `Plan::into_parts`, which
//! validates personas and compiles mutation regexes.

#![no_main]

use libfuzzer_sys::fuzz_target;

use backfill_schedule::Plan;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data)
        && let Ok(plan) = Plan::from_json(input)
    {
        // Invalid plans must be rejected with an error, never a panic
        let _ = plan.into_parts();
    }
});
