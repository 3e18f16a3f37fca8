// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Black-box specs for the `poormansd` binary.

#[cfg(test)]
mod daemon;
