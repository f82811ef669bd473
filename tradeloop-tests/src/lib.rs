// SPDX-License-Identifier: Apache-2.0

//! This crate has no public surface of its own; see `tests/scenarios.rs` for
//! the end-to-end scenarios it carries.
