// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

pub mod catalog;
pub mod errors;
pub mod extraction;

pub use catalog::*;
pub use errors::*;
pub use extraction::*;
