// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Domain error module - exports the unified error type for the import
//! platform along with its category and severity taxonomies.

pub mod import_error;

pub use import_error::{ErrorCategory, ErrorSeverity, ImportError};
