// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Concrete pipeline actions, grouped by queue.

pub mod categorization;
pub mod image;
pub mod ingredients;
pub mod instructions;
pub mod notes;
pub mod source;
