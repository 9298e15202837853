// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Domain events pushed to the ingestion channel by the status broadcaster.

pub mod status_event;

pub use status_event::{EventContext, ImportStatus, StatusEvent};
