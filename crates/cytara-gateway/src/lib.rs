// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP boundary for the Cytara quote platform.
//!
//! Ingest bots submit candidate quotes, moderators decide them, and
//! consumers retrieve ranked or random quotes, all over JSON. Bot tokens
//! are routing identifiers resolved through a TTL cache, not credentials.

pub mod handlers;
pub mod server;
pub mod tokens;

pub use server::{
    GatewayState, IngestSettings, RetrievalSettings, ServerConfig, build_router, start_server,
};
pub use tokens::TokenCache;
