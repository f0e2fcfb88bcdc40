// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Author identity verification for the Cytara quote platform.
//!
//! The matcher decides whether a submission's author is registered for a
//! persona; the service manages the registered records themselves.

pub mod matcher;
pub mod service;

pub use matcher::{
    Candidate, IdentityMatchResult, MatchField, PartialMatch, describe_identity, evaluate,
    resolve_candidate,
};
pub use service::{AddOutcome, add_identity, list_identities, remove_identity};
