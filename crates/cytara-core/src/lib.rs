// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Cytara quote platform.
//!
//! This crate provides the error type and the domain types shared by the
//! storage, identity, quote, moderation, and gateway crates.

pub mod error;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CytaraError;
pub use types::{
    BotBinding, DuplicateReason, MediaType, ModerationAction, ModerationStatus, Persona,
    PersonaIdentity, Quote, Submission,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_operator_readable() {
        let mismatch = CytaraError::IdentityMismatch("no identities defined".into());
        assert!(mismatch.to_string().contains("no identities defined"));

        let decided = CytaraError::AlreadyDecided {
            status: ModerationStatus::Approved,
        };
        assert!(decided.to_string().contains("approved"));
    }

    #[test]
    fn storage_error_preserves_source() {
        let err = CytaraError::Storage {
            source: Box::new(std::io::Error::other("disk gone")),
        };
        assert!(err.to_string().contains("disk gone"));
    }
}
