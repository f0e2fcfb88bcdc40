// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Submission intake and the moderation state machine for Cytara.

pub mod pipeline;

pub use pipeline::{
    ApprovalOutcome, approve, count_pending, create_submission, pending_submissions,
    purge_pending, reject,
};
