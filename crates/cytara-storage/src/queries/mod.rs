// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per table family.

pub mod bots;
pub mod identities;
pub mod personas;
pub mod quotes;
pub mod submissions;

use std::str::FromStr;

/// Parse a TEXT column into one of the strum-backed enums, mapping parse
/// failures onto a rusqlite conversion error so they surface through the
/// normal row-mapping path.
pub(crate) fn parse_enum_column<T: FromStr>(
    value: String,
    idx: usize,
) -> Result<T, rusqlite::Error> {
    value.parse::<T>().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unrecognized enum value: {value}").into(),
        )
    })
}
