//! Debug formatting helpers for [`custom_debug_derive`].

use std::fmt;

/// Formats a secret as its length only.
///
/// Use with `#[debug(with = "crate::fmt::redacted")]` on token fields.
#[allow(clippy::ptr_arg)]
pub fn redacted(value: &String, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "<redacted {} chars>", value.chars().count())
}
