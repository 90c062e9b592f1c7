//! Wire-to-domain translation.
//!
//! Each wire type owns exactly one domain shape. Translation is total: a
//! field the domain requires but the wire omits, or a value outside a known
//! enumeration, surfaces as [`ApiError::Translation`].

use std::str::FromStr;

use keyway_core::UnknownVariant;

use crate::error::ApiError;

/// Conversion from a backend wire shape into its domain model.
pub(crate) trait Translate {
    type Output;

    fn translate(self) -> Result<Self::Output, ApiError>;
}

impl<W: Translate> Translate for Vec<W> {
    type Output = Vec<W::Output>;

    fn translate(self) -> Result<Self::Output, ApiError> {
        self.into_iter().map(Translate::translate).collect()
    }
}

/// Parse a wire string into a domain enum.
pub(crate) fn parse_enum<T>(context: &'static str, raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = UnknownVariant>,
{
    raw.parse().map_err(|e: UnknownVariant| ApiError::translation(context, e))
}

/// Split `owner/name` into its two parts.
pub(crate) fn split_full_name<'a>(
    context: &'static str,
    full_name: &'a str,
) -> Result<(&'a str, &'a str), ApiError> {
    match full_name.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((owner, name))
        }
        _ => Err(ApiError::translation(
            context,
            format!("repository name '{full_name}' is not of the form owner/name"),
        )),
    }
}

/// Treat empty strings from the wire as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
