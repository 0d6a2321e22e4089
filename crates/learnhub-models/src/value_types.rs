//! Validated domain primitives.
//!
//! [`MobileNumber`] is always exactly ten ASCII digits; [`Email`] always has a
//! `local@domain.tld` shape. Both normalise on construction so that a value
//! that exists is a value that passed validation.

use serde::{Deserialize, Serialize};
use sqlx::{
    Database, Decode, Encode, Type,
    postgres::{PgHasArrayType, PgTypeInfo},
};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueTypeError {
    #[error("Mobile number is required")]
    MissingMobileNumber,

    #[error("Mobile number must be exactly {expected} digits (found {found})")]
    InvalidMobileLength { expected: usize, found: usize },

    #[error("Invalid email address")]
    InvalidEmail,
}

/// A ten-digit mobile number, stored as digits only.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[schema(value_type = String, example = "9876543210")]
pub struct MobileNumber(String);

impl MobileNumber {
    pub const DIGITS: usize = 10;

    /// Strips every non-digit and validates the remaining length.
    pub fn new(raw: &str) -> Result<Self, ValueTypeError> {
        let digits = Self::normalize(raw);
        if digits.is_empty() {
            return Err(ValueTypeError::MissingMobileNumber);
        }
        if digits.len() != Self::DIGITS {
            return Err(ValueTypeError::InvalidMobileLength {
                expected: Self::DIGITS,
                found: digits.len(),
            });
        }
        Ok(Self(digits))
    }

    /// Digits-only form of `raw`, with no length check.
    pub fn normalize(raw: &str) -> String {
        raw.chars().filter(|c| c.is_ascii_digit()).collect()
    }

    /// For values loaded from the database, which were validated on write.
    #[inline]
    pub fn new_unchecked(digits: impl Into<String>) -> Self {
        Self(digits.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// An email address with a `local@domain.tld` shape.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[schema(value_type = String, format = "email", example = "student@example.com")]
pub struct Email(String);

impl Email {
    pub fn new(raw: &str) -> Result<Self, ValueTypeError> {
        let email = raw.trim();
        if !Self::has_simple_shape(email) {
            return Err(ValueTypeError::InvalidEmail);
        }
        Ok(Self(email.to_string()))
    }

    #[inline]
    pub fn new_unchecked(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    /// One `@`, no whitespace, and a `.` in the domain with text on both sides.
    pub fn has_simple_shape(email: &str) -> bool {
        if email.chars().any(char::is_whitespace) {
            return false;
        }
        let Some((local, domain)) = email.split_once('@') else {
            return false;
        };
        if local.is_empty() || domain.contains('@') {
            return false;
        }
        domain
            .char_indices()
            .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

macro_rules! impl_text_value {
    ($name:ident) => {
        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValueTypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.0
            }
        }

        impl Type<sqlx::Postgres> for $name {
            fn type_info() -> PgTypeInfo {
                <String as Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &PgTypeInfo) -> bool {
                <String as Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'q> Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::Postgres as Database>::ArgumentBuffer<'q>,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <String as Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }

        impl<'r> Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: <sqlx::Postgres as Database>::ValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <String as Decode<'r, sqlx::Postgres>>::decode(value)?;
                Ok(Self::new_unchecked(s))
            }
        }

        impl PgHasArrayType for $name {
            fn array_type_info() -> PgTypeInfo {
                <String as PgHasArrayType>::array_type_info()
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::new(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

impl_text_value!(MobileNumber);
impl_text_value!(Email);

#[cfg(test)]
mod tests {
    use super::*;

    mod mobile_tests {
        use super::*;

        #[test]
        fn test_formatting_is_stripped() {
            let mobile = MobileNumber::new("+91 98765-43210").unwrap_err();
            // 12 digits once the country code is kept
            assert_eq!(
                mobile,
                ValueTypeError::InvalidMobileLength {
                    expected: 10,
                    found: 12
                }
            );

            let mobile = MobileNumber::new("(987) 654-3210").unwrap();
            assert_eq!(mobile.as_str(), "9876543210");
        }

        #[test]
        fn test_empty_is_missing() {
            assert_eq!(
                MobileNumber::new(" - ").unwrap_err(),
                ValueTypeError::MissingMobileNumber
            );
        }

        #[test]
        fn test_wrong_lengths() {
            assert!(MobileNumber::new("987654321").is_err());
            assert!(MobileNumber::new("98765432100").is_err());
        }

        #[test]
        fn test_error_message_mentions_count() {
            let err = MobileNumber::new("12345").unwrap_err();
            assert_eq!(
                err.to_string(),
                "Mobile number must be exactly 10 digits (found 5)"
            );
        }

        #[test]
        fn test_deserialize_validates() {
            let mobile: MobileNumber = serde_json::from_str(r#""98765 43210""#).unwrap();
            assert_eq!(mobile.as_str(), "9876543210");
            assert!(serde_json::from_str::<MobileNumber>(r#""123""#).is_err());
        }
    }

    mod email_tests {
        use super::*;

        #[test]
        fn test_valid_shapes() {
            assert!(Email::new("jane@x.com").is_ok());
            assert!(Email::new("first.last+tag@school.co.in").is_ok());
            assert!(Email::new("  padded@example.org ").is_ok());
        }

        #[test]
        fn test_invalid_shapes() {
            for bad in [
                "",
                "plain",
                "@example.com",
                "user@",
                "user@domain",
                "user@.com",
                "user@domain.",
                "us er@example.com",
                "a@b@c.com",
            ] {
                assert!(Email::new(bad).is_err(), "{bad} should be rejected");
            }
        }

        #[test]
        fn test_trimmed_value_kept() {
            let email = Email::new(" jane@x.com ").unwrap();
            assert_eq!(email.as_str(), "jane@x.com");
        }
    }
}
