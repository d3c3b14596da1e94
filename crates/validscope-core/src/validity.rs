#![forbid(unsafe_code)]

//! The four-state validity signal.
//!
//! Every reporter and collector carries exactly one [`Validity`]. The enum
//! separates "nothing reported yet" ([`Validity::Unset`]) from "validation is
//! switched off" ([`Validity::Disabled`]), which a nullable boolean cannot.
//!
//! # Ordering of precedence
//!
//! [`Validity::or`] treats `Unset` as absent: the first *set* value wins.
//! Collectors use this to let an explicit override shadow the reducer result.

use core::fmt;
use core::str::FromStr;

/// Validity of a single reporter or of an aggregated scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Validity {
    /// No opinion. Equivalent to "absent"; never stored in a map.
    #[default]
    Unset,
    /// Validation is intentionally turned off.
    Disabled,
    /// Validation passed.
    Valid,
    /// Validation failed.
    Invalid,
}

impl Validity {
    /// All variants, in declaration order.
    pub const ALL: [Self; 4] = [Self::Unset, Self::Disabled, Self::Valid, Self::Invalid];

    /// Whether this is anything other than [`Validity::Unset`].
    #[inline]
    #[must_use]
    pub const fn is_set(self) -> bool {
        !matches!(self, Self::Unset)
    }

    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }

    #[inline]
    #[must_use]
    pub const fn is_invalid(self) -> bool {
        matches!(self, Self::Invalid)
    }

    /// Return `self` when set, otherwise `fallback`.
    #[inline]
    #[must_use]
    pub const fn or(self, fallback: Self) -> Self {
        match self {
            Self::Unset => fallback,
            set => set,
        }
    }

    /// Decode the legacy tri-state encoding.
    ///
    /// `None` is unset, `Some(None)` is disabled and `Some(Some(ok))` maps to
    /// valid or invalid.
    #[must_use]
    pub const fn from_tristate(raw: Option<Option<bool>>) -> Self {
        match raw {
            None => Self::Unset,
            Some(None) => Self::Disabled,
            Some(Some(true)) => Self::Valid,
            Some(Some(false)) => Self::Invalid,
        }
    }

    /// Inverse of [`Validity::from_tristate`].
    #[must_use]
    pub const fn to_tristate(self) -> Option<Option<bool>> {
        match self {
            Self::Unset => None,
            Self::Disabled => Some(None),
            Self::Valid => Some(Some(true)),
            Self::Invalid => Some(Some(false)),
        }
    }

    /// Lowercase name, as used by `Display` and `FromStr`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Disabled => "disabled",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
        }
    }
}

impl From<bool> for Validity {
    fn from(ok: bool) -> Self {
        if ok { Self::Valid } else { Self::Invalid }
    }
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by [`Validity::from_str`] for an unknown name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseValidityError(pub String);

impl fmt::Display for ParseValidityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown validity '{}'", self.0)
    }
}

impl std::error::Error for ParseValidityError {}

impl FromStr for Validity {
    type Err = ParseValidityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unset" => Ok(Self::Unset),
            "disabled" => Ok(Self::Disabled),
            "valid" => Ok(Self::Valid),
            "invalid" => Ok(Self::Invalid),
            _ => Err(ParseValidityError(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unset() {
        assert_eq!(Validity::default(), Validity::Unset);
        assert!(!Validity::default().is_set());
    }

    #[test]
    fn or_prefers_first_set_value() {
        assert_eq!(Validity::Invalid.or(Validity::Valid), Validity::Invalid);
        assert_eq!(Validity::Disabled.or(Validity::Valid), Validity::Disabled);
        assert_eq!(Validity::Unset.or(Validity::Valid), Validity::Valid);
        assert_eq!(Validity::Unset.or(Validity::Unset), Validity::Unset);
    }

    #[test]
    fn tristate_round_trips_every_variant() {
        for v in Validity::ALL {
            assert_eq!(Validity::from_tristate(v.to_tristate()), v);
        }
        assert_eq!(Validity::from_tristate(Some(None)), Validity::Disabled);
    }

    #[test]
    fn from_bool() {
        assert_eq!(Validity::from(true), Validity::Valid);
        assert_eq!(Validity::from(false), Validity::Invalid);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(" Valid ".parse::<Validity>(), Ok(Validity::Valid));
        assert_eq!("DISABLED".parse::<Validity>(), Ok(Validity::Disabled));
        let err = "maybe".parse::<Validity>().unwrap_err();
        assert_eq!(err.to_string(), "unknown validity 'maybe'");
    }

    #[test]
    fn display_matches_parse() {
        for v in Validity::ALL {
            assert_eq!(v.to_string().parse::<Validity>(), Ok(v));
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Validity::Invalid).unwrap();
        assert_eq!(json, r#""invalid""#);
        let back: Validity = serde_json::from_str(r#""disabled""#).unwrap();
        assert_eq!(back, Validity::Disabled);
    }
}
