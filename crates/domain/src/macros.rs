//! Macro for implementing string conversions on small wire enums
//!
//! Schedule values, roles and entry states cross the persistence boundary as
//! short strings, and the remote store is not consistent about casing or
//! spelling. This macro generates `Display`, `FromStr`, `TryFrom<String>` and
//! `From<Enum> for String` so the enums can be used with
//! `#[serde(try_from = "String", into = "String")]`.
//!
//! # Example
//!
//! ```rust
//! use sprintsync_domain::impl_wire_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Shift {
//!     Early,
//!     Late,
//! }
//!
//! impl_wire_conversions!(Shift {
//!     Early => "early" | "am",
//!     Late => "late" | "pm",
//! });
//!
//! assert_eq!("AM".parse::<Shift>().unwrap(), Shift::Early);
//! assert_eq!(Shift::Late.to_string(), "late");
//! ```

/// Implements `Display`, `FromStr` and the `String` conversions for an enum.
///
/// The first literal of each arm is the canonical form written by `Display`;
/// any further literals separated by `|` are accepted aliases. Parsing trims
/// surrounding whitespace and ignores ASCII case.
#[macro_export]
macro_rules! impl_wire_conversions {
    ($enum_name:ident { $($variant:ident => $canonical:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($canonical),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                $(
                    if trimmed.eq_ignore_ascii_case($canonical)
                        $(|| trimmed.eq_ignore_ascii_case($alias))*
                    {
                        return Ok(Self::$variant);
                    }
                )+
                Err(format!("Invalid {}: {}", stringify!($enum_name), s))
            }
        }

        impl TryFrom<String> for $enum_name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$enum_name> for String {
            fn from(value: $enum_name) -> Self {
                value.to_string()
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Present,
        Missing,
    }

    impl_wire_conversions!(Mark {
        Present => "P" | "present" | "here",
        Missing => "M" | "missing",
    });

    #[test]
    fn display_uses_canonical_form() {
        assert_eq!(Mark::Present.to_string(), "P");
        assert_eq!(Mark::Missing.to_string(), "M");
    }

    #[test]
    fn parse_accepts_aliases_in_any_case() {
        assert_eq!(Mark::from_str("p").unwrap(), Mark::Present);
        assert_eq!(Mark::from_str("HERE").unwrap(), Mark::Present);
        assert_eq!(Mark::from_str("  Missing ").unwrap(), Mark::Missing);
    }

    #[test]
    fn parse_rejects_unknown_values() {
        let err = Mark::from_str("absent").unwrap_err();
        assert!(err.contains("Invalid Mark: absent"));
        assert!(Mark::from_str("").is_err());
    }

    #[test]
    fn string_conversions_follow_display() {
        let wire: String = Mark::Missing.into();
        assert_eq!(wire, "M");
        assert_eq!(Mark::try_from(wire).unwrap(), Mark::Missing);
    }
}
