//! Macro for implementing Display and FromStr for label enums
//!
//! Operations, policies, and delivery states are logged and stored by their
//! snake_case label. This macro keeps the label table in one place.
//!
//! # Example
//!
//! ```rust
//! use sensorlink_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum LinkState {
//!     Online,
//!     Offline,
//! }
//!
//! impl_domain_status_conversions!(LinkState {
//!     Online => "online",
//!     Offline => "offline",
//! });
//!
//! assert_eq!(LinkState::Offline.to_string(), "offline");
//! assert_eq!("ONLINE".parse::<LinkState>(), Ok(LinkState::Online));
//! ```

/// Implements Display and FromStr traits for label enums
///
/// - Display writes the label verbatim
/// - FromStr matches labels case-insensitively and names the enum in its
///   error message
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($label),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($label => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Signal {
        Weak,
        Strong,
    }

    impl_domain_status_conversions!(Signal {
        Weak => "weak",
        Strong => "strong",
    });

    #[test]
    fn display_writes_label() {
        assert_eq!(Signal::Weak.to_string(), "weak");
        assert_eq!(format!("{:>8}", Signal::Strong.to_string()), "  strong");
    }

    #[test]
    fn parsing_ignores_case() {
        assert_eq!(Signal::from_str("STRONG"), Ok(Signal::Strong));
        assert_eq!(Signal::from_str("WeAk"), Ok(Signal::Weak));
    }

    #[test]
    fn unknown_label_names_the_enum() {
        let err = Signal::from_str("none").unwrap_err();
        assert_eq!(err, "Invalid Signal: none");
    }
}
