//! Macro for implementing Display and FromStr for wire-named enums
//!
//! Several domain enums travel as short lowercase tags (output directives,
//! authentication flavours). This macro gives them a single, case-insensitive
//! `Display`/`FromStr` pair.
//!
//! # Example
//!
//! ```rust
//! use k3bridge_domain::impl_wire_name_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Channel {
//!     Primary,
//!     Fallback,
//! }
//!
//! impl_wire_name_conversions!(Channel {
//!     Primary => "primary",
//!     Fallback => "fallback",
//! });
//!
//! assert_eq!("PRIMARY".parse::<Channel>().unwrap(), Channel::Primary);
//! ```

/// Implements Display and FromStr traits for enums with a wire name
///
/// - Display writes the mapped string
/// - FromStr parses case-insensitively and reports the enum name on failure
#[macro_export]
macro_rules! impl_wire_name_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = ::std::string::String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => ::std::result::Result::Ok(Self::$variant),)+
                    _ => ::std::result::Result::Err(::std::format!(
                        "Invalid {}: {}",
                        ::std::stringify!($enum_name),
                        s
                    )),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Shape {
        Object,
        NestedArray,
    }

    impl_wire_name_conversions!(Shape {
        Object => "object",
        NestedArray => "nested-array",
    });

    #[test]
    fn display_uses_wire_name() {
        assert_eq!(Shape::Object.to_string(), "object");
        assert_eq!(Shape::NestedArray.to_string(), "nested-array");
    }

    #[test]
    fn parse_ignores_case_and_padding() {
        assert_eq!(Shape::from_str(" Nested-Array ").unwrap(), Shape::NestedArray);
        assert_eq!(Shape::from_str("OBJECT").unwrap(), Shape::Object);
    }

    mod with_result_alias {
        #[allow(dead_code)]
        type Result<T> = std::result::Result<T, ()>;

        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum Mode {
            Serial,
            Parallel,
        }

        impl_wire_name_conversions!(Mode {
            Serial => "serial",
            Parallel => "parallel",
        });
    }

    #[test]
    fn expands_next_to_a_local_result_alias() {
        use with_result_alias::Mode;

        assert_eq!("Parallel".parse::<Mode>(), Ok(Mode::Parallel));
        assert_eq!(Mode::Serial.to_string(), "serial");
    }

    #[test]
    fn parse_rejects_unknown_names() {
        let err = Shape::from_str("matrix").unwrap_err();
        assert!(err.contains("Invalid Shape: matrix"));
    }
}
