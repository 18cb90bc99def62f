/// Defines a newtype ID wrapper around a [`uuid::Uuid`] and generates:
/// - derives (Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)
/// - `Display` (hyphenated form) and `FromStr`
/// - `From<Uuid> for $name` and `From<$name> for Uuid`
/// - `parse`, which rejects malformed and nil identifiers with a validation error
///
/// Usage:
///   define_id_type!(SlotId, "slot id");
#[macro_export]
macro_rules! define_id_type {
    ($name:ident, $label:literal) => {
        #[derive(
            Debug,
            Copy,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub ::uuid::Uuid);

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::write!(f, "{}", self.0.hyphenated())
            }
        }

        impl ::std::convert::From<::uuid::Uuid> for $name {
            fn from(v: ::uuid::Uuid) -> Self {
                $name(v)
            }
        }

        impl ::std::convert::From<$name> for ::uuid::Uuid {
            fn from(v: $name) -> Self {
                v.0
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::error::ScheduleError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                $name::parse(s)
            }
        }

        impl $name {
            pub fn new(value: ::uuid::Uuid) -> Self {
                $name(value)
            }

            pub fn value(&self) -> ::uuid::Uuid {
                self.0
            }

            /// The nil UUID never identifies a stored entity.
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }

            /// Parse an identifier from its textual form.
            pub fn parse(raw: &str) -> $crate::error::ScheduleResult<Self> {
                ::uuid::Uuid::parse_str(raw.trim())
                    .ok()
                    .filter(|id| !id.is_nil())
                    .map($name)
                    .ok_or_else(|| {
                        $crate::error::ScheduleError::validation(::std::format!(
                            "invalid {} format: '{}'",
                            $label,
                            raw
                        ))
                    })
            }
        }
    };
}
