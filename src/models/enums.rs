//! Shared domain enums
//!
//! Every enum is stored as its variant name in a `TEXT` column and travels
//! over JSON the same way. Incoming names match regardless of case.

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{
    encode::IsNull,
    error::BoxDynError,
    postgres::{PgArgumentBuffer, PgHasArrayType, PgTypeInfo, PgValueRef},
    Decode, Encode, Postgres,
};
use utoipa::ToSchema;

macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .copied()
                    .ok_or_else(|| format!("Invalid {}: {}", stringify!($name), s))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl sqlx::Type<Postgres> for $name {
            fn type_info() -> PgTypeInfo {
                <String as sqlx::Type<Postgres>>::type_info()
            }

            fn compatible(ty: &PgTypeInfo) -> bool {
                <String as sqlx::Type<Postgres>>::compatible(ty)
            }
        }

        impl PgHasArrayType for $name {
            fn array_type_info() -> PgTypeInfo {
                <String as PgHasArrayType>::array_type_info()
            }

            fn array_compatible(ty: &PgTypeInfo) -> bool {
                <String as PgHasArrayType>::array_compatible(ty)
            }
        }

        impl<'r> Decode<'r, Postgres> for $name {
            fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
                let s: String = Decode::<Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl Encode<'_, Postgres> for $name {
            fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> IsNull {
                <&str as Encode<Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

text_enum! {
    /// Lifecycle state of an asset
    AssetState {
        Available,
        NotAvailable,
        WaitingForRecycling,
        Recycled,
    }
}

impl AssetState {
    /// Only available assets can be handed out.
    pub fn is_assignable(&self) -> bool {
        matches!(self, AssetState::Available)
    }

    /// States an asset may be created with.
    pub fn is_initial(&self) -> bool {
        matches!(self, AssetState::Available | AssetState::NotAvailable)
    }
}

text_enum! {
    /// State machine of an assignment
    AssignmentState {
        WaitingForAcceptance,
        Accepted,
        Declined,
        WaitingForReturning,
        Returned,
    }
}

impl AssignmentState {
    /// Non-terminal states; an asset has at most one assignment in these.
    pub const ACTIVE: &'static [AssignmentState] = &[
        AssignmentState::WaitingForAcceptance,
        AssignmentState::Accepted,
        AssignmentState::WaitingForReturning,
    ];

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }
}

text_enum! {
    /// State of a returning request
    ReturningRequestState {
        WaitingForReturning,
        Completed,
        Cancelled,
    }
}

text_enum! {
    /// Account role
    Role {
        Admin,
        Staff,
    }
}

text_enum! {
    Gender {
        Male,
        Female,
        Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("notavailable".parse::<AssetState>(), Ok(AssetState::NotAvailable));
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert!("Lost".parse::<AssetState>().is_err());
    }

    #[test]
    fn deserializes_any_casing() {
        let states: Vec<AssetState> =
            serde_json::from_str(r#"["available", "NOTAVAILABLE", "Recycled"]"#).unwrap();
        assert_eq!(
            states,
            vec![AssetState::Available, AssetState::NotAvailable, AssetState::Recycled]
        );
        assert!(serde_json::from_str::<AssetState>(r#""Bogus""#).is_err());
    }

    #[test]
    fn json_uses_variant_names() {
        let json = serde_json::to_string(&AssignmentState::WaitingForAcceptance).unwrap();
        assert_eq!(json, "\"WaitingForAcceptance\"");
        assert_eq!(AssignmentState::WaitingForAcceptance.to_string(), "WaitingForAcceptance");
    }

    #[test]
    fn active_assignment_states() {
        assert!(AssignmentState::Accepted.is_active());
        assert!(AssignmentState::WaitingForReturning.is_active());
        assert!(!AssignmentState::Declined.is_active());
        assert!(!AssignmentState::Returned.is_active());
    }

    #[test]
    fn only_available_assets_are_assignable() {
        assert!(AssetState::Available.is_assignable());
        for state in [
            AssetState::NotAvailable,
            AssetState::WaitingForRecycling,
            AssetState::Recycled,
        ] {
            assert!(!state.is_assignable());
        }
    }
}
