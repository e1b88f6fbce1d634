use std::fmt;
use std::str::FromStr;

/// Declares an opaque, newtype identifier backed by a `Uuid`.
///
/// Mirrors the pattern of Flow's `models::Id`: a small Copy wrapper with a
/// stable `Display`/`FromStr`/serde encoding, but distinct per entity kind so
/// a `SourceDatasetId` can never be handed to an API expecting a
/// `TargetDatasetId`.
macro_rules! entity_id {
    ($name:ident) => {
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(uuid::Uuid);

        impl $name {
            pub fn new(id: uuid::Uuid) -> Self {
                Self(id)
            }

            pub fn as_uuid(&self) -> uuid::Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(uuid::Uuid::parse_str(s)?))
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                self.0.serialize(serializer)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                Ok(Self(uuid::Uuid::deserialize(deserializer)?))
            }
        }
    };
}

entity_id!(SourceSystemId);
entity_id!(SourceDatasetId);
entity_id!(SourceColumnId);
entity_id!(SourceDatasetGroupId);
entity_id!(TargetSchemaId);
entity_id!(TargetDatasetId);
entity_id!(TargetColumnId);
entity_id!(TargetDatasetInputId);
entity_id!(TargetColumnInputId);
entity_id!(TargetDatasetReferenceId);
entity_id!(TargetDatasetJoinId);
entity_id!(QueryNodeId);
