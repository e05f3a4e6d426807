use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! opaque_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

opaque_id!(TenantId);
opaque_id!(ResourceId);
opaque_id!(ChunkId);
opaque_id!(FileId);
opaque_id!(CallerId);

/// A per-tenant category key: the three built-ins plus arbitrary custom ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CategoryType {
    Vendor,
    People,
    Price,
    Custom(String),
}

impl CategoryType {
    /// Canonical storage key, used wherever categories are keyed in a map or table.
    pub fn key(&self) -> String {
        match self {
            CategoryType::Vendor => "vendor".to_string(),
            CategoryType::People => "people".to_string(),
            CategoryType::Price => "price".to_string(),
            CategoryType::Custom(s) => s.clone(),
        }
    }

    pub fn from_key(key: &str) -> Self {
        match key {
            "vendor" => CategoryType::Vendor,
            "people" => CategoryType::People,
            "price" => CategoryType::Price,
            other => CategoryType::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}
