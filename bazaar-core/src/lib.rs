//! Bazaar Core - Client Data Types
//!
//! Shared data structures for the marketplace client crates: session
//! credentials, user records, product records, the injected clock and the
//! client configuration. No networking lives here.

use chrono::{DateTime, Utc};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub mod clock;
pub mod config;
pub mod error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AuthEndpoints, CacheSettings, ClientConfig, LoginRoutes};
pub use error::{ConfigError, FetchError, UnknownRole, FALLBACK_ERROR_MESSAGE};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Raw identifier as the backend may send it: a string or an integer.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Unsigned(u64),
    Signed(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Unsigned(n) => n.to_string(),
            RawId::Signed(n) => n.to_string(),
        }
    }
}

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                RawId::deserialize(deserializer).map(|raw| Self(raw.into()))
            }
        }
    };
}

record_id! {
    /// Product identifier. Numeric IDs from the backend are kept in string form.
    ProductId
}

record_id! {
    /// User identifier.
    UserId
}

// ============================================================================
// ROLES AND USERS
// ============================================================================

/// Account role, which decides the login route after a session expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Storefront customer
    User,
    /// Vendor using the seller dashboard
    Seller,
    /// Operator using the admin console
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Seller => "SELLER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "SELLER" => Ok(Role::Seller),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// The signed-in user as returned by the login endpoint.
///
/// Fields beyond `id`, `role`, `name` and `email` are kept in `extra` so the
/// stored record round-trips without loss. The identifier is read from `id`,
/// or from `_id` when `id` is absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: UserId,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<'de> Deserialize<'de> for UserRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut map = Map::<String, Value>::deserialize(deserializer)?;
        let id = take_record_id::<UserId, D::Error>(&mut map)?;
        let role = take_field::<Role, D::Error>(&mut map, "role")?
            .ok_or_else(|| de::Error::missing_field("role"))?;
        let name = take_field::<String, D::Error>(&mut map, "name")?;
        let email = take_field::<String, D::Error>(&mut map, "email")?;
        Ok(Self {
            id,
            role,
            name,
            email,
            extra: map,
        })
    }
}

impl UserRecord {
    pub fn new(id: impl Into<UserId>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
            name: None,
            email: None,
            extra: Map::new(),
        }
    }
}

/// Session credentials created on login and replaced on refresh.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCredentials {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserRecord,
}

impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &"[redacted]")
            .field("user", &self.user)
            .finish()
    }
}

// ============================================================================
// PRODUCTS
// ============================================================================

/// A product record. Everything besides the identifier is passed through
/// untouched to rendering code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl<'de> Deserialize<'de> for Product {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;
        let id = take_record_id::<ProductId, D::Error>(&mut fields)?;
        Ok(Self { id, fields })
    }
}

impl Product {
    pub fn new(id: impl Into<ProductId>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }

    pub fn name(&self) -> Option<&str> {
        self.field("name").and_then(|v| v.as_str())
    }
}

/// Remove and decode the record identifier. `id` wins over `_id`; when both
/// are present `_id` stays behind with the other keys.
fn take_record_id<T: DeserializeOwned, E: de::Error>(map: &mut Map<String, Value>) -> Result<T, E> {
    let raw = match map.remove("id") {
        Some(raw) => raw,
        None => map.remove("_id").ok_or_else(|| E::missing_field("id"))?,
    };
    T::deserialize(raw).map_err(E::custom)
}

/// Remove and decode an optional key. JSON `null` counts as absent.
fn take_field<T: DeserializeOwned, E: de::Error>(
    map: &mut Map<String, Value>,
    key: &str,
) -> Result<Option<T>, E> {
    map.remove(key)
        .filter(|value| !value.is_null())
        .map(|value| T::deserialize(value).map_err(E::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_parses_case_insensitively() {
        assert_eq!("seller".parse::<Role>().unwrap(), Role::Seller);
        assert_eq!(" ADMIN ".parse::<Role>().unwrap(), Role::Admin);
        assert!("vendor".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serializes_uppercase() {
        assert_eq!(serde_json::to_value(Role::User).unwrap(), json!("USER"));
        let role: Role = serde_json::from_value(json!("SELLER")).unwrap();
        assert_eq!(role, Role::Seller);
    }

    #[test]
    fn test_user_record_accepts_numeric_id() {
        let user: UserRecord = serde_json::from_value(json!({"id": 7, "role": "USER"})).unwrap();
        assert_eq!(user.id.as_str(), "7");
        assert_eq!(user.role, Role::User);
        assert!(user.extra.is_empty());
    }

    #[test]
    fn test_user_record_keeps_unknown_fields() {
        let user: UserRecord = serde_json::from_value(json!({
            "_id": "u-1",
            "role": "SELLER",
            "shopName": "Lantern Goods"
        }))
        .unwrap();
        assert_eq!(user.id, UserId::from("u-1"));
        assert_eq!(user.extra.get("shopName"), Some(&json!("Lantern Goods")));

        let back = serde_json::to_value(&user).unwrap();
        assert_eq!(back["shopName"], json!("Lantern Goods"));
        assert_eq!(back["id"], json!("u-1"));
    }

    #[test]
    fn test_product_preserves_payload() {
        let product: Product = serde_json::from_value(json!({
            "id": 42,
            "name": "Brass Lamp",
            "price": 19.5,
            "tags": ["home", "light"]
        }))
        .unwrap();
        assert_eq!(product.id, ProductId::from(42u64));
        assert_eq!(product.name(), Some("Brass Lamp"));
        assert_eq!(product.field("price"), Some(&json!(19.5)));
        assert!(!product.fields.contains_key("id"));
    }

    #[test]
    fn test_product_with_id_and_object_id() {
        let product: Product = serde_json::from_value(json!({
            "_id": "abc",
            "id": "abc",
            "name": "Lamp"
        }))
        .unwrap();
        assert_eq!(product.id.as_str(), "abc");
        assert_eq!(product.name(), Some("Lamp"));
        assert_eq!(product.field("_id"), Some(&json!("abc")));
        assert!(!product.fields.contains_key("id"));
    }

    #[test]
    fn test_user_record_with_id_and_object_id() {
        let user: UserRecord = serde_json::from_value(json!({
            "_id": "65f0c2",
            "id": "65f0c2",
            "role": "USER",
            "email": "ana@example.com",
            "name": null
        }))
        .unwrap();
        assert_eq!(user.id.as_str(), "65f0c2");
        assert_eq!(user.email.as_deref(), Some("ana@example.com"));
        assert!(user.name.is_none());
        assert_eq!(user.extra.get("_id"), Some(&json!("65f0c2")));
    }

    #[test]
    fn test_records_require_an_identifier() {
        let err = serde_json::from_value::<Product>(json!({"name": "Lamp"})).unwrap_err();
        assert!(err.to_string().contains("missing field `id`"));
        assert!(serde_json::from_value::<UserRecord>(json!({"id": 1})).is_err());
    }

    #[test]
    fn test_session_debug_redacts_tokens() {
        let session = SessionCredentials {
            access_token: "A1".to_string(),
            refresh_token: "R1".to_string(),
            user: UserRecord::new(7u64, Role::User),
        };
        let rendered = format!("{:?}", session);
        assert!(!rendered.contains("A1"));
        assert!(!rendered.contains("R1"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn test_session_uses_camel_case_keys() {
        let session: SessionCredentials = serde_json::from_value(json!({
            "accessToken": "A1",
            "refreshToken": "R1",
            "user": {"id": 7, "role": "USER"}
        }))
        .unwrap();
        assert_eq!(session.access_token, "A1");
        assert_eq!(session.user.id.as_str(), "7");
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn arb_role() -> impl Strategy<Value = Role> {
            prop_oneof![Just(Role::User), Just(Role::Seller), Just(Role::Admin)]
        }

        proptest! {
            #[test]
            fn prop_numeric_and_string_ids_agree(n in any::<u64>()) {
                let from_number: ProductId = serde_json::from_value(json!(n)).unwrap();
                let from_string: ProductId = serde_json::from_value(json!(n.to_string())).unwrap();
                prop_assert_eq!(&from_number, &from_string);
                prop_assert_eq!(from_number, ProductId::from(n));
            }

            #[test]
            fn prop_role_parse_ignores_case_and_padding(
                role in arb_role(),
                lower in any::<bool>(),
                pad in "[ \t]{0,3}",
            ) {
                let name = if lower {
                    role.as_str().to_ascii_lowercase()
                } else {
                    role.as_str().to_string()
                };
                let parsed: Role = format!("{pad}{name}{pad}").parse().unwrap();
                prop_assert_eq!(parsed, role);
            }

            #[test]
            fn prop_product_keeps_every_other_key(
                id in "[a-z0-9]{1,12}",
                extra in proptest::collection::btree_map("[a-z]{3,8}", any::<i64>(), 0..6),
            ) {
                let mut body = Map::new();
                for (key, value) in &extra {
                    body.insert(key.clone(), json!(value));
                }
                body.insert("_id".to_string(), json!(id));
                let product: Product = serde_json::from_value(Value::Object(body)).unwrap();
                prop_assert_eq!(product.id.as_str(), id.as_str());
                prop_assert_eq!(product.fields.len(), extra.len());
            }
        }
    }
}
