//! Configured address-field projection.
//!
//! Deployments name which person-address fields devices receive. The
//! mapping from configured name to accessor is built once and validated
//! up front; an unknown name is rejected instead of failing at read time
//! through reflective lookup.

use crate::{error::Result, Error};
use serde_json::{Map, Value};

/// Address fields a deployment may configure.
const KNOWN_FIELDS: &[&str] = &[
    "address1",
    "address2",
    "cityVillage",
    "stateProvince",
    "countyDistrict",
    "country",
    "postalCode",
    "latitude",
    "longitude",
];

/// A validated projection from a full address object down to the
/// configured subset of fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressFieldMap {
    names: Vec<String>,
}

impl AddressFieldMap {
    /// Build the map, rejecting any name outside the known field set.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut validated = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            if !KNOWN_FIELDS.contains(&name) {
                return Err(Error::UnknownAddressField(name.to_string()));
            }
            validated.push(name.to_string());
        }
        Ok(Self { names: validated })
    }

    /// Every known field, for deployments that configure nothing.
    pub fn all_fields() -> Self {
        Self {
            names: KNOWN_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Project an address object down to the configured fields. Fields
    /// missing from the source are left out rather than emitted as null.
    pub fn project(&self, address: &Value) -> Value {
        let mut projected = Map::new();
        if let Value::Object(source) = address {
            for name in &self.names {
                if let Some(value) = source.get(name) {
                    if !value.is_null() {
                        projected.insert(name.clone(), value.clone());
                    }
                }
            }
        }
        Value::Object(projected)
    }
}
