//! Sync scope resolution.
//!
//! A sync request names a scope (one site, a cluster of sites, or a whole
//! country) which must be expanded into the concrete set of location ids
//! every downstream filter operates on.

use crate::{error::Result, Error, LocationId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// The resolved form of a request scope. Exactly one variant applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SyncScope {
    /// A single site, addressed by location id.
    Site { site: LocationId },
    /// All sites in one named cluster within a country.
    Cluster { cluster: String, country: String },
    /// All sites in a country.
    Country { country: String },
}

/// Wire form of a scope: three optional discriminators, of which exactly
/// one valid combination must be populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeParams {
    pub site: Option<LocationId>,
    pub cluster: Option<String>,
    pub country: Option<String>,
}

impl ScopeParams {
    /// Validate the discriminator combination.
    pub fn parse(&self) -> Result<SyncScope> {
        match (&self.site, &self.cluster, &self.country) {
            (Some(site), None, None) => Ok(SyncScope::Site { site: site.clone() }),
            (None, Some(cluster), Some(country)) => Ok(SyncScope::Cluster {
                cluster: cluster.clone(),
                country: country.clone(),
            }),
            (None, None, Some(country)) => Ok(SyncScope::Country {
                country: country.clone(),
            }),
            (None, None, None) => Err(Error::InvalidScope(
                "one of site, cluster+country, or country is required".into(),
            )),
            (None, Some(_), None) => Err(Error::InvalidScope(
                "cluster scope requires a country".into(),
            )),
            _ => Err(Error::InvalidScope(
                "site cannot be combined with cluster or country".into(),
            )),
        }
    }
}

/// A location known to the system, with the attributes scoping cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: LocationId,
    pub country: String,
    /// Cluster attribute; locations without one are excluded from
    /// cluster-scoped syncs.
    pub cluster: Option<String>,
}

impl Location {
    pub fn new(id: impl Into<LocationId>, country: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            country: country.into(),
            cluster: None,
        }
    }

    pub fn in_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = Some(cluster.into());
        self
    }
}

/// A point-in-time snapshot of the location directory.
///
/// Resolution is a pure function over this snapshot; one snapshot is read
/// per request so scope membership cannot shift mid-request.
#[derive(Debug, Clone, Default)]
pub struct LocationIndex {
    locations: HashMap<LocationId, Location>,
}

impl LocationIndex {
    pub fn new(locations: impl IntoIterator<Item = Location>) -> Self {
        Self {
            locations: locations.into_iter().map(|l| (l.id.clone(), l)).collect(),
        }
    }

    /// Look up a single location.
    pub fn get(&self, id: &str) -> Option<&Location> {
        self.locations.get(id)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Expand a scope into the concrete set of location ids.
    ///
    /// An unknown site fails with [`Error::SiteNotFound`]; an unknown
    /// country or cluster resolves to the empty set, which downstream
    /// components treat as "nothing to sync".
    pub fn resolve(&self, scope: &SyncScope) -> Result<BTreeSet<LocationId>> {
        match scope {
            SyncScope::Site { site } => {
                if self.locations.contains_key(site) {
                    Ok(BTreeSet::from([site.clone()]))
                } else {
                    Err(Error::SiteNotFound(site.clone()))
                }
            }
            SyncScope::Country { country } => Ok(self
                .locations
                .values()
                .filter(|l| l.country == *country)
                .map(|l| l.id.clone())
                .collect()),
            SyncScope::Cluster { cluster, country } => Ok(self
                .locations
                .values()
                .filter(|l| l.country == *country && l.cluster.as_deref() == Some(cluster))
                .map(|l| l.id.clone())
                .collect()),
        }
    }
}
