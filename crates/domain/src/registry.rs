// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::types::Domain;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Entity id of the synthetic expatriates unit.
pub const EXPATS_ENTITY_ID: u32 = 0;

/// Display name of the synthetic expatriates unit.
pub const EXPATS_NAME: &str = "Auslandschweizer";

/// Ids some exporters use for expatriates instead of `0`.
pub const EXPAT_SENTINELS: [u32; 27] = [
    9170, 19010, 19020, 19030, 19040, 19050, 19060, 19070, 19080, 19090, 19100, 19110, 19120,
    19130, 19140, 19150, 19160, 19170, 19180, 19190, 19200, 19210, 19220, 19230, 19240, 19250,
    19260,
];

static NO_ENTITIES: BTreeMap<u32, EntityInfo> = BTreeMap::new();

/// The jurisdiction whose registry governs an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Principal {
    /// A canton, identified by its abbreviation.
    Canton { canton: String },
    /// A single municipality, identified by its registry id.
    Municipality { municipality: String },
}

/// Registry attributes of one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub superregion: String,
}

impl EntityInfo {
    /// Registry entry for the expatriates unit.
    #[must_use]
    pub fn expats() -> Self {
        Self {
            name: String::from(EXPATS_NAME),
            ..Self::default()
        }
    }
}

/// Per-year lookup of the entities known to a principal.
///
/// The registry is read-only once loaded. Keys of the `entities` document are
/// years, then entity ids, both written as JSON strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRegistry {
    principal: Principal,
    #[serde(rename = "entities")]
    years: BTreeMap<i32, BTreeMap<u32, EntityInfo>>,
}

impl EntityRegistry {
    /// Creates a registry from already-built year maps.
    #[must_use]
    pub const fn new(principal: Principal, years: BTreeMap<i32, BTreeMap<u32, EntityInfo>>) -> Self {
        Self { principal, years }
    }

    /// Parses a registry from its JSON representation.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::RegistryParse`] if the document is not valid
    /// JSON or does not have the registry shape.
    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        serde_json::from_str(json).map_err(|e| DomainError::RegistryParse(e.to_string()))
    }

    #[must_use]
    pub const fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Returns the entities valid in `year`, or an empty map for unknown years.
    #[must_use]
    pub fn entities_for_year(&self, year: i32) -> &BTreeMap<u32, EntityInfo> {
        self.years.get(&year).unwrap_or(&NO_ENTITIES)
    }

    /// Computes the entities a ballot in `year` covers.
    ///
    /// # Arguments
    ///
    /// * `year` - The calendar year of the vote or election
    /// * `domain` - The domain of influence
    /// * `segment` - The domain segment (district, region or municipality name)
    /// * `has_expats` - Whether expatriates report as a separate unit
    #[must_use]
    pub fn scope(
        &self,
        year: i32,
        domain: Domain,
        segment: Option<&str>,
        has_expats: bool,
    ) -> EntityScope<'_> {
        let entities: &BTreeMap<u32, EntityInfo> = self.entities_for_year(year);
        let segment: &str = segment.unwrap_or_default();

        let members: Option<BTreeSet<u32>> = match domain {
            Domain::None => None,
            Domain::Federation | Domain::Canton => Some(entities.keys().copied().collect()),
            Domain::District => Some(select(entities, |info| info.district == segment)),
            Domain::Region => Some(select(entities, |info| info.region == segment)),
            Domain::Municipality => match self.principal {
                Principal::Canton { .. } => Some(select(entities, |info| info.name == segment)),
                Principal::Municipality { .. } => Some(entities.keys().copied().collect()),
            },
        };

        EntityScope {
            entities,
            members,
            has_expats,
        }
    }
}

fn select(
    entities: &BTreeMap<u32, EntityInfo>,
    predicate: impl Fn(&EntityInfo) -> bool,
) -> BTreeSet<u32> {
    entities
        .iter()
        .filter(|(_, info)| predicate(info))
        .map(|(id, _)| *id)
        .collect()
}

/// The registry entities relevant to one ballot.
#[derive(Debug, Clone)]
pub struct EntityScope<'a> {
    entities: &'a BTreeMap<u32, EntityInfo>,
    /// `None` disables the scope check and placeholder synthesis.
    members: Option<BTreeSet<u32>>,
    has_expats: bool,
}

impl EntityScope<'_> {
    /// Returns whether the id is a registry entity for the year.
    #[must_use]
    pub fn is_known(&self, entity_id: u32) -> bool {
        self.entities.contains_key(&entity_id)
    }

    /// Returns whether the id belongs to the ballot's domain of influence.
    #[must_use]
    pub fn contains(&self, entity_id: u32) -> bool {
        if entity_id == EXPATS_ENTITY_ID {
            return self.has_expats;
        }
        self.members
            .as_ref()
            .is_none_or(|members| members.contains(&entity_id))
    }

    #[must_use]
    pub const fn has_expats(&self) -> bool {
        self.has_expats
    }

    /// Registry attributes for an id, with the expatriates unit filled in.
    #[must_use]
    pub fn info(&self, entity_id: u32) -> EntityInfo {
        match self.entities.get(&entity_id) {
            Some(info) => info.clone(),
            None if entity_id == EXPATS_ENTITY_ID => EntityInfo::expats(),
            None => EntityInfo::default(),
        }
    }

    /// Ids that must be present after an accepted import, sorted ascending.
    #[must_use]
    pub fn placeholder_ids(&self) -> Vec<u32> {
        let Some(members) = self.members.as_ref() else {
            return Vec::new();
        };
        let mut ids: Vec<u32> = Vec::with_capacity(members.len() + 1);
        if self.has_expats && !members.contains(&EXPATS_ENTITY_ID) {
            ids.push(EXPATS_ENTITY_ID);
        }
        ids.extend(members.iter().copied());
        ids
    }
}
