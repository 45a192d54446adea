use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Explicit entity discriminant. Entity files carry it as a lowercase
/// `category` field instead of leaving it to be inferred from which optional
/// attributes happen to be present.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Disease,
    Symptom,
    Cause,
    Diagnosis,
    Treatment,
    Prevention,
    Medication,
    Risk,
    Therapy,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Self::Disease,
        Self::Symptom,
        Self::Cause,
        Self::Diagnosis,
        Self::Treatment,
        Self::Prevention,
        Self::Medication,
        Self::Risk,
        Self::Therapy,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Disease => "Disease",
            Self::Symptom => "Symptom",
            Self::Cause => "Cause",
            Self::Diagnosis => "Diagnosis",
            Self::Treatment => "Treatment",
            Self::Prevention => "Prevention",
            Self::Medication => "Medication",
            Self::Risk => "Risk",
            Self::Therapy => "Therapy",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Disease => "disease",
            Self::Symptom => "symptom",
            Self::Cause => "cause",
            Self::Diagnosis => "diagnosis",
            Self::Treatment => "treatment",
            Self::Prevention => "prevention",
            Self::Medication => "medication",
            Self::Risk => "risk",
            Self::Therapy => "therapy",
        }
    }

    pub fn default_color(self) -> &'static str {
        match self {
            Self::Disease => "#FF6B6B",
            Self::Symptom => "#4ECDC4",
            Self::Cause => "#33C3FF",
            Self::Diagnosis => "#7DFF33",
            Self::Treatment => "#8E44AD",
            Self::Prevention => "#F5A623",
            Self::Medication => "#9D65C9",
            Self::Risk => "#FFA500",
            Self::Therapy => "#7DCFB6",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RelatedEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, Value>,
}

impl RelatedEntity {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        non_blank(self.name.as_deref())
    }
}

/// A root entity as delivered by the knowledge service, with its relation
/// sets keyed by relation name (`symptoms`, `riskFactors`, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DomainEntity {
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relations: BTreeMap<String, Vec<RelatedEntity>>,
}

impl DomainEntity {
    pub fn new(category: Category, name: impl Into<String>) -> Self {
        Self {
            category,
            id: None,
            name: Some(name.into()),
            details: BTreeMap::new(),
            relations: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_owned(), value.into());
        self
    }

    pub fn with_relation<I, S>(mut self, key: &str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.relations.entry(key.to_owned()).or_default();
        entry.extend(names.into_iter().map(RelatedEntity::named));
        self
    }

    pub fn display_name(&self) -> Option<&str> {
        non_blank(self.name.as_deref())
    }
}

fn non_blank(name: Option<&str>) -> Option<&str> {
    name.map(str::trim).filter(|name| !name.is_empty())
}
