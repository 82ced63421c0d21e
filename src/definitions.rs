//! # Definition and Mapping Sections
//!
//! The `definitions` section configures, per dimension, which external
//! repositories contribute code lists, and the `mappings` section does the
//! same for model mappings. Sections only hold repository *names*; the
//! descriptors live in the top-level `repositories` map.
//!
//! A `repositories` entry may be written in three shapes, all normalized to an
//! ordered list (order is preserved and entries are not de-duplicated):
//!
//! ```yaml
//! repositories: common-definitions
//! repositories: [common-definitions, legacy-definitions]
//! repositories:
//!   - name: common-definitions
//!     include:
//!       - name: "Primary Energy*"
//!         tier: 1
//!     exclude:
//!       - name: "Primary Energy|Coal"
//! ```

use std::collections::BTreeMap;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};

use crate::dimension::Dimension;
use crate::error::{Error, Result};
use crate::path::glob_match;

/// A filter over codes: attribute name to expected value.
///
/// `name` is matched as a glob pattern against the code name; any other key
/// is compared with the code attribute of the same name (string values as
/// glob patterns). A list value matches if any of its items matches.
pub type CodeFilter = BTreeMap<String, serde_yaml::Value>;

fn default_code_include() -> Vec<CodeFilter> {
    vec![BTreeMap::from([(
        "name".to_string(),
        serde_yaml::Value::String("*".to_string()),
    )])]
}

fn default_mapping_include() -> Vec<String> {
    vec!["*".to_string()]
}

/// A repository contributing codes to one dimension.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodeListFromRepository {
    pub name: String,
    #[serde(default = "default_code_include")]
    pub include: Vec<CodeFilter>,
    #[serde(default)]
    pub exclude: Vec<CodeFilter>,
}

impl CodeListFromRepository {
    /// Reference to `name` contributing all of its codes.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            include: default_code_include(),
            exclude: Vec::new(),
        }
    }

    /// Whether the code `code` with `attributes` passes the filters.
    pub fn selects(&self, code: &str, attributes: &serde_yaml::Mapping) -> Result<bool> {
        for filter in &self.exclude {
            if filter_matches(filter, code, attributes)? {
                return Ok(false);
            }
        }
        for filter in &self.include {
            if filter_matches(filter, code, attributes)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl From<String> for CodeListFromRepository {
    fn from(name: String) -> Self {
        Self::named(name)
    }
}

fn filter_matches(filter: &CodeFilter, code: &str, attributes: &serde_yaml::Mapping) -> Result<bool> {
    for (key, expected) in filter {
        let matched = if key == "name" {
            value_matches(expected, &serde_yaml::Value::String(code.to_string()))?
        } else {
            match attributes.get(key.as_str()) {
                Some(actual) => value_matches(expected, actual)?,
                None => false,
            }
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn value_matches(expected: &serde_yaml::Value, actual: &serde_yaml::Value) -> Result<bool> {
    use serde_yaml::Value;

    match (expected, actual) {
        (Value::Sequence(options), _) => {
            for option in options {
                if value_matches(option, actual)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        (Value::String(pattern), Value::String(value)) => glob_match(pattern, value),
        _ => Ok(expected == actual),
    }
}

/// A repository contributing model mappings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingRepository {
    pub name: String,
    /// Glob patterns over mapping (model) names.
    #[serde(default = "default_mapping_include")]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl MappingRepository {
    /// Reference to `name` contributing all of its mappings.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            include: default_mapping_include(),
            exclude: Vec::new(),
        }
    }

    /// Whether the mapping for `model` passes the filters.
    pub fn selects(&self, model: &str) -> Result<bool> {
        for pattern in &self.exclude {
            if glob_match(pattern, model)? {
                return Ok(false);
            }
        }
        for pattern in &self.include {
            if glob_match(pattern, model)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl From<String> for MappingRepository {
    fn from(name: String) -> Self {
        Self::named(name)
    }
}

/// Accepts a single name, a list of names, or a list of full entries.
///
/// Full entries are deserialized on their own so their errors (unknown or
/// missing fields) reach the user with the position of the entry.
fn repository_list<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + From<String>,
{
    use serde_yaml::Value;

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::String(name) => Ok(vec![T::from(name)]),
        Value::Sequence(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::String(name) => Ok(T::from(name)),
                Value::Mapping(entry) => serde_yaml::from_value(Value::Mapping(entry))
                    .map_err(|e| D::Error::custom(format!("repositories[{}]: {}", index, e))),
                _ => Err(D::Error::custom(format!(
                    "repositories[{}]: expected a repository name or an entry with `name`",
                    index
                ))),
            })
            .collect(),
        _ => Err(D::Error::custom(
            "repositories: expected a repository name or a list of repositories",
        )),
    }
}

/// Configuration of one dimension.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodeListConfig {
    #[serde(default, deserialize_with = "repository_list")]
    pub repositories: Vec<CodeListFromRepository>,
}

/// Selection of NUTS regions: all (`true`), none (`false`), or by country.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum NutsSelection {
    All(bool),
    Country(String),
    Countries(Vec<String>),
}

const NUTS_LEVELS: [&str; 3] = ["nuts-1", "nuts-2", "nuts-3"];

/// Configuration of the `region` dimension.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionCodeListConfig {
    #[serde(default, deserialize_with = "repository_list")]
    pub repositories: Vec<CodeListFromRepository>,
    /// Add the list of countries as regions.
    #[serde(default)]
    pub country: bool,
    /// NUTS levels to add as regions.
    #[serde(default)]
    pub nuts: Option<BTreeMap<String, NutsSelection>>,
}

impl RegionCodeListConfig {
    /// Reject `nuts` keys other than `nuts-1`, `nuts-2` and `nuts-3`.
    pub fn validate_nuts(&self) -> Result<()> {
        let Some(nuts) = &self.nuts else {
            return Ok(());
        };
        let invalid: Vec<&str> = nuts
            .keys()
            .map(String::as_str)
            .filter(|key| !NUTS_LEVELS.contains(key))
            .collect();
        if invalid.is_empty() {
            return Ok(());
        }
        Err(Error::ConfigParse {
            message: format!(
                "Invalid fields for `nuts` in configuration: {}",
                invalid.join(", ")
            ),
            hint: Some("Allowed values are: 'nuts-1', 'nuts-2' and 'nuts-3'".to_string()),
        })
    }
}

/// Deserialize a configuration section, naming it in the error.
pub(crate) fn section_from_value<T: DeserializeOwned>(
    section: &str,
    value: serde_yaml::Value,
) -> Result<T> {
    serde_yaml::from_value(value).map_err(|e| Error::ConfigParse {
        message: format!("Invalid {}: {}", section, e),
        hint: None,
    })
}

/// The `definitions` section: one optional entry per dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataStructureConfig {
    pub model: Option<CodeListConfig>,
    pub scenario: Option<CodeListConfig>,
    pub variable: Option<CodeListConfig>,
    pub region: Option<RegionCodeListConfig>,
    pub subannual: Option<CodeListConfig>,
}

impl DataStructureConfig {
    /// Build the section from its raw mapping, keyed by dimension name.
    ///
    /// Keys outside the dimension set are rejected.
    pub fn from_raw(raw: BTreeMap<String, serde_yaml::Value>) -> Result<Self> {
        let mut config = Self::default();
        for (key, value) in raw {
            let dimension: Dimension = key.parse()?;
            // An empty entry (`region:`) means "configured, no repositories"
            let value = match value {
                serde_yaml::Value::Null => serde_yaml::Value::Mapping(Default::default()),
                other => other,
            };
            let section = format!("'{}' definition", dimension);
            match dimension {
                Dimension::Model => config.model = Some(section_from_value(&section, value)?),
                Dimension::Scenario => config.scenario = Some(section_from_value(&section, value)?),
                Dimension::Variable => config.variable = Some(section_from_value(&section, value)?),
                Dimension::Region => config.region = Some(section_from_value(&section, value)?),
                Dimension::Subannual => {
                    config.subannual = Some(section_from_value(&section, value)?)
                }
            }
        }
        Ok(config)
    }

    /// Whether `dimension` has an entry in the section.
    pub fn is_configured(&self, dimension: Dimension) -> bool {
        match dimension {
            Dimension::Model => self.model.is_some(),
            Dimension::Scenario => self.scenario.is_some(),
            Dimension::Variable => self.variable.is_some(),
            Dimension::Region => self.region.is_some(),
            Dimension::Subannual => self.subannual.is_some(),
        }
    }

    /// Repositories referenced by `dimension`, in configuration order.
    pub fn repositories(&self, dimension: Dimension) -> &[CodeListFromRepository] {
        let repositories = match dimension {
            Dimension::Model => self.model.as_ref().map(|c| &c.repositories),
            Dimension::Scenario => self.scenario.as_ref().map(|c| &c.repositories),
            Dimension::Variable => self.variable.as_ref().map(|c| &c.repositories),
            Dimension::Region => self.region.as_ref().map(|c| &c.repositories),
            Dimension::Subannual => self.subannual.as_ref().map(|c| &c.repositories),
        };
        repositories.map(Vec::as_slice).unwrap_or_default()
    }
}

/// The `mappings` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionMappingConfig {
    #[serde(default, deserialize_with = "repository_list")]
    pub repositories: Vec<MappingRepository>,
}
