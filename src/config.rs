//! # Nomenclature Configuration
//!
//! This module defines `NomenclatureConfig`, the parsed and validated form of
//! a `nomenclature.yaml` file, and drives the resolution of the external
//! repositories it declares.
//!
//! ## Format
//!
//! ```yaml
//! dimensions: [region, variable]
//! repositories:
//!   common-definitions:
//!     url: https://github.com/IAMconsortium/common-definitions.git
//!     release: v1.0.0
//! definitions:
//!   region:
//!     repositories: common-definitions
//!     country: true
//!   variable:
//!     repositories:
//!       - name: common-definitions
//!         include:
//!           - name: "Primary Energy*"
//! mappings:
//!   repositories: common-definitions
//! time_domain:
//!   datetime: true
//!   timezone: UTC+01:00
//! ```
//!
//! ## Validation
//!
//! The document is first read into raw structures and then validated eagerly,
//! stopping at the first violation, in this order:
//!
//! 1.  `dimensions` values and `definitions` keys are dimension names, and
//!     the `definitions` and `mappings` entries are well formed.
//! 2.  Every repository is well formed (a name usable as a directory name, no
//!     `local_path`, not both `hash` and `release`) and declared only once.
//! 3.  The `time_domain` section is consistent.
//! 4.  The region `nuts` options use known levels.
//! 5.  Every repository referenced by a dimension or the mapping section is
//!     declared.
//!
//! Loading from a file additionally fetches every declared repository, once,
//! into a directory named after it next to the configuration file, and checks
//! each checkout for nested external repositories.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use log::{debug, info};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::defaults::default_target_folder;
use crate::definitions::{
    section_from_value, CodeListFromRepository, DataStructureConfig, MappingRepository,
    RegionMappingConfig,
};
use crate::dimension::Dimension;
use crate::error::{Error, Result};
use crate::fetcher::RepositoryFetcher;
use crate::repository::{RawRepository, Repository, ResolvedRepository};
use crate::resolver::{self, RepositoryResolver, ResolvedSource};
use crate::time_domain::TimeDomainConfig;

/// Repository entries in document order, duplicates included.
struct RepositoryEntries(Vec<(String, RawRepository)>);

impl<'de> Deserialize<'de> for RepositoryEntries {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RepositoryEntries;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a mapping of repository names to repositories")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::new();
                while let Some(entry) = map.next_entry::<String, RawRepository>()? {
                    entries.push(entry);
                }
                Ok(RepositoryEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    dimensions: Option<Vec<String>>,
    #[serde(default)]
    repositories: Option<RepositoryEntries>,
    #[serde(default)]
    definitions: Option<BTreeMap<String, serde_yaml::Value>>,
    #[serde(default)]
    mappings: Option<serde_yaml::Value>,
    #[serde(default)]
    time_domain: Option<TimeDomainConfig>,
}

/// A validated nomenclature configuration.
#[derive(Debug, Clone)]
pub struct NomenclatureConfig {
    dimensions: Option<Vec<Dimension>>,
    repositories: BTreeMap<String, Repository>,
    definitions: DataStructureConfig,
    mappings: RegionMappingConfig,
    time_domain: TimeDomainConfig,
    resolved: Option<BTreeMap<String, ResolvedRepository>>,
}

impl NomenclatureConfig {
    /// Parses and validates a configuration without fetching anything.
    pub fn parse(yaml_content: &str) -> Result<Self> {
        // An empty document is an empty configuration
        let raw: RawConfig = if yaml_content.trim().is_empty() {
            serde_yaml::from_str("{}")?
        } else {
            serde_yaml::from_str(yaml_content)?
        };
        Self::from_raw(raw)
    }

    /// Loads `path` and fetches its repositories next to it with the system
    /// `git` command.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_file_with(path, &RepositoryFetcher::new())
    }

    /// Loads `path` and fetches its repositories next to it with `fetcher`.
    pub fn from_file_with<P: AsRef<Path>>(path: P, fetcher: &RepositoryFetcher) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(Error::Io)?;
        let mut config = Self::parse(&content)?;
        config.fetch_repos(&default_target_folder(path), fetcher)?;
        Ok(config)
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        // 1. dimension names
        let dimensions = raw
            .dimensions
            .map(|values| {
                values
                    .iter()
                    .map(|value| value.parse::<Dimension>())
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?;
        let definitions = DataStructureConfig::from_raw(raw.definitions.unwrap_or_default())?;
        let mappings: RegionMappingConfig = match raw.mappings {
            None | Some(serde_yaml::Value::Null) => RegionMappingConfig::default(),
            Some(value) => section_from_value("'mappings' section", value)?,
        };

        // 2. repository descriptors
        let mut repositories = BTreeMap::new();
        for (name, entry) in raw.repositories.map(|r| r.0).unwrap_or_default() {
            let repository = Repository::from_raw(&name, entry)?;
            if repositories.insert(name.clone(), repository).is_some() {
                return Err(Error::DuplicateRepository { name });
            }
        }

        // 3. time domain
        let time_domain = raw.time_domain.unwrap_or_default();
        time_domain.validate()?;

        // 4. region options
        if let Some(region) = &definitions.region {
            region.validate_nuts()?;
        }

        // 5. references
        RepositoryResolver::new(&repositories, &definitions, &mappings).check_references()?;

        Ok(Self {
            dimensions,
            repositories,
            definitions,
            mappings,
            time_domain,
            resolved: None,
        })
    }

    /// Fetches every declared repository into `target_folder/<name>`.
    ///
    /// Each repository is fetched once, however many sections reference it,
    /// and checked for nested external repositories right after. Nothing is
    /// recorded unless all of them succeed. Can only be done once per
    /// configuration.
    pub fn fetch_repos(&mut self, target_folder: &Path, fetcher: &RepositoryFetcher) -> Result<()> {
        if self.resolved.is_some() {
            return Err(Error::AlreadyResolved);
        }

        let resolver = RepositoryResolver::new(&self.repositories, &self.definitions, &self.mappings);
        for name in resolver.unreferenced() {
            debug!("Repository '{}' is not referenced by any dimension or mapping", name);
        }

        let mut resolved = BTreeMap::new();
        for name in resolver.fetch_order() {
            let Some(repository) = self.repositories.get(name) else {
                continue;
            };
            let checkout = fetcher.fetch(name, repository, &target_folder.join(name))?;
            checkout.check_external_repo_double_stacking()?;
            resolved.insert(name.to_string(), checkout);
        }

        info!("Resolved {} external repositories", resolved.len());
        self.resolved = Some(resolved);
        Ok(())
    }

    /// The configured dimensions, `None` when not restricted.
    pub fn dimensions(&self) -> Option<&[Dimension]> {
        self.dimensions.as_deref()
    }

    /// Declared repositories by name.
    pub fn repositories(&self) -> &BTreeMap<String, Repository> {
        &self.repositories
    }

    /// Fetched repositories by name, `None` until fetched.
    pub fn resolved_repositories(&self) -> Option<&BTreeMap<String, ResolvedRepository>> {
        self.resolved.as_ref()
    }

    /// Local checkout of repository `name`, once fetched.
    pub fn local_path(&self, name: &str) -> Option<&Path> {
        self.resolved
            .as_ref()
            .and_then(|resolved| resolved.get(name))
            .map(ResolvedRepository::local_path)
    }

    pub fn definitions(&self) -> &DataStructureConfig {
        &self.definitions
    }

    pub fn mappings(&self) -> &RegionMappingConfig {
        &self.mappings
    }

    pub fn time_domain(&self) -> &TimeDomainConfig {
        &self.time_domain
    }

    /// Entries of `dimension` with their checkouts, in configuration order.
    pub fn dimension_sources(
        &self,
        dimension: Dimension,
    ) -> Result<Vec<ResolvedSource<'_, CodeListFromRepository>>> {
        let resolved = self.resolved.as_ref().ok_or(Error::NotResolved)?;
        resolver::dimension_sources(dimension, &self.definitions, resolved)
    }

    /// Entries of the mapping section with their checkouts, in configuration
    /// order.
    pub fn mapping_sources(&self) -> Result<Vec<ResolvedSource<'_, MappingRepository>>> {
        let resolved = self.resolved.as_ref().ok_or(Error::NotResolved)?;
        resolver::mapping_sources(&self.mappings, resolved)
    }

    /// Names of all repositories referenced by any section.
    pub fn referenced_repositories(&self) -> HashSet<&str> {
        RepositoryResolver::new(&self.repositories, &self.definitions, &self.mappings)
            .references()
            .iter()
            .flat_map(|references| references.names.iter().copied())
            .collect()
    }
}
