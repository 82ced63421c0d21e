//! # Dimension Repository Resolver
//!
//! Dimension and mapping sections reference repositories by name. This module
//! checks those names against the declared `repositories`, determines the
//! order in which the declared repositories are fetched (each exactly once,
//! however many sections share it), and pairs each section's filters with the
//! resolved checkouts.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::path::PathBuf;

use crate::definitions::{CodeListFromRepository, DataStructureConfig, MappingRepository, RegionMappingConfig};
use crate::dimension::Dimension;
use crate::error::{Error, Result};
use crate::repository::{Repository, ResolvedRepository};

/// A part of the configuration that references repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Dimension(Dimension),
    Mappings,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Dimension(dimension) => write!(f, "{}", dimension),
            Section::Mappings => f.write_str("mappings"),
        }
    }
}

/// The repository names referenced by one section, in configuration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionReferences<'a> {
    pub section: Section,
    pub names: Vec<&'a str>,
}

/// Resolves section references against the declared repositories.
pub struct RepositoryResolver<'a> {
    repositories: &'a BTreeMap<String, Repository>,
    references: Vec<SectionReferences<'a>>,
}

impl<'a> RepositoryResolver<'a> {
    /// Collects the references of every dimension (in canonical order) and
    /// of the mapping section.
    pub fn new(
        repositories: &'a BTreeMap<String, Repository>,
        definitions: &'a DataStructureConfig,
        mappings: &'a RegionMappingConfig,
    ) -> Self {
        let mut references: Vec<SectionReferences<'a>> = Dimension::ALL
            .into_iter()
            .map(|dimension| SectionReferences {
                section: Section::Dimension(dimension),
                names: definitions
                    .repositories(dimension)
                    .iter()
                    .map(|source| source.name.as_str())
                    .collect(),
            })
            .collect();
        references.push(SectionReferences {
            section: Section::Mappings,
            names: mappings
                .repositories
                .iter()
                .map(|source| source.name.as_str())
                .collect(),
        });
        references.retain(|section| !section.names.is_empty());

        Self {
            repositories,
            references,
        }
    }

    pub fn references(&self) -> &[SectionReferences<'a>] {
        &self.references
    }

    /// Fails on the first section referencing undeclared repositories,
    /// listing all of that section's unknown names.
    pub fn check_references(&self) -> Result<()> {
        for references in &self.references {
            let unknown: BTreeSet<String> = references
                .names
                .iter()
                .filter(|name| !self.repositories.contains_key(**name))
                .map(|name| name.to_string())
                .collect();
            if !unknown.is_empty() {
                return Err(Error::UnknownRepository {
                    section: references.section.to_string(),
                    names: unknown,
                });
            }
        }
        Ok(())
    }

    /// Declared repository names, each once: referenced names in order of
    /// first reference, then the unreferenced ones by name.
    pub fn fetch_order(&self) -> Vec<&'a str> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();

        let referenced = self
            .references
            .iter()
            .flat_map(|references| references.names.iter().copied());
        let declared = self.repositories.keys().map(String::as_str);

        for name in referenced.chain(declared) {
            if self.repositories.contains_key(name) && seen.insert(name) {
                order.push(name);
            }
        }
        order
    }

    /// Names declared in `repositories` that no section references.
    pub fn unreferenced(&self) -> Vec<&'a str> {
        let referenced: HashSet<&str> = self
            .references
            .iter()
            .flat_map(|references| references.names.iter().copied())
            .collect();
        self.repositories
            .keys()
            .map(String::as_str)
            .filter(|name| !referenced.contains(name))
            .collect()
    }
}

/// A section entry paired with the checkout it refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSource<'a, F> {
    /// The entry as configured, including its filters.
    pub filter: &'a F,
    pub repository: &'a ResolvedRepository,
    /// Directory holding the section's files inside the checkout.
    pub path: PathBuf,
}

/// Pairs every entry of `dimension` with its resolved repository, in
/// configuration order.
pub fn dimension_sources<'a>(
    dimension: Dimension,
    definitions: &'a DataStructureConfig,
    resolved: &'a BTreeMap<String, ResolvedRepository>,
) -> Result<Vec<ResolvedSource<'a, CodeListFromRepository>>> {
    pair_sources(
        Section::Dimension(dimension),
        definitions.repositories(dimension),
        |source| &source.name,
        resolved,
        |repository| repository.dimension_path(dimension),
    )
}

/// Pairs every entry of the mapping section with its resolved repository, in
/// configuration order.
pub fn mapping_sources<'a>(
    mappings: &'a RegionMappingConfig,
    resolved: &'a BTreeMap<String, ResolvedRepository>,
) -> Result<Vec<ResolvedSource<'a, MappingRepository>>> {
    pair_sources(
        Section::Mappings,
        &mappings.repositories,
        |source| &source.name,
        resolved,
        ResolvedRepository::mappings_path,
    )
}

fn pair_sources<'a, F>(
    section: Section,
    entries: &'a [F],
    name_of: impl Fn(&F) -> &String,
    resolved: &'a BTreeMap<String, ResolvedRepository>,
    path_of: impl Fn(&ResolvedRepository) -> PathBuf,
) -> Result<Vec<ResolvedSource<'a, F>>> {
    let unknown: BTreeSet<String> = entries
        .iter()
        .map(&name_of)
        .filter(|name| !resolved.contains_key(*name))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(Error::UnknownRepository {
            section: section.to_string(),
            names: unknown,
        });
    }

    Ok(entries
        .iter()
        .filter_map(|entry| {
            resolved.get(name_of(entry)).map(|repository| ResolvedSource {
                filter: entry,
                path: path_of(repository),
                repository,
            })
        })
        .collect())
}

/// Merges per-source item lists in source order.
///
/// When several sources provide an item with the same name, the item of the
/// first-listed source is kept. Output order is the order of first
/// appearance.
pub fn merge_first_wins<T, I>(contributions: I) -> Vec<(String, T)>
where
    I: IntoIterator<Item = Vec<(String, T)>>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for items in contributions {
        for (name, item) in items {
            if seen.insert(name.clone()) {
                merged.push((name, item));
            }
        }
    }
    merged
}
