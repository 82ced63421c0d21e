//! # Nomenclature Repository Library
//!
//! This library resolves the external repositories a nomenclature project
//! draws its definitions and region mappings from. A project's
//! `nomenclature.yaml` declares named Git repositories, each optionally pinned
//! to a commit or release, and assigns them to the data dimensions (`model`,
//! `scenario`, `variable`, `region`, `subannual`) and to the mapping section.
//!
//! ## Quick Example
//!
//! ```
//! use nomenclature_repos::config::NomenclatureConfig;
//! use nomenclature_repos::dimension::Dimension;
//!
//! let config = NomenclatureConfig::parse(r#"
//! dimensions: [region, variable]
//! repositories:
//!   common-definitions:
//!     url: https://github.com/IAMconsortium/common-definitions.git
//!     release: v1.0.0
//! definitions:
//!   region:
//!     repositories: common-definitions
//! "#).unwrap();
//!
//! assert_eq!(config.repositories()["common-definitions"].release(), Some("v1.0.0"));
//! assert_eq!(config.definitions().repositories(Dimension::Region).len(), 1);
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`)**: Parses and validates `nomenclature.yaml`
//!   and drives fetching of the declared repositories.
//! - **Repositories (`repository`)**: Descriptors with their optional pin, and
//!   the resolved checkouts produced by fetching.
//! - **Fetching (`fetcher`, `git`)**: Clones or updates each checkout with the
//!   system `git` client behind the `GitOperations` trait.
//! - **Resolution (`resolver`)**: Checks section references against the
//!   declared repositories and pairs each section's filters with checkouts.
//! - **Sections (`definitions`, `dimension`, `time_domain`)**: The typed
//!   content of the `definitions`, `mappings` and `time_domain` sections.
//!
//! ## Resolution Flow
//!
//! [`config::NomenclatureConfig::from_file`] performs these steps:
//!
//! 1.  **Validation**: Check dimension names, repository descriptors, the
//!     time domain, region options and repository references.
//! 2.  **Fetching**: Bring every declared repository, once, into a directory
//!     named after it next to the configuration file.
//! 3.  **Nesting check**: Reject checkouts that declare external repositories
//!     of their own.

pub mod config;
pub mod defaults;
pub mod definitions;
pub mod dimension;
pub mod error;
pub mod fetcher;
pub mod git;
pub mod path;
pub mod repository;
pub mod resolver;
pub mod time_domain;

#[cfg(test)]
mod config_proptest;
