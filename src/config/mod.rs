use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::dsl::{Filter, FilterCache, ProfileId};

/// Named filters loaded from a YAML / TOML / JSON file.
#[derive(Debug, Deserialize, Serialize)]
pub struct FiltersConfig {
    pub filters: BTreeMap<String, FilterConfig>,
}

impl FiltersConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .build()
            .with_context(|| format!("Config: Failed to read {:?}", path))?;
        settings
            .try_deserialize()
            .with_context(|| format!("Config: Invalid filter file {:?}", path))
    }

    /// Compile every clause of every filter, sharing compiled queries.
    pub fn compile(&self, cache: &FilterCache) -> anyhow::Result<Vec<CompiledFilter>> {
        self.filters
            .iter()
            .map(|(name, filter)| filter.compile(name, cache))
            .collect()
    }

    /// Compile the filter called `name`.
    pub fn compile_named(&self, name: &str, cache: &FilterCache) -> anyhow::Result<CompiledFilter> {
        let filter = self.filters.get(name).with_context(|| {
            let known: Vec<&str> = self.filters.keys().map(String::as_str).collect();
            format!(
                "Config: Unknown filter '{}' (available: {})",
                name,
                known.join(", ")
            )
        })?;
        filter.compile(name, cache)
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub mode: MatchMode,
    #[serde(default)]
    pub clauses: Vec<ClauseConfig>,
}

impl FilterConfig {
    pub fn compile(&self, name: &str, cache: &FilterCache) -> anyhow::Result<CompiledFilter> {
        let mut clauses = Vec::with_capacity(self.clauses.len());

        for (i, clause) in self.clauses.iter().enumerate() {
            let filter = cache
                .get_or_parse(&clause.query, clause.profile)
                .with_context(|| {
                    format!(
                        "Config: Error compiling clause {} of filter '{}' ({:?})",
                        i + 1,
                        name,
                        clause.query
                    )
                })?;
            clauses.push(CompiledClause {
                field: clause.field.clone(),
                filter,
            });
        }

        Ok(CompiledFilter {
            name: name.to_string(),
            mode: self.mode,
            clauses,
        })
    }
}

/// How clause verdicts combine.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    All,
    Any,
}

/// One query applied to one record field.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClauseConfig {
    pub field: String,
    #[serde(default = "default_profile")]
    pub profile: ProfileId,
    pub query: String,
}

fn default_profile() -> ProfileId {
    ProfileId::Substring
}

#[derive(Debug, Clone)]
pub struct CompiledClause {
    pub field: String,
    pub filter: Arc<Filter>,
}

#[derive(Debug, Clone)]
pub struct CompiledFilter {
    pub name: String,
    pub mode: MatchMode,
    pub clauses: Vec<CompiledClause>,
}

impl CompiledFilter {
    /// A one-clause filter built from command line arguments.
    pub fn ad_hoc(
        field: &str,
        profile: ProfileId,
        query: &str,
        cache: &FilterCache,
    ) -> anyhow::Result<Self> {
        let config = FilterConfig {
            mode: MatchMode::All,
            clauses: vec![ClauseConfig {
                field: field.to_string(),
                profile,
                query: query.to_string(),
            }],
        };
        config.compile("query", cache)
    }
}
