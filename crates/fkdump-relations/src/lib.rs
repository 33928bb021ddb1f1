//! fkdump-relations: Relation-following fixture export.
//!
//! Resolves a model and its seed records through a [`ModelStore`], follows
//! foreign-key and many-to-many relations outward, and serializes the result
//! as fixture data. Two traversals are provided: [`closure::collect_related`]
//! (depth-limited, feeds the single-stream dump) and
//! [`graph::RelationshipGraph`] (level-by-level, feeds per-type fixture files).

pub mod closure;
pub mod error;
pub mod graph;
pub mod sink;
pub mod types;

#[cfg(test)]
mod testing;

pub use error::{DumpError, Result};
pub use graph::{RelationKind, RelationshipEdge, RelationshipGraph};
pub use sink::{DirectorySink, FixtureSink, MemorySink};
pub use types::{DumpRequest, PersistReport};

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use fkdump_codec::FixtureFormat;
use fkdump_core::config::FkdumpConfig;
use fkdump_core::{EntityType, ModelLabel, PrimaryKey, Record};
use fkdump_store::{MemoryStore, ModelStore};

/// A request with every name resolved against the store.
struct ResolvedRequest {
    entity: EntityType,
    excluded: HashSet<ModelLabel>,
    format: FixtureFormat,
    ids: Vec<PrimaryKey>,
}

/// Drives a dump against one store.
pub struct DumpEngine<S> {
    store: S,
}

impl DumpEngine<MemoryStore> {
    /// Open the dataset configured for a database alias.
    pub fn open(config: &FkdumpConfig, alias: &str) -> Result<Self> {
        let database = config
            .database(alias)
            .ok_or_else(|| DumpError::UnknownDatabase {
                alias: alias.to_string(),
            })?;
        let store = MemoryStore::open(Path::new(&database.path))?;
        Ok(Self::new(store))
    }
}

impl<S: ModelStore> DumpEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Seeds plus every record reachable within `max_depth` hops.
    ///
    /// The seeds count as the first hop: `max_depth` 0 returns the seeds
    /// alone and 1 adds their direct relations, so the closure is asked for
    /// `max_depth - 1` further hops.
    pub fn dump(&self, request: &DumpRequest) -> Result<Vec<Record>> {
        let resolved = self.resolve(request)?;
        self.collect_resolved(request, &resolved)
    }

    /// Serialize the collected records to `writer`; returns how many were written.
    pub fn write<W: Write>(&self, request: &DumpRequest, writer: W) -> Result<usize> {
        let resolved = self.resolve(request)?;
        let records = self.collect_resolved(request, &resolved)?;
        fkdump_codec::serialize(resolved.format, &records, request.indent, writer)?;
        Ok(records.len())
    }

    /// Build the relationship graph from the seeds and write one fixture per type.
    ///
    /// `max_depth` does not apply; the graph follows relations until nothing new
    /// turns up. Exclusions do apply.
    pub fn split<K: FixtureSink + ?Sized>(
        &self,
        request: &DumpRequest,
        sink: &mut K,
    ) -> Result<PersistReport> {
        let resolved = self.resolve(request)?;
        let seeds = self.seeds(&resolved)?;
        let graph = RelationshipGraph::discover_excluding(&self.store, seeds, &resolved.excluded)?;
        let indent = request.indent.or(Some(types::SPLIT_INDENT));
        Ok(graph.persist(resolved.format, indent, sink))
    }

    /// Resolve every name before any record is fetched.
    fn resolve(&self, request: &DumpRequest) -> Result<ResolvedRequest> {
        let mut excluded = HashSet::new();
        for name in &request.exclude {
            let label = ModelLabel::parse(name)?;
            self.store.describe(&label)?;
            excluded.insert(label);
        }

        let entity = self.store.describe(&ModelLabel::parse(&request.model)?)?;
        let format = FixtureFormat::parse(&request.format)?;
        let ids = request.ids.iter().map(String::as_str).map(PrimaryKey::parse).collect();

        Ok(ResolvedRequest {
            entity,
            excluded,
            format,
            ids,
        })
    }

    fn seeds(&self, resolved: &ResolvedRequest) -> Result<Vec<Record>> {
        let label = &resolved.entity.label;
        if resolved.entity.proxy {
            tracing::warn!(model = %label, "Proxy model has no rows of its own; nothing to dump");
            return Ok(Vec::new());
        }
        let seeds = if resolved.ids.is_empty() {
            self.store.fetch_all(label)?
        } else {
            self.store.fetch_by_keys(label, &resolved.ids)?
        };
        tracing::info!(model = %label, seeds = seeds.len(), "Collected seed records");
        Ok(seeds)
    }

    fn collect_resolved(
        &self,
        request: &DumpRequest,
        resolved: &ResolvedRequest,
    ) -> Result<Vec<Record>> {
        let mut records = self.seeds(resolved)?;
        let depth = i64::from(request.max_depth) - 1;
        let related =
            closure::collect_related(&self.store, &records, depth, &resolved.excluded)?;

        let mut extra: Vec<Record> = {
            let seeds: HashSet<&Record> = records.iter().collect();
            related
                .into_iter()
                .filter(|r| !seeds.contains(r))
                .collect()
        };
        extra.sort();
        tracing::info!(
            seeds = records.len(),
            related = extra.len(),
            max_depth = request.max_depth,
            "Collected related records"
        );
        records.extend(extra);
        Ok(records)
    }
}
