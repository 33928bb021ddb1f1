//! Level-by-level relationship graph builder.
//!
//! Starting from a homogeneous seed collection, discovers every foreign-key
//! and many-to-many connection one level at a time and records each as a
//! [`RelationshipEdge`]. Foreign keys are fetched in one batch per field
//! across all records of an edge. Records already seen on an earlier edge are
//! not reported again, so every level only carries new records and cyclic
//! schemas terminate once the reachable set is exhausted.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Serialize;

use fkdump_codec::FixtureFormat;
use fkdump_core::{EntityType, FieldDescriptor, ModelLabel, PrimaryKey, Record};
use fkdump_store::ModelStore;

use crate::error::{DumpError, Result};
use crate::sink::FixtureSink;
use crate::types::{PersistFailure, PersistReport, WrittenFixture};

/// How an edge's records relate to its parent type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Root,
    ForeignKey,
    ManyToMany,
}

/// One discovered relationship and the records found through it.
#[derive(Debug, Clone)]
pub struct RelationshipEdge {
    /// Field on the parent type; `None` for the root edge.
    pub relating_field: Option<String>,
    pub child_type_name: String,
    pub child_type: ModelLabel,
    /// `None` for the root edge.
    pub parent_type_name: Option<String>,
    pub kind: RelationKind,
    /// Records of `child_type` first discovered through this edge.
    pub related_records: Vec<Record>,
}

impl RelationshipEdge {
    fn root(entity: &EntityType, seeds: Vec<Record>) -> Self {
        Self {
            relating_field: None,
            child_type_name: entity.object_name.clone(),
            child_type: entity.label.clone(),
            parent_type_name: None,
            kind: RelationKind::Root,
            related_records: seeds,
        }
    }

    /// Whether the next level should expand this edge.
    pub fn is_frontier(&self) -> bool {
        !self.related_records.is_empty()
    }
}

/// The levels discovered from one seed collection. Level 0 holds the root edge.
#[derive(Debug, Clone)]
pub struct RelationshipGraph {
    root: ModelLabel,
    levels: Vec<Vec<RelationshipEdge>>,
}

impl RelationshipGraph {
    /// Traverse every relation reachable from `seeds`.
    pub fn discover<S: ModelStore + ?Sized>(store: &S, seeds: Vec<Record>) -> Result<Self> {
        Self::discover_excluding(store, seeds, &HashSet::new())
    }

    /// Traverse from `seeds`, never following relations into `excluded` types.
    ///
    /// Fails before touching the store when `seeds` is empty or mixes types.
    pub fn discover_excluding<S: ModelStore + ?Sized>(
        store: &S,
        seeds: Vec<Record>,
        excluded: &HashSet<ModelLabel>,
    ) -> Result<Self> {
        let root = check_homogeneous(&seeds)?;

        let mut walker = Walker {
            store,
            excluded,
            schema: HashMap::new(),
            visited: HashSet::new(),
        };
        let entity = walker.entity(&root)?;
        let seeds = walker.fresh(seeds);
        let mut levels = vec![vec![RelationshipEdge::root(&entity, seeds)]];

        loop {
            let next = match levels.last() {
                Some(level) if level.iter().any(RelationshipEdge::is_frontier) => {
                    walker.expand(level)?
                }
                _ => break,
            };
            tracing::debug!(
                level = levels.len(),
                edges = next.len(),
                frontier = next.iter().filter(|e| e.is_frontier()).count(),
                "Discovered relationship level"
            );
            levels.push(next);
        }

        tracing::info!(
            root = %root,
            levels = levels.len(),
            records = walker.visited.len(),
            "Relationship graph complete"
        );
        Ok(Self { root, levels })
    }

    pub fn root_type(&self) -> &ModelLabel {
        &self.root
    }

    pub fn levels(&self) -> &[Vec<RelationshipEdge>] {
        &self.levels
    }

    pub fn edges(&self) -> impl Iterator<Item = &RelationshipEdge> {
        self.levels.iter().flatten()
    }

    /// Every discovered record grouped by type, each record once.
    pub fn output_groups(&self) -> BTreeMap<ModelLabel, BTreeSet<&Record>> {
        let mut groups: BTreeMap<ModelLabel, BTreeSet<&Record>> = BTreeMap::new();
        for edge in self.edges().filter(|e| e.is_frontier()) {
            groups
                .entry(edge.child_type.clone())
                .or_default()
                .extend(edge.related_records.iter());
        }
        groups
    }

    pub fn record_count(&self) -> usize {
        self.output_groups().values().map(BTreeSet::len).sum()
    }

    /// Serialize each output group and hand it to `sink`.
    ///
    /// The first failed group is logged and recorded in the report and ends
    /// the run; groups after it are not written. Traversal results stay valid
    /// either way, so this does not return an error.
    pub fn persist<K: FixtureSink + ?Sized>(
        &self,
        format: FixtureFormat,
        indent: Option<usize>,
        sink: &mut K,
    ) -> PersistReport {
        let mut report = PersistReport::default();

        for (model, records) in self.output_groups() {
            let name = fixture_file_name(&model, format);
            let records: Vec<Record> = records.into_iter().cloned().collect();
            tracing::info!("Creating fixture for {model} with {} items", records.len());

            let outcome = fkdump_codec::to_bytes(format, &records, indent)
                .map_err(|e| e.to_string())
                .and_then(|bytes| sink.write_fixture(&name, &bytes).map_err(|e| e.to_string()));

            match outcome {
                Ok(()) => report.written.push(WrittenFixture {
                    model,
                    name,
                    records: records.len(),
                }),
                Err(reason) => {
                    tracing::error!(
                        fixture = %name,
                        error = %reason,
                        "Failed to write fixture; skipping remaining types"
                    );
                    report.failure = Some(PersistFailure {
                        model,
                        name,
                        reason,
                    });
                    break;
                }
            }
        }

        report
    }
}

/// `shop.order` + json → `shop.order_fixture.json`.
pub fn fixture_file_name(model: &ModelLabel, format: FixtureFormat) -> String {
    format!("{model}_fixture.{}", format.extension())
}

fn check_homogeneous(seeds: &[Record]) -> Result<ModelLabel> {
    let first = seeds.first().ok_or(DumpError::EmptySeed)?;
    if let Some(other) = seeds.iter().find(|r| r.model != first.model) {
        return Err(DumpError::MixedSeed {
            expected: first.model.to_string(),
            found: other.model.to_string(),
        });
    }
    Ok(first.model.clone())
}

/// Traversal state shared across levels.
struct Walker<'a, S: ?Sized> {
    store: &'a S,
    excluded: &'a HashSet<ModelLabel>,
    schema: HashMap<ModelLabel, EntityType>,
    visited: HashSet<Record>,
}

impl<S: ModelStore + ?Sized> Walker<'_, S> {
    fn entity(&mut self, label: &ModelLabel) -> Result<EntityType> {
        if let Some(entity) = self.schema.get(label) {
            return Ok(entity.clone());
        }
        let entity = self.store.describe(label)?;
        self.schema.insert(label.clone(), entity.clone());
        Ok(entity)
    }

    /// Keep only records not seen before, marking them seen.
    fn fresh(&mut self, records: Vec<Record>) -> Vec<Record> {
        records
            .into_iter()
            .filter(|r| self.visited.insert(r.clone()))
            .collect()
    }

    fn expand(&mut self, level: &[RelationshipEdge]) -> Result<Vec<RelationshipEdge>> {
        let mut next = Vec::new();

        for edge in level.iter().filter(|e| e.is_frontier()) {
            let parent = self.entity(&edge.child_type)?;

            for (field, target) in parent.foreign_keys() {
                if self.excluded.contains(target) {
                    continue;
                }
                let mut seen = HashSet::new();
                let keys: Vec<PrimaryKey> = edge
                    .related_records
                    .iter()
                    .filter_map(|r| r.foreign_key(&field.name))
                    .filter(|pk| seen.insert(pk.clone()))
                    .collect();
                let fetched = if keys.is_empty() {
                    Vec::new()
                } else {
                    self.store.fetch_by_keys(target, &keys)?
                };
                next.push(self.child_edge(&parent, field, target, RelationKind::ForeignKey, fetched)?);
            }

            for (field, target) in parent.many_to_many() {
                if self.excluded.contains(target) {
                    continue;
                }
                let mut seen = HashSet::new();
                let mut related = Vec::new();
                for record in &edge.related_records {
                    for child in self.store.fetch_related(record, &field.name)? {
                        if seen.insert(child.clone()) {
                            related.push(child);
                        }
                    }
                }
                next.push(self.child_edge(&parent, field, target, RelationKind::ManyToMany, related)?);
            }
        }

        Ok(next)
    }

    fn child_edge(
        &mut self,
        parent: &EntityType,
        field: &FieldDescriptor,
        target: &ModelLabel,
        kind: RelationKind,
        records: Vec<Record>,
    ) -> Result<RelationshipEdge> {
        let child = self.entity(target)?;
        debug_assert!(records.iter().all(|r| &r.model == target));
        Ok(RelationshipEdge {
            relating_field: Some(field.name.clone()),
            child_type_name: child.object_name,
            child_type: child.label,
            parent_type_name: Some(parent.object_name.clone()),
            kind,
            related_records: self.fresh(records),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use crate::testing::{self, CountingStore};
    use std::io;

    fn group_pks(graph: &RelationshipGraph) -> BTreeMap<String, Vec<String>> {
        graph
            .output_groups()
            .into_iter()
            .map(|(label, records)| {
                (
                    label.to_string(),
                    records.iter().map(|r| r.pk.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_rejects_empty_seed() {
        let store = CountingStore::new(testing::shop_store());
        let err = RelationshipGraph::discover(&store, Vec::new()).unwrap_err();
        assert!(matches!(err, DumpError::EmptySeed));
        assert_eq!(store.total_calls(), 0);
    }

    #[test]
    fn test_rejects_mixed_seed() {
        let store = CountingStore::new(testing::shop_store());
        let seeds = vec![
            testing::get(&store, "shop.order", 1),
            testing::get(&store, "shop.tag", "a"),
        ];
        store.reset();
        let err = RelationshipGraph::discover(&store, seeds).unwrap_err();
        assert!(
            matches!(err, DumpError::MixedSeed { expected, found } if expected == "shop.order" && found == "shop.tag")
        );
        assert_eq!(store.total_calls(), 0);
    }

    #[test]
    fn test_levels_and_groups_for_orders() {
        let store = testing::shop_store();
        let seeds = store.fetch_all(&testing::label("shop.order")).unwrap();
        let graph = RelationshipGraph::discover(&store, seeds).unwrap();

        let root = &graph.levels()[0];
        assert_eq!(root.len(), 1);
        assert_eq!(root[0].kind, RelationKind::Root);
        assert_eq!(root[0].relating_field, None);
        assert_eq!(root[0].parent_type_name, None);
        assert_eq!(root[0].child_type_name, "Order");
        assert_eq!(graph.root_type(), &testing::label("shop.order"));

        // customer, coupon, tags, gifts
        let first = &graph.levels()[1];
        let shape: Vec<_> = first
            .iter()
            .map(|e| (e.relating_field.as_deref().unwrap(), e.kind, e.related_records.len()))
            .collect();
        assert_eq!(
            shape,
            vec![
                ("customer", RelationKind::ForeignKey, 2),
                ("coupon", RelationKind::ForeignKey, 0),
                ("tags", RelationKind::ManyToMany, 2),
                ("gifts", RelationKind::ManyToMany, 0),
            ]
        );
        assert!(first.iter().all(|e| e.parent_type_name.as_deref() == Some("Order")));

        let groups = group_pks(&graph);
        assert_eq!(groups.len(), 5);
        assert_eq!(groups["shop.order"], vec!["1", "2"]);
        assert_eq!(groups["shop.customer"], vec!["5", "6"]);
        assert_eq!(groups["shop.tag"], vec!["a", "b"]);
        assert_eq!(groups["shop.address"], vec!["10"]);
        assert_eq!(groups["shop.category"], vec!["100"]);
        assert_eq!(graph.record_count(), 8);
    }

    #[test]
    fn test_foreign_keys_fetched_in_one_batch_per_field() {
        let store = CountingStore::new(testing::shop_store());
        let seeds = store.fetch_all(&testing::label("shop.order")).unwrap();
        store.reset();

        RelationshipGraph::discover(&store, seeds).unwrap();
        // level 1: customer (coupon is all-null, skipped);
        // level 2: address; category; owner (tag a only).
        assert_eq!(store.fetch_by_keys_calls(), 4);
        // level 1: tags and gifts for each of two orders.
        assert_eq!(store.fetch_related_calls(), 4);
    }

    #[test]
    fn test_record_reached_by_two_paths_appears_once() {
        let store = testing::shop_store();
        let order = testing::get(&store, "shop.order", 1);
        let graph = RelationshipGraph::discover(&store, vec![order]).unwrap();

        // Customer 5 is reached through Order.customer and again through Tag.owner.
        let owner_edge = graph
            .edges()
            .find(|e| e.relating_field.as_deref() == Some("owner"))
            .unwrap();
        assert!(owner_edge.related_records.is_empty());
        assert_eq!(group_pks(&graph)["shop.customer"], vec!["5"]);
    }

    #[test]
    fn test_cyclic_foreign_keys_terminate() {
        let store = testing::shop_store();
        let seed = testing::get(&store, "hr.employee", 3);
        let graph = RelationshipGraph::discover(&store, vec![seed]).unwrap();

        // 3 → 1 → 2 → (1 again: nothing new)
        assert_eq!(graph.levels().len(), 4);
        assert!(!graph.levels()[3].iter().any(RelationshipEdge::is_frontier));
        assert_eq!(group_pks(&graph)["hr.employee"], vec!["1", "2", "3"]);
    }

    #[test]
    fn test_empty_many_to_many_edge_is_not_followed() {
        let store = testing::shop_store();
        let order = testing::get(&store, "shop.order", 2);
        let graph = RelationshipGraph::discover(&store, vec![order]).unwrap();

        let tags = graph.levels()[1]
            .iter()
            .find(|e| e.relating_field.as_deref() == Some("tags"))
            .unwrap();
        assert_eq!(tags.kind, RelationKind::ManyToMany);
        assert!(tags.related_records.is_empty());
        assert!(!tags.is_frontier());

        assert!(graph
            .edges()
            .all(|e| e.parent_type_name.as_deref() != Some("Tag")));
        assert!(!graph.output_groups().contains_key(&testing::label("shop.tag")));
    }

    #[test]
    fn test_discover_excluding_skips_type() {
        let store = CountingStore::new(testing::shop_store());
        let seeds = store.fetch_all(&testing::label("shop.order")).unwrap();
        let customer = testing::label("shop.customer");
        let excluded: HashSet<_> = [customer.clone()].into_iter().collect();
        store.reset();

        let graph = RelationshipGraph::discover_excluding(&store, seeds, &excluded).unwrap();
        assert!(graph.edges().all(|e| e.child_type != customer));
        assert!(!store.fetched_models().contains(&customer));
        let groups = group_pks(&graph);
        assert!(!groups.contains_key("shop.address"));
        assert_eq!(groups["shop.category"], vec!["100"]);
    }

    #[test]
    fn test_persist_writes_one_fixture_per_type() {
        let store = testing::shop_store();
        let seeds = store.fetch_all(&testing::label("shop.order")).unwrap();
        let graph = RelationshipGraph::discover(&store, seeds).unwrap();

        let mut sink = MemorySink::new();
        let report = graph.persist(FixtureFormat::Json, Some(2), &mut sink);
        assert!(report.is_complete());
        assert_eq!(report.written.len(), 5);
        assert_eq!(
            sink.names().collect::<Vec<_>>(),
            vec![
                "shop.address_fixture.json",
                "shop.category_fixture.json",
                "shop.customer_fixture.json",
                "shop.order_fixture.json",
                "shop.tag_fixture.json",
            ]
        );

        let tags: Vec<Record> =
            serde_json::from_slice(sink.get("shop.tag_fixture.json").unwrap()).unwrap();
        assert_eq!(tags.len(), 2);
        assert!(tags.iter().all(|t| t.model == testing::label("shop.tag")));
    }

    struct FailAfter {
        remaining: usize,
        attempts: usize,
    }

    impl FixtureSink for FailAfter {
        fn write_fixture(&mut self, _name: &str, _contents: &[u8]) -> io::Result<()> {
            self.attempts += 1;
            if self.remaining == 0 {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
            }
            self.remaining -= 1;
            Ok(())
        }
    }

    #[test]
    fn test_persist_stops_at_first_failure() {
        let store = testing::shop_store();
        let seeds = store.fetch_all(&testing::label("shop.order")).unwrap();
        let graph = RelationshipGraph::discover(&store, seeds).unwrap();

        let mut sink = FailAfter {
            remaining: 1,
            attempts: 0,
        };
        let report = graph.persist(FixtureFormat::Xml, None, &mut sink);

        assert_eq!(report.written.len(), 1);
        let failure = report.failure.unwrap();
        assert_eq!(failure.name, "shop.category_fixture.xml");
        assert!(failure.reason.contains("read-only"));
        assert_eq!(sink.attempts, 2);
    }

    #[test]
    fn test_fixture_file_name() {
        assert_eq!(
            fixture_file_name(&testing::label("Shop.OrderLine"), FixtureFormat::Yaml),
            "shop.orderline_fixture.yaml"
        );
    }
}
