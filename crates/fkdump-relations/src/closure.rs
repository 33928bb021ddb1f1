//! Depth-limited relation closure.
//!
//! Follows every foreign key and many-to-many field of the seed records,
//! then recurses on what it found with one less hop of budget. Each record's
//! foreign keys are resolved with their own fetch; nothing is batched across
//! records on this path.

use std::collections::{HashMap, HashSet};

use fkdump_core::{EntityType, ModelLabel, Record};
use fkdump_store::store::Result;
use fkdump_store::ModelStore;

/// Collect every record reachable from `seeds` within `max_depth` further hops.
///
/// Depth 0 still follows the seeds' own relations; each recursion lowers the
/// budget by one and a negative budget returns an empty set without touching
/// the store. The result is the union over all depths, not only the last
/// frontier. Records of a type in `excluded` are never fetched.
pub fn collect_related<'a, S, I>(
    store: &S,
    seeds: I,
    max_depth: i64,
    excluded: &HashSet<ModelLabel>,
) -> Result<HashSet<Record>>
where
    S: ModelStore + ?Sized,
    I: IntoIterator<Item = &'a Record>,
{
    let mut result = HashSet::new();
    if max_depth < 0 {
        return Ok(result);
    }

    let mut schema: HashMap<ModelLabel, EntityType> = HashMap::new();
    for record in seeds {
        if !schema.contains_key(&record.model) {
            let entity = store.describe(&record.model)?;
            schema.insert(record.model.clone(), entity);
        }
        let Some(entity) = schema.get(&record.model) else {
            continue;
        };

        for (field, target) in entity.foreign_keys() {
            if excluded.contains(target) {
                continue;
            }
            let Some(pk) = record.foreign_key(&field.name) else {
                continue;
            };
            let found = store.fetch_by_keys(target, std::slice::from_ref(&pk))?;
            if found.is_empty() {
                tracing::debug!(
                    model = %record.model,
                    pk = %record.pk,
                    field = %field.name,
                    target = %target,
                    "Dangling foreign key"
                );
            }
            result.extend(found);
        }

        for (field, target) in entity.many_to_many() {
            if excluded.contains(target) {
                continue;
            }
            result.extend(store.fetch_related(record, &field.name)?);
        }
    }

    if result.is_empty() {
        return Ok(result);
    }

    let deeper = collect_related(store, &result, max_depth - 1, excluded)?;
    result.extend(deeper);
    Ok(result)
}
