//! Shared test fixtures: a small shop schema and a call-counting store wrapper.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use serde_json::{json, Value};

use fkdump_core::{EntityType, FieldDescriptor, ModelLabel, PrimaryKey, Record};
use fkdump_store::store::Result;
use fkdump_store::{MemoryStore, ModelStore};

pub fn label(raw: &str) -> ModelLabel {
    ModelLabel::parse(raw).unwrap()
}

/// Fetch one record that must exist.
pub fn get<S: ModelStore>(store: &S, model: &str, pk: impl Into<PrimaryKey>) -> Record {
    store
        .fetch_by_keys(&label(model), &[pk.into()])
        .unwrap()
        .pop()
        .unwrap()
}

/// Shop schema:
///
/// - `shop.Order` → `customer` (FK), `coupon` (FK, always null), `tags` (M2M), `gifts` (M2M, always empty)
/// - `shop.Customer` → `address` (FK, nullable)
/// - `shop.Tag` → `category` (FK, nullable), `owner` (FK to Customer)
/// - `hr.Employee` → `manager` (FK to itself; 1 and 2 manage each other)
pub fn shop_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    let models = [
        EntityType::new("shop", "Address").with_field(FieldDescriptor::scalar("city")),
        EntityType::new("shop", "Customer")
            .with_field(FieldDescriptor::scalar("name"))
            .with_field(FieldDescriptor::foreign_key("address", label("shop.address"))),
        EntityType::new("shop", "Category").with_field(FieldDescriptor::scalar("name")),
        EntityType::new("shop", "Tag")
            .with_field(FieldDescriptor::scalar("name"))
            .with_field(FieldDescriptor::foreign_key("category", label("shop.category")))
            .with_field(FieldDescriptor::foreign_key("owner", label("shop.customer"))),
        EntityType::new("shop", "Coupon").with_field(FieldDescriptor::scalar("code")),
        EntityType::new("shop", "Gift").with_field(FieldDescriptor::scalar("name")),
        EntityType::new("shop", "Order")
            .with_field(FieldDescriptor::scalar("number"))
            .with_field(FieldDescriptor::foreign_key("customer", label("shop.customer")))
            .with_field(FieldDescriptor::foreign_key("coupon", label("shop.coupon")))
            .with_field(FieldDescriptor::many_to_many("tags", label("shop.tag")))
            .with_field(FieldDescriptor::many_to_many("gifts", label("shop.gift"))),
        EntityType::new("hr", "Employee")
            .with_field(FieldDescriptor::scalar("name"))
            .with_field(FieldDescriptor::foreign_key("manager", label("hr.employee"))),
    ];
    for model in models {
        store.register(model).unwrap();
    }

    let rows = [
        row("shop.address", 10, json!({"city": "Leeds"})),
        row("shop.customer", 5, json!({"name": "Ada", "address": 10})),
        row("shop.customer", 6, json!({"name": "Bob", "address": null})),
        row("shop.category", 100, json!({"name": "colour"})),
        row("shop.tag", "a", json!({"name": "A", "category": 100, "owner": 5})),
        row("shop.tag", "b", json!({"name": "B", "category": null, "owner": null})),
        row(
            "shop.order",
            1,
            json!({"number": "SO-1", "customer": 5, "coupon": null, "tags": ["a", "b"], "gifts": []}),
        ),
        row(
            "shop.order",
            2,
            json!({"number": "SO-2", "customer": 6, "coupon": null, "tags": [], "gifts": []}),
        ),
        row("hr.employee", 1, json!({"name": "Grace", "manager": 2})),
        row("hr.employee", 2, json!({"name": "Linus", "manager": 1})),
        row("hr.employee", 3, json!({"name": "Ken", "manager": 1})),
    ];
    for record in rows {
        store.insert(record).unwrap();
    }
    store
}

fn row(model: &str, pk: impl Into<PrimaryKey>, fields: Value) -> Record {
    let mut record = Record::new(label(model), pk);
    if let Value::Object(map) = fields {
        record.fields = map;
    }
    record
}

/// Wraps a store and counts calls per primitive.
pub struct CountingStore<S> {
    inner: S,
    describe: Cell<usize>,
    fetch_all: Cell<usize>,
    fetch_by_keys: Cell<usize>,
    fetch_related: Cell<usize>,
    fetched: RefCell<HashSet<ModelLabel>>,
}

impl<S: ModelStore> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            describe: Cell::new(0),
            fetch_all: Cell::new(0),
            fetch_by_keys: Cell::new(0),
            fetch_related: Cell::new(0),
            fetched: RefCell::new(HashSet::new()),
        }
    }

    pub fn reset(&self) {
        self.describe.set(0);
        self.fetch_all.set(0);
        self.fetch_by_keys.set(0);
        self.fetch_related.set(0);
        self.fetched.borrow_mut().clear();
    }

    pub fn fetch_by_keys_calls(&self) -> usize {
        self.fetch_by_keys.get()
    }

    pub fn fetch_related_calls(&self) -> usize {
        self.fetch_related.get()
    }

    pub fn total_calls(&self) -> usize {
        self.describe.get() + self.fetch_all.get() + self.fetch_by_keys.get() + self.fetch_related.get()
    }

    /// Every type a fetch asked for or returned.
    pub fn fetched_models(&self) -> HashSet<ModelLabel> {
        self.fetched.borrow().clone()
    }

    fn bump(counter: &Cell<usize>) {
        counter.set(counter.get() + 1);
    }
}

impl<S: ModelStore> ModelStore for CountingStore<S> {
    fn describe(&self, label: &ModelLabel) -> Result<EntityType> {
        Self::bump(&self.describe);
        self.inner.describe(label)
    }

    fn fetch_all(&self, label: &ModelLabel) -> Result<Vec<Record>> {
        Self::bump(&self.fetch_all);
        self.fetched.borrow_mut().insert(label.clone());
        self.inner.fetch_all(label)
    }

    fn fetch_by_keys(&self, label: &ModelLabel, keys: &[PrimaryKey]) -> Result<Vec<Record>> {
        Self::bump(&self.fetch_by_keys);
        self.fetched.borrow_mut().insert(label.clone());
        self.inner.fetch_by_keys(label, keys)
    }

    fn fetch_related(&self, record: &Record, field: &str) -> Result<Vec<Record>> {
        Self::bump(&self.fetch_related);
        let related = self.inner.fetch_related(record, field)?;
        self.fetched
            .borrow_mut()
            .extend(related.iter().map(|r| r.model.clone()));
        Ok(related)
    }
}
