use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use repocache_core::entity::{Entity, EntityDescriptor, KeyKind, MetadataCatalog, PrimaryKey};
use repocache_core::query::{
    Criteria, Direction, InCondition, Page, Pagination, RawStatement, ReduceCondition,
    RefreshCondition, Row, Sort,
};
use repocache_core::storage::{Result, Store, StoreError};

use super::matching::{
    example_fields, matches_all, matches_example, merge, project, reduce, sort_rows, values_equal,
};

#[derive(Debug, Clone, Default)]
struct Table {
    rows: BTreeMap<PrimaryKey, Value>,
    last_id: i64,
}

impl Table {
    fn insert<T: Entity>(
        &mut self,
        descriptor: &EntityDescriptor<T>,
        entity: &T,
    ) -> Result<PrimaryKey> {
        let key = match descriptor
            .primary_key(entity)
            .filter(|key| !key.is_unassigned())
        {
            Some(key) => key,
            None => match descriptor.key_kind {
                KeyKind::Integral => PrimaryKey::Integral(self.last_id + 1),
                KeyKind::Text => PrimaryKey::Text(Uuid::new_v4().to_string()),
            },
        };

        if self.rows.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                entity_type: descriptor.type_name,
                id: key.to_string(),
            });
        }

        let mut stored = entity.clone();
        descriptor.set_primary_key(&mut stored, key.clone());
        let row = encode(&stored)?;

        if let PrimaryKey::Integral(id) = key {
            self.last_id = self.last_id.max(id);
        }
        self.rows.insert(key.clone(), row);
        Ok(key)
    }
}

/// In-memory store for testing and development.
///
/// Every entity type gets its own table of JSON rows ordered by primary key,
/// so unsorted queries return rows in key order. Integral keys left at zero
/// are generated from a per-table sequence; empty text keys get a UUID v4.
///
/// Raw statements are not supported: [`execute`](Store::execute) and
/// [`list_rows`](Store::list_rows) return [`StoreError::Unsupported`].
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    catalog: Arc<MetadataCatalog>,
    tables: Arc<RwLock<HashMap<&'static str, Table>>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(Arc::new(MetadataCatalog::new()))
    }
}

impl InMemoryStore {
    /// Creates an empty store resolving entity metadata from `catalog`.
    pub fn new(catalog: Arc<MetadataCatalog>) -> Self {
        Self {
            catalog,
            tables: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the number of stored rows of type `T`.
    pub async fn count<T: Entity>(&self) -> usize {
        let descriptor = self.catalog.resolve::<T>();
        let tables = self.tables.read().await;
        tables
            .get(descriptor.type_name)
            .map(|table| table.rows.len())
            .unwrap_or(0)
    }

    /// Snapshot of every row of type `T`, in key order.
    async fn rows_of<T: Entity>(&self) -> Vec<Value> {
        let descriptor = self.catalog.resolve::<T>();
        let tables = self.tables.read().await;
        tables
            .get(descriptor.type_name)
            .map(|table| table.rows.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Filters and sorts rows by criteria, without paginating.
    async fn select<T: Entity>(&self, criteria: &Criteria) -> Vec<Value> {
        let mut rows: Vec<Value> = self
            .rows_of::<T>()
            .await
            .into_iter()
            .filter(|row| matches_all(row, &criteria.predicates))
            .collect();
        sort_rows(&mut rows, &criteria.sorts);
        rows
    }
}

fn encode<T: Entity>(entity: &T) -> Result<Value> {
    serde_json::to_value(entity).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode<T: Entity>(row: Value) -> Result<T> {
    serde_json::from_value(row).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode_all<T: Entity>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter().map(decode).collect()
}

fn required_key<T>(descriptor: &EntityDescriptor<T>, entity: &T) -> Result<PrimaryKey> {
    descriptor
        .primary_key(entity)
        .filter(|key| !key.is_unassigned())
        .ok_or_else(|| {
            StoreError::InvalidData(format!(
                "{} has no {} value",
                descriptor.type_name, descriptor.key_field
            ))
        })
}

/// Applies an optional offset/size window, returning the effective window.
fn paginate(rows: Vec<Value>, pagination: Option<Pagination>) -> (u64, u64, Vec<Value>) {
    match pagination {
        Some(Pagination { offset, size }) => {
            let window = rows
                .into_iter()
                .skip(offset as usize)
                .take(size as usize)
                .collect();
            (offset, size, window)
        }
        None => {
            let size = rows.len() as u64;
            (0, size, rows)
        }
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get<T: Entity>(&self, id: &PrimaryKey) -> Result<Option<T>> {
        let descriptor = self.catalog.resolve::<T>();
        let row = {
            let tables = self.tables.read().await;
            tables
                .get(descriptor.type_name)
                .and_then(|table| table.rows.get(id))
                .cloned()
        };
        row.map(decode).transpose()
    }

    async fn list<T: Entity>(&self, condition: &T) -> Result<Vec<T>> {
        let fields = example_fields(&encode(condition)?);
        let rows = self
            .rows_of::<T>()
            .await
            .into_iter()
            .filter(|row| matches_example(row, &fields))
            .collect();
        decode_all(rows)
    }

    async fn list_by_criteria<T: Entity>(&self, criteria: &Criteria) -> Result<Vec<T>> {
        let rows = self.select::<T>(criteria).await;
        let (_, _, window) = paginate(rows, criteria.pagination);
        decode_all(window)
    }

    async fn list_all<T: Entity>(&self) -> Result<Vec<T>> {
        decode_all(self.rows_of::<T>().await)
    }

    async fn get_one<T: Entity>(
        &self,
        condition: &T,
        order_by: &str,
        direction: Direction,
    ) -> Result<Option<T>> {
        let fields = example_fields(&encode(condition)?);
        let mut rows: Vec<Value> = self
            .rows_of::<T>()
            .await
            .into_iter()
            .filter(|row| matches_example(row, &fields))
            .collect();
        if !order_by.is_empty() {
            sort_rows(
                &mut rows,
                &[Sort {
                    property: order_by.to_string(),
                    direction,
                }],
            );
        }
        rows.into_iter().next().map(decode).transpose()
    }

    async fn find<T: Entity>(&self, criteria: &Criteria) -> Result<Page<T>> {
        let rows = self.select::<T>(criteria).await;
        let total = rows.len() as u64;
        let (offset, size, window) = paginate(rows, criteria.pagination);
        Ok(Page::new(offset, size, total, decode_all(window)?))
    }

    async fn create<T: Entity>(&self, entity: &T) -> Result<PrimaryKey> {
        let descriptor = self.catalog.resolve::<T>();
        let mut tables = self.tables.write().await;
        tables
            .entry(descriptor.type_name)
            .or_default()
            .insert(&descriptor, entity)
    }

    async fn create_batch<T: Entity>(&self, entities: &[T]) -> Result<bool> {
        if entities.is_empty() {
            return Ok(false);
        }
        let descriptor = self.catalog.resolve::<T>();
        let mut tables = self.tables.write().await;
        let table = tables.entry(descriptor.type_name).or_default();

        // All or nothing: a failed insert leaves the table untouched.
        let mut staged = table.clone();
        for entity in entities {
            staged.insert(&descriptor, entity)?;
        }
        *table = staged;
        Ok(true)
    }

    async fn refresh<T: Entity>(&self, entity: &T) -> Result<bool> {
        let descriptor = self.catalog.resolve::<T>();
        let key = required_key(&descriptor, entity)?;
        let updates = example_fields(&encode(entity)?);

        let mut tables = self.tables.write().await;
        match tables
            .get_mut(descriptor.type_name)
            .and_then(|table| table.rows.get_mut(&key))
        {
            Some(row) => {
                merge(row, updates);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn refresh_by_condition<T: Entity>(&self, update: &RefreshCondition<T>) -> Result<bool> {
        let descriptor = self.catalog.resolve::<T>();
        let target = update
            .target
            .as_ref()
            .map(|target| required_key(&descriptor, target))
            .transpose()?;

        let mut tables = self.tables.write().await;
        let Some(table) = tables.get_mut(descriptor.type_name) else {
            return Ok(false);
        };

        let mut touched = 0usize;
        for (key, row) in table.rows.iter_mut() {
            if target.as_ref().is_some_and(|target| target != key) {
                continue;
            }
            if matches_all(row, &update.filter) {
                merge(row, update.updates.clone());
                touched += 1;
            }
        }
        Ok(touched > 0)
    }

    async fn remove<T: Entity>(&self, entity: &T) -> Result<bool> {
        let descriptor = self.catalog.resolve::<T>();
        let key = required_key(&descriptor, entity)?;
        let mut tables = self.tables.write().await;
        Ok(tables
            .get_mut(descriptor.type_name)
            .and_then(|table| table.rows.remove(&key))
            .is_some())
    }

    async fn list_in<T: Entity>(&self, condition: &InCondition) -> Result<Vec<T>> {
        let rows = self
            .rows_of::<T>()
            .await
            .into_iter()
            .filter(|row| {
                row.get(&condition.property).is_some_and(|actual| {
                    condition
                        .values
                        .iter()
                        .any(|candidate| values_equal(actual, candidate))
                })
            })
            .collect();
        decode_all(rows)
    }

    async fn execute<T: Entity>(&self, _entity: &T, _statement: &RawStatement) -> Result<bool> {
        Err(StoreError::Unsupported(
            "raw statements are not supported by the in-memory store".to_string(),
        ))
    }

    async fn list_rows<T: Entity>(&self, _statement: &RawStatement) -> Result<Vec<Row>> {
        Err(StoreError::Unsupported(
            "raw statements are not supported by the in-memory store".to_string(),
        ))
    }

    async fn find_rows<T: Entity>(&self, criteria: &Criteria) -> Result<Page<Row>> {
        let rows = self.select::<T>(criteria).await;
        let total = rows.len() as u64;
        let (offset, size, window) = paginate(rows, criteria.pagination);
        let items = window
            .iter()
            .map(|row| project(row, &criteria.columns))
            .collect();
        Ok(Page::new(offset, size, total, items))
    }

    async fn list_rows_by_criteria<T: Entity>(&self, criteria: &Criteria) -> Result<Vec<Row>> {
        let rows = self.select::<T>(criteria).await;
        let (_, _, window) = paginate(rows, criteria.pagination);
        Ok(window
            .iter()
            .map(|row| project(row, &criteria.columns))
            .collect())
    }

    async fn reduce<T: Entity>(&self, condition: &ReduceCondition) -> Result<Value> {
        let rows = self.rows_of::<T>().await;
        let matching: Vec<&Value> = rows
            .iter()
            .filter(|row| matches_all(row, &condition.filter))
            .collect();
        Ok(reduce(&matching, condition))
    }
}
