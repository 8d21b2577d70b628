use async_trait::async_trait;
use serde_json::Value;

use crate::entity::{Entity, PrimaryKey};
use crate::query::{
    Criteria, Direction, InCondition, Page, RawStatement, ReduceCondition, RefreshCondition, Row,
};

use super::Result;

/// The data-access collaborator: the system of record.
///
/// Result sequences are ordered; that order is what query caching preserves.
#[async_trait]
pub trait Store: Send + Sync {
    /// Gets an entity by its primary key.
    async fn get<T: Entity>(&self, id: &PrimaryKey) -> Result<Option<T>>;

    /// Lists entities matching every non-default field of `condition`.
    async fn list<T: Entity>(&self, condition: &T) -> Result<Vec<T>>;

    /// Lists entities matching structured criteria.
    async fn list_by_criteria<T: Entity>(&self, criteria: &Criteria) -> Result<Vec<T>>;

    /// Lists every entity of the type.
    async fn list_all<T: Entity>(&self) -> Result<Vec<T>>;

    /// Gets the first entity matching `condition` under the given ordering.
    async fn get_one<T: Entity>(
        &self,
        condition: &T,
        order_by: &str,
        direction: Direction,
    ) -> Result<Option<T>>;

    /// Runs a paginated query.
    async fn find<T: Entity>(&self, criteria: &Criteria) -> Result<Page<T>>;

    /// Inserts an entity and returns its (possibly generated) primary key.
    async fn create<T: Entity>(&self, entity: &T) -> Result<PrimaryKey>;

    /// Inserts several entities.
    async fn create_batch<T: Entity>(&self, entities: &[T]) -> Result<bool>;

    /// Updates an entity identified by its primary key.
    async fn refresh<T: Entity>(&self, entity: &T) -> Result<bool>;

    /// Applies a conditioned update.
    async fn refresh_by_condition<T: Entity>(&self, update: &RefreshCondition<T>) -> Result<bool>;

    /// Deletes an entity identified by its primary key.
    async fn remove<T: Entity>(&self, entity: &T) -> Result<bool>;

    /// Lists entities whose property is one of the condition's values.
    async fn list_in<T: Entity>(&self, condition: &InCondition) -> Result<Vec<T>>;

    /// Executes a raw statement on behalf of an entity.
    async fn execute<T: Entity>(&self, entity: &T, statement: &RawStatement) -> Result<bool>;

    /// Runs a raw statement returning loosely typed rows.
    async fn list_rows<T: Entity>(&self, statement: &RawStatement) -> Result<Vec<Row>>;

    /// Runs a result-mapped paginated query.
    async fn find_rows<T: Entity>(&self, criteria: &Criteria) -> Result<Page<Row>>;

    /// Runs a result-mapped query without pagination.
    async fn list_rows_by_criteria<T: Entity>(&self, criteria: &Criteria) -> Result<Vec<Row>>;

    /// Computes an aggregate.
    async fn reduce<T: Entity>(&self, reduce: &ReduceCondition) -> Result<Value>;
}
