use async_trait::async_trait;

use crate::alarm::{AlarmData, AlarmDataQuery};
use crate::error::QueryResult;
use crate::ids::{Caller, EntityId};
use crate::page::{EntityData, PageData};
use crate::query::{EntityCountQuery, EntityDataQuery};

/// Inbound entity query API. Controllers enforce role gating before calling;
/// the engine re-applies tenant/customer scoping to every plan regardless.
#[async_trait]
pub trait EntityQueryApi {
    async fn count_entities(&self, caller: &Caller, query: &EntityCountQuery) -> QueryResult<u64>;

    async fn find_entity_data(
        &self,
        caller: &Caller,
        query: &EntityDataQuery,
    ) -> QueryResult<PageData<EntityData>>;
}

/// Alarm search over an ordered collection of entity ids, typically the
/// output of an entity query.
#[async_trait]
pub trait AlarmQueryApi {
    async fn find_alarm_data(
        &self,
        caller: &Caller,
        query: &AlarmDataQuery,
        ordered_entity_ids: &[EntityId],
    ) -> QueryResult<PageData<AlarmData>>;
}
