use sea_orm_migration::prelude::Iden;

#[derive(Iden, Clone, Copy)]
pub enum Tenant {
    Table,
    Id,
    CreatedTime,
    Title,
    Region,
    AdditionalInfo,
}

#[derive(Iden, Clone, Copy)]
pub enum Customer {
    Table,
    Id,
    CreatedTime,
    TenantId,
    Title,
    Email,
    AdditionalInfo,
}

#[derive(Iden, Clone, Copy)]
pub enum TbUser {
    Table,
    Id,
    CreatedTime,
    TenantId,
    CustomerId,
    Email,
    FirstName,
    LastName,
    AdditionalInfo,
}

#[derive(Iden, Clone, Copy)]
pub enum Dashboard {
    Table,
    Id,
    CreatedTime,
    TenantId,
    Title,
    AssignedCustomers,
    AdditionalInfo,
}

#[derive(Iden, Clone, Copy)]
pub enum Asset {
    Table,
    Id,
    CreatedTime,
    TenantId,
    CustomerId,
    Name,
    Type,
    Label,
    AdditionalInfo,
}

#[derive(Iden, Clone, Copy)]
pub enum Device {
    Table,
    Id,
    CreatedTime,
    TenantId,
    CustomerId,
    Name,
    Type,
    Label,
    AdditionalInfo,
}

#[derive(Iden, Clone, Copy)]
pub enum EntityView {
    Table,
    Id,
    CreatedTime,
    TenantId,
    CustomerId,
    Name,
    Type,
    AdditionalInfo,
}

#[derive(Iden, Clone, Copy)]
pub enum Alarm {
    Table,
    Id,
    CreatedTime,
    TenantId,
    OriginatorId,
    OriginatorType,
    Type,
    Severity,
    Status,
    StartTs,
    EndTs,
    AckTs,
    ClearTs,
    Propagate,
    PropagateRelationTypes,
    AdditionalInfo,
}

#[derive(Iden, Clone, Copy)]
pub enum Relation {
    Table,
    FromId,
    FromType,
    ToId,
    ToType,
    RelationTypeGroup,
    RelationType,
    AdditionalInfo,
}

#[derive(Iden, Clone, Copy)]
pub enum AttributeKv {
    Table,
    EntityType,
    EntityId,
    AttributeType,
    AttributeKey,
    BoolV,
    StrV,
    LongV,
    DblV,
    JsonV,
    LastUpdateTs,
}

#[derive(Iden, Clone, Copy)]
pub enum TsKvDictionary {
    Table,
    Key,
    KeyId,
}

#[derive(Iden, Clone, Copy)]
pub enum TsKvLatest {
    Table,
    EntityId,
    KeyId,
    Ts,
    BoolV,
    StrV,
    LongV,
    DblV,
    JsonV,
}
