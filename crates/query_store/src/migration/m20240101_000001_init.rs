use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

use crate::db::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn id_col(backend: DatabaseBackend, col: impl Iden + 'static, nullable: bool) -> ColumnDef {
    let mut col_def = ColumnDef::new(col);
    match backend {
        DatabaseBackend::Postgres => {
            col_def.uuid();
        }
        _ => {
            col_def.string_len(36);
        }
    }
    if nullable {
        col_def.null();
    } else {
        col_def.not_null();
    }
    col_def.to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();

        manager
            .create_table(
                Table::create()
                    .table(Tenant::Table)
                    .if_not_exists()
                    .col(id_col(backend, Tenant::Id, false))
                    .col(ColumnDef::new(Tenant::CreatedTime).big_integer().not_null())
                    .col(ColumnDef::new(Tenant::Title).string().not_null())
                    .col(ColumnDef::new(Tenant::Region).string())
                    .col(ColumnDef::new(Tenant::AdditionalInfo).text())
                    .primary_key(Index::create().name("pk_tenant").col(Tenant::Id))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Customer::Table)
                    .if_not_exists()
                    .col(id_col(backend, Customer::Id, false))
                    .col(
                        ColumnDef::new(Customer::CreatedTime)
                            .big_integer()
                            .not_null(),
                    )
                    .col(id_col(backend, Customer::TenantId, false))
                    .col(ColumnDef::new(Customer::Title).string().not_null())
                    .col(ColumnDef::new(Customer::Email).string())
                    .col(ColumnDef::new(Customer::AdditionalInfo).text())
                    .primary_key(Index::create().name("pk_customer").col(Customer::Id))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TbUser::Table)
                    .if_not_exists()
                    .col(id_col(backend, TbUser::Id, false))
                    .col(ColumnDef::new(TbUser::CreatedTime).big_integer().not_null())
                    .col(id_col(backend, TbUser::TenantId, false))
                    .col(id_col(backend, TbUser::CustomerId, true))
                    .col(ColumnDef::new(TbUser::Email).string().not_null())
                    .col(ColumnDef::new(TbUser::FirstName).string())
                    .col(ColumnDef::new(TbUser::LastName).string())
                    .col(ColumnDef::new(TbUser::AdditionalInfo).text())
                    .primary_key(Index::create().name("pk_tb_user").col(TbUser::Id))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Dashboard::Table)
                    .if_not_exists()
                    .col(id_col(backend, Dashboard::Id, false))
                    .col(
                        ColumnDef::new(Dashboard::CreatedTime)
                            .big_integer()
                            .not_null(),
                    )
                    .col(id_col(backend, Dashboard::TenantId, false))
                    .col(ColumnDef::new(Dashboard::Title).string().not_null())
                    .col(ColumnDef::new(Dashboard::AssignedCustomers).text())
                    .col(ColumnDef::new(Dashboard::AdditionalInfo).text())
                    .primary_key(Index::create().name("pk_dashboard").col(Dashboard::Id))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Asset::Table)
                    .if_not_exists()
                    .col(id_col(backend, Asset::Id, false))
                    .col(ColumnDef::new(Asset::CreatedTime).big_integer().not_null())
                    .col(id_col(backend, Asset::TenantId, false))
                    .col(id_col(backend, Asset::CustomerId, true))
                    .col(ColumnDef::new(Asset::Name).string().not_null())
                    .col(ColumnDef::new(Asset::Type).string().not_null())
                    .col(ColumnDef::new(Asset::Label).string())
                    .col(ColumnDef::new(Asset::AdditionalInfo).text())
                    .primary_key(Index::create().name("pk_asset").col(Asset::Id))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_asset_tenant_type")
                    .table(Asset::Table)
                    .col(Asset::TenantId)
                    .col(Asset::Type)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Device::Table)
                    .if_not_exists()
                    .col(id_col(backend, Device::Id, false))
                    .col(ColumnDef::new(Device::CreatedTime).big_integer().not_null())
                    .col(id_col(backend, Device::TenantId, false))
                    .col(id_col(backend, Device::CustomerId, true))
                    .col(ColumnDef::new(Device::Name).string().not_null())
                    .col(ColumnDef::new(Device::Type).string().not_null())
                    .col(ColumnDef::new(Device::Label).string())
                    .col(ColumnDef::new(Device::AdditionalInfo).text())
                    .primary_key(Index::create().name("pk_device").col(Device::Id))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_device_tenant_type")
                    .table(Device::Table)
                    .col(Device::TenantId)
                    .col(Device::Type)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EntityView::Table)
                    .if_not_exists()
                    .col(id_col(backend, EntityView::Id, false))
                    .col(
                        ColumnDef::new(EntityView::CreatedTime)
                            .big_integer()
                            .not_null(),
                    )
                    .col(id_col(backend, EntityView::TenantId, false))
                    .col(id_col(backend, EntityView::CustomerId, true))
                    .col(ColumnDef::new(EntityView::Name).string().not_null())
                    .col(ColumnDef::new(EntityView::Type).string().not_null())
                    .col(ColumnDef::new(EntityView::AdditionalInfo).text())
                    .primary_key(Index::create().name("pk_entity_view").col(EntityView::Id))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Alarm::Table)
                    .if_not_exists()
                    .col(id_col(backend, Alarm::Id, false))
                    .col(ColumnDef::new(Alarm::CreatedTime).big_integer().not_null())
                    .col(id_col(backend, Alarm::TenantId, false))
                    .col(id_col(backend, Alarm::OriginatorId, false))
                    .col(
                        ColumnDef::new(Alarm::OriginatorType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Alarm::Type).string().not_null())
                    .col(ColumnDef::new(Alarm::Severity).string_len(32).not_null())
                    .col(ColumnDef::new(Alarm::Status).string_len(32).not_null())
                    .col(ColumnDef::new(Alarm::StartTs).big_integer().not_null())
                    .col(ColumnDef::new(Alarm::EndTs).big_integer().not_null())
                    .col(ColumnDef::new(Alarm::AckTs).big_integer().not_null())
                    .col(ColumnDef::new(Alarm::ClearTs).big_integer().not_null())
                    .col(
                        ColumnDef::new(Alarm::Propagate)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Alarm::PropagateRelationTypes).text())
                    .col(ColumnDef::new(Alarm::AdditionalInfo).text())
                    .primary_key(Index::create().name("pk_alarm").col(Alarm::Id))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_alarm_originator_created")
                    .table(Alarm::Table)
                    .col(Alarm::OriginatorId)
                    .col(Alarm::CreatedTime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Relation::Table)
                    .if_not_exists()
                    .col(id_col(backend, Relation::FromId, false))
                    .col(ColumnDef::new(Relation::FromType).string_len(32).not_null())
                    .col(id_col(backend, Relation::ToId, false))
                    .col(ColumnDef::new(Relation::ToType).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Relation::RelationTypeGroup)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Relation::RelationType).string().not_null())
                    .col(ColumnDef::new(Relation::AdditionalInfo).text())
                    .primary_key(
                        Index::create()
                            .name("pk_relation")
                            .col(Relation::FromId)
                            .col(Relation::FromType)
                            .col(Relation::RelationTypeGroup)
                            .col(Relation::RelationType)
                            .col(Relation::ToId)
                            .col(Relation::ToType),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_relation_to")
                    .table(Relation::Table)
                    .col(Relation::ToId)
                    .col(Relation::RelationTypeGroup)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AttributeKv::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AttributeKv::EntityType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(id_col(backend, AttributeKv::EntityId, false))
                    .col(
                        ColumnDef::new(AttributeKv::AttributeType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AttributeKv::AttributeKey).string().not_null())
                    .col(ColumnDef::new(AttributeKv::BoolV).boolean())
                    .col(ColumnDef::new(AttributeKv::StrV).text())
                    .col(ColumnDef::new(AttributeKv::LongV).big_integer())
                    .col(ColumnDef::new(AttributeKv::DblV).double())
                    .col(ColumnDef::new(AttributeKv::JsonV).text())
                    .col(
                        ColumnDef::new(AttributeKv::LastUpdateTs)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_attribute_kv")
                            .col(AttributeKv::EntityType)
                            .col(AttributeKv::EntityId)
                            .col(AttributeKv::AttributeType)
                            .col(AttributeKv::AttributeKey),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TsKvDictionary::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TsKvDictionary::KeyId)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TsKvDictionary::Key).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ts_kv_dictionary_key")
                    .table(TsKvDictionary::Table)
                    .col(TsKvDictionary::Key)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TsKvLatest::Table)
                    .if_not_exists()
                    .col(id_col(backend, TsKvLatest::EntityId, false))
                    .col(ColumnDef::new(TsKvLatest::KeyId).integer().not_null())
                    .col(ColumnDef::new(TsKvLatest::Ts).big_integer().not_null())
                    .col(ColumnDef::new(TsKvLatest::BoolV).boolean())
                    .col(ColumnDef::new(TsKvLatest::StrV).text())
                    .col(ColumnDef::new(TsKvLatest::LongV).big_integer())
                    .col(ColumnDef::new(TsKvLatest::DblV).double())
                    .col(ColumnDef::new(TsKvLatest::JsonV).text())
                    .primary_key(
                        Index::create()
                            .name("pk_ts_kv_latest")
                            .col(TsKvLatest::EntityId)
                            .col(TsKvLatest::KeyId),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            Table::drop().table(TsKvLatest::Table).to_owned(),
            Table::drop().table(TsKvDictionary::Table).to_owned(),
            Table::drop().table(AttributeKv::Table).to_owned(),
            Table::drop().table(Relation::Table).to_owned(),
            Table::drop().table(Alarm::Table).to_owned(),
            Table::drop().table(EntityView::Table).to_owned(),
            Table::drop().table(Device::Table).to_owned(),
            Table::drop().table(Asset::Table).to_owned(),
            Table::drop().table(Dashboard::Table).to_owned(),
            Table::drop().table(TbUser::Table).to_owned(),
            Table::drop().table(Customer::Table).to_owned(),
            Table::drop().table(Tenant::Table).to_owned(),
        ] {
            manager.drop_table(table).await?;
        }
        Ok(())
    }
}
