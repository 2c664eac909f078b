use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20240101_000001_create_work_orders_table::Migration)]
    }
}

// Migration implementations

mod m20240101_000001_create_work_orders_table {
    use sea_orm_migration::prelude::*;

    use crate::models::work_order::{WorkOrderPriority, WorkOrderStatus};

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_work_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(WorkOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WorkOrders::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(WorkOrders::Title).string().not_null())
                        .col(ColumnDef::new(WorkOrders::Description).text().not_null())
                        .col(
                            ColumnDef::new(WorkOrders::Status)
                                .string()
                                .not_null()
                                .default(WorkOrderStatus::Pending.as_str())
                                .check(Expr::col(WorkOrders::Status).is_in(WorkOrderStatus::names())),
                        )
                        .col(
                            ColumnDef::new(WorkOrders::Priority)
                                .string()
                                .not_null()
                                .default(WorkOrderPriority::Medium.as_str())
                                .check(
                                    Expr::col(WorkOrders::Priority)
                                        .is_in(WorkOrderPriority::names()),
                                ),
                        )
                        .col(ColumnDef::new(WorkOrders::AssignedTo).string().not_null())
                        .col(ColumnDef::new(WorkOrders::Location).string().not_null())
                        .col(
                            ColumnDef::new(WorkOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrders::DueDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .check(
                            Expr::col(WorkOrders::UpdatedAt)
                                .gte(Expr::col(WorkOrders::CreatedAt)),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_work_orders_status")
                        .table(WorkOrders::Table)
                        .col(WorkOrders::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_work_orders_created_at")
                        .table(WorkOrders::Table)
                        .col(WorkOrders::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(WorkOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum WorkOrders {
        Table,
        Id,
        Title,
        Description,
        Status,
        Priority,
        AssignedTo,
        Location,
        CreatedAt,
        UpdatedAt,
        DueDate,
    }
}
