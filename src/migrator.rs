use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_funnel_tables::Migration),
            Box::new(m20260101_000002_create_users_orders_tables::Migration),
            Box::new(m20260101_000003_create_subscription_tables::Migration),
            Box::new(m20260101_000004_create_documents_table::Migration),
        ]
    }
}

// Migration implementations

mod m20260101_000001_create_funnel_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000001_create_funnel_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(MarketingLeads::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MarketingLeads::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MarketingLeads::SessionId)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(MarketingLeads::Phone).string().not_null())
                        .col(ColumnDef::new(MarketingLeads::Pincode).string().not_null())
                        .col(ColumnDef::new(MarketingLeads::Source).string().null())
                        .col(ColumnDef::new(MarketingLeads::Status).string().not_null())
                        .col(
                            ColumnDef::new(MarketingLeads::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(FunnelSessions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FunnelSessions::SessionId)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(FunnelSessions::Status).string().not_null())
                        .col(ColumnDef::new(FunnelSessions::SystemType).string().null())
                        .col(ColumnDef::new(FunnelSessions::KwSize).integer().null())
                        .col(
                            ColumnDef::new(FunnelSessions::BasePrice)
                                .decimal_len(19, 4)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(FunnelSessions::StructureType)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(FunnelSessions::StructureSurcharge)
                                .decimal_len(19, 4)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(FunnelSessions::PanelTechnology)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(FunnelSessions::PanelBrand).string().null())
                        .col(
                            ColumnDef::new(FunnelSessions::InverterBrand)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(FunnelSessions::TotalSystemCost)
                                .decimal_len(19, 4)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(FunnelSessions::GstAmount)
                                .decimal_len(19, 4)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(FunnelSessions::FinalTotal)
                                .decimal_len(19, 4)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(FunnelSessions::MonthlyEmi)
                                .decimal_len(19, 4)
                                .null(),
                        )
                        .col(ColumnDef::new(FunnelSessions::Currency).string().not_null())
                        .col(ColumnDef::new(FunnelSessions::Documents).json().not_null())
                        .col(
                            ColumnDef::new(FunnelSessions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FunnelSessions::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(FunnelSessions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(MarketingLeads::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum MarketingLeads {
        Table,
        Id,
        SessionId,
        Phone,
        Pincode,
        Source,
        Status,
        CreatedAt,
    }

    #[derive(Iden)]
    enum FunnelSessions {
        Table,
        SessionId,
        Status,
        SystemType,
        KwSize,
        BasePrice,
        StructureType,
        StructureSurcharge,
        PanelTechnology,
        PanelBrand,
        InverterBrand,
        TotalSystemCost,
        GstAmount,
        FinalTotal,
        MonthlyEmi,
        Currency,
        Documents,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20260101_000002_create_users_orders_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000002_create_users_orders_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Users::Email).string().null().unique_key())
                        .col(ColumnDef::new(Users::Phone).string().null())
                        .col(ColumnDef::new(Users::Name).string().null())
                        .col(ColumnDef::new(Users::Role).string().not_null())
                        .col(
                            ColumnDef::new(Users::ReferralCode)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Users::Credits)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Users::Address).string().null())
                        .col(ColumnDef::new(Users::ReferredBy).uuid().null())
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Orders::OrderNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Orders::PaymentIntentId)
                                .string()
                                .null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Orders::UserId).uuid().not_null())
                        .col(ColumnDef::new(Orders::SessionId).string().not_null())
                        .col(ColumnDef::new(Orders::SystemType).string().not_null())
                        .col(ColumnDef::new(Orders::KwSize).integer().not_null())
                        .col(ColumnDef::new(Orders::StructureType).string().null())
                        .col(ColumnDef::new(Orders::PanelTechnology).string().null())
                        .col(ColumnDef::new(Orders::PanelBrand).string().null())
                        .col(ColumnDef::new(Orders::InverterBrand).string().null())
                        .col(
                            ColumnDef::new(Orders::BasePrice)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::StructureSurcharge)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::GstAmount)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::TotalAmount)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::AmountPaid)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::Currency).string().not_null())
                        .col(ColumnDef::new(Orders::Status).string().not_null())
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Users {
        Table,
        Id,
        Email,
        Phone,
        Name,
        Role,
        ReferralCode,
        Credits,
        Address,
        ReferredBy,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Orders {
        Table,
        Id,
        OrderNumber,
        PaymentIntentId,
        UserId,
        SessionId,
        SystemType,
        KwSize,
        StructureType,
        PanelTechnology,
        PanelBrand,
        InverterBrand,
        BasePrice,
        StructureSurcharge,
        GstAmount,
        TotalAmount,
        AmountPaid,
        Currency,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20260101_000003_create_subscription_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000003_create_subscription_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Plans::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Plans::Id).string().primary_key().not_null())
                        .col(ColumnDef::new(Plans::Name).string().not_null())
                        .col(ColumnDef::new(Plans::Price).decimal_len(19, 4).not_null())
                        .col(ColumnDef::new(Plans::Currency).string().not_null())
                        .col(ColumnDef::new(Plans::Interval).string().not_null())
                        .col(ColumnDef::new(Plans::ProviderPriceId).string().null())
                        .col(
                            ColumnDef::new(Plans::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Subscriptions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Subscriptions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Subscriptions::UserId).uuid().not_null())
                        .col(ColumnDef::new(Subscriptions::PlanId).string().not_null())
                        .col(ColumnDef::new(Subscriptions::Status).string().not_null())
                        .col(
                            ColumnDef::new(Subscriptions::CheckoutSessionId)
                                .string()
                                .null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Subscriptions::ProviderSubscriptionId)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Subscriptions::CurrentPeriodStart)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Subscriptions::CurrentPeriodEnd)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Subscriptions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Subscriptions::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Payments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Payments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Payments::InvoiceId)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Payments::SubscriptionId).uuid().null())
                        .col(ColumnDef::new(Payments::UserId).uuid().null())
                        .col(
                            ColumnDef::new(Payments::Amount)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Payments::Currency).string().not_null())
                        .col(ColumnDef::new(Payments::Status).string().not_null())
                        .col(
                            ColumnDef::new(Payments::ReceivedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Payments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Subscriptions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Plans::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Plans {
        Table,
        Id,
        Name,
        Price,
        Currency,
        Interval,
        ProviderPriceId,
        CreatedAt,
    }

    #[derive(Iden)]
    enum Subscriptions {
        Table,
        Id,
        UserId,
        PlanId,
        Status,
        CheckoutSessionId,
        ProviderSubscriptionId,
        CurrentPeriodStart,
        CurrentPeriodEnd,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Payments {
        Table,
        Id,
        InvoiceId,
        SubscriptionId,
        UserId,
        Amount,
        Currency,
        Status,
        ReceivedAt,
    }
}

mod m20260101_000004_create_documents_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000004_create_documents_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Documents::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Documents::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Documents::OwnerUserId).uuid().null())
                        .col(ColumnDef::new(Documents::OrderId).uuid().null())
                        .col(ColumnDef::new(Documents::DocType).string().not_null())
                        .col(ColumnDef::new(Documents::FileKey).string().not_null())
                        .col(ColumnDef::new(Documents::Status).string().not_null())
                        .col(ColumnDef::new(Documents::ReviewedBy).string().null())
                        .col(
                            ColumnDef::new(Documents::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Documents::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Documents::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Documents {
        Table,
        Id,
        OwnerUserId,
        OrderId,
        DocType,
        FileKey,
        Status,
        ReviewedBy,
        CreatedAt,
        UpdatedAt,
    }
}
