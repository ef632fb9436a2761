//! Database configuration module.
//!
//! Handles the `SQLite` connection and table creation using `SeaORM`. Tables
//! are generated from the entity definitions via
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs. The two composite uniqueness guards the ledger depends on (one
//! view per `(link_id, fingerprint)`, one aggregate row per
//! `(referrer_id, referred_user_id)`) are created here as unique indexes,
//! because they span columns a single-column entity annotation cannot
//! express.

use crate::entities::{
    AdminSettings, CpmRate, Link, LinkView, Referral, ReferralEarning, User, Withdrawal,
    link_view, referral,
};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, Schema,
    sea_query::{Index, IndexCreateStatement, TableCreateStatement},
};

/// Establishes a connection using the `DATABASE_URL` environment variable.
///
/// Falls back to a default local `SQLite` file if no environment variable is
/// set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://data/linkledger.sqlite".to_string());

    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables and uniqueness indexes; idempotent.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut tables: Vec<TableCreateStatement> = vec![
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(Link),
        schema.create_table_from_entity(LinkView),
        schema.create_table_from_entity(ReferralEarning),
        schema.create_table_from_entity(Referral),
        schema.create_table_from_entity(Withdrawal),
        schema.create_table_from_entity(CpmRate),
        schema.create_table_from_entity(AdminSettings),
    ];
    for table in &mut tables {
        table.if_not_exists();
        db.execute(builder.build(&*table)).await?;
    }

    // One view per visitor per link: the dedup gate for earnings accrual
    let view_dedup: IndexCreateStatement = Index::create()
        .name("idx_link_views_link_fingerprint")
        .table(LinkView)
        .col(link_view::Column::LinkId)
        .col(link_view::Column::Fingerprint)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&view_dedup)).await?;

    // One aggregate row per referral pair
    let referral_pair: IndexCreateStatement = Index::create()
        .name("idx_referrals_referrer_referred")
        .table(Referral)
        .col(referral::Column::ReferrerId)
        .col(referral::Column::ReferredUserId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&referral_pair)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        link::Model as LinkModel, link_view::Model as LinkViewModel, user::Model as UserModel,
        withdrawal::Model as WithdrawalModel,
    };
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Tables exist and are queryable
        let _: Vec<UserModel> = User::find().limit(1).all(&db).await?;
        let _: Vec<LinkModel> = Link::find().limit(1).all(&db).await?;
        let _: Vec<LinkViewModel> = LinkView::find().limit(1).all(&db).await?;
        let _: Vec<WithdrawalModel> = Withdrawal::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;

        let _: Vec<UserModel> = User::find().limit(1).all(&db).await?;
        Ok(())
    }
}
