use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Genres::Table)
                    .if_not_exists()
                    .col(pk_auto(Genres::Id))
                    .col(string(Genres::Name))
                    .col(string(Genres::Description))
                    .col(big_integer(Genres::CreatedAt))
                    .col(big_integer(Genres::UpdatedAt))
                    .col(big_integer_null(Genres::DeletedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_genres_deleted_at")
                    .table(Genres::Table)
                    .col(Genres::DeletedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Directors::Table)
                    .if_not_exists()
                    .col(pk_auto(Directors::Id))
                    .col(string(Directors::Name))
                    .col(string(Directors::Biography))
                    .col(string_null(Directors::BirthDate))
                    .col(string(Directors::Nationality))
                    .col(big_integer(Directors::CreatedAt))
                    .col(big_integer(Directors::UpdatedAt))
                    .col(big_integer_null(Directors::DeletedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_directors_deleted_at")
                    .table(Directors::Table)
                    .col(Directors::DeletedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Actors::Table)
                    .if_not_exists()
                    .col(pk_auto(Actors::Id))
                    .col(string(Actors::Name))
                    .col(string(Actors::Biography))
                    .col(string_null(Actors::BirthDate))
                    .col(string(Actors::Nationality))
                    .col(big_integer(Actors::CreatedAt))
                    .col(big_integer(Actors::UpdatedAt))
                    .col(big_integer_null(Actors::DeletedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_actors_deleted_at")
                    .table(Actors::Table)
                    .col(Actors::DeletedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Username))
                    .col(string(Users::Email))
                    .col(big_integer(Users::CreatedAt))
                    .col(big_integer(Users::UpdatedAt))
                    .col(big_integer_null(Users::DeletedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_deleted_at")
                    .table(Users::Table)
                    .col(Users::DeletedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Actors::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Directors::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Genres::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Genres {
    Table,
    Id,
    Name,
    Description,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Directors {
    Table,
    Id,
    Name,
    Biography,
    BirthDate,
    Nationality,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Actors {
    Table,
    Id,
    Name,
    Biography,
    BirthDate,
    Nationality,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Users {
    Table,
    Id,
    Username,
    Email,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
