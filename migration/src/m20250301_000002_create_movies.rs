use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250301_000001_create_catalog::{Actors, Directors, Genres, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movies::Table)
                    .if_not_exists()
                    .col(pk_auto(Movies::Id))
                    .col(string(Movies::Title))
                    .col(string(Movies::SearchTitle))
                    .col(string(Movies::Description))
                    .col(integer(Movies::ReleaseYear))
                    .col(integer(Movies::Duration))
                    .col(double(Movies::Rating))
                    .col(string(Movies::PosterUrl))
                    .col(string(Movies::TrailerUrl))
                    .col(integer_null(Movies::GenreId))
                    .col(integer_null(Movies::DirectorId))
                    .col(big_integer(Movies::CreatedAt))
                    .col(big_integer(Movies::UpdatedAt))
                    .col(big_integer_null(Movies::DeletedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movies_genre")
                            .from(Movies::Table, Movies::GenreId)
                            .to(Genres::Table, Genres::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movies_director")
                            .from(Movies::Table, Movies::DirectorId)
                            .to(Directors::Table, Directors::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, col) in [
            ("idx_movies_genre_id", Movies::GenreId),
            ("idx_movies_director_id", Movies::DirectorId),
            ("idx_movies_rating", Movies::Rating),
            ("idx_movies_deleted_at", Movies::DeletedAt),
        ] {
            manager
                .create_index(Index::create().name(name).table(Movies::Table).col(col).to_owned())
                .await?;
        }

        manager
            .create_table(
                Table::create()
                    .table(MovieActors::Table)
                    .if_not_exists()
                    .col(integer(MovieActors::MovieId))
                    .col(integer(MovieActors::ActorId))
                    .primary_key(
                        Index::create()
                            .col(MovieActors::MovieId)
                            .col(MovieActors::ActorId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_actors_movie")
                            .from(MovieActors::Table, MovieActors::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_actors_actor")
                            .from(MovieActors::Table, MovieActors::ActorId)
                            .to(Actors::Table, Actors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_actors_actor_id")
                    .table(MovieActors::Table)
                    .col(MovieActors::ActorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Reviews::Table)
                    .if_not_exists()
                    .col(pk_auto(Reviews::Id))
                    .col(integer(Reviews::MovieId))
                    .col(integer(Reviews::UserId))
                    .col(double(Reviews::Rating))
                    .col(string(Reviews::Comment))
                    .col(big_integer(Reviews::CreatedAt))
                    .col(big_integer(Reviews::UpdatedAt))
                    .col(big_integer_null(Reviews::DeletedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reviews_movie")
                            .from(Reviews::Table, Reviews::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reviews_user")
                            .from(Reviews::Table, Reviews::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reviews_movie_id")
                    .table(Reviews::Table)
                    .col(Reviews::MovieId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Reviews::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieActors::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movies::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    Id,
    Title,
    SearchTitle,
    Description,
    ReleaseYear,
    Duration,
    Rating,
    PosterUrl,
    TrailerUrl,
    GenreId,
    DirectorId,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum MovieActors {
    Table,
    MovieId,
    ActorId,
}

#[derive(DeriveIden)]
enum Reviews {
    Table,
    Id,
    MovieId,
    UserId,
    Rating,
    Comment,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
