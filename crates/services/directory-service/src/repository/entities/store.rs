//! Store database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::{Location, Store};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "stores")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub created: DateTimeUtc,
    pub location_type: String,
    pub longitude: f64,
    pub latitude: f64,
    pub address: String,
    pub photo: Option<String>,
    pub author_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id"
    )]
    Author,
    #[sea_orm(has_many = "super::review::Entity")]
    Review,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Review.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for Store {
    fn from(model: Model) -> Self {
        Store {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            tags: model.tags,
            created: model.created,
            location: Location {
                kind: model.location_type,
                coordinates: [model.longitude, model.latitude],
                address: model.address,
            },
            photo: model.photo,
            author: model.author_id,
        }
    }
}
