//! Post entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    #[sea_orm(column_type = "Text")]
    pub excerpt: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub cover_image: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,
    pub published: bool,
    pub publish_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub likes: i64,
    pub views: i64,
    pub allow_comments: bool,
    pub author: String,
    pub location: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
    #[sea_orm(has_many = "super::like::Entity")]
    Like,
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl Related<super::like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Like.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Post. Comment counts are filled in by the store.
impl From<Model> for quill_core::domain::Post {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            content: model.content,
            excerpt: model.excerpt,
            slug: model.slug,
            cover_image: model.cover_image,
            tags: serde_json::from_value(model.tags).unwrap_or_default(),
            published: model.published,
            publish_at: model.publish_at.map(Into::into),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
            likes: model.likes,
            views: model.views,
            comment_count: 0,
            allow_comments: model.allow_comments,
            author: model.author,
            location: model.location,
        }
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
impl From<quill_core::domain::Post> for ActiveModel {
    fn from(post: quill_core::domain::Post) -> Self {
        Self {
            id: Set(post.id),
            title: Set(post.title),
            content: Set(post.content),
            excerpt: Set(post.excerpt),
            slug: Set(post.slug),
            cover_image: Set(post.cover_image),
            tags: Set(serde_json::Value::from(post.tags)),
            published: Set(post.published),
            publish_at: Set(post.publish_at.map(Into::into)),
            created_at: Set(post.created_at.into()),
            updated_at: Set(post.updated_at.into()),
            likes: Set(post.likes),
            views: Set(post.views),
            allow_comments: Set(post.allow_comments),
            author: Set(post.author),
            location: Set(post.location),
        }
    }
}
