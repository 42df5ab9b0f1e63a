use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TryInsertResult,
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One redemption of an attendance session by one user. Append-only; the
/// composite primary key (session_id, user_id) enforces at-most-once.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub session_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,

    /// Activity label carried over from the session token.
    pub subject: String,
    pub status: AttendanceStatus,
    /// The issuer (teacher) whose session produced this record.
    pub marked_by: i64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_status_type")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "present")]
    Present,

    #[sea_orm(string_value = "absent")]
    Absent,

    #[sea_orm(string_value = "late")]
    Late,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Result of an insert-if-absent attempt for a (session, user) pair.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(Model),
    AlreadyExists,
}

impl Model {
    /// Records a redemption if and only if no record exists for this
    /// (session_id, user_id) pair.
    ///
    /// This is a single `INSERT ... ON CONFLICT DO NOTHING` statement; the
    /// database's primary-key constraint decides the race, so concurrent
    /// attempts for the same pair cannot both succeed. There is deliberately
    /// no preceding existence check.
    pub async fn insert_if_absent(
        db: &DatabaseConnection,
        session_id: &str,
        user_id: i64,
        subject: &str,
        marked_by: i64,
        now: DateTime<Utc>,
    ) -> Result<InsertOutcome, DbErr> {
        let record = ActiveModel {
            session_id: Set(session_id.to_owned()),
            user_id: Set(user_id),
            subject: Set(subject.to_owned()),
            status: Set(AttendanceStatus::Present),
            marked_by: Set(marked_by),
            recorded_at: Set(now),
        };

        let result = Entity::insert(record)
            .on_conflict(
                OnConflict::columns([Column::SessionId, Column::UserId])
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(db)
            .await?;

        match result {
            TryInsertResult::Inserted(_) => Ok(InsertOutcome::Inserted(Model {
                session_id: session_id.to_owned(),
                user_id,
                subject: subject.to_owned(),
                status: AttendanceStatus::Present,
                marked_by,
                recorded_at: now,
            })),
            TryInsertResult::Conflicted => Ok(InsertOutcome::AlreadyExists),
            TryInsertResult::Empty => Err(DbErr::Custom(
                "insert_if_absent produced an empty insert".into(),
            )),
        }
    }

    pub async fn find_for_user(
        db: &DatabaseConnection,
        user_id: i64,
        subject: Option<&str>,
    ) -> Result<Vec<Model>, DbErr> {
        let mut query = Entity::find().filter(Column::UserId.eq(user_id));
        if let Some(subject) = subject {
            query = query.filter(Column::Subject.eq(subject));
        }
        query.order_by_desc(Column::RecordedAt).all(db).await
    }

    pub async fn find_by_subject(
        db: &DatabaseConnection,
        subject: &str,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::Subject.eq(subject))
            .order_by_desc(Column::RecordedAt)
            .all(db)
            .await
    }

    pub async fn find_for_session_user(
        db: &DatabaseConnection,
        session_id: &str,
        user_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id((session_id.to_owned(), user_id))
            .one(db)
            .await
    }
}
