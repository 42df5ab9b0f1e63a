use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Represents a user in the `users` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Primary key ID (auto-incremented).
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique login name (students use their roll number).
    pub username: String,
    /// User's unique email address.
    pub email: String,
    /// Securely hashed password string.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Role held by this user across the system.
    pub role: Role,
    /// Deactivated users fail identity verification even with a valid token.
    pub active: bool,
    /// Set on password rotation; tokens issued before this instant are rejected.
    pub password_changed_at: Option<DateTime<Utc>>,
    /// Best-effort timestamp of the last authenticated request.
    pub last_activity: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Closed set of roles. Students redeem attendance sessions, teachers issue
/// them, admins administrate (and may also issue).
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role_type")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    #[sea_orm(string_value = "student")]
    Student,

    #[sea_orm(string_value = "teacher")]
    Teacher,

    #[sea_orm(string_value = "admin")]
    Admin,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    AttendanceRecords,
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttendanceRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Creates a user with a freshly hashed password.
    pub async fn create(
        db: &DatabaseConnection,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();
        let user = ActiveModel {
            username: Set(username.to_owned()),
            email: Set(email.to_lowercase()),
            password_hash: Set(Self::hash_password(password)?),
            role: Set(role),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        user.insert(db).await
    }

    pub async fn find_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    pub async fn find_by_username(
        db: &DatabaseConnection,
        username: &str,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::Username.eq(username.trim()))
            .one(db)
            .await
    }

    pub async fn find_by_email(
        db: &DatabaseConnection,
        email: &str,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::Email.eq(email.trim().to_lowercase()))
            .one(db)
            .await
    }

    /// Looks up a user by login name and verifies the password against the
    /// stored hash. Returns `None` for unknown users and wrong passwords alike.
    pub async fn verify_credentials(
        db: &DatabaseConnection,
        username: &str,
        password: &str,
    ) -> Result<Option<Model>, DbErr> {
        if let Some(user) = Self::find_by_username(db, username).await? {
            if user.verify_password(password) {
                return Ok(Some(user));
            }
        }
        Ok(None)
    }

    pub fn hash_password(password: &str) -> Result<String, DbErr> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| DbErr::Custom(format!("password hashing failed: {e}")))
    }

    pub fn verify_password(&self, password: &str) -> bool {
        let parsed = match PasswordHash::new(&self.password_hash) {
            Ok(parsed) => parsed,
            Err(_) => return false,
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Rotates the password and records the rotation instant, which
    /// invalidates every identity token issued before it.
    pub async fn set_password(
        db: &DatabaseConnection,
        id: i64,
        new_password: &str,
    ) -> Result<Model, DbErr> {
        let user = Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("User {id} not found")))?;

        let now = Utc::now();
        let mut active: ActiveModel = user.into();
        active.password_hash = Set(Self::hash_password(new_password)?);
        active.password_changed_at = Set(Some(now));
        active.updated_at = Set(now);
        active.update(db).await
    }

    /// Toggles the account's active flag (admin operation).
    pub async fn set_active(
        db: &DatabaseConnection,
        id: i64,
        active_flag: bool,
    ) -> Result<Model, DbErr> {
        let user = Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("User {id} not found")))?;

        let mut active: ActiveModel = user.into();
        active.active = Set(active_flag);
        active.updated_at = Set(Utc::now());
        active.update(db).await
    }

    /// Best-effort last-activity stamp. Callers spawn this and ignore the
    /// result; a failure must never fail the request it rode in on.
    pub async fn touch_last_activity(
        db: &DatabaseConnection,
        id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), DbErr> {
        let Some(user) = Entity::find_by_id(id).one(db).await? else {
            return Ok(());
        };

        let mut active: ActiveModel = user.into();
        active.last_activity = Set(Some(at));
        active.update(db).await?;
        Ok(())
    }
}
