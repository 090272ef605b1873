use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;

/// The closed set of roles a user can hold at a food bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    Volunteer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::Volunteer => "volunteer",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "admin" => Some(Role::Admin),
            "staff" => Some(Role::Staff),
            "volunteer" => Some(Role::Volunteer),
            _ => None,
        }
    }
}

/// Public listing shape; contact email and description stay off the summary.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FoodBankSummary {
    pub id: Uuid,
    pub name: String,
    pub unit_no: Option<String>,
    pub street: String,
    pub city: String,
    pub province: String,
    pub country: String,
    pub postal_code: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub charity_registration_no: Option<String>,
    pub timezone: String,
}

/// A full food bank row as stored.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FoodBank {
    pub id: Uuid,
    pub name: String,
    pub unit_no: Option<String>,
    pub street: String,
    pub city: String,
    pub province: String,
    pub country: String,
    pub postal_code: String,
    pub description: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub website: Option<String>,
    pub charity_registration_no: Option<String>,
    pub timezone: String,
    pub published: bool,
    pub admin: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Detail row joined with the admin's user record. Never serialized as-is;
/// the visibility filter decides what leaves the process.
#[derive(Debug, Clone, FromRow)]
pub struct FoodBankRecord {
    pub id: Uuid,
    pub name: String,
    pub unit_no: Option<String>,
    pub street: String,
    pub city: String,
    pub province: String,
    pub country: String,
    pub postal_code: String,
    pub description: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub website: Option<String>,
    pub charity_registration_no: Option<String>,
    pub timezone: String,
    pub published: bool,
    pub admin: Uuid,
    pub admin_username: String,
    pub admin_email: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Hours {
    pub food_bank_id: Uuid,
    pub weekday: i16,
    pub opening_hr: i16,
    pub closing_hr: i16,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StaffMember {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug)]
pub struct SearchFilter<'a> {
    pub id: Option<Uuid>,
    pub name: Option<&'a str>,
    pub city: Option<&'a str>,
    pub province: Option<&'a str>,
    pub country: Option<&'a str>,
}

#[derive(Debug)]
pub struct NewFoodBank<'a> {
    pub name: &'a str,
    pub unit_no: Option<&'a str>,
    pub street: &'a str,
    pub city: &'a str,
    pub province: &'a str,
    pub country: &'a str,
    pub postal_code: &'a str,
    pub description: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub fax: Option<&'a str>,
    pub website: Option<&'a str>,
    pub charity_registration_no: Option<&'a str>,
    pub timezone: &'a str,
    pub published: bool,
}

/// Lists published food banks matching the filter, case-insensitively.
pub async fn search(
    db: &PgPool,
    filter: &SearchFilter<'_>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<FoodBankSummary>> {
    let rows = sqlx::query_as::<_, FoodBankSummary>(
        r#"
        SELECT id, name, unit_no, street, city, province, country, postal_code,
               website, phone, fax, charity_registration_no, timezone
        FROM foodbanks
        WHERE published = TRUE
          AND ($1::uuid IS NULL OR id = $1)
          AND ($2::text IS NULL OR name ILIKE $2)
          AND ($3::text IS NULL OR city ILIKE $3)
          AND ($4::text IS NULL OR province ILIKE $4)
          AND ($5::text IS NULL OR country ILIKE $5)
        ORDER BY country, province, city
        LIMIT $6 OFFSET $7
        "#,
    )
    .bind(filter.id)
    .bind(filter.name)
    .bind(filter.city)
    .bind(filter.province)
    .bind(filter.country)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_detailed(db: &PgPool, id: Uuid) -> anyhow::Result<Option<FoodBankRecord>> {
    let record = sqlx::query_as::<_, FoodBankRecord>(
        r#"
        SELECT fb.id, fb.name, fb.unit_no, fb.street, fb.city, fb.province,
               fb.country, fb.postal_code, fb.description, fb.email, fb.phone,
               fb.fax, fb.website, fb.charity_registration_no, fb.timezone,
               fb.published, fb.admin, fb.created_at,
               u.username AS admin_username, u.email AS admin_email
        FROM foodbanks fb
        INNER JOIN users u ON fb.admin = u.id
        WHERE fb.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(record)
}

pub async fn hours_for(db: &PgPool, food_bank_id: Uuid) -> anyhow::Result<Vec<Hours>> {
    let rows = sqlx::query_as::<_, Hours>(
        r#"
        SELECT food_bank_id, weekday, opening_hr, closing_hr
        FROM hours
        WHERE food_bank_id = $1
        ORDER BY weekday, opening_hr
        "#,
    )
    .bind(food_bank_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn staff_for(
    db: &PgPool,
    food_bank_id: Uuid,
    role: Option<Role>,
) -> anyhow::Result<Vec<StaffMember>> {
    let rows = sqlx::query_as::<_, StaffMember>(
        r#"
        SELECT ur.user_id, u.username, u.email, ur.role
        FROM user_roles ur
        INNER JOIN users u ON ur.user_id = u.id
        WHERE ur.food_bank_id = $1
          AND ($2::text IS NULL OR ur.role = $2)
        ORDER BY u.username
        "#,
    )
    .bind(food_bank_id)
    .bind(role.map(Role::as_str))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Whether the user holds the admin role for this food bank. An absent
/// identity is never an admin; no query is made for it.
pub async fn is_admin(
    db: &PgPool,
    user_id: Option<Uuid>,
    food_bank_id: Uuid,
) -> anyhow::Result<bool> {
    let Some(user_id) = user_id else {
        return Ok(false);
    };
    let found = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM user_roles
            WHERE user_id = $1 AND food_bank_id = $2 AND role = 'admin'
        )
        "#,
    )
    .bind(user_id)
    .bind(food_bank_id)
    .fetch_one(db)
    .await?;
    Ok(found)
}

/// A food bank with the same name at the same address already exists.
pub async fn duplicate_exists(
    db: &PgPool,
    name: &str,
    street: &str,
    city: &str,
    province: &str,
    country: &str,
) -> anyhow::Result<bool> {
    let found = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM foodbanks
            WHERE name ILIKE $1 AND street ILIKE $2 AND city ILIKE $3
              AND province ILIKE $4 AND country ILIKE $5
        )
        "#,
    )
    .bind(name)
    .bind(street)
    .bind(city)
    .bind(province)
    .bind(country)
    .fetch_one(db)
    .await?;
    Ok(found)
}

pub async fn charity_no_exists(db: &PgPool, charity_no: &str) -> anyhow::Result<bool> {
    let found = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM foodbanks WHERE charity_registration_no = $1
        )
        "#,
    )
    .bind(charity_no)
    .fetch_one(db)
    .await?;
    Ok(found)
}

/// Inserts the food bank and its creator's admin role in one transaction.
/// This is the only path that grants the admin role, which keeps a food bank
/// at exactly one admin.
pub async fn create(
    db: &PgPool,
    new: &NewFoodBank<'_>,
    admin: Uuid,
) -> Result<FoodBank, AppError> {
    let mut tx = db.begin().await?;

    let food_bank = sqlx::query_as::<_, FoodBank>(
        r#"
        INSERT INTO foodbanks (
            name, unit_no, street, city, province, country, postal_code,
            description, email, phone, fax, website, charity_registration_no,
            timezone, published, admin
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        RETURNING id, name, unit_no, street, city, province, country,
                  postal_code, description, email, phone, fax, website,
                  charity_registration_no, timezone, published, admin, created_at
        "#,
    )
    .bind(new.name)
    .bind(new.unit_no)
    .bind(new.street)
    .bind(new.city)
    .bind(new.province)
    .bind(new.country)
    .bind(new.postal_code)
    .bind(new.description)
    .bind(new.email)
    .bind(new.phone)
    .bind(new.fax)
    .bind(new.website)
    .bind(new.charity_registration_no)
    .bind(new.timezone)
    .bind(new.published)
    .bind(admin)
    .fetch_one(&mut *tx)
    .await
    .map_err(conflict_on_unique)?;

    sqlx::query(
        r#"
        INSERT INTO user_roles (food_bank_id, user_id, role)
        VALUES ($1, $2, 'admin')
        "#,
    )
    .bind(food_bank.id)
    .bind(admin)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(food_bank)
}

fn conflict_on_unique(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(
            "This charity registration number is already registered.".into(),
        ),
        _ => AppError::Internal(anyhow::Error::new(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_only_enumerated_values() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("staff"), Some(Role::Staff));
        assert_eq!(Role::parse("volunteer"), Some(Role::Volunteer));
        assert_eq!(Role::parse("owner"), None);
        assert_eq!(Role::parse("Admin"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn role_round_trips_through_as_str() {
        for role in [Role::Admin, Role::Staff, Role::Volunteer] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }
}
