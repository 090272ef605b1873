use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::{AuthUser, MaybeAuthUser},
    dto::Data,
    error::{AppError, FieldError},
    state::AppState,
    validate::{normalize, FieldChecks},
};

use super::dto::{clamp_limit, clamp_offset, CreateFoodBankRequest, ListQuery, StaffQuery};
use super::repo::{self, FoodBank, Hours, NewFoodBank, Role, SearchFilter, StaffMember};
use super::visibility::{filter_food_bank, FoodBankView};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/foodbank", get(list_food_banks))
        .route("/foodbank/:id", get(food_bank_details))
        .route("/foodbank/:id/hours", get(food_bank_hours))
        .route("/foodbank/:id/staff", get(food_bank_staff))
}

pub fn write_routes() -> Router<AppState> {
    Router::new().route("/foodbank", post(create_food_bank))
}

#[instrument(skip(state))]
async fn list_food_banks(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Data<Vec<repo::FoodBankSummary>>>, AppError> {
    let mut checks = FieldChecks::new();
    let id = match normalize(&query.id) {
        Some(raw) => match raw.parse::<Uuid>() {
            Ok(v) => Some(v),
            Err(_) => {
                checks.push("id", "The food bank id is not valid");
                None
            }
        },
        None => None,
    };
    checks.finish()?;

    let filter = SearchFilter {
        id,
        name: normalize(&query.name),
        city: normalize(&query.city),
        province: normalize(&query.province),
        country: normalize(&query.country),
    };
    let limit = clamp_limit(query.limit.as_deref());
    let offset = clamp_offset(query.offset.as_deref());

    let food_banks = repo::search(&state.db, &filter, limit, offset).await?;
    Ok(Json(Data { data: food_banks }))
}

#[instrument(skip(state))]
async fn food_bank_details(
    State(state): State<AppState>,
    MaybeAuthUser(user_id): MaybeAuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Data<FoodBankView>>, AppError> {
    // the record and the caller's admin status are independent lookups
    let (record, is_admin) = tokio::join!(
        repo::find_detailed(&state.db, id),
        repo::is_admin(&state.db, user_id, id),
    );
    let record = record?
        .ok_or_else(|| AppError::NotFound("Failed to find the indicated food bank".into()))?;
    let requester_is_admin = is_admin?;

    Ok(Json(Data {
        data: filter_food_bank(record, requester_is_admin),
    }))
}

#[instrument(skip(state))]
async fn food_bank_hours(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Data<Vec<Hours>>>, AppError> {
    let hours = repo::hours_for(&state.db, id).await?;
    Ok(Json(Data { data: hours }))
}

#[instrument(skip(state))]
async fn food_bank_staff(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<StaffQuery>,
) -> Result<Json<Data<Vec<StaffMember>>>, AppError> {
    let role = match normalize(&query.role) {
        Some(raw) => match Role::parse(raw) {
            Some(role) => Some(role),
            None => {
                return Err(AppError::Validation(vec![FieldError::new(
                    "role",
                    "Cannot recognize this role value.",
                )]))
            }
        },
        None => None,
    };

    if !repo::is_admin(&state.db, Some(user_id), id).await? {
        return Err(AppError::Forbidden(
            "This user is not this food bank's administrator.".into(),
        ));
    }

    let staff = repo::staff_for(&state.db, id, role).await?;
    Ok(Json(Data { data: staff }))
}

#[instrument(skip(state, payload))]
async fn create_food_bank(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateFoodBankRequest>,
) -> Result<(StatusCode, Json<Data<FoodBank>>), AppError> {
    let name = normalize(&payload.name);
    let unit_no = normalize(&payload.unit_no);
    let street = normalize(&payload.street);
    let city = normalize(&payload.city);
    let province = normalize(&payload.province);
    let country = normalize(&payload.country);
    let postal_code = normalize(&payload.postal_code);
    let description = normalize(&payload.description);
    let email = normalize(&payload.email);
    let phone = normalize(&payload.phone);
    let fax = normalize(&payload.fax);
    let website = normalize(&payload.website);
    let charity_no = normalize(&payload.charity_registration_no);
    let timezone = normalize(&payload.timezone);

    let mut checks = FieldChecks::new();
    checks.require("name", name, "Name cannot be empty");
    checks.length_max("name", name, 75, "Name cannot exceed 75 characters in length");
    checks.require("street", street, "Street must be provided");
    checks.length_max("street", street, 50, "Street cannot exceed 50 characters in length");
    checks.require("city", city, "City must be provided");
    checks.length_max("city", city, 20, "City cannot exceed 20 characters in length");
    checks.require("province", province, "Province must be provided");
    checks.length_max(
        "province",
        province,
        20,
        "Province cannot exceed 20 characters in length",
    );
    checks.require("country", country, "Country must be provided");
    checks.length_max(
        "country",
        country,
        20,
        "Country cannot exceed 20 characters in length",
    );
    checks.require("postal_code", postal_code, "Postal code is required");
    checks.postal_code("postal_code", postal_code);
    checks.require("timezone", timezone, "Timezone is required");
    checks.timezone("timezone", timezone);
    checks.length_max(
        "unit_no",
        unit_no,
        10,
        "Unit no. cannot exceed 10 characters in length",
    );
    checks.length_max(
        "description",
        description,
        150,
        "Description cannot exceed 150 characters in length",
    );
    checks.length_max(
        "charity_registration_no",
        charity_no,
        30,
        "Charity registration number cannot exceed 30 characters in length",
    );
    checks.email("email", email);
    checks.phone("phone", phone, "Phone number does not appear to be valid");
    checks.phone("fax", fax, "Fax number does not appear to be valid");
    checks.website("website", website);

    // pre-insert duplicate checks; a racing charity number insert is still
    // caught by its unique constraint
    if let (Some(name), Some(street), Some(city), Some(province), Some(country)) =
        (name, street, city, province, country)
    {
        if repo::duplicate_exists(&state.db, name, street, city, province, country).await? {
            checks.push("name", "A food bank with this name and address already exists");
        }
    }
    if let Some(charity_no) = charity_no {
        if repo::charity_no_exists(&state.db, charity_no).await? {
            checks.push(
                "charity_registration_no",
                "This charity registration number is already registered",
            );
        }
    }
    checks.finish()?;

    let (name, street, city, province, country, postal_code, timezone) =
        match (name, street, city, province, country, postal_code, timezone) {
            (Some(n), Some(s), Some(ci), Some(p), Some(co), Some(pc), Some(tz)) => {
                (n, s, ci, p, co, pc, tz)
            }
            _ => {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "required food bank fields missing after validation"
                )))
            }
        };

    let new = NewFoodBank {
        name,
        unit_no,
        street,
        city,
        province,
        country,
        postal_code,
        description,
        email,
        phone,
        fax,
        website,
        charity_registration_no: charity_no,
        timezone,
        published: payload.published,
    };

    let food_bank = repo::create(&state.db, &new, user_id).await?;
    info!(food_bank_id = %food_bank.id, admin = %user_id, "food bank created");
    Ok((StatusCode::CREATED, Json(Data { data: food_bank })))
}
