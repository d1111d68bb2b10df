use axum::{Json, extract::State};
use sqlx::SqliteConnection;

use crate::AppState;
use crate::api::extract::{IdPath, Payload};
use crate::api::models::drinks::{DrinkCreate, DrinkDeletedResponse, DrinkLong, DrinkShort, DrinkUpdate, DrinksResponse};
use crate::auth::permissions::{RequiresPermission, permission};
use crate::db::errors::DbError;
use crate::db::handlers::{Drinks, Repository, drinks::DrinkFilter};
use crate::db::models::drinks::{DrinkDBResponse, DrinkUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::types::DrinkId;

async fn all_drinks(conn: &mut SqliteConnection) -> std::result::Result<Vec<DrinkDBResponse>, DbError> {
    Drinks::new(conn).list(&DrinkFilter::default()).await
}

/// Every drink for a menu listing; an empty menu is a 404, anything else a 400
async fn menu(state: &AppState) -> Result<Vec<DrinkDBResponse>> {
    let mut conn = state
        .db
        .acquire()
        .await
        .map_err(|e| Error::bad_request_because("list drinks", e.into()))?;

    let drinks = all_drinks(&mut conn)
        .await
        .map_err(|e| Error::bad_request_because("list drinks", e))?;
    if drinks.is_empty() {
        return Err(Error::not_found("Drinks"));
    }
    Ok(drinks)
}

// GET /drinks - public menu, ingredient names hidden
#[tracing::instrument(skip_all)]
pub async fn list_drinks(State(state): State<AppState>) -> Result<Json<DrinksResponse<DrinkShort>>> {
    let drinks = menu(&state).await?;
    Ok(Json(DrinksResponse::new(drinks.into_iter().map(DrinkShort::from).collect())))
}

// GET /drinks-detail - full recipes
#[tracing::instrument(skip_all)]
pub async fn list_drinks_detail(
    State(state): State<AppState>,
    _: RequiresPermission<permission::GetDrinksDetail>,
) -> Result<Json<DrinksResponse<DrinkLong>>> {
    let drinks = menu(&state).await?;
    Ok(Json(DrinksResponse::new(drinks.into_iter().map(DrinkLong::from).collect())))
}

// POST /drinks - add a drink, respond with the whole menu
#[tracing::instrument(skip_all)]
pub async fn create_drink(
    State(state): State<AppState>,
    current: RequiresPermission<permission::PostDrinks>,
    Payload(create): Payload<DrinkCreate>,
) -> Result<Json<DrinksResponse<DrinkLong>>> {
    let request = create
        .into_db_request()
        .ok_or_else(|| Error::not_found("Drink title and recipe"))?;

    let mut tx = state
        .db
        .begin()
        .await
        .map_err(|e| Error::not_found_because("Drink", e.into()))?;
    let created = Drinks::new(&mut tx)
        .create(&request)
        .await
        .map_err(|e| Error::not_found_because("Drink", e))?;
    let drinks = all_drinks(&mut tx)
        .await
        .map_err(|e| Error::not_found_because("Drink", e))?;
    tx.commit()
        .await
        .map_err(|e| Error::not_found_because("Drink", e.into()))?;

    tracing::info!(drink_id = created.id, subject = ?current.subject(), "drink created");
    Ok(Json(DrinksResponse::new(drinks.into_iter().map(DrinkLong::from).collect())))
}

// PATCH /drinks/{id} - replace the title and/or recipe of a drink
#[tracing::instrument(skip_all)]
pub async fn update_drink(
    State(state): State<AppState>,
    current: RequiresPermission<permission::PatchDrinks>,
    IdPath(id): IdPath<DrinkId>,
    Payload(update): Payload<DrinkUpdate>,
) -> Result<Json<DrinksResponse<DrinkLong>>> {
    let resource = || format!("Drink {id}");

    let mut tx = state
        .db
        .begin()
        .await
        .map_err(|e| Error::not_found_because(resource(), e.into()))?;
    Drinks::new(&mut tx)
        .update(id, &DrinkUpdateDBRequest::from(update))
        .await
        .map_err(|e| Error::not_found_because(resource(), e))?;
    let drinks = all_drinks(&mut tx)
        .await
        .map_err(|e| Error::not_found_because(resource(), e))?;
    tx.commit()
        .await
        .map_err(|e| Error::not_found_because(resource(), e.into()))?;

    tracing::info!(drink_id = id, subject = ?current.subject(), "drink updated");
    Ok(Json(DrinksResponse::new(drinks.into_iter().map(DrinkLong::from).collect())))
}

// DELETE /drinks/{id}
#[tracing::instrument(skip_all)]
pub async fn delete_drink(
    State(state): State<AppState>,
    current: RequiresPermission<permission::DeleteDrinks>,
    IdPath(id): IdPath<DrinkId>,
) -> Result<Json<DrinkDeletedResponse>> {
    let mut conn = state
        .db
        .acquire()
        .await
        .map_err(|e| Error::not_found_because(format!("Drink {id}"), e.into()))?;

    let deleted = Drinks::new(&mut conn)
        .delete(id)
        .await
        .map_err(|e| Error::not_found_because(format!("Drink {id}"), e))?;
    if !deleted {
        return Err(Error::not_found(format!("Drink {id}")));
    }

    tracing::info!(drink_id = id, subject = ?current.subject(), "drink deleted");
    Ok(Json(DrinkDeletedResponse { success: true, delete: id }))
}
