use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::commands::{announcements, auth, items, orders, reports, reviews, wallet};
use crate::error::AppResult;
use crate::models::{
    Alerts, Announcement, BirthdayUpdate, CancelRequest, DaySummary, Item, ItemFilter, ItemPatch,
    LoginRequest, NewAnnouncement, NewItem, NewReview, Order, OtpCheck, PaymentUpdate,
    PlaceOrder, Preferences, RegisterUser, Requester, Review, StatusUpdate, TopUp, Transaction,
    User,
};
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertsQuery {
    pub threshold: Option<i64>,
    pub delay_minutes: Option<i64>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(health))
        // Auth & users
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/{id}/preferences", put(update_preferences))
        .route("/api/auth/{id}/birthday", put(update_birthday))
        .route("/api/users", get(list_users))
        .route("/api/users/{id}", get(get_user))
        // Menu
        .route("/api/items", get(list_items).post(create_item))
        .route("/api/items/seed", post(seed_items))
        .route("/api/items/categories", get(list_categories))
        .route("/api/items/low-stock", get(low_stock))
        .route("/api/items/{id}", get(get_item).put(update_item).delete(delete_item))
        // Orders
        .route("/api/orders", get(list_orders).post(place_order))
        .route("/api/orders/{id}", get(get_order))
        .route("/api/orders/{id}/status", put(update_status))
        .route("/api/orders/{id}/verify", post(verify_otp))
        .route("/api/orders/{id}/cancel", post(cancel_order))
        .route("/api/orders/{id}/settle", post(settle_order))
        .route("/api/orders/{id}/payment", put(set_payment))
        .route("/api/orders/{id}/review", post(add_review))
        .route("/api/reviews", get(list_reviews))
        // Wallet
        .route("/api/wallet/transactions", get(list_transactions))
        .route("/api/wallet/{user_id}/topup", post(top_up))
        // Announcements
        .route(
            "/api/announcements",
            get(list_announcements).post(create_announcement),
        )
        .route("/api/announcements/{id}", delete(delete_announcement))
        // Reports
        .route("/api/reports/summary", get(day_summary))
        .route("/api/reports/alerts", get(alerts))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "API is Running..."
}

// ===== AUTH & USERS =====

async fn login(
    State(state): State<SharedState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<Value>> {
    let user = auth::login(&state.db, &state.config.admin, request)?;
    Ok(Json(json!({ "success": true, "user": user })))
}

async fn register(
    State(state): State<SharedState>,
    Json(request): Json<RegisterUser>,
) -> AppResult<Json<Value>> {
    let user = auth::register(&state.db, request)?;
    Ok(Json(json!({ "success": true, "user": user })))
}

async fn update_preferences(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(preferences): Json<Preferences>,
) -> AppResult<Json<User>> {
    Ok(Json(auth::update_preferences(&state.db, &id, preferences)?))
}

async fn update_birthday(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(update): Json<BirthdayUpdate>,
) -> AppResult<Json<User>> {
    Ok(Json(auth::update_birthday(&state.db, &id, update)?))
}

async fn list_users(State(state): State<SharedState>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(auth::list_users(&state.db)?))
}

async fn get_user(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> AppResult<Json<User>> {
    Ok(Json(auth::get_user(&state.db, &id)?))
}

// ===== MENU =====

async fn list_items(
    State(state): State<SharedState>,
    Query(filter): Query<ItemFilter>,
) -> AppResult<Json<Vec<Item>>> {
    Ok(Json(items::list_items(&state.db, &filter)?))
}

async fn get_item(State(state): State<SharedState>, Path(id): Path<i64>) -> AppResult<Json<Item>> {
    Ok(Json(items::get_item(&state.db, id)?))
}

async fn create_item(
    State(state): State<SharedState>,
    Json(item): Json<NewItem>,
) -> AppResult<(StatusCode, Json<Item>)> {
    Ok((StatusCode::CREATED, Json(items::create_item(&state.db, item)?)))
}

async fn update_item(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(patch): Json<ItemPatch>,
) -> AppResult<Json<Item>> {
    Ok(Json(items::update_item(&state.db, id, patch)?))
}

async fn delete_item(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    items::delete_item(&state.db, id)?;
    Ok(Json(json!({ "success": true })))
}

async fn seed_items(
    State(state): State<SharedState>,
    Json(menu): Json<Vec<NewItem>>,
) -> AppResult<Json<Vec<Item>>> {
    Ok(Json(items::seed_items(&state.db, menu)?))
}

async fn list_categories(State(state): State<SharedState>) -> AppResult<Json<Vec<String>>> {
    Ok(Json(items::list_categories(&state.db)?))
}

async fn low_stock(
    State(state): State<SharedState>,
    Query(query): Query<AlertsQuery>,
) -> AppResult<Json<Vec<Item>>> {
    let threshold = query.threshold.unwrap_or(items::LOW_STOCK_THRESHOLD);
    Ok(Json(items::low_stock(&state.db, threshold)?))
}

// ===== ORDERS =====

async fn list_orders(
    State(state): State<SharedState>,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<Vec<Order>>> {
    Ok(Json(orders::list_orders(&state.db, query.user_id.as_deref())?))
}

async fn place_order(
    State(state): State<SharedState>,
    Json(request): Json<PlaceOrder>,
) -> AppResult<Json<Value>> {
    let today = chrono::Local::now().date_naive();
    let order = orders::place_order(&state.db, request, today)?;
    Ok(Json(json!({ "success": true, "order": order })))
}

async fn get_order(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    Ok(Json(orders::get_order(&state.db, id)?))
}

async fn update_status(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(update): Json<StatusUpdate>,
) -> AppResult<Json<Value>> {
    let order = orders::update_status(&state.db, id, update.status)?;
    Ok(Json(json!({ "success": true, "order": order })))
}

async fn verify_otp(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(check): Json<OtpCheck>,
) -> AppResult<Json<Value>> {
    let order = orders::verify_otp(&state.db, id, &check.otp)?;
    Ok(Json(json!({ "success": true, "order": order })))
}

async fn cancel_order(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(request): Json<CancelRequest>,
) -> AppResult<Json<Value>> {
    let requester = if request
        .requested_by
        .eq_ignore_ascii_case(&state.config.admin.id)
    {
        Requester::Admin
    } else {
        Requester::User(request.requested_by)
    };

    let order = orders::cancel_order(&state.db, id, &requester)?;
    Ok(Json(json!({
        "success": true,
        "message": "Order Cancelled & Refunded.",
        "order": order,
    })))
}

async fn settle_order(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let order = orders::settle_order(&state.db, id)?;
    Ok(Json(json!({ "success": true, "order": order })))
}

async fn set_payment(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(update): Json<PaymentUpdate>,
) -> AppResult<Json<Value>> {
    let order = orders::set_payment_collected(&state.db, id, update.collected)?;
    Ok(Json(json!({ "success": true, "order": order })))
}

async fn add_review(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(review): Json<NewReview>,
) -> AppResult<(StatusCode, Json<Review>)> {
    Ok((
        StatusCode::CREATED,
        Json(reviews::add_review(&state.db, id, review)?),
    ))
}

async fn list_reviews(State(state): State<SharedState>) -> AppResult<Json<Vec<Review>>> {
    Ok(Json(reviews::list_reviews(&state.db)?))
}

// ===== WALLET =====

async fn top_up(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
    Json(request): Json<TopUp>,
) -> AppResult<Json<Value>> {
    let (user, transaction) = wallet::top_up(&state.db, &user_id, request.amount)?;
    Ok(Json(json!({
        "success": true,
        "wallet": user.wallet,
        "transaction": transaction,
    })))
}

async fn list_transactions(
    State(state): State<SharedState>,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<Vec<Transaction>>> {
    Ok(Json(wallet::list_transactions(
        &state.db,
        query.user_id.as_deref(),
    )?))
}

// ===== ANNOUNCEMENTS =====

async fn list_announcements(
    State(state): State<SharedState>,
) -> AppResult<Json<Vec<Announcement>>> {
    Ok(Json(announcements::list_announcements(&state.db)?))
}

async fn create_announcement(
    State(state): State<SharedState>,
    Json(announcement): Json<NewAnnouncement>,
) -> AppResult<(StatusCode, Json<Announcement>)> {
    Ok((
        StatusCode::CREATED,
        Json(announcements::create_announcement(&state.db, announcement)?),
    ))
}

async fn delete_announcement(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    announcements::delete_announcement(&state.db, id)?;
    Ok(Json(json!({ "success": true })))
}

// ===== REPORTS =====

async fn day_summary(
    State(state): State<SharedState>,
    Query(query): Query<SummaryQuery>,
) -> AppResult<Json<DaySummary>> {
    Ok(Json(reports::day_summary(&state.db, query.date)?))
}

async fn alerts(
    State(state): State<SharedState>,
    Query(query): Query<AlertsQuery>,
) -> AppResult<Json<Alerts>> {
    Ok(Json(reports::alerts(
        &state.db,
        query.threshold.unwrap_or(items::LOW_STOCK_THRESHOLD),
        query.delay_minutes.unwrap_or(reports::DELAY_MINUTES),
    )?))
}
