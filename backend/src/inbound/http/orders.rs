//! Order HTTP handlers.
//!
//! ```text
//! POST   /api/v1/orders
//! GET    /api/v1/orders
//! GET    /api/v1/orders/{order_id}
//! PATCH  /api/v1/orders/{order_id}/status
//! DELETE /api/v1/orders/{order_id}/cancel
//! ```

use actix_web::http::header::LINK;
use actix_web::{HttpRequest, HttpResponse, delete, get, patch, post, web};
use chrono::{DateTime, Utc};
use pagination::PageRequest;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{
    CancelOrderRequest, CreateOrderRequest, GetOrderRequest, ListOrdersRequest, OrderLinePayload,
    OrderPayload, UpdateOrderStatusRequest,
};
use crate::domain::{Error, OrderDraft, OrderFilterError, OrderLineDraft, OrderListFilter};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_range_error, missing_field_error, parse_optional_amount,
    parse_optional_rfc3339_timestamp, parse_optional_status, parse_order_id, parse_status,
};

/// One requested order line.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct OrderItemBody {
    /// Catalog product identifier (24 hexadecimal characters).
    #[schema(example = "64b7f0c2a1e4d5f6a7b8c9d0")]
    pub product_id: String,
    #[schema(minimum = 1, maximum = 100, example = 2)]
    pub quantity: i64,
    pub notes: Option<String>,
}

/// Request payload for placing an order. Prices are computed server-side.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateOrderBody {
    pub items: Option<Vec<OrderItemBody>>,
    #[schema(example = "12 Harbour Street, Leith")]
    pub delivery_address: Option<String>,
    #[schema(example = "+441314960000")]
    pub contact_phone: Option<String>,
    pub delivery_notes: Option<String>,
}

/// Request payload for a status change.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct UpdateStatusBody {
    #[schema(example = "confirmed")]
    pub status: Option<String>,
}

/// Query parameters for listing orders.
#[derive(Debug, Default, Clone, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListOrdersQuery {
    /// Number of orders to skip.
    #[param(minimum = 0)]
    pub skip: Option<i64>,
    /// Page size, clamped to 1..=100. Defaults to 10.
    pub limit: Option<i64>,
    /// Only orders in this status.
    pub status: Option<String>,
    /// Inclusive lower bound on creation time (RFC 3339).
    pub from_date: Option<String>,
    /// Inclusive upper bound on creation time (RFC 3339).
    pub to_date: Option<String>,
    /// Inclusive lower bound on the order total.
    pub min_total: Option<String>,
    /// Inclusive upper bound on the order total.
    pub max_total: Option<String>,
}

/// Priced order line.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    #[schema(example = "3.99")]
    pub unit_price: String,
    #[schema(example = "11.97")]
    pub total_price: String,
    pub notes: Option<String>,
}

/// Order as returned to clients.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct OrderResponse {
    #[schema(format = "uuid")]
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderItemResponse>,
    #[schema(example = "41.96")]
    pub total: String,
    #[schema(example = "pending")]
    pub status: String,
    pub delivery_address: String,
    pub contact_phone: String,
    pub delivery_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub estimated_delivery: DateTime<Utc>,
    pub updated_by: Option<String>,
}

/// Envelope for create and status-update responses.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct OrderMutationResponse {
    pub message: String,
    pub order: OrderResponse,
}

/// Envelope for a successful cancellation.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct OrderCancelledResponse {
    pub message: String,
}

/// One page of orders.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub skip: u64,
    pub limit: u32,
    pub has_more: bool,
}

impl From<OrderLinePayload> for OrderItemResponse {
    fn from(value: OrderLinePayload) -> Self {
        Self {
            product_id: value.product_id.as_str().to_owned(),
            product_name: value.product_name,
            quantity: value.quantity,
            unit_price: value.unit_price.to_string(),
            total_price: value.total_price.to_string(),
            notes: value.notes,
        }
    }
}

impl From<OrderPayload> for OrderResponse {
    fn from(value: OrderPayload) -> Self {
        Self {
            id: value.id.to_string(),
            user_id: value.owner_id.to_string(),
            items: value.items.into_iter().map(OrderItemResponse::from).collect(),
            total: value.total.to_string(),
            status: value.status.to_string(),
            delivery_address: value.delivery_address,
            contact_phone: value.contact_phone,
            delivery_notes: value.delivery_notes,
            created_at: value.created_at,
            updated_at: value.updated_at,
            estimated_delivery: value.estimated_delivery,
            updated_by: value.updated_by.map(|id| id.to_string()),
        }
    }
}

fn parse_create_body(body: CreateOrderBody) -> Result<OrderDraft, Error> {
    let items = body
        .items
        .ok_or_else(|| missing_field_error(FieldName::new("items")))?;
    let delivery_address = body
        .delivery_address
        .ok_or_else(|| missing_field_error(FieldName::new("delivery_address")))?;
    let contact_phone = body
        .contact_phone
        .ok_or_else(|| missing_field_error(FieldName::new("contact_phone")))?;
    Ok(OrderDraft {
        items: items
            .into_iter()
            .map(|item| OrderLineDraft {
                product_id: item.product_id,
                quantity: item.quantity,
                notes: item.notes,
            })
            .collect(),
        delivery_address,
        contact_phone,
        delivery_notes: body.delivery_notes,
    })
}

fn map_filter_error(error: OrderFilterError) -> Error {
    match &error {
        OrderFilterError::InvertedDateRange { .. } => invalid_range_error(
            FieldName::new("from_date"),
            FieldName::new("to_date"),
            error.to_string(),
        ),
        OrderFilterError::InvertedTotalRange { .. } => invalid_range_error(
            FieldName::new("min_total"),
            FieldName::new("max_total"),
            error.to_string(),
        ),
    }
}

fn parse_list_query(query: ListOrdersQuery) -> Result<(OrderListFilter, PageRequest), Error> {
    let page = PageRequest::new(query.skip, query.limit).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({
            "field": "skip",
            "code": "invalid_skip",
        }))
    })?;
    let filter = OrderListFilter::new(
        parse_optional_status(query.status, FieldName::new("status"))?,
        parse_optional_rfc3339_timestamp(query.from_date, FieldName::new("from_date"))?,
        parse_optional_rfc3339_timestamp(query.to_date, FieldName::new("to_date"))?,
        parse_optional_amount(query.min_total, FieldName::new("min_total"))?,
        parse_optional_amount(query.max_total, FieldName::new("max_total"))?,
    )
    .map_err(map_filter_error)?;
    Ok((filter, page))
}

/// Place an order for the authenticated caller.
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderBody,
    responses(
        (status = 201, description = "Order created", body = OrderMutationResponse),
        (status = 400, description = "Invalid order", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 502, description = "Catalog failure", body = ErrorSchema),
        (status = 503, description = "Order store unavailable", body = ErrorSchema),
        (status = 504, description = "Catalog timeout", body = ErrorSchema)
    ),
    tags = ["orders"],
    operation_id = "createOrder"
)]
#[post("/orders")]
pub async fn create_order(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<CreateOrderBody>,
) -> ApiResult<HttpResponse> {
    let draft = parse_create_body(payload.into_inner())?;
    let order = state
        .orders
        .create(CreateOrderRequest {
            principal: auth.into_inner(),
            draft,
        })
        .await?;
    Ok(HttpResponse::Created().json(OrderMutationResponse {
        message: "Order created successfully".to_owned(),
        order: order.into(),
    }))
}

/// List orders visible to the caller, newest first.
///
/// Customers see their own orders; sellers and admins see every order.
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(ListOrdersQuery),
    responses(
        (status = 200, description = "One page of orders", body = OrderListResponse),
        (status = 400, description = "Invalid filter", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Order store unavailable", body = ErrorSchema)
    ),
    tags = ["orders"],
    operation_id = "listOrders"
)]
#[get("/orders")]
pub async fn list_orders(
    state: web::Data<HttpState>,
    auth: Authenticated,
    request: HttpRequest,
    query: web::Query<ListOrdersQuery>,
) -> ApiResult<HttpResponse> {
    let (filter, page) = parse_list_query(query.into_inner())?;
    let listed = state
        .orders_query
        .list(ListOrdersRequest {
            principal: auth.into_inner(),
            filter,
            page,
        })
        .await?;

    let mut response = HttpResponse::Ok();
    if let Some(next) = listed.next_link(&request.full_url()) {
        response.insert_header((LINK, format!("<{next}>; rel=\"next\"")));
    }
    let body = OrderListResponse {
        total: listed.total(),
        skip: listed.skip(),
        limit: listed.limit(),
        has_more: listed.has_more(),
        orders: listed
            .into_items()
            .into_iter()
            .map(OrderResponse::from)
            .collect(),
    };
    Ok(response.json(body))
}

/// Fetch one order.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{order_id}",
    params(("order_id" = String, Path, description = "Order identifier", format = "uuid")),
    responses(
        (status = 200, description = "The order", body = OrderResponse),
        (status = 400, description = "Malformed order id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Order not found", body = ErrorSchema)
    ),
    tags = ["orders"],
    operation_id = "getOrder"
)]
#[get("/orders/{order_id}")]
pub async fn get_order(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<OrderResponse>> {
    let order_id = parse_order_id(&path.into_inner())?;
    let order = state
        .orders_query
        .get(GetOrderRequest {
            principal: auth.into_inner(),
            order_id,
        })
        .await?;
    Ok(web::Json(order.into()))
}

/// Move an order along the status table. Sellers and admins only.
#[utoipa::path(
    patch,
    path = "/api/v1/orders/{order_id}/status",
    params(("order_id" = String, Path, description = "Order identifier", format = "uuid")),
    request_body = UpdateStatusBody,
    responses(
        (status = 200, description = "Status updated", body = OrderMutationResponse),
        (status = 400, description = "Invalid status or transition", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Role may not update status", body = ErrorSchema),
        (status = 404, description = "Order not found", body = ErrorSchema),
        (status = 409, description = "Order changed concurrently", body = ErrorSchema)
    ),
    tags = ["orders"],
    operation_id = "updateOrderStatus"
)]
#[patch("/orders/{order_id}/status")]
pub async fn update_order_status(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
    payload: web::Json<UpdateStatusBody>,
) -> ApiResult<web::Json<OrderMutationResponse>> {
    let order_id = parse_order_id(&path.into_inner())?;
    let raw_status = payload
        .into_inner()
        .status
        .ok_or_else(|| missing_field_error(FieldName::new("status")))?;
    let status = parse_status(&raw_status, FieldName::new("status"))?;
    let order = state
        .orders
        .update_status(UpdateOrderStatusRequest {
            principal: auth.into_inner(),
            order_id,
            status,
        })
        .await?;
    Ok(web::Json(OrderMutationResponse {
        message: format!("Order status updated to {status}"),
        order: order.into(),
    }))
}

/// Cancel a pending or confirmed order.
#[utoipa::path(
    delete,
    path = "/api/v1/orders/{order_id}/cancel",
    params(("order_id" = String, Path, description = "Order identifier", format = "uuid")),
    responses(
        (status = 200, description = "Order cancelled", body = OrderCancelledResponse),
        (status = 400, description = "Order cannot be cancelled", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Order not found", body = ErrorSchema),
        (status = 409, description = "Order changed concurrently", body = ErrorSchema)
    ),
    tags = ["orders"],
    operation_id = "cancelOrder"
)]
#[delete("/orders/{order_id}/cancel")]
pub async fn cancel_order(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<OrderCancelledResponse>> {
    let order_id = parse_order_id(&path.into_inner())?;
    state
        .orders
        .cancel(CancelOrderRequest {
            principal: auth.into_inner(),
            order_id,
        })
        .await?;
    Ok(web::Json(OrderCancelledResponse {
        message: "Order cancelled successfully".to_owned(),
    }))
}

/// Register every order handler on a scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_order)
        .service(list_orders)
        .service(get_order)
        .service(update_order_status)
        .service(cancel_order);
}

#[cfg(test)]
#[path = "orders_tests.rs"]
mod tests;
