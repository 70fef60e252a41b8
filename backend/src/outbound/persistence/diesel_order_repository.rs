//! PostgreSQL-backed `OrderRepository` implementation using Diesel ORM.
//!
//! Orders and their lines live in two tables. Inserts write both inside one
//! transaction; status changes are a single guarded `UPDATE ... RETURNING`.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{OrderRepository, OrderRepositoryError};
use crate::domain::{
    Money, NewOrder, Order, OrderId, OrderLineRecord, OrderRecord, OrderScope, OrderSearch,
    OrderStatus, ProductId, Quantity, StatusChange, UserId,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{NewOrderLineRow, NewOrderRow, OrderLineRow, OrderRow};
use super::pool::{DbPool, PoolError};
use super::schema::{order_lines, orders};

/// Diesel-backed implementation of the order repository port.
#[derive(Clone)]
pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> OrderRepositoryError {
    map_basic_pool_error(error, OrderRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> OrderRepositoryError {
    map_basic_diesel_error(
        error,
        OrderRepositoryError::query,
        OrderRepositoryError::connection,
    )
}

fn corrupt(field: &str, detail: impl std::fmt::Display) -> OrderRepositoryError {
    OrderRepositoryError::query(format!("stored order has invalid {field}: {detail}"))
}

fn line_to_record(
    index: usize,
    row: OrderLineRow,
) -> Result<OrderLineRecord, OrderRepositoryError> {
    if usize::try_from(row.position).ok() != Some(index) {
        return Err(corrupt(
            "line position",
            format!("expected {index}, found {}", row.position),
        ));
    }
    Ok(OrderLineRecord {
        product_id: ProductId::parse(&row.product_id)
            .ok_or_else(|| corrupt("product_id", &row.product_id))?,
        product_name: row.product_name,
        unit_price: Money::new(row.unit_price).map_err(|err| corrupt("unit_price", err))?,
        quantity: Quantity::new(i64::from(row.quantity))
            .ok_or_else(|| corrupt("quantity", row.quantity))?,
        total_price: Money::new(row.total_price).map_err(|err| corrupt("total_price", err))?,
        notes: row.notes,
    })
}

/// Convert an order row and its lines into the aggregate.
///
/// Lines must arrive sorted by position and numbered contiguously from zero.
fn row_to_order(row: OrderRow, lines: Vec<OrderLineRow>) -> Result<Order, OrderRepositoryError> {
    let OrderRow {
        id,
        owner_id,
        status,
        total,
        delivery_address,
        contact_phone,
        delivery_notes,
        created_at,
        updated_at,
        estimated_delivery,
        updated_by,
    } = row;

    let record = OrderRecord {
        id: OrderId::new(id),
        owner_id: UserId::new(owner_id).map_err(|err| corrupt("owner_id", err))?,
        items: lines
            .into_iter()
            .enumerate()
            .map(|(index, line)| line_to_record(index, line))
            .collect::<Result<Vec<_>, _>>()?,
        status: status
            .parse::<OrderStatus>()
            .map_err(|err| corrupt("status", err))?,
        total: Money::new(total).map_err(|err| corrupt("total", err))?,
        delivery_address,
        contact_phone,
        delivery_notes,
        created_at,
        updated_at,
        estimated_delivery,
        updated_by: updated_by
            .map(UserId::new)
            .transpose()
            .map_err(|err| corrupt("updated_by", err))?,
    };
    Order::restore(record).map_err(|err| OrderRepositoryError::query(err.to_string()))
}

fn to_line_rows(
    order_id: Uuid,
    order: &NewOrder,
) -> Result<Vec<NewOrderLineRow<'_>>, OrderRepositoryError> {
    order
        .items()
        .iter()
        .enumerate()
        .map(|(position, line)| {
            Ok(NewOrderLineRow {
                order_id,
                position: i32::try_from(position)
                    .map_err(|_| OrderRepositoryError::query("line position exceeds i32 range"))?,
                product_id: line.product_id().as_str(),
                product_name: line.product_name(),
                unit_price: line.unit_price().amount(),
                quantity: i32::try_from(line.quantity().get())
                    .map_err(|_| OrderRepositoryError::query("quantity exceeds i32 range"))?,
                total_price: line.total_price().amount(),
                notes: line.notes(),
            })
        })
        .collect()
}

/// Base query for the visible, filtered order set.
fn filtered_orders(search: &OrderSearch) -> orders::BoxedQuery<'_, Pg> {
    let mut query = orders::table.into_boxed();
    if let OrderScope::Owner(owner) = &search.scope {
        query = query.filter(orders::owner_id.eq(owner.as_ref()));
    }
    let filter = &search.filter;
    if let Some(status) = filter.status() {
        query = query.filter(orders::status.eq(status.as_str()));
    }
    if let Some(from) = filter.created_from() {
        query = query.filter(orders::created_at.ge(from));
    }
    if let Some(to) = filter.created_to() {
        query = query.filter(orders::created_at.le(to));
    }
    if let Some(min) = filter.min_total() {
        query = query.filter(orders::total.ge(min.amount()));
    }
    if let Some(max) = filter.max_total() {
        query = query.filter(orders::total.le(max.amount()));
    }
    query
}

async fn load_lines(
    conn: &mut AsyncPgConnection,
    order_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<OrderLineRow>>, diesel::result::Error> {
    let rows: Vec<OrderLineRow> = order_lines::table
        .filter(order_lines::order_id.eq_any(order_ids))
        .order((order_lines::order_id, order_lines::position))
        .select(OrderLineRow::as_select())
        .load(conn)
        .await?;
    let mut grouped: HashMap<Uuid, Vec<OrderLineRow>> = HashMap::new();
    for row in rows {
        grouped.entry(row.order_id).or_default().push(row);
    }
    Ok(grouped)
}

fn assemble(
    rows: Vec<OrderRow>,
    mut lines: HashMap<Uuid, Vec<OrderLineRow>>,
) -> Result<Vec<Order>, OrderRepositoryError> {
    rows.into_iter()
        .map(|row| {
            let stored_lines = lines.remove(&row.id).unwrap_or_default();
            row_to_order(row, stored_lines)
        })
        .collect()
}

#[async_trait]
impl OrderRepository for DieselOrderRepository {
    async fn insert(&self, order: &NewOrder) -> Result<Order, OrderRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let new_row = NewOrderRow {
            owner_id: order.owner_id().as_ref(),
            status: order.status().as_str(),
            total: order.total().amount(),
            delivery_address: order.delivery().address(),
            contact_phone: order.delivery().phone(),
            delivery_notes: order.delivery().notes(),
            created_at: order.created_at(),
            updated_at: order.created_at(),
            estimated_delivery: order.estimated_delivery(),
        };
        // The order id is generated by the insert; lines are stamped with it below.
        let mut line_rows = to_line_rows(Uuid::nil(), order)?;

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (row, lines) = conn
            .transaction(|conn| {
                async move {
                    let row: OrderRow = diesel::insert_into(orders::table)
                        .values(&new_row)
                        .returning(OrderRow::as_returning())
                        .get_result(conn)
                        .await?;
                    for line in &mut line_rows {
                        line.order_id = row.id;
                    }
                    let mut lines: Vec<OrderLineRow> = diesel::insert_into(order_lines::table)
                        .values(&line_rows)
                        .returning(OrderLineRow::as_returning())
                        .get_results(conn)
                        .await?;
                    lines.sort_by_key(|line| line.position);
                    Ok::<_, diesel::result::Error>((row, lines))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        row_to_order(row, lines)
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = orders::table
            .filter(orders::id.eq(id.as_uuid()))
            .select(OrderRow::as_select())
            .first::<OrderRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut lines = load_lines(&mut conn, &[row.id])
            .await
            .map_err(map_diesel_error)?;
        let stored_lines = lines.remove(&row.id).unwrap_or_default();
        row_to_order(row, stored_lines).map(Some)
    }

    async fn list(&self, search: &OrderSearch) -> Result<(Vec<Order>, u64), OrderRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let offset = i64::try_from(search.page.skip())
            .map_err(|_| OrderRepositoryError::query("skip exceeds i64 range"))?;
        let limit = i64::from(search.page.limit());
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // Count, page, and lines are read in one transaction.
        let (total, rows, lines) = conn
            .transaction(|conn| {
                async move {
                    let total: i64 = filtered_orders(search).count().get_result(conn).await?;
                    let rows: Vec<OrderRow> = filtered_orders(search)
                        .order((orders::created_at.desc(), orders::id.desc()))
                        .offset(offset)
                        .limit(limit)
                        .select(OrderRow::as_select())
                        .load(conn)
                        .await?;
                    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
                    let lines = load_lines(conn, &ids).await?;
                    Ok::<_, diesel::result::Error>((total, rows, lines))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        let total = u64::try_from(total)
            .map_err(|_| OrderRepositoryError::query("negative order count"))?;
        Ok((assemble(rows, lines)?, total))
    }

    async fn compare_and_set_status(
        &self,
        change: &StatusChange,
    ) -> Result<Option<Order>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(
            orders::table
                .filter(orders::id.eq(change.order_id.as_uuid()))
                .filter(orders::status.eq(change.expected.as_str())),
        )
        .set((
            orders::status.eq(change.next.as_str()),
            orders::updated_at.eq(change.at),
            orders::updated_by.eq(Some(change.actor.as_ref())),
        ))
        .returning(OrderRow::as_returning())
        .get_result::<OrderRow>(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;
        let Some(row) = updated else {
            return Ok(None);
        };

        let mut lines = load_lines(&mut conn, &[row.id])
            .await
            .map_err(map_diesel_error)?;
        let stored_lines = lines.remove(&row.id).unwrap_or_default();
        row_to_order(row, stored_lines).map(Some)
    }

    async fn ping(&self) -> Result<(), OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for error mapping and row conversion edge cases.

    use chrono::{Duration, Utc};
    use rstest::{fixture, rstest};
    use rust_decimal_macros::dec;

    use super::*;

    #[fixture]
    fn order_row() -> OrderRow {
        let created_at = Utc::now();
        OrderRow {
            id: Uuid::new_v4(),
            owner_id: "customer_1".to_owned(),
            status: "confirmed".to_owned(),
            total: dec!(41.96),
            delivery_address: "221B Baker Street, London".to_owned(),
            contact_phone: "+447700900123".to_owned(),
            delivery_notes: None,
            created_at,
            updated_at: created_at,
            estimated_delivery: created_at + Duration::hours(2),
            updated_by: Some("seller_7".to_owned()),
        }
    }

    fn line_rows(order_id: Uuid) -> Vec<OrderLineRow> {
        vec![
            OrderLineRow {
                order_id,
                position: 0,
                product_id: "64b7f0c2a1e4d5f6a7b8c9d0".to_owned(),
                product_name: "Margherita".to_owned(),
                unit_price: dec!(29.99),
                quantity: 1,
                total_price: dec!(29.99),
                notes: None,
            },
            OrderLineRow {
                order_id,
                position: 1,
                product_id: "64b7f0c2a1e4d5f6a7b8c9d1".to_owned(),
                product_name: "Lemon soda".to_owned(),
                unit_price: dec!(3.99),
                quantity: 3,
                total_price: dec!(11.97),
                notes: Some("Cold".to_owned()),
            },
        ]
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let repo_err = map_pool_error(PoolError::checkout("connection refused"));
        assert!(matches!(repo_err, OrderRepositoryError::Connection { .. }));
        assert!(repo_err.to_string().contains("connection refused"));
    }

    #[rstest]
    fn rows_convert_into_the_aggregate(order_row: OrderRow) {
        let lines = line_rows(order_row.id);
        let order = row_to_order(order_row, lines).expect("consistent rows");
        assert_eq!(order.status(), OrderStatus::Confirmed);
        assert_eq!(order.items().len(), 2);
        assert_eq!(order.updated_by().map(AsRef::as_ref), Some("seller_7"));
    }

    #[rstest]
    fn unknown_status_is_rejected(mut order_row: OrderRow) {
        order_row.status = "shipped".to_owned();
        let lines = line_rows(order_row.id);
        let error = row_to_order(order_row, lines).expect_err("bad status");
        assert!(error.to_string().contains("status"));
    }

    #[rstest]
    fn tampered_total_is_rejected(mut order_row: OrderRow) {
        order_row.total = dec!(1.00);
        let lines = line_rows(order_row.id);
        let error = row_to_order(order_row, lines).expect_err("bad total");
        assert!(matches!(error, OrderRepositoryError::Query { .. }));
    }

    #[rstest]
    #[case::gap(0, 2)]
    #[case::duplicate(0, 0)]
    #[case::offset(1, 2)]
    fn non_contiguous_positions_are_rejected(
        order_row: OrderRow,
        #[case] first: i32,
        #[case] second: i32,
    ) {
        let mut lines = line_rows(order_row.id);
        lines[0].position = first;
        lines[1].position = second;
        let error = row_to_order(order_row, lines).expect_err("bad positions");
        assert!(error.to_string().contains("line position"), "{error}");
    }

    #[rstest]
    fn missing_lines_are_rejected(order_row: OrderRow) {
        let error = row_to_order(order_row, Vec::new()).expect_err("no lines");
        assert!(error.to_string().contains("no lines"));
    }
}
