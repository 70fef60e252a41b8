//! Behaviour tests for the order lifecycle service.
//!
//! Scenarios drive the domain service over the in-memory repository and the
//! stub catalog, so pricing, persistence, and compare-and-set behave exactly
//! as they would against PostgreSQL without a database.

use std::cell::RefCell;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{Duration, Utc};
use mockable::DefaultClock;
use order_service::domain::ports::{
    CancelOrderRequest, CatalogGatewayError, CreateOrderRequest, ListOrdersRequest, OrderCommand,
    OrderPayload, OrderQuery, UpdateOrderStatusRequest,
};
use order_service::domain::{
    Error, ErrorCode, Money, OrderDraft, OrderId, OrderLifecycleService, OrderLineDraft,
    OrderListFilter, OrderStatus, Principal, Role, UserId,
};
use order_service::test_support::{InMemoryOrderRepository, StubCatalog};
use pagination::{Page, PageRequest};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use rust_decimal::Decimal;
use tokio::runtime::Runtime;

type Service = OrderLifecycleService<InMemoryOrderRepository, StubCatalog>;

const LIFECYCLE: [OrderStatus; 5] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Preparing,
    OrderStatus::Ready,
    OrderStatus::Completed,
];

fn product_id(name: &str) -> &'static str {
    match name {
        "espresso" => "64b7f0c2a1e4d5f6a7b8c9d0",
        "croissant" => "64b7f0c2a1e4d5f6a7b8c9d1",
        "muffin" => "64b7f0c2a1e4d5f6a7b8c9ff",
        other => panic!("no product id registered for {other}"),
    }
}

fn principal(name: &str, role: Role) -> Principal {
    let subject = UserId::new(name).expect("valid user id");
    Principal::new(subject, role, Utc::now() + Duration::hours(1))
}

fn parse_status(raw: &str) -> OrderStatus {
    OrderStatus::from_str(raw).expect("known status")
}

fn wire_code(code: ErrorCode) -> String {
    serde_json::to_value(code)
        .expect("code serialises")
        .as_str()
        .expect("code is a string")
        .to_owned()
}

struct LifecycleWorld {
    runtime: Runtime,
    repo: Arc<InMemoryOrderRepository>,
    catalog: Arc<StubCatalog>,
    service: Service,
    principal: RefCell<Option<Principal>>,
    order_id: RefCell<Option<OrderId>>,
    outcome: RefCell<Option<Result<OrderPayload, Error>>>,
    race: RefCell<Vec<Result<OrderPayload, Error>>>,
    listing: RefCell<Option<Page<OrderPayload>>>,
}

impl LifecycleWorld {
    fn new() -> Self {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        let repo = Arc::new(InMemoryOrderRepository::new());
        let catalog = Arc::new(StubCatalog::new());
        let service = OrderLifecycleService::new(
            repo.clone(),
            catalog.clone(),
            Arc::new(DefaultClock),
        );
        Self {
            runtime,
            repo,
            catalog,
            service,
            principal: RefCell::new(None),
            order_id: RefCell::new(None),
            outcome: RefCell::new(None),
            race: RefCell::new(Vec::new()),
            listing: RefCell::new(None),
        }
    }

    fn signed_in(&self) -> Principal {
        self.principal.borrow().clone().expect("a signed-in principal")
    }

    fn current_order(&self) -> OrderId {
        self.order_id.borrow().expect("an order in play")
    }

    fn place(&self, who: Principal, lines: &[(i64, &str)]) -> Result<OrderPayload, Error> {
        let draft = OrderDraft {
            items: lines
                .iter()
                .map(|(quantity, product)| OrderLineDraft {
                    product_id: product_id(product).to_owned(),
                    quantity: *quantity,
                    notes: None,
                })
                .collect(),
            delivery_address: "12 Harbour Street, Leith".to_owned(),
            contact_phone: "+441314960000".to_owned(),
            delivery_notes: None,
        };
        let request = CreateOrderRequest {
            principal: who,
            draft,
        };
        self.runtime.block_on(self.service.create(request))
    }

    fn record(&self, outcome: Result<OrderPayload, Error>) {
        if let Ok(order) = &outcome {
            *self.order_id.borrow_mut() = Some(order.id);
        }
        *self.outcome.borrow_mut() = Some(outcome);
    }

    fn move_order(&self, who: Principal, status: OrderStatus) -> Result<OrderPayload, Error> {
        let request = UpdateOrderStatusRequest {
            principal: who,
            order_id: self.current_order(),
            status,
        };
        self.runtime.block_on(self.service.update_status(request))
    }

    fn stored_status(&self) -> OrderStatus {
        self.repo
            .stored(&self.current_order())
            .expect("order is stored")
            .status()
    }
}

#[fixture]
fn world() -> LifecycleWorld {
    LifecycleWorld::new()
}

#[given("the catalog lists {product} at {price}")]
fn the_catalog_lists(world: &LifecycleWorld, product: String, price: String) {
    let amount = Decimal::from_str(&price).expect("decimal price");
    let price = Money::new(amount).expect("non-negative price");
    world
        .catalog
        .put_product(product_id(&product), &product, price, true);
}

#[given("the catalog times out")]
fn the_catalog_times_out(world: &LifecycleWorld) {
    world
        .catalog
        .fail_with(Some(CatalogGatewayError::timeout("no answer within 10s")));
}

#[given("customer {name} is signed in")]
fn customer_is_signed_in(world: &LifecycleWorld, name: String) {
    *world.principal.borrow_mut() = Some(principal(&name, Role::Customer));
}

#[given("an order placed by customer {name} for {quantity} {product}")]
fn an_order_placed_by(world: &LifecycleWorld, name: String, quantity: String, product: String) {
    let quantity = quantity.parse().expect("numeric quantity");
    let placed = world
        .place(principal(&name, Role::Customer), &[(quantity, product.as_str())])
        .expect("order placement succeeds");
    *world.order_id.borrow_mut() = Some(placed.id);
}

#[given("the order has reached {status}")]
fn the_order_has_reached(world: &LifecycleWorld, status: String) {
    let target = parse_status(&status);
    let admin = principal("ops", Role::Admin);
    for next in LIFECYCLE.iter().skip(1) {
        world
            .move_order(admin.clone(), *next)
            .expect("lifecycle step succeeds");
        if *next == target {
            return;
        }
    }
    panic!("{status} is not on the forward lifecycle");
}

#[when("the customer orders breakfast")]
fn the_customer_orders_breakfast(world: &LifecycleWorld) {
    let outcome = world.place(world.signed_in(), &[(1, "espresso"), (3, "croissant")]);
    world.record(outcome);
}

#[when("the customer places an order for {quantity} {product}")]
fn the_customer_places_an_order(world: &LifecycleWorld, quantity: String, product: String) {
    let quantity = quantity.parse().expect("numeric quantity");
    let outcome = world.place(world.signed_in(), &[(quantity, product.as_str())]);
    world.record(outcome);
}

#[when("seller {name} moves the order to {status}")]
fn seller_moves_the_order(world: &LifecycleWorld, name: String, status: String) {
    let outcome = world.move_order(principal(&name, Role::Seller), parse_status(&status));
    world.record(outcome);
}

#[when("customer {name} cancels the order")]
fn customer_cancels_the_order(world: &LifecycleWorld, name: String) {
    let request = CancelOrderRequest {
        principal: principal(&name, Role::Customer),
        order_id: world.current_order(),
    };
    let outcome = world.runtime.block_on(world.service.cancel(request));
    world.record(outcome);
}

#[when("two sellers move the order to {status} at the same time")]
fn two_sellers_race(world: &LifecycleWorld, status: String) {
    let status = parse_status(&status);
    world.repo.hold_next_reads(2);
    let first = UpdateOrderStatusRequest {
        principal: principal("bob", Role::Seller),
        order_id: world.current_order(),
        status,
    };
    let second = UpdateOrderStatusRequest {
        principal: principal("dana", Role::Seller),
        ..first.clone()
    };
    let (a, b) = world.runtime.block_on(async {
        tokio::join!(
            world.service.update_status(first),
            world.service.update_status(second)
        )
    });
    *world.race.borrow_mut() = vec![a, b];
}

fn list_as(world: &LifecycleWorld, who: Principal) {
    let request = ListOrdersRequest {
        principal: who,
        filter: OrderListFilter::default(),
        page: PageRequest::default(),
    };
    let page = world
        .runtime
        .block_on(world.service.list(request))
        .expect("listing succeeds");
    *world.listing.borrow_mut() = Some(page);
}

#[when("customer {name} lists orders")]
fn customer_lists_orders(world: &LifecycleWorld, name: String) {
    list_as(world, principal(&name, Role::Customer));
}

#[when("seller {name} lists orders")]
fn seller_lists_orders(world: &LifecycleWorld, name: String) {
    list_as(world, principal(&name, Role::Seller));
}

#[then("the order is {status} with total {total}")]
fn the_order_is(world: &LifecycleWorld, status: String, total: String) {
    let outcome = world.outcome.borrow();
    let order = outcome
        .as_ref()
        .expect("an outcome")
        .as_ref()
        .expect("order placement succeeded");
    assert_eq!(order.status, parse_status(&status));
    assert_eq!(order.total.to_string(), total);
    assert_eq!(order.owner_id.as_ref(), "alice");
}

#[then("the estimated delivery is two hours after creation")]
fn the_estimated_delivery(world: &LifecycleWorld) {
    let outcome = world.outcome.borrow();
    let order = outcome
        .as_ref()
        .expect("an outcome")
        .as_ref()
        .expect("order placement succeeded");
    assert_eq!(order.estimated_delivery - order.created_at, Duration::hours(2));
    assert_eq!(order.updated_at, order.created_at);
}

#[then("the store holds {count} orders")]
fn the_store_holds(world: &LifecycleWorld, count: String) {
    let expected: usize = count.parse().expect("numeric count");
    assert_eq!(world.repo.len(), expected);
}

#[then("the request fails with {code}")]
fn the_request_fails_with(world: &LifecycleWorld, code: String) {
    let outcome = world.outcome.borrow();
    match outcome.as_ref().expect("an outcome") {
        Ok(order) => panic!("expected {code}, got order {}", order.id),
        Err(error) => assert_eq!(wire_code(error.code()), code, "{error}"),
    }
}

#[then("the order status is {status}")]
fn the_order_status_is(world: &LifecycleWorld, status: String) {
    assert_eq!(world.stored_status(), parse_status(&status));
}

#[then("one update succeeds and the other conflicts")]
fn one_update_wins(world: &LifecycleWorld) {
    let race = world.race.borrow();
    let winners = race.iter().filter(|outcome| outcome.is_ok()).count();
    let conflicts = race
        .iter()
        .filter(|outcome| {
            outcome
                .as_ref()
                .is_err_and(|error| error.code() == ErrorCode::Conflict)
        })
        .count();
    assert_eq!((winners, conflicts), (1, 1), "{race:?}");
}

#[then("the listing total is {total}")]
fn the_listing_total_is(world: &LifecycleWorld, total: String) {
    let expected: u64 = total.parse().expect("numeric total");
    let listing = world.listing.borrow();
    let page = listing.as_ref().expect("a listing");
    assert_eq!(page.total(), expected);
    assert!(
        page.items()
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at),
        "listing is newest first"
    );
}

#[scenario(
    path = "tests/features/order_lifecycle.feature",
    name = "Placing an order prices every line from the catalog"
)]
fn placing_an_order_prices_every_line(world: LifecycleWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/order_lifecycle.feature",
    name = "Ordering an unknown product stores nothing"
)]
fn ordering_an_unknown_product_stores_nothing(world: LifecycleWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/order_lifecycle.feature",
    name = "A catalog timeout stores nothing"
)]
fn a_catalog_timeout_stores_nothing(world: LifecycleWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/order_lifecycle.feature",
    name = "Skipping a lifecycle step is rejected"
)]
fn skipping_a_lifecycle_step_is_rejected(world: LifecycleWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/order_lifecycle.feature",
    name = "An order walks the full lifecycle"
)]
fn an_order_walks_the_full_lifecycle(world: LifecycleWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/order_lifecycle.feature",
    name = "Customers cannot touch other customers' orders"
)]
fn customers_cannot_touch_other_orders(world: LifecycleWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/order_lifecycle.feature",
    name = "Customers may cancel a pending order"
)]
fn customers_may_cancel_a_pending_order(world: LifecycleWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/order_lifecycle.feature",
    name = "Cancelling a ready order is rejected"
)]
fn cancelling_a_ready_order_is_rejected(world: LifecycleWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/order_lifecycle.feature",
    name = "Concurrent status updates have exactly one winner"
)]
fn concurrent_status_updates_have_one_winner(world: LifecycleWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/order_lifecycle.feature",
    name = "Listings are scoped to the caller"
)]
fn listings_are_scoped_to_the_caller(world: LifecycleWorld) {
    drop(world);
}
