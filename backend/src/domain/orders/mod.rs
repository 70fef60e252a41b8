//! Order aggregate, pricing primitives, and the status state machine.

mod draft;
mod money;
mod order;
mod search;
mod status;
mod validation;

pub use self::draft::{
    DeliveryDetails, OrderDraft, OrderLineDraft, ProductId, ValidatedLine, ValidatedOrder,
};
pub use self::money::{MAX_QUANTITY, MIN_QUANTITY, Money, MoneyError, Quantity};
pub use self::order::{
    DELIVERY_ESTIMATE_HOURS, NewOrder, Order, OrderId, OrderIntegrityError, OrderLine,
    OrderLineRecord, OrderRecord, ProductSnapshot, StatusChange,
};
pub use self::search::{OrderFilterError, OrderListFilter, OrderScope, OrderSearch};
pub use self::status::{OrderStatus, ParseOrderStatusError, StatusTransitionError};
pub use self::validation::{
    ADDRESS_MAX, ADDRESS_MIN, MAX_ORDER_LINES, NOTES_MAX, NotesField, OrderValidationError,
};
