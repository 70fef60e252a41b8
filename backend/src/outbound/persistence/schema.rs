//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Order aggregate roots.
    ///
    /// `id` defaults to `gen_random_uuid()`, so inserts omit it and read the
    /// generated value back.
    orders (id) {
        /// Primary key generated by the database.
        id -> Uuid,
        /// Subject identifier of the customer who placed the order.
        owner_id -> Varchar,
        /// Lowercase lifecycle status name.
        status -> Varchar,
        /// Sum of line totals, computed at creation.
        total -> Numeric,
        delivery_address -> Varchar,
        contact_phone -> Varchar,
        delivery_notes -> Nullable<Varchar>,
        created_at -> Timestamptz,
        /// Refreshed on every status change.
        updated_at -> Timestamptz,
        estimated_delivery -> Timestamptz,
        /// Subject behind the most recent status change.
        updated_by -> Nullable<Varchar>,
    }
}

diesel::table! {
    /// Priced order lines, keyed by order and position.
    order_lines (order_id, position) {
        order_id -> Uuid,
        /// Zero-based index preserving request order.
        position -> Int4,
        product_id -> Varchar,
        product_name -> Varchar,
        unit_price -> Numeric,
        quantity -> Int4,
        total_price -> Numeric,
        notes -> Nullable<Varchar>,
    }
}

diesel::joinable!(order_lines -> orders (order_id));
diesel::allow_tables_to_appear_in_same_query!(orders, order_lines);
