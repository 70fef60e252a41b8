//! Diesel and pool error mapping shared by the PostgreSQL repositories.

use tracing::debug;

use super::pool::PoolError;

/// Map a pool failure onto a repository's connection error constructor.
pub fn map_basic_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map a Diesel failure onto query or connection constructors.
///
/// Closed connections and client-side connection failures are connection
/// errors; everything else is a query error. Database messages are logged at
/// debug level and never returned, so SQL details stay out of responses.
pub fn map_basic_diesel_error<E, Q, C>(error: diesel::result::Error, query: Q, connection: C) -> E
where
    Q: Fn(&'static str) -> E,
    C: Fn(&'static str) -> E,
{
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _)
        | DieselError::BrokenTransactionManager => connection("database connection error"),
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
            query("database serialization failure")
        }
        DieselError::DatabaseError(_, _) => query("database error"),
        DieselError::DeserializationError(_) | DieselError::SerializationError(_) => {
            query("database value conversion error")
        }
        _ => query("database query error"),
    }
}

#[cfg(test)]
mod tests {
    //! Mapping table coverage.

    use diesel::result::{DatabaseErrorKind, Error as DieselError};
    use rstest::rstest;

    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    enum Mapped {
        Query(&'static str),
        Connection(&'static str),
    }

    fn map(error: DieselError) -> Mapped {
        map_basic_diesel_error(error, Mapped::Query, Mapped::Connection)
    }

    #[rstest]
    fn closed_connection_is_a_connection_error() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("server closed the connection".to_owned()),
        );
        assert_eq!(map(error), Mapped::Connection("database connection error"));
    }

    #[rstest]
    fn constraint_violations_are_query_errors() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key".to_owned()),
        );
        assert_eq!(map(error), Mapped::Query("database error"));
    }

    #[rstest]
    fn not_found_is_a_query_error() {
        assert_eq!(map(DieselError::NotFound), Mapped::Query("record not found"));
    }

    #[rstest]
    fn pool_errors_keep_their_message() {
        let mapped: String = map_basic_pool_error(PoolError::checkout("timed out"), |m| m);
        assert_eq!(mapped, "timed out");
    }
}
