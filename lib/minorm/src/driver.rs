//! Pieces shared by the sqlx-based backends.
//!
//! Backends build and run the concrete sqlx query themselves; the error
//! classification, row collection and transaction finish live here.

use sqlx::{Database, Transaction};
use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

use crate::{OrmError, Row};

/// Map a driver error, singling out constraint violations.
pub fn store_error(e: sqlx::Error) -> OrmError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() || db.is_foreign_key_violation() || db.is_check_violation()
        {
            return OrmError::ConstraintViolation(db.message().to_string());
        }
    }
    OrmError::Store(e.to_string())
}

/// Drain `stream` into decoded rows, stopping after `limit` rows.
///
/// A limit of zero reads every row.
pub async fn collect_rows<S, R, F>(
    mut stream: S,
    limit: Option<usize>,
    decode: F,
) -> Result<Vec<Row>, OrmError>
where
    S: Stream<Item = Result<R, sqlx::Error>> + Unpin,
    F: Fn(&R) -> Result<Row, OrmError>,
{
    let limit = limit.filter(|n| *n > 0);
    let mut rows = Vec::new();
    while let Some(row) = stream.next().await {
        let row = row.map_err(store_error)?;
        rows.push(decode(&row)?);
        if limit.is_some_and(|n| rows.len() >= n) {
            break;
        }
    }
    info!("rows returned: {}", rows.len());
    Ok(rows)
}

/// Commit `tx` when the statement succeeded, roll it back otherwise.
pub async fn finish_transaction<DB: Database>(
    tx: Transaction<'_, DB>,
    result: Result<u64, sqlx::Error>,
) -> Result<u64, OrmError> {
    match result {
        Ok(affected) => {
            tx.commit().await.map_err(store_error)?;
            Ok(affected)
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                warn!("rollback failed: {}", rollback);
            }
            Err(store_error(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    fn decode(n: &i64) -> Result<Row, OrmError> {
        let mut row = Row::new();
        row.insert("n".to_string(), Value::Int(*n));
        Ok(row)
    }

    #[test]
    fn non_database_errors_are_store_errors() {
        assert!(matches!(
            store_error(sqlx::Error::RowNotFound),
            OrmError::Store(_)
        ));
        assert!(matches!(
            store_error(sqlx::Error::PoolTimedOut),
            OrmError::Store(_)
        ));
    }

    #[tokio::test]
    async fn collect_rows_honours_limit() {
        let items = || tokio_stream::iter(vec![Ok::<i64, sqlx::Error>(1), Ok(2), Ok(3)]);

        let rows = collect_rows(items(), Some(2), decode).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["n"], Value::Int(2));

        assert_eq!(collect_rows(items(), None, decode).await.unwrap().len(), 3);
        assert_eq!(collect_rows(items(), Some(0), decode).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn collect_rows_stops_at_driver_error() {
        let items = tokio_stream::iter(vec![Ok(1i64), Err(sqlx::Error::RowNotFound), Ok(3)]);
        let err = collect_rows(items, None, decode).await.unwrap_err();
        assert!(matches!(err, OrmError::Store(_)));
    }

    #[tokio::test]
    async fn decode_failure_is_returned() {
        let items = tokio_stream::iter(vec![Ok::<i64, sqlx::Error>(1)]);
        let err = collect_rows(items, None, |_: &i64| {
            Err(OrmError::Decode("bad column".to_string()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, OrmError::Decode(_)));
    }
}
