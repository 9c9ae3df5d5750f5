//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `StoreError` from `recordstore_core::storage`.
//! Transport failures become `StoreError::Connection`; service errors are
//! mapped per operation.

use std::error::Error;
use std::fmt::{Debug, Display};

use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::operation::batch_get_item::BatchGetItemError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use recordstore_core::storage::StoreError;

/// Map a GetItem SDK error to StoreError.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
    table_name: &str,
) -> StoreError {
    map_sdk_error(err, |err| match err {
        GetItemError::ResourceNotFoundException(_) => {
            StoreError::TableNotFound(table_name.to_string())
        }
        GetItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::ThroughputExceeded("Throughput exceeded, please retry".to_string())
        }
        GetItemError::RequestLimitExceeded(_) => {
            StoreError::ThroughputExceeded("Request limit exceeded, please retry".to_string())
        }
        GetItemError::InternalServerError(_) => {
            StoreError::Service("DynamoDB internal server error".to_string())
        }
        err => map_unmodeled("GetItem", err),
    })
}

/// Map a BatchGetItem SDK error to StoreError.
pub fn map_batch_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<BatchGetItemError, R>,
    table_name: &str,
) -> StoreError {
    map_sdk_error(err, |err| match err {
        BatchGetItemError::ResourceNotFoundException(_) => {
            StoreError::TableNotFound(table_name.to_string())
        }
        BatchGetItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::ThroughputExceeded("Throughput exceeded, please retry".to_string())
        }
        BatchGetItemError::RequestLimitExceeded(_) => {
            StoreError::ThroughputExceeded("Request limit exceeded, please retry".to_string())
        }
        BatchGetItemError::InternalServerError(_) => {
            StoreError::Service("DynamoDB internal server error".to_string())
        }
        err => map_unmodeled("BatchGetItem", err),
    })
}

/// Map a Query SDK error to StoreError.
pub fn map_query_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<QueryError, R>,
    table_name: &str,
) -> StoreError {
    map_sdk_error(err, |err| match err {
        QueryError::ResourceNotFoundException(_) => {
            StoreError::TableNotFound(table_name.to_string())
        }
        QueryError::ProvisionedThroughputExceededException(_) => {
            StoreError::ThroughputExceeded("Throughput exceeded, please retry".to_string())
        }
        QueryError::RequestLimitExceeded(_) => {
            StoreError::ThroughputExceeded("Request limit exceeded, please retry".to_string())
        }
        QueryError::InternalServerError(_) => {
            StoreError::Service("DynamoDB internal server error".to_string())
        }
        err => map_unmodeled("Query", err),
    })
}

/// Map a PutItem SDK error to StoreError.
pub fn map_put_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
    table_name: &str,
) -> StoreError {
    map_sdk_error(err, |err| match err {
        PutItemError::ConditionalCheckFailedException(e) => StoreError::ConditionalCheckFailed(
            e.message().unwrap_or("The conditional request failed").to_string(),
        ),
        PutItemError::ResourceNotFoundException(_) => {
            StoreError::TableNotFound(table_name.to_string())
        }
        PutItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::ThroughputExceeded("Throughput exceeded, please retry".to_string())
        }
        PutItemError::RequestLimitExceeded(_) => {
            StoreError::ThroughputExceeded("Request limit exceeded, please retry".to_string())
        }
        PutItemError::ItemCollectionSizeLimitExceededException(_) => {
            StoreError::InvalidRequest("Item collection size limit exceeded".to_string())
        }
        PutItemError::TransactionConflictException(_) => {
            StoreError::Service("Transaction conflict, please retry".to_string())
        }
        PutItemError::InternalServerError(_) => {
            StoreError::Service("DynamoDB internal server error".to_string())
        }
        err => map_unmodeled("PutItem", err),
    })
}

/// Splits transport failures from service errors.
fn map_sdk_error<E, R>(err: SdkError<E, R>, map_service: impl FnOnce(E) -> StoreError) -> StoreError
where
    E: Error + ProvideErrorMetadata + Send + Sync + 'static,
    R: Debug + Send + Sync + 'static,
{
    match err {
        SdkError::ServiceError(context) => map_service(context.into_err()),
        SdkError::ConstructionFailure(_) => {
            StoreError::InvalidRequest(DisplayErrorContext(&err).to_string())
        }
        err => StoreError::Connection(DisplayErrorContext(&err).to_string()),
    }
}

/// Maps service errors the SDK does not model as variants, by error code.
fn map_unmodeled<E: ProvideErrorMetadata + Display>(operation: &str, err: E) -> StoreError {
    let message = err.message().unwrap_or_default().to_string();
    match err.code() {
        Some("AccessDeniedException") | Some("UnrecognizedClientException") => {
            StoreError::AccessDenied(message)
        }
        Some("ValidationException") | Some("SerializationException") => {
            StoreError::InvalidRequest(message)
        }
        Some("ThrottlingException") => StoreError::ThroughputExceeded(message),
        _ => StoreError::Service(format!("{operation} failed: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::error::ErrorMetadata;
    use aws_sdk_dynamodb::types::error::{
        ConditionalCheckFailedException, ProvisionedThroughputExceededException,
        ResourceNotFoundException,
    };

    fn service_error<E>(err: E) -> SdkError<E, ()> {
        SdkError::service_error(err, ())
    }

    #[test]
    fn test_get_item_table_not_found() {
        let err = service_error(GetItemError::ResourceNotFoundException(
            ResourceNotFoundException::builder().build(),
        ));
        assert_eq!(
            map_get_item_error(err, "Widget"),
            StoreError::TableNotFound("Widget".to_string())
        );
    }

    #[test]
    fn test_query_throughput_exceeded() {
        let err = service_error(QueryError::ProvisionedThroughputExceededException(
            ProvisionedThroughputExceededException::builder().build(),
        ));
        assert!(matches!(
            map_query_error(err, "Widget"),
            StoreError::ThroughputExceeded(_)
        ));
    }

    #[test]
    fn test_put_item_conditional_check_failed() {
        let err = service_error(PutItemError::ConditionalCheckFailedException(
            ConditionalCheckFailedException::builder()
                .message("The conditional request failed")
                .build(),
        ));
        assert_eq!(
            map_put_item_error(err, "Widget"),
            StoreError::ConditionalCheckFailed("The conditional request failed".to_string())
        );
    }

    #[test]
    fn test_unmodeled_access_denied() {
        let err = service_error(BatchGetItemError::generic(
            ErrorMetadata::builder()
                .code("AccessDeniedException")
                .message("not authorized")
                .build(),
        ));
        assert_eq!(
            map_batch_get_item_error(err, "Widget"),
            StoreError::AccessDenied("not authorized".to_string())
        );
    }

    #[test]
    fn test_unmodeled_validation_exception() {
        let err = service_error(QueryError::generic(
            ErrorMetadata::builder()
                .code("ValidationException")
                .message("Query condition missed key schema element")
                .build(),
        ));
        assert_eq!(
            map_query_error(err, "Widget"),
            StoreError::InvalidRequest("Query condition missed key schema element".to_string())
        );
    }
}
