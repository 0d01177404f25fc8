use actix_web::http::StatusCode;
use validator::ValidationErrors;

use crate::clients::ClientError;
use crate::database::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{}", first_field_error(.0))]
    InvalidFields(#[from] ValidationErrors),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) | ServiceError::InvalidFields(_) => StatusCode::BAD_REQUEST,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) | ServiceError::Store(StoreError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            ServiceError::Conflict(_) | ServiceError::Store(StoreError::Conflict(_)) => {
                StatusCode::CONFLICT
            }
            ServiceError::Store(_) | ServiceError::Client(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the message may be shown to the caller as is.
    pub fn is_client_facing(&self) -> bool {
        !self.status_code().is_server_error()
    }
}

/// "field: message" for the first failing field, sorted for stable output.
fn first_field_error(errors: &ValidationErrors) -> String {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    fields
        .into_iter()
        .find_map(|(field, errs)| {
            errs.first().map(|err| match &err.message {
                Some(message) => format!("{field}: {message}"),
                None => format!("{field}: invalid value ({})", err.code),
            })
        })
        .unwrap_or_else(|| "Invalid request".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Form {
        #[validate(length(min = 1, message = "City is required"))]
        city: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn invalid_fields_report_first_field_alphabetically() {
        let form = Form {
            city: String::new(),
            email: "nope".into(),
        };
        let err = ServiceError::from(form.validate().unwrap_err());
        assert_eq!(err.to_string(), "city: City is required");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_errors_map_to_status_codes() {
        assert_eq!(
            ServiceError::Store(StoreError::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::Store(StoreError::Conflict("slug".into())).status_code(),
            StatusCode::CONFLICT
        );
        let unavailable = ServiceError::Store(StoreError::Unavailable("down".into()));
        assert_eq!(unavailable.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!unavailable.is_client_facing());
    }
}
