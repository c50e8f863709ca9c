use std::collections::BTreeMap;

use validator::{Validate, ValidationErrors};

use crate::utils::errors::ServiceError;

/// Inline form errors keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let messages = errors
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid value ({})", e.code),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

/// Runs form validation. Must pass before any remote call is issued.
pub fn check<T: Validate>(form: &T) -> Result<(), ServiceError> {
    form.validate().map_err(|errors| {
        let fields = field_errors(&errors);
        log::warn!("Form rejected: {:?}", fields.keys().collect::<Vec<_>>());
        ServiceError::InvalidForm(fields)
    })
}

/// Single-field rejection for checks the derive cannot express.
pub fn reject(field: &str, message: &str) -> ServiceError {
    let mut fields = FieldErrors::new();
    fields.insert(field.to_string(), vec![message.to_string()]);
    ServiceError::InvalidForm(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Form {
        #[validate(length(min = 3, message = "Too short"))]
        name: String,
        #[validate(range(min = 1))]
        count: u32,
    }

    #[test]
    fn messages_are_collected_per_field() {
        let form = Form {
            name: "ab".into(),
            count: 0,
        };
        match check(&form) {
            Err(ServiceError::InvalidForm(fields)) => {
                assert_eq!(fields["name"], vec!["Too short".to_string()]);
                assert_eq!(fields["count"], vec!["Invalid value (range)".to_string()]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn valid_forms_pass() {
        let form = Form {
            name: "abc".into(),
            count: 2,
        };
        assert!(check(&form).is_ok());
    }
}
