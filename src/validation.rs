use std::collections::BTreeMap;

use validator::Validate;

use crate::error::AppError;

/// Runs the derived field checks and turns failures into
/// `AppError::Validation`, one message list per field.
pub fn validated<T: Validate>(value: T) -> Result<T, AppError> {
    match value.validate() {
        Ok(()) => Ok(value),
        Err(errors) => {
            let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for (field, field_errors) in errors.field_errors() {
                let messages = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("{} is invalid", field))
                    })
                    .collect();
                fields.insert(field.to_string(), messages);
            }
            Err(AppError::Validation(fields))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewCourseRequest, RegisterRequest};

    #[test]
    fn test_valid_request_passes_through() {
        let req = NewCourseRequest {
            title: "Math".to_string(),
            description: None,
        };
        assert_eq!(validated(req).unwrap().title, "Math");
    }

    #[test]
    fn test_collects_messages_per_field() {
        let req = RegisterRequest {
            username: String::new(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            password2: "short".to_string(),
        };
        let Err(AppError::Validation(fields)) = validated(req) else {
            panic!("expected validation error");
        };
        assert_eq!(
            fields.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["email", "password", "username"]
        );
        assert_eq!(fields["password"], vec!["Password must be at least 8 characters".to_string()]);
    }
}
