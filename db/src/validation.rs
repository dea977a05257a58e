use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{field} must be at least {min}")]
    TooSmall { field: &'static str, min: f64 },
    #[error("Ingredient {0} does not exist")]
    UnknownIngredient(i64),
}

pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }

    Ok(())
}

pub(crate) fn at_least<T>(field: &'static str, value: Option<T>, min: T) -> Result<(), ValidationError>
where
    T: PartialOrd + Into<f64>,
{
    match value {
        Some(v) if v < min => Err(ValidationError::TooSmall {
            field,
            min: min.into(),
        }),
        _ => Ok(()),
    }
}
