use garde::{Report, Validate};

use crate::Error;

/// Run the struct's garde rules, turning a failure into a 400 response.
pub fn validate_struct<T>(value: &T) -> Result<(), Error>
where
    T: Validate,
    T::Context: Default,
{
    value
        .validate()
        .map_err(|report| Error::Validation(format_validation_errors(&report)))
}

fn format_validation_errors(report: &Report) -> String {
    report
        .iter()
        .map(|(path, error)| {
            let path = path.to_string();
            if path.is_empty() {
                error.message().to_string()
            } else {
                format!("{}: {}", path, error.message())
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
