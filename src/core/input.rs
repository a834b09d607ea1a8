//! Text input normalization shared by the record forms.

/// Keeps only ASCII digits, for fields that accept whole numbers only.
#[must_use]
pub fn only_digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Upper-cases free text as typed on the new-shipment form.
#[must_use]
pub fn to_upper(value: &str) -> String {
    value.to_uppercase()
}

/// Maps blank input to `None` so empty form fields are stored as NULL.
#[must_use]
pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| value.to_string())
}

/// Case-insensitive substring match of `term` against any of `fields`.
///
/// A blank term matches everything; absent fields never match.
#[must_use]
pub fn matches_term(term: &str, fields: &[Option<&str>]) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    fields
        .iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&term))
}
