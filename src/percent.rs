/// Normalises a score cell into a fraction.
///
/// Cells ending in `%` are percentages. Bare numbers above 1 are taken to be
/// percentages already, anything at or below 1 is a fraction. `0` is a real
/// zero. Scores above 100% are capped at 1. Blank, negative or non-numeric
/// cells return `None` and are left out of any aggregate.
pub fn parse_percent(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let value = if let Some(stripped) = trimmed.strip_suffix('%') {
        stripped.trim().parse::<f64>().ok()? / 100.0
    } else {
        let number = trimmed.parse::<f64>().ok()?;
        if number > 1.0 {
            number / 100.0
        } else {
            number
        }
    };

    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some(value.min(1.0))
}
