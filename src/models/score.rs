use crate::models::{Result, TierTagError};

/// Clamp anything that is not a finite positive number to zero.
pub fn normalize_score(score: f64) -> f64 {
    if score.is_finite() && score > 0.0 {
        score
    } else {
        0.0
    }
}

/// Interpret the raw text returned by the score source.
///
/// Missing, blank and `"null"` payloads count as zero. Anything else must parse
/// as a number.
pub fn parse_score(raw: Option<&str>) -> Result<f64> {
    let trimmed = match raw.map(str::trim) {
        None => return Ok(0.0),
        Some(s) if s.is_empty() || s.eq_ignore_ascii_case("null") => return Ok(0.0),
        Some(s) => s,
    };
    
    trimmed
        .parse::<f64>()
        .map(normalize_score)
        .map_err(|e| TierTagError::MalformedScore {
            raw: trimmed.to_string(),
            message: e.to_string(),
        })
}
