use serde::Deserialize;

/// Query string for the public listing. Numeric fields arrive as raw strings
/// so malformed values can fall back to defaults instead of rejecting the
/// request.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub id: Option<String>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Clamps ?limit to [1, 50]; absent or non-numeric values take the default.
pub fn clamp_limit(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .map(|n| n.clamp(1, 50))
        .unwrap_or(10)
}

/// Clamps ?offset to >= 0; absent or non-numeric values take the default.
pub fn clamp_offset(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .map(|n| n.max(0))
        .unwrap_or(0)
}

#[derive(Debug, Deserialize)]
pub struct CreateFoodBankRequest {
    pub name: Option<String>,
    pub unit_no: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub description: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub website: Option<String>,
    pub charity_registration_no: Option<String>,
    pub timezone: Option<String>,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Deserialize)]
pub struct StaffQuery {
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_clamps_into_range() {
        assert_eq!(clamp_limit(Some("0")), 1);
        assert_eq!(clamp_limit(Some("-3")), 1);
        assert_eq!(clamp_limit(Some("51")), 50);
        assert_eq!(clamp_limit(Some("9000")), 50);
        assert_eq!(clamp_limit(Some("25")), 25);
    }

    #[test]
    fn limit_defaults_when_absent_or_non_numeric() {
        assert_eq!(clamp_limit(None), 10);
        assert_eq!(clamp_limit(Some("ten")), 10);
        assert_eq!(clamp_limit(Some("")), 10);
    }

    #[test]
    fn offset_clamps_and_defaults() {
        assert_eq!(clamp_offset(Some("30")), 30);
        assert_eq!(clamp_offset(Some("-1")), 0);
        assert_eq!(clamp_offset(None), 0);
        assert_eq!(clamp_offset(Some("abc")), 0);
    }
}
