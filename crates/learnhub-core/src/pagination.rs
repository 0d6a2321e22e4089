//! Pagination utilities for list endpoints.
//!
//! Supports offset-based (`limit` + `offset`) and page-based (`limit` + `page`)
//! pagination. When `page` is provided it takes precedence over `offset`.

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query strings arrive as text; empty values mean "not provided".
fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse::<i64>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Metadata about a paginated response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    /// Total number of items across all pages
    pub total: i64,
    /// Maximum items per page (the limit that was applied)
    pub limit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    /// Whether there are more items after this page
    pub has_more: bool,
}

impl PaginationMeta {
    pub fn new(total: i64, params: &PaginationParams) -> Self {
        let limit = params.limit();
        let offset = params.offset();
        Self {
            total,
            limit,
            offset: Some(offset),
            page: params.page(),
            has_more: offset.saturating_add(limit) < total,
        }
    }
}

/// Query parameters for pagination.
///
/// - `limit` is clamped to the range [1, 100], default 10
/// - `offset` is clamped to a minimum of 0
/// - `page` is clamped to a minimum of 1
/// - the derived offset saturates instead of overflowing
#[derive(Debug, Clone, Default, Hash, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub offset: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
}

impl PaginationParams {
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        if let Some(page) = self.page {
            (page.max(1) - 1).saturating_mul(self.limit())
        } else {
            self.offset.unwrap_or(0).max(0)
        }
    }

    #[must_use]
    pub fn page(&self) -> Option<i64> {
        self.page.map(|p| p.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PaginationParams::default();
        assert_eq!(params.limit(), 10);
        assert_eq!(params.offset(), 0);
        assert_eq!(params.page(), None);
    }

    #[test]
    fn test_limit_boundary_cases() {
        let test_cases = vec![
            (Some(1), 1),
            (Some(50), 50),
            (Some(101), 100),
            (Some(0), 1),
            (Some(-1), 1),
        ];

        for (input, expected) in test_cases {
            let params = PaginationParams {
                limit: input,
                offset: None,
                page: None,
            };
            assert_eq!(params.limit(), expected);
        }
    }

    #[test]
    fn test_page_takes_precedence_over_offset() {
        let params = PaginationParams {
            limit: Some(20),
            offset: Some(5),
            page: Some(3),
        };
        assert_eq!(params.offset(), 40);
    }

    #[test]
    fn test_negative_offset_clamped() {
        let params = PaginationParams {
            limit: Some(10),
            offset: Some(-5),
            page: None,
        };
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_huge_page_saturates() {
        let params = PaginationParams {
            limit: Some(100),
            offset: None,
            page: Some(i64::MAX),
        };
        assert_eq!(params.offset(), i64::MAX);

        let meta = PaginationMeta::new(25, &params);
        assert_eq!(meta.offset, Some(i64::MAX));
        assert!(!meta.has_more);
    }

    #[test]
    fn test_huge_offset_does_not_overflow_meta() {
        let params = PaginationParams {
            limit: Some(10),
            offset: Some(i64::MAX),
            page: None,
        };
        let meta = PaginationMeta::new(25, &params);
        assert_eq!(meta.offset, Some(i64::MAX));
        assert!(!meta.has_more);
    }

    #[test]
    fn test_meta_has_more() {
        let params = PaginationParams {
            limit: Some(10),
            offset: None,
            page: Some(2),
        };
        let meta = PaginationMeta::new(25, &params);
        assert_eq!(meta.offset, Some(10));
        assert_eq!(meta.page, Some(2));
        assert!(meta.has_more);

        let meta = PaginationMeta::new(20, &params);
        assert!(!meta.has_more);
    }

    #[test]
    fn test_deserialize_empty_strings() {
        let json = r#"{"limit":"","offset":""}"#;
        let params: PaginationParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.limit(), 10);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_meta_serialize_skips_missing_page() {
        let meta = PaginationMeta::new(5, &PaginationParams::default());
        let serialized = serde_json::to_string(&meta).unwrap();
        assert!(serialized.contains(r#""total":5"#));
        assert!(!serialized.contains("page"));
    }
}
