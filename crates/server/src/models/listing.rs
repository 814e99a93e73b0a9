use serde::Deserialize;

use crate::error::{RequestError, ValidationError};
use crate::server::constants::MAX_PAGE_SIZE;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const DEFAULT_PAGE: i64 = 1;

#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Validated pagination window; pages are numbered from 1.
#[derive(Clone, Copy, Debug)]
pub struct Page {
    pub number: i64,
    pub size: i64,
}

pub fn validate_page_size(page_size: i64) -> Result<(), RequestError> {
    if page_size < 1 {
        return Err(ValidationError::InvalidInput {
            value: page_size.to_string(),
            reason: "page_size should be >= 1".to_string(),
        }
        .into());
    }
    if page_size > MAX_PAGE_SIZE {
        return Err(ValidationError::InvalidInput {
            value: page_size.to_string(),
            reason: format!("page_size should be <= {}", MAX_PAGE_SIZE),
        }
        .into());
    }
    Ok(())
}

pub fn validate_page(page: i64) -> Result<(), RequestError> {
    if page < 1 {
        return Err(ValidationError::InvalidInput {
            value: page.to_string(),
            reason: "page should be >= 1".to_string(),
        }
        .into());
    }
    Ok(())
}

impl Page {
    pub fn from_query(query: ListingQuery) -> Result<Self, RequestError> {
        let size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        validate_page_size(size)?;
        let number = query.page.unwrap_or(DEFAULT_PAGE);
        validate_page(number)?;
        Ok(Self { number, size })
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_query_uses_defaults() {
        let page = Page::from_query(ListingQuery {
            page: None,
            page_size: None,
        })
        .unwrap();

        assert_eq!(page.number, DEFAULT_PAGE);
        assert_eq!(page.size, DEFAULT_PAGE_SIZE);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn offset_skips_previous_pages() {
        let page = Page::from_query(ListingQuery {
            page: Some(3),
            page_size: Some(25),
        })
        .unwrap();

        assert_eq!(page.offset(), 50);
    }

    #[test]
    fn from_query_rejects_page_below_one() {
        let err = Page::from_query(ListingQuery {
            page: Some(0),
            page_size: Some(5),
        })
        .expect_err("expected invalid input error");

        assert!(matches!(
            err,
            RequestError::Validation(ValidationError::InvalidInput { value, .. }) if value == "0"
        ));
    }

    #[test]
    fn from_query_rejects_oversized_page() {
        let err = Page::from_query(ListingQuery {
            page: Some(1),
            page_size: Some(MAX_PAGE_SIZE + 1),
        })
        .expect_err("expected invalid input error");

        assert!(matches!(
            err,
            RequestError::Validation(ValidationError::InvalidInput { .. })
        ));
    }
}
