use mongodb::bson::{oid::ObjectId, Document};
use mongodb::options::FindOptions;
use serde::Serialize;

use crate::core::{AppError, Result};

/// Filter plus cursor options for `find` calls
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    pub filter: Document,
    pub sort: Option<Document>,
    pub projection: Option<Document>,
    pub skip: Option<u64>,
    pub limit: Option<i64>,
}

impl FindQuery {
    pub fn new(filter: Document) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Split into the filter and driver options
    pub fn into_parts(self) -> (Document, FindOptions) {
        let mut options = FindOptions::default();
        options.sort = self.sort;
        options.projection = self.projection;
        options.skip = self.skip;
        options.limit = self.limit;
        (self.filter, options)
    }
}

impl From<Document> for FindQuery {
    fn from(filter: Document) -> Self {
        FindQuery::new(filter)
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(self.per_page)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

/// Skip/limit for a 1-based page number
pub fn page_bounds(page: u64, per_page: u64) -> Result<(u64, i64)> {
    if page == 0 {
        return Err(AppError::validation("page must be at least 1"));
    }
    if per_page == 0 {
        return Err(AppError::validation("per_page must be at least 1"));
    }
    let limit = i64::try_from(per_page)
        .map_err(|_| AppError::validation("per_page is too large"))?;
    let skip = (page - 1)
        .checked_mul(per_page)
        .ok_or_else(|| AppError::validation("page is out of range"))?;
    Ok((skip, limit))
}

/// Parse a hex object id coming from a path or payload
pub fn parse_object_id(raw: &str) -> Result<ObjectId> {
    ObjectId::parse_str(raw).map_err(|_| AppError::validation(format!("Invalid id '{}'", raw)))
}
