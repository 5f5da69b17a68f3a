//! List courses query
//!
//! Catalog listing with the browse filters students use (department, level,
//! teaching day, minimum free seats) and pagination.

use crp_common::schedule::Weekday;
use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::shared::{PaginationMetadata, PaginationParams, ValidationError};
use crate::models::Course;
use crate::store::{CourseFilter, DynStore, RegistryStore, StoreError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListCoursesQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<i32>,
    /// Day name; keeps only courses teaching on that day.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_seats: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseListItem {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub department: String,
    pub level: i32,
    pub credit_hours: i32,
    pub total_seats: i32,
    pub available_seats: i32,
    pub schedule: Vec<crp_common::schedule::TimeSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListCoursesResponse {
    pub items: Vec<CourseListItem>,
    pub pagination: PaginationMetadata,
}

#[derive(Debug, thiserror::Error)]
pub enum ListCoursesError {
    #[error("{0}")]
    InvalidPagination(&'static str),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl Request<Result<ListCoursesResponse, ListCoursesError>> for ListCoursesQuery {}

impl crate::cqrs::middleware::Query for ListCoursesQuery {}

impl ListCoursesQuery {
    fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.per_page)
    }

    pub fn validate(&self) -> Result<Option<Weekday>, ListCoursesError> {
        self.pagination()
            .validate()
            .map_err(ListCoursesError::InvalidPagination)?;

        match self.day {
            Some(ref raw) => {
                let day = raw
                    .parse()
                    .map_err(|_| ValidationError::UnknownDay(raw.clone()))?;
                Ok(Some(day))
            }
            None => Ok(None),
        }
    }
}

impl From<Course> for CourseListItem {
    fn from(course: Course) -> Self {
        CourseListItem {
            id: course.id,
            code: course.code,
            title: course.title,
            department: course.department,
            level: course.level,
            credit_hours: course.credit_hours,
            total_seats: course.total_seats,
            available_seats: course.available_seats,
            schedule: course.schedule,
        }
    }
}

/// Handler for listing courses
#[tracing::instrument(skip(store, query), fields(page = ?query.page, department = ?query.department))]
pub async fn handle(
    store: DynStore,
    query: ListCoursesQuery,
) -> Result<ListCoursesResponse, ListCoursesError> {
    let day = query.validate()?;
    let pagination = query.pagination();

    let filter = CourseFilter {
        department: query.department.clone(),
        level: query.level,
        day,
        min_seats: query.min_seats,
        limit: Some(pagination.per_page()),
        offset: pagination.offset(),
    };

    let total = store.count_courses(&filter).await?;
    let items = store
        .list_courses(&filter)
        .await?
        .into_iter()
        .map(CourseListItem::from)
        .collect();

    Ok(ListCoursesResponse {
        items,
        pagination: PaginationMetadata::new(pagination.page(), pagination.per_page(), total),
    })
}
