use serde::Serialize;

use crate::db::{CommentRow, ReviewRow, TitleRow, User};
use crate::domain::Role;
use crate::entities::{categories, genres};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Name of the offending input field for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            field: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            field: None,
        }
    }
}

/// Category or genre as embedded in titles and listed on its own.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct TaxonomyDto {
    pub name: String,
    pub slug: String,
}

impl From<categories::Model> for TaxonomyDto {
    fn from(model: categories::Model) -> Self {
        Self {
            name: model.name,
            slug: model.slug,
        }
    }
}

impl From<genres::Model> for TaxonomyDto {
    fn from(model: genres::Model) -> Self {
        Self {
            name: model.name,
            slug: model.slug,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TitleDto {
    pub id: i32,
    pub name: String,
    pub year: i32,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub category: Option<TaxonomyDto>,
    pub genre: Vec<TaxonomyDto>,
}

impl From<TitleRow> for TitleDto {
    fn from(row: TitleRow) -> Self {
        Self {
            id: row.title.id,
            name: row.title.name,
            year: row.title.year,
            description: row.title.description,
            rating: row.title.rating,
            category: row.category.map(TaxonomyDto::from),
            genre: row.genres.into_iter().map(TaxonomyDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewDto {
    pub id: i32,
    pub title: i32,
    pub author: String,
    pub text: String,
    pub score: i32,
    pub pub_date: String,
}

impl From<ReviewRow> for ReviewDto {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.review.id,
            title: row.review.title_id,
            author: row.author,
            text: row.review.text,
            score: row.review.score,
            pub_date: row.review.pub_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentDto {
    pub id: i32,
    pub review: i32,
    pub author: String,
    pub text: String,
    pub pub_date: String,
}

impl From<CommentRow> for CommentDto {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.comment.id,
            review: row.comment.review_id,
            author: row.author,
            text: row.comment.text,
            pub_date: row.comment.pub_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: Role,
    pub is_active: bool,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            bio: user.bio,
            role: user.role,
            is_active: user.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenDto {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub database: bool,
}
