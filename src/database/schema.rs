use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{constants::MEASUREMENT_UNITS, error::TypeError};

pub type Uuid = i32;

#[derive(
    Clone, Copy, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Deserialize, Eq, Ord, Hash,
)]
#[sqlx(type_name = "measurement_unit")]
pub enum MeasurementUnit {
    #[sqlx(rename = "г")]
    #[serde(rename = "г")]
    Grams,
    #[sqlx(rename = "капля")]
    #[serde(rename = "капля")]
    Drop,
    #[sqlx(rename = "шт.")]
    #[serde(rename = "шт.")]
    Piece,
    #[sqlx(rename = "кусок")]
    #[serde(rename = "кусок")]
    BigPiece,
    #[sqlx(rename = "мл")]
    #[serde(rename = "мл")]
    Milliliters,
    #[sqlx(rename = "ч.л.")]
    #[serde(rename = "ч.л.")]
    Teaspoon,
}

impl MeasurementUnit {
    const ALL: [MeasurementUnit; 6] = [
        Self::Grams,
        Self::Drop,
        Self::Piece,
        Self::BigPiece,
        Self::Milliliters,
        Self::Teaspoon,
    ];

    fn index(&self) -> usize {
        match self {
            Self::Grams => 0,
            Self::Drop => 1,
            Self::Piece => 2,
            Self::BigPiece => 3,
            Self::Milliliters => 4,
            Self::Teaspoon => 5,
        }
    }

    pub fn code(&self) -> &'static str {
        MEASUREMENT_UNITS[self.index()]
    }
}

impl FromStr for MeasurementUnit {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|unit| unit.code() == s.trim())
            .ok_or_else(|| TypeError::new("measurement_unit", "Invalid variant"))
    }
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub avatar: Option<String>,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub avatar: Option<String>,

    pub count: i64,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            password: row.password,
            avatar: row.avatar,
        }
    }
}

/// Fields of a user being registered; `password` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// Directed follow edge: `user_id` follows `following_id`.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub following_id: Uuid,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: MeasurementUnit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewIngredient {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Recipe {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
    pub pub_date: DateTime<Utc>,
}

/// Recipe joined with the viewer's favorite and shopping cart flags.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct RecipeRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
    pub pub_date: DateTime<Utc>,

    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,

    pub count: i64,
}

/// Ingredient of a recipe with its amount, as shown inside a recipe.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeIngredientRow {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: MeasurementUnit,
    pub amount: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct IngredientAmount {
    pub id: Uuid,
    pub amount: i32,
}

/// Validated recipe fields ready to be written. `image` holds a stored media
/// path; `None` on update keeps the current image.
#[derive(Debug, Clone)]
pub struct RecipeDraft {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: Option<String>,
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<Uuid>,
}

/// Row of the `favorites` or `shopping_cart` edge tables.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct RecipeListEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recipe_id: Uuid,
}

/// One ingredient line of one recipe in a user's shopping cart.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct CartLine {
    pub name: String,
    pub measurement_unit: MeasurementUnit,
    pub amount: i32,
}
