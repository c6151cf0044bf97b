pub const USER_COUNT_PER_PAGE: i64 = 6;
pub const RECIPE_COUNT_PER_PAGE: i64 = 6;
pub const MAX_COUNT_PER_PAGE: i64 = 100;

pub const MIN_AMOUNT: i32 = 1;
pub const MAX_AMOUNT: i32 = 32000;
pub const MIN_COOKING_TIME: i32 = 1;
pub const MAX_COOKING_TIME: i32 = 32000;

pub const EMAIL_MAX_LENGTH: usize = 254;
pub const USER_NAME_MAX_LENGTH: usize = 150;
pub const RECIPE_NAME_MAX_LENGTH: usize = 256;

pub const AVATAR_UPLOAD_TO: &str = "avatars";
pub const RECIPE_UPLOAD_TO: &str = "recipes";
pub const MAX_UPLOAD_SIZE: u64 = 5 * 1024 * 1024;

pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";

/// Stored code of every measurement unit.
pub const MEASUREMENT_UNITS: &[&str] = &["г", "капля", "шт.", "кусок", "мл", "ч.л."];
