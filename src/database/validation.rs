use std::{collections::HashSet, sync::OnceLock};

use regex::Regex;

use crate::{
    constants::{
        EMAIL_MAX_LENGTH, MAX_AMOUNT, MAX_COOKING_TIME, MIN_AMOUNT, MIN_COOKING_TIME,
        RECIPE_NAME_MAX_LENGTH, USER_NAME_MAX_LENGTH,
    },
    error::{Error, HtmlError},
    schema::{IngredientAmount, Uuid},
};

fn username_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[\w.@+-]+$").expect("valid username pattern"))
}

pub fn validate_email(email: &str) -> Result<(), Error> {
    let invalid = || HtmlError::InvalidRequest.field("email", "Enter a valid email address.");

    if email.len() > EMAIL_MAX_LENGTH || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }

    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), Error> {
    if username.chars().count() > USER_NAME_MAX_LENGTH {
        return Err(HtmlError::InvalidRequest.field(
            "username",
            "Ensure this field has no more than 150 characters.",
        ));
    }
    if !username_pattern().is_match(username) {
        return Err(HtmlError::InvalidRequest.field(
            "username",
            "Enter a valid username. It may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    Ok(())
}

pub fn validate_max_length(field: &str, value: &str, max: usize) -> Result<(), Error> {
    if value.chars().count() > max {
        return Err(HtmlError::InvalidRequest.field(
            field,
            &format!("Ensure this field has no more than {max} characters."),
        ));
    }
    Ok(())
}

pub fn validate_recipe_name(name: &str) -> Result<(), Error> {
    validate_max_length("name", name, RECIPE_NAME_MAX_LENGTH)
}

pub fn validate_amount(amount: i32) -> Result<(), Error> {
    if !(MIN_AMOUNT..=MAX_AMOUNT).contains(&amount) {
        return Err(HtmlError::InvalidRequest.field(
            "ingredients",
            &format!("Amount must be between {MIN_AMOUNT} and {MAX_AMOUNT}."),
        ));
    }
    Ok(())
}

pub fn validate_cooking_time(cooking_time: i32) -> Result<(), Error> {
    if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&cooking_time) {
        return Err(HtmlError::InvalidRequest.field(
            "cooking_time",
            &format!("Cooking time must be between {MIN_COOKING_TIME} and {MAX_COOKING_TIME}."),
        ));
    }
    Ok(())
}

/// A recipe needs at least one ingredient, each listed once with a valid amount.
pub fn validate_ingredients(ingredients: &[IngredientAmount]) -> Result<(), Error> {
    if ingredients.is_empty() {
        return Err(HtmlError::InvalidRequest.field(
            "ingredients",
            "At least one ingredient is required.",
        ));
    }
    let ids: Vec<Uuid> = ingredients.iter().map(|i| i.id).collect();
    if has_duplicates(&ids) {
        return Err(HtmlError::InvalidRequest.field(
            "ingredients",
            "Ingredients must not repeat.",
        ));
    }
    ingredients
        .iter()
        .try_for_each(|ingredient| validate_amount(ingredient.amount))
}

pub fn validate_tags(tags: &[Uuid]) -> Result<(), Error> {
    if tags.is_empty() {
        return Err(HtmlError::InvalidRequest.field("tags", "At least one tag is required."));
    }
    if has_duplicates(tags) {
        return Err(HtmlError::InvalidRequest.field("tags", "Tags must not repeat."));
    }
    Ok(())
}

/// Checks a follow edge before it is written. The unique constraint on the
/// table still guards against a concurrent duplicate insert.
pub fn validate_subscription(
    follower: Uuid,
    following: Uuid,
    already_subscribed: bool,
) -> Result<(), Error> {
    if follower == following {
        return Err(HtmlError::InvalidRequest.field("following", "You cannot follow yourself."));
    }
    if already_subscribed {
        return Err(already_subscribed_error());
    }
    Ok(())
}

pub fn already_subscribed_error() -> Error {
    HtmlError::InvalidRequest.field(
        "non_field_errors",
        "The fields user, following must make a unique set.",
    )
}

fn has_duplicates(ids: &[Uuid]) -> bool {
    let mut seen = HashSet::with_capacity(ids.len());
    !ids.iter().all(|id| seen.insert(*id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_bounds_are_inclusive() {
        assert!(validate_amount(0).is_err());
        assert!(validate_amount(32001).is_err());
        assert!(validate_amount(1).is_ok());
        assert!(validate_amount(32000).is_ok());
    }

    #[test]
    fn cooking_time_must_be_positive() {
        assert!(validate_cooking_time(0).is_err());
        assert!(validate_cooking_time(-5).is_err());
        assert!(validate_cooking_time(1).is_ok());
    }

    #[test]
    fn self_follow_is_rejected() {
        let error = validate_subscription(3, 3, false).unwrap_err();

        assert_eq!(error.code, 400);
        assert_eq!(error.field.as_deref(), Some("following"));
    }

    #[test]
    fn duplicate_follow_is_rejected() {
        assert!(validate_subscription(1, 2, false).is_ok());

        let error = validate_subscription(1, 2, true).unwrap_err();
        assert_eq!(error, already_subscribed_error());
    }

    #[test]
    fn ingredient_lists_are_checked() {
        assert!(validate_ingredients(&[]).is_err());
        assert!(validate_ingredients(&[
            IngredientAmount { id: 1, amount: 10 },
            IngredientAmount { id: 1, amount: 20 },
        ])
        .is_err());
        assert!(validate_ingredients(&[IngredientAmount { id: 1, amount: 0 }]).is_err());
        assert!(validate_ingredients(&[
            IngredientAmount { id: 1, amount: 1 },
            IngredientAmount { id: 2, amount: 32000 },
        ])
        .is_ok());
    }

    #[test]
    fn tag_lists_are_checked() {
        assert!(validate_tags(&[]).is_err());
        assert!(validate_tags(&[1, 1]).is_err());
        assert!(validate_tags(&[1, 2]).is_ok());
    }

    #[test]
    fn emails_need_a_local_part_and_a_domain() {
        assert!(validate_email("cook@example.com").is_ok());
        assert!(validate_email("cook@localhost").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("cook example@example.com").is_err());
        assert!(validate_email("cook").is_err());
    }

    #[test]
    fn usernames_follow_the_allowed_alphabet() {
        assert!(validate_username("chef.anna+1").is_ok());
        assert!(validate_username("chef anna").is_err());
        assert!(validate_username(&"a".repeat(151)).is_err());
    }
}
