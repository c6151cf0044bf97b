use std::{collections::HashMap, str::FromStr};

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use super::error::{Error, TypeError};

pub type FormData = HashMap<String, Value>;

const REQUIRED: &str = "This field is required.";

/// JSON request body read field by field.
pub struct Form {
    inner: HashMap<String, Value>,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.get(key).is_some_and(|value| !value.is_null())
    }

    /// Reads a number sent either as a JSON number or as a numeric string.
    pub fn get_number<T>(&self, key: &str) -> Result<T, Error>
    where
        T: FromStr,
    {
        let raw = match self.inner.get(key) {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Null) | None => return Err(TypeError::new(key, REQUIRED).into()),
            Some(_) => return Err(TypeError::new(key, "A valid integer is required.").into()),
        };

        raw.parse()
            .map_err(|_e| TypeError::new(key, "A valid integer is required.").into())
    }

    pub fn get_str(&self, key: &str) -> Result<String, Error> {
        match self.inner.get(key) {
            Some(Value::String(v)) if !v.trim().is_empty() => Ok(v.to_string()),
            Some(Value::String(_)) => Err(TypeError::new(key, "This field may not be blank.").into()),
            Some(Value::Null) | None => Err(TypeError::new(key, REQUIRED).into()),
            Some(_) => Err(TypeError::new(key, "Not a valid string.").into()),
        }
    }

    pub fn get_optional_str(&self, key: &str) -> Result<Option<String>, Error> {
        if !self.contains(key) {
            return Ok(None);
        }
        self.get_str(key).map(Some)
    }

    pub fn get_json<T>(&self, key: &str) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        match self.inner.get(key) {
            Some(value) if !value.is_null() => serde_json::from_value(value.to_owned())
                .map_err(|e| TypeError::new(key, &format!("Invalid value: {e}")).into()),
            _ => Err(TypeError::new(key, REQUIRED).into()),
        }
    }
}

/// Query string pairs in request order; keys may repeat.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.to_owned())
            .collect()
    }

    /// `1`/`true` flags; anything else reads as unset.
    pub fn get_flag(&self, key: &str) -> bool {
        matches!(self.get(key), Some("1") | Some("true"))
    }
}

impl From<Vec<(String, String)>> for QueryParams {
    fn from(value: Vec<(String, String)>) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn form(value: Value) -> Form {
        Form::from_data(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn numbers_accept_strings_and_numbers() {
        let form = form(json!({ "a": 5, "b": "7", "c": "x", "d": [1] }));

        assert_eq!(form.get_number::<i32>("a").unwrap(), 5);
        assert_eq!(form.get_number::<i32>("b").unwrap(), 7);
        assert_eq!(form.get_number::<i32>("c").unwrap_err().field.as_deref(), Some("c"));
        assert!(form.get_number::<i32>("d").is_err());
        assert_eq!(
            form.get_number::<i32>("missing").unwrap_err().info.as_deref(),
            Some(REQUIRED)
        );
    }

    #[test]
    fn blank_strings_are_rejected() {
        let form = form(json!({ "name": "  ", "text": "soup", "empty": null }));

        assert!(form.get_str("name").is_err());
        assert_eq!(form.get_str("text").unwrap(), "soup");
        assert_eq!(form.get_optional_str("empty").unwrap(), None);
        assert_eq!(form.get_optional_str("text").unwrap().as_deref(), Some("soup"));
    }

    #[test]
    fn json_fields_deserialize() {
        let form = form(json!({ "tags": [1, 2, 3], "bad": "x" }));

        assert_eq!(form.get_json::<Vec<i32>>("tags").unwrap(), vec![1, 2, 3]);
        assert!(form.get_json::<Vec<i32>>("bad").is_err());
    }

    #[test]
    fn query_params_keep_repeated_keys() {
        let params = QueryParams::from(vec![
            ("tags".to_string(), "breakfast".to_string()),
            ("tags".to_string(), "lunch".to_string()),
            ("is_favorited".to_string(), "1".to_string()),
        ]);

        assert_eq!(params.get("tags"), Some("breakfast"));
        assert_eq!(params.get_all("tags"), vec!["breakfast", "lunch"]);
        assert!(params.get_flag("is_favorited"));
        assert!(!params.get_flag("is_in_shopping_cart"));
    }
}
