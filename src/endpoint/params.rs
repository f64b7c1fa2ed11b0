//! Parameter sets and presence validation.

// self
use crate::{_prelude::*, endpoint::registry, error::ValidationError};

/// Name of the API key parameter injected into every request.
pub const API_KEY_PARAM: &str = "api_key";

/// Ordered request parameters.
///
/// Values are JSON values so the same set can be sent as a flat query string or as a JSON
/// body depending on the verb.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiParams(BTreeMap<String, Value>);
impl ApiParams {
	/// Creates an empty set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a parameter, builder style.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.insert(key, value);

		self
	}

	/// Adds or replaces a parameter.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
		self.0.insert(key.into(), value.into())
	}

	/// Removes a parameter.
	pub fn remove(&mut self, key: &str) -> Option<Value> {
		self.0.remove(key)
	}

	/// Returns a parameter value.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	/// Returns a parameter as text, if it is a string.
	pub fn get_str(&self, key: &str) -> Option<&str> {
		self.0.get(key).and_then(Value::as_str)
	}

	/// Returns `true` when the key exists, regardless of its value.
	pub fn contains_key(&self, key: &str) -> bool {
		self.0.contains_key(key)
	}

	/// Returns `true` when the key holds a usable value.
	///
	/// `null`, `false`, blank strings, and empty arrays or objects count as absent.
	pub fn is_present(&self, key: &str) -> bool {
		self.0.get(key).is_some_and(is_present_value)
	}

	/// Number of parameters.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no parameters are set.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates over parameters in key order.
	pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
		self.0.iter()
	}

	/// Merges another set into this one; keys in `other` win.
	pub fn merge(&mut self, other: ApiParams) {
		self.0.extend(other.0);
	}

	/// Flat query encoding: arrays repeat their key, `null` values are dropped.
	pub fn query_pairs(&self) -> Vec<(String, String)> {
		let mut pairs = Vec::with_capacity(self.0.len());

		for (key, value) in &self.0 {
			match value {
				Value::Null => {},
				Value::Array(items) => pairs.extend(
					items
						.iter()
						.filter(|item| !item.is_null())
						.map(|item| (key.clone(), scalar_text(item))),
				),
				other => pairs.push((key.clone(), scalar_text(other))),
			}
		}

		pairs
	}

	/// Copy with the API key masked, for logs and debug output.
	pub fn redacted(&self) -> ApiParams {
		let mut copy = self.clone();

		if let Some(value) = copy.0.get_mut(API_KEY_PARAM) {
			*value = Value::String("[redacted]".into());
		}

		copy
	}
}
impl IntoIterator for ApiParams {
	type IntoIter = std::collections::btree_map::IntoIter<String, Value>;
	type Item = (String, Value);

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}
impl From<BTreeMap<String, Value>> for ApiParams {
	fn from(map: BTreeMap<String, Value>) -> Self {
		Self(map)
	}
}
impl<K, V> FromIterator<(K, V)> for ApiParams
where
	K: Into<String>,
	V: Into<Value>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
	{
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

/// Checks that every required parameter of `method` is present.
///
/// `required` overrides the list registered for `method`; methods with no registered list
/// and no override always pass.
pub fn validate_parameters(
	method: &str,
	params: &ApiParams,
	required: Option<&[&str]>,
) -> Result<(), ValidationError> {
	let registered;
	let required = match required {
		Some(names) => names,
		None => {
			registered = registry::required_parameters(method).unwrap_or_default();

			registered.as_slice()
		},
	};
	let missing = required
		.iter()
		.filter(|name| !params.is_present(name))
		.map(|name| (*name).to_owned())
		.collect::<Vec<_>>();

	if missing.is_empty() {
		Ok(())
	} else {
		Err(ValidationError::MissingParameters { method: method.to_owned(), missing })
	}
}

/// Text form of a scalar value as it appears in a URL.
pub(crate) fn scalar_text(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		Value::Null => String::new(),
		other => other.to_string(),
	}
}

fn is_present_value(value: &Value) -> bool {
	match value {
		Value::Null | Value::Bool(false) => false,
		Value::String(s) => !s.trim().is_empty(),
		Value::Array(items) => !items.is_empty(),
		Value::Object(map) => !map.is_empty(),
		_ => true,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn presence_ignores_blank_values() {
		let params = ApiParams::new()
			.with("a", "x")
			.with("blank", "  ")
			.with("none", Value::Null)
			.with("off", false)
			.with("zero", 0)
			.with("empty", Value::Array(Vec::new()));

		assert!(params.is_present("a"));
		assert!(params.is_present("zero"));
		assert!(!params.is_present("blank"));
		assert!(!params.is_present("none"));
		assert!(!params.is_present("off"));
		assert!(!params.is_present("empty"));
		assert!(!params.is_present("missing"));
	}

	#[test]
	fn validation_lists_missing_names_in_order() {
		let params = ApiParams::new().with("a", "x");
		let err = validate_parameters("custom", &params, Some(&["a", "b", "c"]))
			.expect_err("Missing parameters should be rejected.");

		assert_eq!(err, ValidationError::MissingParameters {
			method: "custom".into(),
			missing: vec!["b".into(), "c".into()],
		});
		assert!(validate_parameters("custom", &params, Some(&["a"])).is_ok());
	}

	#[test]
	fn unknown_method_without_override_passes() {
		assert!(validate_parameters("no_such_method", &ApiParams::new(), None).is_ok());
	}

	#[test]
	fn query_pairs_repeat_array_keys() {
		let params = ApiParams::new()
			.with("formats", serde_json::json!(["DAISY", "EPUB3"]))
			.with("limit", 10)
			.with("skip", Value::Null)
			.with("title", "Moby Dick");

		assert_eq!(params.query_pairs(), vec![
			("formats".to_owned(), "DAISY".to_owned()),
			("formats".to_owned(), "EPUB3".to_owned()),
			("limit".to_owned(), "10".to_owned()),
			("title".to_owned(), "Moby Dick".to_owned()),
		]);
	}

	#[test]
	fn redaction_masks_api_key_only() {
		let params = ApiParams::new().with(API_KEY_PARAM, "secret").with("title", "x");
		let redacted = params.redacted();

		assert_eq!(redacted.get_str(API_KEY_PARAM), Some("[redacted]"));
		assert_eq!(redacted.get_str("title"), Some("x"));
	}
}
