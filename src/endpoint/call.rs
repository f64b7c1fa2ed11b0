//! Binding arguments to an [`EndpointSpec`] and executing it.

// self
use crate::{
	_prelude::*,
	dto::ApiRecord,
	endpoint::{ApiParams, EndpointSpec, params},
	error::ValidationError,
	service::ApiService,
	session::ApiResponse,
};

/// One pending invocation of a declared endpoint.
///
/// Arguments are renamed through the endpoint's aliases as they are bound, and multi-valued
/// arguments given as comma-separated text are split into arrays. Nothing is sent until
/// [`send`](Self::send) or [`fetch`](Self::fetch) runs, and both validate required parameters
/// before touching the network.
#[derive(Debug)]
pub struct ApiCall<'a> {
	service: &'a mut ApiService,
	spec: &'static EndpointSpec,
	params: ApiParams,
}
impl<'a> ApiCall<'a> {
	pub(crate) fn new(service: &'a mut ApiService, spec: &'static EndpointSpec) -> Self {
		Self { service, spec, params: ApiParams::new() }
	}

	/// Endpoint being invoked.
	pub fn spec(&self) -> &'static EndpointSpec {
		self.spec
	}

	/// Parameters bound so far.
	pub fn params(&self) -> &ApiParams {
		&self.params
	}

	/// Binds an argument.
	pub fn arg(mut self, name: &str, value: impl Into<Value>) -> Self {
		let wire = self.spec.wire_name(name);
		let value = value.into();
		let value = if self.spec.is_multi(wire) { split_multi(value) } else { value };

		self.params.insert(wire, value);

		self
	}

	/// Binds an argument when a value is given.
	pub fn opt<V>(self, name: &str, value: Option<V>) -> Self
	where
		V: Into<Value>,
	{
		match value {
			Some(value) => self.arg(name, value),
			None => self,
		}
	}

	/// Binds every free-form option.
	///
	/// Options never replace a path argument that is already bound.
	pub fn extend(mut self, opt: ApiParams) -> Self {
		for (name, value) in opt {
			let wire = self.spec.wire_name(&name);

			if self.params.contains_key(wire) && self.spec.placeholders().any(|p| p == wire) {
				tracing::warn!(
					method = self.spec.name,
					param = wire,
					"Ignoring option that would replace a path argument."
				);

				continue;
			}

			self = self.arg(&name, value);
		}

		self
	}

	/// Validates the bound arguments and expands the path template.
	pub fn prepare(&self) -> Result<(Vec<String>, ApiParams), ValidationError> {
		prepare(self.spec, self.params.clone())
	}

	/// Executes the call, returning the raw response on success.
	pub async fn send(self) -> Result<Option<ApiResponse>> {
		let Self { service, spec, params } = self;
		let (segments, params) = prepare(spec, params)?;

		service.dispatch(spec.service, spec.verb, &segments, params).await
	}

	/// Executes the call and wraps the outcome in a record.
	pub async fn fetch<T>(self) -> Result<ApiRecord<T>>
	where
		T: DeserializeOwned,
	{
		let Self { service, spec, params } = self;
		let (segments, params) = prepare(spec, params)?;
		let response = service.dispatch(spec.service, spec.verb, &segments, params).await?;

		Ok(ApiRecord::from_session(response.as_ref(), service.session()))
	}
}

fn prepare(
	spec: &'static EndpointSpec,
	mut params: ApiParams,
) -> Result<(Vec<String>, ApiParams), ValidationError> {
	params::validate_parameters(spec.name, &params, Some(spec.required_names().as_slice()))?;

	let segments = spec
		.path
		.split('/')
		.filter(|segment| !segment.is_empty())
		.map(|segment| match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
			Some(name) => params.remove(name).map(|value| path_text(&value)).unwrap_or_default(),
			None => segment.to_owned(),
		})
		.collect();

	Ok((segments, params))
}

fn split_multi(value: Value) -> Value {
	match value {
		Value::String(s) if s.contains(',') => Value::Array(
			s.split(',')
				.map(str::trim)
				.filter(|part| !part.is_empty())
				.map(|part| Value::String(part.to_owned()))
				.collect(),
		),
		other => other,
	}
}

fn path_text(value: &Value) -> String {
	match value {
		Value::Array(items) => items.iter().map(params::scalar_text).collect::<Vec<_>>().join(","),
		other => params::scalar_text(other),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::endpoint::Param;

	static SEARCH: EndpointSpec = EndpointSpec::get("search_samples", "samples")
		.optional(&[Param::string("title"), Param::enumerated("format")])
		.multi(&["format"])
		.aliases(&[("fmt", "format")]);
	static FETCH: EndpointSpec = EndpointSpec::get("fetch_sample", "samples/{sampleId}/files")
		.required(&[Param::string("sampleId")]);

	#[test]
	fn multi_values_split_on_commas() {
		assert_eq!(split_multi(Value::from("DAISY, EPUB3,")), serde_json::json!(["DAISY", "EPUB3"]));
		assert_eq!(split_multi(Value::from("DAISY")), Value::from("DAISY"));
	}

	#[test]
	fn prepare_substitutes_placeholders() {
		let params = ApiParams::new().with("sampleId", "a b/c").with("limit", 5);
		let (segments, rest) = prepare(&FETCH, params).expect("Bound call should prepare.");

		assert_eq!(segments, vec!["samples", "a b/c", "files"]);
		assert_eq!(rest, ApiParams::new().with("limit", 5));
	}

	#[test]
	fn prepare_rejects_missing_placeholder() {
		let err = prepare(&FETCH, ApiParams::new()).expect_err("Missing id should be rejected.");

		assert_eq!(err.to_string(), "fetch_sample: missing required parameter sampleId");
	}

	#[test]
	fn options_do_not_replace_bound_path_arguments() {
		let mut service = crate::_preludet::build_test_service("https://api.example.org");
		let call = service
			.call(&FETCH)
			.arg("sampleId", "s-1")
			.extend(ApiParams::new().with("sampleId", "other").with("limit", 5));

		assert_eq!(call.params().get_str("sampleId"), Some("s-1"));
		assert_eq!(call.params().get("limit"), Some(&Value::from(5)));

		let unbound = service.call(&FETCH).extend(ApiParams::new().with("sampleId", "s-2"));

		assert_eq!(unbound.params().get_str("sampleId"), Some("s-2"));
	}

	#[test]
	fn search_spec_has_no_placeholders() {
		let (segments, _) = prepare(&SEARCH, ApiParams::new()).expect("Search should prepare.");

		assert_eq!(segments, vec!["samples"]);
		assert_eq!(SEARCH.wire_name("fmt"), "format");
	}
}
