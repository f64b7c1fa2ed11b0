//! Declarative endpoint descriptions.
//!
//! Every remote operation is described by a static [`EndpointSpec`] living in its domain
//! module's table. Specs are immutable after declaration; the [`registry`] indexes all of
//! them by method name for validation and lookup.

pub mod call;
pub mod params;
pub mod registry;

pub use call::*;
pub use params::*;
pub use registry::*;

// self
use crate::{_prelude::*, error::ServiceKind, session::Verb};

/// Wire type of a declared parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamType {
	/// Free text.
	String,
	/// Integer value.
	Integer,
	/// Boolean flag.
	Boolean,
	/// ISO-8601 date (`YYYY-MM-DD`).
	Date,
	/// Enumerated value accepted by the remote API.
	Enum,
}

/// Declared parameter name and type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Param {
	/// Wire name.
	pub name: &'static str,
	/// Wire type.
	pub ty: ParamType,
}
impl Param {
	/// Declares a text parameter.
	pub const fn string(name: &'static str) -> Self {
		Self { name, ty: ParamType::String }
	}

	/// Declares an integer parameter.
	pub const fn int(name: &'static str) -> Self {
		Self { name, ty: ParamType::Integer }
	}

	/// Declares a boolean parameter.
	pub const fn bool(name: &'static str) -> Self {
		Self { name, ty: ParamType::Boolean }
	}

	/// Declares a date parameter.
	pub const fn date(name: &'static str) -> Self {
		Self { name, ty: ParamType::Date }
	}

	/// Declares an enumerated parameter.
	pub const fn enumerated(name: &'static str) -> Self {
		Self { name, ty: ParamType::Enum }
	}
}

/// Static description of one remote operation.
///
/// `path` is relative to the version segment and may contain `{name}` placeholders; every
/// placeholder must also be declared as a required parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EndpointSpec {
	/// Method name, unique across all domain tables.
	pub name: &'static str,
	/// HTTP verb.
	pub verb: Verb,
	/// Path template, e.g. `titles/{bookshareId}`.
	pub path: &'static str,
	/// Parameters that must be present and non-blank.
	pub required: &'static [Param],
	/// Parameters that may be supplied.
	pub optional: &'static [Param],
	/// Parameters accepting several values.
	pub multi: &'static [&'static str],
	/// Caller-facing names renamed to wire names before dispatch.
	pub aliases: &'static [(&'static str, &'static str)],
	/// Anchor of the operation in the remote API reference.
	pub reference: Option<&'static str>,
	/// Service the operation belongs to.
	pub service: ServiceKind,
}
impl EndpointSpec {
	/// Declares an operation with no parameters.
	pub const fn new(name: &'static str, verb: Verb, path: &'static str) -> Self {
		Self {
			name,
			verb,
			path,
			required: &[],
			optional: &[],
			multi: &[],
			aliases: &[],
			reference: None,
			service: ServiceKind::Api,
		}
	}

	/// Declares a `GET` operation.
	pub const fn get(name: &'static str, path: &'static str) -> Self {
		Self::new(name, Verb::Get, path)
	}

	/// Declares a `POST` operation.
	pub const fn post(name: &'static str, path: &'static str) -> Self {
		Self::new(name, Verb::Post, path)
	}

	/// Declares a `PUT` operation.
	pub const fn put(name: &'static str, path: &'static str) -> Self {
		Self::new(name, Verb::Put, path)
	}

	/// Declares a `DELETE` operation.
	pub const fn delete(name: &'static str, path: &'static str) -> Self {
		Self::new(name, Verb::Delete, path)
	}

	/// Sets the required parameters.
	pub const fn required(mut self, params: &'static [Param]) -> Self {
		self.required = params;

		self
	}

	/// Sets the optional parameters.
	pub const fn optional(mut self, params: &'static [Param]) -> Self {
		self.optional = params;

		self
	}

	/// Marks parameters as multi-valued.
	pub const fn multi(mut self, names: &'static [&'static str]) -> Self {
		self.multi = names;

		self
	}

	/// Declares caller-name to wire-name renames.
	pub const fn aliases(mut self, aliases: &'static [(&'static str, &'static str)]) -> Self {
		self.aliases = aliases;

		self
	}

	/// Sets the API reference anchor.
	pub const fn reference(mut self, anchor: &'static str) -> Self {
		self.reference = Some(anchor);

		self
	}

	/// Tags the operation as part of the download service.
	pub const fn download(mut self) -> Self {
		self.service = ServiceKind::Download;

		self
	}

	/// Names of the required parameters, in declaration order.
	pub fn required_names(&self) -> Vec<&'static str> {
		self.required.iter().map(|p| p.name).collect()
	}

	/// Returns `true` when `name` is declared (required or optional).
	pub fn accepts(&self, name: &str) -> bool {
		self.required.iter().chain(self.optional).any(|p| p.name == name)
	}

	/// Returns `true` when `name` accepts several values.
	pub fn is_multi(&self, name: &str) -> bool {
		self.multi.contains(&name)
	}

	/// Resolves a caller-facing name to its wire name.
	pub fn wire_name<'a>(&self, name: &'a str) -> &'a str {
		self.aliases.iter().find(|(from, _)| *from == name).map_or(name, |&(_, to)| to)
	}

	/// Placeholder names appearing in the path template.
	pub fn placeholders(&self) -> impl Iterator<Item = &'static str> {
		self.path
			.split('/')
			.filter_map(|segment| segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	static SAMPLE: EndpointSpec = EndpointSpec::get("get_sample", "samples/{sampleId}/{format}")
		.required(&[Param::string("sampleId"), Param::enumerated("format")])
		.optional(&[Param::int("limit")])
		.multi(&["format"])
		.aliases(&[("fmt", "format")])
		.reference("_get-sample");

	#[test]
	fn placeholders_follow_the_template() {
		assert_eq!(SAMPLE.placeholders().collect::<Vec<_>>(), vec!["sampleId", "format"]);
		assert_eq!(SAMPLE.required_names(), vec!["sampleId", "format"]);
	}

	#[test]
	fn aliases_resolve_to_wire_names() {
		assert_eq!(SAMPLE.wire_name("fmt"), "format");
		assert_eq!(SAMPLE.wire_name("limit"), "limit");
		assert!(SAMPLE.accepts("limit"));
		assert!(!SAMPLE.accepts("fmt"));
		assert!(SAMPLE.is_multi("format"));
		assert_eq!(SAMPLE.service, ServiceKind::Api);
	}
}
