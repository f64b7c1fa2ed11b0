//! Name-indexed view over every domain endpoint table.

// self
use crate::{_prelude::*, api, endpoint::EndpointSpec};

/// Required parameter names keyed by method name.
pub static REQUIRED_PARAMETERS: LazyLock<BTreeMap<&'static str, Vec<&'static str>>> =
	LazyLock::new(|| {
		REGISTRY
			.values()
			.filter(|spec| !spec.required.is_empty())
			.map(|spec| (spec.name, spec.required_names()))
			.collect()
	});

static REGISTRY: LazyLock<BTreeMap<&'static str, &'static EndpointSpec>> = LazyLock::new(|| {
	let mut registry = BTreeMap::new();

	for spec in api::endpoint_tables().into_iter().flatten().copied() {
		if registry.insert(spec.name, spec).is_some() {
			tracing::error!(name = spec.name, "Duplicate endpoint declaration.");
		}
	}

	registry
});

/// Looks up an endpoint by method name.
pub fn lookup(name: &str) -> Option<&'static EndpointSpec> {
	REGISTRY.get(name).copied()
}

/// Required parameter names registered for `name`.
pub fn required_parameters(name: &str) -> Option<Vec<&'static str>> {
	REQUIRED_PARAMETERS.get(name).cloned()
}

/// Every declared endpoint, ordered by method name.
pub fn endpoints() -> impl Iterator<Item = &'static EndpointSpec> {
	REGISTRY.values().copied()
}
