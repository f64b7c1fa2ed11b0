//! Title catalog endpoints.

// self
use crate::{
	_prelude::*,
	classify::ErrorDomain,
	dto::{ApiRecord, Link, Paging, StatusMessage},
	endpoint::{ApiParams, EndpointSpec, Param},
	error::ErrorKind,
	service::ApiService,
};

/// Error tables for title operations.
pub static TITLE_ERRORS: LazyLock<ErrorDomain> = LazyLock::new(|| {
	ErrorDomain::builder(ErrorKind::Title)
		.message("no_items", "There are no titles matching this request (%s)")
		.response_pattern("no_format", r"(?i)\bformat\b.*\bnot\s+available\b")
		.message("no_format", "This title is not available in the requested format")
		.message("default", "Title request failed")
		.build()
});

/// `GET /titles`
pub static GET_TITLES: EndpointSpec = EndpointSpec::get("get_titles", "titles")
	.optional(&[
		Param::string("title"),
		Param::string("author"),
		Param::string("narrator"),
		Param::string("keyword"),
		Param::string("isbn"),
		Param::string("language"),
		Param::string("country"),
		Param::enumerated("formats"),
		Param::string("categories"),
		Param::enumerated("excludedContentWarnings"),
		Param::enumerated("includedContentWarnings"),
		Param::string("start"),
		Param::int("limit"),
		Param::enumerated("sortOrder"),
		Param::enumerated("direction"),
	])
	.multi(&["formats", "categories", "excludedContentWarnings", "includedContentWarnings"])
	.aliases(&[("fmt", "formats"), ("format", "formats"), ("category", "categories")])
	.reference("_title-search");
/// `GET /titles/{bookshareId}`
pub static GET_TITLE: EndpointSpec = EndpointSpec::get("get_title", "titles/{bookshareId}")
	.required(&[Param::string("bookshareId")])
	.reference("_get-title-metadata");
/// `GET /titles/{bookshareId}/{format}`
pub static DOWNLOAD_TITLE: EndpointSpec =
	EndpointSpec::get("download_title", "titles/{bookshareId}/{format}")
		.required(&[Param::string("bookshareId"), Param::enumerated("format")])
		.optional(&[Param::string("forUser")])
		.aliases(&[("fmt", "format")])
		.reference("_get-title-download")
		.download();
/// `GET /categories`
pub static GET_CATEGORIES: EndpointSpec = EndpointSpec::get("get_categories", "categories")
	.optional(&[Param::string("start"), Param::int("limit")])
	.reference("_get-categories");
/// `GET /catalog`
pub static GET_CATALOG: EndpointSpec = EndpointSpec::get("get_catalog", "catalog")
	.optional(&[
		Param::string("country"),
		Param::bool("isbnOnly"),
		Param::enumerated("formats"),
		Param::date("lastUpdatedDate"),
		Param::string("start"),
		Param::int("limit"),
		Param::enumerated("sortOrder"),
		Param::enumerated("direction"),
	])
	.multi(&["formats"])
	.aliases(&[("fmt", "formats")])
	.reference("_get-catalog");

/// Title endpoint table.
pub static ENDPOINTS: &[&EndpointSpec] =
	&[&GET_TITLES, &GET_TITLE, &DOWNLOAD_TITLE, &GET_CATEGORIES, &GET_CATALOG];

/// Download format offered for a title.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Format {
	/// Format identifier, e.g. `DAISY`.
	#[serde(default)]
	pub format_id: String,
	/// Display name.
	#[serde(default)]
	pub name: String,
}

/// Contributor of a title.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributor {
	/// Role, e.g. `author`.
	#[serde(default)]
	pub r#type: String,
	/// Name as displayed.
	#[serde(default)]
	pub name: Value,
}

/// Full metadata of one title.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleMetadata {
	/// Catalog identifier.
	pub bookshare_id: String,
	/// Title.
	#[serde(default)]
	pub title: String,
	/// Subtitle.
	#[serde(default)]
	pub subtitle: Option<String>,
	/// Thirteen-digit ISBN.
	#[serde(default)]
	pub isbn13: Option<String>,
	/// Synopsis.
	#[serde(default)]
	pub synopsis: Option<String>,
	/// Publication date.
	#[serde(default)]
	pub publish_date: Option<String>,
	/// Contributors.
	#[serde(default)]
	pub contributors: Vec<Contributor>,
	/// Available formats.
	#[serde(default)]
	pub formats: Vec<Format>,
	/// Related links.
	#[serde(default)]
	pub links: Vec<Link>,
	/// Fields not mapped above.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}

/// Page of search results.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleList {
	/// Titles on this page.
	#[serde(default)]
	pub titles: Vec<TitleMetadata>,
	/// Paging details.
	#[serde(flatten)]
	pub paging: Paging,
}

/// Category of the catalog.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
	/// Category name.
	#[serde(default)]
	pub name: String,
	/// Description.
	#[serde(default)]
	pub description: Option<String>,
	/// Fields not mapped above.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}

/// Page of categories.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoriesList {
	/// Categories on this page.
	#[serde(default)]
	pub categories: Vec<Category>,
	/// Paging details.
	#[serde(flatten)]
	pub paging: Paging,
}

impl ApiService {
	/// Title operations bound to this service's session.
	pub fn title(&mut self) -> TitleApi<'_> {
		TitleApi { service: self }
	}
}

/// Title operations for one session.
#[derive(Debug)]
pub struct TitleApi<'a> {
	service: &'a mut ApiService,
}
impl TitleApi<'_> {
	/// Searches the catalog.
	///
	/// Multi-valued filters (`formats`, `categories`, content warnings) accept arrays or
	/// comma-separated text.
	pub async fn get_titles(&mut self, opt: ApiParams) -> Result<ApiRecord<TitleList>> {
		self.service.call(&GET_TITLES).extend(opt).fetch().await
	}

	/// Metadata of one title.
	pub async fn get_title(
		&mut self,
		bookshare_id: &str,
		opt: ApiParams,
	) -> Result<ApiRecord<TitleMetadata>> {
		self.service.call(&GET_TITLE).arg("bookshareId", bookshare_id).extend(opt).fetch().await
	}

	/// Requests an artifact of a title.
	///
	/// The service answers with a status message while the artifact is being packaged.
	pub async fn download_title(
		&mut self,
		bookshare_id: &str,
		format: &str,
		opt: ApiParams,
	) -> Result<ApiRecord<StatusMessage>> {
		self.service
			.call(&DOWNLOAD_TITLE)
			.arg("bookshareId", bookshare_id)
			.arg("format", format)
			.extend(opt)
			.fetch()
			.await
	}

	/// Catalog categories.
	pub async fn get_categories(&mut self, opt: ApiParams) -> Result<ApiRecord<CategoriesList>> {
		self.service.call(&GET_CATEGORIES).extend(opt).fetch().await
	}

	/// Whole-catalog listing for collection assistants.
	pub async fn get_catalog(&mut self, opt: ApiParams) -> Result<ApiRecord<TitleList>> {
		self.service.call(&GET_CATALOG).extend(opt).fetch().await
	}

	/// Raises the title-domain error describing the last call.
	pub fn raise_exception<T>(&self, method: &str) -> Result<T> {
		self.service.raise_exception(method, &TITLE_ERRORS)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::classify;

	#[test]
	fn no_items_template_interpolates() {
		let message = classify::compose(
			TITLE_ERRORS.responses(),
			TITLE_ERRORS.messages(),
			"No items found",
		);

		assert_eq!(message, "There are no titles matching this request (No items found)");
	}

	#[test]
	fn downloads_belong_to_the_download_service() {
		assert_eq!(DOWNLOAD_TITLE.service, crate::error::ServiceKind::Download);
		assert_eq!(GET_TITLE.service, crate::error::ServiceKind::Api);
	}

	#[test]
	fn metadata_requires_an_id() {
		let err = serde_json::from_str::<TitleMetadata>(r#"{"title":"Orphan"}"#)
			.expect_err("Metadata without an id should not decode.");

		assert!(err.to_string().contains("bookshareId"));
	}
}
