//! Periodical endpoints: series, editions, and edition downloads.

// self
use crate::{
	_prelude::*,
	classify::ErrorDomain,
	dto::{ApiRecord, Link, Paging, StatusMessage},
	endpoint::{ApiParams, EndpointSpec, Param},
	error::ErrorKind,
	service::ApiService,
};

/// Error tables for periodical operations.
pub static PERIODICAL_ERRORS: LazyLock<ErrorDomain> = LazyLock::new(|| {
	ErrorDomain::builder(ErrorKind::Periodical)
		.message("no_items", "No periodicals matched the search")
		.message("default", "Periodical request failed")
		.build()
});

/// `GET /periodicals`
pub static GET_PERIODICALS: EndpointSpec = EndpointSpec::get("get_periodicals", "periodicals")
	.optional(&[
		Param::string("title"),
		Param::string("issn"),
		Param::string("start"),
		Param::int("limit"),
		Param::enumerated("sortOrder"),
		Param::enumerated("direction"),
	])
	.reference("_periodical-search");
/// `GET /periodicals/{seriesId}`
pub static GET_PERIODICAL: EndpointSpec =
	EndpointSpec::get("get_periodical", "periodicals/{seriesId}")
		.required(&[Param::string("seriesId")])
		.reference("_get-periodical-series-metadata");
/// `GET /periodicals/{seriesId}/editions`
pub static GET_PERIODICAL_EDITIONS: EndpointSpec =
	EndpointSpec::get("get_periodical_editions", "periodicals/{seriesId}/editions")
		.required(&[Param::string("seriesId")])
		.optional(&[
			Param::string("start"),
			Param::int("limit"),
			Param::enumerated("sortOrder"),
			Param::enumerated("direction"),
		])
		.reference("_get-periodical-editions");
/// `PUT /periodicals/{seriesId}/editions/{editionId}`
pub static UPDATE_PERIODICAL_EDITION: EndpointSpec =
	EndpointSpec::put("update_periodical_edition", "periodicals/{seriesId}/editions/{editionId}")
		.required(&[Param::string("seriesId"), Param::string("editionId")])
		.optional(&[
			Param::string("editionName"),
			Param::date("publicationDate"),
			Param::date("expirationDate"),
		])
		.reference("_update-periodical-edition");
/// `GET /periodicals/{seriesId}/editions/{editionId}/{format}`
pub static DOWNLOAD_PERIODICAL_EDITION: EndpointSpec = EndpointSpec::get(
	"download_periodical_edition",
	"periodicals/{seriesId}/editions/{editionId}/{format}",
)
.required(&[Param::string("seriesId"), Param::string("editionId"), Param::enumerated("format")])
.optional(&[Param::string("forUser")])
.aliases(&[("fmt", "format")])
.reference("_download-periodical-edition")
.download();

/// Periodical endpoint table.
pub static ENDPOINTS: &[&EndpointSpec] = &[
	&GET_PERIODICALS,
	&GET_PERIODICAL,
	&GET_PERIODICAL_EDITIONS,
	&UPDATE_PERIODICAL_EDITION,
	&DOWNLOAD_PERIODICAL_EDITION,
];

/// A periodical series.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodicalSeries {
	/// Series identifier.
	pub series_id: String,
	/// Series title.
	#[serde(default)]
	pub title: String,
	/// ISSN.
	#[serde(default)]
	pub issn: Option<String>,
	/// Publisher.
	#[serde(default)]
	pub publisher: Option<String>,
	/// Number of editions available.
	#[serde(default)]
	pub edition_count: Option<u64>,
	/// Related links.
	#[serde(default)]
	pub links: Vec<Link>,
	/// Fields not mapped above.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}

/// Page of periodical series.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodicalSeriesList {
	/// Series on this page.
	#[serde(default)]
	pub periodicals: Vec<PeriodicalSeries>,
	/// Paging details.
	#[serde(flatten)]
	pub paging: Paging,
}

/// One edition of a series.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodicalEdition {
	/// Edition identifier.
	pub edition_id: String,
	/// Edition name.
	#[serde(default)]
	pub edition_name: Option<String>,
	/// Publication date.
	#[serde(default)]
	pub publication_date: Option<String>,
	/// Date the edition stops being available.
	#[serde(default)]
	pub expiration_date: Option<String>,
	/// Fields not mapped above.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}

/// Page of editions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodicalEditionList {
	/// Editions on this page.
	#[serde(default)]
	pub periodical_editions: Vec<PeriodicalEdition>,
	/// Paging details.
	#[serde(flatten)]
	pub paging: Paging,
}

impl ApiService {
	/// Periodical operations bound to this service's session.
	pub fn periodical(&mut self) -> PeriodicalApi<'_> {
		PeriodicalApi { service: self }
	}
}

/// Periodical operations for one session.
#[derive(Debug)]
pub struct PeriodicalApi<'a> {
	service: &'a mut ApiService,
}
impl PeriodicalApi<'_> {
	/// Searches periodical series.
	pub async fn get_periodicals(
		&mut self,
		opt: ApiParams,
	) -> Result<ApiRecord<PeriodicalSeriesList>> {
		self.service.call(&GET_PERIODICALS).extend(opt).fetch().await
	}

	/// Metadata of one series.
	pub async fn get_periodical(&mut self, series_id: &str) -> Result<ApiRecord<PeriodicalSeries>> {
		self.service.call(&GET_PERIODICAL).arg("seriesId", series_id).fetch().await
	}

	/// Editions of a series.
	pub async fn get_periodical_editions(
		&mut self,
		series_id: &str,
		opt: ApiParams,
	) -> Result<ApiRecord<PeriodicalEditionList>> {
		self.service
			.call(&GET_PERIODICAL_EDITIONS)
			.arg("seriesId", series_id)
			.extend(opt)
			.fetch()
			.await
	}

	/// Updates edition metadata.
	pub async fn update_periodical_edition(
		&mut self,
		series_id: &str,
		edition_id: &str,
		opt: ApiParams,
	) -> Result<ApiRecord<PeriodicalEdition>> {
		self.service
			.call(&UPDATE_PERIODICAL_EDITION)
			.arg("seriesId", series_id)
			.arg("editionId", edition_id)
			.extend(opt)
			.fetch()
			.await
	}

	/// Requests an artifact of an edition.
	pub async fn download_periodical_edition(
		&mut self,
		series_id: &str,
		edition_id: &str,
		format: &str,
		opt: ApiParams,
	) -> Result<ApiRecord<StatusMessage>> {
		self.service
			.call(&DOWNLOAD_PERIODICAL_EDITION)
			.arg("seriesId", series_id)
			.arg("editionId", edition_id)
			.arg("format", format)
			.extend(opt)
			.fetch()
			.await
	}

	/// Raises the periodical-domain error describing the last call.
	pub fn raise_exception<T>(&self, method: &str) -> Result<T> {
		self.service.raise_exception(method, &PERIODICAL_ERRORS)
	}
}
