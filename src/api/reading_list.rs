//! Reading list endpoints.

// self
use crate::{
	_prelude::*,
	api::title::TitleMetadata,
	classify::ErrorDomain,
	dto::{ApiRecord, Link, Paging, StatusMessage},
	endpoint::{ApiParams, EndpointSpec, Param},
	error::ErrorKind,
	service::ApiService,
};

/// Error tables for reading list operations.
pub static READING_LIST_ERRORS: LazyLock<ErrorDomain> = LazyLock::new(|| {
	ErrorDomain::builder(ErrorKind::ReadingList)
		.message("no_items", "The reading list is empty")
		.message("default", "Reading list request failed")
		.build()
});

const PAGED: &[Param] = &[
	Param::string("start"),
	Param::int("limit"),
	Param::enumerated("sortOrder"),
	Param::enumerated("direction"),
];

/// `GET /mylists`
pub static GET_MY_READING_LISTS: EndpointSpec =
	EndpointSpec::get("get_my_reading_lists", "mylists")
		.optional(PAGED)
		.reference("_get-my-reading-lists");
/// `POST /mylists`
pub static CREATE_READING_LIST: EndpointSpec = EndpointSpec::post("create_reading_list", "mylists")
	.required(&[Param::string("name"), Param::enumerated("access")])
	.optional(&[Param::string("description")])
	.reference("_post-reading-list-create");
/// `GET /lists/{readingListId}`
pub static GET_READING_LIST: EndpointSpec =
	EndpointSpec::get("get_reading_list", "lists/{readingListId}")
		.required(&[Param::string("readingListId")])
		.reference("_get-reading-list");
/// `PUT /lists/{readingListId}`
pub static UPDATE_READING_LIST: EndpointSpec =
	EndpointSpec::put("update_reading_list", "lists/{readingListId}")
		.required(&[Param::string("readingListId")])
		.optional(&[
			Param::string("name"),
			Param::string("description"),
			Param::enumerated("access"),
		])
		.reference("_put-reading-list-edit-metadata");
/// `GET /lists/{readingListId}/titles`
pub static GET_READING_LIST_TITLES: EndpointSpec =
	EndpointSpec::get("get_reading_list_titles", "lists/{readingListId}/titles")
		.required(&[Param::string("readingListId")])
		.optional(PAGED)
		.reference("_get-reading-list-titles");
/// `POST /lists/{readingListId}/titles`
pub static ADD_READING_LIST_TITLE: EndpointSpec =
	EndpointSpec::post("add_reading_list_title", "lists/{readingListId}/titles")
		.required(&[Param::string("readingListId"), Param::string("bookshareId")])
		.reference("_post-reading-list-title");
/// `DELETE /lists/{readingListId}/titles/{bookshareId}`
pub static REMOVE_READING_LIST_TITLE: EndpointSpec =
	EndpointSpec::delete("remove_reading_list_title", "lists/{readingListId}/titles/{bookshareId}")
		.required(&[Param::string("readingListId"), Param::string("bookshareId")])
		.reference("_delete-reading-list-title");
/// `POST /lists/{readingListId}/subscription`
pub static SUBSCRIBE_READING_LIST: EndpointSpec =
	EndpointSpec::post("subscribe_reading_list", "lists/{readingListId}/subscription")
		.required(&[Param::string("readingListId")])
		.optional(&[Param::bool("enabled")])
		.reference("_post-reading-list-subscription");
/// `PUT /lists/{readingListId}/subscription`
pub static UNSUBSCRIBE_READING_LIST: EndpointSpec =
	EndpointSpec::put("unsubscribe_reading_list", "lists/{readingListId}/subscription")
		.required(&[Param::string("readingListId")])
		.optional(&[Param::bool("enabled")])
		.reference("_put-reading-list-subscription");

/// Reading list endpoint table.
pub static ENDPOINTS: &[&EndpointSpec] = &[
	&GET_MY_READING_LISTS,
	&CREATE_READING_LIST,
	&GET_READING_LIST,
	&UPDATE_READING_LIST,
	&GET_READING_LIST_TITLES,
	&ADD_READING_LIST_TITLE,
	&REMOVE_READING_LIST_TITLE,
	&SUBSCRIBE_READING_LIST,
	&UNSUBSCRIBE_READING_LIST,
];

/// A reading list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingList {
	/// List identifier.
	pub reading_list_id: String,
	/// List name.
	#[serde(default)]
	pub name: String,
	/// Description.
	#[serde(default)]
	pub description: Option<String>,
	/// Visibility, e.g. `private`.
	#[serde(default)]
	pub access: Option<String>,
	/// Number of titles on the list.
	#[serde(default)]
	pub title_count: Option<u64>,
	/// Whether the caller is subscribed.
	#[serde(default)]
	pub subscription: Option<Value>,
	/// Related links.
	#[serde(default)]
	pub links: Vec<Link>,
	/// Fields not mapped above.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}

/// Page of reading lists.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingListList {
	/// Lists on this page.
	#[serde(default)]
	pub lists: Vec<ReadingList>,
	/// Paging details.
	#[serde(flatten)]
	pub paging: Paging,
}

/// Page of titles on a reading list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingListTitles {
	/// Titles on this page.
	#[serde(default)]
	pub titles: Vec<TitleMetadata>,
	/// Paging details.
	#[serde(flatten)]
	pub paging: Paging,
}

impl ApiService {
	/// Reading list operations bound to this service's session.
	pub fn reading_list(&mut self) -> ReadingListApi<'_> {
		ReadingListApi { service: self }
	}
}

/// Reading list operations for one session.
#[derive(Debug)]
pub struct ReadingListApi<'a> {
	service: &'a mut ApiService,
}
impl ReadingListApi<'_> {
	/// Lists owned by or shared with the caller.
	pub async fn get_my_reading_lists(&mut self, opt: ApiParams) -> Result<ApiRecord<ReadingListList>> {
		self.service.call(&GET_MY_READING_LISTS).extend(opt).fetch().await
	}

	/// Creates a list.
	pub async fn create_reading_list(
		&mut self,
		name: &str,
		access: &str,
		opt: ApiParams,
	) -> Result<ApiRecord<ReadingList>> {
		self.service
			.call(&CREATE_READING_LIST)
			.arg("name", name)
			.arg("access", access)
			.extend(opt)
			.fetch()
			.await
	}

	/// Metadata of one list.
	pub async fn get_reading_list(&mut self, list_id: &str) -> Result<ApiRecord<ReadingList>> {
		self.service.call(&GET_READING_LIST).arg("readingListId", list_id).fetch().await
	}

	/// Updates a list's metadata.
	pub async fn update_reading_list(
		&mut self,
		list_id: &str,
		opt: ApiParams,
	) -> Result<ApiRecord<ReadingList>> {
		self.service
			.call(&UPDATE_READING_LIST)
			.arg("readingListId", list_id)
			.extend(opt)
			.fetch()
			.await
	}

	/// Titles on a list.
	pub async fn get_reading_list_titles(
		&mut self,
		list_id: &str,
		opt: ApiParams,
	) -> Result<ApiRecord<ReadingListTitles>> {
		self.service
			.call(&GET_READING_LIST_TITLES)
			.arg("readingListId", list_id)
			.extend(opt)
			.fetch()
			.await
	}

	/// Adds a title to a list.
	pub async fn add_reading_list_title(
		&mut self,
		list_id: &str,
		bookshare_id: &str,
	) -> Result<ApiRecord<ReadingListTitles>> {
		self.service
			.call(&ADD_READING_LIST_TITLE)
			.arg("readingListId", list_id)
			.arg("bookshareId", bookshare_id)
			.fetch()
			.await
	}

	/// Removes a title from a list.
	pub async fn remove_reading_list_title(
		&mut self,
		list_id: &str,
		bookshare_id: &str,
	) -> Result<ApiRecord<ReadingListTitles>> {
		self.service
			.call(&REMOVE_READING_LIST_TITLE)
			.arg("readingListId", list_id)
			.arg("bookshareId", bookshare_id)
			.fetch()
			.await
	}

	/// Subscribes the caller to a list.
	pub async fn subscribe_reading_list(&mut self, list_id: &str) -> Result<ApiRecord<StatusMessage>> {
		self.service
			.call(&SUBSCRIBE_READING_LIST)
			.arg("readingListId", list_id)
			.arg("enabled", true)
			.fetch()
			.await
	}

	/// Unsubscribes the caller from a list.
	pub async fn unsubscribe_reading_list(
		&mut self,
		list_id: &str,
	) -> Result<ApiRecord<StatusMessage>> {
		self.service
			.call(&UNSUBSCRIBE_READING_LIST)
			.arg("readingListId", list_id)
			.arg("enabled", false)
			.fetch()
			.await
	}

	/// Raises the reading-list-domain error describing the last call.
	pub fn raise_exception<T>(&self, method: &str) -> Result<T> {
		self.service.raise_exception(method, &READING_LIST_ERRORS)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::session::Verb;

	#[test]
	fn subscription_toggles_share_a_path() {
		assert_eq!(SUBSCRIBE_READING_LIST.path, UNSUBSCRIBE_READING_LIST.path);
		assert_eq!(SUBSCRIBE_READING_LIST.verb, Verb::Post);
		assert_eq!(UNSUBSCRIBE_READING_LIST.verb, Verb::Put);
	}

	#[test]
	fn list_pages_decode_paging_alongside_lists() {
		let page: ReadingListList = serde_json::from_str(
			r#"{"lists":[{"readingListId":"rl-1","name":"Summer","titleCount":3}],"totalResults":1,"next":"abc"}"#,
		)
		.expect("Reading list page fixture should decode.");

		assert_eq!(page.lists.len(), 1);
		assert_eq!(page.lists[0].title_count, Some(3));
		assert_eq!(page.paging.total_results, Some(1));
		assert_eq!(page.paging.next.as_deref(), Some("abc"));
	}
}
