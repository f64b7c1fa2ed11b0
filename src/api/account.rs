//! Account endpoints: identity, the caller's own account, and accounts managed by a sponsor.

// self
use crate::{
	_prelude::*,
	classify::ErrorDomain,
	dto::{ApiRecord, Paging, StatusMessage},
	endpoint::{ApiParams, EndpointSpec, Param},
	error::ErrorKind,
	service::ApiService,
};

/// Error tables for account operations.
pub static ACCOUNT_ERRORS: LazyLock<ErrorDomain> = LazyLock::new(|| {
	ErrorDomain::builder(ErrorKind::Account)
		.response_pattern("duplicate", r"(?i)\balready\s+(exists|registered)\b")
		.message("duplicate", "An account with this email address already exists")
		.message("no_items", "No matching accounts were found")
		.message("default", "Account request failed")
		.build()
});

/// `GET /me`
pub static GET_USER_IDENTITY: EndpointSpec =
	EndpointSpec::get("get_user_identity", "me").reference("_get-me");
/// `GET /myaccount`
pub static GET_MY_ACCOUNT: EndpointSpec =
	EndpointSpec::get("get_my_account", "myaccount").reference("_get-myaccount-summary");
/// `GET /myaccount/preferences`
pub static GET_MY_PREFERENCES: EndpointSpec =
	EndpointSpec::get("get_my_preferences", "myaccount/preferences")
		.reference("_get-myaccount-preferences");
/// `PUT /myaccount/preferences`
pub static UPDATE_MY_PREFERENCES: EndpointSpec =
	EndpointSpec::put("update_my_preferences", "myaccount/preferences")
		.optional(&[
			Param::bool("allowAdultContent"),
			Param::bool("showAllBooks"),
			Param::string("language"),
			Param::enumerated("format"),
			Param::enumerated("brailleGrade"),
			Param::enumerated("brailleFormat"),
			Param::int("brailleCellLineWidth"),
			Param::int("fontSize"),
			Param::bool("useUeb"),
		])
		.aliases(&[("fmt", "format")])
		.reference("_put-myaccount-preferences");
/// `GET /myaccount/history`
pub static GET_MY_DOWNLOAD_HISTORY: EndpointSpec =
	EndpointSpec::get("get_my_download_history", "myaccount/history")
		.optional(&[
			Param::string("start"),
			Param::int("limit"),
			Param::enumerated("sortOrder"),
			Param::enumerated("direction"),
		])
		.reference("_get-myaccount-downloads");
/// `GET /accounts`
pub static GET_ACCOUNTS: EndpointSpec = EndpointSpec::get("get_accounts", "accounts")
	.optional(&[
		Param::string("emailAddress"),
		Param::string("lastName"),
		Param::string("start"),
		Param::int("limit"),
	])
	.reference("_user-account-search");
/// `GET /accounts/{userIdentifier}`
pub static GET_ACCOUNT: EndpointSpec = EndpointSpec::get("get_account", "accounts/{userIdentifier}")
	.required(&[Param::string("userIdentifier")])
	.reference("_get-useraccount");
/// `POST /accounts`
pub static CREATE_ACCOUNT: EndpointSpec = EndpointSpec::post("create_account", "accounts")
	.required(&[
		Param::string("firstName"),
		Param::string("lastName"),
		Param::string("emailAddress"),
		Param::string("address1"),
		Param::string("city"),
		Param::string("country"),
		Param::string("postalCode"),
	])
	.optional(&[
		Param::string("address2"),
		Param::string("state"),
		Param::string("phoneNumber"),
		Param::date("dateOfBirth"),
		Param::string("language"),
		Param::bool("allowAdultContent"),
		Param::enumerated("site"),
		Param::enumerated("role"),
		Param::string("password"),
	])
	.reference("_create-useraccount");
/// `PUT /accounts/{userIdentifier}`
pub static UPDATE_ACCOUNT: EndpointSpec =
	EndpointSpec::put("update_account", "accounts/{userIdentifier}")
		.required(&[Param::string("userIdentifier")])
		.optional(&[
			Param::string("firstName"),
			Param::string("lastName"),
			Param::string("emailAddress"),
			Param::string("address1"),
			Param::string("address2"),
			Param::string("city"),
			Param::string("state"),
			Param::string("country"),
			Param::string("postalCode"),
			Param::string("phoneNumber"),
			Param::date("dateOfBirth"),
			Param::bool("allowAdultContent"),
		])
		.reference("_update-useraccount");
/// `PUT /accounts/{userIdentifier}/password`
pub static UPDATE_ACCOUNT_PASSWORD: EndpointSpec =
	EndpointSpec::put("update_account_password", "accounts/{userIdentifier}/password")
		.required(&[Param::string("userIdentifier"), Param::string("password")])
		.reference("_update-useraccount-password");

/// Account endpoint table.
pub static ENDPOINTS: &[&EndpointSpec] = &[
	&GET_USER_IDENTITY,
	&GET_MY_ACCOUNT,
	&GET_MY_PREFERENCES,
	&UPDATE_MY_PREFERENCES,
	&GET_MY_DOWNLOAD_HISTORY,
	&GET_ACCOUNTS,
	&GET_ACCOUNT,
	&CREATE_ACCOUNT,
	&UPDATE_ACCOUNT,
	&UPDATE_ACCOUNT_PASSWORD,
];

/// Identity of the authenticated user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
	/// Login name.
	#[serde(default)]
	pub username: String,
	/// Display name parts.
	#[serde(default)]
	pub name: Option<PersonName>,
	/// Fields not mapped above.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}

/// Given and family name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonName {
	/// Given name.
	#[serde(default)]
	pub first_name: String,
	/// Family name.
	#[serde(default)]
	pub last_name: String,
}

/// The caller's own account summary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyAccountSummary {
	/// Account identifier.
	#[serde(default)]
	pub user_account_id: Option<String>,
	/// Display name parts.
	#[serde(default)]
	pub name: Option<PersonName>,
	/// Contact address.
	#[serde(default)]
	pub email_address: Option<String>,
	/// Whether the account may download.
	#[serde(default)]
	pub can_download: bool,
	/// Fields not mapped above.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}

/// Reading preferences.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyAccountPreferences {
	/// Whether adult content is shown.
	#[serde(default)]
	pub allow_adult_content: bool,
	/// Preferred language.
	#[serde(default)]
	pub language: Option<String>,
	/// Preferred download format.
	#[serde(default)]
	pub format: Option<Value>,
	/// Fields not mapped above.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}

/// A managed user account.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
	/// Account identifier.
	#[serde(default)]
	pub user_account_id: Option<String>,
	/// Display name parts.
	#[serde(default)]
	pub name: Option<PersonName>,
	/// Contact address.
	#[serde(default)]
	pub email_address: Option<String>,
	/// Whether the account is locked.
	#[serde(default)]
	pub locked: bool,
	/// Fields not mapped above.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}

/// Page of managed accounts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccountList {
	/// Accounts on this page.
	#[serde(default)]
	pub user_accounts: Vec<UserAccount>,
	/// Paging details.
	#[serde(flatten)]
	pub paging: Paging,
}

/// Page of past downloads.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleDownloadList {
	/// Downloads on this page.
	#[serde(default)]
	pub title_downloads: Vec<Value>,
	/// Paging details.
	#[serde(flatten)]
	pub paging: Paging,
}

impl ApiService {
	/// Account operations bound to this service's session.
	pub fn account(&mut self) -> AccountApi<'_> {
		AccountApi { service: self }
	}
}

/// Account operations for one session.
#[derive(Debug)]
pub struct AccountApi<'a> {
	service: &'a mut ApiService,
}
impl AccountApi<'_> {
	/// Identity of the authenticated user.
	pub async fn get_user_identity(&mut self) -> Result<ApiRecord<UserIdentity>> {
		self.service.call(&GET_USER_IDENTITY).fetch().await
	}

	/// Summary of the caller's account.
	pub async fn get_my_account(&mut self) -> Result<ApiRecord<MyAccountSummary>> {
		self.service.call(&GET_MY_ACCOUNT).fetch().await
	}

	/// The caller's reading preferences.
	pub async fn get_my_preferences(&mut self) -> Result<ApiRecord<MyAccountPreferences>> {
		self.service.call(&GET_MY_PREFERENCES).fetch().await
	}

	/// Updates the caller's reading preferences.
	pub async fn update_my_preferences(
		&mut self,
		opt: ApiParams,
	) -> Result<ApiRecord<MyAccountPreferences>> {
		self.service.call(&UPDATE_MY_PREFERENCES).extend(opt).fetch().await
	}

	/// The caller's download history.
	pub async fn get_my_download_history(
		&mut self,
		opt: ApiParams,
	) -> Result<ApiRecord<TitleDownloadList>> {
		self.service.call(&GET_MY_DOWNLOAD_HISTORY).extend(opt).fetch().await
	}

	/// Searches the accounts the caller manages.
	pub async fn get_accounts(&mut self, opt: ApiParams) -> Result<ApiRecord<UserAccountList>> {
		self.service.call(&GET_ACCOUNTS).extend(opt).fetch().await
	}

	/// A managed account.
	pub async fn get_account(&mut self, user: &str) -> Result<ApiRecord<UserAccount>> {
		self.service.call(&GET_ACCOUNT).arg("userIdentifier", user).fetch().await
	}

	/// Creates an account; `fields` must carry every required field.
	pub async fn create_account(&mut self, fields: ApiParams) -> Result<ApiRecord<UserAccount>> {
		self.service.call(&CREATE_ACCOUNT).extend(fields).fetch().await
	}

	/// Updates a managed account.
	pub async fn update_account(
		&mut self,
		user: &str,
		opt: ApiParams,
	) -> Result<ApiRecord<UserAccount>> {
		self.service.call(&UPDATE_ACCOUNT).arg("userIdentifier", user).extend(opt).fetch().await
	}

	/// Sets a managed account's password.
	pub async fn update_account_password(
		&mut self,
		user: &str,
		password: &str,
	) -> Result<ApiRecord<StatusMessage>> {
		self.service
			.call(&UPDATE_ACCOUNT_PASSWORD)
			.arg("userIdentifier", user)
			.arg("password", password)
			.fetch()
			.await
	}

	/// Raises the account-domain error describing the last call.
	pub fn raise_exception<T>(&self, method: &str) -> Result<T> {
		self.service.raise_exception(method, &ACCOUNT_ERRORS)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn duplicate_accounts_get_their_own_template() {
		let messages = ACCOUNT_ERRORS.messages();
		let message = crate::classify::compose(
			ACCOUNT_ERRORS.responses(),
			messages,
			"User already exists",
		);

		assert_eq!(
			message,
			"An account with this email address already exists: User already exists"
		);
	}

	#[test]
	fn summary_keeps_unknown_fields() {
		let summary: MyAccountSummary = serde_json::from_str(
			r#"{"userAccountId":"u1","canDownload":true,"site":"bookshare"}"#,
		)
		.expect("Summary fixture should decode.");

		assert_eq!(summary.user_account_id.as_deref(), Some("u1"));
		assert!(summary.can_download);
		assert_eq!(summary.extra.get("site"), Some(&Value::from("bookshare")));
	}
}
