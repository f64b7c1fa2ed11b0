//! Subscription endpoints.

// self
use crate::{
	_prelude::*,
	classify::ErrorDomain,
	dto::{ApiRecord, Link},
	endpoint::{ApiParams, EndpointSpec, Param},
	error::ErrorKind,
	service::ApiService,
};

/// Error tables for subscription operations.
pub static SUBSCRIPTION_ERRORS: LazyLock<ErrorDomain> = LazyLock::new(|| {
	ErrorDomain::builder(ErrorKind::Subscription)
		.response_pattern("overlap", r"(?i)\boverlap")
		.message("overlap", "The subscription dates overlap an existing subscription")
		.message("default", "Subscription request failed")
		.build()
});

/// `GET /accounts/{userIdentifier}/subscriptions`
pub static GET_SUBSCRIPTIONS: EndpointSpec =
	EndpointSpec::get("get_subscriptions", "accounts/{userIdentifier}/subscriptions")
		.required(&[Param::string("userIdentifier")])
		.reference("_get-member-subscriptions");
/// `POST /accounts/{userIdentifier}/subscriptions`
pub static CREATE_SUBSCRIPTION: EndpointSpec =
	EndpointSpec::post("create_subscription", "accounts/{userIdentifier}/subscriptions")
		.required(&[
			Param::string("userIdentifier"),
			Param::date("startDate"),
			Param::string("userSubscriptionType"),
		])
		.optional(&[
			Param::date("endDate"),
			Param::int("numBooksAllowed"),
			Param::enumerated("downloadTimeframe"),
			Param::string("notes"),
		])
		.aliases(&[("subscriptionType", "userSubscriptionType")])
		.reference("_create-member-subscription");
/// `GET /accounts/{userIdentifier}/subscriptions/{subscriptionId}`
pub static GET_SUBSCRIPTION: EndpointSpec = EndpointSpec::get(
	"get_subscription",
	"accounts/{userIdentifier}/subscriptions/{subscriptionId}",
)
.required(&[Param::string("userIdentifier"), Param::string("subscriptionId")])
.reference("_get-single-member-subscription");
/// `PUT /accounts/{userIdentifier}/subscriptions/{subscriptionId}`
pub static UPDATE_SUBSCRIPTION: EndpointSpec = EndpointSpec::put(
	"update_subscription",
	"accounts/{userIdentifier}/subscriptions/{subscriptionId}",
)
.required(&[
	Param::string("userIdentifier"),
	Param::string("subscriptionId"),
	Param::date("startDate"),
	Param::string("userSubscriptionType"),
])
.optional(&[
	Param::date("endDate"),
	Param::int("numBooksAllowed"),
	Param::enumerated("downloadTimeframe"),
	Param::string("notes"),
])
.aliases(&[("subscriptionType", "userSubscriptionType")])
.reference("_update-member-subscription");
/// `GET /subscriptiontypes`
pub static GET_SUBSCRIPTION_TYPES: EndpointSpec =
	EndpointSpec::get("get_subscription_types", "subscriptiontypes")
		.reference("_get-subscription-types");

/// Subscription endpoint table.
pub static ENDPOINTS: &[&EndpointSpec] = &[
	&GET_SUBSCRIPTIONS,
	&CREATE_SUBSCRIPTION,
	&GET_SUBSCRIPTION,
	&UPDATE_SUBSCRIPTION,
	&GET_SUBSCRIPTION_TYPES,
];

/// A member subscription.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSubscription {
	/// Subscription identifier.
	#[serde(default)]
	pub subscription_id: Option<Value>,
	/// First day of the subscription.
	#[serde(default)]
	pub start_date: Option<String>,
	/// Last day of the subscription.
	#[serde(default)]
	pub end_date: Option<String>,
	/// Subscription type.
	#[serde(default)]
	pub user_subscription_type: Option<SubscriptionType>,
	/// Download allowance.
	#[serde(default)]
	pub num_books_allowed: Option<u64>,
	/// Related links.
	#[serde(default)]
	pub links: Vec<Link>,
	/// Fields not mapped above.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}

/// A member's subscriptions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSubscriptionList {
	/// Subscriptions.
	#[serde(default)]
	pub subscriptions: Vec<UserSubscription>,
	/// Related links.
	#[serde(default)]
	pub links: Vec<Link>,
}

/// Kind of subscription an organization can grant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionType {
	/// Type identifier.
	#[serde(default)]
	pub name: String,
	/// Description.
	#[serde(default)]
	pub description: Option<String>,
}

/// Available subscription types.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionTypeList {
	/// Types.
	#[serde(default)]
	pub user_subscription_types: Vec<SubscriptionType>,
}

impl ApiService {
	/// Subscription operations bound to this service's session.
	pub fn subscription(&mut self) -> SubscriptionApi<'_> {
		SubscriptionApi { service: self }
	}
}

/// Subscription operations for one session.
#[derive(Debug)]
pub struct SubscriptionApi<'a> {
	service: &'a mut ApiService,
}
impl SubscriptionApi<'_> {
	/// Subscriptions held by `user`.
	pub async fn get_subscriptions(&mut self, user: &str) -> Result<ApiRecord<UserSubscriptionList>> {
		self.service.call(&GET_SUBSCRIPTIONS).arg("userIdentifier", user).fetch().await
	}

	/// Creates a subscription; `fields` must carry `startDate` and the subscription type.
	pub async fn create_subscription(
		&mut self,
		user: &str,
		fields: ApiParams,
	) -> Result<ApiRecord<UserSubscription>> {
		self.service
			.call(&CREATE_SUBSCRIPTION)
			.arg("userIdentifier", user)
			.extend(fields)
			.fetch()
			.await
	}

	/// One subscription.
	pub async fn get_subscription(
		&mut self,
		user: &str,
		subscription_id: &str,
	) -> Result<ApiRecord<UserSubscription>> {
		self.service
			.call(&GET_SUBSCRIPTION)
			.arg("userIdentifier", user)
			.arg("subscriptionId", subscription_id)
			.fetch()
			.await
	}

	/// Replaces a subscription's terms.
	pub async fn update_subscription(
		&mut self,
		user: &str,
		subscription_id: &str,
		fields: ApiParams,
	) -> Result<ApiRecord<UserSubscription>> {
		self.service
			.call(&UPDATE_SUBSCRIPTION)
			.arg("userIdentifier", user)
			.arg("subscriptionId", subscription_id)
			.extend(fields)
			.fetch()
			.await
	}

	/// Subscription types the caller may grant.
	pub async fn get_subscription_types(&mut self) -> Result<ApiRecord<SubscriptionTypeList>> {
		self.service.call(&GET_SUBSCRIPTION_TYPES).fetch().await
	}

	/// Raises the subscription-domain error describing the last call.
	pub fn raise_exception<T>(&self, method: &str) -> Result<T> {
		self.service.raise_exception(method, &SUBSCRIPTION_ERRORS)
	}
}
