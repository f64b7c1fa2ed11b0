//! Organization endpoints for sponsors managing their members.

// self
use crate::{
	_prelude::*,
	api::account::{UserAccount, UserAccountList},
	classify::ErrorDomain,
	dto::{ApiRecord, Link},
	endpoint::{ApiParams, EndpointSpec, Param},
	error::ErrorKind,
	service::ApiService,
};

/// Error tables for organization operations.
pub static ORGANIZATION_ERRORS: LazyLock<ErrorDomain> = LazyLock::new(|| {
	ErrorDomain::builder(ErrorKind::Organization)
		.message("no_items", "The organization has no matching members")
		.message("default", "Organization request failed")
		.build()
});

/// `GET /myOrganization`
pub static GET_MY_ORGANIZATION: EndpointSpec =
	EndpointSpec::get("get_my_organization", "myOrganization").reference("_get-my-organization");
/// `GET /myOrganization/members`
pub static GET_MY_ORGANIZATION_MEMBERS: EndpointSpec =
	EndpointSpec::get("get_my_organization_members", "myOrganization/members")
		.optional(&[
			Param::string("start"),
			Param::int("limit"),
			Param::enumerated("sortOrder"),
			Param::enumerated("direction"),
		])
		.reference("_get-my-organization-members");
/// `POST /myOrganization/members`
pub static ADD_MY_ORGANIZATION_MEMBER: EndpointSpec =
	EndpointSpec::post("add_my_organization_member", "myOrganization/members")
		.required(&[Param::string("firstName"), Param::string("lastName"), Param::date("dateOfBirth")])
		.optional(&[
			Param::string("emailAddress"),
			Param::int("grade"),
			Param::enumerated("disabilityType"),
			Param::enumerated("proofSource"),
			Param::string("username"),
			Param::string("password"),
		])
		.reference("_add-organization-member");
/// `GET /organizationTypes`
pub static GET_ORGANIZATION_TYPES: EndpointSpec =
	EndpointSpec::get("get_organization_types", "organizationTypes")
		.reference("_get-organization-types");

/// Organization endpoint table.
pub static ENDPOINTS: &[&EndpointSpec] = &[
	&GET_MY_ORGANIZATION,
	&GET_MY_ORGANIZATION_MEMBERS,
	&ADD_MY_ORGANIZATION_MEMBER,
	&GET_ORGANIZATION_TYPES,
];

/// A sponsoring organization.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
	/// Organization identifier.
	#[serde(default)]
	pub organization_id: Option<String>,
	/// Organization name.
	#[serde(default)]
	pub organization_name: String,
	/// Organization type.
	#[serde(default)]
	pub organization_type: Option<String>,
	/// Related links.
	#[serde(default)]
	pub links: Vec<Link>,
	/// Fields not mapped above.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}

/// Organization types known to the service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationTypeList {
	/// Types.
	#[serde(default)]
	pub organization_types: Vec<Value>,
}

impl ApiService {
	/// Organization operations bound to this service's session.
	pub fn organization(&mut self) -> OrganizationApi<'_> {
		OrganizationApi { service: self }
	}
}

/// Organization operations for one session.
#[derive(Debug)]
pub struct OrganizationApi<'a> {
	service: &'a mut ApiService,
}
impl OrganizationApi<'_> {
	/// The caller's organization.
	pub async fn get_my_organization(&mut self) -> Result<ApiRecord<Organization>> {
		self.service.call(&GET_MY_ORGANIZATION).fetch().await
	}

	/// Members of the caller's organization.
	pub async fn get_my_organization_members(
		&mut self,
		opt: ApiParams,
	) -> Result<ApiRecord<UserAccountList>> {
		self.service.call(&GET_MY_ORGANIZATION_MEMBERS).extend(opt).fetch().await
	}

	/// Adds a member; `fields` must carry the names and date of birth.
	pub async fn add_my_organization_member(
		&mut self,
		fields: ApiParams,
	) -> Result<ApiRecord<UserAccount>> {
		self.service.call(&ADD_MY_ORGANIZATION_MEMBER).extend(fields).fetch().await
	}

	/// Organization types.
	pub async fn get_organization_types(&mut self) -> Result<ApiRecord<OrganizationTypeList>> {
		self.service.call(&GET_ORGANIZATION_TYPES).fetch().await
	}

	/// Raises the organization-domain error describing the last call.
	pub fn raise_exception<T>(&self, method: &str) -> Result<T> {
		self.service.raise_exception(method, &ORGANIZATION_ERRORS)
	}
}
