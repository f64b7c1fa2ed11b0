//! User agreement endpoints.

// self
use crate::{
	_prelude::*,
	classify::ErrorDomain,
	dto::{ApiRecord, Link},
	endpoint::{ApiParams, EndpointSpec, Param},
	error::ErrorKind,
	service::ApiService,
};

/// Error tables for agreement operations.
pub static AGREEMENT_ERRORS: LazyLock<ErrorDomain> = LazyLock::new(|| {
	ErrorDomain::builder(ErrorKind::Agreement)
		.message("default", "User agreement request failed")
		.build()
});

/// `GET /accounts/{userIdentifier}/agreements`
pub static GET_USER_AGREEMENTS: EndpointSpec =
	EndpointSpec::get("get_user_agreements", "accounts/{userIdentifier}/agreements")
		.required(&[Param::string("userIdentifier")])
		.reference("_get-user-agreements");
/// `POST /accounts/{userIdentifier}/agreements`
pub static CREATE_USER_AGREEMENT: EndpointSpec =
	EndpointSpec::post("create_user_agreement", "accounts/{userIdentifier}/agreements")
		.required(&[
			Param::string("userIdentifier"),
			Param::enumerated("agreementType"),
			Param::date("dateSigned"),
			Param::string("printName"),
		])
		.optional(&[Param::bool("signedByLegalGuardian")])
		.reference("_create-user-agreement");
/// `POST /accounts/{userIdentifier}/agreements/{agreementId}/expired`
pub static EXPIRE_USER_AGREEMENT: EndpointSpec = EndpointSpec::post(
	"expire_user_agreement",
	"accounts/{userIdentifier}/agreements/{agreementId}/expired",
)
.required(&[Param::string("userIdentifier"), Param::string("agreementId")])
.reference("_expire-user-agreement");

/// Agreement endpoint table.
pub static ENDPOINTS: &[&EndpointSpec] =
	&[&GET_USER_AGREEMENTS, &CREATE_USER_AGREEMENT, &EXPIRE_USER_AGREEMENT];

/// A signed user agreement.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAgreement {
	/// Agreement identifier.
	#[serde(default)]
	pub agreement_id: Option<Value>,
	/// Agreement type, e.g. `individual`.
	#[serde(default)]
	pub agreement_type: Option<String>,
	/// Date signed.
	#[serde(default)]
	pub date_signed: Option<String>,
	/// Name as printed on the agreement.
	#[serde(default)]
	pub print_name: Option<String>,
	/// Whether the agreement has expired.
	#[serde(default)]
	pub expired: bool,
	/// Related links.
	#[serde(default)]
	pub links: Vec<Link>,
	/// Fields not mapped above.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}

/// A user's agreements.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAgreementList {
	/// Agreements.
	#[serde(default)]
	pub agreements: Vec<UserAgreement>,
	/// Related links.
	#[serde(default)]
	pub links: Vec<Link>,
}

impl ApiService {
	/// Agreement operations bound to this service's session.
	pub fn agreement(&mut self) -> AgreementApi<'_> {
		AgreementApi { service: self }
	}
}

/// Agreement operations for one session.
#[derive(Debug)]
pub struct AgreementApi<'a> {
	service: &'a mut ApiService,
}
impl AgreementApi<'_> {
	/// Agreements signed by `user`.
	pub async fn get_user_agreements(&mut self, user: &str) -> Result<ApiRecord<UserAgreementList>> {
		self.service.call(&GET_USER_AGREEMENTS).arg("userIdentifier", user).fetch().await
	}

	/// Records a new agreement; `fields` must carry the type, signing date, and printed name.
	pub async fn create_user_agreement(
		&mut self,
		user: &str,
		fields: ApiParams,
	) -> Result<ApiRecord<UserAgreement>> {
		self.service
			.call(&CREATE_USER_AGREEMENT)
			.arg("userIdentifier", user)
			.extend(fields)
			.fetch()
			.await
	}

	/// Marks an agreement expired.
	pub async fn expire_user_agreement(
		&mut self,
		user: &str,
		agreement_id: &str,
	) -> Result<ApiRecord<UserAgreement>> {
		self.service
			.call(&EXPIRE_USER_AGREEMENT)
			.arg("userIdentifier", user)
			.arg("agreementId", agreement_id)
			.fetch()
			.await
	}

	/// Raises the agreement-domain error describing the last call.
	pub fn raise_exception<T>(&self, method: &str) -> Result<T> {
		self.service.raise_exception(method, &AGREEMENT_ERRORS)
	}
}
