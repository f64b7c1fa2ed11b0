//! Proof-of-disability endpoints.

// self
use crate::{
	_prelude::*,
	classify::ErrorDomain,
	dto::{ApiRecord, Link, StatusMessage},
	endpoint::{EndpointSpec, Param},
	error::ErrorKind,
	service::ApiService,
};

/// Error tables for proof-of-disability operations.
pub static POD_ERRORS: LazyLock<ErrorDomain> = LazyLock::new(|| {
	ErrorDomain::builder(ErrorKind::ProofOfDisability)
		.message("default", "Proof of disability request failed")
		.build()
});

/// `GET /accounts/{userIdentifier}/pod`
pub static GET_USER_POD: EndpointSpec =
	EndpointSpec::get("get_user_pod", "accounts/{userIdentifier}/pod")
		.required(&[Param::string("userIdentifier")])
		.reference("_get-user-pod");
/// `POST /accounts/{userIdentifier}/pod`
pub static CREATE_USER_POD: EndpointSpec =
	EndpointSpec::post("create_user_pod", "accounts/{userIdentifier}/pod")
		.required(&[
			Param::string("userIdentifier"),
			Param::enumerated("disabilityType"),
			Param::enumerated("proofSource"),
		])
		.reference("_create-user-pod");
/// `PUT /accounts/{userIdentifier}/pod/{disabilityType}`
pub static UPDATE_USER_POD: EndpointSpec =
	EndpointSpec::put("update_user_pod", "accounts/{userIdentifier}/pod/{disabilityType}")
		.required(&[
			Param::string("userIdentifier"),
			Param::enumerated("disabilityType"),
			Param::enumerated("proofSource"),
		])
		.reference("_update-user-pod");
/// `DELETE /accounts/{userIdentifier}/pod/{disabilityType}`
pub static REMOVE_USER_POD: EndpointSpec =
	EndpointSpec::delete("remove_user_pod", "accounts/{userIdentifier}/pod/{disabilityType}")
		.required(&[Param::string("userIdentifier"), Param::enumerated("disabilityType")])
		.reference("_delete-user-pod");

/// Proof-of-disability endpoint table.
pub static ENDPOINTS: &[&EndpointSpec] =
	&[&GET_USER_POD, &CREATE_USER_POD, &UPDATE_USER_POD, &REMOVE_USER_POD];

/// One proof-of-disability record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPod {
	/// Disability category.
	#[serde(default)]
	pub disability_type: Option<String>,
	/// Who certified the disability.
	#[serde(default)]
	pub proof_source: Option<String>,
	/// Related links.
	#[serde(default)]
	pub links: Vec<Link>,
	/// Fields not mapped above.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}

/// A user's proof-of-disability records.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPodList {
	/// Records.
	#[serde(default)]
	pub disabilities: Vec<UserPod>,
	/// Related links.
	#[serde(default)]
	pub links: Vec<Link>,
}

impl ApiService {
	/// Proof-of-disability operations bound to this service's session.
	pub fn proof_of_disability(&mut self) -> ProofOfDisabilityApi<'_> {
		ProofOfDisabilityApi { service: self }
	}
}

/// Proof-of-disability operations for one session.
#[derive(Debug)]
pub struct ProofOfDisabilityApi<'a> {
	service: &'a mut ApiService,
}
impl ProofOfDisabilityApi<'_> {
	/// Records held for `user`.
	pub async fn get_user_pod(&mut self, user: &str) -> Result<ApiRecord<UserPodList>> {
		self.service.call(&GET_USER_POD).arg("userIdentifier", user).fetch().await
	}

	/// Adds a record.
	pub async fn create_user_pod(
		&mut self,
		user: &str,
		disability_type: &str,
		proof_source: &str,
	) -> Result<ApiRecord<StatusMessage>> {
		self.service
			.call(&CREATE_USER_POD)
			.arg("userIdentifier", user)
			.arg("disabilityType", disability_type)
			.arg("proofSource", proof_source)
			.fetch()
			.await
	}

	/// Changes the certifying source of a record.
	pub async fn update_user_pod(
		&mut self,
		user: &str,
		disability_type: &str,
		proof_source: &str,
	) -> Result<ApiRecord<StatusMessage>> {
		self.service
			.call(&UPDATE_USER_POD)
			.arg("userIdentifier", user)
			.arg("disabilityType", disability_type)
			.arg("proofSource", proof_source)
			.fetch()
			.await
	}

	/// Removes a record.
	pub async fn remove_user_pod(
		&mut self,
		user: &str,
		disability_type: &str,
	) -> Result<ApiRecord<StatusMessage>> {
		self.service
			.call(&REMOVE_USER_POD)
			.arg("userIdentifier", user)
			.arg("disabilityType", disability_type)
			.fetch()
			.await
	}

	/// Raises the proof-of-disability-domain error describing the last call.
	pub fn raise_exception<T>(&self, method: &str) -> Result<T> {
		self.service.raise_exception(method, &POD_ERRORS)
	}
}
