//! Endpoint modules, one per API domain.
//!
//! Each module declares its operations as static [`EndpointSpec`]s, collects them in an
//! `ENDPOINTS` table, owns the error tables raised on its behalf, and exposes a facade bound to
//! an [`ApiService`](crate::service::ApiService):
//!
//! ```no_run
//! # async fn demo(service: &mut bookshare_api::ApiService) -> bookshare_api::Result<()> {
//! use bookshare_api::endpoint::ApiParams;
//!
//! let record = service.title().get_title("abc123", ApiParams::new()).await?;
//!
//! match record.into_result() {
//! 	Ok(title) => println!("{}", title.title),
//! 	Err(failure) => eprintln!("{failure}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod agreement;
pub mod organization;
pub mod periodical;
pub mod proof_of_disability;
pub mod reading_list;
pub mod subscription;
pub mod title;

// self
use crate::endpoint::EndpointSpec;

/// Every domain's endpoint table.
pub fn endpoint_tables() -> [&'static [&'static EndpointSpec]; 8] {
	[
		account::ENDPOINTS,
		agreement::ENDPOINTS,
		organization::ENDPOINTS,
		periodical::ENDPOINTS,
		proof_of_disability::ENDPOINTS,
		reading_list::ENDPOINTS,
		subscription::ENDPOINTS,
		title::ENDPOINTS,
	]
}
