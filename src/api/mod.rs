pub mod manage_api;

pub use manage_api::{ManageApi, base_url_for_site, basic_auth_value, build_http_client};
