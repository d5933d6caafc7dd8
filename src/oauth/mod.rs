mod oauth_client;

pub use oauth_client::{obtain_access_token, token_url, AccessToken, Credentials, TOKEN_PATH};
