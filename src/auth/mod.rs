/// Authentication module
///
/// Password hashing, access token issuance/validation, Authorization header
/// parsing and the refresh token lifecycle.

mod api_key;
mod bearer;
mod claims;
mod jwt;
mod password;
mod refresh_token;

pub use api_key::{require_api_key, verify_api_key};
pub use bearer::{bearer_token, extract_bearer, extract_credential, HeaderError};
pub use claims::Claims;
pub use jwt::{AccessTokenCodec, TokenError};
pub use password::{hash_password, reject_unknown_account, verify_password};
pub use refresh_token::{
    generate_refresh_token, is_usable, issue_refresh_token, revoke, rotate, RefreshTokenError,
    RefreshTokenRecord,
};
