/// Authorization header parsing
///
/// `Authorization: <scheme> <credential>` with exactly two whitespace-separated
/// fields; the scheme is matched case-insensitively. When the header is sent
/// more than once, the last matching value wins.

use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum HeaderError {
    #[error("authorization header is missing")]
    Missing,
    #[error("authorization header is malformed")]
    Malformed,
}

/// Pull the credential for `scheme` out of a sequence of header values
pub fn extract_credential<'a, I>(values: I, scheme: &str) -> Result<String, HeaderError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen_any = false;
    let mut credential = None;

    for value in values {
        seen_any = true;
        let mut fields = value.split_whitespace();
        if let (Some(found_scheme), Some(token), None) = (fields.next(), fields.next(), fields.next())
        {
            if found_scheme.eq_ignore_ascii_case(scheme) {
                credential = Some(token.to_string());
            }
        }
    }

    match (seen_any, credential) {
        (false, _) => Err(HeaderError::Missing),
        (true, None) => Err(HeaderError::Malformed),
        (true, Some(token)) => Ok(token),
    }
}

/// Bearer token from a sequence of `Authorization` values
pub fn extract_bearer<'a, I>(values: I) -> Result<String, HeaderError>
where
    I: IntoIterator<Item = &'a str>,
{
    extract_credential(values, "bearer")
}

/// All `Authorization` values on a request; non-ASCII values never match
pub fn authorization_values(req: &HttpRequest) -> Vec<&str> {
    req.headers()
        .get_all(AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or(""))
        .collect()
}

/// Bearer token presented with the request
pub fn bearer_token(req: &HttpRequest) -> Result<String, HeaderError> {
    extract_bearer(authorization_values(req))
}
