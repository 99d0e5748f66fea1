//! Audience derivation for per-service credentials.

// self
use crate::{_prelude::*, credentials::AuthError, service::MethodKey};

/// Scheme every audience uses, regardless of the channel's transport security.
pub const AUDIENCE_SCHEME: &str = "https";
/// Default port for [`AUDIENCE_SCHEME`]; never present in a derived audience.
pub const DEFAULT_AUDIENCE_PORT: u16 = 443;

const AUTHORITY_DELIMITERS: [char; 4] = ['/', '?', '#', '\\'];

/// Derives the audience `https://<authority>/<service>` for a call to `method`.
///
/// The audience is an identifier compared by plain string equality on the receiving side, so
/// an explicit default port is dropped: `api.example.com` and `api.example.com:443` produce the
/// same audience, while any other port is kept.
pub fn service_audience(authority: Option<&str>, method: &MethodKey) -> Result<Url, AuthError> {
	let authority = authority.ok_or(AuthError::MissingAuthority)?;

	if authority.is_empty() {
		return Err(AuthError::MalformedAuthority {
			authority: authority.to_owned(),
			reason: "authority is empty",
		});
	}
	if authority.contains(AUTHORITY_DELIMITERS) {
		return Err(AuthError::MalformedAuthority {
			authority: authority.to_owned(),
			reason: "authority contains a URI delimiter",
		});
	}

	// `Url` drops the scheme's default port while parsing.
	let mut audience = Url::parse(&format!("{AUDIENCE_SCHEME}://{authority}/"))
		.map_err(|source| AuthError::InvalidAudience { authority: authority.to_owned(), source })?;

	debug_assert_ne!(audience.port(), Some(DEFAULT_AUDIENCE_PORT));

	audience.set_path(&format!("/{}", method.service_name()));

	Ok(audience)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::unary;

	fn audience(authority: &str) -> Result<String, AuthError> {
		service_audience(Some(authority), &unary("pkg.Service/Method")).map(String::from)
	}

	#[test]
	fn audience_omits_default_port() {
		assert_eq!(
			audience("api.example.com").ok().as_deref(),
			Some("https://api.example.com/pkg.Service")
		);
		assert_eq!(audience("api.example.com:443").ok(), audience("api.example.com").ok());
	}

	#[test]
	fn audience_keeps_non_default_ports() {
		assert_eq!(
			audience("api.example.com:8443").ok().as_deref(),
			Some("https://api.example.com:8443/pkg.Service")
		);
	}

	#[test]
	fn missing_or_malformed_authorities_are_rejected() {
		assert!(matches!(
			service_audience(None, &unary("pkg.Service/Method")),
			Err(AuthError::MissingAuthority)
		));
		assert!(matches!(audience(""), Err(AuthError::MalformedAuthority { .. })));
		assert!(matches!(
			audience("api.example.com/evil"),
			Err(AuthError::MalformedAuthority { .. })
		));
		assert!(matches!(
			audience("api.example.com:notaport"),
			Err(AuthError::InvalidAudience { .. })
		));
		assert!(matches!(audience("bad host"), Err(AuthError::InvalidAudience { .. })));
	}
}
