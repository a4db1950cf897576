//! Provisioning URI generation for TOTP credentials, compatible with
//! Google Authenticator and other OATH authenticator applications.
//!
//! The `otpauth://` URI carries the secret; convey it over a secure
//! channel, typically rendered as a QR code on the enrolment page.

use crate::{
  credentials::Credentials,
  error::{KeystepError, KeystepResult},
};

/// URL template wrapping a provisioning URI in a Google Chart QR-image
/// call. `{uri}` is replaced by the form-urlencoded otpauth URI.
///
/// The chart endpoint has been deprecated by Google since 2019; it is kept
/// for compatibility with existing deployments. Use
/// [`qr_code_url_with_template`] to point at a different QR service.
pub const DEFAULT_QR_TEMPLATE: &str =
  "https://chart.googleapis.com/chart?chs=200x200&chld=M%7C0&cht=qr&chl={uri}";

/// Percent-encode a URI path segment (RFC 3986 `pchar` without `:`).
///
/// Spaces become `%20`; sub-delimiters such as `&` and the `@` of an email
/// address stay literal, matching what authenticator apps expect in the
/// label.
fn encode_path_segment(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for &b in s.as_bytes() {
    let literal = b.is_ascii_alphanumeric()
      || matches!(
        b,
        b'-'
          | b'.'
          | b'_'
          | b'~'
          | b'!'
          | b'$'
          | b'&'
          | b'\''
          | b'('
          | b')'
          | b'*'
          | b'+'
          | b','
          | b';'
          | b'='
          | b'@'
      );
    if literal {
      out.push(b as char);
    } else {
      out.push_str(&format!("%{b:02X}"));
    }
  }

  out
}

/// Encode a query value as `application/x-www-form-urlencoded` does:
/// spaces become `+`, everything outside `[A-Za-z0-9*\-._]` becomes `%XX`.
fn encode_query_value(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for &b in s.as_bytes() {
    if b.is_ascii_alphanumeric() || matches!(b, b'*' | b'-' | b'.' | b'_') {
      out.push(b as char);
    } else if b == b' ' {
      out.push('+');
    } else {
      out.push_str(&format!("%{b:02X}"));
    }
  }

  out
}

/// Format the URI label: `accountname` or `issuer ":" accountname`, each
/// part encoded as a path segment with the separating colon left literal.
///
/// # Errors
///
/// [`KeystepError::EmptyAccountName`] for a blank account name,
/// [`KeystepError::ColonInIssuer`] / [`KeystepError::ColonInAccountName`]
/// when either part contains the reserved `:`.
fn format_label(issuer: Option<&str>, account_name: &str) -> KeystepResult<String> {
  if account_name.trim().is_empty() {
    return Err(KeystepError::EmptyAccountName);
  }
  if account_name.contains(':') {
    return Err(KeystepError::ColonInAccountName);
  }

  let mut label = String::new();
  if let Some(issuer) = issuer {
    if issuer.contains(':') {
      return Err(KeystepError::ColonInIssuer);
    }
    label.push_str(&encode_path_segment(issuer));
    label.push(':');
  }
  label.push_str(&encode_path_segment(account_name));

  Ok(label)
}

/// Build the `otpauth://totp/...` provisioning URI for a credential.
///
/// Query parameters are emitted in the fixed order `secret`, `issuer` (when
/// present), `algorithm`, `digits`, `period`; identical inputs always yield
/// the identical URI string.
///
/// # Errors
///
/// Fails when the label is invalid, see [`format_label`] above.
pub fn totp_uri(
  issuer: Option<&str>,
  account_name: &str,
  credentials: &Credentials,
) -> KeystepResult<String> {
  let label = format_label(issuer, account_name)?;
  let config = credentials.config();

  let mut uri = format!("otpauth://totp/{label}?secret={}", encode_query_value(credentials.key()));
  if let Some(issuer) = issuer {
    uri.push_str("&issuer=");
    uri.push_str(&encode_query_value(issuer));
  }
  uri.push_str("&algorithm=");
  uri.push_str(&config.hmac_hash().to_string().to_ascii_uppercase());
  uri.push_str(&format!("&digits={}", config.code_digits()));
  uri.push_str(&format!("&period={}", config.time_step_ms() / 1000));

  Ok(uri)
}

/// Build the QR-image URL for a credential using the default chart
/// template.
///
/// # Errors
///
/// Fails when the label is invalid, see [`totp_uri`].
pub fn qr_code_url(
  issuer: Option<&str>,
  account_name: &str,
  credentials: &Credentials,
) -> KeystepResult<String> {
  let uri = totp_uri(issuer, account_name, credentials)?;
  Ok(qr_code_url_with_template(DEFAULT_QR_TEMPLATE, &uri))
}

/// Wrap an already-built otpauth URI with a custom QR template.
///
/// The whole URI is form-urlencoded once more and substituted for the
/// template's `{uri}` placeholder.
pub fn qr_code_url_with_template(template: &str, otpauth_uri: &str) -> String {
  template.replace("{uri}", &encode_query_value(otpauth_uri))
}
