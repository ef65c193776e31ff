//! Loopback translation for `Open` calls.
//!
//! A remote peer asking to open `http://127.0.0.1:8080/` means its own
//! loopback, not ours. When translation is requested, a loopback IP literal in
//! the URI authority is replaced by the address the call came from.

use std::borrow::Cow;
use std::net::IpAddr;
use std::sync::OnceLock;

use log::{debug, warn};
use regex::Regex;
use url::Url;

const AUTHORITY_HOST_PATTERN: &str =
    r"^[A-Za-z][A-Za-z0-9+.\-]*://(?:[^@/?#]*@)?(?P<host>\[[^\]/?#]*\]|[^:/?#]*)";
const HOST_CAPTURE: &str = "host";

static AUTHORITY_HOST_REGEX: OnceLock<Regex> = OnceLock::new();

/// Host part of the authority as written, before any normalisation.
fn get_authority_host_regex() -> &'static Regex {
    AUTHORITY_HOST_REGEX
        .get_or_init(|| Regex::new(AUTHORITY_HOST_PATTERN).expect("valid regex pattern"))
}

/// Replace a loopback IP host in `uri` with `caller`.
///
/// Domain names, non-loopback addresses and text that merely looks like an
/// address are left alone; no name resolution happens. The port, path, query
/// and fragment are preserved. A URI that does not parse is returned as is.
pub fn translate_loopback(uri: &str, caller: IpAddr) -> Cow<'_, str> {
    let mut parsed = match Url::parse(uri) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Loopback translation skipped, unable to parse URI: {e}");
            return Cow::Borrowed(uri);
        }
    };

    let Some(host) = raw_host(uri) else {
        return Cow::Borrowed(uri);
    };

    let is_loopback = strip_brackets(host)
        .parse::<IpAddr>()
        .map(|ip| ip.to_canonical().is_loopback())
        .unwrap_or(false);
    if !is_loopback {
        return Cow::Borrowed(uri);
    }

    if parsed.set_ip_host(caller.to_canonical()).is_err() {
        warn!("Loopback translation skipped, URI cannot carry a host");
        return Cow::Borrowed(uri);
    }

    debug!("Translated loopback host {host} to {caller}");
    Cow::Owned(parsed.into())
}

fn raw_host(uri: &str) -> Option<&str> {
    get_authority_host_regex()
        .captures(uri)
        .and_then(|captures| captures.name(HOST_CAPTURE))
        .map(|host| host.as_str())
        .filter(|host| !host.is_empty())
}

fn strip_brackets(host: &str) -> &str {
    host.strip_prefix('[')
        .and_then(|inner| inner.strip_suffix(']'))
        .unwrap_or(host)
}
