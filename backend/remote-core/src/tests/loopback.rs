use crate::service::loopback::translate_loopback;

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

const CALLER_V4: IpAddr = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 5));

/// **VALUE**: Verifies a loopback host is replaced by the caller's address.
///
/// **WHY THIS MATTERS**: A remote peer asking to open its own local web
/// server would otherwise open ours.
///
/// **BUG THIS CATCHES**: Dropped ports, paths or queries during the rewrite.
#[test]
fn given_ipv4_loopback_uri_when_translated_then_host_is_caller() {
    // GIVEN: A loopback URI with port, path and query
    let uri = "http://127.0.0.1:8080/index.html?q=1#top";

    // WHEN: Translating for a remote caller
    let translated = translate_loopback(uri, CALLER_V4);

    // THEN: Only the host changes
    assert_eq!(translated, "http://203.0.113.5:8080/index.html?q=1#top");
}

#[test]
fn given_ipv6_loopback_uri_when_translated_then_brackets_are_dropped_for_ipv4_caller() {
    let caller = IpAddr::V4(Ipv4Addr::new(198, 51, 100, 9));

    let translated = translate_loopback("http://[::1]:3000/app", caller);

    assert_eq!(translated, "http://198.51.100.9:3000/app");
}

#[test]
fn given_ipv4_loopback_uri_when_caller_is_ipv6_then_brackets_are_added() {
    let caller = IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 7));

    let translated = translate_loopback("http://127.0.0.1:8080/x", caller);

    assert_eq!(translated, "http://[2001:db8::7]:8080/x");
}

#[test]
fn given_whole_loopback_range_when_translated_then_any_127_address_is_replaced() {
    let translated = translate_loopback("http://127.5.6.7/", CALLER_V4);

    assert_eq!(translated, "http://203.0.113.5/");
}

/// **VALUE**: Verifies that names and non-loopback hosts are never touched.
///
/// **WHY THIS MATTERS**: Translation must not resolve names or rewrite
/// addresses the caller chose on purpose.
///
/// **BUG THIS CATCHES**: Treating `localhost` or digits-and-dots text as an
/// address.
#[test]
fn given_non_loopback_hosts_when_translated_then_uri_is_unchanged() {
    let unchanged = [
        "http://example.com/path",
        "http://localhost:8080/",
        "http://10.0.0.1:8080/",
        "http://127.1/",
        "https://[2001:db8::1]/",
        "mailto:someone@example.com",
        "file:///tmp/index.html",
    ];

    for uri in unchanged {
        assert_eq!(translate_loopback(uri, CALLER_V4), uri, "{uri}");
    }
}

#[test]
fn given_unparseable_uri_when_translated_then_passed_through() {
    let uri = "not a uri at all";

    assert_eq!(translate_loopback(uri, CALLER_V4), uri);
}

#[test]
fn given_ipv4_mapped_caller_when_translated_then_plain_ipv4_is_used() {
    let caller = IpAddr::V6(Ipv4Addr::new(192, 0, 2, 1).to_ipv6_mapped());

    let translated = translate_loopback("http://[::1]/", caller);

    assert_eq!(translated, "http://192.0.2.1/");
}

/// **VALUE**: Verifies an IPv4-mapped IPv6 loopback host counts as loopback.
///
/// **WHY THIS MATTERS**: `[::ffff:127.0.0.1]` reaches the local machine just
/// like `127.0.0.1` does, so leaving it untranslated opens our own loopback.
///
/// **BUG THIS CATCHES**: Checking only `::1` for IPv6 hosts.
#[test]
fn given_ipv4_mapped_loopback_host_when_translated_then_host_is_caller() {
    // GIVEN: Mapped loopback hosts in and out of 127.0.0.1
    let uris = [
        "http://[::ffff:127.0.0.1]:8080/x",
        "http://[::ffff:127.9.9.9]:8080/x",
    ];

    for uri in uris {
        // WHEN: Translating for a remote caller
        let translated = translate_loopback(uri, CALLER_V4);

        // THEN: The caller replaces the mapped host
        assert_eq!(translated, "http://203.0.113.5:8080/x", "{uri}");
    }
}

#[test]
fn given_ipv4_mapped_public_host_when_translated_then_uri_is_unchanged() {
    let uri = "http://[::ffff:10.0.0.1]:8080/x";

    assert_eq!(translate_loopback(uri, CALLER_V4), uri);
}
