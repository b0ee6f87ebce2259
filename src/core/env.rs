//! Purpose: Environment and client classification helpers.
//! Exports: `debug_mode`, `debug_from_env`, `is_private_host`, `is_mobile_user_agent`.
//! Role: Decide debug-mode activation and classify hosts and user agents.
//! Invariants: An explicit debug value always overrides the local-host fallback.

use std::net::IpAddr;

pub const DEBUG_ENV_VAR: &str = "CELERITE_DEBUG";

const DEBUG_ON_TOKENS: [&str; 4] = ["1", "true", "dev", "admin"];

const MOBILE_UA_MARKERS: [&str; 8] = [
    "android",
    "webos",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

/// Debug activation: an explicit on token enables, any other explicit value
/// disables, and an absent value falls back to local-host detection.
pub fn debug_mode(explicit: Option<&str>, host: &str) -> bool {
    match explicit {
        Some(value) => DEBUG_ON_TOKENS.contains(&value),
        None => is_private_host(host),
    }
}

/// `debug_mode` driven by the `CELERITE_DEBUG` environment variable.
pub fn debug_from_env(host: &str) -> bool {
    let value = std::env::var(DEBUG_ENV_VAR).ok();
    debug_mode(value.as_deref(), host)
}

/// Whether `host` names a local environment: localhost, loopback, or a
/// private (RFC 1918) address.
pub fn is_private_host(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => ip.is_loopback() || ip.is_private(),
        Ok(IpAddr::V6(ip)) => ip.is_loopback(),
        Err(_) => false,
    }
}

/// Classifies a user-agent string as mobile by its well-known markers.
pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    let ua = user_agent.to_ascii_lowercase();
    MOBILE_UA_MARKERS.iter().any(|marker| ua.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::{debug_mode, is_mobile_user_agent, is_private_host};

    #[test]
    fn explicit_on_tokens_enable() {
        for token in ["1", "true", "dev", "admin"] {
            assert!(debug_mode(Some(token), "example.com"), "token {token}");
        }
    }

    #[test]
    fn any_other_explicit_value_disables() {
        for token in ["0", "false", "yes", "on"] {
            assert!(!debug_mode(Some(token), "example.com"), "token {token}");
        }
    }

    #[test]
    fn explicit_off_overrides_local_host() {
        assert!(!debug_mode(Some("0"), "localhost"));
    }

    #[test]
    fn absent_value_falls_back_to_host() {
        assert!(debug_mode(None, "localhost"));
        assert!(!debug_mode(None, "example.com"));
    }

    #[test]
    fn private_hosts_are_recognized() {
        for host in [
            "localhost",
            "LOCALHOST",
            "127.0.0.1",
            "::1",
            "10.0.0.8",
            "192.168.1.10",
            "172.16.0.1",
            "172.31.255.1",
        ] {
            assert!(is_private_host(host), "host {host}");
        }
    }

    #[test]
    fn public_hosts_are_rejected() {
        for host in ["example.com", "8.8.8.8", "172.32.0.1", "2001:db8::1"] {
            assert!(!is_private_host(host), "host {host}");
        }
    }

    #[test]
    fn mobile_user_agents_match() {
        let iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
                      AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148";
        let android = "Mozilla/5.0 (Linux; ANDROID 14; Pixel 8) AppleWebKit/537.36";
        assert!(is_mobile_user_agent(iphone));
        assert!(is_mobile_user_agent(android));
    }

    #[test]
    fn desktop_user_agents_do_not_match() {
        let chrome = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                      AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
        assert!(!is_mobile_user_agent(chrome));
        assert!(!is_mobile_user_agent(""));
    }
}
