//! Input validation for user-supplied configuration values
//!
//! Everything that ends up in a generated file or a command argument list
//! passes through here first.

use std::net::Ipv4Addr;
use std::path::Path;

use crate::error::{Result, StagehandError};

const MAX_HOSTNAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Characters a shell would give meaning to
const SHELL_META: &[char] = &[
    ';', '|', '&', '$', '`', '<', '>', '(', ')', '\'', '"', '\\', '*', '?', '!', '{', '}', '[',
    ']', '#', '~', '%', '^', ',',
];

/// Whether `value` is a literal IPv4 address
///
/// IPv6 literals are not accepted: they would need brackets in every
/// generated URL and in the proxy's server name.
pub fn is_ip_address(value: &str) -> bool {
    value.parse::<Ipv4Addr>().is_ok()
}

/// Validate a domain name or literal IP address
///
/// Returns whether the value is an IP address.
pub fn validate_domain(value: &str) -> Result<bool> {
    if is_ip_address(value) {
        return Ok(true);
    }
    if is_hostname(value) {
        return Ok(false);
    }
    Err(StagehandError::InvalidDomain {
        value: value.to_string(),
    })
}

fn is_hostname(value: &str) -> bool {
    if value.is_empty() || value.len() > MAX_HOSTNAME_LEN {
        return false;
    }

    let labels: Vec<&str> = value.split('.').collect();
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });

    // An all-numeric final label is a mistyped address, not a name
    let tld_ok = labels
        .last()
        .is_some_and(|tld| !tld.chars().all(|c| c.is_ascii_digit()));

    labels_ok && tld_ok
}

/// Validate an email address used for certificate registration
pub fn validate_email(value: &str) -> Result<()> {
    let invalid = || StagehandError::InvalidEmail {
        value: value.to_string(),
    };

    if value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || SHELL_META.contains(&c))
    {
        return Err(invalid());
    }

    let mut parts = value.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}

/// Validate the installation directory
pub fn validate_install_dir(path: &Path) -> Result<()> {
    let invalid = |reason: &str| StagehandError::InvalidInstallDir {
        path: path.display().to_string(),
        reason: reason.to_string(),
    };

    if !path.is_absolute() {
        return Err(invalid("must be an absolute path"));
    }
    if path.parent().is_none() {
        return Err(invalid("refusing to install into the filesystem root"));
    }
    if path.to_string_lossy().chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_hostnames() {
        for domain in ["poll.example.com", "localhost", "a-b.c0.io", "xn--bcher-kva.example"] {
            assert!(!validate_domain(domain).unwrap(), "{domain}");
        }
    }

    #[test]
    fn test_accepts_ip_addresses() {
        assert!(validate_domain("10.0.0.5").unwrap());
        assert!(validate_domain("192.0.2.254").unwrap());
    }

    #[test]
    fn test_rejects_ipv6_literals() {
        for domain in ["2001:db8::1", "::1", "[2001:db8::1]", "fe80::1%eth0"] {
            assert!(!is_ip_address(domain), "{domain}");
            assert!(
                matches!(
                    validate_domain(domain),
                    Err(StagehandError::InvalidDomain { .. })
                ),
                "{domain:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_bad_domains() {
        let long_label = "a".repeat(64);
        let too_long = vec!["abc"; 70].join(".");
        for domain in [
            "",
            "-leading.example.com",
            "trailing-.example.com",
            "double..dot",
            "under_score.com",
            "semi;colon.com",
            "example.com.",
            "999.1.1.1",
            long_label.as_str(),
            too_long.as_str(),
        ] {
            assert!(
                matches!(
                    validate_domain(domain),
                    Err(StagehandError::InvalidDomain { .. })
                ),
                "{domain:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("admin@example.com").is_ok());
        assert!(validate_email("ops+tls@poll.example.org").is_ok());

        for email in [
            "",
            "admin",
            "@example.com",
            "admin@",
            "a@b@c",
            "ad min@example.com",
            "admin@example.com;rm",
            "$(id)@example.com",
        ] {
            assert!(validate_email(email).is_err(), "{email:?} should be rejected");
        }
    }

    #[test]
    fn test_install_dir_rules() {
        assert!(validate_install_dir(Path::new("/opt/secret-poll")).is_ok());
        assert!(validate_install_dir(Path::new("opt/secret-poll")).is_err());
        assert!(validate_install_dir(Path::new("/")).is_err());
        assert!(validate_install_dir(Path::new("/opt/secret poll")).is_err());
    }
}
