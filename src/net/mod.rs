//! Web and email collaborators — reachability probing and address checks
//!
//! The homepage and author stages depend on the outside world through two
//! narrow traits so the pipeline stays testable with injected fixtures.

use once_cell::sync::Lazy;
use regex::Regex;
use std::net::ToSocketAddrs;

// ─── Web reachability ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteStatus {
    Reachable,
    Unreachable(String),
}

/// Probes whether a web page actually exists.
pub trait WebProbe: Send + Sync {
    fn check_site(&self, url: &str) -> SiteStatus;
}

/// HTTP HEAD probe. Timeout policy lives in the shared client.
pub struct HttpProbe {
    client: reqwest::blocking::Client,
}

impl HttpProbe {
    pub fn new() -> Result<Self, String> {
        Ok(Self {
            client: crate::registry::build_client()?,
        })
    }
}

impl WebProbe for HttpProbe {
    fn check_site(&self, url: &str) -> SiteStatus {
        match self.client.head(url).send() {
            Ok(response) if response.status().is_success() || response.status().is_redirection() => {
                SiteStatus::Reachable
            }
            // Some hosts reject HEAD; a served error page still proves the
            // host exists, so only 4xx client errors count as missing
            Ok(response) if response.status() == reqwest::StatusCode::METHOD_NOT_ALLOWED => {
                SiteStatus::Reachable
            }
            Ok(response) => SiteStatus::Unreachable(format!("webpage error {}", response.status())),
            Err(e) => SiteStatus::Unreachable(format!("webpage does not exist ({})", e)),
        }
    }
}

/// Domains too popular to be a legitimate dedicated package homepage.
/// A package pointing here is hiding behind someone else's reputation.
const POPULAR_DOMAINS: &[&str] = &[
    "google.com",
    "facebook.com",
    "youtube.com",
    "twitter.com",
    "x.com",
    "amazon.com",
    "wikipedia.org",
    "instagram.com",
    "linkedin.com",
    "reddit.com",
    "baidu.com",
    "yahoo.com",
    "example.com",
    "localhost",
];

/// True when the URL's host is (a subdomain of) a known high-traffic domain.
pub fn domain_too_popular(url: &str) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    POPULAR_DOMAINS
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{}", d)))
}

// ─── Email validity ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailVerdict {
    Valid,
    /// Not a syntactically plausible address
    BadSyntax,
    /// Plausible address whose domain no longer resolves
    DeadDomain,
}

/// Validates an author email address.
pub trait EmailVerifier: Send + Sync {
    fn verify(&self, email: &str) -> EmailVerdict;
}

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    // Permissive on the local part, strict on a dotted domain
    Regex::new(r"^[^@\s]+@([A-Za-z0-9][A-Za-z0-9-]*\.)+[A-Za-z]{2,}$").unwrap()
});

pub fn email_syntax_ok(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Syntax check plus DNS resolution of the address domain.
pub struct DnsEmailVerifier;

impl EmailVerifier for DnsEmailVerifier {
    fn verify(&self, email: &str) -> EmailVerdict {
        if !email_syntax_ok(email) {
            return EmailVerdict::BadSyntax;
        }
        let domain = match email.rsplit_once('@') {
            Some((_, d)) => d,
            None => return EmailVerdict::BadSyntax,
        };
        // Any resolvable address is enough to call the domain alive
        match (domain, 25).to_socket_addrs() {
            Ok(mut addrs) => {
                if addrs.next().is_some() {
                    EmailVerdict::Valid
                } else {
                    EmailVerdict::DeadDomain
                }
            }
            Err(_) => EmailVerdict::DeadDomain,
        }
    }
}

// ─── Tests ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_syntax() {
        assert!(email_syntax_ok("me@kennethreitz.org"));
        assert!(email_syntax_ok("first.last+tag@sub.example.co"));
        assert!(!email_syntax_ok("not-an-email"));
        assert!(!email_syntax_ok("missing@tld"));
        assert!(!email_syntax_ok("two@@example.com"));
        assert!(!email_syntax_ok("spaces in@example.com"));
    }

    #[test]
    fn popular_domain_detection() {
        assert!(domain_too_popular("https://google.com/my-package"));
        assert!(domain_too_popular("https://sites.google.com/view/pkg"));
        assert!(domain_too_popular("http://example.com"));
        assert!(!domain_too_popular("https://requests.readthedocs.io"));
        assert!(!domain_too_popular("not a url"));
    }

    #[test]
    fn dns_verifier_verdicts() {
        let verifier = DnsEmailVerifier;
        assert_eq!(verifier.verify("not-an-email"), EmailVerdict::BadSyntax);
        // .invalid is reserved (RFC 2606) and never resolves
        assert_eq!(
            verifier.verify("user@reserved.invalid"),
            EmailVerdict::DeadDomain
        );
    }

    #[test]
    fn popular_check_matches_whole_labels_only() {
        // "notgoogle.com" must not match "google.com"
        assert!(!domain_too_popular("https://notgoogle.com"));
    }
}
