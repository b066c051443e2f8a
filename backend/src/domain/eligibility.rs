//! Eligibility rules deciding whether a user is forwarded to the CRM.
//!
//! The filter is built once from static configuration and evaluated without
//! I/O. Absent settings disable the corresponding check.

use std::collections::BTreeSet;

use regex::Regex;

use super::User;

/// Raw eligibility settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EligibilityConfig {
    /// Global switch; nothing is tracked while `false`.
    pub enabled: bool,
    /// Pattern matched case-insensitively against the start of the email
    /// domain.
    pub ignore_domains_regex: Option<String>,
    /// Exact email domains that are never tracked.
    pub ignore_domains: Vec<String>,
}

/// Raised when the deny pattern does not compile.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid ignore-domains pattern `{pattern}`: {message}")]
pub struct EligibilityConfigError {
    /// Pattern as configured.
    pub pattern: String,
    /// Compiler diagnostic.
    pub message: String,
}

/// Compiled eligibility rules.
///
/// # Examples
/// ```
/// use lead_sync::domain::{EligibilityConfig, EligibilityFilter};
///
/// let filter = EligibilityFilter::new(EligibilityConfig {
///     enabled: true,
///     ignore_domains_regex: Some(r"(.*\.)?internal\.example".to_owned()),
///     ignore_domains: vec!["mailinator.com".to_owned()],
/// })?;
/// assert!(filter.allows_domain("acme.io"));
/// assert!(!filter.allows_domain("ops.internal.example"));
/// assert!(!filter.allows_domain("mailinator.com"));
/// # Ok::<(), lead_sync::domain::EligibilityConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    enabled: bool,
    ignore_pattern: Option<Regex>,
    ignore_domains: BTreeSet<String>,
}

impl EligibilityFilter {
    /// Compile the configured rules.
    pub fn new(config: EligibilityConfig) -> Result<Self, EligibilityConfigError> {
        let ignore_pattern = config
            .ignore_domains_regex
            .filter(|pattern| !pattern.trim().is_empty())
            .map(|pattern| {
                // Anchored at the start; domains are lower-cased, so match
                // case-insensitively.
                Regex::new(&format!("^(?i:{pattern})")).map_err(|error| EligibilityConfigError {
                    message: error.to_string(),
                    pattern,
                })
            })
            .transpose()?;

        Ok(Self {
            enabled: config.enabled,
            ignore_pattern,
            ignore_domains: normalise_domains(config.ignore_domains),
        })
    }

    /// Filter that rejects every user.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ignore_pattern: None,
            ignore_domains: BTreeSet::new(),
        }
    }

    /// Return whether activity of `user` should be sent to the CRM.
    pub fn should_track(&self, user: &User) -> bool {
        self.allows_domain(user.email_domain())
    }

    /// Apply the rules to a bare email domain.
    pub fn allows_domain(&self, domain: &str) -> bool {
        if !self.enabled {
            return false;
        }

        if self
            .ignore_pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(domain))
        {
            return false;
        }

        !self.ignore_domains.contains(&domain.to_ascii_lowercase())
    }
}

/// Lower-case and de-duplicate configured domains, dropping blanks.
pub(crate) fn normalise_domains(domains: Vec<String>) -> BTreeSet<String> {
    domains
        .into_iter()
        .map(|domain| domain.trim().to_ascii_lowercase())
        .filter(|domain| !domain.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    //! Coverage for eligibility decisions.

    use super::*;
    use crate::domain::{EmailAddress, UserId};
    use rstest::{fixture, rstest};

    #[fixture]
    fn filter() -> EligibilityFilter {
        EligibilityFilter::new(EligibilityConfig {
            enabled: true,
            ignore_domains_regex: Some(r"(.*\.)?example\.org".to_owned()),
            ignore_domains: vec!["Mailinator.com".to_owned(), " ".to_owned()],
        })
        .expect("valid config")
    }

    fn user(email: &str) -> User {
        User::new(
            UserId::new(1),
            EmailAddress::new(email).expect("valid email"),
            "Test",
            "User",
        )
    }

    #[rstest]
    #[case("ada@acme.io", true)]
    #[case("ada@example.org", false)]
    #[case("ada@eu.example.org", false)]
    #[case("ada@notexample.org.uk", true)]
    #[case("ada@mailinator.com", false)]
    #[case("ada@MAILINATOR.com", false)]
    fn applies_deny_rules(filter: EligibilityFilter, #[case] email: &str, #[case] expected: bool) {
        assert_eq!(filter.should_track(&user(email)), expected, "email: {email}");
    }

    #[rstest]
    #[case("ada@Staging.Example.NET", false)]
    #[case("ada@staging.example.net", false)]
    #[case("ada@example.net", true)]
    fn upper_case_pattern_matches_lower_cased_domains(
        #[case] email: &str,
        #[case] expected: bool,
    ) {
        let filter = EligibilityFilter::new(EligibilityConfig {
            enabled: true,
            ignore_domains_regex: Some(r"Staging\.EXAMPLE\.net".to_owned()),
            ignore_domains: Vec::new(),
        })
        .expect("valid config");

        assert_eq!(filter.should_track(&user(email)), expected, "email: {email}");
    }

    #[rstest]
    fn disabled_flag_short_circuits() {
        let filter = EligibilityFilter::new(EligibilityConfig {
            enabled: false,
            ..EligibilityConfig::default()
        })
        .expect("valid config");
        assert!(!filter.should_track(&user("ada@acme.io")));
        assert!(!EligibilityFilter::disabled().allows_domain("acme.io"));
    }

    #[rstest]
    fn absent_rules_allow_everything_when_enabled() {
        let filter = EligibilityFilter::new(EligibilityConfig {
            enabled: true,
            ignore_domains_regex: Some(String::new()),
            ignore_domains: Vec::new(),
        })
        .expect("valid config");
        assert!(filter.should_track(&user("ada@anything.dev")));
    }

    #[rstest]
    fn invalid_pattern_is_reported_at_construction() {
        let error = EligibilityFilter::new(EligibilityConfig {
            enabled: true,
            ignore_domains_regex: Some("(unclosed".to_owned()),
            ignore_domains: Vec::new(),
        })
        .expect_err("pattern must fail");
        assert_eq!(error.pattern, "(unclosed");
    }
}
