//! Verification method catalog and identifier derivation.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::api::types::{VerificationMethod, VerificationType};

/// Catalog entry for one way of proving ownership.
#[derive(Debug, Clone, Copy)]
pub struct MethodInfo {
    pub method: VerificationMethod,
    pub verification_type: VerificationType,
    /// Prepended to the domain to form the verification identifier.
    pub prefix: &'static str,
    pub label: &'static str,
}

/// Every supported method, in the order a chooser should offer them.
/// The first entry is the default.
pub static METHODS: [MethodInfo; 6] = [
    MethodInfo {
        method: VerificationMethod::File,
        verification_type: VerificationType::Site,
        prefix: "http://",
        label: "FILE - Upload a file with a specific name to the website.",
    },
    MethodInfo {
        method: VerificationMethod::Meta,
        verification_type: VerificationType::Site,
        prefix: "http://",
        label: "META - Place a tag in the meta section of the website.",
    },
    MethodInfo {
        method: VerificationMethod::Analytics,
        verification_type: VerificationType::Site,
        prefix: "http://",
        label: "ANALYTICS - Validate using an existing Google Analytics domain.",
    },
    MethodInfo {
        method: VerificationMethod::TagManager,
        verification_type: VerificationType::Site,
        prefix: "http://",
        label: "TAG_MANAGER - Validate through a Tag Manager container.",
    },
    MethodInfo {
        method: VerificationMethod::DnsTxt,
        verification_type: VerificationType::InetDomain,
        prefix: "",
        label: "DNS_TXT - Using a DNS Text Record",
    },
    MethodInfo {
        method: VerificationMethod::DnsCname,
        verification_type: VerificationType::InetDomain,
        prefix: "",
        label: "DNS_CNAME - Using a DNS CNAME Record",
    },
];

static BY_METHOD: Lazy<HashMap<VerificationMethod, &'static MethodInfo>> =
    Lazy::new(|| METHODS.iter().map(|info| (info.method, info)).collect());

/// Catalog entry for a method.
pub fn info(method: VerificationMethod) -> &'static MethodInfo {
    BY_METHOD[&method]
}

/// Identifier shown to the user and sent to the verification authority.
///
/// SITE-typed methods verify a web resource, so the identifier is the
/// domain as a URL; INET_DOMAIN-typed methods verify the bare domain.
/// Callers re-invoke this on every method or domain change; there is no
/// hidden reactivity.
pub fn derive_identifier(method: VerificationMethod, domain: &str) -> String {
    format!("{}{}", info(method).prefix, domain)
}

/// Outcome of one user-triggered confirmation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Working,
    Ok,
    Failed,
}
