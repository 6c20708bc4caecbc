//! Request and response records for the provisioning API.
//!
//! Wire encoding is camelCase JSON throughout. The postal address is a
//! nested object; the legacy flat `postalAddress.<field>` key form used by
//! one deployment variant is deliberately not supported.

use serde::{Deserialize, Serialize};

use crate::catalog::{PlanName, RenewalType, Sku};

/// Postal address attached to a customer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    pub contact_name: String,
    pub organization_name: String,
    pub locality: String,
    pub region: String,
    pub country_code: String,
    pub postal_code: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
}

/// Customer registry record. Created once in step 1, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    #[serde(rename = "customerDomain")]
    pub domain: String,
    pub alternate_email: String,
    pub phone_number: String,
    pub postal_address: PostalAddress,
}

/// Caller-facing subscription order.
///
/// The client expands this into the nested wire shape the billing service
/// expects (`plan.planName`, `seats.numberOfSeats`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRequest {
    pub domain: String,
    /// Explicit subscription id, or `None` to let the service assign one.
    pub subscription_id: Option<String>,
    pub sku: Sku,
    pub plan: PlanName,
    pub renewal: Option<RenewalType>,
    pub seats: u32,
    pub purchase_order_id: String,
}

/// Subscription as the billing service returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub customer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    pub sku_id: String,
    pub plan: Plan,
    pub seats: Seats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renewal_settings: Option<RenewalSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_order_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub plan_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seats {
    pub number_of_seats: u32,
    pub maximum_number_of_seats: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewalSettings {
    pub renewal_type: String,
}

impl SubscriptionRequest {
    /// Expand into the nested wire shape.
    pub(crate) fn to_wire(&self) -> Subscription {
        Subscription {
            customer_id: self.domain.clone(),
            subscription_id: self.subscription_id.clone(),
            sku_id: self.sku.as_str().to_string(),
            plan: Plan {
                plan_name: self.plan.as_str().to_string(),
            },
            seats: Seats {
                number_of_seats: self.seats,
                maximum_number_of_seats: self.seats,
            },
            renewal_settings: self.renewal.map(|r| RenewalSettings {
                renewal_type: r.as_str().to_string(),
            }),
            purchase_order_id: Some(self.purchase_order_id.clone()),
        }
    }
}

/// How ownership of a site or domain is proven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationMethod {
    /// Upload a file with a specific name to the website.
    File,
    /// Place a tag in the meta section of the website.
    Meta,
    /// Validate using an existing analytics property on the domain.
    Analytics,
    /// Validate through a tag-manager container.
    TagManager,
    /// DNS TXT record.
    DnsTxt,
    /// DNS CNAME record.
    DnsCname,
}

impl VerificationMethod {
    /// Wire name, also used as a query parameter by the confirm call.
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationMethod::File => "FILE",
            VerificationMethod::Meta => "META",
            VerificationMethod::Analytics => "ANALYTICS",
            VerificationMethod::TagManager => "TAG_MANAGER",
            VerificationMethod::DnsTxt => "DNS_TXT",
            VerificationMethod::DnsCname => "DNS_CNAME",
        }
    }
}

/// What kind of resource a verification method proves control of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationType {
    Site,
    InetDomain,
}

impl VerificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationType::Site => "SITE",
            VerificationType::InetDomain => "INET_DOMAIN",
        }
    }
}

/// Challenge issued by the verification authority, cached across steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationChallenge {
    pub verification_type: VerificationType,
    pub verification_method: VerificationMethod,
    pub verification_identifier: String,
    pub verification_token: String,
}

/// Administrator account created in step 5. The password is generated at
/// creation time and is not retrievable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAccount {
    pub domain: String,
    pub username: String,
    pub password: String,
}

/// License binding between a user and a product SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseAssignment {
    pub product_id: String,
    pub sku_id: String,
    pub user_id: String,
}

// Directory service payloads, built by the client.

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DirectoryUser {
    pub primary_email: String,
    pub name: DirectoryUserName,
    pub suspended: bool,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DirectoryUserName {
    pub given_name: String,
    pub family_name: String,
    pub full_name: String,
}
