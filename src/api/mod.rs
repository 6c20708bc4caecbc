//! Typed façade over the external provisioning API.
//!
//! One method per remote operation. Every call is routed through the
//! request interceptor so the loading channel reflects in-flight state
//! regardless of which wizard step issued the call. The client performs no
//! retries and holds no workflow state of its own.

pub mod error;
pub mod transport;
pub mod types;

pub use error::ProvisionError;
pub use transport::{HttpMethod, HttpTransport, Transport};
pub use types::{
    AdminAccount, CustomerRecord, LicenseAssignment, PostalAddress, Subscription,
    SubscriptionRequest, VerificationChallenge, VerificationMethod, VerificationType,
};

use std::sync::Arc;

use serde_json::{json, Value};

use crate::bus::NotificationBus;
use crate::catalog::{Product, Sku};
use crate::interceptor::RequestInterceptor;
use types::{DirectoryUser, DirectoryUserName};

const RESELLER_BASE: &str = "apps/reseller/v1";
const SITE_VERIFICATION_BASE: &str = "siteVerification/v1";
const DIRECTORY_BASE: &str = "admin/directory/v1";
const LICENSING_BASE: &str = "apps/licensing/v1";

const PASSWORD_LEN: usize = 16;
// No look-alike characters; the password is read off a screen exactly once.
const PASSWORD_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnpqrstuvwxyz23456789!@#$%&*";

/// Generate the one-time password for a new administrator account.
fn generate_password() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    (0..PASSWORD_LEN)
        .map(|_| {
            let idx = rng.random_range(0..PASSWORD_CHARSET.len());
            PASSWORD_CHARSET[idx] as char
        })
        .collect()
}

/// Client for the customer registry, subscription billing, verification
/// authority, directory, and license registry behind one `Transport`.
pub struct ProvisioningClient {
    transport: Arc<dyn Transport>,
    interceptor: RequestInterceptor,
}

impl ProvisioningClient {
    pub fn new(transport: Arc<dyn Transport>, bus: NotificationBus) -> Self {
        Self {
            transport,
            interceptor: RequestInterceptor::new(bus),
        }
    }

    /// Look up an existing customer by domain.
    pub async fn get_customer(&self, domain: &str) -> Result<CustomerRecord, ProvisionError> {
        let path = format!("{RESELLER_BASE}/customers/{domain}");
        self.interceptor
            .run(async {
                let value = self.transport.send(HttpMethod::Get, &path, None).await?;
                decode(value)
            })
            .await
    }

    /// Create a customer record. The registry keys customers by domain;
    /// inserting a domain that already exists yields a conflict.
    pub async fn create_customer(
        &self,
        record: &CustomerRecord,
    ) -> Result<CustomerRecord, ProvisionError> {
        let path = format!("{RESELLER_BASE}/customers");
        let body = serde_json::to_value(record)
            .map_err(|e| ProvisionError::transport(e.to_string()))?;
        self.interceptor
            .run(async {
                let value = self
                    .transport
                    .send(HttpMethod::Post, &path, Some(body))
                    .await?;
                decode(value)
            })
            .await
    }

    /// Attach a subscription to a customer.
    pub async fn create_subscription(
        &self,
        request: &SubscriptionRequest,
    ) -> Result<Subscription, ProvisionError> {
        let path = format!("{RESELLER_BASE}/customers/{}/subscriptions", request.domain);
        let body = serde_json::to_value(request.to_wire())
            .map_err(|e| ProvisionError::transport(e.to_string()))?;
        self.interceptor
            .run(async {
                let value = self
                    .transport
                    .send(HttpMethod::Post, &path, Some(body))
                    .await?;
                decode(value)
            })
            .await
    }

    /// Ask the verification authority for a challenge token.
    pub async fn request_verification_challenge(
        &self,
        verification_type: VerificationType,
        method: VerificationMethod,
        identifier: &str,
    ) -> Result<VerificationChallenge, ProvisionError> {
        let path = format!("{SITE_VERIFICATION_BASE}/webResource/token");
        let body = json!({
            "site": {
                "type": verification_type.as_str(),
                "identifier": identifier,
            },
            "verificationMethod": method.as_str(),
        });
        self.interceptor
            .run(async {
                let value = self
                    .transport
                    .send(HttpMethod::Post, &path, Some(body))
                    .await?;
                let token = value
                    .get("token")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        ProvisionError::transport("challenge response carried no token")
                    })?
                    .to_string();
                Ok(VerificationChallenge {
                    verification_type,
                    verification_method: method,
                    verification_identifier: identifier.to_string(),
                    verification_token: token,
                })
            })
            .await
    }

    /// Ask the verification authority to test a previously issued
    /// challenge (e.g. whether the DNS record or file is now in place).
    pub async fn confirm_verification(
        &self,
        challenge: &VerificationChallenge,
    ) -> Result<(), ProvisionError> {
        let path = format!(
            "{SITE_VERIFICATION_BASE}/webResource?verificationMethod={}",
            challenge.verification_method.as_str()
        );
        let body = json!({
            "site": {
                "type": challenge.verification_type.as_str(),
                "identifier": challenge.verification_identifier,
            },
            "verificationMethod": challenge.verification_method.as_str(),
        });
        self.interceptor
            .run(async {
                self.transport
                    .send(HttpMethod::Post, &path, Some(body))
                    .await?;
                Ok(())
            })
            .await
    }

    /// Create `admin@{domain}` with a generated one-time password and
    /// promote it to super-admin. One client operation, one loading pulse.
    pub async fn create_admin_user(&self, domain: &str) -> Result<AdminAccount, ProvisionError> {
        let username = format!("admin@{domain}");
        let password = generate_password();
        let user = DirectoryUser {
            primary_email: username.clone(),
            name: DirectoryUserName {
                given_name: "Admin".to_string(),
                family_name: "Admin".to_string(),
                full_name: "Admin Admin".to_string(),
            },
            suspended: false,
            password: password.clone(),
        };
        let insert_body = serde_json::to_value(&user)
            .map_err(|e| ProvisionError::transport(e.to_string()))?;
        let insert_path = format!("{DIRECTORY_BASE}/users");
        let admin_path = format!("{DIRECTORY_BASE}/users/{username}/makeAdmin");

        self.interceptor
            .run(async {
                self.transport
                    .send(HttpMethod::Post, &insert_path, Some(insert_body))
                    .await?;
                self.transport
                    .send(HttpMethod::Post, &admin_path, Some(json!({ "status": true })))
                    .await?;
                Ok(AdminAccount {
                    domain: domain.to_string(),
                    username,
                    password,
                })
            })
            .await
    }

    /// Bind a product license to a user.
    pub async fn assign_license(
        &self,
        product: Product,
        sku: Sku,
        user_id: &str,
    ) -> Result<LicenseAssignment, ProvisionError> {
        let path = format!(
            "{LICENSING_BASE}/product/{}/sku/{}/user",
            product.as_str(),
            sku.as_str()
        );
        let body = json!({ "userId": user_id });
        self.interceptor
            .run(async {
                self.transport
                    .send(HttpMethod::Post, &path, Some(body))
                    .await?;
                Ok(LicenseAssignment {
                    product_id: product.as_str().to_string(),
                    sku_id: sku.as_str().to_string(),
                    user_id: user_id.to_string(),
                })
            })
            .await
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, ProvisionError> {
    serde_json::from_value(value).map_err(|e| ProvisionError::transport(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::LoadingState;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted transport: pops one canned response per call and records
    /// everything it was asked to send.
    struct StubTransport {
        responses: Mutex<VecDeque<Result<Value, ProvisionError>>>,
        calls: Mutex<Vec<(HttpMethod, String, Option<Value>)>>,
    }

    impl StubTransport {
        fn with_responses(responses: Vec<Result<Value, ProvisionError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(HttpMethod, String, Option<Value>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn send(
            &self,
            method: HttpMethod,
            path: &str,
            body: Option<Value>,
        ) -> Result<Value, ProvisionError> {
            self.calls
                .lock()
                .unwrap()
                .push((method, path.to_string(), body));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProvisionError::transport("no scripted response")))
        }
    }

    fn client_over(transport: Arc<StubTransport>) -> (ProvisioningClient, NotificationBus) {
        let bus = NotificationBus::new();
        (ProvisioningClient::new(transport, bus.clone()), bus)
    }

    fn customer_json(domain: &str) -> Value {
        json!({
            "customerDomain": domain,
            "alternateEmail": "owner@elsewhere.example",
            "phoneNumber": "212.555.0000",
            "postalAddress": {
                "contactName": "A Contact",
                "organizationName": "Demo Company",
                "locality": "NYC",
                "region": "NY",
                "countryCode": "US",
                "postalCode": "11101",
                "addressLine1": "76 9th Ave"
            }
        })
    }

    #[tokio::test]
    async fn test_get_customer_path() {
        let transport =
            StubTransport::with_responses(vec![Ok(customer_json("demo.example.com"))]);
        let (client, _bus) = client_over(transport.clone());

        let record = client.get_customer("demo.example.com").await.unwrap();
        assert_eq!(record.domain, "demo.example.com");

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, HttpMethod::Get);
        assert_eq!(calls[0].1, "apps/reseller/v1/customers/demo.example.com");
        assert!(calls[0].2.is_none());
    }

    #[tokio::test]
    async fn test_challenge_built_from_token_response() {
        let transport = StubTransport::with_responses(vec![Ok(json!({
            "method": "DNS_TXT",
            "token": "google-site-verification=abc123"
        }))]);
        let (client, _bus) = client_over(transport.clone());

        let challenge = client
            .request_verification_challenge(
                VerificationType::InetDomain,
                VerificationMethod::DnsTxt,
                "demo.example.com",
            )
            .await
            .unwrap();

        assert_eq!(challenge.verification_token, "google-site-verification=abc123");
        assert_eq!(challenge.verification_identifier, "demo.example.com");

        let calls = transport.calls();
        assert_eq!(calls[0].1, "siteVerification/v1/webResource/token");
        let body = calls[0].2.as_ref().unwrap();
        assert_eq!(body["site"]["type"], "INET_DOMAIN");
        assert_eq!(body["verificationMethod"], "DNS_TXT");
    }

    #[tokio::test]
    async fn test_create_admin_user_inserts_then_promotes() {
        let transport = StubTransport::with_responses(vec![
            Ok(json!({ "primaryEmail": "admin@demo.example.com" })),
            Ok(Value::Null),
        ]);
        let (client, bus) = client_over(transport.clone());
        let mut loading = bus.subscribe_loading();

        let account = client.create_admin_user("demo.example.com").await.unwrap();
        assert_eq!(account.username, "admin@demo.example.com");
        assert_eq!(account.password.len(), PASSWORD_LEN);
        assert!(account
            .password
            .bytes()
            .all(|b| PASSWORD_CHARSET.contains(&b)));

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1, "admin/directory/v1/users");
        assert_eq!(
            calls[0].2.as_ref().unwrap()["name"]["fullName"],
            "Admin Admin"
        );
        assert_eq!(
            calls[1].1,
            "admin/directory/v1/users/admin@demo.example.com/makeAdmin"
        );
        assert_eq!(calls[1].2.as_ref().unwrap()["status"], true);

        // Two transport sends, one interceptor pulse.
        assert_eq!(loading.try_recv().unwrap(), LoadingState::Active);
        assert_eq!(loading.try_recv().unwrap(), LoadingState::Idle);
        assert!(loading.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_assign_license_path_and_body() {
        let transport = StubTransport::with_responses(vec![Ok(Value::Null)]);
        let (client, _bus) = client_over(transport.clone());

        let assignment = client
            .assign_license(
                Product::DriveStorage,
                Sku::DriveStorage20Gb,
                "admin@demo.example.com",
            )
            .await
            .unwrap();
        assert_eq!(assignment.sku_id, "Google-Drive-storage-20GB");

        let calls = transport.calls();
        assert_eq!(
            calls[0].1,
            "apps/licensing/v1/product/Google-Drive-storage/sku/Google-Drive-storage-20GB/user"
        );
        assert_eq!(calls[0].2.as_ref().unwrap()["userId"], "admin@demo.example.com");
    }

    #[tokio::test]
    async fn test_failed_call_pulses_error() {
        let transport = StubTransport::with_responses(vec![Err(ProvisionError::not_found(
            "customer demo.example.com",
        ))]);
        let (client, bus) = client_over(transport);
        let mut loading = bus.subscribe_loading();

        let result = client.get_customer("demo.example.com").await;
        assert!(result.unwrap_err().is_not_found());

        assert_eq!(loading.try_recv().unwrap(), LoadingState::Active);
        assert_eq!(loading.try_recv().unwrap(), LoadingState::Error);
    }

    #[test]
    fn test_generated_passwords_differ() {
        // Not a randomness-quality test; just catches a constant output.
        let a = generate_password();
        let b = generate_password();
        assert_eq!(a.len(), PASSWORD_LEN);
        assert_ne!(a, b);
    }
}
