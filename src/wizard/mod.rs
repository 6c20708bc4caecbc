//! The orchestration core: a forward-only provisioning state machine.
//!
//! The wizard walks a fixed sequence of steps, each backed by at most one
//! remote operation. Step inputs are derived from the session store plus
//! prior responses; on success the machine caches any new artifacts and
//! advances, on failure it stays put, publishes an alert, and leaves the
//! step retryable. Completed remote state is never rolled back: a
//! half-provisioned domain is a legitimate resting state the user resumes
//! from, because the domain and prior artifacts are read back from the
//! session rather than recreated.

pub mod verification;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::types::{
    AdminAccount, CustomerRecord, LicenseAssignment, Subscription, SubscriptionRequest,
    VerificationChallenge, VerificationMethod,
};
use crate::api::{ProvisionError, ProvisioningClient};
use crate::bus::NotificationBus;
use crate::catalog::{PlanName, Product, RenewalType, Sku};
use crate::session::{keys, SessionError, SessionStore};
use verification::VerificationStatus;

/// Position in the provisioning sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WizardStep {
    Customer,
    Subscription,
    VerificationRequest,
    VerificationConfirm,
    VerificationAction,
    UserCreate,
    UserCreateConfirm,
    StorageSubscription,
    StorageLicense,
    Done,
}

impl WizardStep {
    pub const ORDER: [WizardStep; 10] = [
        WizardStep::Customer,
        WizardStep::Subscription,
        WizardStep::VerificationRequest,
        WizardStep::VerificationConfirm,
        WizardStep::VerificationAction,
        WizardStep::UserCreate,
        WizardStep::UserCreateConfirm,
        WizardStep::StorageSubscription,
        WizardStep::StorageLicense,
        WizardStep::Done,
    ];

    /// The step after this one, or `None` at the end of the sequence.
    pub fn next(self) -> Option<Self> {
        let idx = Self::ORDER.iter().position(|s| *s == self)?;
        Self::ORDER.get(idx + 1).copied()
    }

    /// The step before this one, or `None` at the start.
    pub fn prev(self) -> Option<Self> {
        let idx = Self::ORDER.iter().position(|s| *s == self)?;
        idx.checked_sub(1).and_then(|i| Self::ORDER.get(i)).copied()
    }

    pub fn is_terminal(self) -> bool {
        self == WizardStep::Done
    }
}

/// Step-level failure. Provisioning failures have already been published
/// as alerts by the time they surface here.
#[derive(Debug, Error)]
pub enum WizardError {
    #[error("{action} is not available on step {current:?}")]
    StepMismatch {
        action: &'static str,
        current: WizardStep,
    },
    #[error("no active domain in the session")]
    MissingDomain,
    #[error("no cached verification challenge in the session")]
    MissingChallenge,
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Provision(#[from] ProvisionError),
}

/// Catalog choices applied when the user does not pick them per step.
#[derive(Debug, Clone)]
pub struct WizardDefaults {
    pub primary_sku: Sku,
    pub plan: PlanName,
    pub renewal: RenewalType,
    pub purchase_order_id: String,
    pub storage_sku: Sku,
    pub storage_seats: u32,
    pub storage_purchase_order_id: String,
}

impl Default for WizardDefaults {
    fn default() -> Self {
        Self {
            primary_sku: Sku::GoogleApps,
            plan: PlanName::Flexible,
            renewal: RenewalType::PayAsYouGo,
            purchase_order_id: "G00gl39001".to_string(),
            storage_sku: Sku::DriveStorage20Gb,
            storage_seats: 5,
            storage_purchase_order_id: "G00gl39001-d20".to_string(),
        }
    }
}

/// The wizard state machine.
pub struct Wizard {
    step: WizardStep,
    client: ProvisioningClient,
    session: SessionStore,
    bus: NotificationBus,
    defaults: WizardDefaults,
    verification_status: Option<VerificationStatus>,
}

impl Wizard {
    pub fn new(client: ProvisioningClient, session: SessionStore, bus: NotificationBus) -> Self {
        Self::with_defaults(client, session, bus, WizardDefaults::default())
    }

    pub fn with_defaults(
        client: ProvisioningClient,
        session: SessionStore,
        bus: NotificationBus,
        defaults: WizardDefaults,
    ) -> Self {
        Self {
            step: WizardStep::Customer,
            client,
            session,
            bus,
            defaults,
            verification_status: None,
        }
    }

    pub fn current_step(&self) -> WizardStep {
        self.step
    }

    /// Status of the last confirmation attempt, while on (or after) the
    /// verification-action step.
    pub fn verification_status(&self) -> Option<VerificationStatus> {
        self.verification_status
    }

    /// Navigate one step backwards. Purely positional; remote state
    /// created by the abandoned step is not undone.
    pub fn back(&mut self) {
        if let Some(prev) = self.step.prev() {
            tracing::debug!(from = ?self.step, to = ?prev, "navigating back");
            self.step = prev;
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.step.next() {
            tracing::info!(from = ?self.step, to = ?next, "step complete");
            self.step = next;
        }
    }

    fn require_step(&self, expected: WizardStep, action: &'static str) -> Result<(), WizardError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(WizardError::StepMismatch {
                action,
                current: self.step,
            })
        }
    }

    /// The domain this provisioning run is for. Set by step 1; every
    /// later step refuses to run without it.
    fn active_domain(&self) -> Result<String, WizardError> {
        self.session
            .get::<String>(keys::CURRENT_DOMAIN)?
            .ok_or(WizardError::MissingDomain)
    }

    fn cached_challenge(&self) -> Result<VerificationChallenge, WizardError> {
        self.session
            .get::<VerificationChallenge>(keys::VERIFICATION_CHALLENGE)?
            .ok_or(WizardError::MissingChallenge)
    }

    /// Publish `message` as a blocking alert and hand the failure back.
    fn fail(&self, message: String, err: ProvisionError) -> WizardError {
        self.bus.alert(message);
        WizardError::Provision(err)
    }

    /// Step 1: create the customer record and make its domain the active
    /// domain for the rest of the run.
    ///
    /// An explicit existence pre-check runs first so the common duplicate
    /// case fails fast with a clear message. The pre-check races against
    /// concurrent provisioning of the same domain, so a conflict from the
    /// insert itself is treated as the same duplicate outcome.
    pub async fn submit_customer(
        &mut self,
        record: CustomerRecord,
    ) -> Result<CustomerRecord, WizardError> {
        self.require_step(WizardStep::Customer, "submit_customer")?;

        match self.client.get_customer(&record.domain).await {
            Ok(_) => {
                let err = ProvisionError::already_exists(format!("customer {}", record.domain));
                return Err(self.fail("That customer already exists".to_string(), err));
            }
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(self.fail(err.to_string(), err)),
        }

        let created = match self.client.create_customer(&record).await {
            Ok(created) => created,
            Err(err) => {
                let message = if err.is_conflict() {
                    "That customer already exists".to_string()
                } else {
                    err.to_string()
                };
                return Err(self.fail(message, err));
            }
        };

        self.session.set(keys::CURRENT_DOMAIN, &record.domain)?;
        self.advance();
        Ok(created)
    }

    /// Step 2: attach the primary suite subscription.
    pub async fn submit_subscription(&mut self, seats: u32) -> Result<Subscription, WizardError> {
        self.require_step(WizardStep::Subscription, "submit_subscription")?;
        let domain = self.active_domain()?;

        let request = SubscriptionRequest {
            subscription_id: Some(format!("{domain}-apps")),
            domain,
            sku: self.defaults.primary_sku,
            plan: self.defaults.plan,
            renewal: Some(self.defaults.renewal),
            seats,
            purchase_order_id: self.defaults.purchase_order_id.clone(),
        };

        match self.client.create_subscription(&request).await {
            Ok(subscription) => {
                self.advance();
                Ok(subscription)
            }
            Err(err) => Err(self.fail(err.to_string(), err)),
        }
    }

    /// Step 3: request a verification challenge for the chosen method and
    /// cache it for the confirm and action steps.
    pub async fn submit_verification_request(
        &mut self,
        method: VerificationMethod,
    ) -> Result<VerificationChallenge, WizardError> {
        self.require_step(WizardStep::VerificationRequest, "submit_verification_request")?;
        let domain = self.active_domain()?;

        let info = verification::info(method);
        let identifier = verification::derive_identifier(method, &domain);

        match self
            .client
            .request_verification_challenge(info.verification_type, method, &identifier)
            .await
        {
            Ok(challenge) => {
                self.session.set(keys::VERIFICATION_CHALLENGE, &challenge)?;
                self.advance();
                Ok(challenge)
            }
            Err(err) => Err(self.fail(err.to_string(), err)),
        }
    }

    /// Step 3-confirm: show the cached challenge so the user can place
    /// the token. Reads cached state only; no remote call.
    pub fn confirm_challenge_reviewed(&mut self) -> Result<VerificationChallenge, WizardError> {
        self.require_step(WizardStep::VerificationConfirm, "confirm_challenge_reviewed")?;
        let challenge = self.cached_challenge()?;
        self.verification_status = None;
        self.advance();
        Ok(challenge)
    }

    /// Step 4: ask the verification authority to test the cached
    /// challenge. Invoked once on entering the step; the user retries by
    /// invoking it again. Exactly one confirmation call per invocation.
    pub async fn run_verification(&mut self) -> Result<VerificationStatus, WizardError> {
        self.require_step(WizardStep::VerificationAction, "run_verification")?;
        let challenge = self.cached_challenge()?;

        self.verification_status = Some(VerificationStatus::Working);
        match self.client.confirm_verification(&challenge).await {
            Ok(()) => {
                self.verification_status = Some(VerificationStatus::Ok);
                self.advance();
                Ok(VerificationStatus::Ok)
            }
            Err(err) => {
                self.verification_status = Some(VerificationStatus::Failed);
                self.bus.alert(err.to_string());
                Ok(VerificationStatus::Failed)
            }
        }
    }

    /// Step 5: acknowledge the upcoming admin account. No remote call.
    pub fn begin_user_create(&mut self) -> Result<(), WizardError> {
        self.require_step(WizardStep::UserCreate, "begin_user_create")?;
        self.advance();
        Ok(())
    }

    /// Step 5-confirm: create `admin@{domain}`. Fires on entering the
    /// step; the generated password is returned here exactly once and
    /// cached for the remainder of the session.
    pub async fn create_admin_account(&mut self) -> Result<AdminAccount, WizardError> {
        self.require_step(WizardStep::UserCreateConfirm, "create_admin_account")?;
        let domain = self.active_domain()?;

        match self.client.create_admin_user(&domain).await {
            Ok(account) => {
                self.session.set(keys::ADMIN_ACCOUNT, &account)?;
                self.advance();
                Ok(account)
            }
            Err(err) => Err(self.fail(format!("Error when creating user: {err}"), err)),
        }
    }

    /// Step 6: attach the storage add-on subscription.
    pub async fn submit_storage_subscription(&mut self) -> Result<Subscription, WizardError> {
        self.require_step(WizardStep::StorageSubscription, "submit_storage_subscription")?;
        let domain = self.active_domain()?;

        let request = SubscriptionRequest {
            domain,
            subscription_id: None,
            sku: self.defaults.storage_sku,
            plan: self.defaults.plan,
            renewal: None,
            seats: self.defaults.storage_seats,
            purchase_order_id: self.defaults.storage_purchase_order_id.clone(),
        };

        match self.client.create_subscription(&request).await {
            Ok(subscription) => {
                self.advance();
                Ok(subscription)
            }
            Err(err) => {
                Err(self.fail(format!("Error creating Drive Storage Subscription: {err}"), err))
            }
        }
    }

    /// Step 7: assign the storage license to the admin account, then the
    /// run is done.
    pub async fn submit_storage_license(&mut self) -> Result<LicenseAssignment, WizardError> {
        self.require_step(WizardStep::StorageLicense, "submit_storage_license")?;
        let domain = self.active_domain()?;

        let user_id = self
            .session
            .get::<AdminAccount>(keys::ADMIN_ACCOUNT)?
            .map(|account| account.username)
            .unwrap_or_else(|| format!("admin@{domain}"));

        match self
            .client
            .assign_license(Product::DriveStorage, self.defaults.storage_sku, &user_id)
            .await
        {
            Ok(assignment) => {
                self.advance();
                Ok(assignment)
            }
            Err(err) => {
                Err(self.fail(format!("Error assigning Drive Storage License: {err}"), err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::{HttpMethod, Transport};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Arc;
    use std::sync::Mutex;

    /// Transport that fails every call and counts them.
    struct UnreachableTransport {
        calls: Mutex<usize>,
    }

    impl UnreachableTransport {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(0),
            })
        }

        fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Transport for UnreachableTransport {
        async fn send(
            &self,
            _method: HttpMethod,
            _path: &str,
            _body: Option<Value>,
        ) -> Result<Value, ProvisionError> {
            *self.calls.lock().unwrap() += 1;
            Err(ProvisionError::transport("unreachable"))
        }
    }

    fn wizard_over(transport: Arc<UnreachableTransport>) -> (Wizard, NotificationBus) {
        let bus = NotificationBus::new();
        let client = ProvisioningClient::new(transport, bus.clone());
        let wizard = Wizard::new(client, SessionStore::in_memory(), bus.clone());
        (wizard, bus)
    }

    #[test]
    fn test_step_order_is_fixed() {
        let mut step = WizardStep::Customer;
        let mut walked = vec![step];
        while let Some(next) = step.next() {
            walked.push(next);
            step = next;
        }
        assert_eq!(walked, WizardStep::ORDER);
        assert!(step.is_terminal());
        assert_eq!(WizardStep::Customer.prev(), None);
        assert_eq!(
            WizardStep::Done.prev(),
            Some(WizardStep::StorageLicense)
        );
    }

    #[tokio::test]
    async fn test_out_of_order_submit_is_rejected_without_remote_call() {
        let transport = UnreachableTransport::new();
        let (mut wizard, _bus) = wizard_over(transport.clone());

        let err = wizard.submit_subscription(5).await.unwrap_err();
        assert!(matches!(
            err,
            WizardError::StepMismatch {
                action: "submit_subscription",
                current: WizardStep::Customer
            }
        ));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_domain_blocks_later_steps() {
        let transport = UnreachableTransport::new();
        let (mut wizard, _bus) = wizard_over(transport.clone());
        wizard.step = WizardStep::Subscription;

        let err = wizard.submit_subscription(5).await.unwrap_err();
        assert!(matches!(err, WizardError::MissingDomain));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_challenge_blocks_verification_action() {
        let transport = UnreachableTransport::new();
        let (mut wizard, _bus) = wizard_over(transport.clone());
        wizard.step = WizardStep::VerificationAction;

        let err = wizard.run_verification().await.unwrap_err();
        assert!(matches!(err, WizardError::MissingChallenge));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_step_stays_put_and_alerts() {
        let transport = UnreachableTransport::new();
        let (mut wizard, bus) = wizard_over(transport);
        let mut alerts = bus.subscribe_alerts();
        wizard.step = WizardStep::StorageSubscription;
        wizard
            .session
            .set(keys::CURRENT_DOMAIN, &"demo.example.com")
            .unwrap();

        let result = wizard.submit_storage_subscription().await;
        assert!(result.is_err());
        assert_eq!(wizard.current_step(), WizardStep::StorageSubscription);

        let alert = alerts.try_recv().unwrap();
        assert!(alert
            .text
            .starts_with("Error creating Drive Storage Subscription:"));
    }

    #[test]
    fn test_back_never_crosses_the_start() {
        let transport = UnreachableTransport::new();
        let (mut wizard, _bus) = wizard_over(transport);

        wizard.back();
        assert_eq!(wizard.current_step(), WizardStep::Customer);

        wizard.step = WizardStep::VerificationConfirm;
        wizard.back();
        assert_eq!(wizard.current_step(), WizardStep::VerificationRequest);
    }

    #[test]
    fn test_defaults_match_catalog_happy_path() {
        let defaults = WizardDefaults::default();
        assert_eq!(defaults.primary_sku, Sku::GoogleApps);
        assert_eq!(defaults.plan, PlanName::Flexible);
        assert_eq!(defaults.renewal, RenewalType::PayAsYouGo);
        assert!(defaults.storage_sku.is_storage_addon());
    }
}
