//! Onboarder - guided provisioning wizard core for Google Workspace
//! reseller onboarding.
//!
//! The library exposes the orchestration core only: the wizard state
//! machine, the provisioning client with its transport seam, the
//! session store, and the notification bus. Rendering forms and screens
//! around those pieces is the caller's concern.

pub mod api;
pub mod bus;
pub mod catalog;
pub mod config;
pub mod interceptor;
pub mod logging;
pub mod session;
pub mod wizard;

pub use api::{ProvisionError, ProvisioningClient};
pub use bus::NotificationBus;
pub use session::SessionStore;
pub use wizard::{Wizard, WizardError, WizardStep};
