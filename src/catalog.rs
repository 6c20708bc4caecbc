//! Reseller catalog constants: SKUs, plan names, renewal policies.
//!
//! Identifiers match the upstream reseller product catalog and are sent
//! verbatim on the wire.

use serde::{Deserialize, Serialize};

/// Purchasable SKU in the reseller catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sku {
    /// The primary productivity suite.
    GoogleApps,
    DriveStorage20Gb,
    DriveStorage50Gb,
    DriveStorage200Gb,
    DriveStorage400Gb,
    DriveStorage1Tb,
    DriveStorage2Tb,
    DriveStorage4Tb,
    DriveStorage8Tb,
    DriveStorage16Tb,
    Vault,
}

impl Sku {
    /// Catalog identifier sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Sku::GoogleApps => "Google-Apps-For-Business",
            Sku::DriveStorage20Gb => "Google-Drive-storage-20GB",
            Sku::DriveStorage50Gb => "Google-Drive-storage-50GB",
            Sku::DriveStorage200Gb => "Google-Drive-storage-200GB",
            Sku::DriveStorage400Gb => "Google-Drive-storage-400GB",
            Sku::DriveStorage1Tb => "Google-Drive-storage-1TB",
            Sku::DriveStorage2Tb => "Google-Drive-storage-2TB",
            Sku::DriveStorage4Tb => "Google-Drive-storage-4TB",
            Sku::DriveStorage8Tb => "Google-Drive-storage-8TB",
            Sku::DriveStorage16Tb => "Google-Drive-storage-16TB",
            Sku::Vault => "Google-Vault",
        }
    }

    /// Parse a catalog identifier back into a SKU.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == id)
    }

    /// Whether this SKU is a storage add-on (assignable via the licensing
    /// service rather than bundled with the suite).
    pub fn is_storage_addon(self) -> bool {
        matches!(
            self,
            Sku::DriveStorage20Gb
                | Sku::DriveStorage50Gb
                | Sku::DriveStorage200Gb
                | Sku::DriveStorage400Gb
                | Sku::DriveStorage1Tb
                | Sku::DriveStorage2Tb
                | Sku::DriveStorage4Tb
                | Sku::DriveStorage8Tb
                | Sku::DriveStorage16Tb
        )
    }

    pub const ALL: [Sku; 11] = [
        Sku::GoogleApps,
        Sku::DriveStorage20Gb,
        Sku::DriveStorage50Gb,
        Sku::DriveStorage200Gb,
        Sku::DriveStorage400Gb,
        Sku::DriveStorage1Tb,
        Sku::DriveStorage2Tb,
        Sku::DriveStorage4Tb,
        Sku::DriveStorage8Tb,
        Sku::DriveStorage16Tb,
        Sku::Vault,
    ];
}

/// Billing plan attached to a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanName {
    /// Traditional annual agreement.
    Annual,
    /// Month-to-month.
    Flexible,
    /// 30 day (max) trial.
    Trial,
}

impl PlanName {
    pub fn as_str(self) -> &'static str {
        match self {
            PlanName::Annual => "ANNUAL",
            PlanName::Flexible => "FLEXIBLE",
            PlanName::Trial => "TRIAL",
        }
    }
}

/// What happens to a subscription at its term boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenewalType {
    /// Renew for the same license count.
    AutoRenew,
    /// Renew for the current user count, for better or worse.
    RenewCurrent,
    /// Switch to a FLEXIBLE plan billed monthly.
    PayAsYouGo,
    /// Cancel at the renewal date.
    Cancel,
}

impl RenewalType {
    pub fn as_str(self) -> &'static str {
        match self {
            RenewalType::AutoRenew => "AUTO_RENEW",
            RenewalType::RenewCurrent => "RENEW_CURRENT_USERS",
            RenewalType::PayAsYouGo => "SWITCH_TO_PAY_AS_YOU_GO",
            RenewalType::Cancel => "CANCEL",
        }
    }
}

/// Product identifier used by the licensing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Product {
    DriveStorage,
}

impl Product {
    pub fn as_str(self) -> &'static str {
        match self {
            Product::DriveStorage => "Google-Drive-storage",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sku_roundtrip() {
        for sku in Sku::ALL {
            assert_eq!(Sku::from_id(sku.as_str()), Some(sku));
        }
        assert_eq!(Sku::from_id("Google-Apps-For-Nobody"), None);
    }

    #[test]
    fn test_storage_addons() {
        assert!(Sku::DriveStorage20Gb.is_storage_addon());
        assert!(Sku::DriveStorage16Tb.is_storage_addon());
        assert!(!Sku::GoogleApps.is_storage_addon());
        assert!(!Sku::Vault.is_storage_addon());
    }

    #[test]
    fn test_wire_identifiers() {
        assert_eq!(Sku::GoogleApps.as_str(), "Google-Apps-For-Business");
        assert_eq!(PlanName::Flexible.as_str(), "FLEXIBLE");
        assert_eq!(RenewalType::PayAsYouGo.as_str(), "SWITCH_TO_PAY_AS_YOU_GO");
        assert_eq!(Product::DriveStorage.as_str(), "Google-Drive-storage");
    }
}
