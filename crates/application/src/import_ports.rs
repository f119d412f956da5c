//! Ports consumed by the bulk user importer.

mod accounts;
mod directory;
mod provisioning;

pub use accounts::{AccountCreation, AccountProvider, NewAccount};
pub use directory::{DirectoryRepository, FacilityMatch};
pub use provisioning::{
    ExistingProfile, LeaveBalanceInit, ProfileUpsert, ProvisioningRepository,
    RoleAssignmentUpsert,
};
