use chrono::Datelike;
use thiserror::Error;

use super::*;

/// Per-row failure. Recorded in the batch report and never propagated.
#[derive(Debug, Error, PartialEq, Eq)]
pub(super) enum RowError {
    /// A scope name the role requires was not supplied.
    #[error("{0}")]
    MissingScope(String),
    /// A supplied name did not resolve.
    #[error("{0}")]
    Resolution(String),
    /// The caller may not provision into the resolved organization.
    #[error("{0}")]
    NotPermitted(String),
    /// A downstream write or account call failed.
    #[error("{0}")]
    Provisioning(String),
}

impl From<AppError> for RowError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::NotFound(message) | AppError::Conflict(message) => Self::Resolution(message),
            other => Self::Provisioning(other.to_string()),
        }
    }
}

/// Batch default organization, verified lazily on first use.
#[derive(Debug, Clone, Copy)]
pub(super) enum DefaultOrganization {
    Absent,
    Unverified(OrganizationId),
    Active(OrganizationId),
    Inactive(OrganizationId),
}

/// State shared by the rows of one import call.
pub(super) struct BatchContext<'a> {
    pub caller: &'a CallerIdentity,
    pub administrative_scope: AdministrativeScope,
    pub default_organization: DefaultOrganization,
    pub cache: ResolutionCache,
}

impl BulkImportService {
    /// Provisions one row and sends the welcome notification when due.
    pub(super) async fn import_row(
        &self,
        context: &mut BatchContext<'_>,
        row: &ImportRow,
    ) -> RowOutcome {
        match self.provision_row(context, row).await {
            Ok(identity) => {
                let notification = self.notifier.notify(&identity).await;
                debug!(
                    row = row.row_number(),
                    user_id = %identity.user_id,
                    notification = ?notification,
                    "row provisioned"
                );
                RowOutcome::Success(identity)
            }
            Err(error) => {
                warn!(row = row.row_number(), error = %error, "row import failed");
                RowOutcome::Failure(RowFailure {
                    row: row.row_number(),
                    email: row.email().as_str().to_owned(),
                    error: error.to_string(),
                })
            }
        }
    }

    async fn provision_row(
        &self,
        context: &mut BatchContext<'_>,
        row: &ImportRow,
    ) -> Result<ProvisionedIdentity, RowError> {
        let scope = self.resolve_scope(context, row).await?;
        let email = row.email().as_str();

        let (user_id, account) = match self.provisioning.find_profile_by_email(email).await? {
            Some(existing) => match existing.organization_id {
                Some(home) if !context.administrative_scope.permits(home) => {
                    return Err(RowError::NotPermitted(format!(
                        "User {email} belongs to organization {home}, which the caller does not administer"
                    )));
                }
                _ => (existing.user_id, AccountOrigin::Reused),
            },
            None => self.create_account(row).await?,
        };

        self.provisioning
            .upsert_profile(&ProfileUpsert {
                user_id,
                email: email.to_owned(),
                full_name: row.full_name().to_owned(),
                organization_id: scope.organization_id,
                created_by: context.caller.user_id(),
            })
            .await?;

        self.provisioning
            .upsert_role_assignment(&RoleAssignmentUpsert {
                user_id,
                role: row.role(),
                scope,
                assigned_by: context.caller.user_id(),
            })
            .await?;

        let (leave_balances_created, leave_balances_present) =
            self.initialize_leave_balances(user_id, scope.organization_id).await?;

        Ok(ProvisionedIdentity {
            user_id,
            email: email.to_owned(),
            full_name: row.full_name().to_owned(),
            scope,
            account,
            leave_balances_created,
            leave_balances_present,
        })
    }

    /// Resolves the scope the row's role needs, failing on the first gap.
    async fn resolve_scope(
        &self,
        context: &mut BatchContext<'_>,
        row: &ImportRow,
    ) -> Result<ScopeContext, RowError> {
        let role = row.role();

        let organization_id = match row.organization_name() {
            Some(name) => {
                self.resolver
                    .resolve_organization(&mut context.cache, name)
                    .await?
            }
            None => self.default_organization(context).await?,
        };

        if !context.administrative_scope.permits(organization_id) {
            return Err(RowError::NotPermitted(format!(
                "Caller is not an administrator of organization {organization_id}"
            )));
        }

        let mut scope = ScopeContext::organization(organization_id);

        if let Some(name) = row.workspace_name() {
            scope.workspace_id = Some(
                self.resolver
                    .resolve_workspace(&mut context.cache, name, organization_id)
                    .await?,
            );
        } else if role.requires_workspace() && row.facility_name().is_none() {
            return Err(RowError::MissingScope(format!(
                "Workspace name is required for role {}",
                role.as_str()
            )));
        }

        match row.facility_name() {
            Some(name) => {
                let facility = self
                    .resolver
                    .resolve_facility(&mut context.cache, name, scope.workspace_id, organization_id)
                    .await?;
                scope.facility_id = Some(facility.facility_id);
                scope.workspace_id.get_or_insert(facility.workspace_id);
            }
            None if role.requires_facility() => {
                return Err(RowError::MissingScope(format!(
                    "Facility name is required for role {}",
                    role.as_str()
                )));
            }
            None => {}
        }

        match (row.department_name(), scope.facility_id) {
            (Some(name), Some(facility_id)) => {
                scope.department_id = Some(
                    self.resolver
                        .resolve_department(&mut context.cache, name, facility_id)
                        .await?,
                );
            }
            (Some(name), None) => {
                return Err(RowError::MissingScope(format!(
                    "Facility name is required to resolve department \"{name}\""
                )));
            }
            (None, _) if role.requires_department() => {
                return Err(RowError::MissingScope(format!(
                    "Department name is required for role {}",
                    role.as_str()
                )));
            }
            (None, _) => {}
        }

        if let (Some(department_id), Some(name)) = (scope.department_id, row.specialty_name()) {
            scope.specialty_id = self
                .resolver
                .resolve_specialty(&mut context.cache, name, department_id)
                .await?;
            if scope.specialty_id.is_none() {
                debug!(row = row.row_number(), specialty = name, "specialty not found, omitted");
            }
        }

        Ok(scope)
    }

    async fn default_organization(
        &self,
        context: &mut BatchContext<'_>,
    ) -> Result<OrganizationId, RowError> {
        match context.default_organization {
            DefaultOrganization::Absent => Err(RowError::MissingScope(
                "Organization context missing".to_owned(),
            )),
            DefaultOrganization::Active(organization_id) => Ok(organization_id),
            DefaultOrganization::Inactive(organization_id) => Err(RowError::Resolution(format!(
                "Organization {organization_id} not found"
            ))),
            DefaultOrganization::Unverified(organization_id) => {
                match self.resolver.verify_organization(organization_id).await {
                    Ok(()) => {
                        context.default_organization = DefaultOrganization::Active(organization_id);
                        Ok(organization_id)
                    }
                    Err(AppError::NotFound(message)) => {
                        context.default_organization =
                            DefaultOrganization::Inactive(organization_id);
                        Err(RowError::Resolution(message))
                    }
                    Err(error) => Err(error.into()),
                }
            }
        }
    }

    async fn create_account(
        &self,
        row: &ImportRow,
    ) -> Result<(UserId, AccountOrigin), RowError> {
        let email = row.email().as_str();
        let password = generate_password()?;

        let creation = self
            .accounts
            .create_account(NewAccount {
                email,
                password: password.expose(),
                full_name: row.full_name(),
            })
            .await?;

        match creation {
            AccountCreation::Created(user_id) => Ok((user_id, AccountOrigin::Created(password))),
            AccountCreation::AlreadyExists => {
                let user_id = self
                    .accounts
                    .find_account_id_by_email(email)
                    .await?
                    .ok_or_else(|| {
                        RowError::Provisioning(format!(
                            "Account for {email} already exists but could not be looked up"
                        ))
                    })?;
                Ok((user_id, AccountOrigin::Reused))
            }
        }
    }

    /// Ensures a zero balance for every active leave type this year.
    ///
    /// Returns (created, already present). Existing balances are untouched.
    async fn initialize_leave_balances(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
    ) -> AppResult<(usize, usize)> {
        let year = Utc::now().year();
        let leave_type_ids = self
            .provisioning
            .list_active_leave_type_ids(organization_id)
            .await?;

        let mut created = 0;
        let mut present = 0;
        for leave_type_id in leave_type_ids {
            match self
                .provisioning
                .ensure_leave_balance(user_id, leave_type_id, year)
                .await?
            {
                LeaveBalanceInit::Created => created += 1,
                LeaveBalanceInit::AlreadyPresent => present += 1,
            }
        }

        debug!(
            user_id = %user_id,
            year,
            created,
            already_present = present,
            "leave balances initialized"
        );
        Ok((created, present))
    }
}
