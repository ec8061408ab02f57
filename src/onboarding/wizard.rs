//! OnboardingWizard — owns one session's draft and keeps it persisted.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::STORAGE_KEY;
use super::handoff::{AccountProvisioner, OnboardingSubmission, ProvisionReceipt};
use super::model::{BillingCycle, FacilityDraft, PlanLimits, PlanSelection, Tier};
use super::state::{OnboardingPatch, OnboardingState, WizardStep};
use crate::config::{StepPolicy, WizardConfig};
use crate::error::OnboardingError;
use crate::store::OnboardingStore;

/// Where the payment provider sent the user back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingOutcome {
    Success,
    Failure,
}

impl BillingOutcome {
    /// Front-end route the user lands on.
    pub fn landing_path(&self) -> &'static str {
        match self {
            Self::Success => "/facility-setup",
            Self::Failure => "/organization-dashboard",
        }
    }
}

/// Tracks wizard progress for one scope and writes every change through to
/// the draft store.
///
/// Every mutation writes the full merged state first and only commits it in
/// memory once the write succeeded, so a failed write leaves
/// [`state`](Self::state) as it was.
pub struct OnboardingWizard {
    store: Arc<dyn OnboardingStore>,
    scope: String,
    config: WizardConfig,
    state: OnboardingState,
}

impl OnboardingWizard {
    /// Create a wizard with an empty in-memory state. Nothing is read yet.
    pub fn new(store: Arc<dyn OnboardingStore>, scope: &str, config: WizardConfig) -> Self {
        Self {
            store,
            scope: scope.to_string(),
            config,
            state: OnboardingState::default(),
        }
    }

    /// Create a wizard and restore whatever draft the store holds.
    pub async fn open(store: Arc<dyn OnboardingStore>, scope: &str, config: WizardConfig) -> Self {
        let mut wizard = Self::new(store, scope, config);
        wizard.load().await;
        wizard
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn state(&self) -> &OnboardingState {
        &self.state
    }

    /// Re-read the draft from the store.
    ///
    /// A missing entry, unparseable JSON, or a failing store all yield the
    /// canonical empty state. This never fails: the draft is disposable.
    pub async fn load(&mut self) -> OnboardingState {
        self.state = match self.store.get(&self.scope, STORAGE_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<OnboardingState>(&raw) {
                Ok(state) => state,
                Err(e) => {
                    warn!(scope = %self.scope, "Discarding malformed onboarding draft: {}", e);
                    OnboardingState::default()
                }
            },
            Ok(None) => OnboardingState::default(),
            Err(e) => {
                warn!(scope = %self.scope, "Failed to read onboarding draft: {}", e);
                OnboardingState::default()
            }
        };
        self.state.clone()
    }

    /// Shallow-merge `patch` onto the current state and persist the result.
    pub async fn update(
        &mut self,
        patch: OnboardingPatch,
    ) -> Result<OnboardingState, OnboardingError> {
        let next = self.state.merged(patch);
        self.persist(&next).await?;
        self.state = next;
        Ok(self.state.clone())
    }

    /// Select a plan on annual billing and move to account setup.
    pub async fn set_plan(&mut self, tier: impl Into<Tier>) -> Result<(), OnboardingError> {
        self.set_plan_with_billing(tier, BillingCycle::default())
            .await
    }

    /// Select a plan and move to account setup.
    ///
    /// Allowed from any step: re-picking a plan restarts account setup.
    pub async fn set_plan_with_billing(
        &mut self,
        tier: impl Into<Tier>,
        billing: BillingCycle,
    ) -> Result<(), OnboardingError> {
        let plan = PlanSelection::new(tier.into(), billing);
        info!(scope = %self.scope, tier = %plan.tier, seats = plan.seats, "Plan selected");
        self.update(
            OnboardingPatch::default()
                .plan(plan)
                .current_step(WizardStep::AccountSetup),
        )
        .await?;
        Ok(())
    }

    /// Move the wizard to `step`, subject to the configured [`StepPolicy`].
    pub async fn set_current_step(&mut self, step: WizardStep) -> Result<(), OnboardingError> {
        let from = self.state.current_step;
        if self.config.step_policy == StepPolicy::Strict && !from.can_transition_to(step) {
            return Err(OnboardingError::InvalidTransition { from, to: step });
        }
        self.update(OnboardingPatch::default().current_step(step))
            .await?;
        debug!(scope = %self.scope, %from, to = %step, "Step changed");
        Ok(())
    }

    /// Drop the persisted draft and start over.
    pub async fn clear(&mut self) -> Result<(), OnboardingError> {
        self.store.remove(&self.scope, STORAGE_KEY).await?;
        self.state = OnboardingState::default();
        info!(scope = %self.scope, "Onboarding draft cleared");
        Ok(())
    }

    /// Seat and facility allowance of the selected plan, zero without one.
    pub fn selected_plan_limits(&self) -> PlanLimits {
        self.state
            .plan
            .as_ref()
            .map(PlanSelection::limits)
            .unwrap_or_default()
    }

    /// Append a facility, respecting the plan's facility allowance.
    pub async fn add_facility(
        &mut self,
        facility: FacilityDraft,
    ) -> Result<OnboardingState, OnboardingError> {
        if self.state.plan.is_none() {
            return Err(OnboardingError::PlanRequired);
        }
        let limit = self.selected_plan_limits().facilities;
        if self.state.facilities.len() >= limit as usize {
            return Err(OnboardingError::FacilityLimitReached { limit });
        }
        let mut facilities = self.state.facilities.clone();
        facilities.push(facility);
        self.update(OnboardingPatch::default().facilities(facilities))
            .await
    }

    /// Remove and return the facility at `index`.
    pub async fn remove_facility(
        &mut self,
        index: usize,
    ) -> Result<FacilityDraft, OnboardingError> {
        if index >= self.state.facilities.len() {
            return Err(OnboardingError::FacilityNotFound { index });
        }
        let mut facilities = self.state.facilities.clone();
        let removed = facilities.remove(index);
        self.update(OnboardingPatch::default().facilities(facilities))
            .await?;
        Ok(removed)
    }

    /// Handle the return from the payment provider.
    ///
    /// A successful payment resumes the wizard at facility setup regardless
    /// of the step policy; a failed one leaves the draft untouched.
    pub async fn resume_after_billing(
        &mut self,
        outcome: BillingOutcome,
    ) -> Result<&'static str, OnboardingError> {
        if outcome == BillingOutcome::Success {
            self.update(OnboardingPatch::default().current_step(WizardStep::FacilitySetup))
                .await?;
        }
        info!(scope = %self.scope, ?outcome, "Returned from billing");
        Ok(outcome.landing_path())
    }

    /// Assemble the drafts for the backend.
    pub fn submission(&self) -> Result<OnboardingSubmission, OnboardingError> {
        OnboardingSubmission::try_from(&self.state)
    }

    /// Hand a completed draft to the backend and discard it on success.
    ///
    /// If the provisioner fails the draft is kept so the user can retry.
    /// Once provisioning succeeded the receipt is returned even if the draft
    /// cannot be removed; the draft is then overwritten with the empty state
    /// so it no longer reads as complete.
    pub async fn hand_off(
        &mut self,
        provisioner: &dyn AccountProvisioner,
    ) -> Result<ProvisionReceipt, OnboardingError> {
        let step = self.state.current_step;
        if !step.is_terminal() {
            return Err(OnboardingError::NotComplete { step });
        }
        let submission = self.submission()?;
        let receipt = provisioner.provision(&submission).await?;
        info!(
            scope = %self.scope,
            organization_id = receipt.organization_id.as_deref().unwrap_or("-"),
            facilities = submission.facilities.len(),
            "Onboarding handed off"
        );
        if let Err(e) = self.clear().await {
            warn!(scope = %self.scope, "Failed to remove handed-off draft: {}", e);
            let empty = OnboardingState::default();
            if let Err(e) = self.persist(&empty).await {
                warn!(scope = %self.scope, "Failed to reset handed-off draft: {}", e);
            }
            self.state = empty;
        }
        Ok(receipt)
    }

    async fn persist(&self, state: &OnboardingState) -> Result<(), OnboardingError> {
        let raw = serde_json::to_string(state)?;
        self.store.set(&self.scope, STORAGE_KEY, &raw).await?;
        Ok(())
    }
}
