//! Onboarding state machine — tracks which wizard step the user is on.

use serde::{Deserialize, Deserializer, Serialize};

use super::model::{AccountDraft, FacilityDraft, OrganizationDraft, PlanSelection};

/// The steps of the account-setup wizard.
///
/// Progresses linearly: PlanSelection → AccountSetup → OrganizationSetup →
/// FacilitySetup → Complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WizardStep {
    #[default]
    PlanSelection,
    AccountSetup,
    OrganizationSetup,
    FacilitySetup,
    Complete,
}

impl WizardStep {
    /// Check if a move from `self` to `target` is allowed.
    ///
    /// Staying on the current step is allowed so repeated submits of the
    /// same page are harmless.
    pub fn can_transition_to(&self, target: WizardStep) -> bool {
        *self == target || self.next() == Some(target)
    }

    /// Whether the wizard is finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Get the next step in the linear progression, if any.
    pub fn next(&self) -> Option<WizardStep> {
        use WizardStep::*;
        match self {
            PlanSelection => Some(AccountSetup),
            AccountSetup => Some(OrganizationSetup),
            OrganizationSetup => Some(FacilitySetup),
            FacilitySetup => Some(Complete),
            Complete => None,
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PlanSelection => "plan-selection",
            Self::AccountSetup => "account-setup",
            Self::OrganizationSetup => "organization-setup",
            Self::FacilitySetup => "facility-setup",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

/// Persisted wizard draft.
///
/// Stored as JSON under [`STORAGE_KEY`](super::STORAGE_KEY). Missing fields
/// load as their empty value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OnboardingState {
    pub plan: Option<PlanSelection>,
    pub organization: Option<OrganizationDraft>,
    pub account: Option<AccountDraft>,
    pub facilities: Vec<FacilityDraft>,
    pub current_step: WizardStep,
}

impl OnboardingState {
    /// Overwrite every field present in `patch`, leaving the rest alone.
    pub fn apply(&mut self, patch: OnboardingPatch) {
        if let Some(plan) = patch.plan {
            self.plan = plan;
        }
        if let Some(organization) = patch.organization {
            self.organization = organization;
        }
        if let Some(account) = patch.account {
            self.account = account;
        }
        if let Some(facilities) = patch.facilities {
            self.facilities = facilities;
        }
        if let Some(step) = patch.current_step {
            self.current_step = step;
        }
    }

    /// Copy of `self` with `patch` applied.
    pub fn merged(&self, patch: OnboardingPatch) -> Self {
        let mut next = self.clone();
        next.apply(patch);
        next
    }
}

/// A partial update to [`OnboardingState`].
///
/// Nullable fields use a nested `Option`: the outer one says whether the
/// field is being written, the inner one is the new value (`None` clears it).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingPatch {
    #[serde(default, deserialize_with = "present")]
    pub plan: Option<Option<PlanSelection>>,
    #[serde(default, deserialize_with = "present")]
    pub organization: Option<Option<OrganizationDraft>>,
    #[serde(default, deserialize_with = "present")]
    pub account: Option<Option<AccountDraft>>,
    #[serde(default)]
    pub facilities: Option<Vec<FacilityDraft>>,
    #[serde(default)]
    pub current_step: Option<WizardStep>,
}

impl OnboardingPatch {
    pub fn plan(mut self, plan: PlanSelection) -> Self {
        self.plan = Some(Some(plan));
        self
    }

    pub fn organization(mut self, organization: OrganizationDraft) -> Self {
        self.organization = Some(Some(organization));
        self
    }

    pub fn account(mut self, account: AccountDraft) -> Self {
        self.account = Some(Some(account));
        self
    }

    pub fn facilities(mut self, facilities: Vec<FacilityDraft>) -> Self {
        self.facilities = Some(facilities);
        self
    }

    pub fn current_step(mut self, step: WizardStep) -> Self {
        self.current_step = Some(step);
        self
    }
}

/// A key that appears in the payload is "present", even when it is `null`.
fn present<'de, D, T>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::model::{BillingCycle, Tier};

    #[test]
    fn valid_transitions() {
        use WizardStep::*;
        let transitions = [
            (PlanSelection, AccountSetup),
            (AccountSetup, OrganizationSetup),
            (OrganizationSetup, FacilitySetup),
            (FacilitySetup, Complete),
            (FacilitySetup, FacilitySetup),
        ];
        for (from, to) in transitions {
            assert!(from.can_transition_to(to), "{from} should move to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use WizardStep::*;
        // Skip ahead
        assert!(!PlanSelection.can_transition_to(Complete));
        assert!(!AccountSetup.can_transition_to(FacilitySetup));
        // Go backward
        assert!(!OrganizationSetup.can_transition_to(AccountSetup));
        assert!(!Complete.can_transition_to(PlanSelection));
    }

    #[test]
    fn next_walks_all_steps() {
        use WizardStep::*;
        let mut current = PlanSelection;
        for expected in [AccountSetup, OrganizationSetup, FacilitySetup, Complete] {
            let next = current.next().unwrap();
            assert_eq!(next, expected);
            current = next;
        }
        assert!(current.is_terminal());
        assert!(current.next().is_none());
    }

    #[test]
    fn display_matches_serde() {
        use WizardStep::*;
        for step in [PlanSelection, AccountSetup, OrganizationSetup, FacilitySetup, Complete] {
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(format!("\"{step}\""), json);
        }
    }

    #[test]
    fn default_state_is_canonical_empty() {
        let json = serde_json::to_value(OnboardingState::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "plan": null,
                "organization": null,
                "account": null,
                "facilities": [],
                "currentStep": "plan-selection"
            })
        );
    }

    #[test]
    fn apply_overwrites_only_present_fields() {
        let mut state = OnboardingState {
            plan: Some(PlanSelection::new(Tier::Tier1, BillingCycle::Annual)),
            ..Default::default()
        };
        state.apply(OnboardingPatch::default().current_step(WizardStep::AccountSetup));
        assert!(state.plan.is_some());
        assert_eq!(state.current_step, WizardStep::AccountSetup);
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let patch: OnboardingPatch =
            serde_json::from_str(r#"{"plan": null, "currentStep": "account-setup"}"#).unwrap();
        assert!(matches!(patch.plan, Some(None)));
        assert!(patch.organization.is_none());

        let mut state = OnboardingState {
            plan: Some(PlanSelection::new(Tier::Tier2, BillingCycle::Monthly)),
            ..Default::default()
        };
        state.apply(patch);
        assert!(state.plan.is_none());
        assert_eq!(state.current_step, WizardStep::AccountSetup);
    }

    #[test]
    fn merged_leaves_original_untouched() {
        let state = OnboardingState::default();
        let next = state.merged(OnboardingPatch::default().current_step(WizardStep::Complete));
        assert_eq!(state.current_step, WizardStep::PlanSelection);
        assert_eq!(next.current_step, WizardStep::Complete);
    }
}
