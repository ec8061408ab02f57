//! Completion handoff — turns a finished draft into real backend records.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::model::{AccountDraft, FacilityDraft, OrganizationDraft, PlanSelection};
use super::state::OnboardingState;
use crate::error::{OnboardingError, ProvisionError};

/// Everything the backend needs to create the organization, its owner
/// account, and its facilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingSubmission {
    pub plan: PlanSelection,
    pub organization: OrganizationDraft,
    pub account: AccountDraft,
    pub facilities: Vec<FacilityDraft>,
}

impl TryFrom<&OnboardingState> for OnboardingSubmission {
    type Error = OnboardingError;

    fn try_from(state: &OnboardingState) -> Result<Self, Self::Error> {
        Ok(Self {
            plan: state
                .plan
                .clone()
                .ok_or(OnboardingError::Incomplete { missing: "plan" })?,
            organization: state
                .organization
                .clone()
                .ok_or(OnboardingError::Incomplete {
                    missing: "organization",
                })?,
            account: state
                .account
                .clone()
                .ok_or(OnboardingError::Incomplete { missing: "account" })?,
            facilities: state.facilities.clone(),
        })
    }
}

/// Identifiers of the records the backend created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProvisionReceipt {
    pub organization_id: Option<String>,
    pub account_id: Option<String>,
}

/// The backend that owns organizations, accounts, and facilities.
#[async_trait]
pub trait AccountProvisioner: Send + Sync {
    async fn provision(
        &self,
        submission: &OnboardingSubmission,
    ) -> Result<ProvisionReceipt, ProvisionError>;
}

/// Posts the submission as JSON to a single backend endpoint.
#[derive(Debug, Clone)]
pub struct HttpProvisioner {
    client: reqwest::Client,
    url: String,
}

impl HttpProvisioner {
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AccountProvisioner for HttpProvisioner {
    async fn provision(
        &self,
        submission: &OnboardingSubmission,
    ) -> Result<ProvisionReceipt, ProvisionError> {
        debug!(url = %self.url, tier = %submission.plan.tier, "Provisioning account");
        let response = self
            .client
            .post(&self.url)
            .json(submission)
            .send()
            .await
            .map_err(|e| ProvisionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Backend rejected onboarding submission");
            return Err(ProvisionError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<ProvisionReceipt>()
            .await
            .map_err(|e| ProvisionError::InvalidResponse(e.to_string()))
    }
}
