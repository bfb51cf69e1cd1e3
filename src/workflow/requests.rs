// Share requests - ask an identity to disclose data, and answer such asks

use crate::docstore::{RequestStatus, ShareRequest};
use crate::ledger::AccessTier;
use crate::workflow::error::WorkflowError;
use crate::workflow::patient::PatientClient;
use std::collections::HashSet;
use tracing::info;

impl PatientClient {
    /// Ask `request_from` to disclose, to this identity, every document
    /// `source` has shared with `request_from`. One pending request is
    /// recorded per content hash.
    pub async fn request_data(
        &self,
        request_from: &str,
        source: &str,
        access_tier: &str,
    ) -> Result<Vec<ShareRequest>, WorkflowError> {
        let tier: AccessTier = access_tier
            .parse()
            .map_err(WorkflowError::InvalidAccessTier)?;
        let record = self.fresh_identity(source).await?;

        let mut seen = HashSet::new();
        let mut recorded = Vec::new();
        for node in record.root().data_addressed_to(request_from) {
            if !seen.insert(node.hash.as_str()) {
                continue;
            }
            let request = ShareRequest::new(&node.hash, &node.name, request_from, source, self.name(), tier);
            self.requests.upsert_request(&request).await?;
            recorded.push(request);
        }

        info!(request_from = %request_from, source = %source, tier = %tier, requests = recorded.len(), "data requested");
        Ok(recorded)
    }

    /// Pending requests this identity is asked to approve
    pub async fn list_requests(&self) -> Result<Vec<ShareRequest>, WorkflowError> {
        Ok(self
            .requests
            .list_requests_for(self.name())
            .await?
            .into_iter()
            .filter(ShareRequest::is_pending)
            .collect())
    }

    /// Accept or reject a request addressed to this identity.
    ///
    /// Accepting a request for data someone else shared with this identity
    /// re-discloses it to the requester under the request's tier; accepting
    /// one for this identity's own data discloses it as to a trusted party.
    /// Only pending requests can be processed; a decided one fails with
    /// `Validation` and discloses nothing.
    pub async fn process_request(&self, id: &str, accept: bool) -> Result<ShareRequest, WorkflowError> {
        let mut request = self
            .requests
            .get_request(id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("request {}", id)))?;

        if request.request_from != self.name() {
            return Err(WorkflowError::Validation(format!(
                "request {} is addressed to {}",
                id, request.request_from
            )));
        }
        if !request.is_pending() {
            return Err(WorkflowError::Validation(format!(
                "request {} is already {}",
                id, request.status
            )));
        }

        if accept {
            if request.source != self.name() {
                self.open_shared_data_to_third_party(&request.source, &request.target, request.access_tier)
                    .await?;
            } else {
                self.open_shared_data_to_trusted_party(&request.target).await?;
            }
            request.status = RequestStatus::Accepted;
        } else {
            request.status = RequestStatus::Rejected;
        }

        self.requests.upsert_request(&request).await?;
        info!(id = %id, status = %request.status, requester = %request.target, "request processed");
        Ok(request)
    }
}
