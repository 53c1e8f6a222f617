//! Returning request service

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{AssignmentState, ReturningRequestState},
        returning_request::{ReturningRequest, ReturningRequestFilterRequest, ReturningRequestListItem},
        user::{User, UserClaims},
    },
    query::{ListQuery, Page, Paging},
    repository::{AssignmentStore, ReturningRequestStore, UserStore},
};

#[derive(Clone)]
pub struct ReturningRequestsService {
    requests: Arc<dyn ReturningRequestStore>,
    assignments: Arc<dyn AssignmentStore>,
    users: Arc<dyn UserStore>,
}

impl ReturningRequestsService {
    pub fn new(
        requests: Arc<dyn ReturningRequestStore>,
        assignments: Arc<dyn AssignmentStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            requests,
            assignments,
            users,
        }
    }

    #[tracing::instrument(skip(self, claims, request), fields(user_id = %claims.sub))]
    pub async fn filter(
        &self,
        claims: &UserClaims,
        request: &ReturningRequestFilterRequest,
    ) -> AppResult<Page<ReturningRequestListItem>> {
        let admin = super::resolve_admin(self.users.as_ref(), claims).await?;
        let query = ListQuery::new(
            request.specification(&admin.location),
            request.ordering(),
            Paging::from_request(request.page_number, request.page_size),
        );
        self.requests.list(&query).await
    }

    /// Ask for an accepted assignment to be returned.
    ///
    /// Admins may open requests for assignments made in their location;
    /// other users only for assignments given to them.
    #[tracing::instrument(skip(self, claims), fields(user_id = %claims.sub))]
    pub async fn create(&self, claims: &UserClaims, assignment_id: Uuid) -> AppResult<Uuid> {
        let requester = super::resolve_requester(self.users.as_ref(), claims).await?;

        let assignment = self
            .assignments
            .find_by_id(assignment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Assignment is not found".to_string()))?;

        if requester.is_admin() {
            if assignment.assigned_by_location != requester.location {
                return Err(AppError::NotFound(
                    "Assignment belongs to another location".to_string(),
                ));
            }
        } else if assignment.assigned_to_id != requester.id {
            return Err(AppError::NotFound("Assignment is not found".to_string()));
        }

        if assignment.state != AssignmentState::Accepted {
            return Err(AppError::BadRequest(
                "Only accepted assignments can be returned".to_string(),
            ));
        }

        let id = self.requests.create(assignment_id, requester.id).await?;
        tracing::info!(request_id = %id, assignment_id = %assignment_id, "Returning request created");
        Ok(id)
    }

    /// Load a pending request of the admin's location
    async fn pending_in_location(&self, admin: &User, id: Uuid) -> AppResult<ReturningRequest> {
        let request = self
            .requests
            .find_by_id(id)
            .await?
            .filter(|request| request.asset_location == admin.location)
            .ok_or_else(|| AppError::NotFound(format!("Returning request with id {} not found", id)))?;

        if request.state != ReturningRequestState::WaitingForReturning {
            return Err(AppError::BadRequest(
                "Returning request is not waiting for returning".to_string(),
            ));
        }
        Ok(request)
    }

    /// Confirm the asset is back: request completed, asset available again
    #[tracing::instrument(skip(self, claims), fields(user_id = %claims.sub))]
    pub async fn complete(&self, claims: &UserClaims, id: Uuid) -> AppResult<()> {
        let admin = super::resolve_admin(self.users.as_ref(), claims).await?;
        let request = self.pending_in_location(&admin, id).await?;

        self.requests
            .complete(id, admin.id, Utc::now().date_naive())
            .await?;
        tracing::info!(request_id = %id, asset_id = %request.asset_id, "Returning request completed");
        Ok(())
    }

    #[tracing::instrument(skip(self, claims), fields(user_id = %claims.sub))]
    pub async fn cancel(&self, claims: &UserClaims, id: Uuid) -> AppResult<()> {
        let admin = super::resolve_admin(self.users.as_ref(), claims).await?;
        self.pending_in_location(&admin, id).await?;

        self.requests.cancel(id).await?;
        tracing::info!(request_id = %id, "Returning request cancelled");
        Ok(())
    }
}
