//! Assignment service: handing assets to users and their answers

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        assignment::{
            AssignmentFilterRequest, AssignmentListItem, CreateAssignment, MyAssignmentFilterRequest,
            MyAssignmentItem, NewAssignment,
        },
        enums::AssignmentState,
        user::UserClaims,
    },
    query::{ListQuery, Page, Paging},
    repository::{AssetStore, AssignmentStore, UserStore},
};

#[derive(Clone)]
pub struct AssignmentsService {
    assignments: Arc<dyn AssignmentStore>,
    assets: Arc<dyn AssetStore>,
    users: Arc<dyn UserStore>,
}

impl AssignmentsService {
    pub fn new(
        assignments: Arc<dyn AssignmentStore>,
        assets: Arc<dyn AssetStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            assignments,
            assets,
            users,
        }
    }

    /// Assignments of assets in the admin's location
    #[tracing::instrument(skip(self, claims, request), fields(user_id = %claims.sub))]
    pub async fn filter(
        &self,
        claims: &UserClaims,
        request: &AssignmentFilterRequest,
    ) -> AppResult<Page<AssignmentListItem>> {
        let admin = super::resolve_admin(self.users.as_ref(), claims).await?;
        let query = ListQuery::new(
            request.specification(&admin.location),
            request.ordering(),
            Paging::from_request(request.page_number, request.page_size),
        );
        self.assignments.list(&query).await
    }

    /// Assignments given to the requester
    #[tracing::instrument(skip(self, claims, request), fields(user_id = %claims.sub))]
    pub async fn list_own(
        &self,
        claims: &UserClaims,
        request: &MyAssignmentFilterRequest,
    ) -> AppResult<Page<MyAssignmentItem>> {
        let requester = super::resolve_requester(self.users.as_ref(), claims).await?;
        let query = ListQuery::new(
            request.specification(requester.id),
            request.ordering(),
            Paging::from_request(request.page_number, request.page_size),
        );
        self.assignments.list_own(&query).await
    }

    /// Assign an available asset of the admin's location to an active user.
    ///
    /// The new assignment waits for acceptance and the asset becomes
    /// `NotAvailable`.
    #[tracing::instrument(skip(self, claims, request), fields(user_id = %claims.sub))]
    pub async fn create(&self, claims: &UserClaims, request: CreateAssignment) -> AppResult<Uuid> {
        let admin = super::resolve_admin(self.users.as_ref(), claims).await?;
        request.validate()?;

        let assignee = self
            .users
            .find_by_id(request.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User to assign is not found".to_string()))?;
        if assignee.is_disabled {
            return Err(AppError::BadRequest("User to assign is disabled".to_string()));
        }

        let asset = self
            .assets
            .find_by_id(request.asset_id)
            .await?
            .filter(|asset| asset.location == admin.location)
            .ok_or_else(|| AppError::NotFound("Asset to assign is not found".to_string()))?;
        if !asset.state.is_assignable() {
            return Err(AppError::BadRequest("Asset is not available for assignment".to_string()));
        }

        let id = self
            .assignments
            .create(&NewAssignment {
                asset_id: asset.id,
                assigned_by_id: admin.id,
                assigned_to_id: assignee.id,
                note: request.note,
                assigned_date: request.assigned_date,
            })
            .await?;
        tracing::info!(assignment_id = %id, asset_id = %asset.id, "Assignment created");
        Ok(id)
    }

    /// Accept or decline an assignment given to the requester
    #[tracing::instrument(skip(self, claims), fields(user_id = %claims.sub))]
    pub async fn respond(&self, claims: &UserClaims, id: Uuid, accept: bool) -> AppResult<()> {
        let requester = super::resolve_requester(self.users.as_ref(), claims).await?;

        let assignment = self
            .assignments
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Assignment with id {} not found", id)))?;
        if assignment.assigned_to_id != requester.id {
            return Err(AppError::Authorization(
                "Only the assignee can respond to an assignment".to_string(),
            ));
        }
        if assignment.state != AssignmentState::WaitingForAcceptance {
            return Err(AppError::BadRequest(
                "Assignment is not waiting for acceptance".to_string(),
            ));
        }

        self.assignments.respond(id, accept).await?;
        tracing::info!(assignment_id = %id, accept, "Assignment answered");
        Ok(())
    }
}
