//! Library branch service

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::branch::{Branch, BranchQuery, CreateBranch, UpdateBranch},
    repository::Repository,
};

#[derive(Clone)]
pub struct BranchesService {
    repository: Repository,
}

impl BranchesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn create_branch(&self, branch: CreateBranch, actor_id: Uuid) -> AppResult<Branch> {
        let created = self.repository.branches.create(&branch).await?;
        tracing::info!(branch_id = %created.id, name = %created.name, actor_id = %actor_id, "branch created");
        Ok(created)
    }

    pub async fn get_branch(&self, branch_id: Uuid) -> AppResult<Branch> {
        self.repository.branches.get_by_id(branch_id).await
    }

    pub async fn update_branch(
        &self,
        branch_id: Uuid,
        update: UpdateBranch,
        actor_id: Uuid,
    ) -> AppResult<Branch> {
        let updated = self.repository.branches.update(branch_id, &update).await?;
        tracing::info!(branch_id = %branch_id, actor_id = %actor_id, "branch updated");
        Ok(updated)
    }

    pub async fn delete_branch(&self, branch_id: Uuid, actor_id: Uuid) -> AppResult<()> {
        self.repository.branches.delete(branch_id).await?;
        tracing::info!(branch_id = %branch_id, actor_id = %actor_id, "branch deleted");
        Ok(())
    }

    pub async fn list_branches(&self, query: &BranchQuery) -> AppResult<(Vec<Branch>, i64)> {
        self.repository.branches.list(query).await
    }
}
