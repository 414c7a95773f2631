//! Job and sub job catalog

use serde::{Deserialize, Serialize};
use wms_core::messages;
use wms_core::model::{Description, JobName, SubJobName};

use super::{ServiceContext, ServiceError};
use crate::db::repos::{JobType, JobTypeRepo, SubJobRepo, SubJobType};
use crate::db::DbError;

#[derive(Debug, Clone, Deserialize)]
pub struct SubJobInput {
    pub main_job_id: i64,
    pub sub_job_name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubJobUpdate {
    pub sub_job_name: String,
    pub description: Option<String>,
}

/// What deleting a sub job actually did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubJobRemoval {
    /// Scans reference it, so it was only deactivated
    Deactivated,
    Deleted,
}

pub struct JobService<'a> {
    ctx: ServiceContext<'a>,
}

impl<'a> JobService<'a> {
    pub fn new(ctx: ServiceContext<'a>) -> Self {
        Self { ctx }
    }

    pub async fn list(&self) -> Result<Vec<JobType>, ServiceError> {
        Ok(JobTypeRepo::new(self.ctx.pool).list().await?)
    }

    pub async fn get(&self, id: i64) -> Result<JobType, ServiceError> {
        JobTypeRepo::new(self.ctx.pool)
            .find(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(messages::job_not_found(id)))
    }

    pub async fn create(&self, name: &str) -> Result<JobType, ServiceError> {
        let name = JobName::new(name)?;
        match JobTypeRepo::new(self.ctx.pool).create(name.as_str()).await {
            Ok(job) => {
                tracing::info!(id = job.id, name = %job.job_name, "job type created");
                Ok(job)
            }
            Err(e) if e.is_unique_violation() => {
                Err(ServiceError::conflict(messages::job_name_taken(name.as_str())))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn rename(&self, id: i64, name: &str) -> Result<JobType, ServiceError> {
        let name = JobName::new(name)?;
        match JobTypeRepo::new(self.ctx.pool).rename(id, name.as_str()).await {
            Ok(job) => {
                tracing::info!(id, name = %job.job_name, "job type renamed");
                Ok(job)
            }
            Err(e) if e.is_unique_violation() => {
                Err(ServiceError::conflict(messages::job_name_taken(name.as_str())))
            }
            Err(DbError::NotFound { .. }) => {
                Err(ServiceError::not_found(messages::job_not_found(id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a job type. Refused while scans reference it.
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let repo = JobTypeRepo::new(self.ctx.pool);
        let job = self.get(id).await?;

        let scans = repo.scan_count(id).await?;
        if scans > 0 {
            return Err(ServiceError::conflict(messages::job_in_use(&job.job_name, scans)));
        }

        match repo.delete(id).await {
            Ok(true) => {
                tracing::info!(id, name = %job.job_name, "job type deleted");
                Ok(())
            }
            Ok(false) => Err(ServiceError::not_found(messages::job_not_found(id))),
            // A scan landed between the count and the delete
            Err(e) if e.is_foreign_key_violation() => {
                Err(ServiceError::conflict(messages::job_in_use(&job.job_name, 1)))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn sub_jobs(
        &self,
        main_job_id: i64,
        include_inactive: bool,
    ) -> Result<Vec<SubJobType>, ServiceError> {
        self.get(main_job_id).await?;
        Ok(SubJobRepo::new(self.ctx.pool)
            .list_by_job(main_job_id, include_inactive)
            .await?)
    }

    pub async fn all_sub_jobs(&self) -> Result<Vec<SubJobType>, ServiceError> {
        Ok(SubJobRepo::new(self.ctx.pool).list_all().await?)
    }

    pub async fn create_sub_job(&self, input: &SubJobInput) -> Result<SubJobType, ServiceError> {
        let name = SubJobName::new(&input.sub_job_name)?;
        let description = Description::new(input.description.as_deref())?;
        self.get(input.main_job_id).await?;

        match SubJobRepo::new(self.ctx.pool)
            .create(input.main_job_id, name.as_str(), description.as_deref())
            .await
        {
            Ok(sub) => {
                tracing::info!(id = sub.id, main_job_id = sub.main_job_id, name = %sub.sub_job_name, "sub job created");
                Ok(sub)
            }
            Err(e) if e.is_unique_violation() => {
                Err(ServiceError::conflict(messages::sub_job_name_taken(name.as_str())))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update_sub_job(
        &self,
        id: i64,
        update: &SubJobUpdate,
    ) -> Result<SubJobType, ServiceError> {
        let name = SubJobName::new(&update.sub_job_name)?;
        let description = Description::new(update.description.as_deref())?;

        match SubJobRepo::new(self.ctx.pool)
            .update(id, name.as_str(), description.as_deref())
            .await
        {
            Ok(sub) => Ok(sub),
            Err(e) if e.is_unique_violation() => {
                Err(ServiceError::conflict(messages::sub_job_name_taken(name.as_str())))
            }
            Err(DbError::NotFound { .. }) => {
                Err(ServiceError::not_found(messages::sub_job_not_found(id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a sub job, or only deactivate it when scans reference it.
    pub async fn delete_sub_job(&self, id: i64) -> Result<SubJobRemoval, ServiceError> {
        let repo = SubJobRepo::new(self.ctx.pool);
        repo.find(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(messages::sub_job_not_found(id)))?;

        if repo.scan_count(id).await? > 0 {
            repo.set_active(id, false).await?;
            tracing::info!(id, "sub job deactivated (referenced by scans)");
            return Ok(SubJobRemoval::Deactivated);
        }

        match repo.delete(id).await {
            Ok(_) => {
                tracing::info!(id, "sub job deleted");
                Ok(SubJobRemoval::Deleted)
            }
            Err(e) if e.is_foreign_key_violation() => {
                repo.set_active(id, false).await?;
                Ok(SubJobRemoval::Deactivated)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn activate_sub_job(&self, id: i64) -> Result<SubJobType, ServiceError> {
        match SubJobRepo::new(self.ctx.pool).set_active(id, true).await {
            Ok(sub) => Ok(sub),
            Err(DbError::NotFound { .. }) => {
                Err(ServiceError::not_found(messages::sub_job_not_found(id)))
            }
            Err(e) => Err(e.into()),
        }
    }
}
