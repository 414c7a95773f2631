//! Dependency editing

use chrono::Utc;
use serde::Serialize;
use wms_core::messages;
use wms_core::rules::would_create_cycle;

use super::{ServiceContext, ServiceError};
use crate::db::repos::{DependencyEdge, DependencyRepo, JobType, JobTypeRepo, RequiredJobCount};

/// A required job as listed for one dependent job
#[derive(Debug, Clone, Serialize)]
pub struct RequiredJobView {
    pub job_id: i64,
    pub job_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_count: Option<i64>,
}

impl From<RequiredJobCount> for RequiredJobView {
    fn from(r: RequiredJobCount) -> Self {
        Self {
            job_id: r.job_id,
            job_name: r.job_name,
            scan_count: Some(r.scan_count),
        }
    }
}

/// One rejected entry of a replacement set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemError {
    pub required_job_id: i64,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplaceOutcome {
    pub job_id: i64,
    pub applied: Vec<i64>,
    pub errors: Vec<ItemError>,
}

/// Decide which of `requested` may become edges of `job_id`.
///
/// Repeated ids are applied once and reported after that.
/// `other_edges` must not contain edges of `job_id` itself; accepted
/// entries are added to the graph as they are checked, so two entries
/// that only cycle together are caught.
pub fn plan_replacement(
    job_id: i64,
    requested: &[i64],
    known_jobs: &dyn Fn(i64) -> Option<String>,
    other_edges: &[(i64, i64)],
    job_name: &str,
) -> ReplaceOutcome {
    let mut graph = other_edges.to_vec();
    let mut outcome = ReplaceOutcome {
        job_id,
        ..Default::default()
    };

    for &required in requested {
        let message = match known_jobs(required) {
            None => Some(messages::job_not_found(required)),
            Some(required_name) if outcome.applied.contains(&required) => {
                Some(messages::dependency_exists(job_name, &required_name))
            }
            Some(_) if required == job_id => Some(messages::DEPENDENCY_SELF.to_string()),
            Some(required_name) if would_create_cycle(&graph, job_id, required) => {
                Some(messages::dependency_cycle(job_name, &required_name))
            }
            Some(_) => None,
        };

        match message {
            Some(message) => outcome.errors.push(ItemError {
                required_job_id: required,
                message,
            }),
            None => {
                graph.push((job_id, required));
                outcome.applied.push(required);
            }
        }
    }
    outcome
}

pub struct DependencyService<'a> {
    ctx: ServiceContext<'a>,
}

impl<'a> DependencyService<'a> {
    pub fn new(ctx: ServiceContext<'a>) -> Self {
        Self { ctx }
    }

    async fn job(&self, id: i64) -> Result<JobType, ServiceError> {
        JobTypeRepo::new(self.ctx.pool)
            .find(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(messages::job_not_found(id)))
    }

    /// Make `job_id` require `required_job_id`.
    pub async fn add(&self, job_id: i64, required_job_id: i64) -> Result<(), ServiceError> {
        if job_id == required_job_id {
            return Err(ServiceError::bad_input(messages::DEPENDENCY_SELF));
        }
        let job = self.job(job_id).await?;
        let required = self.job(required_job_id).await?;

        let repo = DependencyRepo::new(self.ctx.pool);
        let edges = repo.edges().await?;
        if edges.contains(&(job_id, required_job_id)) {
            return Err(ServiceError::conflict(messages::dependency_exists(
                &job.job_name,
                &required.job_name,
            )));
        }
        if would_create_cycle(&edges, job_id, required_job_id) {
            return Err(ServiceError::conflict(messages::dependency_cycle(
                &job.job_name,
                &required.job_name,
            )));
        }

        if !repo.add(job_id, required_job_id).await? {
            // Lost a race with a concurrent insert of the same edge
            return Err(ServiceError::conflict(messages::dependency_exists(
                &job.job_name,
                &required.job_name,
            )));
        }
        tracing::info!(job_id, required_job_id, "dependency added");
        Ok(())
    }

    pub async fn remove(&self, job_id: i64, required_job_id: i64) -> Result<(), ServiceError> {
        if !DependencyRepo::new(self.ctx.pool)
            .remove(job_id, required_job_id)
            .await?
        {
            return Err(ServiceError::not_found(messages::record_not_found(
                "dependency",
                &format!("{} -> {}", job_id, required_job_id),
            )));
        }
        tracing::info!(job_id, required_job_id, "dependency removed");
        Ok(())
    }

    /// Replace the required set of `job_id`. Invalid entries are skipped
    /// and reported; the rest are written in one transaction.
    pub async fn replace(
        &self,
        job_id: i64,
        required_job_ids: &[i64],
    ) -> Result<ReplaceOutcome, ServiceError> {
        let job = self.job(job_id).await?;
        let jobs = JobTypeRepo::new(self.ctx.pool).list().await?;
        let repo = DependencyRepo::new(self.ctx.pool);
        let other_edges: Vec<(i64, i64)> = repo
            .edges()
            .await?
            .into_iter()
            .filter(|(from, _)| *from != job_id)
            .collect();

        let lookup = |id: i64| {
            jobs.iter()
                .find(|j| j.id == id)
                .map(|j| j.job_name.clone())
        };
        let outcome = plan_replacement(
            job_id,
            required_job_ids,
            &lookup,
            &other_edges,
            &job.job_name,
        );

        repo.replace(job_id, &outcome.applied).await?;
        tracing::info!(
            job_id,
            applied = outcome.applied.len(),
            rejected = outcome.errors.len(),
            "dependencies replaced"
        );
        Ok(outcome)
    }

    /// Required jobs of `job_id`, optionally with scan counts for today
    /// (site time zone) or all time.
    pub async fn required_jobs(
        &self,
        job_id: i64,
        with_scan_status: bool,
        today_only: bool,
    ) -> Result<Vec<RequiredJobView>, ServiceError> {
        self.job(job_id).await?;
        let repo = DependencyRepo::new(self.ctx.pool);

        if !with_scan_status {
            return Ok(repo
                .required_jobs(job_id)
                .await?
                .into_iter()
                .map(|r| RequiredJobView {
                    job_id: r.job_id,
                    job_name: r.job_name,
                    scan_count: None,
                })
                .collect());
        }

        let bounds = today_only.then(|| {
            let today = self.ctx.calendar.today(Utc::now());
            self.ctx.calendar.day_bounds(today)
        });
        Ok(repo
            .required_jobs_with_counts(job_id, bounds)
            .await?
            .into_iter()
            .map(RequiredJobView::from)
            .collect())
    }

    pub async fn list_all(&self) -> Result<Vec<DependencyEdge>, ServiceError> {
        Ok(DependencyRepo::new(self.ctx.pool).list_all().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(id: i64) -> Option<String> {
        (1..=6).contains(&id).then(|| format!("{}.Job", id))
    }

    #[test]
    fn replacement_accepts_valid_set() {
        let outcome = plan_replacement(4, &[1, 2, 3], &names, &[(3, 2), (2, 1)], "4.Job");
        assert_eq!(outcome.applied, vec![1, 2, 3]);
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn replacement_reports_bad_items() {
        // 2 already requires 4, so 4 -> 2 would cycle
        let outcome = plan_replacement(4, &[4, 2, 99, 1, 1], &names, &[(2, 4)], "4.Job");
        assert_eq!(outcome.applied, vec![1]);

        let rejected: Vec<i64> = outcome.errors.iter().map(|e| e.required_job_id).collect();
        assert_eq!(rejected, vec![4, 2, 99, 1]);
        assert_eq!(outcome.errors[0].message, messages::DEPENDENCY_SELF);
        assert_eq!(outcome.errors[2].message, messages::job_not_found(99));
        assert_eq!(outcome.errors[3].message, messages::dependency_exists("4.Job", "1.Job"));
    }

    #[test]
    fn replacement_catches_transitive_cycle() {
        // 1 -> 3 -> 5 exists; 5 -> 1 closes it
        let outcome = plan_replacement(5, &[1], &names, &[(1, 3), (3, 5)], "5.Job");
        assert!(outcome.applied.is_empty());
        assert_eq!(outcome.errors.len(), 1);
    }
}
