//! End-to-end scan rules against a real database
//!
//! Run with: DATABASE_URL=postgres://... cargo test -p wms-server -- --ignored

use wms_core::WmsConfig;
use wms_server::db::{create_pool, migrations};
use wms_server::services::scan::ScanRequest;
use wms_server::services::{DependencyService, JobService, ScanService, ServiceContext, ServiceError};

fn request(barcode: &str, job_id: i64) -> ScanRequest {
    ScanRequest {
        barcode: barcode.to_string(),
        job_id: Some(job_id),
        sub_job_id: None,
        notes: Some("flow test".into()),
    }
}

#[tokio::test]
#[ignore = "requires database"]
async fn dependency_then_duplicate() {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let pool = create_pool(&url).await.expect("pool");
    migrations::run(&pool).await.expect("migrate");

    let config = WmsConfig::default();
    let ctx = ServiceContext::new(&pool, &config).expect("context");
    let jobs = JobService::new(ctx);
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let release = jobs.create(&format!("R-{}", &suffix[..8])).await.expect("job");
    let loading = jobs.create(&format!("L-{}", &suffix[..8])).await.expect("job");
    DependencyService::new(ctx)
        .add(loading.id, release.id)
        .await
        .expect("dependency");

    let scans = ScanService::new(ctx);
    let barcode = format!("FLOW-{}", suffix);

    let blocked = scans.process(&request(&barcode, loading.id), "tester").await;
    match blocked {
        Err(ServiceError::MissingDependencies(m)) => {
            assert_eq!(m.missing.len(), 1);
            assert_eq!(m.missing[0].job_id, release.id);
        }
        other => panic!("expected missing dependency, got {:?}", other.map(|o| o.message)),
    }

    let first = scans
        .process(&request(&barcode, release.id), "tester")
        .await
        .expect("first scan");

    match scans.process(&request(&barcode, release.id), "tester").await {
        Err(ServiceError::Duplicate(d)) => assert_eq!(d.existing.id, first.record.id),
        other => panic!("expected duplicate, got {:?}", other.map(|o| o.message)),
    }

    let second = scans
        .process(&request(&barcode, loading.id), "tester")
        .await
        .expect("dependent scan");
    assert_eq!(second.record.job_id, Some(loading.id));

    let summary = scans
        .today_summary(release.id, None, Some("flow"))
        .await
        .expect("summary");
    assert_eq!(summary.count, 1);

    scans.delete(second.record.id, "tester").await.expect("cleanup");
    scans.delete(first.record.id, "tester").await.expect("cleanup");
    DependencyService::new(ctx)
        .remove(loading.id, release.id)
        .await
        .expect("cleanup");
    jobs.delete(loading.id).await.expect("cleanup");
    jobs.delete(release.id).await.expect("cleanup");
}
