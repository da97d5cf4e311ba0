// tests/runtime_fake_executor.rs

mod common;
use common::{FakeExecutor, init_tracing, with_timeout};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use sitedag::check_summary;
use sitedag::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use sitedag::errors::SitedagError;
use sitedag::pipeline::{Pipeline, RunStatus, ScheduledTask, StageScheduler, TaskOrigin};
use sitedag::tasks::TaskId;

fn runtime(
    pipeline: Pipeline,
    fail: Option<TaskId>,
) -> (
    Runtime<FakeExecutor>,
    mpsc::Sender<RuntimeEvent>,
    Arc<Mutex<Vec<ScheduledTask>>>,
) {
    let (tx, rx) = mpsc::channel(64);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let mut executor = FakeExecutor::new(tx.clone(), Arc::clone(&executed));
    if let Some(task) = fail {
        executor = executor.failing(task);
    }
    let options = RuntimeOptions {
        exit_when_done: !pipeline.has_long_lived(),
    };
    let core = CoreRuntime::new(StageScheduler::new(pipeline), options);
    (Runtime::new(core, rx, executor), tx, executed)
}

fn names(executed: &Mutex<Vec<ScheduledTask>>) -> Vec<TaskId> {
    executed.lock().unwrap().iter().map(|t| t.task).collect()
}

#[tokio::test]
async fn build_pipeline_runs_every_stage_in_order() {
    init_tracing();
    let (rt, _tx, executed) = runtime(Pipeline::production(), None);

    let summary = with_timeout(rt.run()).await.unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert!(check_summary(&summary, false).is_ok());
    assert_eq!(
        names(&executed),
        vec![
            TaskId::CleanAll,
            TaskId::Sass,
            TaskId::Ejs,
            TaskId::Images,
            TaskId::Concat,
            TaskId::CopyDev,
            TaskId::Uglify,
            TaskId::Cssmin,
        ]
    );
    let origins: Vec<TaskOrigin> = executed.lock().unwrap().iter().map(|t| t.origin).collect();
    assert_eq!(origins[0], TaskOrigin::Stage(0));
    assert_eq!(origins[5], TaskOrigin::Stage(2));
}

#[tokio::test]
async fn failing_stage_aborts_the_build() {
    init_tracing();
    let (rt, _tx, executed) = runtime(Pipeline::production(), Some(TaskId::Ejs));

    let summary = with_timeout(rt.run()).await.unwrap();

    assert_eq!(summary.status, RunStatus::Aborted { stage: 1 });
    assert_eq!(summary.failed, vec![TaskId::Ejs]);
    let ran = names(&executed);
    assert!(!ran.contains(&TaskId::CopyDev));
    assert!(!ran.contains(&TaskId::Uglify));

    match check_summary(&summary, false) {
        Err(SitedagError::PipelineFailed { pipeline, stage, tasks }) => {
            assert_eq!(pipeline, "build");
            assert_eq!(stage, 2);
            assert_eq!(tasks, "ejs");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn dev_pipeline_keeps_running_until_shutdown() {
    init_tracing();
    let (rt, tx, executed) = runtime(Pipeline::development(), Some(TaskId::Sass));
    let handle = tokio::spawn(rt.run());

    // Stage 2 comes up despite the failed sass run.
    with_timeout(async {
        loop {
            if names(&executed).contains(&TaskId::Watch) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!handle.is_finished());

    tx.send(RuntimeEvent::TaskTriggered {
        task: TaskId::CopyJs,
        reason: sitedag::engine::TriggerReason::FileWatch,
    })
    .await
    .unwrap();
    tx.send(RuntimeEvent::ShutdownRequested).await.unwrap();

    let summary = with_timeout(handle).await.unwrap().unwrap();
    assert!(summary.interrupted);
    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.failed, vec![TaskId::Sass]);
    assert!(check_summary(&summary, true).is_ok());

    let triggered: Vec<ScheduledTask> = executed
        .lock()
        .unwrap()
        .iter()
        .copied()
        .filter(|t| t.origin == TaskOrigin::Watch)
        .collect();
    assert_eq!(triggered.len(), 1);
    assert_eq!(triggered[0].task, TaskId::CopyJs);
}

#[tokio::test]
async fn interrupted_build_is_an_error() {
    let (tx, rx) = mpsc::channel(8);

    // An executor that never reports back keeps stage 0 running.
    struct Silent;
    impl sitedag::exec::ExecutorBackend for Silent {
        fn spawn_ready_tasks(
            &mut self,
            _tasks: Vec<ScheduledTask>,
        ) -> std::pin::Pin<
            Box<dyn std::future::Future<Output = sitedag::errors::Result<()>> + Send + '_>,
        > {
            Box::pin(async { Ok(()) })
        }
    }

    let core = CoreRuntime::new(
        StageScheduler::new(Pipeline::production()),
        RuntimeOptions {
            exit_when_done: true,
        },
    );
    let rt = Runtime::new(core, rx, Silent);
    tx.send(RuntimeEvent::ShutdownRequested).await.unwrap();

    let summary = with_timeout(rt.run()).await.unwrap();
    assert!(summary.interrupted);
    assert_eq!(summary.status, RunStatus::Running { stage: 0 });
    assert!(check_summary(&summary, false).is_err());
}
