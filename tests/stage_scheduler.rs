// tests/stage_scheduler.rs

use sitedag::engine::{
    CoreCommand, CoreRuntime, RuntimeEvent, RuntimeOptions, TaskOutcome, TriggerReason,
};
use sitedag::pipeline::{
    OnFailure, Pipeline, RunStatus, ScheduledTask, StageScheduler, TaskOrigin, TaskRunState,
};
use sitedag::tasks::{BuildMode, TaskId};

fn dispatched(commands: &[CoreCommand]) -> Vec<TaskId> {
    commands
        .iter()
        .flat_map(|c| match c {
            CoreCommand::DispatchTasks(tasks) => tasks.iter().map(|t| t.task).collect(),
            CoreCommand::RequestExit => Vec::new(),
        })
        .collect()
}

fn done(task: TaskId, stage: usize) -> RuntimeEvent {
    RuntimeEvent::TaskCompleted {
        task,
        origin: TaskOrigin::Stage(stage),
        outcome: TaskOutcome::Success,
    }
}

fn failed(task: TaskId, stage: usize) -> RuntimeEvent {
    RuntimeEvent::TaskCompleted {
        task,
        origin: TaskOrigin::Stage(stage),
        outcome: TaskOutcome::Failed(2),
    }
}

fn core(pipeline: Pipeline, exit_when_done: bool) -> CoreRuntime {
    CoreRuntime::new(StageScheduler::new(pipeline), RuntimeOptions { exit_when_done })
}

#[test]
fn start_releases_only_the_first_stage() {
    let mut scheduler = StageScheduler::new(Pipeline::production());
    let step = scheduler.start();

    assert_eq!(
        step.newly_scheduled,
        vec![ScheduledTask {
            task: TaskId::CleanAll,
            origin: TaskOrigin::Stage(0),
            mode: BuildMode::Strict,
        }]
    );
    assert_eq!(scheduler.status(), RunStatus::Running { stage: 0 });
    assert_eq!(scheduler.run_state_of(TaskId::Sass), TaskRunState::Pending);
    assert_eq!(scheduler.run_state_of(TaskId::Server), TaskRunState::NotInRun);
}

#[test]
fn barrier_waits_for_every_task_of_the_stage() {
    let mut core = core(Pipeline::production(), true);
    core.start();
    let step = core.step(done(TaskId::CleanAll, 0));
    assert_eq!(
        dispatched(&step.commands),
        vec![TaskId::Sass, TaskId::Ejs, TaskId::Images, TaskId::Concat]
    );

    for task in [TaskId::Sass, TaskId::Ejs, TaskId::Images] {
        let step = core.step(done(task, 1));
        assert!(step.commands.is_empty(), "{task} opened the barrier early");
        assert!(step.keep_running);
    }
    assert_eq!(core.run_state_of(TaskId::CopyDev), TaskRunState::Pending);

    let step = core.step(done(TaskId::Concat, 1));
    assert_eq!(dispatched(&step.commands), vec![TaskId::CopyDev]);
}

#[test]
fn build_runs_stages_in_order_and_exits() {
    let mut core = core(Pipeline::production(), true);
    let mut order = Vec::new();
    let mut running = dispatched(&core.start().commands);
    while !running.is_empty() {
        order.extend(running.iter().copied());
        let mut next = Vec::new();
        for task in running {
            let stage = Pipeline::production().stage_of(task).unwrap();
            let step = core.step(done(task, stage));
            next.extend(dispatched(&step.commands));
            if !step.keep_running {
                assert!(step.commands.contains(&CoreCommand::RequestExit));
            }
        }
        running = next;
    }

    assert_eq!(
        order,
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
    assert!(core.is_finished());
    assert_eq!(core.summary().status, RunStatus::Completed);
}

#[test]
fn abort_policy_skips_later_stages() {
    let mut core = core(Pipeline::production(), true);
    core.start();
    core.step(done(TaskId::CleanAll, 0));
    core.step(failed(TaskId::Sass, 1));
    core.step(done(TaskId::Ejs, 1));
    core.step(done(TaskId::Images, 1));
    let step = core.step(done(TaskId::Concat, 1));

    assert_eq!(step.commands, vec![CoreCommand::RequestExit]);
    assert!(!step.keep_running);
    assert_eq!(core.run_state_of(TaskId::CopyDev), TaskRunState::Skipped);
    assert_eq!(core.run_state_of(TaskId::Cssmin), TaskRunState::Skipped);

    let summary = core.summary();
    assert_eq!(summary.status, RunStatus::Aborted { stage: 1 });
    assert_eq!(summary.failed, vec![TaskId::Sass]);
    assert!(!summary.interrupted);
}

#[test]
fn continue_policy_moves_on_after_failure() {
    let mut core = core(Pipeline::development(), false);
    core.start();
    core.step(failed(TaskId::Sass, 0));
    for task in [TaskId::Ejs, TaskId::Images, TaskId::Concat] {
        core.step(done(task, 0));
    }
    let step = core.step(done(TaskId::CopyJs, 0));

    let released = dispatched(&step.commands);
    assert_eq!(released, vec![TaskId::Server, TaskId::Watch]);
    assert!(step.keep_running);
    assert_eq!(core.run_state_of(TaskId::Sass), TaskRunState::DoneFailed);
}

#[test]
fn long_lived_tasks_finish_their_stage_by_progress() {
    let mut core = core(Pipeline::development(), false);
    core.start();
    for task in [TaskId::Sass, TaskId::Ejs, TaskId::Images, TaskId::Concat, TaskId::CopyJs] {
        core.step(done(task, 0));
    }

    for task in [TaskId::Server, TaskId::Watch] {
        let step = core.step(RuntimeEvent::TaskProgressed {
            task,
            origin: TaskOrigin::Stage(1),
        });
        assert!(step.keep_running, "dev pipeline must keep running");
        assert!(!step.commands.contains(&CoreCommand::RequestExit));
    }
    assert!(core.is_finished());

    let step = core.step(RuntimeEvent::ShutdownRequested);
    assert!(!step.keep_running);
    let summary = core.summary();
    assert!(summary.interrupted);
    assert_eq!(summary.status, RunStatus::Completed);
}

#[test]
fn triggered_runs_bypass_the_barrier() {
    let mut core = core(Pipeline::development(), false);
    core.start();

    let step = core.step(RuntimeEvent::TaskTriggered {
        task: TaskId::Sass,
        reason: TriggerReason::FileWatch,
    });
    assert_eq!(
        step.commands,
        vec![CoreCommand::DispatchTasks(vec![ScheduledTask {
            task: TaskId::Sass,
            origin: TaskOrigin::Watch,
            mode: BuildMode::Interactive,
        }])]
    );

    // A triggered completion must not count towards stage 0.
    let step = core.step(RuntimeEvent::TaskCompleted {
        task: TaskId::Sass,
        origin: TaskOrigin::Watch,
        outcome: TaskOutcome::Failed(1),
    });
    assert!(step.commands.is_empty());
    assert_eq!(core.run_state_of(TaskId::Sass), TaskRunState::Running);
    assert!(core.summary().failed.is_empty());
}

#[test]
fn long_lived_tasks_cannot_be_triggered() {
    let mut core = core(Pipeline::development(), false);
    core.start();
    let step = core.step(RuntimeEvent::TaskTriggered {
        task: TaskId::Server,
        reason: TriggerReason::FileWatch,
    });
    assert!(step.commands.is_empty());
    assert!(step.keep_running);
}

#[test]
fn stale_events_are_ignored() {
    let mut core = core(Pipeline::production(), true);
    core.start();

    // Sass belongs to stage 1, which has not started.
    let step = core.step(done(TaskId::Sass, 1));
    assert!(step.commands.is_empty());
    assert_eq!(core.run_state_of(TaskId::Sass), TaskRunState::Pending);

    // Wrong stage index for a running task.
    let step = core.step(done(TaskId::CleanAll, 3));
    assert!(step.commands.is_empty());
    assert_eq!(core.run_state_of(TaskId::CleanAll), TaskRunState::Running);
}

#[test]
fn single_task_pipeline_is_strict_and_aborts() {
    let pipeline = Pipeline::single(TaskId::Sass);
    assert_eq!(pipeline.on_failure, OnFailure::Abort);
    assert_eq!(pipeline.mode, BuildMode::Strict);

    let mut core = core(pipeline, true);
    core.start();
    let step = core.step(failed(TaskId::Sass, 0));
    assert!(!step.keep_running);
    assert_eq!(core.summary().status, RunStatus::Aborted { stage: 0 });
}

#[test]
fn empty_stages_are_skipped() {
    let pipeline = Pipeline::new(
        "gaps",
        vec![vec![], vec![TaskId::Sass], vec![]],
        OnFailure::Abort,
        BuildMode::Strict,
    );
    let mut core = core(pipeline, true);
    let step = core.start();
    assert_eq!(dispatched(&step.commands), vec![TaskId::Sass]);
    let step = core.step(done(TaskId::Sass, 1));
    assert_eq!(step.commands, vec![CoreCommand::RequestExit]);
}
