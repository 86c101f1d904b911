#![allow(clippy::disallowed_methods)]

mod common;

use actors::{CancelTarget, JobStore, SchedulerConfig, SchedulerState, StepOutcome};
use canvas_core::{DrawError, JobState, Notice, PaintOp};
use common::{MockChannel, TestResult, setup_store, square_job};

#[tokio::test]
async fn test_identity_square_retires_after_nine_sends() -> TestResult {
    let store = setup_store().await?;
    let channel = MockChannel::new();
    let mut scheduler = SchedulerState::new(SchedulerConfig::default(), store.clone(), channel.shared());

    let job = square_job(3, &[]);
    let expected = job.queue.clone();
    let id = scheduler.submit(job).await?;

    let status = scheduler.status(&id).ok_or("job missing")?;
    assert_eq!((status.drawn, status.total), (0, 9));
    assert_eq!(status.state, JobState::Queued);
    assert!(store.load_queue(&id).await?.is_some());
    assert_eq!(store.get_checkpoint(&JobStore::end_key(&id)).await?, Some(9));

    for cursor in 1..9 {
        assert_eq!(
            scheduler.step().await,
            StepOutcome::Sent {
                job_id: id.clone(),
                cursor
            }
        );
    }
    assert_eq!(scheduler.step().await, StepOutcome::Finished(id.clone()));

    assert_eq!(scheduler.status(&id), None);
    assert_eq!(store.load_queue(&id).await?, None);
    assert_eq!(store.get_checkpoint(&JobStore::end_key(&id)).await?, None);
    assert_eq!(channel.job_sends(&id), expected);
    assert_eq!(
        expected.iter().map(|op| (op.x, op.y)).take(4).collect::<Vec<_>>(),
        vec![(0, 0), (1, 0), (2, 0), (0, 1)]
    );

    assert_eq!(scheduler.step().await, StepOutcome::Idle);

    let notices = channel.notices();
    assert!(matches!(notices.first(), Some(Notice::JobStarted { total: 9, cursor: 0, .. })));
    assert!(matches!(notices.last(), Some(Notice::JobFinished { total: 9, .. })));
    Ok(())
}

#[tokio::test]
async fn test_center_first_sends_centroid_first() -> TestResult {
    let channel = MockChannel::new();
    let mut scheduler =
        SchedulerState::new(SchedulerConfig::default(), setup_store().await?, channel.shared());

    let id = scheduler.submit(square_job(3, &["center"])).await?;
    scheduler.step().await;

    let sent = channel.job_sends(&id);
    assert_eq!((sent[0].x, sent[0].y), (1, 1));
    Ok(())
}

#[tokio::test]
async fn test_cancel_after_three_sends() -> TestResult {
    let store = setup_store().await?;
    let channel = MockChannel::new();
    let mut scheduler = SchedulerState::new(SchedulerConfig::default(), store.clone(), channel.shared());

    let id = scheduler.submit(square_job(3, &[])).await?;
    for _ in 0..3 {
        assert!(matches!(scheduler.step().await, StepOutcome::Sent { .. }));
    }

    scheduler.cancel(CancelTarget::Job(id.clone()))?;
    assert_eq!(scheduler.step().await, StepOutcome::Canceled(id.clone()));

    let status = scheduler.status(&id).ok_or("canceled job should stay visible")?;
    assert_eq!(status.state, JobState::Canceled);
    assert_eq!(status.drawn, 3);
    assert_eq!(store.load_queue(&id).await?, None);
    assert!(store.list_queues().await?.is_empty());

    assert_eq!(scheduler.step().await, StepOutcome::Idle);
    assert_eq!(channel.job_sends(&id).len(), 3);
    assert!(scheduler.list().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_failed_sends_retry_same_operation() -> TestResult {
    let channel = MockChannel::failing_on(5..=7);
    let mut scheduler =
        SchedulerState::new(SchedulerConfig::default(), setup_store().await?, channel.shared());

    let job = square_job(10, &[]);
    let expected = job.queue.clone();
    let id = scheduler.submit(job).await?;

    let mut outcomes = Vec::new();
    loop {
        let outcome = scheduler.step().await;
        let done = outcome == StepOutcome::Finished(id.clone());
        outcomes.push(outcome);
        if done {
            break;
        }
        assert!(outcomes.len() < 200, "scheduler did not finish");
    }

    for outcome in &outcomes[4..7] {
        assert_eq!(
            outcome,
            &StepOutcome::Stalled {
                job_id: id.clone(),
                cursor: 4
            }
        );
    }
    assert_eq!(outcomes.len(), 103);
    assert_eq!(channel.attempts(), 103);
    assert_eq!(channel.job_sends(&id), expected);

    let stalls = channel
        .notices()
        .into_iter()
        .filter(|n| matches!(n, Notice::SendStalled { cursor: 4, .. }))
        .count();
    assert_eq!(stalls, 3);
    Ok(())
}

#[tokio::test]
async fn test_checkpoint_interval_is_tunable() -> TestResult {
    let store = setup_store().await?;
    let channel = MockChannel::new();
    let config = SchedulerConfig::default().with_checkpoint_interval(4);
    let mut scheduler = SchedulerState::new(config, store.clone(), channel.shared());

    let id = scheduler.submit(square_job(4, &[])).await?;
    let start_key = JobStore::start_key(&id);

    for _ in 0..3 {
        scheduler.step().await;
    }
    assert_eq!(store.get_checkpoint(&start_key).await?, None);

    scheduler.step().await;
    assert_eq!(store.get_checkpoint(&start_key).await?, Some(4));

    for _ in 0..5 {
        scheduler.step().await;
    }
    assert_eq!(store.get_checkpoint(&start_key).await?, Some(8));
    Ok(())
}

#[tokio::test]
async fn test_zero_checkpoint_interval_checkpoints_every_send() -> TestResult {
    let store = setup_store().await?;
    let channel = MockChannel::new();
    let config = SchedulerConfig {
        checkpoint_interval: 0,
        ..SchedulerConfig::default()
    };
    let mut scheduler = SchedulerState::new(config, store.clone(), channel.shared());

    let id = scheduler.submit(square_job(2, &[])).await?;
    assert_eq!(
        scheduler.step().await,
        StepOutcome::Sent {
            job_id: id.clone(),
            cursor: 1
        }
    );
    assert_eq!(store.get_checkpoint(&JobStore::start_key(&id)).await?, Some(1));
    Ok(())
}

#[tokio::test]
async fn test_recovery_resumes_from_checkpoint() -> TestResult {
    let store = setup_store().await?;
    let first = MockChannel::new();
    let mut scheduler = SchedulerState::new(SchedulerConfig::default(), store.clone(), first.shared());

    let job = square_job(10, &["center"]);
    let expected = job.queue.clone();
    let id = scheduler.submit(job).await?;
    for _ in 0..25 {
        scheduler.step().await;
    }
    // simulated crash: sends 21..25 were never checkpointed
    drop(scheduler);

    let second = MockChannel::new();
    let mut scheduler = SchedulerState::new(SchedulerConfig::default(), store.clone(), second.shared());
    assert_eq!(scheduler.discover().await?, 1);
    assert_eq!(scheduler.discover().await?, 0);

    let status = scheduler.status(&id).ok_or("job not recovered")?;
    assert_eq!((status.drawn, status.total), (20, 100));

    while scheduler.step().await != StepOutcome::Finished(id.clone()) {}

    assert_eq!(second.job_sends(&id), expected[20..].to_vec());
    assert!(store.list_queues().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_recovery_keeps_id_order() -> TestResult {
    let store = setup_store().await?;
    let channel = MockChannel::new();
    let mut scheduler = SchedulerState::new(SchedulerConfig::default(), store.clone(), channel.shared());

    let a = canvas_core::JobId::parse("01-a").ok_or("bad id")?;
    let b = canvas_core::JobId::parse("02-b").ok_or("bad id")?;
    let job = square_job(2, &[]);
    store
        .register(&canvas_core::Job::with_id(b.clone(), job.queue.clone(), 0, job.bounds))
        .await?;
    store
        .register(&canvas_core::Job::with_id(a.clone(), job.queue.clone(), 0, job.bounds))
        .await?;

    scheduler.discover().await?;
    let order: Vec<_> = scheduler.list().into_iter().map(|s| s.id).collect();
    assert_eq!(order, vec![a, b]);
    Ok(())
}

#[tokio::test]
async fn test_jobs_drain_in_fifo_order() -> TestResult {
    let channel = MockChannel::new();
    let mut scheduler =
        SchedulerState::new(SchedulerConfig::default(), setup_store().await?, channel.shared());

    let first = scheduler.submit(square_job(2, &[])).await?;
    let second = scheduler.submit(square_job(2, &["flip"])).await?;

    let list = scheduler.list();
    assert_eq!(list.len(), 2);
    assert_eq!(list[1].state, JobState::Queued);

    while scheduler.step().await != StepOutcome::Idle {}

    let origins: Vec<_> = channel.sends().into_iter().map(|(_, origin)| origin).collect();
    let first_sends = origins
        .iter()
        .take_while(|o| **o == canvas_core::SendOrigin::Job(first.clone()))
        .count();
    assert_eq!(first_sends, 4);
    assert_eq!(channel.job_sends(&second).len(), 4);
    Ok(())
}

#[tokio::test]
async fn test_pause_holds_head_job() -> TestResult {
    let channel = MockChannel::new();
    let mut scheduler =
        SchedulerState::new(SchedulerConfig::default(), setup_store().await?, channel.shared());

    let id = scheduler.submit(square_job(2, &[])).await?;
    scheduler.step().await;
    scheduler.pause();

    assert_eq!(scheduler.step().await, StepOutcome::Paused);
    let status = scheduler.status(&id).ok_or("job missing")?;
    assert_eq!(status.state, JobState::Paused);
    assert_eq!(status.drawn, 1);

    scheduler.resume();
    assert_eq!(
        scheduler.step().await,
        StepOutcome::Sent {
            job_id: id.clone(),
            cursor: 2
        }
    );
    assert_eq!(channel.attempts(), 2);
    Ok(())
}

#[tokio::test]
async fn test_cancel_all_clears_once_drained() -> TestResult {
    let channel = MockChannel::new();
    let mut scheduler =
        SchedulerState::new(SchedulerConfig::default(), setup_store().await?, channel.shared());

    let a = scheduler.submit(square_job(2, &[])).await?;
    let b = scheduler.submit(square_job(2, &[])).await?;
    scheduler.cancel(CancelTarget::All)?;

    assert_eq!(scheduler.step().await, StepOutcome::Canceled(a));
    assert_eq!(scheduler.step().await, StepOutcome::Canceled(b));
    assert_eq!(scheduler.step().await, StepOutcome::Idle);

    let c = scheduler.submit(square_job(2, &[])).await?;
    assert!(matches!(scheduler.step().await, StepOutcome::Sent { job_id, .. } if job_id == c));
    assert_eq!(channel.attempts(), 1);
    Ok(())
}

#[tokio::test]
async fn test_rejects_duplicates_and_unknown_ids() -> TestResult {
    let mut scheduler = SchedulerState::new(
        SchedulerConfig::default(),
        setup_store().await?,
        MockChannel::new().shared(),
    );

    let job = square_job(2, &[]);
    let id = scheduler.submit(job.clone()).await?;
    assert_eq!(scheduler.submit(job).await, Err(DrawError::DuplicateJob(id.clone())));

    let unknown = canvas_core::JobId::parse("nope").ok_or("bad id")?;
    assert_eq!(
        scheduler.cancel(CancelTarget::Job(unknown.clone())),
        Err(DrawError::JobNotFound(unknown))
    );
    assert_eq!(scheduler.list().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_slice_start_resumes_partway() -> TestResult {
    let channel = MockChannel::new();
    let mut scheduler =
        SchedulerState::new(SchedulerConfig::default(), setup_store().await?, channel.shared());

    let job = square_job(3, &["start=50", "end=100"]);
    let expected: Vec<PaintOp> = job.queue[4..].to_vec();
    let id = scheduler.submit(job).await?;
    assert_eq!(scheduler.status(&id).map(|s| s.drawn), Some(4));

    while scheduler.step().await != StepOutcome::Idle {}
    assert_eq!(channel.job_sends(&id), expected);
    Ok(())
}
