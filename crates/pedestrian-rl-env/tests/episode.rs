//! End-to-end episodes through the environment stack

use std::sync::Arc;

use approx::assert_abs_diff_eq;
use nalgebra::{Point3, Vector3};

use pedestrian_rl_core::{ContinuousAction, Environment, EpisodeRecorder, RunConfig, Terminal};
use pedestrian_rl_env::{
    Crowd, EntityKind, EntitySnapshot, KinematicAvatar, Locomotion, MarkerBoard, PedestrianAgent, PedestrianConfig,
    PedestrianEnv, TimeLimit,
};

fn idle() -> ContinuousAction {
    ContinuousAction::from([0.0, 0.0])
}

#[tokio::test]
async fn tracked_episode_walks_the_whole_route() -> anyhow::Result<()> {
    let config = RunConfig {
        seed: Some(21),
        ..RunConfig::default()
    };
    let env = PedestrianEnv::new(
        &config,
        3,
        KinematicAvatar::new(Point3::new(10.0, 0.0, 10.0)),
        Crowd::default(),
        MarkerBoard::default(),
    )?;
    let mut env = EpisodeRecorder::new(TimeLimit::new(env, 100));

    env.reset().await?;
    let mut arrivals = 0;
    let outcome = loop {
        let target = env.inner.inner.agent().route().current_target();
        env.inner.inner.agent_mut().avatar_mut().warp(target);
        let step = env.step(idle()).await?;
        if step.info.get("arrival").is_some() {
            arrivals += 1;
        }
        if step.terminal.is_terminal() {
            break step.terminal;
        }
    };

    assert_eq!(outcome, Terminal::Success);
    assert_eq!(arrivals, 3);
    let episode = env.episode().expect("episode recorded");
    assert_eq!(episode.ticks, 3);
    assert_eq!(episode.outcome, Terminal::Success);
    assert!(episode.finished_at.is_some());
    // Two waypoint bonuses on top of the success reward
    assert!(episode.total_reward > 1.0);
    Ok(())
}

#[tokio::test]
async fn straying_past_the_bounds_fails() -> anyhow::Result<()> {
    let mut env = PedestrianEnv::new(
        &RunConfig::default(),
        2,
        KinematicAvatar::new(Point3::origin()),
        Crowd::default(),
        MarkerBoard::default(),
    )?;
    env.reset().await?;
    let far = env.agent().route().current_target() + Vector3::new(16.0, 0.0, 0.0);
    env.agent_mut().avatar_mut().warp(far);

    let step = env.step(idle()).await?;
    assert_eq!(step.terminal, Terminal::Failure);
    assert_eq!(step.reward.0, -1.0);
    assert!(env.step(idle()).await.is_err());

    // A fresh episode starts from the spawn point again
    env.reset().await?;
    assert_eq!(env.agent().avatar().position(), Point3::origin());
    Ok(())
}

#[test]
fn agents_sharing_a_crowd_see_each_other() {
    let mut crowd = Crowd::default();
    crowd.insert(EntitySnapshot::facing(1, EntityKind::Pedestrian, Point3::origin(), 0.0));
    crowd.insert(EntitySnapshot::facing(2, EntityKind::Pedestrian, Point3::new(3.0, 0.0, 4.0), 90.0));
    crowd.insert(EntitySnapshot::facing(3, EntityKind::Vehicle, Point3::new(1.0, 0.0, 0.0), 0.0));
    let crowd = Arc::new(crowd);

    let mut first = PedestrianAgent::new(
        PedestrianConfig::default(),
        2,
        KinematicAvatar::new(Point3::origin()).with_entity_id(1),
        Arc::clone(&crowd),
        MarkerBoard::default(),
        Some(1),
    )
    .unwrap();
    let mut second = PedestrianAgent::new(
        PedestrianConfig::default(),
        2,
        KinematicAvatar::new(Point3::new(3.0, 0.0, 4.0)).with_entity_id(2),
        Arc::clone(&crowd),
        MarkerBoard::default(),
        Some(2),
    )
    .unwrap();

    let seen_by_first = first.reset();
    assert_abs_diff_eq!(seen_by_first.features[4], 3.0 / 50.0, epsilon = 1e-12);
    assert_abs_diff_eq!(seen_by_first.features[5], 4.0 / 50.0, epsilon = 1e-12);
    assert_abs_diff_eq!(seen_by_first.features[6], 0.25, epsilon = 1e-9);

    // Positions are relative to the second agent's own spawn point
    let seen_by_second = second.reset();
    assert_abs_diff_eq!(seen_by_second.features[4], -3.0 / 50.0, epsilon = 1e-12);
    assert_abs_diff_eq!(seen_by_second.features[5], -4.0 / 50.0, epsilon = 1e-12);
    assert_abs_diff_eq!(seen_by_second.features[6], 0.0, epsilon = 1e-9);
}

#[tokio::test]
async fn config_from_toml_drives_the_env() -> anyhow::Result<()> {
    let pedestrian = PedestrianConfig::from_toml_str(
        r#"
        [movement]
        speed = 1.0

        [reward]
        time_penalty = -0.01
        "#,
    )?;
    assert_eq!(pedestrian.sensing.radius, 25.0);

    let mut config = RunConfig {
        seed: Some(8),
        ..RunConfig::default()
    };
    config
        .params
        .insert("pedestrian".into(), serde_json::to_value(&pedestrian)?);

    let mut env = PedestrianEnv::new(
        &config,
        2,
        KinematicAvatar::new(Point3::origin()),
        Crowd::default(),
        MarkerBoard::default(),
    )?;
    env.reset().await?;
    let away = env.agent().route().current_target() + Vector3::new(4.0, 0.0, 0.0);
    env.agent_mut().avatar_mut().warp(away);
    env.agent_mut().produce_observations();

    // Sideways step keeps the distance above the arrival radius
    let step = env.step(ContinuousAction::from([0.0, 1.0])).await?;
    assert_eq!(step.terminal, Terminal::No);
    let moved = env.agent().avatar().position();
    assert_abs_diff_eq!(moved.x, away.x + 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(step.reward.0, -0.01, epsilon = 1e-12);
    Ok(())
}
