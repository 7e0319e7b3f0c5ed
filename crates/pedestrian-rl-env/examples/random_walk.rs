//! Example: noisy goal-seeking walker in a small crowd

use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::SeedableRng;

use pedestrian_rl_core::{ActionSpace, ContinuousAction, Environment, EpisodeRecorder, RunConfig};
use pedestrian_rl_env::{Crowd, EntityKind, EntitySnapshot, KinematicAvatar, MarkerBoard, PedestrianEnv, TimeLimit};

/// Blend of the heading to the target and uniform noise
fn act(features: &[f64], noise: &ContinuousAction) -> ContinuousAction {
    let forward = features[3] - features[1];
    let lateral = features[2] - features[0];
    ContinuousAction(vec![forward + 0.02 * noise.0[0], lateral + 0.02 * noise.0[1]])
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let mut crowd = Crowd::default();
    for (id, (x, z, heading)) in [(3.0, 2.0, 90.0), (-4.0, 6.0, 180.0), (8.0, -5.0, 270.0)].into_iter().enumerate() {
        crowd.insert(EntitySnapshot::facing(id as u64 + 1, EntityKind::Pedestrian, Point3::new(x, 0.0, z), heading));
    }

    let config = RunConfig {
        seed: Some(7),
        step_limit: Some(400),
        ..RunConfig::default()
    };
    let env = PedestrianEnv::new(&config, 4, KinematicAvatar::new(Point3::origin()), crowd, MarkerBoard::default())?;
    let env = TimeLimit::new(env, config.step_limit.unwrap_or(400));
    let mut env = EpisodeRecorder::new(env);

    let action_space = env.action_space();
    let mut rng = StdRng::seed_from_u64(7);

    for episode in 0..5 {
        let (mut observation, _info) = env.reset().await?;
        loop {
            let noise = action_space.sample(&mut rng);
            let step = env.step(act(&observation.features, &noise)).await?;
            if step.terminal.is_terminal() {
                break;
            }
            observation = step.observation;
        }

        if let Some(info) = env.episode() {
            println!(
                "Episode {}: outcome = {:?}, ticks = {}, reward = {:.4}",
                episode + 1,
                info.outcome,
                info.ticks,
                info.total_reward
            );
        }
    }

    let successes = env.finished.iter().filter(|e| e.outcome.is_done()).count();
    println!("\nArchived {} episodes, {} ended without truncation", env.finished.len(), successes);
    Ok(())
}
