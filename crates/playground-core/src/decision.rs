//! The decide phase: every live agent picks an action.
//!
//! All actions are collected before any is applied. Each agent draws from
//! its own RNG stream seeded from `(seed, tick, agent_id)` and touches only
//! its own behavior state and memory, so the result does not depend on the
//! order agents are evaluated in. With the `parallel` feature and
//! `engine.run_parallel` set, agents decide on the rayon pool.
//!
//! A behavior that fails, or returns an action that cannot be applied, does
//! not stop the tick. The agent gets [`Action::idle`] instead and the fault
//! is reported back to the pipeline, which publishes a `BehaviorFault`
//! event.

use std::collections::BTreeMap;

use playground_agents::{Agent, AgentsConfig, MemoryEvent};
use playground_types::{Action, AgentId, Observation};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::warn;

/// What the decide phase produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decisions {
    /// One action per agent that was asked.
    pub actions: BTreeMap<AgentId, Action>,
    /// Agents whose behavior failed, with the reason, ascending by id.
    pub faults: Vec<(AgentId, String)>,
}

/// Seed of the RNG stream for one agent in one tick.
pub const fn stream_seed(seed: u64, tick: u64, agent: AgentId) -> u64 {
    let mut z = seed
        ^ tick.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ agent.into_inner().wrapping_mul(0xD1B5_4A32_D192_ED03);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Ask one agent for its action.
///
/// Returns the action to apply and, if the behavior failed, the reason.
/// A failure is also written to the agent's memory.
pub fn resolve_decision(
    agent: &mut Agent,
    observation: &Observation,
    config: &AgentsConfig,
    seed: u64,
) -> (Action, Option<String>) {
    let tick = observation.tick;
    let profile = config.profile(agent.kind);
    let mut rng = ChaCha8Rng::seed_from_u64(stream_seed(seed, tick, agent.id));
    match agent
        .behavior
        .decide(observation, profile, &mut agent.memory, &mut rng)
    {
        Ok(action) => (action, None),
        Err(err) => {
            let reason = err.to_string();
            warn!(tick, agent_id = %agent.id, error = %reason, "Behavior fault, substituting no-op");
            agent.memory.record(tick, MemoryEvent::Fault { reason: reason.clone() });
            (Action::idle(), Some(reason))
        }
    }
}

/// Collect an action from every agent that has an observation.
pub fn decide_all(
    agents: &mut BTreeMap<AgentId, Agent>,
    observations: &BTreeMap<AgentId, Observation>,
    config: &AgentsConfig,
    seed: u64,
    parallel: bool,
) -> Decisions {
    let results = if parallel {
        decide_parallel(agents, observations, config, seed)
    } else {
        decide_sequential(agents, observations, config, seed)
    };

    let mut decisions = Decisions::default();
    for (id, action, fault) in results {
        decisions.actions.insert(id, action);
        if let Some(reason) = fault {
            decisions.faults.push((id, reason));
        }
    }
    decisions.faults.sort_by_key(|(id, _)| *id);
    decisions
}

/// Per-agent decide result.
type Outcome = (AgentId, Action, Option<String>);

fn decide_sequential(
    agents: &mut BTreeMap<AgentId, Agent>,
    observations: &BTreeMap<AgentId, Observation>,
    config: &AgentsConfig,
    seed: u64,
) -> Vec<Outcome> {
    agents
        .iter_mut()
        .filter_map(|(id, agent)| {
            let obs = observations.get(id)?;
            let (action, fault) = resolve_decision(agent, obs, config, seed);
            Some((*id, action, fault))
        })
        .collect()
}

#[cfg(feature = "parallel")]
fn decide_parallel(
    agents: &mut BTreeMap<AgentId, Agent>,
    observations: &BTreeMap<AgentId, Observation>,
    config: &AgentsConfig,
    seed: u64,
) -> Vec<Outcome> {
    use rayon::prelude::*;

    agents
        .par_iter_mut()
        .filter_map(|(id, agent)| {
            let obs = observations.get(id)?;
            let (action, fault) = resolve_decision(agent, obs, config, seed);
            Some((*id, action, fault))
        })
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn decide_parallel(
    agents: &mut BTreeMap<AgentId, Agent>,
    observations: &BTreeMap<AgentId, Observation>,
    config: &AgentsConfig,
    seed: u64,
) -> Vec<Outcome> {
    tracing::debug!("parallel decide requested without the `parallel` feature, running sequentially");
    decide_sequential(agents, observations, config, seed)
}
