//! The simulation engine: agent registry, lifecycle state machine and
//! tick observers.
//!
//! ```text
//! Idle -> Running -> Paused -> Running -> Completed
//!                  \-> Failed
//! ```
//!
//! The engine is the only writer of simulation state. Observers registered
//! with [`Engine::register_callback`] or [`Engine::register_observer`] see
//! a read-only [`TickView`] at the start and end of every tick; an observer
//! error is logged and the tick carries on. Pause and stop requests can come
//! from any thread through the [`OperatorState`] returned by
//! [`Engine::control`] and take effect between ticks.

use std::collections::BTreeMap;
use std::sync::Arc;

use playground_agents::{Agent, AgentError, AgentSpawn};
use playground_events::EventBus;
use playground_types::{
    AgentId, AgentSnapshot, CallbackPhase, EndReason, EngineStatus, Event, EventDetails, RunId, WorldSnapshot,
};
use playground_world::{GridStats, SpatialError, SpatialGrid, WeatherSystem, World, WorldError, WorldStats};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::clock::{ClockError, SimulationClock};
use crate::config::{ConfigError, SimulationConfig};
use crate::operator::OperatorState;
use crate::tick::{self, SimulationState, TickError};

/// Errors returned by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The configuration was rejected.
    #[error("configuration error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// The world could not be built.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// The spatial index rejected an operation.
    #[error("spatial index error: {source}")]
    Spatial {
        /// The underlying grid error.
        #[from]
        source: SpatialError,
    },

    /// An agent could not be created.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },

    /// The clock could not be built.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// A tick failed. The engine is now [`EngineStatus::Failed`].
    #[error("tick failed: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },

    /// The registry is full.
    #[error("agent capacity of {max_agents} exceeded")]
    CapacityExceeded {
        /// Configured limit.
        max_agents: usize,
    },

    /// The agent id counter is exhausted.
    #[error("agent id space exhausted")]
    IdExhausted,

    /// No live agent has this id.
    #[error("agent {agent} not found")]
    AgentNotFound {
        /// The requested id.
        agent: AgentId,
    },

    /// The engine cannot run ticks in its current state.
    #[error("engine is {status:?} and cannot run")]
    NotRunnable {
        /// Current status.
        status: EngineStatus,
    },
}

/// Error returned by a tick observer. Logged by the engine, never fatal.
#[derive(Debug, thiserror::Error)]
#[error("{reason}")]
pub struct ObserverError {
    /// What went wrong.
    pub reason: String,
}

impl ObserverError {
    /// Build an error from any message.
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// Read-only view of the engine handed to observers.
#[derive(Debug, Clone, Copy)]
pub struct TickView<'a> {
    /// Tick the view belongs to.
    pub tick: u64,
    /// Where in the tick the view was taken.
    pub phase: CallbackPhase,
    /// Engine status when the view was taken.
    pub status: EngineStatus,
    /// Live agents.
    pub agents: &'a BTreeMap<AgentId, Agent>,
    /// Environment.
    pub world: &'a World,
    /// At `TickStart`, events queued since the last tick (spawns). At
    /// `TickEnd`, every event of the tick just run.
    pub events: &'a [Event],
}

/// Something that watches ticks.
pub trait TickObserver: Send {
    /// Called once per tick in each phase the observer is registered for.
    fn on_tick(&mut self, view: &TickView<'_>) -> Result<(), ObserverError>;
}

/// Adapter turning a closure into a [`TickObserver`].
struct FnObserver<F>(F);

impl<F> TickObserver for FnObserver<F>
where
    F: FnMut(&TickView<'_>) -> Result<(), ObserverError> + Send,
{
    fn on_tick(&mut self, view: &TickView<'_>) -> Result<(), ObserverError> {
        (self.0)(view)
    }
}

/// How a call to [`Engine::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Why the loop stopped.
    pub end_reason: EndReason,
    /// Ticks executed during this call.
    pub ticks_run: u64,
    /// Clock tick after the last executed tick.
    pub final_tick: u64,
    /// Live agents at the end.
    pub agents_alive: usize,
}

/// Serializable engine status for logs and summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Run correlation id.
    pub run_id: RunId,
    /// Current tick.
    pub tick: u64,
    /// Lifecycle state.
    pub status: EngineStatus,
    /// Why the run ended, once it has.
    pub end_reason: Option<EndReason>,
    /// Live agents.
    pub agents_alive: usize,
    /// Agents ever added.
    pub agents_spawned: u64,
    /// Simulated seconds.
    pub elapsed_time: f64,
    /// Configured tick budget (0 = unlimited).
    pub max_steps: u64,
    /// Wall-clock seconds since the engine was built.
    pub wall_seconds: u64,
    /// ISO 8601 start time.
    pub started_at: String,
}

type ObserverSlot = (CallbackPhase, Box<dyn TickObserver>);

/// Owns all simulation state and drives it one tick at a time.
pub struct Engine {
    run_id: RunId,
    state: SimulationState,
    status: EngineStatus,
    end_reason: Option<EndReason>,
    operator: Arc<OperatorState>,
    observers: Vec<ObserverSlot>,
    next_agent_id: AgentId,
    agents_spawned: u64,
}

impl core::fmt::Debug for Engine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Engine")
            .field("run_id", &self.run_id)
            .field("tick", &self.state.clock.tick())
            .field("status", &self.status)
            .field("agents", &self.state.agents.len())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Validate `config` and build an idle engine with an empty world.
    ///
    /// Obstacles and resources are added afterwards through
    /// [`world_mut`](Self::world_mut).
    pub fn new(config: SimulationConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let weather = WeatherSystem::new(config.engine.seed, config.weather);
        let world = World::new(config.world.width, config.world.height, config.world.cell_size, weather)?;
        let grid = SpatialGrid::new(config.world.cell_size)?;
        let clock = SimulationClock::new(config.engine.time_step)?;
        let operator = Arc::new(OperatorState::new(config.engine.max_steps));
        let run_id = RunId::new();

        info!(
            %run_id,
            width = config.world.width,
            height = config.world.height,
            time_step = config.engine.time_step,
            max_steps = config.engine.max_steps,
            seed = config.engine.seed,
            "Engine created"
        );

        Ok(Self {
            run_id,
            state: SimulationState {
                clock,
                world,
                grid,
                agents: BTreeMap::new(),
                bus: EventBus::new(),
                config,
            },
            status: EngineStatus::Idle,
            end_reason: None,
            operator,
            observers: Vec::new(),
            next_agent_id: AgentId::FIRST,
            agents_spawned: 0,
        })
    }

    // -----------------------------------------------------------------------
    // Registry
    // -----------------------------------------------------------------------

    /// Add an agent. The position is clamped into the world.
    ///
    /// A `Spawn` event is queued and returned by the next [`step`](Self::step).
    pub fn add_agent(&mut self, spawn: AgentSpawn) -> Result<AgentId, EngineError> {
        if self.status.is_terminal() {
            return Err(EngineError::NotRunnable { status: self.status });
        }
        let max_agents = self.state.config.engine.max_agents;
        if self.state.agents.len() >= max_agents {
            warn!(max_agents, "Agent rejected, registry full");
            return Err(EngineError::CapacityExceeded { max_agents });
        }

        let spawn = AgentSpawn {
            position: self.state.world.clamp(spawn.position),
            ..spawn
        };
        let id = self.next_agent_id;
        let agent = Agent::new(id, &spawn, &self.state.config.agents)?;
        self.next_agent_id = id.next().ok_or(EngineError::IdExhausted)?;
        self.state.grid.insert(id, agent.position)?;

        let tick = self.state.clock.tick();
        debug!(tick, agent_id = %id, kind = %agent.kind, "Agent spawned");
        self.state.bus.publish(Event::new(
            tick,
            vec![id],
            EventDetails::Spawn {
                agent_kind: agent.kind,
                position: agent.position,
                energy: agent.energy,
            },
        ));
        self.state.agents.insert(id, agent);
        self.agents_spawned = self.agents_spawned.saturating_add(1);
        Ok(id)
    }

    /// Remove a live agent without a death event.
    pub fn remove_agent(&mut self, id: AgentId) -> Result<Agent, EngineError> {
        let agent = self
            .state
            .agents
            .remove(&id)
            .ok_or(EngineError::AgentNotFound { agent: id })?;
        self.state.grid.remove(id)?;
        debug!(agent_id = %id, "Agent removed");
        Ok(agent)
    }

    // -----------------------------------------------------------------------
    // Observers
    // -----------------------------------------------------------------------

    /// Register a closure to run at `phase` of every tick.
    pub fn register_callback<F>(&mut self, phase: CallbackPhase, callback: F)
    where
        F: FnMut(&TickView<'_>) -> Result<(), ObserverError> + Send + 'static,
    {
        self.observers.push((phase, Box::new(FnObserver(callback))));
    }

    /// Register an observer to run at `phase` of every tick.
    pub fn register_observer(&mut self, phase: CallbackPhase, observer: Box<dyn TickObserver>) {
        self.observers.push((phase, observer));
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Run one tick and return its events.
    ///
    /// An idle engine starts running. A pending stop request completes the
    /// run with [`EndReason::Cancelled`] and returns no events.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotRunnable`] if the engine is paused, completed or
    /// failed. [`EngineError::Tick`] if the tick failed, after which the
    /// engine is [`EngineStatus::Failed`].
    pub fn step(&mut self) -> Result<Vec<Event>, EngineError> {
        self.begin()?;
        if self.operator.is_stop_requested() {
            self.complete(EndReason::Cancelled);
            return Ok(Vec::new());
        }

        let tick = self.state.clock.tick();
        notify(
            &mut self.observers,
            &TickView {
                tick,
                phase: CallbackPhase::TickStart,
                status: self.status,
                agents: &self.state.agents,
                world: &self.state.world,
                events: self.state.bus.pending(),
            },
        );

        let report = match tick::run_tick(&mut self.state) {
            Ok(report) => report,
            Err(err) => {
                error!(tick, error = %err, "Tick failed, engine stopped");
                self.status = EngineStatus::Failed;
                return Err(err.into());
            }
        };

        notify(
            &mut self.observers,
            &TickView {
                tick,
                phase: CallbackPhase::TickEnd,
                status: self.status,
                agents: &self.state.agents,
                world: &self.state.world,
                events: &report.events,
            },
        );

        if self.state.agents.is_empty() && self.state.config.engine.stop_on_extinction {
            info!(tick, "All agents dead, extinction");
            self.complete(EndReason::Extinction);
        } else if self.operator.step_limit_reached(self.state.clock.tick()) {
            info!(tick, max_steps = self.operator.max_steps(), "Step limit reached");
            self.complete(EndReason::StepLimit);
        }

        Ok(report.events)
    }

    /// Run ticks until the step limit, extinction, a stop request or a pause.
    ///
    /// With `max_steps` at 0 and extinction stops disabled, only an operator
    /// request ends the loop.
    pub fn run(&mut self) -> Result<RunOutcome, EngineError> {
        self.begin()?;
        info!(
            run_id = %self.run_id,
            tick = self.state.clock.tick(),
            agents = self.state.agents.len(),
            "Simulation running"
        );

        let mut ticks_run: u64 = 0;
        loop {
            let tick_before = self.state.clock.tick();
            // The pause check lives in `step` so a request can never slip
            // between a check here and the tick itself.
            match self.step() {
                Ok(_) => {}
                Err(EngineError::NotRunnable {
                    status: EngineStatus::Paused,
                }) => return Ok(self.outcome(EndReason::Paused, ticks_run)),
                Err(err) => return Err(err),
            }
            if self.state.clock.tick() != tick_before {
                ticks_run = ticks_run.saturating_add(1);
            }
            if let Some(reason) = self.end_reason {
                info!(run_id = %self.run_id, reason = ?reason, ticks_run, "Simulation ended");
                return Ok(self.outcome(reason, ticks_run));
            }
        }
    }

    /// Pause between ticks. An idle engine is paused before it starts.
    pub fn pause(&mut self) {
        self.operator.pause();
        self.sync_operator();
    }

    /// Resume a paused engine.
    pub fn resume(&mut self) {
        self.operator.resume();
        self.sync_operator();
    }

    /// Stop the run. The engine completes with [`EndReason::Cancelled`].
    pub fn cancel(&mut self) {
        self.operator.request_stop();
        if !self.status.is_terminal() {
            self.complete(EndReason::Cancelled);
        }
    }

    /// Shared pause/stop handle usable from other threads.
    pub fn control(&self) -> Arc<OperatorState> {
        Arc::clone(&self.operator)
    }

    /// Apply pause or resume requests made through [`control`](Self::control).
    fn sync_operator(&mut self) {
        match self.status {
            EngineStatus::Idle | EngineStatus::Running if self.operator.is_paused() => {
                info!(tick = self.state.clock.tick(), "Simulation paused");
                self.status = EngineStatus::Paused;
            }
            EngineStatus::Paused if !self.operator.is_paused() => {
                info!(tick = self.state.clock.tick(), "Simulation resumed");
                self.status = EngineStatus::Running;
            }
            _ => {}
        }
    }

    /// Move into `Running` or explain why that is impossible.
    fn begin(&mut self) -> Result<(), EngineError> {
        self.sync_operator();
        match self.status {
            EngineStatus::Idle => {
                info!(run_id = %self.run_id, agents = self.state.agents.len(), "Simulation starting");
                self.status = EngineStatus::Running;
                Ok(())
            }
            EngineStatus::Running => Ok(()),
            status @ (EngineStatus::Paused | EngineStatus::Completed | EngineStatus::Failed) => {
                Err(EngineError::NotRunnable { status })
            }
        }
    }

    const fn complete(&mut self, reason: EndReason) {
        self.status = EngineStatus::Completed;
        self.end_reason = Some(reason);
    }

    fn outcome(&self, end_reason: EndReason, ticks_run: u64) -> RunOutcome {
        RunOutcome {
            end_reason,
            ticks_run,
            final_tick: self.state.clock.tick(),
            agents_alive: self.state.agents.len(),
        }
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    /// Snapshot of the environment.
    pub fn world(&self) -> WorldSnapshot {
        self.state.world.snapshot(self.state.clock.tick(), self.state.clock.elapsed())
    }

    /// Direct access to the environment, for setup.
    pub const fn world_mut(&mut self) -> &mut World {
        &mut self.state.world
    }

    /// Snapshots of all live agents, ascending by id.
    pub fn agents(&self) -> Vec<AgentSnapshot> {
        self.state.agents.values().map(Agent::snapshot).collect()
    }

    /// Snapshot of one live agent.
    pub fn agent(&self, id: AgentId) -> Option<AgentSnapshot> {
        self.state.agents.get(&id).map(Agent::snapshot)
    }

    /// Number of live agents.
    pub fn agent_count(&self) -> usize {
        self.state.agents.len()
    }

    /// Ticks completed so far.
    pub const fn tick(&self) -> u64 {
        self.state.clock.tick()
    }

    /// Lifecycle state.
    pub const fn status(&self) -> EngineStatus {
        self.status
    }

    /// Why the run ended, once it has.
    pub const fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    /// Simulated seconds elapsed.
    pub fn elapsed_time(&self) -> f64 {
        self.state.clock.elapsed()
    }

    /// Run correlation id.
    pub const fn run_id(&self) -> RunId {
        self.run_id
    }

    /// The validated configuration.
    pub const fn config(&self) -> &SimulationConfig {
        &self.state.config
    }

    /// Spatial index occupancy.
    pub fn grid_stats(&self) -> GridStats {
        self.state.grid.stats()
    }

    /// Obstacle and resource totals.
    pub fn world_stats(&self) -> WorldStats {
        self.state.world.stats()
    }

    /// Check the spatial index and agent invariants without running a tick.
    pub fn verify(&self) -> Result<(), EngineError> {
        Ok(self.state.verify()?)
    }

    /// Serializable summary of the engine.
    pub fn status_report(&self) -> StatusReport {
        StatusReport {
            run_id: self.run_id,
            tick: self.state.clock.tick(),
            status: self.status,
            end_reason: self.end_reason,
            agents_alive: self.state.agents.len(),
            agents_spawned: self.agents_spawned,
            elapsed_time: self.state.clock.elapsed(),
            max_steps: self.operator.max_steps(),
            wall_seconds: self.operator.elapsed_seconds(),
            started_at: self.operator.started_at().to_rfc3339(),
        }
    }
}

/// Call every observer registered for the view's phase, logging failures.
fn notify(observers: &mut [ObserverSlot], view: &TickView<'_>) {
    for (phase, observer) in observers.iter_mut() {
        if *phase != view.phase {
            continue;
        }
        if let Err(err) = observer.on_tick(view) {
            warn!(tick = view.tick, phase = ?view.phase, error = %err, "Tick observer failed");
        }
    }
}
