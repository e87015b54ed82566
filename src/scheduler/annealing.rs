//! Simulated-annealing scheduler driving a `Plan` toward the target staffing
//! curve (spec.md §4.6, §4.7), built directly on `Plan::swap_agent`/`revert`
//! and `Energy::apply_swap`/`apply_revert`.

use crate::coverage::target::Target;
use crate::energy::{ComfortPenalty, Energy, ShiftChangeComfort};
use crate::error::{PlannerError, Result};
use crate::fsm::compiler::Dfa;
use crate::fsm::sampler::Sampler;
use crate::model::rule::ShiftRule;
use crate::model::shift::Shift;
use crate::plan::Plan;
use crate::random::{RandomSource, StdRandomSource};
use crate::scheduler::report::{RecordKind, Report};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag, checked between annealing proposals
/// (spec.md §5). Cloning shares the same underlying flag.
#[derive(Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        AbortFlag(Arc::new(AtomicBool::new(false)))
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Annealing tunables (spec.md §4.6). The defaults are deliberately modest;
/// callers tune `max_iterations`/`epoch_length` to the size of their horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnealingConfig {
    /// Geometric cooling factor applied once per epoch, `0 < cooling < 1`.
    pub cooling: f64,
    /// Weight `w` in `E = E_cov + w * E_comfort`.
    pub comfort_weight: f64,
    pub seed: u64,
    /// Stop once the temperature drops below this.
    pub t_min: f64,
    pub max_iterations: u64,
    /// Stop after this many consecutive epochs with no improvement to the
    /// best-seen energy.
    pub stagnation_epochs: u32,
    /// Number of proposals per cooling epoch.
    pub epoch_length: usize,
    /// Number of calibration proposals used to estimate the initial
    /// temperature (spec §4.6: "median absolute single-agent swap delta
    /// observed over a short calibration batch").
    pub calibration_batch: usize,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        AnnealingConfig {
            cooling: 0.9,
            comfort_weight: 0.2,
            seed: 0,
            t_min: 1e-3,
            max_iterations: 10_000,
            stagnation_epochs: 20,
            epoch_length: 50,
            calibration_batch: 30,
        }
    }
}

impl AnnealingConfig {
    /// Loads annealing tunables from a YAML file, falling back to
    /// `AnnealingConfig::default()` (logged at `warn!`) if the file is
    /// missing or malformed. Mirrors the teacher's `load_priority_yaml`
    /// fallback-to-default shape (`scheduler/sorting.rs`).
    pub fn load_from_yaml(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str::<AnnealingConfig>(&contents) {
                Ok(config) => {
                    log::info!("loaded annealing configuration from {}", path);
                    config
                }
                Err(err) => {
                    log::warn!("could not parse annealing configuration file '{}': {}, using defaults", path, err);
                    AnnealingConfig::default()
                }
            },
            Err(_) => {
                log::warn!("annealing configuration file '{}' not found, using defaults", path);
                AnnealingConfig::default()
            }
        }
    }
}

/// Explicit lifecycle of a `Scheduler`, matching spec §4.6's state machine.
/// Every accessor beyond `new` requires the preceding state; calling one out
/// of order is a programmer error reported as `PlannerError::Internal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Built,
    Initialised,
    Running,
    Cooling,
    Done,
    Failed,
}

/// Drives a `Plan` through simulated annealing against a `Target`, proposing
/// one resampled agent assignment at a time via each agent's compiled
/// `Sampler` and accepting/rejecting by the Metropolis criterion.
pub struct Scheduler {
    state: SchedulerState,
    config: AnnealingConfig,
    target: Arc<Target>,
    horizon_days: usize,
    samplers: IndexMap<String, Sampler>,
    lens: IndexMap<String, usize>,
    comfort: Box<dyn ComfortPenalty>,
    rng: Box<dyn RandomSource>,
    plan: Option<Plan>,
    energy: Option<Energy>,
    temperature: f64,
    iteration: u64,
    stagnant_epochs: u32,
    best_energy: f64,
    best_assignments: IndexMap<String, Vec<Rc<Shift>>>,
    report: Report,
    abort: AbortFlag,
}

impl Scheduler {
    /// Compiles every agent's rule into a `Dfa` + `Sampler`, sized to that
    /// agent's own horizon (`horizon_days + rule.offset_days()`), per spec
    /// §4.5's cross-midnight tail handling.
    pub fn new(rules: &IndexMap<String, ShiftRule>, target: Arc<Target>, config: AnnealingConfig, abort: AbortFlag) -> Self {
        let horizon_days = target.days as usize;
        let mut samplers = IndexMap::new();
        let mut lens = IndexMap::new();
        for (agent, rule) in rules {
            let len = horizon_days + rule.offset_days() as usize;
            let dfa = Dfa::compile(rule);
            samplers.insert(agent.clone(), Sampler::new(dfa, len));
            lens.insert(agent.clone(), len);
        }
        Scheduler {
            state: SchedulerState::Built,
            rng: Box::new(StdRandomSource::seeded(config.seed)),
            comfort: Box::new(ShiftChangeComfort),
            config,
            target,
            horizon_days,
            samplers,
            lens,
            plan: None,
            energy: None,
            temperature: 1.0,
            iteration: 0,
            stagnant_epochs: 0,
            best_energy: f64::INFINITY,
            best_assignments: IndexMap::new(),
            report: Report::new(),
            abort,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Samples every agent's initial assignment, builds the starting `Plan`
    /// and `Energy`, and calibrates the initial temperature. On an
    /// `UnsatisfiableRule` error the scheduler transitions to `Failed`.
    pub fn initialise(&mut self) -> Result<()> {
        if self.state != SchedulerState::Built {
            return Err(PlannerError::Internal("initialise called outside state Built".to_string()));
        }

        let mut plan = Plan::new(self.target.clone(), self.horizon_days);
        for (agent, sampler) in &self.samplers {
            let len = *self.lens.get(agent).expect("lens tracks every sampler agent");
            match sampler.sample(self.rng.as_mut(), len, agent) {
                Ok(assignment) => plan.insert_initial(agent.clone(), assignment),
                Err(err) => {
                    log::error!("initial sampling failed for agent '{}': {}", agent, err);
                    self.state = SchedulerState::Failed;
                    return Err(err);
                }
            }
        }

        let energy = Energy::from_scratch(&plan, self.comfort.as_ref(), self.config.comfort_weight);
        self.best_energy = energy.total();
        self.best_assignments = plan.snapshot();
        self.report.push(0, 0.0, energy.total(), RecordKind::Init);

        self.plan = Some(plan);
        self.energy = Some(energy);
        self.state = SchedulerState::Initialised;

        self.temperature = self.calibrate_temperature();
        log::info!("annealing calibrated initial temperature to {:.6}", self.temperature);
        Ok(())
    }

    /// Runs a short batch of trial single-agent resamples, always reverted,
    /// and returns the median absolute energy delta observed. Falls back to
    /// `1.0` (logged at `warn!`) if every trial delta was zero, e.g. a
    /// single-agent horizon with no feasible alternative assignment.
    fn calibrate_temperature(&mut self) -> f64 {
        let mut deltas = Vec::with_capacity(self.config.calibration_batch);
        for _ in 0..self.config.calibration_batch {
            if let Some(delta) = self.trial_delta() {
                deltas.push(delta.abs());
            }
        }
        if deltas.is_empty() {
            log::warn!("calibration batch produced no usable deltas; falling back to T0 = 1.0");
            return 1.0;
        }
        deltas.sort_by(|a, b| a.partial_cmp(b).expect("energy deltas are always finite"));
        let mid = deltas.len() / 2;
        if deltas.len() % 2 == 0 {
            (deltas[mid - 1] + deltas[mid]) / 2.0
        } else {
            deltas[mid]
        }
    }

    /// Proposes one random agent resample, measures the energy delta, then
    /// unconditionally reverts. Returns `None` if there are no agents to
    /// sample or the sampler failed (which should not happen for an agent
    /// already present in an initialised plan).
    fn trial_delta(&mut self) -> Option<f64> {
        let (agent, new_assignment) = self.propose_assignment()?;
        let plan = self.plan.as_mut().expect("trial_delta called after initialise");
        let target_before = plan.get_target_staffing().to_vec();
        let old_total = self.energy.as_ref().expect("trial_delta called after initialise").total();

        let handle = plan.swap_agent(&agent, new_assignment.clone());
        let energy = self.energy.as_mut().expect("trial_delta called after initialise");
        energy.apply_swap(&handle, &new_assignment, &target_before, self.comfort.as_ref());
        let new_total = energy.total();

        energy.apply_revert(&handle, &handle.previous.clone(), &target_before, self.comfort.as_ref());
        let plan = self.plan.as_mut().expect("trial_delta called after initialise");
        plan.revert(handle);

        Some(new_total - old_total)
    }

    /// Picks a uniformly random registered agent and draws a fresh sample
    /// from its compiled sampler.
    fn propose_assignment(&mut self) -> Option<(String, Vec<Rc<Shift>>)> {
        let agent_count = self.samplers.len();
        if agent_count == 0 {
            return None;
        }
        let idx = ((self.rng.next_f64() * agent_count as f64) as usize).min(agent_count - 1);
        let (agent, sampler) = self.samplers.get_index(idx).expect("idx is in range");
        let agent = agent.clone();
        let len = *self.lens.get(&agent).expect("lens tracks every sampler agent");
        match sampler.sample(self.rng.as_mut(), len, &agent) {
            Ok(assignment) => Some((agent, assignment)),
            Err(err) => {
                log::warn!("proposal sampling failed for agent '{}': {}", agent, err);
                None
            }
        }
    }

    /// Runs the annealing loop to completion: epochs of `epoch_length`
    /// Metropolis proposals, cooling geometrically between epochs, until the
    /// temperature floor, iteration budget, stagnation limit, or a
    /// cooperative abort is reached.
    pub fn run(&mut self) -> Result<()> {
        if self.state != SchedulerState::Initialised {
            return Err(PlannerError::Internal("run called outside state Initialised".to_string()));
        }
        self.state = SchedulerState::Running;

        loop {
            if self.abort.is_aborted() {
                log::info!("annealing aborted at iteration {}", self.iteration);
                self.report.cancelled = true;
                break;
            }
            if self.temperature < self.config.t_min {
                log::info!("annealing stopped: temperature below floor at iteration {}", self.iteration);
                break;
            }
            if self.iteration >= self.config.max_iterations {
                log::info!("annealing stopped: iteration budget exhausted");
                break;
            }
            if self.stagnant_epochs >= self.config.stagnation_epochs {
                log::info!("annealing stopped: {} stagnant epochs", self.stagnant_epochs);
                break;
            }

            let improved = self.run_epoch();

            self.state = SchedulerState::Cooling;
            self.temperature *= self.config.cooling;
            self.report.push(self.iteration, self.temperature, self.current_energy(), RecordKind::Cool);
            if improved {
                self.stagnant_epochs = 0;
            } else {
                self.stagnant_epochs += 1;
            }
            self.state = SchedulerState::Running;
        }

        self.finalise();
        Ok(())
    }

    fn current_energy(&self) -> f64 {
        self.energy.as_ref().map(|e| e.total()).unwrap_or(self.best_energy)
    }

    /// Runs one epoch of proposals. Returns whether the best-seen energy
    /// improved during this epoch.
    fn run_epoch(&mut self) -> bool {
        let mut improved = false;
        for _ in 0..self.config.epoch_length {
            if self.abort.is_aborted() {
                break;
            }
            self.iteration += 1;
            if self.propose_and_decide() {
                improved = true;
            }
        }
        improved
    }

    /// One Metropolis step: propose, measure, accept or reject. Returns
    /// whether this step improved the best-seen energy.
    fn propose_and_decide(&mut self) -> bool {
        let Some((agent, new_assignment)) = self.propose_assignment() else {
            return false;
        };

        let plan = self.plan.as_mut().expect("propose_and_decide called after initialise");
        let target_before = plan.get_target_staffing().to_vec();
        let old_total = self.energy.as_ref().expect("propose_and_decide called after initialise").total();

        let handle = plan.swap_agent(&agent, new_assignment.clone());
        let energy = self.energy.as_mut().expect("propose_and_decide called after initialise");
        energy.apply_swap(&handle, &new_assignment, &target_before, self.comfort.as_ref());
        let new_total = energy.total();
        let delta = new_total - old_total;

        let accept = delta <= 0.0 || self.rng.next_f64() < (-delta / self.temperature).exp();
        if accept {
            let improved = new_total < self.best_energy;
            if improved {
                self.best_energy = new_total;
                self.best_assignments = self.plan.as_ref().expect("plan present after initialise").snapshot();
            }
            self.report.push(self.iteration, self.temperature, new_total, RecordKind::Accept);
            improved
        } else {
            let energy = self.energy.as_mut().expect("propose_and_decide called after initialise");
            energy.apply_revert(&handle, &handle.previous.clone(), &target_before, self.comfort.as_ref());
            let plan = self.plan.as_mut().expect("propose_and_decide called after initialise");
            plan.revert(handle);
            false
        }
    }

    /// Restores the best-seen plan if the run ended somewhere worse, and
    /// records the terminal report entry (spec §8 invariant 5: final energy
    /// never exceeds the best observed, which never exceeds the initial).
    fn finalise(&mut self) {
        if self.current_energy() > self.best_energy {
            if let Some(plan) = self.plan.as_mut() {
                plan.restore_snapshot(self.best_assignments.clone());
                self.energy = Some(Energy::from_scratch(plan, self.comfort.as_ref(), self.config.comfort_weight));
            }
        }
        self.report.push(self.iteration, self.temperature, self.best_energy, RecordKind::Done);
        self.state = SchedulerState::Done;
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    pub fn best_energy(&self) -> f64 {
        self.best_energy
    }
}
