/*!

The simulation driver.

[`run`] takes a population, a run configuration, an [`EventPipeline`], and a parameter snapshot,
and steps every living person through the pipeline once per cycle:

1. `Person::advance_cycle` (age and timers),
2. each event in pipeline order, with its effect booked by the [`Accountant`] before the next
   event runs, stopping early if the person dies,
3. `Accountant::close_cycle` (one cycle of utility and life span),
4. an invariant check.

People never interact, so each cycle's work can be spread across threads (`parallel`). Every
person draws from their own [`Sampler`] stream, and results are identical either way.

A missing parameter row or an invariant violation aborts the whole run.

*/

use crate::{
    PersonId,
    accounting::{Accountant, Discounting},
    context::{Context, DataPlugin},
    error::HepceError,
    events::{CycleEffect, Event, EventPipeline, Transition},
    log::{debug, info, trace},
    parameters::{ContextParametersExt, Parameters},
    people::{CYCLES_PER_YEAR, ContextPeopleExtInternal, Person},
    random::{ContextRandomExt, Sampler},
    state::{Behavior, DeathReason, FibrosisState, Hcv, Hiv, Moud, UtilityMode},
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Base seed for the per-person random streams. A random seed is chosen (and logged) when
    /// absent.
    pub seed: Option<u64>,
    /// Number of cycles to simulate.
    pub cycles: u32,
    pub cycles_per_year: u32,
    pub annual_discount_rate: f64,
    pub utility_mode: UtilityMode,
    /// Record a trace entry for every event that charged a cost or changed state.
    pub trace: bool,
    pub parallel: bool,
    /// Run only these events (still in the standard order). All events run when absent.
    pub events: Option<Vec<Event>>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            seed: None,
            cycles: 0,
            cycles_per_year: CYCLES_PER_YEAR,
            annual_discount_rate: 0.0,
            utility_mode: UtilityMode::Mult,
            trace: false,
            parallel: false,
            events: None,
        }
    }
}

impl SimulationConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, HepceError> {
        let path = path.as_ref();
        debug!("loading simulation configuration from {}", path.display());
        let config: SimulationConfig = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), HepceError> {
        if self.cycles == 0 {
            return Err(HepceError::invalid_config("the cycle count must be positive"));
        }
        self.discounting().map(|_| ())
    }

    pub fn discounting(&self) -> Result<Discounting, HepceError> {
        Discounting::new(self.annual_discount_rate, self.cycles_per_year)
    }

    #[must_use]
    pub fn pipeline(&self) -> EventPipeline {
        match &self.events {
            Some(events) => EventPipeline::from_events(events),
            None => EventPipeline::standard(),
        }
    }
}

/// One traced event.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TraceRecord {
    pub cycle: u32,
    pub person: PersonId,
    pub event: Event,
    pub cost: f64,
    pub transitions: Vec<Transition>,
}

impl TraceRecord {
    fn new(person: &Person, event: Event, effect: &CycleEffect) -> Self {
        TraceRecord {
            cycle: person.current_cycle(),
            person: person.id(),
            event,
            cost: effect.total_cost(),
            transitions: effect.transitions().to_vec(),
        }
    }
}

/// A person's final state and lifetime totals.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PersonOutcome {
    pub person: PersonId,
    pub alive: bool,
    pub death_reason: DeathReason,
    pub death_cycle: Option<u32>,
    pub age: u32,
    pub behavior: Behavior,
    pub moud: Moud,
    pub hcv: Hcv,
    pub fibrosis_state: FibrosisState,
    pub hiv: Hiv,
    pub cost: f64,
    pub discounted_cost: f64,
    /// Lifetime utility under the run's combination mode.
    pub utility: f64,
    pub discounted_utility: f64,
    pub life_span: u32,
    pub discounted_life_span: f64,
}

impl PersonOutcome {
    #[must_use]
    pub fn of(person: &Person, mode: UtilityMode) -> Self {
        let accounts = person.accounts();
        PersonOutcome {
            person: person.id(),
            alive: person.is_alive(),
            death_reason: person.death_reason(),
            death_cycle: person.death_cycle(),
            age: person.age(),
            behavior: person.behavior(),
            moud: person.moud(),
            hcv: person.hcv(),
            fibrosis_state: person.fibrosis_state(),
            hiv: person.hiv(),
            cost: accounts.costs.total(),
            discounted_cost: accounts.costs.discounted_total(),
            utility: accounts.lifetime_utility.selected(mode),
            discounted_utility: accounts.lifetime_utility.discounted(mode),
            life_span: accounts.life_span,
            discounted_life_span: accounts.discounted_life_span,
        }
    }
}

/// Population sums. `merge` is associative and commutative, so totals can be folded in any
/// grouping.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct OutcomeTotals {
    pub population: usize,
    pub deaths: [usize; DeathReason::COUNT],
    pub cost: f64,
    pub discounted_cost: f64,
    pub min_utility: f64,
    pub mult_utility: f64,
    pub discounted_min_utility: f64,
    pub discounted_mult_utility: f64,
    /// Cycles lived, summed over people.
    pub life_span: u64,
    pub discounted_life_span: f64,
}

impl OutcomeTotals {
    #[must_use]
    pub fn of(person: &Person) -> Self {
        let accounts = person.accounts();
        let lifetime = &accounts.lifetime_utility;
        let mut deaths = [0; DeathReason::COUNT];
        if !person.is_alive() {
            deaths[person.death_reason().index()] = 1;
        }
        OutcomeTotals {
            population: 1,
            deaths,
            cost: accounts.costs.total(),
            discounted_cost: accounts.costs.discounted_total(),
            min_utility: lifetime.min_utility,
            mult_utility: lifetime.mult_utility,
            discounted_min_utility: lifetime.discounted_min_utility,
            discounted_mult_utility: lifetime.discounted_mult_utility,
            life_span: u64::from(accounts.life_span),
            discounted_life_span: accounts.discounted_life_span,
        }
    }

    #[must_use]
    pub fn merge(mut self, other: &OutcomeTotals) -> Self {
        self.population += other.population;
        for (total, count) in self.deaths.iter_mut().zip(other.deaths) {
            *total += count;
        }
        self.cost += other.cost;
        self.discounted_cost += other.discounted_cost;
        self.min_utility += other.min_utility;
        self.mult_utility += other.mult_utility;
        self.discounted_min_utility += other.discounted_min_utility;
        self.discounted_mult_utility += other.discounted_mult_utility;
        self.life_span += other.life_span;
        self.discounted_life_span += other.discounted_life_span;
        self
    }

    #[must_use]
    pub fn deaths(&self, reason: DeathReason) -> usize {
        self.deaths[reason.index()]
    }

    /// Life years lived, at the given cycle length.
    #[must_use]
    pub fn life_years(&self, cycles_per_year: u32) -> f64 {
        self.life_span as f64 / f64::from(cycles_per_year)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PopulationOutcomes {
    pub base_seed: u64,
    /// Cycles actually simulated; fewer than configured when everyone died.
    pub cycles_run: u32,
    pub people: Vec<PersonOutcome>,
    pub totals: OutcomeTotals,
    /// Ordered by cycle, then person.
    pub trace: Vec<TraceRecord>,
}

/// One person's cycle. Returns the trace records it produced.
fn step_person(
    person: &mut Person,
    sampler: &mut Sampler,
    pipeline: &EventPipeline,
    parameters: &Parameters,
    accountant: &Accountant,
    tracing: bool,
) -> Result<Vec<TraceRecord>, HepceError> {
    let mut records = Vec::new();
    if !person.is_alive() {
        return Ok(records);
    }

    person.advance_cycle();
    for &event in pipeline.events() {
        let effect = event.execute(person, sampler, parameters)?;
        accountant.apply(person, &effect)?;
        if tracing && !effect.is_quiet() {
            trace!("cycle {} person {}: {event} {:?}", person.current_cycle(), person.id(), effect.transitions());
            records.push(TraceRecord::new(person, event, &effect));
        }
        if !person.is_alive() {
            trace!("person {} died of {} in cycle {}", person.id(), person.death_reason(), person.current_cycle());
            break;
        }
    }
    accountant.close_cycle(person);
    person.check_invariants()?;
    Ok(records)
}

/// Simulates `population` for up to `config.cycles` cycles.
pub fn run(
    population: &mut [Person],
    config: &SimulationConfig,
    pipeline: &EventPipeline,
    parameters: &Parameters,
) -> Result<PopulationOutcomes, HepceError> {
    config.validate()?;
    let base_seed = config.seed.unwrap_or_else(|| {
        let seed: u64 = rand::random();
        info!("no seed configured; using {seed}");
        seed
    });
    run_with_seed(population, config, base_seed, pipeline, parameters)
}

fn run_with_seed(
    population: &mut [Person],
    config: &SimulationConfig,
    base_seed: u64,
    pipeline: &EventPipeline,
    parameters: &Parameters,
) -> Result<PopulationOutcomes, HepceError> {
    config.validate()?;
    let accountant = Accountant::new(config.discounting()?, config.utility_mode);
    let mut samplers: Vec<Sampler> = population
        .iter()
        .map(|person| Sampler::for_person(base_seed, person.id()))
        .collect();

    info!(
        "simulating {} people for {} cycles with seed {base_seed}",
        population.len(),
        config.cycles
    );

    let mut trace_records = Vec::new();
    let mut cycles_run = 0;
    for cycle in 1..=config.cycles {
        let alive = population.iter().filter(|person| person.is_alive()).count();
        if alive == 0 {
            debug!("everyone has died; stopping before cycle {cycle}");
            break;
        }
        debug!("cycle {cycle}: {alive} alive");

        let step = |(person, sampler): (&mut Person, &mut Sampler)| {
            step_person(person, sampler, pipeline, parameters, &accountant, config.trace)
        };
        let records: Vec<Vec<TraceRecord>> = if config.parallel {
            population
                .par_iter_mut()
                .zip(samplers.par_iter_mut())
                .map(step)
                .collect::<Result<_, _>>()?
        } else {
            population
                .iter_mut()
                .zip(samplers.iter_mut())
                .map(step)
                .collect::<Result<_, _>>()?
        };
        trace_records.extend(records.into_iter().flatten());
        cycles_run = cycle;
    }

    let people = population
        .iter()
        .map(|person| PersonOutcome::of(person, config.utility_mode))
        .collect();
    let totals = population
        .iter()
        .map(OutcomeTotals::of)
        .fold(OutcomeTotals::default(), |total, person| total.merge(&person));
    info!(
        "finished after {cycles_run} cycles: {} of {} people died",
        totals.population - population.iter().filter(|person| person.is_alive()).count(),
        totals.population
    );

    Ok(PopulationOutcomes {
        base_seed,
        cycles_run,
        people,
        totals,
        trace: trace_records,
    })
}

#[derive(Default)]
struct SimulationConfigPlugin {
    config: Option<SimulationConfig>,
}

impl DataPlugin for SimulationConfigPlugin {
    const new: &'static dyn Fn() -> Self = &SimulationConfigPlugin::default;
}

pub trait ContextSimulationExt {
    fn set_simulation_config(&mut self, config: SimulationConfig) -> Result<(), HepceError>;

    fn get_simulation_config(&self) -> Result<&SimulationConfig, HepceError>;

    /// Runs the context's population with its parameters and configuration. The seed comes from
    /// the configuration, or from `init_random` when the configuration has none. Final person
    /// states are stored back in the context, even when the run fails.
    fn execute(&mut self) -> Result<PopulationOutcomes, HepceError>;
}

impl ContextSimulationExt for Context {
    fn set_simulation_config(&mut self, config: SimulationConfig) -> Result<(), HepceError> {
        config.validate()?;
        if let Some(seed) = config.seed {
            self.init_random(seed);
        }
        self.get_data_container_mut::<SimulationConfigPlugin>().config = Some(config);
        Ok(())
    }

    fn get_simulation_config(&self) -> Result<&SimulationConfig, HepceError> {
        self.get_data_container::<SimulationConfigPlugin>()
            .and_then(|plugin| plugin.config.as_ref())
            .ok_or(HepceError::ConfigNotSet)
    }

    fn execute(&mut self) -> Result<PopulationOutcomes, HepceError> {
        let config = self.get_simulation_config()?.clone();
        let parameters = self.get_parameters()?;
        let base_seed = config.seed.unwrap_or_else(|| self.get_base_seed());
        let pipeline = config.pipeline();

        let mut population = self.take_population();
        let result = run_with_seed(&mut population, &config, base_seed, &pipeline, &parameters);
        self.restore_population(population);
        result
    }
}
