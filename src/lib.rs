/*!

A discrete-time microsimulation of hepatitis C and HIV in a population, with the cost and
quality-adjusted life each person accrues along the way.

A run is assembled in a [`Context`]: load [`Parameters`], add a cohort of people, set a
[`SimulationConfig`], and [`execute`](ContextSimulationExt::execute). Every cycle each living
person passes through the fixed [`Event`] pipeline (aging, substance use, infection, the care
cascades, liver disease, and death), and the [`Accountant`](accounting::Accountant) books what
each event cost and how it changed the person's utility.

*/

pub mod accounting;
pub mod context;
pub mod error;
pub mod events;
pub mod hashing;
pub mod log;
pub mod parameters;
pub mod people;
pub mod random;
pub mod simulation;
pub mod state;

#[cfg(test)]
mod testing;

// Used by `define_state!` in downstream crates.
pub use serde;

pub use context::Context;
pub use error::HepceError;
pub use events::{CycleEffect, Event, EventPipeline, Transition};
pub use parameters::{ContextParametersExt, Parameters};
pub use people::{ContextPeopleExt, Person, PersonInit};
pub use random::{ContextRandomExt, Sampler};
pub use simulation::{ContextSimulationExt, PopulationOutcomes, SimulationConfig};

use serde::Serialize;
use std::any::TypeId;
use std::fmt::{Display, Formatter};

#[inline(always)]
pub fn type_of<T: 'static>() -> TypeId {
    TypeId::of::<T>()
}

/// A person's position in the population, assigned in order of addition.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize)]
#[serde(transparent)]
pub struct PersonId(pub(crate) usize);

impl PersonId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for PersonId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
