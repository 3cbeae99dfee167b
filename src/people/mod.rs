/*!

The simulated population. A [`Person`] holds every piece of an individual's state in one record,
built from a [`PersonInit`] cohort row. The population lives in the `Context` as a data plugin
and is reached through [`ContextPeopleExt`].

People never reference each other: anything that involves more than one record (a mother and
her infants, population totals) is kept on the owning record or computed by the driver.

*/

mod context_ext;
pub mod details;
mod init_list;
mod people_data;
mod person;

pub(crate) use context_ext::ContextPeopleExtInternal;

pub use context_ext::ContextPeopleExt;
pub use details::Child;
pub use init_list::PersonInit;
pub use person::{CYCLES_PER_YEAR, Person};
