/*!

The `Context` is the composition root of a simulation. It owns one instance of each *data
plugin*: the base seed, the loaded parameter tables, the population, and the run
configuration. The modules that own those types add extension traits to `Context`
(`ContextRandomExt`, `ContextParametersExt`, `ContextPeopleExt`, `ContextSimulationExt`),
so an application drives a whole run through a single value.

A data plugin is any `'static` type that knows how to construct its empty state:

```rust
use hepce_core::context::{Context, DataPlugin};

#[derive(Default)]
struct RunNotes(Vec<String>);

impl DataPlugin for RunNotes {
    const new: &'static dyn Fn() -> Self = &RunNotes::default;
}

let mut context = Context::new();
context.get_data_container_mut::<RunNotes>().0.push("baseline".to_string());
assert_eq!(context.get_data_container::<RunNotes>().unwrap().0.len(), 1);
```

*/

use crate::hashing::{HashMap, HashMapExt};
use crate::type_of;
use std::any::{Any, TypeId};

/// An object-safe constructor for a plugin's initial (empty) state.
pub trait DataPlugin: Any + 'static {
    /// A constant reference to a constructor
    #[allow(non_upper_case_globals)]
    const new: &'static dyn Fn() -> Self;
}

pub struct Context {
    // Really a `HashMap<TypeId, Box<dyn DataPlugin>>`, declared this way so we can downcast
    // without an `as_any()` method on every plugin.
    data_plugins: HashMap<TypeId, Box<dyn Any>>,
}

impl Context {
    #[must_use]
    pub fn new() -> Self {
        Context {
            data_plugins: HashMap::new(),
        }
    }

    /// Returns a mutable reference for the data container for `T`, creating it if it doesn't exist yet.
    pub fn get_data_container_mut<T: DataPlugin>(&mut self) -> &mut T {
        self.data_plugins
            .entry(type_of::<T>())
            .or_insert_with(|| Box::new(<T as DataPlugin>::new()))
            .downcast_mut::<T>()
            .unwrap() // Will never panic as data container has the matching type
    }

    /// Returns a reference to the data container for `T` if it exists.
    /// If you need a mutable reference or lazy instantiation, use `Context::get_data_container_mut()`.
    #[must_use]
    pub fn get_data_container<T: DataPlugin>(&self) -> Option<&T> {
        self.data_plugins
            .get(&type_of::<T>())
            .and_then(|data| data.downcast_ref::<T>())
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
