use wasm_bindgen::prelude::*;

pub mod error;
pub mod flock;
mod math;
pub mod params;
pub mod simulator;
pub mod table;

pub use error::FlockError;
pub use flock::{Agent, Flock, StepStats};
pub use params::{Params, AGENT_CAPACITY};
pub use simulator::Simulator;

#[wasm_bindgen]
pub struct Sim {
    inner: Simulator,
}

#[wasm_bindgen]
impl Sim {
    #[wasm_bindgen(constructor)]
    pub fn new(count: usize, seed: u32) -> Result<Sim, JsError> {
        let params = Params {
            num_agents: count,
            ..Params::default()
        };
        Ok(Sim {
            inner: Simulator::new(params, u64::from(seed))?,
        })
    }

    pub fn with_entropy(count: usize) -> Result<Sim, JsError> {
        let params = Params {
            num_agents: count,
            ..Params::default()
        };
        Ok(Sim {
            inner: Simulator::new(params, simulator::entropy_seed()?)?,
        })
    }

    pub fn step(&mut self) {
        self.inner.step();
    }

    pub fn reset(&mut self) -> Result<(), JsError> {
        Ok(self.inner.reset()?)
    }

    pub fn set_agent_count(&mut self, count: usize) -> Result<(), JsError> {
        self.update(|params| params.num_agents = count)
    }

    pub fn set_speed_limits(&mut self, min_speed: f64, max_speed: f64) -> Result<(), JsError> {
        self.update(|params| {
            params.min_speed = min_speed;
            params.max_speed = max_speed;
        })
    }

    pub fn set_forces(
        &mut self,
        cohesion: f64,
        separation: f64,
        alignment: f64,
        boundary: f64,
    ) -> Result<(), JsError> {
        self.update(|params| {
            params.cohesion_force = cohesion;
            params.separation_force = separation;
            params.alignment_force = alignment;
            params.boundary_force = boundary;
        })
    }

    pub fn set_distances(
        &mut self,
        cohesion: f64,
        separation: f64,
        alignment: f64,
    ) -> Result<(), JsError> {
        self.update(|params| {
            params.cohesion_distance = cohesion;
            params.separation_distance = separation;
            params.alignment_distance = alignment;
        })
    }

    pub fn count(&self) -> usize {
        self.inner.flock().len()
    }

    pub fn step_count(&self) -> u64 {
        self.inner.step_count()
    }

    /// Row-major agent table, six values per agent in `columns()` order.
    pub fn table(&self) -> Vec<f64> {
        table::flatten(self.inner.flock())
    }

    pub fn columns(&self) -> Vec<String> {
        table::COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    pub fn table_text(&self, header: bool) -> String {
        table::render(self.inner.flock(), header)
    }
}

impl Sim {
    fn update(&mut self, edit: impl FnOnce(&mut Params)) -> Result<(), JsError> {
        let mut params = *self.inner.params();
        edit(&mut params);
        Ok(self.inner.set_params(params)?)
    }

    pub fn simulator(&self) -> &Simulator {
        &self.inner
    }
}
