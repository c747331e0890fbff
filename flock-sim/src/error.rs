use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum FlockError {
    #[error("a flock needs at least one agent")]
    EmptyFlock,
    #[error("requested {requested} agents but capacity is {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },
    #[error("failed to read an entropy seed: {0}")]
    Entropy(getrandom::Error),
}
