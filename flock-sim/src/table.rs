use crate::flock::{Agent, Flock};

pub const COLUMNS: [&str; 6] = ["tx", "ty", "tz", "vx", "vy", "vz"];

pub fn row(agent: &Agent) -> [f64; 6] {
    let [tx, ty, tz] = agent.position;
    let [vx, vy, vz] = agent.velocity;
    [tx, ty, tz, vx, vy, vz]
}

pub fn rows(flock: &Flock) -> Vec<[f64; 6]> {
    flock.agents().map(|agent| row(&agent)).collect()
}

/// Row-major copy of the table, `COLUMNS.len()` values per agent.
pub fn flatten(flock: &Flock) -> Vec<f64> {
    let mut out = Vec::with_capacity(flock.len() * COLUMNS.len());
    for agent in flock.agents() {
        out.extend_from_slice(&row(&agent));
    }
    out
}

/// Tab-separated text, one line per agent, optionally led by the column names.
pub fn render(flock: &Flock, header: bool) -> String {
    let mut out = String::new();

    if header {
        out.push_str(&COLUMNS.join("\t"));
        out.push('\n');
    }

    for agent in flock.agents() {
        for (k, value) in row(&agent).iter().enumerate() {
            if k > 0 {
                out.push('\t');
            }
            out.push_str(&value.to_string());
        }
        out.push('\n');
    }

    out
}
