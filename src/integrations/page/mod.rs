pub mod probe;
pub mod scripts;

pub use probe::{execute_within, probe_or, truthy, PageProbe, PROBE_ALLOWANCE};
pub use scripts::PageScript;

#[cfg(test)]
pub use probe::MockPageProbe;
