pub mod extract;
pub mod fetch;
pub mod output;
pub mod plot;
pub mod process;
pub mod regions;
pub mod tabular;
