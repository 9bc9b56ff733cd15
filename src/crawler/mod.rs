pub mod frontier;
pub mod orchestrator;
pub mod page;
pub mod policy;
pub mod url;
