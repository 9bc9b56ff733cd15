pub mod output;

pub use output::OutputStore;
