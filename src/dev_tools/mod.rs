pub mod payload_generator;

pub use payload_generator::PayloadGenerator;
