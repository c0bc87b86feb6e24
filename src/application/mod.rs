// Application layer - Use cases and ports
pub mod aggregator;
pub mod catalogue_repository;
pub mod catalogue_service;
pub mod fetcher;
pub mod parser;
pub mod render_backend;
pub mod retry_policy;
pub mod sample_sink;
pub mod sampler;
pub mod sampling_service;
pub mod segmenter;

#[cfg(test)]
pub mod test_support;
