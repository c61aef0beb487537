#[derive(Clone)]
pub struct PipelineConfig {
    pub buffer_size: usize,
}
