#[derive(Clone)]
pub enum SinkerConfig {
    Redis {
        url: String,
        batch_size: usize,
        /// append REPLACE so existing keys are overwritten instead of
        /// failing with BUSYKEY
        is_replace: bool,
    },
}
