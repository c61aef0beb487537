#[derive(Clone)]
pub enum ExtractorConfig {
    RdbSnapshotFile {
        file_path: String,
        /// dry run: walk the whole file but emit nothing
        skip_emit: bool,
    },
}
