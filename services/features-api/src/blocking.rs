//! Running GDAL work off the async runtime.

use feature_source::SourceDataset;

use crate::error::ApiResult;

/// Open the dataset at `path` on a blocking thread and run `work` on it.
/// The dataset is closed when `work` returns.
pub async fn with_dataset<T, F>(path: String, work: F) -> ApiResult<T>
where
    F: FnOnce(&SourceDataset) -> feature_source::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || {
        let source = SourceDataset::open(&path)?;
        work(&source)
    })
    .await?;
    Ok(result?)
}
