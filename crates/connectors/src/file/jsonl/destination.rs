use crate::{
    error::StoreError,
    file::jsonl::JsonlStore,
    store::{BatchWriteOutput, DestinationStore},
};
use async_trait::async_trait;
use model::records::record::Record;
use tokio::io::AsyncWriteExt;
use tracing::debug;

#[async_trait]
impl DestinationStore for JsonlStore {
    async fn batch_write(
        &self,
        location: &str,
        items: &[Record],
    ) -> Result<BatchWriteOutput, StoreError> {
        let max = self.max_batch_size();
        if items.len() > max {
            return Err(StoreError::BatchTooLarge {
                got: items.len(),
                max,
            });
        }

        let path = self.table_path(location)?;
        let mut payload = String::new();
        for item in items {
            let line = item
                .to_json_line()
                .map_err(|e| StoreError::Rejected(e.to_string()))?;
            payload.push_str(&line);
            payload.push('\n');
        }

        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(self.root()).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(payload.as_bytes()).await?;
        file.flush().await?;

        debug!(table = %location, items = items.len(), "Appended batch");

        Ok(BatchWriteOutput::complete())
    }
}
