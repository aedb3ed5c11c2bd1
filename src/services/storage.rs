use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Part size for multipart uploads. Objects that fit in one part are sent
/// with a single PutObject.
pub const PART_SIZE: usize = 8 * 1024 * 1024;

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Streams `reader` into `bucket/key` and returns the number of bytes written
    async fn put_object<'a>(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<u64>;
}

pub struct S3StorageService {
    client: Client,
}

impl S3StorageService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Keeps the full SDK error chain in the message, the plain `Display`
/// only says "service error"
fn sdk_error<E: std::error::Error>(e: E) -> anyhow::Error {
    anyhow::anyhow!("{}", DisplayErrorContext(e))
}

/// Fills `buffer` from `reader` until it is full or the stream ends
async fn read_part<R>(reader: &mut R, buffer: &mut [u8]) -> Result<usize>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut n = 0;
    while n < buffer.len() {
        let read = reader.read(&mut buffer[n..]).await?;
        if read == 0 {
            break;
        }
        n += read;
    }
    Ok(n)
}

#[async_trait]
impl StorageService for S3StorageService {
    async fn put_object<'a>(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        mut reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<u64> {
        let mut buffer = vec![0u8; PART_SIZE];
        let n = read_part(&mut reader, &mut buffer).await?;

        if n < PART_SIZE {
            self.client
                .put_object()
                .bucket(bucket)
                .key(key)
                .content_type(content_type)
                .body(ByteStream::from(buffer[..n].to_vec()))
                .send()
                .await
                .map_err(sdk_error)?;
            return Ok(n as u64);
        }

        let multipart_upload_res = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .send()
            .await
            .map_err(sdk_error)?;

        let upload_id = multipart_upload_res
            .upload_id()
            .ok_or_else(|| anyhow::anyhow!("No upload ID"))?;

        let mut part_number = 1;
        let mut completed_parts = Vec::new();
        let mut total_size = 0u64;
        let mut n = n;

        while n > 0 {
            total_size += n as u64;
            let upload_part_res = self
                .client
                .upload_part()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .body(ByteStream::from(buffer[..n].to_vec()))
                .part_number(part_number)
                .send()
                .await
                .map_err(sdk_error)?;

            completed_parts.push(
                CompletedPart::builder()
                    .e_tag(upload_part_res.e_tag().unwrap_or_default())
                    .part_number(part_number)
                    .build(),
            );

            part_number += 1;
            n = read_part(&mut reader, &mut buffer).await?;
        }

        let completed_multipart_upload = CompletedMultipartUpload::builder()
            .set_parts(Some(completed_parts))
            .build();

        self.client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(completed_multipart_upload)
            .send()
            .await
            .map_err(sdk_error)?;

        tracing::debug!("Multipart upload of {} finished in {} parts", key, part_number - 1);

        Ok(total_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_part_fills_buffer_across_short_reads() {
        let (mut tx, rx) = tokio::io::duplex(4);
        tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            tx.write_all(b"hello world").await.unwrap();
        });

        let mut reader = rx;
        let mut buffer = [0u8; 8];
        let n = read_part(&mut reader, &mut buffer).await.unwrap();
        assert_eq!(n, 8);
        assert_eq!(&buffer, b"hello wo");

        let n = read_part(&mut reader, &mut buffer).await.unwrap();
        assert_eq!(n, 3);
        assert_eq!(&buffer[..n], b"rld");
    }
}
