//! Layer upload with transparent gzip compression.
//!
//! Layers live in two identities at once: the diffID is the digest of the
//! uncompressed tar stream and belongs in the image configuration rootfs,
//! while the descriptor digest is the digest of the compressed bytes as
//! stored by the registry. Confusing the two produces images that pull
//! fine and fail verification on unpack.

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use stowage_core::{Descriptor, Digest, MediaType};

use crate::client::RegistryClient;
use crate::error::RegistryError;

/// A layer that has been compressed and uploaded.
#[derive(Debug, Clone)]
pub struct UploadedLayer {
    /// Descriptor of the compressed blob as stored by the registry.
    pub descriptor: Descriptor,
    /// Digest of the uncompressed tar stream, for the configuration rootfs.
    pub diff_id: Digest,
}

impl RegistryClient {
    /// Compresses a tar stream with gzip and uploads it as a layer blob.
    ///
    /// Returns both digests a caller needs to assemble an image: the
    /// descriptor for the manifest layer list and the diffID for the
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if compression fails or the upload fails as in
    /// [`Self::put_blob`].
    pub async fn upload_layer(
        &self,
        repository: &str,
        tar_bytes: &[u8],
        media_type: MediaType,
    ) -> Result<UploadedLayer, RegistryError> {
        let diff_id = Digest::from_bytes(tar_bytes);
        let compressed = gzip(tar_bytes)?;
        tracing::debug!(
            repository,
            raw_size = tar_bytes.len(),
            compressed_size = compressed.len(),
            "compressed layer"
        );

        let descriptor = self.put_blob(repository, media_type, &compressed).await?;
        Ok(UploadedLayer {
            descriptor,
            diff_id,
        })
    }
}

/// Compresses bytes with gzip at the default level.
fn gzip(bytes: &[u8]) -> Result<Vec<u8>, RegistryError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(bytes)
        .map_err(|e| RegistryError::CompressionFailed { source: e })?;
    encoder
        .finish()
        .map_err(|e| RegistryError::CompressionFailed { source: e })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_gzip_round_trip() {
        let raw = b"layer content that should survive compression".to_vec();
        let compressed = gzip(&raw).unwrap();
        assert_ne!(compressed, raw);

        let mut decoder = flate2::read::GzDecoder::new(compressed.as_slice());
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed).unwrap();
        assert_eq!(decompressed, raw);
    }

    #[test]
    fn test_gzip_changes_digest() {
        let raw = b"tar stream".to_vec();
        let compressed = gzip(&raw).unwrap();
        assert_ne!(Digest::from_bytes(&raw), Digest::from_bytes(&compressed));
    }
}
