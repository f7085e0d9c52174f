//! Listing image upload against the object-storage collaborator.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use sha2::{Digest, Sha256};

use crate::auth::Session;
use crate::client::BackendClient;
use crate::error::ClientError;
use crate::listings::ImageUpload;

const BUCKET: &str = "product-images";

/// Content-addressed object path: `products/<sha256-prefix>.<ext>`.
///
/// Identical bytes always land on the same path; combined with the upsert
/// header, re-uploads are idempotent. The extension is percent-encoded
/// before it reaches the path.
fn object_path(image: &ImageUpload) -> String {
    let digest = format!("{:x}", Sha256::digest(&image.bytes));
    let extension = utf8_percent_encode(
        image.extension.trim_start_matches('.'),
        NON_ALPHANUMERIC,
    );
    format!("products/{}.{extension}", &digest[..16])
}

impl BackendClient {
    /// Uploads an image and returns its publicly resolvable URL.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] if the storage service rejects the
    /// upload, or [`ClientError::Http`] on network failure.
    pub async fn upload_listing_image(
        &self,
        session: &Session,
        image: &ImageUpload,
    ) -> Result<String, ClientError> {
        let path = object_path(image);
        let url = self.endpoint(&format!("storage/v1/object/{BUCKET}/{path}"))?;

        let response = self
            .authed(self.http().post(url), Some(&session.access_token))
            .header("x-upsert", "true")
            .header("content-type", "application/octet-stream")
            .body(image.bytes.clone())
            .send()
            .await?;
        Self::check(response).await?;

        Ok(format!(
            "{}storage/v1/object/public/{BUCKET}/{path}",
            self.base_url()
        ))
    }
}
