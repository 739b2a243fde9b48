use img_hash::{HashAlg, HasherConfig};
use sha2::{Digest, Sha256};

use crate::evidence::ImageEvidence;

/// Decodes the fetched bytes and fingerprints them.
///
/// Returns the decoder's message when the bytes are not a JPEG/PNG image;
/// the engine treats that as fatal since no verdict can be made without
/// pixels. CPU bound, call it from `spawn_blocking`.
pub fn fingerprint_image(bytes: &[u8]) -> Result<ImageEvidence, String> {
    let sha256 = hex::encode(Sha256::digest(bytes));

    // decode first: the labeler would reject these bytes anyway
    let img = img_hash::image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    let (width, height) = img_hash::image::GenericImageView::dimensions(&img);

    // gradient hash survives recompression and resizing, so re-uploads of
    // the same photo stay recognisable in the logs
    let hasher = HasherConfig::new()
        .hash_alg(HashAlg::Gradient)
        .hash_size(8, 8)
        .to_hasher();
    let phash = hasher.hash_image(&img);

    Ok(ImageEvidence {
        sha256,
        phash: phash.to_base64(),
        byte_len: bytes.len(),
        width,
        height,
        fetched_at: chrono::Utc::now().timestamp(),
    })
}
