use crate::api::{ApiClient, ApiResult};

/// Bucket namespaces in blob storage.
pub(crate) const ASSET_BUCKET: &str = "note-images";
pub(crate) const CONTENT_BUCKET: &str = "note-content";

/// 128-bit hex token for collision-resistant storage keys.
pub(crate) fn random_token() -> String {
    let mut buf = [0u8; 16];
    if getrandom::getrandom(&mut buf).is_err() {
        for b in buf.iter_mut() {
            *b = (js_sys::Math::random() * 256.0) as u8;
        }
    }
    buf.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Publicly served keys live under `public/`; the original file name is kept
/// so downloads stay recognizable. Path separators in the name would change
/// the key's nesting, so they are flattened.
pub(crate) fn asset_storage_key(token: &str, file_name: &str) -> String {
    let name = file_name.replace(['/', '\\'], "-");
    format!("public/{}-{}", token, name)
}

pub(crate) fn content_storage_key(token: &str) -> String {
    format!("public/{}.json", token)
}

/// Uploads an image and returns its durable URL. Nothing is inserted into any
/// document here; the caller inserts only on success.
pub(crate) async fn upload_image(
    api: &ApiClient,
    file_name: &str,
    bytes: Vec<u8>,
    content_type: &str,
) -> ApiResult<String> {
    let key = asset_storage_key(&random_token(), file_name);
    api.upload_blob(ASSET_BUCKET, &key, bytes, content_type).await
}

/// Persists a serialized document tree and returns the URL the note record
/// should point at.
pub(crate) async fn upload_note_document(
    api: &ApiClient,
    doc_json: &serde_json::Value,
) -> ApiResult<String> {
    let key = content_storage_key(&random_token());
    api.upload_blob(
        CONTENT_BUCKET,
        &key,
        doc_json.to_string().into_bytes(),
        "application/json",
    )
    .await
}

pub(crate) async fn read_file_bytes(file: &web_sys::File) -> Result<Vec<u8>, String> {
    let buf = wasm_bindgen_futures::JsFuture::from(file.array_buffer())
        .await
        .map_err(|_| "Falha ao ler o arquivo".to_string())?;
    Ok(js_sys::Uint8Array::new(&buf).to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_key_keeps_original_name_under_public_prefix() {
        let key = asset_storage_key("abc123", "diagrama celular.png");
        assert_eq!(key, "public/abc123-diagrama celular.png");
    }

    #[test]
    fn test_asset_key_flattens_path_separators() {
        let key = asset_storage_key("abc", "../segredo/img.png");
        assert!(!key["public/".len()..].contains('/'));
    }

    #[test]
    fn test_random_token_is_hex_and_unique() {
        let a = random_token();
        let b = random_token();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_content_key_is_json_file() {
        assert_eq!(content_storage_key("t0k"), "public/t0k.json");
    }
}
