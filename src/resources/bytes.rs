//! Raw asset byte loading with progress reporting.
//!
//! Assets are read from the packaged `assets/` directory next to the binary
//! on native targets, or fetched relative to the page origin on the web.
//! Progress is reported as (bytes loaded, total bytes); nothing downstream
//! depends on it beyond logging.

use anyhow::Result;

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> reqwest::Url {
    let window = web_sys::window().unwrap();
    let location = window.location();
    let origin = location.origin().unwrap();
    let base = reqwest::Url::parse(&format!("{}/assets/", origin)).unwrap();
    base.join(file_name).unwrap()
}

/// Read an asset file, reporting fractional progress along the way.
///
/// `on_progress` receives (loaded, total). A total of zero means the size is
/// unknown up front.
pub async fn load_binary(
    file_name: &str,
    on_progress: &mut dyn FnMut(u64, u64),
) -> Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name);
        let response = reqwest::get(url).await?;
        let total = response.content_length().unwrap_or(0);
        let bytes = response.bytes().await?.to_vec();
        on_progress(bytes.len() as u64, total.max(bytes.len() as u64));
        bytes
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        use std::io::Read;

        let path = std::path::Path::new("./").join("assets").join(file_name);
        let file = std::fs::File::open(&path)?;
        let total = file.metadata().map(|meta| meta.len()).unwrap_or(0);

        let mut reader = std::io::BufReader::new(file);
        let mut data = Vec::with_capacity(total as usize);
        let mut chunk = [0u8; 64 * 1024];
        loop {
            let read = reader.read(&mut chunk)?;
            if read == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..read]);
            on_progress(data.len() as u64, total);
        }
        data
    };

    Ok(data)
}
