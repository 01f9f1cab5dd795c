//! Reading asset bytes: from disk natively, over HTTP on the web.

use anyhow::Context;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use percent_encoding::percent_decode_str;

/// How far a download has come. `total` is unknown when the server sends no length.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    pub loaded: u64,
    pub total: Option<u64>,
}

impl Progress {
    pub fn percent(&self) -> Option<f32> {
        match self.total {
            Some(total) if total > 0 => Some(self.loaded as f32 / total as f32 * 100.0),
            _ => None,
        }
    }

    /// `"Castle 42% loaded"` style line, or nothing while the total is unknown.
    pub fn message(&self, what: &str) -> Option<String> {
        self.percent()
            .map(|percent| format!("{what} {percent:.0}% loaded"))
    }
}

/// Progress callback that logs every step at info level.
pub fn log_progress(what: &str) -> impl FnMut(Progress) + '_ {
    move |progress| {
        if let Some(message) = progress.message(what) {
            log::info!("{message}");
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
const CHUNK_SIZE: usize = 64 * 1024;

#[cfg(target_arch = "wasm32")]
fn format_url(root: &str, file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().context("no window to resolve asset urls against")?;
    let origin = window
        .location()
        .origin()
        .map_err(|err| anyhow::anyhow!("could not read page origin: {err:?}"))?;
    let base = if root.is_empty() {
        format!("{origin}/")
    } else {
        format!("{origin}/{}/", root.trim_matches('/'))
    };
    let base = reqwest::Url::parse(&base).with_context(|| format!("invalid asset root {base}"))?;
    base.join(file_name)
        .with_context(|| format!("invalid asset path {file_name}"))
}

/// Loads `file_name` below `root`, calling `on_progress` as bytes arrive.
///
/// Natively the file is read in chunks so every chunk reports. On the web the body is
/// received in one piece and progress is reported once it is complete.
pub async fn load_binary_with_progress(
    root: &str,
    file_name: &str,
    mut on_progress: impl FnMut(Progress),
) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(root, file_name)?;
        let response = reqwest::get(url.clone())
            .await
            .with_context(|| format!("request for {url} failed"))?
            .error_for_status()
            .with_context(|| format!("server refused {url}"))?;
        let total = response.content_length();
        let data = response
            .bytes()
            .await
            .with_context(|| format!("could not read body of {url}"))?
            .to_vec();
        on_progress(Progress {
            loaded: data.len() as u64,
            total: total.or(Some(data.len() as u64)),
        });
        data
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        use tokio::io::AsyncReadExt;

        let path = std::path::Path::new(root).join(file_name);
        let mut file = tokio::fs::File::open(&path)
            .await
            .with_context(|| format!("could not open {}", path.display()))?;
        let total = file.metadata().await.ok().map(|meta| meta.len());
        let mut data = Vec::with_capacity(total.unwrap_or(0) as usize);
        let mut chunk = vec![0u8; CHUNK_SIZE];
        loop {
            let read = file
                .read(&mut chunk)
                .await
                .with_context(|| format!("could not read {}", path.display()))?;
            if read == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..read]);
            on_progress(Progress {
                loaded: data.len() as u64,
                total,
            });
        }
        if data.is_empty() {
            on_progress(Progress {
                loaded: 0,
                total,
            });
        }
        data
    };

    Ok(data)
}

pub async fn load_binary(root: &str, file_name: &str) -> anyhow::Result<Vec<u8>> {
    load_binary_with_progress(root, file_name, |_| {}).await
}

/// Resolves a URI found inside an asset relative to the directory of that asset.
pub fn sibling_path(asset: &str, uri: &str) -> String {
    match asset.rfind('/') {
        Some(slash) => format!("{}/{}", &asset[..slash], uri),
        None => uri.to_string(),
    }
}

/// Where the bytes behind a URI found inside an asset live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetUri {
    /// Bytes carried by a `data:` URI, already decoded.
    Embedded(Vec<u8>),
    /// A path below the asset root, percent-decoded.
    Path(String),
}

/// Resolves `uri` as found inside `asset`: `data:` URIs are decoded in place, anything
/// else is a percent-encoded path relative to the asset's directory.
pub fn resolve_uri(asset: &str, uri: &str) -> anyhow::Result<AssetUri> {
    if let Some(rest) = uri.strip_prefix("data:") {
        let (header, payload) = rest
            .split_once(',')
            .context("data URI has no payload")?;
        let bytes = if header.ends_with(";base64") {
            BASE64
                .decode(payload.trim())
                .context("data URI is not valid base64")?
        } else {
            percent_decode_str(payload).collect()
        };
        return Ok(AssetUri::Embedded(bytes));
    }
    let path = percent_decode_str(uri)
        .decode_utf8()
        .with_context(|| format!("{uri} is not a valid UTF-8 path"))?;
    Ok(AssetUri::Path(sibling_path(asset, &path)))
}

/// Loads the bytes behind a URI referenced from `asset`.
pub async fn load_uri(root: &str, asset: &str, uri: &str) -> anyhow::Result<Vec<u8>> {
    match resolve_uri(asset, uri)? {
        AssetUri::Embedded(bytes) => Ok(bytes),
        AssetUri::Path(path) => load_binary(root, &path).await,
    }
}
