use crate::foundation::core::FrameIndex;
use crate::foundation::error::LoadError;

/// Naming scheme of the pre-rasterised frame images.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameScheme {
    /// Static directory, without leading or trailing separators.
    pub dir: String,
    /// File extension, without the dot.
    pub ext: String,
    /// Zero-padding width of the frame number.
    pub pad: usize,
}

impl FrameScheme {
    pub fn new(dir: impl Into<String>, ext: impl Into<String>, pad: usize) -> Self {
        Self {
            dir: dir.into().trim_matches('/').to_string(),
            ext: ext.into().trim_start_matches('.').to_string(),
            pad,
        }
    }

    /// Static path of frame `index`, e.g. `/frame_webp/frame_0001.webp`.
    pub fn frame_path(&self, index: FrameIndex) -> String {
        frame_asset_path(&self.dir, index, self.pad, &self.ext)
    }
}

/// Static path of one frame: `/<dir>/frame_<NNNN>.<ext>`.
pub fn frame_asset_path(dir: &str, index: FrameIndex, pad: usize, ext: &str) -> String {
    let dir = dir.trim_matches('/');
    let ext = ext.trim_start_matches('.');
    let n = index.get();
    if dir.is_empty() {
        format!("/frame_{n:0pad$}.{ext}")
    } else {
        format!("/{dir}/frame_{n:0pad$}.{ext}")
    }
}

/// Normalise a static asset path to a relative, `/`-separated form.
///
/// A single leading `/` is accepted (static paths are rooted at the asset base), `\` is treated
/// as a separator, `.` segments are dropped and `..` is rejected.
pub fn normalize_static_path(path: &str) -> Result<String, LoadError> {
    let s = path.replace('\\', "/");
    let s = s.trim_start_matches('/');
    if s.is_empty() {
        return Err(LoadError::InvalidPath("asset path must be non-empty".to_string()));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(LoadError::InvalidPath(format!(
                "asset path '{path}' must not contain '..'"
            )));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(LoadError::InvalidPath(format!(
            "asset path '{path}' must contain a file name"
        )));
    }

    Ok(out.join("/"))
}
