//! `Content-Disposition` filename extraction

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{MirrorError, Result};

lazy_static! {
    // First `filename=` parameter, quoted or bare; `filename*=` is not matched
    static ref FILENAME_RE: Regex = Regex::new(r#"filename=(?:"([^"]*)"|([^;]+))"#).unwrap();
}

/// Extract the destination filename from a `Content-Disposition` value.
///
/// The first `filename=` parameter wins. Surrounding quotes are removed and the
/// result must be a bare file name, so a download cannot leave the output
/// directory.
///
/// ```
/// use relhook_core::downloader::parse_filename;
///
/// assert_eq!(parse_filename("attachment; filename=build.zip").unwrap(), "build.zip");
/// assert!(parse_filename("attachment").is_err());
/// ```
pub fn parse_filename(header: &str) -> Result<String> {
    let captures = FILENAME_RE.captures(header).ok_or_else(|| {
        MirrorError::Metadata(format!("no filename in Content-Disposition '{}'", header))
    })?;

    let name = match (captures.get(1), captures.get(2)) {
        (Some(quoted), _) => quoted.as_str().trim(),
        (None, Some(bare)) => bare.as_str().trim().trim_matches('"').trim(),
        (None, None) => "",
    };

    if name.is_empty() || name == "." || name == ".." {
        return Err(MirrorError::Metadata(format!("unusable filename '{}'", name)));
    }
    if name.contains('/') || name.contains('\\') || name.contains('\0') {
        return Err(MirrorError::Metadata(format!("filename '{}' contains a path separator", name)));
    }

    Ok(name.to_string())
}
