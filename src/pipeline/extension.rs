// src/pipeline/extension.rs

//! File extension classification used by the stage predicates.

/// Returns true if the basename of `path` ends with `.` + one of `allowed`.
///
/// The basename is the last `/`-separated segment. An empty `allowed` list
/// never matches.
pub fn matches_extension<S: AsRef<str>>(path: &str, allowed: &[S]) -> bool {
    let basename = path.rsplit('/').next().unwrap_or(path);

    allowed.iter().any(|ext| {
        let ext = ext.as_ref();
        basename.len() > ext.len()
            && basename.ends_with(ext)
            && basename.as_bytes()[basename.len() - ext.len() - 1] == b'.'
    })
}
