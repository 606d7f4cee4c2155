use std::io;
use std::path::{Path, PathBuf};
use failure::Fail;

#[derive(Debug, Fail)]
pub enum PreflightError {
    #[fail(display = "{} does not exist", _0)]
    Missing(String),
    #[fail(display = "{} is not executable and the execute permission could not be set: {}", path, cause)]
    NotExecutable {
        path: String,
        #[cause]
        cause: io::Error,
    },
}

/// Makes sure the inference binary can be run, adding the execute bits if
/// they are missing.
pub fn check_binary(path: &Path) -> Result<PathBuf, PreflightError> {
    let metadata = match path.metadata() {
        Ok(metadata) if metadata.is_file() => metadata,
        _ => return Err(PreflightError::Missing(path.display().to_string())),
    };

    if !is_executable(&metadata) {
        warn!("{} is not executable. Trying to set execute permission...", path.display());

        if let Err(cause) = make_executable(path, &metadata) {
            return Err(PreflightError::NotExecutable {
                path: path.display().to_string(),
                cause,
            });
        }

        info!("Execute permission set.");
    }

    Ok(path.to_path_buf())
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;

    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_: &std::fs::Metadata) -> bool {
    true
}

#[cfg(unix)]
fn make_executable(path: &Path, metadata: &std::fs::Metadata) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = metadata.permissions();
    permissions.set_mode(permissions.mode() | 0o111);
    std::fs::set_permissions(path, permissions)
}

#[cfg(not(unix))]
fn make_executable(_: &Path, _: &std::fs::Metadata) -> io::Result<()> {
    Ok(())
}
