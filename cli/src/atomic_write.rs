use std::io::Write as _;
use std::path::Path;

use anyhow::Context;
use tempfile::NamedTempFile;

/// Replace the config file at `path` with `contents`, newline-terminated.
///
/// The new file is staged next to the old one and renamed over it, so a reader sees either the old
/// or the new config. An existing file's permissions carry over to the replacement.
pub fn write_config_atomic(path: &Path, contents: &str) -> anyhow::Result<()> {
    let dir = path
        .parent()
        .with_context(|| format!("config path has no parent: {}", path.display()))?;
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;

    let mut staged = NamedTempFile::new_in(dir).context("stage config")?;
    staged
        .write_all(contents.as_bytes())
        .context("write staged config")?;
    if !contents.ends_with('\n') {
        staged.write_all(b"\n").context("write staged config")?;
    }
    staged.flush().context("flush staged config")?;

    match std::fs::metadata(path) {
        Ok(existing) => staged
            .as_file()
            .set_permissions(existing.permissions())
            .context("copy config permissions")?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(anyhow::Error::new(err).context("inspect existing config")),
    }

    staged
        .persist(path)
        .map_err(|err| anyhow::Error::new(err.error))
        .with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}
