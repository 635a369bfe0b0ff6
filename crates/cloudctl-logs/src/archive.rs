//! Log archive downloads

use cloudctl_api::CloudApi;
use cloudctl_core::{archive_file_name, ensure_log_type, Environment, Result, ARCHIVE_EXTENSION};
use std::ffi::OsString;
use std::fs::{self, OpenOptions, TryLockError};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Where a downloaded archive goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadTarget {
    /// A uniquely named file `<prefix><unique>.tar.gz` in `dir`
    Temp { dir: PathBuf, prefix: String },
    /// An exact file path
    Path(PathBuf),
}

impl DownloadTarget {
    /// Resolve the target for an archive.
    ///
    /// Without a destination the archive lands in `temp_dir`. An existing directory
    /// gets `<env>-<type>.tar.gz` inside it; any other destination is used as a
    /// prefix of that file name.
    pub fn resolve(
        environment_name: &str,
        log_type: &str,
        destination: Option<&Path>,
        temp_dir: &Path,
    ) -> Self {
        let file_name = archive_file_name(environment_name, log_type);
        match destination {
            None => DownloadTarget::Temp {
                dir: temp_dir.to_path_buf(),
                prefix: format!("{}-{}-", environment_name, log_type),
            },
            Some(dest) if dest.is_dir() => DownloadTarget::Path(dest.join(file_name)),
            Some(dest) => {
                let mut joined = OsString::from(dest.as_os_str());
                joined.push(file_name);
                DownloadTarget::Path(PathBuf::from(joined))
            }
        }
    }

    /// Directory the archive is staged and written in
    fn dir(&self) -> PathBuf {
        match self {
            DownloadTarget::Temp { dir, .. } => dir.clone(),
            DownloadTarget::Path(path) => match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            },
        }
    }

    /// Write the whole payload or nothing. Data is staged in a private file next
    /// to the target and only moved into place once every byte is on disk; on
    /// failure the staged file is removed.
    pub fn write(&self, data: &[u8]) -> Result<PathBuf> {
        let mut staged = match self {
            DownloadTarget::Temp { dir, prefix } => tempfile::Builder::new()
                .prefix(prefix)
                .suffix(ARCHIVE_EXTENSION)
                .tempfile_in(dir)?,
            DownloadTarget::Path(_) => NamedTempFile::new_in(self.dir())?,
        };

        staged.write_all(data)?;
        staged.flush()?;
        staged.as_file().sync_all()?;

        let written = staged.as_file().metadata()?.len();
        if written != data.len() as u64 {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("wrote {} of {} bytes", written, data.len()),
            )
            .into());
        }

        let path = match self {
            DownloadTarget::Temp { .. } => {
                let (_, path) = staged.keep().map_err(io::Error::from)?;
                path
            }
            DownloadTarget::Path(path) => {
                persist_locked(staged, path)?;
                path.clone()
            }
        };

        debug!("Wrote {} bytes to {}", written, path.display());
        Ok(path)
    }
}

/// Move a staged file onto `path` while holding an exclusive lock on it. Fails
/// with `WouldBlock` when another writer holds the file; the staged file is
/// removed on every failure.
fn persist_locked(staged: NamedTempFile, path: &Path) -> Result<()> {
    let existed = path.exists();
    let target = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;

    if let Err(e) = target.try_lock() {
        let err = match e {
            TryLockError::WouldBlock => io::Error::new(
                io::ErrorKind::WouldBlock,
                format!("{} is locked by another writer", path.display()),
            ),
            TryLockError::Error(err) => err,
        };
        warn!("Not replacing {}: {}", path.display(), err);
        return Err(err.into());
    }

    if let Err(e) = staged.persist(path) {
        if !existed {
            let _ = fs::remove_file(path);
        }
        return Err(io::Error::from(e).into());
    }

    drop(target);
    Ok(())
}

/// Downloads log archives to local files
pub struct LogArchiveFetcher<'a> {
    api: &'a dyn CloudApi,
    temp_dir: PathBuf,
}

impl<'a> LogArchiveFetcher<'a> {
    pub fn new(api: &'a dyn CloudApi) -> Self {
        Self {
            api,
            temp_dir: std::env::temp_dir(),
        }
    }

    /// Use another directory for downloads without a destination
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    /// Download an archive and return where it was written.
    ///
    /// Nothing is written when the download itself fails.
    pub async fn download(
        &self,
        environment: &Environment,
        log_type: &str,
        destination: Option<&Path>,
    ) -> Result<PathBuf> {
        ensure_log_type(log_type)?;

        let data = self.api.download_archive(&environment.id, log_type).await?;
        let target =
            DownloadTarget::resolve(&environment.name, log_type, destination, &self.temp_dir);
        debug!("Resolved download target {:?}", target);

        let path = target.write(&data)?;
        info!(
            "Downloaded {} archive of {} ({} bytes)",
            log_type,
            environment.name,
            data.len()
        );
        Ok(path)
    }
}
