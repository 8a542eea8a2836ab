//! Per-cue scratch space and output claims.
//!
//! Each cue works inside its own [`ScratchArena`], a subdirectory of the
//! working root named after the cue index. Nothing else writes there, so
//! cues can run side by side, and dropping the arena removes the clip and
//! every frame image whether the cue succeeded or not.
//!
//! An [`OutputClaim`] marks exclusive ownership of one output path. It is a
//! `<output>.part` file created with create-if-absent semantics; the GIF is
//! encoded into it and renamed onto the real output path only when complete,
//! so a half-written GIF never counts as a cache hit.

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::SubgifError;

/// File name of the extracted clip inside an arena.
pub const CLIP_FILE_NAME: &str = "clip.mp4";

/// Suffix appended to an output path to form its claim.
pub const CLAIM_SUFFIX: &str = "part";

/// Age after which another process's claim is considered abandoned.
pub const STALE_CLAIM_AGE: Duration = Duration::from_secs(60 * 60);

/// Scratch directory owned by one cue.
#[derive(Debug)]
pub struct ScratchArena {
    root: PathBuf,
}

impl ScratchArena {
    /// Create `<working_dir>/cue-<index:06>`.
    ///
    /// Leftovers from an interrupted earlier run are removed first.
    ///
    /// # Errors
    ///
    /// Returns [`SubgifError::FilesystemError`] if the directory cannot be
    /// created.
    pub fn create(working_dir: &Path, index: usize) -> Result<Self, SubgifError> {
        let root = working_dir.join(format!("cue-{index:06}"));
        if root.exists() {
            log::debug!("Removing stale scratch directory {}", root.display());
            remove_best_effort(&root);
        }
        fs::create_dir_all(&root).map_err(|error| SubgifError::filesystem(&root, error))?;
        Ok(Self { root })
    }

    /// Directory of this arena.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the cue's clip is written.
    pub fn clip_path(&self) -> PathBuf {
        self.root.join(CLIP_FILE_NAME)
    }

    /// Where frame `number` (1-based) is written.
    pub fn frame_path(&self, number: usize) -> PathBuf {
        self.root.join(format!("image-{number:05}.png"))
    }
}

impl Drop for ScratchArena {
    fn drop(&mut self) {
        log::debug!("Cleaning up {}", self.root.display());
        remove_best_effort(&self.root);
    }
}

/// Remove a file or directory tree, logging anything other than "already
/// gone" at warn level.
pub(crate) fn remove_best_effort(path: &Path) {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => {}
        Err(error) if error.kind() == ErrorKind::NotFound => {}
        Err(error) => log::warn!("Could not remove {}: {error}", path.display()),
    }
}

/// Exclusive, in-progress ownership of one output path.
#[derive(Debug)]
pub struct OutputClaim {
    output: PathBuf,
    partial: PathBuf,
    committed: bool,
}

impl OutputClaim {
    /// Try to claim `output`.
    ///
    /// Returns `Ok(None)` when the claim file already exists, meaning some
    /// other worker is producing this output right now or a previous run
    /// was killed mid-cue. [`OutputClaim::reclaim`] and
    /// [`OutputClaim::acquire_unless_fresh`] take such leftovers over.
    ///
    /// # Errors
    ///
    /// Returns [`SubgifError::FilesystemError`] for any other failure to
    /// create the claim file.
    pub fn acquire(output: &Path) -> Result<Option<Self>, SubgifError> {
        let partial = claim_path(output);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&partial)
        {
            Ok(_) => Ok(Some(Self {
                output: output.to_path_buf(),
                partial,
                committed: false,
            })),
            Err(error) if error.kind() == ErrorKind::AlreadyExists => Ok(None),
            Err(error) => Err(SubgifError::filesystem(partial, error)),
        }
    }

    /// Claim `output`, first deleting any claim file already there.
    ///
    /// Only safe when nothing else can be producing `output`, as in a
    /// sequential run. Returns `Ok(None)` if a claim reappears between the
    /// delete and the create.
    ///
    /// # Errors
    ///
    /// Returns [`SubgifError::FilesystemError`] if the old claim cannot be
    /// removed or the new one cannot be created.
    pub fn reclaim(output: &Path) -> Result<Option<Self>, SubgifError> {
        let partial = claim_path(output);
        match fs::remove_file(&partial) {
            Ok(()) => log::warn!("Removed leftover claim {}", partial.display()),
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(error) => return Err(SubgifError::filesystem(partial, error)),
        }
        Self::acquire(output)
    }

    /// Like [`acquire`](Self::acquire), but a claim file last modified more
    /// than `max_age` ago is treated as abandoned and reclaimed.
    ///
    /// # Errors
    ///
    /// Same as [`reclaim`](Self::reclaim).
    pub fn acquire_unless_fresh(
        output: &Path,
        max_age: Duration,
    ) -> Result<Option<Self>, SubgifError> {
        if let Some(claim) = Self::acquire(output)? {
            return Ok(Some(claim));
        }
        let age = fs::metadata(claim_path(output))
            .and_then(|metadata| metadata.modified())
            .ok()
            .and_then(|modified| modified.elapsed().ok());
        match age {
            Some(age) if age >= max_age => Self::reclaim(output),
            _ => Ok(None),
        }
    }

    /// The file the output is written into before it is committed.
    pub fn partial_path(&self) -> &Path {
        &self.partial
    }

    /// The final output path.
    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Move the finished file onto the output path.
    ///
    /// # Errors
    ///
    /// Returns [`SubgifError::FilesystemError`] if the rename fails; the
    /// claim is then released on drop.
    pub fn commit(mut self) -> Result<PathBuf, SubgifError> {
        fs::rename(&self.partial, &self.output)
            .map_err(|error| SubgifError::filesystem(&self.output, error))?;
        self.committed = true;
        Ok(self.output.clone())
    }
}

impl Drop for OutputClaim {
    fn drop(&mut self) {
        if !self.committed {
            remove_best_effort(&self.partial);
        }
    }
}

/// `<output>.part` for a given output path.
pub fn claim_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".");
    name.push(CLAIM_SUFFIX);
    PathBuf::from(name)
}
