use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::StorageError;

/// Highest `_N` suffix tried before giving up on a name.
const MAX_CONFLICT_SUFFIX: u32 = 1000;

pub struct FileStorage {
    output_directory: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(output_directory: P) -> Self {
        Self {
            output_directory: output_directory.as_ref().to_path_buf(),
        }
    }

    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    /// Write `content` to `<output>/<relative_directory>/<filename>`.
    ///
    /// An existing file is never overwritten: the name gains a `_2`, `_3`, ...
    /// suffix before the extension until an unused one is found.
    pub fn store(
        &self,
        content: &[u8],
        relative_directory: &str,
        filename: &str,
    ) -> Result<PathBuf, StorageError> {
        let dir_path = self.output_directory.join(relative_directory);
        self.ensure_directory(&dir_path)?;

        self.store_with_atomic_creation(&dir_path, filename, content)
    }

    /// Store several files into one directory, all or none.
    ///
    /// Paths come back in input order. If any store fails, the files already
    /// written by this call are removed before the error is returned.
    pub fn store_all(
        &self,
        outputs: &[(&[u8], &str)],
        relative_directory: &str,
    ) -> Result<Vec<PathBuf>, StorageError> {
        let mut stored = Vec::with_capacity(outputs.len());
        for (content, filename) in outputs {
            match self.store(content, relative_directory, filename) {
                Ok(path) => stored.push(path),
                Err(e) => {
                    warn!(
                        "Storing '{}' failed, removing {} file(s) already written",
                        filename,
                        stored.len()
                    );
                    for path in &stored {
                        self.discard(path);
                    }
                    return Err(e);
                }
            }
        }
        Ok(stored)
    }

    /// `create_new` makes check-and-create a single step, so concurrent writers
    /// cannot both claim the same name.
    fn store_with_atomic_creation(
        &self,
        dir_path: &Path,
        filename: &str,
        content: &[u8],
    ) -> Result<PathBuf, StorageError> {
        for counter in 1..=MAX_CONFLICT_SUFFIX {
            let try_path = dir_path.join(numbered_filename(filename, counter));

            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&try_path)
            {
                Ok(mut file) => {
                    if let Err(e) = file.write_all(content).and_then(|()| file.sync_all()) {
                        drop(file);
                        // A partial file would look like a finished output.
                        self.discard(&try_path);
                        return Err(StorageError::WriteFile {
                            path: try_path,
                            source: e,
                        });
                    }
                    return Ok(try_path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(StorageError::WriteFile {
                        path: try_path,
                        source: e,
                    });
                }
            }
        }

        Err(StorageError::FileExists(dir_path.join(filename)))
    }

    /// Remove a file this storage wrote earlier. Missing files are ignored.
    pub fn discard(&self, path: &Path) {
        match std::fs::remove_file(path) {
            Ok(()) => debug!("Discarded {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to discard {}: {}", path.display(), e),
        }
    }

    fn ensure_directory(&self, path: &Path) -> Result<(), StorageError> {
        if !path.exists() {
            std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        Ok(())
    }
}

/// `name.ext` for counter 1, `name_N.ext` after that.
fn numbered_filename(filename: &str, counter: u32) -> String {
    if counter == 1 {
        return filename.to_string();
    }
    match filename.rfind('.') {
        Some(dot_pos) if dot_pos > 0 => format!(
            "{}_{}{}",
            &filename[..dot_pos],
            counter,
            &filename[dot_pos..]
        ),
        _ => format!("{}_{}", filename, counter),
    }
}
