use std::{
    collections::HashMap,
    io,
    marker::PhantomData,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use tweenflow_image::{Image, ImageDtype};
use tweenflow_io::functional::{read_image_any, write_image_any, FileDtype};

use crate::error::InterpolationError;

/// Where frames live.
///
/// Frames are addressed by the paths rendered from a
/// [`PathTemplate`](crate::template::PathTemplate). Implementations are shared
/// between worker threads, so every method takes `&self`.
pub trait FrameStorage<T: ImageDtype, const C: usize>: Send + Sync {
    /// Whether a frame is stored at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Load the frame stored at `path`.
    fn read(&self, path: &Path) -> Result<Image<T, C>, InterpolationError>;

    /// Store `image` at `path`, replacing any previous frame.
    fn write(&self, path: &Path, image: &Image<T, C>) -> Result<(), InterpolationError>;

    /// Move the frame at `from` to `to`.
    fn rename(&self, from: &Path, to: &Path) -> Result<(), InterpolationError>;
}

impl<T, const C: usize, S> FrameStorage<T, C> for &S
where
    T: ImageDtype,
    S: FrameStorage<T, C> + ?Sized,
{
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn read(&self, path: &Path) -> Result<Image<T, C>, InterpolationError> {
        (**self).read(path)
    }

    fn write(&self, path: &Path, image: &Image<T, C>) -> Result<(), InterpolationError> {
        (**self).write(path, image)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), InterpolationError> {
        (**self).rename(from, to)
    }
}

fn storage_error(path: &Path, source: io::Error) -> InterpolationError {
    InterpolationError::Storage {
        path: path.to_path_buf(),
        source,
    }
}

/// Frames stored as image files on the local filesystem.
///
/// The file format follows the extension of each path.
#[derive(Debug, Clone, Copy)]
pub struct FsStorage<T, const C: usize> {
    _pixel: PhantomData<T>,
}

impl<T, const C: usize> FsStorage<T, C> {
    /// Create a filesystem storage for frames of `C` channels of type `T`.
    pub fn new() -> Self {
        Self {
            _pixel: PhantomData,
        }
    }
}

impl<T, const C: usize> Default for FsStorage<T, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FileDtype, const C: usize> FrameStorage<T, C> for FsStorage<T, C> {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read(&self, path: &Path) -> Result<Image<T, C>, InterpolationError> {
        Ok(read_image_any(path)?)
    }

    fn write(&self, path: &Path, image: &Image<T, C>) -> Result<(), InterpolationError> {
        Ok(write_image_any(path, image)?)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), InterpolationError> {
        std::fs::rename(from, to).map_err(|e| storage_error(from, e))
    }
}

/// Frames kept in memory, keyed by path.
#[derive(Debug)]
pub struct MemoryStorage<T, const C: usize> {
    frames: Mutex<HashMap<PathBuf, Image<T, C>>>,
}

impl<T, const C: usize> Default for MemoryStorage<T, C> {
    fn default() -> Self {
        Self {
            frames: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Clone, const C: usize> MemoryStorage<T, C> {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Image<T, C>>> {
        // frames are only replaced whole, a poisoned map is still consistent
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a frame at `path`.
    pub fn insert(&self, path: impl Into<PathBuf>, image: Image<T, C>) {
        self.lock().insert(path.into(), image);
    }

    /// A copy of the frame at `path`.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Image<T, C>> {
        self.lock().get(path.as_ref()).cloned()
    }

    /// Number of stored frames.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the storage holds no frame.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// All stored paths, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths = self.lock().keys().cloned().collect::<Vec<_>>();
        paths.sort();
        paths
    }
}

impl<T: ImageDtype, const C: usize> FrameStorage<T, C> for MemoryStorage<T, C> {
    fn exists(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    fn read(&self, path: &Path) -> Result<Image<T, C>, InterpolationError> {
        self.get(path)
            .ok_or_else(|| storage_error(path, io::ErrorKind::NotFound.into()))
    }

    fn write(&self, path: &Path, image: &Image<T, C>) -> Result<(), InterpolationError> {
        self.insert(path, image.clone());
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), InterpolationError> {
        let mut frames = self.lock();
        if frames.contains_key(to) {
            return Err(storage_error(to, io::ErrorKind::AlreadyExists.into()));
        }
        let image = frames
            .remove(from)
            .ok_or_else(|| storage_error(from, io::ErrorKind::NotFound.into()))?;
        frames.insert(to.to_path_buf(), image);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage() -> Result<(), InterpolationError> {
        let storage = MemoryStorage::<u8, 1>::new();
        let image = Image::<u8, 1>::from_size_val([2, 2].into(), 3)?;
        let (a, b) = (Path::new("a_000.png"), Path::new("a_002.png"));

        storage.write(a, &image)?;
        assert!(storage.exists(a));
        assert_eq!(storage.read(a)?, image);

        storage.rename(a, b)?;
        assert!(!storage.exists(a));
        assert_eq!(storage.paths(), vec![b.to_path_buf()]);

        assert!(matches!(
            storage.read(a),
            Err(InterpolationError::Storage { .. })
        ));
        Ok(())
    }

    #[test]
    fn memory_rename_never_overwrites() -> Result<(), InterpolationError> {
        let storage = MemoryStorage::<u8, 1>::new();
        storage.insert("x", Image::from_size_val([1, 1].into(), 1)?);
        storage.insert("y", Image::from_size_val([1, 1].into(), 2)?);

        let res = FrameStorage::rename(&storage, Path::new("x"), Path::new("y"));
        assert!(matches!(res, Err(InterpolationError::Storage { .. })));
        assert_eq!(storage.get("y").map(|i| i.as_slice()[0]), Some(2));
        assert_eq!(storage.len(), 2);
        Ok(())
    }

    #[test]
    fn fs_storage() -> Result<(), InterpolationError> {
        let tmp_dir = tempfile::tempdir().map_err(|e| storage_error(Path::new("tmp"), e))?;
        let storage = FsStorage::<u16, 3>::new();
        let path = tmp_dir.path().join("frame_001.png");
        let moved = tmp_dir.path().join("frame_002.png");

        let image = Image::<u16, 3>::from_fn([3, 2].into(), |x, y| {
            [x as u16 * 1000, y as u16 * 2000, 65535]
        });
        storage.write(&path, &image)?;
        assert!(storage.exists(&path));

        storage.rename(&path, &moved)?;
        assert!(!storage.exists(&path));
        assert_eq!(storage.read(&moved)?, image);
        Ok(())
    }
}
