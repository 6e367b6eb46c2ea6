use opfs::{DirectoryHandle as _, FileHandle as _, WritableFileStream as _, persistent};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage error: {0:?}")]
    Opfs(persistent::Error),
    #[error("could not encode state: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug)]
pub(crate) struct Directories {
    pub data_directory_handle: persistent::DirectoryHandle,
}

pub(crate) async fn get_directories() -> Result<Directories, persistent::Error> {
    let root = opfs::persistent::app_specific_dir().await?;
    let create = opfs::GetDirectoryHandleOptions { create: true };

    let data = root
        .get_directory_handle_with_options("data", &create)
        .await?;

    Ok(Directories {
        data_directory_handle: data,
    })
}

/// Read a file's bytes, or None when it doesn't exist or can't be read.
/// Callers treat missing state as empty defaults, so this never errors.
pub(crate) async fn read_file_bytes(
    dir: &persistent::DirectoryHandle,
    file_name: &str,
) -> Option<Vec<u8>> {
    let file_handle = dir
        .get_file_handle_with_options(file_name, &opfs::GetFileHandleOptions { create: false })
        .await
        .ok()?;

    match file_handle.read().await {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            log::error!("Failed to read {file_name}: {e:?}");
            None
        }
    }
}

/// Overwrite `file_name` with the JSON encoding of `value`.
pub(crate) async fn write_json<T: serde::Serialize>(
    dir: &persistent::DirectoryHandle,
    file_name: &str,
    value: &T,
) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec(value)?;

    let mut file_handle = dir
        .get_file_handle_with_options(file_name, &opfs::GetFileHandleOptions { create: true })
        .await
        .map_err(StorageError::Opfs)?;

    let mut writable = file_handle
        .create_writable_with_options(&opfs::CreateWritableOptions {
            keep_existing_data: false,
        })
        .await
        .map_err(StorageError::Opfs)?;

    writable
        .write_at_cursor_pos(bytes)
        .await
        .map_err(StorageError::Opfs)?;
    writable.close().await.map_err(StorageError::Opfs)?;

    Ok(())
}
