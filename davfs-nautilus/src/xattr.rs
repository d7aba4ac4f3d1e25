use std::io;
use std::path::Path;

#[cfg(target_os = "linux")]
const VALUE_CAPACITY: usize = 256;

/// Reads an extended attribute without following a trailing symlink.
///
/// One `lgetxattr` call with a fixed buffer. A value that does not fit is
/// returned as empty: no known state token is that long.
#[cfg(target_os = "linux")]
pub(crate) fn read_nofollow(path: &Path, name: &str) -> io::Result<Vec<u8>> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL"))?;
    let c_name = CString::new(name)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "name contains NUL"))?;
    let mut buf = vec![0u8; VALUE_CAPACITY];

    let len = unsafe {
        libc::lgetxattr(
            c_path.as_ptr(),
            c_name.as_ptr(),
            buf.as_mut_ptr().cast(),
            buf.len(),
        )
    };
    if len < 0 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ERANGE) {
            return Ok(Vec::new());
        }
        return Err(err);
    }
    buf.truncate(usize::try_from(len).unwrap_or(0));
    Ok(buf)
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn read_nofollow(_path: &Path, _name: &str) -> io::Result<Vec<u8>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "extended attributes are only read on linux",
    ))
}
