//! Memory - Process memory reads
//!
//! Provides the [`MemorySource`] abstraction the examine commands read from,
//! and its live-process implementation across platforms.

use thiserror::Error;

/// Memory operation errors
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Failed to read memory at {address:#x}: {reason}")]
    ReadFailed { address: u64, reason: String },

    #[error("Cannot access memory at address {address:#x}")]
    Unmapped { address: u64 },

    #[error("Short read at {address:#x}: wanted {wanted} bytes, got {got}")]
    ShortRead {
        address: u64,
        wanted: usize,
        got: usize,
    },

    #[error("Bad address expression '{expr}': {reason}")]
    BadExpression { expr: String, reason: String },

    #[error("No process attached")]
    NoProcess,

    #[error("Nothing to examine: attach to a process or load a binary first")]
    NoSource,
}

/// Largest single read handed to a live process
pub const MAX_READ_SIZE: usize = 16 * 1024 * 1024;

/// Anything that can hand out target memory by virtual address
pub trait MemorySource {
    /// Read exactly `size` bytes starting at `address`
    fn read(&self, address: u64, size: usize) -> Result<Vec<u8>, MemoryError>;

    /// Address of a named symbol, if the source knows any
    fn resolve_symbol(&self, _name: &str) -> Option<u64> {
        None
    }

    /// `name+offset` for an address, if the source knows any symbols
    fn symbolize(&self, _address: u64) -> Option<String> {
        None
    }
}

/// Memory manager for reading process memory
pub struct MemoryManager {
    /// Target process handle/PID
    #[cfg(target_os = "windows")]
    process_handle: Option<isize>,

    #[cfg(target_os = "linux")]
    target_pid: Option<u32>,
}

impl MemoryManager {
    /// Create a new memory manager
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "windows")]
            process_handle: None,
            #[cfg(target_os = "linux")]
            target_pid: None,
        }
    }

    /// Open a process for memory operations
    #[cfg(target_os = "windows")]
    pub fn open_process(&mut self, pid: u32) -> Result<(), MemoryError> {
        use windows::Win32::System::Threading::{
            OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
        };

        let handle = unsafe {
            OpenProcess(PROCESS_VM_READ | PROCESS_QUERY_INFORMATION, false, pid).map_err(|e| {
                MemoryError::ReadFailed {
                    address: 0,
                    reason: e.to_string(),
                }
            })?
        };

        self.process_handle = Some(handle.0 as isize);
        Ok(())
    }

    #[cfg(target_os = "linux")]
    pub fn open_process(&mut self, pid: u32) -> Result<(), MemoryError> {
        self.target_pid = Some(pid);
        Ok(())
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux")))]
    pub fn open_process(&mut self, _pid: u32) -> Result<(), MemoryError> {
        Err(MemoryError::NoProcess)
    }

    /// Forget the current process
    pub fn close(&mut self) {
        #[cfg(target_os = "windows")]
        {
            self.process_handle = None;
        }

        #[cfg(target_os = "linux")]
        {
            self.target_pid = None;
        }
    }

    /// Read memory into an existing buffer, returning the bytes actually read
    pub fn read_into(&self, address: u64, buffer: &mut [u8]) -> Result<usize, MemoryError> {
        #[cfg(target_os = "windows")]
        {
            self.read_windows(address, buffer)
        }

        #[cfg(target_os = "linux")]
        {
            self.read_linux(address, buffer)
        }

        #[cfg(not(any(target_os = "windows", target_os = "linux")))]
        {
            let _ = (address, buffer);
            Err(MemoryError::NoProcess)
        }
    }
}

impl MemorySource for MemoryManager {
    fn read(&self, address: u64, size: usize) -> Result<Vec<u8>, MemoryError> {
        if size > MAX_READ_SIZE {
            return Err(MemoryError::ReadFailed {
                address,
                reason: format!("{} bytes exceeds the {} byte read limit", size, MAX_READ_SIZE),
            });
        }

        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(size)
            .map_err(|e| MemoryError::ReadFailed {
                address,
                reason: e.to_string(),
            })?;
        buffer.resize(size, 0);
        let got = self.read_into(address, &mut buffer)?;
        if got != size {
            return Err(MemoryError::ShortRead {
                address,
                wanted: size,
                got,
            });
        }
        log::trace!("read {} bytes at {:#x}", size, address);
        Ok(buffer)
    }
}

// Windows-specific implementations
#[cfg(target_os = "windows")]
impl MemoryManager {
    fn read_windows(&self, address: u64, buffer: &mut [u8]) -> Result<usize, MemoryError> {
        use windows::Win32::Foundation::HANDLE;
        use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;

        let handle_val = self.process_handle.ok_or(MemoryError::NoProcess)?;
        // SAFETY: HANDLE is repr(transparent) wrapper around isize
        let handle: HANDLE = unsafe { std::mem::transmute(handle_val) };
        let mut bytes_read = 0usize;

        unsafe {
            ReadProcessMemory(
                handle,
                address as *const std::ffi::c_void,
                buffer.as_mut_ptr() as *mut std::ffi::c_void,
                buffer.len(),
                Some(&mut bytes_read),
            )
            .map_err(|e| MemoryError::ReadFailed {
                address,
                reason: e.to_string(),
            })?;
        }

        Ok(bytes_read)
    }
}

// Linux-specific implementations
#[cfg(target_os = "linux")]
impl MemoryManager {
    fn read_linux(&self, address: u64, buffer: &mut [u8]) -> Result<usize, MemoryError> {
        use std::fs::File;
        use std::io::{Read, Seek, SeekFrom};

        let pid = self.target_pid.ok_or(MemoryError::NoProcess)?;
        let mem_path = format!("/proc/{}/mem", pid);

        let mut file = File::open(&mem_path).map_err(|e| MemoryError::ReadFailed {
            address,
            reason: e.to_string(),
        })?;

        file.seek(SeekFrom::Start(address))
            .map_err(|e| MemoryError::ReadFailed {
                address,
                reason: e.to_string(),
            })?;

        // /proc/<pid>/mem may hand back less than asked for near a mapping edge
        let mut total = 0;
        while total < buffer.len() {
            let n = file
                .read(&mut buffer[total..])
                .map_err(|_| MemoryError::Unmapped {
                    address: address + total as u64,
                })?;
            if n == 0 {
                break;
            }
            total += n;
        }

        Ok(total)
    }
}

impl Default for MemoryManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_without_process() {
        let mm = MemoryManager::new();
        assert!(matches!(mm.read(0x1000, 4), Err(MemoryError::NoProcess)));
    }

    #[test]
    fn test_oversized_read_is_refused() {
        let mut mm = MemoryManager::new();
        // The size check runs before any allocation or process access
        let _ = mm.open_process(std::process::id());

        let result = mm.read(0x1000, u32::MAX as usize * 8);
        assert!(matches!(result, Err(MemoryError::ReadFailed { address: 0x1000, .. })));
        assert!(matches!(
            mm.read(0x1000, MAX_READ_SIZE + 1),
            Err(MemoryError::ReadFailed { .. })
        ));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_read_own_memory() {
        let value: u32 = 0x1234_5678;
        let address = &value as *const u32 as u64;

        let mut mm = MemoryManager::new();
        mm.open_process(std::process::id()).unwrap();

        match mm.read(address, 4) {
            Ok(bytes) => assert_eq!(bytes, value.to_ne_bytes()),
            // Hardened kernels may refuse /proc/self/mem
            Err(e) => println!("Could not read own memory: {}", e),
        }
    }
}
