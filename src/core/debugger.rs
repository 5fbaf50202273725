//! Debugger - OS Debug API Wrapper
//!
//! Attaches to a live process so its memory can be examined.
//! Windows uses the Debug API (windows-rs), Linux uses ptrace (nix).

use thiserror::Error;

use super::memory::MemoryManager;

/// Debugger-specific errors
#[derive(Error, Debug)]
pub enum DebugError {
    #[error("Failed to attach to process {pid}: {reason}")]
    AttachFailed { pid: u32, reason: String },

    #[error("Failed to detach from process {pid}: {reason}")]
    DetachFailed { pid: u32, reason: String },

    #[error("Already attached to process {pid}")]
    AlreadyAttached { pid: u32 },

    #[error("No process attached")]
    NotAttached,

    #[error("Debugging is not supported on this platform")]
    Unsupported,
}

/// Main debugger interface
pub struct Debugger {
    /// Target process ID
    target_pid: Option<u32>,

    /// Reads the attached process's memory
    memory: MemoryManager,
}

impl Debugger {
    /// Create a new debugger instance
    pub fn new() -> Self {
        Self {
            target_pid: None,
            memory: MemoryManager::new(),
        }
    }

    /// Attach to an existing process by PID
    pub fn attach(&mut self, pid: u32) -> Result<(), DebugError> {
        if let Some(current) = self.target_pid {
            return Err(DebugError::AlreadyAttached { pid: current });
        }
        log::info!("Attaching to process {}", pid);

        #[cfg(target_os = "windows")]
        {
            self.attach_windows(pid)?;
        }

        #[cfg(target_os = "linux")]
        {
            self.attach_linux(pid)?;
        }

        #[cfg(not(any(target_os = "windows", target_os = "linux")))]
        {
            return Err(DebugError::Unsupported);
        }

        if let Err(e) = self.memory.open_process(pid) {
            self.release(pid);
            return Err(DebugError::AttachFailed {
                pid,
                reason: e.to_string(),
            });
        }
        self.target_pid = Some(pid);

        log::info!("Successfully attached to process {}", pid);
        Ok(())
    }

    /// Detach from the current process
    pub fn detach(&mut self) -> Result<u32, DebugError> {
        let pid = self.target_pid.ok_or(DebugError::NotAttached)?;
        log::info!("Detaching from process {}", pid);

        #[cfg(target_os = "windows")]
        {
            self.detach_windows(pid)?;
        }

        #[cfg(target_os = "linux")]
        {
            self.detach_linux(pid)?;
        }

        self.memory.close();
        self.target_pid = None;

        log::info!("Successfully detached from process {}", pid);
        Ok(pid)
    }

    /// Undo an OS-level attach that did not complete
    fn release(&mut self, pid: u32) {
        #[cfg(target_os = "windows")]
        let result = self.detach_windows(pid);

        #[cfg(target_os = "linux")]
        let result = self.detach_linux(pid);

        #[cfg(not(any(target_os = "windows", target_os = "linux")))]
        let result: Result<(), DebugError> = {
            let _ = pid;
            Ok(())
        };

        if let Err(e) = result {
            log::warn!("{}", e);
        }
        self.memory.close();
    }

    /// Get current target PID
    pub fn target_pid(&self) -> Option<u32> {
        self.target_pid
    }

    /// Check if debugger is attached
    pub fn is_active(&self) -> bool {
        self.target_pid.is_some()
    }

    /// Memory of the attached process
    pub fn memory(&self) -> &MemoryManager {
        &self.memory
    }
}

// Windows-specific implementations
#[cfg(target_os = "windows")]
impl Debugger {
    fn attach_windows(&mut self, pid: u32) -> Result<(), DebugError> {
        use windows::Win32::System::Diagnostics::Debug::DebugActiveProcess;

        unsafe {
            DebugActiveProcess(pid).map_err(|e| DebugError::AttachFailed {
                pid,
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }

    fn detach_windows(&mut self, pid: u32) -> Result<(), DebugError> {
        use windows::Win32::System::Diagnostics::Debug::DebugActiveProcessStop;

        unsafe {
            DebugActiveProcessStop(pid).map_err(|e| DebugError::DetachFailed {
                pid,
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }
}

// Linux-specific implementations
#[cfg(target_os = "linux")]
impl Debugger {
    fn attach_linux(&mut self, pid: u32) -> Result<(), DebugError> {
        use nix::sys::ptrace;
        use nix::sys::wait::waitpid;
        use nix::unistd::Pid;

        let target = Pid::from_raw(pid as i32);
        ptrace::attach(target).map_err(|e| DebugError::AttachFailed {
            pid,
            reason: e.to_string(),
        })?;

        // The tracee is only safe to read once it has actually stopped
        if let Err(e) = waitpid(target, None) {
            self.release(pid);
            return Err(DebugError::AttachFailed {
                pid,
                reason: e.to_string(),
            });
        }

        Ok(())
    }

    fn detach_linux(&mut self, pid: u32) -> Result<(), DebugError> {
        use nix::sys::ptrace;
        use nix::unistd::Pid;

        ptrace::detach(Pid::from_raw(pid as i32), None).map_err(|e| DebugError::DetachFailed {
            pid,
            reason: e.to_string(),
        })?;

        Ok(())
    }
}

impl Default for Debugger {
    fn default() -> Self {
        Self::new()
    }
}
