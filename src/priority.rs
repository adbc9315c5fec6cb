//! Scheduling priority for the engine's worker threads.
//!
//! Priority only affects jitter. Callers treat a failure here as a debug
//! message and keep running at whatever priority the OS gave them.

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadPriority {
    BelowNormal,
    Highest,
}

/// Apply `priority` to the calling thread.
#[cfg(windows)]
pub fn set_current_thread_priority(priority: ThreadPriority) -> Result<()> {
    use crate::error::ClickerError;
    use std::io;
    use winapi::ctypes::c_int;
    use winapi::um::processthreadsapi::{GetCurrentThread, SetThreadPriority};
    use winapi::um::winbase::{THREAD_PRIORITY_BELOW_NORMAL, THREAD_PRIORITY_HIGHEST};

    // The winbase constants are DWORDs; the API takes the signed level.
    let level: c_int = match priority {
        ThreadPriority::BelowNormal => THREAD_PRIORITY_BELOW_NORMAL as c_int,
        ThreadPriority::Highest => THREAD_PRIORITY_HIGHEST as c_int,
    };

    if unsafe { SetThreadPriority(GetCurrentThread(), level) } == 0 {
        return Err(ClickerError::thread_priority(io::Error::last_os_error()));
    }
    Ok(())
}

/// Apply `priority` to the calling thread.
///
/// Linux schedules threads individually, so the nice value of the current
/// TID is changed. Raising priority needs `CAP_SYS_NICE`.
#[cfg(target_os = "linux")]
pub fn set_current_thread_priority(priority: ThreadPriority) -> Result<()> {
    use crate::error::ClickerError;
    use std::io;

    let nice: libc::c_int = match priority {
        ThreadPriority::BelowNormal => 5,
        ThreadPriority::Highest => -10,
    };

    let result = unsafe {
        let tid = libc::syscall(libc::SYS_gettid) as libc::id_t;
        libc::setpriority(libc::PRIO_PROCESS, tid, nice)
    };
    if result != 0 {
        return Err(ClickerError::thread_priority(io::Error::last_os_error()));
    }
    Ok(())
}

/// Apply `priority` to the calling thread.
#[cfg(not(any(windows, target_os = "linux")))]
pub fn set_current_thread_priority(priority: ThreadPriority) -> Result<()> {
    Err(crate::error::ClickerError::unsupported_platform(format!(
        "thread priority {priority:?}"
    )))
}
