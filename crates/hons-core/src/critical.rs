//! Scoped "no interrupts" critical sections (spec §5).
//!
//! A handful of multi-step mutations (installing a freshly-grown `sbits`
//! alongside an `addr_ht` insert, publishing a flex-alist conversion) must
//! look atomic to an asynchronous signal handler: an interruption between
//! the two stores must never leave the Hons Space in a state that
//! violates §3.4. The teacher workspace already reaches for `libc`
//! (`crates/runtime/src/signal.rs` calls `libc::signal` directly) and
//! `signal-hook` for its own SIGQUIT diagnostics handler; this is the
//! same idiom applied to our mutation sequences instead of to a
//! diagnostics dump.

/// Run `f` with all signals blocked on the calling thread, restoring the
/// previous mask afterwards. On non-Unix targets this is a plain call —
/// there is no asynchronous signal delivery to guard against.
#[cfg(unix)]
pub fn no_interrupts<R>(f: impl FnOnce() -> R) -> R {
    unsafe {
        let mut full: libc::sigset_t = std::mem::zeroed();
        let mut old: libc::sigset_t = std::mem::zeroed();
        libc::sigfillset(&mut full);
        libc::pthread_sigmask(libc::SIG_BLOCK, &full, &mut old);
        let result = f();
        libc::pthread_sigmask(libc::SIG_SETMASK, &old, std::ptr::null_mut());
        result
    }
}

#[cfg(not(unix))]
pub fn no_interrupts<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_and_returns_value() {
        let v = no_interrupts(|| 1 + 1);
        assert_eq!(v, 2);
    }
}
