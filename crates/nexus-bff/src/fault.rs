//! Handler fault type.
//!
//! [`Fault`] is what a route handler raises instead of returning a payload.
//! It keeps the full diagnostic picture (type name, message chain,
//! backtrace) for the operator log. None of it is ever serialized to a
//! caller; callers only see the classifier's safe message.
//!
//! Backtraces are always captured, independent of `RUST_BACKTRACE`. For
//! panics the trace and source location come from the panic hook installed
//! by [`install_panic_hook`]; without the hook they fall back to the catch
//! site.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::fmt;
use std::sync::Once;

/// Where the most recent panic on this thread was raised.
struct PanicSite {
    location: String,
    backtrace: Backtrace,
}

thread_local! {
    static LAST_PANIC: RefCell<Option<PanicSite>> = const { RefCell::new(None) };
}

/// Record the location and backtrace of every panic so that a later
/// [`Fault::from_panic`] on the same thread can report where it happened.
///
/// Chains to the previously installed hook. Idempotent.
pub fn install_panic_hook() {
    static INSTALLED: Once = Once::new();
    INSTALLED.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map(|l| l.to_string())
                .unwrap_or_else(|| "<unknown>".to_string());
            LAST_PANIC.with(|slot| {
                *slot.borrow_mut() = Some(PanicSite {
                    location,
                    backtrace: Backtrace::force_capture(),
                });
            });
            previous(info);
        }));
    });
}

/// An uncaught failure raised by a handler or by the transport stack.
pub struct Fault {
    kind: &'static str,
    inner: anyhow::Error,
    backtrace: Backtrace,
    location: Option<String>,
}

impl Fault {
    /// Fault from a free-form message.
    pub fn msg(message: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        Self {
            kind: "message",
            inner: anyhow::Error::msg(message),
            backtrace: Backtrace::force_capture(),
            location: None,
        }
    }

    /// Fault from an already-erased `anyhow` error.
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        Self {
            kind: "anyhow::Error",
            inner: err,
            backtrace: Backtrace::force_capture(),
            location: None,
        }
    }

    /// Fault from a caught panic payload.
    ///
    /// Must be called on the thread that caught the panic, right after
    /// catching it.
    pub fn from_panic(payload: Box<dyn Any + Send + 'static>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic with non-string payload".to_string()
        };
        let site = LAST_PANIC.with(|slot| slot.borrow_mut().take());
        let (backtrace, location) = match site {
            Some(site) => (site.backtrace, Some(site.location)),
            None => (Backtrace::force_capture(), None),
        };
        Self {
            kind: "panic",
            inner: anyhow::Error::msg(message),
            backtrace,
            location,
        }
    }

    /// Type name of the original error.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Rendered description including the whole cause chain.
    pub fn description(&self) -> String {
        format!("{:#}", self.inner)
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// `file:line:col` of the panic, when the panic hook saw it.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

impl<E> From<E> for Fault
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Self {
            kind: std::any::type_name::<E>(),
            inner: anyhow::Error::new(err),
            backtrace: Backtrace::force_capture(),
            location: None,
        }
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fault")
            .field("kind", &self.kind)
            .field("description", &self.description())
            .finish()
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:#}", self.kind, self.inner)
    }
}
