//! Host services the edit session depends on.
//!
//! These traits define the interface between the session logic and the host
//! application (browser DOM, native UI, test fakes). The host owns the real
//! singletons; the session only holds them while the chain is focused and
//! releases them on every exit path.
//!
//! The unit type implements every trait as a no-op for headless use.

/// Global shortcut suspension while text is being edited.
pub trait FocusSuspension {
    /// Stop global shortcut handling. `context` names the pausing editor.
    fn pause(&mut self, context: Option<&str>);

    /// Resume global shortcut handling.
    fn resume(&mut self);
}

/// Presentation options for the outside-click capture surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureOptions {
    pub modal: bool,
    pub dim: f32,
    pub z_index: i32,
}

/// How the capture surface was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Interaction outside the chain, or an explicit commit.
    Confirmed,
    /// The surface was dismissed, e.g. by Escape.
    Cancelled,
}

/// Full-screen surface that captures clicks outside the chain.
///
/// `show` starts a single-resolution interaction. The host reports how it
/// ended by calling
/// [`EditSessionController::capture_resolved`](crate::EditSessionController::capture_resolved);
/// both outcomes lead to the same continuation.
pub trait CaptureSurface {
    fn show(&mut self, key: &str, options: CaptureOptions);

    fn hide(&mut self, key: &str);
}

/// Popup listing relational operators for a condition field.
pub trait OperatorPopup {
    /// Show the popup anchored at the condition of `clause`.
    fn show(&mut self, clause: usize, exclusive: bool);

    fn hide(&mut self);

    /// Re-anchor after the anchor text changed.
    fn update_position(&mut self);
}

/// Where focus went when a clause field lost it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    /// The operator popup of the given clause took focus.
    OperatorPopup { clause: usize },
}

impl FocusSuspension for () {
    fn pause(&mut self, _context: Option<&str>) {}
    fn resume(&mut self) {}
}

impl CaptureSurface for () {
    fn show(&mut self, _key: &str, _options: CaptureOptions) {}
    fn hide(&mut self, _key: &str) {}
}

impl OperatorPopup for () {
    fn show(&mut self, _clause: usize, _exclusive: bool) {}
    fn hide(&mut self) {}
    fn update_position(&mut self) {}
}

/// The injected services, bundled.
#[derive(Debug, Default)]
pub struct Services<F, C, P> {
    pub focus: F,
    pub capture: C,
    pub popup: P,
}

impl<F, C, P> Services<F, C, P> {
    pub fn new(focus: F, capture: C, popup: P) -> Self {
        Self {
            focus,
            capture,
            popup,
        }
    }
}

/// Proof that shortcut suspension and the capture surface are held.
///
/// Created by [`ChainFocusLease::acquire`]; must be handed back through
/// [`ChainFocusLease::release`].
#[derive(Debug)]
#[must_use = "a lease must be released or shortcuts stay paused"]
pub(crate) struct ChainFocusLease {
    key: String,
}

impl ChainFocusLease {
    pub(crate) fn acquire<F: FocusSuspension, C: CaptureSurface>(
        focus: &mut F,
        capture: &mut C,
        key: &str,
        context: &str,
        options: CaptureOptions,
    ) -> Self {
        focus.pause(Some(context));
        capture.show(key, options);
        Self {
            key: key.to_owned(),
        }
    }

    /// Give both services back. `surface_open` is false when the surface
    /// already closed itself.
    pub(crate) fn release<F: FocusSuspension, C: CaptureSurface>(
        self,
        focus: &mut F,
        capture: &mut C,
        surface_open: bool,
    ) {
        if surface_open {
            capture.hide(&self.key);
        }
        focus.resume();
    }
}
