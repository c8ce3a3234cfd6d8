//! Pure matching of key events against declared bindings

use super::binding::Binding;
use super::types::{KeyEvent, Keystroke, Platform};

/// Decides whether a key event satisfies a binding
///
/// The platform is fixed at construction, so modifier roles are resolved
/// the same way for every event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BindingMatcher {
    platform: Platform,
}

impl BindingMatcher {
    pub const fn new(platform: Platform) -> Self {
        Self { platform }
    }

    /// Matcher for the process-wide platform
    pub fn for_current_platform() -> Self {
        Self::new(Platform::current())
    }

    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Resolve an event's physical modifiers into a role-based keystroke
    #[inline]
    pub fn resolve(&self, event: &KeyEvent) -> Keystroke {
        Keystroke::new(event.key, self.platform.resolve(event.mods))
    }

    #[inline]
    pub fn matches(&self, binding: &Binding, event: &KeyEvent) -> bool {
        binding.accepts(&self.resolve(event))
    }

    /// Apply a matched binding's propagation policy to the event
    pub fn apply_policy(&self, binding: &Binding, event: &mut KeyEvent) {
        binding.policy.apply_to(event);
    }

    /// Match and, on success, apply the binding's policy
    pub fn consume(&self, binding: &Binding, event: &mut KeyEvent) -> bool {
        if self.matches(binding, event) {
            self.apply_policy(binding, event);
            true
        } else {
            false
        }
    }
}

impl Default for BindingMatcher {
    fn default() -> Self {
        Self::for_current_platform()
    }
}
