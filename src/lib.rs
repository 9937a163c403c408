//! Workspace facade crate.
//!
//! This crate exposes feature flags that map to the individual workspace
//! crates (`core-collect`, `provider-linkding`, `bridge-desktop`). Host
//! applications can depend on `collect-workspace` and enable the documented
//! features without wiring each crate individually.

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop as desktop;
#[cfg(any(feature = "desktop-shims", feature = "linkding"))]
pub use core_collect as collect;
#[cfg(feature = "linkding")]
pub use provider_linkding as linkding;
