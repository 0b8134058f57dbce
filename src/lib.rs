//! Image resize overlay for rich-text editing surfaces.
//!
//! This crate is compiled to WebAssembly and runs in the browser next to the
//! host editor. Clicking an image inside the editing surface opens a session:
//! an overlay is drawn over the image and a configurable list of feature
//! modules (size label, alignment toolbar, drag handles) is attached to it.
//! The session follows the image while the surface scrolls and is torn down
//! when the selection moves away or the image is deleted.
//!
//! All lifecycle logic lives in [`controller::ImageResize`], written against
//! the [`dom::Dom`] and [`dom::Editor`] traits so it can be tested without a
//! browser. [`web`] supplies the `web-sys` implementations and the
//! `wasm-bindgen` entry points.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`controller`] | Selection/event coordinator and module orchestrator |
//! | [`overlay`] | Overlay element, user-select suppression, removal listeners |
//! | [`module`] | Feature module contract and the identifier registry |
//! | [`modules`] | Built-in modules: size label, toolbar, resize handles |
//! | [`dom`] | Host abstraction: DOM operations, editor engine, events |
//! | [`geometry`] | Bounding boxes relative to a container |
//! | [`debounce`] | Single-slot cancellable timer |
//! | [`config`] | Caller options and the merged configuration |
//! | [`style`] | Inline style maps |
//! | [`error`] | Error types |
//! | [`consts`] | Shared constants (key codes, delays, offsets) |
//! | [`web`] | Browser bindings and Quill registration |

pub mod config;
pub mod consts;
pub mod controller;
pub mod debounce;
pub mod dom;
pub mod error;
pub mod geometry;
pub mod module;
pub mod modules;
pub mod overlay;
pub mod style;
pub mod web;

#[cfg(test)]
pub(crate) mod testing;
