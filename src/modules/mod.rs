//! Built-in feature modules.
//!
//! | Module | Identifier | Role |
//! |--------|------------|------|
//! | [`DisplaySize`] | `DisplaySize` | Floating label with the image's pixel size |
//! | [`Toolbar`] | `Toolbar` | Alignment buttons on the overlay |
//! | [`Resize`] | `Resize` | Corner drag handles |

mod display_size;
mod resize;
mod toolbar;

pub use display_size::{DisplaySize, LabelPlacement, label_placement};
pub use resize::{Corner, Resize, dragged_width};
pub use toolbar::Toolbar;
