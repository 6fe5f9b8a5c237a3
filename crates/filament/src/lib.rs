#![forbid(unsafe_code)]

//! Filament public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.

pub mod prelude {
    pub use filament_reactive as reactive;
    pub use filament_state as state;

    pub use filament_reactive::{StateCell, Subscription};
    pub use filament_state::{ListContainer, ListMutator, RecordContainer, RecordMutator};
}
