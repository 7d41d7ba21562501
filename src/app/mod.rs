// Presentation layer: one handler per user interaction.

pub mod batch;
pub mod inspect;
pub mod single;
pub mod stream;
