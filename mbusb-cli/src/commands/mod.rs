pub mod create;

pub use create::handle_create;
