pub mod submit_form;

pub use submit_form::submit_form;
