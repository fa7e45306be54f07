//! Request extractors.

mod store_form;
mod validated_json;

pub use store_form::StoreForm;
pub use validated_json::{first_message, ValidatedJson};
