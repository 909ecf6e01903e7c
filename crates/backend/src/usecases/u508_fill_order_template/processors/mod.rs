pub mod line_item;
pub mod order_text;
pub mod product_name;
pub mod standardizer;
pub mod template_writer;

pub use template_writer::{TemplateLayout, UpdateSummary};
