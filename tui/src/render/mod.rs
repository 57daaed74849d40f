mod label;
pub mod renderable;

pub use label::LabelView;
pub use label::label_area;
