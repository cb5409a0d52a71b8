pub mod hit;
pub mod paint;
pub mod scene;
pub mod theme;

pub use hit::{hit_test, nearest_from, nearest_within};
pub use scene::{DisplayList, Primitive, SceneInput, build_display_list};
pub use theme::{Rgba, Theme};
