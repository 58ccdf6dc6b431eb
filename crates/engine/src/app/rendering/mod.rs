mod draw_order;
mod renderer;
mod transform;

pub use draw_order::depth_sorted_indices;
pub use renderer::Renderer;
pub use transform::{camera_offset, parallax_offset, world_to_screen, Viewport};
