pub mod input_buffer;
pub mod input_frame;
