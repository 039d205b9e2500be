pub mod lazy_video_sink;
pub mod output_path;
pub mod video_reader;
pub mod video_writer;
