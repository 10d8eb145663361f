pub mod score_image_use_case;
pub mod score_stream_use_case;
pub mod session_score;
