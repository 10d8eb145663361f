pub mod landmark_detector;
