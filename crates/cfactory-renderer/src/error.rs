use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("font error: {0}")]
    Font(String),

    #[error("plan has no slides to render")]
    EmptyPlan,
}
