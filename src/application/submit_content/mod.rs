pub mod dto;
pub mod use_case;

pub use dto::{MediaUpload, SubmitContentInput, SubmitContentOutput};
pub use use_case::SubmitContentUseCase;
